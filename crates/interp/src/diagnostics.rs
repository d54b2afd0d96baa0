//! SIGQUIT diagnostics (optional, `diagnostics` feature): dump every
//! running core's current instruction pointer and call depth — "what is
//! everyone doing right now" on demand, without stopping the mesh.
//!
//! Each `Interpreter` registers a lightweight snapshot here before it
//! starts executing a statement and updates it as it goes; the handler
//! itself never touches interpreter internals directly — signal handlers
//! must stay async-signal-safe, so all it does is log what the registry
//! already has queued up.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy)]
pub struct CoreSnapshot {
    pub ip: usize,
    pub fn_level: u8,
}

fn registry() -> &'static Mutex<HashMap<u32, CoreSnapshot>> {
    static REGISTRY: OnceLock<Mutex<HashMap<u32, CoreSnapshot>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

pub fn record(core_id: u32, snapshot: CoreSnapshot) {
    registry().lock().unwrap().insert(core_id, snapshot);
}

pub fn forget(core_id: u32) {
    registry().lock().unwrap().remove(&core_id);
}

/// Install a SIGQUIT handler that logs every registered core's last
/// recorded `(ip, fn_level)`. Intended to be called once from the host
/// binary's `main`; a no-op on non-Unix targets.
#[cfg(unix)]
pub fn install_sigquit_handler() -> std::io::Result<()> {
    use signal_hook::consts::SIGQUIT;
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGQUIT])?;
    std::thread::spawn(move || {
        for _ in signals.forever() {
            let snapshot = registry().lock().unwrap();
            tracing::warn!(cores = snapshot.len(), "SIGQUIT: dumping core state");
            for (core_id, s) in snapshot.iter() {
                tracing::warn!(core_id, ip = s.ip, fn_level = s.fn_level, "core state");
            }
        }
    });
    Ok(())
}

#[cfg(not(unix))]
pub fn install_sigquit_handler() -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_and_forget_round_trip() {
        record(0, CoreSnapshot { ip: 5, fn_level: 1 });
        assert_eq!(registry().lock().unwrap().get(&0).unwrap().ip, 5);
        forget(0);
        assert!(registry().lock().unwrap().get(&0).is_none());
    }
}
