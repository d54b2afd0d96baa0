//! Component E + F: the host side of the mesh runtime. One `meshrt`
//! process runs [`run_mesh`] against a [`meshrt_mailbox::Mesh`] of local
//! cores, each realised as a `may` coroutine running a
//! [`meshrt_interp::Interpreter`]; the host thread itself runs the
//! [`Monitor`] poll loop until every local core has stopped.
//!
//! Node-to-node fan-out is the [`Transport`] trait's concern: a single
//! `meshrt` process with `total_cores == cores_per_node` needs only
//! [`LocalTransport`]; a multi-node cluster launches one `meshrt` per
//! node (e.g. under `mpirun`) and links in `mpi-transport` for
//! [`transport_mpi::MpiTransport`].

pub mod comms;
pub mod config;
pub mod monitor;
pub mod strings;
pub mod transport;
pub mod transport_local;

#[cfg(feature = "mpi-transport")]
pub mod transport_mpi;

pub use comms::CommsProxy;
pub use config::{ClusterConfig, ConfigError};
pub use monitor::Monitor;
pub use strings::StringHeap;
pub use transport::Transport;
pub use transport_local::LocalTransport;

#[cfg(feature = "mpi-transport")]
pub use transport_mpi::MpiTransport;

use meshrt_interp::{Interpreter, Program};
use meshrt_mailbox::Mesh;

/// Spawn one coroutine per local core running `program`, then drive the
/// monitor loop until every one of them has stopped (§6a). Returns the
/// ids of cores that reported a fatal runtime error, in case the caller
/// wants to reflect that in its process exit code.
///
/// Equivalent to [`run_mesh_with_strings`] with an empty string table —
/// use that entry point directly when `program` references preloaded
/// `STRING` literals (`Expr::Str(HeapPtr(n))` resolving to the nth
/// literal the loader interned ahead of time).
pub fn run_mesh(program: &Program, cores_per_node: u32, transport: &dyn Transport) -> Vec<u32> {
    run_mesh_with_strings(program, cores_per_node, transport, StringHeap::new())
}

/// As [`run_mesh`], but against a caller-supplied [`StringHeap`] —
/// typically [`StringHeap::with_literals`] when `program` was assembled
/// against known string-literal indices.
pub fn run_mesh_with_strings(
    program: &Program,
    cores_per_node: u32,
    transport: &dyn Transport,
    strings: StringHeap,
) -> Vec<u32> {
    let mesh = Mesh::new(cores_per_node);
    let comms = CommsProxy::new(cores_per_node);
    let monitor = Monitor::new(&mesh, &comms, transport, &strings, cores_per_node);

    #[cfg(feature = "diagnostics")]
    meshrt_interp::diagnostics::install_sigquit_handler();

    let handles: Vec<_> = (0..cores_per_node)
        .map(|core_id| {
            let handle = mesh.core(core_id).clone();
            let program = program.clone();
            may::coroutine::spawn(move || {
                let mut interp = Interpreter::new(program, core_id, cores_per_node, handle);
                interp.run_program()
            })
        })
        .collect();

    monitor.run_until_done();

    handles
        .into_iter()
        .enumerate()
        .filter_map(|(core_id, h)| match h.join() {
            Ok(Ok(())) => None,
            Ok(Err(_)) => Some(core_id as u32),
            Err(_) => Some(core_id as u32),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshrt_interp::{Expr, Program, Stmt};

    #[test]
    fn run_mesh_prints_nothing_and_converges_on_an_empty_program() {
        let program = Program::new(vec![Stmt::Stop]);
        let transport = LocalTransport::new();
        let failed = run_mesh(&program, 2, &transport);
        assert!(failed.is_empty());
    }

    #[test]
    fn run_mesh_reports_the_core_that_raised_a_runtime_error() {
        // ARRAYACCESS with too many indices against a 1-dim array (id 1)
        // is a TooManyArrIndex error on every core.
        let program = Program::new(vec![
            Stmt::DimArray { id: 1, dims: vec![Expr::Int(3)], shared: false, extendable: false },
            Stmt::ArraySet {
                id: 1,
                indices: vec![Expr::Int(0), Expr::Int(0)],
                value: Expr::Int(1),
            },
            Stmt::Stop,
        ]);
        let transport = LocalTransport::new();
        let failed = run_mesh(&program, 1, &transport);
        assert_eq!(failed, vec![0]);
    }
}
