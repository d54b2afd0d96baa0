//! Default transport: a single-rank, single-process loopback. Used
//! whenever the `mpi-transport` feature is off, or a cluster config
//! declares exactly one node — no inter-node hop is needed, so `isend`
//! completes synchronously into a queue `irecv` immediately drains.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::transport::{RequestId, Tag, Transport};

enum Pending {
    SendDone,
    RecvWaiting,
    RecvDone(Vec<u8>),
}

pub struct LocalTransport {
    next_req: AtomicU64,
    inbox: Mutex<HashMap<Tag, Vec<u8>>>,
    pending: Mutex<HashMap<u64, Pending>>,
}

impl LocalTransport {
    pub fn new() -> Self {
        Self {
            next_req: AtomicU64::new(1),
            inbox: Mutex::new(HashMap::new()),
            pending: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for LocalTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for LocalTransport {
    fn rank(&self) -> u32 {
        0
    }

    fn world_size(&self) -> u32 {
        1
    }

    fn isend(&self, dest_rank: u32, tag: Tag, payload: Vec<u8>) -> RequestId {
        debug_assert_eq!(dest_rank, 0, "single-rank transport: only rank 0 exists");
        self.inbox.lock().unwrap().insert(tag, payload);
        let id = self.next_req.fetch_add(1, Ordering::Relaxed);
        self.pending.lock().unwrap().insert(id, Pending::SendDone);
        RequestId(id)
    }

    fn irecv(&self, src_rank: u32, tag: Tag) -> RequestId {
        debug_assert_eq!(src_rank, 0, "single-rank transport: only rank 0 exists");
        let id = self.next_req.fetch_add(1, Ordering::Relaxed);
        let state = match self.inbox.lock().unwrap().remove(&tag) {
            Some(bytes) => Pending::RecvDone(bytes),
            None => Pending::RecvWaiting,
        };
        self.pending.lock().unwrap().insert(id, state);
        RequestId(id)
    }

    fn test(&self, req: RequestId) -> Option<Vec<u8>> {
        let mut pending = self.pending.lock().unwrap();
        match pending.get(&req.0)? {
            Pending::SendDone => {
                pending.remove(&req.0);
                Some(Vec::new())
            }
            Pending::RecvDone(_) => match pending.remove(&req.0) {
                Some(Pending::RecvDone(bytes)) => Some(bytes),
                _ => unreachable!(),
            },
            Pending::RecvWaiting => None,
        }
    }

    fn barrier(&self) {
        // A single rank is always at the barrier alone.
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_then_recv_round_trips_immediately() {
        let t = LocalTransport::new();
        let send = t.isend(0, 7, b"hello".to_vec());
        assert_eq!(t.test(send), Some(Vec::new()));

        let recv = t.irecv(0, 7);
        assert_eq!(t.test(recv), Some(b"hello".to_vec()));
    }

    #[test]
    fn recv_before_send_is_pending_until_data_arrives() {
        let t = LocalTransport::new();
        let recv = t.irecv(0, 3);
        assert_eq!(t.test(recv), None);
        t.isend(0, 3, b"late".to_vec());
        // A fresh irecv after the send sees the now-buffered payload.
        let recv2 = t.irecv(0, 3);
        assert_eq!(t.test(recv2), Some(b"late".to_vec()));
    }
}
