//! Inter-node transport (§4.6 — part of Component F). A cluster of mesh
//! processes (one per node) must send bytes to each other's rank somehow;
//! this trait is the seam, feature-gated so a default build never links
//! a real messaging library: `local_transport` is always available and
//! is what a single-process run uses, `mpi_transport` is compiled in
//! behind the `mpi-transport` feature and backed by the real `mpi`
//! (rsmpi) crate when a cluster actually spans nodes.

use serde::{Deserialize, Serialize};

/// Opaque handle to an in-flight non-blocking send/receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

/// A message tag, used to match a `recv` to the `send` it corresponds to
/// (mirrors `MPI_Isend`/`MPI_Irecv`'s tag parameter, §4.6's
/// `BARRIER_SIG`/`REDUCE_SIG` usage).
pub type Tag = u32;

/// Inter-node message-passing substrate. Every method here is
/// non-blocking except `barrier`, matching the original's
/// `MPI_Issend`/`MPI_Irecv`/`MPI_Test` usage — a rank never blocks
/// waiting on a single peer, only on the collective.
pub trait Transport: Send + Sync {
    fn rank(&self) -> u32;
    fn world_size(&self) -> u32;

    /// Begin sending `payload` to `dest_rank` tagged `tag`. Returns
    /// immediately; call `test` to learn when the send has completed.
    fn isend(&self, dest_rank: u32, tag: Tag, payload: Vec<u8>) -> RequestId;

    /// Begin receiving from `src_rank` tagged `tag`. Returns immediately;
    /// call `test` to poll for the bytes.
    fn irecv(&self, src_rank: u32, tag: Tag) -> RequestId;

    /// Non-blocking poll (`MPI_Test`): `Some(bytes)` once the operation
    /// has completed (empty for a completed send), `None` if still
    /// pending.
    fn test(&self, req: RequestId) -> Option<Vec<u8>>;

    /// Block until every rank in the world has called `barrier` — the
    /// cross-node half of `SYNC` (§4.6's `BARRIER_SIG`).
    fn barrier(&self);
}

/// Serialize a value for transport (`bincode`, the same encoding used
/// for `.mbc` program snapshots).
pub fn encode<T: Serialize>(value: &T) -> Vec<u8> {
    bincode::serialize(value).expect("in-memory values always serialize")
}

pub fn decode<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> T {
    bincode::deserialize(bytes).expect("transport payload was corrupted or mismatched")
}
