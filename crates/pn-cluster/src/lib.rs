//! pn-cluster: percolation clustering over the pore network.
//!
//! Partitions a predicate-selected subset of elements into connected
//! components via union-find, flagging clusters that touch the inlet,
//! the outlet, or both (spanning). Cluster sets are ephemeral: every
//! call to [`cluster`] recomputes one partition from scratch.

pub mod cluster;
pub mod engine;
pub mod unionfind;

pub use cluster::{Cluster, ClusterSet, PartitionSlot, Partitions};
pub use engine::cluster;
pub use unionfind::DisjointSet;
