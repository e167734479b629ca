//! Cluster records and partition storage.

use pn_core::{ClusterId, ElementId};

/// One connected component of a partition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cluster {
    pub id: ClusterId,
    /// Touches at least one inlet throat.
    pub inlet: bool,
    /// Touches at least one outlet throat.
    pub outlet: bool,
}

impl Cluster {
    pub fn spanning(&self) -> bool {
        self.inlet && self.outlet
    }
}

/// A fully recomputed partition: dense cluster records plus an element →
/// cluster membership map. Owned exclusively by the caller that asked for
/// it; never updated incrementally.
#[derive(Clone, Debug, Default)]
pub struct ClusterSet {
    pub(crate) clusters: Vec<Cluster>,
    /// Per-element cluster index; `None` for elements outside the partition.
    pub(crate) membership: Vec<Option<u32>>,
}

impl ClusterSet {
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// The cluster containing `element`, if it is in the partition.
    pub fn cluster_of(&self, element: ElementId) -> Option<&Cluster> {
        let idx = (*self.membership.get(element.idx())?)?;
        Some(&self.clusters[idx as usize])
    }

    /// Membership test.
    pub fn contains(&self, element: ElementId) -> bool {
        self.membership
            .get(element.idx())
            .is_some_and(|m| m.is_some())
    }

    /// Same-cluster test; false when either element is outside the partition.
    pub fn connected(&self, a: ElementId, b: ElementId) -> bool {
        match (
            self.membership.get(a.idx()).copied().flatten(),
            self.membership.get(b.idx()).copied().flatten(),
        ) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    pub fn reaches_inlet(&self, element: ElementId) -> bool {
        self.cluster_of(element).is_some_and(|c| c.inlet)
    }

    pub fn reaches_outlet(&self, element: ElementId) -> bool {
        self.cluster_of(element).is_some_and(|c| c.outlet)
    }

    pub fn is_spanning(&self, element: ElementId) -> bool {
        self.cluster_of(element).is_some_and(|c| c.spanning())
    }

    /// Any cluster spans inlet to outlet.
    pub fn has_spanning(&self) -> bool {
        self.clusters.iter().any(|c| c.spanning())
    }
}

/// Which per-element partition a clustering result belongs to.
///
/// The same element simultaneously belongs to several independent
/// partitions; simulators keep one recomputed `ClusterSet` per slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PartitionSlot {
    /// Bulk oil occupancy.
    OilPhase,
    /// Bulk water occupancy.
    WaterPhase,
    /// Oil moves through bulk or film.
    OilConductor,
    /// Water moves through bulk or film.
    WaterConductor,
    /// Oil moves through an active corner film only.
    OilFilmConductor,
    /// Water moves through an active corner film only.
    WaterFilmConductor,
}

impl PartitionSlot {
    pub const COUNT: usize = 6;

    pub fn index(self) -> usize {
        match self {
            PartitionSlot::OilPhase => 0,
            PartitionSlot::WaterPhase => 1,
            PartitionSlot::OilConductor => 2,
            PartitionSlot::WaterConductor => 3,
            PartitionSlot::OilFilmConductor => 4,
            PartitionSlot::WaterFilmConductor => 5,
        }
    }
}

/// Fixed small array of per-slot partitions.
#[derive(Clone, Debug, Default)]
pub struct Partitions {
    slots: [Option<ClusterSet>; PartitionSlot::COUNT],
}

impl Partitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a freshly recomputed partition, discarding any stale one.
    pub fn set(&mut self, slot: PartitionSlot, set: ClusterSet) {
        self.slots[slot.index()] = Some(set);
    }

    pub fn get(&self, slot: PartitionSlot) -> Option<&ClusterSet> {
        self.slots[slot.index()].as_ref()
    }

    /// The stored partition, or an empty one: a slot that was never
    /// recomputed answers false to every reachability query.
    pub fn get_or_empty(&self, slot: PartitionSlot) -> &ClusterSet {
        static EMPTY: ClusterSet = ClusterSet {
            clusters: Vec::new(),
            membership: Vec::new(),
        };
        self.slots[slot.index()].as_ref().unwrap_or(&EMPTY)
    }

    /// Drop every stored partition (e.g. after phase mutation).
    pub fn invalidate_all(&mut self) {
        for s in &mut self.slots {
            *s = None;
        }
    }
}
