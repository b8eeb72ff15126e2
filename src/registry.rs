//! Element registry — reverse lookup from raw IDs, geometry volumes, and
//! positions back to tree nodes.
//!
//! Built in a single walk once the element tree is complete, and rebuilt from
//! scratch if the tree ever changes (in practice: never, the tree is
//! immutable after construction). Two distinct elements packing to the same
//! raw ID means the bit schema is broken, so collisions fail the build
//! instead of silently overwriting.

use std::collections::HashMap;

use log::{debug, info};

use crate::element::{ElementTree, NodeId};
use crate::error::{Error, Result};
use crate::geo::{VolumeId, VolumeStore};
use crate::RawValue;

/// Default search radius for position lookup, in the geometry's length units
/// (millimeters for the standard detector descriptions).
pub const DEFAULT_POSITION_TOLERANCE: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ElementRegistry {
    id_to_element: HashMap<RawValue, NodeId>,
    volume_to_element: HashMap<VolumeId, NodeId>,
    /// Leaves with a real (non-sentinel) cached position.
    positioned_leaves: Vec<(NodeId, [f64; 3])>,
    tolerance: f64,
}

impl ElementRegistry {
    /// Build the lookup maps for the subtree rooted at `root`.
    ///
    /// Elements with an unassigned (zero) raw ID are skipped in the ID map;
    /// every element with a support volume is indexed by it.
    pub fn build(tree: &ElementTree, store: &VolumeStore, root: NodeId) -> Result<Self> {
        let mut id_to_element = HashMap::new();
        let mut volume_to_element = HashMap::new();
        let mut positioned_leaves = Vec::new();

        for node in tree.descendants(root) {
            let element = tree.node(node);

            if element.has_id() {
                if let Some(&existing) = id_to_element.get(&element.raw_id()) {
                    return Err(Error::DuplicateId {
                        raw: element.raw_id(),
                        first: tree.node(existing).name().to_string(),
                        second: element.name().to_string(),
                    });
                }
                id_to_element.insert(element.raw_id(), node);
            }

            if let Some(volume) = element.support() {
                if let Some(&existing) = volume_to_element.get(&volume) {
                    return Err(Error::DuplicateVolume {
                        volume: store.volume(volume).name().to_string(),
                        first: tree.node(existing).name().to_string(),
                        second: element.name().to_string(),
                    });
                }
                volume_to_element.insert(volume, node);
            }

            if element.is_leaf() && element.has_position() {
                positioned_leaves.push((node, element.global_position()));
            }
        }

        info!(
            "element registry built: {} IDs, {} volumes, {} positioned leaves",
            id_to_element.len(),
            volume_to_element.len(),
            positioned_leaves.len()
        );

        Ok(Self {
            id_to_element,
            volume_to_element,
            positioned_leaves,
            tolerance: DEFAULT_POSITION_TOLERANCE,
        })
    }

    /// Override the position-lookup search radius.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// The element that produced this hit ID.
    pub fn lookup_by_id(&self, raw: RawValue) -> Option<NodeId> {
        self.id_to_element.get(&raw).copied()
    }

    /// The element anchored to this geometry volume.
    pub fn lookup_by_volume(&self, volume: VolumeId) -> Option<NodeId> {
        self.volume_to_element.get(&volume).copied()
    }

    pub fn id_count(&self) -> usize {
        self.id_to_element.len()
    }

    pub fn volume_count(&self) -> usize {
        self.volume_to_element.len()
    }

    /// The positioned leaf nearest to `point`, or `None` if no leaf lies
    /// within the configured tolerance.
    ///
    /// With `hint`, only leaves inside that subtree are considered — used to
    /// restrict the search to one subdetector when the caller already knows
    /// which subsystem a point belongs to.
    pub fn lookup_by_position(
        &self,
        tree: &ElementTree,
        point: [f64; 3],
        hint: Option<NodeId>,
    ) -> Option<NodeId> {
        let mut best: Option<(NodeId, f64)> = None;
        for &(leaf, position) in &self.positioned_leaves {
            if let Some(subtree) = hint
                && !tree.is_descendant_of(leaf, subtree)
            {
                continue;
            }
            let d = distance(position, point);
            if d <= self.tolerance && best.is_none_or(|(_, bd)| d < bd) {
                best = Some((leaf, d));
            }
        }
        if let Some((leaf, d)) = best {
            debug!(
                "position {:?} resolved to '{}' at distance {:.3}",
                point,
                tree.node(leaf).name(),
                d
            );
        }
        best.map(|(leaf, _)| leaf)
    }
}

fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}
