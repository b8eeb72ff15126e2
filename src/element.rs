//! Geometry element tree — the component hierarchy raw IDs annotate.
//!
//! All elements live in one [`ElementTree`] arena and refer to each other by
//! [`NodeId`] index: the parent/child graph looks cyclic but is a plain tree
//! (children are reached downward, the parent link is a back-reference), and
//! the arena gives it single ownership with no recursive destruction.
//!
//! Construction is strictly sequential, parent before children: a child's ID
//! assignment reads the codec through the parent chain, which must already
//! exist. After the build pass the tree is read-only; every query here takes
//! `&self`.

use std::collections::HashMap;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::codec::{FieldValues, IdCodec};
use crate::error::{Error, Result};
use crate::geo::{VolumeId, VolumeStore};
use crate::{RawValue, NULL_RAW};

/// Handle to an element in an [`ElementTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// One node of the detector component hierarchy.
#[derive(Debug)]
pub struct GeometryElement {
    name: String,
    raw_id: RawValue,
    position: [f64; 3],
    support: Option<VolumeId>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    codec: Option<IdCodec>,
}

impl GeometryElement {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The cached packed identifier, [`NULL_RAW`] while unassigned.
    pub fn raw_id(&self) -> RawValue {
        self.raw_id
    }

    pub fn has_id(&self) -> bool {
        self.raw_id != NULL_RAW
    }

    /// Cached global position.
    ///
    /// `(0,0,0)` is the "unset" sentinel for logical-only nodes, not a true
    /// coordinate — check [`GeometryElement::has_position`] first.
    pub fn global_position(&self) -> [f64; 3] {
        self.position
    }

    pub fn has_position(&self) -> bool {
        self.position != [0.0; 3]
    }

    /// The geometry volume this element is anchored to; `None` for pure
    /// logical groupings (e.g. a tracker layer that is only a list of
    /// per-sensor children).
    pub fn support(&self) -> Option<VolumeId> {
        self.support
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// This element's own codec. Usually only set on a subdetector root;
    /// descendants resolve it via [`ElementTree::codec_of`].
    pub fn own_codec(&self) -> Option<&IdCodec> {
        self.codec.as_ref()
    }
}

/// Arena owning the full element hierarchy, plus per-node typed metadata.
#[derive(Debug, Default)]
pub struct ElementTree {
    nodes: Vec<GeometryElement>,
    metadata: HashMap<NodeId, HashMap<String, Vec<u8>>>,
}

impl ElementTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an unattached element.
    pub fn new_node(&mut self, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(GeometryElement {
            name: name.into(),
            raw_id: NULL_RAW,
            position: [0.0; 3],
            support: None,
            parent: None,
            children: Vec::new(),
            codec: None,
        });
        id
    }

    pub fn node(&self, id: NodeId) -> &GeometryElement {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Attach `child` under `parent`, setting both link directions in one
    /// place.
    ///
    /// # Panics
    ///
    /// A node is attached at most once: re-attaching a child that already has
    /// a parent would leave it in two children lists and break every
    /// downstream tree walk, so it panics in all build profiles.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        assert!(
            self.nodes[child.0].parent.is_none(),
            "element '{}' already has a parent",
            self.nodes[child.0].name
        );
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    pub fn attach_support(&mut self, node: NodeId, volume: VolumeId) {
        self.nodes[node.0].support = Some(volume);
    }

    pub fn set_position(&mut self, node: NodeId, position: [f64; 3]) {
        self.nodes[node.0].position = position;
    }

    /// Give `node` its own codec. Done once, on the subdetector root.
    pub fn set_codec(&mut self, node: NodeId, codec: IdCodec) {
        self.nodes[node.0].codec = Some(codec);
    }

    /// First direct child with an exact name match.
    pub fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.nodes[parent.0]
            .children
            .iter()
            .copied()
            .find(|&c| self.nodes[c.0].name == name)
    }

    /// Resolve the codec responsible for this element's ID: its own if set,
    /// else the nearest ancestor's.
    pub fn codec_of(&self, node: NodeId) -> Result<&IdCodec> {
        let mut current = node;
        loop {
            let element = &self.nodes[current.0];
            if let Some(codec) = &element.codec {
                return Ok(codec);
            }
            match element.parent {
                Some(parent) => current = parent,
                None => {
                    return Err(Error::NoCodecInChain {
                        element: self.nodes[node.0].name.clone(),
                    })
                }
            }
        }
    }

    /// The nearest assigned raw ID walking up from `node` (inclusive), or
    /// [`NULL_RAW`]. Children seed their own IDs from this, so subdetector
    /// discriminant bits set on the root flow down the whole subtree.
    pub fn inherited_raw(&self, node: NodeId) -> RawValue {
        let mut current = Some(node);
        while let Some(id) = current {
            let element = &self.nodes[id.0];
            if element.raw_id != NULL_RAW {
                return element.raw_id;
            }
            current = element.parent;
        }
        NULL_RAW
    }

    /// Pack explicit field values through the resolved codec and cache the
    /// result as this element's ID.
    pub fn assign_id(&mut self, node: NodeId, values: &FieldValues) -> Result<RawValue> {
        let raw = self.codec_of(node)?.pack(values)?;
        self.nodes[node.0].raw_id = raw;
        Ok(raw)
    }

    /// Cache an already-packed word as this element's ID.
    pub fn assign_raw(&mut self, node: NodeId, raw: RawValue) {
        self.nodes[node.0].raw_id = raw;
    }

    /// Assign an ID by reading the support volume's copy number into one
    /// field, inheriting all other bits from the parent chain.
    ///
    /// Fails with [`Error::MissingSupport`] if the element has no support —
    /// support-less logical nodes must use [`ElementTree::assign_id`] with
    /// explicit values instead. A support whose copy number is negative fails
    /// with [`Error::InvalidCopyNumber`].
    pub fn assign_id_from_support(
        &mut self,
        node: NodeId,
        store: &VolumeStore,
        field_index: usize,
    ) -> Result<RawValue> {
        let support = self.nodes[node.0].support.ok_or_else(|| Error::MissingSupport {
            element: self.nodes[node.0].name.clone(),
        })?;
        let copy = store.volume(support).copy_number();
        let value = u32::try_from(copy).map_err(|_| Error::InvalidCopyNumber {
            volume: store.volume(support).name().to_string(),
            copy_number: copy,
        })?;

        let base = self.inherited_raw(node);
        let raw = self.codec_of(node)?.set_field(base, field_index, value)?;
        self.nodes[node.0].raw_id = raw;
        Ok(raw)
    }

    /// Depth-first walk of the subtree rooted at `root` (root first,
    /// children in attachment order).
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            // push in reverse so attachment order is preserved
            for &child in self.nodes[id.0].children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// True if `ancestor` is `node` or one of its ancestors.
    pub fn is_descendant_of(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes[id.0].parent;
        }
        false
    }

    // =========================================================================
    // Typed per-node metadata (conditions/calibration blobs)
    // =========================================================================

    /// Attach typed metadata to a node. The type must implement
    /// `zerocopy::IntoBytes + Immutable`. Returns the previous raw bytes if
    /// any.
    pub fn set_meta<T: IntoBytes + Immutable>(
        &mut self,
        node: NodeId,
        key: impl Into<String>,
        value: &T,
    ) -> Option<Vec<u8>> {
        self.metadata
            .entry(node)
            .or_default()
            .insert(key.into(), value.as_bytes().to_vec())
    }

    /// Read typed metadata back. `None` if the key is absent or the bytes
    /// don't match the requested layout.
    pub fn get_meta<T: FromBytes + KnownLayout + Immutable>(
        &self,
        node: NodeId,
        key: &str,
    ) -> Option<&T> {
        let bytes = self.metadata.get(&node)?.get(key)?;
        T::ref_from_bytes(bytes).ok()
    }

    pub fn has_meta(&self, node: NodeId, key: &str) -> bool {
        self.metadata
            .get(&node)
            .is_some_and(|m| m.contains_key(key))
    }

    pub fn remove_meta(&mut self, node: NodeId, key: &str) -> Option<Vec<u8>> {
        self.metadata.get_mut(&node)?.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subdet::{hcal_schema, Subdetector};

    fn hcal_subtree() -> (ElementTree, NodeId, NodeId, NodeId, NodeId) {
        // root (owns codec) -> section -> layer -> strip
        let mut tree = ElementTree::new();
        let root = tree.new_node("hcal");
        tree.set_codec(root, hcal_schema());

        let section = tree.new_node("hcal_back");
        tree.add_child(root, section);
        let layer = tree.new_node("hcal_back_layer4");
        tree.add_child(section, layer);
        let strip = tree.new_node("hcal_back_layer4_strip0");
        tree.add_child(layer, strip);

        (tree, root, section, layer, strip)
    }

    #[test]
    fn parent_child_symmetry() {
        let (tree, root, section, layer, strip) = hcal_subtree();
        for (parent, child) in [(root, section), (section, layer), (layer, strip)] {
            let name = tree.node(child).name().to_string();
            assert_eq!(tree.find_child(parent, &name), Some(child));
            assert_eq!(tree.node(child).parent(), Some(parent));
        }
        assert_eq!(tree.find_child(root, "nope"), None);
    }

    #[test]
    fn codec_resolves_three_levels_down_to_the_same_instance() {
        let (tree, root, _, _, strip) = hcal_subtree();
        let from_root = tree.codec_of(root).unwrap();
        let from_strip = tree.codec_of(strip).unwrap();
        assert!(std::ptr::eq(from_root, from_strip));
    }

    #[test]
    fn codec_chain_fails_without_any_codec() {
        let mut tree = ElementTree::new();
        let lonely = tree.new_node("orphan");
        let err = tree.codec_of(lonely).unwrap_err();
        assert!(matches!(err, Error::NoCodecInChain { .. }));
    }

    #[test]
    fn assign_id_inherits_discriminant_from_root() {
        let (mut tree, root, _, layer, _) = hcal_subtree();

        let codec = hcal_schema();
        let mut v = codec.values();
        v.set(0, Subdetector::Hcal as u32).unwrap();
        let root_raw = tree.assign_id(root, &v).unwrap();
        assert_eq!(Subdetector::from_raw(root_raw), Some(Subdetector::Hcal));

        // layer gets its number from a support volume, rest inherited
        let mut store = VolumeStore::new();
        let vol = store.add_volume("hcal_back_layer4", 4, [0.0, 0.0, 870.0]);
        tree.attach_support(layer, vol);
        let raw = tree.assign_id_from_support(layer, &store, 1).unwrap();

        let decoded = codec.unpack(raw);
        assert_eq!(decoded.as_slice(), &[6, 4, 0]);
    }

    #[test]
    fn assign_from_support_without_support_fails() {
        let (mut tree, _, _, layer, _) = hcal_subtree();
        let store = VolumeStore::new();
        let err = tree.assign_id_from_support(layer, &store, 1).unwrap_err();
        match err {
            Error::MissingSupport { element } => assert_eq!(element, "hcal_back_layer4"),
            other => panic!("expected MissingSupport, got {other:?}"),
        }
    }

    #[test]
    #[should_panic(expected = "already has a parent")]
    fn reattaching_a_child_panics() {
        let mut tree = ElementTree::new();
        let first = tree.new_node("first");
        let second = tree.new_node("second");
        let child = tree.new_node("child");
        tree.add_child(first, child);
        tree.add_child(second, child);
    }

    #[test]
    fn negative_copy_number_names_the_volume() {
        let (mut tree, _, _, layer, _) = hcal_subtree();
        let mut store = VolumeStore::new();
        let vol = store.add_volume("hcal_back_layer4", -4, [0.0; 3]);
        tree.attach_support(layer, vol);

        let err = tree.assign_id_from_support(layer, &store, 1).unwrap_err();
        match err {
            Error::InvalidCopyNumber { volume, copy_number } => {
                assert_eq!(volume, "hcal_back_layer4");
                assert_eq!(copy_number, -4);
            }
            other => panic!("expected InvalidCopyNumber, got {other:?}"),
        }
    }

    #[test]
    fn position_sentinel() {
        let mut tree = ElementTree::new();
        let node = tree.new_node("logical_layer");
        assert!(!tree.node(node).has_position());
        assert_eq!(tree.node(node).global_position(), [0.0; 3]);

        tree.set_position(node, [0.0, 0.0, 870.0]);
        assert!(tree.node(node).has_position());
    }

    #[test]
    fn descendants_walk_order() {
        let (tree, root, section, layer, strip) = hcal_subtree();
        assert_eq!(tree.descendants(root), vec![root, section, layer, strip]);
        assert!(tree.is_descendant_of(strip, root));
        assert!(tree.is_descendant_of(root, root));
        assert!(!tree.is_descendant_of(root, strip));
    }

    #[test]
    fn typed_metadata_round_trip() {
        let (mut tree, root, ..) = hcal_subtree();

        tree.set_meta(root, "pedestal", &50i32);
        tree.set_meta(root, "gain", &7u16);

        assert_eq!(tree.get_meta::<i32>(root, "pedestal"), Some(&50i32));
        assert_eq!(tree.get_meta::<u16>(root, "gain"), Some(&7u16));
        assert_eq!(tree.get_meta::<i32>(root, "missing"), None);
        // wrong layout reads back as None
        assert_eq!(tree.get_meta::<u64>(root, "pedestal"), None);

        assert!(tree.has_meta(root, "gain"));
        assert!(tree.remove_meta(root, "gain").is_some());
        assert!(!tree.has_meta(root, "gain"));
    }
}
