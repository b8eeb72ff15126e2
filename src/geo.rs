//! Geometry-volume arena — the crate's stand-in for the externally-owned
//! geometry layer.
//!
//! Mirrors the accessor surface the real geometry library exposes (name,
//! copy number, placement translation, child enumeration), with volumes held
//! in an index arena and referred to by copyable [`VolumeId`] handles so the
//! element tree and lookup maps never hold raw pointers into foreign memory.

use crate::error::{Error, Result};

/// Handle to a volume in a [`VolumeStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VolumeId(usize);

/// One placed geometry volume.
#[derive(Debug, Clone)]
pub struct Volume {
    name: String,
    copy_number: i32,
    translation: [f64; 3],
    parent: Option<VolumeId>,
    children: Vec<VolumeId>,
}

impl Volume {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The integer tag conventionally reused as the numeric input to
    /// ID-field assignment (layer number, station number, bar number).
    pub fn copy_number(&self) -> i32 {
        self.copy_number
    }

    /// Global placement translation.
    pub fn translation(&self) -> [f64; 3] {
        self.translation
    }

    pub fn parent(&self) -> Option<VolumeId> {
        self.parent
    }

    pub fn children(&self) -> &[VolumeId] {
        &self.children
    }
}

/// Arena of geometry volumes.
#[derive(Debug, Clone, Default)]
pub struct VolumeStore {
    volumes: Vec<Volume>,
}

impl VolumeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a top-level volume.
    pub fn add_volume(
        &mut self,
        name: impl Into<String>,
        copy_number: i32,
        translation: [f64; 3],
    ) -> VolumeId {
        self.push(name.into(), copy_number, translation, None)
    }

    /// Add a volume placed inside `parent`.
    pub fn add_child(
        &mut self,
        parent: VolumeId,
        name: impl Into<String>,
        copy_number: i32,
        translation: [f64; 3],
    ) -> VolumeId {
        let id = self.push(name.into(), copy_number, translation, Some(parent));
        self.volumes[parent.0].children.push(id);
        id
    }

    fn push(
        &mut self,
        name: String,
        copy_number: i32,
        translation: [f64; 3],
        parent: Option<VolumeId>,
    ) -> VolumeId {
        let id = VolumeId(self.volumes.len());
        self.volumes.push(Volume {
            name,
            copy_number,
            translation,
            parent,
            children: Vec::new(),
        });
        id
    }

    pub fn volume(&self, id: VolumeId) -> &Volume {
        &self.volumes[id.0]
    }

    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VolumeId, &Volume)> {
        self.volumes
            .iter()
            .enumerate()
            .map(|(i, v)| (VolumeId(i), v))
    }

    /// First child of `parent` whose name starts with `prefix`.
    ///
    /// Absence of a required volume is a geometry misconfiguration, so this
    /// fails rather than returning an option.
    pub fn find_by_prefix(&self, parent: VolumeId, prefix: &str) -> Result<VolumeId> {
        self.children_by_prefix(parent, prefix)
            .next()
            .ok_or_else(|| Error::VolumeNotFound {
                prefix: prefix.to_string(),
                parent: self.volume(parent).name().to_string(),
            })
    }

    /// All children of `parent` whose names start with `prefix`.
    pub fn children_by_prefix<'a>(
        &'a self,
        parent: VolumeId,
        prefix: &'a str,
    ) -> impl Iterator<Item = VolumeId> + 'a {
        self.volumes[parent.0]
            .children
            .iter()
            .copied()
            .filter(move |&c| self.volume(c).name().starts_with(prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arena_links_parent_and_children() {
        let mut store = VolumeStore::new();
        let world = store.add_volume("world", 0, [0.0; 3]);
        let ecal = store.add_child(world, "ecal_envelope", 0, [0.0, 0.0, 220.0]);
        let layer = store.add_child(ecal, "ecal_layer1", 1, [0.0, 0.0, 223.5]);

        assert_eq!(store.volume(layer).parent(), Some(ecal));
        assert_eq!(store.volume(world).children(), &[ecal]);
        assert_eq!(store.volume(layer).copy_number(), 1);
        assert_eq!(store.volume(layer).translation()[2], 223.5);
    }

    #[test]
    fn prefix_search() {
        let mut store = VolumeStore::new();
        let world = store.add_volume("world", 0, [0.0; 3]);
        store.add_child(world, "hcal_back", 0, [0.0; 3]);
        let ecal = store.add_child(world, "ecal_envelope", 0, [0.0; 3]);

        assert_eq!(store.find_by_prefix(world, "ecal").unwrap(), ecal);

        let err = store.find_by_prefix(world, "tagger").unwrap_err();
        assert!(matches!(err, Error::VolumeNotFound { .. }));
    }

    #[test]
    fn prefix_search_multiple_matches() {
        let mut store = VolumeStore::new();
        let world = store.add_volume("world", 0, [0.0; 3]);
        let s1 = store.add_child(world, "recoil_l5_sensor1", 5, [0.0; 3]);
        let s2 = store.add_child(world, "recoil_l5_sensor2", 5, [1.0, 0.0, 0.0]);
        store.add_child(world, "recoil_l6_sensor1", 6, [0.0; 3]);

        let matches: Vec<_> = store.children_by_prefix(world, "recoil_l5").collect();
        assert_eq!(matches, vec![s1, s2]);
    }
}
