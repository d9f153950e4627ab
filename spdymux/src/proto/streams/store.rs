use fnv::FnvBuildHasher;
use indexmap::IndexMap;
use slab::Slab;

use super::stream::Stream;
use crate::frame::StreamId;

/// Storage for streams: a slab for the values and an id index in insertion
/// order.
#[derive(Debug)]
pub(super) struct Store {
    slab: Slab<Stream>,
    ids: IndexMap<StreamId, usize, FnvBuildHasher>,
}

impl Store {
    pub fn new() -> Self {
        Store {
            slab: Slab::new(),
            ids: IndexMap::default(),
        }
    }

    pub fn find(&self, id: &StreamId) -> Option<&Stream> {
        let key = *self.ids.get(id)?;
        self.slab.get(key)
    }

    pub fn find_mut(&mut self, id: &StreamId) -> Option<&mut Stream> {
        let key = *self.ids.get(id)?;
        self.slab.get_mut(key)
    }

    pub fn contains(&self, id: &StreamId) -> bool {
        self.ids.contains_key(id)
    }

    pub fn insert(&mut self, val: Stream) -> &mut Stream {
        let id = val.id;
        let key = self.slab.insert(val);
        assert!(self.ids.insert(id, key).is_none());
        &mut self.slab[key]
    }

    pub fn remove(&mut self, id: &StreamId) -> Option<Stream> {
        // keeps the remaining ids in insertion order
        let key = self.ids.shift_remove(id)?;
        Some(self.slab.remove(key))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Snapshot of the ids, oldest first, for walks that mutate the store.
    pub fn ids(&self) -> Vec<StreamId> {
        self.ids.keys().copied().collect()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Stream> {
        self.slab.iter_mut().map(|(_, stream)| stream)
    }
}
