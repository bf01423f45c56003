use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::RecycleError;

/// One materialized visual bound to a logical index.
///
/// Records are created once per index and persist for the whole watch cycle; scrolling only
/// toggles `attached`.
#[derive(Clone, Debug)]
pub struct NodeRecord<T, V, C> {
    pub index: usize,
    /// The collection value at creation time.
    pub item: T,
    pub visual: V,
    pub context: C,
    /// Whether `visual` is currently in the host's visible tree.
    pub attached: bool,
}

impl<T, V, C> NodeRecord<T, V, C> {
    pub fn new(index: usize, item: T, visual: V, context: C) -> Self {
        Self {
            index,
            item,
            visual,
            context,
            attached: false,
        }
    }
}

/// Sparse index → record map for one watch cycle.
///
/// Ordered by index so eviction can drain everything outside a band without a full scan.
#[derive(Clone, Debug)]
pub struct NodeRegistry<T, V, C> {
    records: BTreeMap<usize, NodeRecord<T, V, C>>,
}

impl<T, V, C> Default for NodeRegistry<T, V, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, V, C> NodeRegistry<T, V, C> {
    pub fn new() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `true` once a record exists for `index`, whatever its attachment state.
    pub fn is_registered(&self, index: usize) -> bool {
        self.records.contains_key(&index)
    }

    pub fn get(&self, index: usize) -> Option<&NodeRecord<T, V, C>> {
        self.records.get(&index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut NodeRecord<T, V, C>> {
        self.records.get_mut(&index)
    }

    /// Looks up `index`, reporting records whose visual fails `is_valid` as stale.
    ///
    /// `Ok(None)` means the index was never materialized.
    pub fn lookup_valid(
        &mut self,
        index: usize,
        is_valid: impl FnOnce(&V) -> bool,
    ) -> Result<Option<&mut NodeRecord<T, V, C>>, RecycleError> {
        match self.records.get_mut(&index) {
            None => Ok(None),
            Some(record) if is_valid(&record.visual) => Ok(Some(record)),
            Some(_) => {
                vwarn!(index, "registry: stale entry");
                Err(RecycleError::StaleRegistryEntry { index })
            }
        }
    }

    /// Registers `record` under `index`, returning any record it replaces.
    pub fn put(
        &mut self,
        index: usize,
        record: NodeRecord<T, V, C>,
    ) -> Option<NodeRecord<T, V, C>> {
        debug_assert_eq!(record.index, index, "record index must match its slot");
        vtrace!(index, "registry: put");
        self.records.insert(index, record)
    }

    pub fn remove(&mut self, index: usize) -> Option<NodeRecord<T, V, C>> {
        self.records.remove(&index)
    }

    /// Iterates records in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = &NodeRecord<T, V, C>> {
        self.records.values()
    }

    pub fn attached_count(&self) -> usize {
        self.records.values().filter(|r| r.attached).count()
    }

    /// Removes every detached record whose index lies outside `lo..=hi`.
    ///
    /// Attached records are kept even when out of band; their detach is still pending.
    pub fn drain_outside(&mut self, lo: usize, hi: usize) -> Vec<NodeRecord<T, V, C>> {
        let doomed: Vec<usize> = self
            .records
            .range(..lo)
            .chain(self.records.range(hi.saturating_add(1)..))
            .filter(|(_, r)| !r.attached)
            .map(|(&i, _)| i)
            .collect();
        let mut out = Vec::with_capacity(doomed.len());
        for i in doomed {
            if let Some(record) = self.records.remove(&i) {
                out.push(record);
            }
        }
        if !out.is_empty() {
            vdebug!(evicted = out.len(), lo, hi, "registry: drain_outside");
        }
        out
    }

    /// Empties the registry, yielding records in ascending index order.
    pub fn drain(&mut self) -> impl Iterator<Item = NodeRecord<T, V, C>> {
        core::mem::take(&mut self.records).into_values()
    }
}
