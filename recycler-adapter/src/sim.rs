//! An in-memory host for tests, examples and headless runs.
//!
//! [`SimHost`] keeps an ordered "retained tree" of attached visuals, remembers every position
//! and container extent it was given, counts collaborator calls, and can be told to fail the
//! next few binds, attaches or detaches.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use recycler::{BindingContext, HostError, IterationMetadata};

use crate::{Anchor, BindRequest, Bound, RepeatHost};

/// A visual handle: a unique id plus the index it was bound for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SimVisual {
    pub id: u64,
    pub index: usize,
}

/// The per-item scope handed back by [`SimHost::bind`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SimContext {
    pub value_identifier: String,
    /// `Debug` rendering of the bound item.
    pub label: String,
    pub metadata: Option<IterationMetadata>,
}

impl BindingContext for SimContext {
    fn update_iteration_metadata(&mut self, metadata: IterationMetadata) {
        self.metadata = Some(metadata);
    }
}

/// Collaborator call counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimStats {
    pub binds: usize,
    pub attaches: usize,
    pub detaches: usize,
    pub disposes: usize,
}

#[derive(Clone, Debug)]
pub struct SimHost {
    item_height: f32,
    tree: Vec<SimVisual>,
    live: BTreeMap<u64, SimVisual>,
    positions: BTreeMap<u64, u64>,
    invalidated: BTreeSet<u64>,
    container_extent: Option<u64>,
    next_id: u64,
    fail_binds: usize,
    fail_attaches: usize,
    fail_detaches: usize,
    bind_log: Vec<usize>,
    stats: SimStats,
}

impl SimHost {
    /// Creates a host whose visuals all measure `item_height` pixels.
    pub fn new(item_height: f32) -> Self {
        Self {
            item_height,
            tree: Vec::new(),
            live: BTreeMap::new(),
            positions: BTreeMap::new(),
            invalidated: BTreeSet::new(),
            container_extent: None,
            next_id: 0,
            fail_binds: 0,
            fail_attaches: 0,
            fail_detaches: 0,
            bind_log: Vec::new(),
            stats: SimStats::default(),
        }
    }

    pub fn set_item_height(&mut self, item_height: f32) {
        self.item_height = item_height;
    }

    /// Attached visuals in tree order.
    pub fn tree(&self) -> &[SimVisual] {
        &self.tree
    }

    pub fn attached_indices(&self) -> Vec<usize> {
        self.tree.iter().map(|v| v.index).collect()
    }

    /// Number of visuals bound but not yet disposed.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn offset_of(&self, visual: &SimVisual) -> Option<u64> {
        self.positions.get(&visual.id).copied()
    }

    /// The last container extent reported by the controller.
    pub fn container_extent(&self) -> Option<u64> {
        self.container_extent
    }

    /// Indices in the order they were bound.
    pub fn bind_log(&self) -> &[usize] {
        &self.bind_log
    }

    pub fn stats(&self) -> SimStats {
        self.stats
    }

    pub fn fail_next_binds(&mut self, n: usize) {
        self.fail_binds = n;
    }

    pub fn fail_next_attaches(&mut self, n: usize) {
        self.fail_attaches = n;
    }

    pub fn fail_next_detaches(&mut self, n: usize) {
        self.fail_detaches = n;
    }

    /// Invalidates every live visual bound for `index`, as if the host destroyed it.
    pub fn invalidate_index(&mut self, index: usize) {
        let ids: Vec<u64> = self
            .live
            .values()
            .filter(|v| v.index == index)
            .map(|v| v.id)
            .collect();
        for id in ids {
            self.invalidated.insert(id);
            self.tree.retain(|v| v.id != id);
        }
    }

    fn take_failure(counter: &mut usize) -> bool {
        if *counter == 0 {
            return false;
        }
        *counter -= 1;
        true
    }
}

impl Default for SimHost {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl<T: fmt::Debug> RepeatHost<T> for SimHost {
    type Visual = SimVisual;
    type Context = SimContext;

    fn bind(
        &mut self,
        request: BindRequest<'_, T>,
    ) -> Result<Bound<SimVisual, SimContext>, HostError> {
        if Self::take_failure(&mut self.fail_binds) {
            return Err(HostError::Busy);
        }
        let visual = SimVisual {
            id: self.next_id,
            index: request.index,
        };
        self.next_id += 1;
        self.live.insert(visual.id, visual);
        self.bind_log.push(request.index);
        self.stats.binds += 1;
        Ok(Bound {
            visual,
            context: SimContext {
                value_identifier: request.value_identifier.to_string(),
                label: format!("{:?}", request.item),
                metadata: None,
            },
        })
    }

    fn measure(&self, visual: &SimVisual) -> Result<f32, HostError> {
        if !self.live.contains_key(&visual.id) {
            return Err(HostError::InvalidHandle);
        }
        Ok(self.item_height)
    }

    fn position(&mut self, visual: &SimVisual, offset: u64) {
        self.positions.insert(visual.id, offset);
    }

    fn set_container_extent(&mut self, extent: u64) {
        self.container_extent = Some(extent);
    }

    fn attach(&mut self, visual: &SimVisual, anchor: Anchor<'_, SimVisual>) -> Result<(), HostError> {
        if Self::take_failure(&mut self.fail_attaches) {
            return Err(HostError::Busy);
        }
        if self.invalidated.contains(&visual.id) || !self.live.contains_key(&visual.id) {
            return Err(HostError::InvalidHandle);
        }
        if self.tree.iter().any(|v| v.id == visual.id) {
            return Err(HostError::Other(format!("visual {} is already attached", visual.id)));
        }
        let at = match anchor {
            Anchor::Start => 0,
            Anchor::End => self.tree.len(),
            Anchor::After(prev) => self
                .tree
                .iter()
                .position(|v| v.id == prev.id)
                .map_or(self.tree.len(), |p| p + 1),
        };
        self.tree.insert(at, *visual);
        self.stats.attaches += 1;
        Ok(())
    }

    fn detach(&mut self, visual: &SimVisual) -> Result<(), HostError> {
        if Self::take_failure(&mut self.fail_detaches) {
            return Err(HostError::Busy);
        }
        let Some(at) = self.tree.iter().position(|v| v.id == visual.id) else {
            return Err(HostError::InvalidHandle);
        };
        self.tree.remove(at);
        self.stats.detaches += 1;
        Ok(())
    }

    fn is_valid(&self, visual: &SimVisual) -> bool {
        !self.invalidated.contains(&visual.id)
    }

    fn dispose(&mut self, visual: SimVisual, _context: SimContext) {
        self.tree.retain(|v| v.id != visual.id);
        self.live.remove(&visual.id);
        self.positions.remove(&visual.id);
        self.invalidated.remove(&visual.id);
        self.stats.disposes += 1;
    }
}
