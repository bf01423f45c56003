use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use recycler::{
    BindingContext, HostError, IterationMetadata, NodeRecord, NodeRegistry, RecycleError,
    WindowBounds, WindowSnapshot, WindowState, geometry,
};

use crate::{
    Anchor, BindRequest, Bound, EvictionPolicy, RepeatHost, RepeatOptions, ScrollCoalescer,
    ScrollSample, ViewportProvider,
};

/// What a single scroll sample did to the window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScrollOutcome {
    /// Inside the deadband, or nothing to window.
    Idle,
    Advanced(WindowBounds),
    Retreated(WindowBounds),
    /// The host could not materialize the entering node; bounds are unchanged and the next
    /// sample retries.
    Deferred(HostError),
}

impl ScrollOutcome {
    pub fn is_shift(&self) -> bool {
        matches!(self, Self::Advanced(_) | Self::Retreated(_))
    }
}

/// A lightweight view of the controller for diagnostics.
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControllerSnapshot {
    pub window: Option<WindowSnapshot>,
    pub registered: usize,
    pub attached: usize,
    pub pending_detach: usize,
}

#[derive(Debug)]
enum Materialized {
    Reused,
    Reattached,
    Created,
    Deferred(HostError),
}

#[derive(Clone, Copy, Debug)]
enum Slot {
    Start,
    End,
    After(usize),
}

/// State owned for the lifetime of one collection identity.
struct WatchCycle<T, V, C> {
    collection: Arc<[T]>,
    window: Option<WindowState>,
    registry: NodeRegistry<T, V, C>,
    pending_detach: Vec<usize>,
    last_error: Option<HostError>,
}

impl<T: Clone, V, C: BindingContext> WatchCycle<T, V, C> {
    fn new(collection: Arc<[T]>) -> Self {
        Self {
            collection,
            window: None,
            registry: NodeRegistry::new(),
            pending_detach: Vec::new(),
            last_error: None,
        }
    }

    fn anchor(&self, slot: Slot) -> Anchor<'_, V> {
        match slot {
            Slot::Start => Anchor::Start,
            Slot::End => Anchor::End,
            Slot::After(i) => self
                .registry
                .get(i)
                .filter(|r| r.attached)
                .map_or(Anchor::End, |r| Anchor::After(&r.visual)),
        }
    }

    /// Binds, stamps, positions, attaches and registers a node that was never materialized.
    ///
    /// The record is registered even when the attach fails, so a retry only re-attaches.
    fn create<H>(
        &mut self,
        host: &mut H,
        value_identifier: &str,
        index: usize,
        offset: u64,
        slot: Slot,
    ) -> Result<(), HostError>
    where
        H: RepeatHost<T, Visual = V, Context = C>,
    {
        let len = self.collection.len();
        let item = &self.collection[index];
        let Bound {
            visual,
            mut context,
        } = host.bind(BindRequest {
            index,
            item,
            value_identifier,
            collection_len: len,
        })?;
        context.update_iteration_metadata(IterationMetadata::new(index, len));
        host.position(&visual, offset);

        let mut record = NodeRecord::new(index, item.clone(), visual, context);
        let attached = host.attach(&record.visual, self.anchor(slot));
        record.attached = attached.is_ok();
        self.registry.put(index, record);
        attached
    }

    fn reattach<H>(&mut self, host: &mut H, index: usize, slot: Slot) -> Result<(), HostError>
    where
        H: RepeatHost<T, Visual = V, Context = C>,
    {
        let Some(record) = self.registry.get(index) else {
            return Err(HostError::InvalidHandle);
        };
        host.attach(&record.visual, self.anchor(slot))?;
        if let Some(record) = self.registry.get_mut(index) {
            record.attached = true;
        }
        Ok(())
    }

    /// Creates the node at `index`, or re-attaches the one already registered there.
    fn materialize<H>(
        &mut self,
        host: &mut H,
        value_identifier: &str,
        index: usize,
        slot: Slot,
    ) -> Result<Materialized, RecycleError>
    where
        H: RepeatHost<T, Visual = V, Context = C>,
    {
        let len = self.collection.len();
        if index >= len {
            debug_assert!(index < len, "materialize out of range (i={index}, len={len})");
            return Err(RecycleError::IndexOutOfRange {
                index: index as i64,
                len,
            });
        }
        let offset = self
            .window
            .as_ref()
            .ok_or(RecycleError::NotInitialized)?
            .offset_of(index);

        let lookup = self
            .registry
            .lookup_valid(index, |v| host.is_valid(v))
            .map(|found| found.map(|r| r.attached));
        let attached = match lookup {
            Ok(attached) => attached,
            Err(RecycleError::StaleRegistryEntry { index }) => {
                self.discard(host, index);
                None
            }
            Err(err) => return Err(err),
        };

        let how = match attached {
            Some(true) => Materialized::Reused,
            Some(false) => match self.reattach(host, index, slot) {
                Ok(()) => Materialized::Reattached,
                Err(err) => Materialized::Deferred(err),
            },
            None => match self.create(host, value_identifier, index, offset, slot) {
                Ok(()) => Materialized::Created,
                Err(err) => Materialized::Deferred(err),
            },
        };
        vtrace!(index, how = ?how, "materialize");
        Ok(how)
    }

    /// Drops a record whose visual the host invalidated.
    fn discard<H>(&mut self, host: &mut H, index: usize)
    where
        H: RepeatHost<T, Visual = V, Context = C>,
    {
        self.pending_detach.retain(|&i| i != index);
        if let Some(record) = self.registry.remove(index) {
            host.dispose(record.visual, record.context);
        }
    }

    /// Detaches the node at `index`; a failed detach is queued for the next sample.
    fn detach_or_queue<H>(&mut self, host: &mut H, index: usize)
    where
        H: RepeatHost<T, Visual = V, Context = C>,
    {
        let Some(record) = self.registry.get_mut(index) else {
            return;
        };
        if !record.attached {
            return;
        }
        match host.detach(&record.visual) {
            Ok(()) => record.attached = false,
            Err(err) => {
                vwarn!(index, "detach failed; retrying on the next scroll sample");
                if !self.pending_detach.contains(&index) {
                    self.pending_detach.push(index);
                }
                self.last_error = Some(err);
            }
        }
    }

    fn retry_pending_detach<H>(&mut self, host: &mut H)
    where
        H: RepeatHost<T, Visual = V, Context = C>,
    {
        if self.pending_detach.is_empty() {
            return;
        }
        let pending = core::mem::take(&mut self.pending_detach);
        for index in pending {
            // Scrolled back into the window while waiting: it should stay attached.
            if self.window.as_ref().is_some_and(|w| w.contains(index)) {
                continue;
            }
            self.detach_or_queue(host, index);
        }
    }

    fn evict<H>(&mut self, host: &mut H, policy: EvictionPolicy)
    where
        H: RepeatHost<T, Visual = V, Context = C>,
    {
        let EvictionPolicy::Distance { windows } = policy else {
            return;
        };
        let Some(window) = self.window.as_ref() else {
            return;
        };
        let Some(bounds) = window.bounds() else {
            return;
        };
        let band = windows.saturating_mul(window.capacity());
        let lo = bounds.start_index.saturating_sub(band);
        let hi = bounds.end_index.saturating_add(band);
        for record in self.registry.drain_outside(lo, hi) {
            host.dispose(record.visual, record.context);
        }
    }

    fn dispose_all<H>(&mut self, host: &mut H)
    where
        H: RepeatHost<T, Visual = V, Context = C>,
    {
        self.pending_detach.clear();
        for record in self.registry.drain() {
            if record.attached && host.detach(&record.visual).is_err() {
                vwarn!(index = record.index, "detach during teardown failed");
            }
            host.dispose(record.visual, record.context);
        }
        self.window = None;
    }
}

/// Drives a host UI layer so that only a bounded window of a long list is materialized.
///
/// The controller owns one [`WindowState`] and one [`NodeRegistry`] per watched collection and
/// reacts to two events:
/// - `on_collection_changed` / `on_collection_replaced` when the collection identity changes
/// - `on_scroll_offset_changed` (or `on_scroll_top`, `queue_scroll` + `tick`) for scroll samples
///
/// Each call runs to completion; at most one window shift happens per scroll sample.
pub struct Controller<T, H: RepeatHost<T>> {
    host: H,
    options: RepeatOptions,
    value_identifier: String,
    cycle: Option<WatchCycle<T, H::Visual, H::Context>>,
    coalescer: ScrollCoalescer,
}

impl<T: Clone, H: RepeatHost<T>> Controller<T, H> {
    pub fn new(host: H, options: RepeatOptions) -> Self {
        let coalescer = ScrollCoalescer::new(options.frame_interval_ms);
        Self {
            host,
            options,
            value_identifier: String::from("item"),
            cycle: None,
            coalescer,
        }
    }

    /// Sets the iteration variable name passed to the binder (`"item"` by default).
    pub fn with_value_identifier(mut self, value_identifier: impl Into<String>) -> Self {
        self.value_identifier = value_identifier.into();
        self
    }

    pub fn value_identifier(&self) -> &str {
        &self.value_identifier
    }

    pub fn options(&self) -> &RepeatOptions {
        &self.options
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn collection(&self) -> Option<&Arc<[T]>> {
        self.cycle.as_ref().map(|c| &c.collection)
    }

    pub fn window(&self) -> Option<&WindowState> {
        self.cycle.as_ref().and_then(|c| c.window.as_ref())
    }

    pub fn registry(&self) -> Option<&NodeRegistry<T, H::Visual, H::Context>> {
        self.cycle.as_ref().map(|c| &c.registry)
    }

    pub fn is_attached(&self, index: usize) -> bool {
        self.registry()
            .and_then(|r| r.get(index))
            .is_some_and(|r| r.attached)
    }

    /// The most recent host failure swallowed by fail-soft scroll handling.
    pub fn last_host_error(&self) -> Option<&HostError> {
        self.cycle.as_ref().and_then(|c| c.last_error.as_ref())
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        let Some(cycle) = self.cycle.as_ref() else {
            return ControllerSnapshot::default();
        };
        ControllerSnapshot {
            window: cycle.window.as_ref().map(WindowState::snapshot),
            registered: cycle.registry.len(),
            attached: cycle.registry.attached_count(),
            pending_detach: cycle.pending_detach.len(),
        }
    }

    /// Rebuilds the window only when `collection` is a different collection than the one being
    /// watched. Returns `true` when a rebuild happened.
    pub fn on_collection_changed(
        &mut self,
        collection: Arc<[T]>,
        viewport: impl ViewportProvider,
    ) -> Result<bool, RecycleError> {
        if self
            .cycle
            .as_ref()
            .is_some_and(|c| Arc::ptr_eq(&c.collection, &collection))
        {
            vtrace!("on_collection_changed: same identity");
            return Ok(false);
        }
        self.on_collection_replaced(collection, viewport)?;
        Ok(true)
    }

    /// Discards the current watch cycle and materializes the first window of `collection`.
    ///
    /// Index 0 is bound first and measured to fix the item extent for the whole cycle. On error
    /// every node created so far is detached and disposed, and no cycle remains.
    pub fn on_collection_replaced(
        &mut self,
        collection: Arc<[T]>,
        viewport: impl ViewportProvider,
    ) -> Result<(), RecycleError> {
        self.teardown();
        let viewport_extent = viewport.viewport_extent();
        let mut cycle = WatchCycle::new(collection);
        match self.build(&mut cycle, viewport_extent) {
            Ok(()) => {
                vdebug!(
                    len = cycle.collection.len(),
                    viewport_extent,
                    registered = cycle.registry.len(),
                    "on_collection_replaced"
                );
                self.cycle = Some(cycle);
                Ok(())
            }
            Err(err) => {
                vwarn!(error = %err, "on_collection_replaced: aborting watch cycle");
                cycle.dispose_all(&mut self.host);
                Err(err)
            }
        }
    }

    fn build(
        &mut self,
        cycle: &mut WatchCycle<T, H::Visual, H::Context>,
        viewport_extent: u32,
    ) -> Result<(), RecycleError> {
        let len = cycle.collection.len();
        let host = &mut self.host;
        if len == 0 {
            host.set_container_extent(0);
            return Ok(());
        }
        let ident = self.value_identifier.as_str();

        cycle
            .create(host, ident, 0, 0, Slot::Start)
            .map_err(|source| RecycleError::Host { index: 0, source })?;
        let first = cycle.registry.get(0).ok_or(RecycleError::NotInitialized)?;
        let measured = host
            .measure(&first.visual)
            .map_err(|source| RecycleError::Host { index: 0, source })?;
        let item_extent = geometry::item_extent_from_measurement(measured)?;

        let window = WindowState::initialize(len, viewport_extent, item_extent, self.options.window);
        host.set_container_extent(window.container_extent());
        match window.bounds() {
            Some(bounds) => {
                for index in 1..=bounds.end_index {
                    cycle
                        .create(
                            host,
                            ident,
                            index,
                            window.offset_of(index),
                            Slot::After(index - 1),
                        )
                        .map_err(|source| RecycleError::Host { index, source })?;
                }
            }
            // Zero capacity: nothing is resident, not even the measured node.
            None => cycle.detach_or_queue(host, 0),
        }
        cycle.window = Some(window);
        Ok(())
    }

    /// Handles one scroll sample: the signed distance of the window's top node from the
    /// viewport top (negative once the user scrolled forward past it).
    pub fn on_scroll_offset_changed(
        &mut self,
        scroll_delta: i64,
    ) -> Result<ScrollOutcome, RecycleError> {
        let policy = self.options.eviction;
        let ident = self.value_identifier.as_str();
        let host = &mut self.host;
        let Some(cycle) = self.cycle.as_mut() else {
            return Ok(ScrollOutcome::Idle);
        };
        cycle.retry_pending_detach(host);

        let Some(window) = cycle.window.as_ref() else {
            return Ok(ScrollOutcome::Idle);
        };
        let Some(bounds) = window.bounds() else {
            return Ok(ScrollOutcome::Idle);
        };
        let forward = window.should_extend_forward(scroll_delta);
        let backward = !forward && window.should_retract_forward(scroll_delta);

        if forward {
            let entering = bounds.end_index + 1;
            if let Materialized::Deferred(err) = cycle.materialize(host, ident, entering, Slot::End)?
            {
                vwarn!(index = entering, error = %err, "forward shift deferred");
                cycle.last_error = Some(err.clone());
                return Ok(ScrollOutcome::Deferred(err));
            }
            cycle.detach_or_queue(host, bounds.start_index);
            let next = cycle
                .window
                .as_mut()
                .ok_or(RecycleError::NotInitialized)?
                .advance_window()?;
            cycle.evict(host, policy);
            vtrace!(start = next.start_index, end = next.end_index, "advanced");
            return Ok(ScrollOutcome::Advanced(next));
        }

        if backward {
            let entering = bounds.start_index - 1;
            if let Materialized::Deferred(err) =
                cycle.materialize(host, ident, entering, Slot::Start)?
            {
                vwarn!(index = entering, error = %err, "backward shift deferred");
                cycle.last_error = Some(err.clone());
                return Ok(ScrollOutcome::Deferred(err));
            }
            cycle.detach_or_queue(host, bounds.end_index);
            let next = cycle
                .window
                .as_mut()
                .ok_or(RecycleError::NotInitialized)?
                .retreat_window()?;
            cycle.evict(host, policy);
            vtrace!(start = next.start_index, end = next.end_index, "retreated");
            return Ok(ScrollOutcome::Retreated(next));
        }

        Ok(ScrollOutcome::Idle)
    }

    /// Same as `on_scroll_offset_changed`, from an absolute container scroll position.
    pub fn on_scroll_top(&mut self, scroll_top: u64) -> Result<ScrollOutcome, RecycleError> {
        let Some(window) = self.window() else {
            return Ok(ScrollOutcome::Idle);
        };
        let delta = window.scroll_delta_for(scroll_top);
        self.on_scroll_offset_changed(delta)
    }

    /// Repeats single shifts until `scroll_top` sits inside the deadband (e.g. after a
    /// scrollbar jump). Returns the number of shifts performed.
    ///
    /// Stops early on a deferred shift; the next call picks up from there.
    pub fn settle(&mut self, scroll_top: u64) -> Result<usize, RecycleError> {
        let limit = self.window().map_or(0, WindowState::collection_len);
        let mut shifts = 0usize;
        while shifts <= limit {
            if !self.on_scroll_top(scroll_top)?.is_shift() {
                break;
            }
            shifts += 1;
        }
        vdebug!(scroll_top, shifts, "settle");
        Ok(shifts)
    }

    pub fn apply_sample(&mut self, sample: ScrollSample) -> Result<ScrollOutcome, RecycleError> {
        match sample {
            ScrollSample::Delta(delta) => self.on_scroll_offset_changed(delta),
            ScrollSample::Top(top) => self.on_scroll_top(top),
        }
    }

    /// Records a scroll sample for the next `tick`. Older pending samples are dropped.
    pub fn queue_scroll(&mut self, sample: ScrollSample) {
        self.coalescer.push(sample);
    }

    /// Delivers the newest queued sample, at most once per `frame_interval_ms`.
    pub fn tick(&mut self, now_ms: u64) -> Result<Option<ScrollOutcome>, RecycleError> {
        let Some(sample) = self.coalescer.poll(now_ms) else {
            return Ok(None);
        };
        self.apply_sample(sample).map(Some)
    }

    pub fn coalescer(&self) -> &ScrollCoalescer {
        &self.coalescer
    }

    /// Detaches and disposes every node of the current watch cycle.
    pub fn teardown(&mut self) {
        self.coalescer.reset();
        if let Some(mut cycle) = self.cycle.take() {
            cycle.dispose_all(&mut self.host);
        }
    }

    /// Tears down the current watch cycle and returns the host.
    pub fn into_host(mut self) -> H {
        self.teardown();
        self.host
    }
}

impl<T, H: RepeatHost<T>> fmt::Debug for Controller<T, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("options", &self.options)
            .field("value_identifier", &self.value_identifier)
            .field("window", &self.cycle.as_ref().and_then(|c| c.window.as_ref()))
            .field("coalescer", &self.coalescer)
            .finish_non_exhaustive()
    }
}
