use core::fmt;

use recycler::{BindingContext, HostError};

/// Where a visual goes when it is attached to the visible tree.
///
/// Positions are absolute (`index * item_extent`), so the anchor only decides tree order.
pub enum Anchor<'a, V> {
    /// Before every other materialized visual.
    Start,
    /// After every other materialized visual.
    End,
    /// Directly after an already attached visual.
    After(&'a V),
}

impl<V> Clone for Anchor<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for Anchor<'_, V> {}

impl<V: fmt::Debug> fmt::Debug for Anchor<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("Start"),
            Self::End => f.write_str("End"),
            Self::After(v) => f.debug_tuple("After").field(v).finish(),
        }
    }
}

/// Everything a binder needs to instantiate one item.
#[derive(Debug)]
pub struct BindRequest<'a, T> {
    pub index: usize,
    pub item: &'a T,
    /// The iteration variable name the item should be exposed under.
    pub value_identifier: &'a str,
    pub collection_len: usize,
}

/// A freshly bound visual and its per-item context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bound<V, C> {
    pub visual: V,
    pub context: C,
}

/// The host UI layer the controller drives.
///
/// The controller never inspects a `Visual`; it only binds, measures, positions, attaches and
/// detaches it, and finally hands it back through [`RepeatHost::dispose`].
pub trait RepeatHost<T> {
    type Visual;
    type Context: BindingContext;

    /// Instantiates a visual for one item. Called at most once per index per watch cycle.
    fn bind(
        &mut self,
        request: BindRequest<'_, T>,
    ) -> Result<Bound<Self::Visual, Self::Context>, HostError>;

    /// Reports the on-screen height of an attached visual.
    fn measure(&self, visual: &Self::Visual) -> Result<f32, HostError>;

    fn position(&mut self, visual: &Self::Visual, offset: u64);

    fn set_container_extent(&mut self, extent: u64);

    fn attach(
        &mut self,
        visual: &Self::Visual,
        anchor: Anchor<'_, Self::Visual>,
    ) -> Result<(), HostError>;

    fn detach(&mut self, visual: &Self::Visual) -> Result<(), HostError>;

    /// Whether a visual handed out earlier is still usable.
    fn is_valid(&self, _visual: &Self::Visual) -> bool {
        true
    }

    /// Final release of a visual the controller no longer tracks.
    fn dispose(&mut self, _visual: Self::Visual, _context: Self::Context) {}
}

/// Supplies the height of the scrolling viewport.
pub trait ViewportProvider {
    fn viewport_extent(&self) -> u32;
}

impl ViewportProvider for u32 {
    fn viewport_extent(&self) -> u32 {
        *self
    }
}

impl<P: ViewportProvider + ?Sized> ViewportProvider for &P {
    fn viewport_extent(&self) -> u32 {
        (**self).viewport_extent()
    }
}
