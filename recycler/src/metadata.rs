/// Per-item iteration flags stamped into a binding context.
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IterationMetadata {
    pub index: usize,
    pub is_first: bool,
    pub is_last: bool,
    pub is_even: bool,
}

impl IterationMetadata {
    pub fn new(index: usize, collection_len: usize) -> Self {
        Self {
            index,
            is_first: index == 0,
            is_last: index + 1 == collection_len,
            is_even: index % 2 == 0,
        }
    }

    pub fn is_odd(&self) -> bool {
        !self.is_even
    }

    /// Neither the first nor the last item.
    pub fn is_middle(&self) -> bool {
        !(self.is_first || self.is_last)
    }
}

/// A per-item scope produced by the host binder.
///
/// The engine only ever writes iteration metadata into it; the host owns everything else.
pub trait BindingContext {
    fn update_iteration_metadata(&mut self, metadata: IterationMetadata);
}

impl BindingContext for IterationMetadata {
    fn update_iteration_metadata(&mut self, metadata: IterationMetadata) {
        *self = metadata;
    }
}

impl BindingContext for () {
    fn update_iteration_metadata(&mut self, _metadata: IterationMetadata) {}
}
