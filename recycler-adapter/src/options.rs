use recycler::WindowOptions;

/// What happens to nodes that scroll far out of the window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EvictionPolicy {
    /// Keep every materialized node until the watch cycle ends.
    #[default]
    Never,
    /// Dispose detached nodes more than `windows * capacity` items away from the window.
    Distance { windows: usize },
}

/// Configuration for [`crate::Controller`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RepeatOptions {
    pub window: WindowOptions,
    pub eviction: EvictionPolicy,
    /// Minimum spacing between delivered scroll samples when using `queue_scroll`/`tick`.
    pub frame_interval_ms: u64,
}

impl Default for RepeatOptions {
    fn default() -> Self {
        Self {
            window: WindowOptions::default(),
            eviction: EvictionPolicy::Never,
            frame_interval_ms: 16,
        }
    }
}

impl RepeatOptions {
    pub fn with_window(mut self, window: WindowOptions) -> Self {
        self.window = window;
        self
    }

    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.window.overscan = overscan;
        self
    }

    pub fn with_eviction(mut self, eviction: EvictionPolicy) -> Self {
        self.eviction = eviction;
        self
    }

    pub fn with_frame_interval_ms(mut self, frame_interval_ms: u64) -> Self {
        self.frame_interval_ms = frame_interval_ms;
        self
    }
}
