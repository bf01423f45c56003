/// One scroll observation from the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScrollSample {
    /// Signed distance of the window's top node from the viewport top (negative = scrolled
    /// forward past it).
    Delta(i64),
    /// Absolute scroll position of the container.
    Top(u64),
}

/// Keeps only the newest scroll sample and releases at most one per frame interval.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScrollCoalescer {
    interval_ms: u64,
    pending: Option<ScrollSample>,
    last_flush_ms: Option<u64>,
    superseded: u64,
}

impl ScrollCoalescer {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            ..Self::default()
        }
    }

    pub fn push(&mut self, sample: ScrollSample) {
        if self.pending.replace(sample).is_some() {
            self.superseded = self.superseded.saturating_add(1);
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Number of samples dropped because a newer one arrived in the same frame.
    pub fn superseded(&self) -> u64 {
        self.superseded
    }

    pub fn poll(&mut self, now_ms: u64) -> Option<ScrollSample> {
        if self.pending.is_none() {
            return None;
        }
        if let Some(last) = self.last_flush_ms {
            if now_ms.saturating_sub(last) < self.interval_ms {
                return None;
            }
        }
        self.last_flush_ms = Some(now_ms);
        self.pending.take()
    }

    pub fn reset(&mut self) {
        self.pending = None;
        self.last_flush_ms = None;
    }
}
