use std::time::{Duration, Instant};

/// Records revealed per step.
pub const PAGE_SIZE: usize = 20;

/// How much of the active partition is exposed to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationWindow {
    page_size: usize,
    revealed: usize,
    len: usize,
}

impl Default for PaginationWindow {
    fn default() -> Self {
        Self::new(PAGE_SIZE)
    }
}

impl PaginationWindow {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            revealed: 0,
            len: 0,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed
    }

    pub fn partition_len(&self) -> usize {
        self.len
    }

    /// Starts over on a partition of `partition_len` records.
    pub fn reset(&mut self, partition_len: usize) {
        self.len = partition_len;
        self.revealed = self.page_size.min(partition_len);
    }

    /// Reveals one more page. Returns the new revealed count; unchanged at the end.
    pub fn reveal_more(&mut self) -> usize {
        if self.has_more() {
            self.revealed = (self.revealed + self.page_size).min(self.len);
        }
        self.revealed
    }

    pub fn has_more(&self) -> bool {
        self.revealed < self.len
    }

    /// Revealed prefix of `partition`.
    pub fn slice<'a, T>(&self, partition: &'a [T]) -> &'a [T] {
        &partition[..self.revealed.min(partition.len())]
    }
}

/// Viewport geometry of the scrolling table, in any consistent unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub offset: f32,
    pub viewport: f32,
    pub content: f32,
}

impl ScrollMetrics {
    /// Within 1.2 viewports of the bottom.
    pub fn near_end(&self) -> bool {
        self.content - self.offset <= self.viewport * 1.2
    }
}

/// Turns scroll positions into a debounced "reveal more" intent.
#[derive(Debug, Clone)]
pub struct ScrollIntent {
    debounce: Duration,
    last_fired: Option<Instant>,
}

impl ScrollIntent {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            last_fired: None,
        }
    }

    /// True when the table is near its end and no intent fired within the debounce interval.
    pub fn observe(&mut self, metrics: ScrollMetrics, now: Instant) -> bool {
        if !metrics.near_end() {
            return false;
        }
        match self.last_fired {
            Some(last) if now.saturating_duration_since(last) < self.debounce => false,
            _ => {
                self.last_fired = Some(now);
                true
            }
        }
    }

    pub fn clear(&mut self) {
        self.last_fired = None;
    }
}
