//! Generation counter for one logical request stream.
//!
//! Every input change issues a new [`Generation`]. A debounced request
//! only goes out if its generation is still the latest after the quiet
//! period, and a response is only applied if its generation is still the
//! latest when it arrives. Together this gives cancel-and-replace
//! semantics without aborting in-flight HTTP calls.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Shared, monotonically increasing generation counter.
#[derive(Debug, Clone, Default)]
pub struct RequestStream {
    latest: Arc<AtomicU64>,
}

impl RequestStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new generation, superseding every earlier one.
    pub fn issue(&self) -> Generation {
        Generation(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn latest(&self) -> Generation {
        Generation(self.latest.load(Ordering::SeqCst))
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.latest() == generation
    }

    /// Wait out the quiet period; true if `generation` survived it.
    pub async fn settle(&self, generation: Generation, delay: Duration) -> bool {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.is_current(generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_supersedes_previous() {
        let s = RequestStream::new();
        let a = s.issue();
        let b = s.issue();
        assert!(b > a);
        assert!(!s.is_current(a));
        assert!(s.is_current(b));
    }

    #[test]
    fn clones_share_the_counter() {
        let s = RequestStream::new();
        let a = s.issue();
        let _ = s.clone().issue();
        assert!(!s.is_current(a));
    }

    #[tokio::test(start_paused = true)]
    async fn settle_reports_whether_still_latest() {
        let s = RequestStream::new();
        let a = s.issue();
        let early = async { s.settle(a, Duration::from_millis(400)).await };
        let later = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            let b = s.issue();
            s.settle(b, Duration::from_millis(400)).await
        };
        let (early, later) = tokio::join!(early, later);
        assert!(!early);
        assert!(later);
    }
}
