use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Time-windowed set of recently seen transport update ids. Telegram resends
/// updates until it gets a 200, so the webhook drops repeats here. Delivery
/// correctness does not depend on this cache; the delivery ledger owns that.
pub struct UpdateDedupe {
    ttl: Duration,
    inner: Mutex<Inner>,
}

struct Inner {
    order: VecDeque<(i64, Instant)>,
    seen: HashSet<i64>,
}

impl UpdateDedupe {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Mutex::new(Inner {
                order: VecDeque::new(),
                seen: HashSet::new(),
            }),
        }
    }

    /// Returns true when this id has not been seen within the window.
    pub fn insert(&self, update_id: i64) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let now = Instant::now();
        while let Some((expired_id, seen_at)) = inner.order.front().copied() {
            if now.duration_since(seen_at) < self.ttl {
                break;
            }
            inner.order.pop_front();
            inner.seen.remove(&expired_id);
        }

        if !inner.seen.insert(update_id) {
            return false;
        }
        inner.order.push_back((update_id, now));
        true
    }
}
