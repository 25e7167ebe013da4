#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counts its live instances, clones included.
#[derive(Debug)]
pub struct Tracked {
    live: Arc<AtomicUsize>,
}

impl Tracked {
    pub fn new(live: &Arc<AtomicUsize>) -> Tracked {
        live.fetch_add(1, Ordering::SeqCst);
        Tracked { live: live.clone() }
    }
}

impl Clone for Tracked {
    fn clone(&self) -> Tracked {
        Tracked::new(&self.live)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

pub fn counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

pub fn live(counter: &Arc<AtomicUsize>) -> usize {
    counter.load(Ordering::SeqCst)
}

/// A callable returning `value` that keeps a tracker alive.
pub fn tracked(live: &Arc<AtomicUsize>, value: u64) -> impl Fn() -> u64 + Clone + Send + Sync + 'static {
    let tracker = Tracked::new(live);
    move || {
        let _ = &tracker;
        value
    }
}
