use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::adaptive::aggregator::LearnerWindow;
use crate::adaptive::types::EmotionalStateSummary;

const DEFAULT_MAX_LEARNERS: usize = 10_000;

struct Slot {
    window: Mutex<LearnerWindow>,
    /// Set under the window lock once the slot leaves the map.
    retired: AtomicBool,
    last_access: AtomicU64,
}

impl Slot {
    fn new(tick: u64) -> Self {
        Self {
            window: Mutex::new(LearnerWindow::new()),
            retired: AtomicBool::new(false),
            last_access: AtomicU64::new(tick),
        }
    }

    fn touch(&self, tick: u64) {
        self.last_access.fetch_max(tick, Ordering::Relaxed);
    }

    fn retire(&self) {
        let _window = self.window.lock();
        self.retired.store(true, Ordering::Release);
    }

    fn is_retired(&self) -> bool {
        self.retired.load(Ordering::Acquire)
    }
}

/// learner id -> sliding window. Each window has its own lock so that writes
/// for one learner are serialized without blocking other learners. Holds at
/// most `max_learners` windows; the least recently active one is evicted to
/// make room.
pub struct LearnerWindowStore {
    windows: RwLock<HashMap<String, Arc<Slot>>>,
    max_learners: usize,
    clock: AtomicU64,
}

impl Default for LearnerWindowStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LEARNERS)
    }
}

impl LearnerWindowStore {
    pub fn new(max_learners: usize) -> Self {
        Self {
            windows: RwLock::new(HashMap::new()),
            max_learners: max_learners.max(1),
            clock: AtomicU64::new(0),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    fn slot(&self, learner_id: &str) -> Arc<Slot> {
        let tick = self.tick();
        if let Some(slot) = self.windows.read().get(learner_id) {
            slot.touch(tick);
            return Arc::clone(slot);
        }

        let (slot, evicted) = {
            let mut windows = self.windows.write();
            if let Some(slot) = windows.get(learner_id) {
                slot.touch(tick);
                return Arc::clone(slot);
            }
            let evicted = if windows.len() >= self.max_learners {
                Self::evict_idlest(&mut windows)
            } else {
                None
            };
            let slot = Arc::new(Slot::new(tick));
            windows.insert(learner_id.to_string(), Arc::clone(&slot));
            (slot, evicted)
        };

        if let Some((evicted_id, evicted)) = evicted {
            evicted.retire();
            tracing::debug!(learner_id = %evicted_id, "idle learner window evicted");
        }
        slot
    }

    fn evict_idlest(windows: &mut HashMap<String, Arc<Slot>>) -> Option<(String, Arc<Slot>)> {
        let idlest = windows
            .iter()
            .min_by_key(|(_, slot)| slot.last_access.load(Ordering::Relaxed))
            .map(|(id, _)| id.clone())?;
        windows.remove_entry(&idlest)
    }

    /// Runs `f` while holding the learner's window lock.
    pub fn with_window<R>(&self, learner_id: &str, f: impl FnOnce(&mut LearnerWindow) -> R) -> R {
        let slot = self.slot(learner_id);
        self.write_through(learner_id, slot, f)
    }

    /// A slot retired between lookup and locking is replaced by a fresh one.
    fn write_through<R>(
        &self,
        learner_id: &str,
        mut slot: Arc<Slot>,
        f: impl FnOnce(&mut LearnerWindow) -> R,
    ) -> R {
        loop {
            {
                let mut window = slot.window.lock();
                if !slot.is_retired() {
                    return f(&mut window);
                }
            }
            slot = self.slot(learner_id);
        }
    }

    pub fn summary(&self, learner_id: &str) -> Option<EmotionalStateSummary> {
        let slot = self.windows.read().get(learner_id).cloned()?;
        slot.touch(self.tick());
        let window = slot.window.lock();
        window.summary().cloned()
    }

    pub fn reset(&self, learner_id: &str) -> bool {
        let removed = self.windows.write().remove(learner_id);
        match removed {
            Some(slot) => {
                slot.retire();
                true
            }
            None => false,
        }
    }

    pub fn learner_count(&self) -> usize {
        self.windows.read().len()
    }
}
