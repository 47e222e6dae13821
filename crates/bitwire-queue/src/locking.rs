use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Condvar, Mutex};
use tracing::debug;

use crate::queue::Queue;

/// Mutex and condition variable backend with strict FIFO order.
pub struct LockingQueue<T> {
    entries: Mutex<VecDeque<T>>,
    available: Condvar,
    aborted: AtomicBool,
}

/// [`LockingQueue`] over boxed messages.
pub type LockingMessageQueue<M> = LockingQueue<Box<M>>;

impl<T> LockingQueue<T> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
            aborted: AtomicBool::new(false),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            available: Condvar::new(),
            aborted: AtomicBool::new(false),
        }
    }
}

impl<T> Default for LockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send> Queue<T> for LockingQueue<T> {
    fn push(&self, value: T) {
        self.entries.lock().push_back(value);
        self.available.notify_one();
    }

    fn pop(&self) -> Option<T> {
        self.entries.lock().pop_front()
    }

    fn pop_wait(&self) -> Option<T> {
        let mut entries = self.entries.lock();
        loop {
            // Checked under the lock; abort takes the lock before notifying.
            if self.aborted.load(Ordering::Acquire) {
                return None;
            }
            if let Some(value) = entries.pop_front() {
                return Some(value);
            }
            self.available.wait(&mut entries);
        }
    }

    fn abort(&self) -> bool {
        if self.aborted.swap(true, Ordering::AcqRel) {
            return true;
        }
        let _entries = self.entries.lock();
        let woken = self.available.notify_all();
        debug!(woken, "locking queue aborted");
        false
    }

    fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }

    fn clear(&self) {
        self.entries.lock().clear();
    }

    fn size_approx(&self) -> usize {
        self.entries.lock().len()
    }
}
