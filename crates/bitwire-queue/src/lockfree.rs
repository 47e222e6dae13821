use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use tracing::debug;

use crate::queue::Queue;

/// Lock-free MPMC backend over an unbounded crossbeam channel.
///
/// Order is FIFO per producer. Abort disconnects a dedicated cancel channel,
/// which every blocked receiver observes at once.
pub struct LockFreeQueue<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
    aborted: AtomicBool,
    cancel_tx: Mutex<Option<Sender<()>>>,
    cancel_rx: Receiver<()>,
}

/// [`LockFreeQueue`] over boxed messages.
pub type LockFreeMessageQueue<M> = LockFreeQueue<Box<M>>;

impl<T> LockFreeQueue<T> {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        let (cancel_tx, cancel_rx) = crossbeam_channel::bounded(0);
        Self {
            tx,
            rx,
            aborted: AtomicBool::new(false),
            cancel_tx: Mutex::new(Some(cancel_tx)),
            cancel_rx,
        }
    }
}

impl<T> Default for LockFreeQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send> Queue<T> for LockFreeQueue<T> {
    fn push(&self, value: T) {
        // Both ends live in `self`, so the channel never disconnects.
        let _ = self.tx.send(value);
    }

    fn pop(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    fn pop_wait(&self) -> Option<T> {
        if self.aborted.load(Ordering::Acquire) {
            return None;
        }
        crossbeam_channel::select! {
            recv(self.rx) -> value => value.ok(),
            recv(self.cancel_rx) -> _ => None,
        }
    }

    fn abort(&self) -> bool {
        if self.aborted.swap(true, Ordering::AcqRel) {
            return true;
        }
        drop(self.cancel_tx.lock().take());
        debug!("lock-free queue aborted");
        false
    }

    fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }

    fn clear(&self) {
        let drained = self.rx.try_iter().count();
        if drained > 0 {
            debug!(drained, "lock-free queue cleared");
        }
    }

    fn size_approx(&self) -> usize {
        self.rx.len()
    }
}
