use std::marker::PhantomData;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::error::{Result, WorkerError};
use crate::queue::MessageQueue;

/// Message handler run on a [`QueueWorker`] thread.
pub trait Worker<M>: Send + 'static {
    /// Called on the worker thread before the first message.
    fn init(&mut self) {}

    fn handle(&mut self, message: Box<M>);

    /// Called on the worker thread after the queue was aborted.
    fn release(&mut self) {}
}

/// A consumer thread that feeds every message of its queue to a [`Worker`].
///
/// Stopping aborts the queue and joins the thread. Messages still queued at
/// that point are not handled; they are released with the queue.
pub struct QueueWorker<M, Q>
where
    Q: MessageQueue<M>,
{
    name: String,
    queue: Arc<Q>,
    handle: Option<JoinHandle<()>>,
    _message: PhantomData<fn(Box<M>)>,
}

impl<M, Q> QueueWorker<M, Q>
where
    M: Send + 'static,
    Q: MessageQueue<M> + 'static,
{
    /// Spawn a named thread running `worker` over `queue`.
    pub fn start<W>(queue: Q, name: impl Into<String>, worker: W) -> Result<Self>
    where
        W: Worker<M>,
    {
        let name = name.into();
        let queue = Arc::new(queue);
        let thread_queue = Arc::clone(&queue);

        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || run::<M, Q, W>(thread_queue.as_ref(), worker))?;
        debug!(worker = %name, "queue worker started");

        Ok(Self {
            name,
            queue,
            handle: Some(handle),
            _message: PhantomData,
        })
    }

    /// Hand a message to the worker thread.
    pub fn enqueue(&self, message: Box<M>) {
        self.queue.push(message);
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Abort the queue and join the thread.
    ///
    /// Calling `stop` again after it returned is a no-op.
    pub fn stop(&mut self) -> Result<()> {
        self.queue.abort();
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        handle
            .join()
            .map_err(|_| WorkerError::Panicked(self.name.clone()))?;
        debug!(worker = %self.name, "queue worker stopped");
        Ok(())
    }
}

impl<M, Q> Drop for QueueWorker<M, Q>
where
    Q: MessageQueue<M>,
{
    fn drop(&mut self) {
        self.queue.abort();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!(worker = %self.name, "queue worker panicked");
            }
        }
    }
}

fn run<M, Q, W>(queue: &Q, mut worker: W)
where
    Q: MessageQueue<M> + ?Sized,
    W: Worker<M>,
{
    worker.init();
    while let Some(message) = queue.pop_wait() {
        worker.handle(message);
    }
    worker.release();
}
