//! Blocking MPMC queues with one-shot cooperative abort.
//!
//! Two interchangeable backends implement [`Queue`]:
//! - [`LockingQueue`]: mutex plus condition variable, strict FIFO
//! - [`LockFreeQueue`]: crossbeam channel, FIFO per producer
//!
//! Abort is a broadcast: every thread blocked in `pop_wait` wakes and gets
//! `None`. [`QueueWorker`] runs a consumer thread over a message queue.

pub mod error;
pub mod locking;
pub mod lockfree;
pub mod queue;
pub mod worker;

pub use error::{Result, WorkerError};
pub use locking::{LockingMessageQueue, LockingQueue};
pub use lockfree::{LockFreeMessageQueue, LockFreeQueue};
pub use queue::{MessageQueue, Queue};
pub use worker::{QueueWorker, Worker};
