/// A concurrent FIFO shared by any number of producers and consumers.
///
/// A queue starts open and moves once, irreversibly, to aborted. Abort only
/// affects blocking consumption: `push` keeps enqueueing and `pop` keeps
/// draining afterwards.
///
/// Both backends apply one policy when abort races a dequeue: an entry that a
/// consumer has already taken is always returned to it, never discarded.
/// `pop_wait` returns `None` only without taking an entry, leaving the rest in
/// place to be drained or dropped with the queue.
pub trait Queue<T>: Send + Sync {
    /// Enqueue `value`, also after abort.
    fn push(&self, value: T);

    /// Take the oldest entry without blocking.
    fn pop(&self) -> Option<T>;

    /// Block until an entry is available or the queue is aborted.
    ///
    /// Returns `None` on abort. Every blocked caller wakes on abort.
    fn pop_wait(&self) -> Option<T>;

    /// Abort the queue and wake all waiters.
    ///
    /// Returns `true` if the queue was already aborted, `false` if this call
    /// performed the transition.
    fn abort(&self) -> bool;

    fn is_aborted(&self) -> bool;

    /// Drop the entries present right now. Producers racing the call may
    /// leave new entries behind.
    fn clear(&self);

    /// Approximate number of entries, for monitoring only.
    fn size_approx(&self) -> usize;
}

/// A queue of heap-owned messages.
///
/// `push` moves ownership in and `pop`/`pop_wait` move it out. Entries left in
/// the queue are released exactly once when it is dropped.
pub trait MessageQueue<M>: Queue<Box<M>> {}

impl<M, Q> MessageQueue<M> for Q where Q: Queue<Box<M>> + ?Sized {}
