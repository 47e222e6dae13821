//! Behaviour both backends must share.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use bitwire_queue::{LockFreeQueue, LockingQueue, MessageQueue, Queue};

const WAKE_TIMEOUT: Duration = Duration::from_secs(5);

fn fifo<Q: Queue<u32> + Default>() {
    let q = Q::default();
    q.push(1);
    q.push(2);
    assert_eq!(q.pop(), Some(1));
    assert_eq!(q.pop(), Some(2));
    assert_eq!(q.pop(), None);
}

fn abort_is_idempotent<Q: Queue<u32> + Default>() {
    let q = Q::default();
    assert!(!q.is_aborted());
    assert!(!q.abort());
    assert!(q.abort());
    assert!(q.is_aborted());
    assert_eq!(q.pop_wait(), None);
}

fn push_and_pop_survive_abort<Q: Queue<u32> + Default>() {
    let q = Q::default();
    q.push(1);
    q.abort();
    q.push(2);
    assert_eq!(q.size_approx(), 2);
    assert_eq!(q.pop(), Some(1));
    assert_eq!(q.pop(), Some(2));
    assert_eq!(q.pop(), None);
}

fn abort_wakes_every_waiter<Q: Queue<u32> + Default + 'static>() {
    let q = Arc::new(Q::default());
    let (done_tx, done_rx) = crossbeam_channel::unbounded();
    let waiters = 4;
    let ready = Arc::new(Barrier::new(waiters + 1));

    for _ in 0..waiters {
        let q = Arc::clone(&q);
        let done_tx = done_tx.clone();
        let ready = Arc::clone(&ready);
        thread::spawn(move || {
            ready.wait();
            let got = q.pop_wait();
            done_tx.send(got).unwrap();
        });
    }

    ready.wait();
    thread::sleep(Duration::from_millis(50));
    assert!(!q.abort());

    for _ in 0..waiters {
        let got = done_rx
            .recv_timeout(WAKE_TIMEOUT)
            .expect("waiter should wake after abort");
        assert_eq!(got, None);
    }
    assert!(q.abort());
}

fn waiter_receives_pushed_value<Q: Queue<u32> + Default + 'static>() {
    let q = Arc::new(Q::default());
    let consumer = {
        let q = Arc::clone(&q);
        thread::spawn(move || q.pop_wait())
    };
    thread::sleep(Duration::from_millis(20));
    q.push(42);
    assert_eq!(consumer.join().unwrap(), Some(42));
}

struct Tracked(Arc<AtomicUsize>);

impl Drop for Tracked {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

fn messages_released_once<Q: MessageQueue<Tracked> + Default>() {
    let drops = Arc::new(AtomicUsize::new(0));
    {
        let q = Q::default();
        q.push(Box::new(Tracked(Arc::clone(&drops))));
        q.push(Box::new(Tracked(Arc::clone(&drops))));
        q.abort();
        q.push(Box::new(Tracked(Arc::clone(&drops))));

        let taken = q.pop().expect("entry present");
        drop(taken);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }
    assert_eq!(drops.load(Ordering::SeqCst), 3);
}

fn mpmc_keeps_per_producer_order<Q: Queue<(usize, usize)> + Default + 'static>() {
    const PRODUCERS: usize = 4;
    const CONSUMERS: usize = 4;
    const PER_PRODUCER: usize = 2_000;

    let q = Arc::new(Q::default());
    let received = Arc::new(AtomicUsize::new(0));

    let consumers: Vec<_> = (0..CONSUMERS)
        .map(|_| {
            let q = Arc::clone(&q);
            let received = Arc::clone(&received);
            thread::spawn(move || {
                let mut seen = Vec::new();
                while let Some(entry) = q.pop_wait() {
                    seen.push(entry);
                    received.fetch_add(1, Ordering::SeqCst);
                }
                seen
            })
        })
        .collect();

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let q = Arc::clone(&q);
            thread::spawn(move || {
                for seq in 0..PER_PRODUCER {
                    q.push((p, seq));
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    let total = PRODUCERS * PER_PRODUCER;
    let deadline = std::time::Instant::now() + WAKE_TIMEOUT;
    while received.load(Ordering::SeqCst) < total {
        assert!(std::time::Instant::now() < deadline, "consumers stalled");
        thread::sleep(Duration::from_millis(1));
    }
    q.abort();

    let mut counts: HashMap<usize, usize> = HashMap::new();
    for consumer in consumers {
        let seen = consumer.join().unwrap();
        let mut last: HashMap<usize, usize> = HashMap::new();
        for (p, seq) in seen {
            if let Some(prev) = last.insert(p, seq) {
                assert!(seq > prev, "producer {p} reordered: {prev} then {seq}");
            }
            *counts.entry(p).or_default() += 1;
        }
    }
    assert_eq!(counts.len(), PRODUCERS);
    assert!(counts.values().all(|c| *c == PER_PRODUCER));
}

/// Abort racing active consumers never loses an entry: everything pushed is
/// either returned by `pop_wait` or still drainable with `pop`.
fn abort_race_loses_nothing<Q: Queue<usize> + Default + 'static>() {
    const PUSHED: usize = 20_000;

    for _ in 0..5 {
        let q = Arc::new(Q::default());
        let consumed = Arc::new(AtomicUsize::new(0));

        let consumers: Vec<_> = (0..3)
            .map(|_| {
                let q = Arc::clone(&q);
                let consumed = Arc::clone(&consumed);
                thread::spawn(move || {
                    while q.pop_wait().is_some() {
                        consumed.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        let producer = {
            let q = Arc::clone(&q);
            thread::spawn(move || {
                for i in 0..PUSHED {
                    q.push(i);
                }
            })
        };

        thread::sleep(Duration::from_millis(1));
        q.abort();
        producer.join().unwrap();
        for consumer in consumers {
            consumer.join().unwrap();
        }

        let mut remaining = 0;
        while q.pop().is_some() {
            remaining += 1;
        }
        assert_eq!(consumed.load(Ordering::SeqCst) + remaining, PUSHED);
    }
}

fn clear_drops_present_entries<Q: Queue<u32> + Default>() {
    let q = Q::default();
    for i in 0..16 {
        q.push(i);
    }
    assert_eq!(q.size_approx(), 16);
    q.clear();
    assert_eq!(q.size_approx(), 0);
    assert_eq!(q.pop(), None);
}

macro_rules! backend_tests {
    ($module:ident, $queue:ident) => {
        mod $module {
            use super::*;

            #[test]
            fn fifo() {
                super::fifo::<$queue<u32>>();
            }

            #[test]
            fn abort_is_idempotent() {
                super::abort_is_idempotent::<$queue<u32>>();
            }

            #[test]
            fn push_and_pop_survive_abort() {
                super::push_and_pop_survive_abort::<$queue<u32>>();
            }

            #[test]
            fn abort_wakes_every_waiter() {
                super::abort_wakes_every_waiter::<$queue<u32>>();
            }

            #[test]
            fn waiter_receives_pushed_value() {
                super::waiter_receives_pushed_value::<$queue<u32>>();
            }

            #[test]
            fn messages_released_once() {
                super::messages_released_once::<$queue<Box<Tracked>>>();
            }

            #[test]
            fn mpmc_keeps_per_producer_order() {
                super::mpmc_keeps_per_producer_order::<$queue<(usize, usize)>>();
            }

            #[test]
            fn abort_race_loses_nothing() {
                super::abort_race_loses_nothing::<$queue<usize>>();
            }

            #[test]
            fn clear_drops_present_entries() {
                super::clear_drops_present_entries::<$queue<u32>>();
            }
        }
    };
}

backend_tests!(locking, LockingQueue);
backend_tests!(lockfree, LockFreeQueue);
