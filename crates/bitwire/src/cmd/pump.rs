//! Throughput and ordering check for the queue backends.
//!
//! Producers encode [`PumpRecord`]s into boxed buffers and push them; consumers
//! decode them and track the last sequence number seen per producer. Any
//! regression or a missing record fails the run.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use bitwire_codec::{wire_message, Buffer};
use bitwire_queue::{LockFreeMessageQueue, LockingMessageQueue, MessageQueue, WorkerError};
use serde::Serialize;
use tracing::{debug, info};

use crate::cmd::{Backend, PumpArgs};
use crate::exit::{worker_error, CliError, CliResult, FAILURE, SUCCESS};
use crate::output::{print_json, table, OutputFormat};

wire_message! {
    /// One record pushed through the queue.
    pub struct PumpRecord {
        producer: u16,
        seq: u64,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpConfig {
    pub backend: Backend,
    pub producers: u16,
    pub consumers: usize,
    /// Messages per producer.
    pub messages: u64,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Locking,
            producers: 4,
            consumers: 4,
            messages: 10_000,
        }
    }
}

impl PumpConfig {
    fn validate(&self) -> CliResult<()> {
        if self.producers == 0 || self.consumers == 0 {
            return Err(CliError::usage(
                "pump needs at least one producer and one consumer",
            ));
        }
        Ok(())
    }

    fn total(&self) -> u64 {
        u64::from(self.producers).saturating_mul(self.messages)
    }
}

impl From<PumpArgs> for PumpConfig {
    fn from(args: PumpArgs) -> Self {
        Self {
            backend: args.backend,
            producers: args.producers,
            consumers: args.consumers,
            messages: args.messages,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PumpReport {
    pub backend: &'static str,
    pub producers: u16,
    pub consumers: usize,
    pub sent: u64,
    pub received: u64,
    pub reordered: u64,
    pub elapsed_ms: f64,
    pub messages_per_sec: f64,
}

impl PumpReport {
    pub fn is_clean(&self) -> bool {
        self.sent == self.received && self.reordered == 0
    }
}

pub fn run(args: PumpArgs, format: OutputFormat) -> CliResult<i32> {
    let config = PumpConfig::from(args);
    config.validate()?;

    let report = match config.backend {
        Backend::Locking => pump::<LockingMessageQueue<Buffer>>(&config),
        Backend::Lockfree => pump::<LockFreeMessageQueue<Buffer>>(&config),
    }
    .map_err(|err| worker_error("pump", err))?;

    print_report(&report, format);
    if report.is_clean() {
        Ok(SUCCESS)
    } else {
        Err(CliError::new(
            FAILURE,
            format!(
                "pump lost or reordered messages: sent={} received={} reordered={}",
                report.sent, report.received, report.reordered
            ),
        ))
    }
}

#[derive(Default)]
struct ConsumerTally {
    received: u64,
    reordered: u64,
}

pub fn pump<Q>(config: &PumpConfig) -> Result<PumpReport, WorkerError>
where
    Q: MessageQueue<Buffer> + Default + 'static,
{
    let queue = Arc::new(Q::default());
    let total = config.total();
    let received = Arc::new(AtomicU64::new(0));
    let producer_count = usize::from(config.producers);

    if total == 0 {
        queue.abort();
    }

    let started = Instant::now();
    let mut consumers = Vec::with_capacity(config.consumers);
    for id in 0..config.consumers {
        let queue = Arc::clone(&queue);
        let received = Arc::clone(&received);
        let handle = thread::Builder::new()
            .name(format!("pump-consumer-{id}"))
            .spawn(move || consume(queue.as_ref(), &received, total, producer_count))?;
        consumers.push(handle);
    }

    let mut producers = Vec::with_capacity(producer_count);
    for producer in 0..config.producers {
        let queue = Arc::clone(&queue);
        let messages = config.messages;
        let handle = thread::Builder::new()
            .name(format!("pump-producer-{producer}"))
            .spawn(move || produce(queue.as_ref(), producer, messages))?;
        producers.push(handle);
    }

    for (id, handle) in producers.into_iter().enumerate() {
        handle
            .join()
            .map_err(|_| WorkerError::Panicked(format!("pump-producer-{id}")))?;
    }
    debug!(total, "producers finished");

    let mut tally = ConsumerTally::default();
    for (id, handle) in consumers.into_iter().enumerate() {
        let part = handle
            .join()
            .map_err(|_| WorkerError::Panicked(format!("pump-consumer-{id}")))?;
        tally.received += part.received;
        tally.reordered += part.reordered;
    }
    let elapsed = started.elapsed();
    info!(
        backend = config.backend.as_str(),
        received = tally.received,
        elapsed_ms = elapsed.as_millis() as u64,
        "pump finished"
    );

    Ok(PumpReport {
        backend: config.backend.as_str(),
        producers: config.producers,
        consumers: config.consumers,
        sent: total,
        received: tally.received,
        reordered: tally.reordered,
        elapsed_ms: millis(elapsed),
        messages_per_sec: rate(tally.received, elapsed),
    })
}

fn produce<Q: MessageQueue<Buffer> + ?Sized>(queue: &Q, producer: u16, messages: u64) {
    for seq in 0..messages {
        let mut buffer = Buffer::zeroed(PumpRecord::SIZE);
        {
            let mut record = PumpRecord::from_buffer(&mut buffer);
            record.set_producer(producer);
            record.set_seq(seq);
        }
        queue.push(Box::new(buffer));
    }
}

/// Pop until aborted. The consumer that takes the last expected record aborts
/// the queue, which releases every other consumer.
fn consume<Q: MessageQueue<Buffer> + ?Sized>(
    queue: &Q,
    received: &AtomicU64,
    total: u64,
    producers: usize,
) -> ConsumerTally {
    let mut last: Vec<Option<u64>> = vec![None; producers];
    let mut tally = ConsumerTally::default();

    while let Some(mut buffer) = queue.pop_wait() {
        let record = PumpRecord::from_buffer(&mut buffer);
        let producer = usize::from(record.producer());
        let seq = record.seq();

        match last.get_mut(producer) {
            Some(slot) => {
                if slot.is_some_and(|prev| seq <= prev) {
                    tally.reordered += 1;
                }
                *slot = Some(seq);
            }
            None => tally.reordered += 1,
        }
        tally.received += 1;

        if received.fetch_add(1, Ordering::SeqCst) + 1 == total {
            queue.abort();
        }
    }
    tally
}

fn millis(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 1000.0 * 100.0).round() / 100.0
}

fn rate(count: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= f64::EPSILON {
        return 0.0;
    }
    (count as f64 / secs).round()
}

fn print_report(report: &PumpReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Table => {
            let mut table = table(vec![
                "BACKEND", "PRODUCERS", "CONSUMERS", "SENT", "RECEIVED", "REORDERED", "MS",
                "MSG/S",
            ]);
            table.add_row(vec![
                report.backend.to_string(),
                report.producers.to_string(),
                report.consumers.to_string(),
                report.sent.to_string(),
                report.received.to_string(),
                report.reordered.to_string(),
                format!("{:.2}", report.elapsed_ms),
                format!("{:.0}", report.messages_per_sec),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("Pump ({}):", report.backend);
            println!("  Producers:  {}", report.producers);
            println!("  Consumers:  {}", report.consumers);
            println!("  Sent:       {}", report.sent);
            println!("  Received:   {}", report.received);
            println!("  Reordered:  {}", report.reordered);
            println!("  Elapsed:    {:.2}ms", report.elapsed_ms);
            println!("  Throughput: {:.0} msg/s", report.messages_per_sec);
        }
        OutputFormat::Raw => println!("{}", report.received),
    }
}
