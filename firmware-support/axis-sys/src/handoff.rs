// SPDX-FileCopyrightText: 2024 Google LLC
//
// SPDX-License-Identifier: Apache-2.0
/*! Handing sample batches from the interrupt handler to the foreground.

The interrupt handler owns the FIFO and fills one [`SampleBatch`] per trigger.
A complete batch is moved into a lock-free single-producer/single-consumer
queue; the foreground only ever sees whole batches and never a batch that is
still being written.

The handler never waits for the foreground. When the queue is full the new
batch is dropped and counted as an overrun.
*/

use core::sync::atomic::{AtomicU32, Ordering};

use heapless::spsc::{Consumer, Producer, Queue};

use crate::stream::{SampleBatch, StreamSource};

/// Queue of complete batches of `N` samples. Holds at most `DEPTH - 1`
/// batches.
pub struct BatchChannel<const N: usize, const DEPTH: usize> {
    queue: Queue<SampleBatch<N>, DEPTH>,
    overruns: AtomicU32,
}

impl<const N: usize, const DEPTH: usize> BatchChannel<N, DEPTH> {
    pub const fn new() -> Self {
        BatchChannel {
            queue: Queue::new(),
            overruns: AtomicU32::new(0),
        }
    }

    pub fn split(&mut self) -> (BatchProducer<'_, N, DEPTH>, BatchConsumer<'_, N, DEPTH>) {
        let (producer, consumer) = self.queue.split();
        (
            BatchProducer {
                producer,
                overruns: &self.overruns,
            },
            BatchConsumer {
                consumer,
                overruns: &self.overruns,
            },
        )
    }
}

impl<const N: usize, const DEPTH: usize> Default for BatchChannel<N, DEPTH> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct BatchProducer<'q, const N: usize, const DEPTH: usize> {
    producer: Producer<'q, SampleBatch<N>, DEPTH>,
    overruns: &'q AtomicU32,
}

impl<const N: usize, const DEPTH: usize> BatchProducer<'_, N, DEPTH> {
    /// Queue `batch` for the consumer, or hand it back if the queue is full.
    pub fn publish(&mut self, batch: SampleBatch<N>) -> Result<(), SampleBatch<N>> {
        self.producer.enqueue(batch).map_err(|batch| {
            // Single writer, so no read-modify-write instruction is needed.
            let overruns = self.overruns.load(Ordering::Relaxed);
            self.overruns
                .store(overruns.wrapping_add(1), Ordering::Relaxed);
            batch
        })
    }
}

pub struct BatchConsumer<'q, const N: usize, const DEPTH: usize> {
    consumer: Consumer<'q, SampleBatch<N>, DEPTH>,
    overruns: &'q AtomicU32,
}

impl<const N: usize, const DEPTH: usize> BatchConsumer<'_, N, DEPTH> {
    /// Oldest batch that was not taken yet.
    pub fn take(&mut self) -> Option<SampleBatch<N>> {
        self.consumer.dequeue()
    }

    /// Newest queued batch, discarding any older ones.
    pub fn take_latest(&mut self) -> Option<SampleBatch<N>> {
        let mut latest = None;
        while let Some(batch) = self.consumer.dequeue() {
            latest = Some(batch);
        }
        latest
    }

    /// Number of batches waiting.
    pub fn pending(&self) -> usize {
        self.consumer.len()
    }

    /// Batches dropped so far because the queue was full.
    pub fn overruns(&self) -> u32 {
        self.overruns.load(Ordering::Relaxed)
    }
}

/// State of the stream interrupt handler: the FIFO it drains and the queue it
/// publishes to.
pub struct StreamIsr<'q, S, const N: usize, const DEPTH: usize> {
    source: S,
    producer: BatchProducer<'q, N, DEPTH>,
    triggers: u32,
}

impl<'q, S: StreamSource, const N: usize, const DEPTH: usize> StreamIsr<'q, S, N, DEPTH> {
    pub fn new(source: S, producer: BatchProducer<'q, N, DEPTH>) -> Self {
        StreamIsr {
            source,
            producer,
            triggers: 0,
        }
    }

    /// Drain one batch and publish it. Blocks until `N` samples were read.
    pub fn service(&mut self) {
        let batch = SampleBatch::read_from(&mut self.source);
        self.triggers = self.triggers.wrapping_add(1);
        // A full queue is recorded in the overrun counter.
        let _ = self.producer.publish(batch);
    }

    /// Number of times the handler ran.
    pub fn triggers(&self) -> u32 {
        self.triggers
    }

    /// Interrupt controller entry point; `context` is the `StreamIsr`.
    ///
    /// # Safety
    ///
    /// `context` must point to a live `StreamIsr` of exactly this type that
    /// nothing else accesses while the handler runs.
    pub unsafe fn handler(context: *mut ()) {
        let isr = &mut *(context as *mut Self);
        isr.service();
    }
}
