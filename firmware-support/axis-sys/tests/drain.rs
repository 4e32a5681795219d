// SPDX-FileCopyrightText: 2024 Google LLC
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::VecDeque;

use proptest::prelude::*;
use test_strategy::proptest;

use axis_sys::stream::*;

/// Plays back `samples`, but only answers every `period`th poll.
struct Scripted {
    samples: VecDeque<Sample>,
    period: u32,
    polls: u32,
}

impl Scripted {
    fn new(samples: &[Sample], period: u32) -> Scripted {
        Scripted {
            samples: samples.iter().copied().collect(),
            period,
            polls: 0,
        }
    }
}

impl StreamSource for Scripted {
    fn try_get(&mut self) -> Option<Sample> {
        self.polls += 1;
        if self.polls % self.period != 0 {
            return None;
        }
        self.samples.pop_front()
    }
}

// Every slot is filled, in the order the stream delivered the samples.
#[proptest]
fn drain_keeps_stream_order(
    #[strategy(proptest::collection::vec(any::<i32>(), 0..256))] samples: Vec<i32>,
) {
    let mut source = Scripted::new(&samples, 1);
    let mut buffer = vec![0; samples.len()];
    drain(&mut source, &mut buffer);
    prop_assert_eq!(buffer, samples);
    prop_assert!(source.samples.is_empty());
}

// A drain shorter than the stream leaves the remainder untouched.
#[proptest]
fn drain_takes_only_what_it_needs(
    #[strategy(proptest::collection::vec(any::<i32>(), 1..128))] samples: Vec<i32>,
    #[strategy(0usize..128)] take: usize,
) {
    let take = take.min(samples.len());
    let mut source = Scripted::new(&samples, 1);
    let mut buffer = vec![0; take];
    drain(&mut source, &mut buffer);
    prop_assert_eq!(&buffer[..], &samples[..take]);
    prop_assert_eq!(source.samples.len(), samples.len() - take);
}

// Empty polls are retried until the batch is complete.
#[proptest]
fn drain_survives_slow_stream(
    #[strategy(proptest::collection::vec(any::<i32>(), 0..64))] samples: Vec<i32>,
    #[strategy(1u32..16)] period: u32,
) {
    let mut source = Scripted::new(&samples, period);
    let mut buffer = vec![0; samples.len()];
    drain(&mut source, &mut buffer);
    prop_assert_eq!(buffer, samples.clone());
    prop_assert_eq!(source.polls, period * samples.len() as u32);
}

// A stream that runs dry reports how far the bounded drain got.
#[proptest]
fn bounded_drain_reports_short_stream(
    #[strategy(proptest::collection::vec(any::<i32>(), 0..64))] samples: Vec<i32>,
    #[strategy(1usize..16)] missing: usize,
) {
    let mut source = Scripted::new(&samples, 1);
    let mut buffer = vec![0; samples.len() + missing];
    prop_assert_eq!(
        drain_with_timeout(&mut source, &mut buffer, 4),
        Err(DrainTimeout {
            received: samples.len()
        })
    );
    prop_assert_eq!(&buffer[..samples.len()], &samples[..]);
}

#[test]
fn batch_of_twenty_from_counting_stream() {
    let samples: Vec<Sample> = (0..20).collect();
    let mut source = Scripted::new(&samples, 3);
    let batch: SampleBatch<20> = SampleBatch::read_from(&mut source);
    assert_eq!(batch.len(), 20);
    assert_eq!(batch.as_slice(), &samples[..]);
}
