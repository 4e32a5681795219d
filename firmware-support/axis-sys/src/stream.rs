// SPDX-FileCopyrightText: 2024 Google LLC
//
// SPDX-License-Identifier: Apache-2.0
/*! AXI4-Stream receive FIFO.

Samples arrive over an AXI4-Stream link and are buffered in a small hardware
FIFO. Software pulls them out one word at a time:

 - [`StreamSource`] is the read port: a blocking `get` and a non-blocking `try_get`.
 - [`StreamFifo`] is the memory mapped FIFO peripheral implementing it.
 - [`drain`] fills a buffer with consecutive samples, [`SampleBatch`] is the
   fixed-size buffer the acquisition programs use.
*/

use crate::error::DriverError;
use crate::params::{self, StreamFifoConfig};

/// One word read from the stream.
pub type Sample = i32;

const DATA_OFFSET: usize = 0;
const STATUS_OFFSET: usize = 1;
const OCCUPANCY_OFFSET: usize = 2;

const STATUS_DATA_VALID: u32 = 0b01;
const STATUS_OVERFLOW: u32 = 0b10;

/// Read side of a sample stream.
pub trait StreamSource {
    /// Take the next sample if one is buffered.
    fn try_get(&mut self) -> Option<Sample>;

    /// Take the next sample, waiting for as long as it takes to arrive. There
    /// is no timeout: a stalled producer stalls the caller.
    fn get(&mut self) -> Sample {
        loop {
            if let Some(sample) = self.try_get() {
                return sample;
            }
        }
    }
}

impl<S: StreamSource + ?Sized> StreamSource for &mut S {
    fn try_get(&mut self) -> Option<Sample> {
        (**self).try_get()
    }

    fn get(&mut self) -> Sample {
        (**self).get()
    }
}

pub struct StreamFifoStatus {
    pub data_valid: bool,
    /// Sticky: the stream delivered a word while the FIFO was full.
    pub overflow: bool,
}

/// Memory mapped AXI4-Stream receive FIFO.
///
/// Register map, one 32-bit word each:
/// - `DATA`: reading pops the oldest word.
/// - `STATUS`: bit 0 data valid, bit 1 overflow. Writing 1 to bit 1 clears it.
/// - `OCCUPANCY`: number of words currently buffered.
pub struct StreamFifo {
    regs: *mut u32,
    irq_line: u8,
}

impl StreamFifo {
    /// Creates a new instance of `StreamFifo`.
    ///
    /// # Safety
    ///
    /// `base_addr` must point to a memory mapped stream FIFO peripheral whose
    /// data-available signal drives interrupt controller input `irq_line`.
    pub const unsafe fn new(base_addr: *const (), irq_line: u8) -> Self {
        StreamFifo {
            regs: base_addr as *mut u32,
            irq_line,
        }
    }

    pub fn initialize(table: &[StreamFifoConfig], device_id: u16) -> Result<Self, DriverError> {
        let config =
            params::lookup(table, device_id).ok_or(DriverError::DeviceNotFound { device_id })?;
        // SAFETY: the configuration table describes the memory mapped instance.
        Ok(unsafe { StreamFifo::new(config.base_address as *const (), config.irq_line) })
    }

    /// Interrupt controller input raised while the FIFO holds data.
    pub fn irq_line(&self) -> u8 {
        self.irq_line
    }

    fn read_reg(&self, offset: usize) -> u32 {
        unsafe { self.regs.add(offset).read_volatile() }
    }

    fn write_reg(&self, offset: usize, value: u32) {
        unsafe { self.regs.add(offset).write_volatile(value) }
    }

    pub fn read_status(&self) -> StreamFifoStatus {
        let bits = self.read_reg(STATUS_OFFSET);
        StreamFifoStatus {
            data_valid: bits & STATUS_DATA_VALID != 0,
            overflow: bits & STATUS_OVERFLOW != 0,
        }
    }

    pub fn has_data(&self) -> bool {
        self.read_status().data_valid
    }

    pub fn occupancy(&self) -> usize {
        self.read_reg(OCCUPANCY_OFFSET) as usize
    }

    pub fn clear_overflow(&self) {
        self.write_reg(STATUS_OFFSET, STATUS_OVERFLOW);
    }
}

impl StreamSource for StreamFifo {
    fn try_get(&mut self) -> Option<Sample> {
        if !self.has_data() {
            return None;
        }
        Some(self.read_reg(DATA_OFFSET) as Sample)
    }
}

/// Fill `buffer` front to back with consecutive samples from `source`.
///
/// Blocks until every slot is written.
pub fn drain<S: StreamSource + ?Sized>(source: &mut S, buffer: &mut [Sample]) {
    for slot in buffer.iter_mut() {
        *slot = source.get();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainTimeout {
    /// Number of leading slots that were written before the stream stalled.
    pub received: usize,
}

/// Like [`drain`], but gives up when a single sample takes more than
/// `attempts` polls to arrive.
pub fn drain_with_timeout<S: StreamSource + ?Sized>(
    source: &mut S,
    buffer: &mut [Sample],
    attempts: usize,
) -> Result<(), DrainTimeout> {
    for (received, slot) in buffer.iter_mut().enumerate() {
        *slot = (0..attempts)
            .find_map(|_| source.try_get())
            .ok_or(DrainTimeout { received })?;
    }
    Ok(())
}

/// A fixed number of samples in the order they were read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleBatch<const N: usize> {
    samples: [Sample; N],
}

impl<const N: usize> SampleBatch<N> {
    pub const fn new() -> Self {
        SampleBatch { samples: [0; N] }
    }

    /// Overwrite every sample with fresh data from `source`.
    pub fn fill_from<S: StreamSource + ?Sized>(&mut self, source: &mut S) {
        drain(source, &mut self.samples);
    }

    /// Read a complete batch from `source`.
    pub fn read_from<S: StreamSource + ?Sized>(source: &mut S) -> Self {
        let mut batch = Self::new();
        batch.fill_from(source);
        batch
    }

    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    pub fn as_slice(&self) -> &[Sample] {
        &self.samples
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    pub fn into_inner(self) -> [Sample; N] {
        self.samples
    }
}

impl<const N: usize> Default for SampleBatch<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> From<[Sample; N]> for SampleBatch<N> {
    fn from(samples: [Sample; N]) -> Self {
        SampleBatch { samples }
    }
}

impl<'a, const N: usize> IntoIterator for &'a SampleBatch<N> {
    type Item = &'a Sample;
    type IntoIter = core::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}
