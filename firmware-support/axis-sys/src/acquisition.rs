// SPDX-FileCopyrightText: 2024 Google LLC
//
// SPDX-License-Identifier: Apache-2.0
/*! The two acquisition flows.

 - Polled: read a batch with blocking reads, then print it ([`acquire_polled`]).
 - Interrupt driven: the stream interrupt drains a batch per trigger into a
   [`BatchChannel`], the foreground prints what arrives ([`arm_stream_interrupt`],
   [`print_arrived`]).
*/

use log::{debug, trace};
use ufmt::uWrite;

use crate::error::DriverError;
use crate::exception::{ExceptionId, ExceptionTable};
use crate::handoff::{BatchConsumer, StreamIsr};
use crate::intc::{InterruptController, StartMode};
use crate::sink::{print_batch, LineFormat};
use crate::stream::{SampleBatch, StreamSource};

/// Samples per batch in the polled flow.
pub const POLL_BATCH_LEN: usize = 20;
/// Samples drained per stream interrupt.
pub const IRQ_BATCH_LEN: usize = 30;
/// Queue depth between interrupt handler and foreground; holds one batch less.
pub const IRQ_QUEUE_DEPTH: usize = 4;

/// Read one batch of `N` samples from `source` and print it on `out`.
///
/// The returned batch is the one that was printed.
pub fn acquire_polled<S, W, const N: usize>(
    source: &mut S,
    out: &mut W,
) -> Result<SampleBatch<N>, W::Error>
where
    S: StreamSource + ?Sized,
    W: uWrite + ?Sized,
{
    let batch = SampleBatch::read_from(source);
    debug!("Read {} samples", N);
    print_batch(out, &batch, LineFormat::Labelled)?;
    Ok(batch)
}

/// Route the interrupt controller's `line` to `isr` and the controller
/// itself to the external interrupt exception.
///
/// The CPU-level enable is left to the caller, see [`crate::exception::enable`].
///
/// # Safety
///
/// `intc` and `isr` are registered by address: neither may move, be dropped
/// or be accessed otherwise while the registration is live. In firmware both
/// live in the frame of an entry point that never returns.
pub unsafe fn arm_stream_interrupt<S, const N: usize, const DEPTH: usize>(
    exceptions: &ExceptionTable,
    intc: &mut InterruptController,
    line: u8,
    isr: &mut StreamIsr<'_, S, N, DEPTH>,
    mode: StartMode,
) -> Result<(), DriverError>
where
    S: StreamSource,
{
    let isr_context = isr as *mut StreamIsr<'_, S, N, DEPTH> as *mut ();
    intc.connect(line, StreamIsr::<S, N, DEPTH>::handler, isr_context)?;
    intc.start(mode)?;
    intc.enable(line)?;

    exceptions.init();
    exceptions.register_handler(
        ExceptionId::Interrupt,
        InterruptController::dispatch_handler,
        intc as *mut InterruptController as *mut (),
    );
    debug!("Stream interrupt armed on line {}", line);
    Ok(())
}

/// Print every batch that arrived since the last call. Returns the number of
/// batches printed.
pub fn print_arrived<W, const N: usize, const DEPTH: usize>(
    consumer: &mut BatchConsumer<'_, N, DEPTH>,
    out: &mut W,
) -> Result<usize, W::Error>
where
    W: uWrite + ?Sized,
{
    let mut printed = 0;
    while let Some(batch) = consumer.take() {
        print_batch(out, &batch, LineFormat::Bare)?;
        printed += 1;
    }
    if printed > 0 {
        trace!("Printed {} batches", printed);
    }
    Ok(printed)
}
