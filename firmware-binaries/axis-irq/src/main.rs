#![no_std]
#![cfg_attr(not(test), no_main)]

// SPDX-FileCopyrightText: 2024 Google LLC
//
// SPDX-License-Identifier: Apache-2.0

use axis_sys::acquisition::{arm_stream_interrupt, print_arrived, IRQ_BATCH_LEN, IRQ_QUEUE_DEPTH};
use axis_sys::exception::{self, ExceptionId, ExceptionTable};
use axis_sys::handoff::{BatchChannel, StreamIsr};
use axis_sys::intc::{InterruptController, StartMode};
use axis_sys::params;
use axis_sys::stream::StreamFifo;
use axis_sys::uart::log::LOGGER;
use axis_sys::uart::{init_uart, UartLite};
use log::{error, info, warn, LevelFilter};

#[cfg(not(test))]
use riscv_rt::entry;

use riscv::register::{mcause, mepc, mtval};

/// Looked up by the trap handler, which gets no arguments.
static EXCEPTIONS: ExceptionTable = ExceptionTable::new();

axis_sys::uart_panic! {
    unsafe { UartLite::new(params::UARTLITE_0_BASE as *const ()) }
}

fn halt() -> ! {
    loop {
        continue;
    }
}

#[cfg_attr(not(test), entry)]
fn main() -> ! {
    let mut uart = match init_uart(params::UARTLITE_CONFIG_TABLE, params::UARTLITE_0_DEVICE_ID) {
        Ok(uart) => uart,
        Err(e) => panic!("UART bring-up failed: {}", e),
    };

    unsafe {
        let logger = &mut *core::ptr::addr_of_mut!(LOGGER);
        logger.set_logger(uart.clone());
        logger.display_source = LevelFilter::Warn;
        log::set_logger_racy(logger).ok();
        log::set_max_level_racy(LevelFilter::Info);
    }
    if let Some(config) = uart.config() {
        info!("UART ready, {}", config);
    }

    let fifo = match StreamFifo::initialize(
        params::AXIS_FIFO_CONFIG_TABLE,
        params::AXIS_FIFO_0_DEVICE_ID,
    ) {
        Ok(fifo) => fifo,
        Err(e) => {
            error!("Stream FIFO bring-up failed: {}", e);
            halt();
        }
    };

    let stream_line = fifo.irq_line();
    let mut channel: BatchChannel<IRQ_BATCH_LEN, IRQ_QUEUE_DEPTH> = BatchChannel::new();
    let (producer, mut consumer) = channel.split();
    let mut isr = StreamIsr::new(fifo, producer);

    let mut intc =
        match InterruptController::initialize(params::INTC_CONFIG_TABLE, params::INTC_0_DEVICE_ID) {
            Ok(intc) => intc,
            Err(e) => {
                error!("Interrupt controller bring-up failed: {}", e);
                halt();
            }
        };

    // SAFETY: `intc` and `isr` live in this frame, which is never left. Neither
    // is touched again after this point.
    let armed = unsafe {
        arm_stream_interrupt(
            &EXCEPTIONS,
            &mut intc,
            stream_line,
            &mut isr,
            StartMode::Real,
        )
    };
    if let Err(e) = armed {
        error!("Connecting the stream interrupt failed: {}", e);
        halt();
    }

    unsafe { exception::enable() };
    info!("Waiting for samples");

    let mut reported_overruns = 0;
    loop {
        if print_arrived(&mut consumer, &mut uart).is_err() {
            halt();
        }
        let overruns = consumer.overruns();
        if overruns != reported_overruns {
            warn!(
                "{} batches dropped, printing is slower than the stream",
                overruns.wrapping_sub(reported_overruns)
            );
            reported_overruns = overruns;
        }
    }
}

#[export_name = "MachineExternal"]
extern "C" fn machine_external() {
    EXCEPTIONS.dispatch(ExceptionId::Interrupt);
}

#[export_name = "ExceptionHandler"]
fn exception_handler(_trap_frame: &riscv_rt::TrapFrame) -> ! {
    riscv::interrupt::free(|| {
        if !EXCEPTIONS.dispatch(ExceptionId::Fault) {
            error!("... caught an exception. Looping forever now.");
            error!("mcause: {:?}", mcause::read().cause());
            error!("mepc: {:?}", mepc::read());
            error!("mtval: {:?}", mtval::read());
        }
    });
    halt();
}
