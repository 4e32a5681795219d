#![no_std]
#![cfg_attr(not(test), no_main)]

// SPDX-FileCopyrightText: 2024 Google LLC
//
// SPDX-License-Identifier: Apache-2.0

use axis_sys::acquisition::{acquire_polled, POLL_BATCH_LEN};
use axis_sys::params;
use axis_sys::stream::{SampleBatch, StreamFifo};
use axis_sys::uart::log::LOGGER;
use axis_sys::uart::{init_uart, UartLite};
use log::{info, LevelFilter};

#[cfg(not(test))]
use riscv_rt::entry;

axis_sys::uart_panic! {
    unsafe { UartLite::new(params::UARTLITE_0_BASE as *const ()) }
}

#[cfg_attr(not(test), entry)]
fn main() -> ! {
    // Nothing can be reported without a UART, the panic handler tries anyway.
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

    unsafe { axis_sys::exception::disable() };

    let mut fifo = match StreamFifo::initialize(
        params::AXIS_FIFO_CONFIG_TABLE,
        params::AXIS_FIFO_0_DEVICE_ID,
    ) {
        Ok(fifo) => fifo,
        Err(e) => panic!("Stream FIFO bring-up failed: {}", e),
    };

    info!("Reading {} samples", POLL_BATCH_LEN);
    let batch: Result<SampleBatch<POLL_BATCH_LEN>, ()> = acquire_polled(&mut fifo, &mut uart);
    if batch.is_ok() {
        info!("Done");
    }

    loop {
        continue;
    }
}
