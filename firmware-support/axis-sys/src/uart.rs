// SPDX-FileCopyrightText: 2022 Google LLC
//
// SPDX-License-Identifier: Apache-2.0

pub mod log;

use crate::error::DriverError;
use crate::params::{self, UartLiteConfig};

const RX_FIFO_OFFSET: usize = 0;
const TX_FIFO_OFFSET: usize = 1;
const STATUS_OFFSET: usize = 2;
const CONTROL_OFFSET: usize = 3;

const SR_RX_FIFO_VALID_DATA: u32 = 1 << 0;
const SR_RX_FIFO_FULL: u32 = 1 << 1;
const SR_TX_FIFO_EMPTY: u32 = 1 << 2;
const SR_TX_FIFO_FULL: u32 = 1 << 3;
const SR_INTR_ENABLED: u32 = 1 << 4;
const SR_OVERRUN_ERROR: u32 = 1 << 5;
const SR_FRAME_ERROR: u32 = 1 << 6;
const SR_PARITY_ERROR: u32 = 1 << 7;

const CR_RESET_TX_FIFO: u32 = 1 << 0;
const CR_RESET_RX_FIFO: u32 = 1 << 1;

pub struct UartStatus {
    pub rx_valid_data: bool,
    pub rx_fifo_full: bool,
    pub tx_fifo_empty: bool,
    pub tx_fifo_full: bool,
    pub interrupts_enabled: bool,
    pub overrun_error: bool,
    pub frame_error: bool,
    pub parity_error: bool,
}

impl UartStatus {
    fn from_bits(bits: u32) -> UartStatus {
        UartStatus {
            rx_valid_data: bits & SR_RX_FIFO_VALID_DATA != 0,
            rx_fifo_full: bits & SR_RX_FIFO_FULL != 0,
            tx_fifo_empty: bits & SR_TX_FIFO_EMPTY != 0,
            tx_fifo_full: bits & SR_TX_FIFO_FULL != 0,
            interrupts_enabled: bits & SR_INTR_ENABLED != 0,
            overrun_error: bits & SR_OVERRUN_ERROR != 0,
            frame_error: bits & SR_FRAME_ERROR != 0,
            parity_error: bits & SR_PARITY_ERROR != 0,
        }
    }
}

pub struct TransmitBufferFull;
pub struct ReceiveBufferEmpty;

#[derive(Clone)]
/// `UartLite` drives an AXI UART Lite core: fixed baud rate and frame format,
/// a 16 entry receive FIFO and a 16 entry transmit FIFO.
pub struct UartLite {
    /// Base of the four 32-bit registers: RX FIFO, TX FIFO, status, control.
    regs: *mut u32,
    config: Option<UartLiteConfig>,
}

impl UartLite {
    /// Create a new [`UartLite`] instance given a base address.
    ///
    /// # Safety
    ///
    /// The `base_addr` pointer MUST BE a valid pointer that is backed
    /// by a memory mapped UART Lite instance.
    pub const unsafe fn new(base_addr: *const ()) -> UartLite {
        UartLite {
            regs: base_addr as *mut u32,
            config: None,
        }
    }

    /// Look `device_id` up in `table` and create a handle for that instance.
    ///
    /// The table must describe the hardware this code runs on; the base
    /// address of the matching record is trusted.
    pub fn initialize(table: &[UartLiteConfig], device_id: u16) -> Result<UartLite, DriverError> {
        let config =
            params::lookup(table, device_id).ok_or(DriverError::DeviceNotFound { device_id })?;
        // SAFETY: the configuration table describes the memory mapped instance.
        let mut uart = unsafe { UartLite::new(config.base_address as *const ()) };
        uart.config = Some(*config);
        Ok(uart)
    }

    /// Record this handle was initialized from, `None` for handles made with
    /// [`UartLite::new`].
    pub fn config(&self) -> Option<&UartLiteConfig> {
        self.config.as_ref()
    }

    fn read_reg(&self, offset: usize) -> u32 {
        unsafe { self.regs.add(offset).read_volatile() }
    }

    fn write_reg(&self, offset: usize, value: u32) {
        unsafe { self.regs.add(offset).write_volatile(value) }
    }

    /// Raw contents of the status register.
    pub fn status_bits(&self) -> u32 {
        self.read_reg(STATUS_OFFSET)
    }

    /// UART status register output
    pub fn read_status(&self) -> UartStatus {
        UartStatus::from_bits(self.status_bits())
    }

    /// Empty both FIFOs. Interrupts stay disabled.
    pub fn reset_fifos(&self) {
        self.write_reg(CONTROL_OFFSET, CR_RESET_RX_FIFO | CR_RESET_TX_FIFO);
    }

    /// Reset both FIFOs and verify that the core reports an empty transmit
    /// FIFO and no received data.
    pub fn self_test(&mut self) -> Result<(), DriverError> {
        self.reset_fifos();

        let status = self.status_bits();
        let unexpected = SR_RX_FIFO_VALID_DATA | SR_RX_FIFO_FULL | SR_TX_FIFO_FULL;
        if status & unexpected != 0 || status & SR_TX_FIFO_EMPTY == 0 {
            return Err(DriverError::SelfTestFailed { status });
        }
        Ok(())
    }

    /// The `receive` function attempts to receive data from the UART. If no
    /// data is available, it keeps looping until data is available.
    pub fn receive(&self) -> u8 {
        loop {
            if let Ok(val) = self.try_receive() {
                return val;
            }
        }
    }

    /// The `try_receive` function attempts to receive data from the UART. If no
    /// data is available, it returns an error.
    pub fn try_receive(&self) -> Result<u8, ReceiveBufferEmpty> {
        if self.read_status().rx_valid_data {
            Ok(self.read_reg(RX_FIFO_OFFSET) as u8)
        } else {
            Err(ReceiveBufferEmpty)
        }
    }

    /// The `send` function sends the given data to the UART. If the UART is
    /// unable to accept the data, it keeps looping until it can send the data.
    pub fn send(&self, data: u8) {
        loop {
            if let Ok(()) = self.try_send(data) {
                return;
            }
        }
    }

    /// The `try_send` function attempts to send the given data to the UART. If
    /// the UART is unable to accept the data, it returns an error.
    pub fn try_send(&self, data: u8) -> Result<(), TransmitBufferFull> {
        if self.read_status().tx_fifo_full {
            Err(TransmitBufferFull)
        } else {
            self.write_reg(TX_FIFO_OFFSET, data as u32);
            Ok(())
        }
    }
}

impl ufmt::uWrite for UartLite {
    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        for b in s.bytes() {
            self.send(b);
        }
        Ok(())
    }

    type Error = ();
}

impl core::fmt::Write for UartLite {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        for b in s.bytes() {
            self.send(b);
        }
        Ok(())
    }
}

/// Initialize the UART Lite instance `device_id` and run its self-test.
pub fn init_uart(table: &[UartLiteConfig], device_id: u16) -> Result<UartLite, DriverError> {
    let mut uart = UartLite::initialize(table, device_id)?;
    uart.self_test()?;
    Ok(uart)
}
