// SPDX-FileCopyrightText: 2024 Google LLC
//
// SPDX-License-Identifier: Apache-2.0
/*! Board parameters.

Static description of the peripherals instantiated next to the soft core.
Every peripheral instance is identified by a device id; drivers look their
configuration record up by that id when they are initialized, so a program
only ever names the id constants below.

The base addresses follow the interconnect layout of the reference design:
the upper nibble of the address selects the peripheral. Nibbles `0b0100`
(data memory) and `0b1000` (instruction memory) belong to the core's own
memories, see `memory.x` of the firmware binaries.
*/

use core::fmt;

/// Configuration records that can be looked up by device id.
pub trait DeviceConfig {
    fn device_id(&self) -> u16;
}

/// Find the configuration record for `device_id` in `table`.
pub fn lookup<T: DeviceConfig>(table: &[T], device_id: u16) -> Option<&T> {
    table.iter().find(|cfg| cfg.device_id() == device_id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UartLiteConfig {
    pub device_id: u16,
    pub base_address: usize,
    pub baud_rate: u32,
    pub use_parity: bool,
    pub odd_parity: bool,
    pub data_bits: u8,
}

impl DeviceConfig for UartLiteConfig {
    fn device_id(&self) -> u16 {
        self.device_id
    }
}

/// Line settings in the usual shorthand, e.g. `9600 baud 8N1`. The core
/// always sends one stop bit.
impl fmt::Display for UartLiteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parity = match (self.use_parity, self.odd_parity) {
            (false, _) => 'N',
            (true, true) => 'O',
            (true, false) => 'E',
        };
        write!(f, "{} baud {}{}1", self.baud_rate, self.data_bits, parity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntcConfig {
    pub device_id: u16,
    pub base_address: usize,
    /// Number of interrupt inputs wired to the controller.
    pub num_lines: u8,
    /// Lines that are acknowledged before their handler runs. These are the
    /// edge-sensitive inputs; level-sensitive inputs are acknowledged after
    /// the handler cleared the source.
    pub ack_before_service: u32,
}

impl DeviceConfig for IntcConfig {
    fn device_id(&self) -> u16 {
        self.device_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFifoConfig {
    pub device_id: u16,
    pub base_address: usize,
    /// Interrupt controller input driven by the FIFO's data-available signal.
    pub irq_line: u8,
}

impl DeviceConfig for StreamFifoConfig {
    fn device_id(&self) -> u16 {
        self.device_id
    }
}

pub const UARTLITE_0_DEVICE_ID: u16 = 0;
pub const INTC_0_DEVICE_ID: u16 = 0;
pub const AXIS_FIFO_0_DEVICE_ID: u16 = 0;

pub const UARTLITE_0_BASE: usize = 0b0010 << 28;
pub const INTC_0_BASE: usize = 0b0011 << 28;
pub const AXIS_FIFO_0_BASE: usize = 0b0101 << 28;

pub const AXIS_FIFO_0_IRQ_LINE: u8 = 0;

/// Data memory, as laid out in the binaries' `memory.x`.
pub const DMEM_BASE: usize = 0x4000_0000;
pub const DMEM_LEN: usize = 32 * 1024;
/// Instruction memory, as laid out in the binaries' `memory.x`.
pub const IMEM_BASE: usize = 0x8000_0000;
pub const IMEM_LEN: usize = 64 * 1024;

pub const UARTLITE_CONFIG_TABLE: &[UartLiteConfig] = &[UartLiteConfig {
    device_id: UARTLITE_0_DEVICE_ID,
    base_address: UARTLITE_0_BASE,
    baud_rate: 9600,
    use_parity: false,
    odd_parity: false,
    data_bits: 8,
}];

pub const INTC_CONFIG_TABLE: &[IntcConfig] = &[IntcConfig {
    device_id: INTC_0_DEVICE_ID,
    base_address: INTC_0_BASE,
    num_lines: 1,
    ack_before_service: 0,
}];

pub const AXIS_FIFO_CONFIG_TABLE: &[StreamFifoConfig] = &[StreamFifoConfig {
    device_id: AXIS_FIFO_0_DEVICE_ID,
    base_address: AXIS_FIFO_0_BASE,
    irq_line: AXIS_FIFO_0_IRQ_LINE,
}];
