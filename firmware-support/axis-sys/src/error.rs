// SPDX-FileCopyrightText: 2024 Google LLC
//
// SPDX-License-Identifier: Apache-2.0

use ufmt::{uDisplay, uWrite, uwrite};

/// Failures reported by the peripheral drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    /// No configuration record exists for this device id.
    DeviceNotFound { device_id: u16 },
    /// The self-test read back an unexpected status register value.
    SelfTestFailed { status: u32 },
    /// The device was already started, it must be stopped first.
    DeviceStarted,
    InvalidLine { line: u8, num_lines: u8 },
    /// Software interrupts can only be raised in simulation mode.
    NotSimulationMode,
}

impl uDisplay for DriverError {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        match *self {
            DriverError::DeviceNotFound { device_id } => {
                uwrite!(f, "no device with id {}", device_id)
            }
            DriverError::SelfTestFailed { status } => {
                uwrite!(f, "self-test failed, status {:#x}", status)
            }
            DriverError::DeviceStarted => uwrite!(f, "device already started"),
            DriverError::InvalidLine { line, num_lines } => {
                uwrite!(f, "interrupt line {} out of range (0..{})", line, num_lines)
            }
            DriverError::NotSimulationMode => {
                uwrite!(f, "controller is not in simulation mode")
            }
        }
    }
}

impl core::fmt::Display for DriverError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match *self {
            DriverError::DeviceNotFound { device_id } => {
                write!(f, "no device with id {device_id}")
            }
            DriverError::SelfTestFailed { status } => {
                write!(f, "self-test failed, status {status:#x}")
            }
            DriverError::DeviceStarted => write!(f, "device already started"),
            DriverError::InvalidLine { line, num_lines } => {
                write!(f, "interrupt line {line} out of range (0..{num_lines})")
            }
            DriverError::NotSimulationMode => {
                write!(f, "controller is not in simulation mode")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::String;
    use ufmt::uwrite;

    #[test]
    fn udisplay_matches_display() {
        let errors = [
            DriverError::DeviceNotFound { device_id: 3 },
            DriverError::SelfTestFailed { status: 0x21 },
            DriverError::DeviceStarted,
            DriverError::InvalidLine {
                line: 4,
                num_lines: 1,
            },
            DriverError::NotSimulationMode,
        ];
        for err in errors {
            let mut u: String<64> = String::new();
            uwrite!(u, "{}", err).unwrap();

            let mut c: String<64> = String::new();
            core::fmt::Write::write_fmt(&mut c, format_args!("{err}")).unwrap();

            assert_eq!(u, c);
        }
    }

    #[test]
    fn self_test_failure_shows_status_in_hex() {
        let mut s: String<64> = String::new();
        uwrite!(s, "{}", DriverError::SelfTestFailed { status: 0x21 }).unwrap();
        assert_eq!(s.as_str(), "self-test failed, status 0x21");
    }
}
