// SPDX-FileCopyrightText: 2024 Google LLC
//
// SPDX-License-Identifier: Apache-2.0
use crate::uart::UartLite;

// The logger utilizes core::fmt to format the log messages because ufmt formatting is not
// compatible with (dependencies of) the log crate.
use core::fmt::Write;
use log::LevelFilter;

/// A global logger instance to be used with the `log` crate.
///
/// Use `set_logger` to set the `UartLite` instance to be used for logging.
/// # Safety
/// Using this logger is only safe from the foreground context. Interrupt
/// handlers must not log: the logger writes to the same UART as the
/// foreground without masking interrupts.
pub static mut LOGGER: UartLogger = UartLogger {
    uart: None,
    display_level: LevelFilter::Trace,
    display_source: LevelFilter::Trace,
};

/// Wrapper for `UartLite` to be used as a logger with the `log` crate
/// Instead of making a new logger, use the `set_logger` method of the `LOGGER` instance.
/// # Safety
/// Using this logger is only safe if there is only one thread of execution.
/// Even though `UartLogger` is `Send` and `Sync`, the underlying `UartLite` is not.
pub struct UartLogger {
    uart: Option<UartLite>,
    /// Records at or below this level are prefixed with their level.
    pub display_level: LevelFilter,
    /// Records at or below this level are prefixed with `file:line`.
    pub display_source: LevelFilter,
}

impl UartLogger {
    /// Set the logger to use the given UART.
    /// # Safety
    /// Using this function and logger is only safe if there is only one thread of execution.
    /// This function is used to assign the `UartLite` instance to a global (`static mut`), but
    /// `UartLite` is not `Send` or `Sync`.
    pub unsafe fn set_logger(&mut self, uart: UartLite) {
        self.uart = Some(uart);
    }

    fn write_record<W: Write>(&self, w: &mut W, record: &log::Record) -> core::fmt::Result {
        if record.level() <= self.display_level {
            write!(w, "{} | ", record.level())?;
        }
        if record.level() <= self.display_source {
            write!(
                w,
                "{}:{} - ",
                record.file().unwrap_or("?"),
                record.line().unwrap_or(0)
            )?;
        }
        writeln!(w, "{}", record.args())
    }
}

impl log::Log for UartLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        // Cloning only copies the register pointer.
        match self.uart.clone() {
            Some(mut uart) => {
                let _ = self.write_record(&mut uart, record);
            }
            None => panic!("Logger not set"),
        }
    }

    fn flush(&self) {}
}

unsafe impl core::marker::Send for UartLogger {}
unsafe impl core::marker::Sync for UartLogger {}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::String;

    fn render(logger: &UartLogger, level: log::Level) -> String<128> {
        let mut out: String<128> = String::new();
        logger
            .write_record(
                &mut out,
                &log::Record::builder()
                    .level(level)
                    .file(Some("acquire.rs"))
                    .line(Some(12))
                    .args(format_args!("drained {}", 20))
                    .build(),
            )
            .unwrap();
        out
    }

    #[test]
    fn full_prefix_by_default() {
        let logger = UartLogger {
            uart: None,
            display_level: LevelFilter::Trace,
            display_source: LevelFilter::Trace,
        };
        assert_eq!(
            render(&logger, log::Level::Info).as_str(),
            "INFO | acquire.rs:12 - drained 20\n"
        );
    }

    #[test]
    fn source_hidden_below_threshold() {
        let logger = UartLogger {
            uart: None,
            display_level: LevelFilter::Trace,
            display_source: LevelFilter::Warn,
        };
        assert_eq!(
            render(&logger, log::Level::Info).as_str(),
            "INFO | drained 20\n"
        );
        assert_eq!(
            render(&logger, log::Level::Error).as_str(),
            "ERROR | acquire.rs:12 - drained 20\n"
        );
    }
}
