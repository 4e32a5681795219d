// SPDX-FileCopyrightText: 2022 Google LLC
//
// SPDX-License-Identifier: Apache-2.0

use core::{fmt::Write, panic::PanicInfo};

/// Mask interrupts, write `info` to `writer` and spin. A debugger attached to
/// the core can break on this function to inspect the state.
#[inline(never)]
pub fn report_and_halt<W: Write>(writer: &mut W, info: &PanicInfo) -> ! {
    unsafe { crate::exception::disable() };
    match info.location() {
        Some(loc) => {
            let _ = writeln!(writer, "A panic happened {}:{}", loc.file(), loc.line());
        }
        None => {
            let _ = writeln!(writer, "A panic without location information happened");
        }
    }
    let _ = writeln!(writer, "{}", info.message());
    loop {
        continue;
    }
}

/// Define the program's panic handler. `$writer` is evaluated inside the
/// handler and must produce a `core::fmt::Write` implementation.
#[macro_export]
macro_rules! uart_panic {
    ($writer:expr) => {
        #[panic_handler]
        fn uart_panic(info: &::core::panic::PanicInfo) -> ! {
            let mut writer = $writer;
            $crate::panic_handler::report_and_halt(&mut writer, info);
        }
    };
}
