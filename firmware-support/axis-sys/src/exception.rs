// SPDX-FileCopyrightText: 2024 Google LLC
//
// SPDX-License-Identifier: Apache-2.0
/*! CPU exception vectors.

The runtime's trap handlers take no arguments, so they need a static table to
find the code that should run. [`ExceptionTable`] is that table: each entry is
a [`Vector`], a handler plus the opaque context pointer it is called with.

```ignore
static EXCEPTIONS: ExceptionTable = ExceptionTable::new();

#[export_name = "MachineExternal"]
extern "C" fn machine_external() {
    EXCEPTIONS.dispatch(ExceptionId::Interrupt);
}
```
*/

use core::cell::UnsafeCell;

/// Interrupt or exception callback. The argument is the context pointer that
/// was registered together with the handler.
pub type Handler = unsafe fn(*mut ());

/// A handler and the context it runs with.
#[derive(Clone, Copy)]
pub struct Vector {
    handler: Handler,
    context: *mut (),
}

impl Vector {
    pub const fn new(handler: Handler, context: *mut ()) -> Vector {
        Vector { handler, context }
    }

    /// # Safety
    ///
    /// The context pointer must still be valid for the handler.
    pub unsafe fn call(&self) {
        (self.handler)(self.context)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionId {
    /// External interrupt input, driven by the interrupt controller.
    Interrupt = 0,
    /// Illegal instruction, bus error and other synchronous faults.
    Fault = 1,
}

const NUM_EXCEPTIONS: usize = 2;

pub struct ExceptionTable {
    entries: UnsafeCell<[Option<Vector>; NUM_EXCEPTIONS]>,
}

// Entries are only written with interrupts masked, see `register_handler`.
unsafe impl Sync for ExceptionTable {}

impl ExceptionTable {
    pub const fn new() -> Self {
        ExceptionTable {
            entries: UnsafeCell::new([None; NUM_EXCEPTIONS]),
        }
    }

    /// Remove all registered handlers.
    pub fn init(&self) {
        free(|| unsafe { *self.entries.get() = [None; NUM_EXCEPTIONS] });
    }

    /// Run `handler(context)` whenever exception `id` is dispatched.
    ///
    /// # Safety
    ///
    /// `context` must be valid for `handler` for as long as the handler stays
    /// registered.
    pub unsafe fn register_handler(&self, id: ExceptionId, handler: Handler, context: *mut ()) {
        free(|| (*self.entries.get())[id as usize] = Some(Vector::new(handler, context)));
    }

    pub fn remove_handler(&self, id: ExceptionId) {
        free(|| unsafe { (*self.entries.get())[id as usize] = None });
    }

    pub fn is_registered(&self, id: ExceptionId) -> bool {
        unsafe { (*self.entries.get())[id as usize].is_some() }
    }

    /// Call the handler registered for `id`. Returns `false` if there is none.
    ///
    /// Must only be called from the trap handler, or with interrupts masked.
    pub fn dispatch(&self, id: ExceptionId) -> bool {
        let vector = unsafe { (*self.entries.get())[id as usize] };
        match vector {
            Some(vector) => {
                unsafe { vector.call() };
                true
            }
            None => false,
        }
    }
}

impl Default for ExceptionTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_arch = "riscv32")]
fn free<R>(f: impl FnOnce() -> R) -> R {
    riscv::interrupt::free(f)
}

#[cfg(not(target_arch = "riscv32"))]
fn free<R>(f: impl FnOnce() -> R) -> R {
    f()
}

/// Let external interrupts reach the CPU.
///
/// # Safety
///
/// Every handler that can be dispatched must be ready to run.
#[cfg(target_arch = "riscv32")]
pub unsafe fn enable() {
    riscv::register::mie::set_mext();
    riscv::interrupt::enable();
}

/// Mask all interrupts at the CPU.
///
/// # Safety
///
/// Code relying on interrupts to make progress will stall.
#[cfg(target_arch = "riscv32")]
pub unsafe fn disable() {
    riscv::interrupt::disable();
}

#[cfg(not(target_arch = "riscv32"))]
static HOST_INTERRUPTS_ENABLED: core::sync::atomic::AtomicBool =
    core::sync::atomic::AtomicBool::new(false);

/// Host builds have no interrupt inputs; only the enable state is tracked.
///
/// # Safety
///
/// Always safe on the host, unsafe for parity with the target build.
#[cfg(not(target_arch = "riscv32"))]
pub unsafe fn enable() {
    HOST_INTERRUPTS_ENABLED.store(true, core::sync::atomic::Ordering::Relaxed);
}

/// # Safety
///
/// Always safe on the host, unsafe for parity with the target build.
#[cfg(not(target_arch = "riscv32"))]
pub unsafe fn disable() {
    HOST_INTERRUPTS_ENABLED.store(false, core::sync::atomic::Ordering::Relaxed);
}
