// SPDX-FileCopyrightText: 2024 Google LLC
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::DriverError;
use crate::exception::{Handler, Vector};
use crate::params::{self, IntcConfig};

const ISR_OFFSET: usize = 0;
const IER_OFFSET: usize = 2;
const IAR_OFFSET: usize = 3;
const MER_OFFSET: usize = 7;

const MER_ME: u32 = 0b01;
const MER_HIE: u32 = 0b10;

/// Upper bound on interrupt inputs of a single controller.
pub const MAX_LINES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    /// Only software raised interrupts, see [`InterruptController::simulate_interrupt`].
    Simulation,
    /// Hardware inputs drive the controller output. Once set, the hardware
    /// interrupt enable cannot be cleared until the next reset.
    Real,
}

/// Driver for an AXI interrupt controller: up to 32 inputs combined onto the
/// CPU's external interrupt line.
pub struct InterruptController {
    regs: *mut u32,
    num_lines: u8,
    ack_before_service: u32,
    vectors: [Option<Vector>; MAX_LINES],
    unhandled: u32,
}

impl InterruptController {
    /// Find `device_id` in `table`, then disable and acknowledge every input.
    ///
    /// Fails if the controller is already running; call [`Self::stop`] on a
    /// previous handle first.
    pub fn initialize(table: &[IntcConfig], device_id: u16) -> Result<Self, DriverError> {
        let config =
            params::lookup(table, device_id).ok_or(DriverError::DeviceNotFound { device_id })?;
        // SAFETY: the configuration table describes the memory mapped instance.
        let intc = unsafe {
            InterruptController::new(
                config.base_address as *const (),
                config.num_lines,
                config.ack_before_service,
            )
        };

        if intc.read_reg(MER_OFFSET) & MER_ME != 0 {
            return Err(DriverError::DeviceStarted);
        }

        intc.write_reg(IER_OFFSET, 0);
        intc.write_reg(IAR_OFFSET, u32::MAX);
        Ok(intc)
    }

    /// # Safety
    ///
    /// `base_addr` must point to a memory mapped interrupt controller with
    /// `num_lines` inputs.
    pub const unsafe fn new(base_addr: *const (), num_lines: u8, ack_before_service: u32) -> Self {
        InterruptController {
            regs: base_addr as *mut u32,
            num_lines,
            ack_before_service,
            vectors: [None; MAX_LINES],
            unhandled: 0,
        }
    }

    fn read_reg(&self, offset: usize) -> u32 {
        unsafe { self.regs.add(offset).read_volatile() }
    }

    fn write_reg(&self, offset: usize, value: u32) {
        unsafe { self.regs.add(offset).write_volatile(value) }
    }

    fn check_line(&self, line: u8) -> Result<u32, DriverError> {
        if line < self.num_lines && (line as usize) < MAX_LINES {
            Ok(1 << line)
        } else {
            Err(DriverError::InvalidLine {
                line,
                num_lines: self.num_lines,
            })
        }
    }

    pub fn num_lines(&self) -> u8 {
        self.num_lines
    }

    /// Call `handler(context)` whenever `line` is pending and enabled.
    ///
    /// # Safety
    ///
    /// `context` must stay valid for `handler` until the line is disconnected.
    pub unsafe fn connect(
        &mut self,
        line: u8,
        handler: Handler,
        context: *mut (),
    ) -> Result<(), DriverError> {
        self.check_line(line)?;
        self.vectors[line as usize] = Some(Vector::new(handler, context));
        Ok(())
    }

    /// Disable `line` and forget its handler.
    pub fn disconnect(&mut self, line: u8) -> Result<(), DriverError> {
        self.disable(line)?;
        self.vectors[line as usize] = None;
        Ok(())
    }

    pub fn is_connected(&self, line: u8) -> bool {
        self.vectors
            .get(line as usize)
            .is_some_and(|vector| vector.is_some())
    }

    /// Drive the CPU interrupt line.
    ///
    /// Going back to simulation mode after a real start is refused, the
    /// hardware enable bit is write-once.
    pub fn start(&mut self, mode: StartMode) -> Result<(), DriverError> {
        if mode == StartMode::Simulation && self.read_reg(MER_OFFSET) & MER_HIE != 0 {
            return Err(DriverError::DeviceStarted);
        }
        let mer = match mode {
            StartMode::Simulation => MER_ME,
            StartMode::Real => MER_ME | MER_HIE,
        };
        self.write_reg(MER_OFFSET, mer);
        Ok(())
    }

    /// Stop driving the CPU interrupt line. In real mode the hardware inputs
    /// stay armed.
    pub fn stop(&mut self) {
        self.write_reg(MER_OFFSET, 0);
    }

    pub fn enable(&mut self, line: u8) -> Result<(), DriverError> {
        let mask = self.check_line(line)?;
        let ier = self.read_reg(IER_OFFSET);
        self.write_reg(IER_OFFSET, ier | mask);
        Ok(())
    }

    pub fn disable(&mut self, line: u8) -> Result<(), DriverError> {
        let mask = self.check_line(line)?;
        let ier = self.read_reg(IER_OFFSET);
        self.write_reg(IER_OFFSET, ier & !mask);
        Ok(())
    }

    pub fn acknowledge(&self, line: u8) -> Result<(), DriverError> {
        let mask = self.check_line(line)?;
        self.write_reg(IAR_OFFSET, mask);
        Ok(())
    }

    /// Raise `line` from software. Only possible before the controller was
    /// started in [`StartMode::Real`].
    pub fn simulate_interrupt(&mut self, line: u8) -> Result<(), DriverError> {
        let mask = self.check_line(line)?;
        if self.read_reg(MER_OFFSET) & MER_HIE != 0 {
            return Err(DriverError::NotSimulationMode);
        }
        self.write_reg(ISR_OFFSET, mask);
        Ok(())
    }

    /// Bitmask of lines that are both raised and enabled.
    pub fn pending(&self) -> u32 {
        self.read_reg(ISR_OFFSET) & self.read_reg(IER_OFFSET)
    }

    /// Number of pending lines that had no handler connected so far.
    pub fn unhandled(&self) -> u32 {
        self.unhandled
    }

    /// Service every pending line, lowest line first, and return the mask of
    /// lines that were serviced.
    ///
    /// Edge-sensitive lines (the `ack_before_service` mask) are acknowledged
    /// before their handler runs, all others after it.
    pub fn dispatch(&mut self) -> u32 {
        let pending = self.pending();
        for line in 0..self.num_lines.min(MAX_LINES as u8) {
            let mask = 1u32 << line;
            if pending & mask == 0 {
                continue;
            }
            let ack_first = self.ack_before_service & mask != 0;
            if ack_first {
                self.write_reg(IAR_OFFSET, mask);
            }
            match self.vectors[line as usize] {
                Some(vector) => unsafe { vector.call() },
                None => self.unhandled = self.unhandled.wrapping_add(1),
            }
            if !ack_first {
                self.write_reg(IAR_OFFSET, mask);
            }
        }
        pending
    }

    /// Exception table entry for a controller: `context` is the controller.
    ///
    /// # Safety
    ///
    /// `context` must point to a live `InterruptController` that is not
    /// borrowed elsewhere while the handler runs.
    pub unsafe fn dispatch_handler(context: *mut ()) {
        let intc = &mut *(context as *mut InterruptController);
        intc.dispatch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(C, align(4))]
    struct Regs([u32; 8]);

    fn table_for(regs: &mut Regs, num_lines: u8, ack_before_service: u32) -> [IntcConfig; 1] {
        [IntcConfig {
            device_id: 1,
            base_address: regs.0.as_mut_ptr() as usize,
            num_lines,
            ack_before_service,
        }]
    }

    unsafe fn bump(context: *mut ()) {
        *(context as *mut u32) += 1;
    }

    #[test]
    fn initialize_disables_and_acknowledges() {
        let mut regs = Regs([0, 0, 0xff, 0, 0, 0, 0, 0]);
        let table = table_for(&mut regs, 4, 0);
        let intc = InterruptController::initialize(&table, 1).unwrap();
        assert_eq!(intc.num_lines(), 4);
        assert_eq!(regs.0[IER_OFFSET], 0);
        assert_eq!(regs.0[IAR_OFFSET], u32::MAX);
    }

    #[test]
    fn initialize_errors() {
        let mut regs = Regs([0, 0, 0, 0, 0, 0, 0, MER_ME | MER_HIE]);
        let table = table_for(&mut regs, 1, 0);
        assert!(matches!(
            InterruptController::initialize(&table, 3),
            Err(DriverError::DeviceNotFound { device_id: 3 })
        ));
        assert!(matches!(
            InterruptController::initialize(&table, 1),
            Err(DriverError::DeviceStarted)
        ));
    }

    #[test]
    fn line_bounds_are_checked() {
        let mut regs = Regs([0; 8]);
        let table = table_for(&mut regs, 2, 0);
        let mut intc = InterruptController::initialize(&table, 1).unwrap();
        let mut hits = 0u32;
        let err = DriverError::InvalidLine {
            line: 2,
            num_lines: 2,
        };
        let connected = unsafe { intc.connect(2, bump, &mut hits as *mut u32 as *mut ()) };
        assert_eq!(connected, Err(err));
        assert_eq!(intc.enable(2), Err(err));
        assert_eq!(intc.acknowledge(2), Err(err));
        assert!(!intc.is_connected(2));
        assert!(!intc.is_connected(200));
    }

    #[test]
    fn enable_disable_edit_ier() {
        let mut regs = Regs([0; 8]);
        let table = table_for(&mut regs, 4, 0);
        let mut intc = InterruptController::initialize(&table, 1).unwrap();
        intc.enable(0).unwrap();
        intc.enable(3).unwrap();
        intc.disable(0).unwrap();
        assert_eq!(regs.0[IER_OFFSET], 0b1000);
    }

    #[test]
    fn start_modes() {
        let mut regs = Regs([0; 8]);
        let table = table_for(&mut regs, 1, 0);
        let mut intc = InterruptController::initialize(&table, 1).unwrap();

        intc.start(StartMode::Simulation).unwrap();
        assert_eq!(intc.simulate_interrupt(0), Ok(()));
        assert_eq!(intc.read_reg(ISR_OFFSET), 1);

        intc.start(StartMode::Real).unwrap();
        assert_eq!(intc.read_reg(MER_OFFSET), MER_ME | MER_HIE);
        assert_eq!(
            intc.simulate_interrupt(0),
            Err(DriverError::NotSimulationMode)
        );
        assert_eq!(
            intc.start(StartMode::Simulation),
            Err(DriverError::DeviceStarted)
        );

        intc.stop();
        assert_eq!(intc.read_reg(MER_OFFSET), 0);
    }

    #[test]
    fn dispatch_services_pending_enabled_lines() {
        let mut regs = Regs([0; 8]);
        let table = table_for(&mut regs, 3, 0);
        let mut intc = InterruptController::initialize(&table, 1).unwrap();
        let mut hits = [0u32; 3];
        unsafe {
            intc.connect(0, bump, &mut hits[0] as *mut u32 as *mut ())
                .unwrap();
            intc.connect(2, bump, &mut hits[2] as *mut u32 as *mut ())
                .unwrap();
        }
        intc.enable(0).unwrap();
        intc.enable(1).unwrap();

        // Line 0 and 2 raised, only line 0 enabled.
        intc.write_reg(ISR_OFFSET, 0b101);
        assert_eq!(intc.dispatch(), 0b001);
        assert_eq!(hits, [1, 0, 0]);
        assert_eq!(intc.read_reg(IAR_OFFSET), 0b001);

        // Enabled line without a handler is counted and acknowledged.
        intc.write_reg(ISR_OFFSET, 0b010);
        assert_eq!(intc.dispatch(), 0b010);
        assert_eq!(intc.unhandled(), 1);
        assert_eq!(intc.read_reg(IAR_OFFSET), 0b010);
    }

    #[test]
    fn disconnect_drops_handler() {
        let mut regs = Regs([0; 8]);
        let table = table_for(&mut regs, 1, 0b1);
        let mut intc = InterruptController::initialize(&table, 1).unwrap();
        let mut hits = 0u32;
        unsafe {
            intc.connect(0, bump, &mut hits as *mut u32 as *mut ())
                .unwrap()
        };
        intc.enable(0).unwrap();
        assert!(intc.is_connected(0));

        intc.disconnect(0).unwrap();
        assert!(!intc.is_connected(0));
        intc.write_reg(ISR_OFFSET, 0b1);
        assert_eq!(intc.dispatch(), 0);
        assert_eq!(hits, 0);
    }

    #[test]
    fn dispatch_handler_uses_context() {
        let mut regs = Regs([0; 8]);
        let table = table_for(&mut regs, 1, 0);
        let mut intc = InterruptController::initialize(&table, 1).unwrap();
        let mut hits = 0u32;
        unsafe {
            intc.connect(0, bump, &mut hits as *mut u32 as *mut ())
                .unwrap()
        };
        intc.enable(0).unwrap();
        intc.write_reg(ISR_OFFSET, 0b1);

        unsafe {
            InterruptController::dispatch_handler(
                &mut intc as *mut InterruptController as *mut (),
            )
        };
        assert_eq!(hits, 1);
    }

    /// Handler context that records the acknowledge register as the handler
    /// sees it.
    struct AckSnapshot {
        iar: *const u32,
        seen: Option<u32>,
    }

    unsafe fn snapshot_iar(context: *mut ()) {
        let snapshot = &mut *(context as *mut AckSnapshot);
        snapshot.seen = Some(snapshot.iar.read_volatile());
    }

    #[test]
    fn edge_lines_are_acknowledged_before_their_handler() {
        let mut regs = Regs([0; 8]);
        // Line 0 is edge-sensitive, line 1 level-sensitive.
        let table = table_for(&mut regs, 2, 0b01);
        let iar = unsafe { (table[0].base_address as *const u32).add(IAR_OFFSET) };
        let mut intc = InterruptController::initialize(&table, 1).unwrap();

        let mut edge = AckSnapshot { iar, seen: None };
        let mut level = AckSnapshot { iar, seen: None };
        unsafe {
            intc.connect(0, snapshot_iar, &mut edge as *mut AckSnapshot as *mut ())
                .unwrap();
            intc.connect(1, snapshot_iar, &mut level as *mut AckSnapshot as *mut ())
                .unwrap();
        }
        intc.enable(0).unwrap();
        intc.enable(1).unwrap();

        intc.write_reg(IAR_OFFSET, 0);
        intc.write_reg(ISR_OFFSET, 0b10);
        assert_eq!(intc.dispatch(), 0b10);
        assert_eq!(level.seen, Some(0));
        assert_eq!(intc.read_reg(IAR_OFFSET), 0b10);

        intc.write_reg(IAR_OFFSET, 0);
        intc.write_reg(ISR_OFFSET, 0b01);
        assert_eq!(intc.dispatch(), 0b01);
        assert_eq!(edge.seen, Some(0b01));
        assert_eq!(intc.read_reg(IAR_OFFSET), 0b01);
    }
}
