use crate::cpu::{self, CpuRegisters};
use crate::memory::ioregisters::IoRegister;
use crate::memory::{address, AddressSpace, MemoryError};
use crate::timer::TimerState;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptType {
    VBlank,
    LcdStatus,
    Timer,
    Serial,
    Joypad,
}

impl InterruptType {
    /// Dispatch priority, highest first.
    pub const PRIORITY_ORDER: [Self; 5] = [
        Self::VBlank,
        Self::LcdStatus,
        Self::Timer,
        Self::Serial,
        Self::Joypad,
    ];

    pub fn handler_address(self) -> u16 {
        match self {
            Self::VBlank => address::VBLANK_VECTOR,
            Self::LcdStatus => address::LCD_STATUS_VECTOR,
            Self::Timer => address::TIMER_VECTOR,
            Self::Serial => address::SERIAL_VECTOR,
            Self::Joypad => address::JOYPAD_VECTOR,
        }
    }

    pub fn bit(self) -> u8 {
        match self {
            Self::VBlank => 0x01,
            Self::LcdStatus => 0x02,
            Self::Timer => 0x04,
            Self::Serial => 0x08,
            Self::Joypad => 0x10,
        }
    }

    fn from_single_bit(bits: u8) -> Option<Self> {
        Self::PRIORITY_ORDER
            .into_iter()
            .find(|interrupt_type| interrupt_type.bit() == bits)
    }
}

/// How pending interrupts are chosen for dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterruptDispatch {
    /// Dispatch the highest-priority pending + enabled interrupt.
    #[default]
    PriorityScan,
    /// Dispatch only when exactly one pending + enabled bit is set. Two or more simultaneous
    /// interrupts dispatch nothing.
    SingleBitOnly,
}

impl std::fmt::Display for InterruptDispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PriorityScan => write!(f, "priority_scan"),
            Self::SingleBitOnly => write!(f, "single_bit_only"),
        }
    }
}

/// Interrupt master enable plus the dispatch policy. The IF and IE bits themselves live in the
/// address space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterruptController {
    pub ime: bool,
    dispatch: InterruptDispatch,
}

impl InterruptController {
    pub fn new(dispatch: InterruptDispatch) -> Self {
        Self {
            ime: true,
            dispatch,
        }
    }

    pub fn dispatch_policy(&self) -> InterruptDispatch {
        self.dispatch
    }

    pub fn disable(&mut self) {
        self.ime = false;
    }

    pub fn enable(&mut self) {
        self.ime = true;
    }

    /// Tick the timer by the given number of cycles, then dispatch at most one interrupt if IME is
    /// set. Returns the interrupt that was dispatched, if any.
    pub fn run(
        &mut self,
        timer_state: &mut TimerState,
        cpu_registers: &mut CpuRegisters,
        address_space: &mut AddressSpace<'_>,
        cycles: u32,
    ) -> Result<Option<InterruptType>, MemoryError> {
        if timer_state.tick(address_space.io_registers_mut(), cycles) {
            address_space
                .io_registers_mut()
                .interrupt_flags()
                .set(InterruptType::Timer);
        }

        if !self.ime {
            return Ok(None);
        }

        let ie_value = address_space.ie_register();
        let interrupt_flags = address_space.io_registers_mut().interrupt_flags();
        let interrupt_type = match self.dispatch {
            InterruptDispatch::PriorityScan => interrupt_flags.highest_priority_interrupt(ie_value),
            InterruptDispatch::SingleBitOnly => {
                InterruptType::from_single_bit(interrupt_flags.pending(ie_value))
            }
        };

        let Some(interrupt_type) = interrupt_type else {
            return Ok(None);
        };

        log::trace!(
            "Interrupt type {interrupt_type:?} triggered, replacing previous PC of {:04X} with {:04X}",
            cpu_registers.pc,
            interrupt_type.handler_address()
        );

        address_space
            .io_registers_mut()
            .interrupt_flags()
            .clear(interrupt_type);
        self.ime = false;
        cpu::interrupt_entry(
            cpu_registers,
            address_space,
            interrupt_type.handler_address(),
        )?;

        log::trace!(
            "IF after dispatch: {:02X}",
            address_space.io_registers().read_register(IoRegister::IF)
        );

        Ok(Some(interrupt_type))
    }
}

impl Default for InterruptController {
    fn default() -> Self {
        Self::new(InterruptDispatch::default())
    }
}
