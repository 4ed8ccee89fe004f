pub mod instructions;
mod registers;


use crate::interrupts::InterruptController;
use crate::memory::{AddressSpace, MemoryError};
use thiserror::Error;

pub use instructions::{ExecutionError, Instruction, ParseError};
pub use registers::{CpuRegister, CpuRegisterPair, CpuRegisters};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CpuError {
    #[error("error parsing CPU instruction: {source}")]
    InstructionParse {
        #[from]
        source: ParseError,
    },
    #[error("error executing CPU instruction: {source}")]
    InstructionExecute {
        #[from]
        source: ExecutionError,
    },
}

/// Fetch, decode and execute the instruction at PC. Returns the number of machine cycles the
/// instruction took.
pub fn execute(
    cpu_registers: &mut CpuRegisters,
    address_space: &mut AddressSpace<'_>,
    interrupt_controller: &mut InterruptController,
) -> Result<u32, CpuError> {
    let (instruction, pc) =
        match instructions::parse_next_instruction(address_space, cpu_registers.pc) {
            Ok(parsed) => parsed,
            Err(err) => {
                log::error!("{err}");
                return Err(err.into());
            }
        };

    let cycles_required = instruction.cycles_required(cpu_registers);

    log::trace!(
        "Executing instruction {instruction} at {:04X}, will take {cycles_required} cycles",
        cpu_registers.pc
    );

    cpu_registers.pc = pc;
    instruction.execute(address_space, cpu_registers, interrupt_controller)?;

    log::trace!("CPU registers after instruction execution: {cpu_registers}");

    Ok(cycles_required)
}

/// Push the current PC and jump to the given interrupt handler.
pub fn interrupt_entry(
    cpu_registers: &mut CpuRegisters,
    address_space: &mut AddressSpace<'_>,
    handler_address: u16,
) -> Result<(), MemoryError> {
    let return_address = cpu_registers.pc;
    instructions::push_stack(cpu_registers, address_space, return_address)?;
    cpu_registers.pc = handler_address;
    Ok(())
}
