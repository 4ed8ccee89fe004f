use crate::cartridge::{Cartridge, CartridgeLoadError};
use crate::config::RunConfig;
use crate::cpu::CpuRegisters;
use crate::interrupts::{InterruptController, InterruptDispatch};
use crate::memory::AddressSpace;
use crate::ppu::PpuState;
use crate::serialize::{self, SaveStateError};
use crate::timer::TimerState;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("error loading cartridge from {file_path}: {source}")]
    FileRead {
        file_path: String,
        #[source]
        source: CartridgeLoadError,
    },
    #[error("cartridge cannot be mapped: {source}")]
    Cartridge {
        #[from]
        source: CartridgeLoadError,
    },
    #[error("error loading save state from {file_path}: {source}")]
    LoadState {
        file_path: String,
        #[source]
        source: SaveStateError,
    },
}

/// Everything a running session owns, bound to the cartridge whose ROM banks it maps.
#[derive(Debug, Clone)]
pub struct EmulationState<'rom> {
    pub(crate) address_space: AddressSpace<'rom>,
    pub(crate) cpu_registers: CpuRegisters,
    pub(crate) ppu_state: PpuState,
    pub(crate) timer_state: TimerState,
    pub(crate) interrupt_controller: InterruptController,
}

impl<'rom> EmulationState<'rom> {
    /// Power-on state for the given cartridge.
    pub fn new(
        cartridge: &'rom Cartridge,
        interrupt_dispatch: InterruptDispatch,
    ) -> Result<Self, CartridgeLoadError> {
        let (rom_bank_0, rom_bank_n) = cartridge.fixed_banks()?;

        Ok(Self {
            address_space: AddressSpace::new(rom_bank_0, rom_bank_n),
            cpu_registers: CpuRegisters::new(),
            ppu_state: PpuState::new(),
            timer_state: TimerState::new(),
            interrupt_controller: InterruptController::new(interrupt_dispatch),
        })
    }

    pub fn cpu_registers(&self) -> &CpuRegisters {
        &self.cpu_registers
    }

    pub fn address_space(&self) -> &AddressSpace<'rom> {
        &self.address_space
    }

    pub fn ppu_state(&self) -> &PpuState {
        &self.ppu_state
    }

    pub fn interrupt_controller(&self) -> &InterruptController {
        &self.interrupt_controller
    }
}

pub fn load_cartridge(run_config: &RunConfig) -> Result<Cartridge, StartupError> {
    Cartridge::from_file(&run_config.rom_path).map_err(|source| StartupError::FileRead {
        file_path: run_config.rom_path.display().to_string(),
        source,
    })
}

/// Build the session for the given cartridge, restoring a save state if the config names one.
pub fn init_emulation_state<'rom>(
    cartridge: &'rom Cartridge,
    run_config: &RunConfig,
) -> Result<EmulationState<'rom>, StartupError> {
    if let Some(load_state_path) = &run_config.load_state_path {
        let emulation_state =
            serialize::load_state(load_state_path, cartridge).map_err(|source| {
                StartupError::LoadState {
                    file_path: load_state_path.display().to_string(),
                    source,
                }
            })?;

        if emulation_state.interrupt_controller.dispatch_policy() != run_config.interrupt_dispatch
        {
            log::warn!(
                "Save state uses interrupt dispatch policy {}, ignoring configured {}",
                emulation_state.interrupt_controller.dispatch_policy(),
                run_config.interrupt_dispatch
            );
        }

        return Ok(emulation_state);
    }

    Ok(EmulationState::new(
        cartridge,
        run_config.interrupt_dispatch,
    )?)
}
