use crate::cartridge::{Cartridge, CartridgeLoadError};
use crate::cpu::CpuRegisters;
use crate::interrupts::InterruptController;
use crate::memory::{AddressSpace, Ram};
use crate::ppu::PpuState;
use crate::startup::EmulationState;
use crate::timer::TimerState;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::path::{Path, PathBuf};
use std::{fs, io};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SaveStateError {
    #[error("error serializing/deserializing state: {source}")]
    Serialization {
        #[from]
        source: bincode::Error,
    },
    #[error("error reading/writing state: {source}")]
    FileSystem {
        #[from]
        source: io::Error,
    },
    #[error("cartridge cannot back a restored state: {source}")]
    Cartridge {
        #[from]
        source: CartridgeLoadError,
    },
}

/// Serde helper for fixed-size arrays longer than serde's built-in impls cover.
pub fn serialize_array<S, T, const N: usize>(
    array: &[T; N],
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize,
{
    serializer.collect_seq(array)
}

pub fn deserialize_array<'de, D, T, const N: usize>(deserializer: D) -> Result<[T; N], D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let values = Vec::<T>::deserialize(deserializer)?;
    let len = values.len();
    values
        .try_into()
        .map_err(|_values| de::Error::invalid_length(len, &format!("{N} elements").as_str()))
}

/// Everything in a session that changes while it runs. ROM contents are not included, a restored
/// state is rebound to whatever cartridge the caller provides.
#[derive(Serialize)]
struct SavedStateRef<'a> {
    cpu_registers: &'a CpuRegisters,
    ram: &'a Ram,
    ppu_state: &'a PpuState,
    timer_state: &'a TimerState,
    interrupt_controller: &'a InterruptController,
}

#[derive(Deserialize)]
struct SavedState {
    cpu_registers: CpuRegisters,
    ram: Ram,
    ppu_state: PpuState,
    timer_state: TimerState,
    interrupt_controller: InterruptController,
}

pub fn determine_save_state_path<P>(gb_file_path: P) -> PathBuf
where
    P: AsRef<Path>,
{
    gb_file_path.as_ref().with_extension("ss0")
}

pub fn save_state<P>(state: &EmulationState<'_>, path: P) -> Result<(), SaveStateError>
where
    P: AsRef<Path>,
{
    let saved_state = SavedStateRef {
        cpu_registers: &state.cpu_registers,
        ram: state.address_space.ram(),
        ppu_state: &state.ppu_state,
        timer_state: &state.timer_state,
        interrupt_controller: &state.interrupt_controller,
    };

    let serialized_state = bincode::serialize(&saved_state)?;
    fs::write(path.as_ref(), serialized_state)?;

    log::info!("Successfully wrote save state to '{}'", path.as_ref().display());

    Ok(())
}

pub fn load_state<P>(path: P, cartridge: &Cartridge) -> Result<EmulationState<'_>, SaveStateError>
where
    P: AsRef<Path>,
{
    let serialized_state = fs::read(path.as_ref())?;
    let SavedState {
        cpu_registers,
        ram,
        ppu_state,
        timer_state,
        interrupt_controller,
    } = bincode::deserialize(&serialized_state)?;

    let (rom_bank_0, rom_bank_n) = cartridge.fixed_banks()?;
    let address_space = AddressSpace::from_ram(rom_bank_0, rom_bank_n, ram);

    log::info!("Successfully loaded save state from '{}'", path.as_ref().display());

    Ok(EmulationState {
        address_space,
        cpu_registers,
        ppu_state,
        timer_state,
        interrupt_controller,
    })
}
