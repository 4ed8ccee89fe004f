pub mod cartridge;
pub mod config;
pub mod cpu;
pub mod debug;
pub mod eventloop;
pub mod graphics;
pub mod input;
pub mod interrupts;
pub mod memory;
pub mod ppu;
pub mod serialize;
pub mod startup;
pub mod timer;

use crate::debug::{CommandSource, Debugger, FreeRun};
use crate::graphics::PixelSink;
use crate::input::InputPoller;
use crate::serialize::SaveStateError;
use crate::startup::StartupError;
use std::io::Write;
use thiserror::Error;

pub use config::RunConfig;
pub use eventloop::{EmulationError, RunSummary, StopReason};
pub use graphics::{Color, FrameBuffer};
pub use input::{JoypadKey, JoypadState};
pub use interrupts::InterruptDispatch;
pub use startup::EmulationState;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("{source}")]
    Startup {
        #[from]
        source: StartupError,
    },
    #[error("emulation error: {source}")]
    Emulation {
        #[from]
        source: EmulationError,
    },
    #[error("{source}")]
    SaveState {
        #[from]
        source: SaveStateError,
    },
}

/// Load the configured ROM and run a session on it. When the debugger is enabled it reads commands
/// from `commands` and writes to `debugger_output`; otherwise both are unused.
///
/// If the config names a save state path, the session state is written there after a clean stop.
pub fn run<C, W>(
    run_config: &RunConfig,
    commands: C,
    debugger_output: W,
    poller: &mut impl InputPoller,
    sink: &mut impl PixelSink,
) -> Result<RunSummary, RunError>
where
    C: CommandSource,
    W: Write,
{
    log::info!("Running with config:\n{run_config}");

    let cartridge = startup::load_cartridge(run_config)?;
    let mut emulation_state = startup::init_emulation_state(&cartridge, run_config)?;

    let summary = if run_config.debugger_enabled {
        let mut debugger = Debugger::new(commands, debugger_output);
        eventloop::run(
            &mut emulation_state,
            run_config.frame_limit,
            &mut debugger,
            poller,
            sink,
        )?
    } else {
        eventloop::run(
            &mut emulation_state,
            run_config.frame_limit,
            &mut FreeRun,
            poller,
            sink,
        )?
    };

    if let Some(save_state_path) = &run_config.save_state_path {
        serialize::save_state(&emulation_state, save_state_path)?;
    }

    Ok(summary)
}
