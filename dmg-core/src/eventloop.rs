use crate::cpu::{self, CpuError};
use crate::debug::{StepController, StepDecision};
use crate::graphics::PixelSink;
use crate::input::{self, InputPoller, JoypadError};
use crate::memory::MemoryError;
use crate::ppu::PpuError;
use crate::startup::EmulationState;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmulationError {
    #[error("CPU error: {source}")]
    Cpu {
        #[from]
        source: CpuError,
    },
    #[error("memory error during interrupt dispatch: {source}")]
    Memory {
        #[from]
        source: MemoryError,
    },
    #[error("PPU error: {source}")]
    Ppu {
        #[from]
        source: PpuError,
    },
    #[error("joypad error: {source}")]
    Joypad {
        #[from]
        source: JoypadError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The input device asked to quit.
    InputQuit,
    /// The step controller (e.g. the debugger) asked to quit.
    ControllerQuit,
    FrameLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub stop_reason: StopReason,
    pub instructions: u64,
    pub cycles: u64,
    pub frames: u64,
}

/// Execute one instruction and advance everything else by the cycles it took, then poll input and
/// refresh the joypad register. Returns the number of machine cycles consumed, including any OAM
/// DMA surcharge.
pub fn step(
    state: &mut EmulationState<'_>,
    poller: &mut impl InputPoller,
    sink: &mut impl PixelSink,
) -> Result<u32, EmulationError> {
    let cycles = cpu::execute(
        &mut state.cpu_registers,
        &mut state.address_space,
        &mut state.interrupt_controller,
    )? + state.address_space.take_dma_cycle_surcharge();

    state.interrupt_controller.run(
        &mut state.timer_state,
        &mut state.cpu_registers,
        &mut state.address_space,
        cycles,
    )?;

    state.ppu_state.run(&mut state.address_space, sink, cycles)?;

    poller.poll();
    input::update_joyp_register(&*poller, state.address_space.io_registers_mut())?;

    Ok(cycles)
}

/// Run the session until the input device or the step controller asks to quit, the frame limit is
/// reached, or a fatal error occurs.
pub fn run(
    state: &mut EmulationState<'_>,
    frame_limit: Option<u64>,
    controller: &mut impl StepController,
    poller: &mut impl InputPoller,
    sink: &mut impl PixelSink,
) -> Result<RunSummary, EmulationError> {
    let starting_frames = state.ppu_state.frames_completed();
    let mut instructions = 0_u64;
    let mut cycles = 0_u64;

    let stop_reason = loop {
        let frames = state.ppu_state.frames_completed() - starting_frames;
        if frame_limit.is_some_and(|frame_limit| frames >= frame_limit) {
            break StopReason::FrameLimit;
        }

        if controller.before_step(state) == StepDecision::Quit {
            break StopReason::ControllerQuit;
        }

        match step(state, poller, sink) {
            Ok(step_cycles) => {
                instructions += 1;
                cycles += u64::from(step_cycles);
            }
            Err(err) => {
                log::error!(
                    "Fatal error after {instructions} instructions ({cycles} cycles), PC={:04X}: {err}",
                    state.cpu_registers.pc
                );
                return Err(err);
            }
        }

        if poller.quit_requested() {
            break StopReason::InputQuit;
        }
    };

    let summary = RunSummary {
        stop_reason,
        instructions,
        cycles,
        frames: state.ppu_state.frames_completed() - starting_frames,
    };

    log::info!(
        "Stopped ({:?}) after {} instructions, {} cycles, {} frames",
        summary.stop_reason,
        summary.instructions,
        summary.cycles,
        summary.frames
    );

    Ok(summary)
}
