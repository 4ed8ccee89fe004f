use crate::memory::ioregisters::{IoRegister, IoRegisters};
use serde::{Deserialize, Serialize};

const DIV_UPDATE_FREQUENCY: u32 = 256;

const TIMA_ENABLE_BIT: u8 = 0x04;

/// Elapsed-cycle accumulators for DIV and TIMA. The register values themselves live in the I/O
/// register window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    div_counter: u32,
    tima_counter: u32,
}

fn tima_update_frequency(timer_control: u8) -> u32 {
    match timer_control & 0x03 {
        0x00 => 256,
        0x01 => 4,
        0x02 => 16,
        0x03 => 64,
        _ => unreachable!("value & 0x03 is always <= 0x03"),
    }
}

impl TimerState {
    pub fn new() -> Self {
        Self {
            div_counter: 0,
            tima_counter: 0,
        }
    }

    /// Advance the timer by the given number of machine cycles. Returns true if TIMA overflowed
    /// at least once, in which case a timer interrupt should be requested.
    pub fn tick(&mut self, io_registers: &mut IoRegisters, cycles: u32) -> bool {
        self.div_counter += cycles;
        while self.div_counter >= DIV_UPDATE_FREQUENCY {
            self.div_counter -= DIV_UPDATE_FREQUENCY;

            let old_div = io_registers.read_register(IoRegister::DIV);
            io_registers.write_register(IoRegister::DIV, old_div.wrapping_add(1));
        }

        let timer_control = io_registers.read_register(IoRegister::TAC);
        if timer_control & TIMA_ENABLE_BIT == 0 {
            return false;
        }

        let tima_update_frequency = tima_update_frequency(timer_control);

        let mut overflowed = false;
        self.tima_counter += cycles;
        while self.tima_counter >= tima_update_frequency {
            self.tima_counter -= tima_update_frequency;

            let old_tima = io_registers.read_register(IoRegister::TIMA);
            match old_tima.overflowing_add(1) {
                (new_tima, false) => {
                    io_registers.write_register(IoRegister::TIMA, new_tima);
                }
                (_, true) => {
                    let timer_modulo = io_registers.read_register(IoRegister::TMA);
                    log::trace!("TIMA overflowed, reloading from TMA ({timer_modulo:02X})");
                    io_registers.write_register(IoRegister::TIMA, timer_modulo);
                    overflowed = true;
                }
            }
        }

        overflowed
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new()
    }
}
