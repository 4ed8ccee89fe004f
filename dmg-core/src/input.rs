use crate::interrupts::InterruptType;
use crate::memory::ioregisters::IoRegisters;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoypadKey {
    Right,
    Left,
    Up,
    Down,
    A,
    B,
    Select,
    Start,
}

impl JoypadKey {
    pub const ALL: [Self; 8] = [
        Self::Right,
        Self::Left,
        Self::Up,
        Self::Down,
        Self::A,
        Self::B,
        Self::Select,
        Self::Start,
    ];
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JoypadError {
    #[error("invalid JOYP pad group selection: {joyp:02X} (exactly one of bits 4-5 must be clear)")]
    InvalidSelection { joyp: u8 },
}

/// Source of key state for the emulated joypad. The core polls once per step and never stores key
/// state itself.
pub trait InputPoller {
    /// Refresh key state from the underlying device.
    fn poll(&mut self);

    fn is_pressed(&self, key: JoypadKey) -> bool;

    fn quit_requested(&self) -> bool;
}

/// A plain set of held keys, driven by whatever frontend owns it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoypadState {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
    a: bool,
    b: bool,
    start: bool,
    select: bool,
    quit: bool,
}

impl JoypadState {
    pub fn new() -> Self {
        Self::default()
    }

    fn get_field_mut(&mut self, key: JoypadKey) -> &mut bool {
        match key {
            JoypadKey::Up => &mut self.up,
            JoypadKey::Down => &mut self.down,
            JoypadKey::Left => &mut self.left,
            JoypadKey::Right => &mut self.right,
            JoypadKey::A => &mut self.a,
            JoypadKey::B => &mut self.b,
            JoypadKey::Start => &mut self.start,
            JoypadKey::Select => &mut self.select,
        }
    }

    pub fn key_down(&mut self, key: JoypadKey) {
        *self.get_field_mut(key) = true;
        log::debug!("Key pressed: {key:?}, current state: {self:?}");
    }

    pub fn key_up(&mut self, key: JoypadKey) {
        *self.get_field_mut(key) = false;
        log::debug!("Key released: {key:?}, current state: {self:?}");
    }

    pub fn request_quit(&mut self) {
        self.quit = true;
    }
}

impl InputPoller for JoypadState {
    fn poll(&mut self) {}

    fn is_pressed(&self, key: JoypadKey) -> bool {
        match key {
            JoypadKey::Up => self.up,
            JoypadKey::Down => self.down,
            JoypadKey::Left => self.left,
            JoypadKey::Right => self.right,
            JoypadKey::A => self.a,
            JoypadKey::B => self.b,
            JoypadKey::Start => self.start,
            JoypadKey::Select => self.select,
        }
    }

    fn quit_requested(&self) -> bool {
        self.quit
    }
}

fn should_flag_interrupt(old_joyp: u8, new_joyp: u8) -> bool {
    [0x01, 0x02, 0x04, 0x08]
        .into_iter()
        .any(|bit| old_joyp & bit != 0 && new_joyp & bit == 0)
}

/// Recompute the low nibble of JOYP from the current key state, and request a joypad interrupt if
/// any selected line went from released to pressed.
///
/// Needs to run after every CPU instruction: the CPU selects directions or actions by writing
/// bits 4-5, and both groups share bits 0-3. Once the CPU has written the select bits, selecting
/// both groups or neither is an error.
pub fn update_joyp_register(
    poller: &impl InputPoller,
    io_registers: &mut IoRegisters,
) -> Result<(), JoypadError> {
    let joyp = io_registers.privileged_read_joyp();
    let select_bits = joyp & 0x30;
    if io_registers.joyp_select_written() && (select_bits == 0x00 || select_bits == 0x30) {
        let err = JoypadError::InvalidSelection { joyp };
        log::error!("{err}");
        return Err(err);
    }

    let actions_select = joyp & 0x20 == 0;
    let directions_select = joyp & 0x10 == 0;
    let line = |action: JoypadKey, direction: JoypadKey| {
        !((actions_select && poller.is_pressed(action))
            || (directions_select && poller.is_pressed(direction)))
    };

    let bit_3 = line(JoypadKey::Start, JoypadKey::Down);
    let bit_2 = line(JoypadKey::Select, JoypadKey::Up);
    let bit_1 = line(JoypadKey::B, JoypadKey::Left);
    let bit_0 = line(JoypadKey::A, JoypadKey::Right);

    let new_joyp = select_bits
        | (u8::from(bit_3) << 3)
        | (u8::from(bit_2) << 2)
        | (u8::from(bit_1) << 1)
        | u8::from(bit_0);
    io_registers.privileged_set_joyp(new_joyp);

    if should_flag_interrupt(joyp, new_joyp) {
        io_registers.interrupt_flags().set(InterruptType::Joypad);
    }

    Ok(())
}
