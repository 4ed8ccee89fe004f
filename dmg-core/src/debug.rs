use crate::cpu::instructions;
use crate::startup::EmulationState;
use std::collections::BTreeSet;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDecision {
    Proceed,
    Quit,
}

/// Gate polled by the session loop before every instruction.
pub trait StepController {
    fn before_step(&mut self, state: &EmulationState<'_>) -> StepDecision;
}

/// Runs without ever pausing.
#[derive(Debug, Clone, Copy, Default)]
pub struct FreeRun;

impl StepController for FreeRun {
    fn before_step(&mut self, _state: &EmulationState<'_>) -> StepDecision {
        StepDecision::Proceed
    }
}

/// Line-based source of debugger commands. Returning None ends the session.
pub trait CommandSource {
    fn next_line(&mut self) -> Option<String>;
}

impl<B: BufRead> CommandSource for io::Lines<B> {
    fn next_line(&mut self) -> Option<String> {
        match self.next()? {
            Ok(line) => Some(line),
            Err(err) => {
                log::error!("Error reading debugger command: {err}");
                None
            }
        }
    }
}

const HELP_TEXT: &str = "\
commands:
  h | help                      show this text
  i | info r | registers        print the CPU registers
  b | breakpoint s | show       list breakpoints
  b | breakpoint a | add 0xNNNN add a breakpoint
  b | breakpoint d | del 0xNNNN remove a breakpoint
  r | run [N]                   run N instructions, or until a breakpoint
  s | step                      run one instruction
  v | verbose                   toggle printing each instruction before it runs
  d | display r | registers     toggle printing the registers before each instruction
  e | exit                      quit
an empty line repeats the previous command";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Help,
    InfoRegisters,
    ShowBreakpoints,
    AddBreakpoint(u16),
    DeleteBreakpoint(u16),
    Run(Option<u64>),
    Step,
    Verbose,
    DisplayRegisters,
    Exit,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
enum CommandParseError {
    #[error("unrecognized command: '{line}'")]
    Unrecognized { line: String },
    #[error("invalid address: '{text}'")]
    InvalidAddress { text: String },
    #[error("invalid instruction count: '{text}'")]
    InvalidCount { text: String },
}

fn parse_address(text: Option<&str>) -> Result<u16, CommandParseError> {
    let text = text.unwrap_or_default();
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u16::from_str_radix(digits, 16).map_err(|_err| CommandParseError::InvalidAddress {
        text: text.into(),
    })
}

impl Command {
    fn parse(line: &str) -> Result<Self, CommandParseError> {
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or_default();
        let subcommand = words.next();
        let argument = words.next();

        let unrecognized = || CommandParseError::Unrecognized { line: line.into() };

        let parsed = match (command, subcommand) {
            ("h" | "help", None) => Self::Help,
            ("i" | "info", Some("r" | "registers")) => Self::InfoRegisters,
            ("b" | "breakpoint", Some("s" | "show")) => Self::ShowBreakpoints,
            ("b" | "breakpoint", Some("a" | "add")) => Self::AddBreakpoint(parse_address(argument)?),
            ("b" | "breakpoint", Some("d" | "del")) => {
                Self::DeleteBreakpoint(parse_address(argument)?)
            }
            ("r" | "run", None) => Self::Run(None),
            ("r" | "run", Some(count)) => {
                let count = count
                    .parse()
                    .map_err(|_err| CommandParseError::InvalidCount { text: count.into() })?;
                Self::Run(Some(count))
            }
            ("s" | "step", None) => Self::Step,
            ("v" | "verbose", None) => Self::Verbose,
            ("d" | "display", Some("r" | "registers")) => Self::DisplayRegisters,
            ("e" | "exit", None) => Self::Exit,
            _ => return Err(unrecognized()),
        };

        // Trailing words are only allowed for breakpoint addresses
        let extra_words = match parsed {
            Self::AddBreakpoint(_) | Self::DeleteBreakpoint(_) => words.next(),
            _ => argument,
        };
        if extra_words.is_some() {
            return Err(unrecognized());
        }

        Ok(parsed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DebuggerMode {
    Prompt,
    Running { remaining: Option<u64> },
}

/// Interactive step controller: reads commands from `C`, writes its output to `W`, and keeps its
/// own breakpoint set. It only ever reads the session state.
pub struct Debugger<C, W> {
    commands: C,
    output: W,
    breakpoints: BTreeSet<u16>,
    mode: DebuggerMode,
    last_command: Option<Command>,
    verbose: bool,
    display_registers: bool,
}

impl<C: CommandSource, W: Write> Debugger<C, W> {
    pub fn new(commands: C, output: W) -> Self {
        Self {
            commands,
            output,
            breakpoints: BTreeSet::new(),
            mode: DebuggerMode::Prompt,
            last_command: None,
            verbose: false,
            display_registers: false,
        }
    }

    pub fn breakpoints(&self) -> impl Iterator<Item = u16> + '_ {
        self.breakpoints.iter().copied()
    }

    fn print_registers(&mut self, state: &EmulationState<'_>) -> io::Result<()> {
        writeln!(
            self.output,
            "{} IME={}",
            state.cpu_registers(),
            u8::from(state.interrupt_controller().ime)
        )
    }

    fn proceed(&mut self, state: &EmulationState<'_>) -> io::Result<StepDecision> {
        if self.verbose {
            let pc = state.cpu_registers().pc;
            match instructions::parse_next_instruction(state.address_space(), pc) {
                Ok((instruction, _)) => writeln!(self.output, "{pc:04X}: {instruction}")?,
                Err(err) => writeln!(self.output, "{pc:04X}: <{err}>")?,
            }
        }

        Ok(StepDecision::Proceed)
    }

    fn next_command(&mut self) -> Option<Command> {
        loop {
            let line = self.commands.next_line()?;

            if line.trim().is_empty() {
                if let Some(command) = self.last_command {
                    return Some(command);
                }
                continue;
            }

            match Command::parse(line.trim()) {
                Ok(command) => {
                    self.last_command = Some(command);
                    return Some(command);
                }
                Err(err) => {
                    log::warn!("{err}, type 'help' for a list of commands");
                }
            }
        }
    }

    fn decide(&mut self, state: &EmulationState<'_>) -> io::Result<StepDecision> {
        let pc = state.cpu_registers().pc;

        if self.display_registers {
            self.print_registers(state)?;
        }

        if let DebuggerMode::Running { remaining } = self.mode {
            if self.breakpoints.contains(&pc) {
                writeln!(self.output, "Breakpoint hit at {pc:04X}")?;
                self.mode = DebuggerMode::Prompt;
            } else {
                match remaining {
                    Some(0) => {
                        self.mode = DebuggerMode::Prompt;
                    }
                    Some(remaining) => {
                        self.mode = DebuggerMode::Running {
                            remaining: Some(remaining - 1),
                        };
                        return self.proceed(state);
                    }
                    None => return self.proceed(state),
                }
            }
        }

        loop {
            write!(self.output, "[{pc:04X}]> ")?;
            self.output.flush()?;

            let Some(command) = self.next_command() else {
                return Ok(StepDecision::Quit);
            };

            match command {
                Command::Help => writeln!(self.output, "{HELP_TEXT}")?,
                Command::InfoRegisters => self.print_registers(state)?,
                Command::ShowBreakpoints => {
                    if self.breakpoints.is_empty() {
                        writeln!(self.output, "No breakpoints")?;
                    }
                    for address in &self.breakpoints {
                        writeln!(self.output, "{address:04X}")?;
                    }
                }
                Command::AddBreakpoint(address) => {
                    if !self.breakpoints.insert(address) {
                        log::warn!("Breakpoint at {address:04X} already exists");
                    }
                }
                Command::DeleteBreakpoint(address) => {
                    if !self.breakpoints.remove(&address) {
                        log::warn!("No breakpoint at {address:04X} to delete");
                    }
                }
                Command::Run(count) => {
                    // The instruction at PC counts towards the run and is never stopped on
                    self.mode = DebuggerMode::Running {
                        remaining: count.map(|count| count.saturating_sub(1)),
                    };
                    return self.proceed(state);
                }
                Command::Step => return self.proceed(state),
                Command::Verbose => {
                    self.verbose = !self.verbose;
                    writeln!(self.output, "verbose: {}", self.verbose)?;
                }
                Command::DisplayRegisters => {
                    self.display_registers = !self.display_registers;
                    writeln!(self.output, "display registers: {}", self.display_registers)?;
                }
                Command::Exit => return Ok(StepDecision::Quit),
            }
        }
    }
}

impl<C: CommandSource, W: Write> StepController for Debugger<C, W> {
    fn before_step(&mut self, state: &EmulationState<'_>) -> StepDecision {
        self.decide(state).unwrap_or_else(|err| {
            log::error!("Error writing debugger output, quitting: {err}");
            StepDecision::Quit
        })
    }
}
