use crate::interrupts::InterruptDispatch;
use std::fmt::Formatter;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub rom_path: PathBuf,
    pub debugger_enabled: bool,
    /// Stop after this many completed frames.
    pub frame_limit: Option<u64>,
    pub interrupt_dispatch: InterruptDispatch,
    pub load_state_path: Option<PathBuf>,
    pub save_state_path: Option<PathBuf>,
}

impl RunConfig {
    pub fn new<P>(rom_path: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self {
            rom_path: rom_path.into(),
            debugger_enabled: false,
            frame_limit: None,
            interrupt_dispatch: InterruptDispatch::default(),
            load_state_path: None,
            save_state_path: None,
        }
    }
}

fn fmt_option<T: std::fmt::Display>(option: Option<T>) -> String {
    match option {
        Some(value) => format!("{value}"),
        None => "<None>".into(),
    }
}

impl std::fmt::Display for RunConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "rom_path: {}", self.rom_path.display())?;
        writeln!(f, "debugger_enabled: {}", self.debugger_enabled)?;
        writeln!(f, "frame_limit: {}", fmt_option(self.frame_limit))?;
        writeln!(f, "interrupt_dispatch: {}", self.interrupt_dispatch)?;
        writeln!(
            f,
            "load_state_path: {}",
            fmt_option(self.load_state_path.as_ref().map(|path| path.display()))
        )?;
        writeln!(
            f,
            "save_state_path: {}",
            fmt_option(self.save_state_path.as_ref().map(|path| path.display()))
        )?;

        Ok(())
    }
}
