mod config;
mod frames;

use crate::config::CliConfig;
use crate::frames::HeadlessSink;
use anyhow::Context;
use clap::{Parser, ValueEnum};
use dmg_core::serialize;
use dmg_core::{InterruptDispatch, JoypadState, RunConfig};
use env_logger::Env;
use std::io::{self, BufRead};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DispatchArg {
    PriorityScan,
    SingleBitOnly,
}

impl From<DispatchArg> for InterruptDispatch {
    fn from(value: DispatchArg) -> Self {
        match value {
            DispatchArg::PriorityScan => Self::PriorityScan,
            DispatchArg::SingleBitOnly => Self::SingleBitOnly,
        }
    }
}

// Option<Option<_>> is how clap models a flag with an optional value
#[allow(clippy::option_option)]
#[derive(Debug, Parser)]
struct Cli {
    /// ROM image to run
    #[arg(short = 'f', long = "rom-path")]
    rom_path: PathBuf,

    /// TOML config file; flags override its values
    #[arg(short = 'c', long = "config")]
    config_path: Option<PathBuf>,

    /// Write the effective config to this path and exit
    #[arg(long = "write-config")]
    write_config_path: Option<PathBuf>,

    /// Read debugger commands from stdin
    #[arg(short = 'd', long)]
    debugger: bool,

    /// Stop after this many frames
    #[arg(short = 'n', long)]
    frame_limit: Option<u64>,

    #[arg(long, value_enum)]
    interrupt_dispatch: Option<DispatchArg>,

    /// Restore a save state before running [default path: the ROM path with a .ss0 extension]
    #[arg(long = "load-state", value_name = "PATH", num_args = 0..=1)]
    load_state_path: Option<Option<PathBuf>>,

    /// Write a save state when the session stops [default path: the ROM path with a .ss0 extension]
    #[arg(long = "save-state", value_name = "PATH", num_args = 0..=1)]
    save_state_path: Option<Option<PathBuf>>,

    /// Write every presented frame into this directory as PPM images
    #[arg(long)]
    frame_dump_dir: Option<PathBuf>,
}

impl Cli {
    fn load_state_path(&self) -> Option<PathBuf> {
        self.resolve_state_path(self.load_state_path.as_ref())
    }

    fn save_state_path(&self) -> Option<PathBuf> {
        self.resolve_state_path(self.save_state_path.as_ref())
    }

    fn resolve_state_path(&self, path: Option<&Option<PathBuf>>) -> Option<PathBuf> {
        path.map(|path| {
            path.clone()
                .unwrap_or_else(|| serialize::determine_save_state_path(&self.rom_path))
        })
    }

    fn merge_into(&self, mut config: CliConfig) -> CliConfig {
        config.debugger_enabled |= self.debugger;
        if let Some(frame_limit) = self.frame_limit {
            config.frame_limit = Some(frame_limit);
        }
        if let Some(interrupt_dispatch) = self.interrupt_dispatch {
            config.interrupt_dispatch = interrupt_dispatch.into();
        }
        if let Some(frame_dump_dir) = &self.frame_dump_dir {
            config.frame_dump_dir = Some(frame_dump_dir.clone());
        }
        config
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Cli::parse();

    let file_config = match &args.config_path {
        Some(config_path) => CliConfig::from_toml_file(config_path)?,
        None => CliConfig::default(),
    };
    let config = args.merge_into(file_config);

    if let Some(write_config_path) = &args.write_config_path {
        config.save_to_file(write_config_path)?;
        log::info!("Wrote config to '{}'", write_config_path.display());
        return Ok(());
    }

    let run_config = RunConfig {
        debugger_enabled: config.debugger_enabled,
        frame_limit: config.frame_limit,
        interrupt_dispatch: config.interrupt_dispatch,
        load_state_path: args.load_state_path(),
        save_state_path: args.save_state_path(),
        ..RunConfig::new(&args.rom_path)
    };

    if let Some(frame_dump_dir) = &config.frame_dump_dir {
        std::fs::create_dir_all(frame_dump_dir).with_context(|| {
            format!("error creating frame dump directory '{}'", frame_dump_dir.display())
        })?;
    }

    let mut sink = HeadlessSink::new(config.frame_dump_dir);
    let summary = dmg_core::run(
        &run_config,
        io::stdin().lock().lines(),
        io::stdout(),
        &mut JoypadState::new(),
        &mut sink,
    )
    .with_context(|| format!("emulation of '{}' failed", args.rom_path.display()))?;

    log::info!(
        "Session ended ({:?}): {} instructions, {} cycles, {} frames presented",
        summary.stop_reason,
        summary.instructions,
        summary.cycles,
        sink.frames_presented()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_file_values() {
        let args = Cli::parse_from([
            "dmg-cli",
            "-f",
            "tetris.gb",
            "--frame-limit",
            "10",
            "--interrupt-dispatch",
            "single-bit-only",
        ]);

        let file_config = CliConfig {
            debugger_enabled: true,
            frame_limit: Some(600),
            frame_dump_dir: Some("frames".into()),
            ..CliConfig::default()
        };

        assert_eq!(
            CliConfig {
                debugger_enabled: true,
                frame_limit: Some(10),
                interrupt_dispatch: InterruptDispatch::SingleBitOnly,
                frame_dump_dir: Some("frames".into()),
            },
            args.merge_into(file_config)
        );
    }

    #[test]
    fn save_state_paths() {
        let args = Cli::parse_from(["dmg-cli", "-f", "roms/tetris.gb"]);
        assert_eq!(None, args.load_state_path());
        assert_eq!(None, args.save_state_path());

        let args = Cli::parse_from([
            "dmg-cli",
            "-f",
            "roms/tetris.gb",
            "--save-state",
            "--load-state",
        ]);
        assert_eq!(
            Some(PathBuf::from("roms/tetris.ss0")),
            args.load_state_path()
        );
        assert_eq!(
            Some(PathBuf::from("roms/tetris.ss0")),
            args.save_state_path()
        );

        let args = Cli::parse_from([
            "dmg-cli",
            "-f",
            "roms/tetris.gb",
            "--save-state",
            "states/level2.ss0",
        ]);
        assert_eq!(
            Some(PathBuf::from("states/level2.ss0")),
            args.save_state_path()
        );
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
