mod emulator;
mod keymap;

use std::fs::File;
use std::path::PathBuf;

use anyhow::Context;
use chip8vm::state::{DEFAULT_FRAME_RATE, DEFAULT_INSTRUCTIONS_PER_SECOND};
use clap::Parser;
use log::LevelFilter;

use crate::emulator::{Emulator, Settings};

#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Raw CHIP-8 program image
    rom: PathBuf,

    /// Frames per second; timers tick once per frame
    #[arg(long, default_value_t = DEFAULT_FRAME_RATE)]
    frame_rate: u64,

    /// Instructions executed per second
    #[arg(long, default_value_t = DEFAULT_INSTRUCTIONS_PER_SECOND)]
    ips: u64,

    /// Write logs here (level from RUST_LOG, default warn)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Exit on stack overflow/underflow instead of carrying on
    #[arg(long)]
    halt_on_fault: bool,
}

fn init_logging(log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let mut builder = env_logger::Builder::new();
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            builder
                .filter_level(LevelFilter::Warn)
                .parse_default_env()
                .target(env_logger::Target::Pipe(Box::new(file)));
        }
        // the terminal belongs to the UI
        None => {
            builder.filter_level(LevelFilter::Off);
        }
    }
    builder.init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_ref())?;

    let settings = Settings {
        frame_rate: args.frame_rate,
        ips: args.ips,
        rom: args.rom,
        halt_on_fault: args.halt_on_fault,
    };
    let mut emulator = Emulator::new(settings)?;
    emulator.run()
}
