mod cli;
mod frontend;

use anyhow::Context;
use chip8::prelude::{Beeper, Interpreter, Scheduler, SystemClock};
use clap::Parser;
use log::{error, warn};
use simple_logger::SimpleLogger;

use crate::cli::Cli;
use crate::frontend::{Beep, DEFAULT_FREQUENCY, KeyboardInput, Silence, TerminalRenderer};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    SimpleLogger::new().with_level(cli.log_level).init()?;

    let rom_data = std::fs::read(&cli.rom)
        .with_context(|| format!("failed to read ROM {}", cli.rom.display()))?;
    let rom_stem: String = cli
        .rom
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Unknown ROM".to_string());

    let mut interpreter = Interpreter::new(cli.settings(), SystemClock::new())?;
    interpreter.load_rom(&rom_data)?;
    let mut scheduler = Scheduler::new(interpreter);

    let mut beeper: Box<dyn Beeper> = match Beep::new(DEFAULT_FREQUENCY) {
        Ok(beep) => Box::new(beep),
        Err(err) => {
            warn!("audio unavailable, running muted: {err}");
            Box::new(Silence)
        }
    };
    let mut input = KeyboardInput::spawn();

    let result = {
        // Dropping the renderer restores the terminal before any report.
        let mut renderer = TerminalRenderer::new(rom_stem)?;
        scheduler.run(&mut input, &mut renderer, beeper.as_mut())
    };

    if let Err(fault) = result {
        error!("machine state at fault:\n{}", fault.snapshot);
        eprintln!("{fault}\n{}", fault.snapshot);
        return Err(fault.into());
    }

    Ok(())
}
