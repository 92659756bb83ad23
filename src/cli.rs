use std::path::PathBuf;

use chip8::prelude::{Quirks, Settings, Timing};
use chip8::quirks::{
    DEFAULT_DISPLAY_HEIGHT, DEFAULT_DISPLAY_RATIO, DEFAULT_DISPLAY_WIDTH,
    DEFAULT_INSTRUCTIONS_PER_SECOND, DEFAULT_TIMER_RATE, MAX_RATE_HZ,
};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about = "A simple CHIP-8 emulator written in Rust")]
pub struct Cli {
    /// ROM image to run.
    pub rom: PathBuf,

    /// Instructions executed per second.
    #[arg(
        long,
        default_value_t = DEFAULT_INSTRUCTIONS_PER_SECOND,
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_RATE_HZ)),
    )]
    pub ips: u32,

    /// Delay and sound timer rate.
    #[arg(
        long,
        default_value_t = DEFAULT_TIMER_RATE,
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_RATE_HZ)),
    )]
    pub timer_hz: u32,

    /// Instructions executed between screen refreshes.
    #[arg(long, default_value_t = DEFAULT_DISPLAY_RATIO, value_parser = clap::value_parser!(u32).range(1..))]
    pub display_ratio: u32,

    #[arg(long, default_value_t = DEFAULT_DISPLAY_WIDTH)]
    pub width: usize,

    #[arg(long, default_value_t = DEFAULT_DISPLAY_HEIGHT)]
    pub height: usize,

    /// Shift Vx in place instead of copying Vy first.
    #[arg(long)]
    pub shift_uses_vx: bool,

    /// Leave I unchanged after Fx55/Fx65.
    #[arg(long)]
    pub keep_index: bool,

    /// Leave VF untouched after 8xy1/8xy2/8xy3.
    #[arg(long)]
    pub keep_vf: bool,

    /// Wrap sprites around the screen edges instead of clipping them.
    #[arg(long)]
    pub wrap_sprites: bool,

    /// Fail once the call stack grows beyond this depth.
    #[arg(long)]
    pub stack_limit: Option<usize>,

    /// Seed for the random number instruction.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log verbosity. Logs go to stderr, which shares the terminal with the
    /// display; redirect it (`2>chip8.log`) above `warn`.
    #[arg(long, default_value = "warn")]
    pub log_level: log::LevelFilter,
}

impl Cli {
    pub fn settings(&self) -> Settings {
        Settings {
            quirks: Quirks {
                shift_uses_vy: !self.shift_uses_vx,
                increment_index: !self.keep_index,
                logic_resets_vf: !self.keep_vf,
                wrap_sprites: self.wrap_sprites,
            },
            timing: Timing {
                instruction_hz: self.ips,
                timer_hz: self.timer_hz,
                display_ratio: self.display_ratio,
            },
            display_width: self.width,
            display_height: self.height,
            stack_limit: self.stack_limit,
            seed: self.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_settings() {
        let cli = Cli::parse_from(["chip8", "game.ch8"]);
        assert_eq!(cli.settings(), Settings::default());
        assert_eq!(cli.log_level, log::LevelFilter::Warn);
    }

    #[test]
    fn test_quirk_flags() {
        let cli = Cli::parse_from([
            "chip8",
            "game.ch8",
            "--shift-uses-vx",
            "--keep-index",
            "--keep-vf",
            "--wrap-sprites",
            "--ips",
            "700",
            "--stack-limit",
            "16",
        ]);
        let settings = cli.settings();
        assert!(!settings.quirks.shift_uses_vy);
        assert!(!settings.quirks.increment_index);
        assert!(!settings.quirks.logic_resets_vf);
        assert!(settings.quirks.wrap_sprites);
        assert_eq!(settings.timing.instruction_hz, 700);
        assert_eq!(settings.stack_limit, Some(16));
    }

    #[test]
    fn test_zero_rate_rejected() {
        assert!(Cli::try_parse_from(["chip8", "game.ch8", "--ips", "0"]).is_err());
    }

    #[test]
    fn test_rate_without_period_rejected() {
        assert!(Cli::try_parse_from(["chip8", "game.ch8", "--timer-hz", "2000000000"]).is_err());
        assert!(Cli::try_parse_from(["chip8", "game.ch8", "--ips", "1000000001"]).is_err());
        let cli = Cli::parse_from(["chip8", "game.ch8", "--timer-hz", "1000000000"]);
        assert!(cli.settings().validate().is_ok());
    }
}
