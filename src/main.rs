// Groovetab CLI - Print drum tablature for a groove file
// Tab on stdout; failures as a single `error[Kind]: message` line on stderr

use clap::{ArgAction, Parser};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use groovetab_lib::{run_file, RenderOptions, RunOptions};

/// Groovetab - assign sticking to a drum groove and print it as tablature
#[derive(Parser, Debug)]
#[command(name = "groovetab")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the groove definition (JSON)
    groove_file: PathBuf,

    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Also print one JSON line per hand decision
    #[arg(long)]
    explain: bool,

    /// Print a row for every kit instrument, even silent ones
    #[arg(long)]
    all_rows: bool,
}

impl Cli {
    fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }

    fn run_options(&self) -> RunOptions {
        RunOptions {
            render: RenderOptions {
                all_rows: self.all_rows,
            },
            explain: self.explain,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .format_timestamp(None)
        .init();

    match run_file(&cli.groove_file, cli.run_options()) {
        Ok(output) => {
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = stdout.write_all(output.as_bytes()) {
                eprintln!("error[Io]: {}", e);
                return ExitCode::from(1);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error[{}]: {}", e.category(), e);
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let cli = Cli::try_parse_from(["groovetab", "demos/reminiscing.json", "-vv", "--explain"]).unwrap();

        assert_eq!(cli.groove_file, PathBuf::from("demos/reminiscing.json"));
        assert_eq!(cli.log_level(), log::LevelFilter::Debug);
        assert!(cli.explain);
        assert!(!cli.run_options().render.all_rows);
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["groovetab", "groove.json", "--all-rows"]).unwrap();

        assert_eq!(cli.log_level(), log::LevelFilter::Warn);
        assert!(cli.run_options().render.all_rows);
        assert!(!cli.run_options().explain);
    }

    #[test]
    fn test_file_required() {
        assert!(Cli::try_parse_from(["groovetab"]).is_err());
    }
}
