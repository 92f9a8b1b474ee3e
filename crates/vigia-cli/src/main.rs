//! Vigia CLI: compare screenshots against baselines
//!
//! ## Usage
//!
//! ```bash
//! vigia compare baseline.png actual.png                 # summary line, exit 0/1
//! vigia compare b.png a.png --ignore 0,0,200,40 --json  # mask a clock, JSON out
//! vigia compare b.png a.png --diff-out diff.png         # save annotated diff
//! vigia probe                                           # backend and model status
//! ```

use clap::Parser;
use std::process::ExitCode;
use vigia::PixelBackend;
use vigia_cli::{init_tracing, run_compare, run_probe, Cli, CliResult, Commands, Outcome, ERROR_EXIT_CODE};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let status = match run(&cli) {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(ERROR_EXIT_CODE)
        }
    };
    PixelBackend::shared().dispose();
    status
}

fn run(cli: &Cli) -> CliResult<Outcome> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match &cli.command {
        Commands::Compare(args) => run_compare(args, &mut out),
        Commands::Probe(args) => {
            run_probe(args, &mut out)?;
            Ok(Outcome::Match)
        }
    }
}
