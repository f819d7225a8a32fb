mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use colored::Colorize;
use std::{path::Path, process::ExitCode};
use tagless_driver::{diagnostics, Driver, DriverError, Result};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let (name, source) = match Driver::read(input(&cli.command)) {
        | Ok(read) => read,
        | Err(err) => {
            eprintln!("{} {}", "error:".red().bold(), err);
            return ExitCode::FAILURE;
        }
    };
    match run(cli.command, &name, &source) {
        | Ok(()) => ExitCode::SUCCESS,
        | Err(err) => {
            report(&err, &name, &source);
            ExitCode::FAILURE
        }
    }
}

fn input(command: &Commands) -> &Path {
    match command {
        | Commands::Build { file, .. }
        | Commands::Check { file }
        | Commands::Fmt { file }
        | Commands::Ast { file } => file,
    }
}

/// Errors pointing into the source are rendered with an excerpt of it.
fn report(err: &DriverError, name: &str, source: &str) {
    let rendered = err.to_report().map(|report| report.eprint(diagnostics::source_cache(name, source)));
    match rendered {
        | Some(Ok(())) => {}
        | Some(Err(io)) => {
            log::debug!("failed to render the report: {io}");
            eprintln!("{} {}", "error:".red().bold(), err);
        }
        | None => eprintln!("{} {}", "error:".red().bold(), err),
    }
}

fn run(command: Commands, name: &str, source: &str) -> Result<()> {
    let mut driver = Driver::new();
    match command {
        | Commands::Build { file, output, entry, line_directives } => {
            if let Some(entry) = entry {
                driver.conf.entry = entry;
            }
            driver.conf.line_directives |= line_directives;
            let artifact = driver.compile(name, source)?;
            let output = output.unwrap_or_else(|| file.with_extension("c"));
            std::fs::write(&output, artifact.c_source)?;
            log::info!("wrote {}", output.display());
            println!(
                "{} {} ({} template(s))",
                "compiled".green(),
                output.display(),
                artifact.lowered.templates.len()
            );
        }
        | Commands::Check { .. } => {
            driver.check(name, source)?;
            println!("check {} ... {}", name, "ok".green());
        }
        | Commands::Fmt { .. } => {
            print!("{}", driver.pretty(name, source)?);
        }
        | Commands::Ast { .. } => {
            println!("{}", driver.ast(name, source)?);
        }
    }
    Ok(())
}
