use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log every lowered template and continuation
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile an STG program to C
    Build {
        /// Path to the file to compile
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Output file; defaults to FILE with a `.c` extension
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Top-level binding entered by `tagless_entry`
        #[arg(long)]
        entry: Option<String>,
        /// Emit `#line` directives pointing back at FILE
        #[arg(long, default_value_t = false)]
        line_directives: bool,
    },
    /// Parse and lower a program without writing any output
    Check {
        /// Path to the file to check
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print a program in canonical concrete syntax
    Fmt {
        /// Path to the file to format
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print the syntax tree of a program
    Ast {
        /// Path to the file to dump
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}
