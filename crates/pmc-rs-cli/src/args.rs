// crates/pmc-rs-cli/src/args.rs
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "pmc", version, about = "Parameter model compiler")]
pub struct Cli {
    /// Raise log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import an SMDX model as parameters plus a SunSpec model.
    Import {
        /// Project file; created when missing.
        #[arg(long)]
        project: PathBuf,
        /// SMDX file to import.
        #[arg(long)]
        smdx: PathBuf,
    },

    /// Run every exporter.
    Export {
        #[arg(long)]
        project: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Check every tree; exits non-zero when an error is found.
    Validate {
        #[arg(long)]
        project: PathBuf,
    },

    /// Expand every table, save the project, then export.
    Build {
        #[arg(long)]
        project: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Output directory.
    #[arg(long)]
    pub out: PathBuf,
    /// Directory with `c_source.hbs`/`c_header.hbs` overriding the built-in templates.
    #[arg(long)]
    pub template_dir: Option<PathBuf>,
    /// Directory of `.pmvs` product value sets for the CAN workbook.
    #[arg(long)]
    pub pmvs_dir: Option<PathBuf>,
}

impl Cli {
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
