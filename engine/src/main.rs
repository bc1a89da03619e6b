use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use log::info;
use structopt::StructOpt;

use mayalias_engine::flow::Workflow;
use mayalias_shared::config::{PARALLEL, VERIFY};
use mayalias_shared::logging;

#[derive(StructOpt)]
#[structopt(
    name = "mayalias-engine",
    about = "Flow-sensitive may-point-to analysis over serialized modules",
    rename_all = "kebab-case"
)]
struct Args {
    /// Verbosity
    #[structopt(short, long, parse(from_occurrences))]
    verbose: usize,

    /// Analyze independent functions on multiple threads
    #[structopt(short, long)]
    parallel: bool,

    /// Check that every solution is a fixpoint before reporting it
    #[structopt(long)]
    verify: bool,

    /// Write the report to this file instead of stdout
    #[structopt(short, long)]
    output: Option<PathBuf>,

    /// Serialized modules (JSON)
    #[structopt(required = true)]
    inputs: Vec<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::from_args();
    let Args {
        verbose,
        parallel,
        verify,
        output,
        inputs,
    } = args;

    // setup logging
    logging::setup(Some(verbose))?;

    // run the workflow
    let flow = Workflow::new(inputs, parallel || *PARALLEL, verify || *VERIFY);
    let reports = flow.execute()?;

    // render
    let mut content = String::new();
    for report in &reports {
        content.push_str(&report.to_string());
    }
    match output {
        None => print!("{}", content),
        Some(path) => {
            fs::write(&path, content)?;
            info!("Report written to {}", path.display());
        }
    }
    Ok(())
}
