// KNOCK-LADDER v1.2.0 -- BENCHMARK ESCALATION HARNESS FOR knock
// WALKS EVERY PLAN UP A 1, 2, 4, ... CLIENT LADDER, CAPTURES EACH RUN TO .tsv
//
// RUN        ESCALATE THE CATALOG (OR --preview TO PRINT THE COMMANDS)
// SUMMARIZE  knock REPORT(S) -> TWO CSV LINES
// CHECK      TOOL / PTY / OUTPUT DIRECTORY SANITY
// CATALOG    PRINT THE PLANS AND THEIR LADDERS

mod cli;

use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use knock_ladder::config::{HarnessConfig, DEFAULT_OUT_DIR, DEFAULT_TOOL, DEFAULT_URL};
use knock_ladder::plan;

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

#[derive(Parser)]
#[command(name = "knock-ladder")]
#[command(about = "KNOCK-LADDER -- CONCURRENCY ESCALATION HARNESS FOR knock")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct TargetArgs {
    // LOAD GENERATOR PROGRAM
    #[arg(long, default_value = DEFAULT_TOOL)]
    tool: String,

    // CONNECTION STRING PASSED AS mongodb.url
    #[arg(long, default_value = DEFAULT_URL)]
    url: String,

    // WHERE THE PER-RUN .tsv CAPTURES GO
    #[arg(long, default_value = DEFAULT_OUT_DIR)]
    out_dir: PathBuf,

    // TOML CATALOG ([[plan]] TABLES). BUILT-IN mongo0002 CATALOG IF OMITTED
    #[arg(long)]
    catalog: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    // ESCALATE EVERY PLAN IN THE CATALOG
    Run {
        #[command(flatten)]
        target: TargetArgs,

        // PRINT COMMANDS AND PATHS ONLY, NOTHING IS EXECUTED OR WRITTEN
        #[arg(long)]
        preview: bool,
    },

    // SUMMARIZE knock REPORTS (FILES CONCATENATED, OR STDIN)
    Summarize {
        files: Vec<PathBuf>,
    },

    // VERIFY TOOL, PTY AND OUTPUT DIRECTORY
    Check {
        #[command(flatten)]
        target: TargetArgs,
    },

    // PRINT THE CATALOG
    Catalog {
        #[command(flatten)]
        target: TargetArgs,
    },
}

fn harness_config(target: TargetArgs, preview: bool) -> Result<HarnessConfig> {
    let catalog = match &target.catalog {
        Some(path) => plan::load_catalog(path)?,
        None => plan::default_catalog(),
    };
    Ok(HarnessConfig {
        tool: target.tool,
        url: target.url,
        out_dir: target.out_dir,
        preview,
        catalog,
    })
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Run { target, preview } => {
            let cfg = harness_config(target, preview)?;

            // FIRST CTRL+C: FINISH THE CURRENT STEP, THEN STOP.
            // SECOND CTRL+C: LEAVE NOW.
            ctrlc::set_handler(move || {
                if SHUTDOWN.swap(true, Ordering::Relaxed) {
                    eprintln!("\nKNOCK-LADDER ABORTED");
                    process::exit(130);
                }
                eprintln!("\nSTOPPING AFTER THE CURRENT STEP (CTRL+C AGAIN TO ABORT)");
            })?;

            cli::escalate::run_escalate(&cfg, &SHUTDOWN)
        }
        Command::Summarize { files } => cli::summarize::run_summarize(&files),
        Command::Check { target } => {
            let cfg = harness_config(target, false)?;
            cli::check::run_check(&cfg)
        }
        Command::Catalog { target } => {
            let cfg = harness_config(target, true)?;
            cli::catalog::run_catalog(&cfg);
            Ok(())
        }
    }
}
