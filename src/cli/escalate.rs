use std::io;
use std::sync::atomic::AtomicBool;

use anyhow::{bail, Result};

use knock_ladder::config::HarnessConfig;
use knock_ladder::ladder::{Ladder, LadderReport};
use knock_ladder::runner::ProcessRunner;

fn status(report: &LadderReport) -> String {
    match (report.failed_at, report.interrupted) {
        (Some(level), _) => format!("FAILED AT c{}", level),
        (None, true) => "INTERRUPTED".to_string(),
        (None, false) if report.attempted.is_empty() => "NO STEPS".to_string(),
        (None, false) => "OK".to_string(),
    }
}

pub fn run_escalate(cfg: &HarnessConfig, shutdown: &AtomicBool) -> Result<()> {
    let runner = ProcessRunner::new(cfg.preview);

    println!("KNOCK-LADDER v{}", env!("CARGO_PKG_VERSION"));
    println!("TOOL:            {}", cfg.tool);
    println!("TARGET:          {}", cfg.url);
    println!("OUTPUT:          {}", cfg.out_dir.display());
    println!("MODE:            {}", if runner.preview() { "PREVIEW" } else { "EXECUTE" });
    println!("PLANS:           {} ({} steps)", cfg.catalog.len(), cfg.total_steps());
    println!("WORST CASE:      {}s", cfg.worst_case_secs());
    println!();

    // PREVIEW NEVER TOUCHES THE DISK, SO A MISSING DIRECTORY IS FINE THERE
    if !runner.preview() && !cfg.out_dir.is_dir() {
        bail!("OUTPUT DIRECTORY {} DOES NOT EXIST", cfg.out_dir.display());
    }

    let mut ladder = Ladder::new(cfg, runner, Some(io::stdout())).with_shutdown(shutdown);
    let reports = ladder.run_all(&cfg.catalog);

    println!();
    println!("{}", "=".repeat(60));
    println!("KNOCK-LADDER SUMMARY");
    println!("{}", "=".repeat(60));
    for report in &reports {
        let top = report.attempted.last().copied().unwrap_or(0);
        println!("  {:<28} {:>3} RUNS  TOP c{:<6} {}",
                 report.label, report.attempted.len(), top, status(report));
    }
    let skipped = cfg.catalog.len() - reports.len();
    if skipped > 0 {
        println!("  {} PLANS NOT STARTED (SHUTDOWN)", skipped);
    }

    println!("KNOCK-LADDER OUT.");
    Ok(())
}
