use std::fs::{self, OpenOptions};
use std::path::Path;
use std::process::Command;

use anyhow::Result;

use knock_ladder::config::HarnessConfig;
use knock_ladder::pty::Pty;

const PROBE_NAME: &str = ".knock-ladder-probe";

fn check_tool(name: &str) -> bool {
    // PATHS ARE CHECKED DIRECTLY, BARE NAMES GO THROUGH $PATH
    if name.contains('/') {
        return Path::new(name).is_file();
    }
    Command::new("which")
        .arg(name)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn check_pty() -> bool {
    match Pty::open() {
        Ok(_) => {
            println!("  {:<24}OK", "pty");
            true
        }
        Err(e) => {
            println!("  {:<24}UNAVAILABLE ({:#})", "pty", e);
            false
        }
    }
}

fn check_out_dir(dir: &Path) -> bool {
    if !dir.is_dir() {
        println!("  {:<24}MISSING ({})", "output dir", dir.display());
        return false;
    }
    let probe = dir.join(PROBE_NAME);
    let writable = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&probe)
        .is_ok();
    let _ = fs::remove_file(&probe);
    if writable {
        println!("  {:<24}OK ({})", "output dir", dir.display());
    } else {
        println!("  {:<24}NOT WRITABLE ({})", "output dir", dir.display());
    }
    writable
}

pub fn run_check(cfg: &HarnessConfig) -> Result<()> {
    println!("KNOCK-LADDER DEPENDENCY CHECK");
    println!();

    let mut ok = true;
    for tool in [cfg.tool.as_str(), "sh"] {
        if check_tool(tool) {
            println!("  {:<24}OK", tool);
        } else {
            println!("  {:<24}MISSING", tool);
            ok = false;
        }
    }
    if !check_pty() {
        ok = false;
    }
    if !check_out_dir(&cfg.out_dir) {
        ok = false;
    }
    println!();

    println!("TARGET:          {}", cfg.url);
    println!("PLANS:           {} ({} steps)", cfg.catalog.len(), cfg.total_steps());
    println!();

    if ok {
        println!("ALL CHECKS PASSED");
    } else {
        println!("SOME CHECKS FAILED");
        if !check_tool(&cfg.tool) {
            println!("  Put {} on PATH or pass --tool /path/to/{}", cfg.tool, cfg.tool);
        }
        if !cfg.out_dir.is_dir() {
            println!("  mkdir -p {}", cfg.out_dir.display());
        }
        std::process::exit(1);
    }

    Ok(())
}
