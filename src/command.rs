// KNOCK-LADDER COMMAND BUILDER
// (CONFIG, PLAN, CONCURRENCY) -> (COMMAND LINE, OUTPUT PATH). NO STATE, NO I/O.

use std::path::PathBuf;

use crate::config::HarnessConfig;
use crate::plan::Plan;

pub const OUTPUT_EXT: &str = "tsv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub line: String,
    pub path: PathBuf,
}

pub fn build(cfg: &HarnessConfig, plan: &Plan, level: u64) -> CommandSpec {
    let mut opts = vec![
        format!("-c {}", level),
        format!("-d {}", plan.duration_secs),
        "-v".to_string(),
        format!("-p mongodb.url:{}", cfg.url),
        format!("-p mongodb.run:{}", plan.mode),
        format!("-p mongodb.writeConcern:{}", plan.write_concern),
    ];
    if !plan.extra_props.is_empty() {
        opts.push(plan.extra_props.clone());
    }

    CommandSpec {
        line: format!("{} {}", cfg.tool, opts.join(" ")),
        path: output_path(cfg, plan, level),
    }
}

// {out}/{mode}.c{level}-{write concern minus '='}{suffix}.tsv
pub fn output_path(cfg: &HarnessConfig, plan: &Plan, level: u64) -> PathBuf {
    let write_concern: String = plan.write_concern.chars().filter(|&c| c != '=').collect();
    cfg.out_dir.join(format!(
        "{}.c{}-{}{}.{}",
        plan.mode,
        level,
        write_concern,
        plan.suffix(),
        OUTPUT_EXT
    ))
}
