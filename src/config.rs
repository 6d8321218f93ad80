// KNOCK-LADDER HARNESS CONFIGURATION
// BUILT ONCE AT STARTUP, PASSED BY REFERENCE. NOTHING HERE IS MUTATED MID-RUN.

use std::path::PathBuf;

use crate::plan::{self, Plan};

pub const DEFAULT_TOOL: &str = "knock";
pub const DEFAULT_URL: &str = "mongodb://mongo0002:27017";
pub const DEFAULT_OUT_DIR: &str = "/home/deploy/measurements/knock/mongo0002";

#[derive(Debug, Clone)]
pub struct HarnessConfig {
    // PROGRAM NAME OR PATH OF THE LOAD GENERATOR
    pub tool: String,
    // CONNECTION STRING HANDED TO EVERY RUN
    pub url: String,
    // ROOT FOR PER-RUN .tsv CAPTURES
    pub out_dir: PathBuf,
    // ANNOUNCE COMMANDS WITHOUT EXECUTING THEM
    pub preview: bool,
    pub catalog: Vec<Plan>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            tool: DEFAULT_TOOL.to_string(),
            url: DEFAULT_URL.to_string(),
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            preview: false,
            catalog: plan::default_catalog(),
        }
    }
}

impl HarnessConfig {
    pub fn total_steps(&self) -> u64 {
        self.catalog.iter().map(|p| p.levels().count() as u64).sum()
    }

    // UPPER BOUND ON WALL TIME IF EVERY STEP RUNS TO COMPLETION.
    // SATURATES: A CATALOG FILE MAY CARRY ANY duration_secs.
    pub fn worst_case_secs(&self) -> u64 {
        self.catalog
            .iter()
            .map(|p| (p.levels().count() as u64).saturating_mul(p.duration_secs))
            .fold(0u64, |acc, secs| acc.saturating_add(secs))
    }
}
