// KNOCK-LADDER BENCHMARK PLANS
// ONE PLAN = ONE WORKLOAD SHAPE SWEPT ACROSS A CONCURRENCY LADDER.
// STEP i RUNS AT 2^i CLIENTS. ZERO STEPS MEANS THE PLAN NEVER RUNS.
//
// PURE-RUST MODULE: NO PROCESS OR TERMINAL DEPENDENCIES.

use std::path::{Path, PathBuf};

use serde::Deserialize;

// 2^31 CLIENTS IS ALREADY FAR PAST ANY HOST. KEEPS 1 << i INSIDE u64.
pub const MAX_STEPS: u32 = 32;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Plan {
    // WORKLOAD KIND PASSED AS mongodb.run
    pub mode: String,
    // ACKNOWLEDGEMENT LEVEL, E.G. "none", "w=0", "w=1"
    #[serde(alias = "writeconcern", alias = "writeConcern")]
    pub write_concern: String,
    // NUMBER OF LADDER STEPS
    #[serde(alias = "size")]
    pub steps: u32,
    // SECONDS PER STEP
    #[serde(alias = "time")]
    pub duration_secs: u64,
    // APPENDED VERBATIM TO EVERY INVOCATION
    #[serde(default, alias = "moreProps")]
    pub extra_props: String,
    // DISTINGUISHES OUTPUT FILES, E.G. PAYLOAD SIZE
    #[serde(default)]
    pub suffix: Option<String>,
}

impl Plan {
    pub fn new(mode: &str, write_concern: &str, steps: u32, duration_secs: u64) -> Self {
        Self {
            mode: mode.to_string(),
            write_concern: write_concern.to_string(),
            steps,
            duration_secs,
            extra_props: String::new(),
            suffix: None,
        }
    }

    pub fn with_extra_props(mut self, props: &str) -> Self {
        self.extra_props = props.to_string();
        self
    }

    pub fn with_suffix(mut self, suffix: &str) -> Self {
        self.suffix = Some(suffix.to_string());
        self
    }

    pub fn suffix(&self) -> &str {
        self.suffix.as_deref().unwrap_or("")
    }

    // CONCURRENCY LEVELS IN LADDER ORDER: 1, 2, 4, ..., 2^(steps-1)
    pub fn levels(&self) -> impl Iterator<Item = u64> {
        (0..self.steps.min(MAX_STEPS)).map(|i| 1u64 << i)
    }

    pub fn label(&self) -> String {
        format!("{} {}{}", self.mode, self.write_concern, self.suffix())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("plan '{label}' asks for {steps} steps (max {})", MAX_STEPS)]
    TooManySteps { label: String, steps: u32 },
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "plan")]
    plans: Vec<Plan>,
}

pub fn parse_catalog(text: &str, path: &Path) -> Result<Vec<Plan>, CatalogError> {
    let file: CatalogFile = toml::from_str(text).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    for plan in &file.plans {
        if plan.steps > MAX_STEPS {
            return Err(CatalogError::TooManySteps {
                label: plan.label(),
                steps: plan.steps,
            });
        }
    }
    Ok(file.plans)
}

pub fn load_catalog(path: &Path) -> Result<Vec<Plan>, CatalogError> {
    let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_catalog(&text, path)
}

// BUILT-IN CATALOG FOR mongo0002
//
// GROUP 1: ATOMIC INCREMENTS ON ONE SHARED COUNTER DOCUMENT.
// GROUP 2: hourly_stats / daily_stats SHAPED WRITES, 512 BYTES.
// GROUP 3: exports SHAPED WRITES, 14KB.
pub fn default_catalog() -> Vec<Plan> {
    vec![
        Plan::new("counters", "none", 7, 120)
            .with_extra_props("-p mongodb.database:knock_counters_unsafe"),
        Plan::new("counters", "w=1", 7, 120)
            .with_extra_props("-p mongodb.database:knock_counters_w1"),

        Plan::new("writes", "none", 7, 60)
            .with_extra_props("-p mongodb.doc_length:512 -p mongodb.database:knock_writes_unsafe_512b")
            .with_suffix("-512b"),
        Plan::new("writes", "w=0", 7, 60)
            .with_extra_props("-p mongodb.doc_length:512 -p mongodb.database:knock_writes_w0_512b")
            .with_suffix("-512b"),
        Plan::new("writes", "w=1", 7, 60)
            .with_extra_props("-p mongodb.doc_length:512 -p mongodb.database:knock_writes_w1_512b")
            .with_suffix("-512b"),

        Plan::new("writes", "none", 5, 60)
            .with_extra_props("-p mongodb.doc_length:14336 -p mongodb.database:knock_writes_unsafe_14Kb")
            .with_suffix("-14Kb"),
        Plan::new("writes", "w=0", 5, 60)
            .with_extra_props("-p mongodb.doc_length:14336 -p mongodb.database:knock_writes_w0_14Kb")
            .with_suffix("-14Kb"),
        Plan::new("writes", "w=1", 5, 60)
            .with_extra_props("-p mongodb.doc_length:14336 -p mongodb.database:knock_writes_w1_14Kb")
            .with_suffix("-14Kb"),
    ]
}
