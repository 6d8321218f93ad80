use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};

use knock_ladder::report::Summary;

// NO FILES: READ STDIN. SEVERAL FILES: ONE SUMMARY OVER THEIR CONCATENATION.
pub fn run_summarize(files: &[PathBuf]) -> Result<()> {
    let mut summary = Summary::new();

    if files.is_empty() {
        summary.feed_reader(io::stdin().lock()).context("reading stdin")?;
    }
    for path in files {
        let file = File::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        summary.feed_reader(BufReader::new(file))
            .with_context(|| format!("failed to read {}", path.display()))?;
    }

    let mut out = io::stdout().lock();
    out.write_all(summary.to_csv().as_bytes())?;
    out.flush()?;
    Ok(())
}
