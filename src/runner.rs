// KNOCK-LADDER PROCESS RUNNER
// RUNS ONE knock INVOCATION ON A PTY AND TEES ITS OUTPUT:
//   FILE    -- EVERY LINE, UNTIL THE STREAM ENDS
//   CONSOLE -- EVERY LINE UNTIL "Time's up!", THEN ONE BLANK LINE AND SILENCE
// THE HISTOGRAM DUMP AFTER THE MARKER ONLY LANDS ON DISK.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::process::ExitStatus;

use anyhow::{Context, Result};
use log::{debug, error, warn};

use crate::command::CommandSpec;
use crate::pty::{Pty, PtyLines};

pub const COMPLETION_MARKER: &str = "Time's up!";
pub const CHILD_EXITED_NOTICE: &str = "The child process exited!";

// SEAM BETWEEN THE LADDER AND REAL PROCESSES. RETURNS false ONLY WHEN THE
// RUN FAILED AND ESCALATION SHOULD STOP.
pub trait Spawn {
    fn spawn(&mut self, spec: &CommandSpec, sink: Option<&mut dyn Write>) -> bool;
}

impl<S: Spawn + ?Sized> Spawn for &mut S {
    fn spawn(&mut self, spec: &CommandSpec, sink: Option<&mut dyn Write>) -> bool {
        (**self).spawn(spec, sink)
    }
}

// CONSOLE WRITES ARE BEST-EFFORT AND FLUSHED PER LINE
fn say(sink: &mut Option<&mut dyn Write>, line: &str) {
    if let Some(io) = sink {
        let _ = writeln!(io, "{}", line);
        let _ = io.flush();
    }
}

pub struct ProcessRunner {
    preview: bool,
}

impl ProcessRunner {
    pub fn new(preview: bool) -> Self {
        Self { preview }
    }

    pub fn preview(&self) -> bool {
        self.preview
    }

    // OUTPUT FILE IS OPENED BEFORE THE CHILD STARTS SO A BAD PATH NEVER
    // LEAVES AN UNREAPED PROCESS BEHIND. THE WRITER IS OWNED BY THIS FRAME
    // AND CLOSES ON EVERY EXIT PATH.
    fn execute(&self, spec: &CommandSpec, sink: &mut Option<&mut dyn Write>) -> Result<ExitStatus> {
        let file = File::create(&spec.path)
            .with_context(|| format!("failed to create {}", spec.path.display()))?;
        let mut file = BufWriter::new(file);

        let (lines, mut child) = Pty::open()?.spawn(&spec.line)?;
        debug!("started pid {} for {}", child.id(), spec.path.display());

        let drained = drain(lines, &mut file, sink)
            .with_context(|| format!("capturing to {}", spec.path.display()));

        // ALWAYS REAP. THE MASTER IS CLOSED BY NOW SO A STUCK CHILD SEES HANGUP.
        let status = child.wait().context("wait for child")?;
        let recorded = drained?;
        debug!("{} lines recorded to {}", recorded, spec.path.display());
        Ok(status)
    }
}

fn drain(
    lines: PtyLines,
    file: &mut BufWriter<File>,
    sink: &mut Option<&mut dyn Write>,
) -> Result<u64> {
    let mut done = false;
    let mut recorded = 0u64;
    for line in lines {
        let line = line.context("read from pty master")?;
        writeln!(file, "{}", line)?;
        recorded += 1;
        if done {
            continue;
        }
        say(sink, &line);
        if line.starts_with(COMPLETION_MARKER) {
            done = true;
            say(sink, "");
        }
    }
    file.flush()?;
    Ok(recorded)
}

impl Spawn for ProcessRunner {
    fn spawn(&mut self, spec: &CommandSpec, sink: Option<&mut dyn Write>) -> bool {
        let mut sink = sink;
        say(&mut sink, &format!("{} > {}", spec.line, spec.path.display()));

        if self.preview {
            return true;
        }
        say(&mut sink, "");

        match self.execute(spec, &mut sink) {
            Ok(status) if status.success() => true,
            Ok(status) => {
                warn!("{} ended abnormally: {}", spec.line, status);
                say(&mut sink, CHILD_EXITED_NOTICE);
                false
            }
            Err(e) => {
                error!("{}: {:#}", spec.line, e);
                say(&mut sink, CHILD_EXITED_NOTICE);
                false
            }
        }
    }
}
