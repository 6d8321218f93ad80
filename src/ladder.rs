// KNOCK-LADDER ESCALATION CONTROLLER
// WALKS EACH PLAN'S CONCURRENCY LADDER (1, 2, 4, ...) ONE STEP AT A TIME.
// A FAILED STEP ENDS THAT PLAN: IF THE HOST CAN'T HOLD 2^i CLIENTS IT WON'T
// HOLD 2^(i+1). THE NEXT PLAN STILL RUNS FROM THE BOTTOM OF ITS LADDER.
//
// STRICTLY SEQUENTIAL. THE ONLY CROSS-THREAD STATE IS THE SHUTDOWN FLAG,
// CHECKED BETWEEN STEPS. A RUNNING CHILD IS NEVER KILLED FROM HERE.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{info, warn};

use crate::command;
use crate::config::HarnessConfig;
use crate::plan::Plan;
use crate::runner::Spawn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LadderReport {
    pub label: String,
    // LEVELS HANDED TO THE RUNNER, IN ORDER
    pub attempted: Vec<u64>,
    pub failed_at: Option<u64>,
    pub interrupted: bool,
}

impl LadderReport {
    pub fn completed(&self) -> bool {
        self.failed_at.is_none() && !self.interrupted
    }
}

pub struct Ladder<'a, S: Spawn, W: Write> {
    cfg: &'a HarnessConfig,
    runner: S,
    console: Option<W>,
    shutdown: Option<&'a AtomicBool>,
}

impl<'a, S: Spawn, W: Write> Ladder<'a, S, W> {
    pub fn new(cfg: &'a HarnessConfig, runner: S, console: Option<W>) -> Self {
        Self {
            cfg,
            runner,
            console,
            shutdown: None,
        }
    }

    pub fn with_shutdown(mut self, flag: &'a AtomicBool) -> Self {
        self.shutdown = Some(flag);
        self
    }

    fn stopping(&self) -> bool {
        self.shutdown.is_some_and(|f| f.load(Ordering::Relaxed))
    }

    pub fn run(&mut self, plan: &Plan) -> LadderReport {
        let mut report = LadderReport {
            label: plan.label(),
            attempted: Vec::new(),
            failed_at: None,
            interrupted: false,
        };

        for (step, level) in plan.levels().enumerate() {
            if self.stopping() {
                info!("{}: shutdown requested, skipping c{} and above", report.label, level);
                report.interrupted = true;
                break;
            }

            let spec = command::build(self.cfg, plan, level);
            info!("{}: step {}/{} at {} clients", report.label, step + 1, plan.steps, level);
            report.attempted.push(level);

            let sink = self.console.as_mut().map(|w| w as &mut dyn Write);
            if !self.runner.spawn(&spec, sink) {
                warn!("{}: failed at c{}, abandoning remaining steps", report.label, level);
                report.failed_at = Some(level);
                break;
            }
        }

        report
    }

    // EVERY PLAN GETS ITS TURN REGARDLESS OF EARLIER FAILURES
    pub fn run_all(&mut self, catalog: &[Plan]) -> Vec<LadderReport> {
        let mut reports = Vec::with_capacity(catalog.len());
        for (i, plan) in catalog.iter().enumerate() {
            if self.stopping() {
                break;
            }
            if let Some(out) = self.console.as_mut() {
                let _ = writeln!(
                    out,
                    "PLAN {}/{}: {} ({} STEPS, {}S EACH)",
                    i + 1,
                    catalog.len(),
                    plan.label(),
                    plan.steps,
                    plan.duration_secs
                );
                let _ = out.flush();
            }
            reports.push(self.run(plan));
        }
        reports
    }

    pub fn into_parts(self) -> (S, Option<W>) {
        (self.runner, self.console)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandSpec;

    // RECORDS CALLS, FAILS AT ONE LEVEL FOR ONE MODE
    struct Scripted {
        calls: Vec<CommandSpec>,
        fail: Option<(&'static str, u64)>,
    }

    impl Spawn for Scripted {
        fn spawn(&mut self, spec: &CommandSpec, _sink: Option<&mut dyn Write>) -> bool {
            self.calls.push(spec.clone());
            match self.fail {
                Some((mode, level)) => {
                    !(spec.line.contains(&format!("mongodb.run:{} ", mode))
                        && spec.line.contains(&format!(" -c {} ", level)))
                }
                None => true,
            }
        }
    }

    fn cfg() -> HarnessConfig {
        HarnessConfig {
            catalog: Vec::new(),
            ..HarnessConfig::default()
        }
    }

    #[test]
    fn failure_stops_only_the_current_plan() {
        let cfg = cfg();
        let catalog = vec![
            Plan::new("counters", "none", 4, 120),
            Plan::new("writes", "w=1", 3, 60),
        ];
        let runner = Scripted { calls: Vec::new(), fail: Some(("counters", 2)) };
        let mut ladder = Ladder::new(&cfg, runner, None::<Vec<u8>>);

        let reports = ladder.run_all(&catalog);

        assert_eq!(reports[0].attempted, vec![1, 2]);
        assert_eq!(reports[0].failed_at, Some(2));
        assert_eq!(reports[1].attempted, vec![1, 2, 4]);
        assert!(reports[1].completed());
        assert_eq!(ladder.into_parts().0.calls.len(), 5);
    }

    #[test]
    fn pre_set_shutdown_runs_nothing() {
        let cfg = cfg();
        let flag = AtomicBool::new(true);
        let runner = Scripted { calls: Vec::new(), fail: None };
        let mut ladder = Ladder::new(&cfg, runner, None::<Vec<u8>>).with_shutdown(&flag);

        let report = ladder.run(&Plan::new("writes", "w=1", 3, 60));

        assert!(report.attempted.is_empty());
        assert!(report.interrupted);
        assert!(ladder.into_parts().0.calls.is_empty());
    }
}
