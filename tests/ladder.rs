// KNOCK-LADDER ESCALATION TESTS
// LADDER ORDER, EARLY STOP ON FAILURE, PLAN ISOLATION, PREVIEW END TO END.
//
// A RECORDING SPAWNER REPLACES knock. NO PROCESSES ARE STARTED.

use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use knock_ladder::command::CommandSpec;
use knock_ladder::config::HarnessConfig;
use knock_ladder::ladder::Ladder;
use knock_ladder::plan::Plan;
use knock_ladder::runner::{ProcessRunner, Spawn};

#[derive(Default)]
struct Recorder {
    calls: Vec<CommandSpec>,
    // (CALL INDEX) -> FAIL
    fail_calls: HashSet<usize>,
}

impl Spawn for Recorder {
    fn spawn(&mut self, spec: &CommandSpec, _sink: Option<&mut dyn Write>) -> bool {
        let idx = self.calls.len();
        self.calls.push(spec.clone());
        !self.fail_calls.contains(&idx)
    }
}

fn cfg(out: &str) -> HarnessConfig {
    HarnessConfig {
        out_dir: PathBuf::from(out),
        catalog: Vec::new(),
        ..HarnessConfig::default()
    }
}

fn level_of(spec: &CommandSpec) -> u64 {
    let mut words = spec.line.split_whitespace();
    words.find(|w| *w == "-c");
    words.next().unwrap().parse().unwrap()
}

// === LADDER ORDER ===

#[test]
fn n_steps_issue_n_doubling_runs() {
    let cfg = cfg("/out");
    for n in 0..8u32 {
        let mut rec = Recorder::default();
        let report = Ladder::new(&cfg, &mut rec, None::<Vec<u8>>)
            .run(&Plan::new("writes", "w=1", n, 60));

        let levels: Vec<u64> = rec.calls.iter().map(level_of).collect();
        let expected: Vec<u64> = (0..n).map(|i| 1u64 << i).collect();
        assert_eq!(levels, expected);
        assert_eq!(report.attempted, expected);
        assert!(report.completed());
    }
}

#[test]
fn zero_step_plan_never_runs() {
    let cfg = cfg("/out");
    let mut rec = Recorder::default();
    let report = Ladder::new(&cfg, &mut rec, None::<Vec<u8>>)
        .run(&Plan::new("counters", "none", 0, 120));
    assert!(rec.calls.is_empty());
    assert!(report.attempted.is_empty());
}

// === EARLY STOP ===

#[test]
fn failure_at_step_i_issues_i_plus_one_runs() {
    let cfg = cfg("/out");
    for i in 0..7usize {
        let mut rec = Recorder {
            fail_calls: HashSet::from([i]),
            ..Recorder::default()
        };
        let report = Ladder::new(&cfg, &mut rec, None::<Vec<u8>>)
            .run(&Plan::new("writes", "w=0", 7, 60));

        assert_eq!(rec.calls.len(), i + 1);
        assert_eq!(report.failed_at, Some(1u64 << i));
        assert!(!report.completed());
    }
}

#[test]
fn failed_plan_does_not_stop_the_catalog() {
    let cfg = cfg("/out");
    let catalog = vec![
        Plan::new("counters", "none", 3, 120),
        Plan::new("counters", "w=1", 3, 120),
        Plan::new("writes", "w=1", 2, 60).with_suffix("-512b"),
    ];
    // FIRST RUN OF THE FIRST PLAN FAILS
    let mut rec = Recorder {
        fail_calls: HashSet::from([0]),
        ..Recorder::default()
    };

    let reports = Ladder::new(&cfg, &mut rec, None::<Vec<u8>>).run_all(&catalog);

    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0].attempted, vec![1]);
    assert_eq!(reports[1].attempted, vec![1, 2, 4]);
    assert_eq!(reports[2].attempted, vec![1, 2]);

    let paths: Vec<PathBuf> = rec.calls.iter().map(|c| c.path.clone()).collect();
    assert_eq!(
        paths,
        vec![
            PathBuf::from("/out/counters.c1-none.tsv"),
            PathBuf::from("/out/counters.c1-w1.tsv"),
            PathBuf::from("/out/counters.c2-w1.tsv"),
            PathBuf::from("/out/counters.c4-w1.tsv"),
            PathBuf::from("/out/writes.c1-w1-512b.tsv"),
            PathBuf::from("/out/writes.c2-w1-512b.tsv"),
        ]
    );
}

#[test]
fn shutdown_stops_before_the_next_plan() {
    let cfg = cfg("/out");
    let flag = AtomicBool::new(true);
    let mut rec = Recorder::default();

    let reports = Ladder::new(&cfg, &mut rec, None::<Vec<u8>>)
        .with_shutdown(&flag)
        .run_all(&[Plan::new("writes", "w=1", 3, 60)]);

    assert!(reports.is_empty());
    assert!(rec.calls.is_empty());
}

// === PREVIEW, REAL RUNNER ===

#[test]
fn preview_walks_the_whole_catalog_without_files() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = HarnessConfig {
        out_dir: dir.path().to_path_buf(),
        preview: true,
        catalog: vec![
            Plan::new("counters", "w=1", 2, 120)
                .with_extra_props("-p mongodb.database:knock_counters_w1"),
            Plan::new("writes", "w=0", 1, 60).with_suffix("-14Kb"),
        ],
        ..HarnessConfig::default()
    };

    let mut ladder = Ladder::new(&cfg, ProcessRunner::new(cfg.preview), Some(Vec::<u8>::new()));
    let reports = ladder.run_all(&cfg.catalog);
    let (_, console) = ladder.into_parts();

    assert!(reports.iter().all(|r| r.completed()));
    assert_eq!(fs_entries(&cfg.out_dir), 0);

    let text = String::from_utf8(console.unwrap()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("PLAN 1/2: counters w=1"));
    assert!(lines[1].starts_with("knock -c 1 -d 120 -v "));
    assert!(lines[1].ends_with(&format!(
        "-p mongodb.database:knock_counters_w1 > {}/counters.c1-w1.tsv",
        dir.path().display()
    )));
    assert!(lines[2].starts_with("knock -c 2 "));
    assert!(lines[3].starts_with("PLAN 2/2: writes w=0-14Kb"));
    assert!(lines[4].ends_with("/writes.c1-w0-14Kb.tsv"));
}

fn fs_entries(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}
