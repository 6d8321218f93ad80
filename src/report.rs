// KNOCK-LADDER REPORT SUMMARY
// TURNS knock'S FREE-TEXT "label: value[μs]" REPORT INTO TWO CSV LINES:
//   Time,Tput,Efcy,Min,Max,Mean,0.05,0.95,0.99
//   60.0123,1234.5,98.2,...
//
// TWO STAGES: A SYNTACTIC LINE MATCHER, THEN A STATIC LABEL TABLE.
// ANYTHING THAT DOESN'T MATCH (HEADERS, SETUP LINES, HISTOGRAM ROWS) IS
// SKIPPED WITHOUT COMPLAINT.

use std::io::{self, BufRead};
use std::sync::OnceLock;

use regex::Regex;

// WHAT TO DO WITH A RAW LABEL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Canon {
    Rename(&'static str),
    Drop,
}

// TIED TO knock'S EXACT WORDING. IF THE TOOL REPHRASES A LABEL THE COLUMN
// SILENTLY FALLS BACK TO THE RAW TEXT; RE-CHECK AGAINST A FRESH REPORT
// WHEN UPGRADING knock.
pub const LABEL_TABLE: &[(&str, Canon)] = &[
    ("Run Time (s)", Canon::Rename("Time")),
    ("Throughput (ops/sec)", Canon::Rename("Tput")),
    // DUPLICATES THE PERCENTILE DATA
    ("Mean Response Time (\u{03bc}s)", Canon::Drop),
    ("Mean Response Time (\u{00b5}s)", Canon::Drop),
    ("Load Efficiency (%)", Canon::Rename("Efcy")),
    ("5th Percentile", Canon::Rename("0.05")),
    ("95th Percentile", Canon::Rename("0.95")),
    ("99th Percentile", Canon::Rename("0.99")),
];

pub fn canonical(label: &str) -> Option<&str> {
    match LABEL_TABLE.iter().find(|(raw, _)| *raw == label) {
        Some((_, Canon::Rename(name))) => Some(*name),
        Some((_, Canon::Drop)) => None,
        None => Some(label),
    }
}

fn line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // LABEL IS GREEDY: "a: b: 3" GIVES LABEL "a: b". UNIT ACCEPTS GREEK MU
    // AND THE LEGACY MICRO SIGN.
    RE.get_or_init(|| {
        Regex::new(r"^\s*(.*):\s*(\d+(?:\.\d+)?)(?:[\x{03bc}\x{00b5}]s)?$")
            .expect("static report regex")
    })
}

// STAGE 1: SYNTAX ONLY. RETURNS (RAW LABEL, VALUE).
pub fn match_line(raw: &str) -> Option<(&str, f64)> {
    let caps = line_re().captures(raw)?;
    let label = caps.get(1)?.as_str();
    let value = caps.get(2)?.as_str().parse::<f64>().ok()?;
    Some((label, value))
}

// ORDERED KEY -> VALUE. FIRST SIGHTING FIXES THE COLUMN, LATER SIGHTINGS
// REFRESH THE VALUE IN PLACE.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    entries: Vec<(String, f64)>,
}

impl Summary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: &str, value: f64) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // ONE REPORT LINE THROUGH BOTH STAGES
    pub fn feed(&mut self, line: &str) {
        let cleaned: String = line.chars().filter(|&c| c != '\t').collect();
        let Some((label, value)) = match_line(cleaned.trim()) else {
            return;
        };
        if let Some(key) = canonical(label) {
            self.record(key, value);
        }
    }

    pub fn header(&self) -> String {
        self.entries
            .iter()
            .map(|(k, _)| k.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn values(&self) -> String {
        self.entries
            .iter()
            .map(|(_, v)| render(*v))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn to_csv(&self) -> String {
        format!("{}\n{}\n", self.header(), self.values())
    }

    // BYTES THAT AREN'T UTF-8 ARE REPLACED, SO A BINARY LINE JUST FAILS TO MATCH
    pub fn feed_reader<R: BufRead>(&mut self, mut reader: R) -> io::Result<()> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => return Ok(()),
                Ok(_) => self.feed(&String::from_utf8_lossy(&buf)),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

// FIXED NOTATION, NEVER EXPONENTS. WHOLE NUMBERS KEEP ONE DECIMAL (300 -> 300.0)
fn render(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

pub fn summarize<R: BufRead>(reader: R) -> io::Result<Summary> {
    let mut summary = Summary::new();
    summary.feed_reader(reader)?;
    Ok(summary)
}
