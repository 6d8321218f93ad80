// KNOCK-LADDER LIBRARY
// PURE PLAN/COMMAND/REPORT LOGIC PLUS THE PTY RUNNER AND LADDER.
// SHARED BETWEEN THE BINARY (main.rs, cli/) AND THE INTEGRATION TESTS.

pub mod command;
pub mod config;
pub mod ladder;
pub mod plan;
pub mod pty;
pub mod report;
pub mod runner;
