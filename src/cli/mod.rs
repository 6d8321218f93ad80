pub mod catalog;
pub mod check;
pub mod escalate;
pub mod summarize;
