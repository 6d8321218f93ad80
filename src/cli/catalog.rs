use knock_ladder::command;
use knock_ladder::config::HarnessConfig;

pub fn run_catalog(cfg: &HarnessConfig) {
    println!("{:<4} {:<10} {:<8} {:<8} {:>6}  LADDER",
             "#", "MODE", "WC", "SUFFIX", "SECS");
    println!("{}", "-".repeat(72));
    for (i, plan) in cfg.catalog.iter().enumerate() {
        let ladder: Vec<String> = plan.levels().map(|l| l.to_string()).collect();
        println!("{:<4} {:<10} {:<8} {:<8} {:>6}  {}",
                 i + 1, plan.mode, plan.write_concern, plan.suffix(),
                 plan.duration_secs,
                 if ladder.is_empty() { "-".to_string() } else { ladder.join(",") });
        if let Some(first) = plan.levels().next() {
            println!("     -> {}", command::output_path(cfg, plan, first).display());
        }
        if !plan.extra_props.is_empty() {
            println!("     {}", plan.extra_props);
        }
    }
    println!();
    println!("TOTAL STEPS:     {}", cfg.total_steps());
    println!("WORST CASE:      {}s", cfg.worst_case_secs());
}
