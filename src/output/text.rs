//! Human-readable text output

use crate::bench::RunResult;
use crate::config::{BenchConfig, Mode};
use crate::dataset::{class_labels, ImageRecord};
use crate::util::time::{calculate_rate, format_rate};
use crate::util::verification::VerificationReport;

const RULE: &str = "═══════════════════════════════════════════════════════════";
const THIN_RULE: &str = "───────────────────────────────────────────────────────────";

/// Print the banner shown before any work starts
pub fn print_header(title: &str, config: &BenchConfig, images: &[ImageRecord]) {
    let classes = class_labels(images);

    println!("{}", RULE);
    println!("{:^59}", title);
    println!("{}", RULE);
    println!("Available CPU cores: {}", num_cpus::get());
    println!("{}", config);
    println!(
        "Found {} image(s) in {} class folder(s): {}",
        format_number(images.len() as u64),
        classes.len(),
        classes.join(", ")
    );
    println!("{}", RULE);
    println!();
}

/// Print the result line of one configuration
pub fn print_run(result: &RunResult) {
    println!("{}", format_run_line(result));
    if !result.nodes.is_empty() {
        for node in &result.nodes {
            println!(
                "  Node {} processed {} image(s) in {:.1}s",
                node.node_id,
                node.succeeded,
                node.elapsed.as_secs_f64()
            );
        }
    }
}

/// Print the performance table and summary for all configurations
pub fn print_results(results: &[RunResult]) {
    println!();
    println!("{}", RULE);
    println!("                 PERFORMANCE ANALYSIS");
    println!("{}", RULE);
    print!("{}", format_performance_table(results));
    println!("{}", RULE);

    if let Some(summary) = format_summary(results) {
        println!();
        print!("{}", summary);
        println!("{}", RULE);
    }

    print_latency(results);
}

fn print_latency(results: &[RunResult]) {
    if results.iter().all(|r| r.latency.count == 0) {
        return;
    }

    println!();
    println!("Per-image latency (ms) and worker utilisation:");
    println!("{}", format_latency_header());
    for r in results {
        println!("{}", format_latency_row(r));
    }
    println!();
}

fn format_latency_header() -> String {
    format!(
        "  {:<28} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "Run", "Min", "Mean", "p50", "p99", "Max", "Util"
    )
}

/// One run's latency percentiles and the share of worker time spent busy
pub fn format_latency_row(result: &RunResult) -> String {
    let l = &result.latency;
    format!(
        "  {:<28} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
        result.run_config().to_string(),
        format_ms(l.min_ms),
        format_ms(l.mean_ms),
        format_ms(l.p50_ms),
        format_ms(l.p99_ms),
        format_ms(l.max_ms),
        format_efficiency(result.utilisation)
    )
}

/// Print the outcome of `--verify`
pub fn print_verification(report: &VerificationReport) {
    println!("Verification:");
    println!("  Checked:  {}", format_number(report.checked as u64));
    println!("  Failures: {}", format_number(report.failures.len() as u64));
    for failure in &report.failures {
        println!("    {}", failure);
    }
    println!();
}

/// "Completed: 94 of 95 images succeeded in 1.23s (77.1 images/s)"
pub fn format_run_line(result: &RunResult) -> String {
    format!(
        "Completed: {} of {} images succeeded in {:.2}s ({} images/s)",
        result.succeeded,
        result.total,
        result.elapsed.as_secs_f64(),
        format_rate(calculate_rate(result.succeeded, result.elapsed))
    )
}

/// Workers | Time | Speedup | Efficiency table
pub fn format_performance_table(results: &[RunResult]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<10} | {:<10} | {:<10} | {:<10}\n",
        "Workers", "Time (s)", "Speedup", "Efficiency"
    ));
    out.push_str(THIN_RULE);
    out.push('\n');

    for r in results {
        out.push_str(&format!(
            "{:<10} | {:<10.2} | {:<10} | {:<10}\n",
            format_workers(r),
            r.elapsed.as_secs_f64(),
            format_speedup(r.speedup),
            format_efficiency(r.efficiency)
        ));
    }

    for r in results.iter().filter(|r| r.node_overlap.is_some()) {
        out.push_str(&format!(
            "Node overlap: {:.2}x (sum of node times / total time)\n",
            r.node_overlap.unwrap_or_default()
        ));
    }
    out
}

/// Base time, best time and maximum speedup; None without a baseline
pub fn format_summary(results: &[RunResult]) -> Option<String> {
    let base = results.iter().find(|r| r.speedup.is_some())?;
    let baseline = base.elapsed.as_secs_f64() * base.speedup?;
    let best = results
        .iter()
        .filter(|r| !r.elapsed.is_zero())
        .min_by(|a, b| a.elapsed.cmp(&b.elapsed))?;
    let max_speedup = results
        .iter()
        .filter_map(|r| r.speedup)
        .fold(f64::NAN, f64::max);

    Some(format!(
        "Key metrics:\n\
         - Base time (1 worker): {:.2}s\n\
         - Best time ({}): {:.2}s\n\
         - Maximum speedup achieved: {:.2}x\n",
        baseline,
        best.run_config(),
        best.elapsed.as_secs_f64(),
        max_speedup
    ))
}

fn format_workers(result: &RunResult) -> String {
    match result.mode {
        Mode::Distributed => format!("{}x{}", crate::config::SIMULATED_NODES, result.workers),
        Mode::Sequential | Mode::Pooled => result.workers.to_string(),
    }
}

fn format_speedup(speedup: Option<f64>) -> String {
    match speedup {
        Some(s) => format!("{:.2}x", s),
        None => "-".to_string(),
    }
}

fn format_efficiency(efficiency: Option<f64>) -> String {
    match efficiency {
        Some(e) => format!("{:.2}%", e * 100.0),
        None => "-".to_string(),
    }
}

fn format_ms(ms: Option<f64>) -> String {
    match ms {
        Some(ms) => format!("{:.2}", ms),
        None => "-".to_string(),
    }
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();

    for (count, c) in s.chars().rev().enumerate() {
        if count > 0 && count % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bench::derive_speedups;
    use crate::stats::histogram::LatencySummary;
    use crate::worker::NodeReport;
    use std::time::Duration;

    fn result(mode: Mode, workers: usize, secs: f64) -> RunResult {
        let run = crate::config::RunConfig { mode, workers };
        RunResult {
            mode,
            workers,
            total_workers: run.total_workers(),
            elapsed: Duration::from_secs_f64(secs),
            succeeded: 94,
            failed: 1,
            total: 95,
            speedup: None,
            efficiency: None,
            latency: LatencySummary::default(),
            busy: Duration::ZERO,
            utilisation: None,
            failures: Vec::new(),
            nodes: Vec::new(),
            node_overlap: None,
        }
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1_000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn test_run_line() {
        let line = format_run_line(&result(Mode::Pooled, 2, 2.0));
        assert_eq!(line, "Completed: 94 of 95 images succeeded in 2.00s (47.0 images/s)");
    }

    #[test]
    fn test_table() {
        let mut results = vec![result(Mode::Pooled, 1, 1.0), result(Mode::Pooled, 2, 0.5)];
        derive_speedups(&mut results, None);

        let table = format_performance_table(&results);
        let lines: Vec<_> = table.lines().collect();
        assert!(lines[0].starts_with("Workers"));
        assert!(lines[2].contains("1.00x") && lines[2].contains("100.00%"));
        assert!(lines[3].starts_with("2 ") && lines[3].contains("2.00x"));
    }

    #[test]
    fn test_table_without_baseline() {
        let mut r = result(Mode::Distributed, 1, 2.0);
        r.nodes = vec![
            NodeReport { node_id: 1, assigned: 48, succeeded: 48, failed: 0, elapsed: Duration::from_secs(2) },
            NodeReport { node_id: 2, assigned: 47, succeeded: 46, failed: 1, elapsed: Duration::from_secs(2) },
        ];
        r.node_overlap = Some(2.0);

        let table = format_performance_table(&[r.clone()]);
        assert!(table.contains("2x1"));
        assert!(table.contains(" - "));
        assert!(table.contains("Node overlap: 2.00x"));
        assert!(format_summary(&[r]).is_none());
    }

    #[test]
    fn test_latency_row_shows_utilisation() {
        let mut r = result(Mode::Pooled, 4, 1.0);
        r.utilisation = Some(0.875);
        let row = format_latency_row(&r);
        assert!(row.contains("pooled (4 worker(s))"));
        assert!(row.trim_end().ends_with("87.50%"));
        assert!(format_latency_header().trim_end().ends_with("Util"));
    }

    #[test]
    fn test_summary() {
        let mut results = vec![
            result(Mode::Pooled, 1, 4.0),
            result(Mode::Pooled, 2, 2.0),
            result(Mode::Pooled, 4, 1.6),
        ];
        derive_speedups(&mut results, None);

        let summary = format_summary(&results).unwrap();
        assert!(summary.contains("Base time (1 worker): 4.00s"));
        assert!(summary.contains("Best time (pooled (4 worker(s))): 1.60s"));
        assert!(summary.contains("Maximum speedup achieved: 2.50x"));
    }
}
