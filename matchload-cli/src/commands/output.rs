//! Terminal output helpers

use colored::*;
use matchload_engine::RunSummary;

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".bright_green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".bright_red().bold(), message.bright_red());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".bright_yellow().bold(), message.bright_yellow());
}

/// Print the run report with coloured threshold verdicts
pub fn print_summary(summary: &RunSummary) {
    println!();
    for line in summary.to_string().lines() {
        println!("{}", colorize_report_line(line));
    }

    let failed = summary.thresholds.failures().count();
    if failed == 0 {
        print_success("All thresholds passed");
    } else {
        print_error(&format!(
            "{} of {} thresholds failed",
            failed,
            summary.thresholds.checks.len()
        ));
    }
}

fn colorize_report_line(line: &str) -> String {
    let trimmed = line.trim_start();
    if trimmed.starts_with("[PASS]") {
        line.bright_green().to_string()
    } else if trimmed.starts_with("[FAIL]") {
        line.bright_red().to_string()
    } else if !line.starts_with(' ') && !line.is_empty() {
        line.bold().to_string()
    } else {
        line.to_string()
    }
}
