//! `matchload run`

use super::output::{print_success, print_summary};
use crate::cli::RunArgs;
use anyhow::{Context, Result};
use matchload_config::MatchloadConfig;
use matchload_core::Roster;
use matchload_engine::{LoadRunner, RunSummary};
use std::sync::Arc;
use tracing::{info, warn};

/// Exit code reported when any threshold fails
pub const THRESHOLD_FAILURE_EXIT_CODE: i32 = 99;

/// Execute a load test and return the process exit code
pub async fn execute(mut config: MatchloadConfig, args: &RunArgs) -> Result<i32> {
    args.apply(&mut config);
    config
        .validate_all()
        .context("Invalid configuration after command-line overrides")?;

    let roster = Roster::load(&config.roster.path)
        .with_context(|| format!("Failed to load roster from {:?}", config.roster.path))?;
    let (male, female) = roster.gender_split();
    info!(
        "Target {} with {} virtual users, roster of {} ({} male, {} female)",
        config.target.base_url,
        config.load.population,
        roster.len(),
        male,
        female
    );

    let runner = LoadRunner::from_config(&config, Arc::new(roster))
        .context("Failed to set up the load runner")?;

    let coordinator = runner.coordinator();
    let interrupts = tokio::spawn(async move {
        if let Err(e) = coordinator.escalate_on_ctrl_c().await {
            warn!("Interrupt handling stopped: {}", e);
        }
    });

    let summary = runner.run().await;
    interrupts.abort();
    let summary = summary.context("Load run failed")?;

    report(&summary, args)?;
    Ok(exit_code(&summary))
}

fn report(summary: &RunSummary, args: &RunArgs) -> Result<()> {
    print_summary(summary);

    if let Some(path) = &args.summary_export {
        summary
            .export_json(path)
            .with_context(|| format!("Failed to export summary to {:?}", path))?;
        print_success(&format!("Summary written to {:?}", path));
    }
    Ok(())
}

pub fn exit_code(summary: &RunSummary) -> i32 {
    if summary.passed() {
        0
    } else {
        THRESHOLD_FAILURE_EXIT_CODE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matchload_config::ThresholdsConfig;
    use matchload_core::{Endpoint, MetricsAggregator, RateMetric};
    use matchload_engine::ThresholdReport;
    use std::path::PathBuf;
    use std::time::Duration;

    fn summary(success_hits: usize) -> RunSummary {
        let metrics = MetricsAggregator::new().unwrap();
        for i in 0..10 {
            metrics.record_rate(RateMetric::MatchSuccess, i < success_hits);
        }
        metrics.record_request(Endpoint::Join, Duration::from_millis(15), false);
        let snapshot = metrics.snapshot();

        RunSummary {
            started_at: chrono::Utc::now(),
            elapsed_ms: 1_000,
            population: 1,
            slots_started: 1,
            slots_interrupted: 0,
            total_cycles: 10,
            thresholds: ThresholdReport::evaluate(&snapshot, &ThresholdsConfig::default()),
            metrics: snapshot,
        }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&summary(10)), 0);
        assert_eq!(exit_code(&summary(5)), THRESHOLD_FAILURE_EXIT_CODE);
    }

    #[tokio::test]
    async fn test_missing_roster_fails_before_running() {
        let args = RunArgs {
            roster: Some(PathBuf::from("/nonexistent/users.json")),
            ..Default::default()
        };

        let error = execute(MatchloadConfig::default(), &args).await.unwrap_err();
        assert!(error.to_string().contains("Failed to load roster"));
    }

    #[tokio::test]
    async fn test_invalid_override_rejected() {
        let args = RunArgs {
            vus: Some(0),
            ..Default::default()
        };

        let error = execute(MatchloadConfig::default(), &args).await.unwrap_err();
        assert!(error.to_string().contains("Invalid configuration"));
    }
}
