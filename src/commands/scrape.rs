use crate::commands::CommandReport;
use crate::jdi::config::{JdiConfig, load_config};
use crate::jdi::observer::{ConsoleObserver, NullObserver, ScrapeObserver, format_elapsed};
use crate::jdi::orchestrator::{Orchestrator, RunSummary};
use crate::jdi::paths::resolve_paths;
use crate::jdi::session::Credentials;
use crate::jdi::target::TargetOutcome;
use crate::webdriver::client::WebDriverClient;
use crate::webdriver::driver::ChromeDriver;
use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Args)]
pub struct ScrapeOptions {
    /// First roster date (YYYY-MM-DD); overrides the configured start
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Last roster date, inclusive (YYYY-MM-DD); overrides the configured end
    #[arg(long)]
    pub end_date: Option<NaiveDate>,

    /// Restrict the run to these county slugs (repeatable)
    #[arg(long = "county", value_name = "SLUG")]
    pub counties: Vec<String>,

    /// Explicit config file path
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Suppress per-target progress output; the final report still prints
    #[arg(long)]
    pub quiet: bool,
}

/// CLI overrides land on top of file + env config; the county filter keeps
/// the configured order.
fn apply_overrides(cfg: &mut JdiConfig, opts: &ScrapeOptions) {
    if let Some(start) = opts.start_date {
        cfg.start_date = start;
    }
    if let Some(end) = opts.end_date {
        cfg.end_date = end;
    }
    if !opts.counties.is_empty() {
        cfg.counties.retain(|county| {
            opts.counties
                .iter()
                .any(|slug| slug.eq_ignore_ascii_case(&county.slug))
        });
    }
}

fn summarize(report: &mut CommandReport, summary: &RunSummary) {
    report.detail(format!("targets={}", summary.targets.len()));
    report.detail(format!("skipped={}", summary.skipped));
    report.detail(format!("succeeded={}", summary.succeeded));
    report.detail(format!("timed_out={}", summary.timed_out));
    report.detail(format!("failed={}", summary.failed));
    report.detail(format!("artifacts={}", summary.artifacts));
    report.detail(format!("elapsed={}", format_elapsed(summary.elapsed)));

    for target in &summary.targets {
        match &target.outcome {
            TargetOutcome::TimedOut(err) | TargetOutcome::Failed(err) => {
                report.issue(format!("{}/{}: {err}", target.county_slug, target.date));
            }
            TargetOutcome::Skipped | TargetOutcome::Success { .. } => {}
        }
    }
}

pub fn run(opts: &ScrapeOptions) -> Result<CommandReport> {
    let mut report = CommandReport::new("scrape");

    let mut cfg = load_config(opts.config.as_ref())?;
    apply_overrides(&mut cfg, opts);
    if cfg.counties.is_empty() {
        report.issue("no configured county matches the --county filter");
        return Ok(report);
    }
    if cfg.start_date > cfg.end_date {
        report.issue(format!(
            "invalid date range: start {} is after end {}",
            cfg.start_date, cfg.end_date
        ));
        return Ok(report);
    }

    let credentials = Credentials::from_env()?;
    let paths = resolve_paths()?;
    report.detail(format!("output_root={}", paths.output_root.display()));
    report.detail(format!(
        "date_range={}..{}",
        cfg.start_date, cfg.end_date
    ));
    report.detail(format!("counties={}", cfg.counties.len()));

    let driver = ChromeDriver::spawn(&cfg.webdriver)?;
    let session = WebDriverClient::new_session(driver.base_url(), &cfg.webdriver)?;
    let mut orchestrator = Orchestrator::new(&cfg, &paths, session);

    let mut console = ConsoleObserver;
    let mut null = NullObserver;
    let observer: &mut dyn ScrapeObserver = if opts.quiet { &mut null } else { &mut console };
    let summary = orchestrator.run(&credentials, observer)?;

    summarize(&mut report, &summary);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScrapeError;
    use crate::jdi::config::County;
    use std::time::Duration;

    fn options(counties: &[&str]) -> ScrapeOptions {
        ScrapeOptions {
            counties: counties.iter().map(|s| s.to_string()).collect(),
            ..ScrapeOptions::default()
        }
    }

    #[test]
    fn county_filter_keeps_configured_order() {
        let mut cfg = JdiConfig::default();
        apply_overrides(&mut cfg, &options(&["tulsa", "atoka"]));
        let slugs: Vec<&str> = cfg.counties.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(slugs, vec!["atoka", "tulsa"]);
    }

    #[test]
    fn county_filter_is_case_insensitive() {
        let mut cfg = JdiConfig::default();
        apply_overrides(&mut cfg, &options(&["TULSA"]));
        assert_eq!(cfg.counties, vec![County::new("Tulsa", "tulsa")]);
    }

    #[test]
    fn unknown_slug_filters_everything_out() {
        let mut cfg = JdiConfig::default();
        apply_overrides(&mut cfg, &options(&["nowhere"]));
        assert!(cfg.counties.is_empty());
    }

    #[test]
    fn date_overrides_replace_config_values() {
        let mut cfg = JdiConfig::default();
        let opts = ScrapeOptions {
            start_date: NaiveDate::from_ymd_opt(2025, 6, 1),
            end_date: NaiveDate::from_ymd_opt(2025, 6, 30),
            ..ScrapeOptions::default()
        };
        apply_overrides(&mut cfg, &opts);
        assert_eq!(cfg.start_date, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        assert_eq!(cfg.end_date, NaiveDate::from_ymd_opt(2025, 6, 30).unwrap());
    }

    #[test]
    fn failed_targets_become_report_issues() {
        let mut report = CommandReport::new("scrape");
        let mut summary = RunSummary::default();
        summary.failed = 1;
        summary.targets.push(crate::jdi::orchestrator::TargetReport {
            county_slug: "tulsa".to_string(),
            date: "2025-06-01".to_string(),
            outcome: TargetOutcome::Failed(ScrapeError::DownloadTimedOut(Duration::from_secs(
                60,
            ))),
        });

        summarize(&mut report, &summary);
        assert!(!report.ok);
        assert!(report.issues[0].starts_with("tulsa/2025-06-01:"));
    }
}
