use crate::error::ScrapeError;
use crate::jdi::config::JdiConfig;
use crate::jdi::detect::DownloadDetector;
use crate::jdi::login;
use crate::jdi::observer::ScrapeObserver;
use crate::jdi::paths::JdiPaths;
use crate::jdi::session::{BrowserSession, Credentials, Locator};
use crate::jdi::target::{ScrapeTarget, TargetOutcome, enumerate_targets, is_satisfied, target_count};
use crate::jdi::unpack::extract_archive;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

const DOWNLOAD_TRIGGER: &str = "//button[contains(., 'Original CSV')]";

#[derive(Debug)]
pub struct TargetReport {
    pub county_slug: String,
    pub date: String,
    pub outcome: TargetOutcome,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub targets: Vec<TargetReport>,
    pub skipped: usize,
    pub succeeded: usize,
    pub timed_out: usize,
    pub failed: usize,
    pub artifacts: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    fn record(&mut self, target: &ScrapeTarget, outcome: TargetOutcome) {
        match &outcome {
            TargetOutcome::Skipped => self.skipped += 1,
            TargetOutcome::Success { artifacts } => {
                self.succeeded += 1;
                self.artifacts += artifacts.len();
            }
            TargetOutcome::TimedOut(_) => self.timed_out += 1,
            TargetOutcome::Failed(_) => self.failed += 1,
        }
        self.targets.push(TargetReport {
            county_slug: target.slug.clone(),
            date: target.date_str(),
            outcome,
        });
    }

    pub fn attempted(&self) -> usize {
        self.succeeded + self.timed_out + self.failed
    }
}

#[derive(Debug, Serialize)]
struct RunEvent<'a> {
    at_epoch_secs: u64,
    county: &'a str,
    date: &'a str,
    status: &'a str,
    message: String,
}

fn now_epoch_secs() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock is before UNIX_EPOCH")?
        .as_secs())
}

fn append_run_event(
    run_log: &Path,
    target: &ScrapeTarget,
    outcome: &TargetOutcome,
) -> Result<()> {
    if let Some(parent) = run_log.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let message = match outcome {
        TargetOutcome::Skipped => "files already exist".to_string(),
        TargetOutcome::Success { artifacts } => format!("{} artifact(s)", artifacts.len()),
        TargetOutcome::TimedOut(err) | TargetOutcome::Failed(err) => err.to_string(),
    };
    let date = target.date_str();
    let event = RunEvent {
        at_epoch_secs: now_epoch_secs()?,
        county: &target.slug,
        date: &date,
        status: outcome.label(),
        message,
    };

    let line = format!("{}\n", serde_json::to_string(&event)?);
    use std::io::Write;
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(run_log)
        .with_context(|| format!("failed to open {}", run_log.display()))?;
    file.write_all(line.as_bytes())?;
    Ok(())
}

fn io_err(path: &Path, err: impl std::fmt::Display) -> ScrapeError {
    ScrapeError::Io(format!("{}: {err}", path.display()))
}

/// Drives the full target set through one browser session, strictly one
/// target at a time. Only authentication failure aborts the run; every
/// other error is recorded against its target and the run moves on.
pub struct Orchestrator<'cfg, S: BrowserSession> {
    config: &'cfg JdiConfig,
    output_root: PathBuf,
    run_log: PathBuf,
    session: S,
}

impl<'cfg, S: BrowserSession> Orchestrator<'cfg, S> {
    pub fn new(config: &'cfg JdiConfig, paths: &JdiPaths, session: S) -> Self {
        Self {
            config,
            output_root: paths.output_root.clone(),
            run_log: paths.run_log.clone(),
            session,
        }
    }

    fn trigger_wait(&self) -> Duration {
        Duration::from_secs(self.config.waits.trigger_wait_secs)
    }

    fn detector(&self) -> DownloadDetector {
        DownloadDetector::new(
            Duration::from_secs(self.config.waits.download_timeout_secs),
            Duration::from_millis(self.config.waits.poll_interval_millis),
        )
    }

    /// Single download attempt for one unsatisfied target. The skip check
    /// has already happened; everything here is fallible per-target work.
    fn fetch_target(
        &mut self,
        target: &ScrapeTarget,
        target_dir: &Path,
    ) -> Result<Vec<PathBuf>, ScrapeError> {
        fs::create_dir_all(target_dir).map_err(|err| io_err(target_dir, err))?;

        self.session
            .configure_download_dir(target_dir)
            .map_err(|err| ScrapeError::Session(err.to_string()))?;

        let url = target.roster_url(&self.config.roster_endpoint, &self.config.state_code);
        self.session
            .navigate(&url)
            .map_err(|err| ScrapeError::Session(err.to_string()))?;

        self.session
            .click_when_actionable(&Locator::xpath(DOWNLOAD_TRIGGER), self.trigger_wait())
            .map_err(|err| {
                if err.is_element_timeout() {
                    ScrapeError::NoDownloadTrigger(err.to_string())
                } else {
                    ScrapeError::Session(err.to_string())
                }
            })?;

        let archive = self.detector().await_completion(target_dir)?;
        let artifacts = extract_archive(&archive, target_dir, &target.slug, target.date)?;

        if self.config.cleanup_archives {
            // Best effort; a leftover archive never fails a target.
            let _ = fs::remove_file(&archive);
        }

        Ok(artifacts)
    }

    fn process_target(
        &mut self,
        target: &ScrapeTarget,
        observer: &mut dyn ScrapeObserver,
    ) -> TargetOutcome {
        let target_dir = target.directory(&self.output_root);
        if is_satisfied(&target_dir) {
            return TargetOutcome::Skipped;
        }

        observer.target_started(target);
        match self.fetch_target(target, &target_dir) {
            Ok(artifacts) => TargetOutcome::Success { artifacts },
            Err(err) => TargetOutcome::from_error(err),
        }
    }

    pub fn run(
        &mut self,
        credentials: &Credentials,
        observer: &mut dyn ScrapeObserver,
    ) -> Result<RunSummary> {
        let cfg = self.config;
        let started = Instant::now();
        observer.run_started(target_count(&cfg.counties, cfg.start_date, cfg.end_date));

        let wait = self.trigger_wait();
        login::login(&mut self.session, &cfg.portal_url, credentials, wait)?;

        let mut summary = RunSummary::default();
        for target in enumerate_targets(&cfg.counties, cfg.start_date, cfg.end_date) {
            let outcome = self.process_target(&target, observer);
            observer.target_finished(&target, &outcome);
            append_run_event(&self.run_log, &target, &outcome)?;
            summary.record(&target, outcome);
        }

        summary.elapsed = started.elapsed();
        observer.run_finished(summary.elapsed);
        Ok(summary)
    }
}
