use crate::jdi::target::{ScrapeTarget, TargetOutcome};
use std::time::Duration;

/// Progress reporting is pluggable so the pipeline has exactly one code
/// path whether it runs quietly, with console output, or under test.
pub trait ScrapeObserver {
    fn run_started(&mut self, total_targets: usize);
    fn target_started(&mut self, target: &ScrapeTarget);
    fn target_finished(&mut self, target: &ScrapeTarget, outcome: &TargetOutcome);
    fn run_finished(&mut self, elapsed: Duration);
}

pub struct NullObserver;

impl ScrapeObserver for NullObserver {
    fn run_started(&mut self, _total_targets: usize) {}
    fn target_started(&mut self, _target: &ScrapeTarget) {}
    fn target_finished(&mut self, _target: &ScrapeTarget, _outcome: &TargetOutcome) {}
    fn run_finished(&mut self, _elapsed: Duration) {}
}

pub struct ConsoleObserver;

const BANNER: &str = "======================================================";

pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    format!(
        "{:02} hours, {:02} minutes, {:02} seconds",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

impl ScrapeObserver for ConsoleObserver {
    fn run_started(&mut self, total_targets: usize) {
        println!("{BANNER}\nBeginning new scrape ({total_targets} targets)\n{BANNER}");
    }

    fn target_started(&mut self, target: &ScrapeTarget) {
        println!(
            "\nChecking roster for county: {} and date: {}...",
            target.display_name,
            target.date_str()
        );
    }

    fn target_finished(&mut self, target: &ScrapeTarget, outcome: &TargetOutcome) {
        match outcome {
            TargetOutcome::Skipped => {
                println!(
                    " --- Skipping {}: files already exist.",
                    target.date_str()
                );
            }
            TargetOutcome::Success { artifacts } => {
                println!("Extracted {} file(s).", artifacts.len());
            }
            TargetOutcome::TimedOut(err) | TargetOutcome::Failed(err) => {
                println!("Error: {err}");
            }
        }
    }

    fn run_finished(&mut self, elapsed: Duration) {
        println!(
            "{BANNER}\nScrape completed! Total time: {}\n{BANNER}",
            format_elapsed(elapsed)
        );
    }
}
