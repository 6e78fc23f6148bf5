use crate::error::ScrapeError;
use crate::jdi::config::County;
use crate::jdi::naming::is_csv_name;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

/// One (county, date) unit of work. Identity is (slug, date).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeTarget {
    pub display_name: String,
    pub slug: String,
    pub date: NaiveDate,
}

impl ScrapeTarget {
    pub fn date_str(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// Directory owned by this target. Existence alone does not mean the
    /// target is satisfied; only a CSV artifact inside it does.
    pub fn directory(&self, output_root: &Path) -> PathBuf {
        output_root
            .join(self.display_name.to_lowercase())
            .join(self.date_str())
    }

    /// The portal takes the case-sensitive display name, not the slug.
    pub fn roster_url(&self, endpoint: &str, state_code: &str) -> String {
        format!(
            "{endpoint}?state={state_code}&jail={}&date={}",
            self.display_name,
            self.date_str()
        )
    }
}

/// What processing one target came to. A failed target never stops the
/// run; timeouts are kept apart from other failures for reporting.
#[derive(Debug)]
pub enum TargetOutcome {
    Skipped,
    Success { artifacts: Vec<PathBuf> },
    TimedOut(ScrapeError),
    Failed(ScrapeError),
}

impl TargetOutcome {
    pub fn from_error(err: ScrapeError) -> Self {
        if err.is_timeout() {
            Self::TimedOut(err)
        } else {
            Self::Failed(err)
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::Success { .. } => "success",
            Self::TimedOut(_) => "timed_out",
            Self::Failed(_) => "failed",
        }
    }
}

/// Lazy county-major, date-minor enumeration over the inclusive range.
pub fn enumerate_targets(
    counties: &[County],
    start: NaiveDate,
    end: NaiveDate,
) -> impl Iterator<Item = ScrapeTarget> + '_ {
    counties.iter().flat_map(move |county| {
        start
            .iter_days()
            .take_while(move |d| *d <= end)
            .map(move |date| ScrapeTarget {
                display_name: county.name.clone(),
                slug: county.slug.clone(),
                date,
            })
    })
}

pub fn target_count(counties: &[County], start: NaiveDate, end: NaiveDate) -> usize {
    let days = (end - start).num_days();
    if days < 0 {
        return 0;
    }
    counties.len() * (days as usize + 1)
}

/// Target Resolver: a target is satisfied iff its directory holds at least
/// one top-level CSV file. Runs before any browser work and is the sole
/// resumability check, so an interrupted run skips finished targets.
pub fn is_satisfied(target_dir: &Path) -> bool {
    let Ok(entries) = fs::read_dir(target_dir) else {
        return false;
    };
    entries.flatten().any(|entry| {
        entry.path().is_file()
            && entry
                .file_name()
                .to_str()
                .is_some_and(is_csv_name)
    })
}
