use crate::commands::CommandReport;
use crate::jdi::naming::is_csv_name;
use crate::jdi::paths::resolve_paths;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

#[derive(Debug, PartialEq, Eq)]
struct TargetStatus {
    county: String,
    date: String,
    artifacts: usize,
}

fn sorted_dir_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;
    for entry in entries {
        let entry = entry?;
        if entry.path().is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

fn count_artifacts(dir: &Path) -> Result<usize> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;
    let mut count = 0;
    for entry in entries {
        let entry = entry?;
        if entry.path().is_file()
            && entry.file_name().to_str().is_some_and(is_csv_name)
        {
            count += 1;
        }
    }
    Ok(count)
}

/// One row per (county, date) directory under the output root, county-major
/// then date order, matching the scrape's own iteration.
fn scan_output_root(output_root: &Path) -> Result<Vec<TargetStatus>> {
    let mut statuses = Vec::new();
    for county in sorted_dir_names(output_root)? {
        let county_dir = output_root.join(&county);
        for date in sorted_dir_names(&county_dir)? {
            let artifacts = count_artifacts(&county_dir.join(&date))?;
            statuses.push(TargetStatus {
                county: county.clone(),
                date,
                artifacts,
            });
        }
    }
    Ok(statuses)
}

pub fn run() -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("status");
    report.detail(format!("output_root={}", paths.output_root.display()));

    if !paths.output_root.exists() {
        report.detail("output root does not exist yet; nothing scraped");
        return Ok(report);
    }

    let statuses = scan_output_root(&paths.output_root)?;
    let mut total_artifacts = 0;
    let mut satisfied = 0;
    for status in &statuses {
        total_artifacts += status.artifacts;
        if status.artifacts > 0 {
            satisfied += 1;
        }
        report.detail(format!(
            "{}/{} artifacts={}",
            status.county, status.date, status.artifacts
        ));
        if status.artifacts == 0 {
            report.issue(format!(
                "unsatisfied: {}/{} has no CSV artifacts",
                status.county, status.date
            ));
        }
    }
    report.detail(format!("target_dirs={}", statuses.len()));
    report.detail(format!("satisfied={satisfied}"));
    report.detail(format!("total_artifacts={total_artifacts}"));

    Ok(report)
}
