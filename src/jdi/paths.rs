use anyhow::Result;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct JdiPaths {
    /// Root of the scraped file tree; one subdirectory per county.
    pub output_root: PathBuf,
    /// JSONL log of per-target outcome events.
    pub run_log: PathBuf,
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

pub fn resolve_paths() -> Result<JdiPaths> {
    let cwd = env::current_dir()?;
    let output_root = env_or_default_path("JDI_OUTPUT_DIR", cwd.join("data"));
    let run_log = output_root.join("scrape.log");

    Ok(JdiPaths {
        output_root,
        run_log,
    })
}

#[cfg(test)]
mod tests {
    use super::env_or_default_path;
    use std::path::PathBuf;

    #[test]
    fn blank_env_value_falls_back() {
        // Relies on this var never being set by the test harness.
        let got = env_or_default_path("JDI_TEST_UNSET_OUTPUT", PathBuf::from("/srv/data"));
        assert_eq!(got, PathBuf::from("/srv/data"));
    }
}
