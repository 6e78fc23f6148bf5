use crate::jdi::config::WebDriverConfig;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const READY_TIMEOUT: Duration = Duration::from_secs(10);
const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

fn resolve_chromedriver_bin(configured: Option<&str>) -> Result<PathBuf> {
    if let Some(bin) = configured {
        let path = Path::new(bin.trim());
        if !path.is_file() {
            anyhow::bail!("chromedriver path is not a file: {}", path.display());
        }
        return Ok(path.to_path_buf());
    }
    let found = which::which("chromedriver")
        .context("chromedriver not found; set JDI_CHROMEDRIVER_BIN or add it to PATH")?;
    Ok(found)
}

fn wait_until_ready(base_url: &str, timeout: Duration) -> Result<()> {
    let http = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
        .context("failed to build readiness probe client")?;
    let deadline = Instant::now() + timeout;

    loop {
        if let Ok(resp) = http.get(format!("{base_url}/status")).send() {
            if let Ok(body) = resp.json::<Value>() {
                if body["value"]["ready"].as_bool() == Some(true) {
                    return Ok(());
                }
            }
        }
        if Instant::now() >= deadline {
            anyhow::bail!(
                "chromedriver did not become ready within {}s at {base_url}",
                timeout.as_secs()
            );
        }
        thread::sleep(READY_POLL_INTERVAL);
    }
}

/// A chromedriver child process, killed when dropped.
pub struct ChromeDriver {
    child: Child,
    base_url: String,
}

impl ChromeDriver {
    pub fn spawn(config: &WebDriverConfig) -> Result<Self> {
        let bin = resolve_chromedriver_bin(config.chromedriver_bin.as_deref())?;
        let child = Command::new(&bin)
            .arg(format!("--port={}", config.port))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to spawn {}", bin.display()))?;
        let base_url = format!("http://127.0.0.1:{}", config.port);

        let driver = Self { child, base_url };
        wait_until_ready(&driver.base_url, READY_TIMEOUT)?;
        Ok(driver)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Drop for ChromeDriver {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::resolve_chromedriver_bin;

    #[test]
    fn explicit_path_must_exist() {
        let err = resolve_chromedriver_bin(Some("/no/such/chromedriver")).unwrap_err();
        assert!(err.to_string().contains("not a file"));
    }
}
