use crate::error::{ScrapeError, SessionError};
use std::env;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    /// Credentials are only ever read from the environment (or .env);
    /// they are never written to config files or logs.
    pub fn from_env() -> Result<Self, ScrapeError> {
        let email = required_env("JDI_EMAIL")?;
        let password = required_env("JDI_PASSWORD")?;
        Ok(Self { email, password })
    }
}

fn required_env(var: &str) -> Result<String, ScrapeError> {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ScrapeError::Authentication(format!("{var} is not set"))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    XPath(String),
    Css(String),
}

impl Locator {
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn describe(&self) -> String {
        match self {
            Self::XPath(expr) => format!("xpath {expr}"),
            Self::Css(selector) => format!("css {selector}"),
        }
    }
}

/// Capability surface the pipeline needs from a live browser. The core and
/// its tests depend only on this trait; the WebDriver client implements it.
pub trait BrowserSession {
    fn navigate(&mut self, url: &str) -> Result<(), SessionError>;

    fn current_url(&mut self) -> Result<String, SessionError>;

    /// Point the browser's download sink at `dir`. Sink configuration is
    /// session-global state, which is why targets are processed one at a
    /// time against a single session.
    fn configure_download_dir(&mut self, dir: &Path) -> Result<(), SessionError>;

    /// Wait up to `wait` for the element to be present, displayed and
    /// enabled, then invoke it through a client-side script call. The
    /// scripted invocation must succeed even when a transient loading
    /// overlay would intercept a direct click.
    fn click_when_actionable(&mut self, locator: &Locator, wait: Duration)
    -> Result<(), SessionError>;

    fn type_into(
        &mut self,
        locator: &Locator,
        text: &str,
        wait: Duration,
    ) -> Result<(), SessionError>;

    fn wait_until_url_contains(
        &mut self,
        fragment: &str,
        wait: Duration,
    ) -> Result<(), SessionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_env_is_an_authentication_error() {
        // Deliberately unset names so the test is hermetic.
        let err = required_env("JDI_TEST_NO_SUCH_CREDENTIAL").unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn locator_describe_names_the_strategy() {
        assert_eq!(
            Locator::xpath("//button").describe(),
            "xpath //button"
        );
        assert_eq!(Locator::css("#email").describe(), "css #email");
    }
}
