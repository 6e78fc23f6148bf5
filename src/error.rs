use std::time::Duration;
use thiserror::Error;

/// Per-target and fatal failure modes of the scrape pipeline.
///
/// Everything except `Authentication` is recorded against a single
/// (county, date) target and never aborts the run.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("download trigger never became actionable: {0}")]
    NoDownloadTrigger(String),
    #[error("download did not complete within {}s", .0.as_secs())]
    DownloadTimedOut(Duration),
    #[error("completion signaled but no archive found in {0}")]
    ArchiveNotFound(String),
    #[error("failed to extract archive: {0}")]
    Extraction(String),
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("browser session error: {0}")]
    Session(String),
    #[error("filesystem error: {0}")]
    Io(String),
}

/// Failure surface of the browser-session collaborator. Kept separate from
/// `ScrapeError` so callers decide what an element timeout means: a missing
/// download trigger mid-run, or a failed login handshake up front.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("timed out after {}s waiting for {what}", .wait.as_secs())]
    ElementTimeout { what: String, wait: Duration },
    #[error("{0}")]
    Protocol(String),
}

impl SessionError {
    pub fn is_element_timeout(&self) -> bool {
        matches!(self, Self::ElementTimeout { .. })
    }
}

impl ScrapeError {
    /// True for errors that invalidate the whole run, not just one target.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::DownloadTimedOut(_))
    }
}
