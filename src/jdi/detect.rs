use crate::error::ScrapeError;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

/// Extension Chrome gives a finished archive download.
const ARCHIVE_EXT: &str = "zip";
/// Extension Chrome gives a download still being written.
const IN_PROGRESS_EXT: &str = "crdownload";

/// Injectable time source so the poll loop is testable without sleeping.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DownloadPhase {
    Polling,
    Completed,
    TimedOut,
}

fn has_extension(name: &str, ext: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// A listing is complete only when an archive is present AND no
/// in-progress marker remains. The archive's directory entry can appear
/// before Chrome finishes writing its bytes; the marker file is what
/// distinguishes the two, so both conditions must hold at the same poll.
fn listing_complete(names: &[String]) -> bool {
    let archive_seen = names.iter().any(|n| has_extension(n, ARCHIVE_EXT));
    let partial_seen = names.iter().any(|n| has_extension(n, IN_PROGRESS_EXT));
    archive_seen && !partial_seen
}

/// Unreadable or not-yet-created directories poll as empty.
fn list_names(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .flatten()
        .filter_map(|e| e.file_name().to_str().map(ToOwned::to_owned))
        .collect()
}

fn first_archive(dir: &Path, names: &[String]) -> Option<PathBuf> {
    let mut archives: Vec<&String> = names
        .iter()
        .filter(|n| has_extension(n, ARCHIVE_EXT))
        .collect();
    archives.sort();
    archives.into_iter().next().map(|n| dir.join(n))
}

#[derive(Debug, Clone)]
pub struct DownloadDetector {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl DownloadDetector {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    fn poll_until_complete<C, F>(&self, clock: &C, mut list: F) -> DownloadPhase
    where
        C: Clock,
        F: FnMut() -> Vec<String>,
    {
        let deadline = clock.now() + self.timeout;
        let mut phase = DownloadPhase::Polling;
        while phase == DownloadPhase::Polling {
            if listing_complete(&list()) {
                phase = DownloadPhase::Completed;
            } else if clock.now() >= deadline {
                phase = DownloadPhase::TimedOut;
            } else {
                clock.sleep(self.poll_interval);
            }
        }
        phase
    }

    /// Block until the target directory holds a fully written archive, then
    /// return its path. Times out with `DownloadTimedOut`; a completion
    /// signal with no archive behind it is `ArchiveNotFound`, not a retry.
    pub fn await_completion(&self, target_dir: &Path) -> Result<PathBuf, ScrapeError> {
        self.await_completion_with(&SystemClock, target_dir)
    }

    pub fn await_completion_with<C: Clock>(
        &self,
        clock: &C,
        target_dir: &Path,
    ) -> Result<PathBuf, ScrapeError> {
        self.await_completion_from(clock, target_dir, || list_names(target_dir))
    }

    /// The archive is picked from a fresh read of the same listing source
    /// the poll loop observed; a completion signal whose archive has since
    /// vanished is `ArchiveNotFound`.
    fn await_completion_from<C, F>(
        &self,
        clock: &C,
        target_dir: &Path,
        mut list: F,
    ) -> Result<PathBuf, ScrapeError>
    where
        C: Clock,
        F: FnMut() -> Vec<String>,
    {
        let phase = self.poll_until_complete(clock, &mut list);
        if phase == DownloadPhase::TimedOut {
            return Err(ScrapeError::DownloadTimedOut(self.timeout));
        }
        first_archive(target_dir, &list())
            .ok_or_else(|| ScrapeError::ArchiveNotFound(target_dir.display().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::fs;
    use tempfile::tempdir;

    /// Clock that advances a fixed step on every sleep.
    struct SteppingClock {
        start: Instant,
        elapsed: Cell<Duration>,
        step: Duration,
    }

    impl SteppingClock {
        fn new(step: Duration) -> Self {
            Self {
                start: Instant::now(),
                elapsed: Cell::new(Duration::ZERO),
                step,
            }
        }
    }

    impl Clock for SteppingClock {
        fn now(&self) -> Instant {
            self.start + self.elapsed.get()
        }

        fn sleep(&self, _duration: Duration) {
            self.elapsed.set(self.elapsed.get() + self.step);
        }
    }

    fn detector() -> DownloadDetector {
        DownloadDetector::new(Duration::from_secs(10), Duration::from_secs(1))
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn archive_alone_is_complete() {
        assert!(listing_complete(&names(&["roster.zip"])));
    }

    #[test]
    fn marker_file_blocks_completion_even_with_archive_present() {
        assert!(!listing_complete(&names(&[
            "roster.zip",
            "roster.zip.crdownload"
        ])));
    }

    #[test]
    fn empty_and_unrelated_listings_are_incomplete() {
        assert!(!listing_complete(&names(&[])));
        assert!(!listing_complete(&names(&["notes.txt", "roster.csv"])));
    }

    #[test]
    fn completes_once_marker_disappears() {
        let clock = SteppingClock::new(Duration::from_secs(1));
        let polls = Cell::new(0u32);
        let phase = detector().poll_until_complete(&clock, || {
            polls.set(polls.get() + 1);
            match polls.get() {
                1 => names(&[]),
                2 => names(&["roster.zip", "roster.zip.crdownload"]),
                _ => names(&["roster.zip"]),
            }
        });
        assert_eq!(phase, DownloadPhase::Completed);
        assert_eq!(polls.get(), 3);
    }

    #[test]
    fn times_out_when_nothing_arrives() {
        let clock = SteppingClock::new(Duration::from_secs(1));
        let listings = RefCell::new(Vec::new());
        let phase = detector().poll_until_complete(&clock, || {
            listings.borrow_mut().push(());
            names(&["roster.zip.crdownload"])
        });
        assert_eq!(phase, DownloadPhase::TimedOut);
        // One poll per simulated second plus the final deadline check.
        assert!(listings.borrow().len() >= 10);
    }

    #[test]
    fn await_completion_returns_archive_path() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join("roster.zip"), b"zip").unwrap();

        let clock = SteppingClock::new(Duration::from_secs(1));
        let got = detector()
            .await_completion_with(&clock, tmp.path())
            .expect("archive should be detected");
        assert_eq!(got, tmp.path().join("roster.zip"));
    }

    #[test]
    fn marker_on_disk_keeps_detector_polling_until_timeout() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join("roster.zip"), b"zip").unwrap();
        fs::write(tmp.path().join("roster.zip.crdownload"), b"partial").unwrap();

        let clock = SteppingClock::new(Duration::from_secs(1));
        let err = detector()
            .await_completion_with(&clock, tmp.path())
            .unwrap_err();
        assert!(matches!(err, ScrapeError::DownloadTimedOut(_)));
    }

    #[test]
    fn archive_vanishing_after_completion_is_archive_not_found() {
        let clock = SteppingClock::new(Duration::from_secs(1));
        let calls = Cell::new(0u32);
        let err = detector()
            .await_completion_from(&clock, Path::new("/srv/data/tulsa/2025-06-01"), || {
                calls.set(calls.get() + 1);
                if calls.get() == 1 {
                    names(&["roster.zip"])
                } else {
                    names(&[])
                }
            })
            .unwrap_err();
        assert!(matches!(err, ScrapeError::ArchiveNotFound(_)));
    }

    #[test]
    fn await_completion_times_out_on_empty_dir() {
        let tmp = tempdir().unwrap();
        let clock = SteppingClock::new(Duration::from_secs(1));
        let err = detector()
            .await_completion_with(&clock, tmp.path())
            .unwrap_err();
        assert!(matches!(err, ScrapeError::DownloadTimedOut(_)));
    }
}
