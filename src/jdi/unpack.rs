use crate::error::ScrapeError;
use crate::jdi::naming::{artifact_name, is_csv_name};
use chrono::NaiveDate;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

fn extraction_err(archive_path: &Path, detail: impl std::fmt::Display) -> ScrapeError {
    ScrapeError::Extraction(format!("{}: {detail}", archive_path.display()))
}

/// Extract every CSV entry of `archive_path` into `target_dir` under its
/// canonical artifact name, in archive-listing order. Non-CSV entries are
/// skipped silently; an archive with no CSV entries yields an empty list.
/// Existing files at an artifact path are overwritten.
pub fn extract_archive(
    archive_path: &Path,
    target_dir: &Path,
    county_slug: &str,
    date: NaiveDate,
) -> Result<Vec<PathBuf>, ScrapeError> {
    let file = File::open(archive_path).map_err(|err| extraction_err(archive_path, err))?;
    let mut archive =
        ZipArchive::new(BufReader::new(file)).map_err(|err| extraction_err(archive_path, err))?;

    let mut artifacts = Vec::new();
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|err| extraction_err(archive_path, err))?;
        if entry.is_dir() || !is_csv_name(entry.name()) {
            continue;
        }

        let dest = target_dir.join(artifact_name(entry.name(), county_slug, date));
        let mut out = File::create(&dest).map_err(|err| extraction_err(archive_path, err))?;
        io::copy(&mut entry, &mut out).map_err(|err| extraction_err(archive_path, err))?;
        artifacts.push(dest);
    }

    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut writer = ZipWriter::new(file);
        for (name, bytes) in entries {
            writer
                .start_file(name.to_string(), SimpleFileOptions::default())
                .unwrap();
            writer.write_all(bytes).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn extracts_csv_entries_and_ignores_the_rest() {
        let tmp = tempdir().unwrap();
        let archive = tmp.path().join("roster.zip");
        write_zip(
            &archive,
            &[
                ("data.csv", b"id,name\n1,a\n".as_slice()),
                ("readme.txt", b"not a roster".as_slice()),
                ("Extra.CSV", b"id\n2\n".as_slice()),
            ],
        );

        let got = extract_archive(&archive, tmp.path(), "tulsa", date(2025, 6, 1)).unwrap();
        assert_eq!(
            got,
            vec![
                tmp.path().join("data-tulsa-2025-06-01.csv"),
                tmp.path().join("extra-tulsa-2025-06-01.csv"),
            ]
        );
        assert_eq!(
            fs::read_to_string(tmp.path().join("data-tulsa-2025-06-01.csv")).unwrap(),
            "id,name\n1,a\n"
        );
        assert!(!tmp.path().join("readme.txt").exists());
    }

    #[test]
    fn archive_without_csv_entries_yields_empty_list() {
        let tmp = tempdir().unwrap();
        let archive = tmp.path().join("roster.zip");
        write_zip(&archive, &[("readme.txt", b"nothing here".as_slice())]);

        let got = extract_archive(&archive, tmp.path(), "tulsa", date(2025, 6, 1)).unwrap();
        assert!(got.is_empty());
    }

    #[test]
    fn colliding_stems_overwrite_last_wins() {
        let tmp = tempdir().unwrap();
        let archive = tmp.path().join("roster.zip");
        write_zip(
            &archive,
            &[
                ("Roster.csv", b"first\n".as_slice()),
                ("roster.CSV", b"second\n".as_slice()),
            ],
        );

        let got = extract_archive(&archive, tmp.path(), "tulsa", date(2025, 6, 1)).unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0], got[1]);
        assert_eq!(
            fs::read_to_string(tmp.path().join("roster-tulsa-2025-06-01.csv")).unwrap(),
            "second\n"
        );
    }

    #[test]
    fn corrupt_archive_is_an_extraction_error() {
        let tmp = tempdir().unwrap();
        let archive = tmp.path().join("roster.zip");
        fs::write(&archive, b"this is not a zip file").unwrap();

        let err = extract_archive(&archive, tmp.path(), "tulsa", date(2025, 6, 1)).unwrap_err();
        assert!(matches!(err, ScrapeError::Extraction(_)));
    }

    #[test]
    fn missing_archive_is_an_extraction_error() {
        let tmp = tempdir().unwrap();
        let err = extract_archive(
            &tmp.path().join("gone.zip"),
            tmp.path(),
            "tulsa",
            date(2025, 6, 1),
        )
        .unwrap_err();
        assert!(matches!(err, ScrapeError::Extraction(_)));
    }
}
