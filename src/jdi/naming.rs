use chrono::NaiveDate;
use std::path::Path;

/// Canonical artifact filename for one extracted CSV entry.
///
/// The entry's base name loses its original extension and casing; the
/// county slug and ISO date are appended so files from different targets
/// never collide. Two entries in the same archive that reduce to the same
/// stem intentionally map to the same name (last one extracted wins).
pub fn artifact_name(entry_name: &str, county_slug: &str, date: NaiveDate) -> String {
    let stem = Path::new(entry_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(entry_name)
        .to_lowercase();
    format!(
        "{stem}-{}-{}.csv",
        county_slug.to_lowercase(),
        date.format("%Y-%m-%d")
    )
}

/// True when `name` ends in the CSV extension, case-insensitively.
pub fn is_csv_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}
