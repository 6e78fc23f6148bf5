use anyhow::{Result, anyhow};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct County {
    /// Display name as the portal expects it in the `jail` query parameter.
    pub name: String,
    /// URL-safe identifier used in artifact filenames.
    pub slug: String,
}

impl County {
    pub fn new(name: &str, slug: &str) -> Self {
        Self {
            name: name.to_string(),
            slug: slug.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeWaits {
    /// Bounded wait for the download trigger to become actionable.
    pub trigger_wait_secs: u64,
    /// Bounded wait for a triggered download to stabilize on disk.
    pub download_timeout_secs: u64,
    /// Fixed interval between directory polls while waiting.
    pub poll_interval_millis: u64,
}

impl Default for ScrapeWaits {
    fn default() -> Self {
        Self {
            trigger_wait_secs: 15,
            download_timeout_secs: 60,
            poll_interval_millis: 250,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebDriverConfig {
    /// Explicit chromedriver path; falls back to PATH lookup when unset.
    pub chromedriver_bin: Option<String>,
    pub port: u16,
    pub headless: bool,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            chromedriver_bin: None,
            port: 9515,
            headless: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JdiConfig {
    pub roster_endpoint: String,
    pub portal_url: String,
    pub state_code: String,
    pub counties: Vec<County>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Delete the downloaded archive after successful extraction.
    /// Off by default: the archive is retained for audit.
    pub cleanup_archives: bool,
    pub waits: ScrapeWaits,
    pub webdriver: WebDriverConfig,
}

impl Default for JdiConfig {
    fn default() -> Self {
        let today = Local::now().date_naive();
        Self {
            roster_endpoint: "https://jaildatainitiative.org/roster".to_string(),
            portal_url: "https://jaildatainitiative.org/".to_string(),
            state_code: "OK".to_string(),
            counties: default_counties(),
            start_date: today,
            end_date: today,
            cleanup_archives: false,
            waits: ScrapeWaits::default(),
            webdriver: WebDriverConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialJdiConfig {
    roster_endpoint: Option<String>,
    portal_url: Option<String>,
    state_code: Option<String>,
    counties: Option<Vec<County>>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    cleanup_archives: Option<bool>,
    waits: Option<ScrapeWaits>,
    webdriver: Option<WebDriverConfig>,
}

fn env_or_u64(var: &str, fallback: u64) -> u64 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<u64>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_u16(var: &str, fallback: u16) -> u16 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<u16>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_bool(var: &str, fallback: bool) -> bool {
    match env::var(var) {
        Ok(v) => match v.trim() {
            "1" | "true" | "TRUE" | "yes" | "on" => true,
            "0" | "false" | "FALSE" | "no" | "off" => false,
            _ => fallback,
        },
        Err(_) => fallback,
    }
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn env_or_date(var: &str, fallback: NaiveDate) -> NaiveDate {
    match env::var(var) {
        Ok(v) => NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d")
            .ok()
            .unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn validate(cfg: &JdiConfig) -> Result<()> {
    if cfg.counties.is_empty() {
        return Err(anyhow!("invalid county list: at least one county required"));
    }
    for county in &cfg.counties {
        if county.name.trim().is_empty() || county.slug.trim().is_empty() {
            return Err(anyhow!(
                "invalid county entry: name and slug must be non-empty"
            ));
        }
    }
    if cfg.start_date > cfg.end_date {
        return Err(anyhow!(
            "invalid date range: start {} is after end {}",
            cfg.start_date,
            cfg.end_date
        ));
    }
    if cfg.roster_endpoint.trim().is_empty() {
        return Err(anyhow!("invalid roster endpoint: cannot be empty"));
    }
    if cfg.waits.poll_interval_millis == 0 {
        return Err(anyhow!("invalid poll interval: must be >= 1 millisecond"));
    }
    if cfg.waits.trigger_wait_secs == 0 {
        return Err(anyhow!("invalid trigger wait: must be >= 1 second"));
    }
    if cfg.waits.download_timeout_secs == 0 {
        return Err(anyhow!("invalid download timeout: must be >= 1 second"));
    }
    Ok(())
}

fn resolve_config_path(cli_override: Option<&PathBuf>) -> Option<PathBuf> {
    if let Some(path) = cli_override {
        return Some(path.clone());
    }
    if let Ok(custom) = env::var("JDI_CONFIG_PATH") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    let home = dirs::home_dir()?;
    Some(home.join(".jdi-scrape").join("jdi.toml"))
}

fn merge_file_config(base: &mut JdiConfig, cli_override: Option<&PathBuf>) -> Result<()> {
    let Some(path) = resolve_config_path(cli_override) else {
        return Ok(());
    };
    if !path.exists() {
        if cli_override.is_some() {
            return Err(anyhow!("config file not found: {}", path.display()));
        }
        return Ok(());
    }

    let raw = fs::read_to_string(&path)?;
    let parsed: PartialJdiConfig = toml::from_str(&raw)
        .map_err(|err| anyhow!("failed to parse config {}: {err}", path.display()))?;
    if let Some(endpoint) = parsed.roster_endpoint {
        base.roster_endpoint = endpoint;
    }
    if let Some(portal) = parsed.portal_url {
        base.portal_url = portal;
    }
    if let Some(state) = parsed.state_code {
        base.state_code = state;
    }
    if let Some(counties) = parsed.counties {
        base.counties = counties;
    }
    if let Some(start) = parsed.start_date {
        base.start_date = start;
    }
    if let Some(end) = parsed.end_date {
        base.end_date = end;
    }
    if let Some(cleanup) = parsed.cleanup_archives {
        base.cleanup_archives = cleanup;
    }
    if let Some(waits) = parsed.waits {
        base.waits = waits;
    }
    if let Some(webdriver) = parsed.webdriver {
        base.webdriver = webdriver;
    }
    Ok(())
}

pub fn load_config(cli_override: Option<&PathBuf>) -> Result<JdiConfig> {
    let mut cfg = JdiConfig::default();
    merge_file_config(&mut cfg, cli_override)?;

    cfg.roster_endpoint = env_or_string("JDI_ROSTER_ENDPOINT", &cfg.roster_endpoint);
    cfg.portal_url = env_or_string("JDI_PORTAL_URL", &cfg.portal_url);
    cfg.state_code = env_or_string("JDI_STATE_CODE", &cfg.state_code);
    cfg.start_date = env_or_date("JDI_START_DATE", cfg.start_date);
    cfg.end_date = env_or_date("JDI_END_DATE", cfg.end_date);
    cfg.cleanup_archives = env_or_bool("JDI_CLEANUP_ARCHIVES", cfg.cleanup_archives);
    cfg.waits.trigger_wait_secs = env_or_u64("JDI_TRIGGER_WAIT_SECS", cfg.waits.trigger_wait_secs);
    cfg.waits.download_timeout_secs =
        env_or_u64("JDI_DOWNLOAD_TIMEOUT_SECS", cfg.waits.download_timeout_secs);
    cfg.waits.poll_interval_millis =
        env_or_u64("JDI_POLL_INTERVAL_MILLIS", cfg.waits.poll_interval_millis);
    cfg.webdriver.port = env_or_u16("JDI_WEBDRIVER_PORT", cfg.webdriver.port);
    cfg.webdriver.headless = env_or_bool("JDI_HEADLESS", cfg.webdriver.headless);
    if let Ok(bin) = env::var("JDI_CHROMEDRIVER_BIN") {
        if !bin.trim().is_empty() {
            cfg.webdriver.chromedriver_bin = Some(bin.trim().to_string());
        }
    }

    validate(&cfg)?;
    Ok(cfg)
}

/// The Oklahoma county roster tracked by default.
pub fn default_counties() -> Vec<County> {
    [
        ("Atoka", "atoka"),
        ("Blaine", "blaine"),
        ("Caddo", "caddo"),
        ("Canadian", "canadian"),
        ("Carter", "carter"),
        ("Cimarron", "cimarron"),
        ("Cleveland", "cleveland"),
        ("Comanche", "comanche"),
        ("Craig", "craig"),
        ("Creek", "creek"),
        ("Custer", "custer"),
        ("Delaware", "delaware"),
        ("Garfield", "garfield"),
        ("Garvin", "garvin"),
        ("Grady", "grady"),
        ("Latimer", "latimer"),
        ("Lincoln", "lincoln"),
        ("Logan", "logan"),
        ("Love", "love"),
        ("Major", "major"),
        ("Mayes", "mayes"),
        ("McClain", "mcclain"),
        ("Oklahoma", "oklahoma"),
        ("Okmulgee", "okmulgee"),
        ("Osage", "osage"),
        ("Ottawa", "ottawa"),
        ("Pawnee", "pawnee"),
        ("Payne", "payne"),
        ("Pottawatomie", "pottawatomie"),
        ("Rogers", "rogers"),
        ("Seminole", "seminole"),
        ("Sequoyah", "sequoyah"),
        ("Tulsa", "tulsa"),
        ("Wagoner", "wagoner"),
        ("Washington", "washington"),
    ]
    .iter()
    .map(|(name, slug)| County::new(name, slug))
    .collect()
}
