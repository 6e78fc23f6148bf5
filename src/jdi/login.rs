use crate::error::ScrapeError;
use crate::jdi::session::{BrowserSession, Credentials, Locator};
use std::time::Duration;

const LANDING_LOGIN_BUTTON: &str = "//button[contains(., 'LOG IN')]";
const EMAIL_FIELD: &str = "//*[@id=\"email\"]";
const PASSWORD_FIELD: &str = "//*[@id=\"password\"]";
const SUBMIT_BUTTON: &str = "button[type=\"submit\"]";

/// Host fragment whose presence in the current URL marks a successful
/// redirect back from the OAuth page.
fn host_fragment(portal_url: &str) -> String {
    let stripped = portal_url
        .strip_prefix("https://")
        .or_else(|| portal_url.strip_prefix("http://"))
        .unwrap_or(portal_url);
    stripped
        .split('/')
        .next()
        .unwrap_or(stripped)
        .to_string()
}

fn auth_err(step: &str, err: impl std::fmt::Display) -> ScrapeError {
    ScrapeError::Authentication(format!("{step}: {err}"))
}

/// One-shot authentication handshake against the portal's OAuth page.
/// Any failed step is fatal for the run; no target can succeed without a
/// logged-in session.
pub fn login(
    session: &mut dyn BrowserSession,
    portal_url: &str,
    credentials: &Credentials,
    wait: Duration,
) -> Result<(), ScrapeError> {
    session
        .navigate(portal_url)
        .map_err(|err| auth_err("navigate to portal", err))?;

    session
        .click_when_actionable(&Locator::xpath(LANDING_LOGIN_BUTTON), wait)
        .map_err(|err| auth_err("landing login button", err))?;

    session
        .type_into(&Locator::xpath(EMAIL_FIELD), &credentials.email, wait)
        .map_err(|err| auth_err("email field", err))?;
    session
        .type_into(&Locator::xpath(PASSWORD_FIELD), &credentials.password, wait)
        .map_err(|err| auth_err("password field", err))?;

    session
        .click_when_actionable(&Locator::css(SUBMIT_BUTTON), wait)
        .map_err(|err| auth_err("credential submit", err))?;

    session
        .wait_until_url_contains(&host_fragment(portal_url), wait)
        .map_err(|err| auth_err("post-login redirect", err))?;

    Ok(())
}
