use crate::error::SessionError;
use crate::jdi::config::WebDriverConfig;
use crate::jdi::session::{BrowserSession, Locator};
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde_json::{Map, Value, json};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

/// W3C WebDriver element identifier key.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

fn element_reference(element_id: &str) -> Value {
    let mut obj = Map::new();
    obj.insert(ELEMENT_KEY.to_string(), Value::String(element_id.to_string()));
    Value::Object(obj)
}

/// Minimal W3C WebDriver client over chromedriver's HTTP endpoint.
/// Implements exactly the capability surface the scrape pipeline consumes.
pub struct WebDriverClient {
    http: Client,
    base_url: String,
    session_id: String,
}

impl WebDriverClient {
    /// Create a Chrome session against an already-running chromedriver.
    pub fn new_session(base_url: &str, config: &WebDriverConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build webdriver http client")?;

        let mut args = vec![
            "--window-position=0,0".to_string(),
            "--window-size=1280,1024".to_string(),
        ];
        if config.headless {
            args.push("--headless=new".to_string());
        }
        let body = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": args }
                }
            }
        });

        let resp: Value = http
            .post(format!("{base_url}/session"))
            .json(&body)
            .send()
            .context("failed to reach chromedriver")?
            .error_for_status()
            .context("chromedriver refused to create a session")?
            .json()
            .context("invalid session-create response")?;
        let session_id = resp["value"]["sessionId"]
            .as_str()
            .context("session-create response missing sessionId")?
            .to_string();

        Ok(Self {
            http,
            base_url: base_url.to_string(),
            session_id,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/session/{}{path}", self.base_url, self.session_id)
    }

    fn unwrap_value(path: &str, resp: reqwest::blocking::Response) -> Result<Value, SessionError> {
        let status = resp.status();
        let body: Value = resp
            .json()
            .map_err(|err| SessionError::Protocol(format!("{path}: invalid response: {err}")))?;
        if !status.is_success() {
            let kind = body["value"]["error"].as_str().unwrap_or("unknown error");
            let message = body["value"]["message"].as_str().unwrap_or("");
            return Err(SessionError::Protocol(format!("{path}: {kind}: {message}")));
        }
        Ok(body["value"].clone())
    }

    fn post(&self, path: &str, body: Value) -> Result<Value, SessionError> {
        let resp = self
            .http
            .post(self.endpoint(path))
            .json(&body)
            .send()
            .map_err(|err| SessionError::Protocol(format!("POST {path}: {err}")))?;
        Self::unwrap_value(path, resp)
    }

    fn get(&self, path: &str) -> Result<Value, SessionError> {
        let resp = self
            .http
            .get(self.endpoint(path))
            .send()
            .map_err(|err| SessionError::Protocol(format!("GET {path}: {err}")))?;
        Self::unwrap_value(path, resp)
    }

    /// `Ok(None)` when the element is not in the DOM yet; callers poll.
    fn find_element(&self, locator: &Locator) -> Result<Option<String>, SessionError> {
        let (using, value) = match locator {
            Locator::XPath(expr) => ("xpath", expr.as_str()),
            Locator::Css(selector) => ("css selector", selector.as_str()),
        };
        let resp = self
            .http
            .post(self.endpoint("/element"))
            .json(&json!({ "using": using, "value": value }))
            .send()
            .map_err(|err| SessionError::Protocol(format!("find element: {err}")))?;

        let status = resp.status();
        let body: Value = resp
            .json()
            .map_err(|err| SessionError::Protocol(format!("find element: {err}")))?;
        if status.is_success() {
            return Ok(body["value"][ELEMENT_KEY].as_str().map(String::from));
        }
        if body["value"]["error"].as_str() == Some("no such element") {
            return Ok(None);
        }
        let message = body["value"]["message"].as_str().unwrap_or("");
        Err(SessionError::Protocol(format!(
            "find element {}: {message}",
            locator.describe()
        )))
    }

    fn element_flag(&self, element_id: &str, check: &str) -> Result<bool, SessionError> {
        let value = self.get(&format!("/element/{element_id}/{check}"))?;
        Ok(value.as_bool().unwrap_or(false))
    }

    /// Client-side click that ignores whatever overlay sits on top of the
    /// element; a direct /click would be intercepted by the loading UI.
    fn force_click(&self, element_id: &str) -> Result<(), SessionError> {
        self.post(
            "/execute/sync",
            json!({
                "script": "arguments[0].click();",
                "args": [element_reference(element_id)]
            }),
        )?;
        Ok(())
    }

    fn find_actionable(&self, locator: &Locator) -> Result<Option<String>, SessionError> {
        let Some(element_id) = self.find_element(locator)? else {
            return Ok(None);
        };
        let displayed = self.element_flag(&element_id, "displayed")?;
        let enabled = self.element_flag(&element_id, "enabled")?;
        if displayed && enabled {
            Ok(Some(element_id))
        } else {
            Ok(None)
        }
    }

    fn wait_for<T>(
        &self,
        what: String,
        wait: Duration,
        mut attempt: impl FnMut(&Self) -> Result<Option<T>, SessionError>,
    ) -> Result<T, SessionError> {
        let deadline = Instant::now() + wait;
        loop {
            if let Some(found) = attempt(self)? {
                return Ok(found);
            }
            if Instant::now() >= deadline {
                return Err(SessionError::ElementTimeout { what, wait });
            }
            thread::sleep(WAIT_POLL_INTERVAL);
        }
    }
}

impl BrowserSession for WebDriverClient {
    fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        self.post("/url", json!({ "url": url }))?;
        Ok(())
    }

    fn current_url(&mut self) -> Result<String, SessionError> {
        let value = self.get("/url")?;
        value
            .as_str()
            .map(String::from)
            .ok_or_else(|| SessionError::Protocol("current url is not a string".to_string()))
    }

    fn configure_download_dir(&mut self, dir: &Path) -> Result<(), SessionError> {
        self.post(
            "/goog/cdp/execute",
            json!({
                "cmd": "Browser.setDownloadBehavior",
                "params": {
                    "behavior": "allow",
                    "downloadPath": dir.display().to_string(),
                    "eventsEnabled": true
                }
            }),
        )?;
        Ok(())
    }

    fn click_when_actionable(
        &mut self,
        locator: &Locator,
        wait: Duration,
    ) -> Result<(), SessionError> {
        let element_id =
            self.wait_for(locator.describe(), wait, |client| {
                client.find_actionable(locator)
            })?;
        self.force_click(&element_id)
    }

    fn type_into(
        &mut self,
        locator: &Locator,
        text: &str,
        wait: Duration,
    ) -> Result<(), SessionError> {
        let element_id =
            self.wait_for(locator.describe(), wait, |client| {
                client.find_element(locator)
            })?;
        self.post(
            &format!("/element/{element_id}/value"),
            json!({ "text": text }),
        )?;
        Ok(())
    }

    fn wait_until_url_contains(
        &mut self,
        fragment: &str,
        wait: Duration,
    ) -> Result<(), SessionError> {
        let what = format!("url containing {fragment}");
        self.wait_for(what, wait, |client| {
            let url = client.get("/url")?;
            Ok(url
                .as_str()
                .filter(|u| u.contains(fragment))
                .map(String::from))
        })?;
        Ok(())
    }
}

impl Drop for WebDriverClient {
    fn drop(&mut self) {
        let _ = self.http.delete(self.endpoint("")).send();
    }
}
