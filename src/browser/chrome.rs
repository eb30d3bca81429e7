use super::snapshot::{self, PageSnapshot, MAX_TEXT_CHARS};
use super::{BrowserContext, ScrollDirection};
use anyhow::{Context, Result};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde::Deserialize;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

/// DevTools port a local Chrome is expected to listen on
pub const LOCAL_DEBUG_PORT: u16 = 9222;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/85.0.4183.102 Safari/537.36";

/// Where the browser comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserMode {
    /// Launch and own a fresh Chrome
    Managed,
    /// Attach to the user's own Chrome, starting it from `executable` if it
    /// is not already listening for DevTools connections
    LocalInstance { executable: PathBuf },
}

#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub mode: BrowserMode,
    pub headless: bool,
    pub disable_security: bool,
    pub extra_args: Vec<String>,
    pub window_size: (u32, u32),
    pub locale: String,
    pub user_agent: String,
    /// Pause after each navigation so late content can render
    pub wait_after_load: Duration,
    pub highlight_elements: bool,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self::managed()
    }
}

impl BrowserSettings {
    /// Visible, maximized Chrome with web security relaxed
    pub fn managed() -> Self {
        Self {
            mode: BrowserMode::Managed,
            headless: false,
            disable_security: true,
            extra_args: vec!["--start-maximized".to_string()],
            window_size: (1280, 1100),
            locale: "en-US".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            wait_after_load: Duration::from_secs(3),
            highlight_elements: true,
        }
    }

    pub fn local_instance(executable: PathBuf) -> Self {
        Self {
            mode: BrowserMode::LocalInstance { executable },
            headless: false,
            disable_security: false,
            extra_args: Vec::new(),
            wait_after_load: Duration::from_millis(500),
            ..Self::managed()
        }
    }

    /// Chromium switches derived from the settings
    pub fn launch_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        if self.disable_security {
            args.push("--disable-web-security".into());
            args.push("--disable-site-isolation-trials".into());
            args.push("--disable-features=IsolateOrigins,site-per-process".into());
        }
        args.push(format!("--lang={}", self.locale).into());
        args.extend(self.extra_args.iter().map(OsString::from));
        args
    }
}

#[derive(Debug, Deserialize)]
struct DevToolsVersion {
    #[serde(rename = "webSocketDebuggerUrl")]
    web_socket_debugger_url: String,
}

/// Chrome driven over the DevTools protocol
pub struct ChromeContext {
    browser: Mutex<Option<Browser>>,
    tab: Arc<Tab>,
    settings: BrowserSettings,
}

impl ChromeContext {
    /// Start or attach to Chrome and open the agent's tab
    pub async fn open(settings: BrowserSettings) -> Result<Self> {
        let browser = match &settings.mode {
            BrowserMode::Managed => {
                info!("Launching Chrome...");
                let settings = settings.clone();
                tokio::task::spawn_blocking(move || launch(&settings, None, None))
                    .await
                    .context("Browser launch task panicked")??
            }
            BrowserMode::LocalInstance { executable } => {
                match attach_local().await {
                    Ok(browser) => browser,
                    Err(e) => {
                        info!(
                            "No Chrome listening on port {} ({}), starting {}",
                            LOCAL_DEBUG_PORT,
                            e,
                            executable.display()
                        );
                        let settings = settings.clone();
                        let executable = executable.clone();
                        tokio::task::spawn_blocking(move || {
                            launch(&settings, Some(executable), Some(LOCAL_DEBUG_PORT))
                        })
                        .await
                        .context("Browser launch task panicked")??
                    }
                }
            }
        };

        let user_agent = settings.user_agent.clone();
        let locale = settings.locale.clone();
        let (browser, tab) = tokio::task::spawn_blocking(move || -> Result<(Browser, Arc<Tab>)> {
            let tab = browser.new_tab().context("Failed to open tab")?;
            tab.set_user_agent(&user_agent, Some(&locale), None)
                .context("Failed to set user agent")?;
            Ok((browser, tab))
        })
        .await
        .context("Tab setup task panicked")??;

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            tab,
            settings,
        })
    }

    /// Run blocking DevTools work on the blocking pool
    async fn on_tab<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&Tab) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let tab = self.tab.clone();
        tokio::task::spawn_blocking(move || work(&tab))
            .await
            .context("Browser task panicked")?
    }

    async fn settle(&self) {
        tokio::time::sleep(self.settings.wait_after_load).await;
    }
}

fn launch(
    settings: &BrowserSettings,
    executable: Option<PathBuf>,
    port: Option<u16>,
) -> Result<Browser> {
    let args = settings.launch_args();
    let arg_refs: Vec<&OsStr> = args.iter().map(OsString::as_os_str).collect();

    let options = LaunchOptions::default_builder()
        .headless(settings.headless)
        .window_size(Some(settings.window_size))
        .path(executable)
        .port(port)
        .args(arg_refs)
        .idle_browser_timeout(Duration::from_secs(600))
        .build()
        .context("Failed to build launch options")?;

    Browser::new(options).context("Failed to launch Chrome browser")
}

async fn attach_local() -> Result<Browser> {
    let url = format!("http://localhost:{}/json/version", LOCAL_DEBUG_PORT);
    let version: DevToolsVersion = reqwest::Client::new()
        .get(&url)
        .timeout(Duration::from_secs(2))
        .send()
        .await?
        .json()
        .await?;

    info!("Attaching to local Chrome at {}", version.web_socket_debugger_url);
    tokio::task::spawn_blocking(move || Browser::connect(version.web_socket_debugger_url))
        .await
        .context("Browser attach task panicked")?
        .context("Failed to attach to local Chrome")
}

#[async_trait]
impl BrowserContext for ChromeContext {
    async fn navigate(&self, url: &str) -> Result<()> {
        info!("Navigating to {}", url);
        let url = url.to_string();
        self.on_tab(move |tab| {
            tab.navigate_to(&url)?.wait_until_navigated()?;
            Ok(())
        })
        .await?;
        self.settle().await;
        Ok(())
    }

    async fn snapshot(&self) -> Result<PageSnapshot> {
        let script = snapshot::index_script(self.settings.highlight_elements);

        self.on_tab(move |tab| {
            let result = tab.evaluate(&script, false)?;
            let elements = match result.value.as_ref().and_then(|v| v.as_str()) {
                Some(json) => snapshot::parse_elements(json)
                    .context("Failed to decode interactive elements")?,
                None => {
                    warn!("Indexing script returned nothing");
                    Vec::new()
                }
            };

            let html = tab.get_content()?;
            debug!("Captured {} bytes of HTML, {} elements", html.len(), elements.len());

            Ok(PageSnapshot {
                url: tab.get_url(),
                title: tab.get_title().unwrap_or_default(),
                elements,
                text: snapshot::visible_text(&html, MAX_TEXT_CHARS),
            })
        })
        .await
    }

    async fn click(&self, index: usize) -> Result<()> {
        let selector = snapshot::index_selector(index);
        self.on_tab(move |tab| {
            tab.find_element(&selector)
                .with_context(|| format!("No element with index {}", index))?
                .click()?;
            Ok(())
        })
        .await?;
        self.settle().await;
        Ok(())
    }

    async fn input_text(&self, index: usize, text: &str) -> Result<()> {
        let selector = snapshot::index_selector(index);
        let text = text.to_string();
        self.on_tab(move |tab| {
            let element = tab
                .find_element(&selector)
                .with_context(|| format!("No element with index {}", index))?;
            element.call_js_fn("function() { this.value = ''; }", vec![], false)?;
            element.click()?;
            tab.type_str(&text)?;
            Ok(())
        })
        .await
    }

    async fn scroll(&self, direction: ScrollDirection) -> Result<()> {
        let script = match direction {
            ScrollDirection::Down => "window.scrollBy(0, window.innerHeight)",
            ScrollDirection::Up => "window.scrollBy(0, -window.innerHeight)",
        };
        self.on_tab(move |tab| {
            tab.evaluate(script, false)?;
            Ok(())
        })
        .await
    }

    async fn go_back(&self) -> Result<()> {
        self.on_tab(|tab| {
            tab.evaluate("history.back()", false)?;
            Ok(())
        })
        .await?;
        self.settle().await;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let closed = self.on_tab(|tab| tab.close(true)).await;

        // Dropping the handle shuts down a browser we launched; an attached
        // browser keeps running.
        let browser = self
            .browser
            .lock()
            .map_err(|_| anyhow::anyhow!("Browser handle lock poisoned"))?
            .take();
        drop(browser);

        info!("Browser context closed");
        closed.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn managed_settings_relax_security_and_maximize() {
        let args = BrowserSettings::managed().launch_args();

        assert!(args.contains(&OsString::from("--disable-web-security")));
        assert!(args.contains(&OsString::from("--start-maximized")));
        assert!(args.contains(&OsString::from("--lang=en-US")));
    }

    #[test]
    fn local_instance_keeps_browser_defaults() {
        let settings = BrowserSettings::local_instance(PathBuf::from("/opt/chrome/chrome"));

        assert_eq!(
            settings.mode,
            BrowserMode::LocalInstance {
                executable: PathBuf::from("/opt/chrome/chrome")
            }
        );
        assert_eq!(settings.launch_args(), vec![OsString::from("--lang=en-US")]);
        assert_eq!(settings.window_size, (1280, 1100));
        assert!(settings.highlight_elements);
    }

    #[test]
    fn devtools_version_payload_is_decoded() {
        let version: DevToolsVersion = serde_json::from_str(
            r#"{"Browser": "Chrome/120.0", "webSocketDebuggerUrl": "ws://localhost:9222/devtools/browser/abc"}"#,
        )
        .unwrap();

        assert_eq!(
            version.web_socket_debugger_url,
            "ws://localhost:9222/devtools/browser/abc"
        );
    }
}
