//! Headless Chrome sessions via the DevTools protocol.
//!
//! Each [`ChromeLauncher::open`] call starts its own Chrome process with one
//! tab. The tab presents a desktop user agent and `Accept-Language`, and fails
//! image, font and media requests at the Fetch stage so pages load faster.
//! The process is killed when the session is dropped.
//!
//! `headless_chrome` is synchronous; callers run sessions on a blocking thread.

use super::{BrowserLauncher, Navigation, PageSession, ResourceKind, SessionOptions};
use crate::error::ScrapeError;
use headless_chrome::browser::tab::RequestPausedDecision;
use headless_chrome::browser::transport::{SessionId, Transport};
use headless_chrome::protocol::cdp::Fetch::events::RequestPausedEvent;
use headless_chrome::protocol::cdp::Fetch::{FailRequest, RequestPattern, RequestStage};
use headless_chrome::protocol::cdp::Network::{ErrorReason, ResourceType};
use headless_chrome::protocol::cdp::Page::AddScriptToEvaluateOnNewDocument;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::{OsStr, OsString};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Flags that make automation less obvious to bot detection.
const STEALTH_ARGS: [&str; 3] = [
    "--disable-blink-features=AutomationControlled",
    "--disable-dev-shm-usage",
    "--mute-audio",
];

/// Runs before any page script. `__LANGUAGES__` is replaced with a JS array.
const STEALTH_JS: &str = r#"
Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
Object.defineProperty(navigator, 'languages', { get: () => __LANGUAGES__ });
Object.defineProperty(navigator, 'plugins', {
    get: () => [
        { name: 'Chrome PDF Plugin', filename: 'internal-pdf-viewer' },
        { name: 'Chrome PDF Viewer', filename: 'mhjfbmdgcfjbbpaeojofohoefgiehjai' },
        { name: 'Native Client', filename: 'internal-nacl-plugin' },
    ],
});
Object.defineProperty(navigator, 'hardwareConcurrency', { get: () => 8 });
Object.defineProperty(navigator, 'deviceMemory', { get: () => 8 });
window.chrome = window.chrome || {};
window.chrome.runtime = window.chrome.runtime || {};
if (navigator.permissions && navigator.permissions.query) {
    const query = navigator.permissions.query.bind(navigator.permissions);
    navigator.permissions.query = (parameters) =>
        parameters && parameters.name === 'notifications'
            ? Promise.resolve({ state: Notification.permission })
            : query(parameters);
}
if (window.WebGLRenderingContext) {
    const getParameter = WebGLRenderingContext.prototype.getParameter;
    WebGLRenderingContext.prototype.getParameter = function (parameter) {
        if (parameter === 37445) return 'Intel Inc.';
        if (parameter === 37446) return 'Intel Iris OpenGL Engine';
        return getParameter.call(this, parameter);
    };
}
"#;

/// Launches a new headless Chrome per session.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeLauncher;

impl BrowserLauncher for ChromeLauncher {
    #[instrument(level = "debug", skip_all)]
    fn open(&self, options: &SessionOptions) -> Result<Box<dyn PageSession>, ScrapeError> {
        let args = launch_args(options);
        let arg_refs: Vec<&OsStr> = args.iter().map(|a| a.as_os_str()).collect();

        let launch = LaunchOptions {
            headless: options.headless,
            sandbox: options.sandbox,
            window_size: Some(options.window_size),
            args: arg_refs,
            idle_browser_timeout: options.navigation_timeout + Duration::from_secs(30),
            ..Default::default()
        };

        let browser = Browser::new(launch).map_err(ScrapeError::browser)?;
        let tab = browser.new_tab().map_err(ScrapeError::browser)?;
        if options.stealth {
            tab.call_method(AddScriptToEvaluateOnNewDocument {
                source: stealth_script(&options.accept_language),
                world_name: None,
                include_command_line_api: None,
                run_immediately: None,
            })
            .map_err(ScrapeError::browser)?;
        }
        tab.set_default_timeout(options.navigation_timeout);
        tab.set_user_agent(&options.user_agent, Some(&options.accept_language), None)
            .map_err(ScrapeError::browser)?;

        let blocked = blocked_types(options);
        if !blocked.is_empty() {
            block_resources(&tab, blocked)?;
        }

        debug!(headless = options.headless, "Launched Chrome session");
        Ok(Box::new(ChromeSession {
            _browser: browser,
            tab,
        }))
    }
}

fn launch_args(options: &SessionOptions) -> Vec<OsString> {
    let mut args: Vec<OsString> = STEALTH_ARGS.iter().map(OsString::from).collect();
    if !options.sandbox {
        args.push(OsString::from("--no-sandbox"));
        args.push(OsString::from("--disable-setuid-sandbox"));
    }
    args.push(OsString::from(format!(
        "--lang={}",
        options.accept_language.split(',').next().unwrap_or("en-GB")
    )));
    args.extend(options.extra_args.iter().map(OsString::from));
    args
}

/// `navigator.languages` must agree with the Accept-Language header.
fn stealth_script(accept_language: &str) -> String {
    let languages: Vec<&str> = accept_language
        .split(',')
        .filter_map(|part| part.split(';').next())
        .map(str::trim)
        .filter(|tag| !tag.is_empty() && tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'))
        .collect();
    let list = if languages.is_empty() {
        "['en-GB', 'en']".to_string()
    } else {
        format!(
            "[{}]",
            languages.iter().map(|tag| format!("'{tag}'")).collect::<Vec<_>>().join(", ")
        )
    };
    STEALTH_JS.replace("__LANGUAGES__", &list)
}

fn blocked_types(options: &SessionOptions) -> Vec<ResourceType> {
    options
        .blocked_resources
        .iter()
        .map(|kind| match kind {
            ResourceKind::Image => ResourceType::Image,
            ResourceKind::Font => ResourceType::Font,
            ResourceKind::Media => ResourceType::Media,
            ResourceKind::Stylesheet => ResourceType::Stylesheet,
        })
        .collect()
}

/// Pause every request at the Fetch stage and fail the blocked types.
fn block_resources(tab: &Arc<Tab>, blocked: Vec<ResourceType>) -> Result<(), ScrapeError> {
    let patterns = [RequestPattern {
        url_pattern: None,
        resource_Type: None,
        request_stage: Some(RequestStage::Request),
    }];
    tab.enable_fetch(Some(&patterns), None)
        .map_err(ScrapeError::browser)?;
    tab.enable_request_interception(Arc::new(
        move |_transport: Arc<Transport>, _session_id: SessionId, event: RequestPausedEvent| {
            if blocked.contains(&event.params.resource_Type) {
                RequestPausedDecision::Fail(FailRequest {
                    request_id: event.params.request_id,
                    error_reason: ErrorReason::BlockedByClient,
                })
            } else {
                RequestPausedDecision::Continue(None)
            }
        },
    ))
    .map_err(ScrapeError::browser)?;
    Ok(())
}

struct ChromeSession {
    // Owns the Chrome process; dropping it kills the browser.
    _browser: Browser,
    tab: Arc<Tab>,
}

impl PageSession for ChromeSession {
    #[instrument(level = "debug", skip(self))]
    fn navigate(&mut self, url: &str) -> Result<Navigation, ScrapeError> {
        if let Err(e) = self.tab.navigate_to(url) {
            if looks_like_timeout(&e.to_string()) {
                warn!(%url, error = %e, "Navigation timed out; continuing with current DOM");
                return Ok(Navigation::TimedOut);
            }
            return Err(ScrapeError::browser(e));
        }
        match self.tab.wait_until_navigated() {
            Ok(_) => Ok(Navigation::Loaded),
            Err(e) if looks_like_timeout(&e.to_string()) => {
                warn!(%url, error = %e, "Page load timed out; continuing with current DOM");
                Ok(Navigation::TimedOut)
            }
            Err(e) => Err(ScrapeError::browser(e)),
        }
    }

    fn wait_for(&mut self, selector: &str, timeout: Duration) -> bool {
        match self.tab.wait_for_element_with_custom_timeout(selector, timeout) {
            Ok(_) => true,
            Err(e) => {
                debug!(%selector, ?timeout, error = %e, "Selector did not appear");
                false
            }
        }
    }

    fn click(&mut self, selector: &str) -> bool {
        match self.tab.find_element(selector) {
            Ok(element) => element.click().is_ok(),
            Err(_) => false,
        }
    }

    fn run_script(&mut self, script: &str) -> Result<(), ScrapeError> {
        self.tab
            .evaluate(script, false)
            .map(|_| ())
            .map_err(ScrapeError::browser)
    }

    fn pause(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }

    fn content(&mut self) -> Result<String, ScrapeError> {
        self.tab.get_content().map_err(ScrapeError::browser)
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        if let Err(e) = self.tab.close(false) {
            debug!(error = %e, "Tab close failed; browser process is killed regardless");
        }
    }
}

fn looks_like_timeout(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("timeout") || message.contains("timed out")
}
