use crate::core::AutomationDriver;
use crate::errors::{PageError, Result};
use crate::types::{BrowserConfig, FrameContext};
use crate::utils::javascript::{self as js, Target};
use crate::wait::wait_until;
use async_trait::async_trait;
use headless_chrome::browser::tab::point::Point;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::Value;
use std::ffi::OsStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

const LOADING_POLL: Duration = Duration::from_millis(250);

/// `AutomationDriver` backed by a headless_chrome tab.
///
/// Frames are addressed by evaluating every query against the frame's
/// `contentDocument`, so the settings frame must be same-origin with the
/// Lightning shell (it is for Visualforce tabs served from the org domain
/// once the session cookie is shared).
pub struct ChromeDriver {
    _browser: Browser,
    tab: Arc<Tab>,
    frame: Mutex<FrameContext>,
}

impl ChromeDriver {
    pub fn launch(config: &BrowserConfig) -> Result<Self> {
        let window_size_arg = format!(
            "--window-size={},{}",
            config.viewport.width, config.viewport.height
        );

        let user_agent_arg = config
            .user_agent
            .as_ref()
            .map(|ua| format!("--user-agent={}", ua));

        let mut args = vec![
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new(&window_size_arg),
        ];

        if let Some(ref ua_arg) = user_agent_arg {
            args.push(OsStr::new(ua_arg));
        }

        if config.disable_images {
            args.push(OsStr::new("--blink-settings=imagesEnabled=false"));
        }

        for arg in &config.args {
            args.push(OsStr::new(arg));
        }

        let launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .args(args)
            .build()
            .map_err(|e| PageError::LaunchFailed(e.to_string()))?;

        let browser =
            Browser::new(launch_options).map_err(|e| PageError::LaunchFailed(e.to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| PageError::LaunchFailed(e.to_string()))?;

        Ok(Self {
            _browser: browser,
            tab,
            frame: Mutex::new(FrameContext::TopLevel),
        })
    }

    fn evaluate(&self, script: &str) -> Result<Value> {
        let result = self
            .tab
            .evaluate(script, false)
            .map_err(|e| PageError::JavaScriptFailed(e.to_string()))?;

        Ok(result.value.unwrap_or(Value::Null))
    }

    fn evaluate_bool(&self, script: &str) -> Result<bool> {
        Ok(self.evaluate(script)?.as_bool().unwrap_or(false))
    }

    fn on_element(&self, target: Target<'_>, body: &str, missing: &str) -> Result<Value> {
        let script = js::element_script(&self.current_frame(), target, body, missing);
        self.evaluate(&script)
    }

    /// Run an action body that reports `'ok'` or a failure reason.
    fn act(&self, target: Target<'_>, body: &str, action: &str) -> Result<()> {
        let status = self.on_element(target, body, "'missing'")?;
        match status.as_str() {
            Some("ok") => Ok(()),
            Some("missing") | None => Err(PageError::ElementNotFound(format!(
                "{} target {:?} not found in {}",
                action,
                target,
                self.current_frame()
            ))),
            Some(reason) => Err(PageError::JavaScriptFailed(format!(
                "{} on {:?} failed: {}",
                action, target, reason
            ))),
        }
    }

    /// Real mouse input at the element's centre, after a hit test in the page.
    fn click_at(&self, target: Target<'_>, action: &str) -> Result<()> {
        let status = self.on_element(target, js::CLICK_POINT_BODY, "'missing'")?;
        let status = status.as_str().unwrap_or("missing");

        let Some((x, y)) = js::parse_click_point(status) else {
            return Err(match status {
                "missing" => PageError::ElementNotFound(format!(
                    "{} target {:?} not found in {}",
                    action,
                    target,
                    self.current_frame()
                )),
                reason => PageError::JavaScriptFailed(format!(
                    "{} on {:?} failed: {}",
                    action, target, reason
                )),
            });
        };

        debug!(x, y, "clicking point");
        self.tab
            .click_point(Point { x, y })
            .map_err(|e| PageError::JavaScriptFailed(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl AutomationDriver for ChromeDriver {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .map_err(|e| PageError::NavigationFailed(e.to_string()))?;

        self.tab
            .wait_until_navigated()
            .map_err(|e| PageError::NavigationFailed(e.to_string()))?;

        *self.frame.lock().unwrap_or_else(|e| e.into_inner()) = FrameContext::TopLevel;
        Ok(())
    }

    async fn wait_until_loading_complete(&self, timeout: Duration) -> Result<()> {
        let driver = self;
        let loaded = wait_until(timeout, LOADING_POLL, move || async move {
            driver.evaluate_bool(js::LOADING_COMPLETE_SCRIPT)
        })
        .await?;

        if !loaded {
            return Err(PageError::Timeout(format!(
                "page did not finish loading within {} seconds",
                timeout.as_secs()
            )));
        }
        Ok(())
    }

    async fn select_frame(&self, title: &str) -> Result<()> {
        if !self.evaluate_bool(&js::frame_exists_script(title))? {
            return Err(PageError::ElementNotFound(format!(
                "frame with title '{}'",
                title
            )));
        }
        debug!(title, "entering frame");
        *self.frame.lock().unwrap_or_else(|e| e.into_inner()) = FrameContext::Frame(title.to_string());
        Ok(())
    }

    async fn unselect_frame(&self) -> Result<()> {
        *self.frame.lock().unwrap_or_else(|e| e.into_inner()) = FrameContext::TopLevel;
        Ok(())
    }

    fn current_frame(&self) -> FrameContext {
        self.frame.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    async fn page_contains(&self, text: &str) -> Result<bool> {
        self.evaluate_bool(&js::page_contains_script(&self.current_frame(), text))
    }

    async fn element_exists(&self, selector: &str) -> Result<bool> {
        Ok(self
            .on_element(Target::Selector(selector), "return true;", "false")?
            .as_bool()
            .unwrap_or(false))
    }

    async fn element_visible(&self, selector: &str) -> Result<bool> {
        Ok(self
            .on_element(Target::Selector(selector), js::VISIBLE_BODY, "false")?
            .as_bool()
            .unwrap_or(false))
    }

    async fn element_enabled(&self, selector: &str) -> Result<bool> {
        Ok(self
            .on_element(Target::Selector(selector), js::ENABLED_BODY, "false")?
            .as_bool()
            .unwrap_or(false))
    }

    async fn get_attribute(&self, selector: &str, name: &str) -> Result<Option<String>> {
        let value = self.on_element(Target::Selector(selector), &js::attribute_body(name), "null")?;
        Ok(value.as_str().map(|s| s.to_string()))
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.click_at(Target::Selector(selector), "click")
    }

    async fn js_click(&self, selector: &str) -> Result<()> {
        self.act(Target::Selector(selector), js::SCRIPT_CLICK_BODY, "script click")
    }

    async fn click_link_with_text(&self, text: &str) -> Result<()> {
        self.click_at(Target::LinkText(text), "link click")
    }

    async fn link_exists(&self, text: &str) -> Result<bool> {
        Ok(self
            .on_element(Target::LinkText(text), "return true;", "false")?
            .as_bool()
            .unwrap_or(false))
    }

    async fn set_focus(&self, selector: &str) -> Result<()> {
        self.act(Target::Selector(selector), js::FOCUS_BODY, "focus")
    }

    async fn select_from_list_by_label(&self, selector: &str, label: &str) -> Result<()> {
        self.act(
            Target::Selector(selector),
            &js::select_label_body(label),
            "select by label",
        )
    }

    async fn selected_list_label(&self, selector: &str) -> Result<Option<String>> {
        let value = self.on_element(Target::Selector(selector), js::SELECTED_LABEL_BODY, "null")?;
        Ok(value.as_str().map(|s| s.to_string()))
    }

    async fn scroll_into_view(&self, selector: &str) -> Result<()> {
        self.act(Target::Selector(selector), js::SCROLL_BODY, "scroll into view")
    }

    async fn capture_screenshot(&self) -> Result<Vec<u8>> {
        let screenshot = self
            .tab
            .capture_screenshot(
                headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption::Png,
                None,
                None,
                true,
            )
            .map_err(|e| PageError::ScreenshotFailed(e.to_string()))?;

        Ok(screenshot)
    }
}
