//! In-memory stand-in for a browser session, used to exercise page logic
//! without launching Chrome.

use crate::core::AutomationDriver;
use crate::errors::{PageError, Result};
use crate::types::FrameContext;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Calls recorded by [`MockDriver`], in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    Navigate(String),
    WaitLoading,
    SelectFrame(String),
    UnselectFrame,
    PageContains(String),
    Click(String),
    JsClick(String),
    ClickLink(String),
    Focus(String),
    SelectLabel(String, String),
    ScrollIntoView(String),
    Screenshot,
}

impl DriverCall {
    /// Any call that changes page state from the user's side.
    pub fn is_click(&self) -> bool {
        matches!(
            self,
            DriverCall::Click(_) | DriverCall::JsClick(_) | DriverCall::ClickLink(_)
        )
    }
}

#[derive(Debug, Clone)]
pub struct MockElement {
    pub attributes: HashMap<String, String>,
    pub visible: bool,
    pub enabled: bool,
    pub options: Vec<String>,
    pub selected: Option<String>,
}

impl Default for MockElement {
    fn default() -> Self {
        Self {
            attributes: HashMap::new(),
            visible: true,
            enabled: true,
            options: Vec::new(),
            selected: None,
        }
    }
}

impl MockElement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_options(mut self, options: &[&str]) -> Self {
        self.options = options.iter().map(|o| o.to_string()).collect();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Simulated document contents shared by every frame.
#[derive(Debug, Default)]
pub struct MockPage {
    texts: Vec<String>,
    elements: HashMap<String, MockElement>,
    links: HashSet<String>,
    frames: HashSet<String>,
    pending_texts: Vec<(String, u32)>,
    frame: FrameContext,
    calls: Vec<DriverCall>,
    list_selection_sticks: bool,
    screenshots_fail: bool,
}

impl MockPage {
    pub fn add_text(&mut self, text: &str) {
        self.texts.push(text.to_string());
    }

    /// Make `text` show up on the `checks`-th presence check from now.
    pub fn reveal_text_after(&mut self, text: &str, checks: u32) {
        self.pending_texts.push((text.to_string(), checks));
    }

    pub fn add_element(&mut self, selector: &str, element: MockElement) {
        self.elements.insert(selector.to_string(), element);
    }

    pub fn set_attribute(&mut self, selector: &str, name: &str, value: &str) {
        if let Some(element) = self.elements.get_mut(selector) {
            element
                .attributes
                .insert(name.to_string(), value.to_string());
        }
    }

    pub fn add_link(&mut self, text: &str) {
        self.links.insert(text.to_string());
        self.add_text(text);
    }

    pub fn add_frame(&mut self, title: &str) {
        self.frames.insert(title.to_string());
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts.iter().any(|t| t.contains(needle))
    }

    fn element(&self, selector: &str) -> Result<&MockElement> {
        self.elements
            .get(selector)
            .ok_or_else(|| PageError::ElementNotFound(selector.to_string()))
    }
}

type Reaction = Box<dyn Fn(&mut MockPage) + Send + Sync>;

/// [`AutomationDriver`] over a [`MockPage`], with scripted reactions to clicks.
#[derive(Default)]
pub struct MockDriver {
    page: Mutex<MockPage>,
    reactions: Mutex<HashMap<String, Vec<Reaction>>>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutable access to the simulated page.
    pub fn page(&self) -> MutexGuard<'_, MockPage> {
        self.page.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `reaction` whenever the selector (or link text) is clicked.
    pub fn on_click<F>(&self, key: &str, reaction: F)
    where
        F: Fn(&mut MockPage) + Send + Sync + 'static,
    {
        self.reactions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(key.to_string())
            .or_default()
            .push(Box::new(reaction));
    }

    /// When set, list selections are reflected by `selected_list_label`.
    pub fn set_list_selection_sticks(&self, sticks: bool) {
        self.page().list_selection_sticks = sticks;
    }

    /// When set, every screenshot attempt is recorded and then fails.
    pub fn fail_screenshots(&self, fail: bool) {
        self.page().screenshots_fail = fail;
    }

    pub fn calls(&self) -> Vec<DriverCall> {
        self.page().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.page().calls.clear();
    }

    pub fn count_calls<P: Fn(&DriverCall) -> bool>(&self, predicate: P) -> usize {
        self.page().calls.iter().filter(|c| predicate(*c)).count()
    }

    pub fn click_count(&self) -> usize {
        self.count_calls(DriverCall::is_click)
    }

    pub fn screenshot_count(&self) -> usize {
        self.count_calls(|c| *c == DriverCall::Screenshot)
    }

    pub fn presence_checks(&self, text: &str) -> usize {
        self.count_calls(|c| matches!(c, DriverCall::PageContains(t) if t == text))
    }

    fn record(&self, call: DriverCall) {
        self.page().calls.push(call);
    }

    fn react(&self, key: &str) {
        let reactions = self.reactions.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(list) = reactions.get(key) {
            let mut page = self.page();
            for reaction in list {
                reaction(&mut *page);
            }
        }
    }
}

#[async_trait]
impl AutomationDriver for MockDriver {
    async fn navigate(&self, url: &str) -> Result<()> {
        let mut page = self.page();
        page.calls.push(DriverCall::Navigate(url.to_string()));
        page.frame = FrameContext::TopLevel;
        Ok(())
    }

    async fn wait_until_loading_complete(&self, _timeout: Duration) -> Result<()> {
        self.record(DriverCall::WaitLoading);
        Ok(())
    }

    async fn select_frame(&self, title: &str) -> Result<()> {
        let mut page = self.page();
        page.calls.push(DriverCall::SelectFrame(title.to_string()));
        if !page.frames.iter().any(|f| f.contains(title)) {
            return Err(PageError::ElementNotFound(format!(
                "frame with title '{}'",
                title
            )));
        }
        page.frame = FrameContext::Frame(title.to_string());
        Ok(())
    }

    async fn unselect_frame(&self) -> Result<()> {
        let mut page = self.page();
        page.calls.push(DriverCall::UnselectFrame);
        page.frame = FrameContext::TopLevel;
        Ok(())
    }

    fn current_frame(&self) -> FrameContext {
        self.page().frame.clone()
    }

    async fn page_contains(&self, text: &str) -> Result<bool> {
        let mut page = self.page();
        page.calls.push(DriverCall::PageContains(text.to_string()));

        let mut revealed = Vec::new();
        page.pending_texts.retain_mut(|(pending, remaining)| {
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                revealed.push(pending.clone());
                false
            } else {
                true
            }
        });
        page.texts.extend(revealed);

        Ok(page.contains_text(text))
    }

    async fn element_exists(&self, selector: &str) -> Result<bool> {
        Ok(self.page().elements.contains_key(selector))
    }

    async fn element_visible(&self, selector: &str) -> Result<bool> {
        Ok(self
            .page()
            .elements
            .get(selector)
            .map(|e| e.visible)
            .unwrap_or(false))
    }

    async fn element_enabled(&self, selector: &str) -> Result<bool> {
        Ok(self
            .page()
            .elements
            .get(selector)
            .map(|e| e.enabled)
            .unwrap_or(false))
    }

    async fn get_attribute(&self, selector: &str, name: &str) -> Result<Option<String>> {
        Ok(self
            .page()
            .elements
            .get(selector)
            .and_then(|e| e.attributes.get(name).cloned()))
    }

    async fn click(&self, selector: &str) -> Result<()> {
        {
            let mut page = self.page();
            page.calls.push(DriverCall::Click(selector.to_string()));
            if !page.element(selector)?.visible {
                return Err(PageError::JavaScriptFailed(format!(
                    "click on {} failed: not_visible",
                    selector
                )));
            }
        }
        self.react(selector);
        Ok(())
    }

    async fn js_click(&self, selector: &str) -> Result<()> {
        {
            let mut page = self.page();
            page.calls.push(DriverCall::JsClick(selector.to_string()));
            page.element(selector)?;
        }
        self.react(selector);
        Ok(())
    }

    async fn click_link_with_text(&self, text: &str) -> Result<()> {
        {
            let mut page = self.page();
            page.calls.push(DriverCall::ClickLink(text.to_string()));
            if !page.links.contains(text) {
                return Err(PageError::ElementNotFound(format!("link '{}'", text)));
            }
        }
        self.react(text);
        Ok(())
    }

    async fn link_exists(&self, text: &str) -> Result<bool> {
        Ok(self.page().links.contains(text))
    }

    async fn set_focus(&self, selector: &str) -> Result<()> {
        let mut page = self.page();
        page.calls.push(DriverCall::Focus(selector.to_string()));
        page.element(selector)?;
        Ok(())
    }

    async fn select_from_list_by_label(&self, selector: &str, label: &str) -> Result<()> {
        let mut page = self.page();
        page.calls
            .push(DriverCall::SelectLabel(selector.to_string(), label.to_string()));
        let sticks = page.list_selection_sticks;
        let element = page
            .elements
            .get_mut(selector)
            .ok_or_else(|| PageError::ElementNotFound(selector.to_string()))?;
        if !element.options.iter().any(|o| o == label) {
            return Err(PageError::JavaScriptFailed(format!(
                "select by label on {} failed: no_option",
                selector
            )));
        }
        if sticks {
            element.selected = Some(label.to_string());
        }
        Ok(())
    }

    async fn selected_list_label(&self, selector: &str) -> Result<Option<String>> {
        Ok(self
            .page()
            .elements
            .get(selector)
            .and_then(|e| e.selected.clone()))
    }

    async fn scroll_into_view(&self, selector: &str) -> Result<()> {
        let mut page = self.page();
        page.calls.push(DriverCall::ScrollIntoView(selector.to_string()));
        page.element(selector)?;
        Ok(())
    }

    async fn capture_screenshot(&self) -> Result<Vec<u8>> {
        let mut page = self.page();
        page.calls.push(DriverCall::Screenshot);
        if page.screenshots_fail {
            return Err(PageError::ScreenshotFailed(
                "target closed while capturing".to_string(),
            ));
        }
        Ok(vec![0x89, b'P', b'N', b'G'])
    }
}
