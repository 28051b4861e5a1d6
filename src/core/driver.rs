use crate::errors::Result;
use crate::types::{EnablementSignal, FrameContext};
use async_trait::async_trait;
use std::time::Duration;

/// Capabilities the settings page needs from a browser automation session.
///
/// Every call is a single, blocking-style query or action against the
/// document selected by the current [`FrameContext`]. Element queries are
/// instantaneous; waiting is layered on top by [`crate::wait`].
#[async_trait]
pub trait AutomationDriver: Send + Sync {
    /// Navigate the top-level document to a URL
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Wait for the host platform to report that the page finished loading
    async fn wait_until_loading_complete(&self, timeout: Duration) -> Result<()>;

    /// Scope subsequent calls to the nested frame with this title
    async fn select_frame(&self, title: &str) -> Result<()>;

    /// Scope subsequent calls back to the top-level document
    async fn unselect_frame(&self) -> Result<()>;

    fn current_frame(&self) -> FrameContext;

    /// Whether the visible text of the current document contains `text`
    async fn page_contains(&self, text: &str) -> Result<bool>;

    async fn element_exists(&self, selector: &str) -> Result<bool>;

    async fn element_visible(&self, selector: &str) -> Result<bool>;

    async fn element_enabled(&self, selector: &str) -> Result<bool>;

    /// Read an attribute; `None` when the element or the attribute is missing
    async fn get_attribute(&self, selector: &str, name: &str) -> Result<Option<String>>;

    /// Click with user-input semantics (fails on hidden or covered elements)
    async fn click(&self, selector: &str) -> Result<()>;

    /// Invoke the element's `click()` from script, bypassing hit testing
    async fn js_click(&self, selector: &str) -> Result<()>;

    async fn click_link_with_text(&self, text: &str) -> Result<()>;

    async fn link_exists(&self, text: &str) -> Result<bool>;

    async fn set_focus(&self, selector: &str) -> Result<()>;

    async fn select_from_list_by_label(&self, selector: &str, label: &str) -> Result<()>;

    /// Visible label of the currently selected option of a list control
    async fn selected_list_label(&self, selector: &str) -> Result<Option<String>>;

    async fn scroll_into_view(&self, selector: &str) -> Result<()>;

    /// PNG bytes of the current viewport
    async fn capture_screenshot(&self) -> Result<Vec<u8>>;

    /// Ask whether the feature behind a probe element is switched on.
    ///
    /// Returns `None` when the probe element is not on the page. All
    /// attribute string matching lives in [`EnablementSignal::evaluate`].
    async fn is_feature_enabled(
        &self,
        selector: &str,
        signal: &EnablementSignal,
    ) -> Result<Option<bool>> {
        if !self.element_exists(selector).await? {
            return Ok(None);
        }
        let value = match signal.attribute() {
            Some(name) => self.get_attribute(selector, name).await?,
            None => None,
        };
        Ok(Some(signal.evaluate(value.as_deref())))
    }
}
