//! Page object for the NPSP Settings tab.
//!
//! The settings UI lives in a Visualforce frame inside the Lightning shell
//! and reports the outcome of most actions only through later DOM changes,
//! so every interaction here is a locate / act / wait-for-evidence sequence.

use crate::core::{AutomationDriver, Config};
use crate::errors::{PageError, Result};
use crate::locators::Locators;
use crate::types::{EnablementSignal, Feature, FeatureState};
use crate::utils::ScreenshotRecorder;
use crate::wait::{poll_attempts, wait_until, PollBudget};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Link text shared by the main menu and a panel heading.
const DONATIONS: &str = "Donations";
/// Panel holding the Edit / Save buttons of a settings section.
const EDIT_PANEL: &str = "idPanelCon";
const UPGRADE_RD2_LINK: &str = "Upgrade to Enhanced Recurring Donations";
const CRLP_CONFIGURE_MARKER: &str = "Configure Customizable Rollups";

pub struct SettingsPage<D: AutomationDriver> {
    driver: D,
    locators: Arc<dyn Locators>,
    config: Config,
    screenshots: ScreenshotRecorder,
}

impl<D: AutomationDriver> SettingsPage<D> {
    /// Fails with `Configuration` when `config` does not validate.
    pub fn new(driver: D, locators: Arc<dyn Locators>, config: Config) -> Result<Self> {
        config.validate()?;
        let screenshots = ScreenshotRecorder::new(&config.screenshots);
        Ok(Self {
            driver,
            locators,
            config,
            screenshots,
        })
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn screenshots(&self) -> &ScreenshotRecorder {
        &self.screenshots
    }

    fn locator(&self, key: &str, args: &[&str]) -> Result<String> {
        self.locators.resolve(key, args)
    }

    fn element_timeout(&self) -> Duration {
        self.config.timeouts.element()
    }

    fn message_budget(&self) -> PollBudget {
        PollBudget::new(
            self.config.message_poll.attempts,
            Duration::from_millis(self.config.message_poll.interval_ms),
        )
    }

    async fn wait_for_element(&self, selector: &str, timeout: Duration) -> Result<bool> {
        let driver = &self.driver;
        wait_until(timeout, self.config.timeouts.poll_interval(), move || {
            driver.element_exists(selector)
        })
        .await
    }

    async fn wait_for_visible(&self, selector: &str, timeout: Duration) -> Result<bool> {
        let driver = &self.driver;
        wait_until(timeout, self.config.timeouts.poll_interval(), move || {
            driver.element_visible(selector)
        })
        .await
    }

    async fn wait_for_enabled(&self, selector: &str, timeout: Duration) -> Result<bool> {
        let driver = &self.driver;
        wait_until(timeout, self.config.timeouts.poll_interval(), move || {
            driver.element_enabled(selector)
        })
        .await
    }

    async fn wait_for_text(&self, text: &str, timeout: Duration) -> Result<bool> {
        let driver = &self.driver;
        wait_until(timeout, self.config.timeouts.poll_interval(), move || {
            driver.page_contains(text)
        })
        .await
    }

    /// Run `op`; when it fails, grab a screenshot before handing the error back.
    async fn capture_on_error<T, F>(&self, label: &str, op: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let result = op.await;
        if let Err(e) = &result {
            warn!(operation = label, error = %e, "settings page operation failed");
            self.screenshots.capture_quietly(&self.driver, label).await;
        }
        result
    }

    // Navigation

    /// `{base_url}/lightning/n/{namespace_prefix}{object_name}`
    pub fn settings_url(&self) -> Result<String> {
        let org = &self.config.org;
        if org.base_url.trim().is_empty() {
            return Err(PageError::Configuration(
                "org.base_url is required to open the settings page".to_string(),
            ));
        }
        let base = Url::parse(&org.base_url)?;
        let url = base.join(&format!(
            "/lightning/n/{}{}",
            org.namespace_prefix, org.object_name
        ))?;
        Ok(url.to_string())
    }

    pub async fn open_settings_page(&self) -> Result<()> {
        let url = self.settings_url()?;
        info!(url = %url, "opening NPSP settings");
        self.driver.navigate(&url).await?;
        self.driver
            .wait_until_loading_complete(Duration::from_millis(self.config.timeouts.loading_ms))
            .await?;
        self.choose_settings_frame().await
    }

    /// Enter the settings frame from the top-level document. Needed again
    /// after any action that reloads the frame.
    pub async fn choose_settings_frame(&self) -> Result<()> {
        let title = self.config.org.frame_title.as_str();
        self.driver.unselect_frame().await?;

        let locator = self.locator("frame", &[title])?;
        if !self.wait_for_element(&locator, self.element_timeout()).await? {
            return Err(PageError::Timeout(format!(
                "frame '{}' did not appear on the page",
                title
            )));
        }
        self.driver.select_frame(title).await?;
        debug!(frame = title, "settings frame selected");
        Ok(())
    }

    // Menus and links

    /// Expand a top-level menu section of the settings page.
    pub async fn open_main_menu(&self, title: &str) -> Result<()> {
        let result = self.expand_main_menu(title).await;
        self.screenshots
            .capture_quietly(&self.driver, "open_main_menu")
            .await;
        result
    }

    async fn expand_main_menu(&self, title: &str) -> Result<()> {
        if !self.wait_for_text(title, self.element_timeout()).await? {
            return Err(PageError::Timeout(format!(
                "{} link was not found on the page",
                title
            )));
        }

        if title == DONATIONS {
            let locator = self.locator("npsp_settings.donations_link", &[title])?;
            if !self.wait_for_visible(&locator, self.element_timeout()).await? {
                return Err(PageError::Timeout(format!(
                    "{} menu link did not become visible",
                    title
                )));
            }
            self.driver.js_click(&locator).await?;
        } else {
            self.driver.click_link_with_text(title).await?;
            let locator = self.locator("npsp_settings.main_menu", &[title])?;
            if !self.wait_for_element(&locator, self.element_timeout()).await? {
                return Err(PageError::Timeout(format!(
                    "click on {} link was not successful even after {} seconds",
                    title,
                    self.element_timeout().as_secs()
                )));
            }
        }
        info!(title, "main menu opened");
        Ok(())
    }

    /// Activate a sub panel link under an open menu.
    pub async fn open_sub_link(&self, title: &str) -> Result<()> {
        let result = self.activate_sub_link(title).await;
        self.screenshots
            .capture_quietly(&self.driver, "open_sub_link")
            .await;
        result
    }

    async fn activate_sub_link(&self, title: &str) -> Result<()> {
        if !self.wait_for_text(title, self.element_timeout()).await? {
            return Err(PageError::Timeout(format!(
                "{} link was not found on the page",
                title
            )));
        }
        self.driver.click_link_with_text(title).await?;

        let locator = self.locator("npsp_settings.panel_sub_link", &[title])?;
        if !self.wait_for_element(&locator, self.element_timeout()).await? {
            return Err(PageError::Timeout(format!(
                "click on {} sublink was not successful even after {} seconds",
                title,
                self.element_timeout().as_secs()
            )));
        }
        info!(title, "sub link opened");
        Ok(())
    }

    // Form controls

    /// Click a button in a settings panel by the panel id and button label.
    pub async fn click_settings_button(&self, panel_id: &str, button_value: &str) -> Result<()> {
        self.capture_on_error("click_settings_button", async {
            let locator = self.locator("npsp_settings.batch-button", &[panel_id, button_value])?;
            if !self.wait_for_element(&locator, self.element_timeout()).await? {
                return Err(PageError::Timeout(format!(
                    "{} did not appear on page",
                    button_value
                )));
            }

            let visible_timeout = Duration::from_millis(self.config.timeouts.button_visible_ms);
            if !self.wait_for_visible(&locator, visible_timeout).await? {
                return Err(PageError::Timeout(format!(
                    "{} was not visible after {} seconds",
                    button_value,
                    visible_timeout.as_secs()
                )));
            }

            self.driver.js_click(&locator).await?;
            self.screenshots
                .capture(&self.driver, "click_settings_button")
                .await?;
            Ok(())
        })
        .await
    }

    pub async fn select_value_from_list(&self, list_name: &str, value: &str) -> Result<()> {
        let locator = self.locator("npsp_settings.list", &[list_name])?;
        self.driver.set_focus(&locator).await?;
        self.driver.select_from_list_by_label(&locator, value).await
    }

    /// Select a list value while the panel is in edit mode.
    pub async fn edit_selection(&self, list_name: &str, value: &str) -> Result<()> {
        let save = self.locator("npsp_settings.batch-button", &[EDIT_PANEL, "Save"])?;
        if !self.driver.element_exists(&save).await? {
            return Err(PageError::Precondition("Edit mode is not active".to_string()));
        }

        self.select_value_from_list(list_name, value).await?;
        self.settle_selection(list_name, value).await
    }

    /// Give the list a bounded window to reflect the selection.
    async fn settle_selection(&self, list_name: &str, value: &str) -> Result<()> {
        let locator = self.locator("npsp_settings.list", &[list_name])?;
        let driver = &self.driver;
        let selector = locator.as_str();

        let settled = wait_until(
            Duration::from_millis(self.config.timeouts.settle_ms),
            self.config.timeouts.poll_interval(),
            move || async move {
                let selected = driver.selected_list_label(selector).await?;
                Ok::<bool, PageError>(selected.as_deref() == Some(value))
            },
        )
        .await?;

        if !settled {
            warn!(list = list_name, value, "list selection did not settle in time");
        }
        Ok(())
    }

    /// Check a list shows `value` once the panel has left edit mode.
    pub async fn verify_selection(&self, list_name: &str, value: &str) -> Result<()> {
        self.capture_on_error("verify_selection", async {
            let edit = self.locator("npsp_settings.batch-button", &[EDIT_PANEL, "Edit"])?;
            if !self.driver.element_exists(&edit).await? {
                return Err(PageError::Precondition("Still in Edit mode".to_string()));
            }

            let locator = self.locator("npsp_settings.list_val", &[list_name, value])?;
            if !self.wait_for_element(&locator, self.element_timeout()).await? {
                return Err(PageError::Assertion(format!(
                    "{} did not contain {}",
                    list_name, value
                )));
            }
            Ok(())
        })
        .await
    }

    /// Click the checkbox-style toggle whose container id contains `page_name`.
    pub async fn click_toggle_button(&self, page_name: &str) -> Result<()> {
        self.capture_on_error("click_toggle_button", async {
            let locator = self.locator("npsp_settings.checkbox", &[page_name])?;
            if !self.wait_for_enabled(&locator, self.element_timeout()).await? {
                return Err(PageError::Timeout(
                    "Checkbox could not be found on the page".to_string(),
                ));
            }
            self.driver.scroll_into_view(&locator).await?;
            self.screenshots.capture(&self.driver, "toggle_before").await?;
            self.driver.click(&locator).await?;
            self.screenshots.capture(&self.driver, "toggle_after").await?;
            info!(toggle = page_name, "toggle clicked");
            Ok(())
        })
        .await
    }

    /// Open the Advanced Mapping configuration and wait for its object list.
    pub async fn click_configure_advanced_mapping(&self) -> Result<()> {
        let locator = self.locator("id", &[Feature::AdvancedMapping.probe_id()])?;
        self.driver.click(&locator).await?;

        let timeout = Duration::from_millis(self.config.timeouts.advanced_mapping_load_ms);
        if !self.wait_for_text("Account", timeout).await? {
            return Err(PageError::Timeout(format!(
                "Objects did not load in {} seconds",
                timeout.as_secs()
            )));
        }
        Ok(())
    }

    // Confirmation polling

    /// Poll for `message` anywhere on the page.
    ///
    /// Performs at most `message_poll.attempts` presence checks (13 by
    /// default), the first immediately and the rest `interval_ms` apart,
    /// with no sleep after the final check.
    pub async fn wait_for_message(&self, message: &str) -> Result<()> {
        self.capture_on_error("wait_for_message", async {
            let driver = &self.driver;
            let found = poll_attempts(self.message_budget(), move |attempt| {
                debug!(attempt, text = message, "checking for message");
                driver.page_contains(message)
            })
            .await;

            match found {
                Some(attempt) => {
                    info!(text = message, attempt, "message displayed");
                    Ok(())
                }
                None => Err(PageError::Timeout(format!(
                    "Timed out waiting for {} to display",
                    message
                ))),
            }
        })
        .await
    }

    // Features

    fn feature_probe(&self, feature: Feature) -> Result<String> {
        self.locator("id", &[feature.probe_id()])
    }

    /// Re-query the page for the current state of a feature.
    pub async fn feature_state(&self, feature: Feature) -> Result<FeatureState> {
        let selector = self.feature_probe(feature)?;
        let probe = self
            .driver
            .is_feature_enabled(&selector, &feature.signal())
            .await?;
        let state = FeatureState::from(probe);
        debug!(feature = %feature, ?state, "feature state");
        Ok(state)
    }

    pub async fn is_feature_enabled(&self, feature: Feature) -> Result<bool> {
        Ok(self.feature_state(feature).await? == FeatureState::Enabled)
    }

    pub async fn enable_advanced_mapping_if_not_enabled(&self) -> Result<()> {
        match self.feature_state(Feature::AdvancedMapping).await? {
            FeatureState::Disabled => {
                info!("Advanced Mapping is not enabled, enabling it");
                self.click_toggle_button(Feature::AdvancedMapping.toggle_label())
                    .await?;
                self.wait_for_message("Advanced Mapping is enabled").await?;
                // Enabling reloads the settings frame.
                self.choose_settings_frame().await?;
            }
            FeatureState::Enabled => info!("Advanced Mapping is already enabled"),
            FeatureState::Absent => warn!("Advanced Mapping toggle is not on the page"),
        }
        Ok(())
    }

    pub async fn verify_advanced_mapping_is_not_enabled(&self) -> Result<()> {
        match self.feature_state(Feature::AdvancedMapping).await? {
            FeatureState::Enabled => Err(PageError::StateAssumption(
                "Advanced Mapping is already enabled. Org should not have this enabled by default"
                    .to_string(),
            )),
            FeatureState::Disabled => {
                info!("As expected Advanced Mapping is not enabled by default");
                Ok(())
            }
            FeatureState::Absent => {
                debug!("Advanced Mapping link is not on the page");
                Ok(())
            }
        }
    }

    pub async fn enable_customizable_rollups_if_not_enabled(&self) -> Result<()> {
        self.capture_on_error("enable_customizable_rollups_if_not_enabled", async {
            if self.is_feature_enabled(Feature::CustomizableRollups).await? {
                info!("Customizable Rollups is already enabled");
                return Ok(());
            }

            info!("Customizable Rollups is not enabled by default, enabling it");
            self.click_toggle_button(Feature::CustomizableRollups.toggle_label())
                .await?;

            let probe = self.feature_probe(Feature::CustomizableRollups)?;
            let timeout = Duration::from_millis(self.config.timeouts.rollups_ms);
            if !self.wait_for_element(&probe, timeout).await? {
                return Err(PageError::Timeout(format!(
                    "Customizable Rollups was not enabled after {} seconds",
                    timeout.as_secs()
                )));
            }
            info!("Customizable Rollups is enabled");
            Ok(())
        })
        .await
    }

    /// Gift Entry must start disabled; switch it off again if an earlier run
    /// left it on.
    pub async fn verify_gift_entry_is_not_enabled(&self) -> Result<()> {
        match self.feature_state(Feature::GiftEntry).await? {
            FeatureState::Enabled => {
                warn!("Gift Entry is already enabled. Org should not have this enabled by default");
                self.click_toggle_button(Feature::GiftEntry.toggle_label())
                    .await?;
                self.wait_for_message("Gift Entry Disabled").await?;
            }
            FeatureState::Disabled => info!("As expected Gift Entry is Disabled"),
            FeatureState::Absent => debug!("Gift Entry toggle is not on the page"),
        }
        Ok(())
    }

    /// Gift Entry depends on Advanced Mapping, which is enabled first.
    pub async fn enable_gift_entry_if_not_enabled(&self) -> Result<()> {
        self.enable_advanced_mapping_if_not_enabled().await?;

        match self.feature_state(Feature::GiftEntry).await? {
            FeatureState::Enabled => info!("Gift Entry is already enabled"),
            FeatureState::Disabled => {
                self.click_toggle_button(Feature::GiftEntry.toggle_label())
                    .await?;
                self.wait_for_message("Gift Entry Enabled").await?;
                self.choose_settings_frame().await?;
            }
            FeatureState::Absent => warn!("Gift Entry toggle is not on the page"),
        }
        Ok(())
    }

    /// Whether the org already shows the Customizable Rollups configure
    /// button, i.e. `true` means rollups are enabled.
    pub async fn check_crlp_not_enabled_by_default(&self) -> Result<bool> {
        let selector = self.feature_probe(Feature::CustomizableRollups)?;
        let signal = EnablementSignal::AttributeContains("value", CRLP_CONFIGURE_MARKER);
        let enabled = self
            .driver
            .is_feature_enabled(&selector, &signal)
            .await?
            .unwrap_or(false);
        if enabled {
            info!("This Org has Customizable Rollups Enabled");
        }
        Ok(enabled)
    }

    /// Whether the Enhanced Recurring Donations MetaDeploy plan shows as installed.
    pub async fn check_metadeploy_exists(&self) -> Result<bool> {
        self.capture_on_error("check_metadeploy_exists", self.rd2_installed())
            .await
    }

    async fn rd2_installed(&self) -> Result<bool> {
        let locator = self.locator("erd.rd2_installed", &[])?;
        self.driver.element_visible(&locator).await
    }

    /// Follow the RD2 upgrade link, if offered, and report whether the
    /// upgrade shows as installed.
    pub async fn check_rd2_is_enabled(&self) -> Result<bool> {
        self.capture_on_error("check_rd2_is_enabled", async {
            if !self.driver.link_exists(UPGRADE_RD2_LINK).await? {
                return Ok(false);
            }
            self.driver.click_link_with_text(UPGRADE_RD2_LINK).await?;
            tokio::time::sleep(Duration::from_millis(
                self.config.timeouts.navigation_settle_ms,
            ))
            .await;
            self.rd2_installed().await
        })
        .await
    }
}

#[cfg(test)]
mod tests;
