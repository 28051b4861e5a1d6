use crate::core::AutomationDriver;
use crate::errors::{PageError, Result};
use crate::settings::SettingsPage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Result of a keyword execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordResult {
    pub success: bool,
    pub message: String,
    pub data: Option<serde_json::Value>,
    pub execution_time_ms: u64,
}

impl KeywordResult {
    pub fn success(message: String) -> Self {
        Self {
            success: true,
            message,
            data: None,
            execution_time_ms: 0,
        }
    }

    pub fn success_with_data(message: String, data: serde_json::Value) -> Self {
        Self {
            success: true,
            message,
            data: Some(data),
            execution_time_ms: 0,
        }
    }

    pub fn failure(message: String) -> Self {
        Self {
            success: false,
            message,
            data: None,
            execution_time_ms: 0,
        }
    }

    pub fn with_execution_time(mut self, time_ms: u64) -> Self {
        self.execution_time_ms = time_ms;
        self
    }
}

/// Per-invocation context handed to keywords.
#[derive(Debug, Clone)]
pub struct KeywordContext {
    pub run_id: String,
}

impl KeywordContext {
    pub fn new() -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

impl Default for KeywordContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A named operation callable from a test suite.
#[async_trait]
pub trait Keyword<D: AutomationDriver>: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Positional argument names, in call order.
    fn parameters(&self) -> &[&'static str];

    fn parameter_schema(&self) -> serde_json::Value {
        json!({ "arguments": self.parameters() })
    }

    async fn execute(
        &self,
        args: &[String],
        page: &SettingsPage<D>,
        context: &KeywordContext,
    ) -> Result<KeywordResult>;

    fn validate_args(&self, args: &[String]) -> Result<()> {
        let expected = self.parameters();
        if args.len() != expected.len() {
            return Err(PageError::InvalidArguments(format!(
                "{} expects {} argument(s) ({}), got {}",
                self.name(),
                expected.len(),
                expected.join(", "),
                args.len()
            )));
        }
        Ok(())
    }
}

/// Settings page operations exposed as keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsOperation {
    OpenSettingsPage,
    ChooseSettingsFrame,
    OpenMainMenu,
    OpenSubLink,
    ClickSettingsButton,
    SelectValueFromList,
    EditSelection,
    VerifySelection,
    ClickToggleButton,
    ClickConfigureAdvancedMapping,
    WaitForMessage,
    EnableAdvancedMappingIfNotEnabled,
    VerifyAdvancedMappingIsNotEnabled,
    EnableCustomizableRollupsIfNotEnabled,
    VerifyGiftEntryIsNotEnabled,
    EnableGiftEntryIfNotEnabled,
    CheckCrlpNotEnabledByDefault,
    CheckMetadeployExists,
    CheckRd2IsEnabled,
}

/// Binds a [`SettingsOperation`] to its keyword name and arguments.
#[derive(Debug, Clone, Copy)]
pub struct SettingsKeyword {
    name: &'static str,
    description: &'static str,
    parameters: &'static [&'static str],
    operation: SettingsOperation,
}

impl SettingsKeyword {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        parameters: &'static [&'static str],
        operation: SettingsOperation,
    ) -> Self {
        Self {
            name,
            description,
            parameters,
            operation,
        }
    }
}

fn done(name: &str) -> KeywordResult {
    KeywordResult::success(format!("{} passed", name))
}

fn answered(name: &str, value: bool) -> KeywordResult {
    KeywordResult::success_with_data(format!("{} returned {}", name, value), json!(value))
}

#[async_trait]
impl<D: AutomationDriver> Keyword<D> for SettingsKeyword {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn parameters(&self) -> &[&'static str] {
        self.parameters
    }

    async fn execute(
        &self,
        args: &[String],
        page: &SettingsPage<D>,
        _context: &KeywordContext,
    ) -> Result<KeywordResult> {
        use SettingsOperation::*;

        let arg = |i: usize| args.get(i).map(String::as_str).unwrap_or_default();
        let name = self.name;

        match self.operation {
            OpenSettingsPage => page.open_settings_page().await.map(|_| done(name)),
            ChooseSettingsFrame => page.choose_settings_frame().await.map(|_| done(name)),
            OpenMainMenu => page.open_main_menu(arg(0)).await.map(|_| done(name)),
            OpenSubLink => page.open_sub_link(arg(0)).await.map(|_| done(name)),
            ClickSettingsButton => page
                .click_settings_button(arg(0), arg(1))
                .await
                .map(|_| done(name)),
            SelectValueFromList => page
                .select_value_from_list(arg(0), arg(1))
                .await
                .map(|_| done(name)),
            EditSelection => page.edit_selection(arg(0), arg(1)).await.map(|_| done(name)),
            VerifySelection => page
                .verify_selection(arg(0), arg(1))
                .await
                .map(|_| done(name)),
            ClickToggleButton => page.click_toggle_button(arg(0)).await.map(|_| done(name)),
            ClickConfigureAdvancedMapping => page
                .click_configure_advanced_mapping()
                .await
                .map(|_| done(name)),
            WaitForMessage => page.wait_for_message(arg(0)).await.map(|_| done(name)),
            EnableAdvancedMappingIfNotEnabled => page
                .enable_advanced_mapping_if_not_enabled()
                .await
                .map(|_| done(name)),
            VerifyAdvancedMappingIsNotEnabled => page
                .verify_advanced_mapping_is_not_enabled()
                .await
                .map(|_| done(name)),
            EnableCustomizableRollupsIfNotEnabled => page
                .enable_customizable_rollups_if_not_enabled()
                .await
                .map(|_| done(name)),
            VerifyGiftEntryIsNotEnabled => page
                .verify_gift_entry_is_not_enabled()
                .await
                .map(|_| done(name)),
            EnableGiftEntryIfNotEnabled => page
                .enable_gift_entry_if_not_enabled()
                .await
                .map(|_| done(name)),
            CheckCrlpNotEnabledByDefault => page
                .check_crlp_not_enabled_by_default()
                .await
                .map(|v| answered(name, v)),
            CheckMetadeployExists => page
                .check_metadeploy_exists()
                .await
                .map(|v| answered(name, v)),
            CheckRd2IsEnabled => page
                .check_rd2_is_enabled()
                .await
                .map(|v| answered(name, v)),
        }
    }
}

/// Every settings keyword with its Robot-style name.
pub const SETTINGS_KEYWORDS: &[SettingsKeyword] = {
    use SettingsOperation::*;
    &[
        SettingsKeyword::new(
            "Open Settings Page",
            "Navigate to the NPSP Settings tab and enter its frame",
            &[],
            OpenSettingsPage,
        ),
        SettingsKeyword::new(
            "Choose Settings Frame",
            "Re-enter the settings frame from the top-level document",
            &[],
            ChooseSettingsFrame,
        ),
        SettingsKeyword::new(
            "Open Main Menu",
            "Expand a top-level settings menu",
            &["title"],
            OpenMainMenu,
        ),
        SettingsKeyword::new(
            "Open Sub Link",
            "Open a panel link under the current menu",
            &["title"],
            OpenSubLink,
        ),
        SettingsKeyword::new(
            "Click Settings Button",
            "Click a panel button by panel id and label",
            &["panel_id", "button_value"],
            ClickSettingsButton,
        ),
        SettingsKeyword::new(
            "Select Value From List",
            "Choose a list option by its visible label",
            &["list_name", "value"],
            SelectValueFromList,
        ),
        SettingsKeyword::new(
            "Edit Selection",
            "Choose a list option while the panel is in edit mode",
            &["list_name", "value"],
            EditSelection,
        ),
        SettingsKeyword::new(
            "Verify Selection",
            "Check a saved list shows the expected value",
            &["list_name", "value"],
            VerifySelection,
        ),
        SettingsKeyword::new(
            "Click Toggle Button",
            "Click a feature toggle checkbox",
            &["page_name"],
            ClickToggleButton,
        ),
        SettingsKeyword::new(
            "Click Configure Advanced Mapping",
            "Open Advanced Mapping configuration and wait for objects",
            &[],
            ClickConfigureAdvancedMapping,
        ),
        SettingsKeyword::new(
            "Wait For Message",
            "Poll until a confirmation message is displayed",
            &["message"],
            WaitForMessage,
        ),
        SettingsKeyword::new(
            "Enable Advanced Mapping If Not Enabled",
            "Turn Advanced Mapping on unless it already is",
            &[],
            EnableAdvancedMappingIfNotEnabled,
        ),
        SettingsKeyword::new(
            "Verify Advanced Mapping Is Not Enabled",
            "Fail if Advanced Mapping is enabled in a fresh org",
            &[],
            VerifyAdvancedMappingIsNotEnabled,
        ),
        SettingsKeyword::new(
            "Enable Customizable Rollups If Not Enabled",
            "Turn Customizable Rollups on unless it already is",
            &[],
            EnableCustomizableRollupsIfNotEnabled,
        ),
        SettingsKeyword::new(
            "Verify Gift Entry Is Not Enabled",
            "Switch Gift Entry off if a previous run left it on",
            &[],
            VerifyGiftEntryIsNotEnabled,
        ),
        SettingsKeyword::new(
            "Enable Gift Entry If Not Enabled",
            "Turn Gift Entry on, enabling Advanced Mapping first",
            &[],
            EnableGiftEntryIfNotEnabled,
        ),
        SettingsKeyword::new(
            "Check Crlp Not Enabled By Default",
            "Report whether Customizable Rollups is already enabled",
            &[],
            CheckCrlpNotEnabledByDefault,
        ),
        SettingsKeyword::new(
            "Check Metadeploy Exists",
            "Report whether the Enhanced Recurring Donations plan is installed",
            &[],
            CheckMetadeployExists,
        ),
        SettingsKeyword::new(
            "Check Rd2 Is Enabled",
            "Follow the RD2 upgrade link and report installation",
            &[],
            CheckRd2IsEnabled,
        ),
    ]
};
