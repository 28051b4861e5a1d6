use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub headless: bool,
    pub viewport: Viewport,
    pub user_agent: Option<String>,
    pub disable_images: bool,
    pub args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport: Viewport {
                width: 1280,
                height: 720,
            },
            user_agent: None,
            disable_images: false,
            args: vec![],
        }
    }
}

/// Which document the driver session currently addresses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FrameContext {
    #[default]
    TopLevel,
    /// Nested frame, addressed by its `title` attribute.
    Frame(String),
}

impl fmt::Display for FrameContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameContext::TopLevel => write!(f, "top-level document"),
            FrameContext::Frame(title) => write!(f, "frame '{}'", title),
        }
    }
}

/// How a probe element reports that its feature is switched on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnablementSignal {
    /// Enabled when the element exists at all.
    Presence,
    /// Enabled unless the class list carries the marker class.
    ClassAbsent(&'static str),
    /// Enabled when the attribute has exactly this value.
    AttributeEquals(&'static str, &'static str),
    /// Enabled when the attribute value contains the marker substring.
    AttributeContains(&'static str, &'static str),
}

impl EnablementSignal {
    /// Attribute the driver has to read, if any.
    pub fn attribute(&self) -> Option<&'static str> {
        match self {
            EnablementSignal::Presence => None,
            EnablementSignal::ClassAbsent(_) => Some("class"),
            EnablementSignal::AttributeEquals(name, _) => Some(*name),
            EnablementSignal::AttributeContains(name, _) => Some(*name),
        }
    }

    /// Interpret the attribute value of an element that is known to exist.
    pub fn evaluate(&self, value: Option<&str>) -> bool {
        match self {
            EnablementSignal::Presence => true,
            EnablementSignal::ClassAbsent(marker) => !value
                .unwrap_or("")
                .split_whitespace()
                .any(|class| class == *marker),
            EnablementSignal::AttributeEquals(_, expected) => value == Some(*expected),
            EnablementSignal::AttributeContains(_, marker) => {
                value.map(|v| v.contains(marker)).unwrap_or(false)
            }
        }
    }
}

/// Switchable NPSP features managed from the settings page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    AdvancedMapping,
    CustomizableRollups,
    GiftEntry,
}

impl Feature {
    /// Label of the toggle under which the feature's checkbox lives.
    pub fn toggle_label(&self) -> &'static str {
        match self {
            Feature::AdvancedMapping => "Advanced Mapping",
            Feature::CustomizableRollups => "Customizable Rollups",
            Feature::GiftEntry => "Gift Entry",
        }
    }

    /// DOM id of the element inspected to learn the feature state.
    pub fn probe_id(&self) -> &'static str {
        match self {
            Feature::AdvancedMapping => "navigateAdvancedMapping",
            Feature::CustomizableRollups => "navigateCRLPs",
            Feature::GiftEntry => "enableGiftEntryToggle",
        }
    }

    pub fn signal(&self) -> EnablementSignal {
        match self {
            Feature::AdvancedMapping => EnablementSignal::ClassAbsent("slds-hide"),
            Feature::CustomizableRollups => EnablementSignal::Presence,
            Feature::GiftEntry => EnablementSignal::AttributeEquals("checked", "true"),
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.toggle_label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureState {
    Enabled,
    Disabled,
    /// The probe element is not on the page.
    Absent,
}

impl From<Option<bool>> for FeatureState {
    fn from(probe: Option<bool>) -> Self {
        match probe {
            Some(true) => FeatureState::Enabled,
            Some(false) => FeatureState::Disabled,
            None => FeatureState::Absent,
        }
    }
}
