//! Symbolic locator keys resolved to concrete selectors.
//!
//! Templates use positional placeholders: `{}` takes the next argument and
//! `{N}` takes argument `N`. `{{` and `}}` produce literal braces.
//! Resolution happens on every call; nothing is cached between calls.

use crate::errors::{PageError, Result};
use regex::Regex;
use serde_json::Value;
use std::path::Path;
use std::sync::OnceLock;

pub trait Locators: Send + Sync {
    /// Resolve a dotted key path such as `npsp_settings.main_menu` with
    /// positional arguments into a selector string.
    fn resolve(&self, key: &str, args: &[&str]) -> Result<String>;
}

/// Locator templates loaded from a nested JSON object.
#[derive(Debug, Clone)]
pub struct LocatorTable {
    entries: Value,
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{\{|\}\}|\{(\d*)\}").expect("placeholder pattern"))
}

impl LocatorTable {
    pub fn new(entries: Value) -> Result<Self> {
        if !entries.is_object() {
            return Err(PageError::InvalidLocator(
                "locator table root must be a JSON object".to_string(),
            ));
        }
        Ok(Self { entries })
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        Self::new(serde_json::from_str(raw)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    /// Locators for the NPSP Settings page in Lightning Experience.
    pub fn npsp_defaults() -> Self {
        Self {
            entries: serde_json::json!({
                "frame": "//iframe[contains(@title, '{}')]",
                "id": "//*[contains(@id, '{}')]",
                "npsp_settings": {
                    "main_menu": "//div[contains(@class, 'slds-section') and contains(@class, 'slds-is-open')]//button[./span[text()='{}']]",
                    "donations_link": "(//div[@id='mainMenu']//a[text()='{}'])[1]",
                    "panel_sub_link": "//li[contains(@class, 'slds-is-active')]//a[text()='{}']",
                    "batch-button": "//div[@id='{}']//form//div[contains(@class, 'slds-button-group')]//input[@value='{}']",
                    "list": "//div[./label[text()='{}']]//select",
                    "list_val": "//div[./label[text()='{}']]//span[text()='{}']",
                    "checkbox": "//div[contains(@id, '{}')]//span[contains(@class, 'slds-checkbox_faux')]"
                },
                "erd": {
                    "rd2_installed": "//div[contains(@class, 'slds-card')]//span[contains(@class, 'slds-badge') and text()='Installed']"
                }
            }),
        }
    }

    fn lookup(&self, key: &str) -> Option<&Value> {
        key.split('.')
            .try_fold(&self.entries, |node, segment| node.get(segment))
    }
}

impl Locators for LocatorTable {
    fn resolve(&self, key: &str, args: &[&str]) -> Result<String> {
        let template = self
            .lookup(key)
            .ok_or_else(|| PageError::LocatorNotFound(key.to_string()))?
            .as_str()
            .ok_or_else(|| {
                PageError::InvalidLocator(format!("'{}' does not name a selector template", key))
            })?;
        format_template(key, template, args)
    }
}

fn format_template(key: &str, template: &str, args: &[&str]) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    let mut next_arg = 0;

    for caps in placeholder_pattern().captures_iter(template) {
        let whole = caps.get(0).expect("group 0 always matches");
        out.push_str(&template[last..whole.start()]);
        last = whole.end();

        match whole.as_str() {
            "{{" => out.push('{'),
            "}}" => out.push('}'),
            _ => {
                let index = match caps.get(1).map(|m| m.as_str()).unwrap_or("") {
                    "" => {
                        next_arg += 1;
                        next_arg - 1
                    }
                    digits => digits.parse::<usize>().map_err(|e| {
                        PageError::InvalidLocator(format!("{}: bad placeholder index: {}", key, e))
                    })?,
                };
                let arg = args.get(index).ok_or_else(|| {
                    PageError::InvalidLocator(format!(
                        "'{}' needs argument #{} but only {} given",
                        key,
                        index,
                        args.len()
                    ))
                })?;
                out.push_str(arg);
            }
        }
    }
    out.push_str(&template[last..]);
    Ok(out)
}
