use crate::core::AutomationDriver;
use crate::errors::{PageError, Result};
use crate::keywords::base::{KeywordContext, SETTINGS_KEYWORDS};
use crate::keywords::{Keyword, KeywordResult};
use crate::settings::SettingsPage;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, info_span, Instrument};

/// Registry of keywords callable by name
pub struct KeywordRegistry<D: AutomationDriver> {
    keywords: HashMap<String, Arc<dyn Keyword<D>>>,
}

/// Lowercase with spaces and underscores removed, so "Open Main Menu",
/// "open_main_menu" and "OpenMainMenu" all match.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

impl<D: AutomationDriver + 'static> KeywordRegistry<D> {
    pub fn new() -> Self {
        Self {
            keywords: HashMap::new(),
        }
    }

    /// Registry holding every settings page keyword.
    pub fn with_settings_keywords() -> Self {
        let mut registry = Self::new();
        for keyword in SETTINGS_KEYWORDS {
            registry.register(*keyword);
        }
        registry
    }

    pub fn register<K: Keyword<D> + 'static>(&mut self, keyword: K) {
        let name = normalize_name(keyword.name());
        self.keywords.insert(name, Arc::new(keyword));
    }

    pub fn get_keyword(&self, name: &str) -> Option<Arc<dyn Keyword<D>>> {
        self.keywords.get(&normalize_name(name)).cloned()
    }

    /// Display names of all registered keywords, sorted.
    pub fn list_keywords(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .keywords
            .values()
            .map(|k| k.name().to_string())
            .collect();
        names.sort();
        names
    }

    pub async fn execute(
        &self,
        name: &str,
        args: Vec<String>,
        page: &SettingsPage<D>,
    ) -> Result<KeywordResult> {
        let keyword = self
            .get_keyword(name)
            .ok_or_else(|| PageError::KeywordNotFound(name.to_string()))?;

        keyword.validate_args(&args)?;

        let context = KeywordContext::new();
        let span = info_span!("keyword", keyword = keyword.name(), run_id = %context.run_id);

        let start_time = std::time::Instant::now();
        let result = keyword
            .execute(&args, page, &context)
            .instrument(span)
            .await?;
        let execution_time = start_time.elapsed().as_millis() as u64;

        info!(keyword = keyword.name(), execution_time, "keyword finished");
        Ok(result.with_execution_time(execution_time))
    }

    pub fn get_keyword_metadata(&self, name: &str) -> Option<KeywordMetadata> {
        self.get_keyword(name).map(|keyword| KeywordMetadata::of(keyword.as_ref()))
    }

    pub fn get_all_metadata(&self) -> Vec<KeywordMetadata> {
        let mut all: Vec<KeywordMetadata> = self
            .keywords
            .values()
            .map(|keyword| KeywordMetadata::of(keyword.as_ref()))
            .collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }
}

impl<D: AutomationDriver + 'static> Default for KeywordRegistry<D> {
    fn default() -> Self {
        Self::new()
    }
}

/// Metadata about a keyword
#[derive(Debug, Clone)]
pub struct KeywordMetadata {
    pub name: String,
    pub description: String,
    pub parameter_schema: serde_json::Value,
}

impl KeywordMetadata {
    fn of<D: AutomationDriver>(keyword: &dyn Keyword<D>) -> Self {
        Self {
            name: keyword.name().to_string(),
            description: keyword.description().to_string(),
            parameter_schema: keyword.parameter_schema(),
        }
    }
}
