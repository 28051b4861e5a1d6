pub mod base;
pub mod registry;

pub use base::{Keyword, KeywordContext, KeywordResult, SettingsKeyword, SettingsOperation};
pub use registry::{KeywordMetadata, KeywordRegistry};
