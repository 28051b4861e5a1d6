#[cfg(feature = "chrome")]
pub mod browser;
pub mod core;
pub mod errors;
pub mod keywords;
pub mod locators;
pub mod settings;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod types;
pub mod utils;
pub mod wait;

#[cfg(feature = "chrome")]
pub use browser::ChromeDriver;
pub use crate::core::{AutomationDriver, Config};
pub use errors::{PageError, Result};
pub use keywords::{KeywordRegistry, KeywordResult};
pub use locators::{LocatorTable, Locators};
pub use settings::SettingsPage;
pub use types::*;
