use crate::core::config::ScreenshotConfig;
use crate::core::AutomationDriver;
use crate::errors::{PageError, Result};
use base64::Engine;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::{info, warn};

/// Captures numbered diagnostic screenshots and optionally writes them to disk.
pub struct ScreenshotRecorder {
    enabled: bool,
    directory: Option<PathBuf>,
    taken: AtomicUsize,
    last: Mutex<Option<Vec<u8>>>,
}

impl ScreenshotRecorder {
    pub fn new(config: &ScreenshotConfig) -> Self {
        Self {
            enabled: config.enabled,
            directory: config.directory.clone(),
            taken: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    /// Capture the current viewport. Returns the written file, if any.
    pub async fn capture<D: AutomationDriver + ?Sized>(
        &self,
        driver: &D,
        label: &str,
    ) -> Result<Option<PathBuf>> {
        if !self.enabled {
            return Ok(None);
        }

        let bytes = driver.capture_screenshot().await?;
        let number = self.taken.fetch_add(1, Ordering::SeqCst) + 1;

        let path = match &self.directory {
            Some(dir) => {
                tokio::fs::create_dir_all(dir).await?;
                let name = format!(
                    "npsp-settings-{:03}-{}-{}.png",
                    number,
                    sanitize(label),
                    chrono::Local::now().format("%Y%m%d-%H%M%S")
                );
                let path = dir.join(name);
                tokio::fs::write(&path, &bytes)
                    .await
                    .map_err(|e| PageError::ScreenshotFailed(format!("{}: {}", path.display(), e)))?;
                info!(path = %path.display(), "captured screenshot");
                Some(path)
            }
            None => None,
        };

        *self.last.lock().unwrap_or_else(|e| e.into_inner()) = Some(bytes);
        Ok(path)
    }

    /// Capture for diagnostics after a failure; problems are logged, not returned.
    pub async fn capture_quietly<D: AutomationDriver + ?Sized>(&self, driver: &D, label: &str) {
        if let Err(e) = self.capture(driver, label).await {
            warn!(label, error = %e, "could not capture screenshot");
        }
    }

    pub fn count(&self) -> usize {
        self.taken.load(Ordering::SeqCst)
    }

    pub fn last_base64(&self) -> Option<String> {
        self.last
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|bytes| base64::engine::general_purpose::STANDARD.encode(bytes))
    }
}

fn sanitize(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect()
}
