//! Step screenshots for the audit trail.
//!
//! The wizard driver records one image after every step through a
//! [`StepRecorder`]. Capturing is best effort: failures are logged and never
//! change the outcome of the step.

use crate::backend::Backend;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, warn};

#[async_trait]
pub trait ScreenshotSink: Send {
    /// Whether captures should be taken at all.
    fn enabled(&self) -> bool {
        true
    }

    /// Store one PNG of `request`'s attempt. `index` is 1-based within the
    /// attempt.
    async fn store(
        &mut self,
        request: &str,
        attempt: u32,
        index: usize,
        label: &str,
        png: &[u8],
    ) -> std::io::Result<()>;
}

/// Discards everything; captures are skipped entirely.
pub struct NullSink;

#[async_trait]
impl ScreenshotSink for NullSink {
    fn enabled(&self) -> bool {
        false
    }

    async fn store(&mut self, _: &str, _: u32, _: usize, _: &str, _: &[u8]) -> std::io::Result<()> {
        Ok(())
    }
}

/// Writes `<root>/<request>/[attempt_NNNN/]NN_<label>.png`.
pub struct DirectorySink {
    root: PathBuf,
    per_attempt_dirs: bool,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            per_attempt_dirs: false,
        }
    }

    /// Keep each attempt's images in their own subdirectory (used when polling).
    pub fn per_attempt(mut self, enabled: bool) -> Self {
        self.per_attempt_dirs = enabled;
        self
    }

    pub fn path_for(&self, request: &str, attempt: u32, index: usize, label: &str) -> PathBuf {
        let mut dir = self.root.join(sanitize_label(request));
        if self.per_attempt_dirs {
            dir.push(format!("attempt_{:04}", attempt));
        }
        dir.join(format!("{:02}_{}.png", index, sanitize_label(label)))
    }
}

#[async_trait]
impl ScreenshotSink for DirectorySink {
    async fn store(
        &mut self,
        request: &str,
        attempt: u32,
        index: usize,
        label: &str,
        png: &[u8],
    ) -> std::io::Result<()> {
        let path = self.path_for(request, attempt, index, label);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, png).await?;
        debug!("Saved screenshot {}", path.display());
        Ok(())
    }
}

fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

/// Step counter for one attempt of one request, threaded explicitly through
/// the driver.
pub struct StepRecorder<'a> {
    sink: &'a mut dyn ScreenshotSink,
    request: String,
    attempt: u32,
    steps: usize,
}

impl<'a> StepRecorder<'a> {
    pub fn new(sink: &'a mut dyn ScreenshotSink, request: &str, attempt: u32) -> Self {
        Self {
            sink,
            request: request.to_string(),
            attempt,
            steps: 0,
        }
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Count the step and capture the page under `label`.
    pub async fn record<B: Backend + ?Sized>(&mut self, backend: &mut B, label: &str) {
        self.steps += 1;
        if !self.sink.enabled() {
            return;
        }
        match backend.screenshot().await {
            Ok(png) => {
                if let Err(e) = self
                    .sink
                    .store(&self.request, self.attempt, self.steps, label, &png)
                    .await
                {
                    warn!("Failed to store screenshot '{}': {}", label, e);
                }
            }
            Err(e) => warn!("Failed to capture screenshot '{}': {}", label, e),
        }
    }
}
