//! One complete, non-retried pass of the wizard.

use crate::backend::{Backend, BackendFactory};
use crate::config::EngineConfig;
use crate::credentials::Credentials;
use crate::error::WizardError;
use crate::request::BookingRequest;
use crate::screenshots::{ScreenshotSink, StepRecorder};
use crate::wizard::WizardStepDriver;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The reservation was submitted.
    Completed,
    /// Everything was filled in; the submit was withheld because no explicit
    /// confirmation was given.
    AwaitingConfirmation,
    /// The caller asked to stop before submitting.
    DryRunStopped,
}

/// Either the retryable "no availability" signal or a fatal failure.
#[derive(Debug, Error, Clone)]
pub enum AttemptError {
    #[error("{0}")]
    Unavailable(String),

    #[error(transparent)]
    Fatal(WizardError),
}

impl From<WizardError> for AttemptError {
    fn from(err: WizardError) -> Self {
        match err {
            WizardError::AvailabilityNotFound(reason) => AttemptError::Unavailable(reason),
            other => AttemptError::Fatal(other),
        }
    }
}

impl AttemptError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, AttemptError::Unavailable(_))
    }
}

#[async_trait]
pub trait Attempt: Send {
    /// Run the wizard once for `request`. `attempt` is 1-based.
    async fn run_attempt(
        &mut self,
        request: &BookingRequest,
        attempt: u32,
    ) -> Result<AttemptOutcome, AttemptError>;
}

/// Guards the irreversible final click.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmitGate {
    pub dry_run: bool,
    pub confirm_submit: bool,
}

/// Runs attempts against a real browser, a fresh backend per attempt.
pub struct BrowserAttemptRunner<F: BackendFactory> {
    factory: F,
    config: EngineConfig,
    credentials: Credentials,
    gate: SubmitGate,
    screenshots: Box<dyn ScreenshotSink>,
}

impl<F: BackendFactory> BrowserAttemptRunner<F> {
    pub fn new(
        factory: F,
        config: EngineConfig,
        credentials: Credentials,
        gate: SubmitGate,
        screenshots: Box<dyn ScreenshotSink>,
    ) -> Self {
        Self {
            factory,
            config,
            credentials,
            gate,
            screenshots,
        }
    }

    async fn drive<B: Backend>(
        &mut self,
        backend: &mut B,
        request: &BookingRequest,
        attempt: u32,
    ) -> Result<AttemptOutcome, WizardError> {
        let recorder = StepRecorder::new(self.screenshots.as_mut(), &request.label, attempt);
        let mut driver =
            WizardStepDriver::new(backend, &self.config, request, &self.credentials, recorder);

        driver.prepare().await?;

        if self.gate.dry_run {
            info!("[{}] Dry run: stopping before submit", request.label);
            return Ok(AttemptOutcome::DryRunStopped);
        }
        if !self.gate.confirm_submit {
            info!(
                "[{}] Summary is ready; submit withheld until explicitly confirmed",
                request.label
            );
            return Ok(AttemptOutcome::AwaitingConfirmation);
        }

        driver.submit().await?;
        Ok(AttemptOutcome::Completed)
    }
}

#[async_trait]
impl<F: BackendFactory> Attempt for BrowserAttemptRunner<F> {
    async fn run_attempt(
        &mut self,
        request: &BookingRequest,
        attempt: u32,
    ) -> Result<AttemptOutcome, AttemptError> {
        info!("[{}] Attempt {}", request.label, attempt);
        let mut backend = self.factory.create();
        backend
            .launch()
            .await
            .map_err(|e| AttemptError::Fatal(e.into()))?;

        let result = self.drive(&mut backend, request, attempt).await;

        if let Err(e) = backend.close().await {
            warn!("Failed to close browser: {}", e);
        }
        result.map_err(AttemptError::from)
    }
}
