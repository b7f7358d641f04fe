use chromiumoxide::Page;
use hutbook_probe::{PROBE_JS, PROBE_READY_CHECK};
use std::error::Error;
use std::future::Future;
use std::time::Duration;

/// Upper bound for one script evaluation; an unanswered dialog blocks the
/// page's JS thread indefinitely.
const EVAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Retries while the page is between documents.
const MAX_CONTEXT_RETRIES: u32 = 10;

const CONTEXT_RETRY_DELAY: Duration = Duration::from_millis(100);

type InjectError = Box<dyn Error + Send + Sync>;

/// The page context is gone or not created yet (navigation in progress).
pub fn is_context_error(err: &str) -> bool {
    err.contains("Cannot find context")
        || err.contains("Execution context was destroyed")
        || err.contains("-32000")
}

/// Run `operation`, retrying only while it fails with a context error.
pub async fn retry_on_context_error<T, E, F, Fut>(
    operation_name: &str,
    mut operation: F,
) -> Result<T, InjectError>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut last_error = None;

    for attempt in 0..MAX_CONTEXT_RETRIES {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                let err_str = e.to_string();
                if !is_context_error(&err_str) {
                    return Err(err_str.into());
                }
                tracing::debug!(
                    "{} context error (attempt {}/{}), retrying",
                    operation_name,
                    attempt + 1,
                    MAX_CONTEXT_RETRIES
                );
                last_error = Some(err_str);
                tokio::time::sleep(CONTEXT_RETRY_DELAY).await;
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| format!("{} failed after retries", operation_name))
        .into())
}

/// Install the probe unless the current document already has it.
pub async fn ensure_probe(page: &Page) -> Result<(), InjectError> {
    retry_on_context_error("Probe injection", || try_inject(page)).await
}

async fn try_inject(page: &Page) -> Result<(), InjectError> {
    let installed: bool = page
        .evaluate(PROBE_READY_CHECK)
        .await
        .map_err(|e| format!("Failed to check probe status: {}", e))?
        .into_value()
        .map_err(|e| format!("Failed to read probe status: {}", e))?;

    if !installed {
        tracing::debug!("Injecting page probe");
        page.evaluate(PROBE_JS)
            .await
            .map_err(|e| format!("Failed to inject probe: {}", e))?;
    }
    Ok(())
}

/// Send one serialized probe action and return the raw JSON reply.
pub async fn run_probe(
    page: &Page,
    action: serde_json::Value,
) -> Result<serde_json::Value, InjectError> {
    let expression = format!("window.Hutbook.process({})", serde_json::to_string(&action)?);
    tracing::trace!("Evaluating {}", expression);

    let mut last_error = None;
    for attempt in 0..MAX_CONTEXT_RETRIES {
        ensure_probe(page).await?;

        match evaluate_with_timeout(page, &expression).await {
            Ok(value) => return Ok(value),
            Err(EvalError::Timeout) => {
                return Err("Probe timed out; a dialog may be blocking the page".into());
            }
            Err(EvalError::Context(err_str)) => {
                tracing::debug!(
                    "Context lost during probe call (attempt {}/{}), retrying",
                    attempt + 1,
                    MAX_CONTEXT_RETRIES
                );
                last_error = Some(err_str);
                tokio::time::sleep(CONTEXT_RETRY_DELAY).await;
            }
            Err(EvalError::Other(err_str)) => {
                return Err(format!("Evaluation failed: {}", err_str).into());
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| "Probe call failed after retries".to_string())
        .into())
}

enum EvalError {
    Timeout,
    Context(String),
    Other(String),
}

async fn evaluate_with_timeout(
    page: &Page,
    expression: &str,
) -> Result<serde_json::Value, EvalError> {
    match tokio::time::timeout(EVAL_TIMEOUT, page.evaluate(expression)).await {
        Err(_) => Err(EvalError::Timeout),
        Ok(Err(e)) => {
            let err_str = e.to_string();
            if is_context_error(&err_str) {
                Err(EvalError::Context(err_str))
            } else {
                Err(EvalError::Other(err_str))
            }
        }
        Ok(Ok(remote_object)) => remote_object
            .into_value::<serde_json::Value>()
            .map_err(|e| EvalError::Other(format!("Failed to read result: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn recognizes_context_errors() {
        assert!(is_context_error("Execution context was destroyed."));
        assert!(is_context_error("{\"code\":-32000,\"message\":\"...\"}"));
        assert!(!is_context_error("ReferenceError: Hutbook is not defined"));
    }

    #[tokio::test]
    async fn retries_only_context_errors() {
        let calls = Cell::new(0);
        let result: Result<u32, _> = retry_on_context_error("test", || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move {
                if n < 3 {
                    Err("Cannot find context with specified id".to_string())
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 3);

        let calls = Cell::new(0);
        let result: Result<u32, _> = retry_on_context_error("test", || {
            calls.set(calls.get() + 1);
            async { Err::<u32, _>("boom".to_string()) }
        })
        .await;
        assert_eq!(result.unwrap_err().to_string(), "boom");
        assert_eq!(calls.get(), 1);
    }
}
