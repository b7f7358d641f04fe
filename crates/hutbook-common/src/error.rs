use crate::protocol::ProbeErrorCode;

/// Errors raised by a browser backend or by the page probe it drives.
#[derive(thiserror::Error, Debug, Clone)]
pub enum BackendError {
    #[error("Navigation to page failed: {0}")]
    Navigation(String),

    /// The handle no longer points at an attached node.
    #[error("Element #{id} was detached from the page")]
    ElementStale { id: u32 },

    #[error("Element #{id} is covered by another node")]
    ElementOccluded { id: u32 },

    #[error("Element #{id} refused the interaction: {reason}")]
    ElementNotInteractable { id: u32, reason: String },

    #[error("Page script failed: {0}")]
    ScriptError(String),

    #[error("Timed out during {operation}")]
    Timeout { operation: String },

    #[error("Probe execution failed: {0}")]
    Probe(String),

    #[error("Not ready")]
    NotReady,

    #[error("IO error: {0}")]
    Io(String),

    #[error("Malformed probe message: {0}")]
    Serialization(String),

    #[error("Other: {0}")]
    Other(String),

    #[error("{0} is not supported by this backend")]
    NotSupported(String),
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Serialization(err.to_string())
    }
}

impl BackendError {
    /// Map a probe error reply for element `id` onto a backend error.
    pub fn from_probe(code: ProbeErrorCode, id: Option<u32>, message: String) -> Self {
        match (code, id) {
            (ProbeErrorCode::Stale, Some(id)) => BackendError::ElementStale { id },
            (ProbeErrorCode::Occluded, Some(id)) => BackendError::ElementOccluded { id },
            (ProbeErrorCode::NotInteractable, Some(id)) => {
                BackendError::ElementNotInteractable { id, reason: message }
            }
            _ => BackendError::ScriptError(message),
        }
    }

    /// The node behind the handle is gone; it has to be located again.
    pub fn is_stale(&self) -> bool {
        matches!(self, BackendError::ElementStale { .. })
    }

    /// Transient refusals that a later or more forceful attempt may overcome.
    pub fn is_interaction_refused(&self) -> bool {
        matches!(
            self,
            BackendError::ElementOccluded { .. }
                | BackendError::ElementNotInteractable { .. }
                | BackendError::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_codes_keep_the_handle() {
        let err = BackendError::from_probe(ProbeErrorCode::Occluded, Some(3), "veil".into());
        assert!(matches!(err, BackendError::ElementOccluded { id: 3 }));
        assert!(err.is_interaction_refused());

        let err = BackendError::from_probe(ProbeErrorCode::Stale, Some(9), "gone".into());
        assert!(err.is_stale());
        assert!(!err.is_interaction_refused());
    }

    #[test]
    fn probe_codes_without_handle_are_script_errors() {
        let err = BackendError::from_probe(ProbeErrorCode::Stale, None, "gone".into());
        assert!(matches!(err, BackendError::ScriptError(_)));
    }
}
