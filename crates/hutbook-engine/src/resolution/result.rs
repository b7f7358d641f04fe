use hutbook_common::error::BackendError;
use hutbook_common::protocol::ElementSnapshot;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ResolutionError {
    #[error("No visible element for '{field}' (tried {attempted:?}; {hidden} hidden match(es))")]
    NotFound {
        field: String,
        attempted: Vec<String>,
        hidden: usize,
    },

    #[error("Ambiguous '{field}' via {strategy}: {candidates:?}")]
    Ambiguous {
        field: String,
        strategy: String,
        candidates: Vec<String>,
    },

    #[error("Field '{field}' is read-only and holds '{actual}', expected '{expected}'")]
    ValueMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Backend error while handling '{field}': {source}")]
    Backend {
        field: String,
        #[source]
        source: BackendError,
    },
}

impl ResolutionError {
    pub fn field(&self) -> &str {
        match self {
            ResolutionError::NotFound { field, .. }
            | ResolutionError::Ambiguous { field, .. }
            | ResolutionError::ValueMismatch { field, .. }
            | ResolutionError::Backend { field, .. } => field,
        }
    }

    pub(crate) fn backend(field: &str, source: BackendError) -> Self {
        ResolutionError::Backend {
            field: field.to_string(),
            source,
        }
    }
}

/// A handle into the live page for one logical field.
///
/// Valid only until the page re-renders; never kept past the step that
/// resolved it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedElement {
    pub id: u32,
    pub field: String,
    /// Which strategy located it, for diagnostics.
    pub strategy: String,
    pub snapshot: ElementSnapshot,
}

/// Outcome of a single, non-waiting lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found(ResolvedElement),
    Absent { attempted: Vec<String>, hidden: usize },
}

impl Resolution {
    pub fn found(self) -> Option<ResolvedElement> {
        match self {
            Resolution::Found(el) => Some(el),
            Resolution::Absent { .. } => None,
        }
    }
}

/// What `fill_or_validate` did with the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    Written,
    /// The field was read-only but already held the requested value.
    AlreadyPresent,
}

pub(crate) fn describe_candidates(candidates: &[ElementSnapshot]) -> Vec<String> {
    candidates
        .iter()
        .map(|el| {
            let text = el.displayed_text();
            if text.is_empty() {
                format!("#{} <{}>", el.id, el.tag)
            } else {
                format!("#{} <{}> '{}'", el.id, el.tag, text)
            }
        })
        .collect()
}
