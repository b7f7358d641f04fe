use hutbook_common::protocol::QueryRequest;
use std::fmt;

/// Which piece of an element a label strategy compares against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextField {
    /// Rendered text content.
    Text,
    /// aria-label or associated `<label>`.
    Label,
    Placeholder,
    Value,
    Attribute(String),
    /// Any of the above except attributes.
    Any,
}

/// One way of identifying a field on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Elements matching `css` whose `field` equals one of `texts` (exact
    /// tier) or contains one of them case-insensitively (substring tier).
    Label {
        css: String,
        field: TextField,
        texts: Vec<String>,
    },
    /// Elements matching `css`; every visible match is a candidate.
    Selector { css: String },
    /// Elements matching `css` below any element matching `scope`.
    Scoped { scope: String, css: String },
}

impl Strategy {
    pub fn locator(&self) -> QueryRequest {
        match self {
            Strategy::Label { css, .. } | Strategy::Selector { css } => QueryRequest {
                css: css.clone(),
                scope: None,
            },
            Strategy::Scoped { scope, css } => QueryRequest {
                css: css.clone(),
                scope: Some(scope.clone()),
            },
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Label { css, field, texts } => {
                write!(f, "label {:?} of {:?} in `{}`", texts, field, css)
            }
            Strategy::Selector { css } => write!(f, "selector `{}`", css),
            Strategy::Scoped { scope, css } => write!(f, "`{}` within `{}`", css, scope),
        }
    }
}

/// Ordered identification strategies for one logical field.
///
/// Built fresh for every lookup; the first strategy that yields any visible
/// candidate decides the outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementQuery {
    field: String,
    strategies: Vec<Strategy>,
}

impl ElementQuery {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            strategies: Vec::new(),
        }
    }

    pub fn label<I, S>(mut self, css: impl Into<String>, field: TextField, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.strategies.push(Strategy::Label {
            css: css.into(),
            field,
            texts: texts.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn selector(mut self, css: impl Into<String>) -> Self {
        self.strategies.push(Strategy::Selector { css: css.into() });
        self
    }

    pub fn scoped(mut self, scope: impl Into<String>, css: impl Into<String>) -> Self {
        self.strategies.push(Strategy::Scoped {
            scope: scope.into(),
            css: css.into(),
        });
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    pub fn describe(&self) -> Vec<String> {
        self.strategies.iter().map(ToString::to_string).collect()
    }
}
