use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Custom deserializer for HashMap<String, String> that filters out null values.
/// The probe reports every attribute it was asked about, including absent ones.
fn deserialize_nullable_string_map<'de, D>(
    deserializer: D,
) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let map: HashMap<String, Option<String>> = HashMap::deserialize(deserializer)?;
    Ok(map
        .into_iter()
        .filter_map(|(k, v)| v.map(|val| (k, val)))
        .collect())
}

/// Requests executed by the injected page probe.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ProbeAction {
    Query(QueryRequest),
    Inspect(InspectRequest),
    Click(ClickRequest),
    Fill(FillRequest),
    Check(CheckRequest),
}

impl ProbeAction {
    pub fn name(&self) -> &'static str {
        match self {
            ProbeAction::Query(_) => "query",
            ProbeAction::Inspect(_) => "inspect",
            ProbeAction::Click(_) => "click",
            ProbeAction::Fill(_) => "fill",
            ProbeAction::Check(_) => "check",
        }
    }

    /// Element handle the action operates on, if any.
    pub fn target_id(&self) -> Option<u32> {
        match self {
            ProbeAction::Query(_) => None,
            ProbeAction::Inspect(r) => Some(r.id),
            ProbeAction::Click(r) => Some(r.id),
            ProbeAction::Fill(r) => Some(r.id),
            ProbeAction::Check(r) => Some(r.id),
        }
    }
}

/// Every element matching `css`, optionally restricted to descendants of
/// elements matching `scope`. Hidden matches are reported too.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryRequest {
    pub css: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InspectRequest {
    pub id: u32,
}

/// How hard the probe tries to deliver an interaction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InteractionMode {
    /// Real pointer/keyboard sequence; refuses when the node is covered.
    #[default]
    Plain,
    /// Same sequence, skipping the occlusion check.
    Forced,
    /// Direct DOM manipulation on the node (`el.click()`, value setter + events).
    Scripted,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClickRequest {
    pub id: u32,
    #[serde(default)]
    pub mode: InteractionMode,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FillRequest {
    pub id: u32,
    pub text: String,
    #[serde(default)]
    pub mode: InteractionMode,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckRequest {
    pub id: u32,
    pub state: bool, // true = check, false = uncheck
}

/// Responses received from the probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProbeResponse {
    Ok {
        #[serde(flatten)]
        data: Box<ProbeData>,
        #[serde(default)]
        warnings: Vec<String>,
    },
    Error {
        code: ProbeErrorCode,
        message: String,
    },
}

impl ProbeResponse {
    pub fn ok(data: ProbeData) -> Self {
        ProbeResponse::Ok {
            data: Box::new(data),
            warnings: vec![],
        }
    }

    pub fn error(code: ProbeErrorCode, message: impl Into<String>) -> Self {
        ProbeResponse::Error {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProbeData {
    Elements { elements: Vec<ElementSnapshot> },
    Element { element: ElementSnapshot },
    Action(ActionResult),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProbeErrorCode {
    /// The handle no longer points at an attached node.
    Stale,
    /// Another node sits on top of the target's center point.
    Occluded,
    /// Hidden, disabled or read-only.
    NotInteractable,
    #[serde(other)]
    Script,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionResult {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// A point-in-time view of one DOM node. `id` is a probe handle valid until the
/// node is detached; it is never persisted past one wizard step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementSnapshot {
    pub id: u32,
    pub tag: String,
    #[serde(default)]
    pub text: Option<String>,
    /// aria-label, or the text of an associated `<label>`.
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default, deserialize_with = "deserialize_nullable_string_map")]
    pub attributes: HashMap<String, String>,
    #[serde(default)]
    pub state: ElementState,
}

impl ElementSnapshot {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn is_visible(&self) -> bool {
        self.state.visible
    }

    /// Disabled either natively or through `aria-disabled="true"`.
    pub fn is_disabled(&self) -> bool {
        self.state.disabled || self.attr("aria-disabled") == Some("true")
    }

    pub fn accepts_input(&self) -> bool {
        !self.is_disabled() && !self.state.readonly
    }

    /// The text a human sees in the control: its value for inputs, its text otherwise.
    pub fn displayed_text(&self) -> &str {
        self.value
            .as_deref()
            .filter(|v| !v.is_empty())
            .or(self.text.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ElementState {
    pub visible: bool,
    pub disabled: bool,
    pub readonly: bool,
    pub checked: bool,
}
