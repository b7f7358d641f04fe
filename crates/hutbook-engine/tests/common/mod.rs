#![allow(dead_code)]

//! Scripted in-memory page used by the integration tests.
//!
//! Nodes are registered under the exact CSS strings the engine queries
//! (scoped queries use `"<scope> <css>"`). Reactions run after a click, fill
//! or check lands on a node and may mutate the rest of the page.

use async_trait::async_trait;
use chrono::NaiveDate;
use hutbook_engine::backend::{Backend, BackendError, NavigationResult};
use hutbook_engine::protocol::{
    ActionResult, ElementSnapshot, ElementState, InteractionMode, ProbeAction, ProbeData,
    ProbeErrorCode, ProbeResponse,
};
use hutbook_engine::request::{
    BookingRequest, Contact, LoginProvider, Preferences, RetryPolicy, StayDetails,
};
use hutbook_engine::screenshots::ScreenshotSink;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

pub type Reaction = Box<dyn FnMut(&mut Page) + Send>;

/// Builder for one DOM node.
#[derive(Debug, Clone)]
pub struct El(ElementSnapshot);

impl El {
    pub fn new(tag: &str) -> Self {
        El(ElementSnapshot {
            id: 0,
            tag: tag.to_string(),
            text: None,
            label: None,
            placeholder: None,
            value: None,
            attributes: HashMap::new(),
            state: ElementState {
                visible: true,
                ..Default::default()
            },
        })
    }

    pub fn text(mut self, text: &str) -> Self {
        self.0.text = Some(text.to_string());
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.0.label = Some(label.to_string());
        self
    }

    pub fn placeholder(mut self, placeholder: &str) -> Self {
        self.0.placeholder = Some(placeholder.to_string());
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.0.value = Some(value.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.0.state.visible = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.0.state.disabled = true;
        self
    }

    pub fn readonly(mut self) -> Self {
        self.0.state.readonly = true;
        self
    }
}

#[derive(Debug, Clone)]
struct Node {
    snapshot: ElementSnapshot,
    keys: Vec<String>,
    attached: bool,
}

#[derive(Default)]
pub struct Page {
    nodes: Vec<Node>,
    reactions: HashMap<u32, Reaction>,
    refused: HashMap<u32, Vec<InteractionMode>>,
    rerender_on_touch: HashSet<u32>,
    next_id: u32,
    pub url: String,
    pub actions: Vec<ProbeAction>,
    pub navigations: Vec<String>,
    pub keys_pressed: Vec<String>,
    pub screenshots: usize,
    pub launches: usize,
    pub closes: usize,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, keys: &[&str], el: El) -> u32 {
        self.next_id += 1;
        let mut snapshot = el.0;
        snapshot.id = self.next_id;
        self.nodes.push(Node {
            snapshot,
            keys: keys.iter().map(|k| k.to_string()).collect(),
            attached: true,
        });
        self.next_id
    }

    pub fn react<F>(&mut self, id: u32, reaction: F)
    where
        F: FnMut(&mut Page) + Send + 'static,
    {
        self.reactions.insert(id, Box::new(reaction));
    }

    /// Interactions in `modes` fail as if an overlay covered the node.
    pub fn refuse(&mut self, id: u32, modes: &[InteractionMode]) {
        self.refused.insert(id, modes.to_vec());
    }

    /// The next interaction detaches the node and re-attaches a copy under a
    /// new id, as a framework re-render would.
    pub fn rerender_on_touch(&mut self, id: u32) {
        self.rerender_on_touch.insert(id);
    }

    pub fn snapshot(&self, id: u32) -> &ElementSnapshot {
        &self
            .nodes
            .iter()
            .find(|n| n.snapshot.id == id)
            .expect("unknown node")
            .snapshot
    }

    pub fn snapshot_mut(&mut self, id: u32) -> &mut ElementSnapshot {
        &mut self
            .nodes
            .iter_mut()
            .find(|n| n.snapshot.id == id)
            .expect("unknown node")
            .snapshot
    }

    pub fn set_visible(&mut self, id: u32, visible: bool) {
        self.snapshot_mut(id).state.visible = visible;
    }

    pub fn set_disabled(&mut self, id: u32, disabled: bool) {
        self.snapshot_mut(id).state.disabled = disabled;
    }

    /// Ids of attached nodes registered under `key`.
    pub fn ids(&self, key: &str) -> Vec<u32> {
        self.nodes
            .iter()
            .filter(|n| n.attached && n.keys.iter().any(|k| k == key))
            .map(|n| n.snapshot.id)
            .collect()
    }

    pub fn clicks(&self, id: u32) -> Vec<InteractionMode> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                ProbeAction::Click(r) if r.id == id => Some(r.mode),
                _ => None,
            })
            .collect()
    }

    pub fn last_click(&self) -> Option<u32> {
        self.actions.iter().rev().find_map(|a| match a {
            ProbeAction::Click(r) => Some(r.id),
            _ => None,
        })
    }

    pub fn checks(&self, id: u32) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, ProbeAction::Check(r) if r.id == id))
            .count()
    }

    pub fn queried(&self, css: &str) -> bool {
        self.actions
            .iter()
            .any(|a| matches!(a, ProbeAction::Query(q) if q.css == css))
    }

    fn position(&self, id: u32) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| n.attached && n.snapshot.id == id)
    }

    fn handle(&mut self, action: ProbeAction) -> ProbeResponse {
        self.actions.push(action.clone());
        match action {
            ProbeAction::Query(q) => {
                let key = match &q.scope {
                    Some(scope) => format!("{} {}", scope, q.css),
                    None => q.css,
                };
                let elements = self
                    .nodes
                    .iter()
                    .filter(|n| n.attached && n.keys.contains(&key))
                    .map(|n| n.snapshot.clone())
                    .collect();
                ProbeResponse::ok(ProbeData::Elements { elements })
            }
            ProbeAction::Inspect(r) => match self.position(r.id) {
                Some(idx) => ProbeResponse::ok(ProbeData::Element {
                    element: self.nodes[idx].snapshot.clone(),
                }),
                None => ProbeResponse::error(ProbeErrorCode::Stale, "node detached"),
            },
            ProbeAction::Click(r) => self.interact(r.id, r.mode, |_| {}),
            ProbeAction::Fill(r) => {
                let text = r.text;
                self.interact(r.id, r.mode, move |s| s.value = Some(text))
            }
            ProbeAction::Check(r) => {
                let state = r.state;
                self.interact(r.id, InteractionMode::Plain, move |s| {
                    s.state.checked = state
                })
            }
        }
    }

    fn interact<F>(&mut self, id: u32, mode: InteractionMode, apply: F) -> ProbeResponse
    where
        F: FnOnce(&mut ElementSnapshot),
    {
        let Some(idx) = self.position(id) else {
            return ProbeResponse::error(ProbeErrorCode::Stale, "node detached");
        };
        if self.rerender_on_touch.remove(&id) {
            let mut copy = self.nodes[idx].clone();
            self.nodes[idx].attached = false;
            self.next_id += 1;
            copy.snapshot.id = self.next_id;
            self.nodes.push(copy);
            return ProbeResponse::error(ProbeErrorCode::Stale, "node detached");
        }
        if self.refused.get(&id).is_some_and(|m| m.contains(&mode)) {
            return ProbeResponse::error(ProbeErrorCode::Occluded, "covered by .cdk-overlay");
        }

        apply(&mut self.nodes[idx].snapshot);
        if let Some(mut reaction) = self.reactions.remove(&id) {
            reaction(self);
            self.reactions.entry(id).or_insert(reaction);
        }
        ProbeResponse::ok(ProbeData::Action(ActionResult {
            success: true,
            message: None,
        }))
    }
}

#[derive(Clone)]
pub struct MockBackend {
    page: Arc<Mutex<Page>>,
}

impl MockBackend {
    pub fn new(page: Page) -> Self {
        Self::shared(Arc::new(Mutex::new(page)))
    }

    pub fn shared(page: Arc<Mutex<Page>>) -> Self {
        Self { page }
    }

    pub fn page(&self) -> MutexGuard<'_, Page> {
        self.page.lock().unwrap()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn launch(&mut self) -> Result<(), BackendError> {
        self.page().launches += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        self.page().closes += 1;
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        true
    }

    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, BackendError> {
        let mut page = self.page();
        page.url = url.to_string();
        page.navigations.push(url.to_string());
        Ok(NavigationResult {
            url: url.to_string(),
            title: String::new(),
            status: 200,
        })
    }

    async fn current_url(&mut self) -> Result<String, BackendError> {
        Ok(self.page().url.clone())
    }

    async fn execute_probe(
        &mut self,
        command: ProbeAction,
    ) -> Result<ProbeResponse, BackendError> {
        Ok(self.page().handle(command))
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, BackendError> {
        self.page().screenshots += 1;
        Ok(b"\x89PNG".to_vec())
    }

    async fn press_key(&mut self, key: &str) -> Result<(), BackendError> {
        self.page().keys_pressed.push(key.to_string());
        Ok(())
    }
}

/// Keeps captured labels in memory.
#[derive(Clone, Default)]
pub struct MemorySink {
    pub labels: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn labels(&self) -> Vec<String> {
        self.labels.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScreenshotSink for MemorySink {
    async fn store(
        &mut self,
        _request: &str,
        _attempt: u32,
        _index: usize,
        label: &str,
        _png: &[u8],
    ) -> std::io::Result<()> {
        self.labels.lock().unwrap().push(label.to_string());
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn booking_request(label: &str) -> BookingRequest {
    BookingRequest {
        label: label.to_string(),
        login_provider: LoginProvider::Default,
        hut_name: "Margherita".to_string(),
        check_in: date(2026, 4, 10),
        check_out: date(2026, 4, 12),
        party_size: 2,
        preferences: Preferences::default(),
        contact: Contact {
            first_name: "Anna".to_string(),
            last_name: "Rossi".to_string(),
            email: "anna@example.com".to_string(),
            phone: "+41 79 000 00 00".to_string(),
            address_line1: "Via Monte Rosa 1".to_string(),
            city: "Zermatt".to_string(),
            postal_code: "3920".to_string(),
            country: "Switzerland".to_string(),
        },
        half_board: true,
        stay: StayDetails::default(),
        accept_terms: true,
        retry: RetryPolicy::default(),
    }
}

pub fn polled_request(label: &str, interval: u64, max_attempts: u32) -> BookingRequest {
    let mut request = booking_request(label);
    request.retry.auto_poll_if_full = true;
    request.retry.poll_interval_seconds = interval;
    request.retry.max_attempts = max_attempts;
    request
}
