use super::matching::{StrategyOutcome, evaluate};
use super::query::ElementQuery;
use super::result::{FillOutcome, Resolution, ResolutionError, ResolvedElement, describe_candidates};
use crate::backend::Backend;
use crate::config::Timeouts;
use hutbook_common::error::BackendError;
use hutbook_common::protocol::{
    CheckRequest, ClickRequest, ElementSnapshot, FillRequest, InspectRequest, InteractionMode,
    ProbeAction, ProbeData, ProbeResponse, QueryRequest,
};
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

const ESCALATION: [InteractionMode; 3] = [
    InteractionMode::Plain,
    InteractionMode::Forced,
    InteractionMode::Scripted,
];

/// Finds and operates page controls described by [`ElementQuery`] values.
///
/// Borrowing the backend for the resolver's lifetime keeps every probe call
/// strictly sequential.
pub struct ElementResolver<'a, B: Backend + ?Sized> {
    backend: &'a mut B,
    timeouts: &'a Timeouts,
}

impl<'a, B: Backend + ?Sized> ElementResolver<'a, B> {
    pub fn new(backend: &'a mut B, timeouts: &'a Timeouts) -> Self {
        Self { backend, timeouts }
    }

    pub fn backend(&mut self) -> &mut B {
        &mut *self.backend
    }

    pub fn timeouts(&self) -> &Timeouts {
        self.timeouts
    }

    async fn probe(&mut self, action: ProbeAction) -> Result<ProbeData, BackendError> {
        let target = action.target_id();
        debug!("probe {} {:?}", action.name(), target);
        match self.backend.execute_probe(action).await? {
            ProbeResponse::Ok { data, warnings } => {
                for w in warnings {
                    debug!("probe warning: {}", w);
                }
                Ok(*data)
            }
            ProbeResponse::Error { code, message } => {
                Err(BackendError::from_probe(code, target, message))
            }
        }
    }

    /// Every element matching the locator, visible or not.
    pub async fn query(&mut self, locator: QueryRequest) -> Result<Vec<ElementSnapshot>, BackendError> {
        match self.probe(ProbeAction::Query(locator)).await? {
            ProbeData::Elements { elements } => Ok(elements),
            other => Err(BackendError::Probe(format!(
                "unexpected reply to query: {:?}",
                other
            ))),
        }
    }

    pub async fn inspect(&mut self, id: u32) -> Result<ElementSnapshot, BackendError> {
        match self.probe(ProbeAction::Inspect(InspectRequest { id })).await? {
            ProbeData::Element { element } => Ok(element),
            other => Err(BackendError::Probe(format!(
                "unexpected reply to inspect: {:?}",
                other
            ))),
        }
    }

    /// One pass over the strategies, without waiting.
    pub async fn find(&mut self, query: &ElementQuery) -> Result<Resolution, ResolutionError> {
        let mut hidden = 0;
        for strategy in query.strategies() {
            let elements = self
                .query(strategy.locator())
                .await
                .map_err(|e| ResolutionError::backend(query.field(), e))?;

            match evaluate(strategy, elements) {
                StrategyOutcome::Selected { element, tier } => {
                    debug!(
                        "'{}' resolved to #{} via {} ({:?})",
                        query.field(),
                        element.id,
                        strategy,
                        tier
                    );
                    return Ok(Resolution::Found(ResolvedElement {
                        id: element.id,
                        field: query.field().to_string(),
                        strategy: strategy.to_string(),
                        snapshot: element,
                    }));
                }
                StrategyOutcome::Ambiguous { candidates } => {
                    return Err(ResolutionError::Ambiguous {
                        field: query.field().to_string(),
                        strategy: strategy.to_string(),
                        candidates: describe_candidates(&candidates),
                    });
                }
                StrategyOutcome::Empty { hidden: h } => hidden += h,
            }
        }
        Ok(Resolution::Absent {
            attempted: query.describe(),
            hidden,
        })
    }

    /// Every visible element of the first strategy that has any, unfiltered
    /// by label. Used where the caller applies its own choice rules.
    pub async fn visible(
        &mut self,
        query: &ElementQuery,
    ) -> Result<Vec<ElementSnapshot>, ResolutionError> {
        for strategy in query.strategies() {
            let elements = self
                .query(strategy.locator())
                .await
                .map_err(|e| ResolutionError::backend(query.field(), e))?;
            let visible: Vec<_> = elements.into_iter().filter(|e| e.is_visible()).collect();
            if !visible.is_empty() {
                return Ok(visible);
            }
        }
        Ok(Vec::new())
    }

    /// Wait until the query resolves, up to `timeout`.
    pub async fn resolve(
        &mut self,
        query: &ElementQuery,
        timeout: Duration,
    ) -> Result<ResolvedElement, ResolutionError> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.find(query).await? {
                Resolution::Found(el) => return Ok(el),
                Resolution::Absent { attempted, hidden } => {
                    if Instant::now() >= deadline {
                        return Err(ResolutionError::NotFound {
                            field: query.field().to_string(),
                            attempted,
                            hidden,
                        });
                    }
                }
            }
            sleep(self.timeouts.poll()).await;
        }
    }

    /// [`Self::resolve`] with the default element timeout.
    pub async fn locate(&mut self, query: &ElementQuery) -> Result<ResolvedElement, ResolutionError> {
        let timeout = self.timeouts.element();
        self.resolve(query, timeout).await
    }

    pub async fn click(&mut self, query: &ElementQuery) -> Result<ResolvedElement, ResolutionError> {
        let element = self.locate(query).await?;
        self.click_resolved(query, &element).await?;
        Ok(element)
    }

    pub async fn click_resolved(
        &mut self,
        query: &ElementQuery,
        element: &ResolvedElement,
    ) -> Result<(), ResolutionError> {
        self.interact(query, element, |id, mode| {
            ProbeAction::Click(ClickRequest { id, mode })
        })
        .await
    }

    pub async fn fill(
        &mut self,
        query: &ElementQuery,
        text: &str,
    ) -> Result<ResolvedElement, ResolutionError> {
        let element = self.locate(query).await?;
        self.fill_resolved(query, &element, text).await?;
        Ok(element)
    }

    pub async fn fill_resolved(
        &mut self,
        query: &ElementQuery,
        element: &ResolvedElement,
        text: &str,
    ) -> Result<(), ResolutionError> {
        self.interact(query, element, |id, mode| {
            ProbeAction::Fill(FillRequest {
                id,
                text: text.to_string(),
                mode,
            })
        })
        .await
    }

    /// Write `text` if the field accepts input; otherwise require that its
    /// current content already contains `text` (case-insensitive).
    pub async fn fill_or_validate(
        &mut self,
        query: &ElementQuery,
        text: &str,
    ) -> Result<FillOutcome, ResolutionError> {
        let element = self.locate(query).await?;
        if element.snapshot.accepts_input() {
            self.fill_resolved(query, &element, text).await?;
            return Ok(FillOutcome::Written);
        }

        let current = element.snapshot.displayed_text();
        if current.to_lowercase().contains(&text.trim().to_lowercase()) {
            debug!("'{}' is pre-filled with '{}'", query.field(), current);
            Ok(FillOutcome::AlreadyPresent)
        } else {
            Err(ResolutionError::ValueMismatch {
                field: query.field().to_string(),
                expected: text.to_string(),
                actual: current.to_string(),
            })
        }
    }

    /// Bring a checkbox or toggle into `state` and verify it took.
    pub async fn set_checked(
        &mut self,
        query: &ElementQuery,
        state: bool,
    ) -> Result<(), ResolutionError> {
        let element = self.locate(query).await?;
        if element.snapshot.state.checked == state {
            return Ok(());
        }

        let field = query.field().to_string();
        self.probe(ProbeAction::Check(CheckRequest {
            id: element.id,
            state,
        }))
        .await
        .map_err(|e| ResolutionError::backend(&field, e))?;

        let after = self
            .inspect(element.id)
            .await
            .map_err(|e| ResolutionError::backend(&field, e))?;
        if after.state.checked != state {
            return Err(ResolutionError::ValueMismatch {
                field,
                expected: checked_word(state).to_string(),
                actual: checked_word(after.state.checked).to_string(),
            });
        }
        Ok(())
    }

    /// Plain (retried while refused), then forced, then scripted. A stale
    /// handle is re-located once before giving up.
    async fn interact<F>(
        &mut self,
        query: &ElementQuery,
        element: &ResolvedElement,
        build: F,
    ) -> Result<(), ResolutionError>
    where
        F: Fn(u32, InteractionMode) -> ProbeAction,
    {
        let mut id = element.id;
        let mut relocated = false;
        let mut tier = 0;

        while tier < ESCALATION.len() {
            let mode = ESCALATION[tier];
            let result = match mode {
                InteractionMode::Plain => self.attempt_plain(id, &build).await,
                _ => self.probe(build(id, mode)).await.map(|_| ()),
            };

            match result {
                Ok(()) => {
                    if mode != InteractionMode::Plain {
                        debug!("'{}' handled with {:?} interaction", query.field(), mode);
                    }
                    return Ok(());
                }
                Err(e) if e.is_stale() => {
                    if relocated {
                        return Err(self.not_found(query, 0));
                    }
                    relocated = true;
                    match self.find(query).await? {
                        Resolution::Found(fresh) => {
                            debug!("'{}' re-rendered; #{} -> #{}", query.field(), id, fresh.id);
                            id = fresh.id;
                        }
                        Resolution::Absent { hidden, .. } => {
                            return Err(self.not_found(query, hidden));
                        }
                    }
                }
                Err(e) if e.is_interaction_refused() && tier + 1 < ESCALATION.len() => {
                    warn!(
                        "{:?} interaction with '{}' refused ({}), escalating",
                        mode,
                        query.field(),
                        e
                    );
                    tier += 1;
                }
                Err(e) => return Err(ResolutionError::backend(query.field(), e)),
            }
        }
        Err(self.not_found(query, 0))
    }

    async fn attempt_plain<F>(&mut self, id: u32, build: &F) -> Result<(), BackendError>
    where
        F: Fn(u32, InteractionMode) -> ProbeAction,
    {
        let deadline = Instant::now() + self.timeouts.interaction();
        loop {
            match self.probe(build(id, InteractionMode::Plain)).await {
                Ok(_) => return Ok(()),
                Err(e) if e.is_interaction_refused() && Instant::now() < deadline => {
                    debug!("plain interaction refused: {}", e);
                    sleep(self.timeouts.poll()).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn not_found(&self, query: &ElementQuery, hidden: usize) -> ResolutionError {
        ResolutionError::NotFound {
            field: query.field().to_string(),
            attempted: query.describe(),
            hidden,
        }
    }
}

fn checked_word(state: bool) -> &'static str {
    if state { "checked" } else { "unchecked" }
}
