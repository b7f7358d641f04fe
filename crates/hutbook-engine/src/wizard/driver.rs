use super::availability::{
    AvailabilityDecision, AvailabilityFacts, AvailabilityPolicy, MAX_ROUNDS, PageSignals,
    PollProgress, PollVerdict, classify,
};
use super::calendar::{
    CalendarPeriod, MAX_MONTH_STEPS, MonthStep, format_ui_date, month_steps,
    parse_calendar_period, parse_date_range,
};
use super::selectors::{self, ContactField, StayField};
use super::state::WizardState;
use crate::backend::Backend;
use crate::config::{EngineConfig, SiteConfig};
use crate::credentials::Credentials;
use crate::error::WizardError;
use crate::request::{BookingRequest, Contact, LoginProvider};
use crate::resolution::matching::{StrategyOutcome, choose_by_text};
use crate::resolution::{
    ElementQuery, ElementResolver, Resolution, ResolutionError, ResolvedElement,
};
use crate::screenshots::StepRecorder;
use chrono::NaiveDate;
use hutbook_common::protocol::ElementSnapshot;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

/// A disabled proceed control must stay disabled this long before the
/// availability step treats it as final.
const DISABLED_SETTLE: Duration = Duration::from_millis(1000);

/// Advances one booking attempt through the wizard, one transition per call.
///
/// Every transition checks the current state, performs its interactions,
/// waits for the next page's marker and records one screenshot whether it
/// succeeded or not.
pub struct WizardStepDriver<'a, B: Backend + ?Sized> {
    resolver: ElementResolver<'a, B>,
    site: &'a SiteConfig,
    request: &'a BookingRequest,
    credentials: &'a Credentials,
    recorder: StepRecorder<'a>,
    state: WizardState,
}

impl<'a, B: Backend + ?Sized> WizardStepDriver<'a, B> {
    pub fn new(
        backend: &'a mut B,
        config: &'a EngineConfig,
        request: &'a BookingRequest,
        credentials: &'a Credentials,
        recorder: StepRecorder<'a>,
    ) -> Self {
        Self {
            resolver: ElementResolver::new(backend, &config.timeouts),
            site: &config.site,
            request,
            credentials,
            recorder,
            state: WizardState::LoggedOut,
        }
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn steps_recorded(&self) -> usize {
        self.recorder.steps()
    }

    /// Every transition up to and including the consent checkboxes.
    pub async fn prepare(&mut self) -> Result<(), WizardError> {
        self.login().await?;
        self.choose_hut().await?;
        self.open_wizard().await?;
        self.select_dates().await?;
        self.set_party_size().await?;
        self.resolve_availability().await?;
        self.fill_overnight().await?;
        self.fill_personal().await?;
        self.accept_consent().await
    }

    pub async fn login(&mut self) -> Result<(), WizardError> {
        self.begin("login", WizardState::LoggedOut)?;
        let result = self.login_steps().await;
        self.complete("login", WizardState::ReservationList, result)
            .await
    }

    /// Returns the hut name as the site displays it.
    pub async fn choose_hut(&mut self) -> Result<String, WizardError> {
        self.begin("choose_hut", WizardState::ReservationList)?;
        let result = self.choose_hut_steps().await;
        let label = match &result {
            Ok(name) => format!("hut_selected_{}", name),
            Err(_) => "hut_selected".to_string(),
        };
        self.complete(&label, WizardState::HutChosen, result).await
    }

    pub async fn open_wizard(&mut self) -> Result<(), WizardError> {
        self.begin("open_wizard", WizardState::HutChosen)?;
        let result = self.open_wizard_steps().await;
        self.complete("wizard_ready", WizardState::WizardReady, result)
            .await
    }

    pub async fn select_dates(&mut self) -> Result<(), WizardError> {
        self.begin("select_dates", WizardState::WizardReady)?;
        let result = self.select_dates_steps().await;
        self.complete("dates_selected", WizardState::DatesSelected, result)
            .await
    }

    pub async fn set_party_size(&mut self) -> Result<(), WizardError> {
        self.begin("set_party_size", WizardState::DatesSelected)?;
        let result = self.party_size_steps().await;
        self.complete("people_set", WizardState::PartySizeSet, result)
            .await
    }

    pub async fn resolve_availability(&mut self) -> Result<(), WizardError> {
        self.begin("resolve_availability", WizardState::PartySizeSet)?;
        let result = self.availability_steps().await;
        self.complete(
            "availability_checked",
            WizardState::AvailabilityResolved,
            result,
        )
        .await
    }

    pub async fn fill_overnight(&mut self) -> Result<(), WizardError> {
        self.begin("fill_overnight", WizardState::AvailabilityResolved)?;
        let result = self.overnight_steps().await;
        self.complete("overnight_filled", WizardState::OvernightFilled, result)
            .await
    }

    pub async fn fill_personal(&mut self) -> Result<(), WizardError> {
        self.begin("fill_personal", WizardState::OvernightFilled)?;
        let result = self.personal_steps().await;
        self.complete("personal_filled", WizardState::PersonalFilled, result)
            .await
    }

    pub async fn accept_consent(&mut self) -> Result<(), WizardError> {
        self.begin("accept_consent", WizardState::PersonalFilled)?;
        let result = self.consent_steps().await;
        self.complete("summary_checked", WizardState::SummaryReady, result)
            .await
    }

    /// Irreversible: confirms the reservation on the site.
    pub async fn submit(&mut self) -> Result<(), WizardError> {
        self.begin("submit", WizardState::SummaryReady)?;
        let result = self.submit_steps().await;
        self.complete("payment_step", WizardState::Submitted, result)
            .await
    }

    fn begin(&self, step: &'static str, expected: WizardState) -> Result<(), WizardError> {
        if self.state != expected {
            return Err(WizardError::OutOfOrder {
                step,
                expected,
                actual: self.state,
            });
        }
        debug!("[{}] {} from {}", self.request.label, step, self.state);
        Ok(())
    }

    async fn complete<T>(
        &mut self,
        label: &str,
        next: WizardState,
        result: Result<T, WizardError>,
    ) -> Result<T, WizardError> {
        match result {
            Ok(value) => {
                self.state = next;
                info!("[{}] {} -> {}", self.request.label, label, next);
                self.recorder.record(self.resolver.backend(), label).await;
                Ok(value)
            }
            Err(e) => {
                warn!("[{}] {} failed: {}", self.request.label, label, e);
                let failed = format!("{}_failed", label);
                self.recorder.record(self.resolver.backend(), &failed).await;
                Err(e)
            }
        }
    }

    /// Wait for a marker of the following page.
    async fn await_marker(
        &mut self,
        step: &'static str,
        marker: &ElementQuery,
        timeout: Duration,
    ) -> Result<ResolvedElement, WizardError> {
        match self.resolver.resolve(marker, timeout).await {
            Ok(el) => Ok(el),
            Err(ResolutionError::NotFound { field, .. }) => Err(WizardError::StageDidNotAdvance {
                step,
                marker: field,
                waited_ms: timeout.as_millis() as u64,
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Click a continue control, refusing when the site keeps it disabled.
    async fn click_enabled(
        &mut self,
        step: &'static str,
        query: &ElementQuery,
    ) -> Result<(), WizardError> {
        let control = self.resolver.locate(query).await?;
        if control.snapshot.is_disabled() {
            return Err(WizardError::IncompleteStep {
                step,
                control: query.field().to_string(),
            });
        }
        self.resolver.click_resolved(query, &control).await?;
        Ok(())
    }

    async fn press_key(&mut self, key: &str) {
        if let Err(e) = self.resolver.backend().press_key(key).await {
            debug!("press_key({}) ignored: {}", key, e);
        }
    }

    // ------------------------------------------------------------------
    // login
    // ------------------------------------------------------------------

    async fn login_steps(&mut self) -> Result<(), WizardError> {
        let login_url = self.site.login_url();
        self.resolver.backend().navigate(&login_url).await?;

        let provider = self.request.login_provider;
        if provider == LoginProvider::Sac {
            self.resolver.click(&selectors::sac_button()).await?;
        }
        let username = self.credentials.username.clone();
        let password = self.credentials.password.clone();
        self.resolver
            .fill(&selectors::login_username(provider), &username)
            .await?;
        self.resolver
            .fill(&selectors::login_password(provider), &password)
            .await?;
        self.resolver
            .click(&selectors::login_submit(provider))
            .await?;

        self.await_redirect_from_login().await?;

        let list_url = self.site.list_url();
        self.resolver.backend().navigate(&list_url).await?;
        let stage = self.resolver.timeouts().stage();
        self.await_marker("login", &selectors::add_reservation(), stage)
            .await?;
        Ok(())
    }

    async fn await_redirect_from_login(&mut self) -> Result<(), WizardError> {
        let timeout = self.resolver.timeouts().stage();
        let deadline = Instant::now() + timeout;
        let base = self.site.base_url.trim_end_matches('/').to_string();
        let login_path = self.site.login_path.clone();
        loop {
            let url = self.resolver.backend().current_url().await?;
            if url.starts_with(&base) && !url.contains(&login_path) {
                debug!("logged in, now at {}", url);
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(WizardError::StageDidNotAdvance {
                    step: "login",
                    marker: format!("redirect away from {}", login_path),
                    waited_ms: timeout.as_millis() as u64,
                });
            }
            sleep(self.resolver.timeouts().poll()).await;
        }
    }

    // ------------------------------------------------------------------
    // hut selection
    // ------------------------------------------------------------------

    async fn choose_hut_steps(&mut self) -> Result<String, WizardError> {
        self.resolver.click(&selectors::add_reservation()).await?;

        let name = self.request.hut_name.clone();
        let input = self.resolver.fill(&selectors::hut_input(), &name).await?;

        let options_query = selectors::hut_options();
        let deadline = Instant::now() + self.resolver.timeouts().hut_options();
        loop {
            let options = self.resolver.visible(&options_query).await?;
            if !options.is_empty() {
                let chosen = pick_hut_option(options, &name, &options_query)?;
                let shown = chosen.displayed_text().trim().to_string();
                let resolved = ResolvedElement {
                    id: chosen.id,
                    field: options_query.field().to_string(),
                    strategy: "hut option list".to_string(),
                    snapshot: chosen,
                };
                self.resolver
                    .click_resolved(&options_query, &resolved)
                    .await?;
                info!("Selected hut '{}'", shown);
                return Ok(shown);
            }
            if Instant::now() >= deadline {
                break;
            }
            sleep(self.resolver.timeouts().poll()).await;
        }

        // Some searches auto-select without ever listing options.
        let current = match self.resolver.inspect(input.id).await {
            Ok(snapshot) => snapshot,
            Err(e) if e.is_stale() => self.resolver.locate(&selectors::hut_input()).await?.snapshot,
            Err(e) => return Err(e.into()),
        };
        let value = current.displayed_text().trim().to_string();
        if !value.is_empty() && value.to_lowercase().contains(&name.to_lowercase()) {
            warn!(
                "No hut options were listed; accepting '{}' from the search field as a tentative match",
                value
            );
            return Ok(value);
        }
        Err(ResolutionError::NotFound {
            field: options_query.field().to_string(),
            attempted: options_query.describe(),
            hidden: 0,
        }
        .into())
    }

    async fn open_wizard_steps(&mut self) -> Result<(), WizardError> {
        self.resolver.click(&selectors::confirm_hut()).await?;
        let timeout = self.resolver.timeouts().wizard_ready();
        self.await_marker("open_wizard", &selectors::date_picker_toggle(), timeout)
            .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // dates
    // ------------------------------------------------------------------

    async fn select_dates_steps(&mut self) -> Result<(), WizardError> {
        let wanted = (self.request.check_in, self.request.check_out);
        self.pick_dates().await?;

        let (text, shown) = self.read_date_range().await?;
        if shown == Some(wanted) {
            return Ok(());
        }
        if shown.is_some() && self.request.retry.allow_alternative_dates {
            warn!(
                "Site shows '{}' instead of the requested range; alternative dates are allowed",
                text
            );
            return Ok(());
        }

        warn!("Site shows '{}' instead of the requested range; selecting again", text);
        self.pick_dates().await?;
        let (text, shown) = self.read_date_range().await?;
        if shown == Some(wanted) {
            return Ok(());
        }
        Err(ResolutionError::ValueMismatch {
            field: "date_range".to_string(),
            expected: format!("{} - {}", format_ui_date(wanted.0), format_ui_date(wanted.1)),
            actual: text,
        }
        .into())
    }

    async fn pick_dates(&mut self) -> Result<(), WizardError> {
        self.resolver.click(&selectors::date_picker_toggle()).await?;
        let stage = self.resolver.timeouts().stage();
        self.await_marker("select_dates", &selectors::calendar_period(), stage)
            .await?;

        for date in [self.request.check_in, self.request.check_out] {
            self.navigate_calendar(date).await?;
            let query = selectors::date_cell(date);
            let cell = self.resolver.locate(&query).await?;
            if cell.snapshot.is_disabled() {
                return Err(WizardError::AvailabilityNotFound(format!(
                    "Date not available: {}",
                    format_ui_date(date)
                )));
            }
            self.resolver.click_resolved(&query, &cell).await?;
            sleep(self.resolver.timeouts().poll()).await;
        }
        self.press_key("Escape").await;
        Ok(())
    }

    /// Step the picker month by month until it shows `date`'s month.
    async fn navigate_calendar(&mut self, date: NaiveDate) -> Result<(), WizardError> {
        let target = CalendarPeriod::of(date);
        for _ in 0..=MAX_MONTH_STEPS {
            let header = self.resolver.locate(&selectors::calendar_period()).await?;
            let label = header.snapshot.displayed_text().to_string();
            let current = parse_calendar_period(&label).ok_or_else(|| {
                WizardError::Fatal(format!("Unrecognized calendar period label: '{}'", label))
            })?;
            match month_steps(current, target) {
                MonthStep::Stay => return Ok(()),
                MonthStep::Forward(_) => {
                    self.resolver.click(&selectors::calendar_next()).await?;
                }
                MonthStep::Backward(_) => {
                    self.resolver.click(&selectors::calendar_previous()).await?;
                }
            }
            sleep(self.resolver.timeouts().poll()).await;
        }
        Err(WizardError::Fatal(format!(
            "Unable to navigate calendar to {:02}/{} within {} steps",
            target.month, target.year, MAX_MONTH_STEPS
        )))
    }

    async fn read_date_range(
        &mut self,
    ) -> Result<(String, Option<(NaiveDate, NaiveDate)>), WizardError> {
        let display = self.resolver.locate(&selectors::date_range_display()).await?;
        let text = display.snapshot.displayed_text().trim().to_string();
        let parsed = parse_date_range(&text);
        debug!("rendered date range '{}' -> {:?}", text, parsed);
        Ok((text, parsed))
    }

    // ------------------------------------------------------------------
    // party size
    // ------------------------------------------------------------------

    async fn party_size_steps(&mut self) -> Result<(), WizardError> {
        let value = self.request.party_size.to_string();
        let counter_query = match &self.request.preferences.room_type {
            Some(room_type) => selectors::room_counter(room_type),
            None => selectors::people_inputs(),
        };
        let total_query = selectors::total_people();
        let (counter, total) = self.await_party_inputs(&counter_query, &total_query).await?;

        let mut written = Vec::new();
        for (query, found) in [(&counter_query, counter), (&total_query, total)] {
            let Some(el) = found else { continue };
            if written.contains(&el.id) {
                continue;
            }
            if !el.snapshot.accepts_input() {
                debug!("'{}' is not editable", el.field);
                continue;
            }
            self.resolver.fill_resolved(query, &el, &value).await?;
            written.push(el.id);
        }

        if written.is_empty() {
            return Err(WizardError::IncompleteStep {
                step: "set_party_size",
                control: counter_query.field().to_string(),
            });
        }
        self.press_key("Tab").await;

        let stage = self.resolver.timeouts().stage();
        self.await_marker("set_party_size", &selectors::check_availability(), stage)
            .await?;
        Ok(())
    }

    /// Wait until the room counter or the total field shows up, then report
    /// whichever are present.
    async fn await_party_inputs(
        &mut self,
        counter_query: &ElementQuery,
        total_query: &ElementQuery,
    ) -> Result<(Option<ResolvedElement>, Option<ResolvedElement>), WizardError> {
        let timeout = self.resolver.timeouts().element();
        let deadline = Instant::now() + timeout;
        loop {
            let counter = self.resolver.find(counter_query).await?;
            let total = self.resolver.find(total_query).await?;
            match (counter, total) {
                (Resolution::Absent { attempted, hidden }, Resolution::Absent { .. }) => {
                    if Instant::now() >= deadline {
                        return Err(ResolutionError::NotFound {
                            field: counter_query.field().to_string(),
                            attempted,
                            hidden,
                        }
                        .into());
                    }
                }
                (counter, total) => return Ok((counter.found(), total.found())),
            }
            sleep(self.resolver.timeouts().poll()).await;
        }
    }

    // ------------------------------------------------------------------
    // availability
    // ------------------------------------------------------------------

    async fn availability_steps(&mut self) -> Result<(), WizardError> {
        let policy = AvailabilityPolicy::for_request(self.request);
        let mut facts = AvailabilityFacts::default();

        for round in 1..=MAX_ROUNDS {
            let proceed = self.resolver.locate(&selectors::check_availability()).await?;
            facts.proceed_enabled = !proceed.snapshot.is_disabled();
            facts.waitlist_present = matches!(
                self.resolver.find(&selectors::waitlist()).await?,
                Resolution::Found(_)
            );

            let decision = policy.decide(&facts);
            debug!("availability round {}: {:?} -> {:?}", round, facts, decision);

            let progress = match decision {
                AvailabilityDecision::Proceed => PollProgress::default(),
                AvailabilityDecision::JoinWaitlist => {
                    info!("Requested dates are full; joining the waitlist");
                    self.resolver
                        .set_checked(&selectors::waitlist(), true)
                        .await?;
                    facts.waitlist_tried = true;
                    continue;
                }
                AvailabilityDecision::AcceptAlternative => {
                    warn!("Requested dates are full; accepting the alternative the site offers");
                    facts.alternative_tried = true;
                    PollProgress {
                        secondary_allowed: true,
                        ..PollProgress::default()
                    }
                }
                AvailabilityDecision::Unavailable(reason) => {
                    return Err(WizardError::AvailabilityNotFound(reason));
                }
            };

            if self.await_availability_outcome(progress).await? == PollVerdict::Advanced {
                return Ok(());
            }
        }

        Err(WizardError::AvailabilityNotFound(format!(
            "availability check did not settle after {} rounds",
            MAX_ROUNDS
        )))
    }

    /// Poll until the next page shows up or the proceed control settles as
    /// disabled, clicking primary and secondary proceed controls as they
    /// become usable.
    async fn await_availability_outcome(
        &mut self,
        mut progress: PollProgress,
    ) -> Result<PollVerdict, WizardError> {
        let timeout = self.resolver.timeouts().availability();
        let deadline = Instant::now() + timeout;
        let mut disabled_since: Option<Instant> = None;

        loop {
            let signals = self.read_availability_signals().await?;
            let verdict = classify(&signals, &progress);
            debug!("availability signals {:?} -> {:?}", signals, verdict);

            match verdict {
                PollVerdict::Advanced => return Ok(PollVerdict::Advanced),
                PollVerdict::ClickPrimary => {
                    self.resolver.click(&selectors::check_availability()).await?;
                    progress.primary_clicked = true;
                    disabled_since = None;
                }
                PollVerdict::ClickSecondary => {
                    self.resolver
                        .click(&selectors::alternative_availability())
                        .await?;
                    progress.secondary_clicks += 1;
                    disabled_since = None;
                }
                PollVerdict::StillDisabled => {
                    let since = *disabled_since.get_or_insert_with(Instant::now);
                    if since.elapsed() >= DISABLED_SETTLE {
                        return Ok(PollVerdict::StillDisabled);
                    }
                }
                PollVerdict::Pending => disabled_since = None,
            }

            if Instant::now() >= deadline {
                return Err(WizardError::StageDidNotAdvance {
                    step: "resolve_availability",
                    marker: selectors::overnight_next().field().to_string(),
                    waited_ms: timeout.as_millis() as u64,
                });
            }
            sleep(self.resolver.timeouts().poll()).await;
        }
    }

    async fn read_availability_signals(&mut self) -> Result<PageSignals, WizardError> {
        let next_step_visible = matches!(
            self.resolver.find(&selectors::overnight_next()).await?,
            Resolution::Found(_)
        );
        let primary = self.control_state(&selectors::check_availability()).await?;
        let secondary = self
            .control_state(&selectors::alternative_availability())
            .await?;
        Ok(PageSignals {
            next_step_visible,
            primary,
            secondary,
        })
    }

    /// `Some(enabled)` when the control is visible, `None` otherwise.
    async fn control_state(&mut self, query: &ElementQuery) -> Result<Option<bool>, WizardError> {
        Ok(match self.resolver.find(query).await? {
            Resolution::Found(el) => Some(!el.snapshot.is_disabled()),
            Resolution::Absent { .. } => None,
        })
    }

    // ------------------------------------------------------------------
    // overnight stay, personal data, consent, submit
    // ------------------------------------------------------------------

    async fn overnight_steps(&mut self) -> Result<(), WizardError> {
        self.resolver
            .click(&selectors::half_board(self.request.half_board))
            .await?;

        let stay = &self.request.stay;
        let values = [
            (StayField::Children, count_value(stay.children_count)),
            (StayField::Guides, count_value(stay.guides_count)),
            (StayField::Vegetarians, count_value(stay.vegetarian_count)),
            (StayField::LunchPackages, count_value(stay.lunch_packages)),
            (StayField::GroupName, stay.group_name.clone()),
            (StayField::AccessToHut, stay.access_to_hut.clone()),
            (StayField::Allergies, stay.allergies.clone()),
            (StayField::Comments, stay.comments.clone()),
        ];
        for (field, value) in values {
            if let Some(value) = value {
                self.resolver
                    .fill(&selectors::stay_field(field), &value)
                    .await?;
            }
        }

        self.click_enabled("fill_overnight", &selectors::overnight_next())
            .await?;
        let stage = self.resolver.timeouts().stage();
        self.await_marker("fill_overnight", &selectors::personal_next(), stage)
            .await?;
        Ok(())
    }

    async fn personal_steps(&mut self) -> Result<(), WizardError> {
        let contact = &self.request.contact;
        for field in ContactField::ALL {
            let value = contact_value(contact, field);
            self.resolver
                .fill_or_validate(&selectors::contact_field(field), value)
                .await?;
        }
        self.select_country().await?;

        self.click_enabled("fill_personal", &selectors::personal_next())
            .await?;
        let stage = self.resolver.timeouts().stage();
        self.await_marker("fill_personal", &selectors::terms_checkbox(), stage)
            .await?;
        Ok(())
    }

    async fn select_country(&mut self) -> Result<(), WizardError> {
        let country = self.request.contact.country.clone();
        let wanted = selectors::country_option_texts(&country);
        let select_query = selectors::country_select();
        let select = self.resolver.locate(&select_query).await?;

        if !select.snapshot.accepts_input() {
            let current = select.snapshot.displayed_text().to_lowercase();
            if wanted.iter().any(|w| current.contains(&w.to_lowercase())) {
                return Ok(());
            }
            return Err(ResolutionError::ValueMismatch {
                field: select_query.field().to_string(),
                expected: country,
                actual: select.snapshot.displayed_text().to_string(),
            }
            .into());
        }

        self.resolver.click_resolved(&select_query, &select).await?;

        let options_query = selectors::country_options();
        let deadline = Instant::now() + self.resolver.timeouts().element();
        loop {
            let options = self.resolver.visible(&options_query).await?;
            if !options.is_empty() {
                return match choose_by_text(options, &wanted) {
                    StrategyOutcome::Selected { element, .. } => {
                        let resolved = ResolvedElement {
                            id: element.id,
                            field: options_query.field().to_string(),
                            strategy: "country option list".to_string(),
                            snapshot: element,
                        };
                        self.resolver
                            .click_resolved(&options_query, &resolved)
                            .await?;
                        Ok(())
                    }
                    StrategyOutcome::Ambiguous { candidates } => {
                        Err(ambiguous(&options_query, &candidates).into())
                    }
                    StrategyOutcome::Empty { .. } => Err(ResolutionError::NotFound {
                        field: options_query.field().to_string(),
                        attempted: wanted,
                        hidden: 0,
                    }
                    .into()),
                };
            }
            if Instant::now() >= deadline {
                return Err(ResolutionError::NotFound {
                    field: options_query.field().to_string(),
                    attempted: options_query.describe(),
                    hidden: 0,
                }
                .into());
            }
            sleep(self.resolver.timeouts().poll()).await;
        }
    }

    async fn consent_steps(&mut self) -> Result<(), WizardError> {
        if !self.request.accept_terms {
            return Err(WizardError::Fatal(
                "accept_terms must be true before consenting".to_string(),
            ));
        }
        self.resolver
            .set_checked(&selectors::terms_checkbox(), true)
            .await?;
        self.resolver
            .set_checked(&selectors::privacy_checkbox(), true)
            .await?;
        Ok(())
    }

    async fn submit_steps(&mut self) -> Result<(), WizardError> {
        let query = selectors::summary_next();
        self.click_enabled("submit", &query).await?;

        let timeout = self.resolver.timeouts().stage();
        let deadline = Instant::now() + timeout;
        loop {
            if let Resolution::Absent { .. } = self.resolver.find(&query).await? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(WizardError::StageDidNotAdvance {
                    step: "submit",
                    marker: "payment step".to_string(),
                    waited_ms: timeout.as_millis() as u64,
                });
            }
            sleep(self.resolver.timeouts().poll()).await;
        }
    }
}

/// Hut search results: a lone option is taken as is; otherwise one option
/// must match the name exactly or by substring.
fn pick_hut_option(
    options: Vec<ElementSnapshot>,
    name: &str,
    query: &ElementQuery,
) -> Result<ElementSnapshot, ResolutionError> {
    let mut options = options;
    if options.len() == 1
        && let Some(only) = options.pop()
    {
        return Ok(only);
    }
    let all = options.clone();
    match choose_by_text(options, &[name.to_string()]) {
        StrategyOutcome::Selected { element, .. } => Ok(element),
        StrategyOutcome::Ambiguous { candidates } => Err(ambiguous(query, &candidates)),
        StrategyOutcome::Empty { .. } => Err(ambiguous(query, &all)),
    }
}

fn ambiguous(query: &ElementQuery, candidates: &[ElementSnapshot]) -> ResolutionError {
    ResolutionError::Ambiguous {
        field: query.field().to_string(),
        strategy: "option text".to_string(),
        candidates: candidates
            .iter()
            .map(|c| c.displayed_text().trim().to_string())
            .collect(),
    }
}

fn count_value(count: u32) -> Option<String> {
    (count > 0).then(|| count.to_string())
}

fn contact_value(contact: &Contact, field: ContactField) -> &str {
    match field {
        ContactField::FirstName => &contact.first_name,
        ContactField::LastName => &contact.last_name,
        ContactField::AddressLine1 => &contact.address_line1,
        ContactField::PostalCode => &contact.postal_code,
        ContactField::City => &contact.city,
        ContactField::Email => &contact.email,
        ContactField::Phone => &contact.phone,
    }
}
