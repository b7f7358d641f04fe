mod common;

use common::{El, MockBackend, Page};
use hutbook_engine::config::Timeouts;
use hutbook_engine::protocol::InteractionMode;
use hutbook_engine::resolution::{
    ElementQuery, ElementResolver, FillOutcome, Resolution, ResolutionError, TextField,
};
use std::time::Duration;

const CHECKBOX: &str = "input[type='checkbox']";
const TEXT_FIELD: &str = "input, textarea";

fn terms() -> ElementQuery {
    ElementQuery::new("terms_checkbox").label(CHECKBOX, TextField::Label, ["CGC"])
}

#[tokio::test]
async fn two_substring_matches_are_ambiguous() {
    let mut page = Page::new();
    page.add(&[CHECKBOX], El::new("input").label("Accetto le CGC"));
    page.add(&[CHECKBOX], El::new("input").label("Ho letto le CGC e la privacy"));
    let mut backend = MockBackend::new(page);
    let timeouts = Timeouts::default();
    let mut resolver = ElementResolver::new(&mut backend, &timeouts);

    match resolver.find(&terms()).await {
        Err(ResolutionError::Ambiguous {
            field, candidates, ..
        }) => {
            assert_eq!(field, "terms_checkbox");
            assert_eq!(candidates.len(), 2);
        }
        other => panic!("expected ambiguity, got {:?}", other),
    }
}

#[tokio::test]
async fn exact_label_beats_substring() {
    let mut page = Page::new();
    page.add(&[TEXT_FIELD], El::new("input").label("Cognome"));
    let nome = page.add(&[TEXT_FIELD], El::new("input").label("Nome"));
    let mut backend = MockBackend::new(page);
    let timeouts = Timeouts::default();
    let mut resolver = ElementResolver::new(&mut backend, &timeouts);

    let query = ElementQuery::new("first_name").label(TEXT_FIELD, TextField::Label, ["Nome"]);
    match resolver.find(&query).await.unwrap() {
        Resolution::Found(el) => assert_eq!(el.id, nome),
        other => panic!("expected a match, got {:?}", other),
    }
}

#[tokio::test]
async fn later_strategy_is_used_when_earlier_ones_are_empty() {
    let mut page = Page::new();
    let ok = page.add(&["mat-dialog-container button"], El::new("button").text("Conferma"));
    let mut backend = MockBackend::new(page);
    let timeouts = Timeouts::default();
    let mut resolver = ElementResolver::new(&mut backend, &timeouts);

    let query = ElementQuery::new("dialog_ok")
        .label("button", TextField::Text, ["OK"])
        .scoped("mat-dialog-container", "button");
    match resolver.find(&query).await.unwrap() {
        Resolution::Found(el) => {
            assert_eq!(el.id, ok);
            assert!(el.strategy.contains("mat-dialog-container"));
        }
        other => panic!("expected a match, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn hidden_matches_time_out_as_not_found() {
    let mut page = Page::new();
    page.add(&[CHECKBOX], El::new("input").label("Accetto le CGC").hidden());
    let mut backend = MockBackend::new(page);
    let timeouts = Timeouts::default();
    let mut resolver = ElementResolver::new(&mut backend, &timeouts);

    let started = tokio::time::Instant::now();
    let err = resolver
        .resolve(&terms(), Duration::from_secs(2))
        .await
        .unwrap_err();
    assert!(started.elapsed() >= Duration::from_secs(2));
    match err {
        ResolutionError::NotFound {
            field,
            attempted,
            hidden,
        } => {
            assert_eq!(field, "terms_checkbox");
            assert_eq!(attempted.len(), 1);
            assert_eq!(hidden, 1);
        }
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn element_appearing_later_is_resolved() {
    let mut page = Page::new();
    let trigger = page.add(&["#trigger"], El::new("button"));
    let late = page.add(&["#late"], El::new("div").hidden());
    page.react(trigger, move |p| p.set_visible(late, true));
    let mut backend = MockBackend::new(page);
    let timeouts = Timeouts::default();
    let mut resolver = ElementResolver::new(&mut backend, &timeouts);

    let query = ElementQuery::new("late").selector("#late");
    assert!(matches!(
        resolver.find(&query).await.unwrap(),
        Resolution::Absent { hidden: 1, .. }
    ));
    resolver
        .click(&ElementQuery::new("trigger").selector("#trigger"))
        .await
        .unwrap();
    let found = resolver.locate(&query).await.unwrap();
    assert_eq!(found.id, late);
}

#[tokio::test(start_paused = true)]
async fn refused_clicks_escalate_through_every_mode() {
    let mut page = Page::new();
    let next = page.add(&["#next"], El::new("button").text("Avanti"));
    page.refuse(next, &[InteractionMode::Plain, InteractionMode::Forced]);
    let mut backend = MockBackend::new(page);
    let timeouts = Timeouts::default();
    let mut resolver = ElementResolver::new(&mut backend, &timeouts);

    resolver
        .click(&ElementQuery::new("next").selector("#next"))
        .await
        .unwrap();

    let modes = backend.page().clicks(next);
    assert_eq!(modes.first(), Some(&InteractionMode::Plain));
    assert!(modes.iter().filter(|m| **m == InteractionMode::Plain).count() > 1);
    assert_eq!(
        modes.iter().filter(|m| **m == InteractionMode::Forced).count(),
        1
    );
    assert_eq!(modes.last(), Some(&InteractionMode::Scripted));
}

#[tokio::test(start_paused = true)]
async fn refusal_in_every_mode_is_a_backend_error() {
    let mut page = Page::new();
    let next = page.add(&["#next"], El::new("button"));
    page.refuse(
        next,
        &[
            InteractionMode::Plain,
            InteractionMode::Forced,
            InteractionMode::Scripted,
        ],
    );
    let mut backend = MockBackend::new(page);
    let timeouts = Timeouts::default();
    let mut resolver = ElementResolver::new(&mut backend, &timeouts);

    let err = resolver
        .click(&ElementQuery::new("next").selector("#next"))
        .await
        .unwrap_err();
    assert!(matches!(err, ResolutionError::Backend { ref field, .. } if field == "next"));
}

#[tokio::test]
async fn stale_handle_is_relocated_once() {
    let mut page = Page::new();
    let option = page.add(&["mat-option"], El::new("mat-option").text("Rifugio Sella"));
    page.rerender_on_touch(option);
    let mut backend = MockBackend::new(page);
    let timeouts = Timeouts::default();
    let mut resolver = ElementResolver::new(&mut backend, &timeouts);

    resolver
        .click(&ElementQuery::new("hut_option").selector("mat-option"))
        .await
        .unwrap();

    let page = backend.page();
    let fresh = page.ids("mat-option");
    assert_eq!(fresh.len(), 1);
    assert_ne!(fresh[0], option);
    assert_eq!(page.last_click(), Some(fresh[0]));
}

#[tokio::test]
async fn read_only_fields_are_validated_instead_of_written() {
    let mut page = Page::new();
    page.add(
        &[TEXT_FIELD],
        El::new("input").label("E-mail").value("Anna@Example.com").readonly(),
    );
    page.add(&[TEXT_FIELD], El::new("input").label("Cognome").value("Rossi").readonly());
    let city = page.add(&[TEXT_FIELD], El::new("input").label("Località"));
    let mut backend = MockBackend::new(page);
    let timeouts = Timeouts::default();
    let mut resolver = ElementResolver::new(&mut backend, &timeouts);

    let email = ElementQuery::new("email").label(TEXT_FIELD, TextField::Label, ["E-mail"]);
    assert_eq!(
        resolver
            .fill_or_validate(&email, "anna@example.com")
            .await
            .unwrap(),
        FillOutcome::AlreadyPresent
    );

    let last_name = ElementQuery::new("last_name").label(TEXT_FIELD, TextField::Label, ["Cognome"]);
    match resolver.fill_or_validate(&last_name, "Bianchi").await {
        Err(ResolutionError::ValueMismatch {
            field,
            expected,
            actual,
        }) => {
            assert_eq!(field, "last_name");
            assert_eq!(expected, "Bianchi");
            assert_eq!(actual, "Rossi");
        }
        other => panic!("expected mismatch, got {:?}", other),
    }

    let city_query = ElementQuery::new("city").label(TEXT_FIELD, TextField::Label, ["Località"]);
    assert_eq!(
        resolver
            .fill_or_validate(&city_query, "Zermatt")
            .await
            .unwrap(),
        FillOutcome::Written
    );
    assert_eq!(
        backend.page().snapshot(city).value.as_deref(),
        Some("Zermatt")
    );
}

#[tokio::test]
async fn checkbox_state_is_verified_after_checking() {
    let mut page = Page::new();
    let terms_id = page.add(&[CHECKBOX], El::new("input").label("Accetto le CGC"));
    let privacy = page.add(&[CHECKBOX], El::new("input").label("Privacy"));
    // The site immediately resets the privacy box.
    page.react(privacy, move |p| p.snapshot_mut(privacy).state.checked = false);
    let mut backend = MockBackend::new(page);
    let timeouts = Timeouts::default();
    let mut resolver = ElementResolver::new(&mut backend, &timeouts);

    resolver.set_checked(&terms(), true).await.unwrap();
    // Already checked: no second probe call.
    resolver.set_checked(&terms(), true).await.unwrap();

    let privacy_query =
        ElementQuery::new("privacy_checkbox").label(CHECKBOX, TextField::Label, ["Privacy"]);
    match resolver.set_checked(&privacy_query, true).await {
        Err(ResolutionError::ValueMismatch {
            expected, actual, ..
        }) => {
            assert_eq!(expected, "checked");
            assert_eq!(actual, "unchecked");
        }
        other => panic!("expected mismatch, got {:?}", other),
    }

    let page = backend.page();
    assert!(page.snapshot(terms_id).state.checked);
    assert_eq!(page.checks(terms_id), 1);
}
