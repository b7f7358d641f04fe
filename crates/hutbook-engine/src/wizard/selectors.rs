//! Declarative identification strategies for every control the wizard touches.
//!
//! The site is served in Italian, German, French and English; label
//! strategies list the wording of each language, stable `data-test` or id
//! selectors come first where the site has them.

use crate::request::{LoginProvider, RoomType};
use crate::resolution::{ElementQuery, TextField};
use chrono::NaiveDate;

use super::calendar::format_ui_date;

pub const LOGIN_USERNAME: &str = "input[autocomplete='username']";
pub const LOGIN_PASSWORD: &str = "input[autocomplete='current-password']";
pub const LOGIN_SUBMIT: &str = "#nextButton";
pub const SAC_BUTTON: &str = "#sacButton";
pub const SAC_USERNAME: &str = "input#person_login_identity";
pub const SAC_PASSWORD: &str = "input#person_password";
pub const SAC_SUBMIT: &str = "button[type='submit']";

pub const BUTTON: &str = "button";
pub const DIALOG: &str = "mat-dialog-container";
pub const ADD_RESERVATION: &str = ".add_button";
pub const HUT_INPUT: &str = "#hutInput";
pub const HUT_OPTION: &str = "mat-option";

pub const DATE_PICKER_TOGGLE: &str = "#cy-datePicker__toggle button";
pub const DATE_RANGE_INPUT: &str = "#cy-datePicker input";
pub const DATE_RANGE_FALLBACK: &str = "mat-date-range-input";
pub const CALENDAR_PERIOD: &str = ".mat-calendar-period-button";
pub const CALENDAR_NEXT: &str = "button.mat-calendar-next-button";
pub const CALENDAR_PREVIOUS: &str = "button.mat-calendar-previous-button";

pub const PEOPLE_INPUT: &str = "input[data-test*='people-input']";
pub const TOTAL_PEOPLE_INPUT: &str = "input[data-test*='total-people']";

pub const NEXT_CHECK_AVAILABILITY: &str = "[data-test='button-next-check-availability']";
pub const NEXT_AVAILABILITY_ALT: &str = "[data-test='button-next-availability']";
pub const NEXT_OVERNIGHT: &str = "[data-test='button-next-overnight-stay']";
pub const NEXT_PERSONAL: &str = "[data-test='button-next-personal-data']";
pub const NEXT_SUMMARY: &str = "[data-test='button-next-summary']";

pub const CHECKBOX: &str = "input[type='checkbox']";
pub const MAT_CHECKBOX: &str = "mat-checkbox";
pub const RADIO_BUTTON: &str = "mat-radio-button";
pub const TEXT_FIELD: &str = "input, textarea";
pub const MAT_SELECT: &str = "mat-select";
pub const MAT_OPTION: &str = "mat-option";

pub fn date_cell_css(date: NaiveDate) -> String {
    format!("button.custom-date[class*='{}']", format_ui_date(date))
}

pub fn login_username(provider: LoginProvider) -> ElementQuery {
    match provider {
        LoginProvider::Default => ElementQuery::new("login_username").selector(LOGIN_USERNAME),
        LoginProvider::Sac => ElementQuery::new("sac_username").selector(SAC_USERNAME),
    }
}

pub fn login_password(provider: LoginProvider) -> ElementQuery {
    match provider {
        LoginProvider::Default => ElementQuery::new("login_password").selector(LOGIN_PASSWORD),
        LoginProvider::Sac => ElementQuery::new("sac_password").selector(SAC_PASSWORD),
    }
}

pub fn login_submit(provider: LoginProvider) -> ElementQuery {
    match provider {
        LoginProvider::Default => ElementQuery::new("login_submit").selector(LOGIN_SUBMIT),
        LoginProvider::Sac => ElementQuery::new("sac_submit").selector(SAC_SUBMIT),
    }
}

pub fn sac_button() -> ElementQuery {
    ElementQuery::new("login_sac_button").selector(SAC_BUTTON)
}

pub fn add_reservation() -> ElementQuery {
    ElementQuery::new("add_reservation_button")
        .selector(ADD_RESERVATION)
        .label(
            BUTTON,
            TextField::Text,
            [
                "AGGIUNGI PRENOTAZIONE",
                "RESERVATION HINZUFÜGEN",
                "AJOUTER UNE RÉSERVATION",
                "ADD RESERVATION",
            ],
        )
}

pub fn hut_input() -> ElementQuery {
    ElementQuery::new("hut_input").selector(HUT_INPUT)
}

pub fn hut_options() -> ElementQuery {
    ElementQuery::new("hut_options").selector(HUT_OPTION)
}

pub fn confirm_hut() -> ElementQuery {
    ElementQuery::new("add_reservation_ok")
        .label(BUTTON, TextField::Text, ["OK"])
        .scoped(DIALOG, BUTTON)
}

pub fn date_picker_toggle() -> ElementQuery {
    ElementQuery::new("date_picker_toggle").selector(DATE_PICKER_TOGGLE)
}

pub fn calendar_period() -> ElementQuery {
    ElementQuery::new("calendar_period").selector(CALENDAR_PERIOD)
}

pub fn calendar_next() -> ElementQuery {
    ElementQuery::new("calendar_next").selector(CALENDAR_NEXT)
}

pub fn calendar_previous() -> ElementQuery {
    ElementQuery::new("calendar_previous").selector(CALENDAR_PREVIOUS)
}

pub fn date_cell(date: NaiveDate) -> ElementQuery {
    ElementQuery::new(format!("date_{}", format_ui_date(date))).selector(date_cell_css(date))
}

pub fn date_range_display() -> ElementQuery {
    ElementQuery::new("date_range")
        .selector(DATE_RANGE_INPUT)
        .selector(DATE_RANGE_FALLBACK)
}

pub fn people_inputs() -> ElementQuery {
    ElementQuery::new("people_input").selector(PEOPLE_INPUT)
}

/// Counter of the requested room type, matched by its label vocabulary.
pub fn room_counter(room_type: &RoomType) -> ElementQuery {
    ElementQuery::new(format!("people_input_{}", room_type)).label(
        PEOPLE_INPUT,
        TextField::Label,
        room_type.keywords(),
    )
}

pub fn total_people() -> ElementQuery {
    ElementQuery::new("total_people")
        .selector(TOTAL_PEOPLE_INPUT)
        .label(
            PEOPLE_INPUT,
            TextField::Label,
            ["Totale", "Gesamt", "Total"],
        )
}

pub fn check_availability() -> ElementQuery {
    ElementQuery::new("next_check_availability").selector(NEXT_CHECK_AVAILABILITY)
}

pub fn alternative_availability() -> ElementQuery {
    ElementQuery::new("next_availability_alt").selector(NEXT_AVAILABILITY_ALT)
}

pub fn waitlist() -> ElementQuery {
    let words = [
        "lista d'attesa",
        "Warteliste",
        "liste d'attente",
        "waiting list",
        "waitlist",
    ];
    ElementQuery::new("waitlist")
        .label(CHECKBOX, TextField::Label, words)
        .label(MAT_CHECKBOX, TextField::Text, words)
}

pub fn half_board(wanted: bool) -> ElementQuery {
    let words: &[&str] = if wanted {
        &["Sì", "Ja", "Oui", "Yes"]
    } else {
        &["No", "Nein", "Non"]
    };
    ElementQuery::new("half_board").label(RADIO_BUTTON, TextField::Text, words.iter().copied())
}

/// Free fields of the overnight-stay page, identified by placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StayField {
    Children,
    Guides,
    Vegetarians,
    LunchPackages,
    GroupName,
    AccessToHut,
    Allergies,
    Comments,
}

impl StayField {
    fn placeholders(self) -> &'static [&'static str] {
        match self {
            StayField::Children => &["Di cui bambini", "Davon Kinder", "Dont enfants"],
            StayField::Guides => &[
                "Di cui guide alpine",
                "Davon Bergführer",
                "Dont guides de montagne",
            ],
            StayField::Vegetarians => &["Vegetariani", "Vegetarier", "Végétariens"],
            StayField::LunchPackages => &["Pacchetto lunch", "Lunchpaket", "Panier-repas"],
            StayField::GroupName => &["Nome di gruppo", "Gruppenname", "Nom du groupe"],
            StayField::AccessToHut => &["Accesso al rifugio", "Zustieg", "Accès à la cabane"],
            StayField::Allergies => &[
                "Allergie e intolleranze",
                "Allergien und Unverträglichkeiten",
                "Allergies et intolérances",
            ],
            StayField::Comments => &["Commenti", "Bemerkungen", "Commentaires"],
        }
    }

    fn name(self) -> &'static str {
        match self {
            StayField::Children => "children_count",
            StayField::Guides => "guides_count",
            StayField::Vegetarians => "vegetarian_count",
            StayField::LunchPackages => "lunch_packages",
            StayField::GroupName => "group_name",
            StayField::AccessToHut => "access_to_hut",
            StayField::Allergies => "allergies",
            StayField::Comments => "comments",
        }
    }
}

pub fn stay_field(field: StayField) -> ElementQuery {
    ElementQuery::new(field.name()).label(
        TEXT_FIELD,
        TextField::Placeholder,
        field.placeholders().iter().copied(),
    )
}

pub fn overnight_next() -> ElementQuery {
    ElementQuery::new("next_overnight").selector(NEXT_OVERNIGHT)
}

/// Personal-data fields, identified by aria-label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactField {
    FirstName,
    LastName,
    AddressLine1,
    PostalCode,
    City,
    Email,
    Phone,
}

impl ContactField {
    pub const ALL: [ContactField; 7] = [
        ContactField::FirstName,
        ContactField::LastName,
        ContactField::AddressLine1,
        ContactField::PostalCode,
        ContactField::City,
        ContactField::Email,
        ContactField::Phone,
    ];

    fn labels(self) -> &'static [&'static str] {
        match self {
            ContactField::FirstName => &["Nome", "Vorname", "Prénom", "First name"],
            ContactField::LastName => &["Cognome", "Nachname", "Nom", "Last name"],
            ContactField::AddressLine1 => &["Indirizzo 1", "Adresse 1", "Address 1"],
            ContactField::PostalCode => &["CAP", "PLZ", "NPA", "Postal code"],
            ContactField::City => &["Località", "Ort", "Localité", "City"],
            ContactField::Email => &["E-mail", "E-Mail", "Email"],
            ContactField::Phone => &[
                "Numero di Cellulare",
                "Mobilnummer",
                "Numéro de portable",
                "Mobile number",
            ],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ContactField::FirstName => "first_name",
            ContactField::LastName => "last_name",
            ContactField::AddressLine1 => "address_line1",
            ContactField::PostalCode => "postal_code",
            ContactField::City => "city",
            ContactField::Email => "email",
            ContactField::Phone => "phone",
        }
    }
}

pub fn contact_field(field: ContactField) -> ElementQuery {
    ElementQuery::new(field.name()).label(TEXT_FIELD, TextField::Label, field.labels().iter().copied())
}

pub fn country_select() -> ElementQuery {
    ElementQuery::new("country")
        .label(
            MAT_SELECT,
            TextField::Label,
            ["Paese", "Nazione", "Land", "Pays", "Country"],
        )
        .selector(MAT_SELECT)
}

pub fn country_options() -> ElementQuery {
    ElementQuery::new("country_option").selector(MAT_OPTION)
}

/// Option texts tried for a configured country, most specific first.
pub fn country_option_texts(country: &str) -> Vec<String> {
    let trimmed = country.trim();
    let mut texts = Vec::new();
    if matches!(
        trimmed.to_lowercase().as_str(),
        "switzerland" | "ch" | "svizzera" | "suisse" | "schweiz"
    ) {
        texts.push("Svizzera - CH".to_string());
    }
    texts.push(trimmed.to_string());
    texts
}

pub fn personal_next() -> ElementQuery {
    ElementQuery::new("next_personal").selector(NEXT_PERSONAL)
}

pub fn terms_checkbox() -> ElementQuery {
    ElementQuery::new("terms_checkbox").label(CHECKBOX, TextField::Label, ["GTC", "CGC", "AGB", "CGV"])
}

pub fn privacy_checkbox() -> ElementQuery {
    ElementQuery::new("privacy_checkbox").label(
        CHECKBOX,
        TextField::Label,
        ["Privacy", "Datenschutz", "Confidentialité"],
    )
}

pub fn summary_next() -> ElementQuery {
    ElementQuery::new("next_summary").selector(NEXT_SUMMARY)
}
