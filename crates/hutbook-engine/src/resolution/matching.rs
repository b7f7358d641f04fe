//! Pure candidate selection for one strategy.
//!
//! Only visible elements take part. A unique case-sensitive exact match wins;
//! otherwise a unique case-insensitive substring match wins; two or more
//! matches at the deciding level is ambiguous.

use super::query::{Strategy, TextField};
use hutbook_common::protocol::ElementSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    Substring,
    Exact,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StrategyOutcome {
    /// No visible candidate; `hidden` counts invisible matches.
    Empty { hidden: usize },
    Selected { element: ElementSnapshot, tier: Tier },
    Ambiguous { candidates: Vec<ElementSnapshot> },
}

/// Collapse runs of whitespace and trim.
pub fn normalize_text(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn field_values<'a>(el: &'a ElementSnapshot, field: &TextField) -> Vec<&'a str> {
    let values = match field {
        TextField::Text => vec![el.text.as_deref()],
        TextField::Label => vec![el.label.as_deref()],
        TextField::Placeholder => vec![el.placeholder.as_deref()],
        TextField::Value => vec![el.value.as_deref()],
        TextField::Attribute(name) => vec![el.attr(name)],
        TextField::Any => vec![
            el.text.as_deref(),
            el.label.as_deref(),
            el.placeholder.as_deref(),
            el.value.as_deref(),
        ],
    };
    values.into_iter().flatten().collect()
}

/// Best tier at which `el` matches any of `texts`.
pub fn match_tier(el: &ElementSnapshot, field: &TextField, texts: &[String]) -> Option<Tier> {
    let values: Vec<String> = field_values(el, field)
        .into_iter()
        .map(normalize_text)
        .collect();
    let mut best = None;
    for wanted in texts {
        let wanted = normalize_text(wanted);
        if wanted.is_empty() {
            continue;
        }
        let lowered = wanted.to_lowercase();
        for value in &values {
            if *value == wanted {
                return Some(Tier::Exact);
            }
            if value.to_lowercase().contains(&lowered) {
                best = Some(Tier::Substring);
            }
        }
    }
    best
}

/// Pick at most one element out of tier-classified candidates.
pub fn pick_unique(matches: Vec<(ElementSnapshot, Tier)>) -> StrategyOutcome {
    let (exact, substring): (Vec<_>, Vec<_>) =
        matches.into_iter().partition(|(_, tier)| *tier == Tier::Exact);

    let mut deciding = if exact.is_empty() { substring } else { exact };
    match deciding.len() {
        0 => StrategyOutcome::Empty { hidden: 0 },
        1 => match deciding.pop() {
            Some((element, tier)) => StrategyOutcome::Selected { element, tier },
            None => StrategyOutcome::Empty { hidden: 0 },
        },
        _ => StrategyOutcome::Ambiguous {
            candidates: deciding.into_iter().map(|(el, _)| el).collect(),
        },
    }
}

/// Apply one strategy to the elements its locator returned.
pub fn evaluate(strategy: &Strategy, elements: Vec<ElementSnapshot>) -> StrategyOutcome {
    let mut hidden = 0;
    let mut matches = Vec::new();

    for el in elements {
        let tier = match strategy {
            Strategy::Label { field, texts, .. } => match match_tier(&el, field, texts) {
                Some(tier) => tier,
                None => continue,
            },
            Strategy::Selector { .. } | Strategy::Scoped { .. } => Tier::Exact,
        };
        if el.is_visible() {
            matches.push((el, tier));
        } else {
            hidden += 1;
        }
    }

    match pick_unique(matches) {
        StrategyOutcome::Empty { .. } => StrategyOutcome::Empty { hidden },
        other => other,
    }
}

/// Choose among rendered options (autocomplete or select lists) by their text.
/// `Empty` means options were shown but none matched.
pub fn choose_by_text(options: Vec<ElementSnapshot>, wanted: &[String]) -> StrategyOutcome {
    let matches = options
        .into_iter()
        .filter(|o| o.is_visible())
        .filter_map(|o| match_tier(&o, &TextField::Text, wanted).map(|tier| (o, tier)))
        .collect();
    pick_unique(matches)
}
