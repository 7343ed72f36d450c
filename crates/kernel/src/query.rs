//! Selector evaluation, sorting, and search compilation for the memory store.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde_json::Value;
use webdesq_sdk::prelude::{Document, Filter, Selector, SortKey, StorageQuery};
use webdesq_sdk::storage::SortDirection;

/// Whether `doc` matches `selector`.
pub fn matches(doc: &Document, selector: &Selector) -> bool {
    match selector {
        Selector::All => true,
        Selector::Id(id) => doc.id == *id,
        Selector::Contains { paths, needle } => {
            let needle = needle.to_lowercase();
            paths
                .iter()
                .any(|path| doc.lookup(path).is_some_and(|v| contains(&v, &needle)))
        }
        Selector::And(all) => all.iter().all(|s| matches(doc, s)),
        Selector::Or(any) => any.iter().any(|s| matches(doc, s)),
    }
}

/// Case-insensitive substring test. Objects match when any value matches,
/// so a translatable field is searched across every language.
fn contains(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(s) => s.to_lowercase().contains(needle),
        Value::Number(n) => n.to_string().contains(needle),
        Value::Array(items) => items.iter().any(|v| contains(v, needle)),
        Value::Object(map) => map.values().any(|v| contains(v, needle)),
        _ => false,
    }
}

/// Sort by `keys` in order, falling back to document ID.
pub fn sort(docs: &mut [Document], keys: &[SortKey]) {
    docs.sort_by(|a, b| {
        keys.iter()
            .map(|key| {
                let ord = compare(a.lookup(&key.path).as_ref(), b.lookup(&key.path).as_ref());
                match key.direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            })
            .find(|ord| ord.is_ne())
            .unwrap_or_else(|| a.id.cmp(&b.id))
    });
}

/// Compare two optional values. Missing values sort after present ones in
/// ascending order.
fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => compare_values(a, b),
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => {
            // Timestamps differ in fractional precision, compare them as instants
            match (parse_instant(x), parse_instant(y)) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Compile a posted search into a query over `filters`.
///
/// A string searches every filter. An object maps filter names to search
/// text and requires all of them; unknown names are ignored. Anything else,
/// or blank text, selects everything.
pub fn compile(filters: &[Filter], query: &Value, languages: Option<&[String]>) -> StorageQuery {
    let languages = languages.filter(|langs| !langs.is_empty());

    let selector = match query {
        Value::String(text) => {
            let text = text.trim();
            if text.is_empty() {
                Selector::All
            } else {
                Selector::Or(
                    filters
                        .iter()
                        .map(|filter| contains_selector(filter, text, languages))
                        .collect(),
                )
            }
        }
        Value::Object(terms) => {
            let clauses: Vec<Selector> = terms
                .iter()
                .filter_map(|(name, term)| {
                    let filter = filters.iter().find(|f| f.name == *name)?;
                    let text = term_text(term)?;
                    Some(contains_selector(filter, &text, languages))
                })
                .collect();

            if clauses.is_empty() {
                Selector::All
            } else {
                Selector::And(clauses)
            }
        }
        _ => Selector::All,
    };

    StorageQuery::new(selector)
}

fn term_text(term: &Value) -> Option<String> {
    let text = match term {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn contains_selector(filter: &Filter, needle: &str, languages: Option<&[String]>) -> Selector {
    let paths = match (filter.translatable, languages) {
        (true, Some(langs)) => filter
            .paths
            .iter()
            .flat_map(|path| langs.iter().map(move |lang| format!("{path}.{lang}")))
            .collect(),
        _ => filter.paths.clone(),
    };

    Selector::Contains {
        paths,
        needle: needle.to_string(),
    }
}
