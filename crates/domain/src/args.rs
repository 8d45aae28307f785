//! Argument bags coming from the model.
//!
//! Every operation receives an untrusted JSON object whose field names vary
//! ("area" vs "tamanho_ha" vs "hectares"). [`ArgBag`] reads a concept through
//! its list of aliases, first usable alias wins, and never panics on shape.

use agromie_core::OperationOutcome;
use chrono::{Local, NaiveDate};
use serde_json::{Map, Value};

/// Read-only view over an operation's argument object.
#[derive(Debug, Clone, Copy)]
pub struct ArgBag<'a> {
    map: Option<&'a Map<String, Value>>,
}

impl<'a> ArgBag<'a> {
    /// Anything other than a JSON object reads as an empty bag.
    pub fn new(value: &'a Value) -> Self {
        Self {
            map: value.as_object(),
        }
    }

    fn present(&self, aliases: &[&str]) -> impl Iterator<Item = &'a Value> {
        let map = self.map;
        aliases
            .iter()
            .filter_map(move |alias| map.and_then(|m| m.get(*alias)))
            .filter(|v| match v {
                Value::Null => false,
                Value::String(s) => !s.trim().is_empty(),
                _ => true,
            })
    }

    /// Non-empty trimmed text. Numbers and booleans are rendered as text.
    pub fn text(&self, aliases: &[&str]) -> Option<String> {
        self.present(aliases).find_map(|v| match v {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
    }

    /// A finite number, from a JSON number or a numeric string.
    pub fn number(&self, aliases: &[&str]) -> Option<f64> {
        self.present(aliases).find_map(as_number)
    }

    /// A monetary amount already expressed in cents. Values outside the
    /// `i64` range are treated as absent.
    pub fn cents(&self, aliases: &[&str]) -> Option<i64> {
        self.number(aliases).and_then(|n| {
            let cents = n.round();
            (cents.abs() < i64::MAX as f64).then_some(cents as i64)
        })
    }

    /// A non-negative whole count. Fractional values are rejected.
    pub fn count(&self, aliases: &[&str]) -> Option<u32> {
        self.present(aliases).find_map(|v| {
            let n = as_number(v)?;
            if n < 0.0 || n.fract() != 0.0 || n > f64::from(u32::MAX) {
                return None;
            }
            Some(n as u32)
        })
    }

    /// An array argument.
    pub fn list(&self, aliases: &[&str]) -> Option<&'a Vec<Value>> {
        self.present(aliases).find_map(Value::as_array)
    }

    /// A list of strings, accepting a single string as a one-element list.
    pub fn strings(&self, aliases: &[&str]) -> Vec<String> {
        self.present(aliases)
            .find_map(|v| match v {
                Value::Array(items) => Some(
                    items
                        .iter()
                        .filter_map(|item| match item {
                            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                            Value::Number(n) => Some(n.to_string()),
                            _ => None,
                        })
                        .collect(),
                ),
                Value::String(s) => Some(vec![s.trim().to_string()]),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// The raw `date`/`data` argument, if any.
    pub fn date(&self) -> Option<String> {
        self.text(&["date", "data"])
    }
}

fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => parse_decimal(s)?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Parse "1500", "1500.5", "1.500,50", "119.000" or "R$ 1500".
///
/// Without a comma, dots are thousands separators only when every group
/// after the first has exactly three digits ("1.500.000"); otherwise the
/// single dot is a decimal point ("12.5").
fn parse_decimal(input: &str) -> Option<f64> {
    let cleaned: String = input
        .trim()
        .trim_start_matches("R$")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let normalized = if cleaned.contains(',') || is_grouped_thousands(&cleaned) {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned
    };
    normalized.parse().ok()
}

fn is_grouped_thousands(digits: &str) -> bool {
    let digits = digits.strip_prefix('-').unwrap_or(digits);
    let mut groups = digits.split('.');
    let head = groups.next().unwrap_or_default();
    let mut tail = groups.peekable();
    tail.peek().is_some()
        && (1..=3).contains(&head.len())
        && head.chars().all(|c| c.is_ascii_digit())
        && tail.all(|g| g.len() == 3 && g.chars().all(|c| c.is_ascii_digit()))
}

/// Today in the local calendar.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Resolve an optional `YYYY-MM-DD` argument, defaulting to today.
///
/// A full timestamp is accepted and truncated to its date. Anything else is a
/// validation failure the model can relay.
pub fn resolve_date(raw: Option<&str>) -> Result<NaiveDate, OperationOutcome> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(today());
    };
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            raw.get(..10)
                .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
        })
        .ok_or_else(|| {
            OperationOutcome::fail(format!(
                "Data inválida: {raw}. Use o formato AAAA-MM-DD."
            ))
        })
}
