//! Pasture name resolution and stocking-rate balance.

use serde::Serialize;

use crate::records::{Pasture, PastureStatus};

/// Location words farmers use to name pastures.
const LOCATION_KEYWORDS: [&str; 6] = ["sede", "coqueiro", "norte", "sul", "leste", "oeste"];

/// Animal units per head used to turn UA back into a head count.
const UA_PER_HEAD_ESTIMATE: f64 = 0.8;

/// Below this stocking ratio (percent) the farm is understocked.
pub const UNDERSTOCKED_BELOW: f64 = 70.0;
/// Above this stocking ratio (percent) the farm is overstocked.
pub const OVERSTOCKED_ABOVE: f64 = 130.0;

/// Resolve a free-text pasture reference to an index in `pastures`.
///
/// Tried in order: exact name (case-insensitive), substring in either
/// direction, the reference's first number, then a shared location keyword.
pub fn find_by_name(pastures: &[Pasture], reference: &str) -> Option<usize> {
    let wanted = reference.trim().to_lowercase();
    if wanted.is_empty() {
        return None;
    }
    let names: Vec<String> = pastures.iter().map(|p| p.name.trim().to_lowercase()).collect();

    if let Some(i) = names.iter().position(|n| *n == wanted) {
        return Some(i);
    }
    if let Some(i) = names
        .iter()
        .position(|n| !n.is_empty() && (n.contains(&wanted) || wanted.contains(n.as_str())))
    {
        return Some(i);
    }
    if let Some(number) = first_number(&wanted) {
        let exact = names
            .iter()
            .position(|n| numbers(n).any(|token| token == number));
        if let Some(i) = exact.or_else(|| names.iter().position(|n| n.contains(number))) {
            return Some(i);
        }
    }
    LOCATION_KEYWORDS
        .iter()
        .filter(|kw| wanted.contains(*kw))
        .find_map(|kw| names.iter().position(|n| n.contains(kw)))
}

fn numbers(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_ascii_digit()).filter(|t| !t.is_empty())
}

fn first_number(text: &str) -> Option<&str> {
    numbers(text).next()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockingStatus {
    Sublotado,
    Ideal,
    Superlotado,
}

impl StockingStatus {
    pub fn label(self) -> &'static str {
        match self {
            StockingStatus::Sublotado => "Sublotado",
            StockingStatus::Ideal => "Ideal",
            StockingStatus::Superlotado => "Superlotado",
        }
    }
}

/// Estimated load of one producing pasture.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PastureStocking {
    pub pasture_id: String,
    pub name: String,
    pub area: f64,
    #[serde(rename = "capacityUA")]
    pub capacity_ua: f64,
    #[serde(rename = "estimatedUA")]
    pub estimated_ua: f64,
    pub estimated_animals: u32,
}

/// Herd load against the carrying capacity of producing pastures.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockingBalance {
    pub total_area: f64,
    #[serde(rename = "capacityUA")]
    pub capacity_ua: f64,
    #[serde(rename = "currentUA")]
    pub current_ua: f64,
    /// Percent of capacity in use.
    pub ratio: f64,
    #[serde(rename = "uaPerHa")]
    pub ua_per_ha: f64,
    pub status: StockingStatus,
    #[serde(rename = "surplusUA")]
    pub surplus_ua: f64,
    #[serde(rename = "deficitUA")]
    pub deficit_ua: f64,
    pub pastures: Vec<PastureStocking>,
}

/// Compare `current_ua` with the capacity of every producing pasture.
///
/// Animals are not tracked per pasture, so the herd's load is spread over
/// pastures in proportion to each one's capacity.
pub fn stocking_balance(pastures: &[Pasture], current_ua: f64) -> StockingBalance {
    let producing: Vec<&Pasture> = pastures
        .iter()
        .filter(|p| p.status == PastureStatus::Produzindo)
        .collect();

    let total_area: f64 = producing.iter().map(|p| p.area).sum();
    let capacity: f64 = producing.iter().map(|p| p.area * p.capacity_ua).sum();
    let ratio = if capacity > 0.0 {
        current_ua / capacity * 100.0
    } else {
        0.0
    };
    let ua_per_ha = if total_area > 0.0 {
        current_ua / total_area
    } else {
        0.0
    };

    let status = if ratio < UNDERSTOCKED_BELOW {
        StockingStatus::Sublotado
    } else if ratio > OVERSTOCKED_ABOVE {
        StockingStatus::Superlotado
    } else {
        StockingStatus::Ideal
    };
    let (surplus_ua, deficit_ua) = match status {
        StockingStatus::Sublotado => (capacity - current_ua, 0.0),
        StockingStatus::Superlotado => (0.0, current_ua - capacity),
        StockingStatus::Ideal => (0.0, 0.0),
    };

    let per_pasture = producing
        .iter()
        .map(|p| {
            let own_capacity = p.area * p.capacity_ua;
            let estimated_ua = if capacity > 0.0 {
                current_ua * own_capacity / capacity
            } else {
                0.0
            };
            PastureStocking {
                pasture_id: p.id.clone(),
                name: p.name.clone(),
                area: p.area,
                capacity_ua: own_capacity,
                estimated_ua,
                estimated_animals: (estimated_ua / UA_PER_HEAD_ESTIMATE).round() as u32,
            }
        })
        .collect();

    StockingBalance {
        total_area,
        capacity_ua: capacity,
        current_ua,
        ratio,
        ua_per_ha,
        status,
        surplus_ua,
        deficit_ua,
        pastures: per_pasture,
    }
}
