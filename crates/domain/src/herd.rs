//! Herd arithmetic: animal units, stock valuation, FIFO selection and
//! creation of new animal records.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::records::{Animal, AnimalStatus, LivestockCategory, new_id};

/// Price of one kilogram of live weight, in cents, for valuation.
pub const PRICE_PER_KG_CENTS: i64 = 850;

/// Kilograms in one arroba.
pub const KG_PER_ARROBA: f64 = 15.0;

/// Animal-unit equivalent of one head of the given category.
pub fn animal_units(category_code: &str) -> f64 {
    match category_code {
        "VACA" => 1.0,
        "NOVILHA" => 0.7,
        "BEZERRO" | "BEZERRA" => 0.2,
        "BOI_MAGRO" => 0.8,
        "BOI_GORDO" => 1.1,
        "TOURO" => 1.2,
        "TOURUNO" => 0.9,
        _ => 1.0,
    }
}

/// Reference value per head when nothing better is known, in cents.
pub fn default_value_cents(category_code: &str) -> i64 {
    match category_code {
        "VACA" => 350_000,
        "NOVILHA" => 250_000,
        "BEZERRO" | "BEZERRA" => 80_000,
        "BOI_MAGRO" => 300_000,
        "BOI_GORDO" => 450_000,
        "TOURO" => 500_000,
        "TOURUNO" => 400_000,
        _ => 150_000,
    }
}

/// Purchase price, else live weight at [`PRICE_PER_KG_CENTS`], else the
/// category default.
pub fn animal_value_cents(animal: &Animal) -> i64 {
    if let Some(price) = animal.purchase_price {
        return price;
    }
    if let Some(grams) = animal.current_weight.filter(|g| *g > 0) {
        return (grams as f64 / 1000.0 * PRICE_PER_KG_CENTS as f64).round() as i64;
    }
    default_value_cents(&animal.category_code)
}

/// Sum of animal units over the active herd.
pub fn total_animal_units(animals: &[Animal]) -> f64 {
    animals
        .iter()
        .filter(|a| a.is_active())
        .map(|a| animal_units(&a.category_code))
        .sum()
}

/// Head count and value of one category of the active herd.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStock {
    pub code: String,
    pub name: String,
    pub count: u32,
    pub value: i64,
}

/// Stock valuation grouped by category, keyed and ordered by category code.
pub fn stock_by_category(animals: &[Animal]) -> Vec<CategoryStock> {
    let mut by_code: BTreeMap<&str, CategoryStock> = BTreeMap::new();
    for animal in animals.iter().filter(|a| a.is_active()) {
        let entry = by_code
            .entry(animal.category_code.as_str())
            .or_insert_with(|| CategoryStock {
                code: animal.category_code.clone(),
                name: animal.category_name.clone(),
                count: 0,
                value: 0,
            });
        entry.count += 1;
        entry.value += animal_value_cents(animal);
    }
    by_code.into_values().collect()
}

/// Indices of up to `count` active animals of a category, oldest first.
pub fn select_fifo(animals: &[Animal], category_id: &str, count: usize) -> Vec<usize> {
    let mut candidates: Vec<usize> = animals
        .iter()
        .enumerate()
        .filter(|(_, a)| a.is_active() && a.category_id == category_id)
        .map(|(i, _)| i)
        .collect();
    candidates.sort_by_key(|&i| animals[i].created_at);
    candidates.truncate(count);
    candidates
}

/// How new animals enter the herd.
#[derive(Debug, Clone, Default)]
pub struct Arrival {
    pub birth_date: Option<NaiveDate>,
    pub purchase_date: Option<NaiveDate>,
    /// Cents per head.
    pub purchase_price: Option<i64>,
    /// Grams.
    pub weight: Option<i64>,
    pub mother_id: Option<String>,
    pub pasture: Option<String>,
}

/// Build `count` active animal records of a category.
///
/// Tags continue the category's numbering: `BEZERRA-0001`, `BEZERRA-0002`...
pub fn new_animals(
    existing: &[Animal],
    category: &LivestockCategory,
    count: u32,
    arrival: &Arrival,
) -> Vec<Animal> {
    let already = existing
        .iter()
        .filter(|a| a.category_id == category.id)
        .count();
    let now = Utc::now();
    (0..count as usize)
        .map(|i| Animal {
            id: new_id(),
            tag_number: format!("{}-{:04}", category.code, already + i + 1),
            category_id: category.id.clone(),
            category_code: category.code.clone(),
            category_name: category.name.clone(),
            gender: category.gender,
            status: AnimalStatus::Active,
            birth_date: arrival.birth_date,
            purchase_date: arrival.purchase_date,
            purchase_price: arrival.purchase_price,
            current_weight: arrival.weight,
            mother_id: arrival.mother_id.clone(),
            pasture: arrival.pasture.clone(),
            exit_date: None,
            death_cause: None,
            created_at: now,
            updated_at: now,
        })
        .collect()
}

/// Find an animal by id or by tag (case-insensitive).
pub fn find_animal(animals: &[Animal], reference: &str) -> Option<usize> {
    let reference = reference.trim();
    animals
        .iter()
        .position(|a| a.id == reference)
        .or_else(|| {
            animals
                .iter()
                .position(|a| a.tag_number.eq_ignore_ascii_case(reference))
        })
}

/// Kilograms → grams, rounded.
pub fn kg_to_grams(kg: f64) -> i64 {
    (kg * 1000.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Gender;
    use chrono::Duration;

    fn category(code: &str) -> LivestockCategory {
        LivestockCategory {
            id: format!("cat-{code}"),
            code: code.into(),
            name: code.into(),
            gender: Gender::Female,
            active: true,
        }
    }

    #[test]
    fn tags_continue_numbering() {
        let cat = category("BEZERRA");
        let first = new_animals(&[], &cat, 2, &Arrival::default());
        assert_eq!(first[1].tag_number, "BEZERRA-0002");

        let more = new_animals(&first, &cat, 1, &Arrival::default());
        assert_eq!(more[0].tag_number, "BEZERRA-0003");
        assert!(more[0].is_active());
    }

    #[test]
    fn fifo_prefers_oldest_active() {
        let cat = category("BEZERRA");
        let mut animals = new_animals(&[], &cat, 3, &Arrival::default());
        let base = Utc::now();
        animals[0].created_at = base + Duration::seconds(10);
        animals[1].created_at = base;
        animals[2].created_at = base + Duration::seconds(5);

        assert_eq!(select_fifo(&animals, &cat.id, 2), vec![1, 2]);

        animals[1].status = AnimalStatus::Sold;
        assert_eq!(select_fifo(&animals, &cat.id, 5), vec![2, 0]);
        assert!(select_fifo(&animals, "other", 1).is_empty());
    }

    #[test]
    fn valuation_precedence() {
        let cat = category("VACA");
        let mut animals = new_animals(&[], &cat, 3, &Arrival::default());
        animals[0].purchase_price = Some(400_000);
        animals[1].current_weight = Some(450_000);

        assert_eq!(animal_value_cents(&animals[0]), 400_000);
        assert_eq!(animal_value_cents(&animals[1]), 382_500);
        assert_eq!(animal_value_cents(&animals[2]), 350_000);

        let stock = stock_by_category(&animals);
        assert_eq!(stock.len(), 1);
        assert_eq!(stock[0].count, 3);
        assert_eq!(stock[0].value, 1_132_500);
    }

    #[test]
    fn animal_units_ignore_inactive() {
        let mut animals = new_animals(&[], &category("VACA"), 10, &Arrival::default());
        animals.extend(new_animals(&[], &category("BEZERRO"), 5, &Arrival::default()));
        animals[0].status = AnimalStatus::Dead;
        assert!((total_animal_units(&animals) - 10.0).abs() < 1e-9);
        assert_eq!(animal_units("ALPACA"), 1.0);
    }

    #[test]
    fn lookup_by_id_or_tag() {
        let animals = new_animals(&[], &category("TOURO"), 2, &Arrival::default());
        assert_eq!(find_animal(&animals, &animals[1].id), Some(1));
        assert_eq!(find_animal(&animals, "touro-0001"), Some(0));
        assert_eq!(find_animal(&animals, "x"), None);
    }
}
