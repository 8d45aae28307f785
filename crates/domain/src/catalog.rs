//! Shared catalogs: livestock categories and the chart of accounts.
//!
//! Seeding is explicit. The composition root calls [`ensure_seeded`] once at
//! startup (and a full reset calls it again); nothing seeds lazily on first
//! access.

use agromie_core::error::StoreError;
use tracing::info;

use crate::records::{
    normalize_code, new_id, Account, AccountGroup, Gender, LivestockCategory,
};
use crate::repo::Records;

/// Default livestock categories: (code, display name, gender).
pub const DEFAULT_CATEGORIES: [(&str, &str, Gender); 8] = [
    ("VACA", "Vaca", Gender::Female),
    ("NOVILHA", "Novilha", Gender::Female),
    ("BEZERRO", "Bezerro", Gender::Male),
    ("BEZERRA", "Bezerra", Gender::Female),
    ("BOI_MAGRO", "Boi Magro", Gender::Male),
    ("BOI_GORDO", "Boi Gordo", Gender::Male),
    ("TOURO", "Touro", Gender::Male),
    ("TOURUNO", "Tourunó", Gender::Male),
];

/// English category codes accepted as synonyms of the stored codes.
const CATEGORY_ALIASES: [(&str, &str); 8] = [
    ("COW", "VACA"),
    ("HEIFER", "NOVILHA"),
    ("MALE_CALF", "BEZERRO"),
    ("FEMALE_CALF", "BEZERRA"),
    ("LEAN_STEER", "BOI_MAGRO"),
    ("FAT_STEER", "BOI_GORDO"),
    ("BULL", "TOURO"),
    ("YOUNG_BULL", "TOURUNO"),
];

/// Default chart of accounts: (code, name, group).
pub const DEFAULT_ACCOUNTS: [(&str, &str, AccountGroup); 7] = [
    ("1.1", "Venda de Animais", AccountGroup::Revenues),
    ("1.2", "Outras Receitas", AccountGroup::Revenues),
    ("2.1", "Custos Operacionais", AccountGroup::Expenses),
    ("2.2", "Manutenção de Pastagens", AccountGroup::Expenses),
    ("3.1", "Compra de Animais", AccountGroup::Investments),
    ("3.2", "Formação e Reforma de Pastagens", AccountGroup::Investments),
    ("4.1", "Pró-labore", AccountGroup::OwnerDraw),
];

/// What [`ensure_seeded`] actually wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub categories: usize,
    pub accounts: usize,
}

/// Write the default catalogs into any catalog collection that is empty.
///
/// Idempotent: a second call writes nothing.
pub async fn ensure_seeded(records: &Records) -> Result<SeedReport, StoreError> {
    let mut report = SeedReport::default();

    if records.load::<LivestockCategory>().await?.is_empty() {
        let categories: Vec<LivestockCategory> = DEFAULT_CATEGORIES
            .iter()
            .map(|(code, name, gender)| LivestockCategory {
                id: new_id(),
                code: (*code).to_string(),
                name: (*name).to_string(),
                gender: *gender,
                active: true,
            })
            .collect();
        report.categories = categories.len();
        records.save(&categories).await?;
    }

    if records.load::<Account>().await?.is_empty() {
        let accounts: Vec<Account> = DEFAULT_ACCOUNTS
            .iter()
            .map(|(code, name, group)| Account {
                id: new_id(),
                code: (*code).to_string(),
                name: (*name).to_string(),
                group: *group,
                active: true,
            })
            .collect();
        report.accounts = accounts.len();
        records.save(&accounts).await?;
    }

    if report != SeedReport::default() {
        info!(
            categories = report.categories,
            accounts = report.accounts,
            "Default catalogs seeded"
        );
    }
    Ok(report)
}

/// Map free text onto a known category code.
///
/// Only exact codes (after uppercasing and trimming) are recognized, in
/// Portuguese or English. There is deliberately no fuzzy matching here.
pub fn category_code(input: &str) -> Option<&'static str> {
    let normalized = normalize_code(input);
    if let Some((code, _, _)) = DEFAULT_CATEGORIES.iter().find(|(code, _, _)| *code == normalized) {
        return Some(*code);
    }
    CATEGORY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, code)| *code)
}

/// Resolve the category a livestock operation applies to.
///
/// A recognized code that exists (and is active) in the catalog wins;
/// anything else falls back to the first active category. `None` only when
/// the catalog has no active category at all.
pub fn resolve_category<'a>(
    categories: &'a [LivestockCategory],
    requested: Option<&str>,
) -> Option<&'a LivestockCategory> {
    let by_code = requested
        .and_then(category_code)
        .and_then(|code| categories.iter().find(|c| c.active && c.code == code));
    by_code.or_else(|| categories.iter().find(|c| c.active))
}
