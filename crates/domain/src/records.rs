//! Persisted farm records.
//!
//! Field names serialize in camelCase and enum values keep the Portuguese
//! codes already used in stored data (`RECEITA`, `ATIVO`, `PRODUZINDO`...).
//! Money is always integer cents, weights are grams, areas are hectares.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Collection keys in the record store.
pub mod keys {
    pub const ACCOUNTS: &str = "financial_accounts";
    pub const TRANSACTIONS: &str = "financial_transactions";
    pub const CATEGORIES: &str = "livestock_categories";
    pub const ANIMALS: &str = "livestock_animals";
    pub const EVENTS: &str = "livestock_events";
    pub const MOVEMENTS: &str = "livestock_movements";
    pub const PASTURES: &str = "pastures";
    pub const MANAGEMENTS: &str = "pasture_managements";

    /// Every collection the domain owns.
    pub const ALL: [&str; 8] = [
        ACCOUNTS,
        TRANSACTIONS,
        CATEGORIES,
        ANIMALS,
        EVENTS,
        MOVEMENTS,
        PASTURES,
        MANAGEMENTS,
    ];

    pub fn is_known(key: &str) -> bool {
        ALL.contains(&key)
    }
}

/// A record type stored as one array under a fixed key.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync {
    const KEY: &'static str;
}

pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// ── Finance ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    #[serde(rename = "RECEITA")]
    Revenue,
    #[serde(rename = "DESPESA")]
    Expense,
    #[serde(rename = "INVESTIMENTO")]
    Investment,
    #[serde(rename = "RETIRADA")]
    Withdrawal,
}

impl TransactionType {
    /// The chart-of-accounts group postings of this type belong to.
    pub fn group(self) -> AccountGroup {
        match self {
            TransactionType::Revenue => AccountGroup::Revenues,
            TransactionType::Expense => AccountGroup::Expenses,
            TransactionType::Investment => AccountGroup::Investments,
            TransactionType::Withdrawal => AccountGroup::OwnerDraw,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountGroup {
    #[serde(rename = "RECEITAS")]
    Revenues,
    #[serde(rename = "DESPESAS")]
    Expenses,
    #[serde(rename = "INVESTIMENTOS")]
    Investments,
    #[serde(rename = "PRO_LABORE")]
    OwnerDraw,
}

impl AccountGroup {
    /// Code prefix in the chart of accounts ("1" for revenues, ...).
    pub fn code_prefix(self) -> u32 {
        match self {
            AccountGroup::Revenues => 1,
            AccountGroup::Expenses => 2,
            AccountGroup::Investments => 3,
            AccountGroup::OwnerDraw => 4,
        }
    }

    pub fn default_account_name(self) -> &'static str {
        match self {
            AccountGroup::Revenues => "Outras Receitas",
            AccountGroup::Expenses => "Custos Operacionais",
            AccountGroup::Investments => "Investimentos Gerais",
            AccountGroup::OwnerDraw => "Pró-labore",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub code: String,
    pub name: String,
    pub group: AccountGroup,
    pub active: bool,
}

impl Record for Account {
    const KEY: &'static str = keys::ACCOUNTS;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialTransaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub account_id: String,
    pub account_name: String,
    pub date: NaiveDate,
    pub description: String,
    /// Cents.
    pub amount: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Record for FinancialTransaction {
    const KEY: &'static str = keys::TRANSACTIONS;
}

// ── Livestock ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Gender {
    pub fn label(self) -> &'static str {
        match self {
            Gender::Male => "Macho",
            Gender::Female => "Fêmea",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LivestockCategory {
    pub id: String,
    /// Stable code such as `BEZERRA` or `BOI_GORDO`.
    pub code: String,
    pub name: String,
    pub gender: Gender,
    pub active: bool,
}

impl Record for LivestockCategory {
    const KEY: &'static str = keys::CATEGORIES;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimalStatus {
    #[serde(rename = "ATIVO")]
    Active,
    #[serde(rename = "VENDIDO")]
    Sold,
    #[serde(rename = "MORTO")]
    Dead,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Animal {
    pub id: String,
    pub tag_number: String,
    pub category_id: String,
    pub category_code: String,
    pub category_name: String,
    pub gender: Gender,
    pub status: AnimalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<NaiveDate>,
    /// Cents per head.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<i64>,
    /// Grams.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_weight: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mother_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pasture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death_cause: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Animal {
    pub fn is_active(&self) -> bool {
        self.status == AnimalStatus::Active
    }
}

impl Record for Animal {
    const KEY: &'static str = keys::ANIMALS;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "NASCIMENTO")]
    Birth,
    #[serde(rename = "MORTE")]
    Death,
    #[serde(rename = "COMPRA")]
    Purchase,
    #[serde(rename = "VENDA")]
    Sale,
    #[serde(rename = "PESAGEM")]
    Weighing,
    #[serde(rename = "INVENTARIO")]
    Inventory,
    #[serde(rename = "MOVIMENTACAO")]
    Movement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LivestockEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EventType,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default)]
    pub animal_ids: Vec<String>,
    pub quantity: u32,
    /// Grams.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<i64>,
    /// Cents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial_transaction_id: Option<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl LivestockEvent {
    pub fn new(kind: EventType, date: NaiveDate, description: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            kind,
            date,
            category_id: None,
            animal_ids: Vec::new(),
            quantity: 0,
            weight: None,
            amount: None,
            financial_transaction_id: None,
            description: description.into(),
            created_at: Utc::now(),
        }
    }
}

impl Record for LivestockEvent {
    const KEY: &'static str = keys::EVENTS;
}

/// Animals moved into a pasture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    pub id: String,
    pub date: NaiveDate,
    pub animal_ids: Vec<String>,
    pub to_pasture: String,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
}

impl Record for Movement {
    const KEY: &'static str = keys::MOVEMENTS;
}

// ── Pastures ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PastureType {
    Braquiaria,
    Panicum,
    CapimElefante,
    Tifton,
    Nativa,
    Outra,
}

impl PastureType {
    pub fn parse(input: &str) -> Option<Self> {
        match normalize_code(input).as_str() {
            "BRAQUIARIA" | "BRACHIARIA" => Some(PastureType::Braquiaria),
            "PANICUM" | "MOMBACA" | "TANZANIA" => Some(PastureType::Panicum),
            "CAPIM_ELEFANTE" | "ELEFANTE" => Some(PastureType::CapimElefante),
            "TIFTON" => Some(PastureType::Tifton),
            "NATIVA" | "NATIVO" => Some(PastureType::Nativa),
            "OUTRA" | "OUTRO" => Some(PastureType::Outra),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PastureStatus {
    EmFormacao,
    Produzindo,
    EmDescanso,
    Degradada,
    EmReforma,
}

impl PastureStatus {
    pub fn parse(input: &str) -> Option<Self> {
        match normalize_code(input).as_str() {
            "EM_FORMACAO" | "FORMACAO" => Some(PastureStatus::EmFormacao),
            "PRODUZINDO" | "EM_PRODUCAO" | "ATIVA" => Some(PastureStatus::Produzindo),
            "EM_DESCANSO" | "DESCANSO" => Some(PastureStatus::EmDescanso),
            "DEGRADADA" => Some(PastureStatus::Degradada),
            "EM_REFORMA" | "REFORMA" => Some(PastureStatus::EmReforma),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PastureStatus::EmFormacao => "Em formação",
            PastureStatus::Produzindo => "Produzindo",
            PastureStatus::EmDescanso => "Em descanso",
            PastureStatus::Degradada => "Degradada",
            PastureStatus::EmReforma => "Em reforma",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pasture {
    pub id: String,
    pub name: String,
    /// Hectares.
    pub area: f64,
    /// Animal-units per hectare.
    #[serde(rename = "capacityUA")]
    pub capacity_ua: f64,
    #[serde(rename = "type")]
    pub kind: PastureType,
    pub status: PastureStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reform_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Pasture {
    const KEY: &'static str = keys::PASTURES;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ManagementType {
    Formacao,
    Reforma,
    Adubacao,
    Rocada,
    Irrigacao,
    ControlePragas,
    Outro,
}

impl ManagementType {
    pub fn parse(input: &str) -> Option<Self> {
        match normalize_code(input).as_str() {
            "FORMACAO" => Some(ManagementType::Formacao),
            "REFORMA" => Some(ManagementType::Reforma),
            "ADUBACAO" => Some(ManagementType::Adubacao),
            "ROCADA" => Some(ManagementType::Rocada),
            "IRRIGACAO" => Some(ManagementType::Irrigacao),
            "CONTROLE_PRAGAS" | "CONTROLE_DE_PRAGAS" => Some(ManagementType::ControlePragas),
            "OUTRO" | "MANUTENCAO" => Some(ManagementType::Outro),
            _ => None,
        }
    }

    /// Formation and reform build the asset; everything else is upkeep.
    pub fn is_investment(self) -> bool {
        matches!(self, ManagementType::Formacao | ManagementType::Reforma)
    }

    pub fn label(self) -> &'static str {
        match self {
            ManagementType::Formacao => "Formação",
            ManagementType::Reforma => "Reforma",
            ManagementType::Adubacao => "Adubação",
            ManagementType::Rocada => "Roçada",
            ManagementType::Irrigacao => "Irrigação",
            ManagementType::ControlePragas => "Controle de pragas",
            ManagementType::Outro => "Manutenção",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PastureManagement {
    pub id: String,
    pub pasture_id: String,
    pub pasture_name: String,
    #[serde(rename = "type")]
    pub kind: ManagementType,
    pub date: NaiveDate,
    /// Cents.
    pub cost: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial_transaction_id: Option<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Record for PastureManagement {
    const KEY: &'static str = keys::MANAGEMENTS;
}

/// Uppercase, trim, fold the accents that show up in Portuguese codes and
/// turn separators into underscores: `"Roçada"` → `"ROCADA"`.
pub fn normalize_code(input: &str) -> String {
    input
        .trim()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'Á' | 'À' | 'Â' | 'Ã' => 'A',
            'é' | 'ê' | 'É' | 'Ê' => 'E',
            'í' | 'Í' => 'I',
            'ó' | 'ô' | 'õ' | 'Ó' | 'Ô' | 'Õ' => 'O',
            'ú' | 'Ú' => 'U',
            'ç' | 'Ç' => 'C',
            ' ' | '-' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}
