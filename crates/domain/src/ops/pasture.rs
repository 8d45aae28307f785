use agromie_core::OperationOutcome;
use chrono::Utc;
use serde_json::json;
use tracing::info;

use super::{OpResult, display_date, reject};
use crate::args::resolve_date;
use crate::format::{format_brl, format_decimal};
use crate::ledger::{self, NewPosting};
use crate::operation::{ManagementArgs, PastureArgs};
use crate::pasture::find_by_name;
use crate::records::{
    ManagementType, Pasture, PastureManagement, PastureStatus, PastureType, TransactionType,
    new_id,
};
use crate::repo::Records;

/// Stocking capacity assumed when none is given, in UA/ha.
pub const DEFAULT_CAPACITY_UA: f64 = 1.2;

const INVESTMENT_ACCOUNT: &str = "Formação e Reforma de Pastagens";
const UPKEEP_ACCOUNT: &str = "Manutenção de Pastagens";

pub(crate) async fn register(records: &Records, args: PastureArgs) -> OpResult {
    let Some(name) = args.name else {
        return Err(reject("Qual é o nome da pastagem?"));
    };
    let area = match args.area {
        Some(area) if area > 0.0 => area,
        _ => return Err(reject("Qual é a área da pastagem em hectares?")),
    };
    let capacity = args.capacity.unwrap_or(DEFAULT_CAPACITY_UA);
    if capacity <= 0.0 {
        return Err(reject("A capacidade de suporte precisa ser maior que zero."));
    }
    let kind = match args.kind.as_deref() {
        None => PastureType::Braquiaria,
        Some(raw) => PastureType::parse(raw).unwrap_or(PastureType::Outra),
    };
    let status = args
        .status
        .as_deref()
        .and_then(PastureStatus::parse)
        .unwrap_or(PastureStatus::Produzindo);

    let mut pastures = records.load::<Pasture>().await?;
    if pastures
        .iter()
        .any(|p| p.name.trim().to_lowercase() == name.to_lowercase())
    {
        return Err(reject(format!("Já existe uma pastagem chamada {name}.")));
    }

    let now = Utc::now();
    let pasture = Pasture {
        id: new_id(),
        name,
        area,
        capacity_ua: capacity,
        kind,
        status,
        last_reform_date: None,
        created_at: now,
        updated_at: now,
    };
    pastures.push(pasture.clone());
    records.save(&pastures).await?;

    info!(pasture = %pasture.name, area, capacity, "Pasture registered");
    Ok(OperationOutcome::ok_with(
        format!(
            "Pastagem {} registrada: {} ha, capacidade de {} UA/ha ({} UA no total).",
            pasture.name,
            format_decimal(area, 1),
            format_decimal(capacity, 1),
            format_decimal(area * capacity, 1)
        ),
        json!({ "pasture": pasture }),
    ))
}

pub(crate) async fn manage(records: &Records, args: ManagementArgs) -> OpResult {
    let mut pastures = records.load::<Pasture>().await?;
    let index = match (&args.pasture_id, &args.pasture_name) {
        (None, None) => return Err(reject("Em qual pastagem foi feito o manejo?")),
        (id, name) => id
            .as_deref()
            .and_then(|id| pastures.iter().position(|p| p.id == id))
            .or_else(|| name.as_deref().and_then(|n| find_by_name(&pastures, n)))
            .or_else(|| id.as_deref().and_then(|n| find_by_name(&pastures, n))),
    };
    let Some(index) = index else {
        let reference = args.pasture_name.or(args.pasture_id).unwrap_or_default();
        return Err(reject(format!("Não encontrei a pastagem {reference}.")));
    };

    let Some(raw_kind) = args.kind.as_deref() else {
        return Err(reject(
            "Qual foi o tipo de manejo? (formação, reforma, adubação, roçada, irrigação, controle de pragas)",
        ));
    };
    let kind = ManagementType::parse(raw_kind).unwrap_or(ManagementType::Outro);
    let cost = args.cost.unwrap_or(0);
    if cost < 0 {
        return Err(reject("O custo precisa ser maior que zero."));
    }
    let date = resolve_date(args.date.as_deref())?;
    let pasture_name = pastures[index].name.clone();

    let tx = if cost > 0 {
        let (tx_kind, account, description) = if kind.is_investment() {
            (
                TransactionType::Investment,
                INVESTMENT_ACCOUNT,
                format!("{} - {pasture_name}", kind.label()),
            )
        } else {
            (
                TransactionType::Expense,
                UPKEEP_ACCOUNT,
                format!("Manutenção - {pasture_name}"),
            )
        };
        Some(
            ledger::post(
                records,
                NewPosting::new(tx_kind, cost, date, description).with_account_hint(account),
            )
            .await?,
        )
    } else {
        None
    };

    let management = PastureManagement {
        id: new_id(),
        pasture_id: pastures[index].id.clone(),
        pasture_name: pasture_name.clone(),
        kind,
        date,
        cost,
        financial_transaction_id: tx.as_ref().map(|t| t.id.clone()),
        description: args
            .description
            .unwrap_or_else(|| format!("{} - {pasture_name}", kind.label())),
        created_at: Utc::now(),
    };
    records.append(management.clone()).await?;

    if kind == ManagementType::Reforma {
        pastures[index].last_reform_date = Some(date);
        pastures[index].updated_at = Utc::now();
        records.save(&pastures).await?;
    }

    info!(pasture = %pasture_name, kind = ?kind, cost, "Pasture management recorded");
    let mut message = format!(
        "{} registrada na pastagem {pasture_name} em {}.",
        kind.label(),
        display_date(date)
    );
    if let Some(tx) = &tx {
        let group = match tx.kind {
            TransactionType::Investment => "investimento",
            _ => "despesa",
        };
        message.push_str(&format!(
            " Custo de {} lançado como {group} no financeiro.",
            format_brl(cost)
        ));
    }
    Ok(OperationOutcome::ok_with(
        message,
        json!({ "management": management, "transaction": tx }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ensure_seeded;
    use crate::ops::settle;
    use crate::records::FinancialTransaction;
    use agromie_store::InMemoryStore;
    use std::sync::Arc;

    async fn records() -> Records {
        let records = Records::new(Arc::new(InMemoryStore::new()));
        ensure_seeded(&records).await.unwrap();
        records
    }

    fn pasture_args(name: Option<&str>, area: Option<f64>, capacity: Option<f64>) -> PastureArgs {
        PastureArgs {
            name: name.map(str::to_string),
            area,
            capacity,
            kind: None,
            status: None,
        }
    }

    fn management(pasture: &str, kind: &str, cost: Option<i64>) -> ManagementArgs {
        ManagementArgs {
            pasture_id: None,
            pasture_name: Some(pasture.into()),
            kind: Some(kind.into()),
            cost,
            date: Some("2025-10-01".into()),
            description: None,
        }
    }

    #[tokio::test]
    async fn registration_defaults() {
        let records = records().await;
        let outcome = settle(register(&records, pasture_args(Some("Pasto 1"), Some(40.0), None)).await);
        assert!(outcome.success, "{outcome:?}");

        let pastures = records.load::<Pasture>().await.unwrap();
        assert_eq!(pastures.len(), 1);
        assert_eq!(pastures[0].capacity_ua, 1.2);
        assert_eq!(pastures[0].kind, PastureType::Braquiaria);
        assert_eq!(pastures[0].status, PastureStatus::Produzindo);
    }

    #[tokio::test]
    async fn registration_validation() {
        let records = records().await;

        let outcome = settle(register(&records, pasture_args(None, Some(10.0), None)).await);
        assert_eq!(outcome.message, "Qual é o nome da pastagem?");

        let outcome = settle(register(&records, pasture_args(Some("A"), Some(0.0), None)).await);
        assert_eq!(outcome.message, "Qual é a área da pastagem em hectares?");

        let outcome = settle(register(&records, pasture_args(Some("A"), Some(5.0), Some(-1.0))).await);
        assert_eq!(outcome.message, "A capacidade de suporte precisa ser maior que zero.");

        settle(register(&records, pasture_args(Some("A"), Some(5.0), None)).await);
        let outcome = settle(register(&records, pasture_args(Some("a"), Some(5.0), None)).await);
        assert!(!outcome.success);
        assert_eq!(records.load::<Pasture>().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reform_is_an_investment() {
        let records = records().await;
        settle(register(&records, pasture_args(Some("Pasto da Sede"), Some(20.0), None)).await);

        let outcome = settle(manage(&records, management("sede", "reforma", Some(800_000))).await);
        assert!(outcome.success, "{outcome:?}");

        let txs = records.load::<FinancialTransaction>().await.unwrap();
        assert_eq!(txs[0].kind, TransactionType::Investment);
        assert_eq!(txs[0].account_name, "Formação e Reforma de Pastagens");

        let pasture = &records.load::<Pasture>().await.unwrap()[0];
        assert_eq!(pasture.last_reform_date.unwrap().to_string(), "2025-10-01");

        let managements = records.load::<PastureManagement>().await.unwrap();
        assert_eq!(managements[0].financial_transaction_id.as_deref(), Some(txs[0].id.as_str()));
    }

    #[tokio::test]
    async fn upkeep_is_an_expense_and_free_upkeep_posts_nothing() {
        let records = records().await;
        settle(register(&records, pasture_args(Some("Pasto 2"), Some(20.0), None)).await);

        settle(manage(&records, management("pasto 2", "adubação", Some(150_000))).await);
        settle(manage(&records, management("pasto 2", "roçada", None)).await);

        let txs = records.load::<FinancialTransaction>().await.unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].kind, TransactionType::Expense);
        assert_eq!(txs[0].description, "Manutenção - Pasto 2");
        assert_eq!(records.load::<PastureManagement>().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_pasture_is_reported() {
        let records = records().await;
        let outcome = settle(manage(&records, management("retiro", "adubação", Some(1))).await);
        assert!(!outcome.success);
        assert!(outcome.message.contains("retiro"));
    }
}
