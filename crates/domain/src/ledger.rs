//! The financial ledger: postings, compensation and period metrics.

use agromie_core::error::StoreError;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::records::{Account, AccountGroup, FinancialTransaction, TransactionType, new_id};
use crate::repo::Records;

/// A posting about to be written.
#[derive(Debug, Clone)]
pub struct NewPosting {
    pub kind: TransactionType,
    /// Cents, strictly positive.
    pub amount: i64,
    pub date: NaiveDate,
    pub description: String,
    pub category: Option<String>,
    /// Preferred account name inside the group ("Venda de Animais").
    pub account_hint: Option<String>,
}

impl NewPosting {
    pub fn new(kind: TransactionType, amount: i64, date: NaiveDate, description: impl Into<String>) -> Self {
        Self {
            kind,
            amount,
            date,
            description: description.into(),
            category: None,
            account_hint: None,
        }
    }

    pub fn with_account_hint(mut self, hint: impl Into<String>) -> Self {
        self.account_hint = Some(hint.into());
        self
    }

    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }
}

/// Write one transaction against the account that matches its type.
pub async fn post(records: &Records, posting: NewPosting) -> Result<FinancialTransaction, StoreError> {
    let account = resolve_account(records, posting.kind.group(), posting.account_hint.as_deref()).await?;

    let tx = FinancialTransaction {
        id: new_id(),
        kind: posting.kind,
        account_id: account.id,
        account_name: account.name,
        date: posting.date,
        description: posting.description,
        amount: posting.amount,
        category: posting.category,
        created_at: Utc::now(),
    };
    records.append(tx.clone()).await?;
    debug!(
        tx_id = %tx.id,
        kind = ?tx.kind,
        amount = tx.amount,
        account = %tx.account_name,
        "Transaction posted"
    );
    Ok(tx)
}

/// Remove a transaction written earlier in the same operation.
///
/// Returns whether anything was removed.
pub async fn void(records: &Records, tx_id: &str) -> Result<bool, StoreError> {
    let mut all = records.load::<FinancialTransaction>().await?;
    let before = all.len();
    all.retain(|tx| tx.id != tx_id);
    if all.len() == before {
        warn!(tx_id, "Transaction to void was not found");
        return Ok(false);
    }
    records.save(&all).await?;
    debug!(tx_id, "Transaction voided");
    Ok(true)
}

/// Hinted account in the group, else the first active one, else a new one.
async fn resolve_account(
    records: &Records,
    group: AccountGroup,
    hint: Option<&str>,
) -> Result<Account, StoreError> {
    let mut accounts = records.load::<Account>().await?;

    let hinted = hint.and_then(|hint| {
        accounts
            .iter()
            .find(|a| a.active && a.group == group && a.name.eq_ignore_ascii_case(hint))
    });
    if let Some(account) = hinted.or_else(|| accounts.iter().find(|a| a.active && a.group == group)) {
        return Ok(account.clone());
    }

    let in_group = accounts.iter().filter(|a| a.group == group).count();
    let account = Account {
        id: new_id(),
        code: format!("{}.{}", group.code_prefix(), in_group + 1),
        name: group.default_account_name().to_string(),
        group,
        active: true,
    };
    accounts.push(account.clone());
    records.save(&accounts).await?;
    debug!(account = %account.name, code = %account.code, "Account created on demand");
    Ok(account)
}

/// Period result, in cents and percentages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FinancialMetrics {
    #[serde(rename = "receitaBruta")]
    pub gross_revenue: i64,
    #[serde(rename = "custosTotais")]
    pub total_costs: i64,
    #[serde(rename = "lucroBruto")]
    pub gross_profit: i64,
    #[serde(rename = "margemBruta")]
    pub gross_margin: f64,
    #[serde(rename = "despesasOperacionais")]
    pub operating_expenses: i64,
    #[serde(rename = "lucroOperacional")]
    pub operating_profit: i64,
    #[serde(rename = "margemOperacional")]
    pub operating_margin: f64,
    #[serde(rename = "investimentos")]
    pub investments: i64,
    #[serde(rename = "retiradas")]
    pub withdrawals: i64,
    #[serde(rename = "lucroLiquido")]
    pub net_profit: i64,
    #[serde(rename = "margemLiquida")]
    pub net_margin: f64,
    #[serde(rename = "custoOperacionalFazenda")]
    pub farm_operating_cost: i64,
}

/// Metrics over transactions dated within `[start, end]` (both optional).
pub fn compute_metrics(
    transactions: &[FinancialTransaction],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> FinancialMetrics {
    let in_period = transactions.iter().filter(|tx| {
        start.is_none_or(|s| tx.date >= s) && end.is_none_or(|e| tx.date <= e)
    });

    let (mut revenue, mut expenses, mut investments, mut withdrawals) = (0i64, 0i64, 0i64, 0i64);
    for tx in in_period {
        match tx.kind {
            TransactionType::Revenue => revenue = revenue.saturating_add(tx.amount),
            TransactionType::Expense => expenses = expenses.saturating_add(tx.amount),
            TransactionType::Investment => investments = investments.saturating_add(tx.amount),
            TransactionType::Withdrawal => withdrawals = withdrawals.saturating_add(tx.amount),
        }
    }

    let margin = |profit: i64| {
        if revenue > 0 {
            profit as f64 / revenue as f64 * 100.0
        } else {
            0.0
        }
    };

    let gross_profit = revenue.saturating_sub(expenses);
    let operating_profit = gross_profit;
    let net_profit = operating_profit
        .saturating_sub(investments)
        .saturating_sub(withdrawals);

    FinancialMetrics {
        gross_revenue: revenue,
        total_costs: expenses,
        gross_profit,
        gross_margin: margin(gross_profit),
        operating_expenses: expenses,
        operating_profit,
        operating_margin: margin(operating_profit),
        investments,
        withdrawals,
        net_profit,
        net_margin: margin(net_profit),
        farm_operating_cost: expenses.saturating_add(investments),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ensure_seeded;
    use agromie_store::InMemoryStore;
    use std::sync::Arc;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, d).unwrap()
    }

    async fn seeded() -> Records {
        let records = Records::new(Arc::new(InMemoryStore::new()));
        ensure_seeded(&records).await.unwrap();
        records
    }

    #[tokio::test]
    async fn posting_uses_hinted_account() {
        let records = seeded().await;
        let tx = post(
            &records,
            NewPosting::new(TransactionType::Revenue, 11_900_000, day(30), "Venda")
                .with_account_hint("Venda de Animais"),
        )
        .await
        .unwrap();
        assert_eq!(tx.account_name, "Venda de Animais");

        let tx = post(
            &records,
            NewPosting::new(TransactionType::Expense, 50_000, day(30), "Diesel"),
        )
        .await
        .unwrap();
        assert_eq!(tx.account_name, "Custos Operacionais");
        assert_eq!(records.load::<FinancialTransaction>().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn posting_creates_missing_account() {
        let records = Records::new(Arc::new(InMemoryStore::new()));
        let tx = post(
            &records,
            NewPosting::new(TransactionType::Investment, 1_000, day(1), "Cerca"),
        )
        .await
        .unwrap();
        assert_eq!(tx.account_name, "Investimentos Gerais");

        let accounts = records.load::<Account>().await.unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].code, "3.1");
    }

    #[tokio::test]
    async fn void_removes_only_the_target() {
        let records = seeded().await;
        let keep = post(&records, NewPosting::new(TransactionType::Expense, 10, day(1), "a"))
            .await
            .unwrap();
        let dropped = post(&records, NewPosting::new(TransactionType::Expense, 20, day(1), "b"))
            .await
            .unwrap();

        assert!(void(&records, &dropped.id).await.unwrap());
        assert!(!void(&records, "missing").await.unwrap());

        let left = records.load::<FinancialTransaction>().await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, keep.id);
    }

    fn tx(kind: TransactionType, amount: i64, d: u32) -> FinancialTransaction {
        FinancialTransaction {
            id: new_id(),
            kind,
            account_id: "a".into(),
            account_name: "a".into(),
            date: day(d),
            description: String::new(),
            amount,
            category: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn metrics_over_period() {
        let txs = vec![
            tx(TransactionType::Revenue, 100_000, 10),
            tx(TransactionType::Expense, 40_000, 11),
            tx(TransactionType::Investment, 20_000, 12),
            tx(TransactionType::Withdrawal, 10_000, 13),
            tx(TransactionType::Revenue, 999_999, 1),
        ];

        let m = compute_metrics(&txs, Some(day(5)), Some(day(30)));
        assert_eq!(m.gross_revenue, 100_000);
        assert_eq!(m.gross_profit, 60_000);
        assert_eq!(m.net_profit, 30_000);
        assert_eq!(m.farm_operating_cost, 60_000);
        assert!((m.gross_margin - 60.0).abs() < 1e-9);
        assert!((m.net_margin - 30.0).abs() < 1e-9);

        let empty = compute_metrics(&[], None, None);
        assert_eq!(empty.net_margin, 0.0);
    }

    #[test]
    fn metric_sums_saturate_instead_of_wrapping() {
        let txs = vec![
            tx(TransactionType::Revenue, i64::MAX, 1),
            tx(TransactionType::Revenue, i64::MAX, 2),
            tx(TransactionType::Expense, i64::MAX, 3),
            tx(TransactionType::Investment, i64::MAX, 4),
        ];
        let m = compute_metrics(&txs, None, None);
        assert_eq!(m.gross_revenue, i64::MAX);
        assert_eq!(m.gross_profit, 0);
        assert_eq!(m.net_profit, -i64::MAX);
        assert_eq!(m.farm_operating_cost, i64::MAX);
    }
}
