//! The Domain Operation Executor.

use std::sync::Arc;
use std::time::Instant;

use agromie_core::error::StoreError;
use agromie_core::{KvStore, OperationOutcome};
use chrono::NaiveDate;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::catalog::{self, SeedReport};
use crate::herd;
use crate::ledger::{FinancialMetrics, compute_metrics};
use crate::operation::{Operation, OperationKind};
use crate::ops::{self, OpResult, composite, finance, livestock, pasture, query, reset};
use crate::pasture::{StockingBalance, stocking_balance};
use crate::records::{Animal, FinancialTransaction, Pasture};
use crate::repo::Records;

/// Reply to an operation name outside the catalog.
pub const UNKNOWN_OPERATION: &str = "Não entendi. Pode reformular?";

/// Reply to `solicitar_dados` without a question.
const DEFAULT_INFO_REQUEST: &str = "Preciso de mais informações.";

/// Runs one named operation against the record store.
///
/// Every call answers with an [`OperationOutcome`]; validation problems,
/// unknown names and storage failures all come back as `success: false`.
#[derive(Clone)]
pub struct OperationExecutor {
    records: Records,
}

impl OperationExecutor {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            records: Records::new(store),
        }
    }

    pub fn records(&self) -> &Records {
        &self.records
    }

    /// Seed the default catalogs. Call once at startup.
    pub async fn ensure_seeded(&self) -> Result<SeedReport, StoreError> {
        catalog::ensure_seeded(&self.records).await
    }

    /// Execute the operation called `name` with an untrusted argument bag.
    pub async fn execute(&self, name: &str, args: &Value) -> OperationOutcome {
        let Some(kind) = OperationKind::from_name(name) else {
            warn!(operation = name, "Unknown operation requested");
            return OperationOutcome::fail(UNKNOWN_OPERATION)
                .with_data(json!({ "operation": name }));
        };

        let operation = Operation::from_args(kind, args);
        let mutation = operation.is_mutation();
        let started = Instant::now();
        let outcome = self.run(operation).await;
        info!(
            operation = %kind,
            mutation,
            success = outcome.success,
            duration_ms = started.elapsed().as_millis() as u64,
            "Operation executed"
        );
        outcome
    }

    /// Execute an already-normalized operation.
    pub async fn run(&self, operation: Operation) -> OperationOutcome {
        ops::settle(self.dispatch(operation).await)
    }

    async fn dispatch(&self, operation: Operation) -> OpResult {
        let records = &self.records;
        match operation {
            Operation::Posting(args) => finance::record_posting(records, args).await,
            Operation::Purchase(args) => livestock::purchase(records, args).await,
            Operation::Sale(args) => livestock::sell(records, args).await,
            Operation::Birth(args) => livestock::birth(records, args).await,
            Operation::Inventory(args) => livestock::inventory(records, args).await,
            Operation::Movement(args) => livestock::movement(records, args).await,
            Operation::Death(args) => livestock::death(records, args).await,
            Operation::Weighing(args) => livestock::weighing(records, args).await,
            Operation::RegisterPasture(args) => pasture::register(records, args).await,
            Operation::ManagePasture(args) => pasture::manage(records, args).await,
            Operation::Composite(args) => composite::acquire(records, args).await,
            Operation::Query(q) => query::run(records, q).await,
            Operation::RequestInfo(question) => Ok(OperationOutcome::fail(
                question.unwrap_or_else(|| DEFAULT_INFO_REQUEST.to_string()),
            )
            .with_data(json!({ "needsInput": true }))),
            Operation::Reset(scope) => reset::reset(records, scope).await,
        }
    }

    /// Stocking balance of the current herd over producing pastures.
    pub async fn stocking_balance(&self) -> Result<StockingBalance, StoreError> {
        let pastures = self.records.load::<Pasture>().await?;
        let animals = self.records.load::<Animal>().await?;
        Ok(stocking_balance(&pastures, herd::total_animal_units(&animals)))
    }

    /// Financial metrics for an optional period.
    pub async fn financial_metrics(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<FinancialMetrics, StoreError> {
        let transactions = self.records.load::<FinancialTransaction>().await?;
        Ok(compute_metrics(&transactions, start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{AnimalStatus, TransactionType};
    use agromie_store::InMemoryStore;
    use serde_json::json;

    async fn executor() -> OperationExecutor {
        let executor = OperationExecutor::new(Arc::new(InMemoryStore::new()));
        executor.ensure_seeded().await.unwrap();
        executor
    }

    async fn transactions(executor: &OperationExecutor) -> Vec<FinancialTransaction> {
        executor.records().load().await.unwrap()
    }

    #[tokio::test]
    async fn unknown_operation_is_a_failure_value() {
        let executor = executor().await;
        let outcome = executor.execute("vender_fazenda", &json!({})).await;
        assert!(!outcome.success);
        assert_eq!(outcome.message, UNKNOWN_OPERATION);
    }

    #[tokio::test]
    async fn purchase_posts_exactly_one_investment() {
        let executor = executor().await;
        let outcome = executor
            .execute(
                "registrar_compra_animais",
                &json!({"quantidade": 20, "preco_unitario": 300_000, "categoria": "BOI_MAGRO"}),
            )
            .await;
        assert!(outcome.success, "{outcome:?}");

        let txs = transactions(&executor).await;
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].kind, TransactionType::Investment);
        assert_eq!(txs[0].amount, 20 * 300_000);
    }

    #[tokio::test]
    async fn sale_of_fifty_calves_by_arroba() {
        let executor = executor().await;
        executor
            .execute("registrar_inventario_rebanho", &json!({"quantidade": 60, "categoria": "BEZERRA"}))
            .await;

        let outcome = executor
            .execute(
                "registrar_venda_animais",
                &json!({
                    "quantidade": 50,
                    "categoria": "bezerra",
                    "peso_medio_arroba": 7,
                    "preco_por_arroba": 340
                }),
            )
            .await;
        assert!(outcome.success, "{outcome:?}");

        let txs = transactions(&executor).await;
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].kind, TransactionType::Revenue);
        assert_eq!(txs[0].amount, 11_900_000);

        let animals: Vec<Animal> = executor.records().load().await.unwrap();
        assert_eq!(animals.iter().filter(|a| a.status == AnimalStatus::Sold).count(), 50);
    }

    #[tokio::test]
    async fn births_create_no_transactions() {
        let executor = executor().await;
        let outcome = executor
            .execute("registrar_nascimento", &json!({"quantidade": 4}))
            .await;
        assert!(outcome.success);
        assert!(transactions(&executor).await.is_empty());
    }

    #[tokio::test]
    async fn request_info_relays_the_question() {
        let executor = executor().await;
        let outcome = executor
            .execute("solicitar_dados", &json!({"mensagem": "Qual foi a data da venda?"}))
            .await;
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Qual foi a data da venda?");

        let outcome = executor.execute("solicitar_dados", &json!(null)).await;
        assert_eq!(outcome.message, "Preciso de mais informações.");
    }

    #[tokio::test]
    async fn stocking_balance_over_two_pastures() {
        let executor = executor().await;
        for name in ["Pasto 1", "Pasto 2"] {
            executor
                .execute("registrar_area_pasto", &json!({"nome": name, "area": 40}))
                .await;
        }
        executor
            .execute("registrar_inventario_rebanho", &json!({"quantidade": 20, "categoria": "VACA"}))
            .await;

        let balance = executor.stocking_balance().await.unwrap();
        assert!((balance.capacity_ua - 96.0).abs() < 1e-9);
        assert!((balance.current_ua - 20.0).abs() < 1e-9);
        assert!((balance.ratio - 20.83).abs() < 0.01);
        assert_eq!(balance.status, crate::pasture::StockingStatus::Sublotado);
    }

    #[tokio::test]
    async fn corrupt_storage_becomes_a_generic_failure() {
        let store = Arc::new(InMemoryStore::new());
        store
            .set("financial_transactions", json!("garbage"))
            .await
            .unwrap();
        let executor = OperationExecutor::new(store);
        executor.ensure_seeded().await.unwrap();

        let outcome = executor
            .execute("registrar_despesa", &json!({"valor": 1000}))
            .await;
        assert!(!outcome.success);
        assert_eq!(outcome.message, ops::GENERIC_FAILURE);
        assert!(outcome.error.unwrap().contains("financial_transactions"));
    }
}
