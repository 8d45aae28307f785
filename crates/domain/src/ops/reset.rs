use agromie_core::OperationOutcome;
use tracing::warn;

use super::OpResult;
use crate::catalog::ensure_seeded;
use crate::operation::ResetScope;
use crate::records::{
    Animal, FinancialTransaction, LivestockEvent, Movement, Pasture, PastureManagement,
};
use crate::repo::Records;

pub(crate) async fn reset(records: &Records, scope: ResetScope) -> OpResult {
    warn!(?scope, "Destructive reset requested");
    let message = match scope {
        ResetScope::All => {
            records.store().clear().await?;
            ensure_seeded(records).await?;
            "Todos os dados foram apagados. Categorias e plano de contas foram recriados."
        }
        ResetScope::Herd => {
            records.remove::<Animal>().await?;
            records.remove::<LivestockEvent>().await?;
            records.remove::<Movement>().await?;
            "Dados do rebanho apagados."
        }
        ResetScope::Financial => {
            records.remove::<FinancialTransaction>().await?;
            "Lançamentos financeiros apagados."
        }
        ResetScope::Pastures => {
            records.remove::<Pasture>().await?;
            records.remove::<PastureManagement>().await?;
            "Pastagens e manejos apagados."
        }
    };
    Ok(OperationOutcome::ok(message))
}
