//! Handlers behind [`OperationExecutor`](crate::OperationExecutor).
//!
//! A handler returns `Ok(outcome)` when it ran, `Err(Halt::Rejected)` when the
//! request failed validation and `Err(Halt::Store)` when storage broke. `?`
//! works on both kinds of early exit.

pub(crate) mod composite;
pub(crate) mod finance;
pub(crate) mod livestock;
pub(crate) mod pasture;
pub(crate) mod query;
pub(crate) mod reset;

use agromie_core::OperationOutcome;
use agromie_core::error::StoreError;
use tracing::error;

/// Message for failures the user cannot fix by rephrasing.
pub const GENERIC_FAILURE: &str = "Ops, deu um erro. Pode tentar de novo?";

/// Message when no livestock category can be resolved.
pub(crate) const NO_CATEGORY: &str =
    "Não consegui identificar a categoria. Pode ser mais específico?";

/// Message when an amount does not fit in the ledger.
pub(crate) const AMOUNT_TOO_LARGE: &str = "Esse valor é grande demais. Pode conferir?";

/// Cents from a computed amount, or `None` when it is not representable.
pub(crate) fn cents_from(value: f64) -> Option<i64> {
    let cents = value.round();
    (cents.is_finite() && cents.abs() < i64::MAX as f64).then_some(cents as i64)
}

#[derive(Debug)]
pub(crate) enum Halt {
    Rejected(OperationOutcome),
    Store(StoreError),
}

impl From<StoreError> for Halt {
    fn from(e: StoreError) -> Self {
        Halt::Store(e)
    }
}

impl From<OperationOutcome> for Halt {
    fn from(outcome: OperationOutcome) -> Self {
        Halt::Rejected(outcome)
    }
}

pub(crate) type OpResult = Result<OperationOutcome, Halt>;

/// A validation failure with a corrective message.
pub(crate) fn reject(message: impl Into<String>) -> Halt {
    Halt::Rejected(OperationOutcome::fail(message))
}

/// Unwrap a required argument or reject with `message`.
pub(crate) fn required<T>(value: Option<T>, message: &str) -> Result<T, Halt> {
    value.ok_or_else(|| reject(message))
}

/// Collapse a handler result into the outcome callers see.
pub(crate) fn settle(result: OpResult) -> OperationOutcome {
    match result {
        Ok(outcome) | Err(Halt::Rejected(outcome)) => outcome,
        Err(Halt::Store(e)) => {
            error!(error = %e, "Operation failed on storage");
            OperationOutcome::fault(GENERIC_FAILURE, e)
        }
    }
}

/// `dd/mm/yyyy` for user-facing messages.
pub(crate) fn display_date(date: chrono::NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}
