use agromie_core::OperationOutcome;
use serde_json::json;
use tracing::info;

use super::{OpResult, display_date, reject, required};
use crate::args::resolve_date;
use crate::format::format_brl;
use crate::ledger::{self, NewPosting};
use crate::operation::PostingArgs;
use crate::records::TransactionType;
use crate::repo::Records;

struct PostingWords {
    /// "da receita"
    of: &'static str,
    /// "Receita"
    label: &'static str,
    /// "registrada"
    recorded: &'static str,
}

fn words(kind: TransactionType) -> PostingWords {
    match kind {
        TransactionType::Revenue => PostingWords {
            of: "da receita",
            label: "Receita",
            recorded: "registrada",
        },
        TransactionType::Expense => PostingWords {
            of: "da despesa",
            label: "Despesa",
            recorded: "registrada",
        },
        TransactionType::Investment => PostingWords {
            of: "do investimento",
            label: "Investimento",
            recorded: "registrado",
        },
        TransactionType::Withdrawal => PostingWords {
            of: "do pró-labore",
            label: "Pró-labore",
            recorded: "registrado",
        },
    }
}

pub(crate) async fn record_posting(records: &Records, args: PostingArgs) -> OpResult {
    let words = words(args.kind);
    let amount = required(args.amount, &format!("Preciso saber o valor {}.", words.of))?;
    if amount <= 0 {
        return Err(reject("O valor precisa ser maior que zero."));
    }
    let date = resolve_date(args.date.as_deref())?;
    let description = args
        .description
        .unwrap_or_else(|| words.label.to_string());

    let mut posting = NewPosting::new(args.kind, amount, date, description)
        .with_category(args.category.clone());
    if let Some(category) = args.category {
        posting = posting.with_account_hint(category);
    }
    let tx = ledger::post(records, posting).await?;

    info!(kind = ?tx.kind, amount = tx.amount, "Posting recorded");
    Ok(OperationOutcome::ok_with(
        format!(
            "{} de {} {} em {} ({}).",
            words.label,
            format_brl(amount),
            words.recorded,
            display_date(date),
            tx.account_name
        ),
        json!({ "transaction": tx }),
    ))
}
