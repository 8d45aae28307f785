//! Multi-pasture acquisition: create several pastures and buy the animals
//! that will stock them, in one request.

use agromie_core::OperationOutcome;
use serde_json::{Value, json};
use tracing::{info, warn};

use super::{OpResult, livestock, pasture, reject, required, settle};
use crate::args::resolve_date;
use crate::format::format_brl;
use crate::operation::{CompositeArgs, PastureArgs, PurchaseArgs};
use crate::repo::Records;

pub(crate) async fn acquire(records: &Records, args: CompositeArgs) -> OpResult {
    if args.pastures.is_empty() {
        return Err(reject("Preciso saber quais pastagens registrar."));
    }
    let total_animals = required(
        args.total_animals.filter(|n| *n > 0),
        "Preciso saber a quantidade total de animais.",
    )?;
    let value = required(
        args.value.filter(|v| *v > 0),
        "Preciso saber o valor da compra.",
    )?;
    let date = resolve_date(args.date.as_deref())?;

    let mut errors: Vec<String> = Vec::new();
    let mut created: Vec<Value> = Vec::new();
    let mut names: Vec<String> = Vec::new();

    for (i, spec) in args.pastures.iter().enumerate() {
        let label = spec
            .name
            .clone()
            .unwrap_or_else(|| format!("pastagem {}", i + 1));
        let outcome = settle(
            pasture::register(
                records,
                PastureArgs {
                    name: spec.name.clone(),
                    area: spec.area,
                    capacity: None,
                    kind: None,
                    status: None,
                },
            )
            .await,
        );
        if outcome.success {
            names.push(label);
            created.extend(outcome.data.and_then(|d| d.get("pasture").cloned()));
        } else {
            errors.push(format!("{label}: {}", outcome.failure_reason()));
        }
    }

    let purchase = settle(
        livestock::purchase(
            records,
            PurchaseArgs {
                head_count: Some(total_animals),
                total: Some(value),
                unit_price: None,
                category: args.category.clone(),
                average_weight_kg: args.average_weight_kg,
                date: Some(date.to_string()),
                description: None,
            },
        )
        .await,
    );
    if !purchase.success {
        errors.push(format!("Compra: {}", purchase.failure_reason()));
    }

    // Bookkeeping only: animals are not assigned to these pastures.
    let distribution: Vec<Value> = if args.distribution.is_empty() {
        Vec::new()
    } else {
        let planned: u32 = args.distribution.iter().sum();
        if planned != total_animals {
            warn!(planned, total_animals, "Distribution does not add up to the purchase");
        }
        args.pastures
            .iter()
            .enumerate()
            .zip(&args.distribution)
            .map(|((i, spec), head_count)| {
                json!({
                    "pasture": spec.name.clone().unwrap_or_else(|| format!("pastagem {}", i + 1)),
                    "headCount": head_count,
                })
            })
            .collect()
    };

    let success = errors.is_empty();
    info!(
        pastures = created.len(),
        purchase = purchase.success,
        errors = errors.len(),
        "Composite acquisition finished"
    );

    let message = if success {
        format!(
            "Operação concluída: {} pastagens registradas ({}) e compra de {total_animals} animais por {}. \
             Investimento lançado automaticamente no financeiro.",
            created.len(),
            names.join(", "),
            format_brl(value)
        )
    } else if created.is_empty() && !purchase.success {
        format!("Não consegui concluir a operação. Erros: {}", errors.join("; "))
    } else {
        format!("Operação concluída parcialmente. Erros: {}", errors.join("; "))
    };

    let data = json!({
        "pastures": created,
        "purchase": purchase.data,
        "distribution": distribution,
        "errors": errors,
    });
    Ok(OperationOutcome {
        success,
        message,
        data: Some(data),
        error: (!success).then(|| errors.join("; ")),
    })
}
