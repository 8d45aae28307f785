//! Read-only reports. Output depends only on stored state, so repeating a
//! query without writes in between returns identical text and data.

use std::collections::BTreeMap;

use agromie_core::OperationOutcome;
use serde_json::json;

use super::{Halt, OpResult, display_date};
use crate::args::resolve_date;
use crate::format::{format_brl, format_decimal, format_percent, markdown_table};
use crate::herd::{self, animal_units};
use crate::ledger::{FinancialMetrics, compute_metrics};
use crate::operation::{PeriodArgs, Query};
use crate::pasture::stocking_balance;
use crate::records::{Animal, FinancialTransaction, Gender, Pasture};
use crate::repo::Records;

const EMPTY_HERD: &str = "Nenhum animal ativo no rebanho.";

pub(crate) async fn run(records: &Records, query: Query) -> OpResult {
    match query {
        Query::Herd => herd_totals(records).await,
        Query::HerdDetailed => herd_detailed(records).await,
        Query::HerdBySex => herd_by_sex(records).await,
        Query::HerdByCategory => herd_by_category(records).await,
        Query::Financial(period) => financial(records, period, false).await,
        Query::Margins(period) => financial(records, period, true).await,
        Query::Pastures => pastures(records).await,
    }
}

async fn active_animals(records: &Records) -> Result<Vec<Animal>, Halt> {
    let mut animals = records.load::<Animal>().await?;
    animals.retain(Animal::is_active);
    Ok(animals)
}

/// (code, name, count) per category, ordered by code.
fn counts_by_category(animals: &[Animal]) -> Vec<(String, String, u32)> {
    let mut counts: BTreeMap<&str, (&str, u32)> = BTreeMap::new();
    for animal in animals {
        counts
            .entry(animal.category_code.as_str())
            .or_insert((animal.category_name.as_str(), 0))
            .1 += 1;
    }
    counts
        .into_iter()
        .map(|(code, (name, count))| (code.to_string(), name.to_string(), count))
        .collect()
}

async fn herd_totals(records: &Records) -> OpResult {
    let animals = active_animals(records).await?;
    if animals.is_empty() {
        return Ok(OperationOutcome::ok_with(EMPTY_HERD, json!({ "total": 0, "categories": [] })));
    }

    let by_category = counts_by_category(&animals);
    let rows: Vec<Vec<String>> = by_category
        .iter()
        .map(|(code, name, count)| {
            vec![
                name.clone(),
                count.to_string(),
                format_decimal(f64::from(*count) * animal_units(code), 1),
            ]
        })
        .collect();
    let total_ua = herd::total_animal_units(&animals);

    Ok(OperationOutcome::ok_with(
        format!(
            "**Rebanho atual: {} animais ({} UA)**\n\n{}",
            animals.len(),
            format_decimal(total_ua, 1),
            markdown_table(&["Categoria", "Quantidade", "UA"], &rows)
        ),
        json!({
            "total": animals.len(),
            "totalUA": total_ua,
            "categories": by_category
                .iter()
                .map(|(code, name, count)| json!({ "code": code, "name": name, "count": count }))
                .collect::<Vec<_>>(),
        }),
    ))
}

async fn herd_detailed(records: &Records) -> OpResult {
    let animals = active_animals(records).await?;
    if animals.is_empty() {
        return Ok(OperationOutcome::ok_with(EMPTY_HERD, json!({ "total": 0, "stock": [] })));
    }

    let stock = herd::stock_by_category(&animals);
    let gender_of = |code: &str| {
        animals
            .iter()
            .find(|a| a.category_code == code)
            .map(|a| a.gender.label())
            .unwrap_or("-")
    };
    let rows: Vec<Vec<String>> = stock
        .iter()
        .map(|s| {
            vec![
                s.name.clone(),
                gender_of(&s.code).to_string(),
                s.count.to_string(),
                format_brl(s.value),
            ]
        })
        .collect();
    let total_value: i64 = stock.iter().map(|s| s.value).sum();

    Ok(OperationOutcome::ok_with(
        format!(
            "**Rebanho detalhado: {} animais, valor estimado {}**\n\n{}",
            animals.len(),
            format_brl(total_value),
            markdown_table(&["Categoria", "Sexo", "Quantidade", "Valor estimado"], &rows)
        ),
        json!({ "total": animals.len(), "totalValue": total_value, "stock": stock }),
    ))
}

async fn herd_by_sex(records: &Records) -> OpResult {
    let animals = active_animals(records).await?;
    let males = animals.iter().filter(|a| a.gender == Gender::Male).count();
    let females = animals.len() - males;

    let rows = vec![
        vec![Gender::Male.label().to_string(), males.to_string()],
        vec![Gender::Female.label().to_string(), females.to_string()],
    ];
    Ok(OperationOutcome::ok_with(
        format!(
            "**Rebanho por sexo: {} animais**\n\n{}",
            animals.len(),
            markdown_table(&["Sexo", "Quantidade"], &rows)
        ),
        json!({ "total": animals.len(), "machos": males, "femeas": females }),
    ))
}

async fn herd_by_category(records: &Records) -> OpResult {
    let animals = active_animals(records).await?;
    if animals.is_empty() {
        return Ok(OperationOutcome::ok_with(EMPTY_HERD, json!({ "total": 0, "categories": [] })));
    }

    let mut by_category = counts_by_category(&animals);
    by_category.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.1.cmp(&b.1)));

    let total = animals.len() as f64;
    let rows: Vec<Vec<String>> = by_category
        .iter()
        .map(|(_, name, count)| {
            vec![
                name.clone(),
                count.to_string(),
                format_percent(f64::from(*count) / total * 100.0),
            ]
        })
        .collect();

    Ok(OperationOutcome::ok_with(
        format!(
            "**Rebanho por categoria: {} animais**\n\n{}",
            animals.len(),
            markdown_table(&["Categoria", "Quantidade", "%"], &rows)
        ),
        json!({
            "total": animals.len(),
            "categories": by_category
                .iter()
                .map(|(code, name, count)| json!({ "code": code, "name": name, "count": count }))
                .collect::<Vec<_>>(),
        }),
    ))
}

async fn financial(records: &Records, period: PeriodArgs, margins_only: bool) -> OpResult {
    let start = period
        .start
        .as_deref()
        .map(|s| resolve_date(Some(s)))
        .transpose()?;
    let end = period
        .end
        .as_deref()
        .map(|s| resolve_date(Some(s)))
        .transpose()?;

    let transactions = records.load::<FinancialTransaction>().await?;
    let metrics = compute_metrics(&transactions, start, end);

    let label = match (start, end) {
        (None, None) => "todo o período".to_string(),
        (Some(s), None) => format!("desde {}", display_date(s)),
        (None, Some(e)) => format!("até {}", display_date(e)),
        (Some(s), Some(e)) => format!(
            "{} a {}",
            display_date(s),
            display_date(e)
        ),
    };

    let rows = if margins_only {
        margin_rows(&metrics)
    } else {
        metric_rows(&metrics)
    };
    let title = if margins_only { "Margens" } else { "Resumo financeiro" };

    Ok(OperationOutcome::ok_with(
        format!(
            "**{title} ({label})**\n\n{}",
            markdown_table(&["Indicador", "Valor"], &rows)
        ),
        json!({
            "period": { "inicio": start, "fim": end },
            "metrics": metrics,
        }),
    ))
}

fn metric_rows(m: &FinancialMetrics) -> Vec<Vec<String>> {
    vec![
        vec!["Receita bruta".into(), format_brl(m.gross_revenue)],
        vec!["Custos totais".into(), format_brl(m.total_costs)],
        vec!["Lucro bruto".into(), format_brl(m.gross_profit)],
        vec!["Margem bruta".into(), format_percent(m.gross_margin)],
        vec!["Lucro operacional".into(), format_brl(m.operating_profit)],
        vec!["Investimentos".into(), format_brl(m.investments)],
        vec!["Retiradas".into(), format_brl(m.withdrawals)],
        vec!["Lucro líquido".into(), format_brl(m.net_profit)],
        vec!["Margem líquida".into(), format_percent(m.net_margin)],
        vec!["Custo operacional da fazenda".into(), format_brl(m.farm_operating_cost)],
    ]
}

fn margin_rows(m: &FinancialMetrics) -> Vec<Vec<String>> {
    vec![
        vec!["Margem bruta".into(), format_percent(m.gross_margin)],
        vec!["Margem operacional".into(), format_percent(m.operating_margin)],
        vec!["Margem líquida".into(), format_percent(m.net_margin)],
    ]
}

async fn pastures(records: &Records) -> OpResult {
    let pastures = records.load::<Pasture>().await?;
    if pastures.is_empty() {
        return Ok(OperationOutcome::ok_with(
            "Nenhuma pastagem cadastrada.",
            json!({ "pastures": [], "balance": null }),
        ));
    }

    let animals = active_animals(records).await?;
    let balance = stocking_balance(&pastures, herd::total_animal_units(&animals));

    let rows: Vec<Vec<String>> = pastures
        .iter()
        .map(|p| {
            vec![
                p.name.clone(),
                format_decimal(p.area, 1),
                format_decimal(p.capacity_ua, 1),
                p.status.label().to_string(),
            ]
        })
        .collect();

    let mut message = format!(
        "**Pastagens: {} cadastradas**\n\n{}\n",
        pastures.len(),
        markdown_table(&["Nome", "Área (ha)", "Capacidade (UA/ha)", "Status"], &rows)
    );
    message.push_str(&format!(
        "Capacidade total: {} UA · Carga atual: {} UA · Taxa de lotação: {} ({})",
        format_decimal(balance.capacity_ua, 1),
        format_decimal(balance.current_ua, 1),
        format_percent(balance.ratio),
        balance.status.label()
    ));

    Ok(OperationOutcome::ok_with(
        message,
        json!({ "pastures": pastures, "balance": balance }),
    ))
}
