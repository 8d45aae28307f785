//! Herd operations. Purchases and sales also write the ledger; births and
//! inventory never do.

use agromie_core::OperationOutcome;
use agromie_core::error::StoreError;
use chrono::{NaiveDate, Utc};
use serde_json::json;
use tracing::{error, info, warn};

use super::{
    AMOUNT_TOO_LARGE, Halt, NO_CATEGORY, OpResult, cents_from, display_date, reject, required,
};
use crate::args::resolve_date;
use crate::catalog::{category_code, resolve_category};
use crate::format::{format_brl, format_decimal};
use crate::herd::{self, Arrival, KG_PER_ARROBA};
use crate::ledger::{self, NewPosting};
use crate::operation::{
    DeathArgs, HeadcountArgs, MovementArgs, PastureAllotment, PurchaseArgs, SaleArgs, WeighingArgs,
};
use crate::pasture::find_by_name;
use crate::records::{
    Animal, AnimalStatus, EventType, LivestockCategory, LivestockEvent, Movement, Pasture,
    TransactionType, new_id, normalize_code,
};
use crate::repo::Records;

const PURCHASE_ACCOUNT: &str = "Compra de Animais";
const SALE_ACCOUNT: &str = "Venda de Animais";

async fn category_for(records: &Records, requested: Option<&str>) -> Result<LivestockCategory, Halt> {
    let categories = records.load::<LivestockCategory>().await?;
    resolve_category(&categories, requested)
        .cloned()
        .ok_or_else(|| reject(NO_CATEGORY))
}

/// Append new animals to the herd and return them.
async fn add_animals(
    records: &Records,
    category: &LivestockCategory,
    count: u32,
    arrival: &Arrival,
) -> Result<Vec<Animal>, StoreError> {
    let mut animals = records.load::<Animal>().await?;
    let created = herd::new_animals(&animals, category, count, arrival);
    animals.extend(created.iter().cloned());
    records.save(&animals).await?;
    Ok(created)
}

/// Events are an audit trail: a failed write is logged, not surfaced.
async fn record_event(records: &Records, event: LivestockEvent) {
    let kind = event.kind;
    if let Err(e) = records.append(event).await {
        warn!(error = %e, ?kind, "Failed to record livestock event");
    }
}

/// Undo the ledger half of a purchase or sale whose herd write failed.
async fn compensate(records: &Records, tx_id: &str) {
    match ledger::void(records, tx_id).await {
        Ok(_) => warn!(tx_id, "Ledger posting voided after herd write failure"),
        Err(e) => error!(tx_id, error = %e, "Failed to void ledger posting; ledger and herd disagree"),
    }
}

fn ids(animals: &[Animal]) -> Vec<String> {
    animals.iter().map(|a| a.id.clone()).collect()
}

fn event(
    kind: EventType,
    date: NaiveDate,
    description: impl Into<String>,
    category: Option<&LivestockCategory>,
    animal_ids: Vec<String>,
) -> LivestockEvent {
    let mut event = LivestockEvent::new(kind, date, description);
    event.category_id = category.map(|c| c.id.clone());
    event.quantity = animal_ids.len() as u32;
    event.animal_ids = animal_ids;
    event
}

// ── Purchase ─────────────────────────────────────────────────────────────

pub(crate) async fn purchase(records: &Records, args: PurchaseArgs) -> OpResult {
    let head_count = required(
        args.head_count.filter(|n| *n > 0),
        "Quantos animais você comprou?",
    )?;
    let total = match (args.total, args.unit_price) {
        (Some(total), _) if total > 0 => total,
        (_, Some(price)) if price > 0 => price
            .checked_mul(i64::from(head_count))
            .ok_or_else(|| reject(AMOUNT_TOO_LARGE))?,
        _ => return Err(reject("Qual foi o valor total ou o preço por cabeça?")),
    };
    let date = resolve_date(args.date.as_deref())?;
    let category = category_for(records, args.category.as_deref()).await?;

    let unit_price = (total as f64 / f64::from(head_count)).round() as i64;
    let description = args
        .description
        .unwrap_or_else(|| format!("Compra de {head_count} {}", category.name));

    // Ledger first: if the herd write fails the posting is voided, so the
    // two halves never disagree silently.
    let tx = ledger::post(
        records,
        NewPosting::new(TransactionType::Investment, total, date, description.clone())
            .with_account_hint(PURCHASE_ACCOUNT),
    )
    .await?;

    let arrival = Arrival {
        purchase_date: Some(date),
        purchase_price: Some(unit_price),
        weight: args.average_weight_kg.filter(|kg| *kg > 0.0).map(herd::kg_to_grams),
        ..Arrival::default()
    };
    let created = match add_animals(records, &category, head_count, &arrival).await {
        Ok(created) => created,
        Err(e) => {
            compensate(records, &tx.id).await;
            return Err(e.into());
        }
    };

    let mut purchase_event = event(
        EventType::Purchase,
        date,
        description,
        Some(&category),
        ids(&created),
    );
    purchase_event.amount = Some(total);
    purchase_event.weight = arrival.weight;
    purchase_event.financial_transaction_id = Some(tx.id.clone());
    record_event(records, purchase_event).await;

    info!(
        head_count,
        category = %category.code,
        amount = total,
        tx_id = %tx.id,
        "Purchase recorded"
    );
    Ok(OperationOutcome::ok_with(
        format!(
            "Compra de {head_count} {} registrada por {} ({} por cabeça) em {}. \
             Investimento lançado automaticamente no financeiro.",
            category.name,
            format_brl(total),
            format_brl(unit_price),
            display_date(date)
        ),
        json!({
            "transactionId": tx.id,
            "amount": total,
            "unitPrice": unit_price,
            "category": category.code,
            "animalsCreated": created.len(),
            "animalIds": ids(&created),
        }),
    ))
}

// ── Sale ─────────────────────────────────────────────────────────────────

pub(crate) async fn sell(records: &Records, args: SaleArgs) -> OpResult {
    let explicit = !args.animal_ids.is_empty();
    let head_count = required(
        args.head_count
            .filter(|n| *n > 0)
            .or_else(|| explicit.then(|| args.animal_ids.len() as u32)),
        "Quantos animais você vendeu?",
    )?;
    let total = match (args.total, args.arrobas_per_head, args.price_per_arroba) {
        (Some(total), _, _) if total > 0 => total,
        (_, Some(arrobas), Some(price)) if arrobas > 0.0 && price > 0.0 => {
            cents_from(f64::from(head_count) * arrobas * price * 100.0)
                .ok_or_else(|| reject(AMOUNT_TOO_LARGE))?
        }
        _ => {
            return Err(reject(
                "Qual foi o valor total da venda ou o peso médio e o preço por arroba?",
            ));
        }
    };
    let date = resolve_date(args.date.as_deref())?;

    let categories = records.load::<LivestockCategory>().await?;
    let mut animals = records.load::<Animal>().await?;
    let mut warnings: Vec<String> = Vec::new();

    let (category, selected) = if explicit {
        let mut selected = Vec::with_capacity(args.animal_ids.len());
        for reference in &args.animal_ids {
            match herd::find_animal(&animals, reference) {
                Some(i) if animals[i].is_active() => {
                    if !selected.contains(&i) {
                        selected.push(i);
                    }
                }
                _ => {
                    return Err(reject(format!(
                        "O animal {reference} não está ativo no rebanho."
                    )));
                }
            }
        }
        let category = selected
            .first()
            .and_then(|&i| categories.iter().find(|c| c.id == animals[i].category_id))
            .or_else(|| resolve_category(&categories, args.category.as_deref()))
            .cloned()
            .ok_or_else(|| reject(NO_CATEGORY))?;
        (category, selected)
    } else {
        let category = resolve_category(&categories, args.category.as_deref())
            .cloned()
            .ok_or_else(|| reject(NO_CATEGORY))?;
        let selected = herd::select_fifo(&animals, &category.id, head_count as usize);
        if selected.len() < head_count as usize {
            warnings.push(format!(
                "Havia apenas {} {} ativos no rebanho; {} foram marcados como vendidos.",
                selected.len(),
                category.name,
                selected.len()
            ));
        }
        (category, selected)
    };

    let description = args
        .description
        .unwrap_or_else(|| format!("Venda de {head_count} {}", category.name));
    let tx = ledger::post(
        records,
        NewPosting::new(TransactionType::Revenue, total, date, description.clone())
            .with_account_hint(SALE_ACCOUNT),
    )
    .await?;

    if !selected.is_empty() {
        let now = Utc::now();
        for &i in &selected {
            let animal = &mut animals[i];
            animal.status = AnimalStatus::Sold;
            animal.exit_date = Some(date);
            animal.updated_at = now;
        }
        if let Err(e) = records.save(&animals).await {
            compensate(records, &tx.id).await;
            return Err(e.into());
        }
    }
    let sold_ids: Vec<String> = selected.iter().map(|&i| animals[i].id.clone()).collect();

    let mut sale_event = event(EventType::Sale, date, description, Some(&category), sold_ids.clone());
    sale_event.amount = Some(total);
    sale_event.financial_transaction_id = Some(tx.id.clone());
    record_event(records, sale_event).await;

    let pastures = apply_allotments(records, &args.pastures, &mut warnings).await;

    info!(
        head_count,
        sold = sold_ids.len(),
        category = %category.code,
        amount = total,
        tx_id = %tx.id,
        "Sale recorded"
    );

    let mut message = format!(
        "Venda de {head_count} {} registrada por {} em {}. \
         Receita lançada automaticamente no financeiro.",
        category.name,
        format_brl(total),
        display_date(date)
    );
    if !pastures.is_empty() {
        let distribution: Vec<String> = pastures
            .iter()
            .map(|p| {
                let name = p["name"].as_str().unwrap_or_default();
                match p["headCount"].as_u64() {
                    Some(n) => format!("{name}: {n}"),
                    None => name.to_string(),
                }
            })
            .collect();
        message.push_str(&format!("\nDistribuição: {}.", distribution.join(", ")));
    }
    for warning in &warnings {
        message.push_str(&format!("\nAtenção: {warning}"));
    }

    Ok(OperationOutcome::ok_with(
        message,
        json!({
            "transactionId": tx.id,
            "amount": total,
            "category": category.code,
            "animalsSold": sold_ids.len(),
            "animalIds": sold_ids,
            "pastures": pastures,
            "warnings": warnings,
        }),
    ))
}

/// Resolve the pastures a sale mentions and apply any renames.
async fn apply_allotments(
    records: &Records,
    allotments: &[PastureAllotment],
    warnings: &mut Vec<String>,
) -> Vec<serde_json::Value> {
    if allotments.is_empty() {
        return Vec::new();
    }
    let mut pastures = match records.load::<Pasture>().await {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "Could not load pastures for sale allotment");
            warnings.push("Não consegui atualizar as pastagens da venda.".to_string());
            return Vec::new();
        }
    };

    let mut touched = Vec::new();
    let mut renamed = false;
    for allotment in allotments {
        let Some(i) = find_by_name(&pastures, &allotment.reference) else {
            warn!(reference = %allotment.reference, "Sale mentions an unknown pasture");
            warnings.push(format!("Pastagem \"{}\" não encontrada.", allotment.reference));
            continue;
        };
        let previous = pastures[i].name.clone();
        if let Some(new_name) = &allotment.new_name {
            pastures[i].name = new_name.clone();
            pastures[i].updated_at = Utc::now();
            renamed = true;
        }
        touched.push(json!({
            "pastureId": pastures[i].id,
            "name": pastures[i].name,
            "previousName": previous,
            "headCount": allotment.head_count,
        }));
    }

    if renamed {
        if let Err(e) = records.save(&pastures).await {
            warn!(error = %e, "Failed to rename pastures after sale");
            warnings.push("Não consegui renomear as pastagens.".to_string());
        }
    }
    touched
}

// ── Births and inventory (no ledger) ─────────────────────────────────────

pub(crate) async fn birth(records: &Records, args: HeadcountArgs) -> OpResult {
    let head_count = required(
        args.head_count.filter(|n| *n > 0),
        "Quantos animais nasceram?",
    )?;
    let date = resolve_date(args.date.as_deref())?;
    let requested = args
        .category
        .as_deref()
        .and_then(category_code)
        .unwrap_or("BEZERRA");
    let category = category_for(records, Some(requested)).await?;

    let arrival = Arrival {
        birth_date: Some(date),
        mother_id: args.mother_id,
        ..Arrival::default()
    };
    let created = add_animals(records, &category, head_count, &arrival).await?;
    record_event(
        records,
        event(
            EventType::Birth,
            date,
            format!("Nascimento de {head_count} {}", category.name),
            Some(&category),
            ids(&created),
        ),
    )
    .await;

    info!(head_count, category = %category.code, "Birth recorded");
    Ok(OperationOutcome::ok_with(
        format!(
            "Nascimento registrado: {head_count} {} em {}.",
            category.name,
            display_date(date)
        ),
        json!({ "category": category.code, "animalsCreated": created.len(), "animalIds": ids(&created) }),
    ))
}

pub(crate) async fn inventory(records: &Records, args: HeadcountArgs) -> OpResult {
    let head_count = required(
        args.head_count.filter(|n| *n > 0),
        "Quantos animais você quer registrar?",
    )?;
    let date = resolve_date(args.date.as_deref())?;
    let category = category_for(records, args.category.as_deref()).await?;

    let created = add_animals(records, &category, head_count, &Arrival::default()).await?;
    record_event(
        records,
        event(
            EventType::Inventory,
            date,
            format!("Inventário de {head_count} {}", category.name),
            Some(&category),
            ids(&created),
        ),
    )
    .await;

    info!(head_count, category = %category.code, "Inventory recorded");
    Ok(OperationOutcome::ok_with(
        format!(
            "Inventário registrado: {head_count} {} adicionados ao rebanho.",
            category.name
        ),
        json!({ "category": category.code, "animalsCreated": created.len(), "animalIds": ids(&created) }),
    ))
}

// ── Movement ─────────────────────────────────────────────────────────────

pub(crate) async fn movement(records: &Records, args: MovementArgs) -> OpResult {
    match args.kind.as_deref().map(normalize_code).as_deref() {
        Some("ENTRADA") => {
            inventory(
                records,
                HeadcountArgs {
                    head_count: args.head_count,
                    category: args.category,
                    mother_id: None,
                    date: args.date,
                },
            )
            .await
        }
        Some("TRANSFERENCIA") => transfer(records, args).await,
        _ => Err(reject(
            "Que tipo de movimentação foi? Use entrada ou transferência.",
        )),
    }
}

async fn transfer(records: &Records, args: MovementArgs) -> OpResult {
    let destination = required(args.destination, "Para qual pastagem os animais vão?")?;
    let date = resolve_date(args.date.as_deref())?;

    let pastures = records.load::<Pasture>().await?;
    let pasture = find_by_name(&pastures, &destination)
        .map(|i| pastures[i].clone())
        .ok_or_else(|| reject(format!("Não encontrei a pastagem {destination}.")))?;

    let mut animals = records.load::<Animal>().await?;
    let selected: Vec<usize> = if args.animal_ids.is_empty() {
        let head_count = required(
            args.head_count.filter(|n| *n > 0),
            "Quantos animais você quer transferir?",
        )?;
        let category = category_for(records, args.category.as_deref()).await?;
        herd::select_fifo(&animals, &category.id, head_count as usize)
    } else {
        let mut selected = Vec::new();
        for reference in &args.animal_ids {
            match herd::find_animal(&animals, reference) {
                Some(i) if animals[i].is_active() => selected.push(i),
                _ => {
                    return Err(reject(format!(
                        "O animal {reference} não está ativo no rebanho."
                    )));
                }
            }
        }
        selected
    };
    if selected.is_empty() {
        return Err(reject("Não há animais ativos para transferir."));
    }

    let now = Utc::now();
    for &i in &selected {
        animals[i].pasture = Some(pasture.name.clone());
        animals[i].updated_at = now;
    }
    records.save(&animals).await?;

    let moved: Vec<String> = selected.iter().map(|&i| animals[i].id.clone()).collect();
    records
        .append(Movement {
            id: new_id(),
            date,
            animal_ids: moved.clone(),
            to_pasture: pasture.name.clone(),
            quantity: moved.len() as u32,
            created_at: now,
        })
        .await?;
    record_event(
        records,
        event(
            EventType::Movement,
            date,
            format!("Transferência para {}", pasture.name),
            None,
            moved.clone(),
        ),
    )
    .await;

    info!(count = moved.len(), pasture = %pasture.name, "Animals transferred");
    Ok(OperationOutcome::ok_with(
        format!("{} animais transferidos para {}.", moved.len(), pasture.name),
        json!({ "pasture": pasture.name, "animalIds": moved }),
    ))
}

// ── Death and weighing ───────────────────────────────────────────────────

pub(crate) async fn death(records: &Records, args: DeathArgs) -> OpResult {
    let reference = required(
        args.animal,
        "Qual animal morreu? Informe o brinco ou o identificador.",
    )?;
    let date = resolve_date(args.date.as_deref())?;
    let cause = args
        .cause
        .unwrap_or_else(|| "Causa não informada".to_string());

    let mut animals = records.load::<Animal>().await?;
    let i = herd::find_animal(&animals, &reference)
        .ok_or_else(|| reject(format!("Não encontrei o animal {reference}.")))?;
    if !animals[i].is_active() {
        return Err(reject(format!(
            "O animal {} não está ativo no rebanho.",
            animals[i].tag_number
        )));
    }

    let animal = &mut animals[i];
    animal.status = AnimalStatus::Dead;
    animal.exit_date = Some(date);
    animal.death_cause = Some(cause.clone());
    animal.updated_at = Utc::now();
    let (id, tag, category_id) = (
        animal.id.clone(),
        animal.tag_number.clone(),
        animal.category_id.clone(),
    );
    records.save(&animals).await?;

    let mut death_event = event(
        EventType::Death,
        date,
        format!("Morte de {tag}: {cause}"),
        None,
        vec![id.clone()],
    );
    death_event.category_id = Some(category_id);
    record_event(records, death_event).await;

    info!(animal = %tag, "Death recorded");
    Ok(OperationOutcome::ok_with(
        format!("Morte registrada: {tag} ({cause})."),
        json!({ "animalId": id, "tagNumber": tag, "cause": cause }),
    ))
}

pub(crate) async fn weighing(records: &Records, args: WeighingArgs) -> OpResult {
    let reference = required(args.animal, "Qual animal foi pesado?")?;
    let weight_kg = required(
        args.weight_kg.filter(|kg| *kg > 0.0),
        "Qual foi o peso do animal em kg?",
    )?;
    let date = resolve_date(args.date.as_deref())?;

    let mut animals = records.load::<Animal>().await?;
    let i = herd::find_animal(&animals, &reference)
        .ok_or_else(|| reject(format!("Não encontrei o animal {reference}.")))?;

    let grams = herd::kg_to_grams(weight_kg);
    let animal = &mut animals[i];
    animal.current_weight = Some(grams);
    animal.updated_at = Utc::now();
    let (id, tag, category_id) = (
        animal.id.clone(),
        animal.tag_number.clone(),
        animal.category_id.clone(),
    );
    records.save(&animals).await?;

    let mut weighing_event = event(
        EventType::Weighing,
        date,
        format!("Pesagem de {tag}"),
        None,
        vec![id.clone()],
    );
    weighing_event.category_id = Some(category_id);
    weighing_event.weight = Some(grams);
    record_event(records, weighing_event).await;

    info!(animal = %tag, grams, "Weighing recorded");
    Ok(OperationOutcome::ok_with(
        format!(
            "Pesagem registrada: {tag} com {} kg ({} @).",
            format_decimal(weight_kg, 1),
            format_decimal(weight_kg / KG_PER_ARROBA, 1)
        ),
        json!({ "animalId": id, "tagNumber": tag, "weight": grams }),
    ))
}
