//! `agromie balance`: Stocking balance and financial metrics.

use agromie_domain::format::{format_brl, format_decimal, format_percent};
use chrono::NaiveDate;

use super::runtime::Runtime;

fn parse_date(raw: Option<&str>) -> Result<Option<NaiveDate>, Box<dyn std::error::Error>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| format!("Invalid date '{raw}': {e}"))?;
    Ok(Some(date))
}

pub async fn run(start: Option<&str>, end: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    let runtime = Runtime::load().await?;

    let stocking = runtime.executor.stocking_balance().await?;
    println!("Lotação");
    println!("=======");
    println!("  Área produzindo:  {} ha", format_decimal(stocking.total_area, 1));
    println!("  Capacidade:       {} UA", format_decimal(stocking.capacity_ua, 1));
    println!("  Atual:            {} UA", format_decimal(stocking.current_ua, 1));
    println!("  Taxa de lotação:  {}", format_percent(stocking.ratio));
    println!("  Situação:         {}", stocking.status.label());
    for pasture in &stocking.pastures {
        println!(
            "    - {}: {} UA (~{} animais)",
            pasture.name,
            format_decimal(pasture.estimated_ua, 1),
            pasture.estimated_animals
        );
    }

    let metrics = runtime.executor.financial_metrics(start, end).await?;
    println!();
    println!("Financeiro");
    println!("==========");
    println!("  Receita bruta:      {}", format_brl(metrics.gross_revenue));
    println!("  Custos:             {}", format_brl(metrics.total_costs));
    println!("  Lucro operacional:  {}", format_brl(metrics.operating_profit));
    println!("  Investimentos:      {}", format_brl(metrics.investments));
    println!("  Retiradas:          {}", format_brl(metrics.withdrawals));
    println!(
        "  Lucro líquido:      {} ({})",
        format_brl(metrics.net_profit),
        format_percent(metrics.net_margin)
    );

    Ok(())
}
