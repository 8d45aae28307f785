//! `agromie op`: Run one domain operation without the model.

use super::runtime::Runtime;

pub async fn run(name: &str, args: &str) -> Result<(), Box<dyn std::error::Error>> {
    let args: serde_json::Value =
        serde_json::from_str(args).map_err(|e| format!("Arguments must be a JSON object: {e}"))?;
    if !args.is_object() {
        return Err("Arguments must be a JSON object".into());
    }

    let runtime = Runtime::load().await?;
    let outcome = runtime.executor.execute(name, &args).await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if !outcome.success {
        std::process::exit(1);
    }
    Ok(())
}
