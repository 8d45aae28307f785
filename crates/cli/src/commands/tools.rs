//! `agromie tools`: List the tool catalog.

use super::runtime::Runtime;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let runtime = Runtime::load().await?;
    let registry = runtime.registry();

    println!("Ferramentas disponíveis");
    println!("=======================");
    for def in registry.definitions() {
        println!("  {:<16} {}", def.name, def.description);
    }
    Ok(())
}
