//! `agromie onboard`: First-time setup.

use agromie_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("agromie — Configuração inicial");
    println!("==============================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Diretório criado: {}", config_dir.display());
    } else {
        println!("  Diretório existente: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("\n⚠️  Já existe configuração em: {}", config_path.display());
        println!("   Edite o arquivo ou apague-o e rode onboard de novo.\n");
        return Ok(());
    }

    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("✅ config.toml criado em: {}", config_path.display());
    println!("\nPróximos passos:");
    println!("   1. Defina OPENROUTER_API_KEY ou edite api_key em {}", config_path.display());
    println!("   2. Rode: agromie agent");
    println!("   3. Diga, por exemplo: \"vendi 50 bezerras por R$ 119.000\"\n");

    Ok(())
}
