//! `agromie agent`: One-shot or interactive farm commands.

use std::sync::Arc;

use agromie_agent::{Orchestrator, OrchestratorResult};
use agromie_config::AppConfig;
use agromie_core::error::ProviderError;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::runtime::Runtime;

pub async fn run(
    message: Option<String>,
    max_iterations: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = Runtime::load().await?;
    let config = &runtime.config;

    // No key configured: print setup instructions.
    let provider = match agromie_providers::build_from_config(config) {
        Ok(provider) => provider,
        Err(ProviderError::NotConfigured(reason)) => {
            print_key_help();
            return Err(format!("Provider not configured: {reason}").into());
        }
        Err(e) => return Err(e.into()),
    };
    let tools = Arc::new(runtime.registry());

    let mut orchestrator = Orchestrator::new(provider, &config.default_model, tools)
        .with_temperature(config.default_temperature)
        .with_max_tokens(config.default_max_tokens)
        .with_max_iterations(max_iterations.unwrap_or(config.agent.max_iterations));
    if let Some(custom) = &config.agent.system_prompt_override {
        orchestrator = orchestrator.with_system_prompt(custom);
    }

    if let Some(msg) = message {
        eprint!("  Pensando...");
        let result = orchestrator.process_message(&msg).await;
        eprint!("\r              \r");
        print_result(&result);
        if !result.success {
            std::process::exit(1);
        }
        return Ok(());
    }

    println!();
    println!("  agromie — modo interativo");
    println!();
    println!("  Provedor:  {}", config.default_provider);
    println!("  Modelo:    {}", config.default_model);
    println!();
    println!("  Digite um comando e pressione Enter. 'sair' ou Ctrl+D encerra.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            prompt()?;
            continue;
        }
        if matches!(line, "sair" | "exit" | "quit") {
            break;
        }

        eprint!("  ...");
        let result = orchestrator.process_message(line).await;
        eprint!("\r     \r");
        print_result(&result);
        prompt()?;
    }

    println!();
    println!("  Até logo!");
    println!();
    Ok(())
}

fn print_key_help() {
    eprintln!();
    eprintln!("  ERRO: nenhuma chave de API configurada!");
    eprintln!();
    eprintln!("  Defina uma destas variáveis de ambiente:");
    eprintln!("    OPENROUTER_API_KEY=sk-or-v1-...   (recomendado)");
    eprintln!("    OPENAI_API_KEY=sk-...");
    eprintln!("    AGROMIE_API_KEY=...");
    eprintln!();
    eprintln!("  Ou adicione api_key em:");
    eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
    eprintln!();
}

fn prompt() -> std::io::Result<()> {
    use std::io::Write;
    print!("  Você > ");
    std::io::stdout().flush()
}

fn print_result(result: &OrchestratorResult) {
    println!();
    for line in reply_lines(result) {
        println!("  {line}");
    }
    if !result.errors.is_empty() {
        tracing::debug!(errors = ?result.errors, "Run recorded errors");
    }
    println!();
}

/// The run's message, plus whatever the model said on its own when the
/// message alone does not carry it (capped or failed runs).
fn reply_lines(result: &OrchestratorResult) -> Vec<String> {
    let mut lines: Vec<String> = result
        .message
        .lines()
        .map(|line| format!("AgrOmie > {line}"))
        .collect();
    if let Some(text) = result
        .final_response_text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty() && *t != result.message.trim())
    {
        lines.push("Resposta do modelo:".to_string());
        lines.extend(text.lines().map(|line| format!("AgrOmie > {line}")));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use agromie_agent::RunState;

    fn result(state: RunState, message: &str, text: Option<&str>) -> OrchestratorResult {
        OrchestratorResult {
            success: state == RunState::Completed,
            message: message.to_string(),
            tool_call_count: 1,
            iteration_count: 2,
            final_response_text: text.map(str::to_string),
            errors: Vec::new(),
            state,
            transcript: Vec::new(),
        }
    }

    #[test]
    fn completed_run_prints_the_reply_once() {
        let lines = reply_lines(&result(RunState::Completed, "Pronto.", Some("Pronto.")));
        assert_eq!(lines, vec!["AgrOmie > Pronto."]);
    }

    #[test]
    fn capped_run_also_shows_model_text() {
        let lines = reply_lines(&result(
            RunState::Capped,
            "Executei parcialmente.",
            Some("Registrei a despesa de R$ 10,00."),
        ));
        assert_eq!(
            lines,
            vec![
                "AgrOmie > Executei parcialmente.",
                "Resposta do modelo:",
                "AgrOmie > Registrei a despesa de R$ 10,00.",
            ]
        );
    }

    #[test]
    fn blank_model_text_is_skipped() {
        let lines = reply_lines(&result(RunState::TransportFailed, "Falhou.", Some("  ")));
        assert_eq!(lines, vec!["AgrOmie > Falhou."]);
    }
}
