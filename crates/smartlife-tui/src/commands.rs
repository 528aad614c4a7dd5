//! One-shot subcommands that hit the backend and print to stdout.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use colored::*;
use smartlife_core::session::CATEGORIES_ERROR;
use smartlife_core::{BackendClient, ChatRole, Config, Session, Settings, FALLBACK_REPLY};

pub async fn list_categories(client: &BackendClient) -> Result<()> {
    let categories = client.fetch_categories().await.context(CATEGORIES_ERROR)?;

    println!("\n{}", "📂 Categories".bold().blue());
    println!("{}", "=".repeat(30).dimmed());

    if categories.is_empty() {
        println!("{}", "The backend returned no categories".yellow());
    }
    for category in categories {
        println!(
            "  • {} {}",
            category.category_name.green(),
            format!("({})", category.category_id).dimmed()
        );
    }

    Ok(())
}

pub async fn list_questions(client: &BackendClient, category_id: &str) -> Result<()> {
    let questions = client
        .fetch_preset_questions(category_id)
        .await
        .context("Failed to load preset questions")?;

    println!("\n{}", format!("❓ Questions in {category_id}").bold().blue());
    println!("{}", "=".repeat(30).dimmed());

    if questions.is_empty() {
        println!("{}", "No preset questions for this category".yellow());
    }
    for question in questions {
        println!(
            "  • {} {}",
            question.preset_question,
            format!("[{}]", question.knowledge_id).dimmed()
        );
    }

    Ok(())
}

pub async fn ask_knowledge(
    client: &BackendClient,
    settings: &Settings,
    knowledge_id: &str,
) -> Result<()> {
    let answer = client
        .fetch_knowledge_answer(knowledge_id)
        .await
        .context("Knowledge API error")?
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| FALLBACK_REPLY.to_string());

    println!("{}", format!("{}:", settings.assistant_name).bold().magenta());
    println!("{answer}");
    Ok(())
}

/// Single chat turn from a fresh session (history is just the greeting).
pub async fn chat_once(client: &BackendClient, settings: &Settings, prompt: &str) -> Result<()> {
    let mut session = Session::new(&settings.user_name);
    session.set_input(prompt);
    let request = session
        .submit_chat()
        .ok_or_else(|| anyhow!("Nothing to send: the prompt is blank"))?;

    session.apply(request.run(client).await);

    if let Some(error) = session.error() {
        return Err(anyhow!("{error}"));
    }

    for msg in session.transcript().iter().skip(1) {
        let label = match msg.role {
            ChatRole::User => format!("{}:", settings.user_name).bold().green(),
            ChatRole::Assistant => format!("{}:", settings.assistant_name).bold().magenta(),
        };
        println!("{label}");
        println!("{}\n", msg.content);
    }
    Ok(())
}

pub fn show_config(path: &Path, settings: &Settings, init: bool) -> Result<()> {
    if init {
        if path.exists() {
            println!("{} {}", "Config already exists:".yellow(), path.display());
        } else {
            Config::with_defaults().save_to(path)?;
            println!("{} {}", "Wrote".green(), path.display());
        }
    }

    println!("\n{}", "⚙️  Settings".bold().blue());
    println!("{}", "=".repeat(30).dimmed());
    println!("  config file     {}", path.display().to_string().dimmed());
    println!("  base_url        {}", settings.base_url.cyan());
    println!("  user_id         {}", settings.user_id);
    println!("  user_name       {}", settings.user_name);
    println!("  assistant_name  {}", settings.assistant_name);
    match settings.request_timeout {
        Some(timeout) => println!("  timeout         {}s", timeout.as_secs()),
        None => println!("  timeout         {}", "none".dimmed()),
    }
    Ok(())
}
