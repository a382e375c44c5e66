//! The `studyforge mistakes` command.

use std::path::PathBuf;

use anyhow::Result;

use studyforge_core::model::MistakeRecord;
use studyforge_providers::config::load_config_from;

use super::open_store;

pub async fn execute(format: String, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let store = open_store(&config).await?;
    let mistakes = store.list_mistakes().await?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&mistakes)?),
        "table" => print_table(&mistakes),
        _ => print_text(&mistakes),
    }

    Ok(())
}

fn print_text(mistakes: &[MistakeRecord]) {
    if mistakes.is_empty() {
        println!("No mistakes recorded.");
        return;
    }

    println!("{} mistake(s), most recent first:\n", mistakes.len());
    for (i, m) in mistakes.iter().enumerate() {
        let when = m
            .recorded_at
            .map(|t| format!(" ({})", t.format("%Y-%m-%d %H:%M")))
            .unwrap_or_default();
        println!("{}.{when} {}", i + 1, m.question_text);
        println!("   Your answer:      {}", m.user_answer);
        println!("   Reference answer: {}", m.reference_answer);
        if !m.feedback.is_empty() {
            println!("   Feedback:         {}", m.feedback);
        }
        println!();
    }
}

fn print_table(mistakes: &[MistakeRecord]) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["#", "Question", "Your answer", "Reference", "Feedback"]);

    for (i, m) in mistakes.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&m.question_text),
            Cell::new(&m.user_answer),
            Cell::new(&m.reference_answer),
            Cell::new(&m.feedback),
        ]);
    }

    println!("{table}");
}
