//! The `studyforge init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("studyforge.toml").exists() {
        println!("studyforge.toml already exists, skipping.");
        return Ok(());
    }

    std::fs::write("studyforge.toml", SAMPLE_CONFIG)?;
    println!("Created studyforge.toml");

    println!("\nNext steps:");
    println!("  1. Export DEEPSEEK_API_KEY (or edit studyforge.toml)");
    println!("  2. Run: studyforge quiz --document notes.md");
    println!("  3. For separate generate/submit commands, switch [store] to redis");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# studyforge configuration

default_provider = "deepseek"
default_model = "deepseek-chat"
temperature = 0.5
max_tokens = 2048
exam_ttl_secs = 3600
max_context_chars = 3000

[providers.deepseek]
type = "openai"
api_key = "${DEEPSEEK_API_KEY}"
base_url = "https://api.deepseek.com"

[providers.ollama]
type = "ollama"
base_url = "http://localhost:11434"

[plan]
multiple_choice = 2
short_answer = 1

[store]
type = "memory"
# type = "redis"
# url = "redis://127.0.0.1:6379"
"#;
