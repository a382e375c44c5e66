//! The `studyforge generate` command.

use std::path::PathBuf;

use anyhow::Result;

use studyforge_core::model::SessionId;

use super::{build_engine, print_exam, warn_if_ephemeral};

pub async fn execute(
    document: PathBuf,
    session: String,
    json: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(
        document.exists(),
        "document not found: {}",
        document.display()
    );

    let (config, engine) = build_engine(config_path.as_deref()).await?;
    warn_if_ephemeral(&config);

    let session = SessionId::new(session);
    let exam = engine.generate_from_document(&session, &document).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&exam)?);
    } else {
        println!(
            "Generated {} question(s) for session '{session}' (valid for {} min):\n",
            exam.len(),
            config.exam_ttl_secs / 60
        );
        print_exam(&exam);
        println!("Answer with: studyforge submit --index <n> --answer <text>");
    }

    Ok(())
}
