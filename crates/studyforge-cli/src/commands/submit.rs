//! The `studyforge submit` command.

use std::path::PathBuf;

use anyhow::Result;

use studyforge_core::model::SessionId;

use super::{build_engine, print_verdict};

pub async fn execute(
    index: u32,
    answer: String,
    session: String,
    json: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(!answer.trim().is_empty(), "answer must not be empty");

    let (_, engine) = build_engine(config_path.as_deref()).await?;
    let outcome = engine
        .submit(&SessionId::new(session), index, &answer)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_verdict(&outcome.verdict, outcome.recorded);
    }

    Ok(())
}
