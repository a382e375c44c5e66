//! The `studyforge quiz` command: generate, then answer each question in turn.

use std::path::PathBuf;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};

use studyforge_core::error::SubmitError;
use studyforge_core::matcher::effective_ordinal;
use studyforge_core::model::{Exam, SessionId};
use studyforge_core::StudyEngine;

use super::{build_engine, print_exam, print_verdict};

pub async fn execute(document: PathBuf, config_path: Option<PathBuf>) -> Result<()> {
    anyhow::ensure!(
        document.exists(),
        "document not found: {}",
        document.display()
    );

    let (_, engine) = build_engine(config_path.as_deref()).await?;
    let session = SessionId::random();
    let exam = engine.generate_from_document(&session, &document).await?;

    print_exam(&exam);

    let input = BufReader::new(tokio::io::stdin());
    let summary = answer_questions(&engine, &session, &exam, input).await?;

    if summary.graded == 0 {
        println!("No answers submitted.");
    } else {
        println!(
            "Answered {}/{}, average score {:.0}, {} added to the mistake book.",
            summary.graded,
            exam.len(),
            summary.total_score as f64 / summary.graded as f64,
            summary.missed
        );
    }

    Ok(())
}

#[derive(Debug, Default, PartialEq, Eq)]
struct QuizSummary {
    graded: u32,
    missed: u32,
    skipped: u32,
    total_score: u32,
}

/// Ask each question once, reading one answer line per question.
///
/// A question that cannot be matched is reported and skipped.
async fn answer_questions<R>(
    engine: &StudyEngine,
    session: &SessionId,
    exam: &Exam,
    input: R,
) -> Result<QuizSummary>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut stdout = tokio::io::stdout();
    let mut summary = QuizSummary::default();

    for (position, question) in exam.questions.iter().enumerate() {
        let label = effective_ordinal(question, position);
        let Ok(ordinal) = label.parse::<u32>() else {
            println!("Question {label} has no number to answer by, skipping.");
            summary.skipped += 1;
            continue;
        };

        stdout
            .write_all(format!("Answer for question {label} (empty to skip): ").as_bytes())
            .await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let answer = line.trim();
        if answer.is_empty() {
            summary.skipped += 1;
            continue;
        }

        let outcome = match engine.submit(session, ordinal, answer).await {
            Ok(outcome) => outcome,
            Err(SubmitError::QuestionNotFound { index }) => {
                println!("Question {index} could not be matched, skipping.\n");
                summary.skipped += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        print_verdict(&outcome.verdict, outcome.recorded);
        println!();

        summary.graded += 1;
        summary.total_score += u32::from(outcome.verdict.score.unwrap_or(100));
        if outcome.recorded {
            summary.missed += 1;
        }
    }

    Ok(summary)
}
