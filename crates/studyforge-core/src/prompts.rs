//! Prompt templates for exam generation and grading.

use crate::model::QuestionPlan;

/// System prompt for the exam generator, sized to `plan`.
pub fn generation_system_prompt(plan: &QuestionPlan) -> String {
    let total = plan.total();
    format!(
        "You are an education expert. Based on the study material provided, write {mc} \
         single-answer multiple-choice question(s) and {sa} short-answer question(s).\n\
         Respond ONLY with a JSON list of {total} objects. Every object must contain:\n\
         - \"index\": the question number, 1 to {total}\n\
         - \"type\": \"multiple-choice\" or \"short-answer\"\n\
         - \"question\": the question text\n\
         - \"options\": the answer choices for multiple-choice questions, each prefixed \
         with its letter (\"A. ...\"); an empty list for short-answer questions\n\
         - \"answer\": the correct letter for multiple-choice questions, or the key \
         points of a reference answer for short-answer questions\n\
         - \"analysis\": an in-depth explanation of the concept being tested",
        mc = plan.multiple_choice,
        sa = plan.short_answer,
    )
}

/// User prompt carrying the study material.
pub fn generation_user_prompt(material: &str) -> String {
    format!("Study material:\n{material}")
}

/// System prompt for the grader.
pub const GRADING_SYSTEM_PROMPT: &str = "You are a rigorous examiner. Judge the user's answer against the reference answer. \
Respond ONLY with a JSON object containing: \"is_correct\" (boolean), \"score\" (integer from 0 to 100) \
and \"feedback\" (detailed suggestions for improvement).";

/// User prompt for grading one submission.
pub fn grading_user_prompt(question: &str, reference_answer: &str, user_answer: &str) -> String {
    format!("Question: {question}\nReference answer: {reference_answer}\nUser answer: {user_answer}")
}
