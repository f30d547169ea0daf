use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db::operations::practice;
use crate::response::AppError;
use crate::state::AppState;

const REWARD_POINTS_CORRECT: i32 = 10;

#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    student_id: Option<String>,
    session_id: Option<String>,
    question_id: Option<String>,
    answer: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitAnswerResponse {
    #[serde(rename = "nextQuestion", skip_serializing_if = "Option::is_none")]
    next_question: Option<practice::NextQuestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    correct_answer: String,
    #[serde(rename = "isCorrect")]
    is_correct: bool,
}

/// Grades one submitted answer, bumps session aggregates, and hands back the
/// next unanswered question or a completion signal.
pub async fn submit_answer(
    State(state): State<AppState>,
    Json(body): Json<SubmitAnswerRequest>,
) -> Result<Json<SubmitAnswerResponse>, AppError> {
    let student_id = require(body.student_id.as_deref(), "student_id")?;
    let session_id = require(body.session_id.as_deref(), "session_id")?;
    let question_id = require(body.question_id.as_deref(), "question_id")?;
    let answer = require(body.answer.as_deref(), "answer")?;

    let Some(db) = state.db_proxy() else {
        return Err(AppError::service_unavailable("Database not available"));
    };
    let pool = db.pool();

    let question = practice::get_question(pool, question_id)
        .await?
        .ok_or_else(|| AppError::not_found("Question not found"))?;

    if question.session_id != session_id {
        return Err(AppError::bad_request("Question does not belong to session"));
    }

    // Graded questions are terminal.
    if question.answered_correctly.is_some() {
        return Err(AppError::conflict("Question already answered"));
    }

    let (is_correct, reward) = grade_outcome(answer, &question.correct_option);

    let graded = practice::grade_question(pool, question_id, is_correct, reward, Utc::now()).await?;
    if !graded {
        // Lost the race against a concurrent submission for the same question.
        return Err(AppError::conflict("Question already answered"));
    }

    practice::increment_session_counters(pool, session_id, is_correct, reward).await?;

    tracing::debug!(
        student_id = %student_id,
        session_id = %session_id,
        question_id = %question_id,
        is_correct,
        "Practice answer graded"
    );

    let next = practice::next_unanswered_question(pool, session_id).await?;

    if next.is_none() {
        practice::complete_session(pool, session_id).await?;
    }

    Ok(Json(SubmitAnswerResponse {
        message: next.is_none().then_some("Session complete"),
        next_question: next,
        correct_answer: question.correct_option,
        is_correct,
    }))
}

/// Correct answers earn a fixed reward; wrong answers earn nothing.
fn grade_outcome(answer: &str, correct_option: &str) -> (bool, i32) {
    let is_correct = answer == correct_option;
    (is_correct, if is_correct { REWARD_POINTS_CORRECT } else { 0 })
}

fn require<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::missing_field(field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_answer_earns_fixed_reward() {
        assert_eq!(grade_outcome("B", "B"), (true, 10));
    }

    #[test]
    fn wrong_answer_earns_nothing() {
        assert_eq!(grade_outcome("A", "B"), (false, 0));
        assert_eq!(grade_outcome("", "B"), (false, 0));
    }

    #[test]
    fn completion_response_carries_message_not_next_question() {
        let response = SubmitAnswerResponse {
            next_question: None,
            message: Some("Session complete"),
            correct_answer: "B".to_string(),
            is_correct: true,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["message"], "Session complete");
        assert_eq!(json["correct_answer"], "B");
        assert_eq!(json["isCorrect"], true);
        assert!(json.get("nextQuestion").is_none());
    }

    #[test]
    fn mid_session_response_carries_next_question() {
        let response = SubmitAnswerResponse {
            next_question: Some(practice::NextQuestion {
                id: "q2".to_string(),
                position: 1,
                prompt: "What is 1/2 + 1/4?".to_string(),
                options: None,
            }),
            message: None,
            correct_answer: "B".to_string(),
            is_correct: false,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["nextQuestion"]["id"], "q2");
        assert_eq!(json["isCorrect"], false);
        assert!(json.get("message").is_none());
    }
}
