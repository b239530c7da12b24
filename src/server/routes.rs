use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use crate::question::{BloomLevel, DifficultyLevel, QuestionFilter, QuestionInput, QuestionRecord, QuestionType};
use crate::server::AppState;
use crate::storage::TopicRef;
use crate::{Envelope, Error, ErrorKind, Result};
use std::sync::Arc;

pub type ApiResponse<T> = (StatusCode, Json<Envelope<T>>);

#[derive(Deserialize)]
pub struct RandomParams {
    /// Comma-separated `Subject:Topic` list, or `all`
    pub topics: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuestionList {
    pub questions: Vec<QuestionRecord>,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Vocabulary {
    pub question_types: Vec<String>,
    pub difficulty_levels: Vec<String>,
    pub bloom_levels: Vec<String>,
}

fn respond<T: Serialize>(result: Result<T>, message: impl FnOnce(&T) -> String) -> ApiResponse<T> {
    let envelope = Envelope::from_result(result, message);
    let status = match envelope.error_kind {
        None => StatusCode::OK,
        Some(ErrorKind::Validation) => StatusCode::BAD_REQUEST,
        Some(ErrorKind::NotFound) => StatusCode::NOT_FOUND,
        Some(ErrorKind::Storage) | Some(ErrorKind::Inconsistent) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if let Some(kind) = envelope.error_kind {
        tracing::warn!("Request failed ({}): {}", kind, envelope.message);
    }
    (status, Json(envelope))
}

/// Unparseable paths and bodies get the same error envelope as any other
/// validation failure
fn rejected<T: Serialize>(body_text: String) -> ApiResponse<T> {
    respond(Err(Error::Validation(body_text)), |_| String::new())
}

pub async fn list_questions(
    State(state): State<Arc<AppState>>,
    filter: std::result::Result<Query<QuestionFilter>, QueryRejection>,
) -> ApiResponse<QuestionList> {
    let Query(filter) = match filter {
        Ok(filter) => filter,
        Err(rejection) => return rejected(rejection.body_text()),
    };
    let repository = state.repository.lock().await;
    let result = repository.list(&filter).map(|questions| QuestionList {
        total: questions.len(),
        questions,
    });
    respond(result, |list| format!("Found {} questions", list.total))
}

pub async fn create_question(
    State(state): State<Arc<AppState>>,
    input: std::result::Result<Json<QuestionInput>, JsonRejection>,
) -> ApiResponse<crate::Added> {
    let Json(input) = match input {
        Ok(input) => input,
        Err(rejection) => return rejected(rejection.body_text()),
    };
    let repository = state.repository.lock().await;
    respond(repository.add(input), |added| {
        format!("Question added successfully (ID: {})", added.id)
    })
}

pub async fn get_question(
    State(state): State<Arc<AppState>>,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> ApiResponse<crate::Question> {
    let Path(id) = match id {
        Ok(id) => id,
        Err(rejection) => return rejected(rejection.body_text()),
    };
    let repository = state.repository.lock().await;
    respond(repository.get(id), |question| format!("Question {}", question.record.id))
}

pub async fn update_question(
    State(state): State<Arc<AppState>>,
    id: std::result::Result<Path<i64>, PathRejection>,
    input: std::result::Result<Json<QuestionInput>, JsonRejection>,
) -> ApiResponse<crate::Updated> {
    let (Path(id), Json(input)) = match (id, input) {
        (Ok(id), Ok(input)) => (id, input),
        (Err(rejection), _) => return rejected(rejection.body_text()),
        (_, Err(rejection)) => return rejected(rejection.body_text()),
    };
    let repository = state.repository.lock().await;
    respond(repository.update(id, input), |updated| {
        format!("Question {} updated successfully", updated.id)
    })
}

pub async fn delete_question(
    State(state): State<Arc<AppState>>,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> ApiResponse<crate::Deleted> {
    let Path(id) = match id {
        Ok(id) => id,
        Err(rejection) => return rejected(rejection.body_text()),
    };
    let repository = state.repository.lock().await;
    respond(repository.delete(id), |deleted| {
        format!("Question {} deleted successfully", deleted.id)
    })
}

pub async fn get_statistics(State(state): State<Arc<AppState>>) -> ApiResponse<crate::storage::BankStats> {
    let repository = state.repository.lock().await;
    respond(repository.statistics(), |stats| {
        format!("{} questions in the bank", stats.total_questions)
    })
}

pub async fn get_topics(State(state): State<Arc<AppState>>) -> ApiResponse<Vec<crate::storage::TopicSummary>> {
    let repository = state.repository.lock().await;
    respond(repository.topics(), |topics| format!("Found {} topics", topics.len()))
}

pub async fn get_random_question(
    State(state): State<Arc<AppState>>,
    params: std::result::Result<Query<RandomParams>, QueryRejection>,
) -> ApiResponse<crate::Question> {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => return rejected(rejection.body_text()),
    };
    let topics = match parse_topics(params.topics.as_deref()) {
        Ok(topics) => topics,
        Err(e) => return respond(Err(e), |_| String::new()),
    };

    let repository = state.repository.lock().await;
    respond(repository.random_question(&topics), |question| {
        format!("Question {}", question.record.id)
    })
}

pub async fn get_vocabulary() -> ApiResponse<Vocabulary> {
    let vocabulary = Vocabulary {
        question_types: QuestionType::all().iter().map(|t| t.as_str().to_string()).collect(),
        difficulty_levels: DifficultyLevel::all().iter().map(|d| d.as_str().to_string()).collect(),
        bloom_levels: BloomLevel::all().iter().map(|b| b.as_str().to_string()).collect(),
    };
    respond(Ok(vocabulary), |_| "Vocabulary".to_string())
}

/// `None`, blank and `all` mean every topic
pub fn parse_topics(raw: Option<&str>) -> Result<Vec<TopicRef>> {
    match raw.map(str::trim) {
        None | Some("") | Some("all") => Ok(Vec::new()),
        Some(list) => list
            .split(',')
            .filter(|t| !t.trim().is_empty())
            .map(|topic| topic.parse::<TopicRef>())
            .collect(),
    }
}
