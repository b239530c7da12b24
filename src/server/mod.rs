use axum::{
    routing::get,
    Router,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use crate::repository::QuestionRepository;

pub mod routes;

/// Server state. Requests take turns on the one repository (and its single
/// SQLite connection).
pub struct AppState {
    pub repository: Mutex<QuestionRepository>,
}

impl AppState {
    pub fn new(repository: QuestionRepository) -> Arc<Self> {
        Arc::new(Self {
            repository: Mutex::new(repository),
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/teacher/questions",
            get(routes::list_questions).post(routes::create_question),
        )
        .route(
            "/api/teacher/question/{id}",
            get(routes::get_question)
                .put(routes::update_question)
                .delete(routes::delete_question),
        )
        .route("/api/teacher/statistics", get(routes::get_statistics))
        .route("/api/practice/topics", get(routes::get_topics))
        .route("/api/practice/random-question", get(routes::get_random_question))
        .route("/api/vocabulary", get(routes::get_vocabulary))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(addr: &str, repository: QuestionRepository) -> anyhow::Result<()> {
    let app = router(AppState::new(repository));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Starting server on {}", listener.local_addr()?);
    println!("🌍 Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
