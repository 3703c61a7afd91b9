use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use santa_core::{
    format_deadline, DeadlineStatus, GameError, LeaderboardEntry, ParticipantName, Party, Score,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

pub mod config;
pub mod console;

/// Shared handle to the one party this server hosts.
#[derive(Clone, Default)]
pub struct AppState {
    party: Arc<RwLock<Party>>,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/participants", get(list_participants).post(add_participant))
        .route("/participants/:name", delete(remove_participant))
        .route("/draw", post(run_draw))
        .route("/reveal-santa", post(reveal_santa))
        .route("/challenges", post(record_challenge))
        .route("/leaderboard", get(leaderboard))
        .route(
            "/deadline",
            get(get_deadline).post(set_deadline).delete(clear_deadline),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Everything a handler can fail with, on its way out as an HTTP response.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Game(#[from] GameError),
    #[error("invalid request body: {0}")]
    Body(#[from] JsonRejection),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        let ApiError::Game(err) = self else {
            return StatusCode::BAD_REQUEST;
        };
        match err {
            GameError::DuplicateParticipant(_) => StatusCode::CONFLICT,
            GameError::UnknownParticipant(_) | GameError::RevealNotAvailable(_) => {
                StatusCode::NOT_FOUND
            }
            GameError::InvalidName
            | GameError::InsufficientParticipants
            | GameError::DrawExhausted { .. }
            | GameError::DeadlinePassed
            | GameError::InvalidDateFormat(_) => StatusCode::BAD_REQUEST,
        }
    }
}

// The web front-end reads `error`; other clients read `message`.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let text = self.to_string();
        (
            self.status(),
            Json(ErrorResponse {
                message: text.clone(),
                error: text,
            }),
        )
            .into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    message: String,
    error: String,
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

// Missing and null fields both read as blank and fail core validation.
#[derive(Deserialize)]
struct NameRequest {
    #[serde(default)]
    name: Option<String>,
}

impl NameRequest {
    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

#[derive(Serialize)]
struct RosterResponse {
    message: String,
    participants: Vec<ParticipantName>,
}

#[derive(Deserialize)]
struct DrawParams {
    seed: Option<u64>,
}

#[derive(Serialize)]
struct RevealResponse {
    giver: ParticipantName,
    receiver: ParticipantName,
}

#[derive(Deserialize)]
struct ChallengeRequest {
    #[serde(default)]
    participant_name: Option<String>,
    #[serde(default)]
    points: Option<Score>,
}

#[derive(Serialize)]
struct ChallengeResponse {
    message: String,
    score: Score,
    challenge_scores: HashMap<ParticipantName, Score>,
}

#[derive(Deserialize)]
struct DeadlineRequest {
    #[serde(default)]
    deadline: Option<String>,
}

#[derive(Serialize)]
struct DeadlineSetResponse {
    message: String,
    deadline: String,
}

async fn list_participants(State(state): State<AppState>) -> Json<Vec<ParticipantName>> {
    Json(state.party.read().await.participants().to_vec())
}

async fn add_participant(
    State(state): State<AppState>,
    payload: Result<Json<NameRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let mut party = state.party.write().await;
    let name = party.add_participant(payload.name())?;
    log::info!("[ROSTER] added {name}");

    Ok((
        StatusCode::CREATED,
        Json(RosterResponse {
            message: format!("'{name}' joined the party."),
            participants: party.participants().to_vec(),
        }),
    ))
}

async fn remove_participant(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<RosterResponse>, ApiError> {
    let mut party = state.party.write().await;
    let name = party.remove_participant(&name)?;
    log::info!("[ROSTER] removed {name}");

    Ok(Json(RosterResponse {
        message: format!("'{name}' left the party."),
        participants: party.participants().to_vec(),
    }))
}

// Pairs never appear in the response; givers look theirs up one at a time
// through /reveal-santa.
async fn run_draw(
    State(state): State<AppState>,
    Query(params): Query<DrawParams>,
) -> Result<Json<MessageResponse>, ApiError> {
    let mut rng = params
        .seed
        .map(ChaCha8Rng::seed_from_u64)
        .unwrap_or_else(ChaCha8Rng::from_entropy);

    let mut party = state.party.write().await;
    if let Err(err) = party.draw(&mut rng) {
        log::warn!("[DRAW] failed: {err}");
        return Err(err.into());
    }
    log::info!("[DRAW] completed for {} participants", party.participants().len());

    Ok(Json(MessageResponse {
        message: "Secret Santa draw completed!".to_string(),
    }))
}

async fn reveal_santa(
    State(state): State<AppState>,
    payload: Result<Json<NameRequest>, JsonRejection>,
) -> Result<Json<RevealResponse>, ApiError> {
    let Json(payload) = payload?;
    let party = state.party.read().await;
    let receiver = party.reveal(payload.name())?;

    Ok(Json(RevealResponse {
        giver: payload.name().trim().to_string(),
        receiver: receiver.to_string(),
    }))
}

async fn record_challenge(
    State(state): State<AppState>,
    payload: Result<Json<ChallengeRequest>, JsonRejection>,
) -> Result<Json<ChallengeResponse>, ApiError> {
    let Json(payload) = payload?;
    let name = payload.participant_name.as_deref().unwrap_or_default();
    let points = payload.points.unwrap_or(1);
    let mut party = state.party.write().await;
    let score = party.record_challenge(name, points)?;
    let name = name.trim();
    log::info!("[CHALLENGE] {name} +{points} -> {score}");

    Ok(Json(ChallengeResponse {
        message: format!("'{name}' completed a challenge! Score: {score}"),
        score,
        challenge_scores: party.scores().clone(),
    }))
}

async fn leaderboard(State(state): State<AppState>) -> Json<Vec<LeaderboardEntry>> {
    Json(state.party.read().await.leaderboard())
}

async fn set_deadline(
    State(state): State<AppState>,
    payload: Result<Json<DeadlineRequest>, JsonRejection>,
) -> Result<Json<DeadlineSetResponse>, ApiError> {
    let Json(payload) = payload?;
    let text = payload.deadline.as_deref().unwrap_or_default();
    let deadline = state.party.write().await.set_deadline(text)?;
    let shown = format_deadline(deadline);
    log::info!("[DEADLINE] set to {shown}");

    Ok(Json(DeadlineSetResponse {
        message: format!("Challenge deadline set to {shown}."),
        deadline: shown,
    }))
}

async fn get_deadline(State(state): State<AppState>) -> Json<DeadlineStatus> {
    Json(state.party.read().await.deadline_status())
}

async fn clear_deadline(State(state): State<AppState>) -> Json<DeadlineStatus> {
    let mut party = state.party.write().await;
    party.clear_deadline();
    log::info!("[DEADLINE] cleared");
    Json(party.deadline_status())
}
