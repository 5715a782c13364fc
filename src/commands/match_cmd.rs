//! HTTP Commands for Match Management
//!
//! All three routes are admin-only. Storage failures are logged with full
//! detail here and answered with a generic message.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::{error, warn};

use super::error::ApiError;
use super::gate::AdminClaims;
use crate::domain::{Match, MatchView, NewMatch};
use crate::AppState;

/// List all matches, most recent first
pub async fn list_matches(
    State(state): State<AppState>,
    AdminClaims(_claims): AdminClaims,
) -> Result<Json<Vec<MatchView>>, ApiError> {
    state.matches.list_matches().await.map(Json).map_err(|e| {
        error!(error = %e, "GET /matches failed");
        ApiError::Retrieval("Could not fetch matches")
    })
}

/// Pair a lost item with a found item
pub async fn create_match(
    State(state): State<AppState>,
    AdminClaims(claims): AdminClaims,
    payload: Result<Json<NewMatch>, JsonRejection>,
) -> Result<(StatusCode, Json<Match>), ApiError> {
    let Json(new_match) = payload.map_err(|e| {
        warn!(error = %e, "POST /matches with invalid body");
        ApiError::BadRequest
    })?;

    let created = state.matches.create_match(new_match).await.map_err(|e| {
        error!(
            error = %e,
            admin = claims.subject.as_deref().unwrap_or("-"),
            lost_item_id = new_match.lost_item_id,
            found_item_id = new_match.found_item_id,
            "POST /matches failed"
        );
        ApiError::Mutation("Could not create match")
    })?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Remove a match and return both items to pending
pub async fn delete_match(
    State(state): State<AppState>,
    AdminClaims(claims): AdminClaims,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    // Ids are integers, so anything else cannot name a stored match.
    let Path(id) = id.map_err(|e| {
        warn!(error = %e, "DELETE /matches/{{id}} with invalid id");
        ApiError::NotFound("Match not found")
    })?;

    match state.matches.delete_match(id).await {
        Ok(_) => Ok(StatusCode::NO_CONTENT),
        Err(e) if e.is_not_found() => Err(ApiError::NotFound("Match not found")),
        Err(e) => {
            error!(
                error = %e,
                admin = claims.subject.as_deref().unwrap_or("-"),
                match_id = id,
                "DELETE /matches/{{id}} failed"
            );
            Err(ApiError::Mutation("Could not delete match"))
        }
    }
}
