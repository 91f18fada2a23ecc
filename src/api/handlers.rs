use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use log::{debug, info};
use serde::Serialize;

use crate::api::errors::ApiError;
use crate::storage::{Artist, ArtistDraft, ArtistStorage};

/// Largest page `GET /artists` will return.
pub const MAX_PAGE_SIZE: i64 = 10;

/// Raw `start`/`count` query values. Kept as strings so that garbage input
/// degrades to defaults instead of rejecting the request.
#[derive(Debug, Default)]
pub struct ListParams {
    /// Rows to skip
    pub start: Option<String>,
    /// Page size
    pub count: Option<String>,
}

impl ListParams {
    /// Builds params from decoded query pairs. A repeated key keeps its first
    /// value; unknown keys are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = ListParams::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "start" => &mut params.start,
                "count" => &mut params.count,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        params
    }

    /// Returns `(start, count)` after clamping: `count` outside
    /// `1..=MAX_PAGE_SIZE` becomes `MAX_PAGE_SIZE`, negative `start` becomes 0.
    pub fn page(&self) -> (i64, i64) {
        let parse = |value: &Option<String>| {
            value
                .as_deref()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(0)
        };

        let mut count = parse(&self.count);
        if !(1..=MAX_PAGE_SIZE).contains(&count) {
            count = MAX_PAGE_SIZE;
        }
        let start = parse(&self.start).max(0);
        (start, count)
    }
}

/// Body of a successful delete
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// Always `successfully deleted`
    pub result: &'static str,
}

fn parse_artist_id(path: Result<Path<String>, PathRejection>) -> Result<i64, ApiError> {
    let Path(raw) = path.map_err(|rejection| {
        debug!("Rejected artist id: {rejection}");
        ApiError::InvalidArtistId
    })?;
    parse_id_segment(&raw)
}

fn parse_id_segment(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or(ApiError::InvalidArtistId)
}

fn decode_draft(
    payload: Result<Json<ArtistDraft>, JsonRejection>,
) -> Result<ArtistDraft, ApiError> {
    match payload {
        Ok(Json(draft)) => Ok(draft),
        Err(rejection) => {
            debug!("Rejected artist payload: {rejection}");
            Err(ApiError::InvalidRequest)
        }
    }
}

/// `GET /`
pub async fn liveness() -> &'static str {
    "API Connected"
}

/// `GET /artists?start=&count=`
pub async fn list_artists(
    State(storage): State<Arc<ArtistStorage>>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<Vec<Artist>>, ApiError> {
    let params = match query {
        Ok(Query(pairs)) => ListParams::from_pairs(pairs),
        Err(rejection) => {
            debug!("Ignoring unreadable list query: {rejection}");
            ListParams::default()
        }
    };
    let (start, count) = params.page();
    let artists = storage.list(start, count).await?;
    Ok(Json(artists))
}

/// `GET /artist/{id}`
pub async fn get_artist(
    State(storage): State<Arc<ArtistStorage>>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Artist>, ApiError> {
    let id = parse_artist_id(path)?;
    let artist = storage.get(id).await?;
    Ok(Json(artist))
}

/// `POST /artist`
pub async fn create_artist(
    State(storage): State<Arc<ArtistStorage>>,
    payload: Result<Json<ArtistDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Artist>), ApiError> {
    let draft = decode_draft(payload)?;
    let artist = storage.create(&draft).await?;
    info!("Created artist {} ({})", artist.id, artist.name);
    Ok((StatusCode::CREATED, Json(artist)))
}

/// `PUT /artist/{id}`; the path id wins over any id in the body
pub async fn update_artist(
    State(storage): State<Arc<ArtistStorage>>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<ArtistDraft>, JsonRejection>,
) -> Result<Json<Artist>, ApiError> {
    let id = parse_artist_id(path)?;
    let draft = decode_draft(payload)?;
    let artist = storage.update(id, &draft).await?;
    info!("Updated artist {id}");
    Ok(Json(artist))
}

/// `DELETE /artist/{id}`
pub async fn delete_artist(
    State(storage): State<Arc<ArtistStorage>>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = parse_artist_id(path)?;
    storage.delete(id).await?;
    info!("Deleted artist {id}");
    Ok(Json(DeleteResponse {
        result: "successfully deleted",
    }))
}
