use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use link_common::{LinkEntity, NewLink, PgLinkStore, PositionUpdate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::error::ApiError;

/// The body of a request made to reorder part of a link set.
#[derive(Deserialize, Serialize, Debug, PartialEq, Clone)]
pub struct PositionsRequestBody {
    pub updates: Vec<PositionUpdate>,
}

#[instrument(skip(store))]
pub async fn list_links(
    State(store): State<PgLinkStore>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<LinkEntity>>, ApiError> {
    let links = store.list(user_id).await?;
    Ok(Json(links))
}

#[instrument(skip_all, fields(%user_id))]
pub async fn create_link(
    State(store): State<PgLinkStore>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<NewLink>,
) -> Result<(StatusCode, Json<LinkEntity>), ApiError> {
    debug!("received payload: {:?}", payload);

    let link = payload.validate()?;
    let created = store.create(user_id, &link).await?;

    info!(%user_id, link_id = %created.id, position = created.position, "created link");
    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(skip_all, fields(%user_id, %link_id))]
pub async fn update_link(
    State(store): State<PgLinkStore>,
    Path((user_id, link_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<NewLink>,
) -> Result<Json<LinkEntity>, ApiError> {
    debug!("received payload: {:?}", payload);

    let link = payload.validate()?;
    let updated = store.update(user_id, link_id, &link).await?;

    info!("updated link");
    Ok(Json(updated))
}

#[instrument(skip(store))]
pub async fn delete_link(
    State(store): State<PgLinkStore>,
    Path((user_id, link_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    store.delete(user_id, link_id).await?;

    info!(%user_id, %link_id, "deleted link");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip_all, fields(%user_id))]
pub async fn update_positions(
    State(store): State<PgLinkStore>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<PositionsRequestBody>,
) -> Result<StatusCode, ApiError> {
    debug!(%user_id, updates = payload.updates.len(), "received position batch");

    store.apply_positions(user_id, &payload.updates).await?;
    Ok(StatusCode::NO_CONTENT)
}
