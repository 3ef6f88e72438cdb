use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use sqlx::PgPool;

use crate::error::ApiError;
use crate::models::{CreateRutina, RutinaDetail, UpdateRutina};
use crate::services::RutinaService;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub nombre: String,
}

pub fn rutina_routes(db: PgPool) -> Router {
    let service = RutinaService::new(db);

    Router::new()
        .route("/", get(list_rutinas).post(create_rutina))
        .route("/buscar/nombre", get(search_rutinas))
        .route(
            "/:rutina_id",
            get(get_rutina).put(update_rutina).delete(delete_rutina),
        )
        .with_state(service)
}

/// List every routine, newest first, with exercises included.
async fn list_rutinas(
    State(service): State<RutinaService>,
) -> Result<Json<Vec<RutinaDetail>>, ApiError> {
    let rutinas = service.list().await?;
    Ok(Json(rutinas))
}

/// Fetch a single routine with its exercises.
async fn get_rutina(
    State(service): State<RutinaService>,
    Path(rutina_id): Path<i32>,
) -> Result<Json<RutinaDetail>, ApiError> {
    let rutina = service
        .get(rutina_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no routine found with id {}", rutina_id)))?;

    Ok(Json(rutina))
}

/// Case-insensitive substring search on routine name. A non-matching
/// search returns an empty list, never an error.
async fn search_rutinas(
    State(service): State<RutinaService>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<RutinaDetail>>, ApiError> {
    let nombre = query.nombre.trim();
    if nombre.is_empty() {
        return Err(ApiError::Validation(
            "query parameter 'nombre' must not be empty".to_string(),
        ));
    }

    let rutinas = service.search_by_nombre(nombre).await?;
    Ok(Json(rutinas))
}

/// Create a routine, optionally with its initial exercises, in one
/// transaction.
async fn create_rutina(
    State(service): State<RutinaService>,
    Json(payload): Json<CreateRutina>,
) -> Result<(StatusCode, Json<RutinaDetail>), ApiError> {
    payload.validate()?;
    let rutina = service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(rutina)))
}

/// Update name/description and optionally replace the exercise set.
async fn update_rutina(
    State(service): State<RutinaService>,
    Path(rutina_id): Path<i32>,
    Json(payload): Json<UpdateRutina>,
) -> Result<Json<RutinaDetail>, ApiError> {
    payload.validate()?;
    let rutina = service.update(rutina_id, payload).await?;
    Ok(Json(rutina))
}

/// Delete a routine and, via the FK cascade, all of its exercises.
async fn delete_rutina(
    State(service): State<RutinaService>,
    Path(rutina_id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    service.delete(rutina_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
