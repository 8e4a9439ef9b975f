use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, FromRequestParts, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json,
};
use http::{request::Parts, StatusCode};
use shipyard_dal::{is_id_valid, CreateShip, ShipDraft, ShipFilter, ShipPatch, ShipRepository};
use tracing::debug;

use crate::{
    error::{ApiError, ApiResult},
    rest_api::Paging,
    state::AppState,
    validate::{rejected, Valid},
};

crate::repository_from_request!(ShipRepository);

/// Ship id taken from the path, rejected unless it is a positive integer.
#[derive(Debug, Clone, Copy)]
pub struct ShipId(pub i64);

impl FromRequestParts<AppState> for ShipId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(rejected)?;
        if is_id_valid(id) {
            Ok(ShipId(id))
        } else {
            Err(ApiError::InvalidInput(format!("Invalid ship id {id}")))
        }
    }
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "", tag = "Ship", operation_id = "listShips",
    params(ShipFilter, Paging),
    responses((status = StatusCode::OK, description = "Page of ships matching filter", body = Vec<shipyard_dal::Ship>))))]
pub async fn list(
    repository: ShipRepository,
    State(state): State<AppState>,
    filter: Result<Query<ShipFilter>, QueryRejection>,
    Valid(Query(paging)): Valid<Query<Paging>>,
) -> ApiResult<impl IntoResponse> {
    let Query(filter) = filter.map_err(rejected)?;
    debug!("Listing ships with {filter:?} and {paging:?}");
    let params = paging.into_listing_params(state.config().default_page_size);
    let ships = repository.list(&filter.predicate(), params).await?;
    Ok((StatusCode::OK, Json(ships)))
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/count", tag = "Ship", operation_id = "countShips",
    params(ShipFilter),
    responses((status = StatusCode::OK, description = "Number of ships matching filter", body = u64))))]
pub async fn count(
    repository: ShipRepository,
    filter: Result<Query<ShipFilter>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(filter) = filter.map_err(rejected)?;
    let count = repository.count(&filter.predicate()).await?;
    Ok((StatusCode::OK, Json(count)))
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "", tag = "Ship", operation_id = "createShip",
    request_body = CreateShip,
    responses((status = StatusCode::OK, description = "Created ship", body = shipyard_dal::Ship),
        (status = StatusCode::BAD_REQUEST, description = "Invalid ship"))))]
pub async fn create(
    repository: ShipRepository,
    payload: Result<Json<CreateShip>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload.map_err(rejected)?;
    let draft = ShipDraft::try_from(payload)?;
    let ship = repository.create(draft).await?;
    debug!("Created ship {}", ship.id);
    Ok((StatusCode::OK, Json(ship)))
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/{id}", tag = "Ship", operation_id = "getShip",
    responses((status = StatusCode::OK, description = "Ship", body = shipyard_dal::Ship),
        (status = StatusCode::NOT_FOUND, description = "No such ship"))))]
pub async fn get_ship(
    ShipId(id): ShipId,
    repository: ShipRepository,
) -> ApiResult<impl IntoResponse> {
    let ship = repository.get(id).await?;
    Ok((StatusCode::OK, Json(ship)))
}

#[cfg_attr(feature = "openapi", utoipa::path(put, path = "/{id}", tag = "Ship", operation_id = "updateShip",
    request_body = ShipPatch,
    responses((status = StatusCode::OK, description = "Updated ship", body = shipyard_dal::Ship),
        (status = StatusCode::BAD_REQUEST, description = "Invalid id or update"),
        (status = StatusCode::NOT_FOUND, description = "No such ship"))))]
pub async fn update(
    ShipId(id): ShipId,
    repository: ShipRepository,
    payload: Result<Json<ShipPatch>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(patch) = payload.map_err(rejected)?;
    // patch is validated after the ship is found
    let ship = repository.update(id, patch).await?;
    debug!("Updated ship {id}");
    Ok((StatusCode::OK, Json(ship)))
}

#[cfg_attr(feature = "openapi", utoipa::path(delete, path = "/{id}", tag = "Ship", operation_id = "deleteShip",
    responses((status = StatusCode::OK, description = "Ship deleted"),
        (status = StatusCode::NOT_FOUND, description = "No such ship"))))]
pub async fn delete(
    ShipId(id): ShipId,
    repository: ShipRepository,
) -> ApiResult<impl IntoResponse> {
    repository.delete(id).await?;
    debug!("Deleted ship {id}");
    Ok(StatusCode::OK)
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", get(list).post(create))
        .route("/count", get(count))
        .route(
            "/{id}",
            get(get_ship).post(update).put(update).delete(delete),
        )
}

#[cfg(feature = "openapi")]
#[derive(utoipa::OpenApi)]
#[openapi(paths(list, count, create, get_ship, update, delete))]
struct ApiDocs;

#[cfg(feature = "openapi")]
pub fn api_docs() -> utoipa::openapi::OpenApi {
    use utoipa::OpenApi as _;
    ApiDocs::openapi()
}
