use axum::{
    routing::{get, put},
    Router, Json, Extension,
    extract::{State, Path, Request, rejection::JsonRejection},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::application::mutation::{MutationCoordinator, MutationError};
use crate::domain::identity::AuthContext;
use crate::domain::pet::{NewPet, PetId, PetUpdate};
use crate::domain::repository::PetRepository;
use crate::infrastructure::auth::AuthResolver;

pub struct AppState {
    pub pets: Arc<dyn PetRepository>,
    pub mutations: Arc<MutationCoordinator>,
    pub auth: AuthResolver,
}

pub fn app(state: AppState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/api/pet/list", get(list_pets))
        .route("/api/pet/new", put(insert_pet))
        .route(
            "/api/pet/{pet_id}",
            get(get_pet).put(update_pet).delete(delete_pet),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            resolve_auth_context,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Resolve the auth context before routing and re-issue a verified cookie
/// credential on the way out.
async fn resolve_auth_context(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let resolved = state.auth.resolve(request.headers());
    request.extensions_mut().insert(resolved.context);

    let mut response = next.run(request).await;
    if let Some(cookie) = resolved.refreshed_cookie {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    response
}

async fn list_pets(State(state): State<Arc<AppState>>) -> Response {
    match state.pets.list_all().await {
        Ok(pets) => Json(pets).into_response(),
        Err(e) => {
            error!("Failed to list pets: {}", e);
            internal_error()
        }
    }
}

async fn get_pet(State(state): State<Arc<AppState>>, Path(pet_id): Path<String>) -> Response {
    let id = match parse_pet_id(&pet_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.pets.find_by_id(id).await {
        Ok(Some(pet)) => Json(pet).into_response(),
        Ok(None) => not_found(id),
        Err(e) => {
            error!("Failed to fetch pet {}: {}", id, e);
            internal_error()
        }
    }
}

async fn insert_pet(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    payload: Result<Json<NewPet>, JsonRejection>,
) -> Response {
    let Json(new_pet) = match payload {
        Ok(json) => json,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    match state
        .mutations
        .insert_pet(ctx.identity.as_ref(), new_pet)
        .await
    {
        Ok(pet) => Json(json!({ "message": "Pet inserted.", "petId": pet.id })).into_response(),
        Err(e) => mutation_error(e),
    }
}

async fn update_pet(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(pet_id): Path<String>,
    payload: Result<Json<PetUpdate>, JsonRejection>,
) -> Response {
    let id = match parse_pet_id(&pet_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let Json(update) = match payload {
        Ok(json) => json,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    match state
        .mutations
        .update_pet(ctx.identity.as_ref(), id, update)
        .await
    {
        Ok(()) => Json(json!({ "message": "Pet updated!", "petId": id })).into_response(),
        Err(e) => mutation_error(e),
    }
}

async fn delete_pet(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(pet_id): Path<String>,
) -> Response {
    let id = match parse_pet_id(&pet_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.mutations.delete_pet(ctx.identity.as_ref(), id).await {
        Ok(()) => Json(json!({ "message": "Pet Deleted!", "petId": id })).into_response(),
        Err(e) => mutation_error(e),
    }
}

fn parse_pet_id(raw: &str) -> Result<PetId, Response> {
    match uuid::Uuid::parse_str(raw) {
        Ok(id) => Ok(PetId(id)),
        Err(_) => Err(bad_request(format!("{} is not a valid petId", raw))),
    }
}

fn bad_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": message.into() })),
    )
        .into_response()
}

fn not_found(id: PetId) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("{} Pet not found", id) })),
    )
        .into_response()
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Storage failure" })),
    )
        .into_response()
}

fn mutation_error(err: MutationError) -> Response {
    match err {
        MutationError::NotFound(_) => {
            (StatusCode::NOT_FOUND, Json(json!({ "error": err.to_string() }))).into_response()
        }
        MutationError::Store(e) => {
            error!("Mutation failed: {}", e);
            internal_error()
        }
    }
}
