use crate::controller::{
    AttemptReport, Banner, SubmissionController, SubmissionStatus, SubmitError,
};
use crate::form::{DraftRecord, Field};
use crate::handoff::LinkLauncher;
use crate::intake::FormIntake;
use axum::{
    body::Bytes,
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// --- Models ---

#[derive(Debug, Serialize)]
struct ContactStateResponse {
    status: SubmissionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    banner: Option<Banner>,
    draft: DraftRecord,
}

#[derive(Debug, Deserialize)]
struct DraftUpdateRequest {
    field: String,
    #[serde(default)]
    value: String,
}

#[derive(Debug, Serialize)]
struct SubmitResponse {
    #[serde(flatten)]
    attempt: AttemptReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    banner: Option<Banner>,
    #[serde(skip_serializing_if = "Option::is_none")]
    handoff_url: Option<String>,
    /// The page should open `handoff_url` itself.
    open_handoff: bool,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<Field>,
    #[serde(skip_serializing_if = "Option::is_none")]
    banner: Option<Banner>,
}

// --- Handlers ---

async fn contact_state<I, L>(
    State(controller): State<Arc<SubmissionController<I, L>>>,
) -> impl IntoResponse
where
    I: FormIntake + 'static,
    L: LinkLauncher + 'static,
{
    let response = ContactStateResponse {
        status: controller.current_state(),
        banner: controller.banner(),
        draft: controller.draft(),
    };
    (StatusCode::OK, Json(response))
}

async fn update_draft<I, L>(
    State(controller): State<Arc<SubmissionController<I, L>>>,
    Json(request): Json<DraftUpdateRequest>,
) -> impl IntoResponse
where
    I: FormIntake + 'static,
    L: LinkLauncher + 'static,
{
    match request.field.parse::<Field>() {
        Ok(field) => (StatusCode::OK, Json(controller.update(field, request.value))).into_response(),
        Err(err) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: err.to_string(),
                fields: Vec::new(),
                banner: None,
            }),
        )
            .into_response(),
    }
}

async fn reset_draft<I, L>(
    State(controller): State<Arc<SubmissionController<I, L>>>,
) -> impl IntoResponse
where
    I: FormIntake + 'static,
    L: LinkLauncher + 'static,
{
    (StatusCode::OK, Json(controller.reset()))
}

async fn submit_contact<I, L>(
    State(controller): State<Arc<SubmissionController<I, L>>>,
    body: Bytes,
) -> impl IntoResponse
where
    I: FormIntake + 'static,
    L: LinkLauncher + 'static,
{
    // An empty body sends the draft built up through /api/contact/draft.
    let result = if body.iter().all(u8::is_ascii_whitespace) {
        controller.submit().await
    } else {
        match serde_json::from_slice::<DraftRecord>(&body) {
            Ok(draft) => controller.submit_draft(draft).await,
            Err(err) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: format!("invalid contact form body: {err}"),
                        fields: Vec::new(),
                        banner: None,
                    }),
                )
                    .into_response();
            }
        }
    };

    match result {
        Ok(attempt) => {
            let handoff_url = attempt.handoff.as_ref().map(|handoff| handoff.url.clone());
            let open_handoff = attempt
                .handoff
                .as_ref()
                .is_some_and(|handoff| handoff.launched);
            let response = SubmitResponse {
                banner: Banner::for_status(&attempt.status, &controller.draft()),
                attempt,
                handoff_url,
                open_handoff,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(SubmitError::Invalid(err)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                error: err.to_string(),
                fields: err.fields,
                banner: controller.banner(),
            }),
        )
            .into_response(),
        Err(SubmitError::InFlight) => in_flight_response(controller.banner()),
    }
}

fn in_flight_response(banner: Option<Banner>) -> axum::response::Response {
    (
        StatusCode::CONFLICT,
        Json(ErrorResponse {
            error: SubmitError::InFlight.to_string(),
            fields: Vec::new(),
            banner,
        }),
    )
        .into_response()
}

pub fn api_routes<I, L>(controller: Arc<SubmissionController<I, L>>) -> Router
where
    I: FormIntake + 'static,
    L: LinkLauncher + 'static,
{
    Router::new()
        .route("/api/contact/state", get(contact_state::<I, L>))
        .route(
            "/api/contact/draft",
            post(update_draft::<I, L>).delete(reset_draft::<I, L>),
        )
        .route("/api/contact/submit", post(submit_contact::<I, L>))
        .with_state(controller)
}
