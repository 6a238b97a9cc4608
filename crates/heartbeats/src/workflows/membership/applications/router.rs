use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::auth::{AuthError, Authenticator, SessionToken};
use super::domain::{ApplicationId, ApplicationStatus, ApplicationSubmission, MemberRole};
use super::form::derived_email;
use super::repository::ApplicationRepository;
use super::review::{ReviewError, ReviewFilter, ReviewService, ReviewSummary, StatusFilter};
use super::service::{MembershipApplicationService, SubmissionError};
use super::validation::MIN_MOTIVATION_WORDS;
use crate::config::DEFAULT_INSTITUTION_DOMAIN;

/// Shared handles behind the intake and review endpoints.
pub struct ApplicationState<R, A> {
    pub intake: Arc<MembershipApplicationService<R>>,
    pub review: Arc<ReviewService<R>>,
    pub auth: Arc<A>,
    /// Domain of the contact e-mail the form derives from the roll number.
    pub institution_domain: Arc<str>,
}

impl<R, A> ApplicationState<R, A>
where
    R: ApplicationRepository + 'static,
    A: Authenticator + 'static,
{
    pub fn new(repository: Arc<R>, auth: Arc<A>) -> Self {
        Self {
            intake: Arc::new(MembershipApplicationService::new(repository.clone())),
            review: Arc::new(ReviewService::new(repository)),
            auth,
            institution_domain: Arc::from(DEFAULT_INSTITUTION_DOMAIN),
        }
    }

    pub fn with_institution_domain(mut self, institution_domain: impl AsRef<str>) -> Self {
        self.institution_domain = Arc::from(institution_domain.as_ref());
        self
    }
}

impl<R, A> Clone for ApplicationState<R, A> {
    fn clone(&self) -> Self {
        Self {
            intake: self.intake.clone(),
            review: self.review.clone(),
            auth: self.auth.clone(),
            institution_domain: self.institution_domain.clone(),
        }
    }
}

/// Router builder exposing the public intake and the staff review endpoints.
pub fn application_router<R, A>(state: ApplicationState<R, A>) -> Router
where
    R: ApplicationRepository + 'static,
    A: Authenticator + 'static,
{
    Router::new()
        .route("/api/v1/applications", post(submit_handler::<R, A>))
        .route("/api/v1/applications/form", get(form_handler::<R, A>))
        .route(
            "/api/v1/admin/session",
            post(sign_in_handler::<R, A>).delete(sign_out_handler::<R, A>),
        )
        .route("/api/v1/admin/applications", get(list_handler::<R, A>))
        .route(
            "/api/v1/admin/applications/:application_id",
            get(get_handler::<R, A>).delete(delete_handler::<R, A>),
        )
        .route(
            "/api/v1/admin/applications/:application_id/status",
            put(status_handler::<R, A>),
        )
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub(crate) struct SignInRequest {
    pub(crate) email: String,
    pub(crate) password: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    pub(crate) search: Option<String>,
    #[serde(default)]
    pub(crate) status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusUpdate {
    pub(crate) status: ApplicationStatus,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DeleteQuery {
    #[serde(default)]
    pub(crate) confirm: bool,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FormQuery {
    #[serde(default, rename = "rollNumber")]
    pub(crate) roll_number: Option<String>,
}

/// Store round trips may touch the filesystem; keep them off the async workers.
async fn run_blocking<T, F>(task: F) -> Result<T, Response>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task).await.map_err(|err| {
        error!(error = %err, "store task failed to complete");
        error_body(StatusCode::SERVICE_UNAVAILABLE, "store task failed to complete")
    })
}

fn error_body(status: StatusCode, message: impl Into<String>) -> Response {
    let payload = json!({ "error": message.into() });
    (status, Json(payload)).into_response()
}

pub(crate) async fn submit_handler<R, A>(
    State(state): State<ApplicationState<R, A>>,
    Json(submission): Json<ApplicationSubmission>,
) -> Response
where
    R: ApplicationRepository + 'static,
    A: Authenticator + 'static,
{
    let intake = state.intake.clone();
    let outcome = match run_blocking(move || intake.submit(submission)).await {
        Ok(outcome) => outcome,
        Err(response) => return response,
    };

    match outcome {
        Ok(receipt) => (StatusCode::CREATED, Json(receipt)).into_response(),
        Err(SubmissionError::Invalid(errors)) => {
            let payload = json!({
                "error": errors.to_string(),
                "errors": errors,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        Err(SubmissionError::AlreadyApplied { roll_number }) => {
            let payload = json!({
                "error": "already applied",
                "roll_number": roll_number,
            });
            (StatusCode::CONFLICT, Json(payload)).into_response()
        }
        Err(other @ SubmissionError::StoreUnavailable) => {
            error_body(StatusCode::SERVICE_UNAVAILABLE, other.to_string())
        }
    }
}

/// Form defaults for the intake page; with `?rollNumber=` also the derived contact e-mail.
pub(crate) async fn form_handler<R, A>(
    State(state): State<ApplicationState<R, A>>,
    Query(query): Query<FormQuery>,
) -> Response
where
    R: ApplicationRepository + 'static,
    A: Authenticator + 'static,
{
    let roles: Vec<&str> = MemberRole::ordered()
        .into_iter()
        .map(MemberRole::label)
        .collect();
    let email = query
        .roll_number
        .as_deref()
        .map(str::trim)
        .filter(|roll_number| !roll_number.is_empty())
        .map(|roll_number| derived_email(roll_number, &state.institution_domain));

    let payload = json!({
        "institution_domain": &*state.institution_domain,
        "roles": roles,
        "min_motivation_words": MIN_MOTIVATION_WORDS,
        "email": email,
    });
    (StatusCode::OK, Json(payload)).into_response()
}

pub(crate) async fn sign_in_handler<R, A>(
    State(state): State<ApplicationState<R, A>>,
    Json(request): Json<SignInRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    A: Authenticator + 'static,
{
    match state.auth.sign_in(&request.email, &request.password) {
        Ok(token) => (StatusCode::OK, Json(json!({ "token": token }))).into_response(),
        Err(err @ AuthError::InvalidCredentials) => {
            error_body(StatusCode::UNAUTHORIZED, err.to_string())
        }
        Err(err @ AuthError::TooManyAttempts) => {
            error_body(StatusCode::TOO_MANY_REQUESTS, err.to_string())
        }
        Err(err @ AuthError::Unavailable) => {
            error_body(StatusCode::SERVICE_UNAVAILABLE, err.to_string())
        }
    }
}

pub(crate) async fn sign_out_handler<R, A>(
    State(state): State<ApplicationState<R, A>>,
    headers: HeaderMap,
) -> Response
where
    R: ApplicationRepository + 'static,
    A: Authenticator + 'static,
{
    if let Some(token) = bearer_token(&headers) {
        state.auth.sign_out(&token);
    }
    StatusCode::NO_CONTENT.into_response()
}

pub(crate) async fn list_handler<R, A>(
    State(state): State<ApplicationState<R, A>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response
where
    R: ApplicationRepository + 'static,
    A: Authenticator + 'static,
{
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }

    let status = match StatusFilter::parse(query.status.as_deref().unwrap_or_default()) {
        Some(status) => status,
        None => {
            return error_body(
                StatusCode::BAD_REQUEST,
                "status must be one of all, pending, reviewed, accepted, rejected",
            )
        }
    };
    let filter = ReviewFilter::new(query.search.unwrap_or_default(), status);

    let review = state.review.clone();
    let listed = match run_blocking(move || review.list()).await {
        Ok(listed) => listed,
        Err(response) => return response,
    };

    match listed {
        Ok(records) => {
            let summary = ReviewSummary::from_records(&records);
            let applications = filter.apply(&records);
            let payload = json!({
                "summary": summary,
                "matched": applications.len(),
                "applications": applications,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => review_error_response(err),
    }
}

pub(crate) async fn get_handler<R, A>(
    State(state): State<ApplicationState<R, A>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    A: Authenticator + 'static,
{
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }

    let review = state.review.clone();
    let id = ApplicationId(application_id);
    let fetched = match run_blocking(move || review.get(&id)).await {
        Ok(fetched) => fetched,
        Err(response) => return response,
    };

    match fetched {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => review_error_response(err),
    }
}

pub(crate) async fn status_handler<R, A>(
    State(state): State<ApplicationState<R, A>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> Response
where
    R: ApplicationRepository + 'static,
    A: Authenticator + 'static,
{
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }

    let review = state.review.clone();
    let id = ApplicationId(application_id);
    let updated = match run_blocking(move || review.set_status(&id, update.status)).await {
        Ok(updated) => updated,
        Err(response) => return response,
    };

    match updated {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => review_error_response(err),
    }
}

pub(crate) async fn delete_handler<R, A>(
    State(state): State<ApplicationState<R, A>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Response
where
    R: ApplicationRepository + 'static,
    A: Authenticator + 'static,
{
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }

    let review = state.review.clone();
    let id = ApplicationId(application_id);
    let target = id.clone();
    let deleted = match run_blocking(move || review.delete(&target, query.confirm)).await {
        Ok(deleted) => deleted,
        Err(response) => return response,
    };

    match deleted {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => review_error_response(ReviewError::NotFound(id)),
        Err(err) => review_error_response(err),
    }
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<SessionToken> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty())
        .then(|| SessionToken(token.to_string()))
}

fn authorize<R, A>(state: &ApplicationState<R, A>, headers: &HeaderMap) -> Result<(), Response>
where
    A: Authenticator + 'static,
{
    match bearer_token(headers) {
        Some(token) if state.auth.is_signed_in(&token) => Ok(()),
        _ => Err(review_error_response(ReviewError::Unauthenticated)),
    }
}

fn review_error_response(err: ReviewError) -> Response {
    let status = match err {
        ReviewError::Unauthenticated => StatusCode::UNAUTHORIZED,
        ReviewError::NotFound(_) => StatusCode::NOT_FOUND,
        ReviewError::ConfirmationRequired(_) => StatusCode::PRECONDITION_REQUIRED,
        ReviewError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    error_body(status, err.to_string())
}
