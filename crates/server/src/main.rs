// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

use axum::{
    Json, Router,
    extract::State as AxumState,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tourdesk_api::{
    ActivityTimelineResponse, ApiError, AssignGuideRequest, BookingInfo, BookingMutationResponse,
    CreateBookingRequest, CreateGuideRequest, CreatePayoutRequest, GuideBalance, GuideInfo,
    ListBookingsRequest, ListBookingsResponse, ListGuidesResponse, ListPayoutsRequest,
    ListPayoutsResponse, MarkPayoutPaidRequest, PayoutMutationResponse, PayoutSummary,
    RevenuePolicy, RevenueReportRequest, RevenueReportResponse, SetGuideActiveRequest,
    TransitionBookingRequest, UpdateNotesRequest, UpdatePaymentRequest, VersionedRequest,
};
use tourdesk_audit::Actor;
use tourdesk_domain::GuideShareRate;
use tourdesk_persistence::SqlitePersistence;
use tracing::{error, info, warn};

mod extract;

use extract::{ApiJson, ApiPath, ApiQuery};

/// Tourdesk Server - HTTP server for the Tourdesk booking system
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long)]
    database: Option<String>,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Guide share of paid tour revenue, in basis points (7000 = 70%)
    #[arg(long, default_value_t = 7000)]
    guide_share_bps: u32,

    /// Allow payouts that exceed the guide's computed share
    #[arg(long)]
    allow_payout_overrun: bool,
}

/// Application state shared across handlers.
///
/// The persistence layer sits behind a Mutex, so requests touching the
/// database are serialised.
#[derive(Clone)]
struct AppState {
    /// The persistence layer for bookings, activity, guides and payouts.
    persistence: Arc<Mutex<SqlitePersistence>>,
    /// Revenue and payout settings.
    policy: RevenuePolicy,
}

/// Who is making a write request.
///
/// Both fields are optional; requests without an operator are attributed to
/// the system actor.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
struct ActorFields {
    /// The operator ID performing this action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    actor_id: Option<String>,
    /// The operator's type. Defaults to `operator`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    actor_type: Option<String>,
}

impl ActorFields {
    fn into_actor(self) -> Actor {
        match self.actor_id.filter(|id| !id.trim().is_empty()) {
            Some(id) => Actor::new(
                id,
                self.actor_type
                    .unwrap_or_else(|| String::from("operator")),
            ),
            None => Actor::system(),
        }
    }
}

/// A write request body: the acting operator plus the operation's fields.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct WriteRequest<T> {
    #[serde(flatten)]
    actor: ActorFields,
    #[serde(flatten)]
    body: T,
}

/// Error response type.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    /// Error indicator.
    error: bool,
    /// Error category.
    kind: String,
    /// Error message.
    message: String,
}

/// HTTP error wrapper that implements `IntoResponse`.
#[derive(Debug)]
struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    /// The error category.
    kind: &'static str,
    /// The error message.
    message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            kind: self.kind.to_string(),
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let status: StatusCode = match err {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized { .. } => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::InvalidTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %err, "Request failed");
        } else {
            warn!(kind = err.kind(), error = %err, "Request rejected");
        }

        Self {
            status,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

// ============================================================================
// Guides
// ============================================================================

/// Handler for POST `/guides` endpoint.
async fn handle_create_guide(
    AxumState(app_state): AxumState<AppState>,
    ApiJson(req): ApiJson<CreateGuideRequest>,
) -> Result<Json<GuideInfo>, HttpError> {
    info!(name = %req.name, "Handling create_guide request");

    let mut persistence = app_state.persistence.lock().await;
    let guide: GuideInfo = tourdesk_api::create_guide(&mut persistence, &req, now())?;
    drop(persistence);

    info!(guide_id = guide.guide_id, "Registered guide");
    Ok(Json(guide))
}

/// Handler for GET `/guides` endpoint.
async fn handle_list_guides(
    AxumState(app_state): AxumState<AppState>,
) -> Result<Json<ListGuidesResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: ListGuidesResponse = tourdesk_api::list_guides(&mut persistence)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/guides/{guide_id}/active` endpoint.
async fn handle_set_guide_active(
    AxumState(app_state): AxumState<AppState>,
    ApiPath(guide_id): ApiPath<i64>,
    ApiJson(req): ApiJson<SetGuideActiveRequest>,
) -> Result<Json<GuideInfo>, HttpError> {
    info!(guide_id, is_active = req.is_active, "Handling set_guide_active request");

    let mut persistence = app_state.persistence.lock().await;
    let guide: GuideInfo = tourdesk_api::set_guide_active(&mut persistence, guide_id, req)?;
    drop(persistence);

    Ok(Json(guide))
}

/// Handler for GET `/guides/{guide_id}/balance` endpoint.
async fn handle_guide_balance(
    AxumState(app_state): AxumState<AppState>,
    ApiPath(guide_id): ApiPath<i64>,
) -> Result<Json<GuideBalance>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let balance: GuideBalance =
        tourdesk_api::guide_balance(&mut persistence, guide_id, app_state.policy, now().date())?;
    drop(persistence);

    Ok(Json(balance))
}

// ============================================================================
// Bookings
// ============================================================================

/// Handler for POST `/bookings` endpoint.
async fn handle_create_booking(
    AxumState(app_state): AxumState<AppState>,
    ApiJson(req): ApiJson<WriteRequest<CreateBookingRequest>>,
) -> Result<Json<BookingMutationResponse>, HttpError> {
    let actor: Actor = req.actor.into_actor();
    info!(
        actor_id = %actor.id,
        visit_date = %req.body.visit_date,
        tour_type = %req.body.tour_type,
        "Handling create_booking request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: BookingMutationResponse =
        tourdesk_api::create_booking(&mut persistence, req.body, actor, now())?;
    drop(persistence);

    info!(
        booking_id = response.booking.booking_id,
        reference = %response.booking.booking_reference,
        "Created booking"
    );
    Ok(Json(response))
}

/// Handler for GET `/bookings` endpoint.
async fn handle_list_bookings(
    AxumState(app_state): AxumState<AppState>,
    ApiQuery(req): ApiQuery<ListBookingsRequest>,
) -> Result<Json<ListBookingsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: ListBookingsResponse = tourdesk_api::list_bookings(&mut persistence, &req)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/bookings/{booking_id}` endpoint.
async fn handle_get_booking(
    AxumState(app_state): AxumState<AppState>,
    ApiPath(booking_id): ApiPath<i64>,
) -> Result<Json<BookingInfo>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let booking: BookingInfo = tourdesk_api::get_booking(&mut persistence, booking_id)?;
    drop(persistence);

    Ok(Json(booking))
}

/// Handler for GET `/bookings/reference/{reference}` endpoint.
async fn handle_get_booking_by_reference(
    AxumState(app_state): AxumState<AppState>,
    ApiPath(reference): ApiPath<String>,
) -> Result<Json<BookingInfo>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let booking: BookingInfo =
        tourdesk_api::get_booking_by_reference(&mut persistence, &reference)?;
    drop(persistence);

    Ok(Json(booking))
}

/// Handler for POST `/bookings/{booking_id}/status` endpoint.
async fn handle_transition_booking(
    AxumState(app_state): AxumState<AppState>,
    ApiPath(booking_id): ApiPath<i64>,
    ApiJson(req): ApiJson<WriteRequest<TransitionBookingRequest>>,
) -> Result<Json<BookingMutationResponse>, HttpError> {
    let actor: Actor = req.actor.into_actor();
    info!(
        booking_id,
        actor_id = %actor.id,
        status = %req.body.status,
        "Handling transition request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: BookingMutationResponse =
        tourdesk_api::transition_booking(&mut persistence, booking_id, &req.body, actor, now())?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/bookings/{booking_id}/guide` endpoint.
async fn handle_assign_guide(
    AxumState(app_state): AxumState<AppState>,
    ApiPath(booking_id): ApiPath<i64>,
    ApiJson(req): ApiJson<WriteRequest<AssignGuideRequest>>,
) -> Result<Json<BookingMutationResponse>, HttpError> {
    let actor: Actor = req.actor.into_actor();
    info!(
        booking_id,
        guide_id = req.body.guide_id,
        actor_id = %actor.id,
        "Handling assign_guide request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: BookingMutationResponse =
        tourdesk_api::assign_guide(&mut persistence, booking_id, req.body, actor, now())?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/bookings/{booking_id}/check_in` endpoint.
async fn handle_check_in(
    AxumState(app_state): AxumState<AppState>,
    ApiPath(booking_id): ApiPath<i64>,
    ApiJson(req): ApiJson<WriteRequest<VersionedRequest>>,
) -> Result<Json<BookingMutationResponse>, HttpError> {
    let actor: Actor = req.actor.into_actor();
    info!(booking_id, actor_id = %actor.id, "Handling check_in request");

    let mut persistence = app_state.persistence.lock().await;
    let response: BookingMutationResponse =
        tourdesk_api::check_in(&mut persistence, booking_id, req.body, actor, now())?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/bookings/{booking_id}/check_out` endpoint.
///
/// Checking out completes the tour.
async fn handle_check_out(
    AxumState(app_state): AxumState<AppState>,
    ApiPath(booking_id): ApiPath<i64>,
    ApiJson(req): ApiJson<WriteRequest<VersionedRequest>>,
) -> Result<Json<BookingMutationResponse>, HttpError> {
    let actor: Actor = req.actor.into_actor();
    info!(booking_id, actor_id = %actor.id, "Handling check_out request");

    let mut persistence = app_state.persistence.lock().await;
    let response: BookingMutationResponse =
        tourdesk_api::check_out(&mut persistence, booking_id, req.body, actor, now())?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/bookings/{booking_id}/payment` endpoint.
async fn handle_update_payment(
    AxumState(app_state): AxumState<AppState>,
    ApiPath(booking_id): ApiPath<i64>,
    ApiJson(req): ApiJson<WriteRequest<UpdatePaymentRequest>>,
) -> Result<Json<BookingMutationResponse>, HttpError> {
    let actor: Actor = req.actor.into_actor();
    info!(
        booking_id,
        payment_status = %req.body.payment_status,
        actor_id = %actor.id,
        "Handling update_payment request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: BookingMutationResponse =
        tourdesk_api::update_payment(&mut persistence, booking_id, req.body, actor, now())?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/bookings/{booking_id}/notes` endpoint.
async fn handle_update_notes(
    AxumState(app_state): AxumState<AppState>,
    ApiPath(booking_id): ApiPath<i64>,
    ApiJson(req): ApiJson<WriteRequest<UpdateNotesRequest>>,
) -> Result<Json<BookingMutationResponse>, HttpError> {
    let actor: Actor = req.actor.into_actor();
    info!(booking_id, actor_id = %actor.id, "Handling update_notes request");

    let mut persistence = app_state.persistence.lock().await;
    let response: BookingMutationResponse =
        tourdesk_api::update_notes(&mut persistence, booking_id, req.body, actor, now())?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/bookings/{booking_id}/activity` endpoint.
async fn handle_get_activity(
    AxumState(app_state): AxumState<AppState>,
    ApiPath(booking_id): ApiPath<i64>,
) -> Result<Json<ActivityTimelineResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: ActivityTimelineResponse =
        tourdesk_api::get_activity(&mut persistence, booking_id)?;
    drop(persistence);

    Ok(Json(response))
}

// ============================================================================
// Revenue and payouts
// ============================================================================

/// Handler for GET `/revenue` endpoint.
async fn handle_revenue_report(
    AxumState(app_state): AxumState<AppState>,
    ApiQuery(req): ApiQuery<RevenueReportRequest>,
) -> Result<Json<RevenueReportResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let report: RevenueReportResponse =
        tourdesk_api::revenue_report(&mut persistence, &req, app_state.policy, now().date())?;
    drop(persistence);

    Ok(Json(report))
}

/// Handler for POST `/payouts` endpoint.
async fn handle_create_payout(
    AxumState(app_state): AxumState<AppState>,
    ApiJson(req): ApiJson<WriteRequest<CreatePayoutRequest>>,
) -> Result<Json<PayoutMutationResponse>, HttpError> {
    let actor: Actor = req.actor.into_actor();
    info!(
        guide_id = req.body.guide_id,
        amount = req.body.amount,
        actor_id = %actor.id,
        "Handling create_payout request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: PayoutMutationResponse =
        tourdesk_api::create_payout(&mut persistence, req.body, app_state.policy, now())?;
    drop(persistence);

    info!(payout_id = response.payout.payout_id, "Recorded payout");
    Ok(Json(response))
}

/// Handler for GET `/payouts` endpoint.
async fn handle_list_payouts(
    AxumState(app_state): AxumState<AppState>,
    ApiQuery(req): ApiQuery<ListPayoutsRequest>,
) -> Result<Json<ListPayoutsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: ListPayoutsResponse = tourdesk_api::list_payouts(&mut persistence, req)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/payouts/{payout_id}/paid` endpoint.
async fn handle_mark_payout_paid(
    AxumState(app_state): AxumState<AppState>,
    ApiPath(payout_id): ApiPath<i64>,
    ApiJson(req): ApiJson<WriteRequest<MarkPayoutPaidRequest>>,
) -> Result<Json<PayoutMutationResponse>, HttpError> {
    let actor: Actor = req.actor.into_actor();
    info!(
        payout_id,
        payment_method = %req.body.payment_method,
        actor_id = %actor.id,
        "Handling mark_payout_paid request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: PayoutMutationResponse = tourdesk_api::mark_payout_paid(
        &mut persistence,
        payout_id,
        req.body,
        app_state.policy,
        now(),
    )?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/payouts/summary` endpoint.
async fn handle_payout_summary(
    AxumState(app_state): AxumState<AppState>,
) -> Result<Json<PayoutSummary>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let summary: PayoutSummary = tourdesk_api::payout_summary(&mut persistence, now())?;
    drop(persistence);

    Ok(Json(summary))
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/guides", post(handle_create_guide).get(handle_list_guides))
        .route("/guides/{guide_id}/active", post(handle_set_guide_active))
        .route("/guides/{guide_id}/balance", get(handle_guide_balance))
        .route(
            "/bookings",
            post(handle_create_booking).get(handle_list_bookings),
        )
        .route("/bookings/{booking_id}", get(handle_get_booking))
        .route(
            "/bookings/reference/{reference}",
            get(handle_get_booking_by_reference),
        )
        .route(
            "/bookings/{booking_id}/status",
            post(handle_transition_booking),
        )
        .route("/bookings/{booking_id}/guide", post(handle_assign_guide))
        .route("/bookings/{booking_id}/check_in", post(handle_check_in))
        .route("/bookings/{booking_id}/check_out", post(handle_check_out))
        .route("/bookings/{booking_id}/payment", post(handle_update_payment))
        .route("/bookings/{booking_id}/notes", post(handle_update_notes))
        .route("/bookings/{booking_id}/activity", get(handle_get_activity))
        .route("/revenue", get(handle_revenue_report))
        .route(
            "/payouts",
            post(handle_create_payout).get(handle_list_payouts),
        )
        .route("/payouts/summary", get(handle_payout_summary))
        .route("/payouts/{payout_id}/paid", post(handle_mark_payout_paid))
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args: Args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing Tourdesk Server");

    let policy: RevenuePolicy = RevenuePolicy {
        guide_share_rate: GuideShareRate::from_basis_points(args.guide_share_bps)?,
        enforce_payout_cap: !args.allow_payout_overrun,
    };
    info!(
        guide_share_bps = policy.guide_share_rate.basis_points(),
        enforce_payout_cap = policy.enforce_payout_cap,
        "Revenue policy"
    );

    // Initialize persistence (in-memory or file-based based on CLI argument)
    let persistence: SqlitePersistence = if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path);
        SqlitePersistence::new_with_file(db_path)?
    } else {
        info!("Using in-memory database");
        SqlitePersistence::new_in_memory()?
    };

    let app_state: AppState = AppState {
        persistence: Arc::new(Mutex::new(persistence)),
        policy,
    };

    // Build router
    let app: Router = build_router(app_state);

    // Bind to address
    let addr: std::net::SocketAddr = format!("127.0.0.1:{}", args.port).parse()?;
    info!("Server listening on {}", addr);

    // Run server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode as HttpStatusCode},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    /// Helper to create test app state with in-memory persistence.
    fn create_test_app_state() -> AppState {
        let persistence: SqlitePersistence =
            SqlitePersistence::new_in_memory().expect("Failed to create in-memory persistence");
        AppState {
            persistence: Arc::new(Mutex::new(persistence)),
            policy: RevenuePolicy::default(),
        }
    }

    /// Sends one request and returns the status with the decoded JSON body.
    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (HttpStatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request: Request<Body> = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status: HttpStatusCode = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn booking_body() -> Value {
        json!({
            "actor_id": "desk-1",
            "name": "Ada Visitor",
            "email": "ada@example.com",
            "visit_date": "2025-06-10",
            "visit_time": "09:00",
            "tour_type": "standard",
            "group_size": "individual",
            "number_of_people": 1
        })
    }

    async fn create_guide(app: &Router, name: &str) -> i64 {
        let (status, body) = send(app, "POST", "/guides", Some(json!({ "name": name }))).await;
        assert_eq!(status, HttpStatusCode::OK);
        body["guide_id"].as_i64().unwrap()
    }

    async fn create_booking(app: &Router) -> Value {
        let (status, body) = send(app, "POST", "/bookings", Some(booking_body())).await;
        assert_eq!(status, HttpStatusCode::OK);
        body["booking"].clone()
    }

    /// Drives a booking through confirmation, guide assignment, check-in,
    /// check-out and payment.
    async fn complete_paid_booking(app: &Router, guide_id: i64) -> i64 {
        let booking_id: i64 = create_booking(app).await["booking_id"].as_i64().unwrap();

        let steps: [(String, Value); 5] = [
            (
                format!("/bookings/{booking_id}/status"),
                json!({ "status": "confirmed" }),
            ),
            (
                format!("/bookings/{booking_id}/guide"),
                json!({ "guide_id": guide_id }),
            ),
            (format!("/bookings/{booking_id}/check_in"), json!({})),
            (format!("/bookings/{booking_id}/check_out"), json!({})),
            (
                format!("/bookings/{booking_id}/payment"),
                json!({ "payment_status": "paid", "payment_method": "mobile_money" }),
            ),
        ];
        for (uri, body) in steps {
            let (status, response) = send(app, "POST", &uri, Some(body)).await;
            assert_eq!(status, HttpStatusCode::OK, "{uri}: {response}");
        }
        booking_id
    }

    #[tokio::test]
    async fn test_create_booking_returns_pending_booking() {
        let app: Router = build_router(create_test_app_state());

        let (status, body) = send(&app, "POST", "/bookings", Some(booking_body())).await;

        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(body["booking"]["status"], "pending");
        assert_eq!(body["booking"]["payment_status"], "pending");
        assert_eq!(body["booking"]["total_amount"], 15_000);
        assert_eq!(body["booking"]["version"], 1);
        assert_eq!(body["activity"]["action"], "created");
        assert_eq!(body["activity"]["actor_id"], "desk-1");
        assert!(
            body["booking"]["booking_reference"]
                .as_str()
                .unwrap()
                .starts_with("TD-")
        );
    }

    #[tokio::test]
    async fn test_create_booking_without_email_is_bad_request() {
        let app: Router = build_router(create_test_app_state());
        let mut body: Value = booking_body();
        body["email"] = json!("");

        let (status, response) = send(&app, "POST", "/bookings", Some(body)).await;

        assert_eq!(status, HttpStatusCode::BAD_REQUEST);
        let error_response: ErrorResponse = serde_json::from_value(response).unwrap();
        assert!(error_response.error);
        assert_eq!(error_response.kind, "validation");

        let (_, listed) = send(&app, "GET", "/bookings", None).await;
        assert_eq!(listed["bookings"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_unknown_booking_is_not_found() {
        let app: Router = build_router(create_test_app_state());

        let (status, body) = send(&app, "GET", "/bookings/42", None).await;

        assert_eq!(status, HttpStatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "not_found");
    }

    #[tokio::test]
    async fn test_illegal_transition_is_unprocessable() {
        let app: Router = build_router(create_test_app_state());
        let booking_id: i64 = create_booking(&app).await["booking_id"].as_i64().unwrap();

        let (status, body) = send(
            &app,
            "POST",
            &format!("/bookings/{booking_id}/status"),
            Some(json!({ "status": "completed" })),
        )
        .await;

        assert_eq!(status, HttpStatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], "invalid_transition");

        let (_, booking) = send(&app, "GET", &format!("/bookings/{booking_id}"), None).await;
        assert_eq!(booking["status"], "pending");
        assert_eq!(booking["version"], 1);
    }

    #[tokio::test]
    async fn test_assigning_inactive_guide_is_forbidden() {
        let app: Router = build_router(create_test_app_state());
        let guide_id: i64 = create_guide(&app, "Otieno").await;
        let (status, _) = send(
            &app,
            "POST",
            &format!("/guides/{guide_id}/active"),
            Some(json!({ "is_active": false })),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
        let booking_id: i64 = create_booking(&app).await["booking_id"].as_i64().unwrap();

        let (status, body) = send(
            &app,
            "POST",
            &format!("/bookings/{booking_id}/guide"),
            Some(json!({ "guide_id": guide_id })),
        )
        .await;

        assert_eq!(status, HttpStatusCode::FORBIDDEN);
        assert_eq!(body["kind"], "unauthorized");
    }

    #[tokio::test]
    async fn test_stale_version_is_conflict() {
        let app: Router = build_router(create_test_app_state());
        let booking_id: i64 = create_booking(&app).await["booking_id"].as_i64().unwrap();
        let uri: String = format!("/bookings/{booking_id}/notes");

        let (status, _) = send(
            &app,
            "POST",
            &uri,
            Some(json!({ "admin_notes": "first", "expected_version": 1 })),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);

        let (status, body) = send(
            &app,
            "POST",
            &uri,
            Some(json!({ "admin_notes": "second", "expected_version": 1 })),
        )
        .await;

        assert_eq!(status, HttpStatusCode::CONFLICT);
        assert_eq!(body["kind"], "conflict");

        let (_, booking) = send(&app, "GET", &format!("/bookings/{booking_id}"), None).await;
        assert_eq!(booking["admin_notes"], "first");
        assert_eq!(booking["version"], 2);
    }

    #[tokio::test]
    async fn test_booking_lookup_by_reference() {
        let app: Router = build_router(create_test_app_state());
        let created: Value = create_booking(&app).await;
        let reference: &str = created["booking_reference"].as_str().unwrap();

        let (status, body) =
            send(&app, "GET", &format!("/bookings/reference/{reference}"), None).await;

        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(body["booking_id"], created["booking_id"]);

        let (status, _) = send(&app, "GET", "/bookings/reference/TD-20250101-0000ABCD", None).await;
        assert_eq!(status, HttpStatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_full_tour_flow_and_payout() {
        let app: Router = build_router(create_test_app_state());
        let guide_id: i64 = create_guide(&app, "Wanjiru").await;
        let booking_id: i64 = complete_paid_booking(&app, guide_id).await;

        let (_, booking) = send(&app, "GET", &format!("/bookings/{booking_id}"), None).await;
        assert_eq!(booking["status"], "completed");
        assert_eq!(booking["payment_status"], "paid");
        assert_eq!(booking["version"], 6);

        let (_, timeline) =
            send(&app, "GET", &format!("/bookings/{booking_id}/activity"), None).await;
        let actions: Vec<&str> = timeline["activity"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["action"].as_str().unwrap())
            .collect();
        assert_eq!(
            actions,
            vec![
                "created",
                "status_changed",
                "assigned",
                "checked_in",
                "checked_out",
                "payment_updated"
            ]
        );

        let (status, balance) =
            send(&app, "GET", &format!("/guides/{guide_id}/balance"), None).await;
        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(balance["guide_share"], 10_500);
        assert_eq!(balance["outstanding"], 10_500);

        let (status, payout) = send(
            &app,
            "POST",
            "/payouts",
            Some(json!({ "guide_id": guide_id, "amount": 10_500, "tours_count": 1 })),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(payout["payout"]["status"], "pending");
        assert_eq!(payout["summary"]["total_pending"], 10_500);
        let payout_id: i64 = payout["payout"]["payout_id"].as_i64().unwrap();

        let paid_uri: String = format!("/payouts/{payout_id}/paid");
        let (status, paid) = send(
            &app,
            "POST",
            &paid_uri,
            Some(json!({ "payment_method": "mobile_money", "payment_reference": "QX1" })),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(paid["payout"]["status"], "paid");
        assert_eq!(paid["summary"]["total_paid_out"], 10_500);

        let (status, body) = send(
            &app,
            "POST",
            &paid_uri,
            Some(json!({ "payment_method": "mobile_money" })),
        )
        .await;
        assert_eq!(status, HttpStatusCode::CONFLICT);
        assert_eq!(body["kind"], "conflict");

        let (_, summary) = send(&app, "GET", "/payouts/summary", None).await;
        assert_eq!(summary["total_paid_out"], 10_500);
        assert_eq!(summary["total_pending"], 0);
    }

    #[tokio::test]
    async fn test_payout_over_share_is_rejected() {
        let app: Router = build_router(create_test_app_state());
        let guide_id: i64 = create_guide(&app, "Kamau").await;
        complete_paid_booking(&app, guide_id).await;

        let (status, body) = send(
            &app,
            "POST",
            "/payouts",
            Some(json!({ "guide_id": guide_id, "amount": 10_501, "tours_count": 1 })),
        )
        .await;

        assert_eq!(status, HttpStatusCode::BAD_REQUEST);
        assert_eq!(body["error"], true);
        assert_eq!(body["kind"], "validation");

        let (_, listed) = send(&app, "GET", &format!("/payouts?guide_id={guide_id}"), None).await;
        assert!(listed["payouts"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_payout_window_is_conflict() {
        let app: Router = build_router(create_test_app_state());
        let guide_id: i64 = create_guide(&app, "Njeri").await;
        complete_paid_booking(&app, guide_id).await;
        let body: Value = json!({
            "guide_id": guide_id,
            "amount": 5_000,
            "tours_count": 1,
            "period_start": "2025-06-01",
            "period_end": "2025-06-30"
        });

        let (status, _) = send(&app, "POST", "/payouts", Some(body.clone())).await;
        assert_eq!(status, HttpStatusCode::OK);

        let (status, response) = send(&app, "POST", "/payouts", Some(body)).await;
        assert_eq!(status, HttpStatusCode::CONFLICT);
        assert_eq!(response["kind"], "conflict");

        let (_, listed) = send(&app, "GET", &format!("/payouts?guide_id={guide_id}"), None).await;
        assert_eq!(listed["payouts"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_revenue_report_counts_paid_completed_tours() {
        let app: Router = build_router(create_test_app_state());
        let guide_id: i64 = create_guide(&app, "Achieng").await;
        complete_paid_booking(&app, guide_id).await;
        create_booking(&app).await;

        let (status, report) = send(&app, "GET", "/revenue?date_from=2025-06-01", None).await;

        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(report["totals"]["total_revenue"], 15_000);
        assert_eq!(report["guides"][0]["guide_id"], guide_id);
        assert_eq!(report["guides"][0]["guide_share"], 10_500);
    }

    #[tokio::test]
    async fn test_windowless_payout_double_submit_is_conflict() {
        let app: Router = build_router(create_test_app_state());
        let guide_id: i64 = create_guide(&app, "Wanjiru").await;
        complete_paid_booking(&app, guide_id).await;
        let body: Value = json!({ "guide_id": guide_id, "amount": 4_000, "tours_count": 1 });

        let (status, _) = send(&app, "POST", "/payouts", Some(body.clone())).await;
        assert_eq!(status, HttpStatusCode::OK);

        let (status, response) = send(&app, "POST", "/payouts", Some(body)).await;
        assert_eq!(status, HttpStatusCode::CONFLICT);
        assert_eq!(response["kind"], "conflict");

        let (_, summary) = send(&app, "GET", "/payouts/summary", None).await;
        assert_eq!(summary["total_pending"], 4_000);
    }

    #[tokio::test]
    async fn test_body_missing_field_is_validation_error() {
        let app: Router = build_router(create_test_app_state());
        let guide_id: i64 = create_guide(&app, "Otieno").await;

        let (status, body) = send(
            &app,
            "POST",
            "/payouts",
            Some(json!({ "guide_id": guide_id, "amount": 100 })),
        )
        .await;

        assert_eq!(status, HttpStatusCode::BAD_REQUEST);
        assert_eq!(body["error"], true);
        assert_eq!(body["kind"], "validation");
        assert!(body["message"].as_str().unwrap().contains("tours_count"));
    }

    #[tokio::test]
    async fn test_unparseable_body_is_validation_error() {
        let app: Router = build_router(create_test_app_state());
        let request: Request<Body> = Request::builder()
            .method("POST")
            .uri("/bookings")
            .header("content-type", "application/json")
            .body(Body::from("{\"name\": "))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), HttpStatusCode::BAD_REQUEST);
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["kind"], "validation");
    }

    #[tokio::test]
    async fn test_bad_path_and_query_are_validation_errors() {
        let app: Router = build_router(create_test_app_state());

        let (status, body) = send(&app, "GET", "/bookings/not-a-number", None).await;
        assert_eq!(status, HttpStatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "validation");

        let (status, body) = send(&app, "GET", "/payouts?guide_id=abc", None).await;
        assert_eq!(status, HttpStatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "validation");
    }
}
