//! HTTP JSON API definitions.

pub mod application;
pub mod auth;
pub mod dashboard;
pub mod lease;
pub mod message;
pub mod payment;
pub mod property;
pub mod user;

use axum::{
    extract::{FromRequest, FromRequestParts},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Router,
};
use serde::Serialize;

use crate::{define_error, Error};

/// Builds the [`Router`] serving the whole HTTP API.
///
/// Requires the [`Service`] to be provided as an [`Extension`].
///
/// [`Extension`]: axum::Extension
/// [`Service`]: crate::Service
pub fn router() -> Router {
    let api = Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/users", get(user::list).post(user::create))
        .route(
            "/users/:id",
            get(user::get).put(user::update).delete(user::delete),
        )
        .route("/properties", get(property::list).post(property::create))
        .route("/properties/public", get(property::list_public))
        .route("/properties/landlord", get(property::list_own))
        .route(
            "/properties/:id",
            get(property::get)
                .patch(property::update)
                .delete(property::delete),
        )
        .route("/properties/:id/public", get(property::get_public))
        .route("/properties/:id/tenant", get(property::get_rented))
        .route("/properties/:id/apply", post(application::apply))
        .route(
            "/applications",
            get(application::list).post(application::submit),
        )
        .route("/applications/tenant", get(application::list_tenant))
        .route("/applications/landlord", get(application::list_landlord))
        .route(
            "/applications/:id",
            patch(application::decide).delete(application::withdraw),
        )
        .route("/leases", get(lease::list).post(lease::create))
        .route("/leases/tenant", get(lease::list_tenant))
        .route("/leases/landlord", get(lease::list_landlord))
        .route("/leases/:id", get(lease::get).patch(lease::transit))
        .route("/payments", get(payment::list).post(payment::record))
        .route("/payments/:id", patch(payment::settle))
        .route("/messages", get(message::list).post(message::send))
        .route("/messages/unread", get(message::unread))
        .route("/messages/:id/read", patch(message::mark_read))
        .route("/dashboard/tenant", get(dashboard::tenant))
        .route("/dashboard/landlord", get(dashboard::landlord));

    Router::new().nest("/api", api)
}

/// JSON request body extractor and response body.
///
/// Rejects malformed bodies with a `400 Bad Request` [`Error`].
#[derive(Clone, Copy, Debug, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Path parameters extractor.
///
/// Rejects malformed parameters with a `400 Bad Request` [`Error`].
#[derive(Clone, Copy, Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(Error))]
pub struct Path<T>(pub T);

/// Query string extractor.
///
/// Rejects malformed query strings with a `400 Bad Request` [`Error`].
#[derive(Clone, Copy, Debug, Default, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Error))]
pub struct Query<T>(pub T);

/// `201 Created` JSON response.
#[derive(Clone, Copy, Debug)]
pub struct Created<T>(pub T);

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        (http::StatusCode::CREATED, axum::Json(self.0)).into_response()
    }
}

/// JSON response with a human-readable message only.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Message {
    /// Message text.
    pub message: &'static str,
}

impl Message {
    /// Creates a new [`Message`] response.
    #[must_use]
    pub const fn new(message: &'static str) -> Self {
        Self { message }
    }
}

impl IntoResponse for Message {
    fn into_response(self) -> Response {
        axum::Json(self).into_response()
    }
}

/// Result of an API handler.
pub type Result<T> = std::result::Result<T, Error>;

define_error! {
    enum PrivilegeError {
        #[code = "FORBIDDEN"]
        #[status = FORBIDDEN]
        #[message = "Unauthorized"]
        Unauthorized,
    }
}

define_error! {
    enum StatusError {
        #[code = "INVALID_STATUS"]
        #[status = BAD_REQUEST]
        #[message = "Invalid status"]
        Invalid,
    }
}
