//! [`Application`]-related endpoints.

use axum::response::IntoResponse;
use common::{DateTime, Money};
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _},
    domain::{self, application, property, user},
    query, read, Query as _,
};

use crate::{
    api::{
        self, property::PropertyError, Created, Json, Message, Path,
        StatusError,
    },
    define_error, AsError, Context, Error, Session,
};

/// Rental [`domain::Application`] of a tenant.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    /// ID of this [`Application`].
    pub id: application::Id,

    /// ID of the applied property.
    pub property: property::Id,

    /// ID of the applying tenant.
    pub tenant: user::Id,

    /// Employment status of the tenant.
    pub employment_status: application::EmploymentStatus,

    /// Annual income of the tenant.
    pub annual_income: Money,

    /// Current address of the tenant.
    pub current_address: application::CurrentAddress,

    /// Previous landlord of the tenant.
    pub previous_landlord: application::PreviousLandlord,

    /// Reason the tenant is moving for.
    pub reason_for_moving: application::Reason,

    /// Additional notes of the tenant.
    pub additional_notes: Option<application::Notes>,

    /// Status of this [`Application`].
    pub status: application::Status,

    /// When this [`Application`] was submitted.
    pub created_at: DateTime,

    /// When this [`Application`] was modified the last time.
    pub updated_at: DateTime,
}

impl From<domain::Application> for Application {
    fn from(a: domain::Application) -> Self {
        Self {
            id: a.id,
            property: a.property_id,
            tenant: a.tenant_id,
            employment_status: a.employment_status,
            annual_income: a.annual_income,
            current_address: a.current_address,
            previous_landlord: a.previous_landlord,
            reason_for_moving: a.reason_for_moving,
            additional_notes: a.additional_notes,
            status: a.status,
            created_at: a.created_at.coerce(),
            updated_at: a.updated_at.coerce(),
        }
    }
}

/// Fields of a submitted application.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fields {
    /// Employment status of the tenant.
    pub employment_status: application::EmploymentStatus,

    /// Annual income of the tenant.
    pub annual_income: Money,

    /// Current address of the tenant.
    pub current_address: application::CurrentAddress,

    /// Previous landlord of the tenant.
    pub previous_landlord: application::PreviousLandlord,

    /// Reason the tenant is moving for.
    pub reason_for_moving: application::Reason,

    /// Additional notes of the tenant.
    pub additional_notes: Option<application::Notes>,
}

/// Request of the [`submit`] endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    /// ID of the property to apply for.
    pub property_id: property::Id,

    /// Application [`Fields`].
    #[serde(flatten)]
    pub fields: Fields,
}

/// Applies for the property with the provided ID.
#[tracing::instrument(
    skip_all,
    fields(
        http.route = "POST /api/properties/:id/apply",
        otel.name = "applyForProperty",
        property.id = %id,
        user.id = %session.user_id(),
    ),
)]
pub async fn apply(
    ctx: Context,
    session: Session,
    Path(id): Path<property::Id>,
    Json(fields): Json<Fields>,
) -> api::Result<Created<Application>> {
    execute_submit(&ctx, &session, id, fields).await
}

/// Applies for the property specified in the request.
#[tracing::instrument(
    skip_all,
    fields(
        http.route = "POST /api/applications",
        otel.name = "submitApplication",
        property.id = %req.property_id,
        user.id = %session.user_id(),
    ),
)]
pub async fn submit(
    ctx: Context,
    session: Session,
    Json(req): Json<SubmitRequest>,
) -> api::Result<Created<Application>> {
    execute_submit(&ctx, &session, req.property_id, req.fields).await
}

/// Executes the [`command::SubmitApplication`] on behalf of the tenant.
async fn execute_submit(
    ctx: &Context,
    session: &Session,
    property_id: property::Id,
    fields: Fields,
) -> api::Result<Created<Application>> {
    session.require(&[user::Role::Tenant])?;

    let Fields {
        employment_status,
        annual_income,
        current_address,
        previous_landlord,
        reason_for_moving,
        additional_notes,
    } = fields;
    let application = ctx
        .service()
        .execute(command::SubmitApplication {
            property_id,
            tenant_id: session.user_id(),
            employment_status,
            annual_income,
            current_address,
            previous_landlord,
            reason_for_moving,
            additional_notes,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Created(application.into()))
}

/// Lists applications visible to the authenticated user.
///
/// Tenants see their own applications, landlords see the ones for their
/// properties, and admins see all of them.
#[tracing::instrument(
    skip_all,
    fields(
        http.route = "GET /api/applications",
        otel.name = "listApplications",
        user.id = %session.user_id(),
    ),
)]
pub async fn list(
    ctx: Context,
    session: Session,
) -> api::Result<Json<Vec<Application>>> {
    execute_list(&ctx, &session).await
}

/// Lists applications of the authenticated tenant.
#[tracing::instrument(
    skip_all,
    fields(
        http.route = "GET /api/applications/tenant",
        otel.name = "listTenantApplications",
        user.id = %session.user_id(),
    ),
)]
pub async fn list_tenant(
    ctx: Context,
    session: Session,
) -> api::Result<Json<Vec<Application>>> {
    session.require(&[user::Role::Tenant])?;
    execute_list(&ctx, &session).await
}

/// Lists applications for properties of the authenticated landlord.
#[tracing::instrument(
    skip_all,
    fields(
        http.route = "GET /api/applications/landlord",
        otel.name = "listLandlordApplications",
        user.id = %session.user_id(),
    ),
)]
pub async fn list_landlord(
    ctx: Context,
    session: Session,
) -> api::Result<Json<Vec<Application>>> {
    session.require(&[user::Role::Landlord])?;
    execute_list(&ctx, &session).await
}

/// Executes the [`query::application::List`] scoped to the [`Session`] role.
async fn execute_list(
    ctx: &Context,
    session: &Session,
) -> api::Result<Json<Vec<Application>>> {
    let filter = match session.role {
        user::Role::Tenant => read::application::list::Filter {
            tenant_id: Some(session.user_id()),
            ..read::application::list::Filter::default()
        },
        user::Role::Landlord => read::application::list::Filter {
            landlord_id: Some(session.user_id()),
            ..read::application::list::Filter::default()
        },
        user::Role::Admin => read::application::list::Filter::default(),
    };

    let applications = ctx
        .service()
        .execute(query::application::List::by(filter))
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(applications.into_iter().map(Into::into).collect()))
}

/// Request of the [`decide`] endpoint.
#[derive(Debug, Deserialize)]
pub struct DecideRequest {
    /// Decided status, either `approved` or `rejected`.
    pub status: String,
}

/// Approves or rejects the application with the provided ID.
#[tracing::instrument(
    skip_all,
    fields(
        application.id = %id,
        http.route = "PATCH /api/applications/:id",
        otel.name = "decideApplication",
        status = %req.status,
        user.id = %session.user_id(),
    ),
)]
pub async fn decide(
    ctx: Context,
    session: Session,
    Path(id): Path<application::Id>,
    Json(req): Json<DecideRequest>,
) -> api::Result<Json<Application>> {
    session.require(&[user::Role::Landlord])?;

    let status = req
        .status
        .parse::<application::Status>()
        .map_err(|_| StatusError::Invalid)?;
    let application = ctx
        .service()
        .execute(command::DecideApplication {
            application_id: id,
            initiator_id: session.user_id(),
            status,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(application.into()))
}

/// Withdraws the application with the provided ID.
#[tracing::instrument(
    skip_all,
    fields(
        application.id = %id,
        http.route = "DELETE /api/applications/:id",
        otel.name = "withdrawApplication",
        user.id = %session.user_id(),
    ),
)]
pub async fn withdraw(
    ctx: Context,
    session: Session,
    Path(id): Path<application::Id>,
) -> api::Result<impl IntoResponse> {
    _ = ctx
        .service()
        .execute(command::WithdrawApplication {
            application_id: id,
            initiator_id: session.user_id(),
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Message::new("Application withdrawn successfully"))
}

impl AsError for command::submit_application::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "ALREADY_APPLIED"]
                #[status = BAD_REQUEST]
                #[message = "You have already applied for this property"]
                AlreadyApplied,

                #[code = "PROPERTY_NOT_AVAILABLE"]
                #[status = BAD_REQUEST]
                #[message = "Property is not available"]
                PropertyNotAvailable,
            }
        }

        match self {
            Self::AlreadyApplied(_) => Some(Error::AlreadyApplied.into()),
            Self::Db(e) => e.try_as_error(),
            Self::PropertyNotAvailable(_) => {
                Some(Error::PropertyNotAvailable.into())
            }
            Self::PropertyNotExists(_) => Some(PropertyError::NotFound.into()),
        }
    }
}

impl AsError for command::decide_application::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "APPLICATION_NOT_PENDING"]
                #[status = BAD_REQUEST]
                #[message = "Application is not pending"]
                NotPending,
            }
        }

        match self {
            Self::ApplicationNotExists(_) => {
                Some(ApplicationError::NotFound.into())
            }
            Self::Db(e) => e.try_as_error(),
            Self::InvalidStatus(_) => Some(StatusError::Invalid.into()),
            Self::NotOwner(_) => Some(api::PrivilegeError::Unauthorized.into()),
            Self::NotPending(_) => Some(Error::NotPending.into()),
        }
    }
}

impl AsError for command::withdraw_application::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "APPLICATION_NOT_OUTSTANDING"]
                #[status = BAD_REQUEST]
                #[message = "Only pending or approved applications can be withdrawn"]
                NotOutstanding,
            }
        }

        match self {
            Self::ApplicationNotExists(_) => {
                Some(ApplicationError::NotFound.into())
            }
            Self::Db(e) => e.try_as_error(),
            Self::NotOutstanding(_) => Some(Error::NotOutstanding.into()),
            Self::NotParticipant(_) => {
                Some(api::PrivilegeError::Unauthorized.into())
            }
        }
    }
}

define_error! {
    enum ApplicationError {
        #[code = "APPLICATION_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "Application not found"]
        NotFound,
    }
}

#[cfg(test)]
mod tests {
    use service::{
        command::{decide_application, submit_application},
        domain::{application, property},
    };

    use crate::AsError as _;

    use super::SubmitRequest;

    #[test]
    fn submit_request_flattens_fields() {
        let id = property::Id::new();
        let req: SubmitRequest = serde_json::from_value(serde_json::json!({
            "propertyId": id.to_string(),
            "employmentStatus": "self-employed",
            "annualIncome": "85000",
            "currentAddress": "12 Elm St",
            "previousLandlord": {
                "name": "Bob",
                "phone": "555-0100",
                "email": "bob@example.com",
            },
            "reasonForMoving": "Closer to work",
        }))
        .unwrap();

        assert_eq!(req.property_id, id);
        assert_eq!(
            req.fields.employment_status,
            application::EmploymentStatus::SelfEmployed,
        );
        assert!(req.fields.additional_notes.is_none());
    }

    #[test]
    fn maps_workflow_errors() {
        let err = submit_application::ExecutionError::AlreadyApplied(
            application::Id::new(),
        )
        .into_error();
        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "You have already applied for this property");

        let err = decide_application::ExecutionError::InvalidStatus(
            application::Status::Withdrawn,
        )
        .into_error();
        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Invalid status");

        let err = decide_application::ExecutionError::ApplicationNotExists(
            application::Id::new(),
        )
        .into_error();
        assert_eq!(err.status_code, http::StatusCode::NOT_FOUND);
    }
}
