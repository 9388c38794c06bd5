//! [`Lease`]-related endpoints.

use common::{DateTime, Money};
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _},
    domain::{self, application, lease, property, user},
    query, read, Query as _,
};

use crate::{
    api::{self, Json, Path},
    define_error, AsError, Context, Error, Session,
};

/// Rental [`domain::Lease`] agreement.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lease {
    /// ID of this [`Lease`].
    pub id: lease::Id,

    /// ID of the leased property.
    pub property: property::Id,

    /// ID of the bound tenant.
    pub tenant: user::Id,

    /// ID of the bound landlord.
    pub landlord: user::Id,

    /// ID of the approved application this [`Lease`] is created for.
    pub application: application::Id,

    /// When this [`Lease`] starts.
    pub start_date: DateTime,

    /// When this [`Lease`] ends.
    pub end_date: DateTime,

    /// Monthly rent.
    pub rent_amount: Money,

    /// Security deposit.
    pub security_deposit: Money,

    /// Day of month the rent is due.
    pub payment_due_day: lease::DueDay,

    /// Terms of this [`Lease`].
    pub terms: lease::Terms,

    /// Status of this [`Lease`].
    pub status: lease::Status,

    /// Signature of the tenant.
    pub tenant_signature: Option<lease::Signature>,

    /// Signature of the landlord.
    pub landlord_signature: Option<lease::Signature>,

    /// Requested advance payment.
    pub advanced_payment: Option<AdvancedPayment>,

    /// When this [`Lease`] was created.
    pub created_at: DateTime,

    /// When this [`Lease`] was modified the last time.
    pub updated_at: DateTime,
}

impl From<domain::Lease> for Lease {
    fn from(l: domain::Lease) -> Self {
        Self {
            id: l.id,
            property: l.property_id,
            tenant: l.tenant_id,
            landlord: l.landlord_id,
            application: l.application_id,
            start_date: l.start_date.coerce(),
            end_date: l.end_date.coerce(),
            rent_amount: l.rent_amount,
            security_deposit: l.security_deposit,
            payment_due_day: l.payment_due_day,
            terms: l.terms,
            status: l.status,
            tenant_signature: l.tenant_signature,
            landlord_signature: l.landlord_signature,
            advanced_payment: l.advanced_payment.map(Into::into),
            created_at: l.created_at.coerce(),
            updated_at: l.updated_at.coerce(),
        }
    }
}

/// Advance payment embedded into a [`Lease`].
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedPayment {
    /// Requested amount.
    pub amount: Money,

    /// When the payment is due.
    pub due_date: DateTime,

    /// Status of the payment.
    pub status: lease::advanced_payment::Status,

    /// When the payment was paid.
    pub paid_at: Option<DateTime>,
}

impl From<lease::AdvancedPayment> for AdvancedPayment {
    fn from(p: lease::AdvancedPayment) -> Self {
        Self {
            amount: p.amount,
            due_date: p.due_date.coerce(),
            status: p.status,
            paid_at: p.paid_at.map(|at| at.coerce()),
        }
    }
}

/// Advance payment requested along with a new [`Lease`].
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedPaymentRequest {
    /// Requested amount.
    pub amount: Money,

    /// When the payment is due.
    pub due_date: lease::advanced_payment::DueDateTime,
}

/// Request of the [`create`] endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    /// ID of the approved application.
    pub application_id: application::Id,

    /// When the new lease starts.
    pub start_date: lease::StartDateTime,

    /// When the new lease ends.
    pub end_date: lease::EndDateTime,

    /// Monthly rent.
    pub rent_amount: Money,

    /// Security deposit.
    pub security_deposit: Money,

    /// Day of month the rent is due.
    ///
    /// Accepts any number, so an invalid one is reported by the command.
    pub payment_due_day: f64,

    /// Terms of the new lease.
    pub terms: lease::Terms,

    /// Advance payment to request right away.
    pub advanced_payment: Option<AdvancedPaymentRequest>,
}

/// Creates a new lease for an approved application.
#[tracing::instrument(
    skip_all,
    fields(
        application.id = %req.application_id,
        http.route = "POST /api/leases",
        otel.name = "createLease",
        user.id = %session.user_id(),
    ),
)]
pub async fn create(
    ctx: Context,
    session: Session,
    Json(req): Json<CreateRequest>,
) -> api::Result<Json<Lease>> {
    session.require(&[user::Role::Landlord])?;

    let CreateRequest {
        application_id,
        start_date,
        end_date,
        rent_amount,
        security_deposit,
        payment_due_day,
        terms,
        advanced_payment,
    } = req;
    let lease = ctx
        .service()
        .execute(command::CreateLease {
            initiator_id: session.user_id(),
            application_id,
            start_date,
            end_date,
            rent_amount,
            security_deposit,
            payment_due_day,
            terms,
            advanced_payment: advanced_payment.map(|p| {
                command::create_lease::AdvancedPayment {
                    amount: p.amount,
                    due_date: p.due_date,
                }
            }),
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(lease.into()))
}

/// Lists leases visible to the authenticated user.
///
/// Tenants and landlords see the leases they're bound to, while admins see
/// all of them.
#[tracing::instrument(
    skip_all,
    fields(
        http.route = "GET /api/leases",
        otel.name = "listLeases",
        user.id = %session.user_id(),
    ),
)]
pub async fn list(
    ctx: Context,
    session: Session,
) -> api::Result<Json<Vec<Lease>>> {
    execute_list(&ctx, &session).await
}

/// Lists leases of the authenticated tenant.
#[tracing::instrument(
    skip_all,
    fields(
        http.route = "GET /api/leases/tenant",
        otel.name = "listTenantLeases",
        user.id = %session.user_id(),
    ),
)]
pub async fn list_tenant(
    ctx: Context,
    session: Session,
) -> api::Result<Json<Vec<Lease>>> {
    session.require(&[user::Role::Tenant])?;
    execute_list(&ctx, &session).await
}

/// Lists leases of the authenticated landlord.
#[tracing::instrument(
    skip_all,
    fields(
        http.route = "GET /api/leases/landlord",
        otel.name = "listLandlordLeases",
        user.id = %session.user_id(),
    ),
)]
pub async fn list_landlord(
    ctx: Context,
    session: Session,
) -> api::Result<Json<Vec<Lease>>> {
    session.require(&[user::Role::Landlord])?;
    execute_list(&ctx, &session).await
}

/// Executes the [`query::lease::List`] scoped to the [`Session`] role.
async fn execute_list(
    ctx: &Context,
    session: &Session,
) -> api::Result<Json<Vec<Lease>>> {
    let filter = match session.role {
        user::Role::Tenant => read::lease::list::Filter {
            tenant_id: Some(session.user_id()),
            ..read::lease::list::Filter::default()
        },
        user::Role::Landlord => read::lease::list::Filter {
            landlord_id: Some(session.user_id()),
            ..read::lease::list::Filter::default()
        },
        user::Role::Admin => read::lease::list::Filter::default(),
    };

    let leases = ctx
        .service()
        .execute(query::lease::List::by(filter))
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(leases.into_iter().map(Into::into).collect()))
}

/// Returns the lease with the provided ID.
#[tracing::instrument(
    skip_all,
    fields(
        http.route = "GET /api/leases/:id",
        lease.id = %id,
        otel.name = "getLease",
        user.id = %session.user_id(),
    ),
)]
pub async fn get(
    ctx: Context,
    session: Session,
    Path(id): Path<lease::Id>,
) -> api::Result<Json<Lease>> {
    let lease = ctx
        .service()
        .execute(query::lease::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .ok_or(LeaseError::NotFound)?;

    if !lease.is_accessible_by(session.user_id(), session.role) {
        return Err(api::PrivilegeError::Unauthorized.into());
    }

    Ok(Json(lease.into()))
}

/// Request of the [`transit`] endpoint.
#[derive(Debug, Deserialize)]
pub struct TransitRequest {
    /// Action to perform, in `snake_case`.
    pub action: String,

    /// Signature for the signing actions.
    pub signature: Option<String>,
}

/// Performs an action over the lease with the provided ID.
#[tracing::instrument(
    skip_all,
    fields(
        action = %req.action,
        http.route = "PATCH /api/leases/:id",
        lease.id = %id,
        otel.name = "transitLease",
        user.id = %session.user_id(),
    ),
)]
pub async fn transit(
    ctx: Context,
    session: Session,
    Path(id): Path<lease::Id>,
    Json(req): Json<TransitRequest>,
) -> api::Result<Json<Lease>> {
    let TransitRequest { action, signature } = req;
    let action = action
        .parse::<lease::Action>()
        .map_err(|_| LeaseError::InvalidAction)?;

    let lease = ctx
        .service()
        .execute(command::TransitLease {
            lease_id: id,
            initiator_id: session.user_id(),
            initiator_role: session.role,
            action,
            signature: parse_signature(signature)?,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(lease.into()))
}

/// Parses the provided raw `signature` of a [`TransitRequest`].
///
/// A blank one is treated as a missing one.
fn parse_signature(
    signature: Option<String>,
) -> Result<Option<lease::Signature>, LeaseError> {
    match signature {
        Some(s) if !s.trim().is_empty() => lease::Signature::new(s)
            .map(Some)
            .ok_or(LeaseError::SignatureTooLarge),
        Some(_) | None => Ok(None),
    }
}

impl AsError for command::create_lease::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "APPLICATION_NOT_APPROVED"]
                #[status = NOT_FOUND]
                #[message = "Application not found or not approved"]
                ApplicationNotApproved,

                #[code = "END_BEFORE_START"]
                #[status = BAD_REQUEST]
                #[message = "End date must be after start date"]
                EndsBeforeStart,

                #[code = "INVALID_PAYMENT_DUE_DAY"]
                #[status = BAD_REQUEST]
                #[message = "Payment due day must be between 1 and 31"]
                InvalidPaymentDueDay,

                #[code = "NOT_PROPERTY_OWNER"]
                #[status = FORBIDDEN]
                #[message = "Not authorized to create lease for this property"]
                NotOwner,
            }
        }

        match self {
            Self::ApplicationNotApproved(_) => {
                Some(Error::ApplicationNotApproved.into())
            }
            Self::Db(e) => e.try_as_error(),
            Self::EndsBeforeStart => Some(Error::EndsBeforeStart.into()),
            Self::InvalidPaymentDueDay(_) => {
                Some(Error::InvalidPaymentDueDay.into())
            }
            Self::NotOwner(_) => Some(Error::NotOwner.into()),
        }
    }
}

impl AsError for command::transit_lease::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "SIGNATURE_REQUIRED"]
                #[status = BAD_REQUEST]
                #[message = "Signature is required"]
                SignatureRequired,

                #[code = "TENANTS_ONLY"]
                #[status = FORBIDDEN]
                #[message = "Only tenants can sign leases"]
                TenantSignerOnly,

                #[code = "LANDLORDS_ONLY"]
                #[status = FORBIDDEN]
                #[message = "Only landlords can sign leases"]
                LandlordSignerOnly,

                #[code = "LANDLORDS_ONLY"]
                #[status = FORBIDDEN]
                #[message = "Only landlords can request advanced payments"]
                LandlordRequesterOnly,

                #[code = "TENANTS_ONLY"]
                #[status = FORBIDDEN]
                #[message = "Only tenants can pay advanced payments"]
                TenantPayerOnly,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::LeaseNotExists(_) => Some(LeaseError::NotFound.into()),
            Self::NotParticipant(_) => {
                Some(api::PrivilegeError::Unauthorized.into())
            }
            Self::SignatureRequired => Some(Error::SignatureRequired.into()),
            Self::Transition(e) => e.try_as_error(),
            Self::WrongRole(action) => Some(
                match action {
                    lease::Action::SignTenant => Error::TenantSignerOnly,
                    lease::Action::SignLandlord => Error::LandlordSignerOnly,
                    lease::Action::RequestAdvancedPayment => {
                        Error::LandlordRequesterOnly
                    }
                    lease::Action::PayAdvancedPayment => Error::TenantPayerOnly,
                }
                .into(),
            ),
        }
    }
}

impl AsError for lease::TransitionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "NOT_READY_FOR_TENANT_SIGNATURE"]
                #[status = BAD_REQUEST]
                #[message = "Lease is not ready for tenant signature"]
                NotReadyForTenantSignature,

                #[code = "TENANT_MUST_SIGN_FIRST"]
                #[status = BAD_REQUEST]
                #[message = "Tenant must sign first"]
                TenantMustSignFirst,

                #[code = "LEASE_NOT_ACTIVE"]
                #[status = BAD_REQUEST]
                #[message = "Lease must be active"]
                NotActive,

                #[code = "NO_PENDING_ADVANCED_PAYMENT"]
                #[status = BAD_REQUEST]
                #[message = "No pending advanced payment"]
                NoPendingAdvancedPayment,
            }
        }

        Some(
            match self {
                Self::NotReadyForTenantSignature => {
                    Error::NotReadyForTenantSignature
                }
                Self::TenantMustSignFirst => Error::TenantMustSignFirst,
                Self::NotActive => Error::NotActive,
                Self::NoPendingAdvancedPayment => {
                    Error::NoPendingAdvancedPayment
                }
                Self::AmountOverflow => return None,
            }
            .into(),
        )
    }
}

define_error! {
    enum LeaseError {
        #[code = "LEASE_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "Lease not found"]
        NotFound,

        #[code = "INVALID_ACTION"]
        #[status = BAD_REQUEST]
        #[message = "Invalid action"]
        InvalidAction,

        #[code = "SIGNATURE_TOO_LARGE"]
        #[status = BAD_REQUEST]
        #[message = "Signature is too large"]
        SignatureTooLarge,
    }
}

#[cfg(test)]
mod tests {
    use service::{
        command::{create_lease, transit_lease},
        domain::{application, lease, user},
    };

    use crate::{AsError as _, Error};

    use super::{parse_signature, CreateRequest};

    #[test]
    fn parses_create_request() {
        let req: CreateRequest = serde_json::from_value(serde_json::json!({
            "applicationId": application::Id::new().to_string(),
            "startDate": "2025-01-01T00:00:00Z",
            "endDate": "2026-01-01T00:00:00Z",
            "rentAmount": 1200,
            "securityDeposit": "2400.00",
            "paymentDueDay": 5,
            "terms": "No smoking",
            "advancedPayment": {
                "amount": 2400,
                "dueDate": "2025-01-07T00:00:00Z",
            },
        }))
        .unwrap();

        assert_eq!(req.payment_due_day.to_string(), "5");
        assert!(req.advanced_payment.is_some());
        assert!(req.end_date.coerce::<()>() > req.start_date.coerce());
    }

    #[test]
    fn keeps_invalid_due_day_raw() {
        for day in [-3.0, 2.5] {
            let req: CreateRequest = serde_json::from_value(serde_json::json!({
                "applicationId": application::Id::new().to_string(),
                "startDate": "2025-01-01T00:00:00Z",
                "endDate": "2026-01-01T00:00:00Z",
                "rentAmount": 1200,
                "securityDeposit": 2400,
                "paymentDueDay": day,
                "terms": "No smoking",
            }))
            .unwrap();

            assert_eq!(req.payment_due_day.to_bits(), f64::to_bits(day));
        }

        let err = create_lease::ExecutionError::InvalidPaymentDueDay(2.5)
            .into_error();
        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Payment due day must be between 1 and 31");
    }

    #[test]
    fn rejects_oversized_signature() {
        let oversized = "a".repeat(lease::Signature::MAX_LEN + 1);
        let err = Error::from(parse_signature(Some(oversized)).unwrap_err());
        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Signature is too large");

        assert!(parse_signature(Some("  ".to_owned())).unwrap().is_none());
        assert!(parse_signature(None).unwrap().is_none());
        assert!(parse_signature(Some("data:x".to_owned())).unwrap().is_some());
    }

    #[test]
    fn wrong_role_messages_name_the_action() {
        for (action, message) in [
            (lease::Action::SignTenant, "Only tenants can sign leases"),
            (
                lease::Action::SignLandlord,
                "Only landlords can sign leases",
            ),
            (
                lease::Action::RequestAdvancedPayment,
                "Only landlords can request advanced payments",
            ),
            (
                lease::Action::PayAdvancedPayment,
                "Only tenants can pay advanced payments",
            ),
        ] {
            let err = transit_lease::ExecutionError::WrongRole(action)
                .into_error();
            assert_eq!(err.status_code, http::StatusCode::FORBIDDEN);
            assert_eq!(err.message, message);
        }
    }

    #[test]
    fn state_errors_are_bad_requests() {
        let err = transit_lease::ExecutionError::Transition(
            lease::TransitionError::TenantMustSignFirst,
        )
        .into_error();
        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Tenant must sign first");

        let err = transit_lease::ExecutionError::Transition(
            lease::TransitionError::AmountOverflow,
        )
        .into_error();
        assert_eq!(err.status_code, http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn non_approved_application_is_not_found() {
        let err = create_lease::ExecutionError::ApplicationNotApproved(
            application::Id::new(),
        )
        .into_error();
        assert_eq!(err.status_code, http::StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Application not found or not approved");

        let err = create_lease::ExecutionError::NotOwner(user::Id::new())
            .into_error();
        assert_eq!(err.status_code, http::StatusCode::FORBIDDEN);
    }
}
