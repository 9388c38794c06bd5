//! [`Payment`]-related endpoints.

use common::{DateTime, Money};
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _},
    domain::{self, payment, property, user},
    query, read, Query as _,
};

use crate::{
    api::{self, Created, Json, Path, StatusError},
    define_error, AsError, Context, Error, Session,
};

/// Rent [`domain::Payment`] of a tenant.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// ID of this [`Payment`].
    pub id: payment::Id,

    /// ID of the paying tenant.
    pub tenant: user::Id,

    /// ID of the paid property.
    pub property: property::Id,

    /// Paid amount.
    pub amount: Money,

    /// When this [`Payment`] was made.
    pub date: DateTime,

    /// Status of this [`Payment`].
    pub status: payment::Status,

    /// Method this [`Payment`] is made with.
    pub payment_method: payment::Method,

    /// External transaction ID of this [`Payment`].
    pub transaction_id: payment::TransactionId,

    /// When this [`Payment`] was recorded.
    pub created_at: DateTime,

    /// When this [`Payment`] was modified the last time.
    pub updated_at: DateTime,
}

impl From<domain::Payment> for Payment {
    fn from(p: domain::Payment) -> Self {
        Self {
            id: p.id,
            tenant: p.tenant_id,
            property: p.property_id,
            amount: p.amount,
            date: p.date.coerce(),
            status: p.status,
            payment_method: p.method,
            transaction_id: p.transaction_id,
            created_at: p.created_at.coerce(),
            updated_at: p.updated_at.coerce(),
        }
    }
}

/// Request of the [`record`] endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordRequest {
    /// Paid amount.
    pub amount: Money,

    /// Method the payment is made with.
    pub payment_method: payment::Method,

    /// External transaction ID, generated if omitted.
    pub transaction_id: Option<payment::TransactionId>,
}

/// Records a payment of the authenticated tenant for the occupied property.
#[tracing::instrument(
    skip_all,
    fields(
        http.route = "POST /api/payments",
        otel.name = "recordPayment",
        user.id = %session.user_id(),
    ),
)]
pub async fn record(
    ctx: Context,
    session: Session,
    Json(req): Json<RecordRequest>,
) -> api::Result<Created<Payment>> {
    session.require(&[user::Role::Tenant])?;

    let RecordRequest {
        amount,
        payment_method,
        transaction_id,
    } = req;
    let payment = ctx
        .service()
        .execute(command::RecordPayment {
            tenant_id: session.user_id(),
            amount,
            method: payment_method,
            transaction_id,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Created(payment.into()))
}

/// Lists payments visible to the authenticated user.
#[tracing::instrument(
    skip_all,
    fields(
        http.route = "GET /api/payments",
        otel.name = "listPayments",
        user.id = %session.user_id(),
    ),
)]
pub async fn list(
    ctx: Context,
    session: Session,
) -> api::Result<Json<Vec<Payment>>> {
    let filter = match session.role {
        user::Role::Tenant => read::payment::list::Filter {
            tenant_id: Some(session.user_id()),
            landlord_id: None,
        },
        user::Role::Landlord => read::payment::list::Filter {
            tenant_id: None,
            landlord_id: Some(session.user_id()),
        },
        user::Role::Admin => read::payment::list::Filter::default(),
    };

    let payments = ctx
        .service()
        .execute(query::payment::List::by(filter))
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(payments.into_iter().map(Into::into).collect()))
}

/// Request of the [`settle`] endpoint.
#[derive(Debug, Deserialize)]
pub struct SettleRequest {
    /// Settled status, either `completed` or `failed`.
    pub status: String,
}

/// Settles the pending payment with the provided ID.
#[tracing::instrument(
    skip_all,
    fields(
        http.route = "PATCH /api/payments/:id",
        otel.name = "settlePayment",
        payment.id = %id,
        status = %req.status,
        user.id = %session.user_id(),
    ),
)]
pub async fn settle(
    ctx: Context,
    session: Session,
    Path(id): Path<payment::Id>,
    Json(req): Json<SettleRequest>,
) -> api::Result<Json<Payment>> {
    session.require(&[user::Role::Landlord])?;

    let status = req
        .status
        .parse::<payment::Status>()
        .map_err(|_| StatusError::Invalid)?;
    let payment = ctx
        .service()
        .execute(command::SettlePayment {
            payment_id: id,
            initiator_id: session.user_id(),
            status,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(payment.into()))
}

impl AsError for command::record_payment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "NO_RENTED_PROPERTY"]
                #[status = BAD_REQUEST]
                #[message = "No rented property"]
                NoRentedProperty,

                #[code = "TRANSACTION_ID_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "Transaction is already recorded"]
                TransactionIdOccupied,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NoRentedProperty(_) => Some(Error::NoRentedProperty.into()),
            Self::TransactionIdOccupied(_) => {
                Some(Error::TransactionIdOccupied.into())
            }
        }
    }
}

impl AsError for command::settle_payment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "PAYMENT_NOT_FOUND"]
                #[status = NOT_FOUND]
                #[message = "Payment not found"]
                NotFound,

                #[code = "PAYMENT_NOT_PENDING"]
                #[status = BAD_REQUEST]
                #[message = "Payment is not pending"]
                NotPending,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InvalidStatus(_) => Some(StatusError::Invalid.into()),
            Self::NotOwner(_) => Some(api::PrivilegeError::Unauthorized.into()),
            Self::NotPending(_) => Some(Error::NotPending.into()),
            Self::PaymentNotExists(_) => Some(Error::NotFound.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use service::{
        command::{record_payment, settle_payment},
        domain::{payment, user},
    };

    use crate::AsError as _;

    use super::RecordRequest;

    #[test]
    fn transaction_id_is_optional() {
        let req: RecordRequest = serde_json::from_value(serde_json::json!({
            "amount": 1200,
            "paymentMethod": "bank_transfer",
        }))
        .unwrap();

        assert_eq!(req.payment_method, payment::Method::BankTransfer);
        assert!(req.transaction_id.is_none());
    }

    #[test]
    fn maps_payment_errors() {
        let err =
            record_payment::ExecutionError::NoRentedProperty(user::Id::new())
                .into_error();
        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "No rented property");

        let err = record_payment::ExecutionError::TransactionIdOccupied(
            payment::TransactionId::generate(),
        )
        .into_error();
        assert_eq!(err.status_code, http::StatusCode::CONFLICT);

        let err = settle_payment::ExecutionError::NotPending(
            payment::Status::Completed,
        )
        .into_error();
        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
    }
}
