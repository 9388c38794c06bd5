//! Dashboard endpoints.

use common::{DateTime, Money};
use serde::Serialize;
use service::{
    domain::user,
    query::{self, dashboard},
    Query as _,
};

use crate::{
    api::{self, payment::Payment, property::Property, user::User, Json},
    context, AsError, Context, Error, Session,
};

/// Dashboard of a tenant.
#[derive(Clone, Debug, Serialize)]
pub struct Tenant {
    /// Occupied property, if any.
    pub property: Option<Property>,

    /// Payments summary for the occupied property.
    pub payments: TenantPayments,

    /// Profile of the tenant.
    pub profile: User,
}

/// Payments summary of a [`Tenant`] dashboard.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantPayments {
    /// The most recent payment.
    pub last_payment: Option<Payment>,

    /// The next rent payment.
    pub upcoming_payment: Option<UpcomingPayment>,
}

/// Next rent payment of a tenant.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingPayment {
    /// Amount to be paid.
    pub amount: Money,

    /// When the payment is due.
    pub due_date: DateTime,
}

impl From<dashboard::TenantOutput> for Tenant {
    fn from(out: dashboard::TenantOutput) -> Self {
        Self {
            property: out.property.map(Into::into),
            payments: TenantPayments {
                last_payment: out.last_payment.map(Into::into),
                upcoming_payment: out.upcoming_payment.map(|p| {
                    UpcomingPayment {
                        amount: p.amount,
                        due_date: p.due_date.coerce(),
                    }
                }),
            },
            profile: out.profile.into(),
        }
    }
}

/// Returns the dashboard of the authenticated tenant.
#[tracing::instrument(
    skip_all,
    fields(
        http.route = "GET /api/dashboard/tenant",
        otel.name = "tenantDashboard",
        user.id = %session.user_id(),
    ),
)]
pub async fn tenant(
    ctx: Context,
    session: Session,
) -> api::Result<Json<Tenant>> {
    session.require(&[user::Role::Tenant])?;

    let out = ctx
        .service()
        .execute(query::TenantDashboard {
            tenant_id: session.user_id(),
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(out.into()))
}

/// Dashboard of a landlord.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Landlord {
    /// Properties of the landlord, newest first.
    pub properties: Vec<Property>,

    /// Total number of properties.
    pub total_properties: usize,

    /// Number of rented properties.
    pub rented_properties: usize,

    /// Number of available properties.
    pub available_properties: usize,

    /// Sum of the rent over the rented properties.
    pub total_revenue: Money,

    /// Profile of the landlord.
    pub profile: User,
}

impl From<dashboard::LandlordOutput> for Landlord {
    fn from(out: dashboard::LandlordOutput) -> Self {
        Self {
            total_properties: out.total_properties(),
            rented_properties: out.rented_properties,
            available_properties: out.available_properties,
            total_revenue: out.total_revenue,
            properties: out.properties.into_iter().map(Into::into).collect(),
            profile: out.profile.into(),
        }
    }
}

/// Returns the dashboard of the authenticated landlord.
#[tracing::instrument(
    skip_all,
    fields(
        http.route = "GET /api/dashboard/landlord",
        otel.name = "landlordDashboard",
        user.id = %session.user_id(),
    ),
)]
pub async fn landlord(
    ctx: Context,
    session: Session,
) -> api::Result<Json<Landlord>> {
    session.require(&[user::Role::Landlord])?;

    let out = ctx
        .service()
        .execute(query::LandlordDashboard {
            landlord_id: session.user_id(),
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(out.into()))
}

impl AsError for dashboard::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::UserNotExists(_) => {
                Some(context::AuthError::UserNotFound.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use common::{DateTime, Money};
    use service::{
        domain::{self, user},
        query::dashboard,
    };

    use super::{Landlord, Tenant};

    fn profile(role: user::Role) -> domain::User {
        domain::User {
            id: user::Id::new(),
            name: user::Name::new("Jane").unwrap(),
            email: user::Email::new("jane@example.com").unwrap(),
            password_hash: user::PasswordHash::new(
                &user::Password::new("correct horse").unwrap(),
            )
            .unwrap(),
            role,
            phone: None,
            profile_picture: None,
            address: None,
            created_at: DateTime::now().coerce(),
            updated_at: DateTime::now().coerce(),
            deleted_at: None,
        }
    }

    #[test]
    fn tenant_without_property() {
        let json = serde_json::to_value(Tenant::from(dashboard::TenantOutput {
            profile: profile(user::Role::Tenant),
            property: None,
            last_payment: None,
            upcoming_payment: Some(dashboard::UpcomingPayment {
                amount: "900".parse().unwrap(),
                due_date: DateTime::now().coerce(),
            }),
        }))
        .unwrap();

        assert!(json["property"].is_null());
        assert!(json["payments"]["lastPayment"].is_null());
        assert_eq!(json["payments"]["upcomingPayment"]["amount"], 900.0);
        assert!(json["payments"]["upcomingPayment"]["dueDate"].is_string());
        assert_eq!(json["profile"]["role"], "Tenant");
    }

    #[test]
    fn landlord_statistics() {
        let json =
            serde_json::to_value(Landlord::from(dashboard::LandlordOutput {
                profile: profile(user::Role::Landlord),
                properties: vec![],
                rented_properties: 0,
                available_properties: 0,
                total_revenue: Money::default(),
            }))
            .unwrap();

        assert_eq!(json["totalProperties"], 0);
        assert_eq!(json["totalRevenue"], 0.0);
        assert_eq!(json["properties"], serde_json::json!([]));
    }
}
