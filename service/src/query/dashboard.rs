//! Dashboard [`Query`]s definitions.

use common::{
    operations::{By, Select},
    unit, DateTime, DateTimeOf, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{property, user, Payment, Property, User},
    infra::{database, Database},
    read, Query, Service,
};

/// [`Query`] for the dashboard of a tenant.
#[derive(Clone, Copy, Debug)]
pub struct TenantDashboard {
    /// ID of the tenant [`User`].
    pub tenant_id: user::Id,
}

/// Output of the [`TenantDashboard`] [`Query`].
#[derive(Clone, Debug)]
pub struct TenantOutput {
    /// Profile of the tenant.
    pub profile: User,

    /// [`Property`] the tenant currently occupies, if any.
    pub property: Option<Property>,

    /// The most recent [`Payment`] for the occupied [`Property`].
    pub last_payment: Option<Payment>,

    /// Next rent payment for the occupied [`Property`].
    pub upcoming_payment: Option<UpcomingPayment>,
}

/// Upcoming rent payment of a tenant.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct UpcomingPayment {
    /// Amount to be paid.
    pub amount: Money,

    /// [`DateTime`] the payment is due at.
    pub due_date: UpcomingDueDateTime,
}

impl UpcomingPayment {
    /// Number of days, from today, an [`UpcomingPayment`] is due in.
    pub const DUE_IN_DAYS: u32 = 30;
}

/// [`DateTime`] an [`UpcomingPayment`] is due at.
pub type UpcomingDueDateTime = DateTimeOf<(UpcomingPayment, unit::Due)>;

impl<Db> Query<TenantDashboard> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Property>, read::property::list::Filter>>,
            Ok = Vec<Property>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Payment>, read::payment::list::Filter>>,
            Ok = Vec<Payment>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = TenantOutput;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        query: TenantDashboard,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let TenantDashboard { tenant_id } = query;

        let profile = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(tenant_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(tenant_id))
            .map_err(tracerr::wrap!())?;

        let property = self
            .database()
            .execute(Select(By::new(read::property::list::Filter {
                current_tenant_id: Some(tenant_id),
                ..read::property::list::Filter::default()
            })))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .into_iter()
            .next();

        let mut output = TenantOutput {
            profile,
            property: None,
            last_payment: None,
            upcoming_payment: None,
        };
        let Some(property) = property else {
            return Ok(output);
        };

        output.last_payment = self
            .database()
            .execute(Select(By::new(read::payment::list::Filter {
                tenant_id: Some(tenant_id),
                landlord_id: None,
            })))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .into_iter()
            .find(|p| p.property_id == property.id);
        output.upcoming_payment = Some(UpcomingPayment {
            amount: property.rent,
            due_date: DateTime::now()
                .add_days(UpcomingPayment::DUE_IN_DAYS)
                .coerce(),
        });
        output.property = Some(property);

        Ok(output)
    }
}

/// [`Query`] for the dashboard of a landlord.
#[derive(Clone, Copy, Debug)]
pub struct LandlordDashboard {
    /// ID of the landlord [`User`].
    pub landlord_id: user::Id,
}

/// Output of the [`LandlordDashboard`] [`Query`].
#[derive(Clone, Debug)]
pub struct LandlordOutput {
    /// Profile of the landlord.
    pub profile: User,

    /// [`Property`]s of the landlord, newest first.
    pub properties: Vec<Property>,

    /// Number of [`property::Status::Rented`] [`Property`]s.
    pub rented_properties: usize,

    /// Number of [`property::Status::Available`] [`Property`]s.
    pub available_properties: usize,

    /// Sum of the rent over the rented [`Property`]s.
    pub total_revenue: Money,
}

impl LandlordOutput {
    /// Returns the total number of [`Property`]s of the landlord.
    #[must_use]
    pub fn total_properties(&self) -> usize {
        self.properties.len()
    }
}

impl<Db> Query<LandlordDashboard> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Property>, read::property::list::Filter>>,
            Ok = Vec<Property>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = LandlordOutput;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        query: LandlordDashboard,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let LandlordDashboard { landlord_id } = query;

        let profile = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(landlord_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(landlord_id))
            .map_err(tracerr::wrap!())?;

        let properties = self
            .database()
            .execute(Select(By::new(read::property::list::Filter {
                landlord_id: Some(landlord_id),
                ..read::property::list::Filter::default()
            })))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let rented = || {
            properties
                .iter()
                .filter(|p| p.status == property::Status::Rented)
        };
        Ok(LandlordOutput {
            rented_properties: rented().count(),
            available_properties: properties
                .iter()
                .filter(|p| p.status == property::Status::Available)
                .count(),
            total_revenue: rented().map(|p| p.rent).sum(),
            profile,
            properties,
        })
    }
}

/// Error of dashboard [`Query`]s execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`User`] the dashboard is requested for does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod tests {
    use common::{operations::Insert, DateTime};

    use crate::{
        domain::{payment, property, user, Payment},
        infra::Database as _,
        testing::{self, money},
        Query as _,
    };

    use super::{LandlordDashboard, TenantDashboard, UpcomingPayment};

    #[tokio::test]
    async fn landlord_statistics() {
        let svc = testing::service();
        let landlord = testing::insert_user(&svc, user::Role::Landlord).await;
        let tenant = testing::insert_user(&svc, user::Role::Tenant).await;
        let stranger = testing::insert_user(&svc, user::Role::Landlord).await;

        for (owner, rent, status) in [
            (&landlord, "1000", property::Status::Rented),
            (&landlord, "1500.5", property::Status::Rented),
            (&landlord, "700", property::Status::Available),
            (&landlord, "900", property::Status::Maintenance),
            (&stranger, "5000", property::Status::Rented),
        ] {
            let mut p = testing::insert_property(&svc, owner).await;
            p.rent = money(rent);
            p.bind_tenant(tenant.id, status);
            svc.database().execute(Insert(p)).await.unwrap();
        }

        let out = svc
            .execute(LandlordDashboard {
                landlord_id: landlord.id,
            })
            .await
            .unwrap();

        assert_eq!(out.total_properties(), 4);
        assert_eq!(out.rented_properties, 2);
        assert_eq!(out.available_properties, 1);
        assert_eq!(out.total_revenue, money("2500.5"));
        assert_eq!(out.profile.id, landlord.id);
    }

    #[tokio::test]
    async fn tenant_without_property() {
        let svc = testing::service();
        let tenant = testing::insert_user(&svc, user::Role::Tenant).await;

        let out = svc
            .execute(TenantDashboard {
                tenant_id: tenant.id,
            })
            .await
            .unwrap();

        assert_eq!(out.profile.id, tenant.id);
        assert!(out.property.is_none());
        assert!(out.last_payment.is_none());
        assert!(out.upcoming_payment.is_none());
    }

    #[tokio::test]
    async fn tenant_with_property() {
        let svc = testing::service();
        let landlord = testing::insert_user(&svc, user::Role::Landlord).await;
        let tenant = testing::insert_user(&svc, user::Role::Tenant).await;
        let mut home = testing::insert_property(&svc, &landlord).await;
        home.bind_tenant(tenant.id, property::Status::Rented);
        svc.database().execute(Insert(home.clone())).await.unwrap();

        let payment = |date: &str| Payment {
            id: payment::Id::new(),
            tenant_id: tenant.id,
            property_id: home.id,
            amount: home.rent,
            date: DateTime::from_rfc3339(date).unwrap().coerce(),
            status: payment::Status::Completed,
            method: payment::Method::Cash,
            transaction_id: payment::TransactionId::generate(),
            created_at: DateTime::now().coerce(),
            updated_at: DateTime::now().coerce(),
        };
        let latest = payment("2024-03-01");
        svc.database().execute(Insert(latest.clone())).await.unwrap();
        svc.database()
            .execute(Insert(payment("2024-02-01")))
            .await
            .unwrap();

        let out = svc
            .execute(TenantDashboard {
                tenant_id: tenant.id,
            })
            .await
            .unwrap();

        assert_eq!(out.property.map(|p| p.id), Some(home.id));
        assert_eq!(out.last_payment.map(|p| p.id), Some(latest.id));

        let upcoming = out.upcoming_payment.unwrap();
        assert_eq!(upcoming.amount, home.rent);
        assert!(
            upcoming.due_date.coerce::<()>()
                > DateTime::now().add_days(UpcomingPayment::DUE_IN_DAYS - 1),
        );
    }

    #[tokio::test]
    async fn unknown_user() {
        let svc = testing::service();
        assert!(svc
            .execute(TenantDashboard {
                tenant_id: user::Id::new(),
            })
            .await
            .is_err());
    }
}
