//! [`Command`] for creating a new [`Lease`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        application, lease, property, user, Application, Lease, Property,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Lease`] out of an approved
/// [`Application`] by the landlord owning the applied [`Property`].
///
/// The [`Property`] gets reserved for the applicant, and the [`Lease`] waits
/// for the tenant signature.
#[derive(Clone, Debug)]
pub struct CreateLease {
    /// ID of the landlord creating the [`Lease`].
    pub initiator_id: user::Id,

    /// ID of the approved [`Application`].
    pub application_id: application::Id,

    /// [`lease::StartDateTime`] of the [`Lease`].
    pub start_date: lease::StartDateTime,

    /// [`lease::EndDateTime`] of the [`Lease`].
    pub end_date: lease::EndDateTime,

    /// Monthly rent.
    pub rent_amount: Money,

    /// Security deposit.
    pub security_deposit: Money,

    /// Day of month the rent is due.
    ///
    /// Must be a whole number in `1..=31` range. Kept raw, so any number is
    /// validated only after the ownership checks.
    pub payment_due_day: f64,

    /// [`lease::Terms`] of the [`Lease`].
    pub terms: lease::Terms,

    /// Advance payment to request right away, if any.
    pub advanced_payment: Option<AdvancedPayment>,
}

/// Advance payment requested on a [`Lease`] creation.
#[derive(Clone, Copy, Debug)]
pub struct AdvancedPayment {
    /// Requested amount.
    ///
    /// Zero amount requests nothing.
    pub amount: Money,

    /// [`lease::advanced_payment::DueDateTime`] of the payment.
    pub due_date: lease::advanced_payment::DueDateTime,
}

impl<Db> Command<CreateLease> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Application, application::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Property, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Application>, application::Id>>,
            Ok = Option<Application>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<Insert<Lease>, Err = Traced<database::Error>>
        + Database<Insert<Property>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Lease;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateLease) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateLease {
            initiator_id,
            application_id,
            start_date,
            end_date,
            rent_amount,
            security_deposit,
            payment_due_day,
            terms,
            advanced_payment,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::<Application, _>::new(application_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let application = tx
            .execute(Select(By::<Option<Application>, _>::new(application_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|a| a.status == application::Status::Approved)
            .ok_or(E::ApplicationNotApproved(application_id))
            .map_err(tracerr::wrap!())?;

        tx.execute(Lock(By::<Property, _>::new(application.property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut property = tx
            .execute(Select(By::<Option<Property>, _>::new(
                application.property_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ApplicationNotApproved(application_id))
            .map_err(tracerr::wrap!())?;
        if !property.is_owned_by(initiator_id) {
            return Err(tracerr::new!(E::NotOwner(initiator_id)));
        }

        let payment_due_day = lease::DueDay::from_number(payment_due_day)
            .ok_or(E::InvalidPaymentDueDay(payment_due_day))
            .map_err(tracerr::wrap!())?;
        if end_date.coerce::<()>() <= start_date.coerce() {
            return Err(tracerr::new!(E::EndsBeforeStart));
        }

        let advanced_payment = advanced_payment
            .filter(|p| !p.amount.is_zero())
            .map(|p| lease::AdvancedPayment {
                amount: p.amount,
                due_date: p.due_date,
                status: lease::advanced_payment::Status::Pending,
                paid_at: None,
            });

        let now = DateTime::now();
        let lease = Lease {
            id: lease::Id::new(),
            property_id: property.id,
            tenant_id: application.tenant_id,
            landlord_id: property.landlord_id,
            application_id,
            start_date,
            end_date,
            rent_amount,
            security_deposit,
            payment_due_day,
            terms,
            status: lease::Status::PendingTenantSignature,
            tenant_signature: None,
            landlord_signature: None,
            advanced_payment,
            created_at: now.coerce(),
            updated_at: now.coerce(),
        };

        property.bind_tenant(application.tenant_id, property::Status::Reserved);

        tx.execute(Insert(lease.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Insert(property))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(lease)
    }
}

/// Error of [`CreateLease`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Application`] doesn't exist or is not approved.
    #[display("`Application(id: {_0})` does not exist or is not approved")]
    ApplicationNotApproved(#[error(not(source))] application::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Lease`] ends before it starts.
    #[display("`Lease` ends before it starts")]
    EndsBeforeStart,

    /// Payment due day is not a whole number in `1..=31` range.
    #[display("`{_0}` is not a valid payment due day")]
    InvalidPaymentDueDay(#[error(not(source))] f64),

    /// Initiator doesn't own the applied [`Property`].
    #[display("`User(id: {_0})` doesn't own the `Property`")]
    NotOwner(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod tests {
    use common::DateTime;

    use crate::{
        domain::{application, lease, property, user, Application, User},
        query, testing, Command as _, Query as _,
    };

    use super::{AdvancedPayment, CreateLease, ExecutionError};

    fn cmd(application: &Application, landlord: &User) -> CreateLease {
        let now = DateTime::now();
        CreateLease {
            initiator_id: landlord.id,
            application_id: application.id,
            start_date: now.coerce(),
            end_date: now.add_days(180).coerce(),
            rent_amount: testing::money("1200"),
            security_deposit: testing::money("1200"),
            payment_due_day: 5.0,
            terms: "Pets allowed".parse().unwrap(),
            advanced_payment: None,
        }
    }

    #[tokio::test]
    async fn creates_lease_and_reserves_property() {
        let svc = testing::service();
        let landlord = testing::insert_user(&svc, user::Role::Landlord).await;
        let tenant = testing::insert_user(&svc, user::Role::Tenant).await;
        let property = testing::insert_property(&svc, &landlord).await;
        let application = testing::insert_application(
            &svc,
            &property,
            &tenant,
            application::Status::Approved,
        )
        .await;

        let lease = svc
            .execute(CreateLease {
                advanced_payment: Some(AdvancedPayment {
                    amount: testing::money("600"),
                    due_date: DateTime::now().add_days(3).coerce(),
                }),
                ..cmd(&application, &landlord)
            })
            .await
            .unwrap();

        assert_eq!(lease.status, lease::Status::PendingTenantSignature);
        assert_eq!(lease.tenant_id, tenant.id);
        assert_eq!(lease.landlord_id, landlord.id);
        assert_eq!(lease.payment_due_day, lease::DueDay::new(5).unwrap());
        let payment = lease.advanced_payment.unwrap();
        assert_eq!(payment.amount, testing::money("600"));
        assert_eq!(payment.status, lease::advanced_payment::Status::Pending);

        let property = svc
            .execute(query::property::ById::by(property.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(property.status, property::Status::Reserved);
        assert_eq!(property.current_tenant_id, Some(tenant.id));
    }

    #[tokio::test]
    async fn skips_zero_advanced_payment() {
        let svc = testing::service();
        let landlord = testing::insert_user(&svc, user::Role::Landlord).await;
        let tenant = testing::insert_user(&svc, user::Role::Tenant).await;
        let property = testing::insert_property(&svc, &landlord).await;
        let application = testing::insert_application(
            &svc,
            &property,
            &tenant,
            application::Status::Approved,
        )
        .await;

        let lease = svc
            .execute(CreateLease {
                advanced_payment: Some(AdvancedPayment {
                    amount: testing::money("0"),
                    due_date: DateTime::now().coerce(),
                }),
                ..cmd(&application, &landlord)
            })
            .await
            .unwrap();

        assert!(lease.advanced_payment.is_none());
    }

    #[tokio::test]
    async fn requires_approved_application() {
        let svc = testing::service();
        let landlord = testing::insert_user(&svc, user::Role::Landlord).await;
        let tenant = testing::insert_user(&svc, user::Role::Tenant).await;
        let property = testing::insert_property(&svc, &landlord).await;
        let application = testing::insert_application(
            &svc,
            &property,
            &tenant,
            application::Status::Pending,
        )
        .await;

        let err = svc
            .execute(cmd(&application, &landlord))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::ApplicationNotApproved(_),
        ));
    }

    #[tokio::test]
    async fn rejects_non_owner() {
        let svc = testing::service();
        let landlord = testing::insert_user(&svc, user::Role::Landlord).await;
        let stranger = testing::insert_user(&svc, user::Role::Landlord).await;
        let tenant = testing::insert_user(&svc, user::Role::Tenant).await;
        let property = testing::insert_property(&svc, &landlord).await;
        let application = testing::insert_application(
            &svc,
            &property,
            &tenant,
            application::Status::Approved,
        )
        .await;

        let err = svc
            .execute(cmd(&application, &stranger))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotOwner(_)));
    }

    #[tokio::test]
    async fn checks_ownership_before_due_day() {
        let svc = testing::service();
        let landlord = testing::insert_user(&svc, user::Role::Landlord).await;
        let stranger = testing::insert_user(&svc, user::Role::Landlord).await;
        let tenant = testing::insert_user(&svc, user::Role::Tenant).await;
        let property = testing::insert_property(&svc, &landlord).await;
        let application = testing::insert_application(
            &svc,
            &property,
            &tenant,
            application::Status::Approved,
        )
        .await;

        let err = svc
            .execute(CreateLease {
                payment_due_day: -1.5,
                ..cmd(&application, &stranger)
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotOwner(_)));
    }

    #[tokio::test]
    async fn validates_terms() {
        let svc = testing::service();
        let landlord = testing::insert_user(&svc, user::Role::Landlord).await;
        let tenant = testing::insert_user(&svc, user::Role::Tenant).await;
        let property = testing::insert_property(&svc, &landlord).await;
        let application = testing::insert_application(
            &svc,
            &property,
            &tenant,
            application::Status::Approved,
        )
        .await;

        for day in [0.0, 32.0, 300.0, -3.0, 2.5, f64::NAN] {
            let err = svc
                .execute(CreateLease {
                    payment_due_day: day,
                    ..cmd(&application, &landlord)
                })
                .await
                .unwrap_err();
            assert!(matches!(
                err.as_ref(),
                ExecutionError::InvalidPaymentDueDay(d)
                    if d.to_bits() == day.to_bits(),
            ));
        }

        let now = DateTime::now();
        let err = svc
            .execute(CreateLease {
                start_date: now.add_days(10).coerce(),
                end_date: now.coerce(),
                ..cmd(&application, &landlord)
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::EndsBeforeStart));
    }
}
