//! [`Command`] for settling a [`Payment`].

use common::operations::{
    By, Commit, Insert, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{payment, property, user, Payment, Property},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for settling a pending [`Payment`] by the landlord owning the
/// paid [`Property`].
#[derive(Clone, Copy, Debug)]
pub struct SettlePayment {
    /// ID of the [`Payment`] to settle.
    pub payment_id: payment::Id,

    /// ID of the landlord settling the [`Payment`].
    pub initiator_id: user::Id,

    /// Settled [`payment::Status`].
    pub status: payment::Status,
}

impl<Db> Command<SettlePayment> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Payment, payment::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Payment>, payment::Id>>,
            Ok = Option<Payment>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<Insert<Payment>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Payment;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: SettlePayment) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SettlePayment {
            payment_id,
            initiator_id,
            status,
        } = cmd;

        if !status.is_settlement() {
            return Err(tracerr::new!(E::InvalidStatus(status)));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent settlements of the same `Payment`.
        tx.execute(Lock(By::new(payment_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut payment = tx
            .execute(Select(By::<Option<Payment>, _>::new(payment_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PaymentNotExists(payment_id))
            .map_err(tracerr::wrap!())?;

        let owned = tx
            .execute(Select(By::<Option<Property>, _>::new(
                payment.property_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .is_some_and(|p| p.is_owned_by(initiator_id));
        if !owned {
            return Err(tracerr::new!(E::NotOwner(initiator_id)));
        }

        if !payment.settle(status) {
            return Err(tracerr::new!(E::NotPending(payment.status)));
        }

        tx.execute(Insert(payment.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(payment)
    }
}

/// Error of [`SettlePayment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`payment::Status`] is not a settlement.
    #[display("`{_0}` is not a settlement")]
    InvalidStatus(#[error(not(source))] payment::Status),

    /// Initiator doesn't own the paid [`Property`].
    #[display("`User(id: {_0})` doesn't own the `Property`")]
    NotOwner(#[error(not(source))] user::Id),

    /// [`Payment`] is settled already.
    #[display("`Payment` is `{_0}`, not pending")]
    NotPending(#[error(not(source))] payment::Status),

    /// [`Payment`] doesn't exist.
    #[display("`Payment(id: {_0})` does not exist")]
    PaymentNotExists(#[error(not(source))] payment::Id),
}

#[cfg(test)]
mod tests {
    use common::{operations::Insert, DateTime};

    use crate::{
        domain::{payment, user, Payment, Property, User},
        infra::{Database as _, Memory},
        testing, Command as _, Service,
    };

    use super::{ExecutionError, SettlePayment};

    async fn insert_payment(
        svc: &Service<Memory>,
        property: &Property,
        tenant: &User,
    ) -> Payment {
        let now = DateTime::now();
        let payment = Payment {
            id: payment::Id::new(),
            tenant_id: tenant.id,
            property_id: property.id,
            amount: testing::money("1200"),
            date: now.coerce(),
            status: payment::Status::Pending,
            method: payment::Method::Cash,
            transaction_id: payment::TransactionId::generate(),
            created_at: now.coerce(),
            updated_at: now.coerce(),
        };
        svc.database()
            .execute(Insert(payment.clone()))
            .await
            .unwrap();
        payment
    }

    #[tokio::test]
    async fn settles_once() {
        let svc = testing::service();
        let landlord = testing::insert_user(&svc, user::Role::Landlord).await;
        let tenant = testing::insert_user(&svc, user::Role::Tenant).await;
        let property = testing::insert_property(&svc, &landlord).await;
        let payment = insert_payment(&svc, &property, &tenant).await;
        let settle = SettlePayment {
            payment_id: payment.id,
            initiator_id: landlord.id,
            status: payment::Status::Completed,
        };

        let settled = svc.execute(settle).await.unwrap();
        assert_eq!(settled.status, payment::Status::Completed);

        let err = svc
            .execute(SettlePayment {
                status: payment::Status::Failed,
                ..settle
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::NotPending(payment::Status::Completed),
        ));
    }

    #[tokio::test]
    async fn rejects_non_owner_and_non_settlement() {
        let svc = testing::service();
        let landlord = testing::insert_user(&svc, user::Role::Landlord).await;
        let stranger = testing::insert_user(&svc, user::Role::Landlord).await;
        let tenant = testing::insert_user(&svc, user::Role::Tenant).await;
        let property = testing::insert_property(&svc, &landlord).await;
        let payment = insert_payment(&svc, &property, &tenant).await;

        let err = svc
            .execute(SettlePayment {
                payment_id: payment.id,
                initiator_id: stranger.id,
                status: payment::Status::Completed,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotOwner(_)));

        let err = svc
            .execute(SettlePayment {
                payment_id: payment.id,
                initiator_id: landlord.id,
                status: payment::Status::Pending,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::InvalidStatus(_)));
    }
}
