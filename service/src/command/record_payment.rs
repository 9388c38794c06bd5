//! [`Command`] for recording a new [`Payment`].

use common::{
    operations::{By, Insert, Select},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{payment, user, Payment, Property},
    infra::{database, Database},
    read, Service,
};

use super::Command;

/// [`Command`] for recording a new [`Payment`] by a tenant for the
/// [`Property`] the tenant currently occupies.
///
/// The [`Payment`] stays [`payment::Status::Pending`] until the landlord
/// settles it.
#[derive(Clone, Debug)]
pub struct RecordPayment {
    /// ID of the paying tenant.
    pub tenant_id: user::Id,

    /// Paid amount.
    pub amount: Money,

    /// [`payment::Method`] of the [`Payment`].
    pub method: payment::Method,

    /// [`payment::TransactionId`] of the [`Payment`].
    ///
    /// Generated if not provided.
    pub transaction_id: Option<payment::TransactionId>,
}

impl<Db> Command<RecordPayment> for Service<Db>
where
    Db: Database<
            Select<By<Vec<Property>, read::property::list::Filter>>,
            Ok = Vec<Property>,
            Err = Traced<database::Error>,
        > + Database<Insert<Payment>, Err = Traced<database::Error>>,
{
    type Ok = Payment;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: RecordPayment) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RecordPayment {
            tenant_id,
            amount,
            method,
            transaction_id,
        } = cmd;

        let property = self
            .database()
            .execute(Select(By::<Vec<Property>, _>::new(
                read::property::list::Filter {
                    current_tenant_id: Some(tenant_id),
                    ..read::property::list::Filter::default()
                },
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .into_iter()
            .next()
            .ok_or(E::NoRentedProperty(tenant_id))
            .map_err(tracerr::wrap!())?;

        let now = DateTime::now();
        let payment = Payment {
            id: payment::Id::new(),
            tenant_id,
            property_id: property.id,
            amount,
            date: now.coerce(),
            status: payment::Status::Pending,
            method,
            transaction_id: transaction_id
                .unwrap_or_else(payment::TransactionId::generate),
            created_at: now.coerce(),
            updated_at: now.coerce(),
        };

        let inserted = self.database().execute(Insert(payment.clone())).await;
        if inserted.as_ref().is_err_and(|e| {
            e.as_ref().is_unique_violation(Some(
                database::constraint::PAYMENTS_TRANSACTION_ID,
            ))
        }) {
            return Err(tracerr::new!(E::TransactionIdOccupied(
                payment.transaction_id
            )));
        }
        inserted
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(payment)
    }
}

/// Error of [`RecordPayment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Tenant doesn't occupy any [`Property`].
    #[display("`User(id: {_0})` doesn't occupy any `Property`")]
    NoRentedProperty(#[error(not(source))] user::Id),

    /// [`payment::TransactionId`] is already recorded.
    #[display("`{_0}` transaction is already recorded")]
    TransactionIdOccupied(#[error(not(source))] payment::TransactionId),
}

#[cfg(test)]
mod tests {
    use common::operations::Insert;

    use crate::{
        domain::{payment, property, user, User},
        infra::{Database as _, Memory},
        testing, Command as _, Service,
    };

    use super::{ExecutionError, RecordPayment};

    fn cmd(tenant: &User) -> RecordPayment {
        RecordPayment {
            tenant_id: tenant.id,
            amount: testing::money("1200"),
            method: payment::Method::BankTransfer,
            transaction_id: None,
        }
    }

    async fn rent_out(svc: &Service<Memory>, tenant: &User) {
        let landlord = testing::insert_user(svc, user::Role::Landlord).await;
        let mut property = testing::insert_property(svc, &landlord).await;
        property.bind_tenant(tenant.id, property::Status::Rented);
        svc.database().execute(Insert(property)).await.unwrap();
    }

    #[tokio::test]
    async fn records_pending_payment() {
        let svc = testing::service();
        let tenant = testing::insert_user(&svc, user::Role::Tenant).await;
        rent_out(&svc, &tenant).await;

        let payment = svc.execute(cmd(&tenant)).await.unwrap();

        assert_eq!(payment.status, payment::Status::Pending);
        assert_eq!(payment.tenant_id, tenant.id);
        assert!(payment.transaction_id.as_ref().starts_with("txn_"));
    }

    #[tokio::test]
    async fn rejects_duplicate_transaction() {
        let svc = testing::service();
        let tenant = testing::insert_user(&svc, user::Role::Tenant).await;
        rent_out(&svc, &tenant).await;
        let txn: payment::TransactionId = "txn_42".parse().unwrap();
        drop(
            svc.execute(RecordPayment {
                transaction_id: Some(txn.clone()),
                ..cmd(&tenant)
            })
            .await
            .unwrap(),
        );

        let err = svc
            .execute(RecordPayment {
                transaction_id: Some(txn),
                ..cmd(&tenant)
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::TransactionIdOccupied(_),
        ));
    }

    #[tokio::test]
    async fn requires_rented_property() {
        let svc = testing::service();
        let tenant = testing::insert_user(&svc, user::Role::Tenant).await;

        let err = svc.execute(cmd(&tenant)).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NoRentedProperty(_)));
    }
}
