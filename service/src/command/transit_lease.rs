//! [`Command`] for performing a [`lease::Action`] over a [`Lease`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{lease, user, Lease},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for performing a [`lease::Action`] over a [`Lease`] by one of
/// its parties.
#[derive(Clone, Debug)]
pub struct TransitLease {
    /// ID of the [`Lease`] to perform the [`lease::Action`] over.
    pub lease_id: lease::Id,

    /// ID of the [`User`] performing the [`lease::Action`].
    ///
    /// [`User`]: crate::domain::User
    pub initiator_id: user::Id,

    /// [`user::Role`] of the [`User`] performing the [`lease::Action`].
    ///
    /// [`User`]: crate::domain::User
    pub initiator_role: user::Role,

    /// [`lease::Action`] to perform.
    pub action: lease::Action,

    /// [`lease::Signature`] for the signing [`lease::Action`]s.
    pub signature: Option<lease::Signature>,
}

impl<Db> Command<TransitLease> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Lease, lease::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Lease>, lease::Id>>,
            Ok = Option<Lease>,
            Err = Traced<database::Error>,
        > + Database<Insert<Lease>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Lease;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: TransitLease) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let TransitLease {
            lease_id,
            initiator_id,
            initiator_role,
            action,
            signature,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Concurrent transitions of the same `Lease` are serialized, so the
        // later one observes the state left by the former.
        tx.execute(Lock(By::new(lease_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut lease = tx
            .execute(Select(By::<Option<Lease>, _>::new(lease_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::LeaseNotExists(lease_id))
            .map_err(tracerr::wrap!())?;

        if !lease.is_accessible_by(initiator_id, initiator_role) {
            return Err(tracerr::new!(E::NotParticipant(initiator_id)));
        }
        if action.required_role() != initiator_role {
            return Err(tracerr::new!(E::WrongRole(action)));
        }

        let transition = action
            .into_transition(signature)
            .ok_or(E::SignatureRequired)
            .map_err(tracerr::wrap!())?;
        lease
            .transit(transition, DateTime::now())
            .map_err(tracerr::from_and_wrap!(=> E))?;

        tx.execute(Insert(lease.clone()))
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

/// Error of [`TransitLease`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Lease`] doesn't exist.
    #[display("`Lease(id: {_0})` does not exist")]
    LeaseNotExists(#[error(not(source))] lease::Id),

    /// Initiator is not bound to the [`Lease`].
    #[display("`User(id: {_0})` is not bound to the `Lease`")]
    NotParticipant(#[error(not(source))] user::Id),

    /// Signing [`lease::Action`] is requested without a
    /// [`lease::Signature`].
    #[display("`Signature` is required")]
    SignatureRequired,

    /// [`Lease`] state doesn't allow the [`lease::Action`].
    #[display("`Lease` transition failed: {_0}")]
    #[from]
    Transition(lease::TransitionError),

    /// Initiator's [`user::Role`] is not allowed to perform the
    /// [`lease::Action`].
    #[display("`{_0}` is not allowed for the `User` role")]
    WrongRole(#[error(not(source))] lease::Action),
}

#[cfg(test)]
mod tests {
    use crate::{
        domain::{application, lease, user, Lease, User},
        infra::Memory,
        query, testing, Command as _, Query as _, Service,
    };

    use super::{ExecutionError, TransitLease};

    fn signature() -> lease::Signature {
        "data:image/png;base64,AAAA".parse().unwrap()
    }

    fn cmd(
        lease: &Lease,
        initiator: &User,
        action: lease::Action,
    ) -> TransitLease {
        TransitLease {
            lease_id: lease.id,
            initiator_id: initiator.id,
            initiator_role: initiator.role,
            action,
            signature: action.is_signing().then(signature),
        }
    }

    async fn setup(
        status: lease::Status,
    ) -> (Service<Memory>, User, User, Lease) {
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
        let lease =
            testing::insert_lease(&svc, &application, &landlord, status).await;
        (svc, landlord, tenant, lease)
    }

    #[tokio::test]
    async fn signs_and_pays() {
        let (svc, landlord, tenant, lease) =
            setup(lease::Status::PendingTenantSignature).await;

        for (initiator, action) in [
            (&tenant, lease::Action::SignTenant),
            (&landlord, lease::Action::SignLandlord),
            (&landlord, lease::Action::RequestAdvancedPayment),
            (&tenant, lease::Action::PayAdvancedPayment),
        ] {
            drop(svc.execute(cmd(&lease, initiator, action)).await.unwrap());
        }

        let lease = svc
            .execute(query::lease::ById::by(lease.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(lease.status, lease::Status::Active);
        assert_eq!(lease.tenant_signature, Some(signature()));
        assert_eq!(lease.landlord_signature, Some(signature()));
        let payment = lease.advanced_payment.unwrap();
        assert_eq!(payment.amount, testing::money("2400"));
        assert_eq!(payment.status, lease::advanced_payment::Status::Paid);
        assert!(payment.paid_at.is_some());
    }

    #[tokio::test]
    async fn landlord_cannot_sign_first() {
        let (svc, landlord, _, lease) =
            setup(lease::Status::PendingTenantSignature).await;

        let err = svc
            .execute(cmd(&lease, &landlord, lease::Action::SignLandlord))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Transition(
                lease::TransitionError::TenantMustSignFirst
            ),
        ));
    }

    #[tokio::test]
    async fn checks_binding_before_role() {
        let (svc, _, tenant, lease) = setup(lease::Status::Active).await;
        let stranger = testing::insert_user(&svc, user::Role::Landlord).await;
        let admin = testing::insert_user(&svc, user::Role::Admin).await;

        let err = svc
            .execute(cmd(
                &lease,
                &stranger,
                lease::Action::RequestAdvancedPayment,
            ))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotParticipant(_)));

        let err = svc
            .execute(cmd(&lease, &admin, lease::Action::RequestAdvancedPayment))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::WrongRole(_)));

        let err = svc
            .execute(cmd(&lease, &tenant, lease::Action::RequestAdvancedPayment))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::WrongRole(lease::Action::RequestAdvancedPayment),
        ));
    }

    #[tokio::test]
    async fn serializes_concurrent_signatures() {
        let (svc, _, tenant, lease) =
            setup(lease::Status::PendingTenantSignature).await;

        let (first, second) = tokio::join!(
            svc.execute(cmd(&lease, &tenant, lease::Action::SignTenant)),
            svc.execute(cmd(&lease, &tenant, lease::Action::SignTenant)),
        );

        let errs = [first, second]
            .into_iter()
            .filter_map(Result::err)
            .collect::<Vec<_>>();
        assert_eq!(errs.len(), 1);
        assert!(matches!(
            errs[0].as_ref(),
            ExecutionError::Transition(
                lease::TransitionError::NotReadyForTenantSignature
            ),
        ));
    }

    #[tokio::test]
    async fn requires_signature() {
        let (svc, _, tenant, lease) =
            setup(lease::Status::PendingTenantSignature).await;

        let err = svc
            .execute(TransitLease {
                signature: None,
                ..cmd(&lease, &tenant, lease::Action::SignTenant)
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::SignatureRequired));
    }

    #[tokio::test]
    async fn rejects_unknown_lease() {
        let (svc, _, tenant, mut lease) =
            setup(lease::Status::PendingTenantSignature).await;
        lease.id = lease::Id::new();

        let err = svc
            .execute(cmd(&lease, &tenant, lease::Action::SignTenant))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::LeaseNotExists(_)));
    }
}
