//! [`Command`] for withdrawing an [`Application`].

use common::operations::{
    By, Commit, Insert, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{application, property, user, Application, Property},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for withdrawing an outstanding [`Application`] either by the
/// applicant or by the landlord owning the applied [`Property`].
#[derive(Clone, Copy, Debug)]
pub struct WithdrawApplication {
    /// ID of the [`Application`] to withdraw.
    pub application_id: application::Id,

    /// ID of the [`User`] withdrawing the [`Application`].
    ///
    /// [`User`]: crate::domain::User
    pub initiator_id: user::Id,
}

impl<Db> Command<WithdrawApplication> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Application, application::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Application>, application::Id>>,
            Ok = Option<Application>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<Insert<Application>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Application;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: WithdrawApplication,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let WithdrawApplication {
            application_id,
            initiator_id,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `Application`.
        tx.execute(Lock(By::new(application_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut application = tx
            .execute(Select(By::<Option<Application>, _>::new(application_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ApplicationNotExists(application_id))
            .map_err(tracerr::wrap!())?;

        if application.tenant_id != initiator_id {
            let landlord_id = tx
                .execute(Select(By::<Option<Property>, _>::new(
                    application.property_id,
                )))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .map(|p| p.landlord_id);
            if landlord_id != Some(initiator_id) {
                return Err(tracerr::new!(E::NotParticipant(initiator_id)));
            }
        }

        if !application.is_outstanding() {
            return Err(tracerr::new!(E::NotOutstanding(application.status)));
        }

        application.set_status(application::Status::Withdrawn);
        tx.execute(Insert(application.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(application)
    }
}

/// Error of [`WithdrawApplication`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Application`] doesn't exist.
    #[display("`Application(id: {_0})` does not exist")]
    ApplicationNotExists(#[error(not(source))] application::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Application`] is neither pending nor approved.
    #[display("`Application` is `{_0}`, not outstanding")]
    NotOutstanding(#[error(not(source))] application::Status),

    /// Initiator is neither the applicant nor the owning landlord.
    #[display("`User(id: {_0})` doesn't participate in the `Application`")]
    NotParticipant(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod tests {
    use crate::{
        domain::{application, user},
        testing, Command as _,
    };

    use super::{ExecutionError, WithdrawApplication};

    #[tokio::test]
    async fn withdrawn_by_applicant_or_owner() {
        let svc = testing::service();
        let landlord = testing::insert_user(&svc, user::Role::Landlord).await;
        let tenant = testing::insert_user(&svc, user::Role::Tenant).await;
        let property = testing::insert_property(&svc, &landlord).await;

        for (initiator, status) in [
            (&tenant, application::Status::Pending),
            (&landlord, application::Status::Approved),
        ] {
            let application = testing::insert_application(
                &svc, &property, &tenant, status,
            )
            .await;

            let withdrawn = svc
                .execute(WithdrawApplication {
                    application_id: application.id,
                    initiator_id: initiator.id,
                })
                .await
                .unwrap();

            assert_eq!(withdrawn.status, application::Status::Withdrawn);
        }
    }

    #[tokio::test]
    async fn rejects_stranger() {
        let svc = testing::service();
        let landlord = testing::insert_user(&svc, user::Role::Landlord).await;
        let tenant = testing::insert_user(&svc, user::Role::Tenant).await;
        let admin = testing::insert_user(&svc, user::Role::Admin).await;
        let property = testing::insert_property(&svc, &landlord).await;
        let application = testing::insert_application(
            &svc,
            &property,
            &tenant,
            application::Status::Pending,
        )
        .await;

        let err = svc
            .execute(WithdrawApplication {
                application_id: application.id,
                initiator_id: admin.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotParticipant(_)));
    }

    #[tokio::test]
    async fn rejects_finished_application() {
        let svc = testing::service();
        let landlord = testing::insert_user(&svc, user::Role::Landlord).await;
        let tenant = testing::insert_user(&svc, user::Role::Tenant).await;
        let property = testing::insert_property(&svc, &landlord).await;
        let application = testing::insert_application(
            &svc,
            &property,
            &tenant,
            application::Status::Rejected,
        )
        .await;

        let err = svc
            .execute(WithdrawApplication {
                application_id: application.id,
                initiator_id: tenant.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotOutstanding(_)));
    }
}
