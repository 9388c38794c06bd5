//! [`Command`] for deciding upon an [`Application`].

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

/// [`Command`] for approving or rejecting a pending [`Application`] by the
/// landlord owning the applied [`Property`].
///
/// Approval rents the [`Property`] out to the applicant.
#[derive(Clone, Copy, Debug)]
pub struct DecideApplication {
    /// ID of the [`Application`] to decide upon.
    pub application_id: application::Id,

    /// ID of the landlord making the decision.
    pub initiator_id: user::Id,

    /// Decided [`application::Status`].
    pub status: application::Status,
}

impl<Db> Command<DecideApplication> for Service<Db>
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
        > + Database<Insert<Application>, Err = Traced<database::Error>>
        + Database<Insert<Property>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Application;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DecideApplication,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DecideApplication {
            application_id,
            initiator_id,
            status,
        } = cmd;

        if !status.is_decision() {
            return Err(tracerr::new!(E::InvalidStatus(status)));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent decisions upon the same `Application`.
        tx.execute(Lock(By::<Application, _>::new(application_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut application = tx
            .execute(Select(By::<Option<Application>, _>::new(application_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ApplicationNotExists(application_id))
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
            .ok_or(E::ApplicationNotExists(application_id))
            .map_err(tracerr::wrap!())?;
        if !property.is_owned_by(initiator_id) {
            return Err(tracerr::new!(E::NotOwner(initiator_id)));
        }

        if application.status != application::Status::Pending {
            return Err(tracerr::new!(E::NotPending(application.status)));
        }

        application.set_status(status);
        tx.execute(Insert(application.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if status == application::Status::Approved {
            property.bind_tenant(application.tenant_id, property::Status::Rented);
            tx.execute(Insert(property))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(application)
    }
}

/// Error of [`DecideApplication`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Application`] doesn't exist.
    #[display("`Application(id: {_0})` does not exist")]
    ApplicationNotExists(#[error(not(source))] application::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`application::Status`] is not a decision.
    #[display("`{_0}` is not a decision")]
    InvalidStatus(#[error(not(source))] application::Status),

    /// Initiator doesn't own the applied [`Property`].
    #[display("`User(id: {_0})` doesn't own the `Property`")]
    NotOwner(#[error(not(source))] user::Id),

    /// [`Application`] has been decided already.
    #[display("`Application` is `{_0}`, not pending")]
    NotPending(#[error(not(source))] application::Status),
}

#[cfg(test)]
mod tests {
    use crate::{
        domain::{application, property, user, Application, User},
        query, testing, Command as _, Query as _,
    };

    use super::{DecideApplication, ExecutionError};

    fn cmd(
        application: &Application,
        initiator: &User,
        status: application::Status,
    ) -> DecideApplication {
        DecideApplication {
            application_id: application.id,
            initiator_id: initiator.id,
            status,
        }
    }

    #[tokio::test]
    async fn approval_rents_property_out() {
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

        let decided = svc
            .execute(cmd(&application, &landlord, application::Status::Approved))
            .await
            .unwrap();
        assert_eq!(decided.status, application::Status::Approved);

        let property = svc
            .execute(query::property::ById::by(property.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(property.status, property::Status::Rented);
        assert_eq!(property.current_tenant_id, Some(tenant.id));
    }

    #[tokio::test]
    async fn rejection_keeps_property_available() {
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

        let decided = svc
            .execute(cmd(&application, &landlord, application::Status::Rejected))
            .await
            .unwrap();
        assert_eq!(decided.status, application::Status::Rejected);

        let property = svc
            .execute(query::property::ById::by(property.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(property.status, property::Status::Available);
        assert_eq!(property.current_tenant_id, None);
    }

    #[tokio::test]
    async fn rejects_non_decision_status() {
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
            .execute(cmd(
                &application,
                &landlord,
                application::Status::Withdrawn,
            ))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::InvalidStatus(_)));
    }

    #[tokio::test]
    async fn rejects_non_owner_and_decided() {
        let svc = testing::service();
        let landlord = testing::insert_user(&svc, user::Role::Landlord).await;
        let stranger = testing::insert_user(&svc, user::Role::Landlord).await;
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
            .execute(cmd(&application, &stranger, application::Status::Approved))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotOwner(_)));

        let err = svc
            .execute(cmd(&application, &landlord, application::Status::Approved))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotPending(_)));
    }

    #[tokio::test]
    async fn rejects_unknown_application() {
        let svc = testing::service();
        let landlord = testing::insert_user(&svc, user::Role::Landlord).await;
        let tenant = testing::insert_user(&svc, user::Role::Tenant).await;
        let property = testing::insert_property(&svc, &landlord).await;
        let mut application = testing::insert_application(
            &svc,
            &property,
            &tenant,
            application::Status::Pending,
        )
        .await;
        application.id = application::Id::new();

        let err = svc
            .execute(cmd(&application, &landlord, application::Status::Approved))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::ApplicationNotExists(_),
        ));
    }
}
