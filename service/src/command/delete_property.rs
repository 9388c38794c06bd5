//! [`Command`] for removing a [`Property`] by its owner.

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{property, user, Property},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for removing a [`Property`] by its owner.
#[derive(Clone, Copy, Debug)]
pub struct DeleteProperty {
    /// ID of the [`Property`] to be removed.
    pub property_id: property::Id,

    /// ID of the landlord performing the removal.
    pub initiator_id: user::Id,
}

impl<Db> Command<DeleteProperty> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Property, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Property, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Property;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeleteProperty,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteProperty {
            property_id,
            initiator_id,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `Property`.
        tx.execute(Lock(By::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let property = tx
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())?;
        if !property.is_owned_by(initiator_id) {
            return Err(tracerr::new!(E::NotOwner(initiator_id)));
        }

        tx.execute(Delete(By::<Property, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(property)
    }
}

/// Error of [`DeleteProperty`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Initiator doesn't own the [`Property`].
    #[display("`User(id: {_0})` doesn't own the `Property`")]
    NotOwner(#[error(not(source))] user::Id),

    /// [`Property`] doesn't exist.
    #[display("`Property(id: {_0})` does not exist")]
    PropertyNotExists(#[error(not(source))] property::Id),
}

#[cfg(test)]
mod tests {
    use crate::{
        domain::{application, user},
        query, testing, Command as _, Query as _,
    };

    use super::{DeleteProperty, ExecutionError};

    #[tokio::test]
    async fn removes_property_with_applications() {
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

        drop(
            svc.execute(DeleteProperty {
                property_id: property.id,
                initiator_id: landlord.id,
            })
            .await
            .unwrap(),
        );

        assert!(svc
            .execute(query::property::ById::by(property.id))
            .await
            .unwrap()
            .is_none());
        assert!(svc
            .execute(query::application::ById::by(application.id))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn rejects_non_owner() {
        let svc = testing::service();
        let landlord = testing::insert_user(&svc, user::Role::Landlord).await;
        let stranger = testing::insert_user(&svc, user::Role::Landlord).await;
        let property = testing::insert_property(&svc, &landlord).await;

        let err = svc
            .execute(DeleteProperty {
                property_id: property.id,
                initiator_id: stranger.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotOwner(_)));
        assert!(svc
            .execute(query::property::ById::by(property.id))
            .await
            .unwrap()
            .is_some());
    }
}
