//! [`Command`] for editing a [`Property`] by its owner.

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{property, user, Property},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for editing a [`Property`] by its owner.
///
/// Omitted fields are kept intact.
#[derive(Clone, Debug)]
pub struct UpdateProperty {
    /// ID of the [`Property`] to be edited.
    pub property_id: property::Id,

    /// ID of the landlord performing the edit.
    pub initiator_id: user::Id,

    /// New [`property::Status`].
    pub status: Option<property::Status>,

    /// New [`property::Name`].
    pub name: Option<property::Name>,

    /// New monthly rent.
    pub rent: Option<Money>,

    /// New [`property::Description`].
    pub description: Option<property::Description>,
}

impl<Db> Command<UpdateProperty> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Property, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<Insert<Property>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Property;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateProperty,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateProperty {
            property_id,
            initiator_id,
            status,
            name,
            rent,
            description,
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

        let mut property = tx
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())?;
        if !property.is_owned_by(initiator_id) {
            return Err(tracerr::new!(E::NotOwner(initiator_id)));
        }

        if let Some(status) = status {
            property.status = status;
        }
        if let Some(name) = name {
            property.name = name;
        }
        if let Some(rent) = rent {
            property.rent = rent;
        }
        if let Some(description) = description {
            property.description = description;
        }
        property.updated_at = DateTime::now().coerce();

        tx.execute(Insert(property.clone()))
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

/// Error of [`UpdateProperty`] [`Command`] execution.
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
