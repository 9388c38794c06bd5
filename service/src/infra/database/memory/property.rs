//! [`Property`]-related [`Database`] implementations.

use common::{
    operations::{By, Delete, Insert, Select},
    DateTime,
};
use tracerr::Traced;

use crate::{
    domain::{application, property, Property},
    infra::{database, Database},
    read,
};

use super::{Memory, Record};

impl Record for Property {
    type Id = property::Id;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn ordered_by(&self) -> DateTime {
        self.created_at.coerce()
    }
}

impl Database<Select<By<Option<Property>, property::Id>>> for Memory {
    type Ok = Option<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Property>, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.state().await.properties.get(id).cloned())
    }
}

impl Database<Select<By<Vec<Property>, read::property::list::Filter>>>
    for Memory
{
    type Ok = Vec<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Property>, read::property::list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();
        let state = self.state().await;
        Ok(state.properties.newest_first(|p| {
            filter.matches(p)
                && !(filter.without_approved_applications
                    && state.applications.iter().any(|a| {
                        a.property_id == p.id
                            && a.status == application::Status::Approved
                    }))
        }))
    }
}

impl Database<Insert<Property>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(property): Insert<Property>,
    ) -> Result<Self::Ok, Self::Err> {
        self.state().await.properties.upsert(property);
        Ok(())
    }
}

impl Database<Delete<By<Property, property::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Property, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        let mut state = self.state().await;
        state.properties.remove(id);
        state.applications.0.retain(|a| a.property_id != id);
        Ok(())
    }
}
