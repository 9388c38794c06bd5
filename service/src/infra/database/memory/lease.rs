//! [`Lease`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Select},
    DateTime,
};
use tracerr::Traced;

use crate::{
    domain::{lease, Lease},
    infra::{database, Database},
    read,
};

use super::{Memory, Record};

impl Record for Lease {
    type Id = lease::Id;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn ordered_by(&self) -> DateTime {
        self.created_at.coerce()
    }
}

impl Database<Select<By<Option<Lease>, lease::Id>>> for Memory {
    type Ok = Option<Lease>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Lease>, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.state().await.leases.get(id).cloned())
    }
}

impl Database<Select<By<Vec<Lease>, read::lease::list::Filter>>> for Memory {
    type Ok = Vec<Lease>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Lease>, read::lease::list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();
        Ok(self.state().await.leases.newest_first(|l| filter.matches(l)))
    }
}

impl Database<Insert<Lease>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(lease): Insert<Lease>,
    ) -> Result<Self::Ok, Self::Err> {
        self.state().await.leases.upsert(lease);
        Ok(())
    }
}
