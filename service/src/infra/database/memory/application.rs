//! [`Application`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Select},
    DateTime,
};
use tracerr::Traced;

use crate::{
    domain::{application, property, user, Application},
    infra::{database, Database},
    read::{self, application::Outstanding},
};

use super::{Memory, Record};

impl Record for Application {
    type Id = application::Id;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn ordered_by(&self) -> DateTime {
        self.created_at.coerce()
    }
}

impl Database<Select<By<Option<Application>, application::Id>>> for Memory {
    type Ok = Option<Application>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Application>, application::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.state().await.applications.get(id).cloned())
    }
}

impl
    Database<
        Select<
            By<Option<Outstanding<Application>>, (property::Id, user::Id)>,
        >,
    > for Memory
{
    type Ok = Option<Outstanding<Application>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Option<Outstanding<Application>>, (property::Id, user::Id)>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let (property_id, tenant_id) = by.into_inner();
        Ok(self
            .state()
            .await
            .applications
            .iter()
            .find(|a| {
                a.property_id == property_id
                    && a.tenant_id == tenant_id
                    && a.is_outstanding()
            })
            .cloned()
            .map(Outstanding))
    }
}

impl Database<Select<By<Vec<Application>, read::application::list::Filter>>>
    for Memory
{
    type Ok = Vec<Application>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Vec<Application>, read::application::list::Filter>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::application::list::Filter {
            tenant_id,
            landlord_id,
            status,
        } = by.into_inner();
        let state = self.state().await;
        Ok(state.applications.newest_first(|a| {
            tenant_id.map_or(true, |id| a.tenant_id == id)
                && status.map_or(true, |s| a.status == s)
                && landlord_id.map_or(true, |id| {
                    state
                        .properties
                        .get(a.property_id)
                        .is_some_and(|p| p.landlord_id == id)
                })
        }))
    }
}

impl Database<Insert<Application>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(application): Insert<Application>,
    ) -> Result<Self::Ok, Self::Err> {
        self.state().await.applications.upsert(application);
        Ok(())
    }
}
