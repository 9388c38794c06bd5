//! [`User`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Select},
    DateTime,
};
use tracerr::Traced;

use crate::{
    domain::{user, User},
    infra::{database, Database},
    read,
};

use super::{unique_violation, Memory, Record};

impl Record for User {
    type Id = user::Id;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn ordered_by(&self) -> DateTime {
        self.created_at.coerce()
    }
}

impl Database<Select<By<Option<User>, user::Id>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .state()
            .await
            .users
            .get(id)
            .filter(|u| u.deleted_at.is_none())
            .cloned())
    }
}

impl<'l> Database<Select<By<Option<User>, &'l user::Email>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'l user::Email>>,
    ) -> Result<Self::Ok, Self::Err> {
        let email = by.into_inner();
        Ok(self
            .state()
            .await
            .users
            .iter()
            .find(|u| u.deleted_at.is_none() && &u.email == email)
            .cloned())
    }
}

impl Database<Select<By<Vec<User>, read::user::list::Filter>>> for Memory {
    type Ok = Vec<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<User>, read::user::list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::user::list::Filter { role } = by.into_inner();
        Ok(self.state().await.users.newest_first(|u| {
            u.deleted_at.is_none() && role.map_or(true, |r| u.role == r)
        }))
    }
}

impl Database<Insert<User>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state().await;
        if user.deleted_at.is_none()
            && state.users.iter().any(|u| {
                u.id != user.id
                    && u.deleted_at.is_none()
                    && u.email == user.email
            })
        {
            return Err(unique_violation(database::constraint::USERS_EMAIL));
        }
        state.users.upsert(user);
        Ok(())
    }
}
