//! [`Message`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Select},
    DateTime,
};
use tracerr::Traced;

use crate::{
    domain::{message, user, Message},
    infra::{database, Database},
    read,
};

use super::{Memory, Record};

impl Record for Message {
    type Id = message::Id;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn ordered_by(&self) -> DateTime {
        self.created_at.coerce()
    }
}

impl Database<Select<By<Option<Message>, message::Id>>> for Memory {
    type Ok = Option<Message>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Message>, message::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.state().await.messages.get(id).cloned())
    }
}

impl Database<Select<By<Vec<Message>, read::message::list::Filter>>>
    for Memory
{
    type Ok = Vec<Message>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Message>, read::message::list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::message::list::Filter { participant_id } = by.into_inner();
        Ok(self
            .state()
            .await
            .messages
            .newest_first(|m| m.involves(participant_id)))
    }
}

impl Database<Select<By<read::message::UnreadCount, user::Id>>> for Memory {
    type Ok = read::message::UnreadCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::message::UnreadCount, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let user_id = by.into_inner();
        let count = self
            .state()
            .await
            .messages
            .iter()
            .filter(|m| m.receiver_id == user_id && !m.read)
            .count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX).into())
    }
}

impl Database<Insert<Message>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(message): Insert<Message>,
    ) -> Result<Self::Ok, Self::Err> {
        self.state().await.messages.upsert(message);
        Ok(())
    }
}
