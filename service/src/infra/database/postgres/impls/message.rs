//! [`Message`]-related [`Database`] implementations.

use common::operations::{By, Insert, Lock, Select};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{message, user, Message},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Columns of the `messages` table, in the order [`from_row()`] expects them.
const COLUMNS: &str = "id, sender_id, receiver_id, body, read, created_at";

/// Decodes a [`Message`] from the provided [`Row`].
fn from_row(row: &Row) -> Message {
    Message {
        id: row.get("id"),
        sender_id: row.get("sender_id"),
        receiver_id: row.get("receiver_id"),
        body: row.get("body"),
        read: row.get("read"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<Message>, message::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Message>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Message>, message::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: message::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM messages \
             WHERE id = $1::UUID"
        );
        Ok(self
            .query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Message>, read::message::list::Filter>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Message>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Message>, read::message::list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::message::list::Filter { participant_id } = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM messages \
             WHERE sender_id = $1::UUID \
                OR receiver_id = $1::UUID \
             ORDER BY created_at DESC, id"
        );
        Ok(self
            .query(&sql, &[&participant_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Select<By<read::message::UnreadCount, user::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::message::UnreadCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::message::UnreadCount, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let user_id: user::Id = by.into_inner();

        const SQL: &str = "\
            SELECT COUNT(*) \
            FROM messages \
            WHERE receiver_id = $1::UUID \
              AND NOT read";
        let count = self
            .query_opt(SQL, &[&user_id])
            .await
            .map_err(tracerr::wrap!())?
            .map_or(0, |row| row.get::<_, i64>(0));
        Ok(u64::try_from(count).unwrap_or_default().into())
    }
}

impl<C> Database<Insert<Message>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(message): Insert<Message>,
    ) -> Result<Self::Ok, Self::Err> {
        let Message {
            id,
            sender_id,
            receiver_id,
            body,
            read,
            created_at,
        } = message;

        const SQL: &str = "\
            INSERT INTO messages (\
                id, sender_id, receiver_id, body, read, created_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::TEXT, $5::BOOLEAN, \
                $6::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET read = EXCLUDED.read";
        self.exec(
            SQL,
            &[&id, &sender_id, &receiver_id, &body, &read, &created_at],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Message, message::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Message, message::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: message::Id = by.into_inner();

        const SQL: &str = "\
            INSERT INTO messages_lock (id) \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO UPDATE SET id = EXCLUDED.id";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
