//! [`Command`] for sending a [`Message`].

use common::{
    operations::{By, Insert, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{message, user, Message, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for sending a [`Message`] to another [`User`].
#[derive(Clone, Debug)]
pub struct SendMessage {
    /// ID of the sending [`User`].
    pub sender_id: user::Id,

    /// ID of the receiving [`User`].
    pub receiver_id: user::Id,

    /// [`message::Body`] of the [`Message`].
    pub body: message::Body,
}

impl<Db> Command<SendMessage> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Insert<Message>, Err = Traced<database::Error>>,
{
    type Ok = Message;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: SendMessage) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SendMessage {
            sender_id,
            receiver_id,
            body,
        } = cmd;

        _ = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(receiver_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ReceiverNotExists(receiver_id))
            .map_err(tracerr::wrap!())?;

        let message = Message {
            id: message::Id::new(),
            sender_id,
            receiver_id,
            body,
            read: false,
            created_at: DateTime::now().coerce(),
        };

        self.database()
            .execute(Insert(message.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(message)
    }
}

/// Error of [`SendMessage`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Receiving [`User`] doesn't exist.
    #[display("`User(id: {_0})` does not exist")]
    ReceiverNotExists(#[error(not(source))] user::Id),
}
