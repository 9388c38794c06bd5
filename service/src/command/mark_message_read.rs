//! [`Command`] for marking a [`Message`] as read.

use common::operations::{
    By, Commit, Insert, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{message, user, Message},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for marking a [`Message`] as read by its receiver.
#[derive(Clone, Copy, Debug)]
pub struct MarkMessageRead {
    /// ID of the [`Message`] to mark.
    pub message_id: message::Id,

    /// ID of the [`User`] marking the [`Message`].
    ///
    /// [`User`]: crate::domain::User
    pub initiator_id: user::Id,
}

impl<Db> Command<MarkMessageRead> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Message, message::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Message>, message::Id>>,
            Ok = Option<Message>,
            Err = Traced<database::Error>,
        > + Database<Insert<Message>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Message;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: MarkMessageRead,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let MarkMessageRead {
            message_id,
            initiator_id,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::new(message_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut message = tx
            .execute(Select(By::<Option<Message>, _>::new(message_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::MessageNotExists(message_id))
            .map_err(tracerr::wrap!())?;
        if message.receiver_id != initiator_id {
            return Err(tracerr::new!(E::NotReceiver(initiator_id)));
        }

        if !message.read {
            message.read = true;
            tx.execute(Insert(message.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(message)
    }
}

/// Error of [`MarkMessageRead`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Message`] doesn't exist.
    #[display("`Message(id: {_0})` does not exist")]
    MessageNotExists(#[error(not(source))] message::Id),

    /// Initiator is not the receiver of the [`Message`].
    #[display("`User(id: {_0})` hasn't received the `Message`")]
    NotReceiver(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod tests {
    use crate::{
        command::SendMessage, domain::user, query, read, testing,
        Command as _, Query as _,
    };

    use super::{ExecutionError, MarkMessageRead};

    #[tokio::test]
    async fn only_receiver_marks_read() {
        let svc = testing::service();
        let tenant = testing::insert_user(&svc, user::Role::Tenant).await;
        let landlord = testing::insert_user(&svc, user::Role::Landlord).await;
        let message = svc
            .execute(SendMessage {
                sender_id: tenant.id,
                receiver_id: landlord.id,
                body: "Hi".parse().unwrap(),
            })
            .await
            .unwrap();

        let err = svc
            .execute(MarkMessageRead {
                message_id: message.id,
                initiator_id: tenant.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotReceiver(_)));

        let marked = svc
            .execute(MarkMessageRead {
                message_id: message.id,
                initiator_id: landlord.id,
            })
            .await
            .unwrap();
        assert!(marked.read);

        let unread = svc
            .execute(query::message::UnreadCount::by(landlord.id))
            .await
            .unwrap();
        assert_eq!(unread, read::message::UnreadCount::default());
    }
}
