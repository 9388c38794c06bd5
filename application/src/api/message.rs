//! [`Message`]-related endpoints.

use common::DateTime;
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _},
    domain::{self, message, user},
    query, read, Query as _,
};

use crate::{
    api::{self, Created, Json, Path},
    context, define_error, AsError, Context, Error, Session,
};

/// Direct [`domain::Message`] between two users.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// ID of this [`Message`].
    pub id: message::Id,

    /// ID of the sender.
    pub sender: user::Id,

    /// ID of the receiver.
    pub receiver: user::Id,

    /// Body of this [`Message`].
    pub body: message::Body,

    /// Whether the receiver has read this [`Message`].
    pub read: bool,

    /// When this [`Message`] was sent.
    pub created_at: DateTime,
}

impl From<domain::Message> for Message {
    fn from(m: domain::Message) -> Self {
        Self {
            id: m.id,
            sender: m.sender_id,
            receiver: m.receiver_id,
            body: m.body,
            read: m.read,
            created_at: m.created_at.coerce(),
        }
    }
}

/// Request of the [`send`] endpoint.
#[derive(Debug, Deserialize)]
pub struct SendRequest {
    /// ID of the receiver.
    pub receiver: user::Id,

    /// Body of the message.
    pub body: String,
}

/// Sends a message from the authenticated user.
#[tracing::instrument(
    skip_all,
    fields(
        http.route = "POST /api/messages",
        otel.name = "sendMessage",
        receiver.id = %req.receiver,
        user.id = %session.user_id(),
    ),
)]
pub async fn send(
    ctx: Context,
    session: Session,
    Json(req): Json<SendRequest>,
) -> api::Result<Created<Message>> {
    let SendRequest { receiver, body } = req;
    let body = message::Body::new(body).ok_or(MessageError::EmptyBody)?;

    let message = ctx
        .service()
        .execute(command::SendMessage {
            sender_id: session.user_id(),
            receiver_id: receiver,
            body,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Created(message.into()))
}

/// Lists messages sent to or by the authenticated user.
#[tracing::instrument(
    skip_all,
    fields(
        http.route = "GET /api/messages",
        otel.name = "listMessages",
        user.id = %session.user_id(),
    ),
)]
pub async fn list(
    ctx: Context,
    session: Session,
) -> api::Result<Json<Vec<Message>>> {
    let messages = ctx
        .service()
        .execute(query::message::List::by(read::message::list::Filter {
            participant_id: session.user_id(),
        }))
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(messages.into_iter().map(Into::into).collect()))
}

/// Number of unread messages.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct UnreadCount {
    /// Number of unread messages.
    pub count: u64,
}

/// Counts unread messages received by the authenticated user.
#[tracing::instrument(
    skip_all,
    fields(
        http.route = "GET /api/messages/unread",
        otel.name = "countUnreadMessages",
        user.id = %session.user_id(),
    ),
)]
pub async fn unread(
    ctx: Context,
    session: Session,
) -> api::Result<Json<UnreadCount>> {
    let count = ctx
        .service()
        .execute(query::message::UnreadCount::by(session.user_id()))
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(UnreadCount {
        count: count.into(),
    }))
}

/// Marks the message with the provided ID as read by its receiver.
#[tracing::instrument(
    skip_all,
    fields(
        http.route = "PATCH /api/messages/:id/read",
        message.id = %id,
        otel.name = "markMessageRead",
        user.id = %session.user_id(),
    ),
)]
pub async fn mark_read(
    ctx: Context,
    session: Session,
    Path(id): Path<message::Id>,
) -> api::Result<Json<Message>> {
    let message = ctx
        .service()
        .execute(command::MarkMessageRead {
            message_id: id,
            initiator_id: session.user_id(),
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(message.into()))
}

impl AsError for command::send_message::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::ReceiverNotExists(_) => {
                Some(context::AuthError::UserNotFound.into())
            }
        }
    }
}

impl AsError for command::mark_message_read::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::MessageNotExists(_) => Some(MessageError::NotFound.into()),
            Self::NotReceiver(_) => {
                Some(api::PrivilegeError::Unauthorized.into())
            }
        }
    }
}

define_error! {
    enum MessageError {
        #[code = "EMPTY_MESSAGE"]
        #[status = BAD_REQUEST]
        #[message = "Message body must not be empty"]
        EmptyBody,

        #[code = "MESSAGE_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "Message not found"]
        NotFound,
    }
}

#[cfg(test)]
mod tests {
    use service::{
        command::{mark_message_read, send_message},
        domain::user,
    };

    use crate::AsError as _;

    #[test]
    fn unknown_receiver_is_not_found() {
        let err =
            send_message::ExecutionError::ReceiverNotExists(user::Id::new())
                .into_error();

        assert_eq!(err.status_code, http::StatusCode::NOT_FOUND);
        assert_eq!(err.message, "User not found");
    }

    #[test]
    fn only_receiver_marks_read() {
        let err =
            mark_message_read::ExecutionError::NotReceiver(user::Id::new())
                .into_error();

        assert_eq!(err.status_code, http::StatusCode::FORBIDDEN);
    }
}
