//! [`Query`] collection related to [`Message`]s.

use common::operations::By;

use crate::{
    domain::{user, Message},
    read,
};
#[cfg(doc)]
use crate::{domain::User, Query};

use super::DatabaseQuery;

/// Queries a list of [`Message`]s, newest first.
pub type List = DatabaseQuery<By<Vec<Message>, read::message::list::Filter>>;

/// Queries the number of unread [`Message`]s received by a [`User`].
pub type UnreadCount =
    DatabaseQuery<By<read::message::UnreadCount, user::Id>>;
