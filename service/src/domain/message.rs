//! [`Message`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};

use super::{define_id, define_text, user};

/// Direct message between two users.
#[derive(Clone, Debug)]
pub struct Message {
    /// ID of this [`Message`].
    pub id: Id,

    /// ID of the user sent this [`Message`].
    pub sender_id: user::Id,

    /// ID of the user this [`Message`] is addressed to.
    pub receiver_id: user::Id,

    /// [`Body`] of this [`Message`].
    pub body: Body,

    /// Indicator whether the receiver has read this [`Message`].
    pub read: bool,

    /// [`DateTime`] when this [`Message`] was sent.
    pub created_at: CreationDateTime,
}

impl Message {
    /// Indicates whether the provided user takes part in this [`Message`].
    #[must_use]
    pub fn involves(&self, user_id: user::Id) -> bool {
        self.sender_id == user_id || self.receiver_id == user_id
    }
}

define_id! {
    #[doc = "ID of a [`Message`]."]
    Id
}

define_text! {
    #[doc = "Body of a [`Message`]."]
    Body(max = 16 * 1024)
}

/// [`DateTime`] when a [`Message`] was sent.
pub type CreationDateTime = DateTimeOf<(Message, unit::Creation)>;
