//! [`Message`] read model definition.

use derive_more::{Display, From, Into};

#[cfg(doc)]
use crate::domain::Message;

/// Number of unread [`Message`]s of a user.
#[derive(
    Clone, Copy, Debug, Default, Display, Eq, From, Hash, Into, PartialEq,
)]
pub struct UnreadCount(u64);

pub mod list {
    //! [`Message`]s list definitions.

    use crate::domain::user;
    #[cfg(doc)]
    use crate::domain::Message;

    /// Filter of a [`Message`]s list.
    ///
    /// Lists are ordered newest first.
    #[derive(Clone, Copy, Debug)]
    pub struct Filter {
        /// ID of the user who either sent or received a [`Message`].
        pub participant_id: user::Id,
    }
}
