//! [`Payment`] read model definition.
//!
//! [`Payment`]: crate::domain::Payment

pub mod list {
    //! [`Payment`]s list definitions.

    use crate::domain::user;
    #[cfg(doc)]
    use crate::domain::{Payment, Property};

    /// Filter of a [`Payment`]s list.
    ///
    /// Lists are ordered by the [`Payment`] date, newest first.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Filter {
        /// ID of the paying tenant.
        pub tenant_id: Option<user::Id>,

        /// ID of the landlord owning the paid [`Property`].
        pub landlord_id: Option<user::Id>,
    }
}
