//! [`Lease`] read model definition.
//!
//! [`Lease`]: crate::domain::Lease

pub mod list {
    //! [`Lease`]s list definitions.

    use crate::domain::{lease, user};
    #[cfg(doc)]
    use crate::domain::Lease;

    /// Filter of a [`Lease`]s list.
    ///
    /// Lists are ordered newest first.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Filter {
        /// ID of the bound tenant.
        pub tenant_id: Option<user::Id>,

        /// ID of the bound landlord.
        pub landlord_id: Option<user::Id>,

        /// Exact [`lease::Status`].
        pub status: Option<lease::Status>,

        /// [`Lease`]s ending strictly before this moment.
        pub ends_before: Option<lease::EndDateTime>,
    }

    impl Filter {
        /// Checks whether the provided [`Lease`] matches this [`Filter`].
        #[must_use]
        pub fn matches(&self, l: &lease::Lease) -> bool {
            self.tenant_id.map_or(true, |id| l.tenant_id == id)
                && self.landlord_id.map_or(true, |id| l.landlord_id == id)
                && self.status.map_or(true, |s| l.status == s)
                && self.ends_before.map_or(true, |at| l.end_date < at)
        }
    }
}
