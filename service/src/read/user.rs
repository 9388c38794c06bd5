//! [`User`] read model definition.
//!
//! [`User`]: crate::domain::User

pub mod list {
    //! [`User`]s list definitions.

    use crate::domain::user;
    #[cfg(doc)]
    use crate::domain::User;

    /// Filter of a [`User`]s list.
    ///
    /// Deleted [`User`]s are never listed.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Filter {
        /// [`user::Role`] to list [`User`]s of.
        pub role: Option<user::Role>,
    }
}
