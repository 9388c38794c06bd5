//! [`Application`] read model definition.

#[cfg(doc)]
use crate::domain::Application;

/// Wrapper around [`Application`] indicating that it [`is_outstanding()`].
///
/// [`is_outstanding()`]: Application::is_outstanding
#[derive(Clone, Debug)]
pub struct Outstanding<T>(pub T);

pub mod list {
    //! [`Application`]s list definitions.

    use crate::domain::{application, user};
    #[cfg(doc)]
    use crate::domain::{Application, Property};

    /// Filter of an [`Application`]s list.
    ///
    /// Lists are ordered newest first.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Filter {
        /// ID of the applied tenant.
        pub tenant_id: Option<user::Id>,

        /// ID of the landlord owning the applied [`Property`].
        pub landlord_id: Option<user::Id>,

        /// Exact [`application::Status`].
        pub status: Option<application::Status>,
    }
}
