//! [`Property`] read model definition.
//!
//! [`Property`]: crate::domain::Property

pub mod list {
    //! [`Property`] list definitions.

    use common::Money;

    use crate::domain::{property, user};
    #[cfg(doc)]
    use crate::domain::{Application, Property};

    /// Filter of a [`Property`] list.
    ///
    /// Every provided criterion must match. Lists are ordered newest first.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Filter {
        /// Exact [`property::Status`].
        pub status: Option<property::Status>,

        /// Exact [`property::Kind`].
        pub kind: Option<property::Kind>,

        /// Minimal rent (inclusive).
        pub min_rent: Option<Money>,

        /// Maximal rent (inclusive).
        pub max_rent: Option<Money>,

        /// Exact number of bedrooms.
        pub bedrooms: Option<property::Count>,

        /// Exact number of bathrooms.
        pub bathrooms: Option<property::Count>,

        /// ID of the owning landlord.
        pub landlord_id: Option<user::Id>,

        /// ID of the current tenant.
        pub current_tenant_id: Option<user::Id>,

        /// Excludes [`Property`]s having an approved [`Application`].
        pub without_approved_applications: bool,
    }

    impl Filter {
        /// Creates a new [`Filter`] of [`Property`]s available for renting.
        #[must_use]
        pub fn available() -> Self {
            Self {
                status: Some(property::Status::Available),
                without_approved_applications: true,
                ..Self::default()
            }
        }

        /// Checks whether the provided [`Property`] matches this [`Filter`].
        ///
        /// [`Filter::without_approved_applications`] is not checked, as it
        /// requires knowing the [`Application`]s.
        #[must_use]
        pub fn matches(&self, p: &property::Property) -> bool {
            self.status.map_or(true, |s| p.status == s)
                && self.kind.map_or(true, |k| p.kind == k)
                && self.min_rent.map_or(true, |m| p.rent >= m)
                && self.max_rent.map_or(true, |m| p.rent <= m)
                && self.bedrooms.map_or(true, |c| p.bedrooms == c)
                && self.bathrooms.map_or(true, |c| p.bathrooms == c)
                && self.landlord_id.map_or(true, |id| p.landlord_id == id)
                && self
                    .current_tenant_id
                    .map_or(true, |id| p.current_tenant_id == Some(id))
        }
    }
}
