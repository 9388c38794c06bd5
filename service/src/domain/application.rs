//! [`Application`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money};
use serde::{Deserialize, Serialize};

use super::{define_id, define_text, property, user};

/// Tenant's application for renting a [`Property`].
///
/// [`Property`]: super::Property
#[derive(Clone, Debug)]
pub struct Application {
    /// ID of this [`Application`].
    pub id: Id,

    /// ID of the applied property.
    pub property_id: property::Id,

    /// ID of the applying tenant.
    pub tenant_id: user::Id,

    /// [`EmploymentStatus`] of the applicant.
    pub employment_status: EmploymentStatus,

    /// Annual income of the applicant.
    pub annual_income: Money,

    /// [`CurrentAddress`] of the applicant.
    pub current_address: CurrentAddress,

    /// [`PreviousLandlord`] of the applicant.
    pub previous_landlord: PreviousLandlord,

    /// [`Reason`] the applicant is moving for.
    pub reason_for_moving: Reason,

    /// Optional [`Notes`] of the applicant.
    pub additional_notes: Option<Notes>,

    /// [`Status`] of this [`Application`].
    pub status: Status,

    /// [`DateTime`] when this [`Application`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Application`] was modified the last time.
    pub updated_at: ModificationDateTime,
}

impl Application {
    /// Indicates whether this [`Application`] is still outstanding, meaning
    /// that it blocks the same tenant from applying to the same property
    /// again.
    #[must_use]
    pub fn is_outstanding(&self) -> bool {
        self.status.is_outstanding()
    }

    /// Moves this [`Application`] into the provided [`Status`].
    pub fn set_status(&mut self, status: Status) {
        self.status = status;
        self.updated_at = DateTimeOf::now();
    }
}

define_id! {
    #[doc = "ID of an [`Application`]."]
    Id
}

define_kind! {
    #[doc = "Employment status of an applicant."]
    #[case = "kebab-case"]
    enum EmploymentStatus {
        #[doc = "Employed full-time."]
        FullTime = 1,

        #[doc = "Employed part-time."]
        PartTime = 2,

        #[doc = "Self-employed."]
        SelfEmployed = 3,

        #[doc = "Not employed."]
        Unemployed = 4,
    }
}

define_kind! {
    #[doc = "Status of an [`Application`]."]
    #[case = "lowercase"]
    enum Status {
        #[doc = "Waiting for the landlord decision."]
        Pending = 1,

        #[doc = "Approved by the landlord."]
        Approved = 2,

        #[doc = "Rejected by the landlord."]
        Rejected = 3,

        #[doc = "Withdrawn by the tenant or the landlord."]
        Withdrawn = 4,
    }
}

impl Status {
    /// Indicates whether an [`Application`] in this [`Status`] is
    /// outstanding.
    #[must_use]
    pub const fn is_outstanding(self) -> bool {
        matches!(self, Self::Pending | Self::Approved)
    }

    /// Indicates whether this [`Status`] is a landlord's decision.
    #[must_use]
    pub const fn is_decision(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

/// Previous landlord of an applicant, given as a reference.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviousLandlord {
    /// Name of the previous landlord.
    pub name: user::Name,

    /// [`ContactPhone`] of the previous landlord.
    pub phone: ContactPhone,

    /// Email of the previous landlord.
    pub email: user::Email,
}

define_text! {
    #[doc = "Current address of an applicant, in a free form."]
    CurrentAddress(max = 1024)
}

define_text! {
    #[doc = "Phone of a [`PreviousLandlord`], in a free form."]
    ContactPhone(max = 64)
}

define_text! {
    #[doc = "Reason an applicant is moving for."]
    Reason(max = 4096)
}

define_text! {
    #[doc = "Additional notes of an applicant."]
    Notes(max = 4096)
}

/// [`DateTime`] when an [`Application`] was created.
pub type CreationDateTime = DateTimeOf<(Application, unit::Creation)>;

/// [`DateTime`] when an [`Application`] was modified.
pub type ModificationDateTime = DateTimeOf<(Application, unit::Modification)>;
