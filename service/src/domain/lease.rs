//! [`Lease`] definitions.

use std::time::Duration;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money};
use derive_more::{Display, Error, Into};
use serde::{Deserialize, Serialize};
use strum::EnumString;

use super::{application, define_id, define_text, property, user};

/// Binding agreement between a landlord and a tenant for a property.
///
/// A [`Lease`] is created out of an approved [`Application`] and goes
/// through the signature states before becoming [`Status::Active`].
///
/// [`Application`]: super::Application
#[derive(Clone, Debug)]
pub struct Lease {
    /// ID of this [`Lease`].
    pub id: Id,

    /// ID of the leased property.
    pub property_id: property::Id,

    /// ID of the tenant bound to this [`Lease`].
    pub tenant_id: user::Id,

    /// ID of the landlord bound to this [`Lease`].
    pub landlord_id: user::Id,

    /// ID of the application this [`Lease`] was created from.
    pub application_id: application::Id,

    /// [`DateTime`] when this [`Lease`] starts.
    pub start_date: StartDateTime,

    /// [`DateTime`] when this [`Lease`] ends.
    pub end_date: EndDateTime,

    /// Monthly rent agreed by this [`Lease`].
    pub rent_amount: Money,

    /// Security deposit agreed by this [`Lease`].
    pub security_deposit: Money,

    /// Day of month the rent is due.
    pub payment_due_day: DueDay,

    /// [`Terms`] of this [`Lease`].
    pub terms: Terms,

    /// [`Status`] of this [`Lease`].
    pub status: Status,

    /// [`Signature`] of the tenant, once signed.
    pub tenant_signature: Option<Signature>,

    /// [`Signature`] of the landlord, once signed.
    pub landlord_signature: Option<Signature>,

    /// [`AdvancedPayment`] requested by the landlord, if any.
    pub advanced_payment: Option<AdvancedPayment>,

    /// [`DateTime`] when this [`Lease`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Lease`] was modified the last time.
    pub updated_at: ModificationDateTime,
}

impl Lease {
    /// Multiplier of the rent forming an [`AdvancedPayment`] amount.
    pub const ADVANCED_PAYMENT_RENTS: u32 = 2;

    /// Period an [`AdvancedPayment`] is due within after being requested.
    pub const ADVANCED_PAYMENT_PERIOD: Duration =
        Duration::from_secs(7 * 24 * 60 * 60);

    /// Indicates whether the [`User`] with the provided ID and [`user::Role`]
    /// may access this [`Lease`].
    ///
    /// Landlords and tenants must be bound to it, while admins may access any
    /// [`Lease`].
    ///
    /// [`User`]: user::User
    #[must_use]
    pub fn is_accessible_by(&self, user_id: user::Id, role: user::Role) -> bool {
        match role {
            user::Role::Landlord => self.landlord_id == user_id,
            user::Role::Tenant => self.tenant_id == user_id,
            user::Role::Admin => true,
        }
    }

    /// Applies the provided [`Transition`] to this [`Lease`].
    ///
    /// # Errors
    ///
    /// If this [`Lease`] is not in a state allowing the [`Transition`].
    pub fn transit(
        &mut self,
        transition: Transition,
        now: DateTimeOf,
    ) -> Result<(), TransitionError> {
        use TransitionError as E;

        match transition {
            Transition::SignTenant(signature) => {
                if self.status != Status::PendingTenantSignature {
                    return Err(E::NotReadyForTenantSignature);
                }
                self.tenant_signature = Some(signature);
                self.status = Status::PendingLandlordSignature;
            }
            Transition::SignLandlord(signature) => {
                if self.status != Status::PendingLandlordSignature {
                    return Err(E::TenantMustSignFirst);
                }
                self.landlord_signature = Some(signature);
                self.status = Status::Active;
            }
            Transition::RequestAdvancedPayment => {
                if self.status != Status::Active {
                    return Err(E::NotActive);
                }
                self.advanced_payment = Some(AdvancedPayment {
                    amount: self
                        .rent_amount
                        .checked_mul(Self::ADVANCED_PAYMENT_RENTS)
                        .ok_or(E::AmountOverflow)?,
                    due_date: (now + Self::ADVANCED_PAYMENT_PERIOD).coerce(),
                    status: advanced_payment::Status::Pending,
                    paid_at: None,
                });
            }
            Transition::PayAdvancedPayment => {
                let payment = self
                    .advanced_payment
                    .as_mut()
                    .filter(|p| p.status == advanced_payment::Status::Pending)
                    .ok_or(E::NoPendingAdvancedPayment)?;
                payment.status = advanced_payment::Status::Paid;
                payment.paid_at = Some(now.coerce());
            }
        }

        self.updated_at = now.coerce();
        Ok(())
    }

    /// Moves this [`Lease`] into [`Status::Expired`], if it's active and has
    /// ended before the provided moment.
    ///
    /// Returns `false` if this [`Lease`] is not expirable.
    pub fn expire(&mut self, now: DateTimeOf) -> bool {
        if self.status != Status::Active
            || self.end_date.coerce::<()>() >= now
        {
            return false;
        }
        self.status = Status::Expired;
        self.updated_at = now.coerce();
        true
    }
}

/// Action over a [`Lease`], as requested by its parties.
#[derive(Clone, Copy, Debug, Display, EnumString, Eq, PartialEq)]
#[strum(serialize_all = "snake_case")]
pub enum Action {
    /// Tenant signs the [`Lease`].
    SignTenant,

    /// Landlord signs the [`Lease`].
    SignLandlord,

    /// Landlord requests an [`AdvancedPayment`].
    RequestAdvancedPayment,

    /// Tenant pays the requested [`AdvancedPayment`].
    PayAdvancedPayment,
}

impl Action {
    /// Returns the [`user::Role`] allowed to perform this [`Action`].
    #[must_use]
    pub const fn required_role(self) -> user::Role {
        match self {
            Self::SignTenant | Self::PayAdvancedPayment => user::Role::Tenant,
            Self::SignLandlord | Self::RequestAdvancedPayment => {
                user::Role::Landlord
            }
        }
    }

    /// Indicates whether this [`Action`] requires a [`Signature`].
    #[must_use]
    pub const fn is_signing(self) -> bool {
        matches!(self, Self::SignTenant | Self::SignLandlord)
    }

    /// Converts this [`Action`] into a [`Transition`] with the provided
    /// [`Signature`].
    ///
    /// [`None`] is returned if this [`Action`] requires a [`Signature`], but
    /// none is provided.
    #[must_use]
    pub fn into_transition(
        self,
        signature: Option<Signature>,
    ) -> Option<Transition> {
        Some(match self {
            Self::SignTenant => Transition::SignTenant(signature?),
            Self::SignLandlord => Transition::SignLandlord(signature?),
            Self::RequestAdvancedPayment => Transition::RequestAdvancedPayment,
            Self::PayAdvancedPayment => Transition::PayAdvancedPayment,
        })
    }
}

/// State transition of a [`Lease`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Transition {
    /// Records the tenant [`Signature`] and waits for the landlord.
    SignTenant(Signature),

    /// Records the landlord [`Signature`] and activates the [`Lease`].
    SignLandlord(Signature),

    /// Requests an [`AdvancedPayment`] of an active [`Lease`].
    RequestAdvancedPayment,

    /// Settles the pending [`AdvancedPayment`].
    PayAdvancedPayment,
}

/// Error of applying a [`Transition`] to a [`Lease`].
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
pub enum TransitionError {
    /// [`Lease`] doesn't wait for a tenant signature.
    #[display("Lease is not ready for tenant signature")]
    NotReadyForTenantSignature,

    /// [`Lease`] doesn't wait for a landlord signature.
    #[display("Tenant must sign first")]
    TenantMustSignFirst,

    /// [`Lease`] is not active.
    #[display("Lease must be active")]
    NotActive,

    /// [`Lease`] has no pending [`AdvancedPayment`].
    #[display("No pending advanced payment")]
    NoPendingAdvancedPayment,

    /// [`AdvancedPayment`] amount doesn't fit the representation.
    #[display("Advanced payment amount overflow")]
    AmountOverflow,
}

define_id! {
    #[doc = "ID of a [`Lease`]."]
    Id
}

define_kind! {
    #[doc = "Status of a [`Lease`]."]
    #[case = "snake_case"]
    enum Status {
        #[doc = "Waiting for the tenant signature."]
        PendingTenantSignature = 1,

        #[doc = "Signed by the tenant. Kept for compatibility, never set."]
        TenantSigned = 2,

        #[doc = "Waiting for the landlord signature."]
        PendingLandlordSignature = 3,

        #[doc = "Signed by both parties."]
        Active = 4,

        #[doc = "Ended."]
        Expired = 5,

        #[doc = "Terminated before its end."]
        Terminated = 6,
    }
}

define_text! {
    #[doc = "Terms of a [`Lease`]."]
    Terms(max = 64 * 1024)
}

define_text! {
    #[doc = "Signature image data of a [`Lease`] party, usually a data URL."]
    Signature(max = 2 << 20)
}

/// Day of month a [`Lease`] rent is due, in `1..=31` range.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Into, PartialEq, Serialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct DueDay(u8);

impl DueDay {
    /// Creates a new [`DueDay`] if the provided `day` is in `1..=31` range.
    #[must_use]
    pub fn new(day: u8) -> Option<Self> {
        (1..=31).contains(&day).then_some(Self(day))
    }

    /// Creates a new [`DueDay`] out of the provided raw JSON-like number, if
    /// it's a whole one in `1..=31` range.
    #[must_use]
    pub fn from_number(day: f64) -> Option<Self> {
        if !(1.0..=31.0).contains(&day) || day.fract() > 0.0 {
            return None;
        }
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "whole number in `1..=31` range"
        )]
        let day = day as u8;
        Self::new(day)
    }
}

impl TryFrom<u8> for DueDay {
    type Error = &'static str;

    fn try_from(day: u8) -> Result<Self, Self::Error> {
        Self::new(day).ok_or("Payment due day must be between 1 and 31")
    }
}

#[cfg(feature = "postgres")]
mod postgres {
    //! Module providing [`DueDay`] representation as PostgreSQL `INT2`.

    use std::error::Error as StdError;

    use postgres_types::{
        accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql,
        Type,
    };

    use super::DueDay;

    impl FromSql<'_> for DueDay {
        accepts!(INT2);

        fn from_sql(
            ty: &Type,
            raw: &[u8],
        ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
            Ok(DueDay::try_from(u8::try_from(i16::from_sql(ty, raw)?)?)?)
        }
    }

    impl ToSql for DueDay {
        accepts!(INT2);
        to_sql_checked!();

        fn to_sql(
            &self,
            ty: &Type,
            w: &mut BytesMut,
        ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
            i16::from(self.0).to_sql(ty, w)
        }
    }
}

/// Advance payment requested by a landlord over an active [`Lease`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AdvancedPayment {
    /// Requested amount.
    pub amount: Money,

    /// [`DateTime`] the payment is due by.
    pub due_date: advanced_payment::DueDateTime,

    /// [`advanced_payment::Status`] of this payment.
    pub status: advanced_payment::Status,

    /// [`DateTime`] when this payment was paid.
    pub paid_at: Option<advanced_payment::SettlementDateTime>,
}

pub mod advanced_payment {
    //! [`AdvancedPayment`] definitions.
    //!
    //! [`AdvancedPayment`]: super::AdvancedPayment

    use common::{define_kind, unit, DateTimeOf};

    use super::AdvancedPayment;

    define_kind! {
        #[doc = "Status of an [`AdvancedPayment`]."]
        #[case = "lowercase"]
        enum Status {
            #[doc = "Requested, but not paid yet."]
            Pending = 1,

            #[doc = "Paid by the tenant."]
            Paid = 2,
        }
    }

    /// [`DateTimeOf`] an [`AdvancedPayment`] is due by.
    pub type DueDateTime = DateTimeOf<(AdvancedPayment, unit::Due)>;

    /// [`DateTimeOf`] an [`AdvancedPayment`] was paid.
    pub type SettlementDateTime = DateTimeOf<(AdvancedPayment, unit::Settlement)>;
}

/// [`DateTime`] when a [`Lease`] starts.
pub type StartDateTime = DateTimeOf<(Lease, unit::Start)>;

/// [`DateTime`] when a [`Lease`] ends.
pub type EndDateTime = DateTimeOf<(Lease, unit::End)>;

/// [`DateTime`] when a [`Lease`] was created.
pub type CreationDateTime = DateTimeOf<(Lease, unit::Creation)>;

/// [`DateTime`] when a [`Lease`] was modified.
pub type ModificationDateTime = DateTimeOf<(Lease, unit::Modification)>;

#[cfg(test)]
mod tests {
    use common::{DateTime, Money};

    use crate::domain::{application, property, user};

    use super::{
        advanced_payment, Action, DueDay, Id, Lease, Signature, Status,
        Terms, Transition, TransitionError,
    };

    fn lease() -> Lease {
        let now = DateTime::now();
        Lease {
            id: Id::new(),
            property_id: property::Id::new(),
            tenant_id: user::Id::new(),
            landlord_id: user::Id::new(),
            application_id: application::Id::new(),
            start_date: now.coerce(),
            end_date: now.add_days(365).coerce(),
            rent_amount: "1200".parse().unwrap(),
            security_deposit: "2400".parse().unwrap(),
            payment_due_day: DueDay::new(1).unwrap(),
            terms: Terms::new("No smoking").unwrap(),
            status: Status::PendingTenantSignature,
            tenant_signature: None,
            landlord_signature: None,
            advanced_payment: None,
            created_at: now.coerce(),
            updated_at: now.coerce(),
        }
    }

    fn signature() -> Signature {
        Signature::new("data:image/png;base64,AAAA").unwrap()
    }

    #[test]
    fn full_signature_flow() {
        let mut lease = lease();

        lease
            .transit(Transition::SignTenant(signature()), DateTime::now())
            .unwrap();
        assert_eq!(lease.status, Status::PendingLandlordSignature);
        assert_eq!(lease.tenant_signature, Some(signature()));

        lease
            .transit(Transition::SignLandlord(signature()), DateTime::now())
            .unwrap();
        assert_eq!(lease.status, Status::Active);
        assert!(lease.landlord_signature.is_some());
    }

    #[test]
    fn landlord_cannot_sign_first() {
        let mut lease = lease();

        assert_eq!(
            lease.transit(Transition::SignLandlord(signature()), DateTime::now()),
            Err(TransitionError::TenantMustSignFirst),
        );
        assert_eq!(lease.status, Status::PendingTenantSignature);
        assert!(lease.landlord_signature.is_none());
    }

    #[test]
    fn tenant_cannot_sign_twice() {
        let mut lease = lease();
        lease
            .transit(Transition::SignTenant(signature()), DateTime::now())
            .unwrap();

        assert_eq!(
            lease.transit(Transition::SignTenant(signature()), DateTime::now()),
            Err(TransitionError::NotReadyForTenantSignature),
        );
    }

    #[test]
    fn advanced_payment_requires_active_lease() {
        let mut lease = lease();

        assert_eq!(
            lease.transit(Transition::RequestAdvancedPayment, DateTime::now()),
            Err(TransitionError::NotActive),
        );
        assert_eq!(
            lease.transit(Transition::PayAdvancedPayment, DateTime::now()),
            Err(TransitionError::NoPendingAdvancedPayment),
        );
    }

    #[test]
    fn advanced_payment_flow() {
        let mut lease = lease();
        lease.status = Status::Active;
        let now = DateTime::now();

        lease.transit(Transition::RequestAdvancedPayment, now).unwrap();
        let payment = lease.advanced_payment.unwrap();
        assert_eq!(payment.amount, "2400".parse::<Money>().unwrap());
        assert_eq!(payment.due_date, now.add_days(7).coerce());
        assert_eq!(payment.status, advanced_payment::Status::Pending);
        assert_eq!(payment.paid_at, None);

        lease.transit(Transition::PayAdvancedPayment, now).unwrap();
        let payment = lease.advanced_payment.unwrap();
        assert_eq!(payment.status, advanced_payment::Status::Paid);
        assert_eq!(payment.paid_at, Some(now.coerce()));

        assert_eq!(
            lease.transit(Transition::PayAdvancedPayment, now),
            Err(TransitionError::NoPendingAdvancedPayment),
        );
    }

    #[test]
    fn expires_only_overdue_active_leases() {
        let now = DateTime::now();

        let mut pending = lease();
        pending.end_date = now.add_days(0).coerce();
        assert!(!pending.expire(now.add_days(1)));

        let mut running = lease();
        running.status = Status::Active;
        assert!(!running.expire(now));
        assert_eq!(running.status, Status::Active);

        let mut overdue = lease();
        overdue.status = Status::Active;
        overdue.end_date = now.coerce();
        assert!(overdue.expire(now.add_days(1)));
        assert_eq!(overdue.status, Status::Expired);
    }

    #[test]
    fn access_rules() {
        let lease = lease();

        assert!(lease.is_accessible_by(lease.tenant_id, user::Role::Tenant));
        assert!(lease.is_accessible_by(lease.landlord_id, user::Role::Landlord));
        assert!(!lease.is_accessible_by(lease.tenant_id, user::Role::Landlord));
        assert!(!lease.is_accessible_by(user::Id::new(), user::Role::Tenant));
        assert!(lease.is_accessible_by(user::Id::new(), user::Role::Admin));
    }

    #[test]
    fn actions() {
        assert_eq!(
            "request_advanced_payment".parse::<Action>().unwrap(),
            Action::RequestAdvancedPayment,
        );
        assert!("terminate".parse::<Action>().is_err());

        assert_eq!(Action::SignTenant.required_role(), user::Role::Tenant);
        assert_eq!(Action::SignLandlord.required_role(), user::Role::Landlord);
        assert_eq!(Action::SignTenant.into_transition(None), None);
        assert_eq!(
            Action::PayAdvancedPayment.into_transition(None),
            Some(Transition::PayAdvancedPayment),
        );
    }

    #[test]
    fn due_day_range() {
        assert!(DueDay::new(0).is_none());
        assert!(DueDay::new(1).is_some());
        assert!(DueDay::new(31).is_some());
        assert!(DueDay::new(32).is_none());
        assert!(serde_json::from_str::<DueDay>("40").is_err());
    }

    #[test]
    fn status_wire_names() {
        assert_eq!(
            Status::PendingLandlordSignature.to_string(),
            "pending_landlord_signature",
        );
        assert_eq!(
            serde_json::to_string(&Status::TenantSigned).unwrap(),
            r#""tenant_signed""#,
        );
    }
}
