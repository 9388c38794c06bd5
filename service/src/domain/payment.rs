//! [`Payment`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money};

use super::{define_id, define_text, property, user};

/// Rent payment made by a tenant for the property they occupy.
#[derive(Clone, Debug)]
pub struct Payment {
    /// ID of this [`Payment`].
    pub id: Id,

    /// ID of the paying tenant.
    pub tenant_id: user::Id,

    /// ID of the property paid for.
    pub property_id: property::Id,

    /// Paid amount.
    pub amount: Money,

    /// [`DateTime`] of this [`Payment`].
    pub date: SettlementDateTime,

    /// [`Status`] of this [`Payment`].
    pub status: Status,

    /// [`Method`] this [`Payment`] is made with.
    pub method: Method,

    /// [`TransactionId`] of this [`Payment`], unique among all [`Payment`]s.
    pub transaction_id: TransactionId,

    /// [`DateTime`] when this [`Payment`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Payment`] was modified the last time.
    pub updated_at: ModificationDateTime,
}

impl Payment {
    /// Settles this [`Payment`] with the provided [`Status`].
    ///
    /// Returns `false` if this [`Payment`] is not [`Status::Pending`] or the
    /// provided [`Status`] is not a settlement one.
    pub fn settle(&mut self, status: Status) -> bool {
        if self.status != Status::Pending || !status.is_settlement() {
            return false;
        }
        self.status = status;
        self.updated_at = DateTimeOf::now();
        true
    }
}

define_id! {
    #[doc = "ID of a [`Payment`]."]
    Id
}

define_kind! {
    #[doc = "Status of a [`Payment`]."]
    #[case = "lowercase"]
    enum Status {
        #[doc = "Waiting for the landlord confirmation."]
        Pending = 1,

        #[doc = "Confirmed by the landlord."]
        Completed = 2,

        #[doc = "Declined by the landlord."]
        Failed = 3,
    }
}

impl Status {
    /// Indicates whether this [`Status`] finalizes a [`Payment`].
    #[must_use]
    pub const fn is_settlement(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

define_kind! {
    #[doc = "Method a [`Payment`] is made with."]
    #[case = "snake_case"]
    enum Method {
        #[doc = "Credit card."]
        CreditCard = 1,

        #[doc = "Bank transfer."]
        BankTransfer = 2,

        #[doc = "Cash."]
        Cash = 3,
    }
}

define_text! {
    #[doc = "External transaction ID of a [`Payment`]."]
    TransactionId(max = 256)
}

impl TransactionId {
    /// Generates a new random [`TransactionId`].
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("txn_{}", uuid::Uuid::new_v4().simple()))
    }
}

/// [`DateTime`] a [`Payment`] is made at.
pub type SettlementDateTime = DateTimeOf<(Payment, unit::Settlement)>;

/// [`DateTime`] when a [`Payment`] was created.
pub type CreationDateTime = DateTimeOf<(Payment, unit::Creation)>;

/// [`DateTime`] when a [`Payment`] was modified.
pub type ModificationDateTime = DateTimeOf<(Payment, unit::Modification)>;

#[cfg(test)]
mod tests {
    use super::{Method, Status, TransactionId};

    #[test]
    fn method_is_snake_case() {
        assert_eq!(Method::BankTransfer.to_string(), "bank_transfer");
        assert_eq!(
            serde_json::from_str::<Method>(r#""credit_card""#).unwrap(),
            Method::CreditCard,
        );
        assert!("paypal".parse::<Method>().is_err());
    }

    #[test]
    fn settlement_statuses() {
        assert!(Status::Completed.is_settlement());
        assert!(Status::Failed.is_settlement());
        assert!(!Status::Pending.is_settlement());
    }

    #[test]
    fn generated_transaction_ids_differ() {
        let (a, b) = (TransactionId::generate(), TransactionId::generate());
        assert_ne!(a, b);
        assert!(a.to_string().starts_with("txn_"));
    }
}
