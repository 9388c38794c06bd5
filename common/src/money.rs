//! [`Money`]-related definitions.

use std::{fmt, ops, str::FromStr};

use derive_more::{Display, Error};
use rust_decimal::Decimal;

/// Non-negative amount of money.
///
/// The platform operates in a single currency, so only the amount is kept.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Money(Decimal);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a new [`Money`] out of the provided amount.
    ///
    /// [`None`] is returned if the amount is negative.
    #[must_use]
    pub fn new(amount: Decimal) -> Option<Self> {
        (!amount.is_sign_negative() || amount.is_zero())
            .then(|| Self(amount.normalize()))
    }

    /// Returns the amount of this [`Money`].
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    /// Indicates whether this [`Money`] is zero.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Multiplies this [`Money`] by the provided factor.
    ///
    /// [`None`] is returned on overflow.
    #[must_use]
    pub fn checked_mul(self, factor: u32) -> Option<Self> {
        self.0.checked_mul(Decimal::from(factor)).map(Self)
    }
}

/// Error of parsing [`Money`].
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
pub enum ParseError {
    /// Not a decimal number.
    #[display("invalid amount")]
    Invalid,

    /// Negative amount.
    #[display("amount must not be negative")]
    Negative,
}

impl TryFrom<Decimal> for Money {
    type Error = ParseError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount).ok_or(ParseError::Negative)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl FromStr for Money {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .map_err(|_| ParseError::Invalid)?
            .try_into()
    }
}

impl ops::Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, ops::Add::add)
    }
}

#[cfg(feature = "postgres")]
mod postgres {
    //! Module providing integration with [`postgres_types`] crate.

    use std::error::Error as StdError;

    use postgres_types::{
        accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql,
        Type,
    };
    use rust_decimal::Decimal;

    use super::Money;

    impl FromSql<'_> for Money {
        accepts!(NUMERIC);

        fn from_sql(
            ty: &Type,
            raw: &[u8],
        ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
            Ok(Money::try_from(Decimal::from_sql(ty, raw)?)?)
        }
    }

    impl ToSql for Money {
        accepts!(NUMERIC);
        to_sql_checked!();

        fn to_sql(
            &self,
            ty: &Type,
            w: &mut BytesMut,
        ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
            self.0.to_sql(ty, w)
        }
    }
}

#[cfg(feature = "serde")]
mod serde {
    //! Module providing integration with [`serde`] crate.
    //!
    //! [`Money`] is represented as a JSON number, while numeric strings are
    //! accepted on input as well.

    use rust_decimal::Decimal;
    use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

    use super::Money;

    impl Serialize for Money {
        fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
            rust_decimal::serde::float::serialize(&self.0, s)
        }
    }

    impl<'de> Deserialize<'de> for Money {
        fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
            Money::try_from(<Decimal as Deserialize<'de>>::deserialize(d)?).map_err(D::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::{Money, ParseError};

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    #[test]
    fn from_str() {
        assert_eq!(
            Money::from_str("123.45").unwrap().amount(),
            Decimal::from_str("123.45").unwrap(),
        );
        assert_eq!(Money::from_str(" 1200 ").unwrap(), money("1200.00"));
        assert!(Money::from_str("0").unwrap().is_zero());
        assert!(Money::from_str("-0").unwrap().is_zero());

        assert_eq!(Money::from_str("-1"), Err(ParseError::Negative));
        assert_eq!(Money::from_str("12USD"), Err(ParseError::Invalid));
        assert_eq!(Money::from_str(""), Err(ParseError::Invalid));
    }

    #[test]
    fn to_string() {
        assert_eq!(money("123.45").to_string(), "123.45");
        assert_eq!(money("123.00").to_string(), "123");
        assert_eq!(money("0.50").to_string(), "0.5");
    }

    #[test]
    fn arithmetic() {
        assert_eq!(money("1250.50").checked_mul(2), Some(money("2501")));
        assert_eq!(
            [money("100"), money("250.25"), money("0")]
                .into_iter()
                .sum::<Money>(),
            money("350.25"),
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde() {
        assert_eq!(serde_json::to_string(&money("1500.5")).unwrap(), "1500.5");

        let parsed: Money = serde_json::from_str("1200").unwrap();
        assert_eq!(parsed, money("1200"));
        let parsed: Money = serde_json::from_str(r#""99.99""#).unwrap();
        assert_eq!(parsed, money("99.99"));

        assert!(serde_json::from_str::<Money>("-5").is_err());
    }
}
