//! Domain definitions.

/// Defines a new free-form text type, which is trimmed on creation and must
/// be non-empty and not longer than the provided number of bytes.
macro_rules! define_text {
    (
        #[doc = $doc:literal]
        $name:ident(max = $max:expr)
    ) => {
        #[doc = $doc]
        #[derive(
            ::derive_more::AsRef,
            Clone,
            Debug,
            ::derive_more::Display,
            Eq,
            Hash,
            PartialEq,
            ::serde::Serialize,
            ::serde::Deserialize,
        )]
        #[as_ref(str)]
        #[cfg_attr(
            feature = "postgres",
            derive(::postgres_types::FromSql, ::postgres_types::ToSql),
            postgres(transparent)
        )]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Maximum length (in bytes) of this value.
            pub const MAX_LEN: usize = $max;

            /// Creates a new value without checking its contents.
            ///
            /// # Safety
            ///
            /// The caller must ensure that the given `value` is trimmed,
            /// non-empty and fits the maximum length.
            #[expect(unsafe_code, reason = "bypass")]
            #[must_use]
            pub unsafe fn new_unchecked(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Creates a new value out of the provided one trimming it, if
            /// it's valid.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let value = value.into();
                let value = match value.trim() {
                    trimmed if trimmed.len() == value.len() => value,
                    trimmed => trimmed.to_owned(),
                };
                Self::check(&value).then_some(Self(value))
            }

            /// Checks whether the given `value` is a valid one.
            fn check(value: impl AsRef<str>) -> bool {
                let value = value.as_ref();
                !value.is_empty() && value.len() <= Self::MAX_LEN
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = &'static str;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s).ok_or(::core::concat!(
                    "invalid `",
                    ::core::stringify!($name),
                    "`",
                ))
            }
        }

        impl TryFrom<String> for $name {
            type Error = &'static str;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value).ok_or(::core::concat!(
                    "invalid `",
                    ::core::stringify!($name),
                    "`",
                ))
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

pub(crate) use define_text;

/// Defines a new ID type wrapping a random [`Uuid`].
///
/// [`Uuid`]: uuid::Uuid
macro_rules! define_id {
    (
        #[doc = $doc:literal]
        $name:ident
    ) => {
        #[doc = $doc]
        #[derive(
            Clone,
            Copy,
            Debug,
            Default,
            ::serde::Deserialize,
            ::derive_more::Display,
            Eq,
            ::derive_more::From,
            ::derive_more::FromStr,
            Hash,
            ::derive_more::Into,
            Ord,
            PartialEq,
            PartialOrd,
            ::serde::Serialize,
        )]
        #[cfg_attr(
            feature = "postgres",
            derive(::postgres_types::FromSql, ::postgres_types::ToSql),
            postgres(transparent)
        )]
        pub struct $name(::uuid::Uuid);

        impl $name {
            /// Creates a new random ID.
            #[must_use]
            pub fn new() -> Self {
                Self(::uuid::Uuid::new_v4())
            }
        }
    };
}

pub(crate) use define_id;

pub mod address;
pub mod application;
pub mod lease;
pub mod message;
pub mod payment;
pub mod property;
pub mod user;

pub use self::{
    address::Address, application::Application, lease::Lease,
    message::Message, payment::Payment, property::Property, user::User,
};
