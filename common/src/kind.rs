//! Macros for defining kind enums.

/// Macro for defining a kind enum.
///
/// The provided `case` is used both for the [`Display`]/[`FromStr`] and the
/// `serde` representations. In PostgreSQL a kind is stored as `INT2`.
///
/// Requires the calling crate to depend on [`serde`] directly.
///
/// # Example
///
/// ```rust
/// use common::define_kind;
///
/// define_kind! {
///     #[doc = "Shape kind."]
///     #[case = "kebab-case"]
///     enum Kind {
///         #[doc = "A cube"]
///         Cube = 1,
///
///         #[doc = "A sphere"]
///         Sphere = 2,
///     }
/// }
///
/// assert_eq!(Kind::Cube.to_string(), "cube");
/// ```
///
/// [`Display`]: std::fmt::Display
/// [`FromStr`]: std::str::FromStr
/// [`serde`]: https://docs.rs/serde
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_kind {
    (
        #[doc = $doc:literal]
        #[case = $case:literal]
        enum $name:ident {
            $(
                #[doc = $variant_doc:literal]
                $variant:ident = $value:expr
            ),* $(,)?
        }
    ) => {
        #[derive(
            Clone,
            Copy,
            Debug,
            $crate::private::serde::Deserialize,
            $crate::private::strum::Display,
            $crate::private::strum::EnumString,
            $crate::private::strum::VariantNames,
            Eq,
            Hash,
            PartialEq,
            $crate::private::serde::Serialize,
        )]
        #[doc = $doc]
        #[repr(u8)]
        #[serde(rename_all = $case)]
        #[strum(serialize_all = $case)]
        pub enum $name {
            $(
                 #[doc = $variant_doc]
                 $variant = $value,
            )*
        }

        impl $name {
            /// All the variants of this kind.
            pub const ALL: &'static [Self] = &[$(Self::$variant),*];

            /// Converts this into its [`u8`] representation.
            #[must_use]
            pub const fn u8(self) -> u8 {
                self as u8
            }

            /// Returns the comma-separated list of valid textual values.
            #[must_use]
            pub fn valid_values() -> String {
                <Self as $crate::private::strum::VariantNames>::VARIANTS
                    .join(", ")
            }
        }

        #[cfg(feature = "postgres")]
        impl<'a> $crate::private::postgres_types::FromSql<'a> for $name {
            $crate::private::postgres_types::accepts!(INT2);

            fn from_sql(
                ty: &$crate::private::postgres_types::Type,
                raw: &[u8],
            ) -> Result<
                $name,
                Box<dyn ::std::error::Error
                    + ::core::marker::Sync
                    + ::core::marker::Send>,
            > {
                match u8::try_from(i16::from_sql(ty, raw)?)? {
                    $(
                        v if Self::$variant.u8() == v => Ok(Self::$variant),
                    )*
                    v => Err(::std::format!(
                        "invalid `{}` value: {v}",
                        ::core::stringify!($name),
                    ).into()),
                }
            }
        }

        #[cfg(feature = "postgres")]
        impl $crate::private::postgres_types::ToSql for $name {
            $crate::private::postgres_types::accepts!(INT2);
            $crate::private::postgres_types::to_sql_checked!();

            fn to_sql(
                &self,
                ty: &$crate::private::postgres_types::Type,
                w: &mut $crate::private::postgres_types::private::BytesMut,
            ) -> Result<
                $crate::private::postgres_types::IsNull,
                ::std::boxed::Box<
                    dyn ::std::error::Error
                        + ::core::marker::Sync
                        + ::core::marker::Send
                >,
            > {
                i16::from(self.u8()).to_sql(ty, w)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    crate::define_kind! {
        #[doc = "Testing kind."]
        #[case = "snake_case"]
        enum Stage {
            #[doc = "First."]
            PendingReview = 1,

            #[doc = "Second."]
            Done = 2,
        }
    }

    #[test]
    fn uses_case_everywhere() {
        assert_eq!(Stage::PendingReview.to_string(), "pending_review");
        assert_eq!(Stage::from_str("done").unwrap(), Stage::Done);
        assert!(Stage::from_str("Done").is_err());

        assert_eq!(
            serde_json::to_string(&Stage::PendingReview).unwrap(),
            r#""pending_review""#,
        );
        assert_eq!(Stage::valid_values(), "pending_review, done");
        assert_eq!(Stage::ALL, &[Stage::PendingReview, Stage::Done]);
        assert_eq!(Stage::Done.u8(), 2);
    }
}
