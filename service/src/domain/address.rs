//! [`Address`] definitions.

use serde::{Deserialize, Serialize};

use super::define_text;

/// Postal address of a property or a user.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// [`Street`] line of this [`Address`].
    pub street: Street,

    /// [`City`] of this [`Address`].
    pub city: City,

    /// [`State`] (or region) of this [`Address`].
    pub state: State,

    /// [`ZipCode`] of this [`Address`].
    pub zip_code: ZipCode,

    /// [`Country`] of this [`Address`].
    pub country: Country,
}

define_text! {
    #[doc = "Street line of an [`Address`]."]
    Street(max = 512)
}

define_text! {
    #[doc = "City of an [`Address`]."]
    City(max = 256)
}

define_text! {
    #[doc = "State or region of an [`Address`]."]
    State(max = 256)
}

define_text! {
    #[doc = "Postal code of an [`Address`]."]
    ZipCode(max = 32)
}

define_text! {
    #[doc = "Country of an [`Address`]."]
    Country(max = 256)
}

#[cfg(test)]
mod tests {
    use super::{Address, ZipCode};

    #[test]
    fn trims_parts() {
        assert_eq!(ZipCode::new("  10001 ").unwrap().as_ref(), "10001");
        assert!(ZipCode::new("   ").is_none());
        assert!(ZipCode::new("0".repeat(33)).is_none());
    }

    #[test]
    fn deserializes_camel_case() {
        let addr: Address = serde_json::from_str(
            r#"{
                "street": "1 Main St",
                "city": "Springfield",
                "state": "IL",
                "zipCode": "62701",
                "country": "USA"
            }"#,
        )
        .unwrap();
        assert_eq!(addr.zip_code.as_ref(), "62701");

        assert!(serde_json::from_str::<Address>(
            r#"{
                "street": "",
                "city": "Springfield",
                "state": "IL",
                "zipCode": "62701",
                "country": "USA"
            }"#,
        )
        .is_err());
    }
}
