//! [`Property`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money};
use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

use super::{define_id, define_text, user, Address};

/// Property listed for rent by a landlord.
#[derive(Clone, Debug)]
pub struct Property {
    /// ID of this [`Property`].
    pub id: Id,

    /// [`Name`] of this [`Property`].
    pub name: Name,

    /// [`Address`] of this [`Property`].
    pub address: Address,

    /// [`Kind`] of this [`Property`].
    pub kind: Kind,

    /// Monthly rent of this [`Property`].
    pub rent: Money,

    /// Number of bedrooms in this [`Property`].
    pub bedrooms: Count,

    /// Number of bathrooms in this [`Property`].
    pub bathrooms: Count,

    /// Area of this [`Property`] in square feet.
    pub square_footage: Count,

    /// [`Description`] of this [`Property`].
    pub description: Description,

    /// [`Amenity`]s of this [`Property`], without duplicates.
    pub amenities: Vec<Amenity>,

    /// [`Image`]s of this [`Property`], never empty.
    pub images: Vec<Image>,

    /// [`Status`] of this [`Property`].
    pub status: Status,

    /// ID of the landlord owning this [`Property`].
    pub landlord_id: user::Id,

    /// ID of the tenant currently occupying (or about to occupy) this
    /// [`Property`], if any.
    pub current_tenant_id: Option<user::Id>,

    /// [`DateTime`] when this [`Property`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Property`] was modified the last time.
    pub updated_at: ModificationDateTime,
}

impl Property {
    /// Indicates whether this [`Property`] is owned by the provided
    /// landlord.
    #[must_use]
    pub fn is_owned_by(&self, landlord_id: user::Id) -> bool {
        self.landlord_id == landlord_id
    }

    /// Indicates whether this [`Property`] accepts new applications.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.status == Status::Available
    }

    /// Binds this [`Property`] to the provided tenant, moving it into the
    /// provided [`Status`].
    pub fn bind_tenant(&mut self, tenant_id: user::Id, status: Status) {
        self.status = status;
        self.current_tenant_id = Some(tenant_id);
        self.updated_at = DateTimeOf::now();
    }
}

define_id! {
    #[doc = "ID of a [`Property`]."]
    Id
}

define_kind! {
    #[doc = "Kind of a [`Property`]."]
    #[case = "lowercase"]
    enum Kind {
        #[doc = "Apartment in a multi-unit building."]
        Apartment = 1,

        #[doc = "Detached house."]
        House = 2,

        #[doc = "Condominium."]
        Condo = 3,

        #[doc = "Townhouse."]
        Townhouse = 4,
    }
}

define_kind! {
    #[doc = "Status of a [`Property`]."]
    #[case = "lowercase"]
    enum Status {
        #[doc = "Open for applications."]
        Available = 1,

        #[doc = "Reserved for a tenant by a lease being signed."]
        Reserved = 2,

        #[doc = "Rented by a tenant."]
        Rented = 3,

        #[doc = "Under maintenance."]
        Maintenance = 4,
    }
}

define_kind! {
    #[doc = "Amenity of a [`Property`]."]
    #[case = "kebab-case"]
    enum Amenity {
        #[doc = "Parking place."]
        Parking = 1,

        #[doc = "Swimming pool."]
        Pool = 2,

        #[doc = "Gym."]
        Gym = 3,

        #[doc = "Laundry."]
        Laundry = 4,

        #[doc = "Elevator."]
        Elevator = 5,

        #[doc = "Security service."]
        Security = 6,

        #[doc = "Furniture included."]
        Furnished = 7,

        #[doc = "Pets allowed."]
        PetFriendly = 8,

        #[doc = "Utility bills included into rent."]
        UtilitiesIncluded = 9,

        #[doc = "Air conditioning."]
        AirConditioning = 10,

        #[doc = "Heating."]
        Heating = 11,
    }
}

define_text! {
    #[doc = "Name of a [`Property`]."]
    Name(max = 512)
}

define_text! {
    #[doc = "Description of a [`Property`]."]
    Description(max = 16 * 1024)
}

define_text! {
    #[doc = "URL of a [`Property`] image."]
    Image(max = 4096)
}

impl Image {
    /// URL of the placeholder image used when no images are provided.
    pub const PLACEHOLDER: &'static str = "https://placehold.co/600x400";

    /// Returns the placeholder [`Image`].
    #[must_use]
    pub fn placeholder() -> Self {
        Self(Self::PLACEHOLDER.to_owned())
    }
}

/// Non-negative count of something in a [`Property`] (rooms, square feet).
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
pub struct Count(u32);

#[cfg(feature = "postgres")]
mod postgres {
    //! Module providing [`Count`] representation as PostgreSQL `INT8`.

    use std::error::Error as StdError;

    use postgres_types::{
        accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql,
        Type,
    };

    use super::Count;

    impl FromSql<'_> for Count {
        accepts!(INT8);

        fn from_sql(
            ty: &Type,
            raw: &[u8],
        ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
            Ok(Self(u32::try_from(i64::from_sql(ty, raw)?)?))
        }
    }

    impl ToSql for Count {
        accepts!(INT8);
        to_sql_checked!();

        fn to_sql(
            &self,
            ty: &Type,
            w: &mut BytesMut,
        ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
            i64::from(self.0).to_sql(ty, w)
        }
    }
}

/// [`DateTime`] when a [`Property`] was created.
pub type CreationDateTime = DateTimeOf<(Property, unit::Creation)>;

/// [`DateTime`] when a [`Property`] was modified.
pub type ModificationDateTime = DateTimeOf<(Property, unit::Modification)>;

#[cfg(test)]
mod tests {
    use super::{Amenity, Kind, Status};

    #[test]
    fn amenities_are_kebab_case() {
        assert_eq!(Amenity::PetFriendly.to_string(), "pet-friendly");
        assert_eq!(
            "utilities-included".parse::<Amenity>().unwrap(),
            Amenity::UtilitiesIncluded,
        );
        assert!("sauna".parse::<Amenity>().is_err());
        assert_eq!(Amenity::ALL.len(), 11);
    }

    #[test]
    fn kinds_and_statuses() {
        assert_eq!(Kind::valid_values(), "apartment, house, condo, townhouse");
        assert_eq!(
            serde_json::from_str::<Status>(r#""maintenance""#).unwrap(),
            Status::Maintenance,
        );
        assert!(serde_json::from_str::<Status>(r#""sold""#).is_err());
    }
}
