//! [`Property`]-related endpoints.

use axum::response::IntoResponse;
use common::{DateTime, Money};
use itertools::Itertools as _;
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _},
    domain::{self, property, user, Address},
    query, read, Query as _,
};

use crate::{
    api::{self, Created, Json, Message, Path, Query, StatusError},
    define_error, AsError, Context, Error, Session,
};

/// Listed [`domain::Property`].
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    /// ID of this [`Property`].
    pub id: property::Id,

    /// Name of this [`Property`].
    pub name: property::Name,

    /// Address of this [`Property`].
    pub address: Address,

    /// Kind of this [`Property`].
    pub property_type: property::Kind,

    /// Monthly rent of this [`Property`].
    pub rent: Money,

    /// Number of bedrooms.
    pub bedrooms: property::Count,

    /// Number of bathrooms.
    pub bathrooms: property::Count,

    /// Area in square feet.
    pub square_footage: property::Count,

    /// Description of this [`Property`].
    pub description: property::Description,

    /// Amenities of this [`Property`].
    pub amenities: Vec<property::Amenity>,

    /// Image URLs of this [`Property`].
    pub images: Vec<property::Image>,

    /// Status of this [`Property`].
    pub status: property::Status,

    /// ID of the owning landlord.
    ///
    /// Omitted in public views.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landlord: Option<user::Id>,

    /// ID of the current tenant.
    pub current_tenant: Option<user::Id>,

    /// When this [`Property`] was listed.
    pub created_at: DateTime,

    /// When this [`Property`] was modified the last time.
    pub updated_at: DateTime,
}

impl Property {
    /// Creates a public view of the provided [`domain::Property`], not
    /// revealing its landlord.
    #[must_use]
    pub fn public(property: domain::Property) -> Self {
        Self {
            landlord: None,
            ..Self::from(property)
        }
    }
}

impl From<domain::Property> for Property {
    fn from(p: domain::Property) -> Self {
        Self {
            id: p.id,
            name: p.name,
            address: p.address,
            property_type: p.kind,
            rent: p.rent,
            bedrooms: p.bedrooms,
            bathrooms: p.bathrooms,
            square_footage: p.square_footage,
            description: p.description,
            amenities: p.amenities,
            images: p.images,
            status: p.status,
            landlord: Some(p.landlord_id),
            current_tenant: p.current_tenant_id,
            created_at: p.created_at.coerce(),
            updated_at: p.updated_at.coerce(),
        }
    }
}

/// Request of the [`create`] endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    /// Name of the new property.
    pub name: property::Name,

    /// Address of the new property.
    pub address: Address,

    /// Kind of the new property, parsed by [`parse_kind()`].
    pub property_type: String,

    /// Monthly rent.
    pub rent: Money,

    /// Number of bedrooms.
    pub bedrooms: property::Count,

    /// Number of bathrooms.
    pub bathrooms: property::Count,

    /// Area in square feet.
    pub square_footage: property::Count,

    /// Description of the new property.
    pub description: property::Description,

    /// Amenities of the new property, parsed by [`parse_amenities()`].
    #[serde(default)]
    pub amenities: Vec<String>,

    /// Image URLs of the new property.
    #[serde(default)]
    pub images: Vec<property::Image>,
}

/// Lists a new property of the authenticated landlord.
#[tracing::instrument(
    skip_all,
    fields(
        http.route = "POST /api/properties",
        otel.name = "createProperty",
        user.id = %session.user_id(),
    ),
)]
pub async fn create(
    ctx: Context,
    session: Session,
    Json(req): Json<CreateRequest>,
) -> api::Result<Created<Property>> {
    session.require(&[user::Role::Landlord])?;

    let CreateRequest {
        name,
        address,
        property_type,
        rent,
        bedrooms,
        bathrooms,
        square_footage,
        description,
        amenities,
        images,
    } = req;
    let kind = parse_kind(&property_type)?;
    let amenities = parse_amenities(amenities)?;

    let property = ctx
        .service()
        .execute(command::CreateProperty {
            landlord_id: session.user_id(),
            name,
            address,
            kind,
            rent,
            bedrooms,
            bathrooms,
            square_footage,
            description,
            amenities,
            images,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Created(property.into()))
}

/// Parses the provided [`property::Kind`], listing the valid ones on failure.
fn parse_kind(value: &str) -> Result<property::Kind, Error> {
    value.parse().map_err(|_| Error {
        code: "INVALID_PROPERTY_TYPE",
        status_code: http::StatusCode::BAD_REQUEST,
        message: format!(
            "Invalid property type. Must be one of: {}",
            property::Kind::valid_values(),
        ),
        backtrace: None,
    })
}

/// Parses the provided [`property::Amenity`]s, listing the unknown ones on
/// failure.
fn parse_amenities(
    values: Vec<String>,
) -> Result<Vec<property::Amenity>, Error> {
    let (amenities, invalid): (Vec<_>, Vec<_>) = values
        .into_iter()
        .map(|v| v.parse::<property::Amenity>().map_err(|_| v))
        .partition_result();
    if !invalid.is_empty() {
        return Err(Error {
            code: "INVALID_AMENITIES",
            status_code: http::StatusCode::BAD_REQUEST,
            message: format!("Invalid amenities: {}", invalid.join(", ")),
            backtrace: None,
        });
    }
    Ok(amenities)
}

/// Query string of the [`list`] endpoint.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// Exact property kind.
    pub property_type: Option<property::Kind>,

    /// Minimal rent (inclusive).
    pub min_rent: Option<Money>,

    /// Maximal rent (inclusive).
    pub max_rent: Option<Money>,

    /// Exact number of bedrooms.
    pub bedrooms: Option<u32>,

    /// Exact number of bathrooms.
    pub bathrooms: Option<u32>,
}

impl From<ListQuery> for read::property::list::Filter {
    fn from(query: ListQuery) -> Self {
        Self {
            kind: query.property_type,
            min_rent: query.min_rent,
            max_rent: query.max_rent,
            bedrooms: query.bedrooms.map(Into::into),
            bathrooms: query.bathrooms.map(Into::into),
            ..Self::available()
        }
    }
}

/// Lists available properties matching the provided filters.
#[tracing::instrument(
    skip_all,
    fields(http.route = "GET /api/properties", otel.name = "listProperties"),
)]
pub async fn list(
    ctx: Context,
    Query(query): Query<ListQuery>,
) -> api::Result<Json<Vec<Property>>> {
    let properties = ctx
        .service()
        .execute(query::property::List::by(query.into()))
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(properties.into_iter().map(Into::into).collect()))
}

/// [`read::property::list::Filter`] of the public listing.
///
/// Unlike the filtered listing, it shows properties with approved
/// applications as long as their status is still `available`.
fn public_listing() -> read::property::list::Filter {
    read::property::list::Filter {
        status: Some(property::Status::Available),
        ..read::property::list::Filter::default()
    }
}

/// Lists available properties without revealing their landlords.
#[tracing::instrument(
    skip_all,
    fields(
        http.route = "GET /api/properties/public",
        otel.name = "listPublicProperties",
    ),
)]
pub async fn list_public(ctx: Context) -> api::Result<Json<Vec<Property>>> {
    let properties = ctx
        .service()
        .execute(query::property::List::by(public_listing()))
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(properties.into_iter().map(Property::public).collect()))
}

/// Lists properties of the authenticated landlord.
#[tracing::instrument(
    skip_all,
    fields(
        http.route = "GET /api/properties/landlord",
        otel.name = "listOwnProperties",
        user.id = %session.user_id(),
    ),
)]
pub async fn list_own(
    ctx: Context,
    session: Session,
) -> api::Result<Json<Vec<Property>>> {
    session.require(&[user::Role::Landlord])?;

    let properties = ctx
        .service()
        .execute(query::property::List::by(read::property::list::Filter {
            landlord_id: Some(session.user_id()),
            ..read::property::list::Filter::default()
        }))
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(properties.into_iter().map(Into::into).collect()))
}

/// Returns the property with the provided ID.
#[tracing::instrument(
    skip_all,
    fields(
        http.route = "GET /api/properties/:id",
        otel.name = "getProperty",
        property.id = %id,
    ),
)]
pub async fn get(
    ctx: Context,
    _: Session,
    Path(id): Path<property::Id>,
) -> api::Result<Json<Property>> {
    let property = ctx
        .service()
        .execute(query::property::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .ok_or(PropertyError::NotFound)?;

    Ok(Json(property.into()))
}

/// Returns the available property with the provided ID, without revealing
/// its landlord.
#[tracing::instrument(
    skip_all,
    fields(
        http.route = "GET /api/properties/:id/public",
        otel.name = "getPublicProperty",
        property.id = %id,
    ),
)]
pub async fn get_public(
    ctx: Context,
    Path(id): Path<property::Id>,
) -> api::Result<Json<Property>> {
    let property = ctx
        .service()
        .execute(query::property::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .filter(domain::Property::is_available)
        .ok_or(PropertyError::NotAvailable)?;

    Ok(Json(Property::public(property)))
}

/// Returns the property with the provided ID, if the authenticated tenant
/// occupies it.
#[tracing::instrument(
    skip_all,
    fields(
        http.route = "GET /api/properties/:id/tenant",
        otel.name = "getRentedProperty",
        property.id = %id,
        user.id = %session.user_id(),
    ),
)]
pub async fn get_rented(
    ctx: Context,
    session: Session,
    Path(id): Path<property::Id>,
) -> api::Result<Json<Property>> {
    session.require(&[user::Role::Tenant])?;

    let property = ctx
        .service()
        .execute(query::property::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .filter(|p| p.current_tenant_id == Some(session.user_id()))
        .ok_or(PropertyError::NotRented)?;

    Ok(Json(property.into()))
}

/// Request of the [`update`] endpoint.
#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    /// New status.
    pub status: Option<String>,

    /// New name.
    pub name: Option<property::Name>,

    /// New monthly rent.
    pub rent: Option<Money>,

    /// New description.
    pub description: Option<property::Description>,
}

/// Edits the property with the provided ID, owned by the authenticated
/// landlord.
#[tracing::instrument(
    skip_all,
    fields(
        http.route = "PATCH /api/properties/:id",
        otel.name = "updateProperty",
        property.id = %id,
        user.id = %session.user_id(),
    ),
)]
pub async fn update(
    ctx: Context,
    session: Session,
    Path(id): Path<property::Id>,
    Json(req): Json<UpdateRequest>,
) -> api::Result<Json<Property>> {
    session.require(&[user::Role::Landlord])?;

    let UpdateRequest {
        status,
        name,
        rent,
        description,
    } = req;
    let status = status
        .map(|s| s.parse::<property::Status>())
        .transpose()
        .map_err(|_| StatusError::Invalid)?;

    let property = ctx
        .service()
        .execute(command::UpdateProperty {
            property_id: id,
            initiator_id: session.user_id(),
            status,
            name,
            rent,
            description,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(property.into()))
}

/// Removes the property with the provided ID, owned by the authenticated
/// landlord.
#[tracing::instrument(
    skip_all,
    fields(
        http.route = "DELETE /api/properties/:id",
        otel.name = "deleteProperty",
        property.id = %id,
        user.id = %session.user_id(),
    ),
)]
pub async fn delete(
    ctx: Context,
    session: Session,
    Path(id): Path<property::Id>,
) -> api::Result<impl IntoResponse> {
    session.require(&[user::Role::Landlord])?;

    _ = ctx
        .service()
        .execute(command::DeleteProperty {
            property_id: id,
            initiator_id: session.user_id(),
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Message::new("Property deleted successfully"))
}

impl AsError for command::create_property::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::update_property::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotOwner(_) => Some(api::PrivilegeError::Unauthorized.into()),
            Self::PropertyNotExists(_) => Some(PropertyError::NotFound.into()),
        }
    }
}

impl AsError for command::delete_property::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotOwner(_) => Some(api::PrivilegeError::Unauthorized.into()),
            Self::PropertyNotExists(_) => Some(PropertyError::NotFound.into()),
        }
    }
}

define_error! {
    enum PropertyError {
        #[code = "PROPERTY_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "Property not found"]
        NotFound,

        #[code = "PROPERTY_NOT_AVAILABLE"]
        #[status = NOT_FOUND]
        #[message = "Property not found or not available"]
        NotAvailable,

        #[code = "PROPERTY_NOT_RENTED"]
        #[status = NOT_FOUND]
        #[message = "Property not found or access denied"]
        NotRented,
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use common::{DateTime, Money};
    use service::{
        command::update_property,
        domain::{self, address, property, user, Address},
        read,
    };

    use crate::AsError as _;

    use super::{
        parse_amenities, parse_kind, public_listing, ListQuery, Property,
    };

    fn property() -> domain::Property {
        domain::Property {
            id: property::Id::new(),
            name: property::Name::new("Loft").unwrap(),
            address: Address {
                street: address::Street::new("1 Main St").unwrap(),
                city: address::City::new("Springfield").unwrap(),
                state: address::State::new("IL").unwrap(),
                zip_code: address::ZipCode::new("62701").unwrap(),
                country: address::Country::new("USA").unwrap(),
            },
            kind: property::Kind::Condo,
            rent: Money::from_str("1250.5").unwrap(),
            bedrooms: property::Count::from(2_u32),
            bathrooms: property::Count::from(1_u32),
            square_footage: property::Count::from(800_u32),
            description: property::Description::new("Bright").unwrap(),
            amenities: vec![property::Amenity::PetFriendly],
            images: vec![property::Image::placeholder()],
            status: property::Status::Available,
            landlord_id: user::Id::new(),
            current_tenant_id: None,
            created_at: DateTime::now().coerce(),
            updated_at: DateTime::now().coerce(),
        }
    }

    #[test]
    fn serializes_camel_case() {
        let p = property();
        let landlord = p.landlord_id;
        let json = serde_json::to_value(Property::from(p)).unwrap();

        assert_eq!(json["propertyType"], "condo");
        assert_eq!(json["rent"], 1250.5);
        assert_eq!(json["squareFootage"], 800);
        assert_eq!(json["amenities"], serde_json::json!(["pet-friendly"]));
        assert_eq!(json["address"]["zipCode"], "62701");
        assert_eq!(json["landlord"], landlord.to_string());
        assert!(json["currentTenant"].is_null());
    }

    #[test]
    fn public_view_hides_landlord() {
        let json = serde_json::to_value(Property::public(property())).unwrap();

        assert!(json.get("landlord").is_none());
        assert_eq!(json["images"][0], property::Image::PLACEHOLDER);
    }

    #[test]
    fn query_lists_available_only() {
        let filter = read::property::list::Filter::from(ListQuery {
            property_type: Some(property::Kind::House),
            bedrooms: Some(3),
            ..ListQuery::default()
        });

        assert_eq!(filter.status, Some(property::Status::Available));
        assert!(filter.without_approved_applications);
        assert_eq!(filter.kind, Some(property::Kind::House));
        assert_eq!(filter.bedrooms, Some(property::Count::from(3_u32)));
        assert!(filter.bathrooms.is_none());
    }

    #[test]
    fn public_listing_filters_by_status_only() {
        let filter = public_listing();

        assert_eq!(filter.status, Some(property::Status::Available));
        assert!(!filter.without_approved_applications);
        assert!(filter.landlord_id.is_none());
    }

    #[test]
    fn invalid_kind_lists_valid_ones() {
        assert_eq!(parse_kind("townhouse").unwrap(), property::Kind::Townhouse);

        let err = parse_kind("castle").unwrap_err();
        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
        assert_eq!(
            err.message,
            "Invalid property type. Must be one of: \
             apartment, house, condo, townhouse",
        );
    }

    #[test]
    fn invalid_amenities_are_listed() {
        assert_eq!(
            parse_amenities(vec!["pool".into(), "pet-friendly".into()])
                .unwrap(),
            [property::Amenity::Pool, property::Amenity::PetFriendly],
        );

        let err = parse_amenities(vec![
            "pool".into(),
            "moat".into(),
            "helipad".into(),
        ])
        .unwrap_err();
        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Invalid amenities: moat, helipad");
    }

    #[test]
    fn non_owner_is_forbidden() {
        let err = update_property::ExecutionError::NotOwner(user::Id::new())
            .into_error();

        assert_eq!(err.status_code, http::StatusCode::FORBIDDEN);
    }
}
