//! [`Command`] for listing a new [`Property`].

use common::{operations::Insert, DateTime, Money};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{property, user, Address, Property},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for listing a new [`Property`] by a landlord.
///
/// The [`Property`] is listed as [`property::Status::Available`].
#[derive(Clone, Debug)]
pub struct CreateProperty {
    /// ID of the landlord listing the [`Property`].
    pub landlord_id: user::Id,

    /// [`property::Name`] of the [`Property`].
    pub name: property::Name,

    /// [`Address`] of the [`Property`].
    pub address: Address,

    /// [`property::Kind`] of the [`Property`].
    pub kind: property::Kind,

    /// Monthly rent of the [`Property`].
    pub rent: Money,

    /// Number of bedrooms.
    pub bedrooms: property::Count,

    /// Number of bathrooms.
    pub bathrooms: property::Count,

    /// Area in square feet.
    pub square_footage: property::Count,

    /// [`property::Description`] of the [`Property`].
    pub description: property::Description,

    /// [`property::Amenity`]s of the [`Property`].
    pub amenities: Vec<property::Amenity>,

    /// [`property::Image`]s of the [`Property`].
    ///
    /// [`property::Image::placeholder()`] is used if empty.
    pub images: Vec<property::Image>,
}

impl<Db> Command<CreateProperty> for Service<Db>
where
    Db: Database<Insert<Property>, Err = Traced<database::Error>>,
{
    type Ok = Property;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateProperty,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateProperty {
            landlord_id,
            name,
            address,
            kind,
            rent,
            bedrooms,
            bathrooms,
            square_footage,
            description,
            amenities,
            mut images,
        } = cmd;

        let amenities = amenities.into_iter().fold(vec![], |mut acc, a| {
            if !acc.contains(&a) {
                acc.push(a);
            }
            acc
        });
        if images.is_empty() {
            images.push(property::Image::placeholder());
        }

        let now = DateTime::now();
        let property = Property {
            id: property::Id::new(),
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
            status: property::Status::Available,
            landlord_id,
            current_tenant_id: None,
            created_at: now.coerce(),
            updated_at: now.coerce(),
        };

        self.database()
            .execute(Insert(property.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(property)
    }
}

/// Error of [`CreateProperty`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),
}

#[cfg(test)]
mod tests {
    use crate::{
        domain::{property, user, User},
        query, testing, Command as _, Query as _,
    };

    use super::CreateProperty;

    fn cmd(landlord: &User) -> CreateProperty {
        CreateProperty {
            landlord_id: landlord.id,
            name: "Loft".parse().unwrap(),
            address: testing::address(),
            kind: property::Kind::Condo,
            rent: testing::money("1500.50"),
            bedrooms: property::Count::from(1_u32),
            bathrooms: property::Count::from(1_u32),
            square_footage: property::Count::from(640_u32),
            description: "Top floor".parse().unwrap(),
            amenities: vec![
                property::Amenity::Gym,
                property::Amenity::Elevator,
                property::Amenity::Gym,
            ],
            images: vec![],
        }
    }

    #[tokio::test]
    async fn lists_available_property() {
        let svc = testing::service();
        let landlord = testing::insert_user(&svc, user::Role::Landlord).await;

        let created = svc.execute(cmd(&landlord)).await.unwrap();

        assert_eq!(created.status, property::Status::Available);
        assert_eq!(created.landlord_id, landlord.id);
        assert_eq!(created.current_tenant_id, None);
        assert_eq!(
            created.amenities,
            vec![property::Amenity::Gym, property::Amenity::Elevator],
        );
        assert_eq!(created.images, vec![property::Image::placeholder()]);

        let stored = svc
            .execute(query::property::ById::by(created.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.rent, testing::money("1500.50"));
    }

    #[tokio::test]
    async fn keeps_provided_images() {
        let svc = testing::service();
        let landlord = testing::insert_user(&svc, user::Role::Landlord).await;
        let image: property::Image =
            "https://example.com/1.png".parse().unwrap();

        let created = svc
            .execute(CreateProperty {
                images: vec![image.clone()],
                ..cmd(&landlord)
            })
            .await
            .unwrap();

        assert_eq!(created.images, vec![image]);
    }
}
