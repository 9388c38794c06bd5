//! [`Property`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Lock, Select};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{application, property, Address, Property},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Columns of the `properties` table, in the order [`from_row()`] expects.
const COLUMNS: &str = "\
    id, name, \
    address_street, address_city, address_state, address_zip_code, \
    address_country, \
    kind, rent, bedrooms, bathrooms, square_footage, description, \
    amenities, images, status, landlord_id, current_tenant_id, \
    created_at, updated_at";

/// Decodes a [`Property`] from the provided [`Row`].
fn from_row(row: &Row) -> Property {
    Property {
        id: row.get("id"),
        name: row.get("name"),
        address: Address {
            street: row.get("address_street"),
            city: row.get("address_city"),
            state: row.get("address_state"),
            zip_code: row.get("address_zip_code"),
            country: row.get("address_country"),
        },
        kind: row.get("kind"),
        rent: row.get("rent"),
        bedrooms: row.get("bedrooms"),
        bathrooms: row.get("bathrooms"),
        square_footage: row.get("square_footage"),
        description: row.get("description"),
        amenities: row.get("amenities"),
        images: row.get("images"),
        status: row.get("status"),
        landlord_id: row.get("landlord_id"),
        current_tenant_id: row.get("current_tenant_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl<C> Database<Select<By<Option<Property>, property::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Property>, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: property::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM properties \
             WHERE id = $1::UUID"
        );
        Ok(self
            .query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Property>, read::property::list::Filter>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Property>, read::property::list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::property::list::Filter {
            status,
            kind,
            min_rent,
            max_rent,
            bedrooms,
            bathrooms,
            landlord_id,
            current_tenant_id,
            without_approved_applications,
        } = by.into_inner();
        let approved = application::Status::Approved;

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![];
        let mut conditions = vec![];
        macro_rules! push_condition {
            ($value:expr, $cond:literal) => {
                if let Some(v) = $value.as_ref() {
                    ps.push(v);
                    conditions.push(format!($cond, idx = ps.len()));
                }
            };
        }
        push_condition!(status, "status = ${idx}::INT2");
        push_condition!(kind, "kind = ${idx}::INT2");
        push_condition!(min_rent, "rent >= ${idx}::NUMERIC");
        push_condition!(max_rent, "rent <= ${idx}::NUMERIC");
        push_condition!(bedrooms, "bedrooms = ${idx}::INT8");
        push_condition!(bathrooms, "bathrooms = ${idx}::INT8");
        push_condition!(landlord_id, "landlord_id = ${idx}::UUID");
        push_condition!(current_tenant_id, "current_tenant_id = ${idx}::UUID");
        if without_approved_applications {
            ps.push(&approved);
            conditions.push(format!(
                "NOT EXISTS (\
                    SELECT 1 FROM applications a \
                    WHERE a.property_id = properties.id \
                      AND a.status = ${}::INT2\
                 )",
                ps.len(),
            ));
        }

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM properties \
             {filtering} \
             ORDER BY created_at DESC, id",
            filtering = conditions.iter().enumerate().format_with(
                " ",
                |(i, cond), f| {
                    let op = if i == 0 { "WHERE" } else { "AND" };
                    f(&format_args!("{op} {cond}"))
                },
            ),
        );
        Ok(self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Property>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(property): Insert<Property>,
    ) -> Result<Self::Ok, Self::Err> {
        let Property {
            id,
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
            status,
            landlord_id,
            current_tenant_id,
            created_at,
            updated_at,
        } = property;

        const SQL: &str = "\
            INSERT INTO properties (\
                id, name, \
                address_street, address_city, address_state, \
                address_zip_code, address_country, \
                kind, rent, bedrooms, bathrooms, square_footage, \
                description, amenities, images, status, \
                landlord_id, current_tenant_id, \
                created_at, updated_at\
            ) \
            VALUES (\
                $1::UUID, $2::VARCHAR, \
                $3::VARCHAR, $4::VARCHAR, $5::VARCHAR, \
                $6::VARCHAR, $7::VARCHAR, \
                $8::INT2, $9::NUMERIC, $10::INT8, $11::INT8, $12::INT8, \
                $13::TEXT, $14::INT2[], $15::VARCHAR[], $16::INT2, \
                $17::UUID, $18::UUID, \
                $19::TIMESTAMPTZ, $20::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET name = EXCLUDED.name, \
                address_street = EXCLUDED.address_street, \
                address_city = EXCLUDED.address_city, \
                address_state = EXCLUDED.address_state, \
                address_zip_code = EXCLUDED.address_zip_code, \
                address_country = EXCLUDED.address_country, \
                kind = EXCLUDED.kind, \
                rent = EXCLUDED.rent, \
                bedrooms = EXCLUDED.bedrooms, \
                bathrooms = EXCLUDED.bathrooms, \
                square_footage = EXCLUDED.square_footage, \
                description = EXCLUDED.description, \
                amenities = EXCLUDED.amenities, \
                images = EXCLUDED.images, \
                status = EXCLUDED.status, \
                current_tenant_id = EXCLUDED.current_tenant_id, \
                updated_at = EXCLUDED.updated_at";
        self.exec(
            SQL,
            &[
                &id,
                &name,
                &address.street,
                &address.city,
                &address.state,
                &address.zip_code,
                &address.country,
                &kind,
                &rent,
                &bedrooms,
                &bathrooms,
                &square_footage,
                &description,
                &amenities,
                &images,
                &status,
                &landlord_id,
                &current_tenant_id,
                &created_at,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Property, property::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Property, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: property::Id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM properties \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Property, property::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Property, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: property::Id = by.into_inner();

        const SQL: &str = "\
            INSERT INTO properties_lock (id) \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO UPDATE SET id = EXCLUDED.id";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
