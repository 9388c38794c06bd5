//! [`User`]-related [`Database`] implementations.

use common::operations::{By, Insert, Lock, Select};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{address, user, Address, User},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Columns of the `users` table, in the order [`from_row()`] expects them.
const COLUMNS: &str = "\
    id, name, email, password_hash, role, phone, profile_picture, \
    address_street, address_city, address_state, address_zip_code, \
    address_country, \
    created_at, updated_at, deleted_at";

/// Decodes a [`User`] from the provided [`Row`].
fn from_row(row: &Row) -> User {
    let address = match (
        row.get::<_, Option<address::Street>>("address_street"),
        row.get::<_, Option<address::City>>("address_city"),
        row.get::<_, Option<address::State>>("address_state"),
        row.get::<_, Option<address::ZipCode>>("address_zip_code"),
        row.get::<_, Option<address::Country>>("address_country"),
    ) {
        (Some(street), Some(city), Some(state), Some(zip_code), Some(country)) => {
            Some(Address {
                street,
                city,
                state,
                zip_code,
                country,
            })
        }
        _ => None,
    };
    User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: row.get("role"),
        phone: row.get("phone"),
        profile_picture: row.get("profile_picture"),
        address,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        deleted_at: row.get("deleted_at"),
    }
}

impl<C> Database<Select<By<Option<User>, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: user::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM users \
             WHERE id = $1::UUID \
               AND deleted_at IS NULL"
        );
        Ok(self
            .query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<'l, C> Database<Select<By<Option<User>, &'l user::Email>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'l user::Email>>,
    ) -> Result<Self::Ok, Self::Err> {
        let email = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM users \
             WHERE email = $1::VARCHAR \
               AND deleted_at IS NULL \
             LIMIT 1"
        );
        Ok(self
            .query_opt(&sql, &[email])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<User>, read::user::list::Filter>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<User>, read::user::list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::user::list::Filter { role } = by.into_inner();

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![];
        let role_idx = role.as_ref().map(|r| {
            ps.push(r);
            ps.len()
        });

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM users \
             WHERE deleted_at IS NULL \
                   {role_filtering} \
             ORDER BY created_at DESC, id",
            role_filtering = role_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!("AND role = ${idx}::INT2"))
            }),
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

impl<C> Database<Insert<User>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        let User {
            id,
            name,
            email,
            password_hash,
            role,
            phone,
            profile_picture,
            address,
            created_at,
            updated_at,
            deleted_at,
        } = user;
        let (street, city, state, zip_code, country) = address.map_or(
            (None, None, None, None, None),
            |a| {
                (
                    Some(a.street),
                    Some(a.city),
                    Some(a.state),
                    Some(a.zip_code),
                    Some(a.country),
                )
            },
        );

        const SQL: &str = "\
            INSERT INTO users (\
                id, name, email, password_hash, role, phone, profile_picture, \
                address_street, address_city, address_state, \
                address_zip_code, address_country, \
                created_at, updated_at, deleted_at\
            ) \
            VALUES (\
                $1::UUID, $2::VARCHAR, $3::VARCHAR, $4::VARCHAR, \
                $5::INT2, $6::VARCHAR, $7::TEXT, \
                $8::VARCHAR, $9::VARCHAR, $10::VARCHAR, \
                $11::VARCHAR, $12::VARCHAR, \
                $13::TIMESTAMPTZ, $14::TIMESTAMPTZ, $15::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET name = EXCLUDED.name, \
                email = EXCLUDED.email, \
                password_hash = EXCLUDED.password_hash, \
                role = EXCLUDED.role, \
                phone = EXCLUDED.phone, \
                profile_picture = EXCLUDED.profile_picture, \
                address_street = EXCLUDED.address_street, \
                address_city = EXCLUDED.address_city, \
                address_state = EXCLUDED.address_state, \
                address_zip_code = EXCLUDED.address_zip_code, \
                address_country = EXCLUDED.address_country, \
                updated_at = EXCLUDED.updated_at, \
                deleted_at = EXCLUDED.deleted_at";
        self.exec(
            SQL,
            &[
                &id,
                &name,
                &email,
                &password_hash,
                &role,
                &phone,
                &profile_picture,
                &street,
                &city,
                &state,
                &zip_code,
                &country,
                &created_at,
                &updated_at,
                &deleted_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<User, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<User, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: user::Id = by.into_inner();

        const SQL: &str = "\
            INSERT INTO users_lock (id) \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO UPDATE SET id = EXCLUDED.id";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
