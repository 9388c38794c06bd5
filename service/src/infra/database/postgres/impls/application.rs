//! [`Application`]-related [`Database`] implementations.

use common::operations::{By, Insert, Lock, Select};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        application::{self, PreviousLandlord},
        property, user, Application,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::{self, application::Outstanding},
};

/// Columns of the `applications` table, in the order [`from_row()`]
/// expects them.
const COLUMNS: &str = "\
    a.id, a.property_id, a.tenant_id, \
    a.employment_status, a.annual_income, a.current_address, \
    a.previous_landlord_name, a.previous_landlord_phone, \
    a.previous_landlord_email, \
    a.reason_for_moving, a.additional_notes, a.status, \
    a.created_at, a.updated_at";

/// Decodes an [`Application`] from the provided [`Row`].
fn from_row(row: &Row) -> Application {
    Application {
        id: row.get("id"),
        property_id: row.get("property_id"),
        tenant_id: row.get("tenant_id"),
        employment_status: row.get("employment_status"),
        annual_income: row.get("annual_income"),
        current_address: row.get("current_address"),
        previous_landlord: PreviousLandlord {
            name: row.get("previous_landlord_name"),
            phone: row.get("previous_landlord_phone"),
            email: row.get("previous_landlord_email"),
        },
        reason_for_moving: row.get("reason_for_moving"),
        additional_notes: row.get("additional_notes"),
        status: row.get("status"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl<C> Database<Select<By<Option<Application>, application::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Application>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Application>, application::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: application::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM applications a \
             WHERE a.id = $1::UUID"
        );
        Ok(self
            .query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C>
    Database<
        Select<
            By<Option<Outstanding<Application>>, (property::Id, user::Id)>,
        >,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Outstanding<Application>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Option<Outstanding<Application>>, (property::Id, user::Id)>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let (property_id, tenant_id) = by.into_inner();
        let (pending, approved) =
            (application::Status::Pending, application::Status::Approved);

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM applications a \
             WHERE a.property_id = $1::UUID \
               AND a.tenant_id = $2::UUID \
               AND a.status IN ($3::INT2, $4::INT2) \
             LIMIT 1"
        );
        Ok(self
            .query_opt(&sql, &[&property_id, &tenant_id, &pending, &approved])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row)
            .map(Outstanding))
    }
}

impl<C>
    Database<Select<By<Vec<Application>, read::application::list::Filter>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Application>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Vec<Application>, read::application::list::Filter>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::application::list::Filter {
            tenant_id,
            landlord_id,
            status,
        } = by.into_inner();

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![];
        let tenant_idx = tenant_id.as_ref().map(|id| {
            ps.push(id);
            ps.len()
        });
        let landlord_idx = landlord_id.as_ref().map(|id| {
            ps.push(id);
            ps.len()
        });
        let status_idx = status.as_ref().map(|s| {
            ps.push(s);
            ps.len()
        });

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM applications a \
             INNER JOIN properties p ON p.id = a.property_id \
             WHERE TRUE \
                   {tenant_filtering} \
                   {landlord_filtering} \
                   {status_filtering} \
             ORDER BY a.created_at DESC, a.id",
            tenant_filtering = tenant_idx.into_iter().format_with("", |i, f| {
                f(&format_args!("AND a.tenant_id = ${i}::UUID"))
            }),
            landlord_filtering =
                landlord_idx.into_iter().format_with("", |i, f| {
                    f(&format_args!("AND p.landlord_id = ${i}::UUID"))
                }),
            status_filtering = status_idx.into_iter().format_with("", |i, f| {
                f(&format_args!("AND a.status = ${i}::INT2"))
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

impl<C> Database<Insert<Application>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(application): Insert<Application>,
    ) -> Result<Self::Ok, Self::Err> {
        let Application {
            id,
            property_id,
            tenant_id,
            employment_status,
            annual_income,
            current_address,
            previous_landlord,
            reason_for_moving,
            additional_notes,
            status,
            created_at,
            updated_at,
        } = application;

        const SQL: &str = "\
            INSERT INTO applications (\
                id, property_id, tenant_id, \
                employment_status, annual_income, current_address, \
                previous_landlord_name, previous_landlord_phone, \
                previous_landlord_email, \
                reason_for_moving, additional_notes, status, \
                created_at, updated_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, \
                $4::INT2, $5::NUMERIC, $6::VARCHAR, \
                $7::VARCHAR, $8::VARCHAR, \
                $9::VARCHAR, \
                $10::TEXT, $11::TEXT, $12::INT2, \
                $13::TIMESTAMPTZ, $14::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET status = EXCLUDED.status, \
                additional_notes = EXCLUDED.additional_notes, \
                updated_at = EXCLUDED.updated_at";
        self.exec(
            SQL,
            &[
                &id,
                &property_id,
                &tenant_id,
                &employment_status,
                &annual_income,
                &current_address,
                &previous_landlord.name,
                &previous_landlord.phone,
                &previous_landlord.email,
                &reason_for_moving,
                &additional_notes,
                &status,
                &created_at,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Application, application::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Application, application::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: application::Id = by.into_inner();

        const SQL: &str = "\
            INSERT INTO applications_lock (id) \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO UPDATE SET id = EXCLUDED.id";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
