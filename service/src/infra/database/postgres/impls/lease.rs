//! [`Lease`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Lock, Select},
    Money,
};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        lease::{self, advanced_payment, AdvancedPayment},
        Lease,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Columns of the `leases` table, in the order [`from_row()`] expects them.
const COLUMNS: &str = "\
    id, property_id, tenant_id, landlord_id, application_id, \
    start_date, end_date, rent_amount, security_deposit, payment_due_day, \
    terms, status, tenant_signature, landlord_signature, \
    advanced_payment_amount, advanced_payment_due_date, \
    advanced_payment_status, advanced_payment_paid_at, \
    created_at, updated_at";

/// Decodes a [`Lease`] from the provided [`Row`].
fn from_row(row: &Row) -> Lease {
    let advanced_payment = match (
        row.get::<_, Option<Money>>("advanced_payment_amount"),
        row.get::<_, Option<advanced_payment::DueDateTime>>(
            "advanced_payment_due_date",
        ),
        row.get::<_, Option<advanced_payment::Status>>(
            "advanced_payment_status",
        ),
    ) {
        (Some(amount), Some(due_date), Some(status)) => Some(AdvancedPayment {
            amount,
            due_date,
            status,
            paid_at: row.get("advanced_payment_paid_at"),
        }),
        _ => None,
    };
    Lease {
        id: row.get("id"),
        property_id: row.get("property_id"),
        tenant_id: row.get("tenant_id"),
        landlord_id: row.get("landlord_id"),
        application_id: row.get("application_id"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        rent_amount: row.get("rent_amount"),
        security_deposit: row.get("security_deposit"),
        payment_due_day: row.get("payment_due_day"),
        terms: row.get("terms"),
        status: row.get("status"),
        tenant_signature: row.get("tenant_signature"),
        landlord_signature: row.get("landlord_signature"),
        advanced_payment,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl<C> Database<Select<By<Option<Lease>, lease::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Lease>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Lease>, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: lease::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM leases \
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

impl<C> Database<Select<By<Vec<Lease>, read::lease::list::Filter>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Lease>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Lease>, read::lease::list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::lease::list::Filter {
            tenant_id,
            landlord_id,
            status,
            ends_before,
        } = by.into_inner();

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![];
        let mut conditions = vec![];
        if let Some(id) = tenant_id.as_ref() {
            ps.push(id);
            conditions.push(format!("tenant_id = ${}::UUID", ps.len()));
        }
        if let Some(id) = landlord_id.as_ref() {
            ps.push(id);
            conditions.push(format!("landlord_id = ${}::UUID", ps.len()));
        }
        if let Some(s) = status.as_ref() {
            ps.push(s);
            conditions.push(format!("status = ${}::INT2", ps.len()));
        }
        if let Some(at) = ends_before.as_ref() {
            ps.push(at);
            conditions.push(format!("end_date < ${}::TIMESTAMPTZ", ps.len()));
        }

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM leases \
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

impl<C> Database<Insert<Lease>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(lease): Insert<Lease>,
    ) -> Result<Self::Ok, Self::Err> {
        let Lease {
            id,
            property_id,
            tenant_id,
            landlord_id,
            application_id,
            start_date,
            end_date,
            rent_amount,
            security_deposit,
            payment_due_day,
            terms,
            status,
            tenant_signature,
            landlord_signature,
            advanced_payment,
            created_at,
            updated_at,
        } = lease;
        let advanced_amount = advanced_payment.map(|p| p.amount);
        let advanced_due_date = advanced_payment.map(|p| p.due_date);
        let advanced_status = advanced_payment.map(|p| p.status);
        let advanced_paid_at = advanced_payment.and_then(|p| p.paid_at);

        const SQL: &str = "\
            INSERT INTO leases (\
                id, property_id, tenant_id, landlord_id, application_id, \
                start_date, end_date, rent_amount, security_deposit, \
                payment_due_day, terms, status, \
                tenant_signature, landlord_signature, \
                advanced_payment_amount, advanced_payment_due_date, \
                advanced_payment_status, advanced_payment_paid_at, \
                created_at, updated_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::UUID, $5::UUID, \
                $6::TIMESTAMPTZ, $7::TIMESTAMPTZ, $8::NUMERIC, $9::NUMERIC, \
                $10::INT2, $11::TEXT, $12::INT2, \
                $13::TEXT, $14::TEXT, \
                $15::NUMERIC, $16::TIMESTAMPTZ, \
                $17::INT2, $18::TIMESTAMPTZ, \
                $19::TIMESTAMPTZ, $20::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET status = EXCLUDED.status, \
                tenant_signature = EXCLUDED.tenant_signature, \
                landlord_signature = EXCLUDED.landlord_signature, \
                advanced_payment_amount = EXCLUDED.advanced_payment_amount, \
                advanced_payment_due_date = \
                    EXCLUDED.advanced_payment_due_date, \
                advanced_payment_status = EXCLUDED.advanced_payment_status, \
                advanced_payment_paid_at = EXCLUDED.advanced_payment_paid_at, \
                updated_at = EXCLUDED.updated_at";
        self.exec(
            SQL,
            &[
                &id,
                &property_id,
                &tenant_id,
                &landlord_id,
                &application_id,
                &start_date,
                &end_date,
                &rent_amount,
                &security_deposit,
                &payment_due_day,
                &terms,
                &status,
                &tenant_signature,
                &landlord_signature,
                &advanced_amount,
                &advanced_due_date,
                &advanced_status,
                &advanced_paid_at,
                &created_at,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Lease, lease::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Lease, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: lease::Id = by.into_inner();

        const SQL: &str = "\
            INSERT INTO leases_lock (id) \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO UPDATE SET id = EXCLUDED.id";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
