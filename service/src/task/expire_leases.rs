//! [`ExpireLeases`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::{
    operations::{
        By, Commit, Insert, Lock, Perform, Select, Start, Transact, Transacted,
    },
    DateTime,
};
use smart_default::SmartDefault;
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{lease, Lease},
    infra::{database, Database},
    read, Service,
};

use super::Task;

/// Configuration for [`ExpireLeases`] [`Task`].
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// Interval between checks for ended [`Lease`]s.
    #[default(time::Duration::from_secs(60 * 60))]
    pub interval: time::Duration,
}

/// [`Task`] moving active [`Lease`]s, which have ended, into
/// [`lease::Status::Expired`].
#[derive(Clone, Copy, Debug)]
pub struct ExpireLeases<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<S> ExpireLeases<S> {
    /// Creates a new [`ExpireLeases`] [`Task`] performed on the provided
    /// [`Service`].
    #[must_use]
    pub const fn new(config: Config, service: S) -> Self {
        Self { config, service }
    }
}

impl<Db> Task<Start<By<ExpireLeases<Self>, Config>>> for Service<Db>
where
    ExpireLeases<Service<Db>>:
        Task<Perform<()>, Ok = usize, Err: Error> + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<ExpireLeases<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let task = ExpireLeases::new(by.into_inner(), self.clone());

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            match task.execute(Perform(())).await {
                Ok(0) => {}
                Ok(n) => log::info!("`task::ExpireLeases` expired {n} leases"),
                Err(e) => log::error!("`task::ExpireLeases` failed: {e}"),
            }
        }
    }
}

impl<Db> Task<Perform<()>> for ExpireLeases<Service<Db>>
where
    Db: Database<
            Select<By<Vec<Lease>, read::lease::list::Filter>>,
            Ok = Vec<Lease>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Lease, lease::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Lease>, lease::Id>>,
            Ok = Option<Lease>,
            Err = Traced<database::Error>,
        > + Database<Insert<Lease>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    /// Number of expired [`Lease`]s.
    type Ok = usize;
    type Err = ExecutionError;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        let now = DateTime::now();

        let ended = self
            .service
            .database()
            .execute(Select(By::new(read::lease::list::Filter {
                status: Some(lease::Status::Active),
                ends_before: Some(now.coerce()),
                ..read::lease::list::Filter::default()
            })))
            .await
            .map_err(tracerr::wrap!())?;

        let mut expired = 0;
        for lease in ended {
            let tx = self
                .service
                .database()
                .execute(Transact)
                .await
                .map_err(tracerr::wrap!())?;

            // Avoid racing with concurrent transitions of the same `Lease`.
            tx.execute(Lock(By::new(lease.id)))
                .await
                .map_err(tracerr::wrap!())
                .map(drop)?;

            let Some(mut lease) = tx
                .execute(Select(By::<Option<Lease>, _>::new(lease.id)))
                .await
                .map_err(tracerr::wrap!())?
            else {
                continue;
            };
            if !lease.expire(now) {
                continue;
            }

            tx.execute(Insert(lease))
                .await
                .map_err(tracerr::wrap!())
                .map(drop)?;
            tx.execute(Commit)
                .await
                .map_err(tracerr::wrap!())
                .map(drop)?;
            expired += 1;
        }

        Ok(expired)
    }
}

/// Error of [`ExpireLeases`] execution.
pub type ExecutionError = Traced<database::Error>;

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use common::{
        operations::{By, Insert, Perform, Select},
        DateTime, Money,
    };

    use crate::{
        domain::{application, lease, property, user, Lease},
        infra::{Database as _, Memory},
        Config, Service, Task as _,
    };

    use super::ExpireLeases;

    fn lease(status: lease::Status, end_date: DateTime) -> Lease {
        Lease {
            id: lease::Id::new(),
            property_id: property::Id::new(),
            tenant_id: user::Id::new(),
            landlord_id: user::Id::new(),
            application_id: application::Id::new(),
            start_date: DateTime::UNIX_EPOCH.coerce(),
            end_date: end_date.coerce(),
            rent_amount: Money::ZERO,
            security_deposit: Money::ZERO,
            payment_due_day: lease::DueDay::new(1).unwrap(),
            terms: lease::Terms::new("Standard terms").unwrap(),
            status,
            tenant_signature: None,
            landlord_signature: None,
            advanced_payment: None,
            created_at: DateTime::UNIX_EPOCH.coerce(),
            updated_at: DateTime::UNIX_EPOCH.coerce(),
        }
    }

    async fn status_of(db: &Memory, id: lease::Id) -> lease::Status {
        db.execute(Select(By::<Option<Lease>, _>::new(id)))
            .await
            .unwrap()
            .unwrap()
            .status
    }

    #[tokio::test]
    async fn expires_only_ended_active_leases() {
        let db = Memory::new();
        let ended = DateTime::now() - Duration::from_secs(60);
        let future = DateTime::now().add_days(30);

        let overdue = lease(lease::Status::Active, ended);
        let ongoing = lease(lease::Status::Active, future);
        let unsigned = lease(lease::Status::PendingTenantSignature, ended);
        for l in [&overdue, &ongoing, &unsigned] {
            db.execute(Insert(l.clone())).await.unwrap();
        }

        let svc =
            Service::without_tasks(Config::with_secret("test"), db.clone());
        let task = ExpireLeases::new(svc.config().expire_leases, svc);

        assert_eq!(task.execute(Perform(())).await.unwrap(), 1);
        assert_eq!(status_of(&db, overdue.id).await, lease::Status::Expired);
        assert_eq!(status_of(&db, ongoing.id).await, lease::Status::Active);
        assert_eq!(
            status_of(&db, unsigned.id).await,
            lease::Status::PendingTenantSignature,
        );

        assert_eq!(task.execute(Perform(())).await.unwrap(), 0);
    }
}
