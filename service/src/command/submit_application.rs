//! [`Command`] for submitting a new [`Application`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{application, property, user, Application, Property},
    infra::{database, Database},
    read::application::Outstanding,
    Service,
};

use super::Command;

/// [`Command`] for submitting a new [`Application`] by a tenant.
///
/// A tenant may have only one [`Outstanding`] [`Application`] per
/// [`Property`].
#[derive(Clone, Debug)]
pub struct SubmitApplication {
    /// ID of the [`Property`] being applied for.
    pub property_id: property::Id,

    /// ID of the applying tenant.
    pub tenant_id: user::Id,

    /// [`application::EmploymentStatus`] of the tenant.
    pub employment_status: application::EmploymentStatus,

    /// Annual income of the tenant.
    pub annual_income: Money,

    /// [`application::CurrentAddress`] of the tenant.
    pub current_address: application::CurrentAddress,

    /// [`application::PreviousLandlord`] of the tenant.
    pub previous_landlord: application::PreviousLandlord,

    /// [`application::Reason`] for moving.
    pub reason_for_moving: application::Reason,

    /// [`application::Notes`] of the tenant.
    pub additional_notes: Option<application::Notes>,
}

impl<Db> Command<SubmitApplication> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Property, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<
            Select<
                By<Option<Outstanding<Application>>, (property::Id, user::Id)>,
            >,
            Ok = Option<Outstanding<Application>>,
            Err = Traced<database::Error>,
        > + Database<Insert<Application>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Application;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: SubmitApplication,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SubmitApplication {
            property_id,
            tenant_id,
            employment_status,
            annual_income,
            current_address,
            previous_landlord,
            reason_for_moving,
            additional_notes,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Serializes applications for the same `Property`, so the same tenant
        // cannot apply twice concurrently.
        tx.execute(Lock(By::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let property = tx
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())?;
        if !property.is_available() {
            return Err(tracerr::new!(E::PropertyNotAvailable(property_id)));
        }

        let existing = tx
            .execute(Select(By::<Option<Outstanding<Application>>, _>::new((
                property_id,
                tenant_id,
            ))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if let Some(Outstanding(existing)) = existing {
            return Err(tracerr::new!(E::AlreadyApplied(existing.id)));
        }

        let now = DateTime::now();
        let application = Application {
            id: application::Id::new(),
            property_id,
            tenant_id,
            employment_status,
            annual_income,
            current_address,
            previous_landlord,
            reason_for_moving,
            additional_notes,
            status: application::Status::Pending,
            created_at: now.coerce(),
            updated_at: now.coerce(),
        };

        tx.execute(Insert(application.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(application)
    }
}

/// Error of [`SubmitApplication`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Tenant already has an [`Outstanding`] [`Application`] for the
    /// [`Property`].
    #[display("`Application(id: {_0})` is still outstanding")]
    AlreadyApplied(#[error(not(source))] application::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Property`] doesn't accept [`Application`]s.
    #[display("`Property(id: {_0})` is not available")]
    PropertyNotAvailable(#[error(not(source))] property::Id),

    /// [`Property`] doesn't exist.
    #[display("`Property(id: {_0})` does not exist")]
    PropertyNotExists(#[error(not(source))] property::Id),
}

#[cfg(test)]
mod tests {
    use common::operations::Insert;

    use crate::{
        domain::{application, property, user, Property, User},
        infra::Database as _,
        query, read, testing, Command as _, Query as _,
    };

    use super::{ExecutionError, SubmitApplication};

    fn cmd(property: &Property, tenant: &User) -> SubmitApplication {
        SubmitApplication {
            property_id: property.id,
            tenant_id: tenant.id,
            employment_status: application::EmploymentStatus::PartTime,
            annual_income: testing::money("42000"),
            current_address: "3 Oak St".parse().unwrap(),
            previous_landlord: testing::previous_landlord(),
            reason_for_moving: "More space".parse().unwrap(),
            additional_notes: None,
        }
    }

    #[tokio::test]
    async fn submits_pending_application() {
        let svc = testing::service();
        let landlord = testing::insert_user(&svc, user::Role::Landlord).await;
        let tenant = testing::insert_user(&svc, user::Role::Tenant).await;
        let property = testing::insert_property(&svc, &landlord).await;

        let submitted = svc.execute(cmd(&property, &tenant)).await.unwrap();

        assert_eq!(submitted.status, application::Status::Pending);
        assert_eq!(submitted.property_id, property.id);
        assert_eq!(submitted.tenant_id, tenant.id);
        assert!(svc
            .execute(query::application::ById::by(submitted.id))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn rejects_second_outstanding_application() {
        let svc = testing::service();
        let landlord = testing::insert_user(&svc, user::Role::Landlord).await;
        let tenant = testing::insert_user(&svc, user::Role::Tenant).await;
        let other = testing::insert_user(&svc, user::Role::Tenant).await;
        let property = testing::insert_property(&svc, &landlord).await;
        drop(svc.execute(cmd(&property, &tenant)).await.unwrap());

        let err = svc.execute(cmd(&property, &tenant)).await.unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::AlreadyApplied(_)));

        drop(svc.execute(cmd(&property, &other)).await.unwrap());
    }

    #[tokio::test]
    async fn serializes_concurrent_submissions() {
        let svc = testing::service();
        let landlord = testing::insert_user(&svc, user::Role::Landlord).await;
        let tenant = testing::insert_user(&svc, user::Role::Tenant).await;
        let property = testing::insert_property(&svc, &landlord).await;

        let (first, second) = tokio::join!(
            svc.execute(cmd(&property, &tenant)),
            svc.execute(cmd(&property, &tenant)),
        );

        let errs = [first, second]
            .into_iter()
            .filter_map(Result::err)
            .collect::<Vec<_>>();
        assert_eq!(errs.len(), 1);
        assert!(matches!(errs[0].as_ref(), ExecutionError::AlreadyApplied(_)));

        let stored = svc
            .execute(query::application::List::by(
                read::application::list::Filter {
                    tenant_id: Some(tenant.id),
                    ..read::application::list::Filter::default()
                },
            ))
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test]
    async fn allows_reapplying_after_rejection() {
        let svc = testing::service();
        let landlord = testing::insert_user(&svc, user::Role::Landlord).await;
        let tenant = testing::insert_user(&svc, user::Role::Tenant).await;
        let property = testing::insert_property(&svc, &landlord).await;
        drop(
            testing::insert_application(
                &svc,
                &property,
                &tenant,
                application::Status::Rejected,
            )
            .await,
        );

        drop(svc.execute(cmd(&property, &tenant)).await.unwrap());
    }

    #[tokio::test]
    async fn rejects_unavailable_property() {
        let svc = testing::service();
        let landlord = testing::insert_user(&svc, user::Role::Landlord).await;
        let tenant = testing::insert_user(&svc, user::Role::Tenant).await;
        let mut property = testing::insert_property(&svc, &landlord).await;
        property.status = property::Status::Rented;
        svc.database()
            .execute(Insert(property.clone()))
            .await
            .unwrap();

        let err = svc.execute(cmd(&property, &tenant)).await.unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::PropertyNotAvailable(_),
        ));

        property.id = property::Id::new();
        let err = svc.execute(cmd(&property, &tenant)).await.unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::PropertyNotExists(_)));
    }
}
