//! [`Command`] for updating a [`User`] profile.

use argon2::password_hash;
use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret, SecretBox};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{Email, Name, Password, Phone, ProfilePicture};
use crate::{
    domain::{user, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for updating a [`User`] profile.
///
/// Omitted optional fields are kept intact.
#[derive(Clone, Debug)]
pub struct UpdateUser {
    /// ID of the [`User`] to be updated.
    pub user_id: user::Id,

    /// New [`Name`] of the [`User`].
    pub name: user::Name,

    /// New [`Email`] of the [`User`].
    pub email: user::Email,

    /// New [`Password`] of the [`User`].
    pub password: SecretBox<user::Password>,

    /// New [`Phone`] of the [`User`].
    pub phone: Option<user::Phone>,

    /// New [`ProfilePicture`] of the [`User`].
    pub profile_picture: Option<user::ProfilePicture>,
}

impl<Db> Command<UpdateUser> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<User, user::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + for<'l> Database<
            Select<By<Option<User>, &'l user::Email>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Insert<User>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: UpdateUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateUser {
            user_id,
            name,
            email,
            password,
            phone,
            profile_picture,
        } = cmd;

        let password_hash = user::PasswordHash::new(password.expose_secret())
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `User`.
        tx.execute(Lock(By::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut user = tx
            .execute(Select(By::<Option<User>, _>::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(user_id))
            .map_err(tracerr::wrap!())?;

        if user.email != email {
            let owner = tx
                .execute(Select(By::<Option<User>, _>::new(&email)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            if owner.is_some_and(|u| u.id != user_id) {
                return Err(tracerr::new!(E::EmailOccupied(email)));
            }
        }

        user.name = name;
        user.email = email;
        user.password_hash = password_hash;
        if phone.is_some() {
            user.phone = phone;
        }
        if profile_picture.is_some() {
            user.profile_picture = profile_picture;
        }
        user.updated_at = DateTime::now().coerce();

        let updated = tx.execute(Insert(user.clone())).await;
        if updated.as_ref().is_err_and(|e| {
            e.as_ref()
                .is_unique_violation(Some(database::constraint::USERS_EMAIL))
        }) {
            return Err(tracerr::new!(E::EmailOccupied(user.email)));
        }
        updated
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(user)
    }
}

/// Error of [`UpdateUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`user::Email`] is already occupied by another [`User`].
    #[display("`{_0}` email is occupied")]
    EmailOccupied(#[error(not(source))] user::Email),

    /// Failed to hash the [`user::Password`].
    #[display("Failed to hash `Password`: {_0}")]
    #[from]
    PasswordHash(#[error(not(source))] password_hash::Error),

    /// [`User`] doesn't exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod tests {
    use secrecy::SecretBox;

    use crate::{domain::user, testing, Command as _};

    use super::{ExecutionError, UpdateUser};

    fn cmd(user_id: user::Id, email: &user::Email) -> UpdateUser {
        let password = user::Password::new("brand new pass").unwrap();
        UpdateUser {
            user_id,
            name: "Renamed".parse().unwrap(),
            email: email.clone(),
            password: SecretBox::init_with(move || password),
            phone: None,
            profile_picture: None,
        }
    }

    #[tokio::test]
    async fn updates_profile() {
        let svc = testing::service();
        let tenant = testing::insert_user(&svc, user::Role::Tenant).await;
        let email = "renamed@example.com".parse().unwrap();

        let updated = svc.execute(cmd(tenant.id, &email)).await.unwrap();

        assert_eq!(updated.name.as_ref(), "Renamed");
        assert_eq!(updated.email, email);
        assert!(updated
            .password_hash
            .verify(&user::Password::new("brand new pass").unwrap()));
        assert!(!updated
            .password_hash
            .verify(&user::Password::new(testing::PASSWORD).unwrap()));
        assert!(updated.updated_at >= tenant.updated_at);
    }

    #[tokio::test]
    async fn keeps_own_email() {
        let svc = testing::service();
        let tenant = testing::insert_user(&svc, user::Role::Tenant).await;

        let updated = svc.execute(cmd(tenant.id, &tenant.email)).await.unwrap();

        assert_eq!(updated.email, tenant.email);
    }

    #[tokio::test]
    async fn rejects_email_of_another_user() {
        let svc = testing::service();
        let tenant = testing::insert_user(&svc, user::Role::Tenant).await;
        let other = testing::insert_user(&svc, user::Role::Landlord).await;

        let err = svc.execute(cmd(tenant.id, &other.email)).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::EmailOccupied(_)));
    }

    #[tokio::test]
    async fn rejects_unknown_user() {
        let svc = testing::service();
        let email = "ghost@example.com".parse().unwrap();

        let err = svc.execute(cmd(user::Id::new(), &email)).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::UserNotExists(_)));
    }
}
