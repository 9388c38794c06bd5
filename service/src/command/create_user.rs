//! [`Command`] for creating a new [`User`].

use argon2::password_hash;
use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret, SecretBox};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{Email, Name, Password, Phone, ProfilePicture, Role};
use crate::{
    domain::{user, Address, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`User`].
#[derive(Clone, Debug)]
pub struct CreateUser {
    /// [`Name`] of a new [`User`].
    pub name: user::Name,

    /// [`Email`] of a new [`User`].
    pub email: user::Email,

    /// [`Password`] of a new [`User`].
    pub password: SecretBox<user::Password>,

    /// [`Role`] of a new [`User`].
    pub role: user::Role,

    /// [`Phone`] of a new [`User`].
    pub phone: Option<user::Phone>,

    /// [`ProfilePicture`] of a new [`User`].
    pub profile_picture: Option<user::ProfilePicture>,

    /// Postal [`Address`] of a new [`User`].
    pub address: Option<Address>,
}

impl<Db> Command<CreateUser> for Service<Db>
where
    Db: for<'l> Database<
            Select<By<Option<User>, &'l user::Email>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<User>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateUser {
            name,
            email,
            password,
            role,
            phone,
            profile_picture,
            address,
        } = cmd;

        let u = self
            .database()
            .execute(Select(By::new(&email)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if u.is_some() {
            return Err(tracerr::new!(E::EmailOccupied(email)));
        }

        let now = DateTime::now();
        let user = User {
            id: user::Id::new(),
            name,
            email,
            password_hash: user::PasswordHash::new(password.expose_secret())
                .map_err(tracerr::from_and_wrap!(=> E))?,
            role,
            phone,
            profile_picture,
            address,
            created_at: now.coerce(),
            updated_at: now.coerce(),
            deleted_at: None,
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let inserted = tx.execute(Insert(user.clone())).await;
        if inserted.as_ref().is_err_and(|e| {
            e.as_ref()
                .is_unique_violation(Some(database::constraint::USERS_EMAIL))
        }) {
            // Concurrently registered.
            return Err(tracerr::new!(E::EmailOccupied(user.email)));
        }
        inserted
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(user)
    }
}

/// Error of [`CreateUser`] [`Command`] execution.
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
}

#[cfg(test)]
mod tests {
    use secrecy::SecretBox;

    use crate::{
        domain::user,
        query, testing, Command as _, Query as _,
    };

    use super::{CreateUser, ExecutionError};

    fn cmd(email: &str) -> CreateUser {
        let password = user::Password::new("s3cret-pass").unwrap();
        CreateUser {
            name: "Jane Doe".parse().unwrap(),
            email: email.parse().unwrap(),
            password: SecretBox::init_with(move || password),
            role: user::Role::Tenant,
            phone: Some("+1 555 123 4567".parse().unwrap()),
            profile_picture: None,
            address: None,
        }
    }

    #[tokio::test]
    async fn creates_user_with_hashed_password() {
        let svc = testing::service();

        let created = svc.execute(cmd(" Jane@Example.com ")).await.unwrap();

        assert_eq!(created.email.as_ref(), "jane@example.com");
        assert!(created
            .password_hash
            .verify(&user::Password::new("s3cret-pass").unwrap()));

        let stored = svc
            .execute(query::user::ById::by(created.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.email, created.email);
    }

    #[tokio::test]
    async fn rejects_occupied_email() {
        let svc = testing::service();
        drop(svc.execute(cmd("jane@example.com")).await.unwrap());

        let err = svc.execute(cmd("JANE@example.com")).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::EmailOccupied(_)));
    }
}
