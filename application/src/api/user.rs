//! [`User`]-related endpoints.

use axum::response::IntoResponse;
use common::DateTime;
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _},
    domain::{self, user, Address},
    query, read, Query as _,
};

use crate::{
    api::{self, auth::secret_password, Created, Json, Message, Path, Query},
    define_error, AsError, Context, Error, Session,
};

/// Profile of a [`domain::User`].
///
/// Never exposes the password hash.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// ID of this [`User`].
    pub id: user::Id,

    /// Name of this [`User`].
    pub name: user::Name,

    /// Email of this [`User`].
    pub email: user::Email,

    /// Role of this [`User`].
    pub role: user::Role,

    /// Phone of this [`User`].
    pub phone: Option<user::Phone>,

    /// Profile picture of this [`User`].
    pub profile_picture: Option<user::ProfilePicture>,

    /// Postal address of this [`User`].
    pub address: Option<Address>,

    /// When this [`User`] was created.
    pub created_at: DateTime,

    /// When this [`User`] was modified the last time.
    pub updated_at: DateTime,
}

impl From<domain::User> for User {
    fn from(user: domain::User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            phone: user.phone,
            profile_picture: user.profile_picture,
            address: user.address,
            created_at: user.created_at.coerce(),
            updated_at: user.updated_at.coerce(),
        }
    }
}

/// Short summary of a [`domain::User`].
#[derive(Clone, Debug, Serialize)]
pub struct Summary {
    /// ID of the [`domain::User`].
    pub id: user::Id,

    /// Name of the [`domain::User`].
    pub name: user::Name,

    /// Email of the [`domain::User`].
    pub email: user::Email,

    /// Role of the [`domain::User`].
    pub role: user::Role,
}

impl From<&domain::User> for Summary {
    fn from(user: &domain::User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Query string of the [`list`] endpoint.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Role to list users of.
    pub role: Option<user::Role>,
}

/// Lists all the non-deleted users.
#[tracing::instrument(
    skip_all,
    fields(http.route = "GET /api/users", otel.name = "listUsers"),
)]
pub async fn list(
    ctx: Context,
    session: Session,
    Query(query): Query<ListQuery>,
) -> api::Result<Json<Vec<User>>> {
    session.require(&[user::Role::Admin])?;

    let users = ctx
        .service()
        .execute(query::user::List::by(read::user::list::Filter {
            role: query.role,
        }))
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// Request of the [`create`] endpoint.
#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    /// Name of the new user.
    pub name: user::Name,

    /// Email of the new user.
    pub email: user::Email,

    /// Password of the new user.
    pub password: String,

    /// Role of the new user, [`user::Role::Tenant`] by default.
    pub role: Option<user::Role>,
}

/// Creates a new user on behalf of an admin.
#[tracing::instrument(
    skip_all,
    fields(
        email = %req.email,
        http.route = "POST /api/users",
        otel.name = "createUser",
    ),
)]
pub async fn create(
    ctx: Context,
    session: Session,
    Json(req): Json<CreateRequest>,
) -> api::Result<Created<User>> {
    session.require(&[user::Role::Admin])?;

    let CreateRequest {
        name,
        email,
        password,
        role,
    } = req;
    let user = ctx
        .service()
        .execute(command::CreateUser {
            name,
            email,
            password: secret_password(password)?,
            role: role.unwrap_or(user::Role::Tenant),
            phone: None,
            profile_picture: None,
            address: None,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Created(user.into()))
}

/// Returns the user with the provided ID.
///
/// Only admins may see profiles of other users.
#[tracing::instrument(
    skip_all,
    fields(
        http.route = "GET /api/users/:id",
        otel.name = "getUser",
        user.id = %id,
    ),
)]
pub async fn get(
    ctx: Context,
    session: Session,
    Path(id): Path<user::Id>,
) -> api::Result<Json<User>> {
    ensure_admin_or_self(&session, id)?;

    let user = ctx
        .service()
        .execute(query::user::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .ok_or(UserError::NotFound)?;

    Ok(Json(user.into()))
}

/// Request of the [`update`] endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    /// New name.
    pub name: user::Name,

    /// New email.
    pub email: user::Email,

    /// New password.
    pub password: String,

    /// New phone.
    pub phone: Option<user::Phone>,

    /// New profile picture.
    pub profile_picture: Option<user::ProfilePicture>,
}

/// Replaces the profile of the user with the provided ID.
#[tracing::instrument(
    skip_all,
    fields(
        http.route = "PUT /api/users/:id",
        otel.name = "updateUser",
        user.id = %id,
    ),
)]
pub async fn update(
    ctx: Context,
    session: Session,
    Path(id): Path<user::Id>,
    Json(req): Json<UpdateRequest>,
) -> api::Result<Json<User>> {
    ensure_admin_or_self(&session, id)?;

    let UpdateRequest {
        name,
        email,
        password,
        phone,
        profile_picture,
    } = req;
    let user = ctx
        .service()
        .execute(command::UpdateUser {
            user_id: id,
            name,
            email,
            password: secret_password(password)?,
            phone,
            profile_picture,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(user.into()))
}

/// Soft-deletes the user with the provided ID.
#[tracing::instrument(
    skip_all,
    fields(
        http.route = "DELETE /api/users/:id",
        otel.name = "deleteUser",
        user.id = %id,
    ),
)]
pub async fn delete(
    ctx: Context,
    session: Session,
    Path(id): Path<user::Id>,
) -> api::Result<impl IntoResponse> {
    session.require(&[user::Role::Admin])?;

    _ = ctx
        .service()
        .execute(command::DeleteUser { user_id: id })
        .await
        .map_err(AsError::into_error)?;

    Ok(Message::new("User deleted successfully"))
}

/// Ensures the [`Session`] belongs either to an admin or to the user with the
/// provided ID.
fn ensure_admin_or_self(session: &Session, id: user::Id) -> api::Result<()> {
    if session.role == user::Role::Admin || session.user_id() == id {
        Ok(())
    } else {
        Err(api::PrivilegeError::Unauthorized.into())
    }
}

impl AsError for command::update_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "EMAIL_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "Email is already registered"]
                EmailOccupied,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::EmailOccupied(_) => Some(Error::EmailOccupied.into()),
            Self::PasswordHash(_) => None,
            Self::UserNotExists(_) => Some(UserError::NotFound.into()),
        }
    }
}

impl AsError for command::delete_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::UserNotExists(_) => Some(UserError::NotFound.into()),
        }
    }
}

define_error! {
    enum UserError {
        #[code = "USER_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "User not found"]
        NotFound,
    }
}

#[cfg(test)]
mod tests {
    use common::DateTime;
    use service::{
        command::update_user,
        domain::{self, user},
    };

    use crate::AsError as _;

    use super::{Summary, User};

    fn user() -> domain::User {
        domain::User {
            id: user::Id::new(),
            name: user::Name::new("Jane").unwrap(),
            email: user::Email::new("jane@example.com").unwrap(),
            password_hash: user::PasswordHash::new(
                &user::Password::new("correct horse").unwrap(),
            )
            .unwrap(),
            role: user::Role::Landlord,
            phone: None,
            profile_picture: None,
            address: None,
            created_at: DateTime::now().coerce(),
            updated_at: DateTime::now().coerce(),
            deleted_at: None,
        }
    }

    #[test]
    fn profile_hides_password_hash() {
        let json = serde_json::to_value(User::from(user())).unwrap();

        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["role"], "Landlord");
        assert_eq!(json["email"], "jane@example.com");
        assert!(json["createdAt"].is_string());
        assert!(json["profilePicture"].is_null());
    }

    #[test]
    fn summary_has_only_identity() {
        let u = user();
        let json = serde_json::to_value(Summary::from(&u)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "id": u.id.to_string(),
                "name": "Jane",
                "email": "jane@example.com",
                "role": "Landlord",
            }),
        );
    }

    #[test]
    fn occupied_email_is_conflict() {
        let err = update_user::ExecutionError::EmailOccupied(
            user::Email::new("jane@example.com").unwrap(),
        )
        .into_error();

        assert_eq!(err.status_code, http::StatusCode::CONFLICT);
        assert_eq!(err.message, "Email is already registered");
    }
}
