//! Authentication endpoints.

use secrecy::SecretBox;
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _},
    domain::user,
};

use crate::{
    api::{self, Created, Json},
    define_error, AsError, Context, Error, Session,
};

/// Signup request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signup {
    /// Name of the new user.
    pub name: user::Name,

    /// Email of the new user.
    pub email: user::Email,

    /// Password of the new user.
    pub password: String,

    /// Role of the new user.
    pub role: user::Role,

    /// Phone of the new user.
    pub phone: Option<user::Phone>,

    /// Profile picture of the new user.
    pub profile_picture: Option<user::ProfilePicture>,
}

/// Signup response.
#[derive(Debug, Serialize)]
pub struct SignedUp {
    /// Human-readable message.
    pub message: &'static str,

    /// Created user.
    pub user: api::user::User,
}

/// Registers a new user.
///
/// # Errors
///
/// - `USER_EXISTS` if the email is occupied already.
/// - `INVALID_PASSWORD` if the password is too short or too long.
#[tracing::instrument(
    skip_all,
    fields(
        email = %req.email,
        http.route = "POST /api/auth/signup",
        otel.name = "signup",
        role = %req.role,
    ),
)]
pub async fn signup(
    ctx: Context,
    Json(req): Json<Signup>,
) -> api::Result<Created<SignedUp>> {
    let Signup {
        name,
        email,
        password,
        role,
        phone,
        profile_picture,
    } = req;

    let user = ctx
        .service()
        .execute(command::CreateUser {
            name,
            email,
            password: secret_password(password)?,
            role,
            phone,
            profile_picture,
            address: None,
        })
        .await
        .map_err(|e| {
            if matches!(
                e.as_ref(),
                command::create_user::ExecutionError::EmailOccupied(_),
            ) {
                SignupError::UserExists.into()
            } else {
                e.into_error()
            }
        })?;

    Ok(Created(SignedUp {
        message: "User created successfully",
        user: user.into(),
    }))
}

/// Login request.
#[derive(Debug, Deserialize)]
pub struct Login {
    /// Email of the user.
    pub email: user::Email,

    /// Password of the user.
    pub password: String,
}

/// Login response.
#[derive(Debug, Serialize)]
pub struct LoggedIn {
    /// Logged in user.
    pub user: api::user::Summary,

    /// Issued session token.
    pub token: String,
}

/// Issues a session token for the provided credentials.
///
/// # Errors
///
/// - `INVALID_CREDENTIALS` if no user matches.
#[tracing::instrument(
    skip_all,
    fields(
        email = %req.email,
        http.route = "POST /api/auth/login",
        otel.name = "login",
    ),
)]
pub async fn login(
    ctx: Context,
    Json(req): Json<Login>,
) -> api::Result<Json<LoggedIn>> {
    let Login { email, password } = req;

    // Any string is checked against the stored hash, so that short passwords
    // yield wrong credentials instead of a validation error.
    #[expect(unsafe_code, reason = "only compared with the stored hash")]
    let password = unsafe { user::Password::new_unchecked(password) };
    let output = ctx
        .service()
        .execute(command::CreateUserSession::ByCredentials {
            email,
            password: SecretBox::init_with(move || password),
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(LoggedIn {
        user: (&output.user).into(),
        token: output.token.to_string(),
    }))
}

/// Returns the profile of the authenticated user.
#[tracing::instrument(
    skip_all,
    fields(
        http.route = "GET /api/auth/me",
        otel.name = "me",
        user.id = %session.user_id(),
    ),
)]
pub async fn me(session: Session) -> Json<api::user::User> {
    Json(session.user.into())
}

/// Wraps the provided raw `password` into a [`SecretBox`], validating it.
///
/// # Errors
///
/// - `INVALID_PASSWORD` if the password is too short or too long.
pub(crate) fn secret_password(
    password: String,
) -> Result<SecretBox<user::Password>, Error> {
    let password =
        user::Password::new(password).ok_or(PasswordError::Invalid)?;
    Ok(SecretBox::init_with(move || password))
}

impl AsError for command::create_user::ExecutionError {
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
        }
    }
}

impl AsError for command::create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "INVALID_CREDENTIALS"]
                #[status = UNAUTHORIZED]
                #[message = "Invalid credentials"]
                WrongCredentials,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::JsonWebTokenEncodeError(_) => None,
            Self::UserNotExists(_) | Self::WrongCredentials => {
                Some(Error::WrongCredentials.into())
            }
        }
    }
}

define_error! {
    enum SignupError {
        #[code = "USER_EXISTS"]
        #[status = BAD_REQUEST]
        #[message = "User already exists"]
        UserExists,
    }
}

define_error! {
    enum PasswordError {
        #[code = "INVALID_PASSWORD"]
        #[status = BAD_REQUEST]
        #[message = "Password must be between 6 and 128 characters"]
        Invalid,
    }
}
