//! [`Context`]-related definitions.

use axum::{async_trait, extract::FromRequestParts, RequestPartsExt as _};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use service::{
    command::{self, Command as _},
    domain::{
        user::{self, session},
        User,
    },
};

use crate::{define_error, AsError, Error, Service};

/// Request context providing the [`Service`] instance.
#[derive(Clone, Debug)]
pub struct Context {
    /// [`Service`] instance.
    service: Service,
}

impl Context {
    /// Returns [`Service`] instance of this [`Context`].
    #[must_use]
    pub fn service(&self) -> &Service {
        &self.service
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Context
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let service = parts
            .extensions
            .get::<Service>()
            .cloned()
            .ok_or_else(|| Error::internal(&"missing `Service` extension"))?;
        Ok(Self { service })
    }
}

/// Authenticated session of the current request.
///
/// Extracted from the `Authorization: Bearer <token>` header. The [`User`]
/// named by the token must still exist.
#[derive(Clone, Debug)]
pub struct Session {
    /// Authenticated [`User`].
    pub user: User,

    /// [`user::Role`] of the authenticated [`User`].
    pub role: user::Role,
}

impl Session {
    /// Returns ID of the authenticated [`User`].
    #[must_use]
    pub fn user_id(&self) -> user::Id {
        self.user.id
    }

    /// Ensures the authenticated [`User`] has one of the provided
    /// [`user::Role`]s.
    ///
    /// # Errors
    ///
    /// With [`AccessError::Denied`] if it doesn't.
    pub fn require(&self, roles: &[user::Role]) -> Result<(), Error> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(AccessError::Denied.into())
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let ctx = Context::from_request_parts(parts, state).await?;

        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|e| {
                if e.is_missing() {
                    AuthError::NoToken
                } else {
                    AuthError::InvalidToken
                }
            })?;

        #[expect(unsafe_code, reason = "specified in correct header")]
        let token =
            unsafe { session::Token::new_unchecked(bearer.token().to_owned()) };
        let command::authorize_user_session::Output { session, user } = ctx
            .service()
            .execute(command::AuthorizeUserSession { token })
            .await
            .map_err(AsError::into_error)?;

        Ok(Self {
            user,
            role: session.role,
        })
    }
}

impl AsError for command::authorize_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::JsonWebTokenDecodeError(_) => {
                Some(AuthError::InvalidToken.into())
            }
            Self::UserNotExists(_) => Some(AuthError::UserNotFound.into()),
        }
    }
}

define_error! {
    enum AuthError {
        #[code = "NO_TOKEN"]
        #[status = UNAUTHORIZED]
        #[message = "No token provided"]
        NoToken,

        #[code = "INVALID_TOKEN"]
        #[status = UNAUTHORIZED]
        #[message = "Invalid token"]
        InvalidToken,

        #[code = "USER_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "User not found"]
        UserNotFound,
    }
}

define_error! {
    enum AccessError {
        #[code = "ACCESS_DENIED"]
        #[status = FORBIDDEN]
        #[message = "Access denied"]
        Denied,
    }
}

#[cfg(test)]
mod tests {
    use service::{command::authorize_user_session, domain::user};

    use crate::AsError as _;

    #[test]
    fn missing_user_is_not_found() {
        let err = authorize_user_session::ExecutionError::UserNotExists(
            user::Id::new(),
        )
        .into_error();

        assert_eq!(err.status_code, http::StatusCode::NOT_FOUND);
        assert_eq!(err.message, "User not found");
    }
}
