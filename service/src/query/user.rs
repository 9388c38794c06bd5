//! [`Query`] collection related to [`User`]s.

use common::operations::By;

use crate::{
    domain::{user, User},
    read,
};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`User`] by its [`user::Id`].
pub type ById = DatabaseQuery<By<Option<User>, user::Id>>;

/// Queries a list of [`User`]s, newest first.
pub type List = DatabaseQuery<By<Vec<User>, read::user::list::Filter>>;
