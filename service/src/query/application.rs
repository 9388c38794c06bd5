//! [`Query`] collection related to [`Application`]s.

use common::operations::By;

use crate::{
    domain::{application, Application},
    read,
};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries an [`Application`] by its [`application::Id`].
pub type ById = DatabaseQuery<By<Option<Application>, application::Id>>;

/// Queries a list of [`Application`]s, newest first.
pub type List =
    DatabaseQuery<By<Vec<Application>, read::application::list::Filter>>;
