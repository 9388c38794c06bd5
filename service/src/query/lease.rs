//! [`Query`] collection related to [`Lease`]s.

use common::operations::By;

use crate::{
    domain::{lease, Lease},
    read,
};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Lease`] by its [`lease::Id`].
pub type ById = DatabaseQuery<By<Option<Lease>, lease::Id>>;

/// Queries a list of [`Lease`]s, newest first.
pub type List = DatabaseQuery<By<Vec<Lease>, read::lease::list::Filter>>;
