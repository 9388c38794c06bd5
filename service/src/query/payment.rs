//! [`Query`] collection related to [`Payment`]s.

use common::operations::By;

use crate::{domain::Payment, read};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a list of [`Payment`]s, the most recent first.
pub type List = DatabaseQuery<By<Vec<Payment>, read::payment::list::Filter>>;
