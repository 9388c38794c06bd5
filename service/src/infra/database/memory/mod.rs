//! In-memory [`Database`] implementation.
//!
//! Keeps everything in a single shared state without any durability, so is
//! intended for testing only. [`Transact`] doesn't isolate writes, but
//! [`Lock`]s taken inside a transaction are held until its [`Commit`] or drop.

mod application;
mod lease;
mod message;
mod payment;
mod property;
mod user;

use std::{
    any::TypeId,
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex as SyncMutex, PoisonError},
};

use common::{
    operations::{By, Commit, Lock, Transact},
    DateTime,
};
use derive_more::{Display, Error as StdError};
use tokio::{
    sync::{Mutex, MutexGuard, OwnedMutexGuard},
    task,
};
use tracerr::Traced;

use crate::{
    domain::{Application, Lease, Message, Payment, Property, User},
    infra::{database, Database},
};

/// In-memory [`Database`].
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// Stored [`State`].
    state: Arc<Mutex<State>>,

    /// Row locks by their [`LockKey`]s.
    locks: Arc<SyncMutex<HashMap<LockKey, Arc<Mutex<()>>>>>,

    /// Row locks held by the current transaction, if this [`Memory`] is a
    /// [`Transact`]ed one.
    held: Option<Arc<SyncMutex<Vec<(LockKey, OwnedMutexGuard<()>)>>>>,
}

/// Key of a row lock: type of the locked entity and its ID.
type LockKey = (TypeId, String);

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks and returns the whole [`State`] of this [`Memory`] database.
    ///
    /// Yields first, so concurrent operations interleave the way they do
    /// over a real connection.
    async fn state(&self) -> MutexGuard<'_, State> {
        task::yield_now().await;
        self.state.lock().await
    }

    /// Returns the row lock of the provided [`LockKey`], creating it if
    /// absent.
    fn row_lock(&self, key: &LockKey) -> Arc<Mutex<()>> {
        let mut locks =
            self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(key.clone()).or_default())
    }
}

/// [`Memory`] database error.
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// Unique constraint is violated.
    #[display("Unique constraint `{_0}` is violated")]
    UniqueViolation(#[error(not(source))] &'static str),
}

impl Error {
    /// Checks if the error is a unique violation of the specified constraint.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            Self::UniqueViolation(c) => constraint.map_or(true, |x| x == *c),
        }
    }
}

/// Stored state of a [`Memory`] database.
#[derive(Debug, Default)]
struct State {
    /// Stored [`User`]s.
    users: Table<User>,

    /// Stored [`Property`]s.
    properties: Table<Property>,

    /// Stored [`Application`]s.
    applications: Table<Application>,

    /// Stored [`Lease`]s.
    leases: Table<Lease>,

    /// Stored [`Payment`]s.
    payments: Table<Payment>,

    /// Stored [`Message`]s.
    messages: Table<Message>,
}

/// Record stored in a [`Table`].
trait Record: Clone {
    /// Type of this [`Record`] ID.
    type Id: Copy + Eq;

    /// Returns ID of this [`Record`].
    fn id(&self) -> Self::Id;

    /// Returns [`DateTime`] this [`Record`] is ordered by in lists.
    fn ordered_by(&self) -> DateTime;
}

/// Table of [`Record`]s, in their insertion order.
#[derive(Debug)]
struct Table<T>(Vec<T>);

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T: Record> Table<T> {
    /// Returns the [`Record`] with the provided ID, if any.
    fn get(&self, id: T::Id) -> Option<&T> {
        self.0.iter().find(|r| r.id() == id)
    }

    /// Iterates over all the stored [`Record`]s.
    fn iter(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }

    /// Inserts the provided [`Record`], replacing the one with the same ID.
    fn upsert(&mut self, record: T) {
        if let Some(existing) = self.0.iter_mut().find(|r| r.id() == record.id())
        {
            *existing = record;
        } else {
            self.0.push(record);
        }
    }

    /// Removes the [`Record`] with the provided ID.
    fn remove(&mut self, id: T::Id) {
        self.0.retain(|r| r.id() != id);
    }

    /// Returns all the [`Record`]s matching the provided predicate, newest
    /// first.
    fn newest_first(&self, mut predicate: impl FnMut(&T) -> bool) -> Vec<T> {
        // Reversed insertion order breaks ties of equal `DateTime`s.
        let mut records = self
            .0
            .iter()
            .rev()
            .filter(|r| predicate(r))
            .cloned()
            .collect::<Vec<_>>();
        records.sort_by(|a, b| b.ordered_by().cmp(&a.ordered_by()));
        records
    }
}

/// Creates a new [`database::Error`] of the violated unique `constraint`.
fn unique_violation(constraint: &'static str) -> Traced<database::Error> {
    tracerr::new!(database::Error::from(Error::UniqueViolation(constraint)))
}

impl Database<Transact> for Memory {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        if self.held.is_some() {
            return Ok(self.clone());
        }
        Ok(Self {
            held: Some(Arc::default()),
            ..self.clone()
        })
    }
}

impl Database<Commit> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        if let Some(held) = &self.held {
            held.lock().unwrap_or_else(PoisonError::into_inner).clear();
        }
        Ok(())
    }
}

impl<T, Id> Database<Lock<By<T, Id>>> for Memory
where
    T: 'static,
    Id: fmt::Display,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<T, Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let key = (TypeId::of::<T>(), by.into_inner().to_string());

        // Outside a transaction the lock is only waited for.
        let Some(held) = &self.held else {
            drop(self.row_lock(&key).lock_owned().await);
            return Ok(());
        };

        let is_held = held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|(k, _)| *k == key);
        if !is_held {
            let guard = self.row_lock(&key).lock_owned().await;
            held.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((key, guard));
        }
        Ok(())
    }
}
