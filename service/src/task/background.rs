//! [`Background`] environment of periodic [`Task`]s.

use std::{
    error::Error,
    future::{Future, IntoFuture},
};

use derive_more::Display;
use futures::{
    future::{self, LocalBoxFuture},
    FutureExt as _,
};
use tokio::task;

#[cfg(doc)]
use crate::Task;

/// Environment driving the periodic [`Task`]s of a [`Service`] on the current
/// thread.
///
/// [`Service`]: crate::Service
#[derive(Debug, Default)]
pub struct Background {
    /// Local set the [`Task`]s are spawned on.
    set: task::LocalSet,

    /// Names of the spawned [`Task`]s along with their handles.
    tasks: Vec<(&'static str, task::JoinHandle<Result<(), BoxedError>>)>,
}

/// Type-erased error of a [`Task`].
type BoxedError = Box<dyn Error + 'static>;

impl Background {
    /// Spawns the provided [`Task`] `future` under the provided `name`.
    pub fn spawn<F, E>(&mut self, name: &'static str, future: F)
    where
        F: Future<Output = Result<(), E>> + 'static,
        E: Error + 'static,
    {
        let handle = self.set.spawn_local(async move {
            future.await.map_err(|e| BoxedError::from(Box::new(e)))
        });
        self.tasks.push((name, handle));
    }
}

impl IntoFuture for Background {
    type Output = Result<(), TaskError>;
    type IntoFuture = LocalBoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        let Self { set, tasks } = self;

        let tasks = future::try_join_all(tasks.into_iter().map(
            |(name, handle)| async move {
                match handle.await {
                    Ok(res) => res.map_err(|source| TaskError { name, source }),
                    Err(e) => Err(TaskError {
                        name,
                        source: Box::new(e),
                    }),
                }
            },
        ));

        async move { set.run_until(tasks).await.map(drop) }.boxed_local()
    }
}

/// Failure of a [`Task`] running in the [`Background`].
#[derive(Debug, Display)]
#[display("`{name}` task failed: {source}")]
pub struct TaskError {
    /// Name of the failed [`Task`].
    pub name: &'static str,

    /// Error the [`Task`] failed with.
    pub source: BoxedError,
}

impl Error for TaskError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&*self.source)
    }
}
