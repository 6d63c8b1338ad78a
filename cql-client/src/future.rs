//! Composition helpers for asynchronous results.
//!
//! Mapping, chaining and error recovery use the standard combinators from
//! [`futures::TryFutureExt`] (`map_ok`, `and_then`, `or_else`, `inspect_ok`, `inspect_err`). This
//! module adds what those do not cover: result cells shared between many awaiters and fan-in over
//! many fallible futures.
use futures::future::{join_all, ready, Shared};
use futures::FutureExt;
use std::future::Future;

use crate::error::{Error, Result};

/// An owned dynamically typed [`Future`] for use in cases where you can't
/// statically type your result or need to add some indirection.
pub type BoxFuture<'a, T> = futures::future::BoxFuture<'a, T>;

/// Single-assignment result cell. Any number of clones can be awaited, before or after the
/// underlying future completes, and all observe the same result.
pub type SharedFuture<T> = Shared<BoxFuture<'static, Result<T>>>;

/// Turns a fallible future into a [`SharedFuture`].
pub fn shared<T, F>(future: F) -> SharedFuture<T>
where
    T: Clone + Send + Sync + 'static,
    F: Future<Output = Result<T>> + Send + 'static,
{
    future.boxed().shared()
}

/// Creates an already completed [`SharedFuture`].
pub fn resolved<T>(result: Result<T>) -> SharedFuture<T>
where
    T: Clone + Send + Sync + 'static,
{
    shared(ready(result))
}

/// Waits for every future to complete and returns their values in input order. If any of them
/// fails, the first error in input order is returned, but only after all others have completed.
pub async fn all<I, F, T>(futures: I) -> Result<Vec<T>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T>>,
{
    join_all(futures).await.into_iter().collect()
}

/// Substitutes a value computed from the error for a failed result.
pub async fn recover<F, T, R>(future: F, recovery: R) -> T
where
    F: Future<Output = Result<T>>,
    R: FnOnce(Error) -> T,
{
    future.await.unwrap_or_else(recovery)
}
