//! Success-or-error pipeline used to compose multi-step operations.
//!
//! `Outcome<T>` is a plain `Result`, so `?` and `and_then` work as usual. The
//! extension traits add the asynchronous chaining the services rely on: each
//! step runs only after the previous one resolved to `Ok`, strictly in order.

use std::future::Future;

use crate::error::Error;

pub type Outcome<T> = Result<T, Error>;

pub trait OutcomeExt<T> {
    /// Runs `f` on the success value; an error short-circuits.
    fn bind<U, F>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> Outcome<U>;

    /// Like [`OutcomeExt::bind`], for a step that has to be awaited.
    fn bind_async<U, F, Fut>(self, f: F) -> impl Future<Output = Outcome<U>>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Outcome<U>>;

    /// Resolves both variants into a single value.
    fn fold<R, S, E>(self, on_ok: S, on_err: E) -> R
    where
        S: FnOnce(T) -> R,
        E: FnOnce(Error) -> R;
}

impl<T> OutcomeExt<T> for Outcome<T> {
    fn bind<U, F>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> Outcome<U>,
    {
        match self {
            Ok(value) => f(value),
            Err(err) => Err(err),
        }
    }

    fn bind_async<U, F, Fut>(self, f: F) -> impl Future<Output = Outcome<U>>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Outcome<U>>,
    {
        async move {
            match self {
                Ok(value) => f(value).await,
                Err(err) => Err(err),
            }
        }
    }

    fn fold<R, S, E>(self, on_ok: S, on_err: E) -> R
    where
        S: FnOnce(T) -> R,
        E: FnOnce(Error) -> R,
    {
        match self {
            Ok(value) => on_ok(value),
            Err(err) => on_err(err),
        }
    }
}

/// Chaining onto an `Outcome` that is still being computed.
pub trait FutureOutcomeExt<T> {
    fn then_bind<U, F>(self, f: F) -> impl Future<Output = Outcome<U>>
    where
        F: FnOnce(T) -> Outcome<U>;

    fn then_bind_async<U, F, Fut>(self, f: F) -> impl Future<Output = Outcome<U>>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Outcome<U>>;

    fn fold_async<R, S, E>(self, on_ok: S, on_err: E) -> impl Future<Output = R>
    where
        S: FnOnce(T) -> R,
        E: FnOnce(Error) -> R;
}

impl<T, P> FutureOutcomeExt<T> for P
where
    P: Future<Output = Outcome<T>>,
{
    fn then_bind<U, F>(self, f: F) -> impl Future<Output = Outcome<U>>
    where
        F: FnOnce(T) -> Outcome<U>,
    {
        async move { self.await.bind(f) }
    }

    fn then_bind_async<U, F, Fut>(self, f: F) -> impl Future<Output = Outcome<U>>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Outcome<U>>,
    {
        async move { self.await.bind_async(f).await }
    }

    fn fold_async<R, S, E>(self, on_ok: S, on_err: E) -> impl Future<Output = R>
    where
        S: FnOnce(T) -> R,
        E: FnOnce(Error) -> R,
    {
        async move { self.await.fold(on_ok, on_err) }
    }
}
