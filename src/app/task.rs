// SPDX-License-Identifier: GPL-3.0-only

//! Deferred work returned from `update`
//!
//! A [`Task`] is a future that resolves to the next message to feed back
//! into the wizard. Controllers never spawn anything themselves; the
//! [`runtime`](super::runtime) does that.

use super::state::StepEvent;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::future::Future;
use std::time::Duration;

/// A future producing a follow-up message, or nothing
#[must_use = "a Task does nothing unless it is run"]
pub struct Task<M> {
    future: Option<BoxFuture<'static, M>>,
}

impl<M: Send + 'static> Task<M> {
    pub fn none() -> Self {
        Self { future: None }
    }

    /// Run `future` and turn its output into a message
    pub fn perform<T, F>(future: F, f: impl FnOnce(T) -> M + Send + 'static) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self {
            future: Some(future.map(f).boxed()),
        }
    }

    /// Deliver `message` after `delay`
    pub fn delay(delay: Duration, message: M) -> Self {
        Self::perform(
            async move { tokio::time::sleep(delay).await },
            move |()| message,
        )
    }

    pub fn map<N: Send + 'static>(self, f: impl FnOnce(M) -> N + Send + 'static) -> Task<N> {
        Task {
            future: self.future.map(|future| future.map(f).boxed()),
        }
    }

    pub fn is_none(&self) -> bool {
        self.future.is_none()
    }

    pub fn into_future(self) -> Option<BoxFuture<'static, M>> {
        self.future
    }

    /// Await the task in place (tests and simple drivers)
    pub async fn resolve(self) -> Option<M> {
        match self.future {
            Some(future) => Some(future.await),
            None => None,
        }
    }
}

impl<M> std::fmt::Debug for Task<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.future {
            Some(_) => write!(f, "Task(pending)"),
            None => write!(f, "Task(none)"),
        }
    }
}

/// What a controller wants done after handling a message
#[derive(Debug)]
pub enum Action<M> {
    /// Nothing to do
    None,
    /// Run deferred work
    Task(Task<M>),
    /// Hand an event to the orchestrator
    Event(StepEvent),
}

impl<M: Send + 'static> Action<M> {
    pub fn map<N: Send + 'static>(self, f: impl FnOnce(M) -> N + Send + 'static) -> Action<N> {
        match self {
            Action::None => Action::None,
            Action::Task(task) => Action::Task(task.map(f)),
            Action::Event(event) => Action::Event(event),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Action::None)
    }
}
