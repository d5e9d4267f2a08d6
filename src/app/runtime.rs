// SPDX-License-Identifier: GPL-3.0-only

//! Event loop driving a [`Wizard`]
//!
//! Tasks returned from `update` are spawned on a tokio runtime; their
//! messages come back through a channel and are fed into the wizard one at
//! a time, so the wizard itself is only ever touched from the owner's side.

use super::Wizard;
use super::state::Message;
use super::task::Task;
use crate::errors::{AppError, AppResult};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, error};

pub struct WizardRuntime {
    wizard: Wizard,
    handle: Handle,
    /// `None` marks a task that panicked instead of producing a message
    sender: mpsc::UnboundedSender<Option<Message>>,
    receiver: mpsc::UnboundedReceiver<Option<Message>>,
    /// Spawned tasks whose message has not been processed yet
    in_flight: usize,
}

impl WizardRuntime {
    pub fn new(wizard: Wizard, handle: Handle) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            wizard,
            handle,
            sender,
            receiver,
            in_flight: 0,
        }
    }

    /// Use the runtime the caller is running on
    pub fn from_current(wizard: Wizard) -> AppResult<Self> {
        let handle = Handle::try_current()
            .map_err(|e| AppError::Other(format!("No tokio runtime: {}", e)))?;
        Ok(Self::new(wizard, handle))
    }

    pub fn wizard(&self) -> &Wizard {
        &self.wizard
    }

    pub fn wizard_mut(&mut self) -> &mut Wizard {
        &mut self.wizard
    }

    pub fn into_wizard(self) -> Wizard {
        self.wizard
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight == 0
    }

    /// Feed a message in and spawn whatever it asks for
    pub fn dispatch(&mut self, message: Message) -> AppResult<()> {
        let task = self.wizard.update(message)?;
        self.spawn(task);
        Ok(())
    }

    fn spawn(&mut self, task: Task<Message>) {
        let Some(future) = task.into_future() else {
            return;
        };
        self.in_flight += 1;
        let sender = self.sender.clone();
        self.handle.spawn(async move {
            let message = AssertUnwindSafe(future).catch_unwind().await.ok();
            if message.is_none() {
                error!("Wizard task panicked");
            }
            if sender.send(message).is_err() {
                debug!("Runtime gone, dropping task result");
            }
        });
    }

    /// Process every message that is already waiting, without blocking
    ///
    /// Returns how many were processed.
    pub fn pump(&mut self) -> AppResult<usize> {
        let mut processed = 0;
        while let Ok(message) = self.receiver.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            if let Some(message) = message {
                self.dispatch(message)?;
            }
            processed += 1;
        }
        Ok(processed)
    }

    /// Wait for the next task result and process it
    ///
    /// Returns `false` when nothing is in flight.
    pub async fn step(&mut self) -> AppResult<bool> {
        if self.in_flight == 0 {
            return Ok(false);
        }
        match self.receiver.recv().await {
            Some(message) => {
                self.in_flight -= 1;
                if let Some(message) = message {
                    self.dispatch(message)?;
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Process task results until nothing is left in flight
    pub async fn run_until_idle(&mut self) -> AppResult<()> {
        while self.step().await? {}
        Ok(())
    }
}
