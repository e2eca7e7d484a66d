/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Unbounded FIFO buffer backing route buffers and channel-local queues.

use crate::error::BoxError;
use crate::io::{Reader, Writer};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

/// Unbounded FIFO queue with a suspending [`pop`][Mailbox::pop].
///
/// A `Mailbox` is also a [`Reader`] and a [`Writer`], so a single shared
/// instance can stand in as an in-memory loopback upstream.
///
/// ```
/// use std::sync::Arc;
/// use message_channel::{Channel, Mailbox};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let upstream = Arc::new(Mailbox::<String>::new());
/// let channel = Channel::new(upstream.clone(), Some(upstream.clone()));
///
/// channel.open().unwrap();
/// channel.send("hello".to_string()).await.unwrap();
/// assert_eq!(channel.recv().await.unwrap(), "hello");
/// channel.close().await.unwrap();
/// # });
/// ```
pub struct Mailbox<T> {
    messages: Mutex<VecDeque<T>>,
    available: Notify,
}

impl<T> Mailbox<T> {
    /// Creates an empty mailbox.
    pub fn new() -> Self {
        Self {
            messages: Mutex::new(VecDeque::new()),
            available: Notify::new(),
        }
    }

    fn messages(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a message. Never blocks.
    pub fn push(&self, message: T) {
        self.messages().push_back(message);
        self.available.notify_one();
    }

    /// Removes the oldest message, if any, without waiting.
    pub fn try_pop(&self) -> Option<T> {
        self.messages().pop_front()
    }

    /// Waits until a message is available and removes it.
    ///
    /// Cancel-safe: dropping the future before it resolves leaves the queue untouched.
    pub async fn pop(&self) -> T {
        loop {
            let available = self.available.notified();
            if let Some(message) = self.try_pop() {
                return message;
            }
            available.await;
        }
    }

    /// Removes every queued message at once, oldest first.
    pub fn take_all(&self) -> Vec<T> {
        self.messages().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.messages().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages().is_empty()
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Send + 'static> Reader<T> for Mailbox<T> {
    async fn read(&self) -> Result<T, BoxError> {
        Ok(self.pop().await)
    }

    fn take_ready(&self) -> Vec<T> {
        self.take_all()
    }
}

#[async_trait]
impl<T: Send + 'static> Writer<T> for Mailbox<T> {
    async fn write(&self, message: T) -> Result<(), BoxError> {
        self.push(message);
        Ok(())
    }
}
