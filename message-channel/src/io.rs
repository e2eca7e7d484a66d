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

//! Contracts between a channel and the code around it.

use crate::error::BoxError;
use async_trait::async_trait;

/// Upstream source a [`Channel`][crate::Channel] polls for messages.
///
/// # Examples
///
/// ```
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use async_trait::async_trait;
/// use message_channel::{BoxError, Reader};
///
/// struct Counter(AtomicU32);
///
/// #[async_trait]
/// impl Reader<u32> for Counter {
///     async fn read(&self) -> Result<u32, BoxError> {
///         Ok(self.0.fetch_add(1, Ordering::Relaxed))
///     }
/// }
/// ```
#[async_trait]
pub trait Reader<T: Send + 'static>: Send + Sync {
    /// Waits for and returns the next message.
    ///
    /// The returned future is dropped when the channel closes mid-read, so
    /// implementations must not lose a message that has not been returned yet.
    async fn read(&self) -> Result<T, BoxError>;

    /// Takes every message already available without waiting, oldest first.
    ///
    /// Called once when the distribution loop stops to drain residual
    /// messages. Messages arriving after the call are left to the source.
    fn take_ready(&self) -> Vec<T> {
        Vec::new()
    }
}

/// Upstream sink used by [`Channel::send`][crate::Channel::send].
#[async_trait]
pub trait Writer<T: Send + 'static>: Send + Sync {
    /// Completes once the message has been accepted.
    async fn write(&self, message: T) -> Result<(), BoxError>;
}

/// Pure, non-blocking selector deciding whether a message belongs to a route.
pub trait Predicate<T>: Send + Sync {
    fn matches(&self, message: &T) -> bool;
}

impl<T, F> Predicate<T> for F
where
    F: Fn(&T) -> bool + Send + Sync,
{
    fn matches(&self, message: &T) -> bool {
        self(message)
    }
}
