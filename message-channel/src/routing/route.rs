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

use crate::error::BoxError;
use crate::io::{Predicate, Reader};
use crate::mailbox::Mailbox;
use async_trait::async_trait;
use std::fmt::{Debug, Formatter};

/// Pairing of a predicate with the buffer that receives the messages it selects.
///
/// A route is immutable once built. The [`Router`][crate::Router] holding it
/// pushes into the buffer; the subchannel that created it drains the buffer.
pub struct Route<T> {
    predicate: Box<dyn Predicate<T>>,
    buffer: Mailbox<T>,
}

impl<T> Route<T> {
    /// Creates a route with an empty buffer.
    pub fn new(predicate: impl Predicate<T> + 'static) -> Self {
        Self {
            predicate: Box::new(predicate),
            buffer: Mailbox::new(),
        }
    }

    #[inline(always)]
    pub fn matches(&self, message: &T) -> bool {
        self.predicate.matches(message)
    }

    /// Hands a message to this route's buffer.
    pub fn offer(&self, message: T) {
        self.buffer.push(message);
    }

    pub fn buffer(&self) -> &Mailbox<T> {
        &self.buffer
    }
}

/// A subchannel reads its inbound traffic straight from its route buffer.
#[async_trait]
impl<T: Send + 'static> Reader<T> for Route<T> {
    async fn read(&self) -> Result<T, BoxError> {
        Ok(self.buffer.pop().await)
    }

    fn take_ready(&self) -> Vec<T> {
        self.buffer.take_all()
    }
}

impl<T> Debug for Route<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("buffered", &self.buffer.len())
            .finish_non_exhaustive()
    }
}
