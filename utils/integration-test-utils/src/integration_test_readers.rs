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

use async_trait::async_trait;
use message_channel::{BoxError, Reader};
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// What a [`ScriptedReader`] does once its script runs out.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScriptEnd {
    /// Never returns, like an idle socket.
    Hang,
    /// Fails every further read with [`io::ErrorKind::UnexpectedEof`].
    Fail,
}

/// Reader yielding a fixed script of messages, one per `read`.
///
/// Models an external source: it cannot be drained without waiting, so
/// `take_ready` always comes back empty.
pub struct ScriptedReader<T> {
    script: Mutex<VecDeque<T>>,
    end: ScriptEnd,
    reads: AtomicUsize,
}

impl<T> ScriptedReader<T> {
    pub fn new(script: impl IntoIterator<Item = T>, end: ScriptEnd) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            end,
            reads: AtomicUsize::new(0),
        }
    }

    /// Number of messages handed out so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T: Send + 'static> Reader<T> for ScriptedReader<T> {
    async fn read(&self) -> Result<T, BoxError> {
        let next = self.script.lock().expect("script lock poisoned").pop_front();
        match next {
            Some(message) => {
                self.reads.fetch_add(1, Ordering::SeqCst);
                Ok(message)
            }
            None => match self.end {
                ScriptEnd::Hang => std::future::pending().await,
                ScriptEnd::Fail => Err(Box::new(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "script exhausted",
                ))),
            },
        }
    }
}
