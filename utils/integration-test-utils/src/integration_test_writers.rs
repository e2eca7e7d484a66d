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
use message_channel::{BoxError, Writer};
use std::io;
use std::sync::Mutex;

/// Writer that keeps every accepted message for later inspection.
pub struct RecordingWriter<T> {
    written: Mutex<Vec<T>>,
}

impl<T: Clone> RecordingWriter<T> {
    pub fn new() -> Self {
        Self {
            written: Mutex::new(Vec::new()),
        }
    }

    pub fn written(&self) -> Vec<T> {
        self.written.lock().expect("writer lock poisoned").clone()
    }
}

impl<T: Clone> Default for RecordingWriter<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Send + 'static> Writer<T> for RecordingWriter<T> {
    async fn write(&self, message: T) -> Result<(), BoxError> {
        self.written
            .lock()
            .expect("writer lock poisoned")
            .push(message);
        Ok(())
    }
}

/// Writer rejecting every message.
pub struct FailingWriter;

#[async_trait]
impl<T: Send + 'static> Writer<T> for FailingWriter {
    async fn write(&self, _message: T) -> Result<(), BoxError> {
        Err(Box::new(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "writer unavailable",
        )))
    }
}
