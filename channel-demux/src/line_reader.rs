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
use std::error::Error;
use std::fmt::{Display, Formatter};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::sync::{Mutex, Semaphore};

/// Returned by [`LineReader`] once its input is exhausted.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct EndOfInput;

impl Display for EndOfInput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "end of input")
    }
}

impl Error for EndOfInput {}

/// Reads newline-terminated lines from `input`.
///
/// A paused reader holds every `read` until [`resume`][LineReader::resume]
/// is called, so subchannels can be opened before the first line is consumed.
pub struct LineReader<R> {
    lines: Mutex<Lines<R>>,
    gate: Semaphore,
}

impl<R: AsyncBufRead + Unpin + Send> LineReader<R> {
    #[cfg(test)]
    pub fn new(input: R) -> Self {
        Self {
            lines: Mutex::new(input.lines()),
            gate: Semaphore::new(1),
        }
    }

    pub fn paused(input: R) -> Self {
        Self {
            lines: Mutex::new(input.lines()),
            gate: Semaphore::new(0),
        }
    }

    pub fn resume(&self) {
        if self.gate.available_permits() == 0 {
            self.gate.add_permits(1);
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send + 'static> Reader<String> for LineReader<R> {
    async fn read(&self) -> Result<String, BoxError> {
        // The permit goes back on drop, so the gate stays open once resumed.
        let _permit = self.gate.acquire().await?;
        let mut lines = self.lines.lock().await;
        match lines.next_line().await? {
            Some(line) => Ok(line),
            None => Err(EndOfInput.into()),
        }
    }
}
