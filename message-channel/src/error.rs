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

//! Failure kinds surfaced by channel operations.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Boxed error produced by external readers and writers.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Reader failure recorded by a distribution loop.
///
/// Shared so every caller that observes the stopped loop gets the same cause.
pub type ReadFault = Arc<dyn Error + Send + Sync>;

/// Failures for channel lifecycle, receive, and send operations.
#[derive(Debug)]
pub enum ChannelError {
    /// `open` was called on a channel that is already open.
    AlreadyOpen,
    /// The channel is closed (or was never opened) and holds no residual messages.
    Closed,
    /// `send` was called on a channel constructed without a writer.
    NoWriter,
    /// The upstream reader failed and the distribution loop stopped.
    Read(ReadFault),
    /// The writer rejected a message.
    Write(BoxError),
}

impl ChannelError {
    /// Returns `true` for [`ChannelError::Closed`].
    pub fn is_closed(&self) -> bool {
        matches!(self, ChannelError::Closed)
    }
}

impl Display for ChannelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelError::AlreadyOpen => write!(f, "the channel is already open"),
            ChannelError::Closed => {
                write!(f, "the channel is closed and no residual message exists")
            }
            ChannelError::NoWriter => write!(f, "the channel does not have a writer"),
            ChannelError::Read(err) => write!(f, "upstream read failed: {err}"),
            ChannelError::Write(err) => write!(f, "upstream write failed: {err}"),
        }
    }
}

impl Error for ChannelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ChannelError::Read(err) => Some(err.as_ref()),
            ChannelError::Write(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}
