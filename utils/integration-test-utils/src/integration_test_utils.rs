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

use message_channel::{Channel, ChannelError};
use std::time::Duration;
use tokio::time::timeout;

/// How long a `recv` that should stay pending is given before it counts as pending.
pub const RECV_GRACE: Duration = Duration::from_millis(100);

/// Upper bound for a `recv` that is expected to complete.
pub const RECV_PATIENCE: Duration = Duration::from_secs(5);

/// Receives with a deadline; `None` means the call was still pending.
pub async fn recv_within<T: Send + 'static>(
    channel: &Channel<T>,
    deadline: Duration,
) -> Option<Result<T, ChannelError>> {
    timeout(deadline, channel.recv()).await.ok()
}

/// Receives until the first error and returns the messages plus that error.
pub async fn drain_residuals<T: Send + 'static>(channel: &Channel<T>) -> (Vec<T>, ChannelError) {
    let mut messages = Vec::new();
    loop {
        match timeout(RECV_PATIENCE, channel.recv()).await {
            Ok(Ok(message)) => messages.push(message),
            Ok(Err(err)) => return (messages, err),
            Err(_) => panic!("recv on {} did not settle in time", channel.label()),
        }
    }
}
