/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
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

//! Structured field values and label helpers.

use uuid::Uuid;

pub const REASON_CLOSE_SIGNAL: &str = "close_signal";
pub const REASON_PARENT_HALTED: &str = "parent_halted";
pub const REASON_READ_FAILED: &str = "read_failed";
pub const REASON_ALREADY_OPEN: &str = "already_open";
pub const REASON_TERMINAL_CLOSED: &str = "terminal_closed";
pub const REASON_PARENT_CLOSED: &str = "parent_closed";

pub const CHANNEL_LABEL_PREFIX: &str = "channel-";
const CHANNEL_LABEL_ID_LEN: usize = 8;

/// Builds a fresh label for a root channel, e.g. `channel-1a2b3c4d`.
pub fn root_channel_label() -> String {
    let id: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(CHANNEL_LABEL_ID_LEN)
        .collect();
    format!("{CHANNEL_LABEL_PREFIX}{id}")
}

/// Builds the label of the `index`-th split of `parent`.
pub fn subchannel_label(parent: &str, index: usize) -> String {
    format!("{parent}/{index}")
}
