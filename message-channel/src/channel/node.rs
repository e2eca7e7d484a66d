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

//! State shared between a channel handle, its distribution loop, and its subchannels.

use crate::error::ReadFault;
use crate::mailbox::Mailbox;
use crate::observability::events;
use crate::routing::router::{Dispatch, Router};
use std::sync::{Mutex, PoisonError};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::trace;

const COMPONENT: &str = "channel_node";

pub(crate) struct ChannelNode<T> {
    pub(crate) label: String,
    pub(crate) router: Router<T>,
    pub(crate) inbox: Mailbox<T>,
    /// Cancelled once this node's loop has stopped and drained its residuals.
    /// Subchannel stop signals derive from it.
    pub(crate) halted: CancellationToken,
    /// Distribution loops of opened subchannels.
    pub(crate) descendants: TaskTracker,
    fault: Mutex<Option<ReadFault>>,
}

impl<T> ChannelNode<T> {
    pub(crate) fn new(label: String) -> Self {
        Self {
            label,
            router: Router::new(),
            inbox: Mailbox::new(),
            halted: CancellationToken::new(),
            descendants: TaskTracker::new(),
            fault: Mutex::new(None),
        }
    }

    /// Routes the message to a subchannel or keeps it in the local inbox.
    pub(crate) fn dispatch(&self, message: T) {
        match self.router.distribute(message) {
            Dispatch::Routed => {
                trace!(
                    event = events::MESSAGE_ROUTED,
                    component = COMPONENT,
                    channel = self.label.as_str(),
                    "message routed to subchannel"
                );
            }
            Dispatch::Unrouted(message) => {
                self.inbox.push(message);
                trace!(
                    event = events::MESSAGE_BUFFERED,
                    component = COMPONENT,
                    channel = self.label.as_str(),
                    buffered = self.inbox.len(),
                    "message buffered locally"
                );
            }
        }
    }

    pub(crate) fn is_halted(&self) -> bool {
        self.halted.is_cancelled()
    }

    pub(crate) fn record_fault(&self, fault: ReadFault) {
        let mut slot = self.fault.lock().unwrap_or_else(PoisonError::into_inner);
        slot.get_or_insert(fault);
    }

    pub(crate) fn fault(&self) -> Option<ReadFault> {
        self.fault
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
