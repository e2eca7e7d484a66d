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

//! Open/close state and the subchannel's link to its parent router.

use crate::channel::node::ChannelNode;
use crate::observability::events;
use crate::routing::route::Route;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const COMPONENT: &str = "lifecycle";

/// `Idle -> Open -> Closing -> Closed`. `Closed` is terminal.
///
/// `Closing` lasts while `close` waits for the loop; the channel still counts
/// as open until then.
pub(crate) enum Lifecycle {
    Idle,
    Open(Listener),
    Closing,
    Closed,
}

impl Lifecycle {
    pub(crate) fn is_open(&self) -> bool {
        matches!(self, Lifecycle::Open(_) | Lifecycle::Closing)
    }
}

/// Moves a `Closing` lifecycle to `Closed` when dropped, so an abandoned
/// `close` future still leaves the channel closed.
pub(crate) struct CloseCompletion<'a> {
    lifecycle: &'a Mutex<Lifecycle>,
}

impl<'a> CloseCompletion<'a> {
    pub(crate) fn new(lifecycle: &'a Mutex<Lifecycle>) -> Self {
        Self { lifecycle }
    }
}

impl Drop for CloseCompletion<'_> {
    fn drop(&mut self) {
        *self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner) = Lifecycle::Closed;
    }
}

/// Handle on a running distribution loop.
pub(crate) struct Listener {
    pub(crate) stop: CancellationToken,
    pub(crate) handle: JoinHandle<()>,
}

/// Non-owning handle a subchannel keeps on its parent.
///
/// Used only to register and unregister `route` with the parent's router.
pub(crate) struct ParentLink<T> {
    parent: Weak<ChannelNode<T>>,
    route: Arc<Route<T>>,
}

impl<T> ParentLink<T> {
    pub(crate) fn new(parent: &Arc<ChannelNode<T>>, route: Arc<Route<T>>) -> Self {
        Self {
            parent: Arc::downgrade(parent),
            route,
        }
    }

    /// Returns the parent node while it still accepts new subchannel loops.
    pub(crate) fn live_parent(&self) -> Option<Arc<ChannelNode<T>>> {
        self.parent.upgrade().filter(|parent| !parent.is_halted())
    }

    pub(crate) fn register(&self, parent: &ChannelNode<T>, channel: &str) {
        parent.router.register(self.route.clone());
        info!(
            event = events::ROUTE_REGISTER,
            component = COMPONENT,
            channel,
            parent = parent.label.as_str(),
            routes = parent.router.len(),
            "route registered with parent"
        );
    }

    pub(crate) fn unregister(&self, channel: &str) {
        let Some(parent) = self.parent.upgrade() else {
            debug!(
                event = events::ROUTE_UNREGISTER_ORPHANED,
                component = COMPONENT,
                channel,
                "parent already dropped; nothing to unregister"
            );
            return;
        };

        if parent.router.unregister(&self.route) {
            info!(
                event = events::ROUTE_UNREGISTER,
                component = COMPONENT,
                channel,
                parent = parent.label.as_str(),
                routes = parent.router.len(),
                "route unregistered from parent"
            );
        }
    }
}
