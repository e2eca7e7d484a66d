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

//! Background loop that reads upstream and routes or buffers each message.

use crate::channel::node::ChannelNode;
use crate::io::Reader;
use crate::observability::{events, fields};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const COMPONENT: &str = "distribution_loop";

pub(crate) struct DistributionLoop<T: Send + 'static> {
    node: Arc<ChannelNode<T>>,
    reader: Arc<dyn Reader<T>>,
    stop: CancellationToken,
    parent_halted: Option<CancellationToken>,
}

impl<T: Send + 'static> DistributionLoop<T> {
    pub(crate) fn new(
        node: Arc<ChannelNode<T>>,
        reader: Arc<dyn Reader<T>>,
        stop: CancellationToken,
    ) -> Self {
        Self {
            node,
            reader,
            stop,
            parent_halted: None,
        }
    }

    /// Spawns a loop for a root channel.
    pub(crate) fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Spawns a subchannel loop tracked by its parent so the parent can wait for it.
    pub(crate) fn spawn_within(mut self, parent: &ChannelNode<T>) -> JoinHandle<()> {
        self.parent_halted = Some(parent.halted.clone());
        parent.descendants.spawn(self.run())
    }

    /// Races each upstream read against the stop signal until stopped.
    ///
    /// On exit, messages the reader can still hand over without waiting are
    /// dispatched, then descendants are stopped and awaited. The node is
    /// marked halted on every exit path, panics included.
    pub(crate) async fn run(self) {
        let Self {
            node,
            reader,
            stop,
            parent_halted,
        } = self;
        let halt_on_exit = node.halted.clone().drop_guard();
        let channel = node.label.as_str();

        debug!(
            event = events::LOOP_START,
            component = COMPONENT,
            channel,
            "distribution loop started"
        );

        let reason = loop {
            let read = tokio::select! {
                biased;
                _ = stop.cancelled() => {
                    break match &parent_halted {
                        Some(parent) if parent.is_cancelled() => fields::REASON_PARENT_HALTED,
                        _ => fields::REASON_CLOSE_SIGNAL,
                    };
                }
                read = reader.read() => read,
            };

            match read {
                Ok(message) => node.dispatch(message),
                Err(err) => {
                    warn!(
                        event = events::LOOP_READ_FAILED,
                        component = COMPONENT,
                        channel,
                        err = %err,
                        "upstream read failed; stopping distribution loop"
                    );
                    node.record_fault(Arc::from(err));
                    break fields::REASON_READ_FAILED;
                }
            }
        };

        let residuals = reader.take_ready();
        let drained = residuals.len();
        for message in residuals {
            node.dispatch(message);
        }
        if drained > 0 {
            debug!(
                event = events::RESIDUAL_DRAINED,
                component = COMPONENT,
                channel,
                drained,
                "dispatched residual upstream messages"
            );
        }

        drop(halt_on_exit);
        node.descendants.close();
        node.descendants.wait().await;

        debug!(
            event = events::DESCENDANTS_QUIESCED,
            component = COMPONENT,
            channel,
            "all subchannel loops stopped"
        );
        info!(
            event = events::LOOP_STOP,
            component = COMPONENT,
            channel,
            reason,
            buffered = node.inbox.len(),
            "distribution loop stopped"
        );
    }
}
