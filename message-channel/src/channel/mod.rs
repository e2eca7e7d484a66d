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

//! Channel lifecycle, receive/send, and splitting into subchannels.

pub(crate) mod lifecycle;
pub(crate) mod node;

use crate::channel::lifecycle::{CloseCompletion, Lifecycle, Listener, ParentLink};
use crate::channel::node::ChannelNode;
use crate::error::ChannelError;
use crate::io::{Predicate, Reader, Writer};
use crate::observability::{events, fields};
use crate::routing::route::Route;
use crate::runtime::distribution_loop::DistributionLoop;
use futures::future::BoxFuture;
use futures::Stream;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const COMPONENT: &str = "channel";

/// A channel created by [`Channel::split`].
///
/// It reads only the messages its predicate selects from the parent and can
/// itself be split further.
pub type Subchannel<T> = Channel<T>;

/// Message endpoint that distributes upstream messages to subchannels and itself.
///
/// A channel starts closed. [`open`][Channel::open] starts the background
/// distribution loop, which offers each message read from upstream to the
/// routes of opened subchannels in registration order; the first match wins
/// and unmatched messages are kept for [`recv`][Channel::recv].
/// [`close`][Channel::close] is terminal.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use message_channel::{Channel, Mailbox};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let upstream = Arc::new(Mailbox::<String>::new());
/// let channel = Channel::new(upstream.clone(), None);
/// channel.open().unwrap();
///
/// let hello = channel.split(|m: &String| m == "hello").unwrap();
/// hello.open().unwrap();
///
/// upstream.push("hello".to_string());
/// upstream.push("world".to_string());
///
/// assert_eq!(hello.recv().await.unwrap(), "hello");
/// assert_eq!(channel.recv().await.unwrap(), "world");
///
/// hello.close().await.unwrap();
/// channel.close().await.unwrap();
/// # });
/// ```
pub struct Channel<T: Send + 'static> {
    node: Arc<ChannelNode<T>>,
    reader: Arc<dyn Reader<T>>,
    writer: Option<Arc<dyn Writer<T>>>,
    parent: Option<ParentLink<T>>,
    lifecycle: Mutex<Lifecycle>,
    splits: AtomicUsize,
}

impl<T: Send + 'static> Channel<T> {
    /// Creates a closed channel over `reader`, optionally able to `send` through `writer`.
    pub fn new(reader: Arc<dyn Reader<T>>, writer: Option<Arc<dyn Writer<T>>>) -> Self {
        Self::with_label(fields::root_channel_label(), reader, writer)
    }

    /// Like [`Channel::new`], with a caller-chosen label used in log events.
    pub fn with_label(
        label: impl Into<String>,
        reader: Arc<dyn Reader<T>>,
        writer: Option<Arc<dyn Writer<T>>>,
    ) -> Self {
        Self::build(label.into(), reader, writer, None)
    }

    fn build(
        label: String,
        reader: Arc<dyn Reader<T>>,
        writer: Option<Arc<dyn Writer<T>>>,
        parent: Option<ParentLink<T>>,
    ) -> Self {
        Self {
            node: Arc::new(ChannelNode::new(label)),
            reader,
            writer,
            parent,
            lifecycle: Mutex::new(Lifecycle::Idle),
            splits: AtomicUsize::new(0),
        }
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn label(&self) -> &str {
        &self.node.label
    }

    pub fn is_open(&self) -> bool {
        self.lifecycle().is_open()
    }

    pub fn is_subchannel(&self) -> bool {
        self.parent.is_some()
    }

    /// Number of messages waiting in the local buffer.
    pub fn buffered(&self) -> usize {
        self.node.inbox.len()
    }

    /// Opens the channel and starts its distribution loop.
    ///
    /// A subchannel starts its own loop first and only then registers its
    /// route with the parent, so nothing is routed to it before it can drain.
    ///
    /// # Errors
    ///
    /// [`ChannelError::AlreadyOpen`] if open. [`ChannelError::Closed`] if the
    /// channel was closed before, or if this is a subchannel whose parent is
    /// no longer open.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a Tokio runtime.
    pub fn open(&self) -> Result<(), ChannelError> {
        let mut lifecycle = self.lifecycle();
        let rejected = match *lifecycle {
            Lifecycle::Idle => None,
            Lifecycle::Open(_) | Lifecycle::Closing => {
                Some((ChannelError::AlreadyOpen, fields::REASON_ALREADY_OPEN))
            }
            Lifecycle::Closed => Some((ChannelError::Closed, fields::REASON_TERMINAL_CLOSED)),
        };
        if let Some((err, reason)) = rejected {
            debug!(
                event = events::CHANNEL_OPEN_REJECTED,
                component = COMPONENT,
                channel = self.label(),
                reason,
                "open rejected"
            );
            return Err(err);
        }

        let listener = match &self.parent {
            None => {
                let stop = CancellationToken::new();
                let handle =
                    DistributionLoop::new(self.node.clone(), self.reader.clone(), stop.clone())
                        .spawn();
                Listener { stop, handle }
            }
            Some(link) => {
                let Some(parent) = link.live_parent() else {
                    debug!(
                        event = events::CHANNEL_OPEN_REJECTED,
                        component = COMPONENT,
                        channel = self.label(),
                        reason = fields::REASON_PARENT_CLOSED,
                        "open rejected"
                    );
                    return Err(ChannelError::Closed);
                };
                let stop = parent.halted.child_token();
                let handle =
                    DistributionLoop::new(self.node.clone(), self.reader.clone(), stop.clone())
                        .spawn_within(&parent);
                link.register(&parent, self.label());
                Listener { stop, handle }
            }
        };
        *lifecycle = Lifecycle::Open(listener);

        info!(
            event = events::CHANNEL_OPEN,
            component = COMPONENT,
            channel = self.label(),
            "channel opened"
        );
        Ok(())
    }

    /// Stops the distribution loop and waits until it and every subchannel
    /// loop below it have exited.
    ///
    /// A subchannel first unregisters its route from the parent. Messages
    /// already buffered stay available to [`recv`][Channel::recv]. The
    /// channel keeps reporting [`is_open`][Channel::is_open] until the loop
    /// has stopped.
    ///
    /// # Errors
    ///
    /// [`ChannelError::Closed`] if not open, or if another `close` is already
    /// waiting for the loop. [`ChannelError::Read`] if the loop had stopped
    /// on a reader failure; the channel is closed regardless.
    ///
    /// # Panics
    ///
    /// Re-raises a panic from the distribution loop.
    pub async fn close(&self) -> Result<(), ChannelError> {
        let listener = {
            let mut lifecycle = self.lifecycle();
            if !matches!(*lifecycle, Lifecycle::Open(_)) {
                return Err(ChannelError::Closed);
            }
            match std::mem::replace(&mut *lifecycle, Lifecycle::Closing) {
                Lifecycle::Open(listener) => listener,
                Lifecycle::Idle | Lifecycle::Closing | Lifecycle::Closed => {
                    return Err(ChannelError::Closed)
                }
            }
        };
        let completion = CloseCompletion::new(&self.lifecycle);

        debug!(
            event = events::CHANNEL_CLOSE_START,
            component = COMPONENT,
            channel = self.label(),
            "closing channel"
        );

        if let Some(link) = &self.parent {
            link.unregister(self.label());
        }
        listener.stop.cancel();
        let joined = listener.handle.await;
        drop(completion);
        if let Err(err) = joined {
            if err.is_panic() {
                std::panic::resume_unwind(err.into_panic());
            }
        }

        if let Some(fault) = self.node.fault() {
            warn!(
                event = events::CHANNEL_CLOSE_FAILED,
                component = COMPONENT,
                channel = self.label(),
                err = %fault,
                "channel closed after upstream read failure"
            );
            return Err(ChannelError::Read(fault));
        }

        info!(
            event = events::CHANNEL_CLOSE_OK,
            component = COMPONENT,
            channel = self.label(),
            buffered = self.buffered(),
            "channel closed"
        );
        Ok(())
    }

    /// Receives the next message that no subchannel claimed, in arrival order.
    ///
    /// Waits while the channel is open and its buffer is empty. Residual
    /// messages are still returned after close.
    ///
    /// # Errors
    ///
    /// [`ChannelError::Closed`] once the channel is closed (or was never
    /// opened, or its loop was stopped from above) and the buffer is empty.
    /// [`ChannelError::Read`] while open, if the loop stopped on a reader failure.
    pub async fn recv(&self) -> Result<T, ChannelError> {
        loop {
            if let Some(message) = self.node.inbox.try_pop() {
                return Ok(message);
            }

            let open = match *self.lifecycle() {
                Lifecycle::Idle => return Err(ChannelError::Closed),
                Lifecycle::Open(_) | Lifecycle::Closing => true,
                Lifecycle::Closed => false,
            };

            // The inbox is only fed by this node's loop, which never pushes after halting.
            if self.node.is_halted() {
                if let Some(message) = self.node.inbox.try_pop() {
                    return Ok(message);
                }
                return Err(match self.node.fault() {
                    Some(fault) if open => ChannelError::Read(fault),
                    _ => ChannelError::Closed,
                });
            }

            tokio::select! {
                biased;
                message = self.node.inbox.pop() => return Ok(message),
                _ = self.node.halted.cancelled() => {}
            }
        }
    }

    /// Stream of [`recv`][Channel::recv] results, ending at the first error.
    pub fn recv_stream(&self) -> impl Stream<Item = T> + '_ {
        futures::stream::unfold(self, |channel| async move {
            channel.recv().await.ok().map(|message| (message, channel))
        })
    }

    /// Forwards a message to the writer. Subchannels share their root's writer.
    ///
    /// # Errors
    ///
    /// [`ChannelError::NoWriter`] without a writer, [`ChannelError::Write`]
    /// if the writer fails.
    pub async fn send(&self, message: T) -> Result<(), ChannelError> {
        let Some(writer) = self.writer.as_ref() else {
            return Err(ChannelError::NoWriter);
        };

        debug!(
            event = events::SEND_ATTEMPT,
            component = COMPONENT,
            channel = self.label(),
            "attempting send"
        );
        match writer.write(message).await {
            Ok(()) => {
                debug!(
                    event = events::SEND_OK,
                    component = COMPONENT,
                    channel = self.label(),
                    "send succeeded"
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    event = events::SEND_FAILED,
                    component = COMPONENT,
                    channel = self.label(),
                    err = %err,
                    "send failed"
                );
                Err(ChannelError::Write(err))
            }
        }
    }

    /// Creates an unopened subchannel fed by the messages `predicate` selects.
    ///
    /// The route is registered only when the subchannel is opened, behind
    /// every route registered before it.
    ///
    /// # Errors
    ///
    /// [`ChannelError::Closed`] if this channel is not open.
    pub fn split(
        &self,
        predicate: impl Predicate<T> + 'static,
    ) -> Result<Subchannel<T>, ChannelError> {
        if !self.is_open() {
            return Err(ChannelError::Closed);
        }

        let index = self.splits.fetch_add(1, Ordering::Relaxed);
        let label = fields::subchannel_label(self.label(), index);
        let route = Arc::new(Route::new(predicate));
        let reader: Arc<dyn Reader<T>> = route.clone();

        debug!(
            event = events::CHANNEL_SPLIT,
            component = COMPONENT,
            channel = label.as_str(),
            parent = self.label(),
            "subchannel created"
        );

        Ok(Self::build(
            label,
            reader,
            self.writer.clone(),
            Some(ParentLink::new(&self.node, route)),
        ))
    }

    /// Opens the channel, runs `body`, and closes the channel before returning.
    ///
    /// ```
    /// use std::sync::Arc;
    /// use futures::FutureExt;
    /// use message_channel::{Channel, Mailbox};
    ///
    /// # tokio::runtime::Runtime::new().unwrap().block_on(async {
    /// let upstream = Arc::new(Mailbox::<u32>::new());
    /// let channel = Channel::new(upstream.clone(), Some(upstream.clone()));
    ///
    /// let echoed = channel
    ///     .scoped(|channel| {
    ///         async move {
    ///             channel.send(42u32).await?;
    ///             channel.recv().await
    ///         }
    ///         .boxed()
    ///     })
    ///     .await
    ///     .unwrap();
    ///
    /// assert_eq!(echoed.unwrap(), 42);
    /// assert!(!channel.is_open());
    /// # });
    /// ```
    pub async fn scoped<'a, R, F>(&'a self, body: F) -> Result<R, ChannelError>
    where
        F: FnOnce(&'a Self) -> BoxFuture<'a, R>,
    {
        self.open()?;
        let output = body(self).await;
        self.close().await?;
        Ok(output)
    }
}

impl<T: Send + 'static> Debug for Channel<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("label", &self.label())
            .field("open", &self.is_open())
            .field("subchannel", &self.is_subchannel())
            .field("buffered", &self.buffered())
            .finish_non_exhaustive()
    }
}

impl<T: Send + 'static> Drop for Channel<T> {
    fn drop(&mut self) {
        let lifecycle = self
            .lifecycle
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Lifecycle::Open(listener) = lifecycle {
            if let Some(link) = &self.parent {
                link.unregister(&self.node.label);
            }
            listener.stop.cancel();
            warn!(
                event = events::CHANNEL_DROPPED_OPEN,
                component = COMPONENT,
                channel = self.node.label.as_str(),
                "channel dropped while open; loop stopped without waiting"
            );
        }
    }
}
