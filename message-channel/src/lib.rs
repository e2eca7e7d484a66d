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

//! # message-channel
//!
//! `message-channel` reads messages one at a time from a single upstream
//! [`Reader`] and lets consumers carve predicate-selected [`Subchannel`]s out
//! of the stream without losing the remaining messages.
//!
//! Typical usage is centered on [`Channel`]: open it, split it, open the
//! splits, and `recv` from each node of the resulting tree.
//!
//! ```
//! use std::sync::Arc;
//! use futures::FutureExt;
//! use message_channel::{Channel, Mailbox};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let upstream = Arc::new(Mailbox::<String>::new());
//! let channel = Channel::new(upstream.clone(), Some(upstream.clone()));
//! channel.open().unwrap();
//!
//! let errors = channel.split(|m: &String| m.starts_with("ERROR")).unwrap();
//! errors
//!     .scoped(|errors| {
//!         async move {
//!             errors.send("ERROR disk full".to_string()).await.unwrap();
//!             errors.send("ok".to_string()).await.unwrap();
//!
//!             assert_eq!(errors.recv().await.unwrap(), "ERROR disk full");
//!         }
//!         .boxed()
//!     })
//!     .await
//!     .unwrap();
//!
//! assert_eq!(channel.recv().await.unwrap(), "ok");
//! channel.close().await.unwrap();
//! # });
//! ```
//!
//! ## Lifecycle contract
//!
//! A channel is `Closed -> Open -> Closed`; the second close is terminal.
//! Residual messages stay receivable after close until drained, after which
//! every `recv` fails with [`ChannelError::Closed`].
//!
//! ```
//! use std::sync::Arc;
//! use message_channel::{Channel, ChannelError, Mailbox};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let upstream = Arc::new(Mailbox::<&str>::new());
//! let channel = Channel::new(upstream.clone(), None);
//!
//! assert!(matches!(channel.recv().await, Err(ChannelError::Closed)));
//! channel.open().unwrap();
//! assert!(matches!(channel.open(), Err(ChannelError::AlreadyOpen)));
//!
//! upstream.push("a");
//! upstream.push("b");
//! channel.close().await.unwrap();
//!
//! assert_eq!(channel.recv().await.unwrap(), "a");
//! assert_eq!(channel.recv().await.unwrap(), "b");
//! assert!(matches!(channel.recv().await, Err(ChannelError::Closed)));
//! assert!(matches!(channel.open(), Err(ChannelError::Closed)));
//! # });
//! ```
//!
//! ## Internal architecture map
//!
//! - Channel: outward lifecycle, receive/send, and split surface
//! - Routing: routes and ordered first-match dispatch
//! - Runtime: the background distribution loop and its shutdown ordering
//!
//! ## Observability model
//!
//! The crate uses `tracing` for logs/events.
//! Library code emits events and does not initialize a global subscriber.
//! Binaries and tests are responsible for one-time `tracing_subscriber`
//! initialization at process boundaries.

mod channel;
pub use channel::{Channel, Subchannel};

mod error;
pub use error::{BoxError, ChannelError, ReadFault};

mod io;
pub use io::{Predicate, Reader, Writer};

mod mailbox;
pub use mailbox::Mailbox;

#[doc(hidden)]
pub mod observability;

mod routing;
pub use routing::route::Route;
pub use routing::router::{Dispatch, Router};

mod runtime;
