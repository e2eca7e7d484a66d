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

mod support;

use futures::FutureExt;
use integration_test_utils::{
    drain_residuals, recv_within, RecordingWriter, RECV_GRACE, RECV_PATIENCE,
};
use message_channel::{Channel, ChannelError, Mailbox};
use std::collections::BTreeSet;
use std::sync::Arc;
use support::{loopback_channel, push_all, strings};

#[tokio::test(flavor = "multi_thread")]
async fn split_routes_matching_messages_to_subchannel() {
    let (upstream, channel) = loopback_channel::<String>("split");
    channel.open().expect("open should succeed");
    let sub = channel
        .split(|m: &String| m == "hello")
        .expect("split should succeed");
    sub.open().expect("subchannel open should succeed");

    push_all(&upstream, strings(&["hello", "world"]));
    assert_eq!(sub.recv().await.expect("sub recv"), "hello");
    assert_eq!(channel.recv().await.expect("recv"), "world");

    push_all(
        &upstream,
        strings(&["hello", "world", "hello", "world", "hello", "world"]),
    );
    for _ in 0..3 {
        assert_eq!(sub.recv().await.expect("sub recv"), "hello");
    }
    for _ in 0..3 {
        assert_eq!(channel.recv().await.expect("recv"), "world");
    }
    assert!(recv_within(&sub, RECV_GRACE).await.is_none());
    assert!(recv_within(&channel, RECV_GRACE).await.is_none());

    sub.close().await.expect("subchannel close should succeed");
    push_all(&upstream, strings(&["hello", "world"]));
    assert!(matches!(sub.recv().await, Err(ChannelError::Closed)));
    assert_eq!(channel.recv().await.expect("recv"), "hello");
    assert_eq!(channel.recv().await.expect("recv"), "world");

    channel.close().await.expect("close should succeed");
}

#[tokio::test(flavor = "multi_thread")]
async fn scoped_subchannel_unregisters_on_exit() {
    let (upstream, channel) = loopback_channel::<String>("scoped-split");
    channel.open().expect("open should succeed");

    let sub = channel
        .split(|m: &String| m == "hello")
        .expect("split should succeed");
    sub.scoped(|sub| {
        let upstream = upstream.clone();
        let channel = &channel;
        async move {
            push_all(&upstream, strings(&["hello", "world", "hello", "world"]));
            assert_eq!(sub.recv().await.expect("sub recv"), "hello");
            assert_eq!(sub.recv().await.expect("sub recv"), "hello");
            assert_eq!(channel.recv().await.expect("recv"), "world");
            assert_eq!(channel.recv().await.expect("recv"), "world");
        }
        .boxed()
    })
    .await
    .expect("scope should open and close");

    push_all(&upstream, strings(&["hello", "world"]));
    assert_eq!(channel.recv().await.expect("recv"), "hello");
    assert_eq!(channel.recv().await.expect("recv"), "world");

    channel.close().await.expect("close should succeed");
}

#[tokio::test(flavor = "multi_thread")]
async fn distribution_is_exclusive_and_ordered() {
    let (upstream, channel) = loopback_channel::<u32>("exclusive");
    channel.open().expect("open should succeed");
    let threes = channel
        .split(|m: &u32| m % 3 == 0)
        .expect("split should succeed");
    let fives = channel
        .split(|m: &u32| m % 5 == 0)
        .expect("split should succeed");
    threes.open().expect("open should succeed");
    fives.open().expect("open should succeed");

    push_all(&upstream, 0..300);
    channel.close().await.expect("close should succeed");

    let (from_threes, err) = drain_residuals(&threes).await;
    assert!(err.is_closed());
    let (from_fives, err) = drain_residuals(&fives).await;
    assert!(err.is_closed());
    let (from_root, err) = drain_residuals(&channel).await;
    assert!(err.is_closed());

    assert_eq!(
        from_threes,
        (0..300).filter(|m| m % 3 == 0).collect::<Vec<_>>()
    );
    assert_eq!(
        from_fives,
        (0..300)
            .filter(|m| m % 5 == 0 && m % 3 != 0)
            .collect::<Vec<_>>()
    );
    assert_eq!(
        from_root,
        (0..300)
            .filter(|m| m % 5 != 0 && m % 3 != 0)
            .collect::<Vec<_>>()
    );

    let mut seen = BTreeSet::new();
    for message in from_threes.iter().chain(&from_fives).chain(&from_root) {
        assert!(seen.insert(*message), "{message} was delivered twice");
    }
    assert_eq!(seen.len(), 300);

    threes.close().await.expect("close should succeed");
    fives.close().await.expect("close should succeed");
}

#[tokio::test(flavor = "multi_thread")]
async fn first_opened_subchannel_wins_overlapping_predicates() {
    let (upstream, channel) = loopback_channel::<String>("priority");
    channel.open().expect("open should succeed");
    let greetings = channel
        .split(|m: &String| m.starts_with('h'))
        .expect("split should succeed");
    let hellos = channel
        .split(|m: &String| m == "hello")
        .expect("split should succeed");

    // Open order, not split order, decides priority.
    hellos.open().expect("open should succeed");
    greetings.open().expect("open should succeed");

    push_all(&upstream, strings(&["hello", "hi", "hello"]));
    assert_eq!(hellos.recv().await.expect("recv"), "hello");
    assert_eq!(hellos.recv().await.expect("recv"), "hello");
    assert_eq!(greetings.recv().await.expect("recv"), "hi");
    assert!(recv_within(&greetings, RECV_GRACE).await.is_none());

    hellos.close().await.expect("close should succeed");
    upstream.push("hello".to_string());
    assert_eq!(greetings.recv().await.expect("recv"), "hello");

    greetings.close().await.expect("close should succeed");
    channel.close().await.expect("close should succeed");
}

#[tokio::test(flavor = "multi_thread")]
async fn subchannels_split_recursively() {
    let (upstream, channel) = loopback_channel::<String>("tree");
    channel.open().expect("open should succeed");
    let greetings = channel
        .split(|m: &String| m.starts_with('h'))
        .expect("split should succeed");
    greetings.open().expect("open should succeed");
    let hellos = greetings
        .split(|m: &String| m == "hello")
        .expect("nested split should succeed");
    hellos.open().expect("open should succeed");
    assert_eq!(hellos.label(), "tree/0/0");

    push_all(&upstream, strings(&["hello", "hey", "world"]));
    assert_eq!(hellos.recv().await.expect("recv"), "hello");
    assert_eq!(greetings.recv().await.expect("recv"), "hey");
    assert_eq!(channel.recv().await.expect("recv"), "world");

    hellos.close().await.expect("close should succeed");
    greetings.close().await.expect("close should succeed");
    channel.close().await.expect("close should succeed");
}

#[tokio::test(flavor = "multi_thread")]
async fn closing_root_quiesces_open_descendants() {
    let (upstream, channel) = loopback_channel::<String>("cascade");
    channel.open().expect("open should succeed");
    let greetings = channel
        .split(|m: &String| m.starts_with('h'))
        .expect("split should succeed");
    greetings.open().expect("open should succeed");
    let hellos = greetings
        .split(|m: &String| m == "hello")
        .expect("nested split should succeed");
    hellos.open().expect("open should succeed");

    push_all(&upstream, strings(&["hello", "hey", "world", "hello"]));
    channel.close().await.expect("close should succeed");

    assert!(greetings.is_open());
    assert!(hellos.is_open());
    assert!(matches!(
        greetings.split(|_: &String| true).map(|late| late.open()),
        Ok(Err(ChannelError::Closed))
    ));

    let (from_hellos, err) = drain_residuals(&hellos).await;
    assert_eq!(from_hellos, strings(&["hello", "hello"]));
    assert!(err.is_closed());
    let (from_greetings, err) = drain_residuals(&greetings).await;
    assert_eq!(from_greetings, strings(&["hey"]));
    assert!(err.is_closed());
    let (from_root, err) = drain_residuals(&channel).await;
    assert_eq!(from_root, strings(&["world"]));
    assert!(err.is_closed());

    hellos.close().await.expect("close after cascade should succeed");
    greetings.close().await.expect("close after cascade should succeed");
    assert!(matches!(hellos.close().await, Err(ChannelError::Closed)));
}

#[tokio::test(flavor = "multi_thread")]
async fn closing_subchannel_keeps_already_routed_messages() {
    let (upstream, channel) = loopback_channel::<String>("sub-residual");
    channel.open().expect("open should succeed");
    let sub = channel
        .split(|m: &String| m == "hello")
        .expect("split should succeed");
    sub.open().expect("open should succeed");

    push_all(&upstream, strings(&["hello", "hello", "hello"]));
    tokio::time::timeout(RECV_PATIENCE, async {
        while sub.buffered() < 3 {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("all three messages should reach the subchannel");

    sub.close().await.expect("close should succeed");
    push_all(&upstream, strings(&["hello"]));
    channel.close().await.expect("close should succeed");

    let (from_sub, err) = drain_residuals(&sub).await;
    assert!(err.is_closed());
    assert_eq!(from_sub, strings(&["hello", "hello", "hello"]));

    // With the route gone, later matches fall back to the root.
    let (from_root, err) = drain_residuals(&channel).await;
    assert!(err.is_closed());
    assert_eq!(from_root, strings(&["hello"]));
}

#[tokio::test(flavor = "multi_thread")]
async fn panicking_predicate_stops_tree_and_resurfaces_on_close() {
    let (upstream, channel) = loopback_channel::<String>("panicky");
    channel.open().expect("open should succeed");
    let sub = channel
        .split(|m: &String| {
            assert_ne!(m, "boom", "predicate rejects boom");
            m == "hello"
        })
        .expect("split should succeed");
    sub.open().expect("open should succeed");

    push_all(&upstream, strings(&["hello", "boom"]));

    let settled = recv_within(&channel, RECV_PATIENCE)
        .await
        .expect("root recv should settle after the loop panics");
    assert!(matches!(settled, Err(ChannelError::Closed)));
    let (from_sub, err) = drain_residuals(&sub).await;
    assert_eq!(from_sub, strings(&["hello"]));
    assert!(err.is_closed());

    sub.close().await.expect("subchannel close should succeed");
    let closed = std::panic::AssertUnwindSafe(channel.close())
        .catch_unwind()
        .await;
    assert!(closed.is_err());
    assert!(!channel.is_open());
}

#[tokio::test(flavor = "multi_thread")]
async fn subchannel_send_reaches_root_writer() {
    integration_test_utils::init_logging();
    let upstream = Arc::new(Mailbox::<String>::new());
    let writer = Arc::new(RecordingWriter::<String>::new());
    let channel = Channel::with_label("writer", upstream.clone(), Some(writer.clone()));
    channel.open().expect("open should succeed");
    let sub = channel
        .split(|m: &String| m == "hello")
        .expect("split should succeed");
    assert!(matches!(
        sub.split(|_: &String| true),
        Err(ChannelError::Closed)
    ));

    sub.send("hello".to_string()).await.expect("send");
    sub.open().expect("open should succeed");
    let nested = sub.split(|_: &String| true).expect("split should succeed");
    nested.send("world".to_string()).await.expect("send");

    assert_eq!(writer.written(), strings(&["hello", "world"]));
    assert!(upstream.is_empty());

    sub.close().await.expect("close should succeed");
    channel.close().await.expect("close should succeed");
}

#[tokio::test(flavor = "multi_thread")]
async fn subchannel_loopback_send_is_routed() {
    let (_upstream, channel) = loopback_channel::<String>("loopback-split");
    channel.open().expect("open should succeed");
    let sub = channel
        .split(|m: &String| m == "hello")
        .expect("split should succeed");

    sub.scoped(|sub| {
        let channel = &channel;
        async move {
            sub.send("hello".to_string()).await.expect("send");
            sub.send("world".to_string()).await.expect("send");
            assert_eq!(sub.recv().await.expect("sub recv"), "hello");
            assert_eq!(channel.recv().await.expect("recv"), "world");
        }
        .boxed()
    })
    .await
    .expect("scope should open and close");

    channel.close().await.expect("close should succeed");
}
