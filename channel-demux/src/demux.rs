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

use crate::config::{Config, UNMATCHED};
use crate::line_reader::{EndOfInput, LineReader};
use futures::future::join_all;
use message_channel::{Channel, ChannelError, Reader, Subchannel};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tokio::io::AsyncBufRead;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

const COMPONENT: &str = "channel_demux";

/// One input line together with the branch that claimed it.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RoutedLine {
    pub branch: String,
    pub line: String,
}

#[derive(Debug)]
pub enum DemuxError {
    Channel(ChannelError),
}

impl Display for DemuxError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DemuxError::Channel(err) => write!(f, "demux channel failed: {err}"),
        }
    }
}

impl Error for DemuxError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DemuxError::Channel(err) => Some(err),
        }
    }
}

impl From<ChannelError> for DemuxError {
    fn from(err: ChannelError) -> Self {
        DemuxError::Channel(err)
    }
}

/// Routes every line of `input` to the first rule that matches it, in rule
/// order, and forwards it to `sink`. Returns how many lines each branch got,
/// rules first and `unmatched` last.
pub async fn run<R>(
    config: &Config,
    input: R,
    sink: UnboundedSender<RoutedLine>,
) -> Result<Vec<(String, usize)>, DemuxError>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let lines = Arc::new(LineReader::paused(input));
    let reader: Arc<dyn Reader<String>> = lines.clone();
    let root = match &config.channel.label {
        Some(label) => Channel::with_label(label.clone(), reader, None),
        None => Channel::new(reader, None),
    };
    root.open()?;

    let mut branches: Vec<(String, Subchannel<String>)> = Vec::with_capacity(config.rules.len());
    for rule in &config.rules {
        let matcher = rule.matcher.clone();
        let branch = root.split(move |line: &String| matcher.matches(line))?;
        branch.open()?;
        debug!(
            component = COMPONENT,
            branch = rule.name.as_str(),
            channel = branch.label(),
            "rule branch opened"
        );
        branches.push((rule.name.clone(), branch));
    }

    info!(
        component = COMPONENT,
        channel = root.label(),
        rules = branches.len(),
        "demux started"
    );
    lines.resume();

    let pumps = branches
        .iter()
        .map(|(name, branch)| pump(name, branch, &sink))
        .chain(std::iter::once(pump(UNMATCHED, &root, &sink)));
    let counts = join_all(pumps).await;

    for (_, branch) in &branches {
        branch.close().await?;
    }
    match root.close().await {
        Ok(()) => {}
        Err(ChannelError::Read(fault)) if fault.downcast_ref::<EndOfInput>().is_some() => {}
        Err(err) => return Err(err.into()),
    }

    info!(component = COMPONENT, channel = root.label(), "demux finished");
    Ok(counts)
}

async fn pump(
    name: &str,
    channel: &Channel<String>,
    sink: &UnboundedSender<RoutedLine>,
) -> (String, usize) {
    let mut delivered = 0;
    while let Ok(line) = channel.recv().await {
        delivered += 1;
        // A closed sink only means nobody is printing anymore; keep draining.
        let _ = sink.send(RoutedLine {
            branch: name.to_string(),
            line,
        });
    }
    (name.to_string(), delivered)
}
