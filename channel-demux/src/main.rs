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

mod config;
mod demux;
mod line_reader;

use crate::config::Config;
use clap::Parser;
use std::error::Error;
use tokio::io::{stdin, stdout, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;

#[derive(Parser)]
#[command()]
struct DemuxArgs {
    #[arg(short, long, value_name = "FILE")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .try_init();

    let args = DemuxArgs::parse();
    let config = Config::load(&args.config)?;
    info!("Started channel-demux with {} rules", config.rules.len());

    let (tx, mut rx) = mpsc::unbounded_channel::<demux::RoutedLine>();
    let printer = tokio::spawn(async move {
        let mut out = stdout();
        while let Some(routed) = rx.recv().await {
            let line = format!("{}\t{}\n", routed.branch, routed.line);
            out.write_all(line.as_bytes()).await?;
        }
        out.flush().await
    });

    let counts = demux::run(&config, BufReader::new(stdin()), tx).await?;
    printer.await??;

    for (branch, count) in counts {
        info!("{branch}: {count} lines");
    }
    Ok(())
}
