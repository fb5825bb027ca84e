// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::{Context, Result};
use clap::Parser;
use courier_core::{Event, Listenable};
use courier_dispatch::{Dispatcher, DispatcherConfig};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

/// Simulates a handful of windows emitting events through one dispatcher.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// JSON file with the dispatcher configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of simulated windows.
    #[arg(long, default_value_t = 3)]
    windows: usize,

    /// Resize events emitted by each window.
    #[arg(long, default_value_t = 5)]
    events: u64,
}

fn load_config(path: Option<&PathBuf>) -> Result<DispatcherConfig> {
    let Some(path) = path else {
        return Ok(DispatcherConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    DispatcherConfig::from_json_str(&raw)
        .with_context(|| format!("parsing config {}", path.display()))
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let dispatcher = Arc::new(Dispatcher::new(load_config(args.config.as_ref())?));
    let resizes = Arc::new(AtomicU64::new(0));

    dispatcher.add_listener("app", "app.event.ready", |event| {
        log::info!("{} received", event);
        true
    });

    for i in 0..args.windows {
        let window = dispatcher.target(format!("win{i}"));

        window.on("window.event.ready", |event| {
            log::info!("{} is ready", event.target_id());
            true
        });

        let counter = Arc::clone(&resizes);
        window.on("window.event.resize", move |event| {
            let width = event.payload_value("width").and_then(|v| v.as_u64());
            log::debug!("{} resized to {:?}", event.target_id(), width);
            counter.fetch_add(1, Ordering::Relaxed);
            false
        });

        let scoped = window.clone();
        window.on("window.event.closed", move |event| {
            let removed = scoped.off_all();
            log::info!("{} closed, dropped {} listener(s)", event.target_id(), removed);
            false
        });
    }

    dispatcher.start().context("starting dispatcher")?;
    dispatcher.dispatch(Event::new("app", "app.event.ready"));

    let producers: Vec<_> = (0..args.windows)
        .map(|i| {
            let dispatcher = Arc::clone(&dispatcher);
            let events = args.events;
            thread::spawn(move || {
                let target = format!("win{i}");
                dispatcher.dispatch(Event::new(target.as_str(), "window.event.ready"));
                for step in 0..events {
                    dispatcher.dispatch(
                        Event::new(target.as_str(), "window.event.resize")
                            .with_payload("width", 800 + step * 10),
                    );
                }
                dispatcher.dispatch(Event::new(target.as_str(), "window.event.closed"));
                // No listeners remain; this one is delivered to nobody.
                dispatcher.dispatch(Event::new(target.as_str(), "window.event.resize"));
            })
        })
        .collect();

    for producer in producers {
        if producer.join().is_err() {
            log::error!("A producer thread panicked.");
        }
    }
    dispatcher.close();

    let stats = dispatcher.stats();
    log::info!(
        "Delivered {} event(s): {} invocation(s), {} self-removal(s), {} panic(s), {} resize(s).",
        stats.events_received,
        stats.invocations,
        stats.self_removals,
        stats.panics,
        resizes.load(Ordering::Relaxed)
    );
    Ok(())
}
