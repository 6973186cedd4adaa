//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Media download queue
//!
//! Sound triggers can name files the client does not have; those are
//! fetched over HTTP in the background, one at a time, in trigger order.
//! A failed or cancelled transfer is reported and the queue moves on.

use async_trait::async_trait;
use futures::StreamExt;
use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// One queued transfer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DownloadItem {
    /// Source URL.
    pub url: String,
    /// Destination file.
    pub file: PathBuf,
}

/// Progress reporting from the transfer task.
#[derive(Clone, Debug, PartialEq)]
pub enum DownloadEvent {
    /// A transfer began.
    Started {
        /// Short display label (the URL's last path segment).
        label: String,
    },
    /// Transfer progress, when the total size is known.
    Progress {
        /// Completed fraction in `0.0..=1.0`.
        fraction: f64,
    },
    /// A transfer completed and its file is in place.
    Finished {
        /// Source URL of the completed transfer.
        url: String,
    },
    /// A transfer failed or was cancelled; the queue continues.
    Failed {
        /// Source URL of the failed transfer.
        url: String,
        /// Failure description.
        error: String,
    },
}

/// Fetches one URL to one file. Abstracted so tests can run the queue
/// without a network.
#[async_trait]
pub trait DownloadTransport: Send + Sync + 'static {
    /// Fetches `url` into `destination`, reporting progress fractions as
    /// they become known.
    async fn fetch(
        &self,
        url: &str,
        destination: &Path,
        progress: mpsc::UnboundedSender<f64>,
    ) -> io::Result<()>;
}

/// Streaming HTTP transport.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport with a default client.
    pub fn new() -> Self {
        HttpTransport {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DownloadTransport for HttpTransport {
    async fn fetch(
        &self,
        url: &str,
        destination: &Path,
        progress: mpsc::UnboundedSender<f64>,
    ) -> io::Result<()> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(io::Error::other)?;

        let mut file = tokio::fs::File::create(destination).await?;
        if let Err(error) = stream_body(response, &mut file, &progress).await {
            // Never leave a truncated file behind.
            drop(file);
            let _ = tokio::fs::remove_file(destination).await;
            return Err(error);
        }
        Ok(())
    }
}

async fn stream_body(
    response: reqwest::Response,
    file: &mut tokio::fs::File,
    progress: &mpsc::UnboundedSender<f64>,
) -> io::Result<()> {
    let total = response.content_length();
    let mut stream = response.bytes_stream();
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(io::Error::other)?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
        if let Some(total) = total
            && total > 0
        {
            let _ = progress.send(written as f64 / total as f64);
        }
    }
    file.flush().await?;
    Ok(())
}

struct ActiveDownload {
    url: String,
    cancel: CancellationToken,
}

/// FIFO transfer queue with a single transfer in flight.
///
/// Deduplication is by exact URL string against the queue and the active
/// transfer; no normalization is attempted, so case or trailing-slash
/// variants are distinct items.
pub struct DownloadQueue {
    queue: VecDeque<DownloadItem>,
    active: Option<ActiveDownload>,
    transport: Arc<dyn DownloadTransport>,
    events: mpsc::UnboundedSender<DownloadEvent>,
    enabled: bool,
}

impl DownloadQueue {
    /// Creates a queue reporting through `events`. A disabled queue
    /// silently drops every enqueue.
    pub fn new(
        transport: Arc<dyn DownloadTransport>,
        events: mpsc::UnboundedSender<DownloadEvent>,
        enabled: bool,
    ) -> Self {
        DownloadQueue {
            queue: VecDeque::new(),
            active: None,
            transport,
            events,
            enabled,
        }
    }

    /// Adds a transfer and starts it immediately when nothing is in
    /// flight. Duplicates of a queued or active URL are dropped.
    pub fn enqueue(&mut self, item: DownloadItem) {
        if !self.enabled {
            debug!(url = %item.url, "downloads disabled, dropping request");
            return;
        }
        let duplicate = self.queue.iter().any(|queued| queued.url == item.url)
            || self
                .active
                .as_ref()
                .is_some_and(|active| active.url == item.url);
        if duplicate {
            debug!(url = %item.url, "duplicate download request dropped");
            return;
        }
        self.queue.push_back(item);
        self.maybe_start();
    }

    /// Clears the active slot after a `Finished` or `Failed` event and
    /// starts the next queued transfer.
    pub fn advance(&mut self) {
        self.active = None;
        self.maybe_start();
    }

    /// Cancels the transfer in flight, if any. The transfer task reports
    /// the cancellation as a `Failed` event.
    pub fn cancel_active(&mut self) {
        if let Some(active) = &self.active {
            active.cancel.cancel();
        }
    }

    /// Drops all queued transfers and cancels the active one, as on
    /// disconnect.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.cancel_active();
    }

    /// Number of transfers waiting behind the active one.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Whether a transfer is in flight.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    fn maybe_start(&mut self) {
        if self.active.is_some() {
            return;
        }
        let Some(item) = self.queue.pop_front() else {
            return;
        };
        let cancel = CancellationToken::new();
        self.active = Some(ActiveDownload {
            url: item.url.clone(),
            cancel: cancel.clone(),
        });

        let transport = Arc::clone(&self.transport);
        let events = self.events.clone();
        tokio::spawn(async move {
            let label = item
                .url
                .rsplit('/')
                .next()
                .filter(|segment| !segment.is_empty())
                .unwrap_or(&item.url)
                .to_string();
            let _ = events.send(DownloadEvent::Started { label });

            let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
            let mut fetch = std::pin::pin!(transport.fetch(&item.url, &item.file, progress_tx));
            let outcome = loop {
                tokio::select! {
                    () = cancel.cancelled() => {
                        // The dropped fetch may have written part of the file.
                        let _ = tokio::fs::remove_file(&item.file).await;
                        break DownloadEvent::Failed {
                            url: item.url.clone(),
                            error: "cancelled".to_string(),
                        };
                    }
                    Some(fraction) = progress_rx.recv() => {
                        let _ = events.send(DownloadEvent::Progress {
                            fraction: fraction.clamp(0.0, 1.0),
                        });
                    }
                    result = &mut fetch => break match result {
                        Ok(()) => DownloadEvent::Finished {
                            url: item.url.clone(),
                        },
                        Err(error) => DownloadEvent::Failed {
                            url: item.url.clone(),
                            error: error.to_string(),
                        },
                    },
                }
            };
            let _ = events.send(outcome);
        });
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
