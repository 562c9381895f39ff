//! Best-effort background lookups for profiles and NFT class metadata.
//!
//! Jobs go through a bounded queue; when it is full the job is dropped. Failures are
//! logged and never reach the feed or followee state that triggered them.

use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::api::WalletApi;
use crate::config::EnrichmentConfig;
use crate::state::LookupCache;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupJob {
    Profile(String),
    Class(String),
}

pub struct Enricher {
    sender: mpsc::Sender<LookupJob>,
    shutdown: watch::Sender<bool>,
}

impl Enricher {
    /// Starts the worker on the current tokio runtime.
    pub fn spawn(
        api: Arc<dyn WalletApi>,
        cache: Arc<LookupCache>,
        config: &EnrichmentConfig,
    ) -> Self {
        assert!(config.queue_capacity > 0, "Enrichment queue must be bounded above zero");
        let (sender, receiver) = mpsc::channel(config.queue_capacity);
        let (shutdown, shutdown_rx) = watch::channel(false);
        let worker = EnrichmentWorker {
            api,
            cache,
            receiver,
        };
        tokio::spawn(worker.run(shutdown_rx));
        Self { sender, shutdown }
    }

    /// Queues a lookup. Returns false when the job was dropped.
    pub fn dispatch(&self, job: LookupJob) -> bool {
        match self.sender.try_send(job) {
            Ok(()) => true,
            Err(TrySendError::Full(job)) => {
                debug!(?job, "Enrichment queue full, dropping lookup");
                false
            }
            Err(TrySendError::Closed(job)) => {
                debug!(?job, "Enrichment worker stopped, dropping lookup");
                false
            }
        }
    }

    pub fn dispatch_profiles<I>(&self, addresses: I)
    where
        I: IntoIterator<Item = String>,
    {
        for address in addresses {
            self.dispatch(LookupJob::Profile(address));
        }
    }

    pub fn dispatch_classes<I>(&self, class_ids: I)
    where
        I: IntoIterator<Item = String>,
    {
        for class_id in class_ids {
            self.dispatch(LookupJob::Class(class_id));
        }
    }

    pub fn shutdown(&self) {
        self.shutdown.send(true).ok();
    }
}

impl Drop for Enricher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct EnrichmentWorker {
    api: Arc<dyn WalletApi>,
    cache: Arc<LookupCache>,
    receiver: mpsc::Receiver<LookupJob>,
}

impl EnrichmentWorker {
    async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Enrichment worker shutting down");
                        break;
                    }
                }
                job = self.receiver.recv() => {
                    match job {
                        Some(job) => self.process(job).await,
                        None => break,
                    }
                }
            }
        }
    }

    async fn process(&self, job: LookupJob) {
        match job {
            LookupJob::Profile(address) => {
                if self.cache.profiles.contains_key(&address) {
                    return;
                }
                match self.api.profile_by_address(&address).await {
                    Ok(profile) => {
                        self.cache
                            .profiles
                            .insert(address, Arc::new(profile))
                            .await;
                    }
                    Err(err) => warn!(address = %address, "Profile lookup failed: {err}"),
                }
            }
            LookupJob::Class(class_id) => {
                if self.cache.classes.contains_key(&class_id) {
                    return;
                }
                match self.api.class_metadata(&class_id).await {
                    Ok(metadata) => {
                        self.cache
                            .classes
                            .insert(class_id, Arc::new(metadata))
                            .await;
                    }
                    Err(err) => warn!(class_id = %class_id, "Class metadata lookup failed: {err}"),
                }
            }
        }
    }
}
