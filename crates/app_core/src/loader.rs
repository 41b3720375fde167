//! Listing construction and the background listing worker
//!
//! Listing and icon lookup can be slow on network shares. The worker runs
//! them off the interactive thread and posts generation-stamped results
//! back over a channel; requests overtaken by a newer one are abandoned.

use crate::icon_cache::IconCache;
use crate::icon_resolver::IconResolver;
use crate::view::{Generation, Node, NodeListing};
use crate::AppError;
use app_fs::DirectoryLister;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Turns a directory path into a node listing
#[derive(Clone)]
pub struct ListingBuilder {
    pub lister: DirectoryLister,
    pub resolver: Arc<IconResolver>,
    pub cache: Arc<IconCache>,
}

impl ListingBuilder {
    pub fn new(lister: DirectoryLister, resolver: Arc<IconResolver>, cache: Arc<IconCache>) -> Self {
        Self { lister, resolver, cache }
    }

    /// List `path` and resolve every icon through the cache.
    /// Returns `None` as soon as `still_wanted` reports the work is stale.
    pub fn build(
        &self,
        path: &Path,
        generation: Generation,
        still_wanted: impl Fn() -> bool,
    ) -> Option<NodeListing> {
        let listing = self.lister.list(path);
        let mut nodes = Vec::with_capacity(listing.entries.len());

        for entry in listing.entries {
            if !still_wanted() {
                tracing::debug!("Abandoning stale listing of {}", path.display());
                return None;
            }

            let key = IconResolver::key_for(&entry);
            let icon = self.cache.get_or_resolve(key, || self.resolver.resolve(&entry));
            nodes.push(Node { entry, icon, generation });
        }

        Some(NodeListing {
            directory: listing.directory,
            generation,
            nodes,
            partial_failure: listing.partial_failure,
            status: listing.status,
        })
    }
}

struct LoadRequest {
    path: PathBuf,
    generation: Generation,
}

/// Worker thread building listings in the background
pub struct ListingLoader {
    request_tx: Option<Sender<LoadRequest>>,
    result_rx: Receiver<NodeListing>,
    latest: Arc<AtomicU64>,
    worker: Option<JoinHandle<()>>,
}

impl ListingLoader {
    pub fn spawn(builder: ListingBuilder) -> Result<Self, AppError> {
        let (request_tx, request_rx) = unbounded::<LoadRequest>();
        let (result_tx, result_rx) = unbounded::<NodeListing>();
        let latest = Arc::new(AtomicU64::new(0));
        let worker_latest = Arc::clone(&latest);

        let worker = std::thread::Builder::new()
            .name("listing-loader".into())
            .spawn(move || {
                for request in request_rx {
                    let wanted = || worker_latest.load(Ordering::Acquire) == request.generation.0;
                    if !wanted() {
                        continue;
                    }

                    tracing::debug!("Loading {} ({:?})", request.path.display(), request.generation);
                    if let Some(listing) = builder.build(&request.path, request.generation, wanted) {
                        if result_tx.send(listing).is_err() {
                            break;
                        }
                    }
                }
                tracing::debug!("Listing loader stopped");
            })?;

        Ok(Self {
            request_tx: Some(request_tx),
            result_rx,
            latest,
            worker: Some(worker),
        })
    }

    /// Queue a load. Earlier requests become stale.
    pub fn request(&self, path: &Path, generation: Generation) -> Result<(), AppError> {
        self.latest.store(generation.0, Ordering::Release);
        let tx = self.request_tx.as_ref().ok_or(AppError::LoaderStopped)?;
        tx.send(LoadRequest {
            path: path.to_path_buf(),
            generation,
        })
        .map_err(|_| AppError::LoaderStopped)
    }

    /// Mark every queued or running request stale
    pub fn cancel(&self) {
        // Generations start at 1, so 0 matches no request
        self.latest.store(0, Ordering::Release);
    }

    /// Generation the worker is currently allowed to deliver
    pub fn latest(&self) -> Generation {
        Generation(self.latest.load(Ordering::Acquire))
    }

    /// Channel delivering finished listings
    pub fn results(&self) -> &Receiver<NodeListing> {
        &self.result_rx
    }

    pub fn try_recv(&self) -> Option<NodeListing> {
        self.result_rx.try_recv().ok()
    }
}

impl Drop for ListingLoader {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop
        self.request_tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("Listing loader panicked");
            }
        }
    }
}
