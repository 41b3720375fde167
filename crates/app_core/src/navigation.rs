//! Navigation state and the navigation engine
//!
//! The engine starts in [`StartupPhase::Initializing`]. Until the start-up
//! timer fires (or [`NavigationEngine::force_ready`] is called) only forced
//! navigation is honoured, so selection events raised while the view is
//! being populated cannot re-enter navigation.

use crate::icon_cache::{IconCache, IconKey};
use crate::icon_provider::{default_provider, SystemIconProvider};
use crate::icon_resolver::IconResolver;
use crate::loader::{ListingBuilder, ListingLoader};
use crate::scheduler::{StartupScheduler, TimerEvent};
use crate::view::{
    BrowserView, ContextAction, ContextTarget, Generation, InputSource, NodeListing, Selection,
};
use crate::{AppError, BrowserConfig, Icon};
use app_fs::{normalize_path, parent_of, ClipboardSink, DirectoryLister, StdDirectorySource, SystemClipboard};
use crossbeam_channel::Receiver;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Start-up debounce phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupPhase {
    Initializing,
    /// Terminal for the session
    Ready,
}

/// Result of a navigation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// Gated by the start-up barrier, or nothing to do
    Ignored,
    /// Target is not an existing directory; state unchanged
    NotFound,
    /// Listing emitted to the view
    Loaded { generation: Generation, partial_failure: bool },
    /// Handed to the background loader
    Pending(Generation),
}

/// Result of a selection event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// Made against a listing that is no longer displayed
    Stale,
    ContextMenuOffered,
    Navigation(NavigationOutcome),
    Previewed(PathBuf),
    Unsupported,
    /// The file disappeared since it was listed
    Missing,
}

/// Navigation state owned by the engine
#[derive(Debug)]
pub struct NavigationState {
    current: Option<PathBuf>,
    phase: StartupPhase,
    /// Last generation handed out
    issued: Generation,
    /// Background request whose result is still wanted
    pending: Option<Generation>,
    listing: Option<NodeListing>,
}

impl NavigationState {
    pub fn new() -> Self {
        Self {
            current: None,
            phase: StartupPhase::Initializing,
            issued: Generation::default(),
            pending: None,
            listing: None,
        }
    }

    pub fn current(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    pub fn phase(&self) -> StartupPhase {
        self.phase
    }

    pub fn is_ready(&self) -> bool {
        self.phase == StartupPhase::Ready
    }

    pub fn listing(&self) -> Option<&NodeListing> {
        self.listing.as_ref()
    }

    pub fn pending(&self) -> Option<Generation> {
        self.pending
    }

    /// Generation of the displayed listing
    pub fn displayed_generation(&self) -> Option<Generation> {
        self.listing.as_ref().map(|l| l.generation)
    }

    /// Initializing -> Ready. True only for the call that made the transition.
    fn mark_ready(&mut self) -> bool {
        if self.phase == StartupPhase::Ready {
            return false;
        }
        self.phase = StartupPhase::Ready;
        true
    }

    fn issue_generation(&mut self) -> Generation {
        self.issued = self.issued.next();
        self.issued
    }

    fn install(&mut self, listing: NodeListing) -> &NodeListing {
        self.current = Some(listing.directory.clone());
        self.listing.insert(listing)
    }
}

impl Default for NavigationState {
    fn default() -> Self {
        Self::new()
    }
}

/// Orchestrates listing, icon resolution and the start-up barrier
pub struct NavigationEngine<V: BrowserView> {
    state: NavigationState,
    builder: ListingBuilder,
    view: V,
    scheduler: Box<dyn StartupScheduler>,
    clipboard: Box<dyn ClipboardSink>,
    startup_delay: Duration,
    loader: Option<ListingLoader>,
}

impl<V: BrowserView> NavigationEngine<V> {
    pub fn new(builder: ListingBuilder, view: V, scheduler: Box<dyn StartupScheduler>) -> Self {
        Self {
            state: NavigationState::new(),
            builder,
            view,
            scheduler,
            clipboard: Box::new(SystemClipboard::new()),
            startup_delay: Duration::from_millis(500),
            loader: None,
        }
    }

    /// Engine wired from configuration with the platform icon provider
    pub fn from_config(
        config: &BrowserConfig,
        view: V,
        scheduler: Box<dyn StartupScheduler>,
    ) -> Result<Self, AppError> {
        Self::from_config_with_provider(config, default_provider(), view, scheduler)
    }

    pub fn from_config_with_provider(
        config: &BrowserConfig,
        provider: Arc<dyn SystemIconProvider>,
        view: V,
        scheduler: Box<dyn StartupScheduler>,
    ) -> Result<Self, AppError> {
        let lister = DirectoryLister::new(Arc::new(StdDirectorySource), config.cloud_probe());
        let resolver = IconResolver::new(provider, config.icon_size).with_cloud_badge(config.badge_cloud_only);
        let builder = ListingBuilder::new(lister, Arc::new(resolver), Arc::new(IconCache::new()));

        let engine = Self::new(builder, view, scheduler).with_startup_delay(config.startup_delay());
        if config.background_loading {
            engine.with_background_loading()
        } else {
            Ok(engine)
        }
    }

    pub fn with_startup_delay(mut self, delay: Duration) -> Self {
        self.startup_delay = delay;
        self
    }

    pub fn with_clipboard(mut self, clipboard: Box<dyn ClipboardSink>) -> Self {
        self.clipboard = clipboard;
        self
    }

    /// Move listing work onto a worker thread
    pub fn with_background_loading(mut self) -> Result<Self, AppError> {
        self.loader = Some(ListingLoader::spawn(self.builder.clone())?);
        Ok(self)
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn cache(&self) -> &Arc<IconCache> {
        &self.builder.cache
    }

    /// Finished background listings, for hosts that multiplex channels
    pub fn loader_results(&self) -> Option<&Receiver<NodeListing>> {
        self.loader.as_ref().map(|l| l.results())
    }

    /// Forced navigation to the initial directory, then arm the start-up timer
    pub fn start(&mut self, initial: &Path) -> NavigationOutcome {
        let outcome = self.navigate(initial, true);
        self.scheduler
            .schedule_once(self.startup_delay, TimerEvent::StartupElapsed);
        tracing::info!("Navigation started at {}, ready in {:?}", initial.display(), self.startup_delay);
        outcome
    }

    /// Deliver a timer event. True if it made the engine ready.
    pub fn on_timer(&mut self, event: TimerEvent) -> bool {
        match event {
            TimerEvent::StartupElapsed => self.force_ready(),
        }
    }

    /// Leave the start-up phase now. True only on the first call.
    pub fn force_ready(&mut self) -> bool {
        let transitioned = self.state.mark_ready();
        if transitioned {
            tracing::info!("Navigation ready");
        }
        transitioned
    }

    /// Synchronous directory change
    pub fn change_directory(&mut self, path: &Path, forced: bool) -> NavigationOutcome {
        let Some(path) = self.admit(path, forced) else {
            return self.rejected_outcome(forced);
        };

        let generation = self.state.issue_generation();
        self.state.pending = None;

        match self.builder.build(&path, generation, || true) {
            Some(listing) => self.install(listing),
            None => NavigationOutcome::Ignored,
        }
    }

    /// Directory change through the background loader when one is running
    pub fn request_directory(&mut self, path: &Path, forced: bool) -> NavigationOutcome {
        if self.loader.is_none() {
            return self.change_directory(path, forced);
        }

        let Some(path) = self.admit(path, forced) else {
            return self.rejected_outcome(forced);
        };

        let generation = self.state.issue_generation();
        let sent = match self.loader.as_ref() {
            Some(loader) => loader.request(&path, generation),
            None => Err(AppError::LoaderStopped),
        };

        match sent {
            Ok(()) => {
                self.state.pending = Some(generation);
                NavigationOutcome::Pending(generation)
            }
            Err(e) => {
                tracing::warn!("{}; listing {} inline", e, path.display());
                self.state.pending = None;
                match self.builder.build(&path, generation, || true) {
                    Some(listing) => self.install(listing),
                    None => NavigationOutcome::Ignored,
                }
            }
        }
    }

    /// Install a background result. Stale generations are discarded.
    pub fn accept_loaded(&mut self, listing: NodeListing) -> bool {
        if self.state.pending != Some(listing.generation) {
            tracing::debug!(
                "Discarding stale listing {:?} of {}",
                listing.generation,
                listing.directory.display()
            );
            return false;
        }

        self.state.pending = None;
        self.install(listing);
        true
    }

    /// Drain finished background listings. Returns how many were installed.
    pub fn poll_loader(&mut self) -> usize {
        let mut finished = Vec::new();
        if let Some(loader) = self.loader.as_ref() {
            while let Some(listing) = loader.try_recv() {
                finished.push(listing);
            }
        }

        let mut installed = 0;
        for listing in finished {
            if self.accept_loaded(listing) {
                installed += 1;
            }
        }
        installed
    }

    /// React to a node being picked in the view
    pub fn select_entry(&mut self, selection: Selection) -> SelectionOutcome {
        if self.state.displayed_generation() != Some(selection.generation) {
            tracing::debug!("Ignoring selection from stale listing {:?}", selection.generation);
            return SelectionOutcome::Stale;
        }

        let entry = selection.entry;

        if selection.source == InputSource::Secondary {
            let target = ContextTarget {
                kind: entry.kind,
                path: entry.path,
            };
            self.view.offer_context_menu(&target);
            return SelectionOutcome::ContextMenuOffered;
        }

        if entry.is_navigable() {
            return SelectionOutcome::Navigation(self.navigate(&entry.path, false));
        }

        if !entry.path.is_file() {
            self.view.set_status(&app_fs::not_found_message(&entry.path));
            SelectionOutcome::Missing
        } else if entry.previewable {
            tracing::debug!("Preview {}", entry.path.display());
            self.view.preview_file(&entry.path);
            SelectionOutcome::Previewed(entry.path)
        } else {
            self.view.show_unsupported();
            SelectionOutcome::Unsupported
        }
    }

    /// Run a context action. Navigation state is left untouched.
    pub fn run_context_action(&mut self, action: ContextAction, target: &ContextTarget) -> bool {
        match action {
            ContextAction::CopyPath => {
                let text = target.path.display().to_string();
                match self.clipboard.set_text(&text) {
                    Ok(()) => {
                        self.view.set_status(&format!("Copied path to clipboard: {}", text));
                        true
                    }
                    Err(e) => {
                        let err = AppError::from(e);
                        tracing::warn!("{}", err);
                        self.view.set_status(&err.user_message());
                        false
                    }
                }
            }
        }
    }

    /// Re-list the current directory
    pub fn refresh(&mut self) -> NavigationOutcome {
        match self.state.current.clone() {
            Some(current) => self.navigate(&current, true),
            None => NavigationOutcome::Ignored,
        }
    }

    /// Navigate to the parent of the current directory
    pub fn go_up(&mut self) -> NavigationOutcome {
        match self.state.current().and_then(parent_of) {
            Some(parent) => self.navigate(&parent, false),
            None => NavigationOutcome::Ignored,
        }
    }

    /// Shared toolbar refresh glyph
    pub fn refresh_icon(&self) -> Option<Arc<Icon>> {
        let resolver = &self.builder.resolver;
        self.builder
            .cache
            .get_or_resolve(IconKey::Refresh, || Some(resolver.refresh_icon()))
    }

    fn navigate(&mut self, path: &Path, forced: bool) -> NavigationOutcome {
        if self.loader.is_some() {
            self.request_directory(path, forced)
        } else {
            self.change_directory(path, forced)
        }
    }

    /// Gate, clear the cache and validate. `None` means the request stops here.
    fn admit(&mut self, path: &Path, forced: bool) -> Option<PathBuf> {
        if !forced && !self.state.is_ready() {
            tracing::debug!("Ignoring navigation to {} during start-up", path.display());
            return None;
        }

        // Supersede the worker first so it cannot repopulate the cleared cache
        if let Some(loader) = self.loader.as_ref() {
            loader.cancel();
            self.state.pending = None;
        }
        let released = self.builder.cache.clear();
        tracing::trace!("Released {} cached icons", released);

        let path = absolute(path);
        if !self.builder.lister.is_directory(&path) {
            let err = AppError::NotFound(path.clone());
            tracing::warn!("{}", err);
            self.view.set_status(&err.user_message());
            return None;
        }

        Some(path)
    }

    fn rejected_outcome(&self, forced: bool) -> NavigationOutcome {
        if !forced && !self.state.is_ready() {
            NavigationOutcome::Ignored
        } else {
            NavigationOutcome::NotFound
        }
    }

    fn install(&mut self, listing: NodeListing) -> NavigationOutcome {
        let generation = listing.generation;
        let partial_failure = listing.partial_failure;
        tracing::info!(
            "Showing {} ({} nodes, {:?})",
            listing.directory.display(),
            listing.nodes.len(),
            generation
        );

        let listing = self.state.install(listing);
        self.view.show_listing(listing);
        if partial_failure {
            let status = listing
                .status
                .clone()
                .unwrap_or_else(|| AppError::PartialEnumeration(listing.directory.clone()).user_message());
            self.view.set_status(&status);
        }

        NavigationOutcome::Loaded { generation, partial_failure }
    }
}

impl<V: BrowserView> Drop for NavigationEngine<V> {
    fn drop(&mut self) {
        // Stop the worker first so nothing repopulates the cache
        self.loader.take();
        let released = self.builder.cache.clear();
        tracing::debug!("Navigation engine shut down, released {} icons", released);
    }
}

fn absolute(path: &Path) -> PathBuf {
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
    };
    normalize_path(&path)
}
