//! Directory browser core
//!
//! This crate contains:
//! - Configuration
//! - Error types
//! - Icon synthesis, resolution and caching
//! - The navigation engine and its start-up barrier
//! - Boundary types for the external view

pub mod config;
pub mod error;
pub mod icon;
pub mod icon_cache;
pub mod icon_provider;
pub mod icon_resolver;
pub mod loader;
pub mod navigation;
pub mod scheduler;
pub mod view;

pub use config::BrowserConfig;
pub use error::AppError;
pub use icon::{flat_glyph, synthesize, Icon, IconKind, IconSize};
pub use icon_cache::{CacheStats, IconCache, IconKey};
pub use icon_provider::{default_provider, BuiltinIconProvider, SystemIconProvider};
#[cfg(windows)]
pub use icon_provider::ShellIconProvider;
pub use icon_resolver::IconResolver;
pub use loader::{ListingBuilder, ListingLoader};
pub use navigation::{NavigationEngine, NavigationOutcome, NavigationState, SelectionOutcome, StartupPhase};
pub use scheduler::{ArmedTimer, ChannelScheduler, ManualScheduler, StartupScheduler, TimerEvent, TimerQueue};
pub use view::{
    BrowserView, ContextAction, ContextTarget, Generation, InputSource, Node, NodeListing, Selection,
};
