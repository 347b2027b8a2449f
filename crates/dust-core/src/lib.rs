//! Offline-first festival guide engine: loads a dataset of events, camps and
//! art, normalizes it once and answers queries over the resident result.

pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod favorites;
pub mod loader;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod query;
pub mod timestring;
pub mod worker;

#[cfg(test)]
mod fixtures;

pub use config::{
    ConfigError, ConfigLoadResult, ConfigSource, GuideConfig, SourceLocation, config_directory,
    config_path, load_config, save_config,
};
pub use dispatch::{Command, DataManager, Reply};
pub use engine::{Engine, EventView};
pub use error::{GuideError, Result};
pub use favorites::{Favorite, Favorites, FavoritesStore, MemoryFavorites};
pub use loader::{DatasetSource, DirectorySource, HttpSource, load_dataset, load_points};
pub use logging::{LoggingDestination, LoggingError, current_log_path, init_logging};
pub use model::{
    Art, ArtId, Camp, CampId, Day, Event, EventId, EventState, Occurrence, OccurrenceState, Pin,
    RawDataset, TimeString,
};
pub use normalize::{NormalizeOptions, Normalized, normalize};
pub use timestring::{TimeStringCache, format_window};
pub use worker::{WorkerHandle, spawn};
