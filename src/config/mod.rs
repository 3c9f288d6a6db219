//! # Configuration Module
//!
//! Configuration is file-based. Every configuration object is one JSON
//! artifact inside `./config/`:
//! - `core.json` for process-wide settings (layered with `MODBOT__*` environment variables)
//! - `<subsystem>.json` for each configurable subsystem
//!
//! ## Usage
//!
//! ```rust,ignore
//! use modbot::config::{ConfigStore, CoreConfig};
//!
//! let store = ConfigStore::in_working_dir();
//! store.ensure_exists().await?;
//! let core = CoreConfig::load_existing_or_create(&store).await?;
//! ```

mod settings;
mod store;

pub use settings::*;
pub use store::*;
