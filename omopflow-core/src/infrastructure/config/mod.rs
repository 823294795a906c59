pub mod loader;

pub use crate::domain::config::Config;
pub use loader::{DEFAULT_CONFIG_FILE, load_config};
