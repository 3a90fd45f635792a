pub mod settings;

pub use settings::{default_config_path, load_or_init, FixerConfig};
