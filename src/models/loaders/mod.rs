pub mod payload_loader;
pub mod toml_loader;

pub use payload_loader::load_json_payload;
pub use toml_loader::{load_registry, load_registry_file};
