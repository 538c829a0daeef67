pub mod logging;

pub use logging::{init, init_log_file, log_startup, print_run_summary, truncate_text};
