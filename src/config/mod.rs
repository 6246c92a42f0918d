//! Suite files and their resolution into run inputs.
mod apply;
mod loader;
pub mod types;


pub use apply::{
    auth_context, client_settings, fixed_load_config, identity_url, select_requests,
    timed_load_config,
};
pub use loader::{DEFAULT_SUITE_FILES, load_suite, load_suite_file};
pub use types::{LoadMode, LoadSection, SuiteFile};
