pub mod logger;
pub mod signals;
pub(crate) mod summary_output;


pub use logger::init_logging;
pub use signals::cancel_on_shutdown_signal;
