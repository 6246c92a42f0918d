mod app;
mod config;
mod expr;
mod http;
mod load;
mod validation;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use expr::ExprError;
pub use http::HttpError;
pub use load::LoadError;
pub use validation::ValidationError;
