mod client;
mod errors;
mod types;

pub use client::RequestPipeline;
pub use errors::ApiError;
pub use types::{ApiErrorBody, ApiRequest, AuthErrorCode};

pub(crate) use client::build_http_client;
