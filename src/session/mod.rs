mod errors;
mod store;
mod types;

pub use errors::AuthError;
pub use store::SessionStore;
pub use types::{RegisterRequest, ResetPasswordRequest};
