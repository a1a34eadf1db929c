mod coordinator;
mod errors;
mod types;

pub use coordinator::{ForceLogoutHook, RefreshCoordinator};
pub use errors::RefreshError;
