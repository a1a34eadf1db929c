mod errors;
mod file;
mod memory;
mod traits;
mod types;

pub use errors::TokenStoreError;
pub use file::FileTokenStore;
pub use memory::MemoryTokenStore;
pub use traits::TokenStore;
pub use types::{CredentialPair, PersistedSession, UserProfile};
