//! Sessions - identifiers and their sandbox roots

mod id;
mod store;

pub use id::{SessionId, MAX_SESSION_ID_LEN};
pub use store::SessionStore;
