pub mod client;
pub mod error;
pub mod error_code;
pub mod lister;
pub mod message;
pub mod query;

pub mod prelude {
    pub use crate::client::{Collection, Session};
    pub use crate::error::Error;
    pub use crate::error_code::{ErrorCode, ErrorCodeKind};
    pub use crate::lister::{ConnectionTarget, Credentials, Remote, RemoteSession};
}

#[cfg(test)]
mod tests;
