//! Define errors that can happen while talking to
//! an iRODS server.

use crate::error_code::ErrorCode;
use thiserror::Error;

/// A generic client error, basically anything that can go wrong with
/// a request has a variant on this enum.
#[derive(Debug, Error)]
pub enum Error {
    /// IO Error
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// Bytes from the server do not frame as an iRODS message
    #[error("malformed server message: {0}")]
    Protocol(String),
    /// A header or reply body did not decode as the expected XML
    #[error("invalid XML in server reply: {0}")]
    Xml(#[from] quick_xml::DeError),
    /// The server answered a request with a negative status
    #[error("server returned {0}")]
    Api(ErrorCode),
    /// The requested collection does not exist in the catalog
    #[error("no such collection: {0}")]
    CollectionNotFound(String),
}
