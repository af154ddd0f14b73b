//! The listing program itself: argument validation, credential
//! collection, session establishment, one collection fetch, output.
//!
//! The session and the credential prompts sit behind traits so the flow
//! can be exercised against a mock remote.

use std::io::{self, BufRead, Write};

use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::client::{Collection, Session};
use crate::error::Error as ClientError;

/// Port used when the host argument does not carry a usable one.
pub const DEFAULT_PORT: u16 = 1247;

/// Where and as whom to connect, parsed from the positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub host: String,
    pub port: u16,
    pub zone: String,
}

impl ConnectionTarget {
    /// Split `host[:port]`, trimming both halves. A missing, unparseable
    /// or zero port falls back to [`DEFAULT_PORT`].
    pub fn parse(host_port: &str, zone: &str) -> Self {
        let (host, port) = match host_port.split_once(':') {
            Some((host, port)) => (
                host.trim(),
                port.trim().parse::<u16>().unwrap_or(DEFAULT_PORT),
            ),
            None => (host_port, DEFAULT_PORT),
        };
        let port = if port == 0 { DEFAULT_PORT } else { port };

        Self {
            host: host.to_string(),
            port,
            zone: zone.to_string(),
        }
    }
}

/// Interactively collected secrets, wiped from memory on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Source of the interactive username and password reads.
pub trait CredentialSource {
    fn username(&mut self) -> io::Result<String>;
    fn password(&mut self) -> io::Result<String>;
}

/// Prompts on the controlling terminal; the password read does not echo.
pub struct TerminalCredentials;

impl CredentialSource for TerminalCredentials {
    fn username(&mut self) -> io::Result<String> {
        print!("Username: ");
        io::stdout().flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn password(&mut self) -> io::Result<String> {
        rpassword::prompt_password("Password: ")
    }
}

/// Something that can open authenticated sessions against the remote zone.
pub trait Remote {
    type Session: RemoteSession;

    fn open_session(
        &self,
        target: &ConnectionTarget,
        credentials: &Credentials,
    ) -> Result<Self::Session, ClientError>;
}

/// One open session; the connection is released when the value drops.
pub trait RemoteSession {
    fn fetch_collection(&mut self, path: &str) -> Result<Collection, ClientError>;
}

/// The real remote: the iRODS client from [`crate::client`].
pub struct Irods;

impl Remote for Irods {
    type Session = Session;

    fn open_session(
        &self,
        target: &ConnectionTarget,
        credentials: &Credentials,
    ) -> Result<Session, ClientError> {
        Session::connect(
            &target.host,
            target.port,
            &credentials.username,
            &credentials.password,
            &target.zone,
        )
    }
}

impl RemoteSession for Session {
    fn fetch_collection(&mut self, path: &str) -> Result<Collection, ClientError> {
        Session::fetch_collection(self, path)
    }
}

/// Failure modes of one listing run. The first five are diagnosed before
/// any network activity; `PathNotFound` is the one fetch failure reported
/// with a dedicated message. Session errors pass through untouched.
#[derive(Debug, Error)]
pub enum ListError {
    #[error("Arguments not given correctly (given = {given})")]
    Usage { given: usize },
    #[error("iRODS HOST is not given")]
    MissingHost,
    #[error("iRODS ZONE is not given")]
    MissingZone,
    #[error("iRODS USER is not given")]
    MissingUser,
    #[error("iRODS PASSWORD is not given")]
    MissingPassword,
    #[error("iRODS PATH is not given")]
    MissingPath,
    #[error("Could not list a path {0}")]
    PathNotFound(String),
    #[error(transparent)]
    Session(#[from] ClientError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Run one listing: `args` are the raw process arguments (program name
/// included). Entry names go to `out`, one per line, data objects first,
/// in the order the server returned them.
pub fn run<R: Remote>(
    args: &[String],
    credentials: &mut dyn CredentialSource,
    remote: &R,
    out: &mut impl Write,
) -> Result<(), ListError> {
    if args.len() < 4 {
        return Err(ListError::Usage { given: args.len() });
    }

    let target = ConnectionTarget::parse(&args[1], &args[2]);
    let path = args[3].as_str();

    let credentials = Credentials {
        username: credentials.username()?,
        password: credentials.password()?,
    };

    if target.host.is_empty() {
        return Err(ListError::MissingHost);
    }
    if target.zone.is_empty() {
        return Err(ListError::MissingZone);
    }
    if credentials.username.is_empty() {
        return Err(ListError::MissingUser);
    }
    if credentials.password.is_empty() {
        return Err(ListError::MissingPassword);
    }
    if path.is_empty() {
        return Err(ListError::MissingPath);
    }

    // The session drops (and disconnects) on every path out of here.
    let mut session = remote.open_session(&target, &credentials)?;

    let collection = match session.fetch_collection(path) {
        Ok(collection) => collection,
        Err(ClientError::CollectionNotFound(_)) => {
            return Err(ListError::PathNotFound(path.to_string()));
        }
        Err(err) => return Err(err.into()),
    };

    for name in &collection.data_objects {
        writeln!(out, "{}", name)?;
    }
    for name in &collection.subcollections {
        writeln!(out, "{}", name)?;
    }

    Ok(())
}
