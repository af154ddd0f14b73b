use std::io::BufReader;
use std::net::TcpStream;

use base64::prelude::{Engine as _, BASE64_STANDARD};
use log::{debug, info, warn};
use md5::{Digest, Md5};

use crate::error::Error;
use crate::error_code::{ErrorCode, ErrorCodeKind};
use crate::message::{
    read_message, write_message, xml_escape, AuthChallenge, GenQueryOut, Reply, Version,
    API_AUTH_REQUEST, API_AUTH_RESPONSE, API_GEN_QUERY, MSG_API_REQ, MSG_CONNECT, MSG_DISCONNECT,
};
use crate::query::{Query, COL_COLL_ID, COL_COLL_NAME, COL_COLL_PARENT_NAME, COL_DATA_NAME};

// Client version advertised in the startup pack.
const REL_VERSION: &str = "rods4.3.2";
const API_VERSION: &str = "d";

// Native-auth constants: the challenge is 64 raw bytes, the password is
// NUL-padded or truncated to 50 before digesting.
const CHALLENGE_LEN: usize = 64;
const MAX_PASSWORD_LEN: usize = 50;

/// The immediate contents of one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub data_objects: Vec<String>,
    pub subcollections: Vec<String>,
}

/// An authenticated connection to an iRODS server.
///
/// The connection is established, authenticated and used synchronously;
/// dropping the session sends the disconnect message.
pub struct Session {
    stream: BufReader<TcpStream>,
}

impl Session {
    /// Connect and authenticate with the native (challenge-response) scheme.
    pub fn connect(
        host: &str,
        port: u16,
        user: &str,
        password: &str,
        zone: &str,
    ) -> Result<Self, Error> {
        let raw_stream = TcpStream::connect((host, port))?;
        let stream = BufReader::new(raw_stream);

        let mut session = Session { stream };
        session.startup(user, zone)?;
        session.authenticate(user, password, zone)?;
        info!("session established with {}:{} as {}#{}", host, port, user, zone);

        Ok(session)
    }

    fn startup(&mut self, user: &str, zone: &str) -> Result<(), Error> {
        let user = xml_escape(user);
        let zone = xml_escape(zone);
        let body = format!(
            "<StartupPack_PI><irodsProt>1</irodsProt>\
             <reconnFlag>0</reconnFlag><connectCnt>0</connectCnt>\
             <proxyUser>{user}</proxyUser><proxyRcatZone>{zone}</proxyRcatZone>\
             <clientUser>{user}</clientUser><clientRcatZone>{zone}</clientRcatZone>\
             <relVersion>{rel}</relVersion><apiVersion>{api}</apiVersion>\
             <option></option></StartupPack_PI>",
            user = user,
            zone = zone,
            rel = REL_VERSION,
            api = API_VERSION,
        );
        write_message(self.stream.get_mut(), MSG_CONNECT, 0, &body)?;

        let reply = read_message(&mut self.stream)?;
        let version: Version = reply.parse()?;
        if version.status < 0 {
            return Err(Error::Api(ErrorCode::parse(version.status)));
        }
        debug!(
            "server is {} (api {})",
            version.rel_version, version.api_version
        );

        Ok(())
    }

    fn authenticate(&mut self, user: &str, password: &str, zone: &str) -> Result<(), Error> {
        let reply = self.api_request(API_AUTH_REQUEST, "")?;
        let challenge: AuthChallenge = reply.parse()?;
        let challenge = BASE64_STANDARD
            .decode(challenge.challenge.trim())
            .map_err(|err| Error::Protocol(format!("challenge is not valid base64: {}", err)))?;

        let digest = challenge_response(&challenge, password);
        let body = format!(
            "<authResponse_PI><response>{}</response><username>{}#{}</username></authResponse_PI>",
            BASE64_STANDARD.encode(digest),
            xml_escape(user),
            xml_escape(zone),
        );
        self.api_request(API_AUTH_RESPONSE, &body)?;

        Ok(())
    }

    /// Fetch the immediate contents of the collection at `path`.
    ///
    /// The collection row itself is probed first so that a missing
    /// collection is distinguishable from an empty one.
    pub fn fetch_collection(&mut self, path: &str) -> Result<Collection, Error> {
        let existence = Query::new()
            .select(COL_COLL_ID)
            .filter(COL_COLL_NAME, path);
        match self.gen_query(&existence) {
            Ok(_) => {}
            Err(Error::Api(code)) if code.kind == ErrorCodeKind::CatNoRowsFound => {
                return Err(Error::CollectionNotFound(path.to_string()));
            }
            Err(err) => return Err(err),
        }

        let data_query = Query::new()
            .select(COL_DATA_NAME)
            .filter(COL_COLL_NAME, path);
        let data_objects = self.query_column(&data_query, COL_DATA_NAME)?;

        let coll_query = Query::new()
            .select(COL_COLL_NAME)
            .filter(COL_COLL_PARENT_NAME, path);
        let subcollections = self.query_column(&coll_query, COL_COLL_NAME)?;

        Ok(Collection {
            data_objects,
            subcollections,
        })
    }

    /// Run a query and extract one column; no rows is an empty column.
    fn query_column(&mut self, query: &Query, column: i32) -> Result<Vec<String>, Error> {
        match self.gen_query(query) {
            Ok(out) => Ok(out
                .column(column)
                .map(|values| values.to_vec())
                .unwrap_or_default()),
            Err(Error::Api(code)) if code.kind == ErrorCodeKind::CatNoRowsFound => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    fn gen_query(&mut self, query: &Query) -> Result<GenQueryOut, Error> {
        let reply = self.api_request(API_GEN_QUERY, &query.to_xml())?;
        reply.parse()
    }

    fn api_request(&mut self, api_number: i32, body: &str) -> Result<Reply, Error> {
        write_message(self.stream.get_mut(), MSG_API_REQ, api_number, body)?;
        let reply = read_message(&mut self.stream)?;

        if reply.header.int_info < 0 {
            return Err(Error::Api(ErrorCode::parse(reply.header.int_info)));
        }
        Ok(reply)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // The server expects a disconnect message; failure to deliver it
        // only costs the server a reaped connection, so log and move on.
        if let Err(err) = write_message(self.stream.get_mut(), MSG_DISCONNECT, 0, "") {
            warn!("could not send disconnect: {}", err);
        }
    }
}

/// Digest for the native-auth response: MD5 over the challenge followed by
/// the padded password, with zero bytes bumped to 0x01 so the result never
/// embeds a NUL.
pub(crate) fn challenge_response(challenge: &[u8], password: &str) -> [u8; 16] {
    let mut buf = [0u8; CHALLENGE_LEN + MAX_PASSWORD_LEN];

    let challenge_len = challenge.len().min(CHALLENGE_LEN);
    buf[..challenge_len].copy_from_slice(&challenge[..challenge_len]);

    let password = password.as_bytes();
    let password_len = password.len().min(MAX_PASSWORD_LEN);
    buf[CHALLENGE_LEN..CHALLENGE_LEN + password_len]
        .copy_from_slice(&password[..password_len]);

    let mut digest: [u8; 16] = Md5::digest(buf).into();
    for byte in digest.iter_mut() {
        if *byte == 0 {
            *byte = 1;
        }
    }
    digest
}
