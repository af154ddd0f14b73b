//! Wire framing for the iRODS XML protocol.
//!
//! Every message on the control connection is a 4-byte big-endian length,
//! followed by a `MsgHeader_PI` XML header of that length, followed by the
//! message body, error stack and binary section whose sizes the header
//! announces. This client always speaks the XML packing (`irodsProt = 1`),
//! so bodies are XML too.

use std::io::{Read, Write};

use log::warn;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::Error;

/// Header type opening a connection, carries a `StartupPack_PI` body.
pub const MSG_CONNECT: &str = "RODS_CONNECT";
/// Header type for catalog API calls, the API number rides in `intInfo`.
pub const MSG_API_REQ: &str = "RODS_API_REQ";
/// Header type closing the connection, no body and no reply.
pub const MSG_DISCONNECT: &str = "RODS_DISCONNECT";

/// API number of the native-auth challenge request.
pub const API_AUTH_REQUEST: i32 = 703;
/// API number of the native-auth challenge response.
pub const API_AUTH_RESPONSE: i32 = 704;
/// API number of a general catalog query.
pub const API_GEN_QUERY: i32 = 702;

// Caps on announced section lengths, anything bigger is a framing error.
const MAX_HEADER_LEN: usize = 16 * 1024;
const MAX_SECTION_LEN: usize = 32 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct Header {
    #[serde(rename = "type")]
    pub msg_type: String,
    #[serde(rename = "msgLen")]
    pub msg_len: usize,
    #[serde(rename = "errorLen")]
    pub error_len: usize,
    #[serde(rename = "bsLen")]
    pub bs_len: usize,
    #[serde(rename = "intInfo")]
    pub int_info: i32,
}

/// One full message received from the server.
#[derive(Debug)]
pub struct Reply {
    pub header: Header,
    pub body: Vec<u8>,
}

impl Reply {
    /// Decode the XML body into a packing-instruction struct.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let text = std::str::from_utf8(&self.body)
            .map_err(|_| Error::Protocol("reply body is not valid UTF-8".to_string()))?;
        Ok(quick_xml::de::from_str(text)?)
    }
}

/// Write one framed message. The error and binary sections are always
/// empty on the client side of the operations this crate issues.
pub fn write_message(
    writer: &mut impl Write,
    msg_type: &str,
    int_info: i32,
    body: &str,
) -> Result<(), Error> {
    let header = format!(
        "<MsgHeader_PI><type>{}</type><msgLen>{}</msgLen>\
         <errorLen>0</errorLen><bsLen>0</bsLen><intInfo>{}</intInfo></MsgHeader_PI>",
        msg_type,
        body.len(),
        int_info
    );
    writer.write_all(&(header.len() as u32).to_be_bytes())?;
    writer.write_all(header.as_bytes())?;
    writer.write_all(body.as_bytes())?;
    writer.flush()?;

    Ok(())
}

/// Read one framed message, draining the error stack and binary section.
pub fn read_message(reader: &mut impl Read) -> Result<Reply, Error> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let header_len = u32::from_be_bytes(len_buf) as usize;
    if header_len == 0 || header_len > MAX_HEADER_LEN {
        return Err(Error::Protocol(format!(
            "implausible header length {}",
            header_len
        )));
    }

    let mut header_buf = vec![0u8; header_len];
    reader.read_exact(&mut header_buf)?;
    let header_text = std::str::from_utf8(&header_buf)
        .map_err(|_| Error::Protocol("header is not valid UTF-8".to_string()))?;
    let header: Header = quick_xml::de::from_str(header_text)?;

    if header.msg_len > MAX_SECTION_LEN
        || header.error_len > MAX_SECTION_LEN
        || header.bs_len > MAX_SECTION_LEN
    {
        return Err(Error::Protocol(format!(
            "implausible section lengths in header: {:?}",
            header
        )));
    }

    let mut body = vec![0u8; header.msg_len];
    reader.read_exact(&mut body)?;

    if header.error_len > 0 {
        let mut error_buf = vec![0u8; header.error_len];
        reader.read_exact(&mut error_buf)?;
        warn!(
            "server attached an error stack of {} bytes to a {} reply",
            header.error_len, header.msg_type
        );
    }
    if header.bs_len > 0 {
        let mut bs_buf = vec![0u8; header.bs_len];
        reader.read_exact(&mut bs_buf)?;
    }

    Ok(Reply { header, body })
}

/// Escape a value for embedding in an XML element body.
pub fn xml_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for character in value.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// `Version_PI`, the reply to `RODS_CONNECT`.
#[derive(Debug, Deserialize)]
pub struct Version {
    pub status: i32,
    #[serde(rename = "relVersion")]
    pub rel_version: String,
    #[serde(rename = "apiVersion")]
    pub api_version: String,
}

/// `authRequestOut_PI`, the challenge is base64 over 64 raw bytes.
#[derive(Debug, Deserialize)]
pub struct AuthChallenge {
    pub challenge: String,
}

/// `GenQueryOut_PI`, one column of results per `SqlResult_PI`.
#[derive(Debug, Deserialize)]
pub struct GenQueryOut {
    #[serde(rename = "rowCnt")]
    pub row_cnt: i32,
    #[serde(rename = "attriCnt")]
    pub attri_cnt: i32,
    #[serde(rename = "SqlResult_PI", default)]
    pub results: Vec<SqlResult>,
}

#[derive(Debug, Deserialize)]
pub struct SqlResult {
    #[serde(rename = "attriInx")]
    pub attri_inx: i32,
    #[serde(rename = "reslen")]
    pub res_len: i32,
    #[serde(rename = "value", default)]
    pub values: Vec<String>,
}

impl GenQueryOut {
    /// The values of one selected column, in server-returned row order.
    pub fn column(&self, column: i32) -> Option<&[String]> {
        self.results
            .iter()
            .find(|result| result.attri_inx == column)
            .map(|result| result.values.as_slice())
    }
}
