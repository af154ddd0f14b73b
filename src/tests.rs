//! Tests for the protocol plumbing: argument parsing, message framing,
//! reply decoding, query serialization and the auth digest.

use std::io::Cursor;

use crate::client::challenge_response;
use crate::error::Error;
use crate::error_code::{ErrorCode, ErrorCodeKind};
use crate::lister::{ConnectionTarget, Irods, ListError, Remote, DEFAULT_PORT};
use crate::message::{
    read_message, write_message, xml_escape, GenQueryOut, Header, Version, MSG_API_REQ,
};
use crate::query::{Query, COL_COLL_NAME, COL_DATA_NAME};

fn frame(msg_type: &str, int_info: i32, body: &str, error: &str) -> Vec<u8> {
    let header = format!(
        "<MsgHeader_PI><type>{}</type><msgLen>{}</msgLen>\
         <errorLen>{}</errorLen><bsLen>0</bsLen><intInfo>{}</intInfo></MsgHeader_PI>",
        msg_type,
        body.len(),
        error.len(),
        int_info
    );
    let mut bytes = (header.len() as u32).to_be_bytes().to_vec();
    bytes.extend_from_slice(header.as_bytes());
    bytes.extend_from_slice(body.as_bytes());
    bytes.extend_from_slice(error.as_bytes());
    bytes
}

#[test]
fn test_host_port_split() {
    let target = ConnectionTarget::parse("data.example.org:1248", "tempZone");

    assert_eq!(target.host, "data.example.org");
    assert_eq!(target.port, 1248);
    assert_eq!(target.zone, "tempZone");
}

#[test]
fn test_port_defaults_without_colon() {
    let target = ConnectionTarget::parse("data.example.org", "tempZone");

    assert_eq!(target.host, "data.example.org");
    assert_eq!(target.port, DEFAULT_PORT);
}

#[test]
fn test_port_defaults_on_zero() {
    let target = ConnectionTarget::parse("data.example.org:0", "tempZone");

    assert_eq!(target.port, DEFAULT_PORT);
}

#[test]
fn test_port_defaults_on_garbage() {
    // A negative or non-numeric port cannot be used, fall back.
    assert_eq!(
        ConnectionTarget::parse("data.example.org:-5", "z").port,
        DEFAULT_PORT
    );
    assert_eq!(
        ConnectionTarget::parse("data.example.org:irods", "z").port,
        DEFAULT_PORT
    );
}

#[test]
fn test_host_port_trimming() {
    let target = ConnectionTarget::parse(" data.example.org : 1248 ", "z");

    assert_eq!(target.host, "data.example.org");
    assert_eq!(target.port, 1248);
}

#[test]
fn test_header_decoding() {
    let text = "<MsgHeader_PI><type>RODS_API_REPLY</type><msgLen>42</msgLen>\
                <errorLen>0</errorLen><bsLen>7</bsLen><intInfo>-808000</intInfo></MsgHeader_PI>";
    let header: Header = quick_xml::de::from_str(text).unwrap();

    assert_eq!(header.msg_type, "RODS_API_REPLY");
    assert_eq!(header.msg_len, 42);
    assert_eq!(header.error_len, 0);
    assert_eq!(header.bs_len, 7);
    assert_eq!(header.int_info, -808000);
}

#[test]
fn test_message_round_trip() -> Result<(), Error> {
    let mut bytes = Vec::new();
    write_message(&mut bytes, MSG_API_REQ, 702, "<GenQueryInp_PI></GenQueryInp_PI>")?;

    let reply = read_message(&mut Cursor::new(bytes))?;
    assert_eq!(reply.header.msg_type, MSG_API_REQ);
    assert_eq!(reply.header.int_info, 702);
    assert_eq!(reply.body, b"<GenQueryInp_PI></GenQueryInp_PI>");

    Ok(())
}

#[test]
fn test_error_stack_is_drained() -> Result<(), Error> {
    let body = "<Version_PI><status>0</status><relVersion>rods4.3.2</relVersion>\
                <apiVersion>d</apiVersion></Version_PI>";
    let mut bytes = frame("RODS_VERSION", 0, body, "<RError_PI></RError_PI>");
    // A second message right behind the first must still be readable.
    bytes.extend_from_slice(&frame("RODS_API_REPLY", 0, "", ""));

    let mut cursor = Cursor::new(bytes);
    let first = read_message(&mut cursor)?;
    let version: Version = first.parse()?;
    assert_eq!(version.status, 0);
    assert_eq!(version.rel_version, "rods4.3.2");

    let second = read_message(&mut cursor)?;
    assert_eq!(second.header.msg_type, "RODS_API_REPLY");

    Ok(())
}

#[test]
fn test_implausible_header_length_is_rejected() {
    let mut bytes = u32::MAX.to_be_bytes().to_vec();
    bytes.extend_from_slice(b"not a header");

    let result = read_message(&mut Cursor::new(bytes));
    assert!(matches!(result, Err(Error::Protocol(_))));
}

#[test]
fn test_gen_query_out_decoding() -> Result<(), Error> {
    let text = "<GenQueryOut_PI><rowCnt>2</rowCnt><attriCnt>1</attriCnt>\
                <continueInx>0</continueInx><totalRowCount>0</totalRowCount>\
                <SqlResult_PI><attriInx>403</attriInx><reslen>64</reslen>\
                <value>a.txt</value><value>b.txt</value></SqlResult_PI>\
                </GenQueryOut_PI>";
    let out: GenQueryOut = quick_xml::de::from_str(text)?;

    assert_eq!(out.row_cnt, 2);
    assert_eq!(out.attri_cnt, 1);
    assert_eq!(
        out.column(COL_DATA_NAME),
        Some(&["a.txt".to_string(), "b.txt".to_string()][..])
    );
    assert_eq!(out.column(COL_COLL_NAME), None);

    Ok(())
}

#[test]
fn test_query_serialization() {
    let xml = Query::new()
        .select(COL_DATA_NAME)
        .filter(COL_COLL_NAME, "/tempZone/home/rods")
        .to_xml();

    assert!(xml.starts_with("<GenQueryInp_PI>"));
    assert!(xml.contains("<maxRows>500</maxRows>"));
    assert!(xml.contains("<iiLen>1</iiLen><inx>403</inx><ivalue>1</ivalue>"));
    assert!(xml.contains("<isLen>1</isLen><inx>501</inx>"));
    assert!(xml.contains("<svalue>= '/tempZone/home/rods'</svalue>"));
}

#[test]
fn test_query_escapes_values() {
    let xml = Query::new()
        .select(COL_DATA_NAME)
        .filter(COL_COLL_NAME, "/zone/a<b&c")
        .to_xml();

    assert!(xml.contains("<svalue>= '/zone/a&lt;b&amp;c'</svalue>"));
}

#[test]
fn test_query_doubles_embedded_quotes() {
    // After XML unescaping the server must see = '/zone/o''brien',
    // otherwise the quote would terminate the condition literal.
    let xml = Query::new()
        .select(COL_DATA_NAME)
        .filter(COL_COLL_NAME, "/zone/o'brien")
        .to_xml();

    assert!(xml.contains("<svalue>= '/zone/o&apos;&apos;brien'</svalue>"));
}

#[test]
fn test_real_client_fits_the_session_seam() {
    // The binary hands `Irods` to the listing flow; the bound fails to
    // hold if `Session` stops implementing the session trait.
    fn assert_remote<R: Remote>(_remote: &R) {}
    assert_remote(&Irods);
}

#[test]
fn test_xml_escaping() {
    assert_eq!(xml_escape("plain"), "plain");
    assert_eq!(
        xml_escape(r#"<a & 'b' "c">"#),
        "&lt;a &amp; &apos;b&apos; &quot;c&quot;&gt;"
    );
}

#[test]
fn test_error_code_classification() {
    assert_eq!(
        ErrorCode::parse(-808000).kind,
        ErrorCodeKind::CatNoRowsFound
    );
    // Embedded errno in the low digits does not change the kind.
    assert_eq!(
        ErrorCode::parse(-808123).kind,
        ErrorCodeKind::CatNoRowsFound
    );
    assert_eq!(
        ErrorCode::parse(-826000).kind,
        ErrorCodeKind::CatInvalidAuthentication
    );
    assert_eq!(ErrorCode::parse(-1).kind, ErrorCodeKind::Unknown);

    assert_eq!(
        ErrorCode::parse(-808004).to_string(),
        "CAT_NO_ROWS_FOUND (-808004)"
    );
}

#[test]
fn test_challenge_digest() {
    let challenge = [7u8; 64];
    let digest = challenge_response(&challenge, "rods");

    // Deterministic, 16 bytes, never contains a NUL.
    assert_eq!(digest, challenge_response(&challenge, "rods"));
    assert!(digest.iter().all(|byte| *byte != 0));

    // The password is significant only up to 50 bytes.
    let long = "x".repeat(80);
    let truncated = &long[..50];
    assert_eq!(
        challenge_response(&challenge, &long),
        challenge_response(&challenge, truncated)
    );
    assert_ne!(
        challenge_response(&challenge, "rods"),
        challenge_response(&challenge, "word")
    );
}

#[test]
fn test_diagnostic_messages() {
    assert_eq!(
        ListError::Usage { given: 2 }.to_string(),
        "Arguments not given correctly (given = 2)"
    );
    assert_eq!(ListError::MissingHost.to_string(), "iRODS HOST is not given");
    assert_eq!(ListError::MissingZone.to_string(), "iRODS ZONE is not given");
    assert_eq!(ListError::MissingUser.to_string(), "iRODS USER is not given");
    assert_eq!(
        ListError::MissingPassword.to_string(),
        "iRODS PASSWORD is not given"
    );
    assert_eq!(ListError::MissingPath.to_string(), "iRODS PATH is not given");
    assert_eq!(
        ListError::PathNotFound("/some/missing/dir".to_string()).to_string(),
        "Could not list a path /some/missing/dir"
    );
}
