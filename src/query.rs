//! General-query (GenQuery) construction.
//!
//! GenQuery is the catalog query API: a set of selected column ids plus
//! equality conditions, serialized as a `GenQueryInp_PI` packing
//! instruction. Only the handful of columns needed for collection
//! listings is declared here.

use crate::message::xml_escape;

/// Catalog column id of a collection's id.
pub const COL_COLL_ID: i32 = 500;
/// Catalog column id of a collection's absolute name.
pub const COL_COLL_NAME: i32 = 501;
/// Catalog column id of a collection's parent collection name.
pub const COL_COLL_PARENT_NAME: i32 = 502;
/// Catalog column id of a data object's name.
pub const COL_DATA_NAME: i32 = 403;

/// Single listing calls are capped here; continuation is not requested.
const MAX_ROWS: i32 = 500;

/// Builder for one GenQuery input.
#[derive(Debug, Default)]
pub struct Query {
    selects: Vec<i32>,
    conditions: Vec<(i32, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column to the select list.
    pub fn select(mut self, column: i32) -> Self {
        self.selects.push(column);
        self
    }

    /// Add an equality condition on a column.
    pub fn filter(mut self, column: i32, value: &str) -> Self {
        // Single quotes delimit the condition literal; the server sees the
        // value after XML unescaping, so embedded quotes must be doubled.
        let value = value.replace('\'', "''");
        self.conditions
            .push((column, format!("= '{}'", xml_escape(&value))));
        self
    }

    /// Serialize to `GenQueryInp_PI` XML: all select indexes, then their
    /// aggregation flags, then all condition indexes, then their values.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(512);
        xml.push_str("<GenQueryInp_PI>");
        xml.push_str(&format!("<maxRows>{}</maxRows>", MAX_ROWS));
        xml.push_str("<continueInx>0</continueInx>");
        xml.push_str("<partialStartIndex>0</partialStartIndex>");
        xml.push_str("<options>0</options>");
        xml.push_str("<KeyValPair_PI><ssLen>0</ssLen></KeyValPair_PI>");

        xml.push_str(&format!("<InxIvalPair_PI><iiLen>{}</iiLen>", self.selects.len()));
        for column in &self.selects {
            xml.push_str(&format!("<inx>{}</inx>", column));
        }
        for _ in &self.selects {
            xml.push_str("<ivalue>1</ivalue>");
        }
        xml.push_str("</InxIvalPair_PI>");

        xml.push_str(&format!("<InxValPair_PI><isLen>{}</isLen>", self.conditions.len()));
        for (column, _) in &self.conditions {
            xml.push_str(&format!("<inx>{}</inx>", column));
        }
        for (_, condition) in &self.conditions {
            xml.push_str(&format!("<svalue>{}</svalue>", condition));
        }
        xml.push_str("</InxValPair_PI>");

        xml.push_str("</GenQueryInp_PI>");
        xml
    }
}
