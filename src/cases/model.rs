//! Case definition types
//!
//! Defines the data structures for deserializing JSON case suites.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Header name to its ordered list of values
pub type Headers = BTreeMap<String, Vec<String>>;

/// One declarative test scenario
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Case {
    /// Identifies the case in reports
    #[serde(rename = "case_name")]
    pub name: String,
    /// Statements establishing and reverting database state
    pub database: Fixture,
    /// Request sent to the server under test
    pub request: Request,
    /// Response the server is expected to return
    pub response: ExpectedResponse,
}

/// Fixture statements run around a case
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Fixture {
    /// Run in order before the request
    pub set_up: Vec<String>,
    /// Run in order after the case, whatever its outcome
    pub tear_down: Vec<String>,
}

/// Request to make for a case
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Request {
    /// HTTP method; empty means GET
    pub method: String,
    /// Path appended to the server address
    pub path: String,
    /// Query parameters
    pub query: BTreeMap<String, String>,
    /// JSON body; `None` sends no body
    pub body: Option<Value>,
    /// Request headers
    #[serde(rename = "header")]
    pub headers: Headers,
}

/// Expected response of a case
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ExpectedResponse {
    /// Expected status code
    pub code: u16,
    /// Expected JSON body, compared structurally
    pub body: Value,
    /// Expected headers
    #[serde(rename = "header")]
    pub headers: Headers,
}
