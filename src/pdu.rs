//! Protocol data units as seen by the translation core.
//!
//! The core never produces PDUs; it consumes what a [`Scraper`](crate::scraper::Scraper)
//! returns from point queries and walks.

use crate::error::ErrorStatus;
use crate::oid::Oid;
use crate::value::Value;

/// A (name, value) pair returned by the agent. The value variant is the type tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Pdu {
    pub name: Oid,
    pub value: Value,
}

impl Pdu {
    pub fn new(name: Oid, value: impl Into<Value>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }

    /// True when the agent reported that the requested instance is absent.
    pub fn is_missing(&self) -> bool {
        matches!(self.value, Value::NoSuchObject | Value::NoSuchInstance)
    }
}

/// Response to a point query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Packet {
    pub error_status: ErrorStatus,
    /// 1-based index of the variable the status refers to, 0 when none.
    pub error_index: u32,
    pub variables: Vec<Pdu>,
}

impl Packet {
    /// A successful response carrying `variables`.
    pub fn ok(variables: Vec<Pdu>) -> Self {
        Self {
            error_status: ErrorStatus::NO_ERROR,
            error_index: 0,
            variables,
        }
    }

    /// An error response with no usable variables.
    pub fn error(status: ErrorStatus, index: u32) -> Self {
        Self {
            error_status: status,
            error_index: index,
            variables: Vec::new(),
        }
    }
}
