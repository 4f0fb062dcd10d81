//! Request trace propagation.
//!
//! Requests routed through the platform router carry an `X-Vcap-Request-Id`
//! header holding a UUID. With its hyphens removed the UUID is read as a
//! 128-bit trace id; a fresh random span id is paired with it and both are
//! attached to a logger's data as `trace-id` / `span-id`.

use std::fmt;
use std::str::FromStr;

use crate::record::Data;

/// Header carrying the request id.
pub const REQUEST_ID_HEADER: &str = "X-Vcap-Request-Id";

/// A 64- or 128-bit trace identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId {
    /// Upper 64 bits; zero for 64-bit ids.
    pub high: u64,
    /// Lower 64 bits.
    pub low: u64,
}

/// Why a header value could not be read as a trace id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TraceIdError {
    /// No hex digits at all
    #[error("trace id is empty")]
    Empty,
    /// More than 32 hex digits
    #[error("trace id has {0} hex digits, at most 32 allowed")]
    TooLong(usize),
    /// Something other than a hex digit
    #[error("trace id contains non-hex character {0:?}")]
    InvalidDigit(char),
}

impl FromStr for TraceId {
    type Err = TraceIdError;

    fn from_str(hex: &str) -> Result<Self, Self::Err> {
        if let Some(bad) = hex.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(TraceIdError::InvalidDigit(bad));
        }
        match hex.len() {
            0 => Err(TraceIdError::Empty),
            len @ 33.. => Err(TraceIdError::TooLong(len)),
            len @ 17..=32 => {
                let (high, low) = hex.split_at(len - 16);
                Ok(Self {
                    high: parse_hex(high),
                    low: parse_hex(low),
                })
            }
            _ => Ok(Self {
                high: 0,
                low: parse_hex(hex),
            }),
        }
    }
}

// Input is at most 16 ASCII hex digits, so parsing cannot fail.
fn parse_hex(digits: &str) -> u64 {
    u64::from_str_radix(digits, 16).unwrap_or_default()
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.high == 0 {
            write!(f, "{:016x}", self.low)
        } else {
            write!(f, "{:016x}{:016x}", self.high, self.low)
        }
    }
}

/// A 64-bit span identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanId(pub u64);

impl SpanId {
    /// Generates a random, non-zero span id.
    #[must_use]
    pub fn random() -> Self {
        loop {
            let id: u64 = rand::random();
            if id != 0 {
                return Self(id);
            }
        }
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Builds the `trace-id` / `span-id` data for a request id header value.
///
/// Returns `None` when the header is absent or not a valid trace id.
#[must_use]
pub fn trace_data(request_id: Option<&str>) -> Option<Data> {
    let header = request_id.filter(|h| !h.is_empty())?;
    let trace_id: TraceId = header.replace('-', "").parse().ok()?;
    Some(
        Data::new()
            .with("trace-id", trace_id.to_string())
            .with("span-id", SpanId::random().to_string()),
    )
}
