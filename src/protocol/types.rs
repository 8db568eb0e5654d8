//! Wire types shared with the coordination server.
//!
//! Big integers travel as lowercase hex strings so problem sizes are not
//! bounded by any fixed-width integer type.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::curve::Curve;
use crate::error::ClientError;

/// Required number of jump table entries; the walk indexes them with the low
/// five bits of the current x coordinate.
pub const JUMP_TABLE_SIZE: usize = 32;

pub const STATUS_RUNNING: u32 = 1;
pub const STATUS_STOPPED: u32 = 2;

/// Global run status reported by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    Stopped,
    /// Any unrecognized status code; treated as "not yet running".
    Unknown(u32),
}

impl SessionStatus {
    pub fn from_code(code: u32) -> Self {
        match code {
            STATUS_RUNNING => SessionStatus::Running,
            STATUS_STOPPED => SessionStatus::Stopped,
            other => SessionStatus::Unknown(other),
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            SessionStatus::Running => STATUS_RUNNING,
            SessionStatus::Stopped => STATUS_STOPPED,
            SessionStatus::Unknown(code) => *code,
        }
    }
}

/// Hex-string serde for [`BigUint`] wire fields.
pub mod hex_uint {
    use num_bigint::BigUint;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_str_radix(16))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BigUint, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let digits = raw.trim_start_matches("0x");
        BigUint::parse_bytes(digits.as_bytes(), 16)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid hex integer: {raw}")))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: u32,
}

/// One precomputed walk point (an R point).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JumpEntry {
    #[serde(with = "hex_uint")]
    pub x: BigUint,
    #[serde(with = "hex_uint")]
    pub y: BigUint,
}

/// Problem parameters plus jump table, as returned by the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamsMessage {
    /// Curve prime modulus
    #[serde(with = "hex_uint")]
    pub p: BigUint,
    /// Group order
    #[serde(with = "hex_uint")]
    pub n: BigUint,
    /// Curve coefficient a
    #[serde(with = "hex_uint")]
    pub a: BigUint,
    /// Curve coefficient b
    #[serde(with = "hex_uint")]
    pub b: BigUint,
    /// Generator point G
    #[serde(with = "hex_uint")]
    pub gx: BigUint,
    #[serde(with = "hex_uint")]
    pub gy: BigUint,
    /// Target point Q = d·G
    #[serde(with = "hex_uint")]
    pub qx: BigUint,
    #[serde(with = "hex_uint")]
    pub qy: BigUint,
    /// Distinguished-bit threshold
    pub d_bits: u32,
    pub jump_table: Vec<JumpEntry>,
}

impl ParamsMessage {
    /// Split into the immutable problem parameters and the jump table,
    /// validating the table size.
    pub fn into_problem(self) -> Result<(ProblemParameters, JumpTable), ClientError> {
        if self.jump_table.len() != JUMP_TABLE_SIZE {
            return Err(ClientError::Validation(format!(
                "expected {} jump table entries, got {}",
                JUMP_TABLE_SIZE,
                self.jump_table.len()
            )));
        }

        let params = ProblemParameters {
            p: self.p,
            n: self.n,
            a: self.a,
            b: self.b,
            gx: self.gx,
            gy: self.gy,
            qx: self.qx,
            qy: self.qy,
            d_bits: self.d_bits,
        };

        Ok((params, JumpTable::new(self.jump_table)))
    }
}

/// Problem parameters, immutable once fetched for a given problem id.
#[derive(Debug, Clone)]
pub struct ProblemParameters {
    pub p: BigUint,
    pub n: BigUint,
    pub a: BigUint,
    pub b: BigUint,
    pub gx: BigUint,
    pub gy: BigUint,
    pub qx: BigUint,
    pub qy: BigUint,
    pub d_bits: u32,
}

impl ProblemParameters {
    pub fn curve(&self) -> Curve {
        Curve::new(self.p.clone(), self.a.clone(), self.b.clone())
    }
}

/// The precomputed R points defining the pseudorandom walk step. Handed to
/// the search engine opaquely; the orchestrator never interprets it.
#[derive(Debug, Clone)]
pub struct JumpTable {
    entries: Vec<JumpEntry>,
}

impl JumpTable {
    pub fn new(entries: Vec<JumpEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[JumpEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A verified walk endpoint queued for submission. The starting point of the
/// walk is a·G + b·Q; (x, y) is the distinguished endpoint after `length`
/// steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistinguishedPoint {
    #[serde(with = "hex_uint")]
    pub a: BigUint,
    #[serde(with = "hex_uint")]
    pub b: BigUint,
    #[serde(with = "hex_uint")]
    pub x: BigUint,
    #[serde(with = "hex_uint")]
    pub y: BigUint,
    pub length: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub points: Vec<DistinguishedPoint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_code() {
        assert_eq!(SessionStatus::from_code(1), SessionStatus::Running);
        assert_eq!(SessionStatus::from_code(2), SessionStatus::Stopped);
        assert_eq!(SessionStatus::from_code(0), SessionStatus::Unknown(0));
        assert_eq!(SessionStatus::from_code(99), SessionStatus::Unknown(99));
    }

    #[test]
    fn test_distinguished_point_hex_roundtrip() {
        let point = DistinguishedPoint {
            a: BigUint::from(0xdeadbeefu32),
            b: BigUint::from(7u32),
            x: BigUint::parse_bytes(b"ffffffffffffffffffffffffffffff", 16).unwrap(),
            y: BigUint::from(0u32),
            length: 4096,
        };

        let json = serde_json::to_string(&point).unwrap();
        assert!(json.contains("\"deadbeef\""));
        let back: DistinguishedPoint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, point);
    }

    #[test]
    fn test_hex_accepts_0x_prefix() {
        let entry: JumpEntry = serde_json::from_str(r#"{"x":"0x1f","y":"a"}"#).unwrap();
        assert_eq!(entry.x, BigUint::from(0x1fu32));
        assert_eq!(entry.y, BigUint::from(0xau32));
    }

    #[test]
    fn test_params_require_full_jump_table() {
        let msg = ParamsMessage {
            p: BigUint::from(17u32),
            n: BigUint::from(19u32),
            a: BigUint::from(2u32),
            b: BigUint::from(2u32),
            gx: BigUint::from(5u32),
            gy: BigUint::from(1u32),
            qx: BigUint::from(6u32),
            qy: BigUint::from(3u32),
            d_bits: 2,
            jump_table: vec![
                JumpEntry {
                    x: BigUint::from(5u32),
                    y: BigUint::from(1u32),
                };
                7
            ],
        };

        let err = msg.into_problem().unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }
}
