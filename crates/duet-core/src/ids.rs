//! Opaque identifiers for participants and sessions.
//!
//! Both are 16 random bytes, rendered as lowercase hex on the wire and in
//! logs. 128 bits from the thread CSPRNG keeps identifiers unique for the
//! lifetime of a process without any bookkeeping.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Identifier length in bytes.
pub const ID_LENGTH: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("invalid hex")]
    InvalidHex,
    #[error("identifier must be 16 bytes, got {0}")]
    WrongLength(usize),
}

fn parse_bytes(hex_str: &str) -> Result<[u8; ID_LENGTH], IdError> {
    let bytes = hex::decode(hex_str).map_err(|_| IdError::InvalidHex)?;
    if bytes.len() != ID_LENGTH {
        return Err(IdError::WrongLength(bytes.len()));
    }
    let mut arr = [0u8; ID_LENGTH];
    arr.copy_from_slice(&bytes);
    Ok(arr)
}

macro_rules! opaque_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name([u8; ID_LENGTH]);

        impl $name {
            /// Draw a fresh random identifier.
            pub fn generate() -> Self {
                Self(rand::thread_rng().gen())
            }

            pub fn from_bytes(bytes: [u8; ID_LENGTH]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; ID_LENGTH] {
                &self.0
            }

            /// Parse the hex form produced by `Display`.
            pub fn parse(hex_str: &str) -> Result<Self, IdError> {
                parse_bytes(hex_str).map(Self)
            }

            /// First 8 hex characters, for log lines.
            pub fn short(&self) -> String {
                hex::encode(&self.0[..4])
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&hex::encode(self.0))
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::parse(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

opaque_id!(
    /// Assigned to a connection when it registers with a broker.
    ParticipantId
);

opaque_id!(
    /// Created by the matching engine when two participants are paired.
    SessionId
);
