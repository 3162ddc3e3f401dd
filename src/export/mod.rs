//! Mesh fragment encodings.
//!
//! This module provides encoders for the fragment formats written to storage.

pub mod draco;
pub mod frags;
pub mod precomputed;

pub use draco::DracoEncoder;
pub use frags::{read_batch, write_batch};

use crate::error::{MeshTaskError, Result};
use crate::mesher::Mesh;
use crate::quantization::DracoSettings;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fragment encoding selected per task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Encoding {
    #[default]
    Precomputed,
    Draco,
}

impl Encoding {
    pub const SUPPORTED: [&'static str; 2] = ["precomputed", "draco"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Precomputed => "precomputed",
            Encoding::Draco => "draco",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = MeshTaskError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "precomputed" => Ok(Encoding::Precomputed),
            "draco" => Ok(Encoding::Draco),
            other => Err(MeshTaskError::UnsupportedEncoding {
                requested: other.to_string(),
                supported: Encoding::SUPPORTED.join(", "),
            }),
        }
    }
}

impl TryFrom<String> for Encoding {
    type Error = MeshTaskError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Encoding> for String {
    fn from(encoding: Encoding) -> Self {
        encoding.as_str().to_string()
    }
}

/// A ready-to-use encoder for one chunk.
#[derive(Clone, Copy)]
pub enum MeshEncoder<'a> {
    Precomputed,
    Draco {
        encoder: &'a dyn DracoEncoder,
        settings: DracoSettings,
    },
}

impl<'a> MeshEncoder<'a> {
    pub fn encoding(&self) -> Encoding {
        match self {
            MeshEncoder::Precomputed => Encoding::Precomputed,
            MeshEncoder::Draco { .. } => Encoding::Draco,
        }
    }

    pub fn encode(&self, mesh: &Mesh) -> Result<Vec<u8>> {
        match self {
            MeshEncoder::Precomputed => Ok(precomputed::encode(mesh)),
            MeshEncoder::Draco { encoder, settings } => draco::encode(*encoder, mesh, settings),
        }
    }
}

impl fmt::Debug for MeshEncoder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeshEncoder::Precomputed => f.write_str("Precomputed"),
            MeshEncoder::Draco { settings, .. } => {
                f.debug_struct("Draco").field("settings", settings).finish()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_parse() {
        assert_eq!("draco".parse::<Encoding>().unwrap(), Encoding::Draco);
        let err = "obj".parse::<Encoding>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Encoding obj is not supported. Options: precomputed, draco"
        );
    }

    #[test]
    fn test_encoding_serde() {
        let e: Encoding = serde_json::from_str("\"precomputed\"").unwrap();
        assert_eq!(e, Encoding::Precomputed);
        assert!(serde_json::from_str::<Encoding>("\"ply\"").is_err());
        assert_eq!(serde_json::to_string(&Encoding::Draco).unwrap(), "\"draco\"");
    }
}
