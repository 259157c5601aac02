//! Transducer serialization.
//!
//! Every on-disk transducer starts with an [`FstHeader`] carrying magic
//! bytes, the container type, the arc-type string, and summary fields. A
//! stored transducer is readable iff its arc type matches the weight type
//! requested at deserialisation.
//!
//! # Example
//!
//! ```rust,ignore
//! use libwfst::prelude::*;
//! use std::fs::File;
//!
//! let fst: VectorFst<TropicalWeight> = build();
//! BincodeSerializer::serialize(&fst, File::create("a.fst")?)?;
//! let loaded: VectorFst<TropicalWeight> =
//!     BincodeSerializer::deserialize(File::open("a.fst")?)?;
//! ```

mod bincode_impl;
mod json_impl;

pub use bincode_impl::BincodeSerializer;
pub use json_impl::JsonSerializer;

use crate::fst::{ExpandedFst, Fst, StateId, VectorFst};
use crate::semiring::Semiring;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::io::{Read, Write};

/// Magic value opening every serialized transducer.
pub const FST_MAGIC: u32 = 0x5754_5346; // "FSTW"

/// Header format version written by this crate.
pub const FST_VERSION: u32 = 1;

/// Leading metadata of a serialized transducer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FstHeader {
    /// Magic value; [`FST_MAGIC`] for this crate's containers.
    pub magic: u32,
    /// Container type string (e.g. "vector").
    pub fst_type: String,
    /// Arc type string; must match the requested weight type on read.
    pub arc_type: String,
    /// Format version.
    pub version: u32,
    /// Property bits at write time.
    pub properties: u64,
    /// Start state, if any.
    pub start: Option<StateId>,
    /// Number of states.
    pub num_states: u64,
}

impl FstHeader {
    /// Builds the header for a dense transducer.
    pub fn for_fst<W: Semiring>(fst: &VectorFst<W>) -> Self {
        FstHeader {
            magic: FST_MAGIC,
            fst_type: "vector".to_string(),
            arc_type: W::TYPE_NAME.to_string(),
            version: FST_VERSION,
            properties: fst.properties().0,
            start: fst.start(),
            num_states: fst.num_states() as u64,
        }
    }

    /// Validates magic, version, and arc type against the requested weight.
    pub fn check<W: Semiring>(&self) -> Result<(), SerializationError> {
        if self.magic != FST_MAGIC {
            return Err(SerializationError::BadMagic);
        }
        if self.version > FST_VERSION {
            return Err(SerializationError::UnsupportedVersion(self.version));
        }
        if self.arc_type != W::TYPE_NAME {
            return Err(SerializationError::ArcTypeMismatch {
                found: self.arc_type.clone(),
                requested: W::TYPE_NAME.to_string(),
            });
        }
        Ok(())
    }
}

/// Serializes and deserializes dense transducers in one format.
pub trait FstSerializer {
    /// Writes `fst`, header first, to `writer`.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    fn serialize<W, Out>(fst: &VectorFst<W>, writer: Out) -> Result<(), SerializationError>
    where
        W: Semiring + Serialize,
        Out: Write;

    /// Reads a transducer from `reader`, validating the header.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is corrupt, the format version is
    /// unsupported, or the stored arc type does not match `W`.
    fn deserialize<W, In>(reader: In) -> Result<VectorFst<W>, SerializationError>
    where
        W: Semiring + DeserializeOwned,
        In: Read;
}

/// Errors raised by serialization and deserialization.
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    /// Error during binary encoding or decoding.
    #[error("bincode error")]
    Bincode(#[from] bincode::Error),
    /// Error during JSON encoding or decoding.
    #[error("JSON error")]
    Json(#[from] serde_json::Error),
    /// I/O error.
    #[error("I/O error")]
    Io(#[from] std::io::Error),
    /// The stream does not open with the transducer magic.
    #[error("stream is not a serialized transducer")]
    BadMagic,
    /// The stream was written by a newer format version.
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u32),
    /// The stored arc type differs from the requested one.
    #[error("arc type mismatch: stored `{found}`, requested `{requested}`")]
    ArcTypeMismatch {
        /// Arc type recorded in the header.
        found: String,
        /// Arc type of the weight the caller asked for.
        requested: String,
    },
}
