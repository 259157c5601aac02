//! Binary serializer.
//!
//! Fast, space-efficient encoding: the bincode header record followed by
//! the bincode state table.

use super::{FstHeader, FstSerializer, SerializationError};
use crate::fst::VectorFst;
use crate::semiring::Semiring;
use serde::{de::DeserializeOwned, Serialize};
use std::io::{Read, Write};

/// Bincode-based transducer serializer.
pub struct BincodeSerializer;

impl FstSerializer for BincodeSerializer {
    fn serialize<W, Out>(fst: &VectorFst<W>, mut writer: Out) -> Result<(), SerializationError>
    where
        W: Semiring + Serialize,
        Out: Write,
    {
        let header = FstHeader::for_fst(fst);
        bincode::serialize_into(&mut writer, &header)?;
        bincode::serialize_into(&mut writer, fst)?;
        Ok(())
    }

    fn deserialize<W, In>(mut reader: In) -> Result<VectorFst<W>, SerializationError>
    where
        W: Semiring + DeserializeOwned,
        In: Read,
    {
        let header: FstHeader = bincode::deserialize_from(&mut reader)?;
        header.check::<W>()?;
        let fst: VectorFst<W> = bincode::deserialize_from(&mut reader)?;
        Ok(fst)
    }
}
