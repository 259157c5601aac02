//! JSON serializer, for debugging and interchange.

use super::{FstHeader, FstSerializer, SerializationError};
use crate::fst::VectorFst;
use crate::semiring::Semiring;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::io::{Read, Write};

#[derive(Serialize, Deserialize)]
#[serde(bound(
    serialize = "W: Semiring + Serialize",
    deserialize = "W: Semiring + DeserializeOwned"
))]
struct Container<W: Semiring> {
    header: FstHeader,
    fst: VectorFst<W>,
}

/// JSON-based transducer serializer.
pub struct JsonSerializer;

impl FstSerializer for JsonSerializer {
    fn serialize<W, Out>(fst: &VectorFst<W>, writer: Out) -> Result<(), SerializationError>
    where
        W: Semiring + Serialize,
        Out: Write,
    {
        let container = Container {
            header: FstHeader::for_fst(fst),
            fst: fst.clone(),
        };
        serde_json::to_writer(writer, &container)?;
        Ok(())
    }

    fn deserialize<W, In>(reader: In) -> Result<VectorFst<W>, SerializationError>
    where
        W: Semiring + DeserializeOwned,
        In: Read,
    {
        let container: Container<W> = serde_json::from_reader(reader)?;
        container.header.check::<W>()?;
        Ok(container.fst)
    }
}
