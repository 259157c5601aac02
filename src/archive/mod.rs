//! Ordered key→transducer archives.
//!
//! An archive stores transducers under string keys in strictly increasing
//! key order. Three container types exist, mirroring their on-disk
//! magic values:
//!
//! - [`ArchiveType::Indexed`] ("sttable"): random access by key,
//! - [`ArchiveType::Sequential`] ("stlist"): sequential iteration,
//! - [`ArchiveType::Single`] ("fst"): one entry, a plain transducer file.
//!
//! Readers auto-detect the container by sniffing the magic.

use crate::fst::VectorFst;
use crate::semiring::Semiring;
use crate::serialization::{BincodeSerializer, FstSerializer, SerializationError, FST_MAGIC};
use serde::{de::DeserializeOwned, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Magic value of indexed archives.
pub const INDEXED_MAGIC: u32 = 0x5754_4254; // "TBWT"
/// Magic value of sequential archives.
pub const SEQUENTIAL_MAGIC: u32 = 0x5754_4C53; // "SLWT"

/// Archive container type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveType {
    /// Indexed table with random access ("sttable").
    Indexed,
    /// Sequential list ("stlist").
    Sequential,
    /// A single transducer file ("fst").
    Single,
}

impl ArchiveType {
    /// The container type string.
    pub fn as_str(self) -> &'static str {
        match self {
            ArchiveType::Indexed => "sttable",
            ArchiveType::Sequential => "stlist",
            ArchiveType::Single => "fst",
        }
    }
}

/// Errors raised by archive operations.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// Underlying serialization failure.
    #[error("serialization error")]
    Serialization(#[from] SerializationError),
    /// Binary encoding failure.
    #[error("bincode error")]
    Bincode(#[from] bincode::Error),
    /// I/O failure.
    #[error("I/O error")]
    Io(#[from] std::io::Error),
    /// Keys must be non-empty and strictly increasing.
    #[error("archive key `{key}` not strictly after `{previous}`")]
    KeyOrder {
        /// The offending key.
        key: String,
        /// The key written before it.
        previous: String,
    },
    /// The file opens with no known archive magic.
    #[error("file is not a transducer archive")]
    BadMagic,
    /// A single-entry archive can hold only one transducer.
    #[error("single-entry archive already holds an entry")]
    SingleEntryFull,
}

/// Writes an archive of transducers in key order.
pub struct ArchiveWriter<W: Semiring + Serialize> {
    writer: BufWriter<File>,
    archive_type: ArchiveType,
    last_key: Option<String>,
    _weight: std::marker::PhantomData<W>,
}

impl<W: Semiring + Serialize> ArchiveWriter<W> {
    /// Creates a new, empty archive at `path`.
    pub fn create(path: impl AsRef<Path>, archive_type: ArchiveType) -> Result<Self, ArchiveError> {
        let mut writer = BufWriter::new(File::create(path)?);
        match archive_type {
            ArchiveType::Indexed => writer.write_all(&INDEXED_MAGIC.to_le_bytes())?,
            ArchiveType::Sequential => writer.write_all(&SEQUENTIAL_MAGIC.to_le_bytes())?,
            // Single archives are plain transducer files; the transducer's
            // own header supplies the magic.
            ArchiveType::Single => {}
        }
        Ok(ArchiveWriter {
            writer,
            archive_type,
            last_key: None,
            _weight: std::marker::PhantomData,
        })
    }

    /// The container type.
    pub fn archive_type(&self) -> ArchiveType {
        self.archive_type
    }

    /// Appends `fst` under `key`. Keys must be non-empty and strictly
    /// increasing; a single-entry archive accepts exactly one entry.
    pub fn add(&mut self, key: &str, fst: &VectorFst<W>) -> Result<(), ArchiveError> {
        let previous = self.last_key.as_deref().unwrap_or("");
        if key.is_empty() || key <= previous {
            return Err(ArchiveError::KeyOrder {
                key: key.to_string(),
                previous: previous.to_string(),
            });
        }
        match self.archive_type {
            ArchiveType::Single => {
                if self.last_key.is_some() {
                    return Err(ArchiveError::SingleEntryFull);
                }
                BincodeSerializer::serialize(fst, &mut self.writer)?;
            }
            ArchiveType::Indexed | ArchiveType::Sequential => {
                bincode::serialize_into(&mut self.writer, &key.to_string())?;
                BincodeSerializer::serialize(fst, &mut self.writer)?;
            }
        }
        self.last_key = Some(key.to_string());
        Ok(())
    }

    /// Flushes buffered output.
    pub fn finish(mut self) -> Result<(), ArchiveError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Reads an archive, positioned on one entry at a time.
pub struct ArchiveReader<W: Semiring + DeserializeOwned> {
    entries: Vec<(String, VectorFst<W>)>,
    position: usize,
    archive_type: ArchiveType,
}

impl<W: Semiring + DeserializeOwned> ArchiveReader<W> {
    /// Opens an archive, detecting its container type from the magic.
    /// The position starts at the first entry.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ArchiveError> {
        let path = path.as_ref();
        let mut reader = BufReader::new(File::open(path)?);
        let mut magic_bytes = [0u8; 4];
        reader.read_exact(&mut magic_bytes)?;
        let magic = u32::from_le_bytes(magic_bytes);

        let archive_type = if magic == INDEXED_MAGIC {
            ArchiveType::Indexed
        } else if magic == SEQUENTIAL_MAGIC {
            ArchiveType::Sequential
        } else if sniff_single(magic) {
            ArchiveType::Single
        } else {
            return Err(ArchiveError::BadMagic);
        };

        let mut entries = Vec::new();
        match archive_type {
            ArchiveType::Single => {
                reader.seek(SeekFrom::Start(0))?;
                let fst = BincodeSerializer::deserialize(&mut reader)?;
                let key = path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_default();
                entries.push((key, fst));
            }
            ArchiveType::Indexed | ArchiveType::Sequential => loop {
                let key: String = match bincode::deserialize_from(&mut reader) {
                    Ok(key) => key,
                    Err(error) => {
                        if is_eof(&error) {
                            break;
                        }
                        return Err(error.into());
                    }
                };
                let fst = BincodeSerializer::deserialize(&mut reader)?;
                entries.push((key, fst));
            },
        }
        Ok(ArchiveReader {
            entries,
            position: 0,
            archive_type,
        })
    }

    /// Opens several archives as one sequence, in the order given. Entries
    /// keep their per-file order; the detected type is the first file's.
    pub fn open_list<P: AsRef<Path>>(paths: &[P]) -> Result<Self, ArchiveError> {
        let mut paths = paths.iter();
        let first = paths.next().ok_or(ArchiveError::BadMagic)?;
        let mut reader = Self::open(first)?;
        for path in paths {
            let mut next = Self::open(path)?;
            reader.entries.append(&mut next.entries);
        }
        Ok(reader)
    }

    /// The detected container type.
    pub fn archive_type(&self) -> ArchiveType {
        self.archive_type
    }

    /// Repositions at the first entry.
    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Positions at the first entry with key ≥ `key`; returns true when an
    /// entry with exactly that key exists.
    ///
    /// In `Single` mode this resets to position 0 regardless of the
    /// argument; do not rely on key-ordered lookup there.
    pub fn find(&mut self, key: &str) -> bool {
        if self.archive_type == ArchiveType::Single {
            self.position = 0;
            return self
                .entries
                .first()
                .is_some_and(|(stored, _)| stored == key);
        }
        self.position = self
            .entries
            .partition_point(|(stored, _)| stored.as_str() < key);
        self.entries
            .get(self.position)
            .is_some_and(|(stored, _)| stored == key)
    }

    /// True when the position is past the last entry.
    pub fn done(&self) -> bool {
        self.position >= self.entries.len()
    }

    /// Advances to the next entry.
    pub fn next_entry(&mut self) {
        self.position += 1;
    }

    /// Key of the current entry.
    pub fn get_key(&self) -> &str {
        &self.entries[self.position].0
    }

    /// Transducer of the current entry.
    pub fn get_fst(&self) -> &VectorFst<W> {
        &self.entries[self.position].1
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the archive holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A single-transducer file opens with the serialized-transducer magic:
/// bincode writes the `u32` magic field of the header first, little-endian.
fn sniff_single(magic: u32) -> bool {
    magic == FST_MAGIC
}

fn is_eof(error: &bincode::Error) -> bool {
    matches!(
        &**error,
        bincode::ErrorKind::Io(io) if io.kind() == std::io::ErrorKind::UnexpectedEof
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fst::{Arc, Fst, MutableFst};
    use crate::semiring::{Semiring, TropicalWeight};

    fn labelled(label: i64) -> VectorFst<TropicalWeight> {
        let mut fst = VectorFst::new();
        let a = fst.add_state();
        let b = fst.add_state();
        fst.set_start(a);
        fst.add_arc(a, Arc::new(label, label, TropicalWeight::one(), b));
        fst.set_final(b, TropicalWeight::one());
        fst
    }

    #[test]
    fn write_find_and_iterate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.far");
        let mut writer = ArchiveWriter::create(&path, ArchiveType::Indexed).unwrap();
        writer.add("alpha", &labelled(1)).unwrap();
        writer.add("beta", &labelled(2)).unwrap();
        writer.add("gamma", &labelled(3)).unwrap();
        writer.finish().unwrap();

        let mut reader = ArchiveReader::<TropicalWeight>::open(&path).unwrap();
        assert_eq!(reader.archive_type(), ArchiveType::Indexed);
        assert_eq!(reader.len(), 3);

        assert!(reader.find("beta"));
        assert_eq!(reader.get_key(), "beta");
        let arc = reader.get_fst().arcs(0).next().unwrap();
        assert_eq!(arc.ilabel, 2);

        // "b" is no exact match but positions at the first key beyond it.
        assert!(!reader.find("b"));
        assert_eq!(reader.get_key(), "beta");

        reader.reset();
        let mut keys = Vec::new();
        while !reader.done() {
            keys.push(reader.get_key().to_string());
            reader.next_entry();
        }
        assert_eq!(keys, ["alpha", "beta", "gamma"]);
    }

    #[test]
    fn rejects_unordered_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.far");
        let mut writer = ArchiveWriter::create(&path, ArchiveType::Sequential).unwrap();
        writer.add("m", &labelled(1)).unwrap();
        assert!(matches!(
            writer.add("m", &labelled(2)),
            Err(ArchiveError::KeyOrder { .. })
        ));
        assert!(matches!(
            writer.add("a", &labelled(2)),
            Err(ArchiveError::KeyOrder { .. })
        ));
        assert!(matches!(
            writer.add("", &labelled(2)),
            Err(ArchiveError::KeyOrder { .. })
        ));
    }

    #[test]
    fn single_mode_find_resets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("only.fst");
        let mut writer = ArchiveWriter::create(&path, ArchiveType::Single).unwrap();
        writer.add("only", &labelled(7)).unwrap();
        assert!(matches!(
            writer.add("second", &labelled(8)),
            Err(ArchiveError::SingleEntryFull)
        ));
        writer.finish().unwrap();

        let mut reader = ArchiveReader::<TropicalWeight>::open(&path).unwrap();
        assert_eq!(reader.archive_type(), ArchiveType::Single);
        reader.next_entry();
        assert!(reader.done());
        // find() in single mode repositions at 0 whatever the key.
        reader.find("zzz");
        assert!(!reader.done());
        assert_eq!(reader.get_fst().arcs(0).next().unwrap().ilabel, 7);
    }

    #[test]
    fn open_list_concatenates_archives() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.far");
        let second = dir.path().join("b.far");
        let mut writer = ArchiveWriter::create(&first, ArchiveType::Sequential).unwrap();
        writer.add("a", &labelled(1)).unwrap();
        writer.finish().unwrap();
        let mut writer = ArchiveWriter::create(&second, ArchiveType::Sequential).unwrap();
        writer.add("b", &labelled(2)).unwrap();
        writer.finish().unwrap();

        let mut reader = ArchiveReader::<TropicalWeight>::open_list(&[first, second]).unwrap();
        assert_eq!(reader.len(), 2);
        assert_eq!(reader.get_key(), "a");
        reader.next_entry();
        assert_eq!(reader.get_key(), "b");
    }

    #[test]
    fn sniffs_container_type() {
        let dir = tempfile::tempdir().unwrap();
        let seq = dir.path().join("seq.far");
        let mut writer = ArchiveWriter::create(&seq, ArchiveType::Sequential).unwrap();
        writer.add("k", &labelled(1)).unwrap();
        writer.finish().unwrap();
        let reader = ArchiveReader::<TropicalWeight>::open(&seq).unwrap();
        assert_eq!(reader.archive_type(), ArchiveType::Sequential);

        let garbage = dir.path().join("garbage");
        std::fs::write(&garbage, b"????not an archive").unwrap();
        assert!(matches!(
            ArchiveReader::<TropicalWeight>::open(&garbage),
            Err(ArchiveError::BadMagic)
        ));
    }
}
