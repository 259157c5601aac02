//! File round trips for serialized transducers and archives.

#![cfg(feature = "serialization")]

use libwfst::prelude::*;
use std::fs::File;

fn sample(seed: i64) -> VectorFst<TropicalWeight> {
    let mut fst = VectorFst::new();
    for _ in 0..3 {
        fst.add_state();
    }
    fst.set_start(0);
    fst.add_arc(0, Arc::new(seed, seed + 1, TropicalWeight::new(0.5), 1));
    fst.add_arc(1, Arc::new(seed + 2, seed + 3, TropicalWeight::new(0.25), 2));
    fst.set_final(2, TropicalWeight::new(1.5));
    fst
}

#[test]
fn bincode_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sample.fst");

    BincodeSerializer::serialize(&sample(1), File::create(&path).unwrap()).unwrap();
    let loaded: VectorFst<TropicalWeight> =
        BincodeSerializer::deserialize(File::open(&path).unwrap()).unwrap();

    assert_eq!(isomorphic(&sample(1), &loaded, 1e-6), Ok(true));
}

#[test]
fn json_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sample.json");

    JsonSerializer::serialize(&sample(1), File::create(&path).unwrap()).unwrap();
    let loaded: VectorFst<TropicalWeight> =
        JsonSerializer::deserialize(File::open(&path).unwrap()).unwrap();

    assert_eq!(isomorphic(&sample(1), &loaded, 1e-6), Ok(true));
}

#[test]
fn symbol_tables_survive_the_round_trip() {
    let mut fst = sample(1);
    let mut symbols = SymbolTable::new("letters");
    symbols.add_symbol("<eps>");
    symbols.add_symbol("a");
    symbols.add_symbol("b");
    fst.set_input_symbols(Some(symbols.clone()));

    let mut buffer = Vec::new();
    BincodeSerializer::serialize(&fst, &mut buffer).unwrap();
    let loaded: VectorFst<TropicalWeight> = BincodeSerializer::deserialize(&buffer[..]).unwrap();

    let loaded_symbols = loaded.input_symbols().expect("symbols dropped");
    assert_eq!(loaded_symbols.find_label("b"), Some(2));
    assert_eq!(loaded_symbols.checksum(), symbols.checksum());
}

#[test]
fn archive_full_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("collection.far");

    let mut writer =
        ArchiveWriter::<TropicalWeight>::create(&path, ArchiveType::Indexed).unwrap();
    for (index, key) in ["ant", "bee", "cat", "dog"].iter().enumerate() {
        writer.add(key, &sample(index as i64 + 1)).unwrap();
    }
    writer.finish().unwrap();

    let mut reader = ArchiveReader::<TropicalWeight>::open(&path).unwrap();
    assert_eq!(reader.len(), 4);

    assert!(reader.find("cat"));
    assert_eq!(isomorphic(reader.get_fst(), &sample(3), 1e-6), Ok(true));

    // Positioning at the first key >= "b" lands on "bee".
    assert!(!reader.find("b"));
    assert_eq!(reader.get_key(), "bee");

    // Past the last key: done.
    assert!(!reader.find("zebra"));
    assert!(reader.done());
}

#[test]
fn archive_rejects_mixed_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("not-archive");
    std::fs::write(&path, b"\xff\xff\xff\xffgarbage").unwrap();
    assert!(ArchiveReader::<TropicalWeight>::open(&path).is_err());
}
