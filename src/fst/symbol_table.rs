//! Bidirectional string ↔ label mapping.

use super::Label;
use rustc_hash::FxHashMap;

/// A bidirectional mapping between symbol strings and labels.
///
/// Label 0 is conventionally reserved for epsilon by callers; the table
/// itself places no interpretation on labels. Two tables are compatible for
/// an operation when their contents agree ([`compat_symbols`]); a checksum
/// over the label/string pairs makes that check cheap.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct SymbolTable {
    name: String,
    symbols: Vec<(Label, String)>,
    #[cfg_attr(feature = "serialization", serde(skip))]
    by_symbol: FxHashMap<String, Label>,
    next_label: Label,
}

impl SymbolTable {
    /// Creates an empty table with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        SymbolTable {
            name: name.into(),
            symbols: Vec::new(),
            by_symbol: FxHashMap::default(),
            next_label: 0,
        }
    }

    /// The table's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// A clone of this table under a new name; contents and checksum are
    /// unchanged.
    pub fn clone_named(&self, name: impl Into<String>) -> Self {
        let mut table = self.clone();
        table.name = name.into();
        table
    }

    /// Adds `symbol` with the next free label, or returns its existing
    /// label.
    pub fn add_symbol(&mut self, symbol: impl Into<String>) -> Label {
        let symbol = symbol.into();
        if let Some(label) = self.find_label(&symbol) {
            return label;
        }
        let label = self.next_label;
        self.next_label += 1;
        self.by_symbol.insert(symbol.clone(), label);
        self.symbols.push((label, symbol));
        label
    }

    /// Adds `symbol` with an explicit label.
    pub fn add_symbol_with_label(&mut self, symbol: impl Into<String>, label: Label) {
        let symbol = symbol.into();
        self.by_symbol.insert(symbol.clone(), label);
        self.symbols.push((label, symbol));
        if label >= self.next_label {
            self.next_label = label + 1;
        }
    }

    /// Looks up the label for `symbol`.
    pub fn find_label(&self, symbol: &str) -> Option<Label> {
        // The reverse index is a cache; fall back to a scan when it is cold
        // (e.g. freshly deserialised).
        self.by_symbol.get(symbol).copied().or_else(|| {
            self.symbols
                .iter()
                .find(|(_, s)| s == symbol)
                .map(|(l, _)| *l)
        })
    }

    /// Looks up the symbol for `label`.
    pub fn find_symbol(&self, label: Label) -> Option<&str> {
        self.symbols
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, s)| s.as_str())
    }

    /// Number of symbols in the table.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// True if the table holds no symbols.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Checksum over the (label, symbol) pairs, independent of the name.
    pub fn checksum(&self) -> u64 {
        // FNV-1a over the pairs in insertion order.
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for (label, symbol) in &self.symbols {
            for byte in label.to_le_bytes() {
                hash = (hash ^ u64::from(byte)).wrapping_mul(0x100_0000_01b3);
            }
            for byte in symbol.as_bytes() {
                hash = (hash ^ u64::from(*byte)).wrapping_mul(0x100_0000_01b3);
            }
        }
        hash
    }

}

/// Symbol-table compatibility: equal checksums, or at least one side absent.
pub fn compat_symbols(a: Option<&SymbolTable>, b: Option<&SymbolTable>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.checksum() == b.checksum(),
        _ => true,
    }
}
