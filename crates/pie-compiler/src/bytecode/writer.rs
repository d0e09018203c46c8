//! The image byte stream and its patch tables.
//!
//! Code refers forward to functions and strings whose positions are not
//! known yet. Each such reference reserves a 4-byte placeholder through an
//! [`OffsetTable`]; once every target has been written, the table
//! overwrites the placeholders with the targets' absolute offsets.

use std::hash::Hash;

use rustc_hash::FxHashMap;

use super::OpCode;

/// An append-only byte stream with in-place patching of earlier words.
#[derive(Debug, Clone, Default)]
pub struct ImageWriter {
    bytes: Vec<u8>,
}

impl ImageWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The offset the next byte will be written at.
    pub fn position(&self) -> u32 {
        u32::try_from(self.bytes.len()).unwrap_or_else(|_| panic!("image exceeds 4 GiB"))
    }

    pub fn write_op(&mut self, op: OpCode) {
        self.bytes.push(op as u8);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Writes a zero word to be patched later and returns its offset.
    pub fn reserve_u32(&mut self) -> u32 {
        let at = self.position();
        self.write_u32(0);
        at
    }

    /// Overwrites the word at `at`. Appending continues at the end.
    pub fn patch_u32(&mut self, at: u32, value: u32) {
        let at = at as usize;
        self.bytes[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Named 4-byte references into the image.
///
/// Several placeholders may refer to the same name. Every name referred to
/// must be defined exactly once before patching.
#[derive(Debug)]
pub struct OffsetTable<K> {
    inserts: Vec<(K, u32)>,
    definitions: FxHashMap<K, u32>,
}

impl<K> Default for OffsetTable<K> {
    fn default() -> Self {
        Self {
            inserts: Vec::new(),
            definitions: FxHashMap::default(),
        }
    }
}

impl<K: Eq + Hash + std::fmt::Debug> OffsetTable<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves a placeholder at the current position, to be filled with
    /// `key`'s offset.
    pub fn insert(&mut self, writer: &mut ImageWriter, key: K) {
        let at = writer.reserve_u32();
        self.inserts.push((key, at));
    }

    /// Records that `key`'s data begins at `offset`.
    ///
    /// # Panics
    ///
    /// If `key` was already defined.
    pub fn define(&mut self, key: K, offset: u32) {
        if let Some(previous) = self.definitions.get(&key) {
            panic!("offset {key:?} defined twice, at {previous} and {offset}");
        }
        self.definitions.insert(key, offset);
    }

    pub fn definition(&self, key: &K) -> Option<u32> {
        self.definitions.get(key).copied()
    }

    pub fn is_defined(&self, key: &K) -> bool {
        self.definitions.contains_key(key)
    }

    /// Number of placeholders awaiting a patch.
    pub fn pending(&self) -> usize {
        self.inserts.len()
    }

    /// Fills every placeholder with its definition, consuming the table.
    /// Returns the definitions.
    ///
    /// # Panics
    ///
    /// If a placeholder's key was never defined.
    pub fn patch(self, writer: &mut ImageWriter) -> FxHashMap<K, u32> {
        for (key, at) in &self.inserts {
            let Some(&offset) = self.definitions.get(key) else {
                panic!("offset {key:?} was referenced but never defined");
            };
            writer.patch_u32(*at, offset);
        }
        self.definitions
    }
}

/// String literals, deduplicated by text.
#[derive(Debug, Default)]
pub struct StringTable {
    offsets: OffsetTable<String>,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves a placeholder for the offset of `text`.
    pub fn insert(&mut self, writer: &mut ImageWriter, text: &str) {
        self.offsets.insert(writer, text.to_string());
    }

    /// Writes each distinct string once, sorted, NUL-terminated, and patches
    /// every reference to it. Returns where the table starts.
    pub fn write(mut self, writer: &mut ImageWriter) -> u32 {
        let start = writer.position();

        let mut strings: Vec<String> = self.offsets.inserts.iter().map(|(text, _)| text.clone()).collect();
        strings.sort();
        strings.dedup();

        for text in strings {
            self.offsets.define(text.clone(), writer.position());
            writer.write_bytes(text.as_bytes());
            writer.write_u8(0);
        }

        self.offsets.patch(writer);
        start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(writer: &ImageWriter, at: u32) -> u32 {
        let at = at as usize;
        u32::from_le_bytes(writer.bytes()[at..at + 4].try_into().unwrap())
    }

    #[test]
    fn words_are_little_endian() {
        let mut writer = ImageWriter::new();
        writer.write_u32(0x0102_0304);
        assert_eq!(writer.bytes(), &[4, 3, 2, 1]);
    }

    #[test]
    fn patching_keeps_appending_at_the_end() {
        let mut writer = ImageWriter::new();
        let at = writer.reserve_u32();
        writer.write_u8(9);
        writer.patch_u32(at, 7);
        writer.write_u8(10);
        assert_eq!(writer.bytes(), &[7, 0, 0, 0, 9, 10]);
    }

    #[test]
    fn forward_references_are_patched() {
        let mut writer = ImageWriter::new();
        let mut table = OffsetTable::new();

        table.insert(&mut writer, "f");
        table.insert(&mut writer, "f");
        table.define("f", writer.position());
        writer.write_op(OpCode::Return);

        assert_eq!(table.pending(), 2);
        table.patch(&mut writer);
        assert_eq!(word(&writer, 0), 8);
        assert_eq!(word(&writer, 4), 8);
    }

    #[test]
    #[should_panic(expected = "never defined")]
    fn undefined_reference_panics() {
        let mut writer = ImageWriter::new();
        let mut table = OffsetTable::new();
        table.insert(&mut writer, "missing");
        table.patch(&mut writer);
    }

    #[test]
    #[should_panic(expected = "defined twice")]
    fn double_definition_panics() {
        let mut table = OffsetTable::<&str>::new();
        table.define("f", 0);
        table.define("f", 4);
    }

    #[test]
    fn strings_are_written_once() {
        let mut writer = ImageWriter::new();
        let mut strings = StringTable::new();
        strings.insert(&mut writer, "hi");
        strings.insert(&mut writer, "a");
        strings.insert(&mut writer, "hi");

        let start = strings.write(&mut writer);
        assert_eq!(start, 12);
        assert_eq!(&writer.bytes()[12..], b"a\0hi\0");
        assert_eq!(word(&writer, 0), 14);
        assert_eq!(word(&writer, 4), 12);
        assert_eq!(word(&writer, 8), 14);
    }
}
