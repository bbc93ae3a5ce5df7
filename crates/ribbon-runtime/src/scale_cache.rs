#![forbid(unsafe_code)]

//! Persisted scale decisions.
//!
//! One record per tab id, stored as an opaque string:
//!
//! ```text
//! {viewportWidth}{viewportHeight}|{scaleIndex}|{horizontalScaleRoom}|{scalingHint}
//! ```
//!
//! The viewport field is the two numbers concatenated, so `(1111, 111)` and
//! `(111, 1111)` share a key. Records written here prefix the hint field
//! with the width (`{width}:{scalingHint}`) and only match when both the key
//! and that width agree; records without the prefix never match. A record
//! that does not parse is a cache miss, never an error.

use rustc_hash::FxHashMap;

use ribbon_core::geometry::Size;

/// Decoded cache record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleRecord {
    pub viewport_key: String,
    pub index: i32,
    pub h_room: i64,
    /// Width that produced `viewport_key`, when the record carries one.
    pub viewport_width: Option<u32>,
    pub hint: String,
}

/// Viewport key as written into records.
#[must_use]
pub fn viewport_key(viewport: Size) -> String {
    format!("{}{}", viewport.width, viewport.height)
}

impl ScaleRecord {
    #[must_use]
    pub fn new(viewport: Size, index: i32, h_room: i64, hint: impl Into<String>) -> Self {
        Self {
            viewport_key: viewport_key(viewport),
            index,
            h_room,
            viewport_width: Some(viewport.width),
            hint: hint.into(),
        }
    }

    /// Parse a stored record; `None` on any malformation.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let mut fields = raw.splitn(4, '|');
        let viewport_key = fields.next()?;
        let index = fields.next()?.parse().ok()?;
        let h_room = fields.next()?.parse().ok()?;
        let hint_field = fields.next()?;
        if viewport_key.is_empty() || !viewport_key.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let (viewport_width, hint) = match hint_field.split_once(':') {
            Some((width, hint)) if viewport_key.starts_with(width) => {
                match width.parse::<u32>() {
                    Ok(width) => (Some(width), hint),
                    Err(_) => (None, hint_field),
                }
            }
            _ => (None, hint_field),
        };
        Some(Self {
            viewport_key: viewport_key.to_owned(),
            index,
            h_room,
            viewport_width,
            hint: hint.to_owned(),
        })
    }

    #[must_use]
    pub fn encode(&self) -> String {
        match self.viewport_width {
            Some(width) => format!(
                "{}|{}|{}|{width}:{}",
                self.viewport_key, self.index, self.h_room, self.hint
            ),
            None => format!(
                "{}|{}|{}|{}",
                self.viewport_key, self.index, self.h_room, self.hint
            ),
        }
    }

    /// Whether this record applies to `viewport` and the loaded data.
    #[must_use]
    pub fn matches(&self, viewport: Size, hint: &str) -> bool {
        self.viewport_width == Some(viewport.width)
            && self.viewport_key == viewport_key(viewport)
            && self.hint == hint
    }
}

/// String-keyed storage for scale records.
pub trait ScaleStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str);
}

/// In-memory store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryScaleStore {
    entries: FxHashMap<String, String>,
}

impl MemoryScaleStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MemoryScaleStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl ScaleStore for MemoryScaleStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_owned(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

#[cfg(feature = "state-persistence")]
pub use file::FileScaleStore;

#[cfg(feature = "state-persistence")]
mod file {
    use std::collections::BTreeMap;
    use std::io;
    use std::path::{Path, PathBuf};

    use serde::{Deserialize, Serialize};

    use super::ScaleStore;

    const FORMAT_VERSION: u64 = 1;

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct ScaleFile {
        version: u64,
        saved_at_ms: u64,
        records: BTreeMap<String, String>,
    }

    /// JSON file store.
    ///
    /// - **Missing file**: empty store.
    /// - **Corrupt file or wrong version**: warning, empty store.
    /// - **Write failure**: warning; the in-memory copy stays authoritative.
    ///
    /// Writes go to a temp file first and are renamed into place.
    #[derive(Debug)]
    pub struct FileScaleStore {
        path: PathBuf,
        records: BTreeMap<String, String>,
    }

    impl FileScaleStore {
        #[must_use]
        pub fn open(path: impl Into<PathBuf>) -> Self {
            let path = path.into();
            let records = match load(&path) {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "scale cache unreadable, starting empty");
                    BTreeMap::new()
                }
            };
            Self { path, records }
        }

        #[must_use]
        pub fn path(&self) -> &Path {
            &self.path
        }

        fn save(&self) {
            if let Err(e) = save(&self.path, &self.records) {
                tracing::warn!(path = %self.path.display(), error = %e, "scale cache write failed");
            }
        }
    }

    fn load(path: &Path) -> io::Result<BTreeMap<String, String>> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(path)?;
        let file: ScaleFile = serde_json::from_str(&contents)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        if file.version != FORMAT_VERSION {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "unsupported scale cache version: {} (expected {FORMAT_VERSION})",
                    file.version
                ),
            ));
        }
        Ok(file.records)
    }

    fn save(path: &Path, records: &BTreeMap<String, String>) -> io::Result<()> {
        let saved_at_ms = web_time::SystemTime::now()
            .duration_since(web_time::SystemTime::UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or_default();
        let file = ScaleFile {
            version: FORMAT_VERSION,
            saved_at_ms,
            records: records.clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let temp = path.with_extension("json.tmp");
        std::fs::write(&temp, json)?;
        std::fs::rename(&temp, path)
    }

    impl ScaleStore for FileScaleStore {
        fn get(&self, key: &str) -> Option<String> {
            self.records.get(key).cloned()
        }

        fn set(&mut self, key: &str, value: String) {
            if self.records.get(key) != Some(&value) {
                self.records.insert(key.to_owned(), value);
                self.save();
            }
        }

        fn remove(&mut self, key: &str) {
            if self.records.remove(key).is_some() {
                self.save();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_round_trips() {
        let record = ScaleRecord::new(Size::new(1024, 120), 3, 42, "abc|def");
        let raw = record.encode();
        assert_eq!(raw, "1024120|3|42|1024:abc|def");
        assert_eq!(ScaleRecord::parse(&raw), Some(record));
    }

    #[test]
    fn negative_room_parses() {
        let record = ScaleRecord::parse("800120|-1|-7|h").unwrap();
        assert_eq!(record.index, -1);
        assert_eq!(record.h_room, -7);
        assert_eq!(record.viewport_width, None);
        assert_eq!(record.hint, "h");
    }

    #[test]
    fn malformed_records_are_misses() {
        for raw in ["", "800120", "800120|x|0|h", "800120|1|y|h", "80a0|1|0|h", "800120|1|0"] {
            assert_eq!(ScaleRecord::parse(raw), None, "{raw:?}");
        }
    }

    #[test]
    fn matches_on_viewport_and_hint() {
        let record = ScaleRecord::new(Size::new(800, 120), 1, 5, "h1");
        assert!(record.matches(Size::new(800, 120), "h1"));
        assert!(!record.matches(Size::new(800, 121), "h1"));
        assert!(!record.matches(Size::new(800, 120), "h2"));
    }

    #[test]
    fn concatenated_key_collision_does_not_match() {
        let wide = ScaleRecord::new(Size::new(1111, 111), -1, 12, "h");
        assert_eq!(wide.viewport_key, viewport_key(Size::new(111, 1111)));
        let stored = ScaleRecord::parse(&wide.encode()).unwrap();
        assert!(stored.matches(Size::new(1111, 111), "h"));
        assert!(!stored.matches(Size::new(111, 1111), "h"));
    }

    #[test]
    fn record_without_width_never_matches() {
        let record = ScaleRecord::parse("800120|1|5|h1").unwrap();
        assert!(!record.matches(Size::new(800, 120), "h1"));
        let prefixed = ScaleRecord::parse("800120|1|5|80:h1").unwrap();
        assert_eq!(prefixed.viewport_width, Some(80));
        assert!(!prefixed.matches(Size::new(800, 120), "h1"));
    }

    #[test]
    fn memory_store_basics() {
        let mut store: MemoryScaleStore = [("Ribbon.Home", "800120|1|5|h")].into_iter().collect();
        assert_eq!(store.len(), 1);
        store.set("Ribbon.Insert", "1|2|3|4".into());
        assert_eq!(store.get("Ribbon.Insert").as_deref(), Some("1|2|3|4"));
        store.remove("Ribbon.Home");
        assert!(store.get("Ribbon.Home").is_none());
    }

    #[cfg(feature = "state-persistence")]
    #[test]
    fn file_store_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scale.json");
        {
            let mut store = FileScaleStore::open(&path);
            store.set("Ribbon.Home", "800120|2|9|h".into());
        }
        let store = FileScaleStore::open(&path);
        assert_eq!(store.get("Ribbon.Home").as_deref(), Some("800120|2|9|h"));
    }

    #[cfg(feature = "state-persistence")]
    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scale.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = FileScaleStore::open(&path);
        assert!(store.get("Ribbon.Home").is_none());
    }
}
