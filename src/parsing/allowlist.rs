use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use tracing::info;

use super::{open_text, ParseError};

/// Header of the key column in a variant allow-list
pub const ALLOW_LIST_COLUMN: &str = "ID";

/// Variant keys (`chr{CHR}_{BP}_{A2}_{A1}`) accepted by the final filter
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    keys: HashSet<String>,
}

impl AllowList {
    pub fn from_keys<S: Into<String>>(keys: impl IntoIterator<Item = S>) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Read the `ID` column of a tab-separated file (gzipped when it ends in
    /// `.gz`), or its first column when there is no `ID` header.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the file cannot be read.
    pub fn read(path: &Path) -> Result<Self, ParseError> {
        let list = Self::read_from(open_text(path)?)?;
        info!("Read {} allowed variants from {}", list.len(), path.display());
        Ok(list)
    }

    /// # Errors
    ///
    /// Returns `ParseError::Csv` if the text is not valid delimited data.
    pub fn read_from<R: Read>(reader: R) -> Result<Self, ParseError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .quoting(false)
            .flexible(true)
            .from_reader(reader);
        let column = reader
            .headers()?
            .iter()
            .position(|h| h == ALLOW_LIST_COLUMN)
            .unwrap_or(0);

        let mut keys = HashSet::new();
        for row in reader.records() {
            if let Some(key) = row?.get(column).map(str::trim).filter(|k| !k.is_empty()) {
                keys.insert(key.to_string());
            }
        }
        Ok(Self { keys })
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
