//! Metadata directory scanner
//!
//! Lists the `*.sql` files of one database's metadata directory, parses each
//! of them and returns the definitions keyed by file name. A `BTreeMap` keeps
//! them in lexicographic file name order, which is the order objects are
//! loaded in.

use super::definition::ObjectDefinition;
use super::escape::{unescape_for_file_name, METADATA_SUFFIX};
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Definitions keyed by metadata file name
pub type MetadataFiles = BTreeMap<String, ObjectDefinition>;

/// Left behind by an interrupted alter
const TMP_SUFFIX: &str = ".sql.tmp";
const BAK_SUFFIX: &str = ".sql.bak";

/// Scans one metadata directory
#[derive(Debug, Clone)]
pub struct MetadataScanner {
    directory: PathBuf,
}

/// What to do with one directory entry
enum Entry {
    Definition(String),
    Skip,
}

impl MetadataScanner {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Parse every definition in the directory. The first malformed file
    /// aborts the scan. A missing directory holds no definitions.
    pub fn scan(&self) -> Result<MetadataFiles> {
        let mut files = MetadataFiles::new();

        if !self.directory.exists() {
            debug!(directory = %self.directory.display(), "metadata directory does not exist");
            return Ok(files);
        }

        for entry in fs::read_dir(&self.directory)? {
            let entry = entry?;
            let path = entry.path();
            let file_name = entry.file_name().to_string_lossy().into_owned();

            // Follows symlinks
            let is_file = fs::metadata(&path)?.is_file();
            if !is_file && !file_name.ends_with(METADATA_SUFFIX) {
                continue;
            }

            let stem = match self.classify(&file_name)? {
                Entry::Definition(stem) => stem,
                Entry::Skip => continue,
            };
            if !is_file {
                return Err(Error::UnexpectedMetadataFile(path));
            }

            if let Some(definition) = self.parse_file(&path, &stem)? {
                files.insert(file_name, definition);
            }
        }

        Ok(files)
    }

    fn classify(&self, file_name: &str) -> Result<Entry> {
        if file_name.starts_with('.') {
            return Ok(Entry::Skip);
        }

        if file_name.ends_with(TMP_SUFFIX) || file_name.ends_with(BAK_SUFFIX) {
            warn!(
                file = %self.directory.join(file_name).display(),
                "skipping leftover metadata file"
            );
            return Ok(Entry::Skip);
        }

        match file_name.strip_suffix(METADATA_SUFFIX) {
            Some(stem) if !stem.is_empty() => Ok(Entry::Definition(stem.to_string())),
            _ => Err(Error::UnexpectedMetadataFile(self.directory.join(file_name))),
        }
    }

    /// `None` for an empty file
    fn parse_file(&self, path: &Path, stem: &str) -> Result<Option<ObjectDefinition>> {
        let text = fs::read_to_string(path)?;
        if text.trim().is_empty() {
            warn!(file = %path.display(), "skipping empty metadata file");
            return Ok(None);
        }

        let wrap = |source: Error| Error::MetadataParse {
            path: path.to_path_buf(),
            source: Box::new(source),
        };

        let definition = ObjectDefinition::parse(&text).map_err(wrap)?;

        if unescape_for_file_name(stem).as_deref() != Some(definition.name.as_str()) {
            return Err(wrap(Error::ParseError(format!(
                "file name does not match object name '{}'",
                definition.name
            ))));
        }

        Ok(Some(definition))
    }
}
