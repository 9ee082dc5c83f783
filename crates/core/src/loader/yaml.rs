//! YAML record loaders.
//!
//! Files may hold several `---`-separated documents; each non-empty document
//! is one employee. Empty and `null` documents are skipped.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::Deserialize;
use tracing::{debug, info};

use super::RecordLoader;
use crate::errors::LoaderError;
use crate::models::EmployeeRecord;

/// Parse every employee document in a YAML stream.
///
/// `origin` names the source in error messages. Document numbers in errors
/// are 1-based and count skipped documents too.
pub fn parse_yaml_documents(
    text: &str,
    origin: &str,
) -> Result<Vec<EmployeeRecord>, LoaderError> {
    let mut records = Vec::new();

    for (index, document) in serde_yaml::Deserializer::from_str(text).enumerate() {
        let malformed = |detail: String| LoaderError::MalformedSource {
            origin: origin.to_string(),
            document: index + 1,
            detail,
        };

        let value = serde_yaml::Value::deserialize(document).map_err(|e| malformed(e.to_string()))?;
        if is_empty_document(&value) {
            debug!(origin, document = index + 1, "skipping empty document");
            continue;
        }

        let record: EmployeeRecord =
            serde_yaml::from_value(value).map_err(|e| malformed(e.to_string()))?;
        records.push(record);
    }

    Ok(records)
}

/// `null` and `{}` documents carry no employee.
fn is_empty_document(value: &serde_yaml::Value) -> bool {
    match value {
        serde_yaml::Value::Null => true,
        serde_yaml::Value::Mapping(mapping) => mapping.is_empty(),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Directory loader
// ---------------------------------------------------------------------------

/// Loads every file in a directory whose name matches a glob pattern.
///
/// Files are read in path order so repeated runs produce the same realm.
#[derive(Debug, Clone)]
pub struct YamlDirectoryLoader {
    directory: PathBuf,
    pattern: String,
}

impl YamlDirectoryLoader {
    pub fn new(directory: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            pattern: pattern.into(),
        }
    }

    /// List the matching files, sorted by path.
    pub fn discover(&self) -> Result<Vec<PathBuf>, LoaderError> {
        if !self.directory.is_dir() {
            return Err(LoaderError::DirectoryNotFound(
                self.directory.display().to_string(),
            ));
        }

        let io_err = |source| LoaderError::Io {
            path: self.directory.display().to_string(),
            source,
        };

        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.directory).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if !path.is_file() {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if glob_match::glob_match(&self.pattern, file_name) {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }
}

impl RecordLoader for YamlDirectoryLoader {
    fn load(&self) -> Result<Vec<EmployeeRecord>, LoaderError> {
        info!(directory = %self.directory.display(), pattern = %self.pattern, "looking for employee files");
        let files = self.discover()?;
        info!(count = files.len(), "found employee files");

        let mut records = Vec::new();
        for path in &files {
            info!(path = %path.display(), "processing file");
            let text = std::fs::read_to_string(path).map_err(|source| LoaderError::Io {
                path: path.display().to_string(),
                source,
            })?;
            let parsed = parse_yaml_documents(&text, &path.display().to_string())?;
            info!(path = %path.display(), count = parsed.len(), "found employees in file");
            records.extend(parsed);
        }

        Ok(records)
    }
}

// ---------------------------------------------------------------------------
// Stream loader
// ---------------------------------------------------------------------------

/// Loads records from one YAML stream, read once on first `load`.
pub struct YamlStreamLoader<R> {
    origin: String,
    reader: Mutex<Option<R>>,
}

impl<R: Read> YamlStreamLoader<R> {
    pub fn new(origin: impl Into<String>, reader: R) -> Self {
        Self {
            origin: origin.into(),
            reader: Mutex::new(Some(reader)),
        }
    }
}

impl<R: Read> RecordLoader for YamlStreamLoader<R> {
    fn load(&self) -> Result<Vec<EmployeeRecord>, LoaderError> {
        let io_err = |source| LoaderError::Io {
            path: self.origin.clone(),
            source,
        };

        let reader = self
            .reader
            .lock()
            .map_err(|_| io_err(std::io::Error::other("stream lock poisoned")))?
            .take();
        let Some(mut reader) = reader else {
            return Err(io_err(std::io::Error::other("stream already consumed")));
        };

        let mut text = String::new();
        reader.read_to_string(&mut text).map_err(io_err)?;

        let records = parse_yaml_documents(&text, &self.origin)?;
        info!(origin = %self.origin, count = records.len(), "found employees in stream");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_EMPLOYEES: &str = r#"
id: EMP-001
name: { first: Ada, last: King }
department: Engineering
title: CTO
---
id: EMP-002
name: { first: Linus, last: Berg }
department: Engineering
title: SWE
"#;

    #[test]
    fn test_parse_multiple_documents() {
        let records = parse_yaml_documents(TWO_EMPLOYEES, "inline").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id.as_deref(), Some("EMP-001"));
        assert_eq!(records[1].id.as_deref(), Some("EMP-002"));
    }

    #[test]
    fn test_skips_empty_and_null_documents() {
        let text = "---\n---\n~\n---\nid: EMP-9\n---\n";
        let records = parse_yaml_documents(text, "inline").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id.as_deref(), Some("EMP-9"));
    }

    #[test]
    fn test_skips_empty_mapping_documents() {
        let text = "id: EMP-1\nname: { first: A, last: B }\ndepartment: D\ntitle: T\n---\n{}\n";
        let records = parse_yaml_documents(text, "inline").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id.as_deref(), Some("EMP-1"));
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        assert!(parse_yaml_documents("", "inline").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_document_is_reported() {
        let text = "id: EMP-1\n---\nid: EMP-2\nkey_skills: just-one\n";
        let err = parse_yaml_documents(text, "staff.yaml").unwrap_err();
        match err {
            LoaderError::MalformedSource {
                origin, document, ..
            } => {
                assert_eq!(origin, "staff.yaml");
                assert_eq!(document, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_yaml_syntax_is_reported() {
        let err = parse_yaml_documents("id: [unclosed\n", "bad.yaml").unwrap_err();
        assert!(matches!(err, LoaderError::MalformedSource { .. }));
    }

    #[test]
    fn test_directory_loader_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.yaml"), "id: EMP-B\n").unwrap();
        std::fs::write(dir.path().join("a.yaml"), TWO_EMPLOYEES).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "id: NOT-ME\n").unwrap();
        std::fs::write(dir.path().join("c.yml"), "id: NOT-ME-EITHER\n").unwrap();
        std::fs::create_dir(dir.path().join("nested.yaml")).unwrap();

        let loader = YamlDirectoryLoader::new(dir.path(), "*.yaml");
        let files = loader.discover().unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("a.yaml"));

        let ids: Vec<_> = loader
            .load()
            .unwrap()
            .into_iter()
            .map(|r| r.id.unwrap())
            .collect();
        assert_eq!(ids, vec!["EMP-001", "EMP-002", "EMP-B"]);
    }

    #[test]
    fn test_directory_loader_custom_pattern() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("x.yml"), "id: EMP-X\n").unwrap();
        std::fs::write(dir.path().join("y.yaml"), "id: EMP-Y\n").unwrap();

        let records = YamlDirectoryLoader::new(dir.path(), "*.{yml,yaml}")
            .load()
            .unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_missing_directory() {
        let loader = YamlDirectoryLoader::new("/nonexistent/employees", "*.yaml");
        assert!(matches!(
            loader.load(),
            Err(LoaderError::DirectoryNotFound(_))
        ));
    }

    #[test]
    fn test_stream_loader_reads_once() {
        let loader = YamlStreamLoader::new("<stdin>", TWO_EMPLOYEES.as_bytes());
        assert_eq!(loader.load().unwrap().len(), 2);
        assert!(matches!(loader.load(), Err(LoaderError::Io { .. })));
    }
}
