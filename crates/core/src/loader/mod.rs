//! Employee record sources.
//!
//! A [`RecordLoader`] yields the ordered sequence of records the realm is
//! built from. The mapper never sees where records came from:
//!
//! - [`YamlDirectoryLoader`]: every matching YAML file in a directory
//! - [`YamlStreamLoader`]: a single YAML stream (e.g. stdin)
//! - [`InMemoryLoader`]: records that are already parsed

pub mod yaml;

use crate::errors::LoaderError;
use crate::models::EmployeeRecord;

pub use yaml::{parse_yaml_documents, YamlDirectoryLoader, YamlStreamLoader};

/// A source of employee records.
pub trait RecordLoader {
    /// Load every record, in source order.
    fn load(&self) -> Result<Vec<EmployeeRecord>, LoaderError>;
}

/// Loader over records that are already in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLoader {
    records: Vec<EmployeeRecord>,
}

impl InMemoryLoader {
    pub fn new(records: Vec<EmployeeRecord>) -> Self {
        Self { records }
    }
}

impl RecordLoader for InMemoryLoader {
    fn load(&self) -> Result<Vec<EmployeeRecord>, LoaderError> {
        Ok(self.records.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_loader_preserves_order() {
        let records = vec![
            EmployeeRecord::new("C", "c", "c", "d", "t"),
            EmployeeRecord::new("A", "a", "a", "d", "t"),
            EmployeeRecord::new("B", "b", "b", "d", "t"),
        ];
        let loaded = InMemoryLoader::new(records.clone()).load().unwrap();
        assert_eq!(loaded, records);
    }
}
