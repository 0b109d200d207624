use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::chart::Entry;
use crate::error::{Error, Result};

/// File name of the repository index, both locally and in the bucket
pub const INDEX_FILE_NAME: &str = "index.yaml";

/// A Helm chart repository index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub entries: BTreeMap<String, Vec<Entry>>,
    pub generated: String,
}

impl Index {
    /// Encode as YAML with two-space indentation
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(Error::Serialize)
    }

    pub fn from_yaml(data: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(data)
    }

    /// Total number of chart versions across all names
    pub fn version_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

/// Accumulates entries in listing order until the index is assembled
#[derive(Debug, Default)]
pub struct IndexBuilder {
    entries: BTreeMap<String, Vec<Entry>>,
    api_versions: Vec<String>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry under its chart name and record its schema version
    pub fn push(&mut self, entry: Entry) {
        self.api_versions.push(entry.api_version.clone());
        self.entries.entry(entry.name.clone()).or_default().push(entry);
    }

    /// Number of entries pushed so far
    pub fn entry_count(&self) -> usize {
        self.api_versions.len()
    }

    /// Assemble the index, or `None` if no entry was ever pushed
    pub fn finish(self, generated: String) -> Option<Index> {
        let api_version = select_api_version(&self.api_versions)?.to_string();
        Some(Index {
            api_version,
            entries: self.entries,
            generated,
        })
    }
}

/// Pick the index schema version: the greatest observed version string.
///
/// The comparison is plain string ordering, not version-aware, so `v2` is
/// chosen over `v10`.
pub fn select_api_version(versions: &[String]) -> Option<&str> {
    versions.iter().max().map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, version: &str, api_version: &str) -> Entry {
        Entry {
            name: name.to_string(),
            version: version.to_string(),
            api_version: api_version.to_string(),
            ..Default::default()
        }
    }

    fn versions(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_select_api_version_is_lexicographic() {
        assert_eq!(select_api_version(&versions(&["v2", "v10"])), Some("v2"));
        assert_eq!(select_api_version(&versions(&["v10", "v2"])), Some("v2"));
        assert_eq!(select_api_version(&versions(&["v1", "v2", "v1"])), Some("v2"));
        assert_eq!(select_api_version(&versions(&["", "v1"])), Some("v1"));
        assert_eq!(select_api_version(&[]), None);
    }

    #[test]
    fn test_builder_groups_by_name_in_push_order() {
        let mut builder = IndexBuilder::new();
        builder.push(entry("zebra", "2.0.0", "v2"));
        builder.push(entry("apple", "1.10.0", "v2"));
        builder.push(entry("zebra", "10.0.0", "v2"));
        builder.push(entry("apple", "1.2.0", "v1"));
        builder.push(entry("zebra", "1.0.0", "v2"));
        assert_eq!(builder.entry_count(), 5);

        let index = builder.finish("now".to_string()).unwrap();

        let zebra: Vec<&str> = index.entries["zebra"].iter().map(|e| e.version.as_str()).collect();
        let apple: Vec<&str> = index.entries["apple"].iter().map(|e| e.version.as_str()).collect();
        assert_eq!(zebra, ["2.0.0", "10.0.0", "1.0.0"]);
        assert_eq!(apple, ["1.10.0", "1.2.0"]);
        assert_eq!(index.api_version, "v2");
        assert_eq!(index.generated, "now");
        assert_eq!(index.version_count(), 5);
    }

    #[test]
    fn test_builder_empty_finishes_none() {
        let builder = IndexBuilder::new();
        assert_eq!(builder.entry_count(), 0);
        assert!(builder.finish("now".to_string()).is_none());
    }

    #[test]
    fn test_yaml_key_order() {
        let mut builder = IndexBuilder::new();
        let mut foo = entry("foo", "1.0.0", "v2");
        foo.digest = "abcd".to_string();
        foo.urls.push("s3://bucket/foo-1.0.0.tgz".to_string());
        builder.push(foo);
        let index = builder.finish("2024-05-01T10:00:00Z".to_string()).unwrap();

        let yaml = index.to_yaml().unwrap();

        let position = |key: &str| {
            yaml.find(key)
                .unwrap_or_else(|| panic!("{} missing from:\n{}", key, yaml))
        };
        assert!(yaml.starts_with("apiVersion: v2\nentries:\n  foo:\n  - annotations:\n"));
        assert!(position("entries:") < position("generated:"));
        let keys = [
            "annotations:",
            "    apiVersion:",
            "created:",
            "description:",
            "digest: abcd",
            "icon:",
            "kubeVersion:",
            "maintainers: []",
            "name: foo",
            "urls:",
            "version: 1.0.0",
        ];
        for pair in keys.windows(2) {
            assert!(position(pair[0]) < position(pair[1]), "{} before {}", pair[0], pair[1]);
        }
        assert!(position("annotations:") < position("      purpose:"));
        assert!(position("version: 1.0.0") < position("generated:"));
    }

    #[test]
    fn test_yaml_round_trip() {
        let mut builder = IndexBuilder::new();
        let mut foo = entry("foo", "1.0.0", "v2");
        foo.description = "A chart: with punctuation".to_string();
        foo.annotations.purpose = "demo".to_string();
        foo.maintainers.push(crate::chart::Maintainer {
            email: "ops@example.com".to_string(),
            name: "Ops".to_string(),
            url: String::new(),
        });
        foo.urls.push("s3://bucket/charts/foo-1.0.0.tgz".to_string());
        builder.push(foo);
        builder.push(entry("bar", "0.1.0", "v1"));
        builder.push(entry("foo", "1.1.0", "v2"));
        let index = builder
            .finish("2024-05-01T10:00:00.123456789Z".to_string())
            .unwrap();

        let parsed = Index::from_yaml(&index.to_yaml().unwrap()).unwrap();

        assert_eq!(parsed, index);
    }
}
