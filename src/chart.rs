use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, TimeZone};
use serde::{Deserialize, Deserializer, Serialize};

/// Metadata key that carries the archive digest on each chart object
pub const DIGEST_METADATA_KEY: &str = "chart-digest";

/// One packaged chart version as it appears in `index.yaml`
///
/// The same shape is used to read `Chart.yaml`: fields the manifest does not
/// carry stay empty, and anything not listed here is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub annotations: Annotation,
    #[serde(default, deserialize_with = "scalar_string")]
    pub api_version: String,
    #[serde(default, deserialize_with = "scalar_string")]
    pub created: String,
    #[serde(default, deserialize_with = "scalar_string")]
    pub description: String,
    #[serde(default, deserialize_with = "scalar_string")]
    pub digest: String,
    #[serde(default, deserialize_with = "scalar_string")]
    pub icon: String,
    #[serde(default, deserialize_with = "scalar_string")]
    pub kube_version: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub maintainers: Vec<Maintainer>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub urls: Vec<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(default, deserialize_with = "scalar_string")]
    pub purpose: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Maintainer {
    #[serde(default, deserialize_with = "scalar_string")]
    pub email: String,
    #[serde(default, deserialize_with = "scalar_string")]
    pub name: String,
    #[serde(default, deserialize_with = "scalar_string")]
    pub url: String,
}

/// Parse the raw bytes of a `Chart.yaml` member into an entry
pub fn parse_manifest(bytes: &[u8]) -> Result<Entry, serde_yaml::Error> {
    serde_yaml::from_slice(bytes)
}

/// Look up the `chart-digest` value in an object's user metadata
pub fn digest_from_metadata(metadata: &HashMap<String, String>) -> Option<&str> {
    metadata.get(DIGEST_METADATA_KEY).map(String::as_str)
}

/// Format a timestamp as RFC 3339 with up to nanosecond precision.
///
/// Trailing zeros of the fractional part are dropped, and the fraction is
/// omitted entirely on whole seconds: `2024-05-01T10:00:00.5Z`.
pub fn format_timestamp<Tz>(time: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut formatted = time.to_rfc3339_opts(SecondsFormat::Secs, true);
    // Leap seconds are reported as nanos >= 1e9
    let nanos = time.timestamp_subsec_nanos() % 1_000_000_000;
    if nanos != 0 {
        let fraction = format!(".{:09}", nanos);
        // "YYYY-MM-DDTHH:MM:SS" is always 19 bytes
        formatted.insert_str(19, fraction.trim_end_matches('0'));
    }
    formatted
}

/// Read a scalar as it is written, so `version: 1.10` stays "1.10".
/// Null and empty values read as "".
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
