use chrono::Utc;
use tracing::{info, warn};

use crate::archive::find_manifest;
use crate::chart::{digest_from_metadata, format_timestamp, parse_manifest, Entry};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::index::{Index, IndexBuilder, INDEX_FILE_NAME};
use crate::sink::deliver;
use crate::storage::{chart_archives, object_url, ObjectStore, ObjectSummary};

/// Rebuild the index for every chart archive under `prefix`
///
/// Archives are processed one at a time in listing order. Any storage,
/// archive or manifest error aborts the rebuild; an archive without a
/// `Chart.yaml` is skipped.
pub async fn rebuild_index<S>(store: &S, prefix: &str) -> Result<Index>
where
    S: ObjectStore + ?Sized,
{
    let archives = chart_archives(store.list_objects(prefix).await?);
    info!(count = archives.len(), "Found chart archives");

    let mut builder = IndexBuilder::new();
    for archive in &archives {
        if let Some(entry) = build_entry(store, archive).await? {
            builder.push(entry);
        }
    }
    info!(
        indexed = builder.entry_count(),
        skipped = archives.len() - builder.entry_count(),
        "Read chart manifests"
    );

    builder
        .finish(format_timestamp(&Utc::now()))
        .ok_or_else(|| Error::NoCharts {
            bucket: store.bucket().to_string(),
            prefix: prefix.to_string(),
        })
}

async fn build_entry<S>(store: &S, archive: &ObjectSummary) -> Result<Option<Entry>>
where
    S: ObjectStore + ?Sized,
{
    let url = object_url(store.bucket(), &archive.key);
    info!(url = %url, "Parsing information from archive");

    let object = store.get_object(&archive.key).await?;
    let manifest = find_manifest(object.body.as_slice()).map_err(|source| Error::Archive {
        key: archive.key.clone(),
        source,
    })?;
    let Some(manifest) = manifest else {
        warn!(url = %url, "No Chart.yaml in archive, skipping");
        return Ok(None);
    };

    let mut entry = parse_manifest(&manifest).map_err(|source| Error::Manifest {
        key: archive.key.clone(),
        source,
    })?;
    entry.urls.push(url);
    entry.created = format_timestamp(&archive.last_modified);
    entry.digest = digest_from_metadata(&object.metadata)
        .ok_or_else(|| Error::DigestNotFound {
            key: archive.key.clone(),
        })?
        .to_string();

    Ok(Some(entry))
}

/// Rebuild the index and deliver it to the configured destination
pub async fn run<S>(store: &S, config: &Config) -> Result<Index>
where
    S: ObjectStore + ?Sized,
{
    info!(
        url = %object_url(store.bucket(), &config.index_key()),
        "Starting the restoration of index.yaml"
    );

    let index = rebuild_index(store, &config.prefix).await?;

    info!(
        charts = index.entries.len(),
        versions = index.version_count(),
        "Generating new {}",
        INDEX_FILE_NAME
    );
    let data = index.to_yaml()?;

    deliver(store, &config.destination, data.into_bytes()).await?;
    Ok(index)
}
