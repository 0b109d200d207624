use std::path::Path;

use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::config::Destination;
use crate::error::{Error, Result};
use crate::storage::{object_url, ObjectStore};

/// Content type set on an uploaded index
pub const INDEX_CONTENT_TYPE: &str = "application/x-yaml";

/// Permission bits of a newly created local index
#[cfg(unix)]
const INDEX_FILE_MODE: u32 = 0o664;

/// Deliver the encoded index to its destination
pub async fn deliver<S>(store: &S, destination: &Destination, data: Vec<u8>) -> Result<()>
where
    S: ObjectStore + ?Sized,
{
    match destination {
        Destination::Local(path) => {
            write_local(path, &data).await?;
            info!(path = %path.display(), "Successfully generated index.yaml");
        }
        Destination::Bucket(key) => {
            info!(key = %key, "Uploading new index.yaml");
            store.put_object(key, data, INDEX_CONTENT_TYPE).await?;
            info!(url = %object_url(store.bucket(), key), "Successfully restored index.yaml");
        }
    }
    Ok(())
}

async fn write_local(path: &Path, data: &[u8]) -> Result<()> {
    let to_error = |source: std::io::Error| Error::WriteFile {
        path: path.to_path_buf(),
        source,
    };

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(INDEX_FILE_MODE);

    let mut file = options.open(path).await.map_err(to_error)?;
    file.write_all(data).await.map_err(to_error)?;
    file.flush().await.map_err(to_error)?;
    Ok(())
}
