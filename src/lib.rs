//! helm-s3-reindex - Rebuild a Helm chart repository index from S3
//!
//! Restores a lost or corrupted `index.yaml` for a chart repository hosted
//! in an S3 bucket. Every `.tgz` archive under a key prefix is fetched, its
//! `Chart.yaml` is read, and the result is written as a fresh index.
//!
//! # Pipeline
//!
//! 1. **List** every object under the prefix and keep the `.tgz` archives
//! 2. **Extract** the first `Chart.yaml` member of each archive
//! 3. **Build** an entry from it, adding the archive URL, its last-modified
//!    time and the digest stored in the `chart-digest` object metadata
//! 4. **Assemble** the index, grouping versions by chart name in listing order
//! 5. **Deliver** `index.yaml` to the working directory or back to the bucket
//!
//! Archives are processed sequentially and the first error aborts the run,
//! so a partial index is never written.
//!
//! # Example
//!
//! ```no_run
//! use helm_s3_reindex::{pipeline, Config, Destination, S3Store};
//! use std::path::PathBuf;
//!
//! # async fn example() -> helm_s3_reindex::Result<()> {
//! let config = Config {
//!     bucket: "charts-bucket".to_string(),
//!     prefix: "stable/".to_string(),
//!     profile: "default".to_string(),
//!     region: None,
//!     endpoint_url: None,
//!     destination: Destination::Local(PathBuf::from("index.yaml")),
//! };
//! let store = S3Store::connect(&config).await;
//! let index = pipeline::run(&store, &config).await?;
//! println!("{} chart versions indexed", index.version_count());
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod chart;
pub mod config;
pub mod error;
pub mod index;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod pipeline;
pub mod sink;
pub mod storage;

pub use chart::{Annotation, Entry, Maintainer};
pub use config::{Cli, Config, Destination};
pub use error::{Error, Result};
pub use index::{Index, IndexBuilder};
#[cfg(any(test, feature = "test-util"))]
pub use memory::MemoryStore;
pub use storage::{ObjectStore, S3Store};
