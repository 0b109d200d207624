use std::path::PathBuf;

use clap::Parser;

use crate::index::INDEX_FILE_NAME;

/// Command-line options
#[derive(Debug, Parser)]
#[command(
    name = "helm-s3-reindex",
    version,
    about = "Rebuild a Helm repository index.yaml from the chart archives in an S3 bucket"
)]
pub struct Cli {
    /// Name of the S3 bucket. For s3://helmcharts-demo/my-demo enter helmcharts-demo
    #[arg(long, env = "HELM_S3_BUCKET")]
    pub bucket: String,

    /// Directory in the bucket holding the charts, if not the bucket root.
    /// For s3://helmcharts-demo/my-demo enter my-demo
    #[arg(long, env = "HELM_S3_DIRECTORY", default_value = "")]
    pub directory: String,

    /// Locally configured AWS profile used for every S3 call
    #[arg(long, env = "AWS_PROFILE")]
    pub profile: String,

    /// Upload the new index.yaml to the bucket instead of writing ./index.yaml
    #[arg(long)]
    pub upload: bool,

    /// Override the region from the profile
    #[arg(long)]
    pub region: Option<String>,

    /// Custom S3-compatible endpoint, e.g. http://localhost:9000
    #[arg(long)]
    pub endpoint_url: Option<String>,
}

/// Where the rebuilt index goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Write to a local file, replacing it if it exists
    Local(PathBuf),
    /// Put an object at this key in the source bucket
    Bucket(String),
}

/// Run configuration, built once at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub bucket: String,
    /// Key prefix; empty or ending in `/`
    pub prefix: String,
    pub profile: String,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub destination: Destination,
}

impl Config {
    /// `index.yaml` under the prefix
    pub fn index_key(&self) -> String {
        format!("{}{}", self.prefix, INDEX_FILE_NAME)
    }
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        let prefix = normalize_prefix(&cli.directory);
        let destination = if cli.upload {
            Destination::Bucket(format!("{}{}", prefix, INDEX_FILE_NAME))
        } else {
            Destination::Local(PathBuf::from(INDEX_FILE_NAME))
        };

        Self {
            bucket: cli.bucket,
            prefix,
            profile: cli.profile,
            region: cli.region,
            endpoint_url: cli.endpoint_url,
            destination,
        }
    }
}

/// Append a trailing `/` to a non-empty prefix that lacks one
pub fn normalize_prefix(prefix: &str) -> String {
    if prefix.is_empty() || prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{}/", prefix)
    }
}
