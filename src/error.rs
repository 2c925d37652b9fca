use std::path::PathBuf;
use thiserror::Error;

/// Fatal failures while building the snapshot. Row-level problems are not
/// errors; the loader skips and counts them.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
