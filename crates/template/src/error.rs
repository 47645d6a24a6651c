use std::path::PathBuf;

/// Failure to load template markup. The only fatal error in the engine.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("can't find a template file at {path:?}")]
    NotFound { path: PathBuf },
    #[error("template {path:?} is {size_kib} KiB, over the {limit_kib} KiB limit")]
    TooLarge {
        path: PathBuf,
        size_kib: u64,
        limit_kib: u64,
    },
    #[error("failed to read template {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
