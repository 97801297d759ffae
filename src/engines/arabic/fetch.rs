//! Model file acquisition.

use std::path::PathBuf;
use std::sync::Arc;

use super::catalog::ModelCatalogEntry;

/// Environment variable overriding the model root directory.
pub const MODEL_HOME_ENV: &str = "TTS_ARABIC_HOME";

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("Model file not found at {0}")]
    NotFound(PathBuf),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "download")]
    #[error("Download of {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Resolves a catalog entry to a local file, fetching it if needed.
///
/// Only existence is checked; a present file is never re-validated.
pub trait ModelFetcher: Send + Sync {
    fn ensure_local(&self, entry: &ModelCatalogEntry) -> Result<PathBuf, FetchError>;
}

/// `$TTS_ARABIC_HOME`, else the working directory.
///
/// Catalog paths already start with `data/`.
pub fn default_model_root() -> PathBuf {
    std::env::var_os(MODEL_HOME_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Offline fetcher: the file must already exist under `root`.
#[derive(Debug, Clone)]
pub struct LocalFetcher {
    root: PathBuf,
}

impl LocalFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ModelFetcher for LocalFetcher {
    fn ensure_local(&self, entry: &ModelCatalogEntry) -> Result<PathBuf, FetchError> {
        let path = self.root.join(entry.file);
        if path.exists() {
            Ok(path)
        } else {
            Err(FetchError::NotFound(path))
        }
    }
}

/// Downloading fetcher when the `download` feature is on and `offline` is
/// false, otherwise [`LocalFetcher`].
pub fn default_fetcher(root: impl Into<PathBuf>, offline: bool) -> Arc<dyn ModelFetcher> {
    let root = root.into();
    #[cfg(feature = "download")]
    {
        if !offline {
            match HttpFetcher::new(root.clone()) {
                Ok(fetcher) => return Arc::new(fetcher),
                Err(e) => log::warn!("HTTP client unavailable, using local files only: {e}"),
            }
        }
    }
    #[cfg(not(feature = "download"))]
    let _ = offline;
    Arc::new(LocalFetcher::new(root))
}

/// Rewrite a Google Drive share link into a direct download link.
pub fn direct_download_url(url: &str) -> String {
    const MARKER: &str = "drive.google.com/file/d/";
    match url.find(MARKER) {
        Some(pos) => {
            let rest = &url[pos + MARKER.len()..];
            let id = rest.split(['/', '?']).next().unwrap_or(rest);
            format!("https://drive.google.com/uc?export=download&confirm=t&id={id}")
        }
        None => url.to_string(),
    }
}

#[cfg(feature = "download")]
pub use http::HttpFetcher;

#[cfg(feature = "download")]
mod http {
    use std::fs::{self, File};
    use std::io::{self, Write};
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    use reqwest::blocking::Client;

    use super::{direct_download_url, FetchError, ModelCatalogEntry, ModelFetcher};

    /// Downloads missing model files into `root`.
    #[derive(Debug, Clone)]
    pub struct HttpFetcher {
        root: PathBuf,
        client: Client,
    }

    impl HttpFetcher {
        pub fn new(root: impl Into<PathBuf>) -> Result<Self, FetchError> {
            let client = Client::builder()
                .user_agent(concat!("tts-arabic/", env!("CARGO_PKG_VERSION")))
                .connect_timeout(Duration::from_secs(10))
                .timeout(Duration::from_secs(600))
                .build()
                .map_err(|source| FetchError::Http {
                    url: String::new(),
                    source,
                })?;
            Ok(Self {
                root: root.into(),
                client,
            })
        }    }

    impl ModelFetcher for HttpFetcher {
        fn ensure_local(&self, entry: &ModelCatalogEntry) -> Result<PathBuf, FetchError> {
            let path = self.root.join(entry.file);
            if path.exists() {
                return Ok(path);
            }
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            log::info!("Downloading model '{}' to {}", entry.name, path.display());
            download(&self.client, &direct_download_url(entry.url), &path)?;
            Ok(path)
        }
    }

    /// Download into a temporary sibling and rename into place, so a failed
    /// transfer never leaves a file at `dest`.
    fn download(client: &Client, url: &str, dest: &Path) -> Result<(), FetchError> {
        let temp_path = dest.with_extension("download.tmp");
        let http = |source: reqwest::Error| FetchError::Http {
            url: url.to_string(),
            source,
        };

        let result = (|| -> Result<(), FetchError> {
            let mut response = client
                .get(url)
                .send()
                .and_then(|r| r.error_for_status())
                .map_err(http)?;
            let mut file = File::create(&temp_path)?;
            io::copy(&mut response, &mut file)?;
            file.flush()?;
            fs::rename(&temp_path, dest)?;
            Ok(())
        })();

        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::arabic::catalog::VocoderId;

    #[test]
    fn drive_links_become_direct_downloads() {
        assert_eq!(
            direct_download_url(
                "https://drive.google.com/file/d/1rZxulMhjrlQDheoGy7xnlWGjFYyjF9Gz/view?usp=sharing"
            ),
            "https://drive.google.com/uc?export=download&confirm=t&id=1rZxulMhjrlQDheoGy7xnlWGjFYyjF9Gz"
        );
        assert_eq!(
            direct_download_url("https://example.com/m.onnx"),
            "https://example.com/m.onnx"
        );
    }

    #[test]
    fn local_fetcher_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = LocalFetcher::new(dir.path());
        let entry = VocoderId::HifiGan.catalog_entry();

        assert!(matches!(
            fetcher.ensure_local(entry),
            Err(FetchError::NotFound(_))
        ));

        let path = dir.path().join(entry.file);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"onnx").unwrap();
        assert_eq!(fetcher.ensure_local(entry).unwrap(), path);
    }

    #[cfg(feature = "download")]
    mod download {
        use std::io::{Read, Write};
        use std::net::TcpListener;
        use std::path::{Path, PathBuf};
        use std::thread;

        use crate::engines::arabic::catalog::ModelCatalogEntry;
        use crate::engines::arabic::fetch::{FetchError, HttpFetcher, ModelFetcher};

        fn entry(url: &'static str) -> ModelCatalogEntry {
            ModelCatalogEntry {
                name: "hifigan",
                file: "data/x.onnx",
                url,
            }
        }

        fn files_under_data(root: &Path) -> Vec<PathBuf> {
            std::fs::read_dir(root.join("data"))
                .map(|dir| dir.filter_map(Result::ok).map(|e| e.path()).collect())
                .unwrap_or_default()
        }

        #[test]
        fn unreachable_host_leaves_nothing_behind() {
            let dir = tempfile::tempdir().unwrap();
            let fetcher = HttpFetcher::new(dir.path()).unwrap();

            let err = fetcher
                .ensure_local(&entry("http://127.0.0.1:1/x.onnx"))
                .unwrap_err();
            assert!(matches!(err, FetchError::Http { .. }), "{err}");
            assert!(files_under_data(dir.path()).is_empty());
        }

        #[test]
        fn truncated_transfer_leaves_nothing_behind() {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let port = listener.local_addr().unwrap().port();
            let server = thread::spawn(move || {
                let (mut stream, _) = listener.accept().unwrap();
                let mut request = [0u8; 4096];
                let _ = stream.read(&mut request);
                let _ = stream.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 4096\r\n\r\npartial");
            });
            let url: &'static str =
                Box::leak(format!("http://127.0.0.1:{port}/x.onnx").into_boxed_str());

            let dir = tempfile::tempdir().unwrap();
            let fetcher = HttpFetcher::new(dir.path()).unwrap();
            assert!(fetcher.ensure_local(&entry(url)).is_err());
            server.join().unwrap();
            assert!(files_under_data(dir.path()).is_empty());
        }
    }
}
