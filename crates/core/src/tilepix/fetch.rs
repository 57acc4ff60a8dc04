//! Cache-or-download loading of the tile/pixel index.

use std::path::{Path, PathBuf};
use std::time::Duration;

use fitsio::FitsFile;
use tracing::{info, warn};

use super::types::{TilepixError, TilepixIndex, TilepixRow, TILEPIX_URL};
use crate::metrics;

const DEFAULT_RETRIES: u32 = 3;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const RETRY_PAUSE: Duration = Duration::from_secs(2);

/// Where and how to obtain the index.
#[derive(Debug, Clone)]
pub struct TilepixSource {
    url: String,
    cache: Option<PathBuf>,
    retries: u32,
    timeout: Duration,
}

impl Default for TilepixSource {
    fn default() -> Self {
        Self {
            url: TILEPIX_URL.to_string(),
            cache: None,
            retries: DEFAULT_RETRIES,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl TilepixSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Cache the downloaded index at `path`, and prefer a valid cached copy
    /// over re-downloading.
    pub fn with_cache(mut self, path: Option<PathBuf>) -> Self {
        self.cache = path;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load the index: a parseable cached copy wins; otherwise download
    /// (with retries), persist, and parse.
    ///
    /// A cached file that fails to parse is treated as corrupt — the
    /// documented symptom is an HTML error page saved during an outage —
    /// and triggers a re-download instead of being used as "zero matches".
    pub async fn load(&self) -> Result<TilepixIndex, TilepixError> {
        if let Some(cache) = &self.cache {
            if cache.exists() {
                match read_tilepix_file(cache) {
                    Ok(index) => {
                        info!(path = %cache.display(), rows = index.len(), "loaded cached tilepix index");
                        return Ok(index);
                    }
                    Err(err) => {
                        metrics::TILEPIX_CACHE_REJECTED.inc();
                        warn!(
                            path = %cache.display(),
                            error = %err,
                            "cached tilepix index is corrupt; re-downloading"
                        );
                    }
                }
            }
        }

        let bytes = self.download().await?;

        // fitsio reads from the filesystem, so persist before parsing: into
        // the cache if one is configured, otherwise a throwaway temp file.
        let (path, ephemeral) = match &self.cache {
            Some(cache) => {
                if let Some(parent) = cache.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                (cache.clone(), false)
            }
            None => (
                std::env::temp_dir().join(format!("tilepix-{}.fits", uuid::Uuid::new_v4())),
                true,
            ),
        };
        std::fs::write(&path, &bytes)?;

        let result = read_tilepix_file(&path).map_err(|err| TilepixError::InvalidIndex {
            path: path.clone(),
            detail: format!(
                "downloaded index failed to parse; the server likely returned an \
                 error page ({err})"
            ),
        });

        if ephemeral {
            let _ = std::fs::remove_file(&path);
        } else if result.is_err() {
            // Never leave a corrupt file where the next run would trust it.
            let _ = std::fs::remove_file(&path);
        }

        let index = result?;
        info!(url = %self.url, rows = index.len(), "downloaded tilepix index");
        Ok(index)
    }

    async fn download(&self) -> Result<Vec<u8>, TilepixError> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| TilepixError::Download {
                url: self.url.clone(),
                attempts: 0,
                detail: e.to_string(),
            })?;

        let mut last_err = String::new();
        for attempt in 1..=self.retries {
            match client.get(&self.url).send().await {
                Ok(response) => match response.error_for_status() {
                    Ok(response) => match response.bytes().await {
                        Ok(bytes) => return Ok(bytes.to_vec()),
                        Err(e) => last_err = e.to_string(),
                    },
                    Err(e) => last_err = e.to_string(),
                },
                Err(e) => last_err = e.to_string(),
            }
            warn!(
                url = %self.url,
                attempt,
                retries = self.retries,
                error = %last_err,
                "tilepix download attempt failed"
            );
            if attempt < self.retries {
                tokio::time::sleep(RETRY_PAUSE).await;
            }
        }

        Err(TilepixError::Download {
            url: self.url.clone(),
            attempts: self.retries,
            detail: last_err,
        })
    }
}

/// Parse a tilepix FITS file into an index.
pub fn read_tilepix_file(path: &Path) -> Result<TilepixIndex, TilepixError> {
    let mut fptr = FitsFile::open(path).map_err(|source| TilepixError::InvalidIndex {
        path: path.to_path_buf(),
        detail: source.to_string(),
    })?;

    // The coverage table is the first extension; named TILEPIX in DR1.
    let hdu = fptr
        .hdu("TILEPIX")
        .or_else(|_| fptr.hdu(1))
        .map_err(|source| TilepixError::InvalidIndex {
            path: path.to_path_buf(),
            detail: format!("no table extension found ({source})"),
        })?;

    let healpix: Vec<i64> = hdu
        .read_col(&mut fptr, "HEALPIX")
        .map_err(|_| TilepixError::MissingColumn {
            path: path.to_path_buf(),
            column: "HEALPIX".to_string(),
        })?;
    let survey: Vec<String> = hdu
        .read_col(&mut fptr, "SURVEY")
        .map_err(|_| TilepixError::MissingColumn {
            path: path.to_path_buf(),
            column: "SURVEY".to_string(),
        })?;
    let program: Vec<String> = hdu
        .read_col(&mut fptr, "PROGRAM")
        .map_err(|_| TilepixError::MissingColumn {
            path: path.to_path_buf(),
            column: "PROGRAM".to_string(),
        })?;

    if healpix.len() != survey.len() || healpix.len() != program.len() {
        return Err(TilepixError::InvalidIndex {
            path: path.to_path_buf(),
            detail: format!(
                "column lengths disagree: HEALPIX={} SURVEY={} PROGRAM={}",
                healpix.len(),
                survey.len(),
                program.len()
            ),
        });
    }

    let rows = healpix
        .into_iter()
        .zip(survey)
        .zip(program)
        .map(|((healpix, survey), program)| TilepixRow {
            healpix: healpix.max(0) as u64,
            survey: survey.trim().to_string(),
            program: program.trim().to_string(),
        })
        .collect();

    Ok(TilepixIndex::new(rows))
}
