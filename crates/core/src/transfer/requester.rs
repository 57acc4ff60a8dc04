//! Building and submitting transfer plans from index rows.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use tracing::{info, warn};
use uuid::Uuid;

use super::traits::TransferService;
use super::types::{SyncLevel, TransferError, TransferItem, TransferReceipt, TransferSpec};
use crate::coadd::CoaddName;
use crate::healpix::pixel_group;
use crate::metrics;
use crate::tilepix::{TilepixFilter, TilepixIndex};

const DEFAULT_BATCH_SIZE: usize = 500;
const DEFAULT_BATCH_DELAY_SECS: u64 = 5;

/// Options controlling plan construction and submission.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Surveys to request (default: `main`).
    pub surveys: Vec<String>,
    /// Programs to request; empty requests all.
    pub programs: Vec<String>,
    /// Pixel ids to request; `None` requests all covered pixels.
    pub healpix: Option<BTreeSet<u64>>,
    /// Items per submitted batch.
    pub batch_size: usize,
    /// Pause between batch submissions.
    pub batch_delay: Duration,
    /// Cap on the number of batches submitted.
    pub max_batches: Option<usize>,
    /// Extra remote files to ride along in the first batch.
    pub extra_files: Vec<String>,
    pub sync_level: SyncLevel,
    pub verify_checksum: bool,
    /// Fail the whole batch when a source file is missing, instead of
    /// skipping it.
    pub fail_on_missing_source: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            surveys: vec!["main".to_string()],
            programs: Vec::new(),
            healpix: None,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay: Duration::from_secs(DEFAULT_BATCH_DELAY_SECS),
            max_batches: None,
            extra_files: Vec::new(),
            sync_level: SyncLevel::Exists,
            verify_checksum: false,
            fail_on_missing_source: false,
        }
    }
}

/// The batches ready for submission.
#[derive(Debug, Clone)]
pub struct TransferPlan {
    pub batches: Vec<TransferSpec>,
}

impl TransferPlan {
    pub fn total_items(&self) -> usize {
        self.batches.iter().map(|b| b.items.len()).sum()
    }
}

/// Normalise a destination path to an absolute form.
///
/// A path without a leading separator would be resolved by the endpoint
/// relative to its home directory and then joined again by callers, the
/// documented `/home/USER/home/USER` duplication. It is corrected (with a
/// warning) rather than passed through; an empty path is rejected.
pub fn normalize_destination(path: &str) -> Result<String, TransferError> {
    let trimmed = path.trim();
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '/') {
        return Err(TransferError::InvalidDestination {
            path: path.to_string(),
            reason: "destination must name a directory".to_string(),
        });
    }

    let mut normalized = if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        warn!(
            path = trimmed,
            "destination path is not absolute; prepending '/' to avoid \
             duplicated home-relative paths"
        );
        format!("/{trimmed}")
    };

    while normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    Ok(normalized)
}

/// Remote source path of a coadd in the DESI DR1 healpix layout.
pub fn coadd_source_path(survey: &str, program: &str, healpix: u64) -> String {
    format!(
        "/dr1/spectro/redux/iron/healpix/{survey}/{program}/{group}/{healpix}/{file}",
        group = pixel_group(healpix),
        file = CoaddName::new(survey, program, healpix).file_name(),
    )
}

/// Read pixel ids from a text file: one id per line, `#` comments and blank
/// lines allowed.
pub fn read_healpix_ids(path: &Path) -> Result<BTreeSet<u64>, TransferError> {
    let content = std::fs::read_to_string(path).map_err(|e| TransferError::HealpixFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut ids = BTreeSet::new();
    for (line_no, line) in content.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let id = line.parse::<u64>().map_err(|_| TransferError::HealpixFile {
            path: path.to_path_buf(),
            reason: format!("line {}: '{line}' is not a pixel id", line_no + 1),
        })?;
        ids.insert(id);
    }

    if ids.is_empty() {
        return Err(TransferError::HealpixFile {
            path: path.to_path_buf(),
            reason: "no pixel ids found".to_string(),
        });
    }
    Ok(ids)
}

/// Filter the index and lay out submission batches.
pub fn build_plan(
    index: &TilepixIndex,
    destination: &str,
    options: &RequestOptions,
) -> Result<TransferPlan, TransferError> {
    let destination = normalize_destination(destination)?;

    let filter = TilepixFilter {
        surveys: options.surveys.clone(),
        programs: options.programs.clone(),
        healpix: options.healpix.clone(),
    };
    let filtered = index.filter(&filter);
    info!(
        entries = filtered.len(),
        surveys = ?options.surveys,
        "matched unique (pixel, survey, program) combinations"
    );

    let items: Vec<TransferItem> = filtered
        .rows()
        .iter()
        .map(|row| TransferItem {
            source: coadd_source_path(&row.survey, &row.program, row.healpix),
            destination: format!(
                "{destination}/{}",
                CoaddName::new(&row.survey, &row.program, row.healpix).file_name()
            ),
        })
        .collect();

    let batch_size = options.batch_size.max(1);
    let mut total_batches = items.len().div_ceil(batch_size);
    if let Some(cap) = options.max_batches {
        total_batches = total_batches.min(cap);
    }

    let run_id = Uuid::new_v4();
    let mut batches = Vec::with_capacity(total_batches);
    for (batch_no, chunk) in items.chunks(batch_size).take(total_batches).enumerate() {
        let mut batch_items = Vec::with_capacity(chunk.len() + options.extra_files.len());

        // Static ride-along files go in the first batch only.
        if batch_no == 0 {
            for extra in &options.extra_files {
                let file_name = extra.rsplit('/').next().unwrap_or(extra);
                batch_items.push(TransferItem {
                    source: extra.clone(),
                    destination: format!("{destination}/{file_name}"),
                });
            }
        }
        batch_items.extend_from_slice(chunk);

        batches.push(TransferSpec {
            label: format!(
                "desipix {run_id} batch {}/{total_batches}",
                batch_no + 1
            ),
            sync_level: options.sync_level,
            verify_checksum: options.verify_checksum,
            preserve_timestamp: true,
            skip_source_errors: !options.fail_on_missing_source,
            items: batch_items,
        });
    }

    Ok(TransferPlan { batches })
}

/// Submit every batch of a plan in order, pausing between submissions.
pub async fn submit_plan(
    service: &dyn TransferService,
    plan: TransferPlan,
    batch_delay: Duration,
) -> Result<Vec<TransferReceipt>, TransferError> {
    let total = plan.batches.len();
    let mut receipts = Vec::with_capacity(total);

    for (batch_no, spec) in plan.batches.into_iter().enumerate() {
        let items = spec.items.len();
        info!(batch = batch_no + 1, total, items, "submitting batch");

        let receipt = service.submit(spec).await?;
        metrics::TRANSFER_BATCHES.inc();
        metrics::TRANSFER_ITEMS.inc_by(items as u64);
        receipts.push(receipt);

        if batch_no + 1 < total && !batch_delay.is_zero() {
            tokio::time::sleep(batch_delay).await;
        }
    }

    Ok(receipts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tilepix::TilepixRow;

    fn index() -> TilepixIndex {
        TilepixIndex::new(vec![
            TilepixRow {
                healpix: 26421,
                survey: "main".to_string(),
                program: "dark".to_string(),
            },
            TilepixRow {
                healpix: 26421,
                survey: "main".to_string(),
                program: "dark".to_string(),
            },
            TilepixRow {
                healpix: 7,
                survey: "main".to_string(),
                program: "bright".to_string(),
            },
            TilepixRow {
                healpix: 7,
                survey: "sv3".to_string(),
                program: "dark".to_string(),
            },
        ])
    }

    #[test]
    fn destination_absolute_passthrough() {
        assert_eq!(
            normalize_destination("/data/globus/").unwrap(),
            "/data/globus"
        );
    }

    #[test]
    fn destination_relative_is_corrected() {
        assert_eq!(
            normalize_destination("home/user/data").unwrap(),
            "/home/user/data"
        );
    }

    #[test]
    fn destination_empty_rejected() {
        assert!(matches!(
            normalize_destination("  "),
            Err(TransferError::InvalidDestination { .. })
        ));
        assert!(matches!(
            normalize_destination("/"),
            Err(TransferError::InvalidDestination { .. })
        ));
    }

    #[test]
    fn source_path_layout() {
        assert_eq!(
            coadd_source_path("main", "dark", 26421),
            "/dr1/spectro/redux/iron/healpix/main/dark/264/26421/coadd-main-dark-26421.fits"
        );
    }

    #[test]
    fn plan_dedups_and_names_deterministically() {
        let plan = build_plan(&index(), "/data/globus", &RequestOptions::default()).unwrap();
        assert_eq!(plan.batches.len(), 1);
        // The duplicate (26421, main, dark) row collapses; sv3 is filtered
        // out by the default survey list.
        assert_eq!(plan.total_items(), 2);
        let destinations: Vec<&str> = plan.batches[0]
            .items
            .iter()
            .map(|i| i.destination.as_str())
            .collect();
        assert!(destinations.contains(&"/data/globus/coadd-main-bright-7.fits"));
        assert!(destinations.contains(&"/data/globus/coadd-main-dark-26421.fits"));
    }

    #[test]
    fn plan_batches_and_caps() {
        let mut options = RequestOptions {
            batch_size: 1,
            ..RequestOptions::default()
        };
        let plan = build_plan(&index(), "/dest", &options).unwrap();
        assert_eq!(plan.batches.len(), 2);
        assert!(plan.batches[0].label.contains("batch 1/2"));

        options.max_batches = Some(1);
        let capped = build_plan(&index(), "/dest", &options).unwrap();
        assert_eq!(capped.batches.len(), 1);
        assert_eq!(capped.total_items(), 1);
    }

    #[test]
    fn extra_files_ride_in_first_batch() {
        let options = RequestOptions {
            batch_size: 1,
            extra_files: vec!["/dr1/spectro/redux/iron/tiles-iron.csv".to_string()],
            ..RequestOptions::default()
        };
        let plan = build_plan(&index(), "/dest", &options).unwrap();
        assert_eq!(plan.batches[0].items[0].destination, "/dest/tiles-iron.csv");
        assert!(plan.batches[1..]
            .iter()
            .all(|b| b.items.iter().all(|i| !i.source.ends_with(".csv"))));
    }

    #[test]
    fn healpix_ids_file_parsing() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("pix64.txt");
        std::fs::write(&path, "# header\n7\n26421  # covered\n\n7\n").unwrap();
        let ids = read_healpix_ids(&path).unwrap();
        assert_eq!(ids, BTreeSet::from([7, 26421]));
    }

    #[test]
    fn healpix_ids_file_rejects_garbage() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("pix64.txt");
        std::fs::write(&path, "seven\n").unwrap();
        assert!(matches!(
            read_healpix_ids(&path),
            Err(TransferError::HealpixFile { .. })
        ));

        let empty = dir.path().join("empty.txt");
        std::fs::write(&empty, "# nothing\n").unwrap();
        assert!(matches!(
            read_healpix_ids(&empty),
            Err(TransferError::HealpixFile { .. })
        ));
    }
}
