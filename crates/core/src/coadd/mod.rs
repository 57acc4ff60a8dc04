//! Coadd files: naming, reading, extraction to HDF5, and trimming to
//! matched rows.

mod count_local;
mod extract;
mod reader;
mod trim;
mod types;

pub use count_local::{count_local_matches, FileCount, LocalCountOptions, LocalCountReport};
pub use extract::{extract_coadd, ExtractOptions, ExtractSummary};
pub use reader::{list_coadd_files, CoaddReader};
pub use trim::{trim_coadd, trimmed_path, TrimOptions, TrimSummary};
pub use types::{BandData, CoaddError, CoaddName, FiberMap, DEFAULT_BANDS};
