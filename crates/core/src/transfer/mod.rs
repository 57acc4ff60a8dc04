//! Transfer requesting: turning tile/pixel index rows into file-transfer
//! submissions against an external transfer service.
//!
//! The service itself is external and authenticated out-of-band; this
//! module owns building the deterministic remote paths, batching, and the
//! REST submission, behind the [`TransferService`] seam.

mod globus;
mod requester;
mod traits;
mod types;

pub use globus::{GlobusConfig, GlobusTransferClient, DESI_SOURCE_ENDPOINT};
pub use requester::{
    build_plan, coadd_source_path, normalize_destination, read_healpix_ids, submit_plan,
    RequestOptions, TransferPlan,
};
pub use traits::TransferService;
pub use types::{SyncLevel, TransferError, TransferItem, TransferReceipt, TransferSpec};
