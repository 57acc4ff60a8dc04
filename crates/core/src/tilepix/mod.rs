//! The remote tile/pixel coverage index.
//!
//! Maps (pixel id, survey, program) combinations to sky-tile coverage; the
//! transfer requester filters it to decide which coadd files exist to be
//! fetched. The index lives at a fixed public URL and is cacheable locally;
//! a cached copy that fails to parse (typically an HTML error page saved
//! during an outage) is discarded and re-downloaded rather than trusted.

mod fetch;
mod types;

pub use fetch::{read_tilepix_file, TilepixSource};
pub use types::{TilepixError, TilepixFilter, TilepixIndex, TilepixRow, TILEPIX_URL};
