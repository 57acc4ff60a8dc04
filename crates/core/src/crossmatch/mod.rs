//! Angular crossmatching between coordinate sets.
//!
//! The matching is exact spherical trigonometry (no spatial index): the
//! catalogs involved are small enough that a chunked brute-force pass is the
//! documented approach, and spatial indexing is out of scope.

mod coords;
mod counter;
mod separation;

pub use coords::{LengthMismatch, SkyCoords};
pub use counter::{count_store_matches, CountError, CountReport, PixelCount};
pub use separation::{
    angular_separation_arcsec, count_within, match_indices, min_separations_arcsec,
};
