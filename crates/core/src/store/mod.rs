//! Per-pixel crossmatch store.
//!
//! One HDF5 file per coarse pixel id, laid out as
//! `<root>/healpix=<pixel>/crossmatch_desi.hdf5`, holding 1-D RA/Dec
//! datasets for the spectra matched into that pixel.

mod match_store;
mod types;

pub use match_store::{MatchStore, STORE_FILE_NAME};
pub use types::StoreError;
