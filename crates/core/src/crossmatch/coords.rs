//! A column-oriented set of equatorial coordinates.

use thiserror::Error;

/// Mismatched RA/Dec column lengths.
#[derive(Debug, Error)]
#[error("coordinate column length mismatch: {ra_len} RA values vs {dec_len} Dec values")]
pub struct LengthMismatch {
    pub ra_len: usize,
    pub dec_len: usize,
}

/// A set of sky positions in degrees, stored as parallel columns.
#[derive(Debug, Clone, Default)]
pub struct SkyCoords {
    ra_deg: Vec<f64>,
    dec_deg: Vec<f64>,
}

impl SkyCoords {
    pub fn new(ra_deg: Vec<f64>, dec_deg: Vec<f64>) -> Result<Self, LengthMismatch> {
        if ra_deg.len() != dec_deg.len() {
            return Err(LengthMismatch {
                ra_len: ra_deg.len(),
                dec_len: dec_deg.len(),
            });
        }
        Ok(Self { ra_deg, dec_deg })
    }

    pub fn len(&self) -> usize {
        self.ra_deg.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ra_deg.is_empty()
    }

    pub fn ra_deg(&self) -> &[f64] {
        &self.ra_deg
    }

    pub fn dec_deg(&self) -> &[f64] {
        &self.dec_deg
    }

    /// Position at row `i` as (ra, dec) in degrees.
    pub fn get(&self, i: usize) -> (f64, f64) {
        (self.ra_deg[i], self.dec_deg[i])
    }

    /// The subset of rows at the given indices.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            ra_deg: indices.iter().map(|&i| self.ra_deg[i]).collect(),
            dec_deg: indices.iter().map(|&i| self.dec_deg[i]).collect(),
        }
    }
}
