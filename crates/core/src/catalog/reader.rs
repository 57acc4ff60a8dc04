//! In-memory catalog loaded from CSV.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use csv::StringRecord;

use super::types::{CatalogColumns, CatalogError};
use crate::crossmatch::SkyCoords;

/// A loaded catalog: the full records for pass-through rewriting, plus
/// parsed coordinate and pixel-id columns.
#[derive(Debug, Clone)]
pub struct Catalog {
    path: PathBuf,
    headers: StringRecord,
    records: Vec<StringRecord>,
    ra_deg: Vec<f64>,
    dec_deg: Vec<f64>,
    healpix: Option<Vec<i64>>,
    healpix_column: String,
}

impl Catalog {
    /// Load a catalog, parsing the RA/Dec columns and, when present, the
    /// pixel-id column. A missing RA or Dec column is an error; the pixel
    /// column is only required by operations that call [`Catalog::healpix`].
    pub fn load(path: &Path, columns: &CatalogColumns) -> Result<Self, CatalogError> {
        if !path.exists() {
            return Err(CatalogError::NotFound(path.to_path_buf()));
        }

        let mut reader = csv::Reader::from_path(path).map_err(|source| CatalogError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

        let headers = reader
            .headers()
            .map_err(|source| CatalogError::Csv {
                path: path.to_path_buf(),
                source,
            })?
            .clone();

        let ra_idx = find_column(&headers, &columns.ra, path)?;
        let dec_idx = find_column(&headers, &columns.dec, path)?;
        let healpix_idx = headers.iter().position(|h| h == columns.healpix);

        let mut records = Vec::new();
        let mut ra_deg = Vec::new();
        let mut dec_deg = Vec::new();
        let mut healpix = healpix_idx.map(|_| Vec::new());

        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(|source| CatalogError::Csv {
                path: path.to_path_buf(),
                source,
            })?;

            ra_deg.push(parse_f64(&record, ra_idx, row, &columns.ra, path)?);
            dec_deg.push(parse_f64(&record, dec_idx, row, &columns.dec, path)?);

            if let (Some(idx), Some(values)) = (healpix_idx, healpix.as_mut()) {
                values.push(parse_pixel(&record, idx, row, &columns.healpix, path)?);
            }

            records.push(record);
        }

        Ok(Self {
            path: path.to_path_buf(),
            headers,
            records,
            ra_deg,
            dec_deg,
            healpix,
            healpix_column: columns.healpix.clone(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    pub fn records(&self) -> &[StringRecord] {
        &self.records
    }

    pub fn ra_deg(&self) -> &[f64] {
        &self.ra_deg
    }

    pub fn dec_deg(&self) -> &[f64] {
        &self.dec_deg
    }

    /// All row coordinates as a [`SkyCoords`] set.
    pub fn coords(&self) -> SkyCoords {
        SkyCoords::new(self.ra_deg.clone(), self.dec_deg.clone())
            .unwrap_or_else(|_| unreachable!("parallel columns built together"))
    }

    /// The parsed pixel-id column; errors if the catalog has none.
    pub fn healpix(&self) -> Result<&[i64], CatalogError> {
        self.healpix
            .as_deref()
            .ok_or_else(|| CatalogError::MissingColumn {
                path: self.path.clone(),
                column: self.healpix_column.clone(),
            })
    }

    /// Row indices grouped by pixel id, ascending.
    pub fn rows_by_pixel(&self) -> Result<BTreeMap<i64, Vec<usize>>, CatalogError> {
        let mut grouped: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (row, &pix) in self.healpix()?.iter().enumerate() {
            grouped.entry(pix).or_default().push(row);
        }
        Ok(grouped)
    }

    /// Keep only the first `n` rows. Used by sampling operations.
    pub fn truncate(&mut self, n: usize) {
        self.records.truncate(n);
        self.ra_deg.truncate(n);
        self.dec_deg.truncate(n);
        if let Some(values) = self.healpix.as_mut() {
            values.truncate(n);
        }
    }
}

fn find_column(
    headers: &StringRecord,
    name: &str,
    path: &Path,
) -> Result<usize, CatalogError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| CatalogError::MissingColumn {
            path: path.to_path_buf(),
            column: name.to_string(),
        })
}

fn parse_f64(
    record: &StringRecord,
    idx: usize,
    row: usize,
    column: &str,
    path: &Path,
) -> Result<f64, CatalogError> {
    let raw = record.get(idx).unwrap_or("");
    raw.trim()
        .parse::<f64>()
        .map_err(|_| CatalogError::InvalidValue {
            path: path.to_path_buf(),
            row,
            column: column.to_string(),
            value: raw.to_string(),
        })
}

/// Pixel ids are integers, but catalogs rewritten through float-typed
/// tooling can carry values like "657.0"; accept those when exact.
fn parse_pixel(
    record: &StringRecord,
    idx: usize,
    row: usize,
    column: &str,
    path: &Path,
) -> Result<i64, CatalogError> {
    let raw = record.get(idx).unwrap_or("");
    let trimmed = raw.trim();
    if let Ok(v) = trimmed.parse::<i64>() {
        return Ok(v);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if f.fract() == 0.0 && f.is_finite() {
            return Ok(f as i64);
        }
    }
    Err(CatalogError::InvalidValue {
        path: path.to_path_buf(),
        row,
        column: column.to_string(),
        value: raw.to_string(),
    })
}
