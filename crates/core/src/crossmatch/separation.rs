//! Exact angular separations on the sphere.

use super::SkyCoords;

const ARCSEC_PER_DEG: f64 = 3600.0;

/// Angular separation between two positions, in arcseconds.
///
/// Uses the spherical law of cosines with the cosine clamped to [-1, 1];
/// adequate at arcsecond scales for the separations this toolkit deals in.
pub fn angular_separation_arcsec(ra1: f64, dec1: f64, ra2: f64, dec2: f64) -> f64 {
    let d1 = dec1.to_radians();
    let d2 = dec2.to_radians();
    let dra = (ra1 - ra2).to_radians();
    let cos_sep = d1.sin() * d2.sin() + d1.cos() * d2.cos() * dra.cos();
    cos_sep.clamp(-1.0, 1.0).acos().to_degrees() * ARCSEC_PER_DEG
}

/// Precomputed trig for one coordinate set, shared across probe rows.
struct TrigColumns {
    ra_rad: Vec<f64>,
    sin_dec: Vec<f64>,
    cos_dec: Vec<f64>,
}

impl TrigColumns {
    fn new(coords: &SkyCoords) -> Self {
        let ra_rad = coords.ra_deg().iter().map(|r| r.to_radians()).collect();
        let sin_dec = coords
            .dec_deg()
            .iter()
            .map(|d| d.to_radians().sin())
            .collect();
        let cos_dec = coords
            .dec_deg()
            .iter()
            .map(|d| d.to_radians().cos())
            .collect();
        Self {
            ra_rad,
            sin_dec,
            cos_dec,
        }
    }
}

/// For every probe row, the minimum separation (arcsec) to any row of
/// `against`. Probe rows get `f64::INFINITY` when `against` is empty.
pub fn min_separations_arcsec(probe: &SkyCoords, against: &SkyCoords) -> Vec<f64> {
    let trig = TrigColumns::new(against);
    let mut min_sep = vec![f64::INFINITY; probe.len()];

    for (i, sep) in min_sep.iter_mut().enumerate() {
        let (ra, dec) = probe.get(i);
        let ra_rad = ra.to_radians();
        let dec_rad = dec.to_radians();
        let (sin_d, cos_d) = (dec_rad.sin(), dec_rad.cos());

        let mut best = f64::INFINITY;
        for j in 0..against.len() {
            let cos_sep = sin_d * trig.sin_dec[j]
                + cos_d * trig.cos_dec[j] * (ra_rad - trig.ra_rad[j]).cos();
            let s = cos_sep.clamp(-1.0, 1.0).acos();
            if s < best {
                best = s;
            }
        }
        *sep = best.to_degrees() * ARCSEC_PER_DEG;
    }

    min_sep
}

/// Indices of probe rows whose nearest `against` row lies within
/// `max_arcsec`, in ascending order.
pub fn match_indices(probe: &SkyCoords, against: &SkyCoords, max_arcsec: f64) -> Vec<usize> {
    min_separations_arcsec(probe, against)
        .iter()
        .enumerate()
        .filter(|(_, &sep)| sep <= max_arcsec)
        .map(|(i, _)| i)
        .collect()
}

/// Number of probe rows within `max_arcsec` of some `against` row.
pub fn count_within(probe: &SkyCoords, against: &SkyCoords, max_arcsec: f64) -> usize {
    min_separations_arcsec(probe, against)
        .iter()
        .filter(|&&sep| sep <= max_arcsec)
        .count()
}
