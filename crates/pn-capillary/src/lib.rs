//! pn-capillary: entry-pressure and corner-film model.
//!
//! Pure geometric functions over element state. Nothing here touches the
//! solver or the cluster engine; outputs only gate later invasion and
//! transport decisions.

pub mod entry;
pub mod film;

pub use entry::{bulk_conductance, competitive_entry_pressure, entry_pressure, snapoff_pressure};
pub use film::{corner_half_angles, film_area_coefficient, sustains_film, update_films};

/// Largest shape factor admitting a non-degenerate triangular cross
/// section, √3/36. Above this no stable corner film exists.
pub const G_TRIANGLE_MAX: f64 = 0.048112522432468816;

#[cfg(test)]
mod tests {
    use super::G_TRIANGLE_MAX;

    #[test]
    fn triangle_limit_is_sqrt3_over_36() {
        assert!((G_TRIANGLE_MAX - 3f64.sqrt() / 36.0).abs() < 1e-15);
    }
}
