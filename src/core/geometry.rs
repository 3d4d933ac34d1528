use crate::util::coord::e6_to_degrees;
use geo_types::{Coord, Polygon, Rect};

/// Square cell extent in degrees from its south-west corner in E6 units.
pub fn create_cell_rect(lat_e6: i64, lon_e6: i64, size_e6: i64) -> Rect<f64> {
    Rect::new(
        Coord {
            x: e6_to_degrees(lon_e6),
            y: e6_to_degrees(lat_e6),
        },
        Coord {
            x: e6_to_degrees(lon_e6.saturating_add(size_e6)),
            y: e6_to_degrees(lat_e6.saturating_add(size_e6)),
        },
    )
}

pub fn create_cell_polygon(lat_e6: i64, lon_e6: i64, size_e6: i64) -> Polygon<f64> {
    create_cell_rect(lat_e6, lon_e6, size_e6).to_polygon()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_cell_polygon() {
        let cell = create_cell_polygon(41_000_000, 29_000_000, 900);
        let exterior = cell.exterior();
        assert_eq!(exterior.coords().count(), 5); // 4 corners + 1 to close
        assert_eq!(exterior.0[0], exterior.0[4]);
    }

    #[test]
    fn test_create_cell_rect() {
        let rect = create_cell_rect(41_000_000, 29_000_000, 900);
        assert!((rect.width() - 0.0009).abs() < 1e-12);
        assert!((rect.height() - 0.0009).abs() < 1e-12);
    }
}
