use crate::api::heatmap::Heatmap;
use crate::util::error::CityPulseError;
use arrow_array::{Float64Array, Int64Array, RecordBatch, StringArray, UInt8Array, UInt64Array};
use arrow_schema::{DataType, Field, Schema};
use geo::Centroid;
use geoarrow_array::IntoArrow;
use geoarrow_array::array::{PointArray, PolygonArray};
use geoarrow_array::builder::{PointBuilder, PolygonBuilder};
use geoarrow_schema::{Crs, Dimension, Metadata, PointType, PolygonType};
use std::sync::Arc;

fn wgs84_metadata() -> Arc<Metadata> {
    let crs = Crs::from_authority_code("EPSG:4326".to_string());
    Arc::new(Metadata::new(crs, None))
}

/// Converts a [`Heatmap`] to Arrow arrays, one row per cell in key order.
pub trait HeatmapToArrow {
    /// Cell centers as an Arrow PointArray.
    fn to_arrow_points(&self) -> PointArray;
    /// Cell squares as an Arrow PolygonArray.
    fn to_arrow_polygons(&self) -> PolygonArray;
    /// key, lat_bucket, lon_bucket, lat, lon, avg_risk, count and geometry columns.
    fn to_record_batch(&self) -> Result<RecordBatch, CityPulseError>;
}

impl HeatmapToArrow for Heatmap {
    fn to_arrow_points(&self) -> PointArray {
        let point = PointType::new(Dimension::XY, wgs84_metadata());
        let mut builder = PointBuilder::with_capacity(point, self.len());

        for polygon in self.to_polygons() {
            let center = polygon.centroid();
            builder.push_point(center.as_ref());
        }
        builder.finish()
    }

    fn to_arrow_polygons(&self) -> PolygonArray {
        let poly = PolygonType::new(Dimension::XY, wgs84_metadata());
        PolygonBuilder::from_polygons(&self.to_polygons(), poly).finish()
    }

    fn to_record_batch(&self) -> Result<RecordBatch, CityPulseError> {
        let polygon_array = self.to_arrow_polygons();
        let cells = self.cells();

        let keys: StringArray = cells.iter().map(|c| Some(c.key.to_string())).collect();
        let lat_buckets: Int64Array = cells.iter().map(|c| Some(c.key.lat_bucket)).collect();
        let lon_buckets: Int64Array = cells.iter().map(|c| Some(c.key.lon_bucket)).collect();
        let lats: Float64Array = cells.iter().map(|c| Some(c.lat)).collect();
        let lons: Float64Array = cells.iter().map(|c| Some(c.lon)).collect();
        let risks: UInt8Array = cells.iter().map(|c| Some(c.risk)).collect();
        let counts: UInt64Array = cells.iter().map(|c| Some(c.count)).collect();

        let geometry_field = polygon_array.extension_type().to_field("geometry", false);
        let schema = Schema::new(vec![
            Field::new("key", DataType::Utf8, false),
            Field::new("lat_bucket", DataType::Int64, false),
            Field::new("lon_bucket", DataType::Int64, false),
            Field::new("lat", DataType::Float64, false),
            Field::new("lon", DataType::Float64, false),
            Field::new("avg_risk", DataType::UInt8, false),
            Field::new("count", DataType::UInt64, false),
            geometry_field,
        ]);

        RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(keys),
                Arc::new(lat_buckets),
                Arc::new(lon_buckets),
                Arc::new(lats),
                Arc::new(lons),
                Arc::new(risks),
                Arc::new(counts),
                Arc::new(polygon_array.into_arrow()),
            ],
        )
        .map_err(|e| CityPulseError::IoError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::hazard::HazardSnapshot;
    use crate::api::heatmap::aggregate_heatmap_at;
    use crate::core::risk::Vote;
    use arrow_array::Array;
    use geoarrow_array::GeoArrowArray;

    const NOW: f64 = 1_700_000_000.0;

    fn sample() -> Heatmap {
        let hazards = vec![
            HazardSnapshot::new(41_015_137, 28_979_530, 3).with_votes(vec![Vote::up(NOW)]),
            HazardSnapshot::new(41_016_500, 28_979_530, 5).with_votes(vec![Vote::up(NOW)]),
            HazardSnapshot::new(-900, -1, 2),
        ];
        aggregate_heatmap_at(&hazards, NOW)
    }

    #[test]
    fn test_heatmap_to_arrow_geometries() {
        let heatmap = sample();
        assert_eq!(heatmap.to_arrow_points().len(), 3);
        assert_eq!(heatmap.to_arrow_polygons().len(), 3);
    }

    #[test]
    fn test_heatmap_to_record_batch() -> Result<(), CityPulseError> {
        let batch = sample().to_record_batch()?;
        assert_eq!(batch.num_rows(), 3);
        assert_eq!(batch.num_columns(), 8);

        let keys = batch
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .expect("key column is utf8");
        assert_eq!(keys.value(0), "-1_-1");

        let risks = batch
            .column(5)
            .as_any()
            .downcast_ref::<UInt8Array>()
            .expect("avg_risk column is u8");
        assert_eq!(risks.value(1), 12);
        assert_eq!(risks.value(2), 20);
        Ok(())
    }

    #[test]
    fn test_empty_heatmap_to_record_batch() -> Result<(), CityPulseError> {
        let batch = aggregate_heatmap_at(&[], NOW).to_record_batch()?;
        assert_eq!(batch.num_rows(), 0);
        assert!(batch.column(7).is_empty());
        Ok(())
    }
}
