use crate::api::heatmap::Heatmap;
use crate::api::heatmap_arrow::HeatmapToArrow;
use crate::util::error::CityPulseError;
use arrow_array::RecordBatch;
use geoparquet::writer::{
    GeoParquetRecordBatchEncoder, GeoParquetWriterEncoding, GeoParquetWriterOptionsBuilder,
};
use parquet::arrow::ArrowWriter;
use parquet::file::metadata::KeyValue;
use parquet::file::reader::{FileReader, SerializedFileReader};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// File-level metadata key prefix for heatmap parameters.
pub const METADATA_PREFIX: &str = "citypulse:";

fn io_err(e: impl std::fmt::Display) -> CityPulseError {
    CityPulseError::IoError(e.to_string())
}

/// Writes a batch with a geoarrow geometry column as WKB-encoded GeoParquet.
pub fn write_geoparquet(batch: &RecordBatch, path: impl AsRef<Path>) -> Result<(), CityPulseError> {
    write_geoparquet_with_metadata(batch, path, Vec::new())
}

/// Like [`write_geoparquet`], appending `extra` next to the `geo` metadata.
pub fn write_geoparquet_with_metadata(
    batch: &RecordBatch,
    path: impl AsRef<Path>,
    extra: Vec<KeyValue>,
) -> Result<(), CityPulseError> {
    let options = GeoParquetWriterOptionsBuilder::default()
        .set_encoding(GeoParquetWriterEncoding::WKB)
        .build();
    let mut encoder =
        GeoParquetRecordBatchEncoder::try_new(&batch.schema(), &options).map_err(io_err)?;

    let file = File::create(path.as_ref()).map_err(io_err)?;
    let mut writer =
        ArrowWriter::try_new(file, encoder.target_schema(), None).map_err(io_err)?;

    let encoded = encoder.encode_record_batch(batch).map_err(io_err)?;
    writer.write(&encoded).map_err(io_err)?;

    writer.append_key_value_metadata(encoder.into_keyvalue().map_err(io_err)?);
    for kv in extra {
        writer.append_key_value_metadata(kv);
    }
    writer.finish().map_err(io_err)?;

    debug!(rows = batch.num_rows(), path = %path.as_ref().display(), "wrote geoparquet");
    Ok(())
}

/// Reads back the `citypulse:` entries written by [`HeatmapToGeoParquet`].
pub fn read_heatmap_metadata(
    path: impl AsRef<Path>,
) -> Result<BTreeMap<String, String>, CityPulseError> {
    let file = File::open(path.as_ref()).map_err(io_err)?;
    let reader = SerializedFileReader::new(file).map_err(io_err)?;

    let entries = reader
        .metadata()
        .file_metadata()
        .key_value_metadata()
        .map(|kvs| {
            kvs.iter()
                .filter_map(|kv| {
                    let key = kv.key.strip_prefix(METADATA_PREFIX)?;
                    Some((key.to_string(), kv.value.clone().unwrap_or_default()))
                })
                .collect()
        })
        .unwrap_or_default();
    Ok(entries)
}

fn heatmap_metadata(heatmap: &Heatmap) -> Vec<KeyValue> {
    let cells = heatmap.cells();
    let hazards: u64 = cells.iter().map(|c| c.count).sum();
    let max_risk = cells.iter().map(|c| c.risk).max().unwrap_or(0);

    [
        ("grid_size_e6", heatmap.grid_size_e6().to_string()),
        ("cell_count", cells.len().to_string()),
        ("hazard_count", hazards.to_string()),
        ("max_risk", max_risk.to_string()),
    ]
    .into_iter()
    .map(|(key, value)| KeyValue {
        key: format!("{}{}", METADATA_PREFIX, key),
        value: Some(value),
    })
    .collect()
}

/// Writes a heatmap as GeoParquet. The grid size and cell/hazard totals are
/// stored as file metadata so a reader can rebuild cell extents from keys.
pub trait HeatmapToGeoParquet: HeatmapToArrow {
    fn to_geoparquet(&self, path: impl AsRef<Path>) -> Result<(), CityPulseError>;
}

impl HeatmapToGeoParquet for Heatmap {
    fn to_geoparquet(&self, path: impl AsRef<Path>) -> Result<(), CityPulseError> {
        let batch = self.to_record_batch()?;
        write_geoparquet_with_metadata(&batch, path, heatmap_metadata(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::hazard::HazardSnapshot;
    use crate::api::heatmap::aggregate_heatmap_at;
    use crate::core::risk::Vote;
    use tempfile::tempdir;

    const NOW: f64 = 1_700_000_000.0;

    fn sample() -> Heatmap {
        let hazards = vec![
            HazardSnapshot::new(41_015_137, 28_979_530, 3).with_votes(vec![Vote::up(NOW)]),
            HazardSnapshot::new(41_015_200, 28_979_600, 5).with_votes(vec![Vote::up(NOW)]),
            HazardSnapshot::new(41_020_000, 28_990_000, 5)
                .with_votes(vec![Vote::up(NOW).with_trust(3.0)]),
        ];
        aggregate_heatmap_at(&hazards, NOW)
    }

    #[test]
    fn test_heatmap_to_geoparquet() -> Result<(), CityPulseError> {
        let dir = tempdir().map_err(io_err)?;
        let path = dir.path().join("heatmap.parquet");

        sample().to_geoparquet(&path)?;

        assert!(path.exists());
        let metadata = std::fs::metadata(&path).map_err(io_err)?;
        assert!(metadata.len() > 0);
        Ok(())
    }

    #[test]
    fn test_heatmap_metadata_round_trip() -> Result<(), CityPulseError> {
        let dir = tempdir().map_err(io_err)?;
        let path = dir.path().join("heatmap.parquet");

        sample().to_geoparquet(&path)?;
        let meta = read_heatmap_metadata(&path)?;

        assert_eq!(meta.get("grid_size_e6").map(String::as_str), Some("900"));
        assert_eq!(meta.get("cell_count").map(String::as_str), Some("2"));
        assert_eq!(meta.get("hazard_count").map(String::as_str), Some("3"));
        assert_eq!(meta.get("max_risk").map(String::as_str), Some("40"));
        Ok(())
    }

    #[test]
    fn test_plain_batch_has_no_heatmap_metadata() -> Result<(), CityPulseError> {
        let dir = tempdir().map_err(io_err)?;
        let path = dir.path().join("plain.parquet");

        write_geoparquet(&sample().to_record_batch()?, &path)?;
        assert!(read_heatmap_metadata(&path)?.is_empty());
        Ok(())
    }
}
