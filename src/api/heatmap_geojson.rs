use crate::api::heatmap::Heatmap;
use crate::util::error::CityPulseError;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, feature::Id};
use serde_json::Value;

impl Heatmap {
    /// One polygon feature per cell, keyed by the cell key.
    ///
    /// Properties are `key`, `avgRisk`, `count`, `lat` and `lon` (south-west
    /// corner in degrees).
    pub fn to_feature_collection(&self) -> FeatureCollection {
        let features = self
            .cells()
            .into_iter()
            .map(|cell| {
                let polygon = cell.key.to_rect(self.grid_size_e6()).to_polygon();
                let key = cell.key.to_string();

                let mut properties = JsonObject::new();
                properties.insert("key".to_string(), Value::from(key.clone()));
                properties.insert("avgRisk".to_string(), Value::from(cell.risk));
                properties.insert("count".to_string(), Value::from(cell.count));
                properties.insert("lat".to_string(), Value::from(cell.lat));
                properties.insert("lon".to_string(), Value::from(cell.lon));

                Feature {
                    bbox: None,
                    geometry: Some(Geometry::from(&polygon)),
                    id: Some(Id::String(key)),
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }

    pub fn to_geojson(&self) -> Result<String, CityPulseError> {
        serde_json::to_string(&self.to_feature_collection())
            .map_err(|e| CityPulseError::JsonError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use crate::api::hazard::HazardSnapshot;
    use crate::api::heatmap::aggregate_heatmap_at;
    use crate::core::risk::Vote;
    use crate::util::error::CityPulseError;
    use geojson::GeoJson;

    const NOW: f64 = 1_700_000_000.0;

    #[test]
    fn test_feature_per_cell() {
        let hazards = vec![
            HazardSnapshot::new(0, 0, 3).with_votes(vec![Vote::up(NOW)]),
            HazardSnapshot::new(5_000, 5_000, 3),
        ];
        let collection = aggregate_heatmap_at(&hazards, NOW).to_feature_collection();
        assert_eq!(collection.features.len(), 2);

        let first = &collection.features[0];
        assert_eq!(first.property("key").and_then(|v| v.as_str()), Some("0_0"));
        assert_eq!(first.property("avgRisk").and_then(|v| v.as_u64()), Some(12));
        assert_eq!(first.property("count").and_then(|v| v.as_u64()), Some(1));
    }

    #[test]
    fn test_geojson_parses_back() -> Result<(), CityPulseError> {
        let hazards = vec![HazardSnapshot::new(41_015_137, 28_979_530, 4)];
        let text = aggregate_heatmap_at(&hazards, NOW).to_geojson()?;

        let parsed: GeoJson = text
            .parse()
            .map_err(|e: geojson::Error| CityPulseError::JsonError(e.to_string()))?;
        match parsed {
            GeoJson::FeatureCollection(fc) => {
                assert_eq!(fc.features.len(), 1);
                assert!(fc.features[0].geometry.is_some());
            }
            _ => panic!("Expected FeatureCollection"),
        }
        Ok(())
    }
}
