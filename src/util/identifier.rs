use crate::core::constants::CELL_KEY_SEPARATOR;
use crate::util::error::CityPulseError;

/// Encodes a bucket pair as the `"<latBucket>_<lonBucket>"` heatmap key.
pub fn generate_cell_key(lat_bucket: i64, lon_bucket: i64) -> String {
    format!("{}{}{}", lat_bucket, CELL_KEY_SEPARATOR, lon_bucket)
}

/// Decodes a `"<latBucket>_<lonBucket>"` key back into `(lat_bucket, lon_bucket)`.
///
/// Buckets may be negative, so the separator is searched from the first
/// character after a possible leading minus sign.
pub fn decode_cell_key(key: &str) -> Result<(i64, i64), CityPulseError> {
    let invalid = || CityPulseError::InvalidCellKey(key.to_string());

    let search_from = usize::from(key.starts_with('-'));
    let split_at = key[search_from..]
        .find(CELL_KEY_SEPARATOR)
        .map(|idx| idx + search_from)
        .ok_or_else(invalid)?;

    let (lat_part, rest) = key.split_at(split_at);
    let lon_part = &rest[CELL_KEY_SEPARATOR.len_utf8()..];

    let lat_bucket: i64 = lat_part.parse().map_err(|_| invalid())?;
    let lon_bucket: i64 = lon_part.parse().map_err(|_| invalid())?;

    Ok((lat_bucket, lon_bucket))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_and_decode_cell_key() -> Result<(), CityPulseError> {
        let key = generate_cell_key(45_572, 32_199);
        assert_eq!(key, "45572_32199");
        assert_eq!(decode_cell_key(&key)?, (45_572, 32_199));
        Ok(())
    }

    #[test]
    fn test_negative_buckets() -> Result<(), CityPulseError> {
        let key = generate_cell_key(-12, -7);
        assert_eq!(key, "-12_-7");
        assert_eq!(decode_cell_key(&key)?, (-12, -7));
        Ok(())
    }

    #[test]
    fn test_invalid_cell_key() {
        assert!(matches!(
            decode_cell_key("invalid"),
            Err(CityPulseError::InvalidCellKey(_))
        ));
        assert!(decode_cell_key("12_").is_err());
        assert!(decode_cell_key("_12").is_err());
        assert!(decode_cell_key("1_2_3").is_err());
    }
}
