//! Facility files for offline use
//!
//! The file holds a JSON array in the backend's record format, so a saved
//! `/hospitals` response works as is.

use pulsepoint_api_client::endpoints::facilities::{parse_facilities, FacilityRecord};
use pulsepoint_core::{Error, ErrorCode, Result};
use pulsepoint_geo::Facility;
use std::path::Path;

pub fn from_file(path: &Path) -> Result<Vec<Facility>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::file_not_found(path)
        } else {
            Error::from(e)
        }
    })?;

    let records: Vec<FacilityRecord> = serde_json::from_str(&content).map_err(|e| {
        Error::new(ErrorCode::InvalidRecord, format!("Invalid facility file: {e}"))
            .with_context(format!("Parsing {}", path.display()))
            .with_source(e)
    })?;
    Ok(parse_facilities(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_reads_backend_records() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"_id": "h1", "name": "Apollo", "latitude": "9.93", "longitude": 78.125}},
                {{"_id": "bad", "name": "Nowhere", "latitude": 100, "longitude": 0}}]"#
        )
        .unwrap();

        let facilities = from_file(file.path()).unwrap();
        assert_eq!(facilities.len(), 1);
        assert_eq!(facilities[0].name, "Apollo");
    }

    #[test]
    fn test_missing_file() {
        let err = from_file(Path::new("/definitely/not/here.json")).unwrap_err();
        assert_eq!(err.code, ErrorCode::FileNotFound);
    }

    #[test]
    fn test_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = from_file(file.path()).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRecord);
    }
}
