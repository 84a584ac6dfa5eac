use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// A saved discovery query offered as a one-keystroke shortcut.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub id: String,
    pub label: String,
    pub query: String,
}

/// An image that can be attached to a follow-up as an icebreaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpAsset {
    pub url: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SegmentsFile {
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub assets: Vec<FollowUpAsset>,
}

impl SegmentsFile {
    #[must_use]
    pub fn segment(&self, id: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == id)
    }

    /// Resolve an asset by 1-based position or by exact URL.
    #[must_use]
    pub fn asset(&self, selector: &str) -> Option<&FollowUpAsset> {
        if let Ok(n) = selector.parse::<usize>() {
            return n.checked_sub(1).and_then(|i| self.assets.get(i));
        }
        self.assets.iter().find(|a| a.url == selector)
    }
}

/// Load and validate the segments configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_segments(path: &Path) -> Result<SegmentsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SegmentsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let segments_file: SegmentsFile =
        serde_yaml::from_str(&content).map_err(ConfigError::SegmentsFileParse)?;

    validate_segments(&segments_file)?;

    Ok(segments_file)
}

fn validate_segments(file: &SegmentsFile) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();
    for segment in &file.segments {
        if segment.id.trim().is_empty() || segment.label.trim().is_empty() {
            return Err(ConfigError::Validation(
                "segment id and label must be non-empty".to_string(),
            ));
        }
        if segment.query.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "segment '{}' has an empty query",
                segment.id
            )));
        }
        if !seen_ids.insert(segment.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate segment id: '{}'",
                segment.id
            )));
        }
    }

    let mut seen_urls = HashSet::new();
    for asset in &file.assets {
        if !(asset.url.starts_with("https://") || asset.url.starts_with("http://")) {
            return Err(ConfigError::Validation(format!(
                "asset '{}' must have an absolute http(s) url, got '{}'",
                asset.label, asset.url
            )));
        }
        if !seen_urls.insert(asset.url.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate asset url: '{}'",
                asset.url
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(id: &str) -> Segment {
        Segment {
            id: id.to_string(),
            label: format!("{id} label"),
            query: format!("{id} query"),
        }
    }

    fn asset(url: &str) -> FollowUpAsset {
        FollowUpAsset {
            url: url.to_string(),
            label: "Skeleton Bench".to_string(),
        }
    }

    #[test]
    fn validate_accepts_valid_file() {
        let file = SegmentsFile {
            segments: vec![segment("ai"), segment("design")],
            assets: vec![asset("https://i.imgflip.com/agym35.jpg")],
        };
        assert!(validate_segments(&file).is_ok());
    }

    #[test]
    fn validate_rejects_duplicate_segment_id() {
        let file = SegmentsFile {
            segments: vec![segment("ai"), segment("ai")],
            assets: Vec::new(),
        };
        let err = validate_segments(&file).unwrap_err();
        assert!(err.to_string().contains("duplicate segment id"));
    }

    #[test]
    fn validate_rejects_blank_label() {
        let mut bad = segment("ai");
        bad.label = "  ".to_string();
        let file = SegmentsFile {
            segments: vec![bad],
            assets: Vec::new(),
        };
        assert!(validate_segments(&file).is_err());
    }

    #[test]
    fn validate_rejects_relative_asset_url() {
        let file = SegmentsFile {
            segments: Vec::new(),
            assets: vec![asset("i.imgflip.com/agym35.jpg")],
        };
        let err = validate_segments(&file).unwrap_err();
        assert!(err.to_string().contains("absolute"));
    }

    #[test]
    fn validate_rejects_duplicate_asset_url() {
        let file = SegmentsFile {
            segments: Vec::new(),
            assets: vec![asset("https://x.test/a.jpg"), asset("https://x.test/a.jpg")],
        };
        assert!(validate_segments(&file).is_err());
    }

    #[test]
    fn asset_lookup_by_position_and_url() {
        let file = SegmentsFile {
            segments: Vec::new(),
            assets: vec![asset("https://x.test/a.jpg"), asset("https://x.test/b.jpg")],
        };
        assert_eq!(file.asset("2").unwrap().url, "https://x.test/b.jpg");
        assert_eq!(file.asset("https://x.test/a.jpg").unwrap().url, "https://x.test/a.jpg");
        assert!(file.asset("0").is_none());
        assert!(file.asset("3").is_none());
        assert!(file.asset("https://x.test/c.jpg").is_none());
    }

    #[test]
    fn load_segments_from_real_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config")
            .join("segments.yaml");
        let result = load_segments(&path);
        assert!(result.is_ok(), "failed to load segments.yaml: {result:?}");
        let file = result.unwrap();
        assert!(file.segment("ai").is_some());
        assert_eq!(file.assets.len(), 3);
    }

    #[test]
    fn load_segments_missing_file_is_io_error() {
        let err = load_segments(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::SegmentsFileIo { .. }));
    }
}
