use std::path::Path;

use anyhow::{Context, Result};
use facemorph_warp::Detection;
use serde::Deserialize;

/// A detector dump: one face, or every face found in the frame.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DetectionFile {
    One(Detection),
    Many(Vec<Detection>),
}

/// Parse detection JSON and keep the largest face. An empty list means no
/// face was found.
pub fn parse_detection(raw: &str) -> Result<Option<Detection>> {
    let parsed: DetectionFile = serde_json::from_str(raw).context("parsing detection JSON")?;
    Ok(match parsed {
        DetectionFile::One(det) => Some(det),
        DetectionFile::Many(dets) => dets.into_iter().max_by(|a, b| {
            let area = |d: &Detection| d.bbox.width * d.bbox.height;
            area(a).total_cmp(&area(b))
        }),
    })
}

pub fn load_detection(path: &Path) -> Result<Option<Detection>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading detection {}", path.display()))?;
    parse_detection(&raw).with_context(|| format!("in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_detection() {
        let det = parse_detection(r#"{"box":{"x":4,"y":5,"width":10,"height":12}}"#)
            .unwrap()
            .unwrap();
        assert_eq!(det.bbox.height, 12.0);
    }

    #[test]
    fn test_largest_of_many() {
        let raw = r#"[
            {"box":{"x":0,"y":0,"width":10,"height":10}},
            {"box":{"x":50,"y":50,"width":40,"height":30},"descriptor":[0.1,0.2]},
            {"box":{"x":9,"y":9,"width":20,"height":20}}
        ]"#;
        let det = parse_detection(raw).unwrap().unwrap();
        assert_eq!(det.bbox.x, 50.0);
        assert_eq!(det.descriptor, Some(vec![0.1, 0.2]));
    }

    #[test]
    fn test_empty_list_is_absent() {
        assert!(parse_detection("[]").unwrap().is_none());
        assert!(parse_detection("{").is_err());
    }
}
