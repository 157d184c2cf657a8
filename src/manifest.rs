//! JSON manifest of every family and the metrics of its fonts.
//!
//! Each font entry carries either `metrics` or `error`, never both, so a
//! failed extraction can't be mistaken for zero-valued metrics.

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::batch::FontResult;
use crate::error::CatalogError;
use crate::metadata::{FontFamilyRecord, FontFileRef};
use crate::sfnt::FontMetrics;

#[derive(Debug, Serialize)]
pub struct Manifest<'a> {
    pub families: Vec<FamilyEntry<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyEntry<'a> {
    pub name: &'a str,
    pub date_added: &'a str,
    pub designer: &'a str,
    pub aliases: &'a [String],
    pub fonts: Vec<FontEntry<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FontEntry<'a> {
    pub full_name: &'a str,
    /// Lossy, so a non-UTF-8 directory name can't fail the whole manifest.
    pub path: Cow<'a, str>,
    pub weight: i32,
    pub style: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<FontMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<'a> FontEntry<'a> {
    fn new(font: &'a FontFileRef, result: &FontResult) -> Self {
        let (metrics, error) = match result {
            Ok(metrics) => (Some(*metrics), None),
            Err(e) => (None, Some(e.to_string())),
        };
        FontEntry {
            full_name: &font.full_name,
            path: font.path.to_string_lossy(),
            weight: font.weight,
            style: &font.style,
            metrics,
            error,
        }
    }
}

impl<'a> Manifest<'a> {
    /// Pair each family with its result row.
    pub fn new(families: &'a [FontFamilyRecord], results: &'a [Vec<FontResult>]) -> Self {
        let families = families
            .iter()
            .zip(results)
            .map(|(family, family_results)| FamilyEntry {
                name: &family.name,
                date_added: &family.date_added,
                designer: &family.designer,
                aliases: &family.aliases,
                fonts: family
                    .fonts
                    .iter()
                    .zip(family_results)
                    .map(|(font, result)| FontEntry::new(font, result))
                    .collect(),
            })
            .collect();
        Manifest { families }
    }

    pub fn to_json(&self) -> Result<String, CatalogError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Serialize the manifest and write it to `path`.
pub fn write_manifest(
    path: &Path,
    families: &[FontFamilyRecord],
    results: &[Vec<FontResult>],
) -> Result<(), CatalogError> {
    let json = Manifest::new(families, results).to_json()?;
    fs::write(path, json).map_err(|e| CatalogError::io(format!("writing {}", path.display()), e))?;
    log::info!("wrote manifest for {} families to {}", families.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FontError, ParseError};
    use crate::sfnt::Tag;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::path::PathBuf;

    #[test]
    fn test_manifest_marks_failures_explicitly() {
        let font = |file: &str| FontFileRef {
            full_name: "Roboto".to_string(),
            path: PathBuf::from(format!("apache/roboto/{}", file)),
            weight: 400,
            style: "normal".to_string(),
        };
        let families = vec![FontFamilyRecord {
            name: "Roboto".to_string(),
            date_added: "2013-01-09".to_string(),
            designer: "Christian Robertson".to_string(),
            aliases: vec!["Roboto Sans".to_string()],
            fonts: vec![font("Roboto-Regular.ttf"), font("Roboto-Bad.ttf")],
        }];
        let results = vec![vec![
            Ok(FontMetrics {
                em_size: 2048,
                ascent: 1900,
                descent: 500,
                height: 2400,
            }),
            Err(FontError::Parse {
                path: PathBuf::from("apache/roboto/Roboto-Bad.ttf"),
                source: ParseError::MissingTable { tag: Tag::HHEA },
            }),
        ]];

        let value: serde_json::Value =
            serde_json::from_str(&Manifest::new(&families, &results).to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "families": [{
                    "name": "Roboto",
                    "dateAdded": "2013-01-09",
                    "designer": "Christian Robertson",
                    "aliases": ["Roboto Sans"],
                    "fonts": [
                        {
                            "fullName": "Roboto",
                            "path": "apache/roboto/Roboto-Regular.ttf",
                            "weight": 400,
                            "style": "normal",
                            "metrics": {"emSize": 2048, "ascent": 1900, "descent": 500, "height": 2400}
                        },
                        {
                            "fullName": "Roboto",
                            "path": "apache/roboto/Roboto-Bad.ttf",
                            "weight": 400,
                            "style": "normal",
                            "error": "apache/roboto/Roboto-Bad.ttf: missing required table 'hhea'"
                        }
                    ]
                }]
            })
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_path_is_written_lossily() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let path = PathBuf::from(OsStr::from_bytes(b"ofl/caf\xE9/Cafe-Regular.ttf"));
        let families = vec![FontFamilyRecord {
            name: "Cafe".to_string(),
            date_added: "2018-02-02".to_string(),
            designer: "Someone".to_string(),
            aliases: vec![],
            fonts: vec![FontFileRef {
                full_name: "Cafe Regular".to_string(),
                path,
                weight: 400,
                style: "normal".to_string(),
            }],
        }];
        let results = vec![vec![Ok(FontMetrics {
            em_size: 1000,
            ascent: 800,
            descent: 200,
            height: 1000,
        })]];

        let dir = tempfile::tempdir().unwrap();
        let manifest_path = dir.path().join("fonts.json");
        write_manifest(&manifest_path, &families, &results).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&manifest_path).unwrap()).unwrap();
        assert_eq!(
            value["families"][0]["fonts"][0]["path"],
            "ofl/caf\u{FFFD}/Cafe-Regular.ttf"
        );
        assert_eq!(value["families"][0]["fonts"][0]["metrics"]["emSize"], 1000);
    }

    #[test]
    fn test_write_manifest_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fonts.json");
        write_manifest(&path, &[], &[]).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(serde_json::from_str::<serde_json::Value>(&text).unwrap(), json!({"families": []}));
    }
}
