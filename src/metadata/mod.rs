//! # Family Metadata
//!
//! Walks a checkout of the font metadata repository and turns each family's
//! `METADATA.pb` into a [`FontFamilyRecord`]. Families are grouped by license
//! directory; a family directory without a `METADATA.pb` is skipped.

pub mod textproto;

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::CatalogError;
use textproto::Message;

/// License directories scanned, in order.
pub const LICENSE_DIRS: [&str; 3] = ["apache", "ofl", "ufl"];

pub const METADATA_FILE: &str = "METADATA.pb";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontFamilyRecord {
    pub name: String,
    pub date_added: String,
    pub designer: String,
    pub aliases: Vec<String>,
    pub fonts: Vec<FontFileRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontFileRef {
    pub full_name: String,
    /// Family directory joined with the record's `filename`.
    pub path: PathBuf,
    pub weight: i32,
    pub style: String,
}

/// Load every family in the repository at `repo_path`.
///
/// A missing license directory or an unreadable/unparseable `METADATA.pb`
/// is fatal; per-font problems are left to the batch runner.
pub fn load_families(repo_path: &Path) -> Result<Vec<FontFamilyRecord>, CatalogError> {
    let mut families = Vec::new();

    for license in LICENSE_DIRS {
        let license_dir = repo_path.join(license);
        let mut family_dirs = fs::read_dir(&license_dir)
            .and_then(|entries| {
                entries
                    .map(|entry| entry.map(|e| e.path()))
                    .collect::<io::Result<Vec<_>>>()
            })
            .map_err(|e| CatalogError::io(format!("reading {}", license_dir.display()), e))?;
        family_dirs.sort();

        for family_dir in family_dirs {
            if let Some(record) = read_family(&family_dir)? {
                families.push(record);
            }
        }
    }

    log::info!("loaded {} font families from {}", families.len(), repo_path.display());
    Ok(families)
}

/// Read one family directory. `Ok(None)` when it has no metadata file.
pub fn read_family(family_dir: &Path) -> Result<Option<FontFamilyRecord>, CatalogError> {
    let metadata_path = family_dir.join(METADATA_FILE);
    let text = match fs::read_to_string(&metadata_path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound || e.kind() == io::ErrorKind::NotADirectory => {
            log::debug!("skipping {}: no {}", family_dir.display(), METADATA_FILE);
            return Ok(None);
        }
        Err(e) => {
            return Err(CatalogError::io(format!("reading {}", metadata_path.display()), e));
        }
    };

    let metadata_error = |message: String| CatalogError::Metadata {
        path: metadata_path.clone(),
        message,
    };
    let message = textproto::parse(&text).map_err(|e| metadata_error(e.to_string()))?;
    family_from_message(&message, family_dir)
        .map(Some)
        .map_err(metadata_error)
}

fn required<'a>(message: &'a Message, field: &str) -> Result<&'a str, String> {
    message
        .string(field)
        .ok_or_else(|| format!("missing required field '{}'", field))
}

/// A `filename` must name something inside the family directory.
fn relative_filename(filename: &str) -> Result<&Path, String> {
    let path = Path::new(filename);
    let inside = path
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if filename.is_empty() || !inside {
        return Err(format!("filename '{}' escapes the family directory", filename));
    }
    Ok(path)
}

fn family_from_message(message: &Message, family_dir: &Path) -> Result<FontFamilyRecord, String> {
    let fonts = message
        .messages("fonts")
        .map(|font| {
            let weight = font
                .int("weight")
                .ok_or_else(|| "missing required field 'weight'".to_string())?;
            Ok(FontFileRef {
                full_name: required(font, "full_name")?.to_string(),
                path: family_dir.join(relative_filename(required(font, "filename")?)?),
                weight: i32::try_from(weight).map_err(|_| format!("weight {} out of range", weight))?,
                style: required(font, "style")?.to_string(),
            })
        })
        .collect::<Result<Vec<_>, String>>()?;

    Ok(FontFamilyRecord {
        name: required(message, "name")?.to_string(),
        date_added: required(message, "date_added")?.to_string(),
        designer: required(message, "designer")?.to_string(),
        aliases: message.strings("aliases").map(str::to_string).collect(),
        fonts,
    })
}
