//! Plain-text report, one block per family.
//!
//! ```text
//! Family Lobster, created 2010-05-17 by Impallari Type
//! Files:
//!     ofl/lobster/Lobster-Regular.ttf (Lobster Regular)
//!     FontMetrics { em_size: 1000, ascent: 1000, descent: 250, height: 1250 }
//! ```
//!
//! Fonts whose extraction failed are left out; the failure was already
//! logged by the batch runner.

use std::io::{self, Write};

use crate::batch::FontResult;
use crate::metadata::FontFamilyRecord;

pub fn write_report<W: Write>(
    out: &mut W,
    families: &[FontFamilyRecord],
    results: &[Vec<FontResult>],
) -> io::Result<()> {
    for (family, family_results) in families.iter().zip(results) {
        writeln!(
            out,
            "Family {}, created {} by {}",
            family.name, family.date_added, family.designer
        )?;
        writeln!(out, "Files:")?;

        for (font, result) in family.fonts.iter().zip(family_results) {
            let Ok(metrics) = result else {
                continue;
            };
            writeln!(out, "    {} ({})", font.path.display(), font.full_name)?;
            writeln!(out, "    {:?}", metrics)?;
        }
    }
    Ok(())
}
