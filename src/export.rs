use std::path::Path;

use log::debug;
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg;
use serde::Serialize;

use crate::diagram::SyntaxError;
use crate::error::{Error, Result};

/// Extra fonts picked up from the working directory, next to system fonts.
const LOCAL_FONTS_DIR: &str = "fonts";

/// The JSON shape served to the notes front end: the markup on success, a
/// message on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Envelope {
    Svg { svg: String },
    Failure { message: String },
}

impl Envelope {
    pub fn from_result(result: std::result::Result<String, SyntaxError>) -> Self {
        match result {
            Ok(svg) => Envelope::Svg { svg },
            Err(err) => Envelope::Failure {
                message: err.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Svg { .. })
    }
}

pub fn envelope(result: std::result::Result<String, SyntaxError>) -> serde_json::Value {
    match Envelope::from_result(result) {
        Envelope::Svg { svg } => serde_json::json!({ "svg": svg }),
        Envelope::Failure { message } => serde_json::json!({ "message": message }),
    }
}

pub fn svg_to_png(svg: &str, scale: f32) -> Result<Vec<u8>> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(Error::Export(format!("invalid PNG scale: {}", scale)));
    }

    let mut opts = usvg::Options::default();
    {
        let fontdb = opts.fontdb_mut();
        fontdb.load_system_fonts();
        let local_fonts = Path::new(LOCAL_FONTS_DIR);
        if local_fonts.is_dir() {
            fontdb.load_fonts_dir(local_fonts);
        }
        let families = fontdb
            .faces()
            .flat_map(|face| face.families.iter().map(|(family, _)| family.clone()))
            .collect::<Vec<_>>();
        if let Some(family) = pick_sans_family(&families) {
            fontdb.set_sans_serif_family(family);
        }
    }

    let tree = usvg::Tree::from_str(svg, &opts)
        .map_err(|e| Error::Export(format!("failed to parse SVG: {}", e)))?;

    let width = (tree.size().width() * scale).ceil() as u32;
    let height = (tree.size().height() * scale).ceil() as u32;
    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| Error::Export(format!("cannot allocate a {}x{} pixmap", width, height)))?;

    resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());
    debug!(width = width, height = height; "rasterized diagram");

    pixmap
        .encode_png()
        .map_err(|e| Error::Export(format!("failed to encode PNG: {}", e)))
}

pub fn svg_to_pdf(svg: &str) -> Result<Vec<u8>> {
    use svg2pdf::usvg::fontdb;

    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    let local_fonts = Path::new(LOCAL_FONTS_DIR);
    if local_fonts.is_dir() {
        db.load_fonts_dir(local_fonts);
    }
    let families = db
        .faces()
        .flat_map(|face| face.families.iter().map(|(family, _)| family.clone()))
        .collect::<Vec<_>>();
    if let Some(family) = pick_sans_family(&families) {
        db.set_sans_serif_family(family);
    }

    let opts = svg2pdf::usvg::Options {
        fontdb: std::sync::Arc::new(db),
        ..Default::default()
    };
    let tree = svg2pdf::usvg::Tree::from_str(svg, &opts)
        .map_err(|e| Error::Export(format!("failed to parse SVG: {}", e)))?;

    // Text is converted to paths so viewers without the font still show it.
    let options = svg2pdf::ConversionOptions {
        embed_text: false,
        ..Default::default()
    };
    svg2pdf::to_pdf(&tree, options, svg2pdf::PageOptions::default())
        .map_err(|e| Error::Export(format!("failed to convert SVG to PDF: {}", e)))
}

/// Family used for the generic `sans-serif`: the first one whose name says
/// sans, else the first one installed.
fn pick_sans_family(families: &[String]) -> Option<&str> {
    families
        .iter()
        .find(|f| f.to_ascii_lowercase().contains("sans"))
        .or_else(|| families.first())
        .map(String::as_str)
}
