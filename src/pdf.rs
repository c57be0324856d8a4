//! PDF output for the report.
//!
//! All artifacts are decoded before anything is written, so an aborted
//! document never leaves a partial file behind.

use crate::error::DocumentError;
use crate::layout::{paginate, DocumentLayout, PageGeometry};
use image::DynamicImage;
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Pt,
};
use serde::Deserialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Pixels are mapped 1:1 onto points before scaling.
const IMAGE_DPI: f32 = 72.0;

/// What to do when an artifact cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactReadPolicy {
    /// Fail the whole document.
    #[default]
    Abort,
    /// Log a warning and leave the artifact out.
    Skip,
}

/// An artifact decoded and ready to embed
#[derive(Debug, Clone)]
pub struct DecodedArtifact {
    pub path: PathBuf,
    pub image: DynamicImage,
}

/// Result of writing a document
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSummary {
    pub output: PathBuf,
    pub pages: usize,
    pub embedded: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

/// Decode artifacts in order, applying `policy` to unreadable ones.
///
/// Returns the decoded artifacts and the paths that were skipped.
pub fn decode_artifacts(
    paths: &[PathBuf],
    policy: ArtifactReadPolicy,
) -> Result<(Vec<DecodedArtifact>, Vec<PathBuf>), DocumentError> {
    let mut decoded = Vec::with_capacity(paths.len());
    let mut skipped = Vec::new();

    for path in paths {
        match image::open(path) {
            Ok(image) => decoded.push(DecodedArtifact {
                path: path.clone(),
                // Alpha channels are dropped; the page background is white.
                image: DynamicImage::ImageRgb8(image.to_rgb8()),
            }),
            Err(source) => match policy {
                ArtifactReadPolicy::Abort => {
                    return Err(DocumentError::ArtifactRead {
                        path: path.clone(),
                        source,
                    })
                }
                ArtifactReadPolicy::Skip => {
                    warn!(path = %path.display(), error = %source, "skipping unreadable artifact");
                    skipped.push(path.clone());
                }
            },
        }
    }

    Ok((decoded, skipped))
}

/// Write `artifacts` into a paginated PDF at `output`.
pub fn write_document(
    artifacts: &[PathBuf],
    geometry: &PageGeometry,
    title: &str,
    policy: ArtifactReadPolicy,
    output: &Path,
) -> Result<DocumentSummary, DocumentError> {
    let (decoded, skipped) = decode_artifacts(artifacts, policy)?;
    let embedded: Vec<PathBuf> = decoded.iter().map(|a| a.path.clone()).collect();

    let layout = paginate(decoded, geometry);
    let pages = layout.page_count();
    let doc = build_document(&layout, geometry, title)?;

    let file = File::create(output).map_err(|source| DocumentError::Write {
        path: output.to_path_buf(),
        source,
    })?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|e| DocumentError::Pdf(e.to_string()))?;

    info!(
        output = %output.display(),
        pages,
        embedded = embedded.len(),
        skipped = skipped.len(),
        "wrote report"
    );

    Ok(DocumentSummary {
        output: output.to_path_buf(),
        pages,
        embedded,
        skipped,
    })
}

fn pt(value: f32) -> Mm {
    Mm::from(Pt(value))
}

fn build_document(
    layout: &DocumentLayout<DecodedArtifact>,
    geometry: &PageGeometry,
    title: &str,
) -> Result<PdfDocumentReference, DocumentError> {
    let (width, height) = (pt(geometry.page_width), pt(geometry.page_height));
    let (doc, first_page, first_layer) = PdfDocument::new(title, width, height, "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| DocumentError::Pdf(e.to_string()))?;

    for page in &layout.pages {
        let layer = if page.index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (p, l) = doc.add_page(width, height, "Layer 1");
            doc.get_page(p).get_layer(l)
        };
        draw_header(&layer, geometry, title, &font);

        for placement in &page.placements {
            let image = &placement.item.image;
            let scale_x = placement.width / image.width().max(1) as f32;
            let scale_y = placement.height / image.height().max(1) as f32;
            // The cursor marks the top edge of the slot.
            let bottom = placement.y - placement.height;

            Image::from_dynamic_image(image).add_to_layer(
                layer.clone(),
                ImageTransform {
                    translate_x: Some(pt(placement.x)),
                    translate_y: Some(pt(bottom)),
                    scale_x: Some(scale_x),
                    scale_y: Some(scale_y),
                    dpi: Some(IMAGE_DPI),
                    ..Default::default()
                },
            );
            debug!(
                page = page.index,
                path = %placement.item.path.display(),
                y = placement.y,
                "placed artifact"
            );
        }
    }

    Ok(doc)
}

fn draw_header(
    layer: &PdfLayerReference,
    geometry: &PageGeometry,
    title: &str,
    font: &IndirectFontRef,
) {
    layer.use_text(
        title,
        geometry.header_font_size,
        pt(geometry.left_margin),
        pt(geometry.header_baseline()),
        font,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_png(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(40, 30, Rgb([200, 50, 50]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_write_document() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts: Vec<PathBuf> = (0..3)
            .map(|i| write_png(dir.path(), &format!("chart_{}.png", i)))
            .collect();
        let output = dir.path().join("report.pdf");

        let summary = write_document(
            &artifacts,
            &PageGeometry::default(),
            "Data Visualization Report",
            ArtifactReadPolicy::Abort,
            &output,
        )
        .unwrap();

        assert_eq!(summary.pages, 2);
        assert_eq!(summary.embedded, artifacts);
        assert!(summary.skipped.is_empty());
        let bytes = std::fs::read(&output).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_empty_document_has_header_page() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("empty.pdf");
        let summary = write_document(
            &[],
            &PageGeometry::default(),
            "Report",
            ArtifactReadPolicy::Abort,
            &output,
        )
        .unwrap();
        assert_eq!(summary.pages, 1);
        assert!(output.exists());
    }

    #[test]
    fn test_abort_on_unreadable_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_png(dir.path(), "good.png");
        let bad = dir.path().join("bad.png");
        std::fs::write(&bad, b"not an image").unwrap();
        let output = dir.path().join("report.pdf");

        let err = write_document(
            &[good, bad.clone()],
            &PageGeometry::default(),
            "Report",
            ArtifactReadPolicy::Abort,
            &output,
        )
        .unwrap_err();

        match err {
            DocumentError::ArtifactRead { path, .. } => assert_eq!(path, bad),
            other => panic!("Expected ArtifactRead, got {:?}", other),
        }
        assert!(!output.exists());
    }

    #[test]
    fn test_skip_unreadable_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_png(dir.path(), "good.png");
        let missing = dir.path().join("missing.png");
        let output = dir.path().join("report.pdf");

        let summary = write_document(
            &[missing.clone(), good.clone()],
            &PageGeometry::default(),
            "Report",
            ArtifactReadPolicy::Skip,
            &output,
        )
        .unwrap();

        assert_eq!(summary.embedded, vec![good]);
        assert_eq!(summary.skipped, vec![missing]);
        assert_eq!(summary.pages, 1);
    }

    #[test]
    fn test_write_error_names_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("no_such_dir").join("report.pdf");
        let err = write_document(
            &[],
            &PageGeometry::default(),
            "Report",
            ArtifactReadPolicy::Abort,
            &output,
        )
        .unwrap_err();
        assert!(matches!(err, DocumentError::Write { ref path, .. } if path == &output));
    }

    #[test]
    fn test_policy_from_json() {
        let policy: ArtifactReadPolicy = serde_json::from_str(r#""skip""#).unwrap();
        assert_eq!(policy, ArtifactReadPolicy::Skip);
        assert_eq!(ArtifactReadPolicy::default(), ArtifactReadPolicy::Abort);
    }
}
