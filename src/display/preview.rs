//! Preview panel that renders into files.
//!
//! Stands in for an SPI panel driver: every draw replaces
//! `<runtime>/tft_preview.jpg`. Text is drawn white on black with the
//! bundled DejaVu Sans, and the wrapped lines are also written to
//! `<runtime>/tft_preview.txt`.

use super::{Display, ProgressLevel};
use crate::constants::{TEXT_FONT_PX, TEXT_LINE_HEIGHT_PX, TEXT_MARGIN_PX, TEXT_MAX_LINES, TEXT_WRAP_COLUMNS};
use crate::{Error, Result};
use ab_glyph::{FontRef, PxScale};
use image::imageops::FilterType;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_text_mut;
use log::{debug, warn};
use std::path::{Path, PathBuf};

const PREVIEW_IMAGE: &str = "tft_preview.jpg";
const PREVIEW_TEXT: &str = "tft_preview.txt";

const FONT_DATA: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

/// Greedy word wrap to `columns` characters, keeping at most `max_lines` lines
#[must_use]
pub fn wrap_text(text: &str, columns: usize, max_lines: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        let needed = if line.is_empty() {
            word.chars().count()
        } else {
            line.chars().count() + 1 + word.chars().count()
        };

        if needed > columns && !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }

    lines.truncate(max_lines);
    lines
}

/// File-backed panel of a fixed pixel size
pub struct PreviewDisplay {
    width: u32,
    height: u32,
    assets_dir: PathBuf,
    runtime_dir: PathBuf,
    font: FontRef<'static>,
}

impl PreviewDisplay {
    /// Create the runtime directory if needed
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the runtime directory cannot be created, or
    /// `Error::Display` if the bundled font fails to parse.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(width: u32, height: u32, assets_dir: P, runtime_dir: Q) -> Result<Self> {
        std::fs::create_dir_all(runtime_dir.as_ref())?;
        let font = FontRef::try_from_slice(FONT_DATA).map_err(|e| Error::Display(format!("Bundled font: {e}")))?;
        Ok(Self {
            width: width.max(1),
            height: height.max(1),
            assets_dir: assets_dir.as_ref().to_path_buf(),
            runtime_dir: runtime_dir.as_ref().to_path_buf(),
            font,
        })
    }

    /// Image file for a progress level, e.g. `<assets>/75.png`
    #[must_use]
    pub fn asset_path(&self, level: ProgressLevel) -> PathBuf {
        self.assets_dir.join(format!("{}.png", level.percent()))
    }

    #[must_use]
    pub fn preview_image_path(&self) -> PathBuf {
        self.runtime_dir.join(PREVIEW_IMAGE)
    }

    #[must_use]
    pub fn preview_text_path(&self) -> PathBuf {
        self.runtime_dir.join(PREVIEW_TEXT)
    }

    fn draw_text(&self, text: &str) -> Result<()> {
        let lines = wrap_text(text, TEXT_WRAP_COLUMNS, TEXT_MAX_LINES);
        std::fs::write(self.preview_text_path(), lines.join("\n"))?;

        self.text_panel(&lines).save(self.preview_image_path())?;
        Ok(())
    }

    /// Panel image with `lines` drawn top to bottom
    #[must_use]
    pub fn text_panel(&self, lines: &[String]) -> RgbImage {
        let mut panel = RgbImage::from_pixel(self.width, self.height, Rgb([0, 0, 0]));
        let scale = PxScale::from(TEXT_FONT_PX);

        let mut y = TEXT_MARGIN_PX;
        for line in lines {
            draw_text_mut(&mut panel, Rgb([255, 255, 255]), TEXT_MARGIN_PX, y, scale, &self.font, line);
            y += TEXT_LINE_HEIGHT_PX;
        }
        panel
    }

    fn draw_image(&self, asset: &Path) -> Result<()> {
        let panel = image::open(asset)?
            .resize_exact(self.width, self.height, FilterType::Triangle)
            .to_rgb8();
        panel.save(self.preview_image_path())?;
        Ok(())
    }
}

impl Display for PreviewDisplay {
    fn render_text(&mut self, text: &str) {
        if let Err(e) = self.draw_text(text) {
            warn!("Text render failed: {e}");
        }
    }

    fn render_progress(&mut self, level: ProgressLevel) -> bool {
        let asset = self.asset_path(level);
        if !asset.exists() {
            debug!("Progress asset missing: {}", asset.display());
            return false;
        }

        match self.draw_image(&asset) {
            Ok(()) => true,
            Err(e) => {
                warn!("Progress render failed for {}: {e}", asset.display());
                false
            }
        }
    }
}
