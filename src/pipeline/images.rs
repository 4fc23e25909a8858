//! Image extraction: decoded page images → PNG files next to the Markdown.
//!
//! Files are named `image_{page}_{index}.png` (page 1-indexed, index counting
//! the images actually written for that page) inside a folder beside the
//! output file. The folder is only created once there is something to write,
//! so a text-only document leaves no empty `images/` behind.
//!
//! Several documents converted into one directory share its image folder.
//! [`ImageNames`] remembers the names handed out per folder for the whole
//! run, so a later document gets `image_1_0_1.png` instead of overwriting an
//! earlier document's `image_1_0.png`.

use crate::backend::EmbeddedImage;
use crate::error::{ConvertError, ExtractWarning};
use crate::output::PageImage;
use image::{DynamicImage, ImageFormat};
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Encode a decoded image as PNG bytes.
///
/// Colour types PNG cannot store (e.g. 32-bit float) are converted to RGBA8
/// first.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    match img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png) {
        Ok(()) => Ok(buf),
        Err(_) => {
            buf.clear();
            DynamicImage::ImageRgba8(img.to_rgba8())
                .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
            Ok(buf)
        }
    }
}

/// Image file names already taken, per image folder.
///
/// One registry lives for a batch or a watch session. It is rebuilt on every
/// run, so converting the same inputs again yields the same names.
#[derive(Debug, Default)]
pub struct ImageNames {
    used: HashMap<PathBuf, HashSet<String>>,
}

impl ImageNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `image_{page}_{index}.png` in `dir`, suffixing `_1`, `_2`, …
    /// while the name is taken.
    fn claim(&mut self, dir: &Path, page: usize, index: usize) -> String {
        let used = self.used.entry(dir.to_path_buf()).or_default();
        let base = format!("image_{page}_{index}");
        let mut name = format!("{base}.png");
        let mut n = 1;
        while used.contains(&name) {
            name = format!("{base}_{n}.png");
            n += 1;
        }
        used.insert(name.clone());
        name
    }
}

/// Writes the images of one document.
#[derive(Debug)]
pub struct ImageSink<'n> {
    dir: PathBuf,
    dir_name: String,
    min_dimension: u32,
    names: &'n mut ImageNames,
    created: bool,
}

impl<'n> ImageSink<'n> {
    /// Sink writing to `<dir of markdown_path>/<dir_name>`, taking names from
    /// `names`.
    pub fn new(
        markdown_path: &Path,
        dir_name: &str,
        min_dimension: u32,
        names: &'n mut ImageNames,
    ) -> Self {
        let parent = markdown_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Self {
            dir: parent.join(dir_name),
            dir_name: dir_name.to_string(),
            min_dimension,
            names,
            created: false,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the usable images of page `page` and return what was written,
    /// in input order.
    ///
    /// Undecodable images become [`ExtractWarning::ImageDecode`] entries in
    /// `warnings`; images under the size threshold are dropped silently.
    ///
    /// # Errors
    /// [`ConvertError::OutputWriteFailed`] if the folder or a file cannot be
    /// written.
    pub fn write_page_images(
        &mut self,
        page: usize,
        images: &[EmbeddedImage],
        warnings: &mut Vec<ExtractWarning>,
    ) -> Result<Vec<PageImage>, ConvertError> {
        let mut written = Vec::new();

        for (source_index, embedded) in images.iter().enumerate() {
            let img = match embedded.decoded {
                Ok(ref img) => img,
                Err(ref detail) => {
                    warn!("Page {}: image {} not decodable: {}", page, source_index, detail);
                    warnings.push(ExtractWarning::ImageDecode {
                        page,
                        index: source_index,
                        detail: detail.clone(),
                    });
                    continue;
                }
            };

            if img.width() < self.min_dimension || img.height() < self.min_dimension {
                debug!(
                    "Page {}: skipping {}x{} image {}",
                    page,
                    img.width(),
                    img.height(),
                    source_index
                );
                continue;
            }

            let bytes = match encode_png(img) {
                Ok(b) => b,
                Err(e) => {
                    warn!("Page {}: image {} PNG encoding failed: {}", page, source_index, e);
                    warnings.push(ExtractWarning::ImageDecode {
                        page,
                        index: source_index,
                        detail: e.to_string(),
                    });
                    continue;
                }
            };

            let index = written.len();
            let file_name = self.names.claim(&self.dir, page, index);
            let path = self.dir.join(&file_name);
            self.ensure_dir()?;
            std::fs::write(&path, &bytes).map_err(|e| ConvertError::write_failed(&path, e))?;
            debug!("Wrote {} ({} bytes)", path.display(), bytes.len());

            written.push(PageImage {
                relative_path: format!("{}/{}", self.dir_name, file_name),
                file_name,
                path,
                page,
                index,
                bounds: embedded.bounds,
            });
        }

        Ok(written)
    }

    fn ensure_dir(&mut self) -> Result<(), ConvertError> {
        if !self.created {
            std::fs::create_dir_all(&self.dir)
                .map_err(|e| ConvertError::write_failed(&self.dir, e))?;
            self.created = true;
        }
        Ok(())
    }
}
