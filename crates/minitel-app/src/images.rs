//! Picture files turned into mosaic byte streams.

use std::path::Path;

use image::DynamicImage;
use minitel_vt::control::{LAST_COLUMN, LAST_ROW};
use minitel_vt::graphics::{self, LumaImage};

/// Levels kept after posterizing: the top three bits, one per gray the
/// terminal can show.
const LEVEL_MASK: u8 = 0xE0;

/// Errors raised while loading artwork.
#[derive(Debug)]
pub enum ArtError {
    Decode(image::ImageError),
    /// Dimensions too large to address.
    Size { width: u32, height: u32 },
    /// The picture would run past the edge of the screen.
    OffScreen { cells: (usize, usize), origin: (u8, u8) },
}

impl std::fmt::Display for ArtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtError::Decode(err) => write!(f, "failed to decode image: {err}"),
            ArtError::Size { width, height } => write!(f, "image of {width}x{height} is too large"),
            ArtError::OffScreen { cells, origin } => write!(
                f,
                "{}x{} cells at column {}, row {} do not fit on the screen",
                cells.0, cells.1, origin.0, origin.1
            ),
        }
    }
}

impl std::error::Error for ArtError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArtError::Decode(err) => Some(err),
            ArtError::Size { .. } | ArtError::OffScreen { .. } => None,
        }
    }
}

impl From<image::ImageError> for ArtError {
    fn from(err: image::ImageError) -> Self {
        ArtError::Decode(err)
    }
}

/// Grayscale, posterized copy of `image`.
pub fn to_luma(image: &DynamicImage) -> Result<LumaImage, ArtError> {
    let gray = image.to_luma8();
    let (width, height) = gray.dimensions();
    let pixels = gray.into_raw().into_iter().map(|v| v & LEVEL_MASK).collect();
    LumaImage::from_raw(width as usize, height as usize, pixels)
        .ok_or(ArtError::Size { width, height })
}

/// Load the picture at `path` and encode it with its top-left cell at
/// `origin`.
pub fn mosaic_from_file(path: &Path, origin: (u8, u8)) -> Result<Vec<u8>, ArtError> {
    let image = image::open(path)?;
    let luma = to_luma(&image)?;
    log::debug!(
        "loaded {} ({}x{} pixels)",
        path.display(),
        luma.width(),
        luma.height()
    );
    fit_on_screen(&luma, origin)?;
    Ok(graphics::encode(&luma, origin))
}

fn fit_on_screen(luma: &LumaImage, origin: (u8, u8)) -> Result<(), ArtError> {
    let cells = luma.cells();
    let (column, row) = (usize::from(origin.0), usize::from(origin.1));
    let fits = column >= 1
        && row >= 1
        && column + cells.0 <= usize::from(LAST_COLUMN) + 1
        && row + cells.1 <= usize::from(LAST_ROW) + 1;
    if fits {
        Ok(())
    } else {
        Err(ArtError::OffScreen { cells, origin })
    }
}
