use std::fs;
use std::path::Path;

use image::{GrayImage, Luma};
use log::debug;

use crate::error::QrError;
use crate::qrcode::QrCode;

/*---- Utilities ----*/

/// Largest rendered side length, in pixels for images and modules for text output.
pub const MAX_DIMENSION: i32 = i16::MAX as i32;

/// Side length of the rendered symbol, border included, in units of `scale`.
fn checked_dimension(qr: &QrCode, border: i32, scale: i32) -> Result<i32, QrError> {
    if border < 0 {
        return Err(QrError::invalid("Border must be non-negative"));
    }
    if scale < 1 {
        return Err(QrError::invalid("Scale must be positive"));
    }
    border
        .checked_mul(2)
        .and_then(|b| b.checked_add(qr.size()))
        .and_then(|d| d.checked_mul(scale))
        .filter(|&d| d <= MAX_DIMENSION)
        .ok_or_else(|| {
            QrError::invalid(format!(
                "Border {border} and scale {scale} exceed the maximum dimension of {MAX_DIMENSION}"
            ))
        })
}

/// Returns a string of SVG code for an image depicting the given QR Code, with
/// the given number of border modules and colors.
///
/// The dark modules are merged into rectangles, so the path is much shorter than
/// one square per module. The string always uses Unix newlines (\n), regardless
/// of the platform.
///
/// # Example
///
/// ```rust
/// use qrsmith::{helper::to_svg_string, QrCode, QrCodeEcc};
///
/// let qr = QrCode::encode_text("HELLO WORLD", QrCodeEcc::Low).unwrap();
/// let svg = to_svg_string(&qr, 4, "#000000", "#FFFFFF").unwrap();
/// assert!(svg.ends_with("</svg>\n"));
/// ```
pub fn to_svg_string(qr: &QrCode, border: i32, foreground: &str, background: &str) -> Result<String, QrError> {
    let dimension = checked_dimension(qr, border, 1)?;
    let path = to_graphics_path(qr, border)?;
    let mut result = String::new();
    result += "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
    result += "<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\n";
    result += &format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" viewBox=\"0 0 {0} {0}\" stroke=\"none\">\n",
        dimension
    );
    result += &format!("\t<rect width=\"100%\" height=\"100%\" fill=\"{background}\"/>\n");
    result += &format!("\t<path d=\"{path}\" fill=\"{foreground}\"/>\n");
    result += "</svg>\n";
    Ok(result)
}

/// Returns the dark modules as an SVG/XAML path, offset by `border` modules.
///
/// Each path element is a rectangle `M{x},{y}h{w}v{h}h{-w}z`: starting in row-major
/// order at every dark module not yet covered, the largest rectangle of dark
/// modules with that top left corner is drawn and cleared on a private copy of the grid.
pub fn to_graphics_path(qr: &QrCode, border: i32) -> Result<String, QrError> {
    checked_dimension(qr, border, 1)?;
    let size = qr.size();
    let mut modules: Vec<Vec<bool>> = (0..size).map(|y| (0..size).map(|x| qr.get_module(x, y)).collect()).collect();

    let mut path = String::new();
    for y in 0..size {
        for x in 0..size {
            if modules[y as usize][x as usize] {
                draw_largest_rectangle(&mut path, &mut modules, x, y, border);
            }
        }
    }
    Ok(path)
}

fn draw_largest_rectangle(path: &mut String, modules: &mut [Vec<bool>], x: i32, y: i32, border: i32) {
    let size = modules.len();
    let (x0, y0) = (x as usize, y as usize);

    let mut bestw: usize = 1;
    let mut besth: usize = 1;
    let mut maxarea: usize = 1;
    let mut xlimit: usize = size;
    let mut iy: usize = y0;
    while iy < size && modules[iy][x0] {
        let w = modules[iy][x0..xlimit].iter().take_while(|&&dark| dark).count();
        let area = w * (iy - y0 + 1);
        if area > maxarea {
            maxarea = area;
            bestw = w;
            besth = iy - y0 + 1;
        }
        xlimit = x0 + w;
        iy += 1;
    }

    if x != 0 || y != 0 {
        path.push(' ');
    }
    path.push_str(&format!("M{},{}h{}v{}h-{}z", x + border, y + border, bestw, besth, bestw));

    for row in &mut modules[y0..y0 + besth] {
        row[x0..x0 + bestw].fill(false);
    }
}

/// Renders the QR Code as text, two block characters per module so the
/// symbol looks square in a terminal.
pub fn to_console_string(qr: &QrCode, border: i32) -> Result<String, QrError> {
    checked_dimension(qr, border, 1)?;
    let mut result = String::new();
    for y in -border..qr.size() + border {
        for x in -border..qr.size() + border {
            let c: char = if qr.get_module(x, y) { '█' } else { ' ' };
            result.push(c);
            result.push(c);
        }
        result.push('\n');
    }
    Ok(result)
}

/// Converts a QR Code to a grayscale image, `scale` pixels per module and a
/// light border of `border` modules.
///
/// # Example
///
/// ```rust
/// use qrsmith::{helper::to_image, QrCode, QrCodeEcc};
///
/// let qr = QrCode::encode_text("Hello, world!", QrCodeEcc::Low).unwrap();
/// let img = to_image(&qr, 4, 2).unwrap();
/// assert_eq!(img.dimensions(), (58, 58));
/// ```
pub fn to_image(qr: &QrCode, border: i32, scale: i32) -> Result<GrayImage, QrError> {
    let dimension = checked_dimension(qr, border, scale)?;
    let img = GrayImage::from_fn(dimension as u32, dimension as u32, |x, y| {
        let qr_x = x as i32 / scale - border;
        let qr_y = y as i32 / scale - border;
        if qr.get_module(qr_x, qr_y) {
            Luma([0u8]) // Black
        } else {
            Luma([255u8]) // White
        }
    });
    Ok(img)
}

/// Renders the QR Code with [`to_image`] and saves it as a PNG file, creating
/// the parent directory if needed.
///
/// # Errors
///
/// Returns [`QrError::InvalidArgument`] for a bad border or scale and
/// [`QrError::Image`] if the file cannot be written.
pub fn save_png(qr: &QrCode, path: impl AsRef<Path>, border: i32, scale: i32) -> Result<(), QrError> {
    let path = path.as_ref();
    let img = to_image(qr, border, scale)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(image::ImageError::IoError)?;
        }
    }
    debug!("Saving {}x{} image to {}", img.width(), img.height(), path.display());
    img.save(path)?;
    Ok(())
}
