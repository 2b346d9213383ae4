use rayon::prelude::*;

pub type Rgb = [u8; 3];

/// Color canvas for terminal graphics.
/// Each character cell holds two vertically stacked pixels drawn with the
/// upper-half block glyph: foreground is the top pixel, background the bottom.
pub struct PixelCanvas {
    width: usize,  // Pixels (= characters)
    height: usize, // Pixels (= characters * 2)
    pixels: Vec<Rgb>,
}

impl PixelCanvas {
    /// Create a canvas covering `cols` x `rows` character cells, filled with `background`
    pub fn new(cols: usize, rows: usize, background: Rgb) -> Self {
        let width = cols;
        let height = rows * 2;
        Self {
            width,
            height,
            pixels: vec![background; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y * self.width + x])
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, color: Rgb) {
        if x >= self.width || y >= self.height {
            return;
        }
        self.pixels[y * self.width + x] = color;
    }

    /// Set a pixel using signed coordinates (ignores negative values)
    pub fn set_pixel_signed(&mut self, x: i32, y: i32, color: Rgb) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize, color);
        }
    }

    /// Shade every pixel in parallel rows. `shade(x, y, current)` returns the new color.
    pub fn shade_rows<F>(&mut self, shade: F)
    where
        F: Fn(usize, usize, Rgb) -> Rgb + Sync,
    {
        let width = self.width;
        if width == 0 {
            return;
        }
        self.pixels
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, px) in row.iter_mut().enumerate() {
                    *px = shade(x, y, *px);
                }
            });
    }

    /// Colors of character cell (col, row) as (top, bottom)
    pub fn cell(&self, col: usize, row: usize) -> Option<(Rgb, Rgb)> {
        let top = self.pixel(col, row * 2)?;
        let bottom = self.pixel(col, row * 2 + 1)?;
        Some((top, bottom))
    }
}

/// Blend `src` over `dst` with coverage `alpha` in [0, 1]
#[inline(always)]
pub fn blend(dst: Rgb, src: Rgb, alpha: f32) -> Rgb {
    let a = alpha.clamp(0.0, 1.0);
    let mix = |d: u8, s: u8| (d as f32 + (s as f32 - d as f32) * a).round() as u8;
    [mix(dst[0], src[0]), mix(dst[1], src[1]), mix(dst[2], src[2])]
}
