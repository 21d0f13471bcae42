use image::RgbImage;

use crate::common::{Area, Button, Frame, Offset};
use crate::device::Matcher;

/// Reference matcher: an element is present when the mean colour of its
/// detection area is close to the colour it was declared with.
///
/// The tolerance box is searched on a coarse grid, which is enough for flat UI
/// chrome. Template and OCR matching belong to a real vision backend.
#[derive(Debug, Clone)]
pub struct ColorMatcher {
    threshold: f32,
    search_step: i32,
}

impl ColorMatcher {
    pub fn new() -> Self {
        Self {
            threshold: 10.0,
            search_step: 5,
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold.max(0.0);
        self
    }

    pub fn with_search_step(mut self, step: i32) -> Self {
        self.search_step = step.max(1);
        self
    }

    fn mean_color(rgb: &RgbImage, area: &Area) -> Option<[f32; 3]> {
        let (width, height) = rgb.dimensions();
        let area = area.clamp_to(width, height)?;
        let mut sum = [0f64; 3];
        for y in area.y1..area.y2 {
            for x in area.x1..area.x2 {
                let px = rgb.get_pixel(x as u32, y as u32);
                sum[0] += px[0] as f64;
                sum[1] += px[1] as f64;
                sum[2] += px[2] as f64;
            }
        }
        let n = area.area() as f64;
        Some([
            (sum[0] / n) as f32,
            (sum[1] / n) as f32,
            (sum[2] / n) as f32,
        ])
    }

    fn luma(color: [f32; 3]) -> f32 {
        // Rec. 709 luminance
        0.2126 * color[0] + 0.7152 * color[1] + 0.0722 * color[2]
    }

    fn color_distance(a: [f32; 3], b: [u8; 3]) -> f32 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - *y as f32).abs())
            .fold(0.0, f32::max)
    }

    fn candidates(&self, area: &Area, offset: Offset) -> Vec<Area> {
        let mut areas = vec![*area];
        if offset.is_none() {
            return areas;
        }
        let mut dy = -offset.top;
        while dy <= offset.bottom {
            let mut dx = -offset.left;
            while dx <= offset.right {
                if dx != 0 || dy != 0 {
                    areas.push(area.shifted(dx, dy));
                }
                dx += self.search_step;
            }
            dy += self.search_step;
        }
        areas
    }

    fn search<F>(&self, frame: &Frame, button: &Button, offset: Offset, accept: F) -> bool
    where
        F: Fn([f32; 3]) -> bool,
    {
        let rgb = frame.rgb8();
        self.candidates(&button.area, offset)
            .iter()
            .filter_map(|area| Self::mean_color(&rgb, area))
            .any(accept)
    }
}

impl Default for ColorMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Matcher for ColorMatcher {
    fn appear(&self, frame: &Frame, button: &Button, offset: Offset, similarity: f32) -> bool {
        // Lower similarity widens the accepted colour distance.
        let threshold = self.threshold * (2.0 - similarity.clamp(0.0, 1.0));
        self.search(frame, button, offset, |mean| {
            Self::color_distance(mean, button.color) <= threshold
        })
    }

    fn match_luma(&self, frame: &Frame, button: &Button, offset: Offset) -> bool {
        let expected = Self::luma([
            button.color[0] as f32,
            button.color[1] as f32,
            button.color[2] as f32,
        ]);
        self.search(frame, button, offset, |mean| {
            (Self::luma(mean) - expected).abs() <= self.threshold
        })
    }
}
