//! Line rasterization strategies
//!
//! Both strategies turn a floating-point segment into a lazy, cloneable
//! sequence of integer pixels. Cloning the iterator before consuming it
//! restarts the line from its first pixel.

use serde::{Deserialize, Serialize};
use super::math::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineStrategy {
    /// Integer error accumulation along the dominant axis
    Bresenham,
    /// Fixed floating-point increments, rounded per step
    Dda,
}

impl LineStrategy {
    pub const ALL: [LineStrategy; 2] = [LineStrategy::Bresenham, LineStrategy::Dda];

    pub fn label(&self) -> &'static str {
        match self {
            LineStrategy::Bresenham => "Bresenham",
            LineStrategy::Dda => "DDA",
        }
    }

    pub fn pixels(self, start: Vec2, end: Vec2) -> LinePixels {
        match self {
            LineStrategy::Bresenham => LinePixels::Bresenham(BresenhamLine::new(start, end)),
            LineStrategy::Dda => LinePixels::Dda(DdaLine::new(start, end)),
        }
    }
}

/// Pixel sequence produced by a [`LineStrategy`]
#[derive(Debug, Clone)]
pub enum LinePixels {
    Bresenham(BresenhamLine),
    Dda(DdaLine),
}

impl Iterator for LinePixels {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<(i32, i32)> {
        match self {
            LinePixels::Bresenham(line) => line.next(),
            LinePixels::Dda(line) => line.next(),
        }
    }
}

/// Bresenham line between the rounded endpoints.
///
/// Steps are counted along the dominant axis. The 2x2 sign matrix maps
/// (step, minor offset) back to screen axes, so steep lines swap axes
/// without swapping coordinates.
#[derive(Debug, Clone)]
pub struct BresenhamLine {
    x0: i32,
    y0: i32,
    m: [[i32; 2]; 2],
    step_count: i32,
    step: i32,
    minor: i32,
    error: i32,
    d_error: i32,
}

impl BresenhamLine {
    pub fn new(start: Vec2, end: Vec2) -> Self {
        let x0 = start.x.round() as i32;
        let y0 = start.y.round() as i32;
        let dx = end.x.round() as i32 - x0;
        let dy = end.y.round() as i32 - y0;
        let width = dx.abs();
        let height = dy.abs();

        let mut m = [[dx.signum(), 0], [0, dy.signum()]];
        if width < height {
            m = [[0, dx.signum()], [dy.signum(), 0]];
        }

        Self {
            x0,
            y0,
            m,
            step_count: width.max(height),
            step: 0,
            minor: 0,
            error: 0,
            d_error: 2 * width.min(height),
        }
    }
}

impl Iterator for BresenhamLine {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<(i32, i32)> {
        if self.step > self.step_count {
            return None;
        }
        let px = self.x0 + self.m[0][0] * self.step + self.m[0][1] * self.minor;
        let py = self.y0 + self.m[1][0] * self.step + self.m[1][1] * self.minor;

        self.step += 1;
        self.error += self.d_error;
        if self.error > self.step_count {
            self.error -= 2 * self.step_count;
            self.minor += 1;
        }
        Some((px, py))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.step_count - self.step + 1).max(0) as usize;
        (left, Some(left))
    }
}

/// Digital differential analyzer.
///
/// Walks `round(max(|dx|, |dy|))` equal increments from `start`, ending
/// exactly on `end`. A pixel equal to the one just emitted is skipped, so
/// the last pixel is never a duplicate.
#[derive(Debug, Clone)]
pub struct DdaLine {
    start: Vec2,
    end: Vec2,
    increment: Vec2,
    steps: i32,
    step: i32,
    last: Option<(i32, i32)>,
}

impl DdaLine {
    pub fn new(start: Vec2, end: Vec2) -> Self {
        let dx = end.x - start.x;
        let dy = end.y - start.y;
        // A sub-pixel segment still gets one step so that `end` is visited
        let steps = (dx.abs().max(dy.abs()).round() as i32).max(1);

        Self {
            start,
            end,
            increment: Vec2::new(dx / steps as f32, dy / steps as f32),
            steps,
            step: 0,
            last: None,
        }
    }

    fn point_at(&self, step: i32) -> (i32, i32) {
        if step == self.steps {
            return (self.end.x.round() as i32, self.end.y.round() as i32);
        }
        let x = self.start.x + self.increment.x * step as f32;
        let y = self.start.y + self.increment.y * step as f32;
        (x.round() as i32, y.round() as i32)
    }
}

impl Iterator for DdaLine {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<(i32, i32)> {
        while self.step <= self.steps {
            let p = self.point_at(self.step);
            self.step += 1;
            if self.last != Some(p) {
                self.last = Some(p);
                return Some(p);
            }
        }
        None
    }
}
