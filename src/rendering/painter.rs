// src/rendering/painter.rs
// Orthographic rasterizer: spheres as flat discs, cylinders as lines,
// unit-cell wireframe, labels and the element legend on a cairo image.

use super::labels::LabelOptions;
use super::primitives::Primitive;
use super::style::{Color, Legend};
use crate::error::{RenderError, Result};
use crate::utils::geometry::Point3;
use cairo::{Context, FontSlant, FontWeight, Format, ImageSurface, LineCap};
use std::f64::consts::PI;

/// Default sphere radius when a primitive has none (Å)
const SPHERE_RADIUS: f64 = 1.0;
/// Default cylinder radius when a primitive has none (Å)
const CYLINDER_RADIUS: f64 = 0.2;

// ============================================================================
// PROJECTION
// ============================================================================

/// Point spread below which a set has no usable scale of its own (Å)
const DEGENERATE_RANGE: f64 = 1e-3;

/// Drops Z; X to the right, Y up (inverted against image rows).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    center: Point3,
    scale: f64,
    size: (f64, f64),
    origin: Point3,
}

impl Projection {
    /// Centers the centroid of `points` and scales the largest per-axis
    /// extent to 45% of the shorter image side.
    pub fn fit(points: impl IntoIterator<Item = Point3>, size: (u32, u32), origin: Point3) -> Self {
        let (center, range) = extent(points).unwrap_or(([0.0; 3], 0.0));
        Self::with_range(center, range, size, origin)
    }

    /// Like [`Projection::fit`], but a single point or a set of coincident
    /// points takes its scale from `frame` while staying centered. With no
    /// points at all the frame itself is fitted.
    pub fn fit_framed(
        points: impl IntoIterator<Item = Point3>,
        frame: impl IntoIterator<Item = Point3>,
        size: (u32, u32),
        origin: Point3,
    ) -> Self {
        match extent(points) {
            Some((center, range)) if range >= DEGENERATE_RANGE => {
                Self::with_range(center, range, size, origin)
            }
            Some((center, _)) => {
                let (_, range) = extent(frame).unwrap_or(([0.0; 3], 0.0));
                Self::with_range(center, range, size, origin)
            }
            None => Self::fit(frame, size, origin),
        }
    }

    /// Fit over the positions of spheres and cylinders only; other kinds
    /// are not rasterized.
    pub fn for_primitives(
        primitives: &[&Primitive],
        frame: impl IntoIterator<Item = Point3>,
        size: (u32, u32),
        origin: Point3,
    ) -> Self {
        Self::fit_framed(drawable_points(primitives), frame, size, origin)
    }

    fn with_range(center: Point3, range: f64, size: (u32, u32), origin: Point3) -> Self {
        let (w, h) = (size.0 as f64, size.1 as f64);
        Self {
            center,
            scale: 0.45 * w.min(h) / range.max(1e-6),
            size: (w, h),
            origin,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn project(&self, p: Point3) -> (f64, f64) {
        let x = (p[0] - self.center[0]) * self.scale;
        let y = (p[1] - self.center[1]) * self.scale;
        (
            self.size.0 / 2.0 + x + self.origin[0],
            self.size.1 / 2.0 - y - self.origin[1],
        )
    }
}

/// Centroid and largest per-axis spread; `None` for an empty set.
fn extent(points: impl IntoIterator<Item = Point3>) -> Option<(Point3, f64)> {
    let mut count = 0usize;
    let mut sum = [0.0; 3];
    let mut min = [f64::INFINITY; 3];
    let mut max = [f64::NEG_INFINITY; 3];

    for p in points {
        count += 1;
        for i in 0..3 {
            sum[i] += p[i];
            min[i] = min[i].min(p[i]);
            max[i] = max[i].max(p[i]);
        }
    }

    if count == 0 {
        return None;
    }
    let n = count as f64;
    let range = (0..3).map(|i| max[i] - min[i]).fold(0.0, f64::max);
    Some(([sum[0] / n, sum[1] / n, sum[2] / n], range))
}

pub fn drawable_points<'a>(primitives: &'a [&'a Primitive]) -> impl Iterator<Item = Point3> + 'a {
    primitives.iter().flat_map(|p| -> Box<dyn Iterator<Item = Point3> + 'a> {
        match p {
            Primitive::Spheres(s) => Box::new(s.positions.iter().copied()),
            Primitive::Cylinders(c) => Box::new(c.position_pairs.iter().flatten().copied()),
            _ => Box::new(std::iter::empty()),
        }
    })
}

/// Axis-aligned extremes of every drawn sphere and cylinder, radius included.
pub fn drawable_bounds<'a>(primitives: &'a [&'a Primitive]) -> impl Iterator<Item = Point3> + 'a {
    primitives.iter().flat_map(|p| -> Box<dyn Iterator<Item = Point3> + 'a> {
        match p {
            Primitive::Spheres(s) => {
                let r = s.radius.unwrap_or(SPHERE_RADIUS);
                Box::new(s.positions.iter().flat_map(move |&c| padded(c, r)))
            }
            Primitive::Cylinders(c) => {
                let r = c.radius.unwrap_or(CYLINDER_RADIUS);
                Box::new(c.position_pairs.iter().flatten().flat_map(move |&e| padded(e, r)))
            }
            _ => Box::new(std::iter::empty()),
        }
    })
}

fn padded(c: Point3, r: f64) -> [Point3; 2] {
    [[c[0] - r, c[1] - r, c[2] - r], [c[0] + r, c[1] + r, c[2] + r]]
}

fn resolve_color(color: Option<&str>) -> Color {
    match color.map(str::parse::<Color>) {
        Some(Ok(c)) => c,
        Some(Err(_)) => {
            log::warn!("Unrecognised primitive color {:?}, using gray", color);
            Color::GRAY
        }
        None => Color::GRAY,
    }
}

// ============================================================================
// CANVAS
// ============================================================================

/// Encoded image plus its pixel size.
#[derive(Debug, Clone)]
pub struct RenderResult {
    pub image_bytes: Vec<u8>,
    pub size: (u32, u32),
}

pub struct Canvas {
    surface: ImageSurface,
    cr: Context,
    size: (u32, u32),
}

impl Canvas {
    /// ARGB32 surface filled with the background color.
    pub fn new(size: (u32, u32), background: Color) -> Result<Self> {
        let (w, h) = size;
        let dims = (i32::try_from(w), i32::try_from(h));
        let (Ok(width), Ok(height)) = dims else {
            return Err(RenderError::unsupported("image size", format!("{}x{}", w, h)));
        };
        if width == 0 || height == 0 {
            return Err(RenderError::unsupported("image size", format!("{}x{}", w, h)));
        }

        let surface = ImageSurface::create(Format::ARgb32, width, height)?;
        let cr = Context::new(&surface)?;
        cr.set_source_rgb(background.r, background.g, background.b);
        cr.paint()?;

        Ok(Self { surface, cr, size })
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Draws in slice order; kinds other than spheres and cylinders are skipped.
    pub fn draw_primitives(&self, primitives: &[&Primitive], projection: &Projection) -> Result<()> {
        let cr = &self.cr;
        let mut skipped = 0usize;

        for primitive in primitives {
            match primitive {
                Primitive::Spheres(spheres) => {
                    let c = resolve_color(spheres.color.as_deref());
                    let radius = spheres.radius.unwrap_or(SPHERE_RADIUS) * projection.scale();
                    cr.set_source_rgb(c.r, c.g, c.b);
                    for &pos in &spheres.positions {
                        let (x, y) = projection.project(pos);
                        cr.new_sub_path();
                        cr.arc(x, y, radius, 0.0, 2.0 * PI);
                        cr.fill()?;
                    }
                }
                Primitive::Cylinders(cylinders) => {
                    let c = resolve_color(cylinders.color.as_deref());
                    let radius = cylinders.radius.unwrap_or(CYLINDER_RADIUS);
                    let width = (radius * projection.scale()).round().max(1.0);
                    cr.set_source_rgb(c.r, c.g, c.b);
                    cr.set_line_width(width);
                    cr.set_line_cap(LineCap::Round);
                    for [start, end] in &cylinders.position_pairs {
                        let (x1, y1) = projection.project(*start);
                        let (x2, y2) = projection.project(*end);
                        cr.move_to(x1, y1);
                        cr.line_to(x2, y2);
                        cr.stroke()?;
                    }
                }
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            log::debug!("{} primitives of unsupported kinds not rasterized", skipped);
        }
        Ok(())
    }

    pub fn draw_unit_cell(&self, edges: &[(Point3, Point3)], projection: &Projection) -> Result<()> {
        let cr = &self.cr;
        cr.set_source_rgb(0.3, 0.3, 0.3);
        cr.set_line_width(2.0);
        cr.set_line_cap(LineCap::Butt);

        for &(start, end) in edges {
            let (x1, y1) = projection.project(start);
            let (x2, y2) = projection.project(end);
            cr.move_to(x1, y1);
            cr.line_to(x2, y2);
        }
        cr.stroke()?;
        Ok(())
    }

    /// Text centered on each projected point, with an optional drop shadow.
    pub fn draw_labels(
        &self,
        labels: &[(Point3, String)],
        options: &LabelOptions,
        projection: &Projection,
    ) -> Result<()> {
        let cr = &self.cr;
        cr.select_font_face("Sans", FontSlant::Normal, FontWeight::Bold);
        cr.set_font_size(options.font_size as f64);

        for (pos, text) in labels {
            let (x, y) = projection.project(*pos);
            let extents = cr.text_extents(text)?;
            let tx = x - extents.width() / 2.0 - extents.x_bearing();
            let ty = y - extents.height() / 2.0 - extents.y_bearing();

            if options.shadow {
                cr.set_source_rgba(0.0, 0.0, 0.0, 0.35);
                cr.move_to(tx + 1.0, ty + 1.0);
                cr.show_text(text)?;
            }
            let c = options.text_color;
            cr.set_source_rgb(c.r, c.g, c.b);
            cr.move_to(tx, ty);
            cr.show_text(text)?;
        }
        Ok(())
    }

    /// One outlined swatch and symbol per element, stacked down from the
    /// top-right corner.
    pub fn draw_legend(&self, legend: &Legend) -> Result<()> {
        if legend.is_empty() {
            return Ok(());
        }
        let cr = &self.cr;
        let padding = 10.0;
        let box_size = 18.0;
        let text_offset = 6.0;
        let x = self.size.0 as f64 - 200.0;
        let mut y = padding;

        cr.select_font_face("Sans", FontSlant::Normal, FontWeight::Normal);
        cr.set_font_size(12.0);
        cr.set_line_width(1.0);

        for (element, color) in &legend.entries {
            cr.rectangle(x, y, box_size, box_size);
            cr.set_source_rgb(color.r, color.g, color.b);
            cr.fill_preserve()?;
            cr.set_source_rgb(0.0, 0.0, 0.0);
            cr.stroke()?;

            // Baseline placed so the text top lines up with the swatch
            cr.move_to(x + box_size + text_offset, y + 12.0);
            cr.show_text(element)?;

            y += box_size + padding;
        }
        Ok(())
    }

    /// Encodes the surface as PNG in memory.
    pub fn finish(self) -> Result<RenderResult> {
        let Canvas { surface, cr, size } = self;
        drop(cr);
        surface.flush();

        let mut image_bytes = Vec::new();
        surface.write_to_png(&mut image_bytes)?;
        Ok(RenderResult { image_bytes, size })
    }
}
