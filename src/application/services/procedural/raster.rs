//! Rasterizes a [`Sketch`] into an RGBA buffer with `tiny-skia`.

use image::{Rgba as Pixel, RgbaImage};
use tiny_skia::{
    Color, FillRule, GradientStop, LinearGradient, LineCap, Paint, PathBuilder, Pixmap,
    RadialGradient, SpreadMode, Stroke, Transform,
};

use crate::domain::errors::GeneratorError;

use super::palette::{Hsla, Rgba, SAFE_GRADIENT};
use super::sketch::{ColorStop, Gradient, GradientFill, Point, Shape, Sketch};

/// Paints a sketch.
///
/// # Errors
/// Returns error if the canvas cannot be allocated or a primitive cannot be
/// turned into a valid path or shader.
pub fn rasterize(sketch: &Sketch) -> Result<RgbaImage, GeneratorError> {
    let mut pixmap = Pixmap::new(sketch.width, sketch.height).ok_or(GeneratorError::Canvas {
        width: sketch.width,
        height: sketch.height,
    })?;

    for layer in &sketch.background {
        fill_gradient(&mut pixmap, layer)?;
    }
    for shape in &sketch.shapes {
        draw_shape(&mut pixmap, shape)?;
    }

    Ok(to_image(&pixmap))
}

/// Two-color diagonal gradient drawn without any path machinery.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn safe_gradient(width: u32, height: u32) -> RgbaImage {
    let [from, to] = SAFE_GRADIENT;
    let span = (width + height).saturating_sub(2).max(1) as f32;
    let channel =
        |a: u8, b: u8, t: f32| (f32::from(b) - f32::from(a)).mul_add(t, f32::from(a)).round() as u8;

    RgbaImage::from_fn(width, height, |x, y| {
        let t = (x + y) as f32 / span;
        Pixel([
            channel(from.r, to.r, t),
            channel(from.g, to.g, t),
            channel(from.b, to.b, t),
            0xFF,
        ])
    })
}

fn to_skia_color(color: Rgba) -> Color {
    Color::from_rgba8(color.r, color.g, color.b, color.a)
}

fn to_skia_point(point: Point) -> tiny_skia::Point {
    tiny_skia::Point::from_xy(point.x, point.y)
}

fn to_skia_stops(stops: &[ColorStop]) -> Vec<GradientStop> {
    stops
        .iter()
        .map(|stop| GradientStop::new(stop.offset, to_skia_color(stop.color)))
        .collect()
}

fn solid_paint(color: Hsla) -> Paint<'static> {
    let rgba = color.to_rgba();
    let mut paint = Paint::default();
    paint.set_color_rgba8(rgba.r, rgba.g, rgba.b, rgba.a);
    paint.anti_alias = true;
    paint
}

fn fill_gradient(pixmap: &mut Pixmap, layer: &GradientFill) -> Result<(), GeneratorError> {
    let shader = match &layer.gradient {
        Gradient::Linear { start, end, stops } => LinearGradient::new(
            to_skia_point(*start),
            to_skia_point(*end),
            to_skia_stops(stops),
            SpreadMode::Pad,
            Transform::identity(),
        ),
        Gradient::Radial {
            center,
            radius,
            stops,
        } => RadialGradient::new(
            to_skia_point(*center),
            to_skia_point(*center),
            *radius,
            to_skia_stops(stops),
            SpreadMode::Pad,
            Transform::identity(),
        ),
    }
    .ok_or_else(|| GeneratorError::Gradient(format!("{:?}", layer.gradient)))?;

    let rect = tiny_skia::Rect::from_xywh(layer.origin.x, layer.origin.y, layer.width, layer.height)
        .ok_or(GeneratorError::Path("background"))?;
    let path = PathBuilder::from_rect(rect);

    let mut paint = Paint::default();
    paint.shader = shader;
    paint.anti_alias = true;
    pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    Ok(())
}

fn draw_shape(pixmap: &mut Pixmap, shape: &Shape) -> Result<(), GeneratorError> {
    match shape {
        Shape::Circle {
            center,
            radius,
            color,
        } => {
            let path = PathBuilder::from_circle(center.x, center.y, *radius)
                .ok_or(GeneratorError::Path("circle"))?;
            pixmap.fill_path(
                &path,
                &solid_paint(*color),
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
        Shape::Block {
            origin,
            width,
            height,
            rotation,
            color,
        } => {
            let rect = tiny_skia::Rect::from_xywh(origin.x, origin.y, *width, *height)
                .ok_or(GeneratorError::Path("block"))?;
            let path = PathBuilder::from_rect(rect);
            let transform = Transform::from_rotate_at(
                *rotation,
                origin.x + width / 2.0,
                origin.y + height / 2.0,
            );
            pixmap.fill_path(
                &path,
                &solid_paint(*color),
                FillRule::Winding,
                transform,
                None,
            );
        }
        Shape::Stroke {
            from,
            control_a,
            control_b,
            to,
            width,
            color,
        } => {
            let mut builder = PathBuilder::new();
            builder.move_to(from.x, from.y);
            builder.cubic_to(control_a.x, control_a.y, control_b.x, control_b.y, to.x, to.y);
            let path = builder.finish().ok_or(GeneratorError::Path("stroke"))?;
            let stroke = Stroke {
                width: *width,
                line_cap: LineCap::Round,
                ..Default::default()
            };
            pixmap.stroke_path(
                &path,
                &solid_paint(*color),
                &stroke,
                Transform::identity(),
                None,
            );
        }
    }
    Ok(())
}

fn to_image(pixmap: &Pixmap) -> RgbaImage {
    let width = pixmap.width();
    let pixels = pixmap.pixels();
    RgbaImage::from_fn(width, pixmap.height(), |x, y| {
        let color = pixels[(y * width + x) as usize].demultiply();
        Pixel([color.red(), color.green(), color.blue(), color.alpha()])
    })
}
