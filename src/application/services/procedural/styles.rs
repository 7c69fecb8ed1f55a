//! Per-style sketch renderers.

use crate::domain::entities::{Seed, Style};

use super::palette::{
    ABSTRACT_PALETTES, BLUE_HUES, DIGITAL_PALETTES, GREEN_HUES, GROUND, HueBand, Hsla, NEON_HUES,
    OPEN_HUES, PAINTING_PALETTES, Rgba, SKY_PALETTES, sample_hue,
};
use super::random::SeededRandom;
use super::sketch::{Gradient, GradientFill, Point, Shape, Sketch, even_stops, positive};

const ABSTRACT_CIRCLES: usize = 12;
const DIGITAL_BLOCKS: usize = 15;
const PAINTING_STROKES: usize = 10;
const LANDSCAPE_BLOCKS: usize = 5;

/// Fraction of a photograph taken by the sky.
pub const HORIZON: f32 = 0.6;

type Renderer = fn(&mut SeededRandom, f32, f32) -> (Vec<GradientFill>, Vec<Shape>);

/// Returns the renderer for a concrete style.
const fn renderer(style: Style) -> Renderer {
    match style {
        Style::Abstract | Style::Sculpture | Style::Mixed => render_abstract,
        Style::Digital => render_digital,
        Style::Painting => render_painting,
        Style::Photography => render_photography,
    }
}

/// Maps a requested style to the style actually drawn.
///
/// `Mixed` consumes the first value of the stream.
fn resolve(style: Style, rng: &mut SeededRandom) -> Style {
    match style {
        Style::Sculpture => Style::Abstract,
        Style::Mixed => *rng.pick(&Style::CONCRETE),
        other => other,
    }
}

/// Builds the drawing instructions for `seed` in `style`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn sketch(seed: &Seed, width: u32, height: u32, style: Style) -> Sketch {
    let mut rng = SeededRandom::new(seed.as_str());
    let concrete = resolve(style, &mut rng);
    let (background, shapes) = renderer(concrete)(&mut rng, width as f32, height as f32);

    Sketch {
        width,
        height,
        style: concrete,
        background,
        shapes,
    }
}

fn full_canvas(w: f32, h: f32, gradient: Gradient) -> GradientFill {
    GradientFill {
        origin: Point::new(0.0, 0.0),
        width: w,
        height: h,
        gradient,
    }
}

fn tint(rng: &mut SeededRandom, bands: &[HueBand], lightness: (f32, f32), alpha: (f32, f32)) -> Hsla {
    Hsla {
        hue: sample_hue(rng, bands),
        saturation: rng.range(0.5, 0.9),
        lightness: rng.range(lightness.0, lightness.1),
        alpha: rng.range(alpha.0, alpha.1),
    }
}

fn render_abstract(rng: &mut SeededRandom, w: f32, h: f32) -> (Vec<GradientFill>, Vec<Shape>) {
    let palette = rng.pick(ABSTRACT_PALETTES);
    let background = full_canvas(
        w,
        h,
        Gradient::Radial {
            center: Point::new(w / 2.0, h / 2.0),
            radius: positive(w.max(h) * 0.75),
            stops: even_stops(palette),
        },
    );

    let min_side = w.min(h);
    let shapes = (0..ABSTRACT_CIRCLES)
        .map(|_| Shape::Circle {
            center: Point::new(rng.range(0.0, w), rng.range(0.0, h)),
            radius: positive(rng.range(0.05, 0.25) * min_side),
            color: tint(rng, OPEN_HUES, (0.45, 0.7), (0.25, 0.6)),
        })
        .collect();

    (vec![background], shapes)
}

fn render_digital(rng: &mut SeededRandom, w: f32, h: f32) -> (Vec<GradientFill>, Vec<Shape>) {
    let palette = rng.pick(DIGITAL_PALETTES);
    let background = full_canvas(
        w,
        h,
        Gradient::Linear {
            start: Point::new(0.0, 0.0),
            end: Point::new(w, h),
            stops: even_stops(palette),
        },
    );

    let shapes = (0..DIGITAL_BLOCKS)
        .map(|_| Shape::Block {
            origin: Point::new(rng.range(0.0, w), rng.range(0.0, h)),
            width: positive(rng.range(0.05, 0.3) * w),
            height: positive(rng.range(0.02, 0.12) * h),
            rotation: rng.range(-45.0, 45.0),
            color: tint(rng, NEON_HUES, (0.5, 0.65), (0.35, 0.7)),
        })
        .collect();

    (vec![background], shapes)
}

fn render_painting(rng: &mut SeededRandom, w: f32, h: f32) -> (Vec<GradientFill>, Vec<Shape>) {
    let palette = rng.pick(PAINTING_PALETTES);
    let background = full_canvas(
        w,
        h,
        Gradient::Linear {
            start: Point::new(0.0, 0.0),
            end: Point::new(0.0, h),
            stops: even_stops(palette),
        },
    );

    let min_side = w.min(h);
    let point = |rng: &mut SeededRandom| Point::new(rng.range(0.0, w), rng.range(0.0, h));
    let shapes = (0..PAINTING_STROKES)
        .map(|_| Shape::Stroke {
            from: point(rng),
            control_a: point(rng),
            control_b: point(rng),
            to: point(rng),
            width: positive(rng.range(0.01, 0.05) * min_side),
            color: tint(rng, OPEN_HUES, (0.35, 0.6), (0.4, 0.75)),
        })
        .collect();

    (vec![background], shapes)
}

fn render_photography(rng: &mut SeededRandom, w: f32, h: f32) -> (Vec<GradientFill>, Vec<Shape>) {
    let horizon = h * HORIZON;
    let sky = GradientFill {
        origin: Point::new(0.0, 0.0),
        width: w,
        height: positive(horizon),
        gradient: Gradient::Linear {
            start: Point::new(0.0, 0.0),
            end: Point::new(0.0, horizon),
            stops: even_stops(rng.pick::<[Rgba; 3]>(SKY_PALETTES)),
        },
    };
    let ground = GradientFill {
        origin: Point::new(0.0, horizon),
        width: w,
        height: positive(h - horizon),
        gradient: Gradient::Linear {
            start: Point::new(0.0, horizon),
            end: Point::new(0.0, h),
            stops: even_stops(&GROUND),
        },
    };

    let slot = w / LANDSCAPE_BLOCKS as f32;
    let shapes = (0..LANDSCAPE_BLOCKS)
        .map(|i| {
            let width = positive(rng.range(0.15, 0.3) * w);
            let height = positive(rng.range(0.05, 0.25) * h);
            let x = (i as f32).mul_add(slot, rng.range(-0.25, 0.25) * slot);
            let sink = rng.range(0.0, 0.1) * h;
            // Green foliage, blue distance or near-black silhouettes.
            let color = match rng.index(3) {
                0 => tint(rng, GREEN_HUES, (0.25, 0.45), (0.6, 0.85)),
                1 => tint(rng, BLUE_HUES, (0.3, 0.5), (0.6, 0.85)),
                _ => {
                    let bands = if rng.next_f64() < 0.5 { GREEN_HUES } else { BLUE_HUES };
                    tint(rng, bands, (0.04, 0.1), (0.7, 0.9))
                }
            };
            Shape::Block {
                origin: Point::new(x, horizon - height + sink),
                width,
                height,
                rotation: 0.0,
                color,
            }
        })
        .collect();

    (vec![sky, ground], shapes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::procedural::palette::MUDDY;
    use test_case::test_case;

    #[test_case(Style::Abstract, 12 ; "abstract")]
    #[test_case(Style::Digital, 15 ; "digital")]
    #[test_case(Style::Painting, 10 ; "painting")]
    #[test_case(Style::Photography, 5 ; "photography")]
    #[test_case(Style::Sculpture, 12 ; "sculpture_as_abstract")]
    fn test_shape_counts(style: Style, expected: usize) {
        let sketch = sketch(&Seed::new("counts"), 400, 400, style);
        assert_eq!(sketch.shapes.len(), expected);
        assert!((5..=15).contains(&sketch.shapes.len()));
    }

    #[test]
    fn test_sculpture_renders_as_abstract() {
        let seed = Seed::new("Marble Torso:sculpture");
        let sculpture = sketch(&seed, 200, 200, Style::Sculpture);
        let abstract_ = sketch(&seed, 200, 200, Style::Abstract);
        assert_eq!(sculpture, abstract_);
    }

    #[test]
    fn test_mixed_resolves_deterministically_to_concrete_style() {
        for name in ["a", "b", "Collage:mixed", "Untitled #4", "Ocean"] {
            let seed = Seed::new(name);
            let first = sketch(&seed, 100, 100, Style::Mixed);
            let second = sketch(&seed, 100, 100, Style::Mixed);
            assert_eq!(first.style, second.style);
            assert!(Style::CONCRETE.contains(&first.style));
        }
    }

    #[test]
    fn test_overlay_hues_avoid_muddy_band() {
        for i in 0..200 {
            let seed = Seed::new(format!("artwork #{i}"));
            for style in Style::CONCRETE {
                for shape in sketch(&seed, 320, 240, style).shapes {
                    let hue = shape.color().hue;
                    assert!(!MUDDY.contains(hue), "{style} produced hue {hue}");
                }
            }
        }
    }

    #[test]
    fn test_extents_are_positive_on_tiny_canvas() {
        for style in Style::CONCRETE {
            let sketch = sketch(&Seed::new("tiny"), 1, 1, style);
            for shape in &sketch.shapes {
                match shape {
                    Shape::Circle { radius, .. } => assert!(*radius >= 1.0),
                    Shape::Block { width, height, .. } => {
                        assert!(*width >= 1.0 && *height >= 1.0);
                    }
                    Shape::Stroke { width, .. } => assert!(*width >= 1.0),
                }
            }
        }
    }

    #[test]
    fn test_photography_layout() {
        let sketch = sketch(&Seed::from_artwork("Ocean", "photography"), 400, 400, Style::Photography);

        assert_eq!(sketch.style, Style::Photography);
        assert_eq!(sketch.background.len(), 2);
        let (sky, ground) = (&sketch.background[0], &sketch.background[1]);
        assert!((sky.height - 240.0).abs() < 1e-3);
        assert!((ground.origin.y - 240.0).abs() < 1e-3);
        assert!((ground.height - 160.0).abs() < 1e-3);

        assert_eq!(sketch.shapes.len(), 5);
        for shape in &sketch.shapes {
            let Shape::Block { color, rotation, .. } = shape else {
                panic!("landscape shapes are blocks");
            };
            assert!(rotation.abs() < f32::EPSILON);
            let green_or_blue = GREEN_HUES.iter().chain(BLUE_HUES).any(|b| b.contains(color.hue));
            assert!(green_or_blue, "unexpected landscape hue {}", color.hue);
        }
    }
}
