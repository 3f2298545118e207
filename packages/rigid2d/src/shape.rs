//! Fixture shapes and their geometric properties.

use serde::{Serialize, Deserialize};
use vek::*;
use thiserror::Error;


/// Number of segments used when approximating a curved edge with a polygon loop.
const CURVE_SEGMENTS: usize = 16;

/// Half thickness given to segment shapes so they can participate in polygon narrowphase.
const SEGMENT_HALF_THICKNESS: f32 = 0.005;

/// Error constructing a shape from user-supplied geometry.
#[derive(Debug, Error)]
pub enum ShapeError {
    #[error("wound polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),
    #[error("wound polygon must be wound counter-clockwise")]
    BadWinding,
    #[error("shape dimension must be positive and finite, got {0}")]
    BadDimension(f32),
}

/// A convex collision shape, in body-local coordinates.
///
/// Curved shapes are exact for AABB and mass purposes and are approximated by convex loops for
/// narrowphase collision detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Circle centered on the local origin.
    Circle { radius: f32 },
    /// Axis-aligned rectangle centered on the local origin.
    Rect { half_extents: Vec2<f32> },
    /// Capsule along the local x axis: a rect of the given half length with circular caps.
    Capsule { half_length: f32, radius: f32 },
    /// Ellipse centered on the local origin.
    Ellipse { half_extents: Vec2<f32> },
    /// Upper half of an ellipse, flat edge on the local x axis.
    HalfEllipse { half_width: f32, height: f32 },
    /// Convex polygon as a counter-clockwise wound vertex loop.
    Polygon { vertices: Vec<Vec2<f32>> },
    /// Circular sector with its apex at the local origin, centered on the local +x axis.
    Slice { radius: f32, arc: f32 },
    /// Line segment between two local points. Zero area; intended for static link chains.
    Segment { a: Vec2<f32>, b: Vec2<f32> },
}

impl Shape {
    pub fn circle(radius: f32) -> Result<Self, ShapeError> {
        check_dim(radius)?;
        Ok(Shape::Circle { radius })
    }

    pub fn rect(half_width: f32, half_height: f32) -> Result<Self, ShapeError> {
        check_dim(half_width)?;
        check_dim(half_height)?;
        Ok(Shape::Rect { half_extents: Vec2::new(half_width, half_height) })
    }

    pub fn capsule(half_length: f32, radius: f32) -> Result<Self, ShapeError> {
        check_dim(half_length)?;
        check_dim(radius)?;
        Ok(Shape::Capsule { half_length, radius })
    }

    pub fn ellipse(half_width: f32, half_height: f32) -> Result<Self, ShapeError> {
        check_dim(half_width)?;
        check_dim(half_height)?;
        Ok(Shape::Ellipse { half_extents: Vec2::new(half_width, half_height) })
    }

    pub fn half_ellipse(half_width: f32, height: f32) -> Result<Self, ShapeError> {
        check_dim(half_width)?;
        check_dim(height)?;
        Ok(Shape::HalfEllipse { half_width, height })
    }

    pub fn slice(radius: f32, arc: f32) -> Result<Self, ShapeError> {
        check_dim(radius)?;
        check_dim(arc)?;
        Ok(Shape::Slice { radius, arc })
    }

    pub fn segment(a: Vec2<f32>, b: Vec2<f32>) -> Self {
        Shape::Segment { a, b }
    }

    /// Construct a wound polygon, validating vertex count and winding.
    pub fn polygon(vertices: Vec<Vec2<f32>>) -> Result<Self, ShapeError> {
        if vertices.len() < 3 {
            return Err(ShapeError::TooFewVertices(vertices.len()));
        }
        if signed_area(&vertices) <= 0.0 {
            return Err(ShapeError::BadWinding);
        }
        Ok(Shape::Polygon { vertices })
    }

    /// Area of the shape. Segments have zero area.
    pub fn area(&self) -> f32 {
        use std::f32::consts::PI;
        match *self {
            Shape::Circle { radius } => PI * radius * radius,
            Shape::Rect { half_extents } => 4.0 * half_extents.x * half_extents.y,
            Shape::Capsule { half_length, radius } =>
                4.0 * half_length * radius + PI * radius * radius,
            Shape::Ellipse { half_extents } => PI * half_extents.x * half_extents.y,
            Shape::HalfEllipse { half_width, height } => 0.5 * PI * half_width * height,
            Shape::Polygon { ref vertices } => signed_area(vertices),
            Shape::Slice { radius, arc } => 0.5 * arc * radius * radius,
            Shape::Segment { .. } => 0.0,
        }
    }

    /// Centroid of the shape in local coordinates.
    pub fn centroid(&self) -> Vec2<f32> {
        use std::f32::consts::PI;
        match *self {
            Shape::Circle { .. }
            | Shape::Rect { .. }
            | Shape::Capsule { .. }
            | Shape::Ellipse { .. } => Vec2::zero(),
            Shape::HalfEllipse { height, .. } =>
                Vec2::new(0.0, 4.0 * height / (3.0 * PI)),
            Shape::Polygon { ref vertices } => polygon_centroid(vertices),
            Shape::Slice { radius, arc } => {
                // centroid of a circular sector lies on its axis of symmetry
                let x = if arc.abs() < 1e-6 {
                    0.0
                } else {
                    4.0 * radius * (arc * 0.5).sin() / (3.0 * arc)
                };
                Vec2::new(x, 0.0)
            }
            Shape::Segment { a, b } => (a + b) * 0.5,
        }
    }

    /// Rotational inertia per unit mass about the shape's centroid.
    pub fn unit_inertia(&self) -> f32 {
        match *self {
            Shape::Circle { radius } => 0.5 * radius * radius,
            Shape::Rect { half_extents } => {
                let w = 2.0 * half_extents.x;
                let h = 2.0 * half_extents.y;
                (w * w + h * h) / 12.0
            }
            Shape::Ellipse { half_extents } =>
                0.25 * (half_extents.x * half_extents.x + half_extents.y * half_extents.y),
            Shape::Segment { a, b } => a.distance_squared(b) / 12.0,
            // remaining shapes use the polygon formula on their loop approximation
            _ => {
                let loop_ = self.polygonized();
                polygon_unit_inertia(&loop_)
            }
        }
    }

    /// Bounding box in local coordinates.
    pub fn local_aabb(&self) -> Aabr<f32> {
        match *self {
            Shape::Circle { radius } => Aabr {
                min: Vec2::broadcast(-radius),
                max: Vec2::broadcast(radius),
            },
            Shape::Rect { half_extents } => Aabr {
                min: -half_extents,
                max: half_extents,
            },
            Shape::Capsule { half_length, radius } => Aabr {
                min: Vec2::new(-half_length - radius, -radius),
                max: Vec2::new(half_length + radius, radius),
            },
            Shape::Ellipse { half_extents } => Aabr {
                min: -half_extents,
                max: half_extents,
            },
            _ => aabb_of_points(&self.polygonized()),
        }
    }

    /// Convex counter-clockwise loop approximating the shape, in local coordinates.
    ///
    /// Narrowphase collision works on these loops for everything except circle-circle pairs,
    /// which are handled exactly.
    pub fn polygonized(&self) -> Vec<Vec2<f32>> {
        use std::f32::consts::PI;
        match *self {
            Shape::Circle { radius } => arc_points(Vec2::zero(), radius, 0.0, 2.0 * PI, CURVE_SEGMENTS, false),
            Shape::Rect { half_extents } => vec![
                Vec2::new(-half_extents.x, -half_extents.y),
                Vec2::new(half_extents.x, -half_extents.y),
                Vec2::new(half_extents.x, half_extents.y),
                Vec2::new(-half_extents.x, half_extents.y),
            ],
            Shape::Capsule { half_length, radius } => {
                let mut points = arc_points(
                    Vec2::new(half_length, 0.0), radius,
                    -0.5 * PI, 0.5 * PI,
                    CURVE_SEGMENTS / 2, true,
                );
                points.extend(arc_points(
                    Vec2::new(-half_length, 0.0), radius,
                    0.5 * PI, 1.5 * PI,
                    CURVE_SEGMENTS / 2, true,
                ));
                points
            }
            Shape::Ellipse { half_extents } => {
                arc_points(Vec2::zero(), 1.0, 0.0, 2.0 * PI, CURVE_SEGMENTS, false)
                    .into_iter()
                    .map(|p| p * half_extents)
                    .collect()
            }
            Shape::HalfEllipse { half_width, height } => {
                let mut points = vec![Vec2::new(half_width, 0.0)];
                points.extend(
                    arc_points(Vec2::zero(), 1.0, 0.0, PI, CURVE_SEGMENTS / 2, true)
                        .into_iter()
                        .skip(1)
                        .map(|p| Vec2::new(p.x * half_width, p.y * height)),
                );
                points
            }
            Shape::Polygon { ref vertices } => vertices.clone(),
            Shape::Slice { radius, arc } => {
                let mut points = vec![Vec2::zero()];
                points.extend(arc_points(
                    Vec2::zero(), radius,
                    -0.5 * arc, 0.5 * arc,
                    CURVE_SEGMENTS / 2, true,
                ));
                points
            }
            Shape::Segment { a, b } => {
                // inflate to a thin quad so the SAT narrowphase has a real area to work with
                let along = (b - a).try_normalized().unwrap_or(Vec2::unit_x());
                let n = Vec2::new(-along.y, along.x) * SEGMENT_HALF_THICKNESS;
                vec![a - n, b - n, b + n, a + n]
            }
        }
    }
}

fn check_dim(v: f32) -> Result<(), ShapeError> {
    if v > 0.0 && v.is_finite() {
        Ok(())
    } else {
        Err(ShapeError::BadDimension(v))
    }
}

/// Shoelace signed area; positive for counter-clockwise winding.
pub fn signed_area(vertices: &[Vec2<f32>]) -> f32 {
    let mut twice_area = 0.0;
    for (i, &a) in vertices.iter().enumerate() {
        let b = vertices[(i + 1) % vertices.len()];
        twice_area += a.x * b.y - b.x * a.y;
    }
    0.5 * twice_area
}

fn polygon_centroid(vertices: &[Vec2<f32>]) -> Vec2<f32> {
    let area = signed_area(vertices);
    if area.abs() < 1e-9 {
        return vertices.iter().copied().sum::<Vec2<f32>>() / vertices.len() as f32;
    }
    let mut c = Vec2::zero();
    for (i, &a) in vertices.iter().enumerate() {
        let b = vertices[(i + 1) % vertices.len()];
        let cross = a.x * b.y - b.x * a.y;
        c += (a + b) * cross;
    }
    c / (6.0 * area)
}

/// Rotational inertia per unit mass of a polygon loop about its centroid.
fn polygon_unit_inertia(vertices: &[Vec2<f32>]) -> f32 {
    let c = polygon_centroid(vertices);
    let mut numer = 0.0;
    let mut denom = 0.0;
    for (i, &va) in vertices.iter().enumerate() {
        let a = va - c;
        let b = vertices[(i + 1) % vertices.len()] - c;
        let cross = (a.x * b.y - b.x * a.y).abs();
        numer += cross * (a.dot(a) + a.dot(b) + b.dot(b));
        denom += cross;
    }
    if denom < 1e-9 {
        0.0
    } else {
        numer / (6.0 * denom)
    }
}

fn aabb_of_points(points: &[Vec2<f32>]) -> Aabr<f32> {
    let mut min = Vec2::broadcast(f32::INFINITY);
    let mut max = Vec2::broadcast(f32::NEG_INFINITY);
    for p in points {
        min = Vec2::partial_min(min, *p);
        max = Vec2::partial_max(max, *p);
    }
    Aabr { min, max }
}

fn arc_points(
    center: Vec2<f32>,
    radius: f32,
    from: f32,
    to: f32,
    segments: usize,
    inclusive: bool,
) -> Vec<Vec2<f32>> {
    let count = if inclusive { segments + 1 } else { segments };
    (0..count)
        .map(|i| {
            let t = from + (to - from) * i as f32 / segments as f32;
            center + Vec2::new(t.cos(), t.sin()) * radius
        })
        .collect()
}


#[test]
fn test_polygon_winding_rejected() {
    let cw = vec![
        Vec2::new(0.0, 0.0),
        Vec2::new(0.0, 1.0),
        Vec2::new(1.0, 0.0),
    ];
    assert!(Shape::polygon(cw).is_err());
    let ccw = vec![
        Vec2::new(0.0, 0.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(0.0, 1.0),
    ];
    assert!(Shape::polygon(ccw).is_ok());
}

#[test]
fn test_circle_area_and_inertia() {
    let c = Shape::circle(2.0).unwrap();
    assert!((c.area() - std::f32::consts::PI * 4.0).abs() < 1e-4);
    assert!((c.unit_inertia() - 2.0).abs() < 1e-4);
}

#[test]
fn test_polygonized_loops_are_ccw() {
    let shapes = [
        Shape::circle(1.0).unwrap(),
        Shape::rect(1.0, 0.5).unwrap(),
        Shape::capsule(1.0, 0.25).unwrap(),
        Shape::ellipse(1.0, 0.5).unwrap(),
        Shape::half_ellipse(1.0, 0.5).unwrap(),
        Shape::slice(1.0, 1.0).unwrap(),
        Shape::segment(Vec2::zero(), Vec2::new(1.0, 0.0)),
    ];
    for shape in &shapes {
        let loop_ = shape.polygonized();
        assert!(loop_.len() >= 3);
        assert!(signed_area(&loop_) > 0.0, "cw loop from {:?}", shape);
    }
}

#[test]
fn test_capsule_aabb() {
    let c = Shape::capsule(1.0, 0.5).unwrap();
    let aabb = c.local_aabb();
    assert!((aabb.min.x + 1.5).abs() < 1e-6);
    assert!((aabb.max.x - 1.5).abs() < 1e-6);
    assert!((aabb.max.y - 0.5).abs() < 1e-6);
}
