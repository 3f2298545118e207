//! Narrowphase collision detection.
//!
//! Circle-circle pairs are exact; every other pair is separating-axis tested on the shapes'
//! convex loop approximations. One representative contact point per pair is enough for the
//! solver's single-point response.

use crate::body::{Body, BodyKey};
use crate::contact::ContactConstraint;
use crate::shape::Shape;
use vek::*;


/// Detect contacts between all fixture pairs of two bodies.
pub fn collide_bodies(
    key_a: BodyKey,
    a: &Body,
    key_b: BodyKey,
    b: &Body,
    out: &mut Vec<ContactConstraint>,
) {
    for (ia, fa) in a.fixtures.iter().enumerate() {
        for (ib, fb) in b.fixtures.iter().enumerate() {
            if let Some((normal, depth, point)) = collide_shapes(a, &fa.shape, b, &fb.shape) {
                out.push(ContactConstraint {
                    body_a: key_a,
                    body_b: key_b,
                    fixture_a: ia,
                    fixture_b: ib,
                    normal,
                    depth,
                    point,
                    sensor: fa.sensor || fb.sensor,
                    enabled: true,
                });
            }
        }
    }
}

/// Normal (a toward b), depth, and contact point for one shape pair, if overlapping.
fn collide_shapes(
    a: &Body,
    shape_a: &Shape,
    b: &Body,
    shape_b: &Shape,
) -> Option<(Vec2<f32>, f32, Vec2<f32>)> {
    if let (&Shape::Circle { radius: ra }, &Shape::Circle { radius: rb }) = (shape_a, shape_b) {
        return circle_circle(a.position(), ra, b.position(), rb);
    }
    let poly_a = world_loop(a, shape_a);
    let poly_b = world_loop(b, shape_b);
    sat(&poly_a, &poly_b)
}

fn world_loop(body: &Body, shape: &Shape) -> Vec<Vec2<f32>> {
    shape.polygonized().into_iter().map(|p| body.to_world(p)).collect()
}

fn circle_circle(
    ca: Vec2<f32>,
    ra: f32,
    cb: Vec2<f32>,
    rb: f32,
) -> Option<(Vec2<f32>, f32, Vec2<f32>)> {
    let d = cb - ca;
    let dist_sq = d.magnitude_squared();
    let r = ra + rb;
    if dist_sq >= r * r {
        return None;
    }
    let dist = dist_sq.sqrt();
    let normal = if dist > 1e-9 { d / dist } else { Vec2::unit_y() };
    let depth = r - dist;
    let point = ca + normal * (ra - depth * 0.5);
    Some((normal, depth, point))
}

/// Separating-axis test between two convex CCW loops.
///
/// Returns the minimum-overlap axis oriented from loop a toward loop b, the overlap depth, and
/// the deepest vertex of the incident loop as the contact point.
fn sat(
    poly_a: &[Vec2<f32>],
    poly_b: &[Vec2<f32>],
) -> Option<(Vec2<f32>, f32, Vec2<f32>)> {
    let mut best_depth = f32::INFINITY;
    let mut best_axis = Vec2::unit_y();
    let mut reference_is_a = true;

    for (poly, from_a) in [(poly_a, true), (poly_b, false)] {
        for (i, &v) in poly.iter().enumerate() {
            let next = poly[(i + 1) % poly.len()];
            let edge = next - v;
            let axis = match Vec2::new(edge.y, -edge.x).try_normalized() {
                Some(axis) => axis,
                // degenerate edge
                None => continue,
            };
            let (min_a, max_a) = project(poly_a, axis);
            let (min_b, max_b) = project(poly_b, axis);
            let overlap = max_a.min(max_b) - min_a.max(min_b);
            if overlap <= 0.0 {
                return None;
            }
            if overlap < best_depth {
                best_depth = overlap;
                best_axis = axis;
                reference_is_a = from_a;
            }
        }
    }

    // orient the axis from a toward b
    let center_a = centroid_of(poly_a);
    let center_b = centroid_of(poly_b);
    let mut normal = best_axis;
    if (center_b - center_a).dot(normal) < 0.0 {
        normal = -normal;
    }

    let point = if reference_is_a {
        support(poly_b, -normal)
    } else {
        support(poly_a, normal)
    };
    Some((normal, best_depth, point))
}

fn project(poly: &[Vec2<f32>], axis: Vec2<f32>) -> (f32, f32) {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &p in poly {
        let d = p.dot(axis);
        min = min.min(d);
        max = max.max(d);
    }
    (min, max)
}

fn support(poly: &[Vec2<f32>], direction: Vec2<f32>) -> Vec2<f32> {
    let mut best = poly[0];
    let mut best_d = best.dot(direction);
    for &p in &poly[1..] {
        let d = p.dot(direction);
        if d > best_d {
            best_d = d;
            best = p;
        }
    }
    best
}

fn centroid_of(poly: &[Vec2<f32>]) -> Vec2<f32> {
    poly.iter().copied().sum::<Vec2<f32>>() / poly.len() as f32
}


#[cfg(test)]
use crate::fixture::Fixture;

#[cfg(test)]
fn body_at(x: f32, y: f32, shape: Shape) -> Body {
    let mut body = Body::new();
    body.add_fixture(Fixture::new(shape));
    body.set_position(Vec2::new(x, y));
    body
}

#[test]
fn test_circle_circle_overlap() {
    let a = body_at(0.0, 0.0, Shape::circle(1.0).unwrap());
    let b = body_at(1.5, 0.0, Shape::circle(1.0).unwrap());
    let mut contacts = Vec::new();
    collide_bodies(BodyKey(0), &a, BodyKey(1), &b, &mut contacts);
    assert_eq!(contacts.len(), 1);
    let c = &contacts[0];
    assert!((c.normal.x - 1.0).abs() < 1e-5);
    assert!((c.depth - 0.5).abs() < 1e-5);
}

#[test]
fn test_circle_circle_separate() {
    let a = body_at(0.0, 0.0, Shape::circle(1.0).unwrap());
    let b = body_at(3.0, 0.0, Shape::circle(1.0).unwrap());
    let mut contacts = Vec::new();
    collide_bodies(BodyKey(0), &a, BodyKey(1), &b, &mut contacts);
    assert!(contacts.is_empty());
}

#[test]
fn test_rect_on_rect_normal_points_down_to_platform() {
    // character box resting slightly into a platform below it
    let character = body_at(0.0, 1.0 - 0.02, Shape::rect(0.5, 0.5).unwrap());
    let platform = body_at(0.0, 0.0, Shape::rect(5.0, 0.5).unwrap());
    let mut contacts = Vec::new();
    collide_bodies(BodyKey(0), &character, BodyKey(1), &platform, &mut contacts);
    assert_eq!(contacts.len(), 1);
    let c = &contacts[0];
    // normal from character toward platform: straight down
    assert!(c.normal.y < -0.99, "normal {:?}", c.normal);
    assert!((c.depth - 0.02).abs() < 1e-4);
}

#[test]
fn test_rotated_rect_still_collides() {
    let mut a = body_at(0.0, 0.0, Shape::rect(1.0, 1.0).unwrap());
    a.set_angle(std::f32::consts::FRAC_PI_4);
    let b = body_at(1.5, 0.0, Shape::rect(1.0, 1.0).unwrap());
    let mut contacts = Vec::new();
    collide_bodies(BodyKey(0), &a, BodyKey(1), &b, &mut contacts);
    assert_eq!(contacts.len(), 1);
}
