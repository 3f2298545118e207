//! End-to-end free fall through the full space protocol.

use planar::{PhysicsBody, PhysicsSpace};
use rigid2d::{Fixture, MassKind, Shape};
use vek::*;


fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn free_fall_one_simulated_second() {
    init_logging();
    let mut space = PhysicsSpace::new(Vec2::new(0.0, -9.8));
    let ball = space
        .add(
            PhysicsBody::rigid()
                .mass_kind(MassKind::Normal)
                .position(Vec2::new(0.0, 10.0))
                .fixture(Fixture::new(Shape::circle(1.0).unwrap())),
        )
        .unwrap();

    for _ in 0..60 {
        space.update(1.0 / 60.0);
        space.update_fixed(1.0 / 60.0);
    }

    let body = space.body(ball).unwrap();
    // about half of g over one second of semi-implicit integration
    assert!(body.position().y < 10.0 - 4.0, "y = {}", body.position().y);
    assert_eq!(body.position().x, 0.0);
    assert!(body.linear_velocity().y < -9.0);
}
