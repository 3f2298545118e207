//! 2D camera rig over a 3D camera.

use vek::*;


/// The subset of a 3D camera the rig needs: a settable frustum and location, and a parallel
/// projection toggle.
pub trait Camera3d {
    fn set_frustum(&mut self, left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32);

    fn set_parallel_projection(&mut self, parallel: bool);

    fn location(&self) -> Vec3<f32>;

    fn set_location(&mut self, location: Vec3<f32>);
}

/// Rigs a 3D camera for 2D rendering: parallel projection, a frustum sized in simulation
/// units, and a fixed distance back along the depth axis. `look_at` pans the camera to follow
/// a 2D focus point without touching depth.
pub struct FlatCamera<C> {
    camera: C,
    half_extent: Vec2<f32>,
    distance: f32,
}

impl<C: Camera3d> FlatCamera<C> {
    pub fn new(mut camera: C, half_extent: Vec2<f32>, distance: f32) -> Self {
        camera.set_parallel_projection(true);
        camera.set_frustum(
            -half_extent.x,
            half_extent.x,
            -half_extent.y,
            half_extent.y,
            -1000.0,
            1000.0,
        );
        let location = camera.location();
        camera.set_location(Vec3::new(location.x, location.y, distance));
        FlatCamera { camera, half_extent, distance }
    }

    pub fn half_extent(&self) -> Vec2<f32> {
        self.half_extent
    }

    /// Resize the view window, keeping the camera where it is.
    pub fn set_half_extent(&mut self, half_extent: Vec2<f32>) {
        self.half_extent = half_extent;
        self.camera.set_frustum(
            -half_extent.x,
            half_extent.x,
            -half_extent.y,
            half_extent.y,
            -1000.0,
            1000.0,
        );
    }

    /// Center the view on a 2D focus point.
    pub fn look_at(&mut self, focus: Vec2<f32>) {
        self.camera.set_location(Vec3::new(focus.x, focus.y, self.distance));
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut C {
        &mut self.camera
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingCamera {
        frustum: (f32, f32, f32, f32, f32, f32),
        parallel: bool,
        location: Vec3<f32>,
    }

    impl Camera3d for RecordingCamera {
        fn set_frustum(&mut self, l: f32, r: f32, b: f32, t: f32, n: f32, f: f32) {
            self.frustum = (l, r, b, t, n, f);
        }

        fn set_parallel_projection(&mut self, parallel: bool) {
            self.parallel = parallel;
        }

        fn location(&self) -> Vec3<f32> {
            self.location
        }

        fn set_location(&mut self, location: Vec3<f32>) {
            self.location = location;
        }
    }

    #[test]
    fn test_rig_configures_parallel_projection() {
        let rig = FlatCamera::new(RecordingCamera::default(), Vec2::new(8.0, 4.5), 10.0);
        assert!(rig.camera().parallel);
        let (l, r, b, t, _, _) = rig.camera().frustum;
        assert_eq!((l, r, b, t), (-8.0, 8.0, -4.5, 4.5));
        assert_eq!(rig.camera().location.z, 10.0);
    }

    #[test]
    fn test_look_at_pans_without_touching_depth() {
        let mut rig = FlatCamera::new(RecordingCamera::default(), Vec2::new(8.0, 4.5), 10.0);
        rig.look_at(Vec2::new(3.0, -2.0));
        assert_eq!(rig.camera().location, Vec3::new(3.0, -2.0, 10.0));
    }
}
