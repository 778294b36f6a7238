pub struct Camera {
    pub pos: [f32; 2],   // (x, y) position in world space
    pub dir: [f32; 2],   // unit view direction
    pub plane: [f32; 2], // camera plane, perpendicular to dir, length = tan(fov / 2)
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            pos: [2.0, 2.0],
            dir: [-1.0, 0.0],
            plane: [0.0, 0.66],
        }
    }
}

impl Camera {
    pub fn new(pos: [f32; 2], dir: [f32; 2], fov_x_deg: f32) -> Self {
        let len = dir[0].hypot(dir[1]);
        let dir = if len > 0.0 {
            [dir[0] / len, dir[1] / len]
        } else {
            [1.0, 0.0]
        };
        let mut camera = Self {
            pos,
            dir,
            plane: [0.0, 0.0],
        };
        camera.set_fov_from_horizontal(fov_x_deg);
        camera
    }

    /// Rebuilds the camera plane for a horizontal field of view.
    pub fn set_fov_from_horizontal(&mut self, fov_x_deg: f32) {
        let half = 0.5 * fov_x_deg.to_radians();
        let k = half.tan();
        self.plane = [self.dir[1] * k, -self.dir[0] * k];
    }

    /// Ray direction for a screen column, `dir + plane * camera_x` with
    /// `camera_x` running from -1 at the left edge to +1 at the right.
    #[inline]
    pub fn ray_dir(&self, column: usize, screen_width: usize) -> [f32; 2] {
        let camera_x = 2.0 * column as f32 / screen_width as f32 - 1.0;
        [
            self.dir[0] + self.plane[0] * camera_x,
            self.dir[1] + self.plane[1] * camera_x,
        ]
    }

    /// Rotates both dir and plane so the field of view is preserved.
    pub fn rotate(&mut self, angle: f32) {
        let (s, c) = angle.sin_cos();
        let rot = |v: [f32; 2]| [v[0] * c - v[1] * s, v[0] * s + v[1] * c];
        self.dir = rot(self.dir);
        self.plane = rot(self.plane);
    }

    /// Unit vector toward the right edge of the screen.
    pub fn right(&self) -> [f32; 2] {
        let len = self.plane[0].hypot(self.plane[1]);
        if len > 0.0 {
            [self.plane[0] / len, self.plane[1] / len]
        } else {
            [-self.dir[1], self.dir[0]]
        }
    }
}
