// Copyright 2025 the Pyrite authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::vector::{Vec3, Vec4};
use std::ops::Mul;

/// A 4x4 column-major matrix of `f32`.
///
/// `cols[i]` is the i-th column; `m * v` treats `v` as a column vector.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    /// The four columns of the matrix.
    pub cols: [Vec4; 4],
}

impl Mat4 {
    /// The identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            Vec4::new(1.0, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 1.0, 0.0, 0.0),
            Vec4::new(0.0, 0.0, 1.0, 0.0),
            Vec4::new(0.0, 0.0, 0.0, 1.0),
        ],
    };

    /// Builds a matrix from four columns.
    pub const fn from_cols(c0: Vec4, c1: Vec4, c2: Vec4, c3: Vec4) -> Self {
        Self {
            cols: [c0, c1, c2, c3],
        }
    }

    /// Translation matrix.
    pub fn from_translation(v: Vec3) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[3] = Vec4::new(v.x, v.y, v.z, 1.0);
        m
    }

    /// Non-uniform scale matrix.
    pub fn from_scale(s: Vec3) -> Self {
        Self::from_cols(
            Vec4::new(s.x, 0.0, 0.0, 0.0),
            Vec4::new(0.0, s.y, 0.0, 0.0),
            Vec4::new(0.0, 0.0, s.z, 0.0),
            Vec4::new(0.0, 0.0, 0.0, 1.0),
        )
    }

    /// Rotation around the +Y axis by `angle` radians.
    pub fn from_rotation_y(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_cols(
            Vec4::new(c, 0.0, -s, 0.0),
            Vec4::new(0.0, 1.0, 0.0, 0.0),
            Vec4::new(s, 0.0, c, 0.0),
            Vec4::new(0.0, 0.0, 0.0, 1.0),
        )
    }

    /// Rotation around the +X axis by `angle` radians.
    pub fn from_rotation_x(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_cols(
            Vec4::new(1.0, 0.0, 0.0, 0.0),
            Vec4::new(0.0, c, s, 0.0),
            Vec4::new(0.0, -s, c, 0.0),
            Vec4::new(0.0, 0.0, 0.0, 1.0),
        )
    }

    /// Right-handed perspective projection with a `[0, 1]` clip-space depth,
    /// as consumed by the D3D12 rasterizer.
    pub fn perspective_rh_zo(fov_y_radians: f32, aspect: f32, z_near: f32, z_far: f32) -> Self {
        let f = 1.0 / (fov_y_radians * 0.5).tan();
        let range = z_far / (z_near - z_far);
        Self::from_cols(
            Vec4::new(f / aspect, 0.0, 0.0, 0.0),
            Vec4::new(0.0, f, 0.0, 0.0),
            Vec4::new(0.0, 0.0, range, -1.0),
            Vec4::new(0.0, 0.0, range * z_near, 0.0),
        )
    }

    /// Right-handed look-at view matrix. `eye` and `target` must not
    /// coincide and `up` must not be parallel to the view direction.
    pub fn look_at_rh(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        let fwd = (eye - target).normalize();
        let right = up.cross(fwd).normalize();
        let cam_up = fwd.cross(right);
        Self::from_cols(
            Vec4::new(right.x, cam_up.x, fwd.x, 0.0),
            Vec4::new(right.y, cam_up.y, fwd.y, 0.0),
            Vec4::new(right.z, cam_up.z, fwd.z, 0.0),
            Vec4::new(-right.dot(eye), -cam_up.dot(eye), -fwd.dot(eye), 1.0),
        )
    }

    /// Returns the i-th row as a vector.
    pub fn row(&self, i: usize) -> Vec4 {
        Vec4::new(
            self.cols[0].to_array()[i],
            self.cols[1].to_array()[i],
            self.cols[2].to_array()[i],
            self.cols[3].to_array()[i],
        )
    }

    /// Transposed copy.
    pub fn transpose(&self) -> Self {
        Self::from_cols(self.row(0), self.row(1), self.row(2), self.row(3))
    }

    /// Returns the matrix as a column-major 2D array, the layout constant
    /// buffers expect.
    pub fn to_cols_array_2d(&self) -> [[f32; 4]; 4] {
        [
            self.cols[0].to_array(),
            self.cols[1].to_array(),
            self.cols[2].to_array(),
            self.cols[3].to_array(),
        ]
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul<Mat4> for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Mat4 {
        let mut cols = [Vec4::ZERO; 4];
        for (i, col) in cols.iter_mut().enumerate() {
            *col = self * rhs.cols[i];
        }
        Mat4 { cols }
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;

    fn mul(self, v: Vec4) -> Vec4 {
        self.cols[0] * v.x + self.cols[1] * v.y + self.cols[2] * v.z + self.cols[3] * v.w
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn identity_is_multiplicative_neutral() {
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(Mat4::IDENTITY * m, m);
        assert_eq!(m * Mat4::IDENTITY, m);
    }

    #[test]
    fn translation_moves_points() {
        let m = Mat4::from_translation(Vec3::new(5.0, 0.0, -1.0));
        let p = m * Vec4::new(1.0, 1.0, 1.0, 1.0);
        assert_eq!(p, Vec4::new(6.0, 1.0, 0.0, 1.0));
    }

    #[test]
    fn look_at_maps_eye_to_origin() {
        let eye = Vec3::new(0.0, 0.0, 5.0);
        let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::UP);
        let mapped = view * Vec4::from_vec3(eye, 1.0);
        assert_relative_eq!(mapped.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(mapped.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(mapped.z, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn perspective_maps_near_plane_to_zero_depth() {
        let proj = Mat4::perspective_rh_zo(std::f32::consts::FRAC_PI_4, 1.0, 0.1, 100.0);
        let on_near = proj * Vec4::new(0.0, 0.0, -0.1, 1.0);
        assert_relative_eq!(on_near.z / on_near.w, 0.0, epsilon = 1e-5);
        let on_far = proj * Vec4::new(0.0, 0.0, -100.0, 1.0);
        assert_relative_eq!(on_far.z / on_far.w, 1.0, epsilon = 1e-4);
    }
}
