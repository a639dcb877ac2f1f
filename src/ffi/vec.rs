//! Fixed-size float array ↔ math vector marshalling.
//!
//! Pure, allocation-free, and bit-exact for any finite (or non-finite) input:
//! `store(load(x))` reproduces `x` without rounding. World-space positions go
//! through the `Real`-typed pair, which widens with the `double-precision`
//! feature; everything local stays `f32`. Null inputs are contract
//! violations, not recoverable errors.

use glam::{Mat4, Quat, Vec3, Vec4};

use crate::math::{Real, RVec3};

/// # Safety
/// `input` must point at three readable floats.
#[inline]
pub unsafe fn load_vec3(input: *const f32) -> Vec3 {
    debug_assert!(!input.is_null());
    Vec3::new(*input, *input.add(1), *input.add(2))
}

/// # Safety
/// `out` must point at three writable floats.
#[inline]
pub unsafe fn store_vec3(out: *mut f32, v: Vec3) {
    debug_assert!(!out.is_null());
    *out = v.x;
    *out.add(1) = v.y;
    *out.add(2) = v.z;
}

/// # Safety
/// `input` must point at four readable floats.
#[inline]
pub unsafe fn load_vec4(input: *const f32) -> Vec4 {
    debug_assert!(!input.is_null());
    Vec4::new(*input, *input.add(1), *input.add(2), *input.add(3))
}

/// # Safety
/// `out` must point at four writable floats.
#[inline]
pub unsafe fn store_vec4(out: *mut f32, v: Vec4) {
    debug_assert!(!out.is_null());
    *out = v.x;
    *out.add(1) = v.y;
    *out.add(2) = v.z;
    *out.add(3) = v.w;
}

/// # Safety
/// `input` must point at four readable floats (x, y, z, w).
#[inline]
pub unsafe fn load_quat(input: *const f32) -> Quat {
    debug_assert!(!input.is_null());
    Quat::from_xyzw(*input, *input.add(1), *input.add(2), *input.add(3))
}

/// # Safety
/// `out` must point at four writable floats.
#[inline]
pub unsafe fn store_quat(out: *mut f32, q: Quat) {
    debug_assert!(!out.is_null());
    *out = q.x;
    *out.add(1) = q.y;
    *out.add(2) = q.z;
    *out.add(3) = q.w;
}

/// # Safety
/// `input` must point at sixteen readable floats, column-major.
#[inline]
pub unsafe fn load_mat44(input: *const f32) -> Mat4 {
    debug_assert!(!input.is_null());
    Mat4::from_cols_array(&*(input as *const [f32; 16]))
}

/// # Safety
/// `out` must point at sixteen writable floats.
#[inline]
pub unsafe fn store_mat44(out: *mut f32, m: Mat4) {
    debug_assert!(!out.is_null());
    let cols = m.to_cols_array();
    std::ptr::copy_nonoverlapping(cols.as_ptr(), out, 16);
}

/// # Safety
/// `input` must point at three readable `Real`s.
#[inline]
pub unsafe fn load_rvec3(input: *const Real) -> RVec3 {
    debug_assert!(!input.is_null());
    RVec3::new(*input, *input.add(1), *input.add(2))
}

/// # Safety
/// `out` must point at three writable `Real`s.
#[inline]
pub unsafe fn store_rvec3(out: *mut Real, v: RVec3) {
    debug_assert!(!out.is_null());
    *out = v.x;
    *out.add(1) = v.y;
    *out.add(2) = v.z;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec3_round_trip_is_bit_exact() {
        let src = [1.5f32, -0.0, f32::NAN];
        let mut dst = [0.0f32; 3];
        unsafe { store_vec3(dst.as_mut_ptr(), load_vec3(src.as_ptr())) };
        for (a, b) in src.iter().zip(&dst) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn mat44_round_trip_is_bit_exact() {
        let mut src = [0.0f32; 16];
        for (i, v) in src.iter_mut().enumerate() {
            *v = (i as f32) * 0.37 - 2.0;
        }
        src[5] = f32::INFINITY;
        let mut dst = [0.0f32; 16];
        unsafe { store_mat44(dst.as_mut_ptr(), load_mat44(src.as_ptr())) };
        for (a, b) in src.iter().zip(&dst) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn rvec3_round_trip_is_bit_exact() {
        let src: [Real; 3] = [1.0 as Real / 3.0, -0.0, Real::MAX];
        let mut dst: [Real; 3] = [0.0; 3];
        unsafe { store_rvec3(dst.as_mut_ptr(), load_rvec3(src.as_ptr())) };
        for (a, b) in src.iter().zip(&dst) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }
}
