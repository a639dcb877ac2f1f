use keel::ffi::vec::{
    load_mat44, load_quat, load_rvec3, load_vec3, load_vec4, store_mat44, store_quat, store_rvec3,
    store_vec3, store_vec4,
};
use keel::Real;

#[test]
fn vec3_round_trips_bit_for_bit() {
    let cases: [[f32; 3]; 4] = [
        [0.0, -0.0, 1.0],
        [f32::MIN_POSITIVE, f32::MAX, f32::MIN],
        [f32::NAN, f32::INFINITY, f32::NEG_INFINITY],
        [1.0 / 3.0, std::f32::consts::PI, -2.5e-20],
    ];
    for src in cases {
        let mut dst = [0.0f32; 3];
        unsafe { store_vec3(dst.as_mut_ptr(), load_vec3(src.as_ptr())) };
        for (a, b) in src.iter().zip(&dst) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }
}

#[test]
fn vec4_and_quat_round_trip_bit_for_bit() {
    let src = [0.1f32, -0.2, 0.3, f32::NAN];
    let mut dst = [0.0f32; 4];
    unsafe { store_vec4(dst.as_mut_ptr(), load_vec4(src.as_ptr())) };
    for (a, b) in src.iter().zip(&dst) {
        assert_eq!(a.to_bits(), b.to_bits());
    }

    let mut quat_dst = [0.0f32; 4];
    unsafe { store_quat(quat_dst.as_mut_ptr(), load_quat(src.as_ptr())) };
    for (a, b) in src.iter().zip(&quat_dst) {
        assert_eq!(a.to_bits(), b.to_bits());
    }
}

#[test]
fn mat44_round_trips_column_major() {
    let mut src = [0.0f32; 16];
    for (i, v) in src.iter_mut().enumerate() {
        *v = (i as f32 + 1.0) * 0.731;
    }
    let mut dst = [0.0f32; 16];
    let m = unsafe { load_mat44(src.as_ptr()) };
    // Column-major: element 13 is the translation Y.
    assert_eq!(m.w_axis.y.to_bits(), src[13].to_bits());
    unsafe { store_mat44(dst.as_mut_ptr(), m) };
    for (a, b) in src.iter().zip(&dst) {
        assert_eq!(a.to_bits(), b.to_bits());
    }
}

#[test]
fn rvec3_round_trips_in_active_precision() {
    let src: [Real; 3] = [
        (1.0 as Real) / 3.0,
        -0.0,
        Real::MAX,
    ];
    let mut dst: [Real; 3] = [0.0; 3];
    unsafe { store_rvec3(dst.as_mut_ptr(), load_rvec3(src.as_ptr())) };
    for (a, b) in src.iter().zip(&dst) {
        assert_eq!(a.to_bits(), b.to_bits());
    }
}

#[test]
fn real_width_follows_the_precision_feature() {
    #[cfg(feature = "double-precision")]
    assert_eq!(std::mem::size_of::<Real>(), 8);
    #[cfg(not(feature = "double-precision"))]
    assert_eq!(std::mem::size_of::<Real>(), 4);
}
