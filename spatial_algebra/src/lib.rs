//! Featherstone spatial vector algebra for 6D motion and force vectors.
//!
//! Convention throughout: elements 0-2 are the angular part, elements 3-5
//! the linear part. Motion vectors are [ω, v], force vectors are [τ, f],
//! all expressed in world-aligned axes about an explicit reference point.

use nalgebra::{Matrix3, Matrix6, Vector3, Vector6};

/// 6D spatial vector: [angular (3), linear (3)].
pub type SpatialVector = Vector6<f64>;

/// 6x6 spatial inertia about some reference point in the world frame.
pub type SpatialInertia = Matrix6<f64>;

pub fn angular(v: &SpatialVector) -> Vector3<f64> {
    Vector3::new(v[0], v[1], v[2])
}

pub fn linear(v: &SpatialVector) -> Vector3<f64> {
    Vector3::new(v[3], v[4], v[5])
}

pub fn from_parts(ang: Vector3<f64>, lin: Vector3<f64>) -> SpatialVector {
    SpatialVector::new(ang.x, ang.y, ang.z, lin.x, lin.y, lin.z)
}

/// Spatial cross product for motion vectors: v × s. Featherstone 2.33.
#[inline]
pub fn cross_motion(v: SpatialVector, s: SpatialVector) -> SpatialVector {
    let w = angular(&v);
    let v_lin = linear(&v);
    let s_ang = angular(&s);
    let s_lin = linear(&s);

    from_parts(w.cross(&s_ang), w.cross(&s_lin) + v_lin.cross(&s_ang))
}

/// Spatial cross product for force vectors: v ×* f. Featherstone 2.34.
#[inline]
pub fn cross_force(v: SpatialVector, f: SpatialVector) -> SpatialVector {
    let w = angular(&v);
    let v_lin = linear(&v);
    let f_ang = angular(&f);
    let f_lin = linear(&f);

    from_parts(w.cross(&f_ang) + v_lin.cross(&f_lin), w.cross(&f_lin))
}

/// Shift a spatial force to a new reference point.
///
/// `r` is the vector from the new point to the old point; the linear part is
/// unchanged and the moment picks up the lever-arm term r × f.
#[inline]
pub fn shift_force(f: SpatialVector, r: Vector3<f64>) -> SpatialVector {
    let f_lin = linear(&f);
    from_parts(angular(&f) + r.cross(&f_lin), f_lin)
}

/// Build the 6x6 spatial inertia of a body about its origin in the world
/// frame from its mass, rotational inertia about the COM (world axes), and
/// the world-frame COM offset `h` from the body origin.
///
/// ```text
/// I = [ I_com + m(h·h 1 − h hᵀ)   m [h]×  ]
///     [ m [h]×ᵀ                   m 1     ]
/// ```
pub fn spatial_inertia(mass: f64, inertia_com: &Matrix3<f64>, h: Vector3<f64>) -> SpatialInertia {
    let mut phi = Matrix6::zeros();

    let hh = h.dot(&h);
    for row in 0..3 {
        for col in 0..3 {
            let delta = if row == col { 1.0 } else { 0.0 };
            phi[(row, col)] = inertia_com[(row, col)] + mass * (hh * delta - h[row] * h[col]);
        }
    }

    phi[(3, 3)] = mass;
    phi[(4, 4)] = mass;
    phi[(5, 5)] = mass;

    let mh = mass * h;
    phi[(0, 4)] = -mh.z;
    phi[(0, 5)] = mh.y;
    phi[(1, 3)] = mh.z;
    phi[(1, 5)] = -mh.x;
    phi[(2, 3)] = -mh.y;
    phi[(2, 4)] = mh.x;
    phi[(4, 0)] = -mh.z;
    phi[(5, 0)] = mh.y;
    phi[(3, 1)] = mh.z;
    phi[(5, 1)] = -mh.x;
    phi[(3, 2)] = -mh.y;
    phi[(4, 2)] = mh.x;

    phi
}

/// Shift a spatial inertia from one reference point to another.
///
/// `d` is the vector from the new point to the old point, so the COM offset
/// becomes h + d. Extracts (I_com, m, h) from `phi` and rebuilds the matrix
/// about the new point with the parallel axis theorem.
pub fn shift_inertia(phi: &SpatialInertia, d: &Vector3<f64>) -> SpatialInertia {
    let m = phi[(3, 3)];
    if m == 0.0 {
        return *phi;
    }

    // Coupling block is m [h]×, so m h can be read off directly.
    let h = Vector3::new(phi[(2, 4)], phi[(0, 5)], phi[(1, 3)]) / m;

    // Reverse the parallel axis term to recover I about the COM.
    let hh = h.dot(&h);
    let mut i_com = Matrix3::zeros();
    for row in 0..3 {
        for col in 0..3 {
            let delta = if row == col { 1.0 } else { 0.0 };
            i_com[(row, col)] = phi[(row, col)] - m * (hh * delta - h[row] * h[col]);
        }
    }

    spatial_inertia(m, &i_com, h + d)
}
