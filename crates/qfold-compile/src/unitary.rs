//! Unitary matrix utilities for single-qubit merging.
//!
//! Provides 2x2 unitary matrix operations: constructors for the
//! exponentiated gates, products, and the ZYZ decomposition the canonical
//! forms are derived from.

use num_complex::Complex64;
use std::f64::consts::PI;

/// Tolerance for the degenerate branches of the ZYZ decomposition.
const EPSILON: f64 = 1e-10;

/// A 2x2 unitary matrix in row-major order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unitary2x2 {
    /// The matrix elements in row-major order: [[a, b], [c, d]].
    pub data: [Complex64; 4],
}

impl Unitary2x2 {
    /// Create a new 2x2 unitary matrix.
    pub fn new(a: Complex64, b: Complex64, c: Complex64, d: Complex64) -> Self {
        Self { data: [a, b, c, d] }
    }

    /// Create the identity matrix.
    pub fn identity() -> Self {
        Self::new(
            Complex64::new(1.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(1.0, 0.0),
        )
    }

    /// Create a Hadamard matrix.
    pub fn h() -> Self {
        let s = 1.0 / 2.0_f64.sqrt();
        Self::new(
            Complex64::new(s, 0.0),
            Complex64::new(s, 0.0),
            Complex64::new(s, 0.0),
            Complex64::new(-s, 0.0),
        )
    }

    /// Create a Pauli-X matrix.
    pub fn x() -> Self {
        Self::new(
            Complex64::new(0.0, 0.0),
            Complex64::new(1.0, 0.0),
            Complex64::new(1.0, 0.0),
            Complex64::new(0.0, 0.0),
        )
    }

    /// Create a Pauli-Y matrix.
    pub fn y() -> Self {
        Self::new(
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, -1.0),
            Complex64::new(0.0, 1.0),
            Complex64::new(0.0, 0.0),
        )
    }

    /// Create a Pauli-Z matrix.
    pub fn z() -> Self {
        Self::new(
            Complex64::new(1.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(-1.0, 0.0),
        )
    }

    /// `P^t` for an involution `P` with eigenvalues ±1.
    ///
    /// `P^t = (1 + g)/2 · I + (1 - g)/2 · P` with `g = e^(iπt)`.
    fn involution_pow(p: &Self, t: f64) -> Self {
        let g = Complex64::from_polar(1.0, PI * t);
        let plus = (Complex64::new(1.0, 0.0) + g) / 2.0;
        let minus = (Complex64::new(1.0, 0.0) - g) / 2.0;
        let [a, b, c, d] = p.data;
        Self::new(plus + minus * a, minus * b, minus * c, plus + minus * d)
    }

    /// `X^t`.
    pub fn x_pow(t: f64) -> Self {
        Self::involution_pow(&Self::x(), t)
    }

    /// `Y^t`.
    pub fn y_pow(t: f64) -> Self {
        Self::involution_pow(&Self::y(), t)
    }

    /// `Z^t = diag(1, e^(iπt))`.
    pub fn z_pow(t: f64) -> Self {
        Self::new(
            Complex64::new(1.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::from_polar(1.0, PI * t),
        )
    }

    /// `H^t`.
    pub fn h_pow(t: f64) -> Self {
        Self::involution_pow(&Self::h(), t)
    }

    /// `Z^p · X^t · Z^-p`.
    pub fn phased_x(phase_exponent: f64, exponent: f64) -> Self {
        Self::z_pow(phase_exponent) * Self::x_pow(exponent) * Self::z_pow(-phase_exponent)
    }

    /// `Z^(z+a) · X^x · Z^-a`.
    pub fn phxz(axis_phase_exponent: f64, x_exponent: f64, z_exponent: f64) -> Self {
        Self::z_pow(z_exponent + axis_phase_exponent)
            * Self::x_pow(x_exponent)
            * Self::z_pow(-axis_phase_exponent)
    }

    /// Create an RZ rotation matrix.
    pub fn rz(theta: f64) -> Self {
        let exp_neg = Complex64::from_polar(1.0, -theta / 2.0);
        let exp_pos = Complex64::from_polar(1.0, theta / 2.0);
        Self::new(
            exp_neg,
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, 0.0),
            exp_pos,
        )
    }

    /// Create an RY rotation matrix.
    pub fn ry(theta: f64) -> Self {
        let c = (theta / 2.0).cos();
        let s = (theta / 2.0).sin();
        Self::new(
            Complex64::new(c, 0.0),
            Complex64::new(-s, 0.0),
            Complex64::new(s, 0.0),
            Complex64::new(c, 0.0),
        )
    }

    /// Multiply this matrix by another: self * other.
    #[allow(clippy::many_single_char_names)]
    pub fn mul(&self, other: &Self) -> Self {
        let [a, b, c, d] = self.data;
        let [e, f, g, h] = other.data;
        Self::new(a * e + b * g, a * f + b * h, c * e + d * g, c * f + d * h)
    }

    /// Get the conjugate transpose (dagger).
    pub fn dagger(&self) -> Self {
        Self::new(
            self.data[0].conj(),
            self.data[2].conj(),
            self.data[1].conj(),
            self.data[3].conj(),
        )
    }

    /// Determinant.
    pub fn det(&self) -> Complex64 {
        let [a, b, c, d] = self.data;
        a * d - b * c
    }

    /// Trace.
    pub fn trace(&self) -> Complex64 {
        self.data[0] + self.data[3]
    }

    /// Upper bound on how far the operator moves any state.
    ///
    /// For a unitary with eigenvalues `λ1`, `λ2` this is `|λ1 − λ2| / 2`,
    /// which is zero exactly for multiples of the identity.
    pub fn trace_distance_bound(&self) -> f64 {
        let tr = self.trace();
        (tr * tr - self.det() * 4.0).norm().sqrt() / 2.0
    }

    /// Check if this is identity up to global phase, within `atol`.
    pub fn is_identity(&self, atol: f64) -> bool {
        self.trace_distance_bound() <= atol
    }

    /// Decompose into RZ(alpha) * RY(beta) * RZ(gamma), up to global phase.
    ///
    /// Returns (alpha, beta, gamma) with `beta` in `[0, π]`.
    pub fn zyz_decomposition(&self) -> (f64, f64, f64) {
        let [a, b, c, _] = self.data;

        // Remove global phase to get SU(2) matrix
        let global_phase = self.det().arg() / 2.0;
        let phase_factor = Complex64::from_polar(1.0, -global_phase);
        let a = a * phase_factor;
        let b = b * phase_factor;
        let c = c * phase_factor;

        // For SU(2): U = [[cos(b/2)*e^(-i(a+g)/2), -sin(b/2)*e^(-i(a-g)/2)],
        //                 [sin(b/2)*e^(i(a-g)/2),   cos(b/2)*e^(i(a+g)/2)]]
        let beta = 2.0 * c.norm().atan2(a.norm());

        if beta < EPSILON {
            let alpha_plus_gamma = -2.0 * a.arg();
            return (alpha_plus_gamma / 2.0, 0.0, alpha_plus_gamma / 2.0);
        }

        if (beta - PI).abs() < EPSILON {
            let alpha_minus_gamma = -2.0 * (-b).arg();
            return (alpha_minus_gamma / 2.0, PI, -alpha_minus_gamma / 2.0);
        }

        let alpha_plus_gamma = -2.0 * a.arg();
        let alpha_minus_gamma = 2.0 * c.arg();
        let alpha = f64::midpoint(alpha_plus_gamma, alpha_minus_gamma);
        let gamma = (alpha_plus_gamma - alpha_minus_gamma) / 2.0;
        (alpha, beta, gamma)
    }

    /// Exponents `(a, x, z)` of the PhasedXZ gate equal to this operator up
    /// to global phase.
    ///
    /// `a` and `z` are normalised to `[-1, 1)`. A half-turn `x` absorbs the Z
    /// rotation into the axis phase, and a vanishing `x` clears the axis
    /// phase, so each operator has one parameter choice.
    pub fn phxz_exponents(&self, atol: f64) -> (f64, f64, f64) {
        let (alpha, beta, gamma) = self.zyz_decomposition();
        let x = beta / PI;
        let a = 0.5 - gamma / PI;
        let z = (alpha + gamma) / PI;

        if x.abs() <= atol {
            (0.0, 0.0, normalize_exponent(z))
        } else if (x - 1.0).abs() <= atol {
            (normalize_exponent(a + z / 2.0), 1.0, 0.0)
        } else {
            (normalize_exponent(a), x, normalize_exponent(z))
        }
    }

    /// Whether `self` and `other` agree up to a global phase.
    pub fn approx_eq_up_to_phase(&self, other: &Self, atol: f64) -> bool {
        // Pick the largest entry of `other` to fix the relative phase.
        let Some((idx, _)) = other
            .data
            .iter()
            .enumerate()
            .max_by(|(_, x), (_, y)| x.norm().total_cmp(&y.norm()))
        else {
            return false;
        };
        if other.data[idx].norm() < atol {
            return false;
        }
        let phase = self.data[idx] / other.data[idx];
        self.data
            .iter()
            .zip(other.data.iter())
            .all(|(s, o)| (s - phase * o).norm() <= atol)
    }
}

/// Map an exponent onto `[-1, 1)`.
pub fn normalize_exponent(t: f64) -> f64 {
    if t.is_nan() || t.is_infinite() {
        return 0.0;
    }
    (t + 1.0).rem_euclid(2.0) - 1.0
}

impl Default for Unitary2x2 {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Mul for Unitary2x2 {
    type Output = Self;

    #[allow(clippy::needless_pass_by_value)]
    fn mul(self, rhs: Self) -> Self::Output {
        Unitary2x2::mul(&self, &rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATOL: f64 = 1e-8;

    fn exponents_close(got: (f64, f64, f64), expected: (f64, f64, f64)) -> bool {
        let close = |a: f64, b: f64| {
            let d = (a - b).rem_euclid(2.0);
            d < 1e-7 || 2.0 - d < 1e-7
        };
        close(got.0, expected.0) && close(got.1, expected.1) && close(got.2, expected.2)
    }

    #[test]
    fn test_identity() {
        let i = Unitary2x2::identity();
        assert!(i.is_identity(ATOL));
        assert!(Unitary2x2::z_pow(2.0).is_identity(ATOL));
        assert!(!Unitary2x2::z_pow(0.01).is_identity(ATOL));
    }

    #[test]
    fn test_hadamard_squared() {
        let h = Unitary2x2::h();
        assert!((h * h).is_identity(ATOL));
        assert!(Unitary2x2::h_pow(1.0).approx_eq_up_to_phase(&h, 1e-12));
    }

    #[test]
    fn test_pow_matches_plain_gates() {
        assert!(Unitary2x2::x_pow(1.0).approx_eq_up_to_phase(&Unitary2x2::x(), 1e-12));
        assert!(Unitary2x2::y_pow(1.0).approx_eq_up_to_phase(&Unitary2x2::y(), 1e-12));
        assert!(Unitary2x2::z_pow(1.0).approx_eq_up_to_phase(&Unitary2x2::z(), 1e-12));
        let sqrt_x = Unitary2x2::x_pow(0.5);
        assert!((sqrt_x * sqrt_x).approx_eq_up_to_phase(&Unitary2x2::x(), 1e-12));
    }

    #[test]
    fn test_trace_distance_bound() {
        assert!((Unitary2x2::x().trace_distance_bound() - 1.0).abs() < 1e-12);
        let half = Unitary2x2::z_pow(0.5).trace_distance_bound();
        assert!((half - (PI / 4.0).sin()).abs() < 1e-12);
    }

    #[test]
    fn test_zyz_reconstructs() {
        for u in [
            Unitary2x2::h(),
            Unitary2x2::x(),
            Unitary2x2::y_pow(0.3) * Unitary2x2::z_pow(0.7),
            Unitary2x2::identity(),
        ] {
            let (alpha, beta, gamma) = u.zyz_decomposition();
            let reconstructed = Unitary2x2::rz(alpha) * Unitary2x2::ry(beta) * Unitary2x2::rz(gamma);
            assert!(reconstructed.approx_eq_up_to_phase(&u, 1e-9));
        }
    }

    #[test]
    fn test_phxz_exponents_known_gates() {
        assert!(exponents_close(Unitary2x2::x().phxz_exponents(ATOL), (0.0, 1.0, 0.0)));
        assert!(exponents_close(
            Unitary2x2::y_pow(0.5).phxz_exponents(ATOL),
            (0.5, 0.5, 0.0)
        ));
        // H then Z
        assert!(exponents_close(
            (Unitary2x2::z() * Unitary2x2::h()).phxz_exponents(ATOL),
            (-0.5, 0.5, 0.0)
        ));
        assert!(exponents_close(
            Unitary2x2::z_pow(0.25).phxz_exponents(ATOL),
            (0.0, 0.0, 0.25)
        ));
        assert!(exponents_close(
            Unitary2x2::h().phxz_exponents(ATOL),
            (-0.5, 0.5, 1.0)
        ));
    }

    #[test]
    fn test_phxz_exponents_reconstruct() {
        let cases = [
            Unitary2x2::h_pow(0.3) * Unitary2x2::y_pow(0.7) * Unitary2x2::z_pow(0.2),
            Unitary2x2::y() * Unitary2x2::z_pow(0.25) * Unitary2x2::x(),
            Unitary2x2::x_pow(-0.4) * Unitary2x2::h(),
            Unitary2x2::z_pow(1.0) * Unitary2x2::x_pow(1.0),
        ];
        for u in cases {
            let (a, x, z) = u.phxz_exponents(ATOL);
            assert!(Unitary2x2::phxz(a, x, z).approx_eq_up_to_phase(&u, 1e-7));
            assert!((-1.0..1.0).contains(&a));
            assert!((-1.0..1.0).contains(&z));
        }
    }

    #[test]
    fn test_normalize_exponent() {
        assert_eq!(normalize_exponent(0.0), 0.0);
        assert_eq!(normalize_exponent(1.0), -1.0);
        assert_eq!(normalize_exponent(-1.0), -1.0);
        assert!((normalize_exponent(1.5) - (-0.5)).abs() < 1e-12);
        assert!((normalize_exponent(-2.25) - (-0.25)).abs() < 1e-12);
    }

    #[test]
    fn test_dagger_inverts() {
        let u = Unitary2x2::phxz(0.3, 0.7, -0.4);
        assert!((u * u.dagger()).is_identity(ATOL));
        assert!(!u.dagger().approx_eq_up_to_phase(&u, 1e-6));
    }
}
