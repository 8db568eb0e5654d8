//! Prime-field Weierstrass curve arithmetic.
//!
//! Arbitrary-precision affine arithmetic for curves y² = x³ + ax + b over
//! GF(p). The orchestrator only needs the membership check; the CPU search
//! backend and the benchmark additionally use point addition and scalar
//! multiplication.

use num_bigint::BigUint;
use num_traits::{One, Zero};

/// An affine curve point, or the point at infinity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Point {
    Infinity,
    Affine { x: BigUint, y: BigUint },
}

impl Point {
    pub fn affine(x: BigUint, y: BigUint) -> Self {
        Point::Affine { x, y }
    }

    pub fn is_infinity(&self) -> bool {
        matches!(self, Point::Infinity)
    }
}

/// A short Weierstrass curve over GF(p).
#[derive(Debug, Clone)]
pub struct Curve {
    p: BigUint,
    a: BigUint,
    b: BigUint,
}

impl Curve {
    pub fn new(p: BigUint, a: BigUint, b: BigUint) -> Self {
        Self { p, a, b }
    }

    /// Whether (x, y) satisfies y² ≡ x³ + ax + b (mod p).
    ///
    /// Safe to call concurrently; the curve is immutable.
    pub fn is_on_curve(&self, x: &BigUint, y: &BigUint) -> bool {
        if x >= &self.p || y >= &self.p {
            return false;
        }
        let lhs = (y * y) % &self.p;
        let rhs = (x * x * x + &self.a * x + &self.b) % &self.p;
        lhs == rhs
    }

    /// Modular subtraction avoiding underflow.
    fn sub(&self, lhs: &BigUint, rhs: &BigUint) -> BigUint {
        ((&self.p + lhs) - (rhs % &self.p)) % &self.p
    }

    /// Modular inverse via Fermat's little theorem (p is prime).
    fn inv(&self, v: &BigUint) -> BigUint {
        let two = BigUint::from(2u32);
        v.modpow(&(&self.p - &two), &self.p)
    }

    pub fn add(&self, lhs: &Point, rhs: &Point) -> Point {
        let (x1, y1) = match lhs {
            Point::Infinity => return rhs.clone(),
            Point::Affine { x, y } => (x, y),
        };
        let (x2, y2) = match rhs {
            Point::Infinity => return lhs.clone(),
            Point::Affine { x, y } => (x, y),
        };

        if x1 == x2 {
            if y1 == y2 {
                return self.double(lhs);
            }
            // Vertical line: P + (-P) = O
            return Point::Infinity;
        }

        let slope = (self.sub(y2, y1) * self.inv(&self.sub(x2, x1))) % &self.p;
        let x3 = self.sub(&((&slope * &slope) % &self.p), &((x1 + x2) % &self.p));
        let y3 = self.sub(&((&slope * self.sub(x1, &x3)) % &self.p), y1);
        Point::Affine { x: x3, y: y3 }
    }

    pub fn double(&self, pt: &Point) -> Point {
        let (x, y) = match pt {
            Point::Infinity => return Point::Infinity,
            Point::Affine { x, y } => (x, y),
        };

        if y.is_zero() {
            return Point::Infinity;
        }

        let three = BigUint::from(3u32);
        let two = BigUint::from(2u32);
        let slope = ((&three * x * x + &self.a) % &self.p * self.inv(&((&two * y) % &self.p)))
            % &self.p;
        let x3 = self.sub(&((&slope * &slope) % &self.p), &((x * &two) % &self.p));
        let y3 = self.sub(&((&slope * self.sub(x, &x3)) % &self.p), y);
        Point::Affine { x: x3, y: y3 }
    }

    /// Double-and-add scalar multiplication.
    pub fn scalar_mul(&self, pt: &Point, k: &BigUint) -> Point {
        let mut result = Point::Infinity;
        let mut addend = pt.clone();
        let mut k = k.clone();

        while !k.is_zero() {
            if (&k & BigUint::one()) == BigUint::one() {
                result = self.add(&result, &addend);
            }
            addend = self.double(&addend);
            k >>= 1u32;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // y² = x³ + 2x + 2 over F_17, G = (5, 1), ord(G) = 19
    fn toy_curve() -> Curve {
        Curve::new(
            BigUint::from(17u32),
            BigUint::from(2u32),
            BigUint::from(2u32),
        )
    }

    fn pt(x: u32, y: u32) -> Point {
        Point::affine(BigUint::from(x), BigUint::from(y))
    }

    #[test]
    fn test_membership() {
        let curve = toy_curve();
        assert!(curve.is_on_curve(&BigUint::from(5u32), &BigUint::from(1u32)));
        assert!(curve.is_on_curve(&BigUint::from(6u32), &BigUint::from(3u32)));
        assert!(!curve.is_on_curve(&BigUint::from(5u32), &BigUint::from(2u32)));
        // Out-of-range coordinates are never on the curve
        assert!(!curve.is_on_curve(&BigUint::from(22u32), &BigUint::from(1u32)));
    }

    #[test]
    fn test_doubling_and_addition() {
        let curve = toy_curve();
        let g = pt(5, 1);
        let g2 = curve.double(&g);
        assert_eq!(g2, pt(6, 3));
        let g3 = curve.add(&g2, &g);
        assert_eq!(g3, pt(10, 6));
    }

    #[test]
    fn test_scalar_mul_matches_repeated_addition() {
        let curve = toy_curve();
        let g = pt(5, 1);

        let mut acc = Point::Infinity;
        for k in 1u32..=19 {
            acc = curve.add(&acc, &g);
            assert_eq!(curve.scalar_mul(&g, &BigUint::from(k)), acc);
        }
        // ord(G) = 19, so 19·G = O
        assert!(curve.scalar_mul(&g, &BigUint::from(19u32)).is_infinity());
    }

    #[test]
    fn test_inverse_points_cancel() {
        let curve = toy_curve();
        let g = pt(5, 1);
        let neg_g = pt(5, 16);
        assert!(curve.add(&g, &neg_g).is_infinity());
    }

    #[test]
    fn test_group_closure() {
        let curve = toy_curve();
        let g = pt(5, 1);
        let mut acc = g.clone();
        for _ in 0..18 {
            acc = curve.add(&acc, &g);
            if let Point::Affine { x, y } = &acc {
                assert!(curve.is_on_curve(x, y));
            }
        }
    }
}
