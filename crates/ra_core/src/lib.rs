//! ra_core: Core types, domains, ordering helpers, and exact ratios.
//!
//! This crate is **I/O-free**. It defines stable types/APIs used across the
//! engine (`ra_io`, `ra_algo`, `ra_pipeline`, `ra_report`, `ra_cli`).
//!
//! - Fixed-point `Quantity` (thousandths; no floats in the matching path)
//! - Label tokens: `UnitId`, `GroupLabel`; positional `UnitHandle`
//! - `Unit` records with the self-service split computed once
//! - `AllocationEdge` (append-only routing decisions)
//! - `Params` (configuration domain) and its validation
//! - Exact `Ratio` with percent rounding helpers
//!
//! Serialization derives are gated behind the `serde` feature.

#![forbid(unsafe_code)]

pub mod determinism;
pub mod quantity;
pub mod unit;
pub mod variables;

pub use quantity::Quantity;
pub use unit::{AllocationEdge, Unit, UnitHandle, UnitInput};
pub use variables::{HeadlineMetric, Params, TrailMode};

pub mod errors {
    use thiserror::Error;

    /// Minimal error set for core-domain validation & parsing.
    #[derive(Clone, Debug, Eq, PartialEq, Error)]
    pub enum CoreError {
        #[error("invalid label: {0}")]
        InvalidToken(&'static str),
        #[error("invalid quantity: {0}")]
        InvalidQuantity(&'static str),
        #[error("negative quantity")]
        NegativeQuantity,
        #[error("quantity has more than {max} decimal places")]
        TooPrecise { max: u32 },
        #[error("quantity overflow")]
        Overflow,
        #[error("invalid ratio")]
        InvalidRatio,
        #[error("domain out of range: {0}")]
        DomainOutOfRange(&'static str),
    }
}

pub mod tokens {
    //! Label token types (`UnitId`, `GroupLabel`).
    //!
    //! Input labels are free text; the only constraints are non-blank, no
    //! control characters, and at most 128 bytes after trimming.

    use crate::errors::CoreError;
    use core::fmt;
    use core::str::FromStr;

    #[cfg(feature = "serde")]
    use serde::{Deserialize, Serialize};

    pub const LABEL_MAX_LEN: usize = 128;

    fn check_label(s: &str) -> Result<(), CoreError> {
        if s.is_empty() {
            return Err(CoreError::InvalidToken("blank"));
        }
        if s.len() > LABEL_MAX_LEN {
            return Err(CoreError::InvalidToken("too long"));
        }
        if s.chars().any(char::is_control) {
            return Err(CoreError::InvalidToken("control character"));
        }
        Ok(())
    }

    macro_rules! def_token {
        ($(#[$meta:meta])* $name:ident) => {
            $(#[$meta])*
            #[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
            #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
            #[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
            pub struct $name(String);

            impl $name {
                pub fn as_str(&self) -> &str { &self.0 }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
            }

            impl FromStr for $name {
                type Err = CoreError;
                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    let t = s.trim();
                    check_label(t)?;
                    Ok(Self(t.to_string()))
                }
            }

            impl TryFrom<String> for $name {
                type Error = CoreError;
                fn try_from(s: String) -> Result<Self, Self::Error> { s.parse() }
            }

            impl From<$name> for String {
                fn from(t: $name) -> String { t.0 }
            }
        }
    }

    def_token!(
        /// Human-readable unit identifier, present only when the input carries one.
        UnitId
    );
    def_token!(
        /// Category label used by the same-group constraint.
        GroupLabel
    );
}

pub mod rounding {
    //! Exact, non-negative ratios and one-decimal percent rendering.

    use crate::errors::CoreError;
    use core::cmp::Ordering;

    #[cfg(feature = "serde")]
    use serde::{Deserialize, Serialize};

    /// Exact ratio `num / den` with `den > 0`, reduced by GCD.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct Ratio {
        pub num: u128,
        pub den: u128,
    }

    fn gcd_u128(mut a: u128, mut b: u128) -> u128 {
        while b != 0 {
            let r = a % b;
            a = b;
            b = r;
        }
        if a == 0 { 1 } else { a }
    }

    impl Ratio {
        pub const ZERO: Ratio = Ratio { num: 0, den: 1 };
        pub const ONE: Ratio = Ratio { num: 1, den: 1 };

        /// Construct a ratio, ensuring `den > 0` and reducing by GCD.
        pub fn new_checked(num: u128, den: u128) -> Result<Ratio, CoreError> {
            if den == 0 {
                return Err(CoreError::InvalidRatio);
            }
            let g = gcd_u128(num, den);
            Ok(Ratio { num: num / g, den: den / g })
        }

        /// Percent in tenths (e.g. `1000` = 100.0%), rounded half-to-even.
        pub fn percent_tenths(&self) -> u128 {
            // num/den * 1000, computed as quotient + remainder to stay exact.
            let scaled = self.num.saturating_mul(1000);
            let q = scaled / self.den;
            let r = scaled % self.den;
            match (r * 2).cmp(&self.den) {
                Ordering::Less => q,
                Ordering::Greater => q + 1,
                Ordering::Equal => if q % 2 == 0 { q } else { q + 1 },
            }
        }

        /// Lossy percent value for display layers that want a number.
        pub fn percent_f64(&self) -> f64 {
            (self.num as f64) * 100.0 / (self.den as f64)
        }
    }

    impl PartialOrd for Ratio {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
    }

    impl Ord for Ratio {
        fn cmp(&self, other: &Self) -> Ordering {
            match (self.num.checked_mul(other.den), other.num.checked_mul(self.den)) {
                (Some(l), Some(r)) => l.cmp(&r),
                // Only reachable for astronomically large sums; deterministic but lossy.
                _ => (self.num as f64 / self.den as f64)
                    .partial_cmp(&(other.num as f64 / other.den as f64))
                    .unwrap_or(Ordering::Equal),
            }
        }
    }

    /// Render tenths of a percent as `"<int>.<d>"` (no `%` sign).
    pub fn percent_one_decimal_tenths(tenths: u128) -> String {
        format!("{}.{}", tenths / 10, tenths % 10)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn reduces_and_rejects_zero_den() {
            assert_eq!(Ratio::new_checked(20, 40).unwrap(), Ratio { num: 1, den: 2 });
            assert_eq!(Ratio::new_checked(1, 0), Err(CoreError::InvalidRatio));
        }

        #[test]
        fn percent_tenths_rounds_half_even() {
            // 1/3 = 33.333..% -> 333
            assert_eq!(Ratio::new_checked(1, 3).unwrap().percent_tenths(), 333);
            // 1/16 = 6.25% -> 62.5 tenths -> 62 (even)
            assert_eq!(Ratio::new_checked(1, 16).unwrap().percent_tenths(), 62);
            // 3/16 = 18.75% -> 187.5 tenths -> 188 (even)
            assert_eq!(Ratio::new_checked(3, 16).unwrap().percent_tenths(), 188);
            assert_eq!(Ratio::ONE.percent_tenths(), 1000);
        }

        #[test]
        fn one_decimal_rendering() {
            assert_eq!(percent_one_decimal_tenths(1000), "100.0");
            assert_eq!(percent_one_decimal_tenths(5), "0.5");
            assert_eq!(percent_one_decimal_tenths(0), "0.0");
        }

        #[test]
        fn ordering_is_exact() {
            let a = Ratio::new_checked(2, 3).unwrap();
            let b = Ratio::new_checked(3, 5).unwrap();
            assert!(a > b);
            assert_eq!(Ratio::new_checked(2, 4).unwrap().cmp(&Ratio::new_checked(1, 2).unwrap()), Ordering::Equal);
        }
    }
}
