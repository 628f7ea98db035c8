//! Fixed-point quantity (capacity / demand) with three decimal places.
//!
//! Stored as an unsigned count of thousandths so that matching, sums and the
//! two-path `amount_allocated` check are exact. Parsing accepts `.` or a single
//! `,` as decimal separator; negatives and more than three decimals are rejected.

use core::fmt;
use core::str::FromStr;

use crate::errors::CoreError;

/// Thousandths per whole unit.
pub const SCALE: u64 = 1_000;
/// Maximum decimal places accepted on input.
pub const MAX_DECIMALS: u32 = 3;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity(u64);

impl Quantity {
    pub const ZERO: Quantity = Quantity(0);

    #[inline]
    pub const fn from_milli(milli: u64) -> Self {
        Quantity(milli)
    }

    /// Whole units; saturates instead of wrapping.
    #[inline]
    pub const fn from_units(units: u64) -> Self {
        Quantity(units.saturating_mul(SCALE))
    }

    #[inline]
    pub const fn milli(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn checked_add(self, rhs: Quantity) -> Option<Quantity> {
        self.0.checked_add(rhs.0).map(Quantity)
    }

    #[inline]
    pub fn checked_sub(self, rhs: Quantity) -> Option<Quantity> {
        self.0.checked_sub(rhs.0).map(Quantity)
    }

    /// Exact sum; `None` on overflow.
    pub fn checked_sum<I: IntoIterator<Item = Quantity>>(it: I) -> Option<Quantity> {
        it.into_iter().try_fold(Quantity::ZERO, |acc, q| acc.checked_add(q))
    }

    /// Lossy float view (reports only).
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / SCALE as f64
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / SCALE;
        let frac = self.0 % SCALE;
        if frac == 0 {
            return write!(f, "{whole}");
        }
        let digits = format!("{frac:03}");
        write!(f, "{whole}.{}", digits.trim_end_matches('0'))
    }
}

impl FromStr for Quantity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CoreError::InvalidQuantity("empty"));
        }
        let s = s.strip_prefix('+').unwrap_or(s);
        if s.starts_with('-') {
            // "-0" is still a sign error on input; keep the message simple.
            return Err(CoreError::NegativeQuantity);
        }

        let (int_part, frac_part) = match (s.find('.'), s.find(',')) {
            (Some(_), Some(_)) => return Err(CoreError::InvalidQuantity("mixed separators")),
            (Some(i), None) | (None, Some(i)) => (&s[..i], &s[i + 1..]),
            (None, None) => (s, ""),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(CoreError::InvalidQuantity("no digits"));
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoreError::InvalidQuantity("not a decimal number"));
        }

        // Trailing zeros beyond the third decimal are harmless ("12.5000").
        let frac_trimmed = frac_part.trim_end_matches('0');
        if frac_trimmed.len() > MAX_DECIMALS as usize {
            return Err(CoreError::TooPrecise { max: MAX_DECIMALS });
        }

        let whole: u64 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| CoreError::Overflow)?
        };
        let mut frac: u64 = 0;
        for (i, b) in frac_trimmed.bytes().enumerate() {
            frac += u64::from(b - b'0') * 10u64.pow(MAX_DECIMALS - 1 - i as u32);
        }

        whole
            .checked_mul(SCALE)
            .and_then(|m| m.checked_add(frac))
            .map(Quantity)
            .ok_or(CoreError::Overflow)
    }
}

impl core::ops::Sub for Quantity {
    type Output = Quantity;

    /// Panics on underflow in debug builds like the integer it wraps; callers
    /// that cannot prove ordering use `checked_sub`.
    fn sub(self, rhs: Quantity) -> Quantity {
        Quantity(self.0 - rhs.0)
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use super::Quantity;
    use core::fmt;
    use serde::de::{self, Visitor};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Whole quantities serialize as JSON integers, fractional ones as floats.
    impl Serialize for Quantity {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            if self.0 % super::SCALE == 0 {
                serializer.serialize_u64(self.0 / super::SCALE)
            } else {
                serializer.serialize_f64(self.as_f64())
            }
        }
    }

    struct QuantityVisitor;

    impl<'de> Visitor<'de> for QuantityVisitor {
        type Value = Quantity;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a non-negative number with at most three decimals")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Quantity, E> {
            v.checked_mul(super::SCALE)
                .map(Quantity)
                .ok_or_else(|| E::custom("quantity overflow"))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Quantity, E> {
            if v < 0 {
                return Err(E::custom("negative quantity"));
            }
            self.visit_u64(v as u64)
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Quantity, E> {
            if !v.is_finite() {
                return Err(E::custom("quantity must be finite"));
            }
            // Shortest round-trip text, then the exact decimal parser.
            self.visit_str(&format!("{v}"))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Quantity, E> {
            v.parse().map_err(E::custom)
        }
    }

    impl<'de> Deserialize<'de> for Quantity {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            deserializer.deserialize_any(QuantityVisitor)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(s: &str) -> Quantity {
        s.parse().unwrap()
    }

    #[test]
    fn parses_integers_and_decimals() {
        assert_eq!(q("120"), Quantity::from_units(120));
        assert_eq!(q(" 12.5 "), Quantity::from_milli(12_500));
        assert_eq!(q("1,25"), Quantity::from_milli(1_250));
        assert_eq!(q(".5"), Quantity::from_milli(500));
        assert_eq!(q("7."), Quantity::from_units(7));
        assert_eq!(q("+3"), Quantity::from_units(3));
        assert_eq!(q("12.5000"), Quantity::from_milli(12_500));
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!("".parse::<Quantity>(), Err(CoreError::InvalidQuantity("empty")));
        assert_eq!("-1".parse::<Quantity>(), Err(CoreError::NegativeQuantity));
        assert_eq!("1.2345".parse::<Quantity>(), Err(CoreError::TooPrecise { max: 3 }));
        assert!("abc".parse::<Quantity>().is_err());
        assert!("1.2.3".parse::<Quantity>().is_err());
        assert!("1.000,5".parse::<Quantity>().is_err());
        assert!("NaN".parse::<Quantity>().is_err());
        assert!(".".parse::<Quantity>().is_err());
        assert_eq!("99999999999999999999".parse::<Quantity>(), Err(CoreError::Overflow));
    }

    #[test]
    fn displays_shortest_exact_decimal() {
        assert_eq!(Quantity::from_units(20).to_string(), "20");
        assert_eq!(Quantity::from_milli(12_500).to_string(), "12.5");
        assert_eq!(Quantity::from_milli(1).to_string(), "0.001");
        assert_eq!(Quantity::ZERO.to_string(), "0");
    }

    #[test]
    fn checked_sum_detects_overflow() {
        let big = Quantity::from_milli(u64::MAX);
        assert_eq!(Quantity::checked_sum([big, Quantity::from_milli(1)]), None);
        assert_eq!(
            Quantity::checked_sum([q("1.5"), q("2.5")]),
            Some(Quantity::from_units(4))
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_whole_as_int_fraction_as_float() {
        assert_eq!(serde_json::to_string(&q("20")).unwrap(), "20");
        assert_eq!(serde_json::to_string(&q("12.5")).unwrap(), "12.5");
        let back: Quantity = serde_json::from_str("12.5").unwrap();
        assert_eq!(back, q("12.5"));
        let from_str: Quantity = serde_json::from_str("\"7,25\"").unwrap();
        assert_eq!(from_str, q("7.25"));
        assert!(serde_json::from_str::<Quantity>("-3").is_err());
    }
}
