// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Exact Kubernetes resource quantities.
//!
//! Values are held as signed nano-units, which is the finest precision the
//! API server keeps. Formatting reproduces the canonical form the API server
//! (and the cost-model, which parses these strings back) uses, e.g. `1500m`,
//! `768Mi`, `2k`.

use crate::error::QuantityError;
use std::fmt;
use std::ops::AddAssign;
use std::str::FromStr;

const NANO_EXP: i32 = 9;
const NANOS_PER_UNIT: i128 = 1_000_000_000;

/// The notation a quantity was written in, which is also the notation it is printed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    DecimalSI,
    BinarySI,
    DecimalExponent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantity {
    nanos: i128,
    format: Format,
}

impl Quantity {
    pub const fn zero(format: Format) -> Self {
        Self { nanos: 0, format }
    }

    pub fn is_zero(&self) -> bool {
        self.nanos == 0
    }

    pub fn format(&self) -> Format {
        self.format
    }

    fn fmt_decimal(&self, f: &mut fmt::Formatter<'_>, format: Format) -> fmt::Result {
        let mut mantissa = self.nanos;
        let mut exponent = -NANO_EXP;
        while exponent < 18 && mantissa % 1000 == 0 {
            mantissa /= 1000;
            exponent += 3;
        }

        let suffix = match (format, exponent) {
            (Format::DecimalExponent, 0) => String::new(),
            (Format::DecimalExponent, e) => format!("e{e}"),
            (_, e) => decimal_suffix(e).to_string(),
        };
        write!(f, "{mantissa}{suffix}")
    }

    fn fmt_binary(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut mantissa = self.nanos / NANOS_PER_UNIT;
        let mut power = 0;
        while power < BINARY_SUFFIXES.len() && mantissa % 1024 == 0 {
            mantissa /= 1024;
            power += 1;
        }
        let suffix = if power == 0 { "" } else { BINARY_SUFFIXES[power - 1] };
        write!(f, "{mantissa}{suffix}")
    }
}

impl AddAssign<Quantity> for Quantity {
    /// A zero quantity adopts the notation of whatever is added to it first
    fn add_assign(&mut self, rhs: Quantity) {
        if self.is_zero() {
            self.format = rhs.format;
        }
        self.nanos = self.nanos.saturating_add(rhs.nanos);
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nanos == 0 {
            return f.write_str("0");
        }
        match self.format {
            // Small or fractional binary values print as decimal to avoid rounding
            Format::BinarySI
                if self.nanos.abs() >= 1024 * NANOS_PER_UNIT
                    && self.nanos % NANOS_PER_UNIT == 0 =>
            {
                self.fmt_binary(f)
            }
            Format::BinarySI | Format::DecimalSI => self.fmt_decimal(f, Format::DecimalSI),
            Format::DecimalExponent => self.fmt_decimal(f, Format::DecimalExponent),
        }
    }
}

const BINARY_SUFFIXES: [&str; 6] = ["Ki", "Mi", "Gi", "Ti", "Pi", "Ei"];

fn decimal_suffix(exponent: i32) -> &'static str {
    match exponent {
        -9 => "n",
        -6 => "u",
        -3 => "m",
        3 => "k",
        6 => "M",
        9 => "G",
        12 => "T",
        15 => "P",
        18 => "E",
        _ => "",
    }
}

#[derive(Clone, Copy)]
enum Suffix {
    Decimal(i32),
    Binary(u32),
    Exponent(i32),
}

fn parse_suffix(suffix: &str) -> Option<Suffix> {
    let parsed = match suffix {
        "" => Suffix::Decimal(0),
        "n" => Suffix::Decimal(-9),
        "u" => Suffix::Decimal(-6),
        "m" => Suffix::Decimal(-3),
        "k" => Suffix::Decimal(3),
        "M" => Suffix::Decimal(6),
        "G" => Suffix::Decimal(9),
        "T" => Suffix::Decimal(12),
        "P" => Suffix::Decimal(15),
        "E" => Suffix::Decimal(18),
        _ => {
            if let Some(idx) = BINARY_SUFFIXES.iter().position(|s| *s == suffix) {
                Suffix::Binary(idx as u32 + 1)
            } else if let Some(exp) = suffix.strip_prefix(|c: char| c == 'e' || c == 'E') {
                Suffix::Exponent(exp.parse().ok()?)
            } else {
                return None;
            }
        }
    };
    Some(parsed)
}

/// Integer division rounding away from zero
fn div_ceil(value: i128, divisor: i128) -> i128 {
    let quotient = value / divisor;
    if value % divisor == 0 {
        quotient
    } else {
        quotient + value.signum()
    }
}

fn scale_by_pow10(value: i128, exponent: i32) -> Option<i128> {
    if exponent >= 0 {
        value.checked_mul(10i128.checked_pow(exponent as u32)?)
    } else {
        match 10i128.checked_pow(exponent.unsigned_abs()) {
            Some(divisor) => Some(div_ceil(value, divisor)),
            // Anything this small rounds up to a single nano-unit
            None => Some(value.signum()),
        }
    }
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let err = |reason| QuantityError {
            input: input.to_string(),
            reason,
        };

        let s = input.trim();
        let (negative, unsigned) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            Some(_) => (false, s),
            None => return Err(err("empty string")),
        };

        let number_len = unsigned
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(unsigned.len());
        let (number, suffix) = unsigned.split_at(number_len);

        let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(err("missing numeric value"));
        }
        if fraction.contains('.') {
            return Err(err("more than one decimal point"));
        }

        let suffix = parse_suffix(suffix).ok_or_else(|| err("unknown suffix"))?;
        let format = match suffix {
            Suffix::Decimal(_) => Format::DecimalSI,
            Suffix::Binary(_) => Format::BinarySI,
            Suffix::Exponent(_) => Format::DecimalExponent,
        };

        let digits = format!("{whole}{fraction}");
        let mantissa: i128 = digits.parse().map_err(|_| err("value out of range"))?;
        let fraction_len = fraction.len() as i32;

        let nanos = match suffix {
            Suffix::Decimal(exp) | Suffix::Exponent(exp) => {
                scale_by_pow10(
                    mantissa,
                    exp.saturating_add(NANO_EXP).saturating_sub(fraction_len),
                )
            }
            Suffix::Binary(power) => 1024i128
                .checked_pow(power)
                .and_then(|factor| mantissa.checked_mul(factor))
                .and_then(|value| scale_by_pow10(value, NANO_EXP - fraction_len)),
        }
        .ok_or_else(|| err("value out of range"))?;

        Ok(Self {
            nanos: if negative { -nanos } else { nanos },
            format,
        })
    }
}

impl TryFrom<&k8s_openapi::apimachinery::pkg::api::resource::Quantity> for Quantity {
    type Error = QuantityError;

    fn try_from(
        value: &k8s_openapi::apimachinery::pkg::api::resource::Quantity,
    ) -> Result<Self, Self::Error> {
        value.0.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(s: &str) -> Quantity {
        s.parse().unwrap()
    }

    #[test]
    fn test_canonical_forms() {
        assert_eq!(q("500m").to_string(), "500m");
        assert_eq!(q("0.5").to_string(), "500m");
        assert_eq!(q("1").to_string(), "1");
        assert_eq!(q("1000m").to_string(), "1");
        assert_eq!(q("2000").to_string(), "2k");
        assert_eq!(q("256Mi").to_string(), "256Mi");
        assert_eq!(q("1024Mi").to_string(), "1Gi");
        assert_eq!(q("1.5Gi").to_string(), "1536Mi");
        assert_eq!(q("512M").to_string(), "512M");
        assert_eq!(q("1e3").to_string(), "1e3");
        assert_eq!(q("0").to_string(), "0");
    }

    #[test]
    fn test_small_binary_values_print_as_decimal() {
        assert_eq!(q("0.5Ki").to_string(), "512");
        assert_eq!(q("1536").to_string(), "1536");
    }

    #[test]
    fn test_sub_nano_values_round_up() {
        assert_eq!(q("0.1n").to_string(), "1n");
        assert_eq!(q("1.0000000001").to_string(), "1000000001n");
    }

    #[test]
    fn test_zero_adopts_format_of_first_addend() {
        let mut total = Quantity::zero(Format::BinarySI);
        total += q("500m");
        assert_eq!(total.format(), Format::DecimalSI);
        total += q("1Ki");
        assert_eq!(total.format(), Format::DecimalSI);
    }

    #[test]
    fn test_repeated_addition_is_exact() {
        let mut total = Quantity::zero(Format::DecimalSI);
        for _ in 0..3 {
            total += q("0.1");
        }
        assert_eq!(total.to_string(), "300m");
    }

    #[test]
    fn test_negative_values() {
        assert_eq!(q("-1500m").to_string(), "-1500m");
    }

    #[test]
    fn test_invalid_inputs() {
        assert!("".parse::<Quantity>().is_err());
        assert!("abc".parse::<Quantity>().is_err());
        assert!("1Qi".parse::<Quantity>().is_err());
        assert!("1.2.3".parse::<Quantity>().is_err());
        assert!(".".parse::<Quantity>().is_err());
    }

    #[test]
    fn test_from_k8s_quantity() {
        use k8s_openapi::apimachinery::pkg::api::resource::Quantity as K8sQuantity;
        let parsed = Quantity::try_from(&K8sQuantity("128Mi".to_string())).unwrap();
        assert_eq!(parsed.to_string(), "128Mi");
    }
}
