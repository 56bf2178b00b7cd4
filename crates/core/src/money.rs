//! Money value object.
//!
//! Amounts are stored as whole minor units (cents) in an `i64`, so arithmetic
//! never drifts the way floating point does. Arithmetic is only defined between
//! values of the same currency.

use core::str::FromStr;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Number of minor units in one major unit. Every currency is treated as having
/// two decimal places.
pub const MINOR_UNITS_PER_MAJOR: i64 = 100;

/// Currency code, stored verbatim.
///
/// No ISO-4217 validation happens here; codes are compared byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn symbol(&self) -> Option<&'static str> {
        match self.0.as_str() {
            "USD" => Some("$"),
            "EUR" => Some("€"),
            "GBP" => Some("£"),
            _ => None,
        }
    }
}

impl core::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CurrencyCode {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl ValueObject for CurrencyCode {}

/// Display locale for [`Money::format`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Locale {
    /// `$1,234.56`
    #[default]
    EnUs,
    /// `£1,234.56`
    EnGb,
    /// `1.234,56 €`
    DeDe,
    /// `1 234,56 €`
    FrFr,
}

impl Locale {
    pub fn tag(self) -> &'static str {
        match self {
            Locale::EnUs => "en-US",
            Locale::EnGb => "en-GB",
            Locale::DeDe => "de-DE",
            Locale::FrFr => "fr-FR",
        }
    }

    fn group_separator(self) -> &'static str {
        match self {
            Locale::EnUs | Locale::EnGb => ",",
            Locale::DeDe => ".",
            Locale::FrFr => " ",
        }
    }

    fn decimal_separator(self) -> &'static str {
        match self {
            Locale::EnUs | Locale::EnGb => ".",
            Locale::DeDe | Locale::FrFr => ",",
        }
    }

    fn symbol_first(self) -> bool {
        matches!(self, Locale::EnUs | Locale::EnGb)
    }
}

impl core::fmt::Display for Locale {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Locale {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().replace('_', "-").to_ascii_lowercase().as_str() {
            "en-us" | "en" => Ok(Locale::EnUs),
            "en-gb" => Ok(Locale::EnGb),
            "de-de" | "de" => Ok(Locale::DeDe),
            "fr-fr" | "fr" => Ok(Locale::FrFr),
            other => Err(DomainError::validation(format!("unsupported locale: {other}"))),
        }
    }
}

/// Monetary amount in minor units of a currency.
///
/// Immutable: every operation returns a new value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: i64,
    currency: CurrencyCode,
}

impl Money {
    pub fn new(amount_minor: i64, currency: impl Into<CurrencyCode>) -> Self {
        Self {
            amount: amount_minor,
            currency: currency.into(),
        }
    }

    pub fn zero(currency: impl Into<CurrencyCode>) -> Self {
        Self::new(0, currency)
    }

    /// Construct from an untyped numeric minor-unit amount.
    ///
    /// Fails with [`DomainError::InvalidAmount`] unless the amount is a finite
    /// whole number inside the `i64` range.
    pub fn try_from_minor(amount_minor: f64, currency: impl Into<CurrencyCode>) -> DomainResult<Self> {
        if !amount_minor.is_finite() || amount_minor.fract() != 0.0 {
            return Err(DomainError::invalid_amount(format!(
                "{amount_minor} is not a whole number of minor units"
            )));
        }
        // `i64::MAX as f64` rounds up to 2^63, which is itself out of range.
        if amount_minor < i64::MIN as f64 || amount_minor >= i64::MAX as f64 {
            return Err(DomainError::invalid_amount(format!(
                "{amount_minor} is outside the supported range"
            )));
        }
        Ok(Self::new(amount_minor as i64, currency))
    }

    /// Convert a major-unit amount (e.g. `10.50` EUR) into minor units.
    ///
    /// Rounds half to even (banker's rounding): `0.125` becomes 12 cents,
    /// `0.135` becomes 14 cents.
    pub fn from_major(amount_major: Decimal, currency: impl Into<CurrencyCode>) -> DomainResult<Self> {
        let minor = amount_major
            .checked_mul(Decimal::from(MINOR_UNITS_PER_MAJOR))
            .ok_or(DomainError::AmountOverflow)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);
        let minor = minor.to_i64().ok_or(DomainError::AmountOverflow)?;
        Ok(Self::new(minor, currency))
    }

    /// [`Money::from_major`] for binary floating-point input.
    ///
    /// Values like `1.005` have no exact binary representation; callers holding
    /// exact decimal input should use `from_major` directly.
    pub fn from_major_f64(amount_major: f64, currency: impl Into<CurrencyCode>) -> DomainResult<Self> {
        let decimal = Decimal::from_f64(amount_major).ok_or_else(|| {
            DomainError::invalid_amount(format!("{amount_major} is not a representable amount"))
        })?;
        Self::from_major(decimal, currency)
    }

    /// Amount in minor units.
    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn currency(&self) -> &CurrencyCode {
        &self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    pub fn is_negative(&self) -> bool {
        self.amount < 0
    }

    pub fn add(&self, other: &Money) -> DomainResult<Money> {
        self.ensure_same_currency(other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or(DomainError::AmountOverflow)?;
        Ok(Self::new(amount, self.currency.clone()))
    }

    pub fn subtract(&self, other: &Money) -> DomainResult<Money> {
        self.ensure_same_currency(other)?;
        let amount = self
            .amount
            .checked_sub(other.amount)
            .ok_or(DomainError::AmountOverflow)?;
        Ok(Self::new(amount, self.currency.clone()))
    }

    /// Scale by a whole quantity (e.g. unit price × tickets).
    pub fn multiply(&self, quantity: i64) -> DomainResult<Money> {
        let amount = self
            .amount
            .checked_mul(quantity)
            .ok_or(DomainError::AmountOverflow)?;
        Ok(Self::new(amount, self.currency.clone()))
    }

    pub fn negate(&self) -> DomainResult<Money> {
        let amount = self.amount.checked_neg().ok_or(DomainError::AmountOverflow)?;
        Ok(Self::new(amount, self.currency.clone()))
    }

    /// Presentation-only rendering; never parse the result back into `Money`.
    pub fn format(&self, locale: Locale) -> String {
        let sign = if self.amount < 0 { "-" } else { "" };
        let abs = self.amount.unsigned_abs();
        let per_major = MINOR_UNITS_PER_MAJOR.unsigned_abs();
        let major = group_thousands(abs / per_major, locale.group_separator());
        let number = format!("{major}{}{:02}", locale.decimal_separator(), abs % per_major);

        match (self.currency.symbol(), locale.symbol_first()) {
            (Some(symbol), true) => format!("{sign}{symbol}{number}"),
            (None, true) => format!("{sign}{} {number}", self.currency),
            (Some(symbol), false) => format!("{sign}{number} {symbol}"),
            (None, false) => format!("{sign}{number} {}", self.currency),
        }
    }

    fn ensure_same_currency(&self, other: &Money) -> DomainResult<()> {
        if self.currency != other.currency {
            return Err(DomainError::currency_mismatch(
                self.currency.as_str(),
                other.currency.as_str(),
            ));
        }
        Ok(())
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.format(Locale::default()))
    }
}

impl ValueObject for Money {}

fn group_thousands(value: u64, separator: &str) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 * separator.len());
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn from_major_converts_to_minor_units() {
        let m = Money::from_major_f64(10.5, "EUR").unwrap();
        assert_eq!(m.amount(), 1050);
        assert_eq!(m.currency().as_str(), "EUR");
    }

    #[test]
    fn from_major_rounds_half_to_even() {
        assert_eq!(Money::from_major(dec("0.125"), "USD").unwrap().amount(), 12);
        assert_eq!(Money::from_major(dec("0.135"), "USD").unwrap().amount(), 14);
        assert_eq!(Money::from_major(dec("-0.125"), "USD").unwrap().amount(), -12);
        assert_eq!(Money::from_major(dec("19.994"), "USD").unwrap().amount(), 1999);
        assert_eq!(Money::from_major(dec("19.996"), "USD").unwrap().amount(), 2000);
    }

    #[test]
    fn from_major_rejects_non_finite() {
        let err = Money::from_major_f64(f64::NAN, "USD").unwrap_err();
        assert!(matches!(err, DomainError::InvalidAmount(_)));
    }

    #[test]
    fn from_major_reports_overflow() {
        let err = Money::from_major(Decimal::MAX, "USD").unwrap_err();
        assert_eq!(err, DomainError::AmountOverflow);
    }

    #[test]
    fn fractional_minor_units_are_rejected() {
        let err = Money::try_from_minor(10.5, "USD").unwrap_err();
        assert!(matches!(err, DomainError::InvalidAmount(_)));
        assert!(Money::try_from_minor(f64::INFINITY, "USD").is_err());
        assert!(Money::try_from_minor(1e30, "USD").is_err());
        assert_eq!(Money::try_from_minor(-250.0, "USD").unwrap().amount(), -250);
    }

    #[test]
    fn subtract_same_currency() {
        let a = Money::new(1000, "USD");
        let b = Money::new(250, "USD");
        assert_eq!(a.subtract(&b).unwrap(), Money::new(750, "USD"));
        assert!(b.subtract(&a).unwrap().is_negative());
    }

    #[test]
    fn operations_do_not_mutate_operands() {
        let a = Money::new(1000, "USD");
        let b = Money::new(1, "USD");
        let _ = a.add(&b).unwrap();
        assert_eq!(a.amount(), 1000);
        assert_eq!(b.amount(), 1);
    }

    #[test]
    fn overflow_is_reported() {
        let max = Money::new(i64::MAX, "USD");
        assert_eq!(max.add(&Money::new(1, "USD")).unwrap_err(), DomainError::AmountOverflow);
        assert_eq!(max.multiply(2).unwrap_err(), DomainError::AmountOverflow);
        assert_eq!(Money::new(i64::MIN, "USD").negate().unwrap_err(), DomainError::AmountOverflow);
    }

    #[test]
    fn multiply_scales_amount() {
        let unit = Money::new(2_550, "EUR");
        assert_eq!(unit.multiply(4).unwrap(), Money::new(10_200, "EUR"));
    }

    #[test]
    fn currency_code_is_not_normalized() {
        let upper = Money::new(1, "EUR");
        let lower = Money::new(1, "eur");
        assert!(matches!(
            upper.add(&lower),
            Err(DomainError::CurrencyMismatch { .. })
        ));
    }

    #[test]
    fn display_uses_en_us() {
        assert_eq!(Money::new(123_456, "USD").to_string(), "$1,234.56");
        assert_eq!(Money::new(-5, "USD").to_string(), "-$0.05");
        assert_eq!(Money::new(1000, "CHF").to_string(), "CHF 10.00");
    }

    #[test]
    fn format_follows_locale() {
        let m = Money::new(123_456_789, "EUR");
        assert_eq!(m.format(Locale::EnUs), "€1,234,567.89");
        assert_eq!(m.format(Locale::DeDe), "1.234.567,89 €");
        assert_eq!(m.format(Locale::FrFr), "1 234 567,89 €");
        assert_eq!(Money::new(99, "GBP").format(Locale::EnGb), "£0.99");
    }

    #[test]
    fn format_handles_minimum_value() {
        let s = Money::new(i64::MIN, "USD").format(Locale::EnUs);
        assert_eq!(s, "-$92,233,720,368,547,758.08");
    }

    #[test]
    fn locale_parsing() {
        assert_eq!("en-US".parse::<Locale>().unwrap(), Locale::EnUs);
        assert_eq!("de_DE".parse::<Locale>().unwrap(), Locale::DeDe);
        assert!("xx-YY".parse::<Locale>().is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        #[test]
        fn add_sums_minor_units(
            a in -1_000_000_000_000i64..1_000_000_000_000i64,
            b in -1_000_000_000_000i64..1_000_000_000_000i64,
        ) {
            let sum = Money::new(a, "EUR").add(&Money::new(b, "EUR")).unwrap();
            prop_assert_eq!(sum, Money::new(a + b, "EUR"));
        }

        #[test]
        fn mixed_currencies_fail(
            a in any::<i64>(),
            b in any::<i64>(),
            left in "[A-Z]{3}",
            right in "[A-Z]{3}",
        ) {
            prop_assume!(left != right);
            let x = Money::new(a, left.as_str());
            let y = Money::new(b, right.as_str());
            let add_is_mismatch = matches!(x.add(&y), Err(DomainError::CurrencyMismatch { .. }));
            let sub_is_mismatch = matches!(x.subtract(&y), Err(DomainError::CurrencyMismatch { .. }));
            prop_assert!(add_is_mismatch);
            prop_assert!(sub_is_mismatch);
        }

        #[test]
        fn non_integer_minor_amounts_fail(whole in -1_000_000i64..1_000_000i64, frac in 0.01f64..0.99f64) {
            let result = Money::try_from_minor(whole as f64 + frac, "USD");
            prop_assert!(matches!(result, Err(DomainError::InvalidAmount(_))));
        }
    }
}
