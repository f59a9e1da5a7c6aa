//! Monetary amounts using decimal arithmetic.
//!
//! The commerce platform sends amounts as decimal strings (`"19.99"`) next to
//! an ISO 4217 currency code. [`Money`] keeps the two together so amounts in
//! different currencies are never added or compared by accident.

use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when building or combining [`Money`] values.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The amount is not a decimal number.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    /// The currency code is not three ASCII letters.
    #[error("invalid currency code: {0}")]
    InvalidCurrency(String),
    /// Two amounts in different currencies were combined.
    #[error("currency mismatch: {left} vs {right}")]
    CurrencyMismatch {
        /// Currency of the left-hand operand.
        left: CurrencyCode,
        /// Currency of the right-hand operand.
        right: CurrencyCode,
    },
}

/// ISO 4217 currency code, stored as three uppercase ASCII letters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode([u8; 3]);

impl CurrencyCode {
    /// US dollar.
    pub const USD: Self = Self(*b"USD");
    /// Euro.
    pub const EUR: Self = Self(*b"EUR");
    /// Pound sterling.
    pub const GBP: Self = Self(*b"GBP");
    /// Japanese yen.
    pub const JPY: Self = Self(*b"JPY");

    /// Parse a currency code, accepting lowercase input.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::InvalidCurrency`] unless the input is exactly
    /// three ASCII letters.
    pub fn parse(s: &str) -> Result<Self, MoneyError> {
        let bytes = s.trim().as_bytes();
        match bytes {
            [a, b, c] if bytes.iter().all(u8::is_ascii_alphabetic) => Ok(Self([
                a.to_ascii_uppercase(),
                b.to_ascii_uppercase(),
                c.to_ascii_uppercase(),
            ])),
            _ => Err(MoneyError::InvalidCurrency(s.to_owned())),
        }
    }

    /// The three-letter code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        // Only ASCII letters are ever stored.
        core::str::from_utf8(&self.0).unwrap_or("XXX")
    }

    /// Display symbol for well-known currencies.
    #[must_use]
    pub fn symbol(&self) -> Option<&'static str> {
        match &self.0 {
            b"USD" | b"CAD" | b"AUD" | b"NZD" | b"MXN" => Some("$"),
            b"EUR" => Some("€"),
            b"GBP" => Some("£"),
            b"JPY" | b"CNY" => Some("¥"),
            b"INR" => Some("₹"),
            b"KRW" => Some("₩"),
            _ => None,
        }
    }

    /// Number of minor-unit digits shown for this currency.
    #[must_use]
    pub const fn decimal_places(&self) -> u32 {
        match &self.0 {
            b"JPY" | b"KRW" | b"VND" | b"CLP" | b"ISK" => 0,
            _ => 2,
        }
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::USD
    }
}

impl fmt::Debug for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CurrencyCode({})", self.as_str())
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurrencyCode {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = MoneyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.as_str().to_owned()
    }
}

/// An amount of money in a single currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the currency's standard unit (dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Money {
    /// Create a new amount.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Zero in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Parse a platform amount string and currency code.
    ///
    /// # Errors
    ///
    /// Returns an error if either the amount or the currency code is invalid.
    pub fn parse(amount: &str, currency_code: &str) -> Result<Self, MoneyError> {
        let value = Decimal::from_str(amount.trim())
            .map_err(|_| MoneyError::InvalidAmount(amount.to_owned()))?;
        Ok(Self::new(value, CurrencyCode::parse(currency_code)?))
    }

    /// Add two amounts in the same currency.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::CurrencyMismatch`] when the currencies differ.
    pub fn checked_add(self, other: Self) -> Result<Self, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(Self::new(self.amount + other.amount, self.currency_code))
    }

    /// Multiply by a quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self::new(self.amount * Decimal::from(quantity), self.currency_code)
    }

    /// Compare two amounts in the same currency.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::CurrencyMismatch`] when the currencies differ.
    pub fn try_cmp(&self, other: &Self) -> Result<Ordering, MoneyError> {
        self.ensure_same_currency(*other)?;
        Ok(self.amount.cmp(&other.amount))
    }

    /// True when the amount is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// The amount rounded to the currency's minor units, without symbol.
    #[must_use]
    pub fn amount_string(&self) -> String {
        let places = self.currency_code.decimal_places();
        let rounded = self
            .amount
            .round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
        format!("{rounded:.prec$}", prec = places as usize)
    }

    fn ensure_same_currency(self, other: Self) -> Result<(), MoneyError> {
        if self.currency_code == other.currency_code {
            Ok(())
        } else {
            Err(MoneyError::CurrencyMismatch {
                left: self.currency_code,
                right: other.currency_code,
            })
        }
    }
}

/// Formats as `$1,234.50`, or `1,234.50 CHF` for currencies without a symbol.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plain = self.amount_string();
        let (sign, digits) = plain
            .strip_prefix('-')
            .map_or(("", plain.as_str()), |rest| ("-", rest));
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        let grouped = group_thousands(whole);

        match self.currency_code.symbol() {
            Some(symbol) => write!(f, "{sign}{symbol}{grouped}")?,
            None => write!(f, "{sign}{grouped}")?,
        }
        if !fraction.is_empty() {
            write!(f, ".{fraction}")?;
        }
        if self.currency_code.symbol().is_none() {
            write!(f, " {}", self.currency_code)?;
        }
        Ok(())
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_platform_amount() {
        let money = Money::parse("19.9", "usd").unwrap();
        assert_eq!(money.currency_code, CurrencyCode::USD);
        assert_eq!(money.amount, Decimal::new(199, 1));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            Money::parse("abc", "USD"),
            Err(MoneyError::InvalidAmount(_))
        ));
        assert!(matches!(
            Money::parse("1.00", "US"),
            Err(MoneyError::InvalidCurrency(_))
        ));
        assert!(CurrencyCode::parse("U$D").is_err());
    }

    #[test]
    fn test_display_formats() {
        assert_eq!(Money::parse("12.5", "USD").unwrap().to_string(), "$12.50");
        assert_eq!(Money::parse("3", "EUR").unwrap().to_string(), "€3.00");
        assert_eq!(Money::parse("500", "JPY").unwrap().to_string(), "¥500");
        assert_eq!(
            Money::parse("1234567.891", "USD").unwrap().to_string(),
            "$1,234,567.89"
        );
        assert_eq!(Money::parse("99.5", "CHF").unwrap().to_string(), "99.50 CHF");
        assert_eq!(Money::parse("-4.25", "GBP").unwrap().to_string(), "-£4.25");
    }

    #[test]
    fn test_checked_add_and_mismatch() {
        let a = Money::parse("10.00", "USD").unwrap();
        let b = Money::parse("2.50", "USD").unwrap();
        assert_eq!(a.checked_add(b).unwrap().to_string(), "$12.50");

        let euros = Money::parse("1.00", "EUR").unwrap();
        assert_eq!(
            a.checked_add(euros),
            Err(MoneyError::CurrencyMismatch {
                left: CurrencyCode::USD,
                right: CurrencyCode::EUR,
            })
        );
    }

    #[test]
    fn test_times_and_compare() {
        let unit = Money::parse("4.99", "USD").unwrap();
        let total = unit.times(3);
        assert_eq!(total.amount_string(), "14.97");
        assert_eq!(total.try_cmp(&unit).unwrap(), Ordering::Greater);
    }

    #[test]
    fn test_serde_uses_code_strings() {
        let money = Money::parse("5.00", "CAD").unwrap();
        let json = serde_json::to_value(money).unwrap();
        assert_eq!(json["currency_code"], "CAD");
        let back: Money = serde_json::from_value(json).unwrap();
        assert_eq!(back, money);
    }
}
