use crate::ledger::LedgerError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Format used for `fecha_hora` on the wire and in the sales archive.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A money amount held as whole cents.
///
/// Serialised as a JSON number in currency units (`80` cents is `0.8`) so the
/// client can keep calling `toFixed(2)` on it. Amounts above
/// [`Cents::MAX_EXACT`] are not representable, so every serialised value is
/// exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Cents(pub u64);

impl Cents {
    pub const ZERO: Cents = Cents(0);
    /// Largest amount an `f64` holds without rounding (2^53 cents).
    pub const MAX_EXACT: Cents = Cents(1 << 53);

    /// Rounds a currency amount to the nearest cent. Negative, non-finite or
    /// larger than [`Cents::MAX_EXACT`] amounts have no representation.
    pub fn from_amount(amount: f64) -> Option<Self> {
        if !amount.is_finite() || amount < 0.0 {
            return None;
        }
        let cents = (amount * 100.0).round();
        if cents > Self::MAX_EXACT.0 as f64 {
            return None;
        }
        Some(Self(cents as u64))
    }

    pub fn as_amount(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn checked_mul(self, quantity: u32) -> Option<Self> {
        self.0.checked_mul(u64::from(quantity)).map(Self)
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Cents {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_amount())
    }
}

impl<'de> Deserialize<'de> for Cents {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = f64::deserialize(deserializer)?;
        Cents::from_amount(amount).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "price must be a non-negative amount up to {}, got {amount}",
                Cents::MAX_EXACT
            ))
        })
    }
}

/// One recorded sale. Never mutated after the ledger appends it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sale {
    #[serde(rename = "sabor")]
    pub flavor: String,
    #[serde(rename = "cantidad")]
    pub quantity: u32,
    #[serde(rename = "precio")]
    pub unit_price: Cents,
    #[serde(rename = "total")]
    pub amount: Cents,
    #[serde(rename = "fecha_hora", serialize_with = "serialize_timestamp")]
    pub sold_at: NaiveDateTime,
    #[serde(rename = "stock_restante")]
    pub remaining_stock: u32,
}

fn serialize_timestamp<S: Serializer>(at: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&at.format(TIMESTAMP_FORMAT))
}

#[derive(Debug, Deserialize)]
pub struct SaleRequest {
    pub sabor: String,
    // The HTML form posts the quantity as a string, scripts post a number.
    pub cantidad: Value,
}

#[derive(Debug, Serialize)]
pub struct SaleResponse {
    pub message: String,
    pub venta: Sale,
    pub total: Cents,
    pub total_ventas: Cents,
}

#[derive(Debug, Serialize)]
pub struct TotalResponse {
    pub total_ventas: Cents,
    pub ventas: Vec<Sale>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Decodes `cantidad` as a positive whole number of units.
pub fn parse_quantity(value: &Value) -> Result<u32, LedgerError> {
    let parsed = match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    };

    match parsed {
        Some(0) => Err(LedgerError::InvalidQuantity(
            "la cantidad debe ser mayor que cero".to_string(),
        )),
        Some(quantity) => u32::try_from(quantity).map_err(|_| {
            LedgerError::InvalidQuantity(format!("la cantidad {quantity} está fuera de rango"))
        }),
        None => Err(LedgerError::InvalidQuantity(format!(
            "se esperaba un número entero positivo, se recibió {value}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn quantity_accepts_numbers_and_numeric_strings() {
        assert_eq!(parse_quantity(&json!(3)), Ok(3));
        assert_eq!(parse_quantity(&json!("4")), Ok(4));
        assert_eq!(parse_quantity(&json!(" 12 ")), Ok(12));
    }

    #[test]
    fn quantity_rejects_everything_else() {
        for value in [
            json!(0),
            json!("0"),
            json!(-2),
            json!("-2"),
            json!(1.5),
            json!("dos"),
            json!(""),
            json!(null),
            json!(true),
            json!([1]),
            json!(u64::from(u32::MAX) + 1),
        ] {
            assert!(
                matches!(parse_quantity(&value), Err(LedgerError::InvalidQuantity(_))),
                "{value} should be rejected"
            );
        }
    }

    #[test]
    fn cents_round_to_nearest_cent() {
        assert_eq!(Cents::from_amount(0.80), Some(Cents(80)));
        assert_eq!(Cents::from_amount(1.25), Some(Cents(125)));
        assert_eq!(Cents::from_amount(0.999), Some(Cents(100)));
        assert_eq!(Cents::from_amount(-0.01), None);
        assert_eq!(Cents::from_amount(f64::NAN), None);
        assert_eq!(Cents::from_amount(f64::INFINITY), None);
        assert_eq!(Cents(1234).to_string(), "12.34");
        assert_eq!(Cents(5).to_string(), "0.05");
    }

    #[test]
    fn cents_beyond_exact_range_are_rejected() {
        assert_eq!(
            Cents::from_amount(90_000_000_000_000.0),
            Some(Cents(9_000_000_000_000_000))
        );
        assert_eq!(Cents::from_amount(90_100_000_000_000.0), None);
        // 2^64 cents used to saturate to u64::MAX.
        assert_eq!(Cents::from_amount(u64::MAX as f64 / 100.0), None);
        assert_eq!(Cents::from_amount(1e20), None);
    }

    #[test]
    fn sale_serialises_with_wire_names() {
        let sale = Sale {
            flavor: "Mora Hielo".to_string(),
            quantity: 2,
            unit_price: Cents(80),
            amount: Cents(160),
            sold_at: NaiveDate::from_ymd_opt(2026, 1, 5)
                .unwrap()
                .and_hms_opt(14, 3, 9)
                .unwrap(),
            remaining_stock: 8,
        };

        let value = serde_json::to_value(&sale).unwrap();
        assert_eq!(
            value,
            json!({
                "sabor": "Mora Hielo",
                "cantidad": 2,
                "precio": 0.8,
                "total": 1.6,
                "fecha_hora": "2026-01-05 14:03:09",
                "stock_restante": 8,
            })
        );
    }
}
