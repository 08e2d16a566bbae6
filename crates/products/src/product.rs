use core::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use inventario_core::{DomainError, DomainResult, ProductId};

use crate::action::FormFields;

/// Unit price of a product.
///
/// Always finite, strictly positive, and a whole number of cents. Inputs are
/// rounded half away from zero to two decimals, like a `DECIMAL(10,2)` column.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Price(f64);

impl Price {
    pub fn new(value: f64) -> DomainResult<Self> {
        if !value.is_finite() {
            return Err(DomainError::invalid_number(format!("price {value} is not finite")));
        }
        if value <= 0.0 {
            return Err(DomainError::validation(format!("price {value} must be > 0")));
        }
        let rounded = round_to_cents(value);
        if rounded <= 0.0 {
            return Err(DomainError::validation(format!("price {value} rounds to 0.00")));
        }
        Ok(Self(rounded))
    }

    pub fn get(&self) -> f64 {
        self.0
    }

    /// Fixed-point rendering with exactly two decimals (`10.5` -> `"10.50"`).
    pub fn to_fixed2(&self) -> String {
        format_fixed2(self.0)
    }
}

/// Render any stored amount with exactly two decimals.
///
/// Rows read back from the database are not re-validated, so this works on raw
/// values as well as on [`Price`].
pub fn format_fixed2(value: f64) -> String {
    match whole_cents(value) {
        Some(cents) => {
            let sign = if cents < 0 { "-" } else { "" };
            let cents = cents.unsigned_abs();
            format!("{sign}{}.{:02}", cents / 100, cents % 100)
        }
        None => format!("{value:.2}"),
    }
}

/// Round to two decimals, half away from zero (`1.005` -> `1.01`).
pub fn round_to_cents(value: f64) -> f64 {
    whole_cents(value).map_or(value, |cents| cents as f64 / 100.0)
}

/// Above 2^53 every f64 is already an integer.
const EXACT_INTEGER_LIMIT: f64 = 9_007_199_254_740_992.0;

/// `value` in cents, rounded half away from zero.
///
/// Works on the shortest decimal spelling of the float, so `2.675` rounds as the
/// literal the caller wrote rather than as its binary neighbour `2.67499...`.
fn whole_cents(value: f64) -> Option<i64> {
    if !value.is_finite() || value.abs() >= EXACT_INTEGER_LIMIT {
        return None;
    }
    // f64 Display never switches to exponent notation.
    let spelled = value.abs().to_string();
    let (whole, frac) = spelled.split_once('.').unwrap_or((spelled.as_str(), ""));
    let whole: i64 = whole.parse().ok()?;

    let mut digits = frac.bytes().map(|b| i64::from(b - b'0'));
    let mut next = || digits.next().unwrap_or(0);
    let mut cents = whole * 100 + next() * 10 + next();
    if next() >= 5 {
        cents += 1;
    }
    Some(if value < 0.0 { -cents } else { cents })
}

impl TryFrom<f64> for Price {
    type Error = DomainError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for f64 {
    fn from(value: Price) -> Self {
        value.0
    }
}

impl FromStr for Price {
    type Err = DomainError;

    /// Accepts plain decimal notation with optional sign and exponent
    /// (`"10"`, `"10.5"`, `".5"`, `"1e2"`), surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        // f64::from_str also accepts "inf"/"nan" spellings; only digits are numeric here.
        if !trimmed.bytes().any(|b| b.is_ascii_digit())
            || trimmed.bytes().any(|b| b.is_ascii_alphabetic() && b != b'e' && b != b'E')
        {
            return Err(DomainError::invalid_number(format!("{trimmed:?} is not numeric")));
        }
        let value = trimmed
            .parse::<f64>()
            .map_err(|e| DomainError::invalid_number(format!("{trimmed:?}: {e}")))?;
        Self::new(value)
    }
}

/// Fields shared by create and update (everything a caller may change).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductFields {
    pub nombre: String,
    pub descripcion: String,
    pub categoria: String,
    pub precio: Price,
    pub stock: i32,
    pub proveedor: String,
    pub activo: bool,
}

impl ProductFields {
    /// Decode and validate the mutable field set from raw form fields.
    pub fn from_fields(fields: &FormFields) -> DomainResult<Self> {
        Ok(Self {
            nombre: required(fields, "nombre")?.to_string(),
            descripcion: required(fields, "descripcion")?.to_string(),
            categoria: required(fields, "categoria")?.to_string(),
            precio: fields.get("precio").map(String::as_str).unwrap_or("").parse()?,
            stock: optional_int(fields, "stock")?.unwrap_or(0),
            proveedor: required(fields, "proveedor")?.to_string(),
            activo: optional_flag(fields, "activo")?.unwrap_or(true),
        })
    }
}

/// A product about to be inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub codigo_barras: String,
    #[serde(flatten)]
    pub fields: ProductFields,
}

impl NewProduct {
    pub fn from_fields(fields: &FormFields) -> DomainResult<Self> {
        let codigo_barras = required(fields, "codigo_barras")?.to_string();
        Ok(Self {
            codigo_barras,
            fields: ProductFields::from_fields(fields)?,
        })
    }
}

/// Replacement values for an existing product.
///
/// There is no barcode here: `codigo_barras` is fixed once a product exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub id: ProductId,
    #[serde(flatten)]
    pub fields: ProductFields,
}

impl ProductUpdate {
    pub fn from_fields(fields: &FormFields) -> DomainResult<Self> {
        let id = required_id(fields)?;
        Ok(Self {
            id,
            fields: ProductFields::from_fields(fields)?,
        })
    }
}

/// A persisted product row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub nombre: String,
    pub descripcion: String,
    pub codigo_barras: String,
    pub categoria: String,
    /// Raw stored amount; not re-validated on read.
    pub precio: f64,
    pub stock: i32,
    pub proveedor: String,
    pub fecha_ingreso: NaiveDateTime,
    pub activo: bool,
}

/// A required text field: present, not blank, and not the literal `"0"`.
///
/// The returned value is the raw input; only the check trims.
pub(crate) fn required<'a>(fields: &'a FormFields, name: &str) -> DomainResult<&'a str> {
    let raw = fields.get(name).map(String::as_str).unwrap_or("");
    if is_missing(raw) {
        return Err(DomainError::validation(format!("{name} is required")));
    }
    Ok(raw)
}

pub(crate) fn required_id(fields: &FormFields) -> DomainResult<ProductId> {
    let raw = required(fields, "id")?;
    raw.parse()
}

fn is_missing(raw: &str) -> bool {
    let v = raw.trim();
    v.is_empty() || v == "0"
}

fn optional_int(fields: &FormFields, name: &str) -> DomainResult<Option<i32>> {
    match fields.get(name).map(|v| v.trim()) {
        None | Some("") => Ok(None),
        Some(v) => v
            .parse::<i32>()
            .map(Some)
            .map_err(|e| DomainError::invalid_number(format!("{name}: {e}"))),
    }
}

fn optional_flag(fields: &FormFields, name: &str) -> DomainResult<Option<bool>> {
    match fields.get(name).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(None),
        Some(v) => match v.as_str() {
            "" => Ok(None),
            "1" | "true" | "on" | "yes" => Ok(Some(true)),
            "0" | "false" | "off" | "no" => Ok(Some(false)),
            other => Err(DomainError::validation(format!("{name}: {other:?} is not a flag"))),
        },
    }
}
