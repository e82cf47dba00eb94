//! Element kinds, the dynamic [`Value`] type, and the [`Element`] trait.
//!
//! Storage types are generic over an [`Element`]. Each element type names its
//! [`ElementKind`], its default (the value sparse storage never stores), and how
//! it converts to and from [`Value`], the canonical dynamically typed cell value.
//!
//! Conversions follow two rules:
//!
//! - widening always succeeds (`Int` -> `Long` -> `Double`, `Boolean` -> `1`/`0`)
//! - narrowing is an explicit cast (`Double` -> `Int` truncates toward zero)
//!
//! A value that has no representation in the target kind, such as the string
//! `"abc"` read as a double, fails with [`GridError::TypeConversion`].
//!
//! # Examples
//!
//! ```
//! use gridmat_core::{ElementKind, Value};
//!
//! let v = Value::Int(7);
//! assert_eq!(v.to_f64().unwrap(), 7.0);
//! assert_eq!(Value::Double(3.9).to_i32().unwrap(), 3);
//! assert!(Value::String("abc".into()).to_f64().is_err());
//! assert_eq!(
//!     Value::Boolean(true).convert(ElementKind::Long).unwrap(),
//!     Value::Long(1)
//! );
//! ```

use crate::error::{GridError, GridResult};
use bigdecimal::BigDecimal;
use chrono::{DateTime, TimeZone, Utc};
use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive, Zero};
use std::fmt;

/// The element type a container stores natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ElementKind {
    Double,
    Float,
    Long,
    Int,
    Short,
    Byte,
    Char,
    Boolean,
    /// Arbitrary-precision integer
    BigInteger,
    /// Arbitrary-precision decimal
    BigDecimal,
    /// Timestamp with millisecond resolution in UTC
    Date,
    String,
    /// Any [`Value`]; the default is [`Value::Null`]
    Object,
}

impl ElementKind {
    /// Every kind, in declaration order.
    pub const ALL: [ElementKind; 13] = [
        ElementKind::Double,
        ElementKind::Float,
        ElementKind::Long,
        ElementKind::Int,
        ElementKind::Short,
        ElementKind::Byte,
        ElementKind::Char,
        ElementKind::Boolean,
        ElementKind::BigInteger,
        ElementKind::BigDecimal,
        ElementKind::Date,
        ElementKind::String,
        ElementKind::Object,
    ];

    /// Whether values of this kind take part in arithmetic directly.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ElementKind::Double
                | ElementKind::Float
                | ElementKind::Long
                | ElementKind::Int
                | ElementKind::Short
                | ElementKind::Byte
                | ElementKind::BigInteger
                | ElementKind::BigDecimal
        )
    }

    /// Default value for cells of this kind.
    pub fn default_value(self) -> Value {
        match self {
            ElementKind::Double => Value::Double(0.0),
            ElementKind::Float => Value::Float(0.0),
            ElementKind::Long => Value::Long(0),
            ElementKind::Int => Value::Int(0),
            ElementKind::Short => Value::Short(0),
            ElementKind::Byte => Value::Byte(0),
            ElementKind::Char => Value::Char('\0'),
            ElementKind::Boolean => Value::Boolean(false),
            ElementKind::BigInteger => Value::BigInteger(BigInt::zero()),
            ElementKind::BigDecimal => Value::BigDecimal(BigDecimal::zero()),
            ElementKind::Date => Value::Date(DateTime::<Utc>::default()),
            ElementKind::String => Value::String(String::new()),
            ElementKind::Object => Value::Null,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A dynamically typed cell value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// Absent object
    Null,
    Double(f64),
    Float(f32),
    Long(i64),
    Int(i32),
    Short(i16),
    Byte(i8),
    Char(char),
    Boolean(bool),
    BigInteger(BigInt),
    BigDecimal(BigDecimal),
    Date(DateTime<Utc>),
    String(String),
}

/// Integer part, rounding toward zero.
fn truncate(d: &BigDecimal) -> BigInt {
    d.with_scale(0).into_bigint_and_exponent().0
}

fn millis_to_date(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

impl Value {
    /// Kind this value naturally belongs to; `Null` reports `Object`.
    pub fn kind(&self) -> ElementKind {
        match self {
            Value::Null => ElementKind::Object,
            Value::Double(_) => ElementKind::Double,
            Value::Float(_) => ElementKind::Float,
            Value::Long(_) => ElementKind::Long,
            Value::Int(_) => ElementKind::Int,
            Value::Short(_) => ElementKind::Short,
            Value::Byte(_) => ElementKind::Byte,
            Value::Char(_) => ElementKind::Char,
            Value::Boolean(_) => ElementKind::Boolean,
            Value::BigInteger(_) => ElementKind::BigInteger,
            Value::BigDecimal(_) => ElementKind::BigDecimal,
            Value::Date(_) => ElementKind::Date,
            Value::String(_) => ElementKind::String,
        }
    }

    fn fail(&self, to: ElementKind) -> GridError {
        GridError::conversion(self.kind(), to, self)
    }

    /// Read as `f64`.
    pub fn to_f64(&self) -> GridResult<f64> {
        Ok(match self {
            Value::Null => 0.0,
            Value::Double(v) => *v,
            Value::Float(v) => *v as f64,
            Value::Long(v) => *v as f64,
            Value::Int(v) => *v as f64,
            Value::Short(v) => *v as f64,
            Value::Byte(v) => *v as f64,
            Value::Char(c) => *c as u32 as f64,
            Value::Boolean(b) => f64::from(u8::from(*b)),
            Value::BigInteger(v) => v.to_f64().ok_or_else(|| self.fail(ElementKind::Double))?,
            Value::BigDecimal(v) => v.to_f64().ok_or_else(|| self.fail(ElementKind::Double))?,
            Value::Date(d) => d.timestamp_millis() as f64,
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| self.fail(ElementKind::Double))?,
        })
    }

    /// Read as an arbitrary-precision integer; decimals are truncated.
    pub fn to_big_integer(&self) -> GridResult<BigInt> {
        Ok(match self {
            Value::BigInteger(v) => v.clone(),
            Value::BigDecimal(v) => truncate(v),
            Value::Double(v) => BigInt::from_f64(v.trunc()).ok_or_else(|| self.fail(ElementKind::BigInteger))?,
            Value::Float(v) => BigInt::from_f32(v.trunc()).ok_or_else(|| self.fail(ElementKind::BigInteger))?,
            Value::String(s) => {
                let t = s.trim();
                match t.parse::<BigInt>() {
                    Ok(v) => v,
                    Err(_) => t
                        .parse::<BigDecimal>()
                        .map(|d| truncate(&d))
                        .map_err(|_| self.fail(ElementKind::BigInteger))?,
                }
            }
            other => BigInt::from(other.to_i128()?),
        })
    }

    /// Read as an arbitrary-precision decimal.
    ///
    /// NaN and infinities fail.
    pub fn to_big_decimal(&self) -> GridResult<BigDecimal> {
        Ok(match self {
            Value::BigDecimal(v) => v.clone(),
            Value::BigInteger(v) => BigDecimal::new(v.clone(), 0),
            Value::Double(v) => BigDecimal::from_f64(*v).ok_or_else(|| self.fail(ElementKind::BigDecimal))?,
            Value::Float(v) => BigDecimal::from_f32(*v).ok_or_else(|| self.fail(ElementKind::BigDecimal))?,
            Value::String(s) => s
                .trim()
                .parse::<BigDecimal>()
                .map_err(|_| self.fail(ElementKind::BigDecimal))?,
            other => BigDecimal::from(other.to_i64()?),
        })
    }

    /// Read as `i128`; floating point values are truncated and
    /// arbitrary-precision values outside the `i128` range fail.
    pub fn to_i128(&self) -> GridResult<i128> {
        Ok(match self {
            Value::Null => 0,
            Value::Double(v) => *v as i128,
            Value::Float(v) => *v as i128,
            Value::Long(v) => *v as i128,
            Value::Int(v) => *v as i128,
            Value::Short(v) => *v as i128,
            Value::Byte(v) => *v as i128,
            Value::Char(c) => *c as u32 as i128,
            Value::Boolean(b) => i128::from(*b),
            Value::BigInteger(v) => v.to_i128().ok_or_else(|| self.fail(ElementKind::Long))?,
            Value::BigDecimal(v) => truncate(v)
                .to_i128()
                .ok_or_else(|| self.fail(ElementKind::Long))?,
            Value::Date(d) => d.timestamp_millis() as i128,
            Value::String(s) => {
                let t = s.trim();
                match t.parse::<i128>() {
                    Ok(v) => v,
                    Err(_) => t
                        .parse::<f64>()
                        .map(|f| f as i128)
                        .map_err(|_| self.fail(ElementKind::Long))?,
                }
            }
        })
    }

    /// Read as `i64` (explicit narrowing cast from wider kinds).
    pub fn to_i64(&self) -> GridResult<i64> {
        match self {
            Value::Double(v) => Ok(*v as i64),
            Value::Float(v) => Ok(*v as i64),
            other => other.to_i128().map(|v| v as i64),
        }
    }

    /// Read as `i32` (explicit narrowing cast).
    pub fn to_i32(&self) -> GridResult<i32> {
        match self {
            Value::Double(v) => Ok(*v as i32),
            Value::Float(v) => Ok(*v as i32),
            other => other.to_i128().map(|v| v as i32),
        }
    }

    /// Read as `i16` (explicit narrowing cast).
    pub fn to_i16(&self) -> GridResult<i16> {
        match self {
            Value::Double(v) => Ok(*v as i16),
            Value::Float(v) => Ok(*v as i16),
            other => other.to_i128().map(|v| v as i16),
        }
    }

    /// Read as `i8` (explicit narrowing cast).
    pub fn to_i8(&self) -> GridResult<i8> {
        match self {
            Value::Double(v) => Ok(*v as i8),
            Value::Float(v) => Ok(*v as i8),
            other => other.to_i128().map(|v| v as i8),
        }
    }

    /// Read as `f32` (explicit narrowing cast).
    pub fn to_f32(&self) -> GridResult<f32> {
        match self {
            Value::Float(v) => Ok(*v),
            other => other.to_f64().map(|v| v as f32),
        }
    }

    /// Read as `bool`: numbers are `true` when non-zero.
    pub fn to_bool(&self) -> GridResult<bool> {
        Ok(match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Char(c) => *c != '\0',
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => true,
                "false" | "" => false,
                other => other
                    .parse::<f64>()
                    .map(|v| v != 0.0)
                    .map_err(|_| self.fail(ElementKind::Boolean))?,
            },
            Value::Date(_) => return Err(self.fail(ElementKind::Boolean)),
            Value::Double(v) => *v != 0.0,
            Value::Float(v) => *v != 0.0,
            Value::BigInteger(v) => !v.is_zero(),
            Value::BigDecimal(v) => !v.is_zero(),
            numeric => numeric.to_i128()? != 0,
        })
    }

    /// Read as `char`: integers are interpreted as code points.
    pub fn to_char(&self) -> GridResult<char> {
        match self {
            Value::Null => Ok('\0'),
            Value::Char(c) => Ok(*c),
            Value::String(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (None, _) => Ok('\0'),
                    (Some(c), None) => Ok(c),
                    _ => Err(self.fail(ElementKind::Char)),
                }
            }
            Value::Boolean(_) | Value::Date(_) => Err(self.fail(ElementKind::Char)),
            numeric => {
                let code = numeric.to_i128()?;
                u32::try_from(code)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| self.fail(ElementKind::Char))
            }
        }
    }

    /// Read as a UTC timestamp: integers are milliseconds since the epoch.
    pub fn to_date(&self) -> GridResult<DateTime<Utc>> {
        match self {
            Value::Null => Ok(DateTime::<Utc>::default()),
            Value::Date(d) => Ok(*d),
            Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
                .map(|d| d.with_timezone(&Utc))
                .map_err(|_| self.fail(ElementKind::Date)),
            Value::Boolean(_) | Value::Char(_) => Err(self.fail(ElementKind::Date)),
            numeric => {
                let ms = numeric.to_i64()?;
                millis_to_date(ms).ok_or_else(|| self.fail(ElementKind::Date))
            }
        }
    }

    /// Render as text. Never fails; `Null` renders as the empty string.
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    /// Convert into a value of kind `kind`.
    pub fn convert(&self, kind: ElementKind) -> GridResult<Value> {
        Ok(match kind {
            ElementKind::Double => Value::Double(self.to_f64()?),
            ElementKind::Float => Value::Float(self.to_f32()?),
            ElementKind::Long => Value::Long(self.to_i64()?),
            ElementKind::Int => Value::Int(self.to_i32()?),
            ElementKind::Short => Value::Short(self.to_i16()?),
            ElementKind::Byte => Value::Byte(self.to_i8()?),
            ElementKind::Char => Value::Char(self.to_char()?),
            ElementKind::Boolean => Value::Boolean(self.to_bool()?),
            ElementKind::BigInteger => Value::BigInteger(self.to_big_integer()?),
            ElementKind::BigDecimal => Value::BigDecimal(self.to_big_decimal()?),
            ElementKind::Date => Value::Date(self.to_date()?),
            ElementKind::String => Value::String(self.to_text()),
            ElementKind::Object => self.clone(),
        })
    }

    /// Whether this is the default value of its own kind.
    pub fn is_default(&self) -> bool {
        *self == self.kind().default_value()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Double(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Short(v) => write!(f, "{}", v),
            Value::Byte(v) => write!(f, "{}", v),
            Value::Char(c) => write!(f, "{}", c),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::BigInteger(v) => write!(f, "{}", v),
            Value::BigDecimal(v) => write!(f, "{}", v),
            Value::Date(d) => write!(f, "{}", d.to_rfc3339()),
            Value::String(s) => f.write_str(s),
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

value_from! {
    f64 => Double,
    f32 => Float,
    i64 => Long,
    i32 => Int,
    i16 => Short,
    i8 => Byte,
    char => Char,
    bool => Boolean,
    BigInt => BigInteger,
    BigDecimal => BigDecimal,
    DateTime<Utc> => Date,
    String => String,
}

impl From<i128> for Value {
    fn from(v: i128) -> Self {
        Value::BigInteger(BigInt::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

/// A type that can be stored natively in a container.
///
/// One generic storage implementation serves every element type; the
/// kind-specific behaviour lives entirely in this trait.
pub trait Element: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Kind reported by containers of this element type.
    const KIND: ElementKind;

    /// The value unset cells read as.
    fn default_value() -> Self;

    /// Wrap into a dynamic [`Value`].
    fn to_value(&self) -> Value;

    /// Convert a dynamic value into this element type.
    fn from_value(value: &Value) -> GridResult<Self>;

    /// Whether this is the default value.
    fn is_default(&self) -> bool {
        *self == Self::default_value()
    }

    /// Reinterpret a buffer of this element type as `f64`s, when it is one.
    fn as_f64_slice(_slice: &[Self]) -> Option<&[f64]> {
        None
    }
}

macro_rules! element_impl {
    ($ty:ty, $kind:ident, $default:expr, $conv:ident) => {
        impl Element for $ty {
            const KIND: ElementKind = ElementKind::$kind;

            fn default_value() -> Self {
                $default
            }

            fn to_value(&self) -> Value {
                Value::$kind(self.clone())
            }

            fn from_value(value: &Value) -> GridResult<Self> {
                value.$conv()
            }
        }
    };
}

element_impl!(f32, Float, 0.0, to_f32);
element_impl!(i64, Long, 0, to_i64);
element_impl!(i32, Int, 0, to_i32);
element_impl!(i16, Short, 0, to_i16);
element_impl!(i8, Byte, 0, to_i8);
element_impl!(char, Char, '\0', to_char);
element_impl!(bool, Boolean, false, to_bool);
element_impl!(BigInt, BigInteger, BigInt::zero(), to_big_integer);
element_impl!(BigDecimal, BigDecimal, BigDecimal::zero(), to_big_decimal);
element_impl!(DateTime<Utc>, Date, DateTime::<Utc>::default(), to_date);

impl Element for f64 {
    const KIND: ElementKind = ElementKind::Double;

    fn default_value() -> Self {
        0.0
    }

    fn to_value(&self) -> Value {
        Value::Double(*self)
    }

    fn from_value(value: &Value) -> GridResult<Self> {
        value.to_f64()
    }

    fn as_f64_slice(slice: &[Self]) -> Option<&[f64]> {
        Some(slice)
    }
}

impl Element for String {
    const KIND: ElementKind = ElementKind::String;

    fn default_value() -> Self {
        String::new()
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_value(value: &Value) -> GridResult<Self> {
        Ok(value.to_text())
    }
}

impl Element for Value {
    const KIND: ElementKind = ElementKind::Object;

    fn default_value() -> Self {
        Value::Null
    }

    fn to_value(&self) -> Value {
        self.clone()
    }

    fn from_value(value: &Value) -> GridResult<Self> {
        Ok(value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widening_always_succeeds() {
        assert_eq!(Value::Byte(-3).to_i64().unwrap(), -3);
        assert_eq!(Value::Int(5).to_f64().unwrap(), 5.0);
        assert_eq!(Value::Boolean(true).to_f64().unwrap(), 1.0);
        assert_eq!(Value::Char('A').to_i32().unwrap(), 65);
        assert_eq!(Value::Long(i64::MAX).to_i128().unwrap(), i64::MAX as i128);
        assert_eq!(Value::Long(i64::MIN).to_big_integer().unwrap(), BigInt::from(i64::MIN));
    }

    #[test]
    fn test_narrowing_is_explicit_cast() {
        assert_eq!(Value::Double(-2.7).to_i32().unwrap(), -2);
        assert_eq!(Value::Int(300).to_i8().unwrap(), 300i32 as i8);
        assert_eq!(Value::Double(1.5).to_f32().unwrap(), 1.5f32);
    }

    #[test]
    fn test_unconvertible_values_fail() {
        let err = Value::String("abc".into()).to_f64().unwrap_err();
        assert!(matches!(
            err,
            GridError::TypeConversion {
                from: ElementKind::String,
                to: ElementKind::Double,
                ..
            }
        ));
        assert!(Value::Date(DateTime::<Utc>::default()).to_bool().is_err());
        assert!(Value::String("ab".into()).to_char().is_err());
        assert!(Value::Long(-1).to_char().is_err());
    }

    #[test]
    fn test_numeric_strings_convert() {
        assert_eq!(Value::from("2.5").to_f64().unwrap(), 2.5);
        assert_eq!(Value::from(" 42 ").to_i64().unwrap(), 42);
        assert!(Value::from("TRUE").to_bool().unwrap());
    }

    #[test]
    fn test_date_roundtrip_through_millis() {
        let date = Value::Long(86_400_000).to_date().unwrap();
        assert_eq!(date.timestamp_millis(), 86_400_000);
        assert_eq!(Value::Date(date).to_i64().unwrap(), 86_400_000);
        let parsed = Value::from("1970-01-02T00:00:00Z").to_date().unwrap();
        assert_eq!(parsed, date);
    }

    #[test]
    fn test_defaults() {
        for kind in ElementKind::ALL {
            let default = kind.default_value();
            assert!(default.is_default(), "{kind}");
            assert_eq!(default.convert(kind).unwrap(), default, "{kind}");
        }
        assert!(f64::default_value().is_default());
        assert!(!1.0f64.is_default());
        assert_eq!(Value::default_value(), Value::Null);
    }

    #[test]
    fn test_big_integer_is_unbounded() {
        let huge: BigInt = "123456789012345678901234567890123456789012".parse().unwrap();
        let v = Value::BigInteger(huge.clone());
        assert_eq!(v.convert(ElementKind::String).unwrap(), Value::from(huge.to_string()));
        assert_eq!(Value::from(huge.to_string()).to_big_integer().unwrap(), huge);
        assert!(v.to_i64().is_err());
        assert!(v.to_bool().unwrap());
        assert!(v.to_f64().unwrap() > 1e41);

        let doubled = BigInt::from(i128::MAX) * 2;
        assert_eq!(Value::from(i128::MAX).to_big_integer().unwrap() * 2, doubled);
        assert_eq!(Value::Double(-7.9).to_big_integer().unwrap(), BigInt::from(-7));
        assert!(Value::Double(f64::NAN).to_big_integer().is_err());
    }

    #[test]
    fn test_big_decimal_keeps_digits() {
        let text = "3.14159265358979323846264338327950288";
        let d: BigDecimal = text.parse().unwrap();
        let v = Value::from(text).convert(ElementKind::BigDecimal).unwrap();
        assert_eq!(v, Value::BigDecimal(d.clone()));
        assert_eq!(v.to_text().parse::<BigDecimal>().unwrap(), d);

        assert_eq!(v.to_big_integer().unwrap(), BigInt::from(3));
        assert_eq!(v.to_i32().unwrap(), 3);
        assert_eq!(
            Value::BigDecimal("-2.5".parse().unwrap()).to_big_integer().unwrap(),
            BigInt::from(-2)
        );
        assert_eq!(Value::Double(0.5).to_big_decimal().unwrap(), "0.5".parse::<BigDecimal>().unwrap());
        assert_eq!(Value::Int(12).to_big_decimal().unwrap(), BigDecimal::from(12));
        assert!(Value::Double(f64::INFINITY).to_big_decimal().is_err());
        assert!(Value::from("pi").to_big_decimal().is_err());

        // zero at any scale is the default
        assert!(Value::BigDecimal("0.000".parse().unwrap()).is_default());
    }

    #[test]
    fn test_element_conversions() {
        assert_eq!(i32::from_value(&Value::Double(9.99)).unwrap(), 9);
        assert_eq!(String::from_value(&Value::Int(12)).unwrap(), "12");
        assert_eq!(bool::KIND, ElementKind::Boolean);
        assert!(f64::as_f64_slice(&[1.0, 2.0]).is_some());
        assert!(i32::as_f64_slice(&[1, 2]).is_none());
    }
}
