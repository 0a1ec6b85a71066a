//! Scalar values shared by filters, rows and statement parameters

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single scalar value
///
/// JSON deserialization is untagged: strings that parse as an RFC 3339
/// timestamp, a UUID or an IP address become the typed variant, every other
/// string stays `Text`. `Decimal` is never produced from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
    Ip(IpAddr),
    Text(String),
    Decimal(Decimal),
}

impl Value {
    /// Short type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Timestamp(_) => "timestamp",
            Self::Uuid(_) => "uuid",
            Self::Ip(_) => "ip",
            Self::Text(_) => "text",
            Self::Decimal(_) => "decimal",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
            Self::Uuid(u) => write!(f, "{}", u),
            Self::Ip(ip) => write!(f, "{}", ip),
            Self::Text(s) => write!(f, "{}", s),
            Self::Decimal(d) => write!(f, "{}", d),
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident as $conv:ty),+ $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(<$conv>::from(v))
                }
            }
        )+
    };
}

value_from! {
    bool => Bool as bool,
    i8 => Int as i64,
    i16 => Int as i64,
    i32 => Int as i64,
    i64 => Int as i64,
    u8 => Int as i64,
    u16 => Int as i64,
    u32 => Int as i64,
    f32 => Float as f64,
    f64 => Float as f64,
    String => Text as String,
    &str => Text as String,
    DateTime<Utc> => Timestamp as DateTime<Utc>,
    Decimal => Decimal as Decimal,
    Uuid => Uuid as Uuid,
    IpAddr => Ip as IpAddr,
    Ipv4Addr => Ip as IpAddr,
    Ipv6Addr => Ip as IpAddr,
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Conversion from a stored [`Value`] back into a record attribute
///
/// Conversions accept the forms storage engines degrade values into:
/// integers for booleans, text for timestamps, decimals, UUIDs and addresses.
pub trait FromValue: Sized {
    /// Type name reported when decoding fails
    const EXPECTED: &'static str;

    fn from_value(value: Value) -> Option<Self>;
}

impl FromValue for bool {
    const EXPECTED: &'static str = "bool";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(b),
            Value::Int(i) => Some(i != 0),
            _ => None,
        }
    }
}

impl FromValue for i64 {
    const EXPECTED: &'static str = "int";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(i),
            Value::Bool(b) => Some(i64::from(b)),
            _ => None,
        }
    }
}

macro_rules! narrow_int {
    ($($ty:ty),+) => {
        $(
            impl FromValue for $ty {
                const EXPECTED: &'static str = "int";

                fn from_value(value: Value) -> Option<Self> {
                    i64::from_value(value).and_then(|i| <$ty>::try_from(i).ok())
                }
            }
        )+
    };
}

narrow_int!(i8, i16, i32, u8, u16, u32, u64, usize);

impl FromValue for f64 {
    const EXPECTED: &'static str = "float";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Float(x) => Some(x),
            Value::Int(i) => Some(i as f64),
            _ => None,
        }
    }
}

impl FromValue for f32 {
    const EXPECTED: &'static str = "float";

    fn from_value(value: Value) -> Option<Self> {
        f64::from_value(value).map(|x| x as f32)
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "text";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Text(s) => Some(s),
            Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) => None,
            // Typed text that JSON decoding upgraded
            other => Some(other.to_string()),
        }
    }
}

impl FromValue for DateTime<Utc> {
    const EXPECTED: &'static str = "timestamp";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Timestamp(t) => Some(t),
            Value::Text(s) => parse_timestamp(&s),
            _ => None,
        }
    }
}

impl FromValue for Decimal {
    const EXPECTED: &'static str = "decimal";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Decimal(d) => Some(d),
            Value::Int(i) => Some(Decimal::from(i)),
            Value::Float(x) => Decimal::try_from(x).ok(),
            Value::Text(s) => Decimal::from_str(&s).ok(),
            _ => None,
        }
    }
}

impl FromValue for Uuid {
    const EXPECTED: &'static str = "uuid";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Uuid(u) => Some(u),
            Value::Text(s) => Uuid::parse_str(&s).ok(),
            _ => None,
        }
    }
}

impl FromValue for IpAddr {
    const EXPECTED: &'static str = "ip";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Ip(ip) => Some(ip),
            Value::Text(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl FromValue for Value {
    const EXPECTED: &'static str = "any";

    fn from_value(value: Value) -> Option<Self> {
        Some(value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// Parse the textual timestamp forms the supported engines return
///
/// Accepts RFC 3339 and zone-less `YYYY-MM-DD HH:MM:SS[.f]` (read as UTC).
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_json_untagged_decoding() {
        let values: Vec<Value> = serde_json::from_str(
            r#"[null, true, 23, 60.5, "Bob", "2009-11-10T23:00:00Z", "192.168.1.1",
                "67e55044-10b1-426f-9247-bb680e5fe0c8"]"#,
        )
        .unwrap();
        let types: Vec<&str> = values.iter().map(Value::type_name).collect();
        assert_eq!(
            types,
            vec!["null", "bool", "int", "float", "text", "timestamp", "ip", "uuid"]
        );
    }

    #[test]
    fn test_option_into_value() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::Text("x".into()));
    }

    #[test]
    fn test_lenient_decoding() {
        assert_eq!(bool::from_value(Value::Int(1)), Some(true));
        assert_eq!(f64::from_value(Value::Int(2)), Some(2.0));
        assert_eq!(i32::from_value(Value::Int(i64::MAX)), None);
        assert_eq!(
            Decimal::from_value(Value::Text("120.50".into())),
            Some(Decimal::new(12050, 2))
        );
        assert_eq!(
            IpAddr::from_value(Value::Text("10.0.0.1".into())),
            Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)))
        );
        assert_eq!(Option::<i64>::from_value(Value::Null), Some(None));
        assert_eq!(String::from_value(Value::Int(1)), None);
    }

    #[test]
    fn test_parse_timestamp_forms() {
        let expected = Utc.with_ymd_and_hms(2009, 11, 10, 23, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2009-11-10T23:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2009-11-10 23:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2009-11-10T23:00:00"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
