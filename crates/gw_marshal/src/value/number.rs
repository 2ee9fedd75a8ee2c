use core::fmt;
use core::str::FromStr;

use serde_core::{Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::MarshallError;
use crate::value::json_kind;

// -----------------------------------------------------------------------------
// Number

macro_rules! define_number {
    (
        ints: [$($int_variant:ident($int:ident) => $int_ser:ident,)*]
        floats: [$($float_variant:ident($float:ident) => $float_ser:ident,)*]
    ) => {
        /// A numeric value tagged with its declared type.
        ///
        /// The tag is what a boxed number carries as its `encoded-type`
        /// on the wire, e.g. `{"encoded-type":"i32","numeric-value":5}`.
        #[derive(Clone, Copy, Debug, PartialEq)]
        pub enum Number {
            $(
                #[doc = concat!("A `", stringify!($int), "`.")]
                $int_variant($int),
            )*
            $(
                #[doc = concat!("A `", stringify!($float), "`.")]
                $float_variant($float),
            )*
        }

        impl Number {
            /// Every numeric type name this enum can carry.
            pub const TYPE_NAMES: &'static [&'static str] = &[
                $(stringify!($int),)*
                $(stringify!($float),)*
            ];

            /// Returns the declared type name, which is also the name its
            /// marshaller is registered under.
            pub const fn type_name(&self) -> &'static str {
                match self {
                    $(Self::$int_variant(_) => stringify!($int),)*
                    $(Self::$float_variant(_) => stringify!($float),)*
                }
            }

            /// Reads a number of the named type from a wire value.
            ///
            /// Both JSON numbers and numeric strings are accepted; the latter
            /// carries values such as `"NaN"` that JSON cannot express.
            ///
            /// # Examples
            ///
            /// ```
            /// use gw_marshal::value::Number;
            /// use serde_json::json;
            ///
            /// assert_eq!(Number::from_wire("u8", &json!(7)).unwrap(), Number::U8(7));
            /// assert_eq!(Number::from_wire("i64", &json!("-12")).unwrap(), Number::I64(-12));
            /// assert!(Number::from_wire("u8", &json!(300)).is_err());
            /// ```
            pub fn from_wire(type_name: &str, wire: &JsonValue) -> Result<Self, MarshallError> {
                match type_name {
                    $(stringify!($int) => parse_int::<$int>(type_name, wire).map(Self::$int_variant),)*
                    $(stringify!($float) => parse_float(type_name, wire).map(|v| Self::$float_variant(v as $float)),)*
                    other => Err(MarshallError::MissingMarshaller {
                        type_name: other.to_owned(),
                    }),
                }
            }

            /// Converts to the named numeric type, checking the range of
            /// integer targets.
            ///
            /// # Examples
            ///
            /// ```
            /// use gw_marshal::value::Number;
            ///
            /// assert_eq!(Number::I64(9).convert_to("u8").unwrap(), Number::U8(9));
            /// assert!(Number::I64(-9).convert_to("u8").is_err());
            /// ```
            pub fn convert_to(self, type_name: &str) -> Result<Self, MarshallError> {
                match type_name {
                    $(stringify!($int) => <$int>::try_from(self).map(Self::$int_variant),)*
                    $(stringify!($float) => Ok(Self::$float_variant(<$float>::from(self))),)*
                    other => Err(MarshallError::MissingMarshaller {
                        type_name: other.to_owned(),
                    }),
                }
            }

            fn as_i128(&self) -> Option<i128> {
                match *self {
                    $(Self::$int_variant(v) => Some(v as i128),)*
                    $(Self::$float_variant(v) => {
                        let v = v as f64;
                        (v.fract() == 0.0 && v.is_finite() && v.abs() < 1e38).then_some(v as i128)
                    })*
                }
            }

            /// Returns the value widened to `f64`.
            pub fn as_f64(&self) -> f64 {
                match *self {
                    $(Self::$int_variant(v) => v as f64,)*
                    $(Self::$float_variant(v) => v as f64,)*
                }
            }
        }

        impl Serialize for Number {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                match *self {
                    $(Self::$int_variant(v) => serializer.$int_ser(v),)*
                    $(Self::$float_variant(v) => {
                        if v.is_finite() {
                            serializer.$float_ser(v)
                        } else {
                            serializer.collect_str(&v)
                        }
                    })*
                }
            }
        }

        $(
            impl TryFrom<Number> for $int {
                type Error = MarshallError;

                fn try_from(value: Number) -> Result<Self, Self::Error> {
                    value
                        .as_i128()
                        .and_then(|v| <$int>::try_from(v).ok())
                        .ok_or_else(|| MarshallError::conversion(stringify!($int), value.to_string()))
                }
            }

            impl From<$int> for Number {
                #[inline]
                fn from(value: $int) -> Self {
                    Self::$int_variant(value)
                }
            }
        )*

        $(
            impl From<Number> for $float {
                #[inline]
                fn from(value: Number) -> Self {
                    value.as_f64() as $float
                }
            }

            impl From<$float> for Number {
                #[inline]
                fn from(value: $float) -> Self {
                    Self::$float_variant(value)
                }
            }
        )*

        impl fmt::Display for Number {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(Self::$int_variant(v) => write!(f, "{v}_{}", stringify!($int)),)*
                    $(Self::$float_variant(v) => write!(f, "{v}_{}", stringify!($float)),)*
                }
            }
        }
    };
}

define_number! {
    ints: [
        I8(i8) => serialize_i8,
        I16(i16) => serialize_i16,
        I32(i32) => serialize_i32,
        I64(i64) => serialize_i64,
        U8(u8) => serialize_u8,
        U16(u16) => serialize_u16,
        U32(u32) => serialize_u32,
        U64(u64) => serialize_u64,
    ]
    floats: [
        F32(f32) => serialize_f32,
        F64(f64) => serialize_f64,
    ]
}

impl Number {
    /// Reads an untyped JSON number, preferring `i64`, then `u64`, then `f64`.
    pub fn from_json(number: &serde_json::Number) -> Self {
        if let Some(v) = number.as_i64() {
            Self::I64(v)
        } else if let Some(v) = number.as_u64() {
            Self::U64(v)
        } else {
            Self::F64(number.as_f64().unwrap_or(f64::NAN))
        }
    }

    /// Returns `true` if `type_name` names a numeric type.
    #[inline]
    pub fn is_numeric_type(type_name: &str) -> bool {
        Self::TYPE_NAMES.contains(&type_name)
    }
}

fn parse_int<T>(type_name: &str, wire: &JsonValue) -> Result<T, MarshallError>
where
    T: TryFrom<i64> + TryFrom<u64> + FromStr,
{
    let parsed = match wire {
        JsonValue::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(v), _) => T::try_from(v).ok(),
            (None, Some(v)) => T::try_from(v).ok(),
            (None, None) => None,
        },
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| MarshallError::conversion(type_name, describe(wire)))
}

fn parse_float(type_name: &str, wire: &JsonValue) -> Result<f64, MarshallError> {
    let parsed = match wire {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| MarshallError::conversion(type_name, describe(wire)))
}

fn describe(wire: &JsonValue) -> String {
    match wire {
        JsonValue::Number(n) => format!("number {n}"),
        JsonValue::String(s) => format!("string {s:?}"),
        other => json_kind(other).to_owned(),
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::Number;

    #[test]
    fn from_wire_checks_range() {
        assert_eq!(Number::from_wire("i8", &json!(-128)).unwrap(), Number::I8(-128));
        assert!(Number::from_wire("i8", &json!(128)).is_err());
        assert!(Number::from_wire("u32", &json!(-1)).is_err());
        assert_eq!(
            Number::from_wire("u64", &json!(u64::MAX)).unwrap(),
            Number::U64(u64::MAX)
        );
    }

    #[test]
    fn from_wire_accepts_strings() {
        assert_eq!(Number::from_wire("i32", &json!(" 42 ")).unwrap(), Number::I32(42));
        assert_eq!(Number::from_wire("f64", &json!("1.5")).unwrap(), Number::F64(1.5));
        match Number::from_wire("f64", &json!("NaN")).unwrap() {
            Number::F64(v) => assert!(v.is_nan()),
            other => panic!("unexpected {other:?}"),
        }
        assert!(Number::from_wire("i32", &json!("abc")).is_err());
        assert!(Number::from_wire("i32", &json!(true)).is_err());
    }

    #[test]
    fn from_wire_rejects_unknown_type() {
        assert!(Number::from_wire("Point", &json!(1)).is_err());
    }

    #[test]
    fn non_finite_floats_serialize_as_strings() {
        assert_eq!(serde_json::to_string(&Number::F64(f64::INFINITY)).unwrap(), "\"inf\"");
        assert_eq!(serde_json::to_string(&Number::F32(2.5)).unwrap(), "2.5");
        assert_eq!(serde_json::to_string(&Number::I16(-3)).unwrap(), "-3");
    }

    #[test]
    fn integer_conversion_is_lossless() {
        assert_eq!(i32::try_from(Number::I64(7)).unwrap(), 7);
        assert_eq!(u8::try_from(Number::F64(3.0)).unwrap(), 3);
        assert!(u8::try_from(Number::F64(3.5)).is_err());
        assert!(i8::try_from(Number::U64(1000)).is_err());
        assert_eq!(f32::from(Number::I32(2)), 2.0);
    }

    #[test]
    fn untyped_json_numbers() {
        let n: serde_json::Number = serde_json::from_str("12").unwrap();
        assert_eq!(Number::from_json(&n), Number::I64(12));
        let n: serde_json::Number = serde_json::from_str("1.25").unwrap();
        assert_eq!(Number::from_json(&n), Number::F64(1.25));
        assert!(Number::is_numeric_type("u16"));
        assert!(!Number::is_numeric_type("String"));
    }
}
