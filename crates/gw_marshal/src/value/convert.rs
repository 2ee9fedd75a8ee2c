use core::any::Any;

use crate::MarshallError;
use crate::value::{EnumConstant, Number, ObjectRef, Shared, Value};

// -----------------------------------------------------------------------------
// Traits

/// Converts a typed Rust value into a [`Value`].
///
/// Member getters and factory arguments go through this trait.
pub trait IntoValue {
    /// Performs the conversion.
    fn into_value(self) -> Value;
}

/// Converts a [`Value`] back into a typed Rust value.
///
/// Conversion is checked: integers must fit the target type and objects
/// must wrap the expected Rust type.
///
/// # Examples
///
/// ```
/// use gw_marshal::value::{FromValue, Number, Value};
///
/// assert_eq!(i16::from_value(Value::Number(Number::I64(-4))).unwrap(), -4);
/// assert!(u8::from_value(Value::Number(Number::I64(-4))).is_err());
/// assert_eq!(Option::<u8>::from_value(Value::Null).unwrap(), None);
/// ```
pub trait FromValue: Sized {
    /// Performs the conversion.
    fn from_value(value: Value) -> Result<Self, MarshallError>;
}

#[inline]
fn mismatch<T>(expected: &str, found: &Value) -> Result<T, MarshallError> {
    Err(MarshallError::conversion(expected, found.kind()))
}

// -----------------------------------------------------------------------------
// Numbers

macro_rules! impl_int {
    ($($ty:ident),*) => {$(
        impl IntoValue for $ty {
            #[inline]
            fn into_value(self) -> Value {
                Value::Number(Number::from(self))
            }
        }

        impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self, MarshallError> {
                match value {
                    Value::Number(n) => <$ty>::try_from(n),
                    other => mismatch(stringify!($ty), &other),
                }
            }
        }
    )*};
}

macro_rules! impl_float {
    ($($ty:ident),*) => {$(
        impl IntoValue for $ty {
            #[inline]
            fn into_value(self) -> Value {
                Value::Number(Number::from(self))
            }
        }

        impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self, MarshallError> {
                match value {
                    Value::Number(n) => Ok(<$ty>::from(n)),
                    other => mismatch(stringify!($ty), &other),
                }
            }
        }
    )*};
}

impl_int!(i8, i16, i32, i64, u8, u16, u32, u64);
impl_float!(f32, f64);

// -----------------------------------------------------------------------------
// Scalars

impl IntoValue for bool {
    #[inline]
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, MarshallError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => mismatch("bool", &other),
        }
    }
}

impl IntoValue for char {
    #[inline]
    fn into_value(self) -> Value {
        Value::Char(self)
    }
}

impl FromValue for char {
    fn from_value(value: Value) -> Result<Self, MarshallError> {
        match value {
            Value::Char(c) => Ok(c),
            // Untyped decoding has no char kind of its own.
            Value::String(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(c),
                    _ => Err(MarshallError::conversion("char", format!("string {s:?}"))),
                }
            }
            other => mismatch("char", &other),
        }
    }
}

impl IntoValue for String {
    #[inline]
    fn into_value(self) -> Value {
        Value::String(self)
    }
}

impl IntoValue for &str {
    #[inline]
    fn into_value(self) -> Value {
        Value::String(self.to_owned())
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, MarshallError> {
        match value {
            Value::String(s) => Ok(s),
            Value::Char(c) => Ok(c.to_string()),
            other => mismatch("String", &other),
        }
    }
}

// -----------------------------------------------------------------------------
// Passthrough

impl IntoValue for Value {
    #[inline]
    fn into_value(self) -> Value {
        self
    }
}

impl FromValue for Value {
    #[inline]
    fn from_value(value: Value) -> Result<Self, MarshallError> {
        Ok(value)
    }
}

impl IntoValue for EnumConstant {
    #[inline]
    fn into_value(self) -> Value {
        Value::Enum(self)
    }
}

impl FromValue for EnumConstant {
    fn from_value(value: Value) -> Result<Self, MarshallError> {
        match value {
            Value::Enum(c) => Ok(c),
            other => mismatch("enum constant", &other),
        }
    }
}

impl IntoValue for ObjectRef {
    #[inline]
    fn into_value(self) -> Value {
        Value::Object(self)
    }
}

impl FromValue for ObjectRef {
    fn from_value(value: Value) -> Result<Self, MarshallError> {
        match value {
            Value::Object(o) => Ok(o),
            other => mismatch("object", &other),
        }
    }
}

// -----------------------------------------------------------------------------
// Containers

impl<T: IntoValue> IntoValue for Option<T> {
    #[inline]
    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Null,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, MarshallError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, MarshallError> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => mismatch("List", &other),
        }
    }
}

impl<T: Any + Send + Sync> IntoValue for Shared<T> {
    #[inline]
    fn into_value(self) -> Value {
        Value::Object(ObjectRef::from_shared(self))
    }
}

impl<T: Any + Send + Sync> FromValue for Shared<T> {
    fn from_value(value: Value) -> Result<Self, MarshallError> {
        match value {
            Value::Object(o) => o.downcast::<T>().ok_or_else(|| {
                MarshallError::conversion(core::any::type_name::<T>(), o.rust_type())
            }),
            other => mismatch(core::any::type_name::<T>(), &other),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
