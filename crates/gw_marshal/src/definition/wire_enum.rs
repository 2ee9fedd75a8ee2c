/// Makes a unit-only Rust enum marshallable as an enum constant.
///
/// Generates [`IntoValue`], [`FromValue`] and [`GetMappingDefinition`] for
/// the enum. The wire name of each constant is the variant name.
///
/// # Examples
///
/// ```
/// use gw_marshal::impl_wire_enum;
/// use gw_marshal::value::{FromValue, IntoValue, Value};
///
/// #[derive(Clone, Copy, Debug, PartialEq)]
/// enum Color { Red, Green }
///
/// impl_wire_enum!(Color = "Color" { Red, Green });
///
/// let value = Color::Green.into_value();
/// assert!(matches!(&value, Value::Enum(c) if c.name() == "Green"));
/// assert_eq!(Color::from_value(value).unwrap(), Color::Green);
/// ```
///
/// [`IntoValue`]: crate::value::IntoValue
/// [`FromValue`]: crate::value::FromValue
/// [`GetMappingDefinition`]: crate::definition::GetMappingDefinition
#[macro_export]
macro_rules! impl_wire_enum {
    ($ty:ty = $type_name:literal { $($variant:ident),+ $(,)? }) => {
        impl $crate::value::IntoValue for $ty {
            fn into_value(self) -> $crate::value::Value {
                let name = match self {
                    $(Self::$variant => stringify!($variant),)+
                };
                $crate::value::Value::Enum($crate::value::EnumConstant::new($type_name, name))
            }
        }

        impl $crate::value::FromValue for $ty {
            fn from_value(value: $crate::value::Value) -> Result<Self, $crate::MarshallError> {
                let name = match &value {
                    $crate::value::Value::Enum(c) if c.type_name() == $type_name => c.name(),
                    // Untyped payloads carry a bare constant name.
                    $crate::value::Value::String(s) => s.as_str(),
                    other => {
                        return Err($crate::MarshallError::Conversion {
                            expected: $type_name.into(),
                            found: other.kind().into(),
                        });
                    }
                };
                match name {
                    $(stringify!($variant) => Ok(Self::$variant),)+
                    other => Err($crate::MarshallError::UnknownEnumConstant {
                        type_name: $type_name.into(),
                        name: other.into(),
                    }),
                }
            }
        }

        impl $crate::definition::GetMappingDefinition for $ty {
            const TYPE_NAME: &'static str = $type_name;

            fn mapping_definition(
            ) -> Result<$crate::definition::MappingDefinition, $crate::MarshallError> {
                Ok($crate::definition::MappingDefinition::enumeration(
                    $type_name,
                    [$(stringify!($variant)),+],
                ))
            }
        }
    };
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use crate::MarshallError;
    use crate::definition::GetMappingDefinition;
    use crate::value::{EnumConstant, FromValue, IntoValue, Value};

    #[derive(Clone, Copy, Debug, PartialEq)]
    enum Level {
        Low,
        High,
    }

    crate::impl_wire_enum!(Level = "Level" { Low, High });

    #[test]
    fn constants_round_trip() {
        assert_eq!(
            Level::High.into_value(),
            Value::Enum(EnumConstant::new("Level", "High"))
        );
        assert_eq!(Level::from_value(Level::Low.into_value()).unwrap(), Level::Low);
        assert_eq!(Level::from_value(Value::String("High".into())).unwrap(), Level::High);
    }

    #[test]
    fn unknown_constants_fail() {
        let err = Level::from_value(Value::Enum(EnumConstant::new("Level", "Mid"))).unwrap_err();
        assert!(matches!(err, MarshallError::UnknownEnumConstant { .. }));

        let err = Level::from_value(Value::Enum(EnumConstant::new("Other", "Low"))).unwrap_err();
        assert!(matches!(err, MarshallError::Conversion { .. }));
    }

    #[test]
    fn definition_lists_constants() {
        let def = Level::mapping_definition().unwrap();
        assert_eq!(def.type_name(), Level::TYPE_NAME);
        assert!(def.has_constant("Low") && def.has_constant("High"));
    }
}
