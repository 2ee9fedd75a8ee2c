use core::any::{Any, TypeId};
use core::marker::PhantomData;
use std::borrow::Cow;
use std::sync::Arc;

use gw_utils::hash::{FixedHashState, HashSet};

use super::mapping::{Construct, Getter, NoArg, Setter};
use super::{Arguments, BindingKind, InstantiationMapping, InstantiationStrategy};
use super::{Mapping, MappingDefinition, MemberMapping};
use crate::MarshallError;
use crate::marshallers::RESERVED_KEYS;
use crate::value::{FromValue, IntoValue, ObjectRef};

// -----------------------------------------------------------------------------
// DefinitionBuilder

/// Builds the [`MappingDefinition`] of an object type `T`.
///
/// Members are bound with typed closures. The closures run under the
/// instance's lock, so they must not touch other objects' locks.
///
/// # Examples
///
/// ```
/// use gw_marshal::definition::DefinitionBuilder;
///
/// struct Account { id: u64, owner: String, note: Option<String> }
///
/// impl Account {
///     fn note(&self) -> Option<String> { self.note.clone() }
///     fn set_note(&mut self, note: Option<String>) { self.note = note; }
/// }
///
/// let definition = DefinitionBuilder::<Account>::new("Account")
///     .constructor(&[("id", "u64"), ("owner", "String")], |args| {
///         Ok(Account { id: args.next()?, owner: args.next()?, note: None })
///     })
///     .read_only_field("id", "u64", |a| a.id)
///     .read_only_field("owner", "String", |a| a.owner.clone())
///     .accessor("note", "String", Account::note, Account::set_note)
///     .build()
///     .unwrap();
///
/// assert_eq!(definition.readable().len(), 3);
/// assert_eq!(definition.writable().len(), 1);
/// ```
pub struct DefinitionBuilder<T> {
    type_name: Cow<'static, str>,
    instantiation: Option<InstantiationStrategy>,
    params: Vec<Mapping>,
    no_arg: Option<NoArg>,
    readable: Vec<MemberMapping>,
    writable: Vec<MemberMapping>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> DefinitionBuilder<T> {
    /// Starts a definition registered under `type_name`.
    pub fn new(type_name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            type_name: type_name.into(),
            instantiation: None,
            params: Vec::new(),
            no_arg: None,
            readable: Vec::new(),
            writable: Vec::new(),
            _marker: PhantomData,
        }
    }

    fn instantiation_mapping<F>(&mut self, params: &[(&'static str, &'static str)], f: F) -> InstantiationMapping
    where
        F: Fn(&mut Arguments) -> Result<T, MarshallError> + Send + Sync + 'static,
    {
        self.params = params.iter().map(|&(k, t)| Mapping::new(k, t)).collect();
        let construct: Construct = Arc::new(move |mut args: Arguments| f(&mut args).map(ObjectRef::new));
        InstantiationMapping::new(self.params.clone().into_boxed_slice(), construct)
    }

    /// Instantiates full objects through a constructor.
    ///
    /// `params` lists `(wire key, declared type)` pairs in call order; the
    /// closure takes them from [`Arguments`] in the same order.
    pub fn constructor<F>(mut self, params: &[(&'static str, &'static str)], f: F) -> Self
    where
        F: Fn(&mut Arguments) -> Result<T, MarshallError> + Send + Sync + 'static,
    {
        let mapping = self.instantiation_mapping(params, f);
        self.instantiation = Some(InstantiationStrategy::Constructor(mapping));
        self
    }

    /// Instantiates full objects through a named factory function.
    pub fn factory<F>(
        mut self,
        method: &'static str,
        params: &[(&'static str, &'static str)],
        f: F,
    ) -> Self
    where
        F: Fn(&mut Arguments) -> Result<T, MarshallError> + Send + Sync + 'static,
    {
        let mapping = self.instantiation_mapping(params, f);
        self.instantiation = Some(InstantiationStrategy::Factory {
            method: Cow::Borrowed(method),
            mapping,
        });
        self
    }

    /// Sets the no-argument strategy.
    ///
    /// Used for `instantiate-only` payloads, and for full objects when no
    /// constructor or factory is set.
    pub fn no_arg(mut self, f: impl Fn() -> T + Send + Sync + 'static) -> Self {
        self.no_arg = Some(Arc::new(move || ObjectRef::new(f())));
        self
    }

    /// Uses [`Default`] as the no-argument strategy.
    pub fn default_instance(self) -> Self
    where
        T: Default,
    {
        self.no_arg(T::default)
    }

    fn member(
        &mut self,
        key: &'static str,
        type_name: &'static str,
        kind: BindingKind,
        getter: Option<Getter>,
        setter: Option<Setter>,
    ) {
        let member = MemberMapping::new(
            Mapping::new(key, type_name),
            self.type_name.clone(),
            kind,
            getter,
            setter,
        );
        if member.is_readable() {
            self.readable.push(member.clone());
        }
        if member.is_writable() {
            self.writable.push(member);
        }
    }

    /// Binds a field that is both encoded and decoded.
    pub fn field<V, G, S>(mut self, key: &'static str, type_name: &'static str, get: G, set: S) -> Self
    where
        V: IntoValue + FromValue,
        G: Fn(&T) -> V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.member(key, type_name, BindingKind::Field, Some(getter(get)), Some(setter(set)));
        self
    }

    /// Binds a field that is only encoded.
    ///
    /// Typical for fields that are set through the constructor.
    pub fn read_only_field<V, G>(mut self, key: &'static str, type_name: &'static str, get: G) -> Self
    where
        V: IntoValue,
        G: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.member(key, type_name, BindingKind::Field, Some(getter(get)), None);
        self
    }

    /// Binds an accessor and mutator pair.
    pub fn accessor<V, G, S>(mut self, key: &'static str, type_name: &'static str, get: G, set: S) -> Self
    where
        V: IntoValue + FromValue,
        G: Fn(&T) -> V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.member(key, type_name, BindingKind::Accessor, Some(getter(get)), Some(setter(set)));
        self
    }

    /// Binds an accessor that is only encoded.
    pub fn getter<V, G>(mut self, key: &'static str, type_name: &'static str, get: G) -> Self
    where
        V: IntoValue,
        G: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.member(key, type_name, BindingKind::Accessor, Some(getter(get)), None);
        self
    }

    /// Binds a mutator that is only decoded.
    pub fn setter<V, S>(mut self, key: &'static str, type_name: &'static str, set: S) -> Self
    where
        V: FromValue,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.member(key, type_name, BindingKind::Accessor, None, Some(setter(set)));
        self
    }

    /// Validates and finishes the definition.
    ///
    /// Fails if a wire key is reserved, or is used twice within the
    /// parameters, the readable members or the writable members.
    pub fn build(self) -> Result<MappingDefinition, MarshallError> {
        let invalid = |reason: String| MarshallError::InvalidDefinition {
            type_name: self.type_name.to_string(),
            reason,
        };

        let groups: [(&str, Vec<&str>); 3] = [
            ("parameter", self.params.iter().map(Mapping::key).collect()),
            ("readable member", self.readable.iter().map(MemberMapping::key).collect()),
            ("writable member", self.writable.iter().map(MemberMapping::key).collect()),
        ];
        for (what, keys) in groups {
            let mut seen = HashSet::with_hasher(FixedHashState);
            for key in keys {
                if RESERVED_KEYS.contains(&key) {
                    return Err(invalid(format!("{what} key `{key}` is reserved")));
                }
                if !seen.insert(key) {
                    return Err(invalid(format!("duplicate {what} key `{key}`")));
                }
            }
        }

        Ok(MappingDefinition {
            type_name: self.type_name.clone(),
            type_id: Some(TypeId::of::<T>()),
            instantiation: self.instantiation,
            no_arg: self.no_arg,
            readable: self.readable.into_boxed_slice(),
            writable: self.writable.into_boxed_slice(),
            enum_constants: None,
        })
    }
}

fn getter<T, V, G>(get: G) -> Getter
where
    T: Any,
    V: IntoValue,
    G: Fn(&T) -> V + Send + Sync + 'static,
{
    Arc::new(move |instance: &ObjectRef| {
        instance
            .read(|t: &T| get(t).into_value())
            .ok_or_else(|| MarshallError::conversion(core::any::type_name::<T>(), instance.rust_type()))
    })
}

fn setter<T, V, S>(set: S) -> Setter
where
    T: Any,
    V: FromValue,
    S: Fn(&mut T, V) + Send + Sync + 'static,
{
    Arc::new(move |instance: &ObjectRef, value| {
        // Convert before locking: conversion never needs the instance.
        let value = V::from_value(value)?;
        instance
            .write(|t: &mut T| set(t, value))
            .ok_or_else(|| MarshallError::conversion(core::any::type_name::<T>(), instance.rust_type()))
    })
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::DefinitionBuilder;
    use crate::MarshallError;
    use crate::value::{Number, ObjectRef, Value};

    #[derive(Default)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn fields_bind_both_ways() {
        let def = DefinitionBuilder::<Point>::new("Point")
            .default_instance()
            .field("x", "i32", |p| p.x, |p, v| p.x = v)
            .field("y", "i32", |p| p.y, |p, v| p.y = v)
            .build()
            .unwrap();

        let obj = def.instantiate_default().unwrap();
        def.writable()[0].set(&obj, Value::Number(Number::I64(3))).unwrap();
        assert_eq!(def.readable()[0].get(&obj).unwrap(), Value::Number(Number::I32(3)));
        assert_eq!(def.readable()[1].get(&obj).unwrap(), Value::Number(Number::I32(0)));
    }

    #[test]
    fn wrong_instance_type_is_reported() {
        let def = DefinitionBuilder::<Point>::new("Point")
            .field("x", "i32", |p| p.x, |p, v| p.x = v)
            .build()
            .unwrap();

        let other = ObjectRef::new(String::new());
        let err = def.readable()[0].get(&other).unwrap_err();
        assert!(matches!(err, MarshallError::MemberAccess { .. }));
        assert!(matches!(err.root_cause(), MarshallError::Conversion { .. }));
    }

    #[test]
    fn reserved_and_duplicate_keys_are_rejected() {
        let reserved = DefinitionBuilder::<Point>::new("Point")
            .field("object-id", "i32", |p| p.x, |p, v| p.x = v)
            .build();
        assert!(matches!(reserved, Err(MarshallError::InvalidDefinition { .. })));

        let duplicate = DefinitionBuilder::<Point>::new("Point")
            .read_only_field("x", "i32", |p| p.x)
            .read_only_field("x", "i32", |p| p.y)
            .build();
        assert!(matches!(duplicate, Err(MarshallError::InvalidDefinition { .. })));

        // The same key may be both a parameter and a member.
        let shared_key = DefinitionBuilder::<Point>::new("Point")
            .constructor(&[("x", "i32")], |args| Ok(Point { x: args.next()?, y: 0 }))
            .read_only_field("x", "i32", |p| p.x)
            .build();
        assert!(shared_key.is_ok());
    }

    #[test]
    fn constructor_arguments_are_checked() {
        let def = DefinitionBuilder::<Point>::new("Point")
            .constructor(&[("x", "i32"), ("y", "i32")], |args| {
                Ok(Point {
                    x: args.next()?,
                    y: args.next()?,
                })
            })
            .build()
            .unwrap();

        let mapping = def.instantiation().unwrap().mapping();
        assert_eq!(mapping.params().len(), 2);

        let args = super::Arguments::new(
            "Point",
            vec![("x".into(), Value::Number(Number::I32(1)))],
        );
        let err = mapping.invoke(args).err().unwrap();
        assert!(matches!(err, MarshallError::Instantiation { .. }));
    }
}
