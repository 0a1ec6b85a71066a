//! Entity mapping
//!
//! A [`Mapping`] is the ordered field→column bijection of one entity type.
//! The [`Entity`] trait gives the default dump/load strategies access to a
//! record's attributes; the [`entity!`](crate::entity) macro generates it at
//! build time for plain structs.

mod mapper;

pub use mapper::{DumpFn, LoadFn, Mapper, MapperBuilder};

use std::collections::{BTreeMap, HashMap};

use crate::error::{Error, Result};
use crate::filter::{FromValue, Value};

/// Column name → value, as produced by a dump
pub type ColumnMap = BTreeMap<String, Value>;

/// Attribute access for records handled by the default dump/load
pub trait Entity {
    /// Attribute names in declaration order
    fn attributes() -> &'static [&'static str];

    /// Current value of an attribute
    fn get(&self, attribute: &str) -> Option<Value>;

    /// Overwrite an attribute from a stored value
    fn set(&mut self, attribute: &str, value: Value) -> Result<()>;
}

/// Decode `value` into `slot`, reporting the attribute name on failure
pub fn decode_into<T: FromValue>(slot: &mut T, attribute: &str, value: Value) -> Result<()> {
    let found = value.type_name();
    *slot = T::from_value(value).ok_or_else(|| Error::decode(attribute, T::EXPECTED, found))?;
    Ok(())
}

/// Implement [`Entity`] for a struct with named fields
///
/// Every listed field must be `Clone`, convertible into [`Value`] and
/// implement [`FromValue`].
///
/// ```
/// #[derive(Debug, Default, Clone, PartialEq)]
/// struct User {
///     name: String,
///     age: i32,
/// }
///
/// filtra::entity!(User { name, age });
///
/// use filtra::mapping::Entity;
/// assert_eq!(User::attributes(), &["name", "age"]);
/// ```
#[macro_export]
macro_rules! entity {
    ($ty:ty { $($field:ident),+ $(,)? }) => {
        impl $crate::mapping::Entity for $ty {
            fn attributes() -> &'static [&'static str] {
                &[$(stringify!($field)),+]
            }

            fn get(&self, attribute: &str) -> ::std::option::Option<$crate::filter::Value> {
                match attribute {
                    $(stringify!($field) => ::std::option::Option::Some(
                        $crate::filter::Value::from(::std::clone::Clone::clone(&self.$field)),
                    ),)+
                    _ => ::std::option::Option::None,
                }
            }

            fn set(
                &mut self,
                attribute: &str,
                value: $crate::filter::Value,
            ) -> $crate::error::Result<()> {
                match attribute {
                    $(stringify!($field) => {
                        $crate::mapping::decode_into(&mut self.$field, attribute, value)
                    })+
                    _ => ::std::result::Result::Err($crate::error::Error::unknown_field(attribute)),
                }
            }
        }
    };
}

/// Ordered bijection between entity fields and table columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    pairs: Vec<(String, String)>,
    by_field: HashMap<String, usize>,
}

impl Mapping {
    /// Build a mapping from `(field, column)` pairs, keeping their order
    ///
    /// Empty mappings and duplicated fields or columns are rejected.
    pub fn new<F, C>(pairs: impl IntoIterator<Item = (F, C)>) -> Result<Self>
    where
        F: Into<String>,
        C: Into<String>,
    {
        let pairs: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(f, c)| (f.into(), c.into()))
            .collect();
        if pairs.is_empty() {
            return Err(Error::Config("mapping has no fields".to_string()));
        }

        let mut by_field = HashMap::with_capacity(pairs.len());
        let mut columns = std::collections::HashSet::with_capacity(pairs.len());
        for (i, (field, column)) in pairs.iter().enumerate() {
            if by_field.insert(field.clone(), i).is_some() {
                return Err(Error::Config(format!("field `{}` is mapped twice", field)));
            }
            if !columns.insert(column.as_str()) {
                return Err(Error::Config(format!("column `{}` is mapped twice", column)));
            }
        }

        Ok(Self { pairs, by_field })
    }

    /// Name-for-name mapping over an entity's attributes, in declaration order
    pub fn derive<T: Entity>() -> Self {
        let pairs: Vec<(String, String)> = T::attributes()
            .iter()
            .map(|a| (a.to_string(), a.to_string()))
            .collect();
        let by_field = pairs
            .iter()
            .enumerate()
            .map(|(i, (f, _))| (f.clone(), i))
            .collect();
        Self { pairs, by_field }
    }

    /// Column for a field, or `UnknownField`
    pub fn column(&self, field: &str) -> Result<&str> {
        self.by_field
            .get(field)
            .map(|&i| self.pairs[i].1.as_str())
            .ok_or_else(|| Error::unknown_field(field))
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.by_field.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(f, _)| f.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(_, c)| c.as_str())
    }

    /// `(field, column)` pairs in mapping order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(f, c)| (f.as_str(), c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Account {
        login: String,
        score: Option<f64>,
    }

    crate::entity!(Account { login, score });

    #[test]
    fn test_explicit_mapping_keeps_order() {
        let m = Mapping::new([("name", "user_name"), ("age", "user_age")]).unwrap();
        assert_eq!(m.fields().collect::<Vec<_>>(), vec!["name", "age"]);
        assert_eq!(m.columns().collect::<Vec<_>>(), vec!["user_name", "user_age"]);
        assert_eq!(m.column("age").unwrap(), "user_age");
        assert!(matches!(m.column("email"), Err(Error::UnknownField(f)) if f == "email"));
    }

    #[test]
    fn test_mapping_rejects_duplicates() {
        assert!(Mapping::new([("a", "x"), ("a", "y")]).is_err());
        assert!(Mapping::new([("a", "x"), ("b", "x")]).is_err());
        assert!(Mapping::new(Vec::<(String, String)>::new()).is_err());
    }

    #[test]
    fn test_derived_mapping() {
        let m = Mapping::derive::<Account>();
        assert_eq!(m.iter().collect::<Vec<_>>(), vec![("login", "login"), ("score", "score")]);
    }

    #[test]
    fn test_entity_macro_get_set() {
        let mut a = Account::default();
        a.set("login", Value::from("root")).unwrap();
        a.set("score", Value::Int(3)).unwrap();
        assert_eq!(a.login, "root");
        assert_eq!(a.score, Some(3.0));
        assert_eq!(a.get("score"), Some(Value::Float(3.0)));
        a.set("score", Value::Null).unwrap();
        assert_eq!(a.score, None);
        assert_eq!(a.get("missing"), None);
    }

    #[test]
    fn test_entity_macro_decode_error() {
        let mut a = Account::default();
        let err = a.set("login", Value::Bool(true)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot decode field `login`: expected text, found bool"
        );
        assert!(matches!(a.set("nope", Value::Null), Err(Error::UnknownField(_))));
    }
}
