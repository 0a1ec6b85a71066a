//! Filter constructors
//!
//! One function per operation. They never fail; see [`Filter`].

use super::types::{Filter, FilterValue, Operation};
use super::value::Value;

fn leaf(field: impl Into<String>, operation: Operation, value: impl Into<Value>) -> Filter {
    Filter::new(field, operation, FilterValue::Scalar(value.into()))
}

/// Field equals a value
pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Filter {
    leaf(field, Operation::Eq, value)
}

/// Field equals a value, ignoring case
pub fn ieq(field: impl Into<String>, value: impl Into<String>) -> Filter {
    leaf(field, Operation::IEq, value.into())
}

/// Field does not equal a value
pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Filter {
    leaf(field, Operation::Ne, value)
}

/// Field does not equal a value, ignoring case
pub fn ine(field: impl Into<String>, value: impl Into<String>) -> Filter {
    leaf(field, Operation::INe, value.into())
}

/// Field is null
pub fn is_null(field: impl Into<String>) -> Filter {
    Filter::new(field, Operation::IsNull, FilterValue::None)
}

pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Filter {
    leaf(field, Operation::Lt, value)
}

pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Filter {
    leaf(field, Operation::Gt, value)
}

pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Filter {
    leaf(field, Operation::Lte, value)
}

pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Filter {
    leaf(field, Operation::Gte, value)
}

/// Field is one of the given values
pub fn is_in<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Filter {
    let values = values.into_iter().map(Into::into).collect();
    Filter::new(field, Operation::In, FilterValue::List(values))
}

/// Field contains a substring
pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Filter {
    leaf(field, Operation::Contains, value.into())
}

/// Field contains a substring, ignoring case
pub fn icontains(field: impl Into<String>, value: impl Into<String>) -> Filter {
    leaf(field, Operation::IContains, value.into())
}

pub fn has_prefix(field: impl Into<String>, value: impl Into<String>) -> Filter {
    leaf(field, Operation::HasPrefix, value.into())
}

pub fn ihas_prefix(field: impl Into<String>, value: impl Into<String>) -> Filter {
    leaf(field, Operation::IHasPrefix, value.into())
}

pub fn has_suffix(field: impl Into<String>, value: impl Into<String>) -> Filter {
    leaf(field, Operation::HasSuffix, value.into())
}

pub fn ihas_suffix(field: impl Into<String>, value: impl Into<String>) -> Filter {
    leaf(field, Operation::IHasSuffix, value.into())
}

/// Field is an IP address inside a subnet literal such as `10.0.0.0/8`
pub fn ip_within(field: impl Into<String>, subnet: impl Into<String>) -> Filter {
    leaf(field, Operation::IpWithin, subnet.into())
}

/// Negates a filter
pub fn not(filter: Filter) -> Filter {
    Filter::new(String::new(), Operation::Not, FilterValue::Filter(Box::new(filter)))
}

/// All filters match; an empty list always matches
pub fn and(filters: impl IntoIterator<Item = Filter>) -> Filter {
    Filter::new(
        String::new(),
        Operation::And,
        FilterValue::Filters(filters.into_iter().collect()),
    )
}

/// Any filter matches; an empty list never matches
pub fn or(filters: impl IntoIterator<Item = Filter>) -> Filter {
    Filter::new(
        String::new(),
        Operation::Or,
        FilterValue::Filters(filters.into_iter().collect()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_constructors() {
        let f = ieq("name", "bob");
        assert_eq!(f.field, "name");
        assert_eq!(f.operation, Operation::IEq);
        assert_eq!(f.value, FilterValue::Scalar(Value::Text("bob".into())));

        let f = is_null("email");
        assert_eq!(f.value, FilterValue::None);
    }

    #[test]
    fn test_is_in_collects_values() {
        let f = is_in("age", [23, 36]);
        assert_eq!(
            f.value,
            FilterValue::List(vec![Value::Int(23), Value::Int(36)])
        );
        let empty = is_in::<i64>("age", []);
        assert_eq!(empty.value, FilterValue::List(vec![]));
    }

    #[test]
    fn test_composites_have_no_field() {
        let f = not(and([eq("a", 1), or([])]));
        assert!(f.field.is_empty());
        match f.value {
            FilterValue::Filter(inner) => {
                assert_eq!(inner.operation, Operation::And);
                assert!(matches!(inner.value, FilterValue::Filters(ref v) if v.len() == 2));
            }
            other => panic!("unexpected operand: {:?}", other),
        }
    }
}
