use std::collections::HashMap;
use std::net::IpAddr;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Decoded value of a single column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Null,
    Text(String),
    Inet(IpAddr),
    Uuid(Uuid),
    Int(i32),
    BigInt(i64),
    Boolean(bool),
    Double(f64),
    Blob(Vec<u8>),
}

/// Conversion from a decoded column value into a Rust type.
pub trait FromColumnValue: Sized {
    /// Returns `None` if the column holds a value of a different type.
    fn from_column_value(value: &ColumnValue) -> Option<Self>;
}

macro_rules! from_column_value {
    ($t:ty, $variant:ident) => {
        impl FromColumnValue for $t {
            fn from_column_value(value: &ColumnValue) -> Option<Self> {
                match value {
                    ColumnValue::$variant(value) => Some(value.clone()),
                    _ => None,
                }
            }
        }

        impl From<$t> for ColumnValue {
            fn from(value: $t) -> Self {
                ColumnValue::$variant(value)
            }
        }
    };
}

from_column_value!(String, Text);
from_column_value!(IpAddr, Inet);
from_column_value!(Uuid, Uuid);
from_column_value!(i32, Int);
from_column_value!(i64, BigInt);
from_column_value!(bool, Boolean);
from_column_value!(f64, Double);
from_column_value!(Vec<u8>, Blob);

impl From<&str> for ColumnValue {
    fn from(value: &str) -> Self {
        ColumnValue::Text(value.to_string())
    }
}

/// Single row of a rows result, addressable by column name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: HashMap<String, ColumnValue>,
}

impl Row {
    pub fn new(columns: HashMap<String, ColumnValue>) -> Self {
        Row { columns }
    }

    #[inline]
    pub fn is_empty_by_name(&self, name: &str) -> bool {
        matches!(self.columns.get(name), None | Some(ColumnValue::Null))
    }

    /// Returns the value of given column, `None` for nulls, or an error if the column is missing
    /// or holds a value of a different type.
    pub fn get_by_name<T: FromColumnValue>(&self, name: &str) -> Result<Option<T>> {
        match self.columns.get(name) {
            None => Err(Error::General(format!("Column '{name}' not found"))),
            Some(ColumnValue::Null) => Ok(None),
            Some(value) => T::from_column_value(value).map(Some).ok_or_else(|| {
                Error::General(format!("Unexpected type of column '{name}': {value:?}"))
            }),
        }
    }
}

impl<K: Into<String>, V: Into<ColumnValue>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Row::new(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}
