/// Filter model for the dynamic search queries
///
/// Every filter is declared once as a `FilterDef` constant that binds its
/// name to a comparator and a column. A `FilterSet` carries the values the
/// caller actually supplied; absent filters never enter the set.
use storefront_common::{Money, OrderStatus};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Bool(bool),
}

impl Value {
    /// Text form used for substring matching
    pub fn to_text(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Bool(b) => b.to_string(),
        }
    }

    /// Flag read by existence filters; non-boolean values count as `true`
    pub fn as_flag(&self) -> bool {
        !matches!(self, Value::Bool(false))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Money> for Value {
    fn from(m: Money) -> Self {
        Value::Integer(m.cents())
    }
}

impl From<OrderStatus> for Value {
    fn from(status: OrderStatus) -> Self {
        Value::Text(status.as_str().to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

/// A table joined to the query root on `alias.joined_key = root.root_key`.
///
/// Joins are only emitted when a present filter reads one of their columns.
#[derive(Debug, PartialEq, Eq)]
pub struct Join {
    pub table: &'static str,
    pub alias: &'static str,
    pub kind: JoinKind,
    pub joined_key: &'static str,
    pub root_key: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Root,
    Joined(&'static Join),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub source: Source,
    pub name: &'static str,
}

impl Column {
    pub const fn root(name: &'static str) -> Self {
        Self {
            source: Source::Root,
            name,
        }
    }

    pub const fn joined(join: &'static Join, name: &'static str) -> Self {
        Self {
            source: Source::Joined(join),
            name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,  // column = value
    Gt,  // column > value
    Gte, // column >= value
    Lt,  // column < value
    Lte, // column <= value
}

impl CompareOp {
    pub fn sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
        }
    }

    /// Whether `actual.cmp(expected)` satisfies this operator
    pub fn accepts(&self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            CompareOp::Eq => ordering == Equal,
            CompareOp::Gt => ordering == Greater,
            CompareOp::Gte => ordering != Less,
            CompareOp::Lt => ordering == Less,
            CompareOp::Lte => ordering != Greater,
        }
    }
}

/// "A related row exists": a row of `table` whose `correlated_key` equals the
/// root's `root_key` and whose `column op value` holds.
#[derive(Debug, PartialEq, Eq)]
pub struct Membership {
    pub table: &'static str,
    pub alias: &'static str,
    pub correlated_key: &'static str,
    pub root_key: &'static str,
    pub column: &'static str,
    pub op: CompareOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Equality(Column),
    RangeMin(Column),
    RangeMax(Column),
    Substring(Column),
    Existence(Column),
    Membership(&'static Membership),
}

#[derive(Debug, PartialEq, Eq)]
pub struct FilterDef {
    pub name: &'static str,
    pub kind: FilterKind,
}

impl FilterDef {
    pub const fn new(name: &'static str, kind: FilterKind) -> Self {
        Self { name, kind }
    }
}

/// Ordered set of the filters supplied for one search invocation.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    entries: Vec<(&'static FilterDef, Value)>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `def` when a value is present; `None` leaves the set unchanged.
    pub fn with<V: Into<Value>>(mut self, def: &'static FilterDef, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.entries.push((def, value.into()));
        }
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(def, _)| def.name).collect()
    }

    pub fn into_entries(self) -> impl Iterator<Item = (&'static FilterDef, Value)> {
        self.entries.into_iter()
    }
}
