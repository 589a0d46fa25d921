use super::types::{
    Column, CompareOp, FilterDef, FilterKind, FilterSet, Join, Membership, Source, Value,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        column: Column,
        op: CompareOp,
        value: Value,
    },
    ContainsCi {
        column: Column,
        needle: String,
    },
    IsNull(Column),
    IsNotNull(Column),
    Exists {
        membership: &'static Membership,
        value: Value,
    },
}

impl Predicate {
    /// Join this predicate reads from, if any
    pub fn join(&self) -> Option<&'static Join> {
        let column = match self {
            Predicate::Compare { column, .. }
            | Predicate::ContainsCi { column, .. }
            | Predicate::IsNull(column)
            | Predicate::IsNotNull(column) => column,
            Predicate::Exists { .. } => return None,
        };
        match column.source {
            Source::Root => None,
            Source::Joined(join) => Some(join),
        }
    }
}

impl FilterDef {
    pub fn predicate(&self, value: Value) -> Predicate {
        match self.kind {
            FilterKind::Equality(column) => Predicate::Compare {
                column,
                op: CompareOp::Eq,
                value,
            },
            FilterKind::RangeMin(column) => Predicate::Compare {
                column,
                op: CompareOp::Gte,
                value,
            },
            FilterKind::RangeMax(column) => Predicate::Compare {
                column,
                op: CompareOp::Lte,
                value,
            },
            FilterKind::Substring(column) => Predicate::ContainsCi {
                column,
                needle: value.to_text(),
            },
            FilterKind::Existence(column) if value.as_flag() => Predicate::IsNotNull(column),
            FilterKind::Existence(column) => Predicate::IsNull(column),
            FilterKind::Membership(membership) => Predicate::Exists { membership, value },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Ordering over a root column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: &'static str,
    pub direction: Direction,
}

impl SortKey {
    pub const fn asc(column: &'static str) -> Self {
        Self {
            column,
            direction: Direction::Asc,
        }
    }

    pub const fn desc(column: &'static str) -> Self {
        Self {
            column,
            direction: Direction::Desc,
        }
    }
}

/// Target table or collection of a search, with its default ordering.
#[derive(Debug)]
pub struct EntitySchema {
    pub table: &'static str,
    pub default_order: &'static [SortKey],
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: &'static str,
    pub joins: Vec<&'static Join>,
    pub predicates: Vec<Predicate>,
    pub order: Vec<SortKey>,
}

impl Query {
    /// One predicate per present filter, in filter order, ANDed together.
    /// An empty filter set yields an unfiltered query.
    pub fn build(schema: &EntitySchema, filters: FilterSet) -> Self {
        let mut joins: Vec<&'static Join> = Vec::new();
        let mut predicates = Vec::with_capacity(filters.len());

        for (def, value) in filters.into_entries() {
            let predicate = def.predicate(value);
            if let Some(join) = predicate.join() {
                if !joins.iter().any(|j| j.alias == join.alias) {
                    joins.push(join);
                }
            }
            predicates.push(predicate);
        }

        Self {
            table: schema.table,
            joins,
            predicates,
            order: schema.default_order.to_vec(),
        }
    }

    /// Replace the default ordering. An empty slice keeps the default.
    pub fn order_by(mut self, order: &[SortKey]) -> Self {
        if !order.is_empty() {
            self.order = order.to_vec();
        }
        self
    }

    pub fn is_unfiltered(&self) -> bool {
        self.predicates.is_empty()
    }
}
