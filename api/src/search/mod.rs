mod builder;
pub mod eval;
mod executor;
mod predicate;
mod types;

pub use builder::build_sql;
pub use eval::{evaluate, Collections, Document};
pub use executor::{search, QueryExecutionError, QueryExecutor};
pub use predicate::{Direction, EntitySchema, Predicate, Query, SortKey};
pub use types::{
    Column, CompareOp, FilterDef, FilterKind, FilterSet, Join, JoinKind, Membership, Source, Value,
};
