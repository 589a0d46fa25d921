//! In-process evaluation of a `Query` over JSON documents.
//!
//! Null handling follows SQL: any comparison against a missing or null field
//! is false, so `IS NULL` is the only predicate a missing field satisfies.
//! Joins and memberships resolve against the other collections passed in.

use super::executor::QueryExecutionError;
use super::predicate::{Direction, Predicate, Query, SortKey};
use super::types::{Column, Join, JoinKind, Membership, Source, Value};
use serde_json::{Number, Value as JsonValue};
use std::cmp::Ordering;
use std::collections::HashMap;

pub type Document = serde_json::Map<String, JsonValue>;
pub type Collections = HashMap<String, Vec<Document>>;

/// Documents of `query.table` matching every predicate, in query order.
pub fn evaluate(
    query: &Query,
    collections: &Collections,
) -> Result<Vec<Document>, QueryExecutionError> {
    let rows = collection(collections, query.table)?;
    for join in &query.joins {
        collection(collections, join.table)?;
    }
    for predicate in &query.predicates {
        if let Predicate::Exists { membership, .. } = predicate {
            collection(collections, membership.table)?;
        }
    }

    let mut matched: Vec<Document> = rows
        .iter()
        .filter(|doc| inner_joins_satisfied(query, doc, collections))
        .filter(|doc| {
            query
                .predicates
                .iter()
                .all(|p| eval_predicate(p, doc, collections))
        })
        .cloned()
        .collect();

    sort_documents(&mut matched, &query.order);
    Ok(matched)
}

fn collection<'a>(
    collections: &'a Collections,
    name: &str,
) -> Result<&'a [Document], QueryExecutionError> {
    collections
        .get(name)
        .map(Vec::as_slice)
        .ok_or_else(|| QueryExecutionError::UnknownCollection(name.to_string()))
}

fn inner_joins_satisfied(query: &Query, doc: &Document, collections: &Collections) -> bool {
    query
        .joins
        .iter()
        .filter(|join| join.kind == JoinKind::Inner)
        .all(|join| joined_row(join, doc, collections).is_some())
}

fn joined_row<'a>(
    join: &Join,
    doc: &Document,
    collections: &'a Collections,
) -> Option<&'a Document> {
    let key = field(doc, join.root_key)?;
    collections
        .get(join.table)?
        .iter()
        .find(|row| field(row, join.joined_key).is_some_and(|v| json_eq(v, key)))
}

/// Field value, treating JSON null as absent
fn field<'a>(doc: &'a Document, name: &str) -> Option<&'a JsonValue> {
    doc.get(name).filter(|v| !v.is_null())
}

fn column_value<'a>(
    column: &Column,
    doc: &'a Document,
    collections: &'a Collections,
) -> Option<&'a JsonValue> {
    match column.source {
        Source::Root => field(doc, column.name),
        Source::Joined(join) => field(joined_row(join, doc, collections)?, column.name),
    }
}

fn eval_predicate(predicate: &Predicate, doc: &Document, collections: &Collections) -> bool {
    match predicate {
        Predicate::Compare { column, op, value } => column_value(column, doc, collections)
            .and_then(|actual| compare(actual, value))
            .is_some_and(|ordering| op.accepts(ordering)),
        Predicate::ContainsCi { column, needle } => column_value(column, doc, collections)
            .and_then(text_of)
            .is_some_and(|text| text.to_lowercase().contains(&needle.to_lowercase())),
        Predicate::IsNull(column) => column_value(column, doc, collections).is_none(),
        Predicate::IsNotNull(column) => column_value(column, doc, collections).is_some(),
        Predicate::Exists { membership, value } => exists(membership, value, doc, collections),
    }
}

fn exists(m: &Membership, value: &Value, doc: &Document, collections: &Collections) -> bool {
    let Some(key) = field(doc, m.root_key) else {
        return false;
    };
    let Some(related) = collections.get(m.table) else {
        return false;
    };
    related.iter().any(|row| {
        field(row, m.correlated_key).is_some_and(|fk| json_eq(fk, key))
            && field(row, m.column)
                .and_then(|actual| compare(actual, value))
                .is_some_and(|ordering| m.op.accepts(ordering))
    })
}

fn text_of(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// Booleans compare as 0/1, the way SQLite stores them
fn compare(actual: &JsonValue, expected: &Value) -> Option<Ordering> {
    match (actual, expected) {
        (JsonValue::String(a), Value::Text(b)) => Some(a.as_str().cmp(b.as_str())),
        (JsonValue::Number(n), Value::Integer(b)) => n.as_i64().map(|a| a.cmp(b)),
        (JsonValue::Number(n), Value::Bool(b)) => n.as_i64().map(|a| a.cmp(&i64::from(*b))),
        (JsonValue::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (JsonValue::Bool(a), Value::Integer(b)) => Some(i64::from(*a).cmp(b)),
        _ => None,
    }
}

fn json_eq(a: &JsonValue, b: &JsonValue) -> bool {
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => number_cmp(x, y) == Ordering::Equal,
        _ => a == b,
    }
}

fn sort_documents(docs: &mut [Document], order: &[SortKey]) {
    docs.sort_by(|a, b| {
        order
            .iter()
            .map(|key| {
                let ordering = sort_cmp(field(a, key.column), field(b, key.column));
                match key.direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            })
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
}

// SQLite sort classes: NULL < numeric < text
fn sort_rank(value: Option<&JsonValue>) -> u8 {
    match value {
        None => 0,
        Some(JsonValue::Bool(_) | JsonValue::Number(_)) => 1,
        Some(JsonValue::String(_)) => 2,
        Some(_) => 3,
    }
}

fn sort_cmp(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    let (rank_a, rank_b) = (sort_rank(a), sort_rank(b));
    if rank_a != rank_b {
        return rank_a.cmp(&rank_b);
    }
    match (a, b) {
        (Some(JsonValue::String(x)), Some(JsonValue::String(y))) => x.cmp(y),
        (Some(x), Some(y)) if rank_a == 1 => number_cmp(&numeric(x), &numeric(y)),
        _ => Ordering::Equal,
    }
}

fn numeric(value: &JsonValue) -> Number {
    match value {
        JsonValue::Number(n) => n.clone(),
        JsonValue::Bool(b) => Number::from(u8::from(*b)),
        _ => Number::from(0),
    }
}

/// Integers compare exactly; f64 only when either side is a float
fn number_cmp(a: &Number, b: &Number) -> Ordering {
    match (a.as_i64(), b.as_i64(), a.as_u64(), b.as_u64()) {
        (Some(x), Some(y), _, _) => x.cmp(&y),
        (_, _, Some(x), Some(y)) => x.cmp(&y),
        // negative i64 against a u64 above i64::MAX
        (Some(_), None, None, Some(_)) => Ordering::Less,
        (None, Some(_), Some(_), None) => Ordering::Greater,
        _ => {
            let (x, y) = (a.as_f64().unwrap_or_default(), b.as_f64().unwrap_or_default());
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
    }
}
