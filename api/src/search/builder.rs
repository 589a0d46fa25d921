use super::predicate::{Direction, Predicate, Query};
use super::types::{Column, CompareOp, JoinKind, Membership, Source, Value};

/// Builds the SQL statement and bind values for a search query
/// Uses SQLite positional placeholders (`?`), bound in the returned order
pub fn build_sql(query: &Query) -> (String, Vec<Value>) {
    let root = query.table;
    let mut sql = format!("SELECT {root}.* FROM {root}");

    for join in &query.joins {
        let kind = match join.kind {
            JoinKind::Inner => "INNER",
            JoinKind::Left => "LEFT",
        };
        sql.push_str(&format!(
            " {} JOIN {} {} ON {}.{} = {}.{}",
            kind, join.table, join.alias, join.alias, join.joined_key, root, join.root_key
        ));
    }

    let mut bind_values = Vec::new();
    if !query.predicates.is_empty() {
        let clauses: Vec<String> = query
            .predicates
            .iter()
            .map(|p| build_predicate_sql(root, p, &mut bind_values))
            .collect();
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }

    if !query.order.is_empty() {
        let keys: Vec<String> = query
            .order
            .iter()
            .map(|key| {
                let dir = match key.direction {
                    Direction::Asc => "ASC",
                    Direction::Desc => "DESC",
                };
                format!("{}.{} {}", root, key.column, dir)
            })
            .collect();
        sql.push_str(" ORDER BY ");
        sql.push_str(&keys.join(", "));
    }

    (sql, bind_values)
}

fn build_predicate_sql(root: &str, predicate: &Predicate, bind_values: &mut Vec<Value>) -> String {
    match predicate {
        Predicate::Compare { column, op, value } => {
            bind_values.push(value.clone());
            build_comparison_clause(&column_ref(root, column), *op)
        }
        Predicate::ContainsCi { column, needle } => {
            bind_values.push(Value::Text(like_pattern(needle)));
            build_like_clause(&column_ref(root, column))
        }
        Predicate::IsNull(column) => format!("{} IS NULL", column_ref(root, column)),
        Predicate::IsNotNull(column) => format!("{} IS NOT NULL", column_ref(root, column)),
        Predicate::Exists { membership, value } => {
            bind_values.push(value.clone());
            build_exists_clause(root, membership)
        }
    }
}

fn column_ref(root: &str, column: &Column) -> String {
    match column.source {
        Source::Root => format!("{}.{}", root, column.name),
        Source::Joined(join) => format!("{}.{}", join.alias, column.name),
    }
}

fn build_comparison_clause(column: &str, op: CompareOp) -> String {
    format!("{} {} ?", column, op.sql())
}

fn build_like_clause(column: &str) -> String {
    format!("LOWER({}) LIKE ? ESCAPE '\\'", column)
}

fn build_exists_clause(root: &str, m: &Membership) -> String {
    format!(
        "EXISTS (SELECT 1 FROM {table} {alias} WHERE {alias}.{fk} = {root}.{key} AND {alias}.{column} {op} ?)",
        table = m.table,
        alias = m.alias,
        fk = m.correlated_key,
        root = root,
        key = m.root_key,
        column = m.column,
        op = m.op.sql(),
    )
}

/// Lower-cased `%needle%` with LIKE wildcards escaped
fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for ch in needle.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}
