//! Filter evaluation for the in-memory driver.
//!
//! Dotted paths flatten through arrays, so `notes.score` yields the score of
//! every note. A comparison holds when any candidate satisfies it; the negated
//! operators hold when no candidate satisfies the positive form.

use crate::filter::{
    Comparison, Condition, ElementFilter, ListQuantifier, Operator, Pagination, RelationWhere,
    Where,
};
use crate::source::Record;
use grove_model::{KeyHolder, ID_FIELD};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;

pub(crate) type Collections = HashMap<String, Vec<Record>>;

pub(crate) fn matches(db: &Collections, record: &Record, filter: &Where) -> bool {
    filter
        .conditions
        .iter()
        .all(|(path, condition)| matches_condition(db, record, path, condition))
        && filter.and.iter().all(|child| matches(db, record, child))
        && (filter.or.is_empty() || filter.or.iter().any(|child| matches(db, record, child)))
}

fn matches_condition(db: &Collections, record: &Record, path: &str, condition: &Condition) -> bool {
    match condition {
        Condition::Compare(comparison) => compare(&lookup(record, path), comparison),
        Condition::ElementMatch(element) => lookup(record, path)
            .into_iter()
            .filter_map(Value::as_array)
            .flatten()
            .any(|item| element_matches(db, item, element)),
        Condition::Relation(relation) => relation_matches(db, record, relation),
    }
}

fn element_matches(db: &Collections, item: &Value, element: &ElementFilter) -> bool {
    match element {
        ElementFilter::Object(filter) => item
            .as_object()
            .is_some_and(|object| matches(db, object, filter)),
        ElementFilter::Scalar(comparisons) => comparisons
            .iter()
            .all(|comparison| compare(&[item], comparison)),
    }
}

/// Values reached by a dotted path.
fn lookup<'a>(record: &'a Record, path: &str) -> Vec<&'a Value> {
    let mut segments = path.split('.');
    let Some(first) = segments.next() else {
        return Vec::new();
    };
    let mut current: Vec<&Value> = record.get(first).into_iter().collect();
    for segment in segments {
        current = current
            .into_iter()
            .flat_map(|value| match value {
                Value::Object(object) => object.get(segment).into_iter().collect::<Vec<_>>(),
                Value::Array(items) => items
                    .iter()
                    .filter_map(|item| item.as_object()?.get(segment))
                    .collect(),
                _ => Vec::new(),
            })
            .collect();
    }
    current
}

/// Candidates with top-level arrays opened up, for element-wise comparison.
fn expand<'a>(candidates: &[&'a Value]) -> Vec<&'a Value> {
    let mut out = Vec::with_capacity(candidates.len());
    for &value in candidates {
        out.push(value);
        if let Value::Array(items) = value {
            out.extend(items.iter());
        }
    }
    out
}

fn order(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => order(a, b) == Some(Ordering::Equal),
        _ => a == b,
    }
}

fn is_absent(candidates: &[&Value]) -> bool {
    candidates.iter().all(|v| v.is_null())
}

fn compare(candidates: &[&Value], comparison: &Comparison) -> bool {
    let value = &comparison.value;
    let expanded = expand(candidates);

    match comparison.operator {
        Operator::Eq => eq(candidates, &expanded, value),
        Operator::Neq => !eq(candidates, &expanded, value),
        Operator::Gt => ordered(&expanded, value, |o| o == Ordering::Greater),
        Operator::Gte => ordered(&expanded, value, |o| o != Ordering::Less),
        Operator::Lt => ordered(&expanded, value, |o| o == Ordering::Less),
        Operator::Lte => ordered(&expanded, value, |o| o != Ordering::Greater),
        Operator::In => within(candidates, &expanded, value),
        Operator::NotIn => !within(candidates, &expanded, value),
        Operator::Contains => contains(candidates, value),
        Operator::NotContains => !contains(candidates, value),
        Operator::Between => {
            let (Some(from), Some(to)) = (value.get("from"), value.get("to")) else {
                return false;
            };
            expanded.iter().any(|c| {
                order(c, from).is_some_and(|o| o != Ordering::Less)
                    && order(c, to).is_some_and(|o| o != Ordering::Greater)
            })
        }
        Operator::Object => candidates.iter().any(|c| partial_match(c, value)),
        Operator::All => {
            let Some(wanted) = value.as_array() else {
                return false;
            };
            candidates.iter().filter_map(|c| c.as_array()).any(|items| {
                wanted
                    .iter()
                    .all(|w| items.iter().any(|item| equal(item, w)))
            })
        }
        Operator::Size => {
            let Some(size) = value.as_u64() else {
                return false;
            };
            candidates
                .iter()
                .filter_map(|c| c.as_array())
                .any(|items| items.len() as u64 == size)
        }
        Operator::ElementMatch => candidates
            .iter()
            .filter_map(|c| c.as_array())
            .flatten()
            .any(|item| partial_match(item, value)),
    }
}

fn ordered(expanded: &[&Value], value: &Value, accept: fn(Ordering) -> bool) -> bool {
    expanded
        .iter()
        .any(|c| order(c, value).is_some_and(accept))
}

fn eq(candidates: &[&Value], expanded: &[&Value], value: &Value) -> bool {
    if value.is_null() && is_absent(candidates) {
        return true;
    }
    expanded.iter().any(|c| equal(c, value))
}

fn within(candidates: &[&Value], expanded: &[&Value], value: &Value) -> bool {
    let Some(allowed) = value.as_array() else {
        return false;
    };
    if is_absent(candidates) && allowed.iter().any(Value::is_null) {
        return true;
    }
    expanded
        .iter()
        .any(|c| allowed.iter().any(|a| equal(c, a)))
}

fn contains(candidates: &[&Value], value: &Value) -> bool {
    candidates.iter().any(|c| match c {
        Value::String(s) => value.as_str().is_some_and(|needle| s.contains(needle)),
        Value::Array(items) => items.iter().any(|item| equal(item, value)),
        _ => false,
    })
}

fn partial_match(candidate: &Value, pattern: &Value) -> bool {
    match (candidate, pattern) {
        (Value::Object(object), Value::Object(wanted)) => wanted.iter().all(|(key, want)| {
            object
                .get(key)
                .is_some_and(|have| partial_match(have, want))
        }),
        _ => equal(candidate, pattern),
    }
}

/// Identifiers held in a foreign-key value, scalar or array.
pub(crate) fn referenced_ids(value: Option<&Value>) -> Vec<&str> {
    match value {
        Some(Value::String(id)) => vec![id.as_str()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

fn relation_matches(db: &Collections, record: &Record, relation: &RelationWhere) -> bool {
    let config = &relation.relation;
    let targets = db
        .get(&relation.target_key)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let related: Vec<&Record> = match config.holder {
        KeyHolder::Local => {
            let ids = referenced_ids(record.get(&config.foreign_key));
            targets
                .iter()
                .filter(|t| {
                    t.get(ID_FIELD)
                        .and_then(Value::as_str)
                        .is_some_and(|id| ids.contains(&id))
                })
                .collect()
        }
        KeyHolder::Remote => {
            let Some(own_id) = record.get(ID_FIELD).and_then(Value::as_str) else {
                return false;
            };
            targets
                .iter()
                .filter(|t| referenced_ids(t.get(&config.foreign_key)).contains(&own_id))
                .collect()
        }
    };

    let mut hits = related.iter().map(|t| matches(db, t, &relation.filters));
    match config.quantifier {
        None | Some(ListQuantifier::Some) => hits.any(|hit| hit),
        Some(ListQuantifier::None) => !hits.any(|hit| hit),
        Some(ListQuantifier::Every) => hits.all(|hit| hit),
    }
}

/// Applies driver-side paging: `page`/`per_page` (pages start at 1) when both
/// are given, otherwise `skip`/`first`.
pub(crate) fn paginate(records: Vec<Record>, pagination: Option<&Pagination>) -> Vec<Record> {
    let Some(p) = pagination else {
        return records;
    };
    let (skip, take) = match (p.page, p.per_page) {
        (Some(page), Some(per_page)) => (page.saturating_sub(1) * per_page, Some(per_page)),
        _ => (p.skip.unwrap_or(0), p.first),
    };
    let rest = records.into_iter().skip(skip);
    match take {
        Some(n) => rest.take(n).collect(),
        None => rest.collect(),
    }
}
