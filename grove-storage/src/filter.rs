//! The structured filter tree every storage call receives.
//!
//! Produced by the filter compiler, consumed by drivers. Relation nodes carry
//! enough layout information for a driver to join without consulting the
//! schema.

use grove_model::{KeyHolder, RelationShip, RelationType, ID_FIELD};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Comparison operators understood by drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Operator {
    #[serde(rename = "eq")]
    Eq,
    #[serde(rename = "neq")]
    Neq,
    #[serde(rename = "gt")]
    Gt,
    #[serde(rename = "gte")]
    Gte,
    #[serde(rename = "lt")]
    Lt,
    #[serde(rename = "lte")]
    Lte,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "notIn")]
    NotIn,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "notcontains")]
    NotContains,
    /// Inclusive range, value `{from, to}`.
    #[serde(rename = "between")]
    Between,
    /// Partial match of a JSON value against an object.
    #[serde(rename = "object")]
    Object,
    /// Array contains every listed value.
    #[serde(rename = "all")]
    All,
    /// Array length equals the value.
    #[serde(rename = "size")]
    Size,
    #[serde(rename = "elementMatch")]
    ElementMatch,
}

impl Operator {
    pub const ALL: [Operator; 15] = [
        Self::Eq,
        Self::Neq,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::In,
        Self::NotIn,
        Self::Contains,
        Self::NotContains,
        Self::Between,
        Self::Object,
        Self::All,
        Self::Size,
        Self::ElementMatch,
    ];

    /// The key suffix spelling, e.g. `"gte"` in `price_gte`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::In => "in",
            Self::NotIn => "notIn",
            Self::Contains => "contains",
            Self::NotContains => "notcontains",
            Self::Between => "between",
            Self::Object => "object",
            Self::All => "all",
            Self::Size => "size",
            Self::ElementMatch => "elementMatch",
        }
    }

    pub fn from_suffix(suffix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == suffix)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `{operator: value}` predicate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub operator: Operator,
    pub value: Value,
}

impl Comparison {
    pub fn new(operator: Operator, value: Value) -> Self {
        Self { operator, value }
    }
}

/// Predicate evaluated jointly against each element of a list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementFilter {
    /// Elements are objects; the nested where must hold for one element.
    Object(Where),
    /// Elements are scalars; every comparison must hold for one element.
    Scalar(Vec<Comparison>),
}

/// Quantifier on a list relation filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListQuantifier {
    Some,
    None,
    Every,
}

impl ListQuantifier {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "some" => Some(Self::Some),
            "none" => Some(Self::None),
            "every" => Some(Self::Every),
            _ => None,
        }
    }
}

/// Join metadata attached to a relation filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationWhereConfig {
    pub foreign_key: String,
    /// Which side's records hold `foreign_key`, relative to the filtered model.
    pub holder: KeyHolder,
    pub source: String,
    pub target: String,
    pub list: bool,
    /// Set for list relations only.
    pub quantifier: Option<ListQuantifier>,
    pub ship: RelationShip,
    pub relation_type: RelationType,
}

/// A filter on a relation field, compiled against the target model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationWhere {
    pub filters: Where,
    /// Storage key of the filtered model.
    pub source_key: String,
    /// Storage key of the target model.
    pub target_key: String,
    pub relation: RelationWhereConfig,
}

/// A node of the filter tree, keyed by field path in [`Where`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Compare(Comparison),
    ElementMatch(ElementFilter),
    Relation(Box<RelationWhere>),
}

/// A compiled filter tree.
///
/// `conditions` hold at most one node per field path; dotted paths address
/// nested object fields. All conditions and all `and` children must hold, and
/// at least one `or` child must hold when any are present.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Where {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub conditions: BTreeMap<String, Condition>,
    #[serde(rename = "AND", skip_serializing_if = "Vec::is_empty")]
    pub and: Vec<Where>,
    #[serde(rename = "OR", skip_serializing_if = "Vec::is_empty")]
    pub or: Vec<Where>,
}

impl Where {
    pub fn new() -> Self {
        Self::default()
    }

    /// Addresses one record by identifier.
    pub fn by_id(id: &str) -> Self {
        Self::new().eq(ID_FIELD, Value::String(id.into()))
    }

    /// Records whose identifier is one of `ids`.
    pub fn by_ids<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        let ids = ids.into_iter().map(|id| Value::String(id.into())).collect();
        Self::new().compare(ID_FIELD, Operator::In, Value::Array(ids))
    }

    #[must_use]
    pub fn eq(self, path: &str, value: Value) -> Self {
        self.compare(path, Operator::Eq, value)
    }

    #[must_use]
    pub fn compare(mut self, path: &str, operator: Operator, value: Value) -> Self {
        self.conditions.insert(
            path.into(),
            Condition::Compare(Comparison::new(operator, value)),
        );
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty() && self.and.is_empty() && self.or.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&Condition> {
        self.conditions.get(path)
    }
}

impl fmt::Display for Where {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{self:?}"),
        }
    }
}

/// Paging arguments handed through to drivers untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub first: Option<usize>,
    #[serde(default)]
    pub skip: Option<usize>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub per_page: Option<usize>,
}
