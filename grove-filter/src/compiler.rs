use crate::error::{FilterError, FilterResult};
use crate::key::{parse_key, ParsedKey};
use grove_model::{Field, FieldKind, Model, RelationField, Schema};
use grove_storage::{
    Comparison, Condition, ElementFilter, ListQuantifier, Operator, RelationWhere,
    RelationWhereConfig, Where,
};
use serde_json::{Map, Value};

type RawWhere = Map<String, Value>;

const AND: &str = "AND";
const OR: &str = "OR";
const ELEMENT_MATCH: &str = "elementMatch";

/// Field set a where object is compiled against: a model, or the sub-fields
/// of an object field for `elementMatch`.
#[derive(Clone, Copy)]
struct Scope<'a> {
    name: &'a str,
    storage_key: &'a str,
    fields: &'a [Field],
}

impl<'a> Scope<'a> {
    fn model(model: &'a Model) -> Self {
        Self {
            name: model.name(),
            storage_key: model.storage_key(),
            fields: model.fields(),
        }
    }

    fn field(&self, name: &str) -> Option<&'a Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    fn unknown(&self, field: &str) -> FilterError {
        FilterError::UnknownField {
            model: self.name.into(),
            field: field.into(),
        }
    }
}

/// Compiles flat where input into [`Where`] trees for one schema.
#[derive(Debug, Clone, Copy)]
pub struct FilterCompiler<'s> {
    schema: &'s Schema,
    default_quantifier: ListQuantifier,
}

impl<'s> FilterCompiler<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self {
            schema,
            default_quantifier: ListQuantifier::Some,
        }
    }

    /// Quantifier for list-relation filters given without `some/none/every`.
    #[must_use]
    pub fn with_default_quantifier(mut self, quantifier: ListQuantifier) -> Self {
        self.default_quantifier = quantifier;
        self
    }

    pub fn compile(&self, raw: &RawWhere, model: &Model) -> FilterResult<Where> {
        self.compile_scope(raw, Scope::model(model))
    }

    fn compile_scope(&self, raw: &RawWhere, scope: Scope<'_>) -> FilterResult<Where> {
        let mut out = Where::new();
        for (key, value) in raw {
            if key == AND || key == OR {
                let children = self.compile_children(key, value, scope)?;
                if key == AND {
                    out.and.extend(children);
                } else {
                    out.or.extend(children);
                }
                continue;
            }

            let parsed = resolve_key(scope, key)?;
            let field = scope
                .field(parsed.root())
                .ok_or_else(|| scope.unknown(parsed.root()))?;

            match &field.kind {
                FieldKind::Relation(relation) => {
                    if parsed.operator != Operator::Eq || parsed.sub_path().is_some() {
                        let suffix = key.strip_prefix(field.name.as_str()).unwrap_or(key);
                        let suffix = suffix.trim_start_matches('_');
                        return Err(FilterError::UnsupportedOperator {
                            key: key.clone(),
                            operator: suffix.into(),
                        });
                    }
                    let node = self.compile_relation(key, value, field, relation, scope)?;
                    insert(&mut out, &field.name, Condition::Relation(Box::new(node)))?;
                }
                FieldKind::Object { fields } => match parsed.sub_path() {
                    Some(sub) => {
                        let sub_root = sub.split('.').next().unwrap_or(sub);
                        if !fields.iter().any(|f| f.name == sub_root) {
                            return Err(FilterError::UnknownField {
                                model: field.type_name.clone(),
                                field: sub_root.into(),
                            });
                        }
                        let node = Condition::Compare(Comparison::new(parsed.operator, value.clone()));
                        insert(&mut out, &parsed.path, node)?;
                    }
                    None if parsed.operator == Operator::Eq => {
                        self.compile_object(&mut out, key, value, field, fields)?
                    }
                    None => {
                        let node = Condition::Compare(Comparison::new(parsed.operator, value.clone()));
                        insert(&mut out, &field.name, node)?;
                    }
                },
                FieldKind::Scalar { .. } => {
                    let node = compile_scalar(key, value, field, parsed.operator)?;
                    insert(&mut out, &field.name, node)?;
                }
            }
        }
        Ok(out)
    }

    fn compile_children(
        &self,
        key: &str,
        value: &Value,
        scope: Scope<'_>,
    ) -> FilterResult<Vec<Where>> {
        let items = match value {
            Value::Array(items) => items.as_slice(),
            // a single where object is accepted in place of a one-element list
            Value::Object(_) => std::slice::from_ref(value),
            _ => return Err(FilterError::invalid(key, "expected a list of where objects")),
        };
        items
            .iter()
            .map(|item| {
                let raw = item
                    .as_object()
                    .ok_or_else(|| FilterError::invalid(key, "expected a where object"))?;
                self.compile_scope(raw, scope)
            })
            .collect()
    }

    fn compile_relation(
        &self,
        key: &str,
        value: &Value,
        field: &Field,
        relation: &RelationField,
        scope: Scope<'_>,
    ) -> FilterResult<RelationWhere> {
        let raw = value
            .as_object()
            .ok_or_else(|| FilterError::invalid(key, "relation filter must be a where object"))?;
        let target = self
            .schema
            .model(&relation.target)
            .ok_or_else(|| FilterError::UnknownModel(relation.target.clone()))?;

        let (quantifier, nested) = if field.list {
            let (quantifier, nested) = self.unwrap_quantifier(&field.name, raw)?;
            (Some(quantifier), nested)
        } else {
            (None, raw)
        };

        Ok(RelationWhere {
            filters: self.compile_scope(nested, Scope::model(target))?,
            source_key: scope.storage_key.into(),
            target_key: target.storage_key().into(),
            relation: RelationWhereConfig {
                foreign_key: relation.foreign_key().into(),
                holder: relation.holder(),
                source: scope.name.into(),
                target: target.name().into(),
                list: field.list,
                quantifier,
                ship: relation.relation_type.ship(),
                relation_type: relation.relation_type,
            },
        })
    }

    fn unwrap_quantifier<'r>(
        &self,
        field: &str,
        raw: &'r RawWhere,
    ) -> FilterResult<(ListQuantifier, &'r RawWhere)> {
        let quantified: Vec<_> = raw
            .iter()
            .filter_map(|(k, v)| ListQuantifier::from_key(k).map(|q| (q, v)))
            .collect();
        match quantified.as_slice() {
            [] => Ok((self.default_quantifier, raw)),
            [(quantifier, value)] if raw.len() == 1 => {
                let nested = value.as_object().ok_or_else(|| {
                    FilterError::invalid(field, "quantified filter must be a where object")
                })?;
                Ok((*quantifier, nested))
            }
            _ => Err(FilterError::MultipleQuantifiers {
                field: field.into(),
            }),
        }
    }

    fn compile_object(
        &self,
        out: &mut Where,
        key: &str,
        value: &Value,
        field: &Field,
        fields: &[Field],
    ) -> FilterResult<()> {
        let raw = value
            .as_object()
            .ok_or_else(|| FilterError::invalid(key, "object filter must be an object"))?;
        let scope = Scope {
            name: &field.type_name,
            storage_key: &field.type_name,
            fields,
        };

        for (sub_key, sub_value) in raw {
            if sub_key == ELEMENT_MATCH {
                if !field.list {
                    return Err(FilterError::invalid(
                        &field.name,
                        "elementMatch applies to lists of objects only",
                    ));
                }
                let nested = sub_value.as_object().ok_or_else(|| {
                    FilterError::invalid(sub_key, "elementMatch must be a where object")
                })?;
                let element = ElementFilter::Object(self.compile_scope(nested, scope)?);
                insert(out, &field.name, Condition::ElementMatch(element))?;
                continue;
            }
            let parsed = resolve_key(scope, sub_key)?;
            if scope.field(parsed.root()).is_none() {
                return Err(scope.unknown(parsed.root()));
            }
            let path = format!("{}.{}", field.name, parsed.path);
            let node = Condition::Compare(Comparison::new(parsed.operator, sub_value.clone()));
            insert(out, &path, node)?;
        }
        Ok(())
    }
}

/// Splits a where key, preferring exact field names over operator suffixes
/// so that names containing `_` stay addressable.
fn resolve_key(scope: Scope<'_>, key: &str) -> FilterResult<ParsedKey> {
    let exact = |path: String| ParsedKey {
        path,
        operator: Operator::Eq,
    };
    if scope.field(key).is_some() {
        return Ok(exact(key.into()));
    }
    if let Some((root, sub)) = key.split_once("__") {
        if scope.field(root).and_then(|f| f.object_field(sub)).is_some() {
            return Ok(exact(format!("{root}.{sub}")));
        }
    }
    parse_key(key)
}

fn insert(out: &mut Where, path: &str, condition: Condition) -> FilterResult<()> {
    if out.conditions.contains_key(path) {
        return Err(FilterError::DuplicateField { field: path.into() });
    }
    out.conditions.insert(path.into(), condition);
    Ok(())
}

fn compile_scalar(
    key: &str,
    value: &Value,
    field: &Field,
    operator: Operator,
) -> FilterResult<Condition> {
    match value {
        Value::Object(raw) if field.list && operator == Operator::Eq => {
            compile_list_scalar(&field.name, raw)
        }
        _ => {
            if operator == Operator::ElementMatch {
                return Err(FilterError::invalid(key, "elementMatch needs a list filter object"));
            }
            Ok(Condition::Compare(Comparison::new(operator, value.clone())))
        }
    }
}

/// `{has, hasNot, gt, gte, lt, lte, size, elementMatch}` on a scalar list.
fn compile_list_scalar(field: &str, raw: &RawWhere) -> FilterResult<Condition> {
    let mut entries = raw.iter();
    let (Some((op, value)), None) = (entries.next(), entries.next()) else {
        return Err(FilterError::MultipleListOperators {
            field: field.into(),
        });
    };
    if op == ELEMENT_MATCH {
        let nested = value
            .as_object()
            .ok_or_else(|| FilterError::invalid(field, "elementMatch must be an object"))?;
        let comparisons = nested
            .iter()
            .map(|(op, value)| element_comparison(field, op, value))
            .collect::<FilterResult<Vec<_>>>()?;
        return Ok(Condition::ElementMatch(ElementFilter::Scalar(comparisons)));
    }
    list_comparison(field, op, value).map(Condition::Compare)
}

fn list_comparison(field: &str, op: &str, value: &Value) -> FilterResult<Comparison> {
    let or_empty = || match value {
        Value::Null => Value::Array(Vec::new()),
        other => other.clone(),
    };
    let comparison = match op {
        "has" => Comparison::new(Operator::All, or_empty()),
        "hasNot" => Comparison::new(Operator::NotIn, or_empty()),
        "gt" => Comparison::new(Operator::Gt, value.clone()),
        "gte" => Comparison::new(Operator::Gte, value.clone()),
        "lt" => Comparison::new(Operator::Lt, value.clone()),
        "lte" => Comparison::new(Operator::Lte, value.clone()),
        "size" => Comparison::new(Operator::Size, value.clone()),
        _ => {
            return Err(FilterError::UnsupportedOperator {
                key: field.into(),
                operator: op.into(),
            });
        }
    };
    Ok(comparison)
}

fn element_comparison(field: &str, op: &str, value: &Value) -> FilterResult<Comparison> {
    if op == ELEMENT_MATCH {
        return Err(FilterError::invalid(field, "elementMatch cannot be nested"));
    }
    list_comparison(field, op, value)
}

/// Compiles where input against `model`, defaulting list relations to `some`.
pub fn compile_where(raw: &RawWhere, model: &Model, schema: &Schema) -> FilterResult<Where> {
    FilterCompiler::new(schema).compile(raw, model)
}

/// Compiles a unique-where: every key becomes an equality.
///
/// Keys with a null value are ignored; input left empty after that fails.
pub fn compile_unique_where(raw: &RawWhere) -> FilterResult<Where> {
    let filter = raw
        .iter()
        .filter(|(_, value)| !value.is_null())
        .fold(Where::new(), |filter, (key, value)| {
            filter.eq(key, value.clone())
        });
    if filter.is_empty() {
        return Err(FilterError::EmptyUniqueWhere);
    }
    Ok(filter)
}
