//! Schema compilation: pairs relation fields and resolves their storage layout.

use crate::error::{ModelError, ModelResult};
use crate::field::{Field, KeyHolder};
use crate::model::{lower_first, upper_first, Model};
use crate::relation::{ModelRelation, RelationType, Side};
use serde::Serialize;
use std::collections::HashSet;

/// Position of a field: (model index, field index).
type FieldRef = (usize, usize);

/// The compiled, read-only set of models and their relations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schema {
    models: Vec<Model>,
    relations: Vec<ModelRelation>,
}

impl Schema {
    /// Compiles model descriptors.
    ///
    /// Pairs every bidirectional relation field with its reciprocal by
    /// relation name, validates list-ness against the declared relation type,
    /// and writes the resolved foreign-key layout into each relation field's
    /// metadata.
    pub fn new(mut models: Vec<Model>) -> ModelResult<Self> {
        let mut names = HashSet::new();
        for model in &models {
            if !names.insert(model.name().to_string()) {
                return Err(ModelError::DuplicateModel(model.name().into()));
            }
            if !model.is_object_type() && model.unique_fields().next().is_none() {
                return Err(ModelError::NoUniqueField(model.name().into()));
            }
        }

        let refs: Vec<FieldRef> = models
            .iter()
            .enumerate()
            .flat_map(|(mi, model)| {
                model
                    .fields()
                    .iter()
                    .enumerate()
                    .filter(|(_, f)| f.is_relation())
                    .map(move |(fi, _)| (mi, fi))
            })
            .collect();

        let mut paired = HashSet::new();
        let mut relations = Vec::new();
        for at in refs {
            if !paired.insert(at) {
                continue;
            }
            let Some(rel) = field_at(&models, at).as_relation() else {
                continue;
            };
            let target = index_of(&models, &rel.target)
                .ok_or_else(|| ModelError::UnknownModel(rel.target.clone()))?;

            let relation = if rel.relation_type.is_bidirectional() {
                let reciprocal = find_reciprocal(&models, at, target)?;
                paired.insert(reciprocal);
                pair_bidirectional(&mut models, at, reciprocal)?
            } else {
                resolve_unidirectional(&mut models, at, target)?
            };
            relations.push(relation);
        }

        Ok(Self { models, relations })
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn relations(&self) -> &[ModelRelation] {
        &self.relations
    }

    pub fn model(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.name() == name)
    }

    pub fn require_model(&self, name: &str) -> ModelResult<&Model> {
        self.model(name)
            .ok_or_else(|| ModelError::UnknownModel(name.into()))
    }

    /// Finds the relation exposed by `model.field` and the side it sits on.
    pub fn relation_for(&self, model: &str, field: &str) -> Option<(&ModelRelation, Side)> {
        self.relations.iter().find_map(|r| {
            if r.source == model && r.source_field == field {
                Some((r, Side::Source))
            } else if r.target == model && r.target_field.as_deref() == Some(field) {
                Some((r, Side::Target))
            } else {
                None
            }
        })
    }
}

fn index_of(models: &[Model], name: &str) -> Option<usize> {
    models.iter().position(|m| m.name() == name)
}

fn field_at(models: &[Model], (mi, fi): FieldRef) -> &Field {
    &models[mi].fields()[fi]
}

fn invalid(models: &[Model], at: FieldRef, reason: &str) -> ModelError {
    ModelError::InvalidRelation {
        model: models[at.0].name().into(),
        field: field_at(models, at).name.clone(),
        reason: reason.into(),
    }
}

fn find_reciprocal(models: &[Model], at: FieldRef, target: usize) -> ModelResult<FieldRef> {
    let owner = models[at.0].name();
    let field = field_at(models, at);
    let rel = field.as_relation();
    let name = rel.and_then(|r| r.relation_name.as_deref());
    let relation_type = rel.map(|r| r.relation_type);

    let found = models[target].fields().iter().enumerate().find(|(fi, f)| {
        (target, *fi) != at
            && f.as_relation().is_some_and(|r| {
                r.target == owner && r.relation_name.as_deref() == name
            })
    });

    match found {
        Some((fi, candidate)) => {
            if candidate.as_relation().map(|r| r.relation_type) != relation_type {
                return Err(invalid(
                    models,
                    (target, fi),
                    "reciprocal field declares a different relation type",
                ));
            }
            Ok((target, fi))
        }
        None => Err(ModelError::MissingReciprocal {
            model: owner.into(),
            field: field.name.clone(),
            target: models[target].name().into(),
        }),
    }
}

fn explicit_key(models: &[Model], at: FieldRef) -> Option<String> {
    field_at(models, at)
        .as_relation()
        .and_then(|r| r.metadata.foreign_key.clone())
}

fn set_layout(models: &mut [Model], (mi, fi): FieldRef, foreign_key: &str, holder: KeyHolder) {
    if let Some(rel) = models[mi].fields_mut()[fi].as_relation_mut() {
        rel.metadata.foreign_key = Some(foreign_key.into());
        rel.metadata.holder = Some(holder);
    }
}

fn relation_name(models: &[Model], at: FieldRef) -> Option<String> {
    field_at(models, at)
        .as_relation()
        .and_then(|r| r.relation_name.clone())
}

fn pair_bidirectional(
    models: &mut [Model],
    a: FieldRef,
    b: FieldRef,
) -> ModelResult<ModelRelation> {
    let fa = field_at(models, a);
    let fb = field_at(models, b);
    let Some(relation_type) = fa.as_relation().map(|r| r.relation_type) else {
        return Err(invalid(models, a, "not a relation field"));
    };

    let (source, target, foreign_key, target_foreign_key, key_holder) = match relation_type {
        RelationType::BiOneToOne => {
            if fa.list || fb.list {
                return Err(invalid(models, a, "one-to-one fields cannot be lists"));
            }
            let b_owns = fb.as_relation().is_some_and(|r| r.metadata.owner)
                && !fa.as_relation().is_some_and(|r| r.metadata.owner);
            let (source, target) = if b_owns { (b, a) } else { (a, b) };
            let key = explicit_key(models, source)
                .or_else(|| explicit_key(models, target))
                .unwrap_or_else(|| format!("{}Id", field_at(models, source).name));
            set_layout(models, source, &key, KeyHolder::Local);
            set_layout(models, target, &key, KeyHolder::Remote);
            (source, target, key, None, Side::Source)
        }
        RelationType::BiOneToMany => {
            let (source, target) = match (fa.list, fb.list) {
                (true, false) => (a, b),
                (false, true) => (b, a),
                _ => {
                    return Err(invalid(
                        models,
                        a,
                        "one-to-many needs exactly one list side",
                    ));
                }
            };
            let key = explicit_key(models, target)
                .or_else(|| explicit_key(models, source))
                .unwrap_or_else(|| format!("{}Id", field_at(models, target).name));
            set_layout(models, source, &key, KeyHolder::Remote);
            set_layout(models, target, &key, KeyHolder::Local);
            (source, target, key, None, Side::Target)
        }
        RelationType::BiManyToMany => {
            if !fa.list || !fb.list {
                return Err(invalid(models, a, "many-to-many fields must be lists"));
            }
            let source_key = explicit_key(models, a).unwrap_or_else(|| fa.name.clone());
            let target_key = explicit_key(models, b).unwrap_or_else(|| fb.name.clone());
            set_layout(models, a, &source_key, KeyHolder::Local);
            set_layout(models, b, &target_key, KeyHolder::Local);
            (a, b, source_key, Some(target_key), Side::Source)
        }
        _ => return Err(invalid(models, a, "relation type is not bidirectional")),
    };

    Ok(ModelRelation {
        relation_type,
        name: relation_name(models, source),
        source: models[source.0].name().into(),
        source_field: field_at(models, source).name.clone(),
        target: models[target.0].name().into(),
        target_field: Some(field_at(models, target).name.clone()),
        foreign_key,
        target_foreign_key,
        key_holder,
    })
}

fn resolve_unidirectional(
    models: &mut [Model],
    at: FieldRef,
    target: usize,
) -> ModelResult<ModelRelation> {
    let field = field_at(models, at);
    let Some(relation_type) = field.as_relation().map(|r| r.relation_type) else {
        return Err(invalid(models, at, "not a relation field"));
    };

    let (key, holder, key_holder) = match relation_type {
        RelationType::UniOneToOne | RelationType::UniManyToOne => {
            if field.list {
                return Err(invalid(models, at, "to-one field cannot be a list"));
            }
            let key = explicit_key(models, at).unwrap_or_else(|| format!("{}Id", field.name));
            (key, KeyHolder::Local, Side::Source)
        }
        RelationType::UniOneToMany => {
            if !field.list {
                return Err(invalid(models, at, "to-many field must be a list"));
            }
            let key = explicit_key(models, at).unwrap_or_else(|| {
                format!(
                    "{}{}Id",
                    lower_first(models[at.0].name()),
                    upper_first(&field.name)
                )
            });
            (key, KeyHolder::Remote, Side::Target)
        }
        _ => return Err(invalid(models, at, "relation type is bidirectional")),
    };
    set_layout(models, at, &key, holder);

    Ok(ModelRelation {
        relation_type,
        name: relation_name(models, at),
        source: models[at.0].name().into(),
        source_field: field_at(models, at).name.clone(),
        target: models[target].name().into(),
        target_field: None,
        foreign_key: key,
        target_foreign_key: None,
        key_holder,
    })
}
