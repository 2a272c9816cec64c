//! The compiled engine and its entry points.

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::stamp::{stamp, stamped_fields};
use grove_filter::{compile_unique_where, FilterCompiler};
use grove_hooks::{
    merge_hooks, terminal, CreateContext, DeleteContext, Hook, MergedHook, MutationError,
    MutationResult, Terminal, UpdateContext,
};
use grove_model::{ModelError, Schema, Side, ID_FIELD};
use grove_relation::{relation_hooks, RelationEngine, SideStore};
use grove_storage::{
    DataSource, DataSourceFactory, MutationFactory, MutationKind, Pagination, Record,
    RequestContext,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Per-model storage binding and precomposed terminals.
struct Binding {
    source: Arc<dyn DataSource>,
    update: MutationFactory,
    stamped: Vec<String>,
    object_type: bool,
    create_terminal: Box<Terminal<CreateContext>>,
    update_terminal: Box<Terminal<UpdateContext>>,
    delete_terminal: Box<Terminal<DeleteContext>>,
}

impl Binding {
    fn new(source: Arc<dyn DataSource>, create: MutationFactory, update: MutationFactory) -> Self {
        let create_terminal = {
            let source = Arc::clone(&source);
            terminal(move |ctx: &mut CreateContext| {
                let source = Arc::clone(&source);
                let factory = create.clone();
                Box::pin(async move {
                    let mutation = factory.create_mutation(&ctx.data)?;
                    ctx.response = Some(source.create(&mutation, &ctx.request).await?);
                    Ok::<(), MutationError>(())
                })
            })
        };
        let update_terminal = {
            let source = Arc::clone(&source);
            let factory = update.clone();
            terminal(move |ctx: &mut UpdateContext| {
                let source = Arc::clone(&source);
                let factory = factory.clone();
                Box::pin(async move {
                    let filter = compile_unique_where(&ctx.unique_where)?;
                    let mutation = factory.create_mutation(&ctx.data)?;
                    ctx.response = Some(source.update(&filter, &mutation, &ctx.request).await?);
                    Ok::<(), MutationError>(())
                })
            })
        };
        let delete_terminal = {
            let source = Arc::clone(&source);
            terminal(move |ctx: &mut DeleteContext| {
                let source = Arc::clone(&source);
                Box::pin(async move {
                    let filter = compile_unique_where(&ctx.unique_where)?;
                    let existing = source.find_one(&filter, &ctx.request).await?;
                    source.delete(&filter, &ctx.request).await?;
                    ctx.response = existing;
                    Ok::<(), MutationError>(())
                })
            })
        };
        Self {
            source,
            update,
            stamped: Vec::new(),
            object_type: false,
            create_terminal,
            update_terminal,
            delete_terminal,
        }
    }
}

/// Assembles an [`Engine`] from a schema, storage and extensions.
pub struct EngineBuilder {
    schema: Schema,
    factory: Option<Arc<dyn DataSourceFactory>>,
    extensions: Vec<HashMap<String, Hook>>,
    config: EngineConfig,
}

impl EngineBuilder {
    #[must_use]
    pub fn data_sources(mut self, factory: impl DataSourceFactory + 'static) -> Self {
        self.factory = Some(Arc::new(factory));
        self
    }

    /// Adds one extension's hook contribution. Extensions wrap inside the
    /// relation hooks, in the order they are added.
    #[must_use]
    pub fn extension(mut self, hooks: HashMap<String, Hook>) -> Self {
        self.extensions.push(hooks);
        self
    }

    #[must_use]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Binds every model to its data source and merges all hooks once.
    pub fn build(self) -> EngineResult<Engine> {
        let factory = self.factory.ok_or(EngineError::MissingDataSources)?;
        let schema = self.schema;

        let mut bindings = HashMap::new();
        for model in schema.models() {
            let mut binding = Binding::new(
                factory.data_source(model),
                MutationFactory::for_model(model, MutationKind::Create),
                MutationFactory::for_model(model, MutationKind::Update),
            );
            binding.stamped = stamped_fields(model);
            binding.object_type = model.is_object_type();
            info!(
                model = model.name(),
                storage_key = model.storage_key(),
                object_type = binding.object_type,
                "bound model"
            );
            bindings.insert(model.name().to_string(), binding);
        }

        let mut contributions = Vec::new();
        for relation in schema.relations() {
            let side = |s: Side| -> EngineResult<SideStore> {
                let name = relation.model(s);
                let model = schema.require_model(name)?;
                let binding = bindings
                    .get(name)
                    .ok_or_else(|| ModelError::UnknownModel(name.into()))?;
                Ok(SideStore::new(model, Arc::clone(&binding.source)))
            };
            let engine =
                RelationEngine::new(relation.clone(), side(Side::Source)?, side(Side::Target)?);
            info!(
                relation = ?relation.name,
                kind = ?relation.relation_type,
                source = %relation.source,
                target = %relation.target,
                foreign_key = %relation.foreign_key,
                "compiled relation"
            );
            contributions.extend(relation_hooks(Arc::new(engine)));
        }
        // relation wrappers are outermost; extensions see data without
        // nested relation payloads
        contributions.extend(self.extensions);
        let mut hooks = merge_hooks(contributions);
        for model in schema.models() {
            hooks.entry(model.name().to_string()).or_default();
        }

        Ok(Engine {
            schema,
            config: self.config,
            bindings,
            hooks,
        })
    }
}

/// A compiled schema bound to storage, with its merged hooks.
///
/// Built once; every entry point only reads it.
pub struct Engine {
    schema: Schema,
    config: EngineConfig,
    bindings: HashMap<String, Binding>,
    hooks: HashMap<String, MergedHook>,
}

impl Engine {
    pub fn builder(schema: Schema) -> EngineBuilder {
        EngineBuilder {
            schema,
            factory: None,
            extensions: Vec::new(),
            config: EngineConfig::default(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The merged hook of a model.
    pub fn hook(&self, model: &str) -> Option<&MergedHook> {
        self.hooks.get(model)
    }

    fn binding(&self, model: &str) -> MutationResult<(&Binding, &MergedHook)> {
        let unknown = || MutationError::Configuration(ModelError::UnknownModel(model.into()));
        let binding = self.bindings.get(model).ok_or_else(unknown)?;
        let hook = self.hooks.get(model).ok_or_else(unknown)?;
        Ok((binding, hook))
    }

    fn list_binding(&self, model: &str) -> MutationResult<(&Binding, &MergedHook)> {
        let (binding, hook) = self.binding(model)?;
        if binding.object_type {
            return Err(MutationError::InvalidPayload(format!(
                "{model} is an object type; use read_object/update_object"
            )));
        }
        Ok((binding, hook))
    }

    fn object_binding(&self, model: &str) -> MutationResult<&Binding> {
        let (binding, _) = self.binding(model)?;
        if !binding.object_type {
            return Err(MutationError::InvalidPayload(format!(
                "{model} is not an object type"
            )));
        }
        Ok(binding)
    }

    fn stamp(&self, binding: &Binding, data: &mut Record) {
        if self.config.stamp_updated_at {
            stamp(data, &binding.stamped);
        }
    }

    /// Finds the record a unique where addresses, or fails with `NotFound`.
    async fn require_unique(
        &self,
        model: &str,
        binding: &Binding,
        unique_where: &Record,
        request: &RequestContext,
    ) -> MutationResult<Record> {
        let filter = compile_unique_where(unique_where)?;
        binding
            .source
            .find_one(&filter, request)
            .await?
            .ok_or_else(|| MutationError::not_found(model, &filter))
    }

    /// Creates a record through the model's hook chain.
    ///
    /// Returns `None` when a wrapper short-circuited without a response.
    pub async fn create(
        &self,
        model: &str,
        mut data: Record,
        request: RequestContext,
    ) -> MutationResult<Option<Record>> {
        let (binding, hook) = self.list_binding(model)?;
        debug!(model, request_id = %request.request_id, "create");
        self.stamp(binding, &mut data);
        let mut ctx = CreateContext::new(data, request);
        hook.create.run(&mut ctx, &binding.create_terminal).await?;
        Ok(ctx.response)
    }

    /// Updates the record addressed by `unique_where`.
    ///
    /// The record is looked up first; wrappers see `unique_where` narrowed to
    /// its id.
    pub async fn update(
        &self,
        model: &str,
        unique_where: &Record,
        mut data: Record,
        request: RequestContext,
    ) -> MutationResult<Option<Record>> {
        let (binding, hook) = self.list_binding(model)?;
        let existing = self.require_unique(model, binding, unique_where, &request).await?;
        debug!(model, request_id = %request.request_id, id = ?existing.get(ID_FIELD), "update");
        self.stamp(binding, &mut data);
        let mut ctx = UpdateContext::new(by_id(&existing), data, request);
        hook.update.run(&mut ctx, &binding.update_terminal).await?;
        Ok(ctx.response)
    }

    /// Deletes the record addressed by `unique_where` and returns it.
    pub async fn delete(
        &self,
        model: &str,
        unique_where: &Record,
        request: RequestContext,
    ) -> MutationResult<Option<Record>> {
        let (binding, hook) = self.list_binding(model)?;
        let existing = self.require_unique(model, binding, unique_where, &request).await?;
        debug!(model, request_id = %request.request_id, id = ?existing.get(ID_FIELD), "delete");
        let mut ctx = DeleteContext::new(by_id(&existing), request);
        hook.delete.run(&mut ctx, &binding.delete_terminal).await?;
        Ok(ctx.response)
    }

    /// Records matching a where input, paginated by the driver.
    pub async fn find(
        &self,
        model: &str,
        where_input: &Record,
        pagination: Option<&Pagination>,
        request: &RequestContext,
    ) -> MutationResult<Vec<Record>> {
        let (binding, _) = self.list_binding(model)?;
        let descriptor = self.schema.require_model(model)?;
        let filter = FilterCompiler::new(&self.schema)
            .with_default_quantifier(self.config.list_relation_default)
            .compile(where_input, descriptor)?;
        debug!(model, filter = %filter, "find");
        Ok(binding.source.find(&filter, pagination, request).await?)
    }

    pub async fn find_one(
        &self,
        model: &str,
        unique_where: &Record,
        request: &RequestContext,
    ) -> MutationResult<Option<Record>> {
        let (binding, _) = self.list_binding(model)?;
        let filter = compile_unique_where(unique_where)?;
        Ok(binding.source.find_one(&filter, request).await?)
    }

    /// Resolves `field` of `parent` through the merged resolvers, falling
    /// back to the stored value.
    pub async fn resolve_field(
        &self,
        model: &str,
        field: &str,
        parent: &Record,
        request: &RequestContext,
    ) -> MutationResult<Value> {
        let (_, hook) = self.binding(model)?;
        match hook.resolver(field) {
            Some(resolve) => resolve(parent, request).await,
            None => Ok(parent.get(field).cloned().unwrap_or(Value::Null)),
        }
    }

    /// Reads a singleton object-type model.
    pub async fn read_object(&self, model: &str, request: &RequestContext) -> MutationResult<Record> {
        let binding = self.object_binding(model)?;
        Ok(binding.source.get_map(request).await?)
    }

    /// Writes a singleton object-type model and returns its new state.
    pub async fn update_object(
        &self,
        model: &str,
        mut data: Record,
        request: &RequestContext,
    ) -> MutationResult<Record> {
        let binding = self.object_binding(model)?;
        self.stamp(binding, &mut data);
        let mutation = binding.update.create_mutation(&data)?;
        binding.source.update_map(&mutation, request).await?;
        Ok(binding.source.get_map(request).await?)
    }
}

fn by_id(record: &Record) -> Record {
    let mut unique = Record::new();
    if let Some(id) = record.get(ID_FIELD) {
        unique.insert(ID_FIELD.into(), id.clone());
    }
    unique
}
