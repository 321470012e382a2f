//! Relation metadata for the base entities the engine queries.
//!
//! Models are runtime data, not compile-time schemas: a caller describes
//! each entity's table, primary key and named relations once, and the
//! translators resolve dotted field paths against that description.

use std::collections::BTreeMap;

/// A typed relation descriptor: how two entities are linked via keys.
///
/// The six kinds are mutually exclusive capability sets, so each carries
/// exactly the keys its join/subquery shape needs. `related` names the
/// related *model* in the [`ModelGraph`], not its table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relation {
    BelongsTo {
        related: String,
        foreign_key: String,
        owner_key: String,
    },
    HasOne {
        related: String,
        foreign_key: String,
        local_key: String,
    },
    HasMany {
        related: String,
        foreign_key: String,
        local_key: String,
    },
    BelongsToMany {
        related: String,
        pivot_table: String,
        foreign_pivot_key: String,
        related_pivot_key: String,
        parent_key: String,
        related_key: String,
    },
    MorphOne {
        related: String,
        morph_type: String,
        foreign_key: String,
        local_key: String,
    },
    MorphMany {
        related: String,
        morph_type: String,
        foreign_key: String,
        local_key: String,
    },
}

impl Relation {
    /// A belongs-to relation: `base.foreign_key` references
    /// `related.owner_key`.
    pub fn belongs_to(
        related: impl Into<String>,
        foreign_key: impl Into<String>,
        owner_key: impl Into<String>,
    ) -> Self {
        Relation::BelongsTo {
            related: related.into(),
            foreign_key: foreign_key.into(),
            owner_key: owner_key.into(),
        }
    }

    /// A has-one relation: `related.foreign_key` references
    /// `base.local_key`.
    pub fn has_one(
        related: impl Into<String>,
        foreign_key: impl Into<String>,
        local_key: impl Into<String>,
    ) -> Self {
        Relation::HasOne {
            related: related.into(),
            foreign_key: foreign_key.into(),
            local_key: local_key.into(),
        }
    }

    /// A has-many relation: `related.foreign_key` references
    /// `base.local_key`.
    pub fn has_many(
        related: impl Into<String>,
        foreign_key: impl Into<String>,
        local_key: impl Into<String>,
    ) -> Self {
        Relation::HasMany {
            related: related.into(),
            foreign_key: foreign_key.into(),
            local_key: local_key.into(),
        }
    }

    /// A many-to-many relation traversing `pivot_table`.
    pub fn belongs_to_many(
        related: impl Into<String>,
        pivot_table: impl Into<String>,
        foreign_pivot_key: impl Into<String>,
        related_pivot_key: impl Into<String>,
    ) -> Self {
        Relation::BelongsToMany {
            related: related.into(),
            pivot_table: pivot_table.into(),
            foreign_pivot_key: foreign_pivot_key.into(),
            related_pivot_key: related_pivot_key.into(),
            parent_key: "id".to_string(),
            related_key: "id".to_string(),
        }
    }

    /// A polymorphic has-one relation; `morph_type` is the type
    /// discriminator column on the related table.
    pub fn morph_one(
        related: impl Into<String>,
        morph_type: impl Into<String>,
        foreign_key: impl Into<String>,
        local_key: impl Into<String>,
    ) -> Self {
        Relation::MorphOne {
            related: related.into(),
            morph_type: morph_type.into(),
            foreign_key: foreign_key.into(),
            local_key: local_key.into(),
        }
    }

    /// A polymorphic has-many relation.
    pub fn morph_many(
        related: impl Into<String>,
        morph_type: impl Into<String>,
        foreign_key: impl Into<String>,
        local_key: impl Into<String>,
    ) -> Self {
        Relation::MorphMany {
            related: related.into(),
            morph_type: morph_type.into(),
            foreign_key: foreign_key.into(),
            local_key: local_key.into(),
        }
    }

    /// The name of the related model in the graph.
    pub fn related_model(&self) -> &str {
        match self {
            Relation::BelongsTo { related, .. }
            | Relation::HasOne { related, .. }
            | Relation::HasMany { related, .. }
            | Relation::BelongsToMany { related, .. }
            | Relation::MorphOne { related, .. }
            | Relation::MorphMany { related, .. } => related,
        }
    }

    /// Returns true for the belongs-to kind, the only kind filtered and
    /// searched through a real join.
    pub const fn is_belongs_to(&self) -> bool {
        matches!(self, Relation::BelongsTo { .. })
    }
}

/// Metadata for one base entity: table, primary key, morph identity and
/// named relations.
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    table: String,
    primary_key: String,
    morph_class: String,
    relations: BTreeMap<String, Relation>,
}

impl Model {
    /// Creates a model with primary key `id` and a morph class equal to
    /// its name.
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            morph_class: name.clone(),
            name,
            table: table.into(),
            primary_key: "id".to_string(),
            relations: BTreeMap::new(),
        }
    }

    /// Overrides the primary key column.
    pub fn primary_key(mut self, key: impl Into<String>) -> Self {
        self.primary_key = key.into();
        self
    }

    /// Overrides the morph class identifier stored in polymorphic type
    /// discriminator columns.
    pub fn morph_class(mut self, class: impl Into<String>) -> Self {
        self.morph_class = class.into();
        self
    }

    /// Registers a named relation.
    pub fn relation(mut self, name: impl Into<String>, relation: Relation) -> Self {
        self.relations.insert(name.into(), relation);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn key(&self) -> &str {
        &self.primary_key
    }

    /// The primary key qualified with the table name.
    pub fn qualified_key(&self) -> String {
        format!("{}.{}", self.table, self.primary_key)
    }

    pub fn morph_identity(&self) -> &str {
        &self.morph_class
    }

    /// Resolves a relation by name. Returns `None` when the name does not
    /// denote a relation on this model — callers treat that as "the field
    /// is a direct column".
    pub fn relation_named(&self, name: &str) -> Option<&Relation> {
        self.relations.get(name)
    }
}

/// The set of models a table definition can traverse.
#[derive(Debug, Clone, Default)]
pub struct ModelGraph {
    models: BTreeMap<String, Model>,
}

impl ModelGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a model under its own name.
    pub fn register(mut self, model: Model) -> Self {
        self.models.insert(model.name.clone(), model);
        self
    }

    /// Looks up a model by name.
    pub fn model(&self, name: &str) -> Option<&Model> {
        self.models.get(name)
    }

    /// Resolves the model a relation points at.
    pub fn related(&self, relation: &Relation) -> Option<&Model> {
        self.model(relation.related_model())
    }
}
