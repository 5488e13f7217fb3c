use std::sync::{Arc, OnceLock};

use itertools::Itertools;
use serde::Serialize;

use crate::model::{ControllerOptions, FieldDef, FieldKind, ModelSchema};

/// Presentation data for one field path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldView {
    pub path: String,
    pub kind: FieldKind,
    pub can_show: bool,
    pub name: String,
}

/// The entity schema as the views see it, in schema order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaView {
    pub fields: Vec<FieldView>,
}

impl SchemaView {
    pub fn build(schema: &ModelSchema, opts: &ControllerOptions) -> Self {
        let fields = schema
            .fields
            .iter()
            .map(|field| FieldView {
                path: field.path.clone(),
                kind: field.kind,
                can_show: can_show(field, opts),
                name: field_name(field, opts),
            })
            .collect();

        Self { fields }
    }

    pub fn get(&self, path: &str) -> Option<&FieldView> {
        self.fields.iter().find(|field| field.path == path)
    }

    pub fn visible(&self) -> impl Iterator<Item = &FieldView> {
        self.fields.iter().filter(|field| field.can_show)
    }
}

fn can_show(field: &FieldDef, opts: &ControllerOptions) -> bool {
    if opts.is_excluded(&field.path) || field.is_reserved() {
        return false;
    }
    if field.path == opts.id_field {
        return opts.show_id;
    }
    true
}

fn field_name(field: &FieldDef, opts: &ControllerOptions) -> String {
    if let Some(label) = opts.labels.get(&field.path) {
        return label.clone();
    }
    if field.is_nested() && !opts.expand_paths {
        let last = field.path.rsplit('.').next().unwrap_or(&field.path);
        return humanize(last);
    }
    humanize(&field.path)
}

/// `createdAt` -> `Created at`, `author.first_name` -> `Author first name`.
pub fn humanize(path: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    for ch in path.chars() {
        if matches!(ch, '_' | '-' | '.' | ' ') {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        } else if ch.is_uppercase() && !current.is_empty() {
            words.push(std::mem::take(&mut current));
            current.extend(ch.to_lowercase());
        } else {
            current.extend(ch.to_lowercase());
        }
    }
    if !current.is_empty() {
        words.push(current);
    }

    let sentence = words.iter().join(" ");
    let mut chars = sentence.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Computes the schema view on first access and serves the same `Arc`
/// afterwards. A racing first access is resolved by `OnceLock`.
#[derive(Debug, Default)]
pub struct SchemaViewCache {
    cell: OnceLock<Arc<SchemaView>>,
}

impl SchemaViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, schema: &ModelSchema, opts: &ControllerOptions) -> Arc<SchemaView> {
        self.cell
            .get_or_init(|| {
                log::debug!("Computing schema view for '{}'", schema.name);
                Arc::new(SchemaView::build(schema, opts))
            })
            .clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }
}
