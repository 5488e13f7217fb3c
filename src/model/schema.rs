use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Date,
    ObjectId,
    Array,
    Mixed,
}

/// A single field path known to the storage model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Dotted path for nested fields, e.g. `author.name`.
    pub path: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
}

impl FieldDef {
    pub fn new(path: &str, kind: FieldKind) -> Self {
        Self {
            path: path.to_string(),
            kind,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn is_nested(&self) -> bool {
        self.path.contains('.')
    }

    /// Paths with a segment starting with `_` belong to the storage layer.
    pub fn is_reserved(&self) -> bool {
        self.path.split('.').any(|segment| segment.starts_with('_'))
    }
}

/// The model an Entity is backed by: a named collection and its field paths.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSchema {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

impl ModelSchema {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn get_field(&self, path: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|field| field.path == path)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|field| field.required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_and_nested_paths() {
        assert!(FieldDef::new("__v", FieldKind::Number).is_reserved());
        assert!(FieldDef::new("meta._rev", FieldKind::String).is_reserved());
        assert!(!FieldDef::new("author.name", FieldKind::String).is_reserved());
        assert!(FieldDef::new("author.name", FieldKind::String).is_nested());
    }

    #[test]
    fn test_schema_lookup() {
        let schema = ModelSchema::new("articles")
            .field(FieldDef::new("name", FieldKind::String).required())
            .field(FieldDef::new("body", FieldKind::String));

        assert_eq!(schema.get_field("body").map(|f| f.kind), Some(FieldKind::String));
        assert_eq!(schema.required_fields().count(), 1);
    }
}
