use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;
use tera::{Context, Tera};

use crate::api::context::RequestContext;
use crate::error::CrudResult;
use crate::logic::humanize;
use crate::model::{value_at, ControllerOptions};

/// Key under which a wrapped view's output is handed to the layout template.
/// Layouts must print it unescaped: `{{ crud_view | safe }}`.
pub const VIEW_OUTPUT_KEY: &str = "crud_view";

const LAYOUT: &str = "crude/layout.html";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    List,
    Item,
    Add,
    Edit,
}

impl View {
    pub fn template_name(self) -> &'static str {
        match self {
            View::List => "crude/list.html",
            View::Item => "crude/view.html",
            View::Add => "crude/add.html",
            View::Edit => "crude/edit.html",
        }
    }

    fn builtin(self) -> &'static str {
        match self {
            View::List => include_str!("../../templates/list.html"),
            View::Item => include_str!("../../templates/view.html"),
            View::Add => include_str!("../../templates/add.html"),
            View::Edit => include_str!("../../templates/edit.html"),
        }
    }

    fn configured(self, opts: &ControllerOptions) -> Option<&Path> {
        match self {
            View::List => opts.list_view.as_deref(),
            View::Item => opts.item_view.as_deref(),
            View::Add => opts.add_view.as_deref(),
            View::Edit => opts.edit_view.as_deref(),
        }
    }
}

/// The compiled templates of one controller. Built once at construction;
/// a missing or broken template file fails construction.
#[derive(Debug)]
pub struct Templates {
    tera: Tera,
    has_layout: bool,
}

impl Templates {
    pub fn compile(opts: &ControllerOptions) -> CrudResult<Self> {
        let mut tera = Tera::default();
        tera.register_function("field_value", field_value);
        tera.register_filter("humanize", humanize_filter);

        for view in [View::List, View::Item, View::Add, View::Edit] {
            match view.configured(opts) {
                Some(path) => tera.add_template_file(path, Some(view.template_name()))?,
                None => tera.add_raw_template(view.template_name(), view.builtin())?,
            }
        }

        let has_layout = match opts.layout_view.as_deref() {
            Some(path) => {
                tera.add_template_file(path, Some(LAYOUT))?;
                true
            }
            None => false,
        };

        Ok(Self { tera, has_layout })
    }

    pub fn has_layout(&self) -> bool {
        self.has_layout
    }

    /// Render a view, wrapped in the layout when one is configured.
    pub fn render(&self, view: View, ctx: &RequestContext) -> CrudResult<String> {
        let mut context = Context::from_serialize(ctx)?;
        let output = self.tera.render(view.template_name(), &context)?;
        if !self.has_layout {
            return Ok(output);
        }
        context.insert(VIEW_OUTPUT_KEY, &output);
        Ok(self.tera.render(LAYOUT, &context)?)
    }
}

/// `field_value(item=item, path="author.name")`: printable value of a field.
fn field_value(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let path = args
        .get("path")
        .and_then(Value::as_str)
        .ok_or_else(|| tera::Error::msg("field_value requires a `path` argument"))?;
    let Some(item) = args.get("item").and_then(Value::as_object) else {
        return Ok(Value::String(String::new()));
    };

    Ok(match value_at(item, path) {
        None | Some(Value::Null) => Value::String(String::new()),
        Some(Value::String(text)) => Value::String(text.clone()),
        Some(other) => Value::String(other.to_string()),
    })
}

fn humanize_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    match value.as_str() {
        Some(text) => Ok(Value::String(humanize(text))),
        None => Ok(value.clone()),
    }
}
