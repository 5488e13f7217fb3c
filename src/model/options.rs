use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Controller configuration. Template paths are read once when the controller
/// is built, everything else is read per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerOptions {
    pub base_url: String,
    pub url_field: String,
    pub name_field: String,
    pub id_field: String,

    /// Wraps every rendered view through the `crud_view` key.
    pub layout_view: Option<PathBuf>,
    /// The edit / create form. Update routes are disabled without it.
    pub edit_view: Option<PathBuf>,
    pub item_view: Option<PathBuf>,
    pub list_view: Option<PathBuf>,
    pub add_view: Option<PathBuf>,

    pub show_id: bool,
    /// Label nested paths with their full path instead of the last segment.
    pub expand_paths: bool,
    pub view_exclude_paths: Vec<String>,

    /// JSON responses only, no templates.
    pub no_views: bool,
    pub no_pagination: bool,
    pub page_size: u64,

    /// Restrict every read and write to records owned by the current user.
    pub own_user: bool,
    /// Property of the current user holding the owner value, e.g. `user_id`.
    pub own_user_request_property: Option<String>,
    /// Document field holding the owner value.
    pub own_user_schema_property: Option<String>,

    /// Field path to display label.
    pub labels: HashMap<String, String>,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            base_url: "/crude".to_string(),
            url_field: "localUrl".to_string(),
            name_field: "name".to_string(),
            id_field: "id".to_string(),
            layout_view: None,
            edit_view: None,
            item_view: None,
            list_view: None,
            add_view: None,
            show_id: false,
            expand_paths: false,
            view_exclude_paths: Vec::new(),
            no_views: false,
            no_pagination: false,
            page_size: 20,
            own_user: false,
            own_user_request_property: None,
            own_user_schema_property: None,
            labels: HashMap::new(),
        }
    }
}

impl ControllerOptions {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
        .normalized()
    }

    /// Drop trailing slashes from `base_url` so item routes and redirect
    /// targets agree. `/` becomes the empty root base.
    pub fn normalized(mut self) -> Self {
        let trimmed = self.base_url.trim_end_matches('/').len();
        self.base_url.truncate(trimmed);
        self
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.view_exclude_paths.iter().any(|excluded| excluded == path)
    }

    /// Both property names, when ownership enforcement is on.
    pub fn ownership(&self) -> Option<(&str, &str)> {
        if !self.own_user {
            return None;
        }
        Some((
            self.own_user_request_property.as_deref()?,
            self.own_user_schema_property.as_deref()?,
        ))
    }
}
