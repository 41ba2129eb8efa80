//! Document shape descriptions.
//!
//! A [`DocumentSchema`] declares every recognized field of one content
//! document: its path, kind, default value, and whether it counts toward the
//! completion percentage. The schema drives default-document construction and
//! the default-filling merge, replacing per-page hand-written merge
//! functions with one generic mechanism.

use serde_json::{json, Value};

use crate::path::{DotPath, Segment};

/// Subscription tier gating list lengths. Sourced from external site
/// context; never persisted with the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Plan {
    #[default]
    Basic,
    Pro,
}

/// Per-tier item caps for a list field. The cap is advisory: adding past it
/// is refused with a user-visible error, but `save()` never checks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanLimits {
    pub basic: usize,
    pub pro: usize,
}

impl PlanLimits {
    pub const fn new(basic: usize, pro: usize) -> Self {
        Self { basic, pro }
    }

    pub fn for_plan(&self, plan: Plan) -> usize {
        match plan {
            Plan::Basic => self.basic,
            Plan::Pro => self.pro,
        }
    }
}

/// What kind of value a field holds, with its default.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Free text. An empty string counts as absent during merge.
    Text { default: String },
    Flag { default: bool },
    Number { default: f64 },
    /// A URL-valued media field, eligible for file staging. Defaults empty.
    Media,
    List(ListSpec),
}

/// One recognized field. `name` is a dot-path relative to the document root
/// (`"hero.title"` nests), or relative to the item for list item fields.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub fn text(name: &str, default: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Text {
                default: default.to_string(),
            },
            required: false,
        }
    }

    pub fn flag(name: &str, default: bool) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Flag { default },
            required: false,
        }
    }

    pub fn number(name: &str, default: f64) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Number { default },
            required: false,
        }
    }

    pub fn media(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Media,
            required: false,
        }
    }

    pub fn list(name: &str, spec: ListSpec) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::List(spec),
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn default_value(&self) -> Value {
        match &self.kind {
            FieldKind::Text { default } => json!(default),
            FieldKind::Flag { default } => json!(default),
            FieldKind::Number { default } => json!(default),
            FieldKind::Media => json!(""),
            FieldKind::List(spec) => spec.default_list(),
        }
    }
}

/// Shape of a list field's records.
#[derive(Debug, Clone, PartialEq)]
pub struct ListSpec {
    /// Prefix for generated record identities (`"testimonial-0"`).
    pub id_prefix: String,
    /// Fields of one record, paths relative to the record.
    pub item_fields: Vec<FieldSpec>,
    /// Per-tier soft caps.
    pub max_items: PlanLimits,
    /// Sequential field renumbered after reordering, if the document carries
    /// one (`"order"`, `"number"`).
    pub order_field: Option<String>,
    /// How many blank records the default document starts with.
    pub default_items: usize,
}

impl ListSpec {
    pub fn new(id_prefix: &str, item_fields: Vec<FieldSpec>, max_items: PlanLimits) -> Self {
        Self {
            id_prefix: id_prefix.to_string(),
            item_fields,
            max_items,
            order_field: None,
            default_items: 1,
        }
    }

    pub fn with_order_field(mut self, name: &str) -> Self {
        self.order_field = Some(name.to_string());
        self
    }

    pub fn with_default_items(mut self, count: usize) -> Self {
        self.default_items = count;
        self
    }

    /// A blank record carrying the given identity.
    pub fn default_item(&self, id: &str) -> Value {
        let mut item = json!({ "id": id });
        for field in &self.item_fields {
            let path = DotPath::parse(&field.name).expect("schema field names are valid paths");
            crate::path::set_path(&mut item, &path, field.default_value())
                .expect("blank record construction cannot hit a type mismatch");
        }
        item
    }

    fn default_list(&self) -> Value {
        let items: Vec<Value> = (0..self.default_items)
            .map(|i| {
                let mut item = self.default_item(&format!("{}-{}", self.id_prefix, i));
                if let Some(order) = &self.order_field {
                    item[order.as_str()] = json!(i + 1);
                }
                item
            })
            .collect();
        Value::Array(items)
    }
}

/// Every recognized field of one document type.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSchema {
    pub name: String,
    pub fields: Vec<FieldSpec>,
}

impl DocumentSchema {
    pub fn new(name: &str, fields: Vec<FieldSpec>) -> Self {
        Self {
            name: name.to_string(),
            fields,
        }
    }

    /// The fully-populated default document. Every declared field is present
    /// with its default value; nothing is `null`.
    pub fn default_document(&self) -> Value {
        let mut doc = json!({});
        for field in &self.fields {
            let path = DotPath::parse(&field.name).expect("schema field names are valid paths");
            crate::path::set_path(&mut doc, &path, field.default_value())
                .expect("default construction cannot hit a type mismatch");
        }
        doc
    }

    /// Look up the list spec for a list field by name.
    pub fn list_spec(&self, name: &str) -> Option<&ListSpec> {
        self.fields.iter().find_map(|f| match (&f.kind, f.name.as_str()) {
            (FieldKind::List(spec), n) if n == name => Some(spec),
            _ => None,
        })
    }

    /// Percentage of required fields that are filled in, 0-100. Advisory
    /// only: an incomplete document still saves.
    ///
    /// Required list item fields are counted per record.
    pub fn completeness(&self, doc: &Value) -> u8 {
        let mut total = 0usize;
        let mut filled = 0usize;

        for field in &self.fields {
            match &field.kind {
                FieldKind::List(spec) => {
                    let path = match DotPath::parse(&field.name) {
                        Ok(p) => p,
                        Err(_) => continue,
                    };
                    let items = crate::path::get_path(doc, &path)
                        .and_then(|v| v.as_array())
                        .cloned()
                        .unwrap_or_default();
                    for (i, _) in items.iter().enumerate() {
                        for item_field in spec.item_fields.iter().filter(|f| f.required) {
                            total += 1;
                            let item_path = path
                                .join(Segment::Index(i));
                            let full = DotPath::parse(&format!("{}.{}", item_path, item_field.name))
                                .expect("schema field names are valid paths");
                            if field_is_filled(doc, &full) {
                                filled += 1;
                            }
                        }
                    }
                }
                _ if field.required => {
                    total += 1;
                    if let Ok(path) = DotPath::parse(&field.name) {
                        if field_is_filled(doc, &path) {
                            filled += 1;
                        }
                    }
                }
                _ => {}
            }
        }

        if total == 0 {
            return 100;
        }
        ((filled * 100) / total) as u8
    }
}

fn field_is_filled(doc: &Value, path: &DotPath) -> bool {
    match crate::path::get_path(doc, path) {
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Null) | None => false,
        Some(_) => true,
    }
}
