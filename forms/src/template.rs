//! Form templates and the field editor.
//!
//! DESIGN
//! ======
//! A template lives in two tiers. [`FormTemplate`] mirrors what the server
//! holds; [`TemplateDraft`] is the edit buffer an operator works on. Field
//! edits are expressed as [`FieldCommand`]s applied to a draft and never touch
//! the server. A draft only becomes durable when the caller hands it to the
//! template store for create/update.
//!
//! Field ids are generated client-side from the wall clock in epoch
//! milliseconds. Within one draft they are kept strictly increasing so two
//! fields added in the same millisecond still get distinct ids.

#[cfg(test)]
#[path = "template_test.rs"]
mod template_test;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::Id;

/// Errors raised by local template and field editing.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// Title is empty or whitespace only.
    #[error("Please enter a form title.")]
    BlankTitle,
    /// A field was added without a name.
    #[error("field name must not be empty")]
    BlankFieldName,
    /// Field type text did not match any known input type.
    #[error("unknown field type `{0}` (expected text, textarea, email, number or select)")]
    UnknownFieldType(String),
    /// A field command referenced an id that is not in the draft.
    #[error("no field with id {0}")]
    UnknownField(Id),
    /// An update was requested for a draft that was never saved.
    #[error("template has not been created yet")]
    Unsaved,
}

/// Input type of a custom field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FieldType {
    #[default]
    Text,
    Textarea,
    Email,
    Number,
    Select,
    /// A stored type this client does not know. Renders as single-line text
    /// and is written back unchanged.
    Other(String),
}

impl FieldType {
    pub const ALL: [Self; 5] = [Self::Text, Self::Textarea, Self::Email, Self::Number, Self::Select];

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Email => "email",
            Self::Number => "number",
            Self::Select => "select",
            Self::Other(raw) => raw,
        }
    }

    /// Parse operator input, treating an empty answer as `text`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::UnknownFieldType`] for unrecognized names.
    pub fn parse_or_text(raw: &str) -> Result<Self, TemplateError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Self::Text);
        }
        raw.parse()
    }
}

impl FromStr for FieldType {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| TemplateError::UnknownFieldType(s.to_owned()))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Stored types are free text on the server. A missing or null type is text;
/// an unrecognized one is kept as [`FieldType::Other`].
impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<String>::deserialize(deserializer)? {
            None => Self::Text,
            Some(raw) => raw.parse().unwrap_or(Self::Other(raw)),
        })
    }
}

/// One configurable input within a form template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub id: Id,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    /// Choices for `select` fields. Kept but ignored for other types.
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub required: bool,
    /// Stored keys this client does not model, such as `placeholder`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FieldDefinition {
    /// Options that apply when rendering the input.
    #[must_use]
    pub fn rendered_options(&self) -> &[String] {
        if self.field_type == FieldType::Select { &self.options } else { &[] }
    }
}

/// A form template as stored on the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormTemplate {
    pub id: Id,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

/// Body of `POST /api/forms` and `PUT /api/forms/{id}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TemplatePayload<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub fields: &'a [FieldDefinition],
}

/// Attributes of a field about to be added to a draft.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewField {
    pub name: String,
    pub field_type: FieldType,
    pub options: Vec<String>,
    pub required: bool,
}

impl NewField {
    #[must_use]
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self { name: name.into(), field_type, options: Vec::new(), required: false }
    }

    #[must_use]
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

/// Partial update merged into an existing field. `None` keeps the old value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldPatch {
    pub name: Option<String>,
    pub field_type: Option<FieldType>,
    pub options: Option<Vec<String>>,
    pub required: Option<bool>,
}

impl FieldPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.field_type.is_none() && self.options.is_none() && self.required.is_none()
    }

    fn apply_to(self, field: &mut FieldDefinition) {
        if let Some(name) = self.name {
            field.name = name;
        }
        if let Some(field_type) = self.field_type {
            field.field_type = field_type;
        }
        if let Some(options) = self.options {
            field.options = options;
        }
        if let Some(required) = self.required {
            field.required = required;
        }
    }
}

/// Structured field-editor command applied to a [`TemplateDraft`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldCommand {
    Add(NewField),
    Update { id: Id, patch: FieldPatch },
    Remove { id: Id },
}

/// Edit buffer for a new or existing template.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TemplateDraft {
    /// `None` until the template has been created on the server.
    pub id: Option<Id>,
    pub title: String,
    pub description: Option<String>,
    pub fields: Vec<FieldDefinition>,
}

impl TemplateDraft {
    /// Empty draft for a template that does not exist yet.
    #[must_use]
    pub fn new(title: impl Into<String>, description: Option<String>) -> Self {
        Self { id: None, title: title.into(), description, fields: Vec::new() }
    }

    /// Draft seeded from a stored template.
    #[must_use]
    pub fn from_template(template: &FormTemplate) -> Self {
        Self {
            id: Some(template.id.clone()),
            title: template.title.clone(),
            description: template.description.clone(),
            fields: template.fields.clone(),
        }
    }

    /// Reject drafts whose title is blank.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::BlankTitle`].
    pub fn validate(&self) -> Result<(), TemplateError> {
        if self.title.trim().is_empty() {
            return Err(TemplateError::BlankTitle);
        }
        Ok(())
    }

    #[must_use]
    pub fn payload(&self) -> TemplatePayload<'_> {
        TemplatePayload {
            title: &self.title,
            description: self.description.as_deref().unwrap_or_default(),
            fields: &self.fields,
        }
    }

    /// Stored form of this draft once the server has accepted it under `id`.
    #[must_use]
    pub fn to_template(&self, id: Id) -> FormTemplate {
        FormTemplate {
            id,
            title: self.title.clone(),
            description: self.description.clone(),
            fields: self.fields.clone(),
        }
    }

    #[must_use]
    pub fn field(&self, id: &Id) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| &field.id == id)
    }

    /// Append a field with an id derived from the current time.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::BlankFieldName`] when the name is blank.
    pub fn add_field(&mut self, field: NewField) -> Result<Id, TemplateError> {
        self.add_field_at(field, crate::now_ms())
    }

    /// Append a field, deriving its id from `now_ms`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::BlankFieldName`] when the name is blank.
    pub fn add_field_at(&mut self, field: NewField, now_ms: u64) -> Result<Id, TemplateError> {
        if field.name.trim().is_empty() {
            return Err(TemplateError::BlankFieldName);
        }
        let id = next_field_id(&self.fields, now_ms);
        self.fields.push(FieldDefinition {
            id: id.clone(),
            name: field.name,
            field_type: field.field_type,
            options: field.options,
            required: field.required,
            extra: Map::new(),
        });
        Ok(id)
    }

    /// Drop the field with `id`, returning it if it was present.
    pub fn remove_field(&mut self, id: &Id) -> Option<FieldDefinition> {
        let index = self.fields.iter().position(|field| &field.id == id)?;
        Some(self.fields.remove(index))
    }

    /// Merge `patch` into the field with `id`.
    pub fn update_field(&mut self, id: &Id, patch: FieldPatch) -> Option<&FieldDefinition> {
        let field = self.fields.iter_mut().find(|field| &field.id == id)?;
        patch.apply_to(field);
        Some(field)
    }

    /// Run one editor command against the draft.
    ///
    /// Returns the id of the field the command touched.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::UnknownField`] when an update/remove targets a
    /// missing field, or [`TemplateError::BlankFieldName`] for a nameless add.
    pub fn apply(&mut self, command: FieldCommand) -> Result<Id, TemplateError> {
        match command {
            FieldCommand::Add(field) => self.add_field(field),
            FieldCommand::Update { id, patch } => match self.update_field(&id, patch) {
                Some(_) => Ok(id),
                None => Err(TemplateError::UnknownField(id)),
            },
            FieldCommand::Remove { id } => match self.remove_field(&id) {
                Some(_) => Ok(id),
                None => Err(TemplateError::UnknownField(id)),
            },
        }
    }
}

/// Next time-derived id that sorts after every numeric id already present.
#[must_use]
pub fn next_field_id(fields: &[FieldDefinition], now_ms: u64) -> Id {
    let floor = fields
        .iter()
        .filter_map(|field| field.id.as_u64())
        .max()
        .map_or(0, |max| max.saturating_add(1));
    Id::new(now_ms.max(floor).to_string())
}

/// Split a comma-separated option list, trimming entries and dropping empties.
#[must_use]
pub fn parse_options(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|option| !option.is_empty())
        .map(str::to_owned)
        .collect()
}
