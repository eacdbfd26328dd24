//! Line-oriented draft editing scripts for `forms edit` and `forms compose`.
//!
//! One step per line. Blank lines and lines starting with `#` are skipped.
//!
//! ```text
//! title Event Survey
//! description Collected at the door
//! add name="Team" type=select options="Red, Blue" required=true
//! update 1700000000000 required=false
//! remove 1700000000001
//! show
//! save
//! ```
//!
//! `key=value` values may be double-quoted to include spaces. An empty
//! `type` means text. Input that ends without `save` or `cancel` saves.

#[cfg(test)]
#[path = "script_test.rs"]
mod script_test;

use forms::template::parse_options;
use forms::{FieldCommand, FieldPatch, FieldType, Id, NewField, TemplateError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Title(String),
    /// `None` clears the description.
    Description(Option<String>),
    Field(FieldCommand),
    Show,
    Save,
    Cancel,
}

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("line {line}: {source}")]
    Template {
        line: usize,
        #[source]
        source: TemplateError,
    },
}

/// Parse a whole script into steps, stopping at the first bad line.
///
/// # Errors
///
/// Returns the first line that does not parse, numbered from 1.
pub fn parse_script(input: &str) -> Result<Vec<Step>, ScriptError> {
    let mut steps = Vec::new();
    for (index, raw) in input.lines().enumerate() {
        let line = index + 1;
        match parse_line(raw) {
            Ok(Some(step)) => steps.push(step),
            Ok(None) => {}
            Err(LineError::Syntax(message)) => return Err(ScriptError::Syntax { line, message }),
            Err(LineError::Template(source)) => return Err(ScriptError::Template { line, source }),
        }
    }
    Ok(steps)
}

enum LineError {
    Syntax(String),
    Template(TemplateError),
}

impl From<TemplateError> for LineError {
    fn from(error: TemplateError) -> Self {
        Self::Template(error)
    }
}

fn syntax(message: impl Into<String>) -> LineError {
    LineError::Syntax(message.into())
}

fn parse_line(raw: &str) -> Result<Option<Step>, LineError> {
    let line = raw.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let step = match verb.to_ascii_lowercase().as_str() {
        "title" => Step::Title(rest.to_owned()),
        "description" => Step::Description(Some(rest.to_owned()).filter(|d| !d.is_empty())),
        "show" => Step::Show,
        "save" => Step::Save,
        "cancel" => Step::Cancel,
        "add" => Step::Field(FieldCommand::Add(new_field(&tokenize(rest)?)?)),
        "update" => {
            let tokens = tokenize(rest)?;
            let (id, pairs) = tokens.split_first().ok_or_else(|| syntax("update needs a field id"))?;
            let patch = field_patch(pairs)?;
            if patch.is_empty() {
                return Err(syntax("update needs at least one key=value"));
            }
            Step::Field(FieldCommand::Update { id: Id::new(id.as_str()), patch })
        }
        "remove" => match tokenize(rest)?.as_slice() {
            [id] => Step::Field(FieldCommand::Remove { id: Id::new(id.as_str()) }),
            _ => return Err(syntax("remove takes exactly one field id")),
        },
        other => return Err(syntax(format!("unknown step `{other}`"))),
    };
    Ok(Some(step))
}

fn new_field(tokens: &[String]) -> Result<NewField, LineError> {
    let mut field = NewField::new("", FieldType::Text);
    for (key, value) in pairs(tokens)? {
        match key {
            "name" => field.name = value.to_owned(),
            "type" => field.field_type = FieldType::parse_or_text(value)?,
            "options" => field.options = parse_options(value),
            "required" => field.required = parse_bool(value)?,
            other => return Err(syntax(format!("unknown field key `{other}`"))),
        }
    }
    if field.name.trim().is_empty() {
        return Err(TemplateError::BlankFieldName.into());
    }
    Ok(field)
}

fn field_patch(tokens: &[String]) -> Result<FieldPatch, LineError> {
    let mut patch = FieldPatch::default();
    for (key, value) in pairs(tokens)? {
        match key {
            "name" => patch.name = Some(value.to_owned()),
            "type" => patch.field_type = Some(FieldType::parse_or_text(value)?),
            "options" => patch.options = Some(parse_options(value)),
            "required" => patch.required = Some(parse_bool(value)?),
            other => return Err(syntax(format!("unknown field key `{other}`"))),
        }
    }
    Ok(patch)
}

fn pairs(tokens: &[String]) -> Result<Vec<(&str, &str)>, LineError> {
    tokens
        .iter()
        .map(|token| token.split_once('=').ok_or_else(|| syntax(format!("expected key=value, got `{token}`"))))
        .collect()
}

fn parse_bool(raw: &str) -> Result<bool, LineError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(syntax(format!("expected true or false, got `{raw}`"))),
    }
}

/// Split on whitespace, keeping double-quoted runs together. Quotes are
/// removed; `\"` inside quotes is a literal quote.
fn tokenize(input: &str) -> Result<Vec<String>, LineError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quoted = false;
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                quoted = !quoted;
                in_token = true;
            }
            '\\' if quoted => match chars.next() {
                Some(next) => current.push(next),
                None => return Err(syntax("dangling escape")),
            },
            c if c.is_whitespace() && !quoted => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if quoted {
        return Err(syntax("unterminated quote"));
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}
