use serde_json::{Map, Value};
use thiserror::Error;

/// Errors from resolving a template against a scenario entry
#[derive(Debug, Error, PartialEq)]
pub enum TemplateError {
    #[error("template placeholder `{0}` not found in scenario entry")]
    UnknownPlaceholder(String),
    #[error("template contains an empty placeholder `{{}}`")]
    EmptyPlaceholder,
    #[error("template contains an unmatched `{{`")]
    UnmatchedOpenBrace,
    #[error("template contains an unmatched `}}`")]
    UnmatchedCloseBrace,
}

/// Substitute `{name}` placeholders in `template` with values from `fields`.
///
/// `{{` and `}}` escape literal braces. String values are inserted bare;
/// any other JSON value is inserted in its JSON rendering.
pub fn render(template: &str, fields: &Map<String, Value>) -> Result<String, TemplateError> {
    let mut result = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '{' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    result.push('{');
                    continue;
                }

                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(c) => name.push(c),
                        None => return Err(TemplateError::UnmatchedOpenBrace),
                    }
                }

                if name.is_empty() {
                    return Err(TemplateError::EmptyPlaceholder);
                }

                match fields.get(&name) {
                    Some(Value::String(s)) => result.push_str(s),
                    Some(value) => result.push_str(&value.to_string()),
                    None => return Err(TemplateError::UnknownPlaceholder(name)),
                }
            }
            '}' => {
                if chars.peek() == Some(&'}') {
                    chars.next();
                    result.push('}');
                } else {
                    return Err(TemplateError::UnmatchedCloseBrace);
                }
            }
            _ => result.push(ch),
        }
    }

    Ok(result)
}
