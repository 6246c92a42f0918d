use std::collections::BTreeMap;

use serde_json::Value;
use tracing::warn;

use super::context::AuthContext;

/// Replaces `{{tenantId}}`/`{{regionId}}` inside the serialized payload.
///
/// Values are JSON-escaped before insertion. If the substituted text no
/// longer parses, the original payload is returned and a warning logged.
#[must_use]
pub fn substitute_payload(payload: &Value, auth: &AuthContext) -> Value {
    let serialized = match serde_json::to_string(payload) {
        Ok(serialized) => serialized,
        Err(err) => {
            warn!("Failed to serialize payload for substitution: {}", err);
            return payload.clone();
        }
    };
    if !serialized.contains("{{") {
        return payload.clone();
    }

    let vars: BTreeMap<String, String> = auth
        .template_vars()
        .into_iter()
        .map(|(key, value)| (key, json_escape(&value)))
        .collect();
    let rendered = render_template(&serialized, &vars);

    match serde_json::from_str(&rendered) {
        Ok(substituted) => substituted,
        Err(err) => {
            warn!(
                "Token substitution produced invalid JSON, using original payload: {}",
                err
            );
            payload.clone()
        }
    }
}

/// Escapes `value` for insertion inside a JSON string literal.
fn json_escape(value: &str) -> String {
    let quoted = Value::String(value.to_owned()).to_string();
    quoted
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .map_or_else(String::new, str::to_owned)
}

/// Renders `{{key}}` placeholders from `vars`; unknown keys are kept.
#[must_use]
pub fn render_template(input: &str, vars: &BTreeMap<String, String>) -> String {
    let mut rest = input;
    let mut output = String::with_capacity(input.len());

    loop {
        let Some(start) = rest.find("{{") else {
            output.push_str(rest);
            break;
        };
        let (before, after_start) = rest.split_at(start);
        output.push_str(before);
        let Some(after) = after_start.strip_prefix("{{") else {
            output.push_str(after_start);
            break;
        };
        let Some(end) = after.find("}}") else {
            output.push_str("{{");
            output.push_str(after);
            break;
        };
        let (key_part, after_end) = after.split_at(end);
        let key = key_part.trim();
        if let Some(value) = vars.get(key) {
            output.push_str(value);
        } else {
            output.push_str("{{");
            output.push_str(key_part);
            output.push_str("}}");
        }
        rest = after_end.strip_prefix("}}").unwrap_or(after_end);
    }

    output
}
