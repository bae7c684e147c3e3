//! Reusable field rules.
//!
//! Each constructor returns a [`ValidatorFn`]. Rules other than [`required`]
//! treat a missing or empty value as passing, so they compose with it.

use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde_json::Value;

use super::registry::{RuleContext, ValidatorFn};
use crate::reference::{extract_ref_param_keys, is_ref_param_key};
use crate::resolve::{EntityMeta, ValueType, is_empty_value};

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex"))
}

fn identifier_regex() -> &'static Regex {
    static IDENT: OnceLock<Regex> = OnceLock::new();
    IDENT.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"))
}

fn path_regex() -> &'static Regex {
    static PATH: OnceLock<Regex> = OnceLock::new();
    PATH.get_or_init(|| {
        Regex::new(r"^/([A-Za-z0-9._~\-]+|\{[A-Za-z0-9_]+\})?(/([A-Za-z0-9._~\-]+|\{[A-Za-z0-9_]+\}))*$")
            .expect("valid regex")
    })
}

/// Wrap a closure as a [`ValidatorFn`]; also the entry point for dynamic rules.
pub fn custom<F>(f: F) -> ValidatorFn
where
    F: Fn(Option<&Value>, &str, &RuleContext<'_>) -> Result<(), String> + Send + Sync + 'static,
{
    Arc::new(f)
}

// =============================================================================
// SCHEMA-DERIVED
// =============================================================================

pub fn required() -> ValidatorFn {
    custom(|value, label, _| match value {
        Some(v) if !is_empty_value(v) => Ok(()),
        _ => Err(format!("{} is required", label)),
    })
}

pub fn one_of(allowed: Vec<String>) -> ValidatorFn {
    custom(move |value, label, _| {
        let Some(v) = value.and_then(Value::as_str).filter(|s| !s.is_empty()) else {
            return Ok(());
        };
        if allowed.iter().any(|a| a == v) {
            Ok(())
        } else {
            Err(format!("{} must be one of: {}", label, allowed.join(", ")))
        }
    })
}

pub fn max_length(max: usize) -> ValidatorFn {
    custom(move |value, label, _| match value.and_then(Value::as_str) {
        Some(s) if s.chars().count() > max => {
            Err(format!("{} must be at most {} characters", label, max))
        }
        _ => Ok(()),
    })
}

// =============================================================================
// FORMAT RULES
// =============================================================================

/// Absolute http(s) URL, or a URL that starts with a reference token.
pub fn url_format() -> ValidatorFn {
    custom(|value, label, _| {
        let Some(url) = value.and_then(Value::as_str).map(str::trim) else {
            return Ok(());
        };
        if url.is_empty() || url.starts_with("#{") {
            return Ok(());
        }
        let rest = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"));
        match rest {
            Some(host) if !host.is_empty() && !host.contains(char::is_whitespace) => Ok(()),
            _ => Err(format!("{} must be a valid http(s) URL", label)),
        }
    })
}

/// Request path served by an inbound HTTP entry: `/a/{param}/b`.
pub fn path_format() -> ValidatorFn {
    custom(|value, label, _| {
        let Some(path) = value.and_then(Value::as_str) else {
            return Ok(());
        };
        if path.is_empty() || path_regex().is_match(path) {
            Ok(())
        } else {
            Err(format!(
                "{} must start with '/' and may only use {{name}} placeholders",
                label
            ))
        }
    })
}

/// Comma separated string or array of e-mail addresses.
pub fn email_list() -> ValidatorFn {
    custom(|value, label, _| {
        let addresses: Vec<&str> = match value {
            Some(Value::String(s)) => s.split(',').map(str::trim).filter(|a| !a.is_empty()).collect(),
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            _ => return Ok(()),
        };
        match addresses
            .iter()
            .find(|a| !is_ref_param_key(a) && !email_regex().is_match(a))
        {
            Some(bad) => Err(format!("{} contains an invalid e-mail address '{}'", label, bad)),
            None => Ok(()),
        }
    })
}

/// `[{ name, type }]` declarations: names well formed and unique, types known.
pub fn argument_list() -> ValidatorFn {
    custom(|value, label, _| {
        let Some(items) = value.and_then(Value::as_array) else {
            return Ok(());
        };
        let mut seen = HashSet::new();
        for item in items {
            let name = item.get("name").and_then(Value::as_str).unwrap_or("").trim();
            if name.is_empty() {
                return Err(format!("{}: every argument needs a name", label));
            }
            if !identifier_regex().is_match(name) {
                return Err(format!("{}: '{}' is not a valid argument name", label, name));
            }
            if !seen.insert(name) {
                return Err(format!("{}: argument name '{}' is used twice", label, name));
            }
            let tag = item.get("type").and_then(Value::as_str).unwrap_or("");
            if ValueType::from_tag(tag).is_none() {
                return Err(format!("{}: argument '{}' has no valid type", label, name));
            }
        }
        Ok(())
    })
}

// =============================================================================
// NODE-SHAPED RULES
// =============================================================================

pub fn timer_settings() -> ValidatorFn {
    custom(|value, label, _| {
        let Some(settings) = value.and_then(Value::as_object) else {
            return Ok(());
        };
        match settings.get("type").and_then(Value::as_str) {
            Some("ONCE") => {
                let at = settings.get("executionEpochSecond").and_then(Value::as_i64);
                match at {
                    Some(t) if t > 0 => Ok(()),
                    _ => Err(format!("{}: a one-off timer needs an execution time", label)),
                }
            }
            Some("SCHEDULE") => {
                let rules = settings.get("rules").and_then(Value::as_array);
                match rules {
                    Some(r) if !r.is_empty() => Ok(()),
                    _ => Err(format!("{}: a schedule needs at least one rule", label)),
                }
            }
            _ => Err(format!("{}: type must be ONCE or SCHEDULE", label)),
        }
    })
}

/// If/else: at least one case, each case with at least one condition.
pub fn ifelse_choice() -> ValidatorFn {
    custom(|value, label, _| {
        let Some(choice) = value.and_then(Value::as_object) else {
            return Ok(());
        };
        let cases = choice.get("when").and_then(Value::as_array);
        let Some(cases) = cases.filter(|c| !c.is_empty()) else {
            return Err(format!("{}: add at least one case", label));
        };
        for (i, case) in cases.iter().enumerate() {
            let conditions = case.get("conditions").and_then(Value::as_array);
            if conditions.is_none_or(|c| c.is_empty()) {
                return Err(format!("{}: case {} has no conditions", label, i + 1));
            }
        }
        Ok(())
    })
}

pub fn email_sender() -> ValidatorFn {
    custom(|value, label, _| {
        let Some(config) = value.and_then(Value::as_object) else {
            return Ok(());
        };
        match config.get("type").and_then(Value::as_str) {
            Some("GOOGLE") => Ok(()),
            Some("SMTP") => {
                let missing = ["host", "port", "username"]
                    .into_iter()
                    .find(|k| config.get(*k).is_none_or(is_empty_value));
                match missing {
                    Some(key) => Err(format!("{}: SMTP {} is required", label, key)),
                    None => Ok(()),
                }
            }
            _ => Err(format!("{}: type must be SMTP or GOOGLE", label)),
        }
    })
}

/// MQTT subscription filter: `+` and `#` only as whole levels, `#` last.
pub fn mqtt_topic() -> ValidatorFn {
    custom(|value, label, _| {
        let Some(topic) = value.and_then(Value::as_str).filter(|t| !t.is_empty()) else {
            return Ok(());
        };
        let levels: Vec<&str> = topic.split('/').collect();
        let last = levels.len() - 1;
        for (i, level) in levels.iter().enumerate() {
            let bad_plus = level.contains('+') && *level != "+";
            let bad_hash = level.contains('#') && (*level != "#" || i != last);
            if bad_plus || bad_hash || level.contains(char::is_whitespace) {
                return Err(format!("{} is not a valid topic filter", label));
            }
        }
        Ok(())
    })
}

// =============================================================================
// CROSS-NODE RULES
// =============================================================================

/// Every reference token in the value must point at an upstream node and an
/// output that node currently exposes.
pub fn references_resolve() -> ValidatorFn {
    custom(|value, label, ctx| {
        let Some(value) = value else { return Ok(()) };
        let mut texts = Vec::new();
        collect_strings(value, &mut texts);
        for text in texts {
            for (token, key) in extract_ref_param_keys(text) {
                if !ctx.upstream.contains_node(&key.node_id) {
                    return Err(format!(
                        "{} references node '{}', which is not upstream of this node",
                        label, key.node_id
                    ));
                }
                if !ctx.upstream.contains_key(&token) {
                    return Err(format!(
                        "{} references '{}' of node '{}', which no longer resolves",
                        label, key.output_key, key.node_id
                    ));
                }
            }
        }
        Ok(())
    })
}

fn collect_strings<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::String(s) => out.push(s),
        Value::Array(items) => items.iter().for_each(|v| collect_strings(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_strings(v, out)),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

/// Entity keys (a string, an array of strings or the keys of a map) must exist
/// in the entity catalog.
pub fn entity_keys_exist() -> ValidatorFn {
    custom(|value, label, ctx| {
        let keys: Vec<&str> = match value {
            Some(Value::String(s)) if !s.is_empty() => vec![s.as_str()],
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            Some(Value::Object(map)) => map.keys().map(String::as_str).collect(),
            _ => return Ok(()),
        };
        match keys.into_iter().find(|k| ctx.entities.get(k).is_none()) {
            Some(missing) => Err(format!("{}: entity '{}' no longer exists", label, missing)),
            None => Ok(()),
        }
    })
}

/// Literal values assigned to entities must respect the entity's type,
/// range, length and enum set. Values containing reference tokens are
/// checked at run time instead.
pub fn entity_values_in_range() -> ValidatorFn {
    custom(|value, label, ctx| {
        let Some(map) = value.and_then(Value::as_object) else {
            return Ok(());
        };
        for (key, assigned) in map {
            let Some(meta) = ctx.entities.get(key) else {
                continue;
            };
            if is_empty_value(assigned) {
                continue;
            }
            if assigned.as_str().is_some_and(|s| s.contains("#{")) {
                continue;
            }
            check_entity_value(meta, assigned).map_err(|reason| {
                format!("{}: value for '{}' {}", label, meta.name, reason)
            })?;
        }
        Ok(())
    })
}

fn check_entity_value(meta: &EntityMeta, value: &Value) -> Result<(), String> {
    if let Some(allowed) = &meta.enum_values {
        let literal = scalar_text(value);
        if !allowed.contains_key(&literal) {
            return Err(format!("must be one of: {}", join_keys(allowed.keys())));
        }
        return Ok(());
    }

    match meta.value_type {
        ValueType::Long | ValueType::Double => {
            let number = match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            let Some(number) = number else {
                return Err("must be a number".to_string());
            };
            if meta.value_type == ValueType::Long && number.fract() != 0.0 {
                return Err("must be a whole number".to_string());
            }
            if let Some(min) = meta.min.filter(|min| number < *min) {
                return Err(format!("must be at least {}", min));
            }
            if let Some(max) = meta.max.filter(|max| number > *max) {
                return Err(format!("must be at most {}", max));
            }
        }
        ValueType::Boolean => {
            let ok = matches!(value, Value::Bool(_))
                || matches!(value.as_str(), Some("true") | Some("false"));
            if !ok {
                return Err("must be true or false".to_string());
            }
        }
        ValueType::String => {
            let len = scalar_text(value).chars().count();
            if let Some(min) = meta.min_length.filter(|min| len < *min) {
                return Err(format!("must be at least {} characters", min));
            }
            if let Some(max) = meta.max_length.filter(|max| len > *max) {
                return Err(format!("must be at most {} characters", max));
            }
        }
        ValueType::Binary | ValueType::Object => {}
    }
    Ok(())
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn join_keys<'a>(keys: impl Iterator<Item = &'a String>) -> String {
    keys.map(String::as_str).collect::<Vec<_>>().join(", ")
}
