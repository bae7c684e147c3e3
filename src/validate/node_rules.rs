//! Built-in rule set: schema-derived rules for every catalog field, then the
//! node-specific rules per type.
//! SYNC NOTE: field names here must track the built-in schemas in
//! `resolve/catalog.rs`.

use super::registry::ValidatorRegistry;
use super::rules;
use crate::parse::types::NodeType;
use crate::resolve::NodeCatalog;

pub fn register_builtin(registry: &mut ValidatorRegistry, catalog: &NodeCatalog) {
    for node_type in NodeType::ALL {
        for field in catalog.fields(node_type) {
            if field.required {
                registry.register(node_type, &field.name, "required", rules::required());
            }
            if let Some(values) = &field.enum_values {
                registry.register(node_type, &field.name, "enum", rules::one_of(values.clone()));
            }
        }
        register_node_specific(registry, node_type);
    }
}

fn register_node_specific(registry: &mut ValidatorRegistry, node_type: NodeType) {
    let mut add = |field: &str, name: &str, check| registry.register(node_type, field, name, check);

    match node_type {
        NodeType::Trigger => {
            add("entityConfigs", "arguments", rules::argument_list());
        }
        NodeType::Timer => {
            add("timerSettings", "timer", rules::timer_settings());
        }
        NodeType::Listener => {
            add("entities", "entityKeys", rules::entity_keys_exist());
        }
        NodeType::Mqtt => {
            add("subscriptionTopic", "topic", rules::mqtt_topic());
        }
        NodeType::Httpin => {
            add("url", "path", rules::path_format());
        }
        NodeType::Ifelse => {
            add("choice", "cases", rules::ifelse_choice());
            add("choice", "references", rules::references_resolve());
        }
        NodeType::Code => {
            add("expression", "references", rules::references_resolve());
            add("inputArguments", "references", rules::references_resolve());
            add("payload", "arguments", rules::argument_list());
        }
        NodeType::Service => {
            add("serviceEntity", "entityKeys", rules::entity_keys_exist());
            add("serviceParams", "references", rules::references_resolve());
        }
        NodeType::Assigner => {
            add("exchangePayload", "entityKeys", rules::entity_keys_exist());
            add("exchangePayload", "entityValues", rules::entity_values_in_range());
            add("exchangePayload", "references", rules::references_resolve());
        }
        NodeType::Select => {
            add("entities", "entityKeys", rules::entity_keys_exist());
        }
        NodeType::Email => {
            add("emailConfig", "sender", rules::email_sender());
            add("recipients", "emails", rules::email_list());
            add("recipients", "references", rules::references_resolve());
            add("subject", "maxLength", rules::max_length(500));
            add("subject", "references", rules::references_resolve());
            add("content", "references", rules::references_resolve());
        }
        NodeType::Webhook => {
            add("webhookUrl", "url", rules::url_format());
            add("webhookUrl", "references", rules::references_resolve());
            add("secretKey", "maxLength", rules::max_length(100));
            add("inputArguments", "references", rules::references_resolve());
        }
        NodeType::Http => {
            add("url", "url", rules::url_format());
            add("url", "references", rules::references_resolve());
            add("header", "references", rules::references_resolve());
            add("params", "references", rules::references_resolve());
            add("body", "references", rules::references_resolve());
        }
        NodeType::Output => {
            add("outputVariables", "references", rules::references_resolve());
        }
    }
}
