//! Cross-node parameter references: `#{properties.<nodeId>['<outputKey>']}`.
//!
//! The grammar is a single opaque placeholder token. Node ids follow the node
//! id alphabet; output keys may contain anything except `'` and `]`.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

const TOKEN_BODY: &str = r"#\{properties\.([A-Za-z0-9_]+)\['([^'\]]+)'\]\}";

fn anchored_regex() -> &'static Regex {
    static ANCHORED: OnceLock<Regex> = OnceLock::new();
    ANCHORED.get_or_init(|| Regex::new(&format!("^{TOKEN_BODY}$")).expect("valid regex"))
}

fn embedded_regex() -> &'static Regex {
    static EMBEDDED: OnceLock<Regex> = OnceLock::new();
    EMBEDDED.get_or_init(|| Regex::new(TOKEN_BODY).expect("valid regex"))
}

/// A decoded reference token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefParamKey {
    pub node_id: String,
    pub output_key: String,
}

/// Format the reference token for `output_key` of node `node_id`.
pub fn gen_ref_param_key(node_id: &str, output_key: &str) -> String {
    format!("#{{properties.{node_id}['{output_key}']}}")
}

/// Decode a string that is exactly one reference token.
pub fn parse_ref_param_key(token: &str) -> Option<RefParamKey> {
    let caps = anchored_regex().captures(token)?;
    Some(RefParamKey {
        node_id: caps[1].to_string(),
        output_key: caps[2].to_string(),
    })
}

pub fn is_ref_param_key(token: &str) -> bool {
    anchored_regex().is_match(token)
}

/// Every reference token embedded anywhere in `text`, in order of appearance.
pub fn extract_ref_param_keys(text: &str) -> Vec<(String, RefParamKey)> {
    embedded_regex()
        .captures_iter(text)
        .map(|caps| {
            (
                caps[0].to_string(),
                RefParamKey {
                    node_id: caps[1].to_string(),
                    output_key: caps[2].to_string(),
                },
            )
        })
        .collect()
}
