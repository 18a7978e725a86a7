//! Cypher text for [`Statement`]s.
//!
//! Every string literal and identifier is escaped here, so callers hand over
//! raw labels, URIs and literal values.

use std::fmt::Write;

use super::domain::{NodeKey, PropertyValue, Statement};

/// Renders `statement` as a single Cypher write operation.
#[must_use]
pub fn render(statement: &Statement) -> String {
    match statement {
        Statement::MergeNode {
            key,
            compact_id,
            extra_labels,
        } => {
            let mut text = format!(
                "MERGE {} SET n.`name` = {}",
                node_pattern("n", key),
                quote_string(compact_id)
            );
            for label in extra_labels {
                let _ = write!(text, ", n:{}", quote_identifier(label));
            }
            text
        }
        Statement::MergeEdge(edge) => format!(
            "MATCH (src:{} {{uri: {}}}), (dest:{} {{uri: {}}}) MERGE (src)-[:{}]->(dest)",
            quote_identifier(edge.src_label.as_str()),
            quote_string(&edge.src_uri),
            quote_identifier(edge.dest_label.as_str()),
            quote_string(&edge.dest_uri),
            quote_identifier(&edge.relationship),
        ),
        Statement::SetProperties { key, properties } => {
            let assignments = properties
                .iter()
                .map(|(name, value)| format!("n.{} = {}", quote_identifier(name), render_value(value)))
                .collect::<Vec<_>>()
                .join(", ");
            format!("MATCH {} SET {assignments}", node_pattern("n", key))
        }
        Statement::UniqueUri(label) => format!(
            "CREATE CONSTRAINT ON (n:{}) ASSERT n.uri IS UNIQUE",
            quote_identifier(label.as_str())
        ),
    }
}

fn node_pattern(variable: &str, key: &NodeKey) -> String {
    format!(
        "({variable}:{} {{uri: {}}})",
        quote_identifier(key.label.as_str()),
        quote_string(&key.uri)
    )
}

fn render_value(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Text(text) => quote_string(text),
        PropertyValue::List(items) => {
            let items: Vec<_> = items.iter().map(|item| quote_string(item)).collect();
            format!("[{}]", items.join(", "))
        }
    }
}

/// Single-quoted Cypher string literal.
#[must_use]
pub fn quote_string(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for ch in value.chars() {
        match ch {
            '\\' => quoted.push_str("\\\\"),
            '\'' => quoted.push_str("\\'"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            ch if ch.is_control() => {
                let _ = write!(quoted, "\\u{:04x}", u32::from(ch));
            }
            ch => quoted.push(ch),
        }
    }
    quoted.push('\'');
    quoted
}

/// Backtick-quoted Cypher identifier (label, relationship type or key).
#[must_use]
pub fn quote_identifier(value: &str) -> String {
    format!("`{}`", value.replace('`', "``"))
}
