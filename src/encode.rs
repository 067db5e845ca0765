//! Command string assembly.
//!
//! Outbound commands are colon-delimited:
//!
//! ```text
//! VERB-MOD::<target-identifier>:<ctag>::<datablock>;
//! VERB:::<ctag>::<params>;
//! ```
//!
//! Target identifiers and datablocks are comma-joined `KEY=value` lists
//! built from an ordered allow-list. Empty fields are legal and show up as
//! adjacent colons.

use std::collections::HashMap;

/// Supplied command parameters, keyed by protocol parameter name.
pub type Params<'a> = HashMap<&'a str, &'a str>;

/// Render the accepted parameters as a comma-joined `KEY=value` list.
///
/// Allow-list order is preserved; keys missing from `supplied` are silently
/// dropped. Values are inserted verbatim — callers must not pass values
/// containing `,`, `:` or `;`.
pub fn format_params(accepted: &[&str], supplied: &Params<'_>) -> String {
    let mut fields = Vec::new();
    for key in accepted {
        if let Some(value) = supplied.get(key) {
            fields.push(format!("{key}={value}"));
        }
    }
    fields.join(",")
}

/// Format a session-level command (`LOGIN`, `LOGOUT`, `SHAKEHAND`): no
/// target identifier, parameters in the datablock position.
pub fn session_command(verb: &str, ctag: &str, params: &str) -> String {
    format!("{verb}:::{ctag}::{params};")
}

/// Format a targeted command (`ADD-ONU`, `LST-OMDDM`, ...): target
/// identifier plus datablock.
pub fn target_command(verb: &str, target: &str, ctag: &str, datablock: &str) -> String {
    format!("{verb}::{target}:{ctag}::{datablock};")
}
