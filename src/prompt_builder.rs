use std::collections::BTreeMap;

use anyhow::{Context, Result};
use tera::{Context as TeraContext, Tera};

/// Render the system rules for the field-completion call.
pub fn render_system_prompt(tera: &Tera) -> Result<String> {
    tera.render("prompts/system.tera", &TeraContext::new())
        .context("Failed to render template: prompts/system.tera")
}

/// Render the user prompt: the authoritative key list plus the current
/// field data (sentinel values marking what is still missing).
pub fn render_user_prompt(
    tera: &Tera,
    keys: &[String],
    reconciled: &BTreeMap<String, String>,
) -> Result<String> {
    let data = serde_json::to_string_pretty(reconciled)
        .context("Failed to serialize reconciled field data")?;

    let mut context = TeraContext::new();
    context.insert("keys", keys);
    context.insert("data", &data);

    tera.render("prompts/user.tera", &context)
        .context("Failed to render template: prompts/user.tera")
}
