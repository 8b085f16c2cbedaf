//! Template renderer adapters.
//!
//! [`DirectoryRenderer`] renders full Tera templates from disk.
//! [`SimpleRenderer`] keeps templates in memory and only understands the
//! placeholder subset, `{{ key }}` or `{{ key.nested }}`, which renders the
//! same under both.

mod directory;
mod simple;

pub use directory::DirectoryRenderer;
pub use simple::SimpleRenderer;

use indexmap::IndexMap;

use forgecss_core::{application::ApplicationError, domain::Value, error::ForgeResult};

/// Replace every placeholder in `source`. Unknown keys are an error.
pub(crate) fn substitute(
    template: &str,
    source: &str,
    model: &IndexMap<String, Value>,
) -> ForgeResult<String> {
    let failed = |reason: String| ApplicationError::RenderingFailed {
        template: template.to_owned(),
        reason,
    };

    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let close = after
            .find("}}")
            .ok_or_else(|| failed("unclosed '{{' placeholder".into()))?;
        let key = after[..close].trim();
        let value = lookup(model, key)
            .ok_or_else(|| failed(format!("unknown placeholder '{key}'")))?;
        out.push_str(&value.to_text());
        rest = &after[close + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

fn lookup<'m>(model: &'m IndexMap<String, Value>, key: &str) -> Option<&'m Value> {
    match key.split_once('.') {
        Some((head, tail)) => model.get(head)?.get_path(tail),
        None => model.get(key),
    }
}
