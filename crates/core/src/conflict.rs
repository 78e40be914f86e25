//! Rejects an umbrella negation combined with one of its children.
//!
//! The check looks at the raw argument tokens rather than resolved values:
//! `--no-android --android_maven` is a contradiction even though the parser
//! would happily resolve both.

use tracing::debug;

use crate::umbrella::UmbrellaSchema;
use crate::{Error, Result};

/// Validate raw command line tokens against the umbrella schema.
///
/// # Errors
///
/// Returns [`Error::UsageConflict`] naming the first child found together
/// with its negated umbrella.
pub fn validate<S: AsRef<str>>(raw_args: &[S], schema: &UmbrellaSchema) -> Result<()> {
    let has = |token: &str| raw_args.iter().any(|arg| arg.as_ref() == token);

    for group in schema.groups() {
        if !has(&format!("--no-{}", group.name)) {
            continue;
        }
        if let Some(child) = group
            .children
            .iter()
            .find(|child| has(&format!("--{child}")))
        {
            debug!(umbrella = group.name, child, "Conflicting artifact flags");
            return Err(Error::usage_conflict(*child, group.name));
        }
    }

    Ok(())
}
