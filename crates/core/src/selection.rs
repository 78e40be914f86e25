//! Artifacts the user chose on the command line.

use std::collections::BTreeSet;

use crate::catalog;
use crate::flags::FlagSet;
use crate::umbrella::UmbrellaSchema;

/// Collect the names of artifacts the user explicitly turned on.
///
/// An artifact counts when its own flag was typed and is true, or when its
/// umbrella flag was typed and is true. Defaults never count.
#[must_use]
pub fn explicit_selections(flags: &FlagSet, schema: &UmbrellaSchema) -> BTreeSet<String> {
    catalog::catalog()
        .iter()
        .filter(|artifact| {
            flags.explicitly_true(artifact.name)
                || schema
                    .umbrella_of(artifact.name)
                    .is_some_and(|umbrella| flags.explicitly_true(umbrella))
        })
        .map(|artifact| artifact.name.to_string())
        .collect()
}
