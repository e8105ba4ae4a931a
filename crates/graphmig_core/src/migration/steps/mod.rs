//! Built-in model-version steps.
//!
//! Each file covers exactly one transition and is named after the version it
//! produces.

mod v7000001_wordform_inventory;
mod v7000002_version_bump;
mod v7000003_chart_tags;
mod v7000004_variant_type_guid;
mod v7000005_parse_is_current;
mod v7000006_delint;

use super::MigrationStep;

pub use v7000001_wordform_inventory::RemoveWordformInventory;
pub use v7000002_version_bump::VersionBump;
pub use v7000003_chart_tags::WordGroupsWithoutSegmentsToTags;
pub use v7000004_variant_type_guid::{CanonicalUnspecifiedVariantGuid, UNSPECIFIED_VARIANT_GUID};
pub use v7000005_parse_is_current::DropParseIsCurrent;
pub use v7000006_delint::DelintStep;

/// Oldest model version the built-in steps accept.
pub const FIRST_SUPPORTED_VERSION: u32 = 7_000_000;

/// Every built-in step, ordered by source version.
pub fn builtin_steps() -> Vec<Box<dyn MigrationStep>> {
    vec![
        Box::new(RemoveWordformInventory),
        Box::new(VersionBump::new(7_000_001)),
        Box::new(WordGroupsWithoutSegmentsToTags),
        Box::new(CanonicalUnspecifiedVariantGuid),
        Box::new(DropParseIsCurrent),
        Box::new(DelintStep),
    ]
}

#[cfg(test)]
mod tests {
    use super::{builtin_steps, FIRST_SUPPORTED_VERSION};

    #[test]
    fn builtin_steps_form_a_gapless_chain() {
        let steps = builtin_steps();
        let mut expected = FIRST_SUPPORTED_VERSION;
        for step in &steps {
            assert_eq!(step.from_version(), expected);
            assert_eq!(step.to_version(), expected + 1);
            expected += 1;
        }
        assert_eq!(steps.len(), 6);
    }
}
