//! 7000004 -> 7000005: paragraphs drop the `ParseIsCurrent` property.
//!
//! Paragraph content can be large, so the element is spliced out of the
//! stored bytes instead of parsing the paragraph.

use crate::content::remove_element;
use crate::migration::{MigrationResult, MigrationStep};
use crate::repo::DomainObjectRepository;
use crate::service::{check_version, increment_version, update_dto};
use log::debug;

const PARAGRAPH_CLASS: &str = "StTxtPara";
const PARSE_IS_CURRENT: &str = "ParseIsCurrent";

pub struct DropParseIsCurrent;

impl MigrationStep for DropParseIsCurrent {
    fn from_version(&self) -> u32 {
        7_000_004
    }

    fn description(&self) -> &'static str {
        "remove ParseIsCurrent from text paragraphs"
    }

    fn perform_migration(&self, repo: &mut dyn DomainObjectRepository) -> MigrationResult<()> {
        check_version(repo, self.from_version())?;

        let mut changed = 0usize;
        for mut paragraph in repo.instances_of_or_below(PARAGRAPH_CLASS) {
            let Some(stripped) = remove_element(paragraph.xml_bytes(), PARSE_IS_CURRENT) else {
                continue;
            };
            update_dto(repo, &mut paragraph, stripped, None)?;
            changed += 1;
        }
        debug!("event=migration_step module=migration status=progress paragraphs={changed}");

        increment_version(repo);
        Ok(())
    }
}
