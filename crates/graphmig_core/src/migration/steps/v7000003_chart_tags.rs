//! 7000002 -> 7000003: segment-less chart word groups become chart tags.
//!
//! # Invariants
//! - Every `BeginSegment` reference on a remaining word group resolves before
//!   any object is edited; an unresolved one fails the step.
//! - Converted objects lose the word-group-only properties.

use crate::content::{parse_element, surrogates, write_element};
use crate::migration::{MigrationError, MigrationResult, MigrationStep};
use crate::model::class::{ClassStructureInfo, ROOT_CLASS};
use crate::repo::DomainObjectRepository;
use crate::service::{change_to_subclass, check_version, increment_version};
use log::debug;
use xmltree::XMLNode;

const CELL_PART_CLASS: &str = "ConstituentChartCellPart";
const WORD_GROUP_CLASS: &str = "ConstChartWordGroup";
const TAG_CLASS: &str = "ConstChartTag";
const BEGIN_SEGMENT: &str = "BeginSegment";
const WORD_GROUP_ONLY: &[&str] = &[
    BEGIN_SEGMENT,
    "EndSegment",
    "BeginAnalysisIndex",
    "EndAnalysisIndex",
];

pub struct WordGroupsWithoutSegmentsToTags;

impl MigrationStep for WordGroupsWithoutSegmentsToTags {
    fn from_version(&self) -> u32 {
        7_000_002
    }

    fn description(&self) -> &'static str {
        "convert chart word groups without a begin segment to chart tags"
    }

    fn perform_migration(&self, repo: &mut dyn DomainObjectRepository) -> MigrationResult<()> {
        check_version(repo, self.from_version())?;

        let mut to_convert = Vec::new();
        for group in repo.exact_instances_of(WORD_GROUP_CLASS) {
            let element = parse_element(group.xml())
                .map_err(|err| MigrationError::malformed(group.guid(), err))?;
            // An empty `BeginSegment` anchors nothing.
            let begin_refs = element
                .get_child(BEGIN_SEGMENT)
                .map(surrogates)
                .unwrap_or_default();
            if begin_refs.is_empty() {
                to_convert.push((group, element));
                continue;
            }
            if let Some(missing) = begin_refs
                .into_iter()
                .find(|surrogate| repo.try_get(surrogate.guid).is_none())
            {
                return Err(MigrationError::UnresolvedReference {
                    from: group.guid(),
                    target: missing.guid,
                });
            }
        }

        let old_structure =
            ClassStructureInfo::with_ancestors([ROOT_CLASS, CELL_PART_CLASS], WORD_GROUP_CLASS);
        let new_structure =
            ClassStructureInfo::with_ancestors([ROOT_CLASS, CELL_PART_CLASS], TAG_CLASS);
        let converted = to_convert.len();
        for (mut group, mut element) in to_convert {
            let guid = group.guid();
            element.children.retain(|node| match node {
                XMLNode::Element(child) => !WORD_GROUP_ONLY.contains(&child.name.as_str()),
                _ => true,
            });
            let content =
                write_element(&element).map_err(|err| MigrationError::malformed(guid, err))?;
            group
                .replace_content(content)
                .map_err(|err| MigrationError::malformed(guid, err))?;
            change_to_subclass(&mut group, WORD_GROUP_CLASS, TAG_CLASS)?;
            repo.reclassify(&group, &old_structure, &new_structure)?;
        }
        debug!("event=migration_step module=migration status=progress converted={converted}");

        increment_version(repo);
        Ok(())
    }
}
