//! Single-file XML project format.
//!
//! ```text
//! <?xml version="1.0" encoding="utf-8"?>
//! <languageproject version="7000000">
//! <rt class=".." guid=".."> .. </rt>
//! </languageproject>
//! ```
//!
//! Objects are split out by scanning for `rt` elements, which never nest, so
//! each DTO keeps its exact bytes. Saving writes objects in guid order.

use super::{ProjectStore, StoreError, StoreResult};
use crate::content::{find_element_span, root_attr, root_element_name, start_tag_span};
use crate::model::class::ClassHierarchy;
use crate::model::dto::DomainObjectDto;
use crate::repo::{DomainObjectRepository, MemoryRepository};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

const ROOT_ELEMENT: &str = "languageproject";
const OBJECT_ELEMENT: &str = "rt";
const VERSION_ATTR: &str = "version";
const DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>";

#[derive(Debug, Clone)]
pub struct XmlProjectFile {
    path: PathBuf,
}

impl XmlProjectFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn project_folder(&self) -> PathBuf {
        self.path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }
}

impl ProjectStore for XmlProjectFile {
    fn load(&self, hierarchy: ClassHierarchy) -> StoreResult<MemoryRepository> {
        let started_at = Instant::now();
        let bytes = fs::read(&self.path).map_err(|err| StoreError::io(&self.path, err))?;
        let (version, dtos) = parse_project(&bytes)?;
        let repo = MemoryRepository::load(hierarchy, version, self.project_folder(), dtos)?;
        info!(
            "event=project_load module=store status=ok format=xml version={} objects={} duration_ms={}",
            version,
            repo.len(),
            started_at.elapsed().as_millis()
        );
        Ok(repo)
    }

    fn save(&mut self, repo: &mut MemoryRepository) -> StoreResult<()> {
        let started_at = Instant::now();
        let rendered = render_project(repo);
        let staging = self.path.with_extension("tmp");
        fs::write(&staging, rendered).map_err(|err| StoreError::io(&staging, err))?;
        fs::rename(&staging, &self.path).map_err(|err| StoreError::io(&self.path, err))?;
        repo.clear_changes();
        info!(
            "event=project_save module=store status=ok format=xml version={} objects={} duration_ms={}",
            repo.current_version(),
            repo.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    fn location(&self) -> &Path {
        &self.path
    }
}

/// Splits a project document into its model version and objects.
pub(crate) fn parse_project(bytes: &[u8]) -> StoreResult<(u32, Vec<DomainObjectDto>)> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| StoreError::InvalidData("project file is not UTF-8".to_string()))?;
    match root_element_name(text) {
        Some(ROOT_ELEMENT) => {}
        Some(other) => {
            return Err(StoreError::InvalidData(format!(
                "root element is `{other}`, expected `{ROOT_ELEMENT}`"
            )))
        }
        None => return Err(StoreError::InvalidData("no root element".to_string())),
    }
    let version = root_attr(text, VERSION_ATTR)
        .ok_or_else(|| StoreError::InvalidData("root element has no version".to_string()))?;
    let version = version
        .trim()
        .parse::<u32>()
        .map_err(|_| StoreError::InvalidData(format!("version `{version}` is not a number")))?;

    // Skip past the root start tag so `rt` is only matched as a child.
    let body_start = start_tag_span(text, 0).map_or(text.len(), |span| span.end);
    let mut dtos = Vec::new();
    let mut cursor = body_start;
    while let Some(span) = find_element_span(&bytes[cursor..], OBJECT_ELEMENT) {
        let start = cursor + span.start;
        let end = cursor + span.end;
        dtos.push(DomainObjectDto::from_xml(&text[start..end])?);
        cursor = end;
    }
    Ok((version, dtos))
}

/// Renders `repo` in the on-disk layout.
pub(crate) fn render_project(repo: &MemoryRepository) -> String {
    let mut out = String::new();
    out.push_str(DECLARATION);
    out.push('\n');
    out.push_str(&format!(
        "<{ROOT_ELEMENT} {VERSION_ATTR}=\"{}\">\n",
        repo.current_version()
    ));
    for dto in repo.iter() {
        out.push_str(dto.xml());
        out.push('\n');
    }
    out.push_str(&format!("</{ROOT_ELEMENT}>\n"));
    out
}

#[cfg(test)]
mod tests {
    use super::{parse_project, render_project};
    use crate::model::class::ClassHierarchy;
    use crate::repo::{DomainObjectRepository, MemoryRepository};
    use crate::store::StoreError;

    const PROJECT: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
<languageproject version=\"7000002\">\n\
<rt class=\"LangProject\" guid=\"11111111-1111-1111-1111-111111111111\"><Texts><objsur guid=\"22222222-2222-2222-2222-222222222222\" t=\"o\" /></Texts></rt>\n\
<rt class=\"StText\" guid=\"22222222-2222-2222-2222-222222222222\" ownerguid=\"11111111-1111-1111-1111-111111111111\"/>\n\
</languageproject>\n";

    #[test]
    fn parse_then_render_is_identical_for_canonical_files() {
        let (version, dtos) = parse_project(PROJECT.as_bytes()).unwrap();
        assert_eq!(version, 7_000_002);
        assert_eq!(dtos.len(), 2);
        assert!(dtos[1].xml().ends_with("/>"));

        let repo = MemoryRepository::load(ClassHierarchy::standard(), version, ".", dtos).unwrap();
        assert_eq!(repo.len(), 2);
        assert_eq!(render_project(&repo), PROJECT);
    }

    #[test]
    fn foreign_root_and_missing_version_are_rejected() {
        assert!(matches!(
            parse_project(b"<project version=\"1\"></project>"),
            Err(StoreError::InvalidData(_))
        ));
        assert!(matches!(
            parse_project(b"<languageproject></languageproject>"),
            Err(StoreError::InvalidData(_))
        ));
    }
}
