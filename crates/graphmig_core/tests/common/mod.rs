#![allow(dead_code)]

use graphmig_core::{ClassHierarchy, DomainObjectDto, Guid, MemoryRepository};

pub const LANG_PROJECT: Guid = Guid::from_u128(0x1000);
pub const LEX_DB: Guid = Guid::from_u128(0x1001);
pub const INVENTORY: Guid = Guid::from_u128(0x2000);
pub const WORDFORM_CAT: Guid = Guid::from_u128(0x2001);
pub const WORDFORM_DOG: Guid = Guid::from_u128(0x2002);
pub const ANALYSIS_CAT: Guid = Guid::from_u128(0x2003);

/// Serialized `objsur` element.
pub fn objsur(target: Guid, owning: bool) -> String {
    let kind = if owning { "o" } else { "r" };
    format!(r#"<objsur guid="{target}" t="{kind}" />"#)
}

/// Serialized object with optional owner and raw inner content.
pub fn rt_xml(class: &str, guid: Guid, owner: Option<Guid>, body: &str) -> String {
    match owner {
        Some(owner) => format!(
            r#"<rt class="{class}" guid="{guid}" ownerguid="{owner}">{body}</rt>"#
        ),
        None => format!(r#"<rt class="{class}" guid="{guid}">{body}</rt>"#),
    }
}

pub fn rt(class: &str, guid: Guid, owner: Option<Guid>, body: &str) -> DomainObjectDto {
    DomainObjectDto::from_xml(rt_xml(class, guid, owner, body)).unwrap()
}

pub fn repo_at(version: u32, dtos: Vec<DomainObjectDto>) -> MemoryRepository {
    MemoryRepository::load(ClassHierarchy::standard(), version, "project", dtos).unwrap()
}

/// Language project owning a lexicon and a wordform inventory with two
/// wordforms; the first wordform owns an analysis.
pub fn wordform_inventory_fixture(version: u32) -> MemoryRepository {
    let project_body = format!(
        "<LexDb>{}</LexDb><WordformInventory>{}</WordformInventory>",
        objsur(LEX_DB, true),
        objsur(INVENTORY, true)
    );
    let inventory_body = format!(
        "<Wordforms>{}{}</Wordforms>",
        objsur(WORDFORM_CAT, true),
        objsur(WORDFORM_DOG, true)
    );
    repo_at(
        version,
        vec![
            rt("LangProject", LANG_PROJECT, None, &project_body),
            rt("LexDb", LEX_DB, Some(LANG_PROJECT), ""),
            rt("WordformInventory", INVENTORY, Some(LANG_PROJECT), &inventory_body),
            wordform(WORDFORM_CAT, "cat", &format!("<Analyses>{}</Analyses>", objsur(ANALYSIS_CAT, true))),
            wordform(WORDFORM_DOG, "dog", ""),
            rt("WfiAnalysis", ANALYSIS_CAT, Some(WORDFORM_CAT), ""),
        ],
    )
}

pub fn wordform_xml(guid: Guid, form: &str, extra: &str) -> String {
    format!(
        r#"<rt class="WfiWordform" guid="{guid}" ownerguid="{INVENTORY}" owningflid="5063001" owningord="1"><Form><AUni ws="en">{form}</AUni></Form>{extra}</rt>"#
    )
}

fn wordform(guid: Guid, form: &str, extra: &str) -> DomainObjectDto {
    DomainObjectDto::from_xml(wordform_xml(guid, form, extra)).unwrap()
}
