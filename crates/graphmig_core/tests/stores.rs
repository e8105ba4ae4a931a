mod common;

use common::{objsur, rt, wordform_inventory_fixture, INVENTORY, LANG_PROJECT, LEX_DB, WORDFORM_CAT};
use graphmig_core::{
    open_store, ClassHierarchy, DomainObjectRepository, Guid, MigrationRegistry, ProjectStore,
    SqliteProjectStore, StoreError, StoreKind, XmlProjectFile,
};
use std::fs;

const PROJECT_FILE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<languageproject version="7000004">
<rt class="StText" guid="00000000-0000-0000-0000-000000000090" ownerguid="00000000-0000-0000-0000-000000001000"><Paragraphs><objsur guid="00000000-0000-0000-0000-000000000091" t="o" /></Paragraphs></rt>
<rt class="StTxtPara" guid="00000000-0000-0000-0000-000000000091" ownerguid="00000000-0000-0000-0000-000000000090"><Contents><Str><Run ws="en">a &amp; b</Run></Str></Contents><ParseIsCurrent val="True"/></rt>
<rt class="LangProject" guid="00000000-0000-0000-0000-000000001000"><Texts><objsur guid="00000000-0000-0000-0000-000000000090" t="o" /></Texts></rt>
</languageproject>
"#;

#[test]
fn xml_project_round_trips_byte_for_byte() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("project.fwdata");
    fs::write(&path, PROJECT_FILE).unwrap();

    let mut store = XmlProjectFile::new(&path);
    let mut repo = store.load(ClassHierarchy::standard()).unwrap();
    assert_eq!(repo.current_version(), 7_000_004);
    assert_eq!(repo.len(), 3);
    assert_eq!(repo.project_folder(), dir.path());

    store.save(&mut repo).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), PROJECT_FILE);
}

#[test]
fn xml_project_persists_migrated_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("project.fwdata");
    fs::write(&path, PROJECT_FILE).unwrap();
    let mut store = XmlProjectFile::new(&path);

    let mut repo = store.load(ClassHierarchy::standard()).unwrap();
    MigrationRegistry::builtin().migrate(&mut repo, None).unwrap();
    store.save(&mut repo).unwrap();
    assert!(repo.changes().is_empty());

    let reloaded = store.load(ClassHierarchy::standard()).unwrap();
    assert_eq!(reloaded.current_version(), 7_000_006);
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains(r#"<languageproject version="7000006">"#));
    assert!(!text.contains("ParseIsCurrent"));
    assert!(text.contains("a &amp; b"));
}

#[test]
fn xml_project_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = XmlProjectFile::new(dir.path().join("absent.fwdata"));
    assert!(matches!(
        store.load(ClassHierarchy::standard()),
        Err(StoreError::Io { .. })
    ));
}

#[test]
fn sqlite_store_saves_full_then_incremental() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("project.sqlite");

    let mut repo = wordform_inventory_fixture(7_000_000);
    let mut store = SqliteProjectStore::open(&path).unwrap();
    assert_eq!(store.stored_version().unwrap(), None);
    store.save_all(&mut repo).unwrap();
    assert_eq!(store.stored_version().unwrap(), Some(7_000_000));
    drop(store);

    let mut store = SqliteProjectStore::open(&path).unwrap();
    let mut loaded = store.load(ClassHierarchy::standard()).unwrap();
    assert_eq!(loaded.all_instances(), repo.all_instances());
    assert_eq!(loaded.project_folder(), dir.path());

    MigrationRegistry::builtin()
        .migrate(&mut loaded, Some(7_000_001))
        .unwrap();
    let added = Guid::from_u128(0x9999);
    loaded
        .add(rt("LexEntry", added, None, &format!("<Refs>{}</Refs>", objsur(LEX_DB, false))))
        .unwrap();
    assert!(loaded.changes().removed().contains(&INVENTORY));
    store.save(&mut loaded).unwrap();
    assert!(loaded.changes().is_empty());

    let reloaded = store.load(ClassHierarchy::standard()).unwrap();
    assert_eq!(reloaded.current_version(), 7_000_001);
    assert!(reloaded.try_get(INVENTORY).is_none());
    assert!(reloaded.try_get(added).is_some());
    assert_eq!(reloaded.get(WORDFORM_CAT).unwrap().owner_guid(), None);
    assert_eq!(reloaded.all_instances(), loaded.all_instances());
    assert!(reloaded.get(LANG_PROJECT).is_ok());
}

#[test]
fn empty_sqlite_store_holds_no_project() {
    let store = SqliteProjectStore::open_in_memory().unwrap();
    assert!(matches!(
        store.load(ClassHierarchy::standard()),
        Err(StoreError::InvalidData(_))
    ));
}

#[test]
fn open_store_picks_format_from_extension_or_override() {
    let dir = tempfile::tempdir().unwrap();

    let sqlite_path = dir.path().join("project.sqlite");
    let mut repo = wordform_inventory_fixture(7_000_000);
    SqliteProjectStore::open(&sqlite_path)
        .unwrap()
        .save_all(&mut repo)
        .unwrap();
    let store = open_store(&sqlite_path, None).unwrap();
    assert_eq!(store.load(ClassHierarchy::standard()).unwrap().len(), repo.len());

    let xml_path = dir.path().join("project.data");
    fs::write(&xml_path, PROJECT_FILE).unwrap();
    let store = open_store(&xml_path, Some(StoreKind::Xml)).unwrap();
    assert_eq!(store.location(), xml_path.as_path());
    assert_eq!(store.load(ClassHierarchy::standard()).unwrap().len(), 3);
}
