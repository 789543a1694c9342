use fma_io::{ExportError, Exporter, ImportError, Importer, IoProvider};
use fma_io_xml::{XmlProvider, GCONF_ENTRY, GCONF_SCHEMA};
use fma_object::data::names;
use fma_object::{Action, Duplicable, Item, Menu, Profile, LEGACY_PROFILE_ID};
use pretty_assertions::assert_eq;
use std::fs;

fn sample_action() -> Item {
    let mut first = Profile::new("profile-1")
        .with_label("Sources")
        .with_path("/usr/bin/gvim")
        .with_parameters("--remote-tab %F");
    first
        .fields_mut()
        .set(names::BASENAMES, vec!["*.rs".to_string(), "Cargo.toml".to_string()])
        .unwrap();
    first.fields_mut().set(names::MULTIPLE, true).unwrap();
    let second = Profile::new("profile-2").with_path("/usr/bin/less");

    let mut action = Action::with_id("7f3c1d5e-edit")
        .with_label("Edit <sources> & more")
        .with_profile(first)
        .with_profile(second);
    action.fields_mut().set(names::TOOLTIP, " leading space").unwrap();
    Item::Action(action)
}

fn assert_same_tree(read: &Item, original: &Item) {
    assert!(Item::are_equal(read, original), "{} differs", read.id());
    assert_eq!(read.children().len(), original.children().len());
    for (a, b) in read.children().iter().zip(original.children()) {
        assert!(Item::are_equal(a, b), "profile {} differs", a.id());
    }
}

#[test]
fn test_entry_format_round_trip() {
    let provider = XmlProvider::new();
    let original = sample_action();

    let xml = provider.to_buffer(&original, GCONF_ENTRY).unwrap();
    assert!(xml.starts_with("<?xml"));
    assert!(xml.contains("<gconfentryfile>"));
    assert!(xml.contains("<key>profile-1/path</key>"));

    let imported = provider.import_from_buffer(&xml).unwrap();
    assert_same_tree(&imported, &original);
    assert_eq!(imported.provider(), None);
    assert!(!imported.is_readonly());
}

#[test]
fn test_schema_format_round_trip() {
    let provider = XmlProvider::new();
    let original = sample_action();

    let xml = provider.to_buffer(&original, GCONF_SCHEMA).unwrap();
    assert!(xml.contains("<gconfschemafile>"));
    assert!(xml.contains("<applyto>/apps/nautilus-actions/configurations/7f3c1d5e-edit/label</applyto>"));

    let imported = provider.import_from_buffer(&xml).unwrap();
    assert_same_tree(&imported, &original);
}

#[test]
fn test_menu_round_trip() {
    let provider = XmlProvider::new();
    let mut menu = Item::Menu(Menu::with_id("tools").with_label("Tools"));
    menu.insert_child(sample_action(), -1).unwrap();

    let xml = provider.to_buffer(&menu, GCONF_ENTRY).unwrap();
    let imported = provider.import_from_buffer(&xml).unwrap();
    assert!(imported.as_menu().is_some());
    assert!(Item::are_equal(&imported, &menu));
    assert_eq!(
        imported.fields().list(names::ITEMS),
        ["7f3c1d5e-edit".to_string()]
    );
}

#[test]
fn test_legacy_document_migrated() {
    let xml = r#"<?xml version="1.0"?>
<gconfentryfile>
  <entrylist base="/apps/nautilus-actions/configurations/legacy-1">
    <entry><key>label</key><value><string>Open with vim</string></value></entry>
    <entry><key>path</key><value><string>/usr/bin/vim</string></value></entry>
    <entry><key>parameters</key><value><string>%d/%f</string></value></entry>
    <entry><key>isdir</key><value><bool>true</bool></value></entry>
    <entry>
      <key>basenames</key>
      <value><list type="string"><value><string>*.c</string></value></list></value>
    </entry>
  </entrylist>
</gconfentryfile>"#;

    let item = XmlProvider::new().import_from_buffer(xml).unwrap();
    let action = item.as_action().unwrap();
    assert_eq!(item.id(), "legacy-1");
    assert_eq!(action.label(), "Open with vim");
    assert!(action.is_legacy());
    let profile = action.profile(LEGACY_PROFILE_ID).unwrap();
    assert_eq!(profile.path(), "/usr/bin/vim");
    assert_eq!(profile.basenames(), ["*.c"]);
    assert_eq!(profile.fields().string(names::FILE_TYPE), "both");
    assert!(item.is_valid());
}

#[test]
fn test_foreign_document_not_willing() {
    let provider = XmlProvider::new();
    let err = provider
        .import_from_buffer("<html><body>nope</body></html>")
        .unwrap_err();
    assert!(matches!(err, ImportError::NotWilling(_)));
    assert!(matches!(
        provider.import_from_buffer("plain text"),
        Err(ImportError::NotWilling(_))
    ));
}

#[test]
fn test_malformed_document_invalid() {
    let provider = XmlProvider::new();
    assert!(matches!(
        provider.import_from_buffer("<gconfentryfile><entrylist base=\"/r/a\">"),
        Err(ImportError::Invalid(_))
    ));

    let bad_bool = r#"<gconfentryfile><entrylist base="/r/a">
        <entry><key>enabled</key><value><bool>maybe</bool></value></entry>
    </entrylist></gconfentryfile>"#;
    assert!(matches!(
        provider.import_from_buffer(bad_bool),
        Err(ImportError::Invalid(_))
    ));
}

#[test]
fn test_imported_item_must_be_valid() {
    let unlabeled = r#"<gconfentryfile><entrylist base="/r/a">
        <entry><key>type</key><value><string>Action</string></value></entry>
        <entry><key>label</key><value><string></string></value></entry>
        <entry><key>p1/path</key><value><string>/bin/true</string></value></entry>
    </entrylist></gconfentryfile>"#;
    assert!(matches!(
        XmlProvider::new().import_from_buffer(unlabeled),
        Err(ImportError::InvalidItem(_))
    ));
}

#[test]
fn test_export_rejects_profile_and_unknown_format() {
    let provider = XmlProvider::new();
    let profile = Item::Profile(Profile::new("profile-1").with_path("/bin/true"));
    assert!(matches!(
        provider.to_buffer(&profile, GCONF_ENTRY),
        Err(ExportError::InvalidItem(_))
    ));
    assert!(matches!(
        provider.to_buffer(&sample_action(), "Yaml"),
        Err(ExportError::InvalidFormat(_))
    ));

    let unlabeled = Item::Action(Action::with_id("x").with_profile(Profile::new("p1")));
    assert!(matches!(
        provider.to_buffer(&unlabeled, GCONF_ENTRY),
        Err(ExportError::InvalidItem(_))
    ));
}

#[test]
fn test_file_export_and_import() {
    let dir = tempfile::tempdir().unwrap();
    let provider = XmlProvider::new();
    let original = sample_action();

    let path = provider.to_file(&original, dir.path(), GCONF_SCHEMA).unwrap();
    assert_eq!(path, dir.path().join("config_7f3c1d5e-edit.xml"));
    assert!(fs::read_to_string(&path).unwrap().contains("<schemalist>"));

    let imported = provider.import_from_path(&path).unwrap();
    assert_same_tree(&imported, &original);

    let missing = dir.path().join("missing");
    assert!(matches!(
        provider.to_file(&original, &missing, GCONF_ENTRY),
        Err(ExportError::InvalidTarget(_))
    ));
    assert!(matches!(
        provider.import_from_path(&missing),
        Err(ImportError::Io { .. })
    ));
}

#[test]
fn test_registered_as_provider() {
    let boxed: Box<dyn IoProvider> = Box::new(XmlProvider::new());
    assert_eq!(boxed.id(), "na-xml");
    assert_eq!(boxed.name(), "NAXML Exporter");
    let exporter = boxed.exporter().unwrap();
    assert!(exporter.supports(GCONF_ENTRY));
    assert!(exporter.supports(GCONF_SCHEMA));
    assert_eq!(exporter.version(), 2);
}
