use fma_io::{ImportMode, IoProvider, IoStatus, ProviderError};
use fma_io_desktop::{DesktopConfig, DesktopProvider};
use fma_io_gconf::{GConfConfig, GConfProvider, KeyStore, MemoryStore};
use fma_io_xml::{XmlProvider, GCONF_ENTRY};
use fma_object::{count_items, Duplicable, Item, ItemCounts, Menu};
use fma_pivot::{
    ImportOutcome, ManualClock, Pivot, PivotConfig, PivotConsumer, PivotError, ProviderConfig,
};
use fma_test_utils::{init_test_tracing, sample_action, sample_menu, InMemoryProvider};
use mockall::mock;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

mock! {
    Consumer {}

    impl PivotConsumer for Consumer {
        fn on_items_reloaded(&mut self, items: &[Item]);
    }
}

fn pivot_with(config: PivotConfig, providers: Vec<Box<dyn IoProvider>>) -> (Pivot, ManualClock) {
    init_test_tracing();
    let clock = ManualClock::new();
    let pivot = Pivot::new(config, providers, Arc::new(clock.clone()));
    (pivot, clock)
}

fn status_of(result: Result<(), ProviderError>) -> IoStatus {
    result.map_or_else(|e| e.status(), |()| IoStatus::Ok)
}

#[test]
fn test_scenario_count() {
    let provider = InMemoryProvider::new("p")
        .with_item(sample_menu("M", "Menu", &[]))
        .with_item(sample_action("A", "Open"));
    let (pivot, _) = pivot_with(PivotConfig::new(), vec![Box::new(provider)]);

    let counts = count_items(pivot.items(), true);
    assert_eq!(
        counts,
        ItemCounts {
            menus: 1,
            actions: 1,
            profiles: 1
        }
    );
}

#[test]
fn test_merge_builds_hierarchy() {
    let first = InMemoryProvider::new("first")
        .with_item(sample_menu("tools", "Tools", &["edit", "view"]))
        .with_item(sample_action("edit", "Edit"));
    let second = InMemoryProvider::new("second")
        .with_item(sample_action("view", "View"))
        .with_item(sample_action("edit", "Shadowed edit"))
        .with_item(sample_action("loose", "Loose"));
    let (pivot, _) = pivot_with(
        PivotConfig::new(),
        vec![Box::new(first), Box::new(second)],
    );

    let top: Vec<_> = pivot.items().iter().map(Item::id).collect();
    assert_eq!(top, ["tools", "loose"]);
    let children: Vec<_> = pivot.items()[0].children().iter().map(Item::id).collect();
    assert_eq!(children, ["edit", "view"]);
    assert_eq!(pivot.find("edit").unwrap().label(), "Edit");
    assert_eq!(pivot.find("view").unwrap().provider(), Some("second"));
    assert!(pivot.items().iter().all(|i| !i.any_modified()));
}

#[test]
fn test_partial_failure_isolation() {
    let provider = InMemoryProvider::new("mem")
        .with_item(sample_action("a", "A"))
        .with_corrupt_record("record-7")
        .with_item(sample_action("b", "B"));
    let (pivot, _) = pivot_with(PivotConfig::new(), vec![Box::new(provider)]);
    assert_eq!(pivot.items().len(), 2);
    assert_eq!(pivot.read_messages().len(), 1);
    assert!(pivot.read_messages()[0].starts_with("record-7"));
}

#[test]
fn test_writability_reason_codes() {
    let item = sample_action("a", "A");

    let (pivot, _) = pivot_with(
        PivotConfig::new().with_locked(true),
        vec![Box::new(InMemoryProvider::new("mem"))],
    );
    assert_eq!(status_of(pivot.is_item_writable(&item)), IoStatus::ConfigurationLockedByAdmin);

    let (pivot, _) = pivot_with(
        PivotConfig::new(),
        vec![Box::new(
            InMemoryProvider::new("mem")
                .with_item(sample_action("a", "A"))
                .with_readonly("a"),
        )],
    );
    let read = pivot.find("a").unwrap();
    assert_eq!(status_of(pivot.is_item_writable(read)), IoStatus::ItemReadonly);

    let mut orphan = sample_action("o", "O");
    orphan.set_provider(Some("ghost".to_string()));
    assert_eq!(status_of(pivot.is_item_writable(&orphan)), IoStatus::NoProviderFound);

    let (pivot, _) = pivot_with(
        PivotConfig::new(),
        vec![Box::new(InMemoryProvider::new("mem").not_willing())],
    );
    assert_eq!(status_of(pivot.is_item_writable(&item)), IoStatus::NoProviderFound);

    let mut owned = sample_action("a", "A");
    owned.set_provider(Some("mem".to_string()));
    let locked = |config: ProviderConfig| {
        pivot_with(
            PivotConfig::new().with_provider(config),
            vec![Box::new(InMemoryProvider::new("mem"))],
        )
        .0
    };
    let pivot = locked(ProviderConfig::new("mem").with_locked_by_admin(true));
    assert_eq!(status_of(pivot.is_item_writable(&owned)), IoStatus::ProviderLockedByAdmin);
    let pivot = locked(ProviderConfig::new("mem").with_writable(false));
    assert_eq!(status_of(pivot.is_item_writable(&owned)), IoStatus::ProviderLockedByUser);

    let (pivot, _) = pivot_with(
        PivotConfig::new(),
        vec![Box::new(InMemoryProvider::new("mem").not_willing())],
    );
    assert_eq!(status_of(pivot.is_item_writable(&owned)), IoStatus::ProviderNotWilling);

    let (pivot, _) = pivot_with(
        PivotConfig::new(),
        vec![Box::new(InMemoryProvider::new("mem").with_readonly("a"))],
    );
    assert_eq!(status_of(pivot.is_item_writable(&owned)), IoStatus::ItemReadonly);

    let (pivot, _) = pivot_with(PivotConfig::new(), vec![Box::new(InMemoryProvider::new("mem"))]);
    assert_eq!(status_of(pivot.is_item_writable(&owned)), IoStatus::Ok);
}

#[test]
fn test_new_item_goes_to_first_willing_provider() {
    let skipped = InMemoryProvider::new("skipped").not_willing();
    let target = InMemoryProvider::new("target");
    let handle = target.handle();
    let (mut pivot, _) = pivot_with(
        PivotConfig::new(),
        vec![Box::new(skipped), Box::new(target)],
    );

    let mut item = sample_action("fresh", "Fresh");
    item.set_label("Fresh, edited");
    pivot.write_item(&mut item).unwrap();
    assert_eq!(item.provider(), Some("target"));
    assert!(!item.is_modified());
    assert_eq!(handle.get("fresh").unwrap().label(), "Fresh, edited");
    assert!(pivot.find("fresh").is_none());
}

#[test]
fn test_write_failure_leaves_item_untouched() {
    let provider = InMemoryProvider::new("mem");
    let handle = provider.handle();
    let (mut pivot, _) = pivot_with(PivotConfig::new(), vec![Box::new(provider)]);
    handle.fail_writes(Some(ProviderError::write("disk full")));

    let mut item = sample_action("a", "A");
    let err = pivot.write_item(&mut item).unwrap_err();
    assert_eq!(err.status(), Some(IoStatus::WriteError));
    assert_eq!(item.provider(), None);
    assert!(item.status().origin().is_none());

    let mut invalid = Item::Menu(Menu::with_id("m"));
    assert!(matches!(
        pivot.write_item(&mut invalid),
        Err(PivotError::Invalid { .. })
    ));
}

#[test]
fn test_delete_routes_to_owner() {
    let provider = InMemoryProvider::new("mem").with_item(sample_action("a", "A"));
    let handle = provider.handle();
    let (mut pivot, _) = pivot_with(PivotConfig::new(), vec![Box::new(provider)]);

    let item = pivot.find("a").unwrap().clone();
    pivot.delete_item(&item).unwrap();
    assert_eq!(handle.delete_count(), 1);
    assert!(handle.get("a").is_none());

    pivot.delete_item(&sample_action("never", "Never")).unwrap();
    assert_eq!(handle.delete_count(), 1);
}

#[test]
fn test_burst_of_events_reloads_once() {
    let provider = InMemoryProvider::new("mem").with_item(sample_action("a", "A"));
    let handle = provider.handle();
    let (mut pivot, clock) = pivot_with(PivotConfig::new(), vec![Box::new(provider)]);

    let mut consumer = MockConsumer::new();
    consumer
        .expect_on_items_reloaded()
        .withf(|items| items.len() == 2)
        .times(1)
        .return_const(());
    pivot.add_consumer(Box::new(consumer));

    handle.external_write(&sample_action("b", "B"));
    assert_eq!(pivot.process_events(), 1);
    for _ in 0..4 {
        clock.advance(Duration::from_millis(100));
        handle.signal("b");
        assert!(!pivot.poll());
    }
    assert_eq!(
        pivot.next_deadline().map(|d| d.as_duration()),
        Some(Duration::from_secs(1))
    );

    clock.advance(Duration::from_millis(600));
    assert!(pivot.poll());
    assert!(pivot.find("b").is_some());
    assert_eq!(pivot.next_deadline(), None);
    assert!(!pivot.poll());
    assert_eq!(handle.read_count(), 2);
}

#[test]
fn test_quiet_window_rearms_timer() {
    let provider = InMemoryProvider::new("mem");
    let handle = provider.handle();
    let (mut pivot, clock) = pivot_with(PivotConfig::new(), vec![Box::new(provider)]);

    handle.signal("x");
    assert_eq!(pivot.process_events(), 1);
    clock.advance(Duration::from_millis(700));
    handle.signal("x");
    pivot.process_events();
    clock.advance(Duration::from_millis(300));
    assert!(!pivot.poll());
    assert_eq!(
        pivot.next_deadline().map(|d| d.as_duration()),
        Some(Duration::from_secs(2))
    );

    clock.advance(Duration::from_secs(1));
    assert!(pivot.poll());
    assert_eq!(handle.read_count(), 2);
}

#[test]
fn test_configured_timings() {
    let config = PivotConfig::new()
        .with_debounce_delay(Duration::from_millis(200))
        .with_quiet_window(Duration::from_millis(100));
    let provider = InMemoryProvider::new("mem");
    let handle = provider.handle();
    let (mut pivot, clock) = pivot_with(config, vec![Box::new(provider)]);

    handle.signal("x");
    pivot.process_events();
    clock.advance(Duration::from_millis(200));
    assert!(pivot.poll());
}

#[test]
fn test_import_modes() {
    let provider = InMemoryProvider::new("mem").with_item(sample_action("a", "Original"));
    let handle = provider.handle();
    let (mut pivot, _) = pivot_with(PivotConfig::new(), vec![Box::new(provider)]);

    let outcome = pivot
        .import_item(sample_action("a", "Imported"), ImportMode::NoImport)
        .unwrap();
    assert_eq!(outcome, ImportOutcome::Skipped("a".to_string()));
    assert_eq!(handle.write_count(), 0);

    let outcome = pivot
        .import_item(sample_action("a", "Imported"), ImportMode::Renumber)
        .unwrap();
    let ImportOutcome::Renumbered { from, to } = outcome else {
        panic!("expected a renumbered import");
    };
    assert_eq!(from, "a");
    assert_ne!(to, "a");
    assert_eq!(handle.get(&to).unwrap().label(), "Copy of Imported");

    let outcome = pivot
        .import_item(sample_action("a", "Imported"), ImportMode::Override)
        .unwrap();
    assert_eq!(outcome, ImportOutcome::Overridden("a".to_string()));
    assert_eq!(handle.get("a").unwrap().label(), "Imported");

    let outcome = pivot
        .import_item(sample_action("new", "New"), ImportMode::NoImport)
        .unwrap();
    assert_eq!(outcome, ImportOutcome::Imported("new".to_string()));
    assert_eq!(handle.write_count(), 3);
}

#[test]
fn test_export_then_import_through_xml() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let desktop = DesktopProvider::new(DesktopConfig::default().with_user_dir(dir.path()));
    let (mut pivot, _) = pivot_with(
        PivotConfig::new(),
        vec![Box::new(desktop), Box::new(XmlProvider::new())],
    );

    let mut item = sample_action("shared", "Shared");
    pivot.write_item(&mut item)?;
    assert_eq!(item.provider(), Some("na-desktop"));
    pivot.reload();

    let formats: Vec<_> = pivot.export_formats().into_iter().map(|f| f.id).collect();
    assert!(formats.iter().any(|f| f == GCONF_ENTRY));

    let stored = pivot.find("shared").expect("written item is read back");
    let xml = pivot.export_item(stored, GCONF_ENTRY)?;
    let outcome = pivot.import_buffer(&xml, ImportMode::Renumber)?;
    let ImportOutcome::Renumbered { to, .. } = &outcome else {
        anyhow::bail!("expected a renumbered import, got {outcome:?}");
    };
    assert!(dir.path().join(format!("{to}.desktop")).is_file());

    assert!(matches!(
        pivot.export_item(loaded(&pivot, "shared")?, "Yaml"),
        Err(PivotError::NoExporter(_))
    ));
    assert!(matches!(
        pivot.import_buffer("<html/>", ImportMode::NoImport),
        Err(PivotError::NoImporter)
    ));
    Ok(())
}

fn loaded<'a>(pivot: &'a Pivot, id: &str) -> anyhow::Result<&'a Item> {
    pivot
        .find(id)
        .ok_or_else(|| anyhow::anyhow!("item {id} not loaded"))
}

#[test]
fn test_registry_edits_coalesced() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let registry = GConfProvider::new(store.clone(), GConfConfig::default().with_root("/r"));
    let (mut pivot, clock) = pivot_with(PivotConfig::new(), vec![Box::new(registry)]);
    assert!(pivot.items().is_empty());

    store.set("/r/ext/type", "Action".into())?;
    store.set("/r/ext/label", "External".into())?;
    store.set("/r/ext/p1/path", "/bin/true".into())?;
    assert_eq!(pivot.process_events(), 3);

    clock.advance(Duration::from_secs(1));
    assert!(pivot.poll());
    let item = pivot.find("ext").expect("external item loaded");
    assert_eq!(item.label(), "External");
    assert_eq!(item.provider(), Some("na-gconf"));
    Ok(())
}

#[test]
fn test_desktop_changes_found_by_polling() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let desktop = DesktopProvider::new(DesktopConfig::default().with_user_dir(dir.path()));
    let (mut pivot, clock) = pivot_with(PivotConfig::new(), vec![Box::new(desktop)]);

    std::fs::write(
        dir.path().join("dropped.desktop"),
        "[Desktop Entry]\nType=Action\nName=Dropped\nProfiles=p1;\n\n\
         [X-Action-Profile p1]\nName=Main\nExec=/bin/true\n",
    )?;
    pivot.check_providers();
    assert!(pivot.next_deadline().is_some());

    clock.advance(Duration::from_secs(1));
    assert!(pivot.poll());
    let item = pivot.find("dropped").expect("dropped file loaded");
    assert_eq!(item.children().len(), 1);
    Ok(())
}

#[test]
fn test_menu_save_keeps_unsaved_child_dirty() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    store.set("/r/m/type", "Menu".into())?;
    store.set("/r/m/label", "Tools".into())?;
    store.set("/r/m/items", vec!["a".to_string()].into())?;
    store.set("/r/a/label", "Old".into())?;
    store.set("/r/a/p1/path", "/bin/true".into())?;
    let registry = GConfProvider::new(store.clone(), GConfConfig::default().with_root("/r"));
    let (mut pivot, _) = pivot_with(PivotConfig::new(), vec![Box::new(registry)]);

    let mut menu = loaded(&pivot, "m")?.clone();
    assert_eq!(menu.children().len(), 1);
    menu.children_mut()[0].set_label("New");
    menu.check_status();
    assert!(menu.children()[0].is_modified());

    pivot.write_item(&mut menu)?;
    assert!(!menu.is_modified());
    assert!(menu.children()[0].is_modified());
    assert!(menu.any_modified());
    assert_eq!(store.get("/r/a/label"), Some("Old".into()));
    Ok(())
}
