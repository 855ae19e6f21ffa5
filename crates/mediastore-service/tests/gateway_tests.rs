mod common;

use std::time::Duration;

use mediastore_core::error::ErrorKind;
use mediastore_core::events::ChangeKind;
use mediastore_entity::{MediaItem, Project, ProjectPatch, Record, SettingsPatch, SiteSettings};
use serde_json::json;

use common::{file_item, harness};

#[tokio::test]
async fn test_fresh_reads_do_not_contact_backend() {
    let h = harness().await;
    h.ctx.projects.save(&Project::new("Harbour", "harbour")).await.unwrap();

    let first = h.ctx.projects.get_all(false).await.unwrap();
    let selects = h.backend.select_calls();
    let second = h.ctx.projects.get_all(false).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(h.backend.select_calls(), selects);

    h.ctx.projects.get_all(true).await.unwrap();
    assert_eq!(h.backend.select_calls(), selects + 1);
}

#[tokio::test]
async fn test_zero_ttl_always_fetches() {
    let h = harness().await;
    let projects = h.ctx.projects.clone().with_ttl(Duration::ZERO);
    projects.get_all(false).await.unwrap();
    projects.get_all(false).await.unwrap();
    assert_eq!(h.backend.select_calls(), 2);
}

#[tokio::test]
async fn test_mutation_invalidates_snapshot() {
    let h = harness().await;
    let a = Project::new("A", "a");
    h.ctx.projects.save(&a).await.unwrap();
    assert_eq!(h.ctx.projects.get_all(false).await.unwrap().len(), 1);

    h.ctx.projects.save(&Project::new("B", "b")).await.unwrap();
    assert_eq!(h.ctx.projects.get_all(false).await.unwrap().len(), 2);

    let patch = ProjectPatch {
        title: Some("A prime".into()),
        ..ProjectPatch::default()
    };
    let updated = h.ctx.projects.update(a.id.as_str(), patch).await.unwrap();
    assert_eq!(updated.title, "A prime");
    let titles: Vec<String> = h
        .ctx
        .projects
        .get_all(false)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.title)
        .collect();
    assert!(titles.contains(&"A prime".to_string()));

    h.ctx.projects.delete(a.id.as_str()).await.unwrap();
    assert_eq!(h.ctx.projects.get_all(false).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_offline_read_serves_last_known_good() {
    let h = harness().await;
    h.ctx.projects.save(&Project::new("A", "a")).await.unwrap();
    h.ctx.projects.save(&Project::new("B", "b")).await.unwrap();
    let known = h.ctx.projects.get_all(false).await.unwrap();

    h.backend.set_offline(true);
    let err = h
        .ctx
        .projects
        .save(&Project::new("C", "c"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::RemoteMutation);

    let degraded = h.ctx.projects.get_all(false).await.unwrap();
    assert_eq!(degraded, known);
    assert!(h.ctx.cache.stats().fallbacks >= 1);
}

#[tokio::test]
async fn test_offline_without_snapshot_is_empty() {
    let h = harness().await;
    h.backend.set_offline(true);
    assert!(h.ctx.projects.get_all(false).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_of_vanished_id_succeeds() {
    let h = harness().await;
    let mut events = h.ctx.bus.subscribe_to("media");
    h.ctx.media.gateway().delete("never-existed").await.unwrap();

    let event = events.recv().await.unwrap();
    assert_eq!(
        event.kind,
        ChangeKind::Deleted {
            record_id: "never-existed".into()
        }
    );
}

#[tokio::test]
async fn test_update_of_missing_id_is_not_found() {
    let h = harness().await;
    let err = h
        .ctx
        .projects
        .update("missing", ProjectPatch::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_undecodable_rows_are_skipped() {
    let h = harness().await;
    let good = file_item("ok.jpg", None);
    common::seed_media(&h, &good).await;
    let bad = json!({"id": "broken", "name": "x", "kind": "spaceship"});
    h.backend
        .seed(MediaItem::COLLECTION, bad.as_object().unwrap().clone())
        .await;

    let items = h.ctx.media.gateway().get_all(false).await.unwrap();
    assert_eq!(items, vec![good]);
}

#[tokio::test]
async fn test_events_are_scoped_by_collection() {
    let h = harness().await;
    let mut projects = h.ctx.bus.subscribe_to("projects");
    let mut everything = h.ctx.bus.subscribe();

    h.ctx
        .media
        .gateway()
        .save(&file_item("a.jpg", None))
        .await
        .unwrap();
    let project = Project::new("A", "a");
    h.ctx.projects.save(&project).await.unwrap();

    assert_eq!(everything.recv().await.unwrap().collection, "media");
    assert_eq!(everything.recv().await.unwrap().collection, "projects");
    let event = projects.recv().await.unwrap();
    assert_eq!(event.kind.record_id(), project.id.as_str());
    assert!(projects.try_recv().is_none());
}

#[tokio::test]
async fn test_failed_mutation_publishes_nothing() {
    let h = harness().await;
    let mut events = h.ctx.bus.subscribe();
    h.backend.set_offline(true);
    assert!(h.ctx.projects.delete("p1").await.is_err());
    assert!(events.try_recv().is_none());
}

#[tokio::test]
async fn test_projects_are_ordered_by_sort_order() {
    let h = harness().await;
    for (title, order) in [("third", 3), ("first", 1), ("second", 2)] {
        let mut project = Project::new(title, title);
        project.sort_order = order;
        h.ctx.projects.save(&project).await.unwrap();
    }
    let titles: Vec<String> = h
        .ctx
        .projects
        .get_all(false)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.title)
        .collect();
    assert_eq!(titles, ["first", "second", "third"]);
}

#[tokio::test]
async fn test_settings_document_lifecycle() {
    let h = harness().await;
    assert!(h.ctx.settings.get(false).await.unwrap().is_none());

    h.ctx
        .settings
        .save(&SiteSettings::new("Studio North"))
        .await
        .unwrap();
    let saved = h.ctx.settings.get(false).await.unwrap().unwrap();
    assert_eq!(saved.site_title, "Studio North");

    let patch = SettingsPatch {
        tagline: Some(Some("Design and build".into())),
        social_links: Some(vec!["https://example.com/studio".into()]),
        ..SettingsPatch::default()
    };
    let updated = h.ctx.settings.update(patch).await.unwrap();
    assert_eq!(updated.tagline.as_deref(), Some("Design and build"));
    assert_eq!(updated.social_links.len(), 1);

    let cached = h.ctx.settings.get(false).await.unwrap().unwrap();
    assert_eq!(cached, updated);

    h.backend.set_offline(true);
    assert_eq!(h.ctx.settings.get(true).await.unwrap(), Some(updated));
}

#[tokio::test]
async fn test_settings_rejects_foreign_id() {
    let h = harness().await;
    let mut doc = SiteSettings::new("x");
    doc.id = "other".into();
    let err = h.ctx.settings.save(&doc).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_disposed_cache_fails_reads() {
    let h = harness().await;
    h.ctx.shutdown().await;
    let err = h.ctx.projects.get_all(false).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Cache);
}

#[tokio::test]
async fn test_row_columns_are_snake_case() {
    let item = file_item("a.jpg", None);
    let row = item.to_row();
    assert!(row.contains_key("parent_id"));
    assert!(row.contains_key("storage_key"));
    assert!(!row.contains_key("parentId"));
}

#[tokio::test]
async fn test_read_during_save_is_not_cached_past_the_write() {
    let h = harness().await;
    let projects = h.ctx.projects.clone();
    assert!(projects.get_all(false).await.unwrap().is_empty());

    let release = h.backend.hold_next_mutation();
    let project = Project::new("Atlas", "atlas");
    let writer = {
        let projects = projects.clone();
        let project = project.clone();
        tokio::spawn(async move { projects.save(&project).await })
    };
    h.backend.mutation_held().await;

    assert!(projects.get_all(false).await.unwrap().is_empty());
    release.notify_one();
    writer.await.unwrap().unwrap();

    let after = projects.get_all(false).await.unwrap();
    assert_eq!(after, vec![project]);
}

#[tokio::test]
async fn test_read_during_delete_is_not_cached_past_the_write() {
    let h = harness().await;
    let projects = h.ctx.projects.clone();
    let project = Project::new("Atlas", "atlas");
    projects.save(&project).await.unwrap();

    let release = h.backend.hold_next_mutation();
    let writer = {
        let projects = projects.clone();
        let id = project.id.to_string();
        tokio::spawn(async move { projects.delete(&id).await })
    };
    h.backend.mutation_held().await;

    assert_eq!(projects.get_all(false).await.unwrap().len(), 1);
    release.notify_one();
    writer.await.unwrap().unwrap();

    assert!(projects.get_all(false).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_read_during_settings_update_is_not_cached_past_the_write() {
    let h = harness().await;
    let settings = h.ctx.settings.clone();
    settings.save(&SiteSettings::new("Studio")).await.unwrap();

    let release = h.backend.hold_next_mutation();
    let writer = {
        let settings = settings.clone();
        tokio::spawn(async move {
            let patch = SettingsPatch {
                tagline: Some(Some("New tagline".into())),
                ..SettingsPatch::default()
            };
            settings.update(patch).await
        })
    };
    h.backend.mutation_held().await;

    let during = settings.get(false).await.unwrap().unwrap();
    assert_eq!(during.tagline, None);
    release.notify_one();
    writer.await.unwrap().unwrap();

    let after = settings.get(false).await.unwrap().unwrap();
    assert_eq!(after.tagline.as_deref(), Some("New tagline"));
}

#[tokio::test]
async fn test_update_publishes_even_when_result_does_not_decode() {
    let h = harness().await;
    let row = json!({"id": "p-draft", "title": "Draft"});
    h.backend
        .seed(Project::COLLECTION, row.as_object().unwrap().clone())
        .await;
    let mut events = h.ctx.bus.subscribe_to("projects");

    let patch = ProjectPatch {
        sort_order: Some(4),
        ..ProjectPatch::default()
    };
    assert!(h.ctx.projects.update("p-draft", patch).await.is_err());

    let event = events.recv().await.unwrap();
    assert_eq!(
        event.kind,
        ChangeKind::Updated {
            record_id: "p-draft".into()
        }
    );
}

#[tokio::test]
async fn test_outage_after_successful_save_serves_older_snapshot() {
    let h = harness().await;
    let first = Project::new("A", "a");
    h.ctx.projects.save(&first).await.unwrap();
    assert_eq!(h.ctx.projects.get_all(false).await.unwrap(), vec![first.clone()]);

    h.ctx.projects.save(&Project::new("B", "b")).await.unwrap();
    h.backend.set_offline(true);

    let degraded = h.ctx.projects.get_all(false).await.unwrap();
    assert_eq!(degraded, vec![first]);
    assert_eq!(h.ctx.cache.stats().fallbacks, 1);
}
