mod common;

use futures::StreamExt;

use mediastore_core::error::ErrorKind;
use mediastore_core::events::ChangeKind;
use mediastore_core::types::SortDirection;
use mediastore_entity::MediaSortKey;
use mediastore_service::RawFile;

use common::{harness, jpeg_bytes};

#[tokio::test]
async fn test_library_workflow() {
    let h = harness().await;
    let tree = &h.ctx.media;
    let events = h.ctx.bus.subscribe_to("media").into_stream();

    let photos = tree.create_folder("Photos", None).await.unwrap();

    let first = h
        .ctx
        .uploads
        .upload_batch(vec![RawFile::guessed("sunset.jpg", jpeg_bytes())], Some(&photos.id))
        .await;
    let sunset = first[0].item().unwrap().clone();
    assert_eq!(sunset.parent_id, Some(photos.id.clone()));

    let second = h
        .ctx
        .uploads
        .upload_batch(
            vec![RawFile::guessed("sunset.png", vec![0x89, b'P', b'N', b'G'])],
            None,
        )
        .await;
    assert_eq!(second[0].error().map(|e| e.kind), Some(ErrorKind::Conflict));

    let err = tree.move_item(&photos.id, Some(&photos.id)).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let renamed = tree.rename(&photos.id, "Photos 2024", None).await.unwrap();
    assert_eq!(renamed.name, "Photos 2024");

    let root = tree
        .list_children(None, MediaSortKey::Name, SortDirection::Asc)
        .await
        .unwrap();
    assert_eq!(root.len(), 1);
    assert_eq!(root[0].name, "Photos 2024");

    let crumbs = tree.breadcrumbs(&sunset.id).await.unwrap();
    let names: Vec<&str> = crumbs.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Photos 2024"]);
    assert_eq!(tree.path(&sunset.id).await.unwrap(), "/Photos 2024/sunset.jpg");

    let seen: Vec<ChangeKind> = events.take(3).map(|e| e.kind).collect().await;
    assert_eq!(
        seen,
        [
            ChangeKind::Saved {
                record_id: photos.id.to_string()
            },
            ChangeKind::Saved {
                record_id: sunset.id.to_string()
            },
            ChangeKind::Updated {
                record_id: photos.id.to_string()
            },
        ]
    );
}
