mod common;

use asset_library::{
    models::asset::{AssetFilter, NewAsset},
    services::{
        error::LibraryError,
        library_view::{LibraryView, UNFILED_LABEL},
    },
};
use common::{file, library, signed_in};

fn upload(name: &str) -> NewAsset {
    NewAsset {
        file: file(&format!("{name}.png"), b"png"),
        display_name: name.into(),
        tags: vec![],
    }
}

#[tokio::test]
async fn failed_refresh_keeps_previous_results() {
    let lib = library().await;
    lib.state
        .assets
        .upload_asset(&signed_in("u1"), upload("logo"))
        .await
        .unwrap();

    let mut view = LibraryView::new();
    view.refresh_assets(&lib.state.assets, &AssetFilter::default())
        .await;
    assert_eq!(view.assets().map(<[_]>::len), Some(1));
    assert_eq!(view.assets_error(), None);

    lib.pool.close().await;
    view.refresh_assets(&lib.state.assets, &AssetFilter::default())
        .await;

    assert!(view.assets_error().is_some());
    assert_eq!(view.assets().map(<[_]>::len), Some(1));
}

#[tokio::test]
async fn stale_responses_are_discarded() {
    let lib = library().await;
    let session = signed_in("u1");
    lib.state
        .assets
        .upload_asset(&session, upload("old"))
        .await
        .unwrap();

    let mut view = LibraryView::new();
    let first = view.begin_assets_refresh();
    let stale = lib.state.assets.list_assets(&AssetFilter::default()).await;

    lib.state
        .assets
        .upload_asset(&session, upload("new"))
        .await
        .unwrap();
    let second = view.begin_assets_refresh();
    let fresh = lib.state.assets.list_assets(&AssetFilter::default()).await;

    assert!(view.apply_assets(second, fresh));
    assert!(!view.apply_assets(first, stale));
    assert_eq!(view.assets().map(<[_]>::len), Some(2));

    // a late failure from an older request must not surface either
    let third = view.begin_assets_refresh();
    assert!(!view.apply_assets(second, Err(LibraryError::AuthRequired)));
    assert_eq!(view.assets_error(), None);
    assert!(view.apply_assets(third, Err(LibraryError::AuthRequired)));
    assert!(view.assets_error().is_some());
    assert_eq!(view.assets().map(<[_]>::len), Some(2));
}

#[tokio::test]
async fn deleted_folder_reads_as_unfiled() {
    let lib = library().await;
    let session = signed_in("u1");
    let folder = lib
        .state
        .folders
        .create_folder(&session, "Invoices")
        .await
        .unwrap();
    let filed = lib
        .state
        .assets
        .upload_asset(&session, upload("filed"))
        .await
        .unwrap();
    lib.state
        .assets
        .upload_asset(&session, upload("loose"))
        .await
        .unwrap();
    lib.state
        .assets
        .move_asset(filed.id, Some(folder.id))
        .await
        .unwrap();

    let mut view = LibraryView::new();
    view.refresh_folders(&lib.state.folders).await;
    view.refresh_assets(&lib.state.assets, &AssetFilter::default())
        .await;
    view.select_folder(Some(folder.id));

    let visible = view.visible_assets();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, filed.id);
    assert_eq!(view.folder_label(visible[0]), "Invoices");

    lib.state.folders.delete_folder(folder.id).await.unwrap();
    view.refresh_folders(&lib.state.folders).await;
    view.refresh_assets(&lib.state.assets, &AssetFilter::default())
        .await;

    // the stale selection falls back to everything, and nothing errors
    assert_eq!(view.visible_assets().len(), 2);
    for asset in view.visible_assets() {
        assert_eq!(view.folder_label(asset), UNFILED_LABEL);
    }
    assert_eq!(view.folders_error(), None);
}
