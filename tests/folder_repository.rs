mod common;

use asset_library::{
    models::{
        asset::{AssetFilter, NewAsset},
        folder::resolve_folder,
    },
    services::{error::LibraryError, session::Session},
};
use common::{file, library, signed_in};
use uuid::Uuid;

#[tokio::test]
async fn create_and_list_in_creation_order() {
    let lib = library().await;
    let session = signed_in("u1");
    for name in ["Invoices", "Decks", "Invoices"] {
        lib.state
            .folders
            .create_folder(&session, name)
            .await
            .unwrap();
    }

    let folders = lib.state.folders.list_folders().await.unwrap();
    let names: Vec<&str> = folders.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["Invoices", "Decks", "Invoices"]);
    assert!(folders.iter().all(|f| f.created_by.as_deref() == Some("u1")));
}

#[tokio::test]
async fn create_requires_session_and_name() {
    let lib = library().await;

    let err = lib
        .state
        .folders
        .create_folder(&Session::anonymous(), "Invoices")
        .await
        .unwrap_err();
    assert!(matches!(err, LibraryError::AuthRequired));

    let err = lib
        .state
        .folders
        .create_folder(&signed_in("u1"), "  ")
        .await
        .unwrap_err();
    assert!(matches!(err, LibraryError::Validation(_)));

    assert!(lib.state.folders.list_folders().await.unwrap().is_empty());
}

#[tokio::test]
async fn rename_folder() {
    let lib = library().await;
    let folder = lib
        .state
        .folders
        .create_folder(&signed_in("u1"), "Invoces")
        .await
        .unwrap();

    let renamed = lib
        .state
        .folders
        .rename_folder(folder.id, "Invoices")
        .await
        .unwrap();
    assert_eq!(renamed.name, "Invoices");
    assert_eq!(renamed.created_at, folder.created_at);

    let unchanged = lib
        .state
        .folders
        .rename_folder(folder.id, "Invoices")
        .await
        .unwrap();
    assert_eq!(unchanged, renamed);

    let err = lib
        .state
        .folders
        .rename_folder(folder.id, "")
        .await
        .unwrap_err();
    assert!(matches!(err, LibraryError::Validation(_)));

    let err = lib
        .state
        .folders
        .rename_folder(Uuid::new_v4(), "Elsewhere")
        .await
        .unwrap_err();
    assert!(matches!(err, LibraryError::NotFound { entity: "folder", .. }));
}

#[tokio::test]
async fn delete_unknown_folder_is_not_found() {
    let lib = library().await;
    let err = lib
        .state
        .folders
        .delete_folder(Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, LibraryError::NotFound { .. }));
}

#[tokio::test]
async fn deleting_folder_leaves_assets_with_dangling_reference() {
    let lib = library().await;
    let session = signed_in("u1");
    let invoices = lib
        .state
        .folders
        .create_folder(&session, "Invoices")
        .await
        .unwrap();
    let asset = lib
        .state
        .assets
        .upload_asset(
            &session,
            NewAsset {
                file: file("march.pdf", b"%PDF"),
                display_name: "March".into(),
                tags: vec![],
            },
        )
        .await
        .unwrap();
    lib.state
        .assets
        .move_asset(asset.id, Some(invoices.id))
        .await
        .unwrap();

    let listed = lib
        .state
        .assets
        .list_assets(&AssetFilter::default())
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].folder_id, Some(invoices.id));

    lib.state.folders.delete_folder(invoices.id).await.unwrap();

    let folders = lib.state.folders.list_folders().await.unwrap();
    assert!(folders.iter().all(|f| f.id != invoices.id));

    let listed = lib
        .state
        .assets
        .list_assets(&AssetFilter::default())
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, asset.id);
    assert_eq!(listed[0].folder_id, Some(invoices.id));
    assert!(resolve_folder(&folders, listed[0].folder_id).is_none());
}
