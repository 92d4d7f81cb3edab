use asset_history_core::config::LoginPolicy;
use asset_history_core::contract::MockAssetSource;
use asset_history_core::listing::list_versions;
use asset_history_core::{AssetVersion, Error};
use chrono::{TimeZone, Utc};
use mockall::Sequence;

fn version(number: i64) -> AssetVersion {
    let created = Utc.with_ymd_and_hms(2016, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::days(number);
    AssetVersion {
        id: 9000 + number,
        asset_id: 42,
        version_number: number,
        parent_asset_version_id: 9000 + number - 1,
        creator_type: 1,
        creator_target_id: 5,
        creating_universe_id: None,
        created,
        updated: created,
    }
}

fn denied() -> Error {
    Error::Status {
        code: 403,
        url: "https://api.example.test/assets/42/versions?page=1".into(),
    }
}

fn numbers(versions: &[AssetVersion]) -> Vec<i64> {
    versions.iter().map(|v| v.version_number).collect()
}

#[tokio::test]
async fn pages_are_concatenated_and_sorted_until_empty_page() {
    let mut source = MockAssetSource::new();
    source
        .expect_list_page()
        .withf(|id, page| *id == 42 && *page == 1)
        .times(1)
        .returning(|_, _| Ok(vec![version(3), version(1)]));
    source
        .expect_list_page()
        .withf(|_, page| *page == 2)
        .times(1)
        .returning(|_, _| Ok(vec![version(2)]));
    source
        .expect_list_page()
        .withf(|_, page| *page == 3)
        .times(1)
        .returning(|_, _| Ok(vec![]));
    source.expect_authenticate().never();

    let versions = list_versions(&source, 42, LoginPolicy::Lazy)
        .await
        .expect("listing should succeed");
    assert_eq!(numbers(&versions), vec![1, 2, 3]);
}

#[tokio::test]
async fn first_page_denial_logs_in_once_and_retries() {
    let mut seq = Sequence::new();
    let mut source = MockAssetSource::new();
    source
        .expect_list_page()
        .withf(|_, page| *page == 1)
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Err(denied()));
    source
        .expect_authenticate()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Ok(()));
    source
        .expect_list_page()
        .withf(|_, page| *page == 1)
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(vec![version(1)]));
    source
        .expect_list_page()
        .withf(|_, page| *page == 2)
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(vec![]));

    let versions = list_versions(&source, 42, LoginPolicy::Lazy).await.unwrap();
    assert_eq!(numbers(&versions), vec![1]);
}

#[tokio::test]
async fn second_denial_is_fatal_auth_error() {
    let mut source = MockAssetSource::new();
    source
        .expect_list_page()
        .withf(|_, page| *page == 1)
        .times(2)
        .returning(|_, _| Err(denied()));
    source.expect_authenticate().times(1).returning(|| Ok(()));

    let err = list_versions(&source, 42, LoginPolicy::Lazy)
        .await
        .expect_err("second denial must abort");
    match err {
        Error::Page { page, source, .. } => {
            assert_eq!(page, 1);
            assert!(matches!(*source, Error::Auth(_)), "got {source:?}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn login_failure_aborts_listing() {
    let mut source = MockAssetSource::new();
    source
        .expect_list_page()
        .times(1)
        .returning(|_, _| Err(denied()));
    source
        .expect_authenticate()
        .times(1)
        .returning(|| Err(Error::Auth("missing session cookie".into())));

    let err = list_versions(&source, 42, LoginPolicy::Lazy).await.unwrap_err();
    assert!(matches!(err, Error::Auth(_)));
}

#[tokio::test]
async fn eager_policy_logs_in_before_first_page() {
    let mut seq = Sequence::new();
    let mut source = MockAssetSource::new();
    source
        .expect_authenticate()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Ok(()));
    source
        .expect_list_page()
        .withf(|_, page| *page == 1)
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(vec![version(2), version(1)]));
    source
        .expect_list_page()
        .withf(|_, page| *page == 2)
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(vec![]));

    let versions = list_versions(&source, 42, LoginPolicy::Eager).await.unwrap();
    assert_eq!(numbers(&versions), vec![1, 2]);
}

#[tokio::test]
async fn later_page_errors_are_fatal_without_login() {
    let mut source = MockAssetSource::new();
    source
        .expect_list_page()
        .withf(|_, page| *page == 1)
        .times(1)
        .returning(|_, _| Ok(vec![version(1)]));
    source
        .expect_list_page()
        .withf(|_, page| *page == 2)
        .times(1)
        .returning(|_, _| {
            Err(Error::Status {
                code: 500,
                url: "https://api.example.test".into(),
            })
        });
    source.expect_authenticate().never();

    let err = list_versions(&source, 42, LoginPolicy::Lazy).await.unwrap_err();
    assert!(err.to_string().contains("page 2"), "message was {err}");
}
