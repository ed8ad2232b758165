use pagesmith::model::{ComponentPatch, PageConfig};
use pagesmith::store::{MemoryStore, StoreCall};
use pagesmith::{Component, Composer, EditSession, Error, Notice, Page, SessionConfig, SessionState};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const PAGE_ID: i64 = 7;

fn draft_page() -> Page {
    Page {
        id: PAGE_ID,
        title: "Draft".into(),
        description: String::new(),
        slug: "draft".into(),
        subdomain: "acme".into(),
        config: PageConfig::with_theme("dark"),
        is_published: false,
        created_at: None,
        updated_at: None,
    }
}

fn seed(store: MemoryStore) -> Arc<MemoryStore> {
    store.insert_page(
        draft_page(),
        vec![
            Component::new(1, "header", 0),
            Component::new(2, "hero", 1),
            Component::new(3, "footer", 2),
        ],
    );
    Arc::new(store)
}

fn seeded_store() -> Arc<MemoryStore> {
    seed(MemoryStore::new())
}

async fn open(store: &Arc<MemoryStore>) -> EditSession {
    EditSession::open(store.clone(), Arc::new(Composer::default()), PAGE_ID)
        .await
        .expect("open session")
}

fn collect_notices(session: &mut EditSession) -> Arc<Mutex<Vec<Notice>>> {
    let notices = Arc::new(Mutex::new(Vec::new()));
    let sink = notices.clone();
    session.on_notice(move |n: &Notice| sink.lock().unwrap().push(n.clone()));
    notices
}

fn positions(session: &EditSession) -> Vec<(i64, i64)> {
    let mut pairs: Vec<_> = session.components().iter().map(|c| (c.id, c.position)).collect();
    pairs.sort();
    pairs
}

#[tokio::test]
async fn reorder_is_one_transition_and_one_call() {
    let store = seeded_store();
    let mut session = open(&store).await;

    session.reorder_components(&[3, 1, 2]).await.unwrap();

    assert_eq!(positions(&session), vec![(1, 1), (2, 2), (3, 0)]);
    assert_eq!(session.preview().component_order(), vec![3, 1, 2]);
    assert_eq!(session.state(), SessionState::Clean);
    assert_eq!(
        store.mutations(),
        vec![StoreCall::ReorderComponents(PAGE_ID, vec![3, 1, 2])]
    );
    let stored: Vec<i64> = store.stored_components(PAGE_ID).iter().map(|c| c.id).collect();
    assert_eq!(stored, vec![3, 1, 2]);
}

#[tokio::test]
async fn rejected_reorder_restores_original_order() {
    let store = seeded_store();
    let mut session = open(&store).await;
    let notices = collect_notices(&mut session);

    store.fail_next("network unreachable");
    let err = session.reorder_components(&[3, 1, 2]).await.unwrap_err();

    assert!(err.is_persistence());
    assert_eq!(session.state(), SessionState::Reverted);
    assert_eq!(positions(&session), vec![(1, 0), (2, 1), (3, 2)]);
    assert_eq!(session.preview().component_order(), vec![1, 2, 3]);

    let notices = notices.lock().unwrap();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].operation, "reorder");
    assert!(notices[0].message.contains("network unreachable"));
}

#[tokio::test]
async fn session_recovers_after_revert() {
    let store = seeded_store();
    let mut session = open(&store).await;

    store.fail_next("boom");
    assert!(session.delete_component(2).await.is_err());
    assert_eq!(session.components().len(), 3);

    session.delete_component(2).await.unwrap();
    assert_eq!(session.state(), SessionState::Clean);
    // remaining positions are not renumbered
    assert_eq!(positions(&session), vec![(1, 0), (3, 2)]);
}

#[tokio::test]
async fn add_appends_defaults_at_end() {
    let store = seeded_store();
    let mut session = open(&store).await;

    let id = session.add_component("text").await.unwrap();

    let added = session.components().iter().find(|c| c.id == id).unwrap();
    assert_eq!(added.position, 3);
    assert!(added.is_visible);
    assert_eq!(added.content["alignment"], "left");
    assert_eq!(session.preview().component_order(), vec![1, 2, 3, id]);
    assert_eq!(store.mutations(), vec![StoreCall::CreateComponent(PAGE_ID)]);
}

#[tokio::test]
async fn failed_add_drops_provisional_component() {
    let store = seeded_store();
    let mut session = open(&store).await;

    store.fail_next("quota exceeded");
    assert!(session.add_component("image").await.is_err());
    assert_eq!(session.components().len(), 3);
    assert!(session.components().iter().all(|c| c.id > 0));
}

#[tokio::test]
async fn failed_add_raises_notice() {
    let store = seeded_store();
    let mut session = open(&store).await;
    let notices = collect_notices(&mut session);

    store.fail_next("quota exceeded");
    session.add_component("image").await.unwrap_err();

    assert_eq!(session.preview().component_order(), vec![1, 2, 3]);
    let notices = notices.lock().unwrap();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].page_id, PAGE_ID);
    assert_eq!(notices[0].operation, "add");
    assert!(notices[0].message.contains("quota exceeded"));
}

#[tokio::test]
async fn rejected_update_restores_content_and_preview() {
    let store = seeded_store();
    let mut session = open(&store).await;
    let notices = collect_notices(&mut session);
    let before = session.components()[1].clone();
    let before_html = session.preview().to_html();

    store.fail_next("write conflict");
    let patch = json!({ "title": "Launch day" });
    let err = session
        .update_component(2, ComponentPatch::content(patch.as_object().cloned().unwrap()))
        .await
        .unwrap_err();

    assert!(err.is_persistence());
    assert_eq!(session.state(), SessionState::Reverted);
    assert_eq!(session.components()[1], before);
    assert_eq!(session.preview().to_html(), before_html);
    assert!(!before_html.contains("Launch day"));

    let stored = store.stored_components(PAGE_ID);
    let hero = stored.iter().find(|c| c.id == 2).unwrap();
    assert!(hero.content.get("title").is_none());

    let notices = notices.lock().unwrap();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].operation, "update");
    assert!(notices[0].message.contains("write conflict"));
}

#[tokio::test]
async fn style_update_reaches_preview() {
    let store = seeded_store();
    let mut session = open(&store).await;

    let styles = json!({ "paddingTop": 120 });
    session
        .update_component(2, ComponentPatch::styles(styles.as_object().cloned().unwrap()))
        .await
        .unwrap();

    assert!(session.preview().to_html().contains("padding-top:120px;"));
    assert_eq!(session.components()[1].styles["paddingTop"], 120);
    assert_eq!(store.mutations(), vec![StoreCall::UpdateComponent(2)]);
}

#[tokio::test]
async fn cleared_notice_handler_is_not_called() {
    let store = seeded_store();
    let mut session = open(&store).await;
    let notices = collect_notices(&mut session);
    session.clear_on_notice();

    store.fail_next("offline");
    assert!(session.toggle_visible(1).await.is_err());
    assert!(notices.lock().unwrap().is_empty());
}

#[tokio::test]
async fn update_is_shallow_and_replaces_arrays() {
    let store = seeded_store();
    let mut session = open(&store).await;

    let patch = json!({ "menu_items": [{ "text": "Blog", "link": "/blog" }] });
    session
        .update_component(1, ComponentPatch::content(patch.as_object().cloned().unwrap()))
        .await
        .unwrap();

    let header = &session.components()[0];
    assert_eq!(header.content["menu_items"], json!([{ "text": "Blog", "link": "/blog" }]));
    assert!(session.preview().to_html().contains("/blog"));
    assert_eq!(store.mutations(), vec![StoreCall::UpdateComponent(1)]);
}

#[tokio::test]
async fn toggle_hides_from_preview_without_moving() {
    let store = seeded_store();
    let mut session = open(&store).await;

    assert!(!session.toggle_visible(2).await.unwrap());
    assert_eq!(session.preview().component_order(), vec![1, 3]);
    assert_eq!(positions(&session), vec![(1, 0), (2, 1), (3, 2)]);

    assert!(session.toggle_visible(2).await.unwrap());
    assert_eq!(session.preview().component_order(), vec![1, 2, 3]);
}

#[tokio::test]
async fn slow_store_times_out_and_rolls_back() {
    let slow = seed(MemoryStore::new().with_latency(Duration::from_millis(500)));

    let mut session = EditSession::open_with_config(
        slow.clone(),
        Arc::new(Composer::default()),
        PAGE_ID,
        SessionConfig {
            persist_timeout_ms: 20,
        },
    )
    .await
    .unwrap();

    let err = session.toggle_visible(1).await.unwrap_err();
    assert!(matches!(err, Error::Timeout(20)));
    assert_eq!(session.state(), SessionState::Reverted);
    assert!(session.components()[0].is_visible);
}

#[tokio::test]
async fn dropped_edit_blocks_until_abandoned() {
    let store = seed(MemoryStore::new().with_latency(Duration::from_millis(500)));
    let mut session = open(&store).await;

    {
        let pending = session.reorder_components(&[2, 3, 1]);
        let timed_out = tokio::time::timeout(Duration::from_millis(10), pending).await;
        assert!(timed_out.is_err());
    }
    assert_eq!(session.state(), SessionState::Persisting);
    assert!(matches!(
        session.toggle_visible(1).await,
        Err(Error::SessionBusy)
    ));

    assert!(session.abandon_pending());
    assert_eq!(session.state(), SessionState::Reverted);
    assert_eq!(session.preview().component_order(), vec![1, 2, 3]);
    assert!(!session.abandon_pending());
}

#[tokio::test]
async fn selection_marks_preview_wrapper() {
    let store = seeded_store();
    let mut session = open(&store).await;
    session.select(Some(2));
    let html = session.preview().to_html();
    assert!(html.contains("class=\"ps-editable ps-selected\" data-component-id=\"2\""));
}
