//! Edit a landing page through an in-memory store, then export it as static HTML
//!
//! cargo run --example render_landing

use pagesmith::model::ComponentPatch;
use pagesmith::{Composer, EditSession, MemoryStore, PagePayload, PageStore};
use serde_json::json;
use std::sync::Arc;

const LANDING: &str = include_str!("../tests/fixtures/landing.json");

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("pagesmith - render landing example\n");

    let payload = PagePayload::from_json(LANDING)?;
    let page_id = payload.page.id;
    let store = Arc::new(MemoryStore::with_payload(payload));
    let composer = Arc::new(Composer::default());

    let mut session = EditSession::open(store.clone(), composer.clone(), page_id).await?;
    session.on_notice(|notice| eprintln!("{} rolled back: {}", notice.operation, notice.message));
    println!("Preview order: {:?}", session.preview().component_order());

    let patch = json!({ "title": "Reach orbit today" });
    if let Some(content) = patch.as_object().cloned() {
        session.update_component(2, ComponentPatch::content(content)).await?;
    }
    session.reorder_components(&[1, 2, 4, 3, 5, 6]).await?;
    println!("After edits:   {:?}", session.preview().component_order());

    // the exported page comes from what the store holds, not the session buffer
    let page = store.get_page(page_id).await?;
    let components = store.get_components(page_id).await?;
    let html = composer.export_static_page(&page, &components)?;
    println!("\nExported {} bytes:\n{}", html.len(), html);

    Ok(())
}
