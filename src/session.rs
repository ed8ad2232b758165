//! Live editing of one page
//!
//! An [`EditSession`] owns an in-memory buffer of a page's components. Every mutation
//! is applied to the buffer first and the preview is re-rendered synchronously; then
//! exactly one store call persists the change. If that call fails or times out, the
//! buffer is restored to the last persisted snapshot and registered notice handlers
//! are told.
//!
//! ```text
//! Clean -> Editing -> Persisting -> Clean
//!                               \-> Reverted (rolled back)
//! ```

use crate::model::{Component, ComponentId, ComponentPatch, NewComponent, Page};
use crate::rendering::{Composer, Mode, RenderedDocument};
use crate::store::PageStore;
use crate::{Error, Result, SessionConfig};
use log::{debug, error};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Where a session is in its edit cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Buffer matches the last persisted state
    Clean,
    /// A local mutation has been applied
    Editing,
    /// The mutation's store call is outstanding
    Persisting,
    /// Clean again after a failed persist was rolled back
    Reverted,
}

/// User-visible notification of a rolled-back edit
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub page_id: i64,
    /// Which operation was rolled back, e.g. `"reorder"`
    pub operation: &'static str,
    pub message: String,
}

/// Callback invoked with every [`Notice`]
pub type NoticeHandler = Arc<dyn Fn(&Notice) + Send + Sync>;

/// Editing controller for a single page.
///
/// Mutations take `&mut self`, so one session never has two edits in flight. If a
/// mutation's future is dropped while its store call is outstanding, the session stays
/// [`SessionState::Persisting`] and rejects further edits with [`Error::SessionBusy`]
/// until [`abandon_pending`](Self::abandon_pending) is called.
pub struct EditSession {
    store: Arc<dyn PageStore>,
    composer: Arc<Composer>,
    config: SessionConfig,
    page: Page,
    components: Vec<Component>,
    snapshot: Vec<Component>,
    state: SessionState,
    preview: RenderedDocument,
    selected: Option<ComponentId>,
    next_provisional_id: ComponentId,
    on_notice: Option<NoticeHandler>,
}

impl EditSession {
    /// Load a page and its components and render the first preview.
    pub async fn open(
        store: Arc<dyn PageStore>,
        composer: Arc<Composer>,
        page_id: i64,
    ) -> Result<Self> {
        Self::open_with_config(store, composer, page_id, SessionConfig::default()).await
    }

    pub async fn open_with_config(
        store: Arc<dyn PageStore>,
        composer: Arc<Composer>,
        page_id: i64,
        config: SessionConfig,
    ) -> Result<Self> {
        let page = store.get_page(page_id).await?;
        let components = store.get_components(page_id).await?;
        let preview = composer.render_page(&page, &components, Mode::Interactive);
        Ok(Self {
            store,
            composer,
            config,
            page,
            snapshot: components.clone(),
            components,
            state: SessionState::Clean,
            preview,
            selected: None,
            next_provisional_id: -1,
            on_notice: None,
        })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// The edit buffer, including hidden components.
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The interactive rendering of the current buffer.
    pub fn preview(&self) -> &RenderedDocument {
        &self.preview
    }

    pub fn selected(&self) -> Option<ComponentId> {
        self.selected
    }

    /// Mark a component as selected in the preview. Not persisted.
    pub fn select(&mut self, id: Option<ComponentId>) {
        self.selected = id;
        self.refresh_preview();
    }

    /// Register a callback for rolled-back edits.
    pub fn on_notice<F>(&mut self, cb: F)
    where
        F: Fn(&Notice) + Send + Sync + 'static,
    {
        self.on_notice = Some(Arc::new(cb));
    }

    pub fn clear_on_notice(&mut self) {
        self.on_notice = None;
    }

    /// Append a component of `type_tag` with the type's defaults, at position
    /// `len(components)`. Returns the id assigned by the store.
    pub async fn add_component(&mut self, type_tag: &str) -> Result<ComponentId> {
        self.ensure_idle()?;
        let registry = self.composer.components();
        let data = NewComponent {
            component_type: type_tag.to_string(),
            content: registry.default_content(type_tag),
            styles: registry.default_styles(type_tag),
            position: self.components.len() as i64,
            is_visible: true,
        };
        let provisional_id = self.next_provisional_id;
        self.next_provisional_id -= 1;
        self.components.push(data.clone().into_component(provisional_id));
        self.mark_edited();

        let store = Arc::clone(&self.store);
        let result = self.persist(store.create_component(self.page.id, data)).await;
        match result {
            Ok(created) => {
                let id = created.id;
                if let Some(slot) = self.components.iter_mut().find(|c| c.id == provisional_id) {
                    *slot = created;
                }
                if self.selected == Some(provisional_id) {
                    self.selected = Some(id);
                }
                self.commit();
                Ok(id)
            }
            Err(err) => Err(self.rollback("add", err)),
        }
    }

    /// Shallow-merge `patch` into a component. Array-valued fields are replaced whole.
    pub async fn update_component(&mut self, id: ComponentId, patch: ComponentPatch) -> Result<()> {
        self.ensure_idle()?;
        let index = self.index_of(id)?;
        if patch.is_empty() {
            return Ok(());
        }
        patch.apply_to(&mut self.components[index]);
        self.mark_edited();

        let store = Arc::clone(&self.store);
        let result = self.persist(store.update_component(id, &patch)).await;
        match result {
            Ok(stored) => {
                if let Some(slot) = self.components.iter_mut().find(|c| c.id == id) {
                    *slot = stored;
                }
                self.commit();
                Ok(())
            }
            Err(err) => Err(self.rollback("update", err)),
        }
    }

    /// Give `ids[i]` position `i` in one transition and persist the full ordering in one
    /// call. `ids` must be a permutation of the buffer's ids.
    pub async fn reorder_components(&mut self, ids: &[ComponentId]) -> Result<()> {
        self.ensure_idle()?;
        self.check_permutation(ids)?;
        for component in self.components.iter_mut() {
            if let Some(index) = ids.iter().position(|id| *id == component.id) {
                component.position = index as i64;
            }
        }
        self.components.sort_by_key(|c| c.position);
        self.mark_edited();

        let store = Arc::clone(&self.store);
        let result = self.persist(store.reorder_components(self.page.id, ids)).await;
        match result {
            Ok(_) => {
                self.commit();
                Ok(())
            }
            Err(err) => Err(self.rollback("reorder", err)),
        }
    }

    /// Remove a component. Remaining positions are left as they are.
    pub async fn delete_component(&mut self, id: ComponentId) -> Result<()> {
        self.ensure_idle()?;
        let index = self.index_of(id)?;
        self.components.remove(index);
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.mark_edited();

        let store = Arc::clone(&self.store);
        let result = self.persist(store.delete_component(id)).await;
        match result {
            Ok(()) => {
                self.commit();
                Ok(())
            }
            Err(err) => Err(self.rollback("delete", err)),
        }
    }

    /// Flip a component's visibility. Returns the new value.
    pub async fn toggle_visible(&mut self, id: ComponentId) -> Result<bool> {
        self.ensure_idle()?;
        let index = self.index_of(id)?;
        let visible = !self.components[index].is_visible;
        self.components[index].is_visible = visible;
        self.mark_edited();

        let store = Arc::clone(&self.store);
        let patch = ComponentPatch::visibility(visible);
        let result = self.persist(store.update_component(id, &patch)).await;
        match result {
            Ok(_) => {
                self.commit();
                Ok(visible)
            }
            Err(err) => Err(self.rollback("toggle", err)),
        }
    }

    /// Roll back an edit whose future was dropped mid-persist. Returns whether there was
    /// one. The store may or may not have applied it.
    pub fn abandon_pending(&mut self) -> bool {
        if self.state != SessionState::Persisting {
            return false;
        }
        self.restore_snapshot();
        true
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.state == SessionState::Persisting {
            return Err(Error::SessionBusy);
        }
        Ok(())
    }

    fn index_of(&self, id: ComponentId) -> Result<usize> {
        self.components
            .iter()
            .position(|c| c.id == id)
            .ok_or(Error::ComponentNotFound(id))
    }

    fn check_permutation(&self, ids: &[ComponentId]) -> Result<()> {
        let unique: HashSet<ComponentId> = ids.iter().copied().collect();
        if unique.len() != ids.len() {
            return Err(Error::InvalidReorder("duplicate component id".to_string()));
        }
        if ids.len() != self.components.len() {
            return Err(Error::InvalidReorder(format!(
                "expected {} ids, got {}",
                self.components.len(),
                ids.len()
            )));
        }
        if let Some(missing) = self.components.iter().find(|c| !unique.contains(&c.id)) {
            return Err(Error::InvalidReorder(format!(
                "component {} missing from ordering",
                missing.id
            )));
        }
        Ok(())
    }

    /// Local mutation applied: re-render, then hand over to persistence.
    fn mark_edited(&mut self) {
        self.state = SessionState::Editing;
        self.refresh_preview();
        self.state = SessionState::Persisting;
    }

    async fn persist<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let ms = self.config.persist_timeout_ms;
        match tokio::time::timeout(Duration::from_millis(ms), call).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(ms)),
        }
    }

    fn commit(&mut self) {
        self.snapshot = self.components.clone();
        self.state = SessionState::Clean;
        self.refresh_preview();
        debug!("page {} persisted", self.page.id);
    }

    fn rollback(&mut self, operation: &'static str, err: Error) -> Error {
        error!(
            "page {}: {} failed, rolling back: {}",
            self.page.id, operation, err
        );
        self.restore_snapshot();
        if let Some(handler) = &self.on_notice {
            handler(&Notice {
                page_id: self.page.id,
                operation,
                message: err.to_string(),
            });
        }
        err
    }

    fn restore_snapshot(&mut self) {
        self.components = self.snapshot.clone();
        if let Some(id) = self.selected {
            if !self.components.iter().any(|c| c.id == id) {
                self.selected = None;
            }
        }
        self.state = SessionState::Reverted;
        self.refresh_preview();
    }

    fn refresh_preview(&mut self) {
        self.preview = self.composer.render_page_with_selection(
            &self.page,
            &self.components,
            Mode::Interactive,
            self.selected,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PageConfig;
    use crate::store::MemoryStore;

    fn store() -> Arc<MemoryStore> {
        let page = Page {
            id: 9,
            title: "Edit me".into(),
            description: String::new(),
            slug: "edit".into(),
            subdomain: "acme".into(),
            config: PageConfig::default(),
            is_published: false,
            created_at: None,
            updated_at: None,
        };
        let store = MemoryStore::new();
        store.insert_page(page, vec![Component::new(1, "hero", 0)]);
        Arc::new(store)
    }

    async fn open(store: &Arc<MemoryStore>) -> EditSession {
        EditSession::open(store.clone(), Arc::new(Composer::default()), 9)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn add_replaces_provisional_id() {
        let store = store();
        let mut session = open(&store).await;
        let id = session.add_component("button").await.unwrap();
        assert_eq!(id, 2);
        assert_eq!(session.state(), SessionState::Clean);
        assert!(session.components().iter().all(|c| c.id > 0));
        assert_eq!(session.components()[1].position, 1);
        assert_eq!(session.components()[1].content["variant"], "primary");
    }

    #[tokio::test]
    async fn unknown_component_is_not_found() {
        let store = store();
        let mut session = open(&store).await;
        let err = session.toggle_visible(42).await.unwrap_err();
        assert!(matches!(err, Error::ComponentNotFound(42)));
        assert_eq!(session.state(), SessionState::Clean);
        assert!(store.mutations().is_empty());
    }

    #[tokio::test]
    async fn invalid_reorder_leaves_state_alone() {
        let store = store();
        let mut session = open(&store).await;
        let err = session.reorder_components(&[1, 1]).await.unwrap_err();
        assert!(matches!(err, Error::InvalidReorder(_)));
        assert_eq!(session.state(), SessionState::Clean);
    }
}
