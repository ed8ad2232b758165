//! Page storage boundary
//!
//! The engine never talks to a database or HTTP API directly. Everything it needs from
//! the CRUD layer goes through [`PageStore`]; [`MemoryStore`] is the in-process
//! implementation used by the CLI and the tests.

use crate::model::{Component, ComponentId, ComponentPatch, NewComponent, Page, PagePayload};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Abstract page/component persistence.
///
/// Implementations decide transport and durability. Each method is one round trip.
#[async_trait]
pub trait PageStore: Send + Sync {
    async fn get_page(&self, page_id: i64) -> Result<Page>;

    /// All components of a page, hidden ones included, in storage order.
    async fn get_components(&self, page_id: i64) -> Result<Vec<Component>>;

    /// Apply a shallow patch and return the stored component.
    async fn update_component(&self, id: ComponentId, patch: &ComponentPatch) -> Result<Component>;

    /// Persist a complete ordering in one call. `ids[i]` gets position `i`.
    async fn reorder_components(&self, page_id: i64, ids: &[ComponentId]) -> Result<Vec<Component>>;

    async fn create_component(&self, page_id: i64, data: NewComponent) -> Result<Component>;

    async fn delete_component(&self, id: ComponentId) -> Result<()>;
}

/// One journaled store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    GetPage(i64),
    GetComponents(i64),
    UpdateComponent(ComponentId),
    ReorderComponents(i64, Vec<ComponentId>),
    CreateComponent(i64),
    DeleteComponent(ComponentId),
}

impl StoreCall {
    /// Whether the call writes.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, StoreCall::GetPage(_) | StoreCall::GetComponents(_))
    }
}

#[derive(Default)]
struct Inner {
    pages: BTreeMap<i64, Page>,
    components: BTreeMap<i64, Vec<Component>>,
    next_id: ComponentId,
    fail_next: Option<String>,
    calls: Vec<StoreCall>,
}

impl Inner {
    fn page_of(&self, id: ComponentId) -> Option<i64> {
        self.components
            .iter()
            .find(|(_, comps)| comps.iter().any(|c| c.id == id))
            .map(|(page_id, _)| *page_id)
    }

    fn components_mut(&mut self, page_id: i64) -> Result<&mut Vec<Component>> {
        if !self.pages.contains_key(&page_id) {
            return Err(Error::Persistence(format!("page {} not found", page_id)));
        }
        Ok(self.components.entry(page_id).or_default())
    }

    /// Record a write and consume an injected failure, if any.
    fn begin_write(&mut self, call: StoreCall) -> Result<()> {
        self.calls.push(call);
        match self.fail_next.take() {
            Some(reason) => Err(Error::Persistence(reason)),
            None => Ok(()),
        }
    }
}

/// In-process [`PageStore`] with failure injection and a call journal.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    latency: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with one page and its components.
    pub fn with_payload(payload: PagePayload) -> Self {
        let store = Self::new();
        store.insert_page(payload.page, payload.components);
        store
    }

    /// Delay every write by `latency` before it is applied.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Insert or replace a page. New component ids continue after the largest seen.
    pub fn insert_page(&self, page: Page, components: Vec<Component>) {
        if let Ok(mut inner) = self.lock() {
            let max_id = components.iter().map(|c| c.id).max().unwrap_or(0);
            inner.next_id = inner.next_id.max(max_id);
            inner.components.insert(page.id, components);
            inner.pages.insert(page.id, page);
        }
    }

    /// Make the next write fail with a persistence error carrying `reason`.
    pub fn fail_next(&self, reason: &str) {
        if let Ok(mut inner) = self.lock() {
            inner.fail_next = Some(reason.to_string());
        }
    }

    /// Every call made so far, reads included.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().map(|inner| inner.calls.clone()).unwrap_or_default()
    }

    /// Writes made so far.
    pub fn mutations(&self) -> Vec<StoreCall> {
        self.calls().into_iter().filter(StoreCall::is_mutation).collect()
    }

    /// Persisted components of a page, sorted by position.
    pub fn stored_components(&self, page_id: i64) -> Vec<Component> {
        let mut comps = self
            .lock()
            .ok()
            .and_then(|inner| inner.components.get(&page_id).cloned())
            .unwrap_or_default();
        comps.sort_by_key(|c| c.position);
        comps
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| Error::Persistence("memory store lock poisoned".to_string()))
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl PageStore for MemoryStore {
    async fn get_page(&self, page_id: i64) -> Result<Page> {
        let mut inner = self.lock()?;
        inner.calls.push(StoreCall::GetPage(page_id));
        inner
            .pages
            .get(&page_id)
            .cloned()
            .ok_or_else(|| Error::Persistence(format!("page {} not found", page_id)))
    }

    async fn get_components(&self, page_id: i64) -> Result<Vec<Component>> {
        let mut inner = self.lock()?;
        inner.calls.push(StoreCall::GetComponents(page_id));
        Ok(inner.components.get(&page_id).cloned().unwrap_or_default())
    }

    async fn update_component(&self, id: ComponentId, patch: &ComponentPatch) -> Result<Component> {
        self.simulate_latency().await;
        let mut inner = self.lock()?;
        inner.begin_write(StoreCall::UpdateComponent(id))?;
        let page_id = inner.page_of(id).ok_or(Error::ComponentNotFound(id))?;
        let comps = inner.components_mut(page_id)?;
        let component = comps
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(Error::ComponentNotFound(id))?;
        patch.apply_to(component);
        Ok(component.clone())
    }

    async fn reorder_components(&self, page_id: i64, ids: &[ComponentId]) -> Result<Vec<Component>> {
        self.simulate_latency().await;
        let mut inner = self.lock()?;
        inner.begin_write(StoreCall::ReorderComponents(page_id, ids.to_vec()))?;
        let comps = inner.components_mut(page_id)?;
        if ids.len() != comps.len() || !comps.iter().all(|c| ids.contains(&c.id)) {
            return Err(Error::InvalidReorder(format!(
                "ordering does not cover the {} components of page {}",
                comps.len(),
                page_id
            )));
        }
        for comp in comps.iter_mut() {
            if let Some(index) = ids.iter().position(|id| *id == comp.id) {
                comp.position = index as i64;
            }
        }
        comps.sort_by_key(|c| c.position);
        Ok(comps.clone())
    }

    async fn create_component(&self, page_id: i64, data: NewComponent) -> Result<Component> {
        self.simulate_latency().await;
        let mut inner = self.lock()?;
        inner.begin_write(StoreCall::CreateComponent(page_id))?;
        inner.components_mut(page_id)?;
        inner.next_id += 1;
        let component = data.into_component(inner.next_id);
        inner.components_mut(page_id)?.push(component.clone());
        Ok(component)
    }

    async fn delete_component(&self, id: ComponentId) -> Result<()> {
        self.simulate_latency().await;
        let mut inner = self.lock()?;
        inner.begin_write(StoreCall::DeleteComponent(id))?;
        let page_id = inner.page_of(id).ok_or(Error::ComponentNotFound(id))?;
        inner.components_mut(page_id)?.retain(|c| c.id != id);
        Ok(())
    }
}
