//! Collection management.

use super::{AppResult, CodexApp, StatusLevel};
use crate::gateway::Gateway;
use codex_core::models::collection::{Collection, CollectionEntry, CollectionRequest};
use codex_core::View;

impl<G: Gateway + 'static> CodexApp<G> {
    pub async fn load_collections(&mut self) -> AppResult<&[Collection]> {
        let session = self.require_session("list_collections")?;
        match self.gateway.list_collections(&session).await {
            Ok(collections) => {
                self.collections = collections;
                Ok(&self.collections)
            }
            Err(err) => Err(self.fail("list_collections", err)),
        }
    }

    pub async fn create_collection(
        &mut self,
        name: &str,
        description: &str,
    ) -> AppResult<Collection> {
        let session = self.require_session("create_collection")?;
        let Some(request) = collection_request(name, description) else {
            return Err(self.reject("Collection name is required"));
        };
        match self.gateway.create_collection(&session, &request).await {
            Ok(created) => {
                self.collections.insert(0, created.clone());
                self.set_status(
                    StatusLevel::Info,
                    format!("Created collection \"{}\"", created.name),
                );
                Ok(created)
            }
            Err(err) => Err(self.fail("create_collection", err)),
        }
    }

    pub async fn update_collection(
        &mut self,
        id: &str,
        name: &str,
        description: &str,
    ) -> AppResult<Collection> {
        let session = self.require_session("update_collection")?;
        let Some(request) = collection_request(name, description) else {
            return Err(self.reject("Collection name is required"));
        };
        match self.gateway.update_collection(&session, id, &request).await {
            Ok(updated) => {
                if let Some(slot) = self.collections.iter_mut().find(|c| c.id == id) {
                    *slot = updated.clone();
                }
                if let Some(open) = self.selected_collection.as_mut().filter(|c| c.id == id) {
                    // Keep populated entries; list responses may carry bare ids.
                    open.name = updated.name.clone();
                    open.description = updated.description.clone();
                }
                Ok(updated)
            }
            Err(err) => Err(self.fail("update_collection", err)),
        }
    }

    pub async fn delete_collection(&mut self, id: &str) -> AppResult<()> {
        let session = self.require_session("delete_collection")?;
        if let Err(err) = self.gateway.delete_collection(&session, id).await {
            return Err(self.fail("delete_collection", err));
        }
        self.collections.retain(|c| c.id != id);
        if self.selected_collection.as_ref().is_some_and(|c| c.id == id) {
            self.selected_collection = None;
        }
        if matches!(&self.view, View::CollectionDetail(open) if open == id) {
            self.view = View::Collections;
        }
        self.set_status(StatusLevel::Info, "Collection deleted");
        Ok(())
    }

    /// Fetch a collection with its snippets and show it.
    pub async fn open_collection(&mut self, id: &str) -> AppResult<&Collection> {
        let session = self.require_session("get_collection")?;
        let collection = match self.gateway.get_collection(&session, id).await {
            Ok(collection) => collection,
            Err(err) => return Err(self.fail("get_collection", err)),
        };
        self.view = View::CollectionDetail(collection.id.clone());
        Ok(self.selected_collection.insert(collection))
    }

    pub async fn add_to_collection(
        &mut self,
        collection_id: &str,
        snippet_id: &str,
    ) -> AppResult<()> {
        let session = self.require_session("add_to_collection")?;
        if let Err(err) = self
            .gateway
            .add_to_collection(&session, collection_id, snippet_id)
            .await
        {
            return Err(self.fail("add_to_collection", err));
        }
        let populated = self.cache.find(snippet_id).cloned();
        for collection in self
            .collections
            .iter_mut()
            .chain(self.selected_collection.as_mut())
            .filter(|c| c.id == collection_id)
        {
            if collection.contains(snippet_id) {
                continue;
            }
            let entry = match &populated {
                Some(snippet) => CollectionEntry::Snippet(Box::new(snippet.clone())),
                None => CollectionEntry::Id(snippet_id.to_string()),
            };
            collection.snippets.push(entry);
        }
        self.set_status(StatusLevel::Info, "Added to collection");
        Ok(())
    }
}

fn collection_request(name: &str, description: &str) -> Option<CollectionRequest> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some(CollectionRequest {
        name: name.to_string(),
        description: description.trim().to_string(),
    })
}
