//! Relational views over the entity store.
//!
//! Every read that needs related data goes through [`ViewService`], which
//! prefixes a [`View`]'s plan with the caller's filter (and, for listings, the
//! visibility, search, sort and window stages) and runs it as one pipeline.

mod builder;
pub mod catalog;

pub use builder::{EdgeView, ViewBuilder};
pub use catalog::*;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use vidtube_common::{AppError, AppResult};
use vidtube_db::entities::Entity;
use vidtube_db::{Document, DocumentStore, Filter, Stage};

use crate::pagination::{Page, PageComposer, PageRequest};

/// A denormalized read model rooted at one entity collection.
pub trait View: DeserializeOwned + Send + 'static {
    /// Collection the view is rooted at.
    type Source: Entity;

    /// Join and compute stages, applied after the source documents are matched.
    fn plan(viewer: Option<&str>) -> ViewBuilder;
}

/// A view that can be listed page by page.
pub trait Listing: View {
    /// Text fields searched by [`PageRequest::query`].
    const SEARCH_FIELDS: &'static [&'static str] = &[];

    /// Fields a caller may sort by.
    const SORT_FIELDS: &'static [&'static str];

    /// Sort field used when the requested one is not allowed.
    const DEFAULT_SORT: &'static str;

    /// Which source documents `viewer` may see.
    fn visibility(_viewer: Option<&str>) -> Filter {
        Filter::All
    }
}

/// Executes views against the store.
#[derive(Clone)]
pub struct ViewService {
    store: Arc<dyn DocumentStore>,
    pages: PageComposer,
}

impl ViewService {
    /// Create a new view service.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, pages: PageComposer) -> Self {
        Self { store, pages }
    }

    /// Every `V` whose source document matches `filter`, in store order.
    pub async fn build_view<V: View>(&self, filter: Filter, viewer: Option<&str>) -> AppResult<Vec<V>> {
        let mut pipeline = vec![Stage::Match(filter)];
        pipeline.extend(V::plan(viewer).build());

        let docs = self
            .store
            .aggregate(V::Source::COLLECTION, &pipeline)
            .await?;
        decode_all(docs)
    }

    /// The first `V` matching `filter`, or `NotFound`.
    pub async fn build_one<V: View>(&self, filter: Filter, viewer: Option<&str>) -> AppResult<V> {
        self.build_view(filter, viewer)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("{} not found", V::Source::LABEL)))
    }

    /// One page of `V` matching `filter`.
    ///
    /// Visibility and search narrow the match before any join runs. The total
    /// is counted over the same match, independently of the window.
    pub async fn build_paged_view<V: Listing>(
        &self,
        filter: Filter,
        request: &PageRequest,
        viewer: Option<&str>,
    ) -> AppResult<Page<V>> {
        let window = self.pages.window(request)?;

        let search = match request.search_text() {
            Some(text) if !V::SEARCH_FIELDS.is_empty() => Filter::contains_text(V::SEARCH_FIELDS, text)?,
            _ => Filter::All,
        };
        let matched = Filter::and([filter, V::visibility(viewer), search]);

        let mut pipeline = vec![
            Stage::Match(matched.clone()),
            Stage::Sort(self.pages.sort_keys(request, V::SORT_FIELDS, V::DEFAULT_SORT)),
            Stage::Skip(window.skip),
            Stage::Limit(window.limit),
        ];
        pipeline.extend(V::plan(viewer).build());

        let collection = V::Source::COLLECTION;
        let (total, docs) = tokio::try_join!(
            self.store.count(collection, &matched),
            self.store.aggregate(collection, &pipeline),
        )?;

        debug!(collection, total, page = window.page, "Built paged view");
        Ok(Page::new(decode_all(docs)?, total, window))
    }
}

fn decode_all<V: DeserializeOwned>(docs: Vec<Document>) -> AppResult<Vec<V>> {
    docs.into_iter()
        .map(|doc| -> AppResult<V> { Ok(serde_json::from_value(Value::Object(doc))?) })
        .collect()
}
