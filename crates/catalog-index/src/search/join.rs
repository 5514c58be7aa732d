//! Cross-type joins through document tags.
//!
//! The engine has no joins. A join search runs the criterion over the
//! searched types, reads back only their `tags`, keeps the tags that identify
//! an entity of the result type and loads those entities by id.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::EngineClient;
use crate::criterion::Criterion;
use crate::error::IndexerResult;
use crate::model::{JoinSearchKey, Page, PageRequest, TAGS_FIELD, TagResolver, engine_id};

use super::executor::SearchExecutor;

/// How referenced entities are counted and paged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinPolicy {
    /// Every tag occurrence counts, so an entity referenced by several
    /// matches is counted and returned several times. Missing entities are
    /// dropped from the page but still counted.
    #[default]
    Parity,
    /// Each entity counts once, in order of first reference.
    Deduplicated,
}

impl fmt::Display for JoinPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinPolicy::Parity => write!(f, "parity"),
            JoinPolicy::Deduplicated => write!(f, "deduplicated"),
        }
    }
}

impl FromStr for JoinPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "parity" => Ok(JoinPolicy::Parity),
            "deduplicated" => Ok(JoinPolicy::Deduplicated),
            other => Err(format!("unknown join policy '{}'", other)),
        }
    }
}

/// Resolves join searches.
#[derive(Clone)]
pub struct JoinResolver {
    client: Arc<dyn EngineClient>,
    executor: SearchExecutor,
    tags: Arc<dyn TagResolver>,
    policy: JoinPolicy,
}

impl fmt::Debug for JoinResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinResolver")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl JoinResolver {
    pub fn new(
        client: Arc<dyn EngineClient>,
        executor: SearchExecutor,
        tags: Arc<dyn TagResolver>,
        policy: JoinPolicy,
    ) -> Self {
        Self {
            client,
            executor,
            tags,
            policy,
        }
    }

    pub fn policy(&self) -> JoinPolicy {
        self.policy
    }

    pub fn with_policy(mut self, policy: JoinPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns a page of the result-type entities referenced by the tags of
    /// every document matching `criterion`.
    pub async fn search_and_return_joined_entities<R>(
        &self,
        key: &JoinSearchKey<R>,
        page: PageRequest,
        criterion: &Criterion,
    ) -> IndexerResult<Page<R>> {
        let sources = self
            .executor
            .scan(key.tenant(), key.search_types(), criterion, Some(&[TAGS_FIELD][..]))
            .await?;

        let mut references: Vec<String> = sources
            .iter()
            .filter_map(|source| source.get(TAGS_FIELD).and_then(Value::as_array))
            .flatten()
            .filter_map(Value::as_str)
            .filter(|tag| self.tags.entity_type(tag) == Some(key.result_type()))
            .map(str::to_string)
            .collect();
        if self.policy == JoinPolicy::Deduplicated {
            let mut seen = HashSet::new();
            references.retain(|tag| seen.insert(tag.clone()));
        }

        let total = references.len() as u64;
        let slice: Vec<String> = references
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(page.size).unwrap_or(usize::MAX))
            .collect();
        let ids: Vec<String> = slice
            .iter()
            .map(|tag| engine_id(key.result_type(), tag))
            .collect();

        let index = key.index();
        let loaded = match self.policy {
            JoinPolicy::Parity => {
                let mut loaded = Vec::with_capacity(ids.len());
                for id in &ids {
                    loaded.push(self.client.get_document(&index, id).await?);
                }
                loaded
            }
            JoinPolicy::Deduplicated if ids.is_empty() => Vec::new(),
            JoinPolicy::Deduplicated => self.client.multi_get(&index, &ids).await?,
        };

        let mut content = Vec::with_capacity(loaded.len());
        for (tag, source) in slice.iter().zip(loaded) {
            match source {
                Some(source) => content.push(key.registry().decode(source)?),
                None => tracing::debug!(tenant = %key.tenant(), tag = %tag, "Joined entity not found"),
            }
        }

        tracing::debug!(
            tenant = %key.tenant(),
            policy = %self.policy,
            matches = sources.len(),
            total,
            returned = content.len(),
            "Join search done"
        );
        Ok(Page::new(content, page, total))
    }
}
