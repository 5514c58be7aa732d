//! Search execution.
//!
//! Every request wraps the compiled criterion in `bool.must` and restricts the
//! searched entity types with a `terms` filter on `type`. Paged searches are
//! limited to the index result window; [`SearchExecutor::search_all`] walks
//! the whole result set with `search_after` instead.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use crate::backend::EngineClient;
use crate::config::IndexerConfig;
use crate::criterion::{Criterion, CriterionValue};
use crate::error::{BackendError, CompileError, IndexerResult, SearchError};
use crate::model::{
    FacetPage, Page, PageRequest, SearchKey, Shape, Sort, TYPE_FIELD, ValueFamily,
};
use crate::query::{QueryCompiler, compile_sort, multi_field_criterion, tie_breakers};
use crate::registry::{FieldTypeRegistry, TenantRegistries};
use crate::tenant::TenantId;

use super::facets::{FacetPlan, FacetRequests, FacetSettings};

/// Runs searches and aggregations against tenant indices.
#[derive(Debug, Clone)]
pub struct SearchExecutor {
    client: Arc<dyn EngineClient>,
    registries: Arc<TenantRegistries>,
    max_result_window: u64,
    facet_settings: FacetSettings,
    scan_page_size: usize,
    unique_values_limit: usize,
}

impl SearchExecutor {
    pub fn new(
        client: Arc<dyn EngineClient>,
        registries: Arc<TenantRegistries>,
        config: &IndexerConfig,
    ) -> Self {
        Self {
            client,
            registries,
            max_result_window: config.elasticsearch.max_result_window,
            facet_settings: FacetSettings {
                string_size: config.string_facet_size,
                numeric_buckets: config.numeric_facet_buckets,
            },
            scan_page_size: config.scan_page_size.max(1),
            unique_values_limit: config.unique_values_limit,
        }
    }

    /// Searches one page, with facets computed over every match.
    ///
    /// An empty `sort` keeps the engine's relevance order.
    pub async fn search<T>(
        &self,
        key: &SearchKey<T>,
        page: PageRequest,
        criterion: &Criterion,
        facets: &FacetRequests,
        sort: &Sort,
    ) -> IndexerResult<FacetPage<T>> {
        let from = self.check_window(page)?;

        let registry = self.registries.snapshot(key.tenant());
        let query = filtered_query(&registry, criterion, key.search_types())?;
        let index = key.index();

        let mut body = json!({
            "query": query,
            "from": from,
            "size": page.size,
            "track_total_hits": true,
        });
        if !sort.is_empty() {
            body["sort"] = Value::Array(compile_sort(sort, &registry)?);
        }

        let plan = FacetPlan::new(&registry, facets, self.facet_settings);
        let mut stats = None;
        if !plan.is_empty() {
            if let Some(stats_aggs) = plan.stats_aggregations() {
                let response = self
                    .client
                    .search(&index, json!({ "query": body["query"], "size": 0, "aggs": stats_aggs }))
                    .await?;
                stats = response.get("aggregations").cloned();
            }
            let aggs = plan.aggregations(stats.as_ref());
            if aggs.as_object().is_some_and(|a| !a.is_empty()) {
                body["aggs"] = aggs;
            }
        }

        let response = self.client.search(&index, body).await?;
        let hits = Hits::parse(&index, &response)?;
        let content = hits
            .sources
            .into_iter()
            .map(|source| key.registry().decode(source))
            .collect::<Result<Vec<T>, _>>()?;
        let (facets, facet_failures) = plan.decode(response.get("aggregations"), stats.as_ref());

        tracing::debug!(
            tenant = %key.tenant(),
            total = hits.total,
            returned = content.len(),
            facets = facets.len(),
            "Search done"
        );
        Ok(FacetPage {
            page: Page::new(content, page, hits.total),
            facets,
            facet_failures,
        })
    }

    /// Searches one page without facets.
    pub async fn search_page<T>(
        &self,
        key: &SearchKey<T>,
        page: PageRequest,
        criterion: &Criterion,
        sort: &Sort,
    ) -> IndexerResult<Page<T>> {
        Ok(self
            .search(key, page, criterion, &FacetRequests::new(), sort)
            .await?
            .into_page())
    }

    /// Searches `value` in every field designated by `fields`.
    ///
    /// A field pattern ending in `*` designates every field below its prefix.
    pub async fn multi_fields_search<T, S: AsRef<str>>(
        &self,
        key: &SearchKey<T>,
        page: PageRequest,
        value: &CriterionValue,
        fields: &[S],
    ) -> IndexerResult<Page<T>> {
        let registry = self.registries.snapshot(key.tenant());
        let criterion = multi_field_criterion(&registry, value, fields)?;
        self.search_page(key, page, &criterion, &Sort::unsorted())
            .await
    }

    /// Number of matching documents.
    pub async fn count<T>(&self, key: &SearchKey<T>, criterion: &Criterion) -> IndexerResult<u64> {
        let registry = self.registries.snapshot(key.tenant());
        let query = filtered_query(&registry, criterion, key.search_types())?;
        Ok(self.client.count(&key.index(), query).await?)
    }

    /// Sum of a numeric field over the matching documents.
    pub async fn sum<T>(
        &self,
        key: &SearchKey<T>,
        criterion: &Criterion,
        field: &str,
    ) -> IndexerResult<f64> {
        let result = self
            .metric(key, criterion, field, "sum", |family| {
                matches!(family, ValueFamily::Integral | ValueFamily::Floating)
            })
            .await?;
        Ok(result.as_f64().unwrap_or(0.0))
    }

    /// Earliest value of a date field over the matching documents.
    pub async fn min_date<T>(
        &self,
        key: &SearchKey<T>,
        criterion: &Criterion,
        field: &str,
    ) -> IndexerResult<Option<DateTime<Utc>>> {
        self.date_metric(key, criterion, field, "min").await
    }

    /// Latest value of a date field over the matching documents.
    pub async fn max_date<T>(
        &self,
        key: &SearchKey<T>,
        criterion: &Criterion,
        field: &str,
    ) -> IndexerResult<Option<DateTime<Utc>>> {
        self.date_metric(key, criterion, field, "max").await
    }

    /// Distinct values of a string field over the matching documents, sorted.
    ///
    /// At most `unique_values_limit` values are returned.
    pub async fn unique_values<T>(
        &self,
        key: &SearchKey<T>,
        criterion: &Criterion,
        field: &str,
    ) -> IndexerResult<BTreeSet<String>> {
        let registry = self.registries.snapshot(key.tenant());
        let def = registry.resolve(field)?;
        if def.property_type.family() != ValueFamily::Text {
            return Err(unsupported("unique_values", field, def.property_type).into());
        }
        let query = filtered_query(&registry, criterion, key.search_types())?;
        let body = json!({
            "query": query,
            "size": 0,
            "aggs": {
                "values": {
                    "terms": {
                        "field": def.exact_path(field),
                        "size": self.unique_values_limit,
                        "order": { "_key": "asc" }
                    }
                }
            }
        });
        let response = self.client.search(&key.index(), body).await?;
        let values = response
            .pointer("/aggregations/values/buckets")
            .and_then(Value::as_array)
            .map(|buckets| {
                buckets
                    .iter()
                    .filter_map(|b| b.get("key").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(values)
    }

    /// Every matching document, without result window limit.
    ///
    /// Results come in `type` then `docId` order.
    pub async fn search_all<T>(&self, key: &SearchKey<T>, criterion: &Criterion) -> IndexerResult<Vec<T>> {
        let sources = self
            .scan(key.tenant(), key.search_types(), criterion, None)
            .await?;
        Ok(sources
            .into_iter()
            .map(|source| key.registry().decode(source))
            .collect::<Result<Vec<T>, _>>()?)
    }

    /// Value of one source attribute for every matching document.
    ///
    /// Only `field` is fetched from the engine; documents without it are skipped.
    pub async fn search_attribute<T, R: DeserializeOwned>(
        &self,
        key: &SearchKey<T>,
        criterion: &Criterion,
        field: &str,
    ) -> IndexerResult<Vec<R>> {
        let sources = self
            .scan(key.tenant(), key.search_types(), criterion, Some(&[field][..]))
            .await?;
        let pointer = format!("/{}", field.replace('.', "/"));
        let values = sources
            .iter()
            .filter_map(|source| source.pointer(&pointer))
            .filter(|value| !value.is_null())
            .map(|value| serde_json::from_value(value.clone()))
            .collect::<Result<Vec<R>, _>>()?;
        Ok(values)
    }

    /// One page of the whole tenant index, whatever the document types.
    pub async fn search_all_limited<T: DeserializeOwned>(
        &self,
        tenant: &TenantId,
        page: PageRequest,
    ) -> IndexerResult<Page<T>> {
        let from = self.check_window(page)?;
        let index = tenant.index_name();
        let body = json!({
            "query": { "match_all": {} },
            "from": from,
            "size": page.size,
            "track_total_hits": true,
        });
        let response = self.client.search(&index, body).await?;
        let hits = Hits::parse(&index, &response)?;
        let content = hits
            .sources
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()?;
        Ok(Page::new(content, page, hits.total))
    }

    /// Sources of every matching document, restricted to `fields` when given.
    pub(crate) async fn scan(
        &self,
        tenant: &TenantId,
        search_types: &[String],
        criterion: &Criterion,
        fields: Option<&[&str]>,
    ) -> IndexerResult<Vec<Value>> {
        let registry = self.registries.snapshot(tenant);
        let query = filtered_query(&registry, criterion, search_types)?;
        let index = tenant.index_name();

        let mut sources = Vec::new();
        let mut search_after: Option<Value> = None;
        loop {
            let mut body = json!({
                "query": query,
                "size": self.scan_page_size,
                "sort": tie_breakers(),
            });
            if let Some(fields) = fields {
                body["_source"] = json!(fields);
            }
            if let Some(after) = search_after.take() {
                body["search_after"] = after;
            }

            let response = self.client.search(&index, body).await?;
            let hits = Hits::parse(&index, &response)?;
            let fetched = hits.sources.len();
            sources.extend(hits.sources);
            if fetched < self.scan_page_size {
                break;
            }
            match hits.last_sort {
                Some(last) => search_after = Some(last),
                None => break,
            }
        }
        tracing::debug!(tenant = %tenant, documents = sources.len(), "Scan done");
        Ok(sources)
    }

    /// Offset of `page`, if the page fits in the result window.
    fn check_window(&self, page: PageRequest) -> Result<u64, SearchError> {
        let from = page.offset();
        if from.saturating_add(page.size) > self.max_result_window {
            return Err(SearchError::ResultWindowExceeded {
                from,
                size: page.size,
                max: self.max_result_window,
            });
        }
        Ok(from)
    }

    async fn date_metric<T>(
        &self,
        key: &SearchKey<T>,
        criterion: &Criterion,
        field: &str,
        metric: &str,
    ) -> IndexerResult<Option<DateTime<Utc>>> {
        let result = self
            .metric(key, criterion, field, metric, |family| family == ValueFamily::Temporal)
            .await?;
        Ok(result
            .as_f64()
            .and_then(|millis| DateTime::from_timestamp_millis(millis as i64)))
    }

    /// Runs a single-value metric aggregation and returns its `value`.
    async fn metric<T, F>(
        &self,
        key: &SearchKey<T>,
        criterion: &Criterion,
        field: &str,
        metric: &str,
        accepts: F,
    ) -> IndexerResult<Value>
    where
        F: Fn(ValueFamily) -> bool,
    {
        let registry = self.registries.snapshot(key.tenant());
        let def = registry.resolve(field)?;
        if !accepts(def.property_type.family()) || def.property_type.shape() == Shape::Interval {
            return Err(unsupported(metric, field, def.property_type).into());
        }
        let query = filtered_query(&registry, criterion, key.search_types())?;
        let mut aggregation = Map::new();
        aggregation.insert(metric.to_string(), json!({ "field": field }));
        let body = json!({
            "query": query,
            "size": 0,
            "aggs": { "metric": aggregation }
        });
        let response = self.client.search(&key.index(), body).await?;
        Ok(response
            .pointer("/aggregations/metric/value")
            .cloned()
            .unwrap_or(Value::Null))
    }
}

/// The compiled criterion restricted to the searched types.
///
/// No type filter is added when no type is given.
fn filtered_query(
    registry: &FieldTypeRegistry,
    criterion: &Criterion,
    search_types: &[String],
) -> Result<Value, CompileError> {
    let query = QueryCompiler::new(registry).compile(criterion)?;
    if search_types.is_empty() {
        return Ok(json!({ "bool": { "must": [query] } }));
    }
    Ok(json!({
        "bool": {
            "must": [query],
            "filter": [{ "terms": { TYPE_FIELD: search_types } }]
        }
    }))
}

fn unsupported(operator: &str, field: &str, property_type: impl ToString) -> CompileError {
    CompileError::UnsupportedOperator {
        operator: operator.to_string(),
        field: field.to_string(),
        property_type: property_type.to_string(),
    }
}

/// Hits of a search response.
struct Hits {
    total: u64,
    sources: Vec<Value>,
    last_sort: Option<Value>,
}

impl Hits {
    fn parse(index: &str, response: &Value) -> Result<Self, BackendError> {
        let hits = response
            .pointer("/hits/hits")
            .and_then(Value::as_array)
            .ok_or_else(|| BackendError::InvalidResponse {
                message: format!("search on '{}' returned no hits array", index),
            })?;
        let total = match response.pointer("/hits/total") {
            Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
            Some(total) => total.get("value").and_then(Value::as_u64).unwrap_or(0),
            None => hits.len() as u64,
        };
        Ok(Self {
            total,
            last_sort: hits.last().and_then(|hit| hit.get("sort")).cloned(),
            sources: hits
                .iter()
                .filter_map(|hit| hit.get("_source").cloned())
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::backend::testing::{MockEngine, search_response};
    use crate::error::IndexerError;
    use crate::model::{FacetType, PropertyType};
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Data {
        #[serde(rename = "docId")]
        doc_id: String,
        #[serde(default)]
        feature: Value,
    }

    fn data(id: &str, size: i64) -> Value {
        json!({ "type": "DATA", "docId": id, "feature": { "size": size } })
    }

    fn setup(engine: &MockEngine, config: &IndexerConfig) -> (SearchExecutor, SearchKey<Data>) {
        let registries = Arc::new(TenantRegistries::new());
        let tenant = TenantId::new("p1");
        registries.update(&tenant, |r| {
            r.register_type("feature.size", PropertyType::Integer);
            r.register_type("feature.label", PropertyType::String);
            r.register_type("feature.date", PropertyType::Date);
        });
        let executor = SearchExecutor::new(Arc::new(engine.clone()), registries, config);
        (executor, SearchKey::for_type(tenant, "DATA"))
    }

    #[tokio::test]
    async fn test_search_places_criterion_and_type_filter() {
        let engine = MockEngine::with_indices(&["p1"]);
        engine.push_search_response(search_response(2, vec![data("a", 1), data("b", 2)]));
        let (executor, key) = setup(&engine, &IndexerConfig::default());

        let page = executor
            .search_page(
                &key,
                PageRequest::new(1, 2),
                &Criterion::ge("feature.size", 1),
                &Sort::unsorted(),
            )
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.content[1].doc_id, "b");

        let body = &engine.requests_of("search")[0].body;
        assert_eq!(body["from"], 2);
        assert_eq!(body["size"], 2);
        assert_eq!(
            body["query"]["bool"]["must"][0],
            json!({ "range": { "feature.size": { "gte": 1 } } })
        );
        assert_eq!(
            body["query"]["bool"]["filter"][0],
            json!({ "terms": { "type": ["DATA"] } })
        );
        assert!(body.get("sort").is_none());
        assert!(body.get("aggs").is_none());
    }

    #[tokio::test]
    async fn test_result_window_is_enforced() {
        let engine = MockEngine::with_indices(&["p1"]);
        let (executor, key) = setup(&engine, &IndexerConfig::default());
        let err = executor
            .search_page(&key, PageRequest::new(100, 100), &Criterion::all(), &Sort::unsorted())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IndexerError::Search(SearchError::ResultWindowExceeded { from: 10_000, .. })
        ));
        assert!(engine.requests().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_type_is_an_error() {
        let engine = MockEngine::with_indices(&["p1"]);
        engine.push_search_response(search_response(
            1,
            vec![json!({ "type": "COLLECTION", "docId": "c" })],
        ));
        let (executor, key) = setup(&engine, &IndexerConfig::default());
        let err = executor
            .search_page(&key, PageRequest::default(), &Criterion::all(), &Sort::unsorted())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IndexerError::Search(SearchError::InvalidResultType { .. })
        ));
    }

    #[tokio::test]
    async fn test_sort_is_compiled_with_tie_breakers() {
        let engine = MockEngine::with_indices(&["p1"]);
        let (executor, key) = setup(&engine, &IndexerConfig::default());
        executor
            .search_page(
                &key,
                PageRequest::default(),
                &Criterion::all(),
                &Sort::desc("feature.label"),
            )
            .await
            .unwrap();
        let body = &engine.requests_of("search")[0].body;
        assert_eq!(
            body["sort"],
            json!([
                { "feature.label.keyword": { "order": "desc" } },
                { "type": { "order": "asc" } },
                { "docId": { "order": "asc" } }
            ])
        );
    }

    #[tokio::test]
    async fn test_numeric_facet_runs_stats_pass_first() {
        let engine = MockEngine::with_indices(&["p1"]);
        engine.push_search_response(json!({
            "hits": { "total": { "value": 10 }, "hits": [] },
            "aggregations": { "facet_0": { "count": 10, "min": 1.0, "max": 10.0 } }
        }));
        engine.push_search_response(json!({
            "hits": { "total": { "value": 10 }, "hits": [] },
            "aggregations": {
                "facet_0": { "buckets": [
                    { "from": 1.0, "to": 5.5, "doc_count": 5 },
                    { "from": 5.5, "doc_count": 5 }
                ] },
                "facet_1": { "buckets": [{ "key": "lorem", "doc_count": 10 }] }
            }
        }));
        let config = IndexerConfig {
            numeric_facet_buckets: 2,
            ..Default::default()
        };
        let (executor, key) = setup(&engine, &config);

        let mut facets = BTreeMap::new();
        facets.insert("feature.size".to_string(), FacetType::Numeric);
        facets.insert("feature.label".to_string(), FacetType::String);
        facets.insert("feature.missing".to_string(), FacetType::String);
        let criterion = Criterion::lt("feature.size", 11);

        let result = executor
            .search(&key, PageRequest::of_size(0), &criterion, &facets, &Sort::unsorted())
            .await
            .unwrap();

        let searches = engine.requests_of("search");
        assert_eq!(searches.len(), 2);
        assert_eq!(searches[0].body["size"], 0);
        assert_eq!(searches[0].body["query"], searches[1].body["query"]);
        assert!(searches[1].body["aggs"]["facet_0"]["range"].is_object());

        let numeric = result.facet("feature.size").unwrap().as_numeric().unwrap();
        assert_eq!(numeric.buckets.len(), 2);
        assert_eq!(numeric.buckets[1].to, 10.0);
        assert_eq!(result.facet("feature.label").unwrap().as_string().unwrap().values.len(), 1);
        assert_eq!(result.facet_failures.len(), 1);
        assert_eq!(result.facet_failures[0].field, "feature.missing");
    }

    #[tokio::test]
    async fn test_multi_fields_search() {
        let engine = MockEngine::with_indices(&["p1"]);
        let (executor, key) = setup(&engine, &IndexerConfig::default());
        executor
            .multi_fields_search(
                &key,
                PageRequest::default(),
                &CriterionValue::from("Lorem"),
                &["feature.*"],
            )
            .await
            .unwrap();
        let body = &engine.requests_of("search")[0].body;
        let should = body["query"]["bool"]["must"][0]["bool"]["should"]
            .as_array()
            .unwrap();
        assert_eq!(should.len(), 1);
        assert!(body.get("aggs").is_none());
    }

    #[tokio::test]
    async fn test_search_all_pages_with_search_after() {
        let engine = MockEngine::with_indices(&["p1"]);
        engine.push_search_response(search_response(3, vec![data("a", 1), data("b", 2)]));
        engine.push_search_response(search_response(3, vec![data("c", 3)]));
        let config = IndexerConfig {
            scan_page_size: 2,
            ..Default::default()
        };
        let (executor, key) = setup(&engine, &config);

        let all = executor.search_all(&key, &Criterion::all()).await.unwrap();
        assert_eq!(all.len(), 3);

        let searches = engine.requests_of("search");
        assert_eq!(searches.len(), 2);
        assert!(searches[0].body.get("search_after").is_none());
        assert_eq!(searches[1].body["search_after"], json!(["DATA", "b"]));
        assert_eq!(searches[1].body["sort"], json!(tie_breakers()));
    }

    #[tokio::test]
    async fn test_metrics() {
        let engine = MockEngine::with_indices(&["p1"]);
        engine.push_search_response(json!({
            "hits": { "total": { "value": 3 }, "hits": [] },
            "aggregations": { "metric": { "value": 6.0 } }
        }));
        engine.push_search_response(json!({
            "hits": { "total": { "value": 3 }, "hits": [] },
            "aggregations": { "metric": { "value": 1704153600000.0_f64 } }
        }));
        engine.push_search_response(json!({
            "hits": { "total": { "value": 0 }, "hits": [] },
            "aggregations": { "metric": { "value": null } }
        }));
        let (executor, key) = setup(&engine, &IndexerConfig::default());
        let all = Criterion::all();

        assert_eq!(executor.sum(&key, &all, "feature.size").await.unwrap(), 6.0);
        let min = executor.min_date(&key, &all, "feature.date").await.unwrap();
        assert_eq!(min.unwrap().to_rfc3339(), "2024-01-02T00:00:00+00:00");
        assert!(executor.max_date(&key, &all, "feature.date").await.unwrap().is_none());

        let err = executor.sum(&key, &all, "feature.label").await.unwrap_err();
        assert!(matches!(
            err,
            IndexerError::Compile(CompileError::UnsupportedOperator { .. })
        ));
    }

    #[tokio::test]
    async fn test_unique_values() {
        let engine = MockEngine::with_indices(&["p1"]);
        engine.push_search_response(json!({
            "hits": { "total": { "value": 3 }, "hits": [] },
            "aggregations": { "values": { "buckets": [
                { "key": "a", "doc_count": 2 },
                { "key": "b", "doc_count": 1 }
            ] } }
        }));
        let (executor, key) = setup(&engine, &IndexerConfig::default());
        let values = executor
            .unique_values(&key, &Criterion::all(), "feature.label")
            .await
            .unwrap();
        assert_eq!(values.into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
        let body = &engine.requests_of("search")[0].body;
        assert_eq!(
            body["aggs"]["values"]["terms"]["field"],
            "feature.label.keyword"
        );
    }

    #[tokio::test]
    async fn test_count() {
        let engine = MockEngine::with_indices(&["p1"]);
        engine.insert_document("p1", "DATA_a", data("a", 1));
        let (executor, key) = setup(&engine, &IndexerConfig::default());
        assert_eq!(executor.count(&key, &Criterion::all()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_search_attribute_fetches_only_that_field() {
        let engine = MockEngine::with_indices(&["p1"]);
        engine.push_search_response(search_response(
            3,
            vec![
                json!({ "feature": { "size": 4 } }),
                json!({ "feature": {} }),
                json!({ "feature": { "size": 2 } }),
            ],
        ));
        let (executor, key) = setup(&engine, &IndexerConfig::default());

        let sizes: Vec<i64> = executor
            .search_attribute(&key, &Criterion::ge("feature.size", 2), "feature.size")
            .await
            .unwrap();
        assert_eq!(sizes, vec![4, 2]);

        let body = &engine.requests_of("search")[0].body;
        assert_eq!(body["_source"], json!(["feature.size"]));
        assert_eq!(
            body["query"]["bool"]["filter"][0],
            json!({ "terms": { "type": ["DATA"] } })
        );
    }

    #[tokio::test]
    async fn test_search_all_limited_ignores_types() {
        let engine = MockEngine::with_indices(&["p1"]);
        engine.push_search_response(search_response(
            5,
            vec![data("a", 1), json!({ "type": "DATASET", "docId": "s" })],
        ));
        let (executor, key) = setup(&engine, &IndexerConfig::default());

        let page: Page<Value> = executor
            .search_all_limited(key.tenant(), PageRequest::new(1, 2))
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.content[1]["type"], "DATASET");
        assert!(page.has_next());

        let body = &engine.requests_of("search")[0].body;
        assert_eq!(body["query"], json!({ "match_all": {} }));
        assert_eq!(body["from"], 2);

        let err = executor
            .search_all_limited::<Value>(key.tenant(), PageRequest::new(10, 1000))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IndexerError::Search(SearchError::ResultWindowExceeded { .. })
        ));
    }
}
