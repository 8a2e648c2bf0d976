//! Disjunctive facet orchestration
//!
//! A disjunctive facet reports counts as if the filter on its own field
//! were absent while every other filter still applies. For each
//! disjunctive field that is currently filtered, one auxiliary query is
//! sent next to the base query:
//!
//! - filters: the base filters with that field's conditions removed
//! - facets: only that field's facet configuration
//! - page size: 0, only counts are needed
//! - analytics tags: the disjunctive tag set, never the caller's tags
//!
//! The auxiliary facet entries then replace the base ones. When no
//! disjunctive field is filtered, only the base query is sent.

use super::client::Client;
use super::models::{Analytics, DisjunctiveSpec, Page, SearchOptions};
use crate::error::Result;
use futures::future::join_all;
use serde_json::{Map, Value};
use tracing::{debug, info};

impl Client {
    /// Base query plus one auxiliary query per active disjunctive field,
    /// all in flight at once; fails as a whole if any of them fails
    pub(super) async fn perform_disjunctive_search(
        &self,
        query: &str,
        options: &SearchOptions,
        spec: &DisjunctiveSpec,
    ) -> Result<Value> {
        let active = spec.active_fields(options.filters.as_ref());
        if active.is_empty() {
            debug!("No disjunctive facet is filtered, issuing base query only");
            return self.perform_search(query, options).await;
        }

        info!(
            "Disjunctive search '{}' with {} auxiliary queries for {:?}",
            query,
            active.len(),
            active
        );

        let auxiliaries: Vec<(&str, SearchOptions)> = active
            .iter()
            .map(|field| {
                (
                    field.as_str(),
                    auxiliary_options(options, field, &spec.analytics_tags),
                )
            })
            .collect();

        let base = self.perform_search(query, options);
        let aux = join_all(
            auxiliaries
                .iter()
                .map(|(_, aux_options)| self.perform_search(query, aux_options)),
        );
        let (base, aux) = futures::join!(base, aux);

        let mut merged = base?;
        let aux = aux.into_iter().collect::<Result<Vec<_>>>()?;
        for ((field, _), body) in auxiliaries.iter().zip(&aux) {
            merge_facet(&mut merged, field, body);
        }

        Ok(merged)
    }
}

/// Options of the auxiliary query that computes `field`'s facet counts
pub(crate) fn auxiliary_options(
    base: &SearchOptions,
    field: &str,
    analytics_tags: &[String],
) -> SearchOptions {
    let mut aux = base.clone();

    aux.filters = base
        .filters
        .as_ref()
        .map(|filters| filters.remove_filter(field))
        .filter(|filters| !filters.is_empty());
    aux.facets = base.facets.only(field);
    aux.page = Some(Page {
        size: Some(0),
        ..base.page.clone().unwrap_or_default()
    });
    aux.analytics = Some(Analytics {
        tags: analytics_tags.to_vec(),
    });
    aux.disjunctive_facets.clear();
    aux.disjunctive_facets_analytics_tags = None;

    aux
}

/// Overwrite `field`'s facet entry in `base` with the one from `aux`
///
/// An auxiliary response without that entry leaves the base untouched.
pub(crate) fn merge_facet(base: &mut Value, field: &str, aux: &Value) {
    let Some(facet) = aux.get("facets").and_then(|f| f.get(field)) else {
        return;
    };
    let Some(body) = base.as_object_mut() else {
        return;
    };

    let facets = body
        .entry("facets")
        .or_insert_with(|| Value::Object(Map::new()));
    if !facets.is_object() {
        *facets = Value::Object(Map::new());
    }
    if let Value::Object(facets) = facets {
        facets.insert(field.to_string(), facet.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::filters::Filters;
    use crate::network::testing::MockTransport;
    use crate::network::{ApiRequest, TransportResponse};
    use crate::search::models::DEFAULT_DISJUNCTIVE_TAG;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn base_body() -> Value {
        json!({
            "meta": { "request_id": "base", "page": { "total_results": 3 } },
            "results": [{ "id": { "raw": "rex-cli" } }],
            "facets": {
                "license": [{ "type": "value", "data": [{ "value": "BSD", "count": 1 }] }],
                "dependencies": [{ "type": "value", "data": [{ "value": "x", "count": 1 }] }],
                "stars": [{ "type": "range", "data": [] }]
            }
        })
    }

    fn base_info() -> Map<String, Value> {
        let mut info = base_body().as_object().unwrap().clone();
        info.remove("results");
        info
    }

    fn aux_facet(field: &str) -> Value {
        json!([{ "type": "value", "data": [{ "value": format!("all-{}", field), "count": 42 }] }])
    }

    fn is_auxiliary(request: &ApiRequest) -> bool {
        request.body.as_ref().and_then(|b| b.pointer("/page/size")) == Some(&json!(0))
    }

    /// Answers auxiliary queries with a facet for their single field and
    /// everything else with the base body
    fn respond(request: &ApiRequest) -> crate::Result<TransportResponse> {
        let body = request.body.as_ref().unwrap();
        let response = if is_auxiliary(request) {
            let field = body["facets"].as_object().unwrap().keys().next().unwrap();
            let mut facets = Map::new();
            facets.insert(field.clone(), aux_facet(field));
            json!({
                "meta": { "request_id": "aux" },
                "results": [],
                "facets": facets
            })
        } else {
            base_body()
        };
        Ok(TransportResponse::new(200, response.to_string()))
    }

    fn client(transport: Arc<MockTransport>) -> Client {
        let mut settings = Settings::default();
        settings.client.host_identifier = Some("host-2376rb".to_string());
        settings.client.engine_name = "node-modules".to_string();
        Client::with_transport(&settings, transport).unwrap()
    }

    fn options(filters: Value) -> SearchOptions {
        SearchOptions::new()
            .with_filters(Filters::from_json(&filters).unwrap())
            .with_facet("license", json!({ "type": "value", "size": 3 }))
            .with_facet("dependencies", json!({ "type": "value", "size": 3 }))
            .with_facet("stars", json!({ "type": "range", "ranges": [{ "to": 10 }] }))
            .with_page(10, 2)
    }

    fn auxiliary_bodies(transport: &MockTransport) -> Vec<Value> {
        transport
            .requests()
            .into_iter()
            .filter(is_auxiliary)
            .filter_map(|r| r.body)
            .collect()
    }

    #[tokio::test]
    async fn test_no_active_disjunctive_field_issues_one_call() {
        let transport = Arc::new(MockTransport::new(respond));
        let opts = options(json!({ "all": [{ "dependencies": "x" }] }))
            .with_disjunctive_facets(["license"]);

        let results = client(transport.clone()).search("cat", &opts).await.unwrap();
        assert_eq!(transport.call_count(), 1);
        assert_eq!(results.info, base_info());
    }

    #[tokio::test]
    async fn test_no_filters_issues_one_call() {
        let transport = Arc::new(MockTransport::new(respond));
        let opts = SearchOptions::new().with_disjunctive_facets(["license"]);

        client(transport.clone()).search("cat", &opts).await.unwrap();
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_single_active_field_merges_auxiliary_facet() {
        let transport = Arc::new(MockTransport::new(respond).with_barrier(2));
        let opts = options(json!({ "all": [{ "license": "BSD" }, { "dependencies": "x" }] }))
            .with_disjunctive_facets(["license"]);

        // Both requests must be in flight together to pass the barrier
        let results = tokio::time::timeout(
            Duration::from_secs(5),
            client(transport.clone()).search("cat", &opts),
        )
        .await
        .expect("queries were serialized")
        .unwrap();

        assert_eq!(transport.call_count(), 2);
        assert_eq!(results.facet("license"), Some(&aux_facet("license")));
        assert_eq!(
            results.facet("dependencies"),
            base_body().pointer("/facets/dependencies")
        );
        assert_eq!(results.facet("stars"), base_body().pointer("/facets/stars"));
        assert_eq!(results.request_id(), Some("base"));
        assert_eq!(results.len(), 1);

        let aux = auxiliary_bodies(&transport);
        assert_eq!(aux.len(), 1);
        assert_eq!(aux[0]["filters"], json!({ "all": [{ "dependencies": "x" }] }));
        assert_eq!(
            aux[0]["facets"],
            json!({ "license": { "type": "value", "size": 3 } })
        );
        assert_eq!(aux[0]["page"], json!({ "size": 0, "current": 2 }));
        assert_eq!(aux[0]["query"], "cat");
    }

    #[tokio::test]
    async fn test_two_active_fields_issue_three_concurrent_calls() {
        let transport = Arc::new(MockTransport::new(respond).with_barrier(3));
        let opts = options(json!({
            "all": [{ "license": "BSD" }, { "any": [{ "dependencies": "x" }, { "stars": 5 }] }]
        }))
        .with_disjunctive_facets(["license", "dependencies"]);

        let results = tokio::time::timeout(
            Duration::from_secs(5),
            client(transport.clone()).search("cat", &opts),
        )
        .await
        .expect("queries were serialized")
        .unwrap();

        assert_eq!(transport.call_count(), 3);
        assert_eq!(results.facet("license"), Some(&aux_facet("license")));
        assert_eq!(results.facet("dependencies"), Some(&aux_facet("dependencies")));
        assert_eq!(results.facet("stars"), base_body().pointer("/facets/stars"));

        let aux = auxiliary_bodies(&transport);
        assert_eq!(aux.len(), 2);
        for body in &aux {
            assert_eq!(body["page"]["size"], 0);
            let facets = body["facets"].as_object().unwrap();
            assert_eq!(facets.len(), 1);
            let field = facets.keys().next().unwrap();
            let filters = Filters::from_json(&body["filters"]).unwrap();
            assert!(!filters.applied_fields().contains(field));
            assert!(filters.applied_fields().contains("stars"));
        }
    }

    #[tokio::test]
    async fn test_auxiliary_queries_never_carry_caller_tags() {
        let transport = Arc::new(MockTransport::new(respond));
        let opts = options(json!({ "license": "BSD" }))
            .with_tags(["homepage", "web"])
            .with_disjunctive_facets(["license"]);

        client(transport.clone()).search("cat", &opts).await.unwrap();

        let requests = transport.requests();
        let base = requests.iter().find(|r| !is_auxiliary(r)).unwrap();
        assert_eq!(
            base.body.as_ref().unwrap()["analytics"],
            json!({ "tags": ["homepage", "web"] })
        );
        let aux = auxiliary_bodies(&transport);
        assert_eq!(aux[0]["analytics"], json!({ "tags": [DEFAULT_DISJUNCTIVE_TAG] }));
        // A filter on the only field leaves no filters at all
        assert!(aux[0].get("filters").is_none());
    }

    #[tokio::test]
    async fn test_custom_disjunctive_tags() {
        let transport = Arc::new(MockTransport::new(respond));
        let opts = options(json!({ "license": "BSD" }))
            .with_tags(["homepage"])
            .with_disjunctive_facets(["license"])
            .with_disjunctive_tags(["synthetic", "facets"]);

        client(transport.clone()).search("cat", &opts).await.unwrap();

        let aux = auxiliary_bodies(&transport);
        assert_eq!(aux[0]["analytics"], json!({ "tags": ["synthetic", "facets"] }));
        for body in transport.bodies() {
            assert!(body.get("disjunctive_facets").is_none());
            assert!(body.get("disjunctive_facets_analytics_tags").is_none());
        }
    }

    #[tokio::test]
    async fn test_any_failure_fails_the_whole_search() {
        let transport = Arc::new(MockTransport::new(|request: &ApiRequest| {
            if is_auxiliary(request) {
                Ok(TransportResponse::new(
                    500,
                    json!({ "errors": ["Internal server error"] }).to_string(),
                ))
            } else {
                respond(request)
            }
        }));
        let opts = options(json!({ "all": [{ "license": "BSD" }, { "dependencies": "x" }] }))
            .with_disjunctive_facets(["license", "dependencies"]);

        let err = client(transport.clone())
            .search("cat", &opts)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "[500] Internal server error");
        assert_eq!(transport.call_count(), 3);
    }

    #[tokio::test]
    async fn test_base_failure_fails_the_whole_search() {
        let transport = Arc::new(MockTransport::new(|request: &ApiRequest| {
            if is_auxiliary(request) {
                respond(request)
            } else {
                Ok(TransportResponse::new(404, ""))
            }
        }));
        let opts = options(json!({ "license": "BSD" })).with_disjunctive_facets(["license"]);

        let err = client(transport).search("cat", &opts).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_auxiliary_options_leave_base_untouched() {
        let base = options(json!({ "all": [{ "license": "BSD" }, { "dependencies": "x" }] }))
            .with_tags(["homepage"])
            .with_disjunctive_facets(["license"]);
        let snapshot = base.clone();

        let aux = auxiliary_options(&base, "license", &["Facet-Only".to_string()]);
        assert_eq!(base, snapshot);
        assert!(aux.disjunctive_facets.is_empty());
        assert_eq!(aux.page.unwrap().size, Some(0));
        assert_eq!(aux.facets.fields().collect::<Vec<_>>(), vec!["license"]);
    }

    #[test]
    fn test_merge_facet_creates_and_replaces() {
        let mut base = json!({ "results": [] });
        merge_facet(&mut base, "license", &json!({ "facets": { "license": [1] } }));
        assert_eq!(base, json!({ "results": [], "facets": { "license": [1] } }));

        merge_facet(&mut base, "license", &json!({ "facets": {} }));
        assert_eq!(base["facets"]["license"], json!([1]));

        merge_facet(&mut base, "license", &json!({ "facets": { "license": [2] } }));
        assert_eq!(base["facets"]["license"], json!([2]));
    }
}
