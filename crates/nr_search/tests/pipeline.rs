use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use async_trait::async_trait;
use nr_core::geo::distance_km;
use nr_core::{Article, EntityExtraction, Error, LanguageModel, NewsQuery, Result, SummaryOutcome};
use nr_inference::models::DummyModel;
use nr_inference::RetryPolicy;
use nr_search::ranking::published_key;
use nr_search::NewsService;
use nr_storage::InMemoryStorage;

const SEED: &str = r#"[
  {"id": "n1", "title": "City council approves new park", "description": "The downtown park will open next summer after a unanimous vote.",
   "url": "http://n.test/1", "publication_date": "2025-03-01T09:00:00", "source_name": "Local Herald",
   "category": ["local", "politics"], "relevance_score": 0.91, "latitude": 0.0, "longitude": 0.05},
  {"id": "n2", "title": "Storm warning for the coast", "description": "Forecasters expect heavy rain and strong winds through the weekend.",
   "url": "http://n.test/2", "publication_date": "2025-03-03T12:00:00", "source_name": "Weather Wire",
   "category": ["weather"], "relevance_score": 0.55, "latitude": 0.0, "longitude": 0.2},
  {"id": "n3", "title": "Local team wins final", "description": "Fans celebrated late into the night after the championship win.",
   "url": "http://n.test/3", "publication_date": "2025-02-27T21:00:00", "source_name": "local herald",
   "category": ["sports", "local"], "relevance_score": 0.78, "latitude": 0.01, "longitude": 0.01},
  {"id": "n4", "title": "Tech giant reports record profit", "description": null,
   "url": "http://n.test/4", "publication_date": "2025-03-02T08:30:00", "source_name": "Business Daily",
   "category": ["business"], "relevance_score": 0.83},
  {"id": "n5", "title": "New library hours", "description": "Short note",
   "url": "http://n.test/5", "publication_date": "2025-01-15T10:00:00", "source_name": "Local Herald",
   "category": ["local"], "relevance_score": 0.32, "latitude": 0.02},
  {"id": "n6", "title": "Park cleanup volunteers needed", "description": "Volunteers gather on Saturday to clean the riverside park.",
   "url": "http://n.test/6", "publication_date": "2025-03-04T07:00:00", "source_name": "Local Herald",
   "category": ["local"], "relevance_score": 0.74, "latitude": 0.03, "longitude": 0.03},
  {"id": "n7", "title": "Farmers market returns", "description": "The weekly market reopens with more stalls than last year.",
   "url": "http://n.test/7", "publication_date": "2025-03-05T06:00:00", "source_name": "Local Herald",
   "category": ["local"], "relevance_score": 0.88}
]"#;

#[derive(Debug, Default)]
struct FailingModel {
    summarize_calls: AtomicUsize,
}

#[async_trait]
impl LanguageModel for FailingModel {
    fn name(&self) -> &str {
        "Failing"
    }

    async fn extract_intent_and_entities(&self, _query: &str) -> Option<EntityExtraction> {
        None
    }

    async fn summarize(&self, _text: &str) -> Result<Option<SummaryOutcome>> {
        self.summarize_calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::RateLimited("resource exhausted".to_string()))
    }
}

fn storage() -> Arc<InMemoryStorage> {
    Arc::new(InMemoryStorage::from_json_str(SEED).unwrap())
}

fn dummy_service() -> NewsService {
    NewsService::new(storage(), Arc::new(DummyModel::new()))
}

#[tokio::test]
async fn test_filters_hold_and_results_are_capped() {
    let svc = dummy_service();

    let category = svc.by_category("local").await.unwrap();
    assert_eq!(category.total_results, 5);
    assert!(category.articles.iter().all(|a| a.category.contains(&"local".to_string())));
    let keys: Vec<_> = category.articles.iter().map(|a| published_key(&a.publication_date)).collect();
    assert!(keys.windows(2).all(|w| w[0] >= w[1]));

    let source = svc.by_source("LOCAL HERALD").await.unwrap();
    assert!(source.articles.iter().all(|a| a.source_name.eq_ignore_ascii_case("local herald")));
    let ids: Vec<&str> = source.articles.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["n7", "n6", "n1", "n3", "n5"]);

    let score = svc.by_score(0.7).await.unwrap();
    assert_eq!(score.total_results, 5);
    let scores: Vec<f64> = score.articles.iter().map(|a| a.relevance_score.unwrap()).collect();
    assert_eq!(scores, vec![0.91, 0.88, 0.83, 0.78, 0.74]);
}

#[tokio::test]
async fn test_nearby_orders_by_distance() {
    let svc = dummy_service();
    let result = svc.nearby(0.0, 0.0, 10.0).await.unwrap();
    assert_eq!(result.query, "nearby:lat=0,lon=0,radius=10");

    let ids: Vec<&str> = result.articles.iter().map(|a| a.id.as_str()).collect();
    // n2 is ~22 km away, n5 has no longitude
    assert_eq!(ids, vec!["n3", "n6", "n1"]);

    let distances: Vec<f64> = result
        .articles
        .iter()
        .map(|a| distance_km(0.0, 0.0, a.latitude.unwrap(), a.longitude.unwrap()))
        .collect();
    assert!(distances.windows(2).all(|w| w[0] <= w[1]));
    assert!(distances.iter().all(|d| *d <= 10.0));
}

#[tokio::test]
async fn test_dummy_pipeline_summaries() {
    let svc = dummy_service();
    let result = svc.execute(NewsQuery::Search("park".to_string()), None).await.unwrap();
    assert_eq!(result.articles[0].id, "n1");
    for article in &result.articles {
        assert!(!article.llm_summary.is_empty());
    }
}

#[tokio::test(start_paused = true)]
async fn test_failing_model_still_yields_summaries() {
    let model = Arc::new(FailingModel::default());
    let svc = NewsService::new(storage(), model.clone());

    let result = svc.by_source("business daily").await.unwrap();
    assert_eq!(result.total_results, 1);
    // no description, so the title becomes the fallback
    assert_eq!(result.articles[0].llm_summary, "Tech giant reports record profit");
    assert_eq!(model.summarize_calls.load(Ordering::SeqCst), 2);

    let result = svc.by_category("weather").await.unwrap();
    let summary = &result.articles[0].llm_summary;
    assert!(summary.starts_with("Forecasters expect heavy rain"));
    assert!(summary.ends_with("..."));
    assert_eq!(model.summarize_calls.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn test_retry_policy_controls_attempts() {
    let model = Arc::new(FailingModel::default());
    let svc = NewsService::new(storage(), model.clone()).with_retry_policy(RetryPolicy {
        max_attempts: 3,
        base_delay: std::time::Duration::from_millis(100),
    });

    let started = tokio::time::Instant::now();
    let result = svc.by_source("business daily").await.unwrap();
    assert_eq!(model.summarize_calls.load(Ordering::SeqCst), 3);
    // 100 ms + 200 ms between the three attempts
    assert!(started.elapsed() >= std::time::Duration::from_millis(300));
    assert_eq!(result.articles[0].llm_summary, "Tech giant reports record profit");
}

#[tokio::test]
async fn test_request_does_not_mutate_corpus() {
    let store = storage();
    let svc = NewsService::new(store.clone(), Arc::new(DummyModel::new()));
    svc.by_category("local").await.unwrap();

    let all: Vec<Article> = nr_core::ArticleProvider::fetch_all(store.as_ref()).await.unwrap();
    assert!(all.iter().all(|a| a.llm_summary == "Summary unavailable."));
}
