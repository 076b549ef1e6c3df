//! End-to-end pipeline test over a stub renderer.
//!
//! Exercises the full chain without a browser or network: validate
//! candidates, store artifacts, train a model from them, then run both
//! evaluation techniques and check the stored variants and result shapes.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tempfile::TempDir;

use lurebench::corpus::validator::{self, ValidatorConfig};
use lurebench::corpus::{LabeledUrl, UrlClass};
use lurebench::eval::{technique1, technique2, EvalOptions, RandomDropScorer};
use lurebench::model::trainer;
use lurebench::oracle::Oracle;
use lurebench::renderer::{Navigation, RenderContext, Renderer};
use lurebench::store::{key_for, ArtifactKind, ArtifactStore, Variant};

/// Serves a fixed page per URL, with a phishing-flavored default.
struct StubRenderer {
    pages: HashMap<String, String>,
}

struct StubContext {
    pages: HashMap<String, String>,
    current: Option<String>,
}

impl StubRenderer {
    fn new(pages: HashMap<String, String>) -> Self {
        Self { pages }
    }
}

#[async_trait]
impl Renderer for StubRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        Ok(Box::new(StubContext {
            pages: self.pages.clone(),
            current: None,
        }))
    }
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl RenderContext for StubContext {
    async fn navigate(&mut self, url: &str, _timeout_ms: u64) -> Result<Navigation> {
        if !self.pages.contains_key(url) {
            anyhow::bail!("unknown url {url}");
        }
        self.current = Some(url.to_string());
        Ok(Navigation {
            final_url: url.to_string(),
            load_time_ms: 1,
        })
    }
    async fn html(&self) -> Result<String> {
        let url = self.current.as_deref().ok_or_else(|| anyhow::anyhow!("no page loaded"))?;
        Ok(self.pages[url].clone())
    }
    async fn screenshot(&self, _full_page: bool) -> Result<Vec<u8>> {
        Ok(b"\x89PNG stub".to_vec())
    }
    async fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

fn phish_page(i: usize) -> String {
    let filler = "credential account suspended ".repeat(20);
    format!(
        "<html><head><title>Account Alert</title></head><body>\
         <p>Please verify your account {i} immediately. {filler}</p>\
         </body></html>"
    )
}

fn legit_page(i: usize) -> String {
    let filler = "weather culture travel reviews ".repeat(20);
    format!(
        "<html><head><title>Daily News</title></head><body>\
         <p>Top stories of day {i}: sports, music, recipes. {filler}</p>\
         </body></html>"
    )
}

/// A small labeled world: `n` phishing and `n` legitimate pages.
fn world(n: usize) -> (HashMap<String, String>, Vec<LabeledUrl>) {
    let mut pages = HashMap::new();
    let mut corpus = Vec::new();
    for i in 0..n {
        let phish = format!("https://phish-{i}.example/login");
        pages.insert(phish.clone(), phish_page(i));
        corpus.push(LabeledUrl {
            url: phish,
            class: UrlClass::Phishing,
        });

        let legit = format!("https://legit-{i}.example/");
        pages.insert(legit.clone(), legit_page(i));
        corpus.push(LabeledUrl {
            url: legit,
            class: UrlClass::Legitimate,
        });
    }
    (pages, corpus)
}

fn eval_options(n_samples: usize) -> EvalOptions {
    EvalOptions {
        n_samples,
        timeout_ms: 1000,
        settle_ms: 0,
    }
}

#[tokio::test]
async fn validator_respects_quota_end_to_end() {
    let (pages, _) = world(20);
    let urls: Vec<String> = pages.keys().cloned().collect();
    let renderer = Arc::new(StubRenderer::new(pages));

    let config = ValidatorConfig {
        quota: 6,
        concurrency: 8,
        timeout_ms: 1000,
        min_html_len: 80,
        show_progress: false,
    };
    let accepted = validator::validate(renderer, urls, &config).await;
    assert_eq!(accepted.len(), 6);
    assert!(accepted.iter().all(|p| p.html.len() >= 80));
}

#[tokio::test]
async fn technique1_scores_and_stores_variants() {
    let dir = TempDir::new().unwrap();
    let store = ArtifactStore::open(dir.path()).unwrap();
    let (pages, corpus) = world(2);
    let renderer: Arc<dyn Renderer> = Arc::new(StubRenderer::new(pages));
    let oracle = Oracle::new(None);

    let results =
        technique1::run(renderer, &store, &oracle, &corpus, &eval_options(10)).await.unwrap();
    assert_eq!(results.len(), 4);
    for r in &results {
        assert!((0.0..=1.0).contains(&r.p_base));
        assert!((0.0..=1.0).contains(&r.p_pert));
    }

    // Every URL now has original and perturbed HTML plus a screenshot.
    for row in &corpus {
        let key = key_for(&row.url);
        let original = store.get(&key, ArtifactKind::Html, Variant::Original).unwrap();
        assert!(!original.is_empty());
        store.get(&key, ArtifactKind::Screenshot, Variant::Technique1).unwrap();

        let perturbed = store.get(&key, ArtifactKind::Html, Variant::Perturbed).unwrap();
        let perturbed = String::from_utf8(perturbed).unwrap();
        assert!(perturbed.contains("x-benign-variant"));
        if row.class == UrlClass::Phishing {
            // Paraphrase applied: the trigger word is rewritten.
            assert!(perturbed.to_lowercase().contains("confirm"));
            assert!(!perturbed.to_lowercase().contains("verify"));
        }
    }
}

#[tokio::test]
async fn technique2_stores_variant_and_reports_drop() {
    let dir = TempDir::new().unwrap();
    let store = ArtifactStore::open(dir.path()).unwrap();
    let (pages, corpus) = world(2);
    let renderer: Arc<dyn Renderer> = Arc::new(StubRenderer::new(pages));
    let oracle = Oracle::new(None);

    let results = technique2::run(
        renderer,
        &store,
        &oracle,
        &RandomDropScorer,
        &corpus,
        &eval_options(10),
    )
    .await
    .unwrap();
    assert_eq!(results.len(), 4);
    for r in &results {
        assert!((0.0..=1.0).contains(&r.probability));
        assert!((0.0..0.2).contains(&r.drop));
    }

    for row in &corpus {
        let key = key_for(&row.url);
        store.get(&key, ArtifactKind::Html, Variant::Technique2).unwrap();
        store.get(&key, ArtifactKind::Screenshot, Variant::Technique2).unwrap();
    }

    let avg = technique2::average_drop(&results).unwrap();
    assert!((0.0..0.2).contains(&avg));
}

#[tokio::test]
async fn stored_corpus_trains_a_deterministic_model() {
    let dir = TempDir::new().unwrap();
    let store = ArtifactStore::open(dir.path()).unwrap();
    let (pages, corpus) = world(12);

    // Simulate the build step: store each validated page as the original.
    for row in &corpus {
        store
            .put(&row.url, ArtifactKind::Html, Variant::Original, pages[&row.url].as_bytes())
            .unwrap();
    }

    let (model, report) = trainer::train(&store, &corpus).unwrap();
    assert_eq!(report.examples, 24);
    assert!(report.accuracy > 0.5);

    // Save, reload, and check predictions are preserved exactly.
    let path = dir.path().join("model.json");
    model.save(&path).unwrap();
    let oracle = Oracle::from_model_file(&path);
    assert!(oracle.has_model());

    let a = oracle.predict_html(&phish_page(0));
    let b = oracle.predict_html(&phish_page(0));
    assert_eq!(a.probability, b.probability);

    // The phishing page should score clearly above the benign one.
    let benign = oracle.predict_html(&legit_page(0));
    assert!(a.probability > benign.probability);
}
