//! End-to-end scenarios through `VideoAssistant` with a scripted generator.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use vidqa_core::{
    AssistantPorts, CachePolicy, CachedOperation, GenerationRequest, InMemoryStore,
    InferenceError, KeyedCache, ResolvedBy, Settings, TextGenerator, Transcript,
    TranscriptSegment, TranscriptStore, VideoAssistant,
};

/// Replies with queued responses in order, then with the last one forever.
struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, InferenceError>>>,
    last: Mutex<Option<Result<String, InferenceError>>>,
    calls: AtomicUsize,
    delay: Duration,
}

impl ScriptedGenerator {
    fn new(replies: Vec<Result<String, InferenceError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
        })
    }

    fn slow(reply: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::from([Ok(reply.to_string())])),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
            delay,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self.replies.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        if let Some(reply) = next {
            *last = Some(reply.clone());
            return reply;
        }
        last.clone()
            .unwrap_or_else(|| Err(InferenceError::ProcessUnavailable("script exhausted".into())))
    }
}

fn store() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    store.insert_transcript(
        "lecture",
        Transcript::from_segments(vec![
            TranscriptSegment::new(0.0, 12.0, "Welcome to the lecture on distributed caches").unwrap(),
            TranscriptSegment::new(12.0, 40.0, "The main idea is to trade memory for latency").unwrap(),
            TranscriptSegment::new(40.0, 75.0, "Expiry keeps stale entries from being served").unwrap(),
        ]),
    );
    store
}

fn assistant_with(
    generator: Arc<ScriptedGenerator>,
    cached: CachedOperation,
) -> (VideoAssistant, Arc<InMemoryStore>) {
    let store = store();
    let ports = AssistantPorts {
        store: store.clone(),
        search: store.clone(),
        generator,
    };
    (VideoAssistant::new(ports, cached, &Settings::with_defaults()), store)
}

fn cached(ttl: Duration) -> CachedOperation {
    CachedOperation::new(Arc::new(KeyedCache::new(ttl)))
}

#[tokio::test]
async fn skip_to_explicit_timestamp() {
    let generator = ScriptedGenerator::new(vec![]);
    let (assistant, _) = assistant_with(generator.clone(), cached(Duration::from_secs(60)));

    for video in ["lecture", "no-such-video"] {
        let result = assistant.navigate(video, "skip to 2:15", CachePolicy::Use).await;
        assert_eq!(result.resolved_by, ResolvedBy::DirectMatch);
        assert!((result.position_seconds - 135.0).abs() < f64::EPSILON);
        assert_eq!(result.display_timestamp, "2:15");
        assert!(result.success);
    }
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn navigation_falls_back_to_model() {
    let generator = ScriptedGenerator::new(vec![Ok(
        r#"{"timestamp":"1:02:03","reason":"intro"}"#.to_string(),
    )]);
    let (assistant, _) = assistant_with(generator.clone(), cached(Duration::from_secs(60)));

    let result = assistant
        .navigate("lecture", "explain the main idea", CachePolicy::Use)
        .await;
    assert_eq!(result.resolved_by, ResolvedBy::ModelInference);
    assert!((result.position_seconds - 3723.0).abs() < f64::EPSILON);
    assert_eq!(result.reason, "intro");
    assert!(result.success);
}

#[tokio::test]
async fn garbage_navigation_output_degrades() {
    let generator = ScriptedGenerator::new(vec![Ok("¯\\_(ツ)_/¯ somewhere".to_string())]);
    let (assistant, _) = assistant_with(generator.clone(), cached(Duration::from_secs(60)));

    let result = assistant
        .navigate("lecture", "explain the main idea", CachePolicy::Use)
        .await;
    assert!(!result.success);
    assert!(result.position_seconds.abs() < f64::EPSILON);
    assert!(!result.reason.is_empty());

    // Failed results are not cached, so the next call asks again.
    assistant
        .navigate("lecture", "explain the main idea", CachePolicy::Use)
        .await;
    assert_eq!(generator.calls(), 2);
}

#[tokio::test]
async fn unreachable_server_is_a_labeled_failure() {
    let generator = ScriptedGenerator::new(vec![Err(InferenceError::Transport(
        "connection refused".into(),
    ))]);
    let (assistant, _) = assistant_with(generator, cached(Duration::from_secs(60)));

    let answer = assistant
        .answer_question("lecture", "what is the main idea?", CachePolicy::Use)
        .await;
    assert!(!answer.success);
    assert!(answer.error.unwrap().contains("connection refused"));

    let nav = assistant.navigate("lecture", "the expiry part", CachePolicy::Use).await;
    assert!(!nav.success);
    assert!(nav.reason.contains("connection refused"));

    let summary = assistant.get_summary("lecture", false, CachePolicy::Use).await;
    assert!(!summary.success);
}

#[tokio::test]
async fn quiz_clamps_out_of_bounds_answer() {
    let generator = ScriptedGenerator::new(vec![Ok(
        "[{\"question\": 1, \"options\": [\"a\", \"b\"], \"correctAnswerIndex\": 5}]".to_string(),
    )]);
    let (assistant, store) = assistant_with(generator, cached(Duration::from_secs(60)));

    let quiz = assistant.get_quiz("lecture", false, CachePolicy::Use).await;
    assert!(quiz.success);
    assert_eq!(quiz.questions.len(), 1);
    assert_eq!(quiz.questions[0].question, "1");
    assert_eq!(quiz.questions[0].correct_answer_index, 0);
    assert!(store.get_quiz("lecture").await.unwrap().is_some());
}

#[tokio::test(start_paused = true)]
async fn cached_answers_expire_after_ttl() {
    let generator = ScriptedGenerator::new(vec![Ok("first".into()), Ok("second".into())]);
    let (assistant, _) = assistant_with(generator.clone(), cached(Duration::from_secs(30)));

    let a = assistant.answer_question("lecture", "expiry?", CachePolicy::Use).await;
    tokio::time::advance(Duration::from_secs(29)).await;
    let b = assistant.answer_question("lecture", "expiry?", CachePolicy::Use).await;
    assert_eq!(a.answer, "first");
    assert_eq!(b.answer, "first");

    tokio::time::advance(Duration::from_secs(2)).await;
    let c = assistant.answer_question("lecture", "expiry?", CachePolicy::Use).await;
    assert_eq!(c.answer, "second");
    assert_eq!(generator.calls(), 2);
}

#[tokio::test]
async fn different_arguments_do_not_share_entries() {
    let generator = ScriptedGenerator::new(vec![Ok("one".into()), Ok("two".into())]);
    let (assistant, _) = assistant_with(generator.clone(), cached(Duration::from_secs(60)));

    let a = assistant.answer_question("lecture", "memory?", CachePolicy::Use).await;
    let b = assistant.answer_question("lecture", "latency?", CachePolicy::Use).await;
    assert_ne!(a.answer, b.answer);
    assert_eq!(assistant.cached().cache().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn single_flight_deduplicates_concurrent_misses() {
    let generator = ScriptedGenerator::slow("deduplicated", Duration::from_millis(50));
    let (assistant, _) = assistant_with(
        generator.clone(),
        cached(Duration::from_secs(60)).with_single_flight(),
    );
    let assistant = Arc::new(assistant);

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let assistant = Arc::clone(&assistant);
        tasks.push(tokio::spawn(async move {
            assistant
                .answer_question("lecture", "main idea?", CachePolicy::Use)
                .await
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap().answer, "deduplicated");
    }
    assert_eq!(generator.calls(), 1);
}
