//! Session registry: the orchestrator mapping client ids to live sessions.
//!
//! Owns the only map from client id to session state and drives the three
//! entry points of the chat lifecycle: `open`, `handle_message`, `close`.
//! This is also the only layer that translates named ingestion/generation
//! failures into the fixed user-facing protocol tokens; everything
//! unclassified crosses this boundary unchanged so it reaches whatever
//! supervises the process.
//!
//! Each session lives behind its own `tokio::sync::Mutex`, so map lookups
//! stay brief while per-session work (prompt build, generation, send) is
//! serialized per client without blocking unrelated sessions.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use repotalk_types::chat::{
    ERR_INTERNAL, ERR_REPO_NOT_FOUND, ERR_REPO_PRIVATE, ERR_REPO_TOO_LARGE, Exchange,
    RATE_LIMIT_EXHAUSTED_MESSAGE, REPO_PROCESSED,
};
use repotalk_types::error::{GenerateError, IngestError};
use repotalk_types::repo::RepoRef;

use crate::ingest::{IngestService, RepoDigester, RepoProbe};
use crate::llm::{GenerationBackend, RotatingClient};

use super::prompt::build_prompt;
use super::session::Session;
use super::transport::SessionTransport;

/// Registry of active sessions, keyed by opaque client id.
///
/// At most one session exists per client id at any instant; opening a
/// session under an id that is already in use tears the old one down
/// first. Last writer wins, no merge.
pub struct SessionRegistry<T, P, D, B> {
    sessions: DashMap<String, Arc<Mutex<Session<T>>>>,
    ingest: IngestService<P, D>,
    generator: RotatingClient<B>,
}

impl<T, P, D, B> SessionRegistry<T, P, D, B>
where
    T: SessionTransport,
    P: RepoProbe,
    D: RepoDigester,
    B: GenerationBackend,
{
    pub fn new(ingest: IngestService<P, D>, generator: RotatingClient<B>) -> Self {
        Self {
            sessions: DashMap::new(),
            ingest,
            generator,
        }
    }

    /// Number of currently active sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// History length of an active session, if one exists for this id.
    pub async fn history_len(&self, client_id: &str) -> Option<usize> {
        let session = self.sessions.get(client_id).map(|e| e.value().clone())?;
        let len = session.lock().await.history.len();
        Some(len)
    }

    /// Snapshot of a session's conversation history. Empty for an unknown
    /// id.
    pub async fn history(&self, client_id: &str) -> Vec<Exchange> {
        match self.sessions.get(client_id).map(|e| e.value().clone()) {
            Some(session) => session.lock().await.history.clone(),
            None => Vec::new(),
        }
    }

    /// Open a session: ingest the repository once, then either store the
    /// session and acknowledge, or report a named failure and close.
    ///
    /// Returns `Ok(true)` when the session is established, `Ok(false)` when
    /// a user-facing condition was already reported on the transport, and
    /// `Err` for unclassified ingestion failures (which are also reported
    /// to the client as a generic internal-error token before the transport
    /// is closed).
    pub async fn open(
        &self,
        transport: T,
        client_id: &str,
        owner: &str,
        repo: &str,
    ) -> Result<bool, IngestError> {
        if let Some((_, old)) = self.sessions.remove(client_id) {
            tracing::info!(%client_id, "replacing existing session");
            old.lock().await.transport.close().await;
        }

        let repo_ref = RepoRef::new(owner, repo);
        tracing::info!(%client_id, repo = %repo_ref, "processing repository");

        match self.ingest.ingest(&repo_ref).await {
            Ok(digest) => {
                let mut session = Session::new(transport, repo_ref.clone(), digest);
                if let Err(err) = session.transport.send(REPO_PROCESSED).await {
                    tracing::warn!(%client_id, error = %err, "client gone before ack");
                    session.transport.close().await;
                    return Ok(false);
                }
                self.sessions
                    .insert(client_id.to_string(), Arc::new(Mutex::new(session)));
                tracing::info!(%client_id, repo = %repo_ref, "repository processed");
                Ok(true)
            }
            Err(err) => {
                let token = match &err {
                    IngestError::NotFound => ERR_REPO_NOT_FOUND,
                    IngestError::TooLarge => ERR_REPO_TOO_LARGE,
                    IngestError::Private => ERR_REPO_PRIVATE,
                    IngestError::Upstream(_) => ERR_INTERNAL,
                };
                tracing::info!(%client_id, repo = %repo_ref, %token, "ingestion failed");

                let mut transport = transport;
                if let Err(send_err) = transport.send(token).await {
                    tracing::debug!(%client_id, error = %send_err, "failed to report failure");
                }
                transport.close().await;

                match err {
                    IngestError::Upstream(_) => Err(err),
                    _ => Ok(false),
                }
            }
        }
    }

    /// Answer one query on an existing session.
    ///
    /// A message for an unknown client id is a no-op (the connection task
    /// only calls this after a successful `open`, so this covers the race
    /// with an eviction). On success the response is sent and the exchange
    /// appended to history; `OutOfKeys` turns into the fixed rate-limit
    /// message; other generation errors propagate.
    pub async fn handle_message(
        &self,
        client_id: &str,
        text: &str,
    ) -> Result<(), GenerateError> {
        let Some(session) = self.sessions.get(client_id).map(|e| e.value().clone()) else {
            tracing::warn!(%client_id, "message for unknown session, dropping");
            return Ok(());
        };
        let mut session = session.lock().await;

        let prompt = build_prompt(
            text,
            &session.history,
            &session.digest.tree,
            &session.digest.content,
        );
        tracing::debug!(%client_id, prompt_bytes = prompt.len(), "prompt built");

        match self.generator.generate(&prompt).await {
            Ok(response) => {
                if let Err(err) = session.transport.send(&response).await {
                    // Client disconnected mid-generation; the connection
                    // task will evict the session on its way out.
                    tracing::debug!(%client_id, error = %err, "response send failed");
                    return Ok(());
                }
                session.history.push(Exchange::new(text, response));
                tracing::info!(
                    %client_id,
                    history_len = session.history.len(),
                    "response delivered"
                );
                Ok(())
            }
            Err(GenerateError::OutOfKeys) => {
                tracing::warn!(%client_id, "all API keys exhausted");
                if let Err(err) = session.transport.send(RATE_LIMIT_EXHAUSTED_MESSAGE).await {
                    tracing::debug!(%client_id, error = %err, "rate-limit notice send failed");
                }
                Ok(())
            }
            Err(other) => Err(other),
        }
    }

    /// Close and evict a session. Idempotent: closing an unknown id is a
    /// no-op.
    pub async fn close(&self, client_id: &str) {
        if let Some((_, session)) = self.sessions.remove(client_id) {
            let mut session = session.lock().await;
            session.transport.close().await;
            let lifetime = chrono::Utc::now() - session.opened_at;
            tracing::info!(
                %client_id,
                exchanges = session.history.len(),
                lifetime_secs = lifetime.num_seconds(),
                "session closed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::IngestPolicy;
    use repotalk_types::error::{SourceError, TransportError};
    use repotalk_types::repo::RepoDigest;
    use secrecy::SecretString;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Transport that records everything sent through it.
    #[derive(Clone, Default)]
    struct RecordingTransport {
        sent: Arc<StdMutex<Vec<String>>>,
        closed: Arc<AtomicBool>,
    }

    impl RecordingTransport {
        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }

        fn is_closed(&self) -> bool {
            self.closed.load(Ordering::SeqCst)
        }
    }

    impl SessionTransport for RecordingTransport {
        async fn send(&mut self, text: &str) -> Result<(), TransportError> {
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }

        async fn close(&mut self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    struct StubProbe {
        exists: bool,
    }

    impl RepoProbe for StubProbe {
        async fn exists(&self, _repo: &RepoRef) -> bool {
            self.exists
        }
    }

    struct StubDigester {
        result: Result<RepoDigest, SourceError>,
    }

    impl RepoDigester for StubDigester {
        async fn digest(
            &self,
            _repo: &RepoRef,
            _exclude: &[String],
        ) -> Result<RepoDigest, SourceError> {
            match &self.result {
                Ok(digest) => Ok(digest.clone()),
                Err(SourceError::Other(msg)) => Err(SourceError::Other(msg.clone())),
                Err(SourceError::NotFound) => Err(SourceError::NotFound),
                Err(SourceError::BadCredentials) => Err(SourceError::BadCredentials),
                Err(SourceError::RateLimited) => Err(SourceError::RateLimited),
            }
        }
    }

    /// Backend that echoes the prompt length or fails with a fixed error.
    struct StubBackend {
        response: Result<String, fn() -> GenerateError>,
        prompts: Arc<StdMutex<Vec<String>>>,
    }

    impl GenerationBackend for StubBackend {
        async fn generate(
            &self,
            _api_key: &SecretString,
            prompt: &str,
        ) -> Result<String, GenerateError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.response {
                Ok(text) => Ok(text.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    type TestRegistry = SessionRegistry<RecordingTransport, StubProbe, StubDigester, StubBackend>;

    struct Fixture {
        registry: TestRegistry,
        prompts: Arc<StdMutex<Vec<String>>>,
    }

    fn digest() -> RepoDigest {
        RepoDigest {
            summary: "Repository: EnhancedJax/Bagels\nEstimated tokens: 12.3K".to_string(),
            tree: "src/\n  app.py".to_string(),
            content: "print('bagels')".to_string(),
        }
    }

    fn fixture(
        exists: bool,
        digest_result: Result<RepoDigest, SourceError>,
        response: Result<String, fn() -> GenerateError>,
        keys: usize,
    ) -> Fixture {
        let prompts = Arc::new(StdMutex::new(Vec::new()));
        let ingest = IngestService::new(
            StubProbe { exists },
            StubDigester {
                result: digest_result,
            },
            IngestPolicy::default(),
        );
        let generator = RotatingClient::new(
            StubBackend {
                response,
                prompts: prompts.clone(),
            },
            (0..keys)
                .map(|i| SecretString::from(format!("key-{i}")))
                .collect(),
        );
        Fixture {
            registry: SessionRegistry::new(ingest, generator),
            prompts,
        }
    }

    fn happy_fixture() -> Fixture {
        fixture(true, Ok(digest()), Ok("Bagels is a TUI expense tracker.".to_string()), 1)
    }

    #[tokio::test]
    async fn test_open_success_acks_and_stores() {
        let f = happy_fixture();
        let transport = RecordingTransport::default();

        let opened = f
            .registry
            .open(transport.clone(), "abc123", "EnhancedJax", "Bagels")
            .await
            .unwrap();

        assert!(opened);
        assert_eq!(transport.sent(), vec![REPO_PROCESSED.to_string()]);
        assert!(!transport.is_closed());
        assert_eq!(f.registry.session_count(), 1);
        assert_eq!(f.registry.history_len("abc123").await, Some(0));
    }

    #[tokio::test]
    async fn test_open_not_found_sends_token_and_closes() {
        let f = fixture(false, Ok(digest()), Ok("unused".to_string()), 1);
        let transport = RecordingTransport::default();

        let opened = f
            .registry
            .open(transport.clone(), "abc123", "nobody", "nothing")
            .await
            .unwrap();

        assert!(!opened);
        assert_eq!(transport.sent(), vec![ERR_REPO_NOT_FOUND.to_string()]);
        assert!(transport.is_closed());
        assert_eq!(f.registry.session_count(), 0);
    }

    #[tokio::test]
    async fn test_open_too_large_sends_token_and_closes() {
        let big = RepoDigest {
            summary: "Estimated tokens: 2.0M".to_string(),
            ..Default::default()
        };
        let f = fixture(true, Ok(big), Ok("unused".to_string()), 1);
        let transport = RecordingTransport::default();

        let opened = f
            .registry
            .open(transport.clone(), "abc123", "torvalds", "linux")
            .await
            .unwrap();

        assert!(!opened);
        assert_eq!(transport.sent(), vec![ERR_REPO_TOO_LARGE.to_string()]);
        assert!(transport.is_closed());
    }

    #[tokio::test]
    async fn test_open_private_sends_token_and_closes() {
        let f = fixture(
            true,
            Err(SourceError::BadCredentials),
            Ok("unused".to_string()),
            1,
        );
        let transport = RecordingTransport::default();

        let opened = f
            .registry
            .open(transport.clone(), "abc123", "acme", "secrets")
            .await
            .unwrap();

        assert!(!opened);
        assert_eq!(transport.sent(), vec![ERR_REPO_PRIVATE.to_string()]);
        assert!(transport.is_closed());
    }

    #[tokio::test]
    async fn test_open_upstream_error_propagates_after_internal_token() {
        let f = fixture(
            true,
            Err(SourceError::Other("dns lookup failed".to_string())),
            Ok("unused".to_string()),
            1,
        );
        let transport = RecordingTransport::default();

        let err = f
            .registry
            .open(transport.clone(), "abc123", "acme", "app")
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::Upstream(_)));
        assert_eq!(transport.sent(), vec![ERR_INTERNAL.to_string()]);
        assert!(transport.is_closed());
        assert_eq!(f.registry.session_count(), 0);
    }

    #[tokio::test]
    async fn test_reopen_same_id_closes_old_transport() {
        let f = happy_fixture();
        let first = RecordingTransport::default();
        let second = RecordingTransport::default();

        f.registry
            .open(first.clone(), "abc123", "EnhancedJax", "Bagels")
            .await
            .unwrap();
        f.registry
            .open(second.clone(), "abc123", "EnhancedJax", "Bagels")
            .await
            .unwrap();

        assert!(first.is_closed());
        assert!(!second.is_closed());
        assert_eq!(f.registry.session_count(), 1);
    }

    #[tokio::test]
    async fn test_message_round_trip_grows_history() {
        let f = happy_fixture();
        let transport = RecordingTransport::default();
        f.registry
            .open(transport.clone(), "abc123", "EnhancedJax", "Bagels")
            .await
            .unwrap();

        f.registry
            .handle_message("abc123", "How does this codebase work?")
            .await
            .unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1], "Bagels is a TUI expense tracker.");
        assert!(!sent[1].is_empty());
        assert_eq!(f.registry.history_len("abc123").await, Some(1));

        let history = f.registry.history("abc123").await;
        assert_eq!(history[0].query, "How does this codebase work?");
        assert_eq!(history[0].response, "Bagels is a TUI expense tracker.");
        assert!(f.registry.history("ghost").await.is_empty());

        // The prompt carried the query and the cached digest verbatim.
        let prompts = f.prompts.lock().unwrap();
        assert!(prompts[0].contains("How does this codebase work?"));
        assert!(prompts[0].contains("src/\n  app.py"));
        assert!(prompts[0].contains("print('bagels')"));
    }

    #[tokio::test]
    async fn test_second_message_sees_prior_history() {
        let f = happy_fixture();
        let transport = RecordingTransport::default();
        f.registry
            .open(transport.clone(), "abc123", "EnhancedJax", "Bagels")
            .await
            .unwrap();

        f.registry.handle_message("abc123", "first?").await.unwrap();
        f.registry.handle_message("abc123", "second?").await.unwrap();

        assert_eq!(f.registry.history_len("abc123").await, Some(2));
        let prompts = f.prompts.lock().unwrap();
        assert!(prompts[1].contains("first?"));
        assert!(prompts[1].contains("Bagels is a TUI expense tracker."));
    }

    #[tokio::test]
    async fn test_out_of_keys_sends_rate_limit_message() {
        let f = fixture(
            true,
            Ok(digest()),
            Err(|| GenerateError::QuotaExhausted),
            2,
        );
        let transport = RecordingTransport::default();
        f.registry
            .open(transport.clone(), "abc123", "EnhancedJax", "Bagels")
            .await
            .unwrap();

        f.registry.handle_message("abc123", "hello?").await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent[1], RATE_LIMIT_EXHAUSTED_MESSAGE);
        assert_eq!(f.registry.history_len("abc123").await, Some(0));
    }

    #[tokio::test]
    async fn test_other_generation_error_propagates() {
        let f = fixture(
            true,
            Ok(digest()),
            Err(|| GenerateError::InvalidRequest("bad prompt".to_string())),
            1,
        );
        let transport = RecordingTransport::default();
        f.registry
            .open(transport.clone(), "abc123", "EnhancedJax", "Bagels")
            .await
            .unwrap();

        let err = f.registry.handle_message("abc123", "q").await.unwrap_err();
        assert!(matches!(err, GenerateError::InvalidRequest(_)));
        // No answer was delivered and the history is untouched.
        assert_eq!(transport.sent().len(), 1);
        assert_eq!(f.registry.history_len("abc123").await, Some(0));
    }

    #[tokio::test]
    async fn test_message_for_unknown_session_is_noop() {
        let f = happy_fixture();
        assert!(f.registry.handle_message("ghost", "anyone?").await.is_ok());
        assert!(f.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let f = happy_fixture();
        let transport = RecordingTransport::default();
        f.registry
            .open(transport.clone(), "abc123", "EnhancedJax", "Bagels")
            .await
            .unwrap();

        f.registry.close("abc123").await;
        assert!(transport.is_closed());
        assert_eq!(f.registry.session_count(), 0);

        // A second close and a close of an id that never existed are no-ops.
        f.registry.close("abc123").await;
        f.registry.close("never-seen").await;
    }
}
