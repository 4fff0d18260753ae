//! An SMS classifier whose in-flight check can be cancelled.

use crate::builder::{BuildError, OrchestratorBuilder};
use crate::core::{Effect, PerformContext, PerformResult, Performer, StateExt};
use crate::holder::StateObserver;
use crate::named_variants;
use crate::orchestrator::{Orchestrator, OrchestratorError, Scope};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Verdict {
    Spam,
    Genuine,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum SmsState {
    Idle,
    Checking { sms: String },
    Checked { sms: String, verdict: Verdict },
}

named_variants! {
    State for SmsState { Idle, Checking, Checked }
}

#[derive(Clone, Debug)]
pub enum SmsIntent {
    Check { sms: String },
    Classified { sms: String, verdict: Verdict },
    Cancel,
}

named_variants! {
    Intent for SmsIntent { Check, Classified, Cancel }
}

#[derive(Debug, PartialEq, Eq)]
pub enum SmsAction {
    Classify { sms: String },
    CancelClassification,
}

named_variants! {
    Action for SmsAction { Classify, CancelClassification }
}

pub fn reduce(state: &SmsState, intent: SmsIntent) -> Effect<SmsState, SmsAction> {
    match (state, intent) {
        (SmsState::Checking { sms: current }, SmsIntent::Check { sms }) if *current == sms => {
            state.clone().state_only()
        }
        (_, SmsIntent::Check { sms }) => SmsState::Checking { sms: sms.clone() }
            .with(SmsAction::Classify { sms }),
        (SmsState::Checking { sms: current }, SmsIntent::Classified { sms, verdict })
            if *current == sms =>
        {
            SmsState::Checked { sms, verdict }.state_only()
        }
        // A verdict for a check that was cancelled or replaced.
        (_, SmsIntent::Classified { .. }) => state.clone().state_only(),
        (SmsState::Checking { .. }, SmsIntent::Cancel) => {
            SmsState::Idle.with(SmsAction::CancelClassification)
        }
        (_, SmsIntent::Cancel) => state.clone().state_only(),
    }
}

#[async_trait]
pub trait SmsClassifier: Send + Sync + 'static {
    async fn classify(&self, sms: &str) -> Verdict;
}

/// Flags messages containing any of a fixed set of words.
pub struct KeywordClassifier {
    keywords: Vec<String>,
}

impl KeywordClassifier {
    pub fn new<I, K>(keywords: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| Into::<String>::into(k).to_lowercase())
                .collect(),
        }
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(["prize", "winner", "free", "urgent"])
    }
}

#[async_trait]
impl SmsClassifier for KeywordClassifier {
    async fn classify(&self, sms: &str) -> Verdict {
        let sms = sms.to_lowercase();
        if self.keywords.iter().any(|k| sms.contains(k.as_str())) {
            Verdict::Spam
        } else {
            Verdict::Genuine
        }
    }
}

/// Runs classifications in the background so a check can be cancelled
/// while the action lane keeps going.
pub struct SmsPerformer<C> {
    classifier: Arc<C>,
    pending: Mutex<Option<CancellationToken>>,
}

impl<C: SmsClassifier> SmsPerformer<C> {
    pub fn new(classifier: C) -> Self {
        Self {
            classifier: Arc::new(classifier),
            pending: Mutex::new(None),
        }
    }

    fn classify(&self, sms: String, ctx: &PerformContext<SmsIntent>) {
        let classifier = Arc::clone(&self.classifier);
        let intents = ctx.intents().clone();
        let token = ctx.spawn_cancellable(async move {
            let verdict = classifier.classify(&sms).await;
            intents.offer(SmsIntent::Classified { sms, verdict });
        });
        if let Some(previous) = self.pending.lock().replace(token) {
            previous.cancel();
        }
    }

    fn cancel(&self) {
        if let Some(pending) = self.pending.lock().take() {
            debug!("cancelling sms classification");
            pending.cancel();
        }
    }
}

#[async_trait]
impl<C: SmsClassifier> Performer<SmsAction, SmsIntent> for SmsPerformer<C> {
    async fn perform(
        &self,
        action: SmsAction,
        ctx: &PerformContext<SmsIntent>,
    ) -> PerformResult<SmsIntent> {
        match action {
            SmsAction::Classify { sms } => self.classify(sms, ctx),
            SmsAction::CancelClassification => self.cancel(),
        }
        Ok(None)
    }
}

/// Facade over the classifier orchestrator.
pub struct SmsUseCase {
    knot: Orchestrator<SmsState, SmsIntent, SmsAction>,
}

impl SmsUseCase {
    pub fn new<C: SmsClassifier>(classifier: C) -> Result<Self, BuildError> {
        let knot = OrchestratorBuilder::new()
            .name("sms")
            .initial(SmsState::Idle)
            .reducer(reduce)
            .performer(SmsPerformer::new(classifier))
            .build()?;
        Ok(Self { knot })
    }

    pub fn start(&self, scope: &Scope) -> Result<(), OrchestratorError> {
        self.knot.start(scope)
    }

    pub fn stop(&self) {
        self.knot.stop();
    }

    pub fn check_sms(&self, sms: impl Into<String>) {
        self.knot.offer_intent(SmsIntent::Check { sms: sms.into() });
    }

    /// Abandon the check in flight, if any.
    pub fn cancel(&self) {
        self.knot.offer_intent(SmsIntent::Cancel);
    }

    pub fn state(&self) -> SmsState {
        self.knot.state()
    }

    pub fn observe(&self) -> StateObserver<SmsState> {
        self.knot.observe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::State;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn checking(sms: &str) -> SmsState {
        SmsState::Checking { sms: sms.into() }
    }

    struct SlowClassifier {
        delay: Duration,
        finished: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SmsClassifier for SlowClassifier {
        async fn classify(&self, sms: &str) -> Verdict {
            tokio::time::sleep(self.delay).await;
            self.finished.fetch_add(1, Ordering::SeqCst);
            KeywordClassifier::default().classify(sms).await
        }
    }

    #[test]
    fn check_starts_classification() {
        let effect = reduce(&SmsState::Idle, SmsIntent::Check { sms: "hi".into() });
        assert_eq!(effect.state, checking("hi"));
        assert_eq!(effect.actions, vec![SmsAction::Classify { sms: "hi".into() }]);
    }

    #[test]
    fn same_check_in_flight_is_noop() {
        let effect = reduce(&checking("hi"), SmsIntent::Check { sms: "hi".into() });
        assert_eq!(effect.state, checking("hi"));
        assert!(effect.actions.is_empty());
    }

    #[test]
    fn cancel_only_acts_while_checking() {
        let effect = reduce(&checking("hi"), SmsIntent::Cancel);
        assert_eq!(effect.state, SmsState::Idle);
        assert_eq!(effect.actions, vec![SmsAction::CancelClassification]);

        let effect = reduce(&SmsState::Idle, SmsIntent::Cancel);
        assert!(effect.actions.is_empty());
    }

    #[test]
    fn stale_verdict_is_ignored() {
        let verdict = SmsIntent::Classified {
            sms: "old".into(),
            verdict: Verdict::Spam,
        };
        assert_eq!(reduce(&checking("new"), verdict.clone()).state, checking("new"));
        assert_eq!(reduce(&SmsState::Idle, verdict).state, SmsState::Idle);
    }

    #[tokio::test]
    async fn keywords_flag_spam() {
        let classifier = KeywordClassifier::default();
        assert_eq!(classifier.classify("You are a WINNER").await, Verdict::Spam);
        assert_eq!(classifier.classify("see you at six").await, Verdict::Genuine);
    }

    #[tokio::test(start_paused = true)]
    async fn check_reaches_verdict() {
        let finished = Arc::new(AtomicUsize::new(0));
        let sms = SmsUseCase::new(SlowClassifier {
            delay: Duration::from_secs(1),
            finished: Arc::clone(&finished),
        })
        .unwrap();
        sms.start(&Scope::current().unwrap()).unwrap();
        let mut observer = sms.observe();

        sms.check_sms("free prize inside");
        let state = observer
            .wait_for(|s| matches!(s, SmsState::Checked { .. }))
            .await
            .unwrap();
        assert_eq!(
            state,
            SmsState::Checked {
                sms: "free prize inside".into(),
                verdict: Verdict::Spam
            }
        );
        assert_eq!(state.name(), "Checked");
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_abandons_check_in_flight() {
        let finished = Arc::new(AtomicUsize::new(0));
        let sms = SmsUseCase::new(SlowClassifier {
            delay: Duration::from_secs(1),
            finished: Arc::clone(&finished),
        })
        .unwrap();
        sms.start(&Scope::current().unwrap()).unwrap();
        let mut observer = sms.observe();

        sms.check_sms("free prize inside");
        observer.wait_for(|s| *s == checking("free prize inside")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        sms.cancel();
        observer.wait_for(|s| *s == SmsState::Idle).await.unwrap();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(sms.state(), SmsState::Idle);
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }
}
