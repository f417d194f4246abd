//! Interview session state machine.
//!
//! [`Interview`] owns the single [`Session`] and drives it through the
//! Setup -> Running -> Feedback lifecycle. Each operation performs exactly
//! one outbound generation call; on failure the session is rolled back to a
//! consistent state so the caller can retry.

use crate::client::{GenerateError, GenerationClient};
use crate::prompts;
use crate::transcript::{self, END_MARKER, Exchange, Level, Turn};
use std::sync::Arc;
use tracing::info;

/// How many trailing transcript entries feed follow-up generation.
const FOLLOW_UP_WINDOW: usize = 6;

/// Character cap on the transcript rendered into the feedback prompt.
const FEEDBACK_TRANSCRIPT_CHARS: usize = 6000;

/// Stored when the model returns empty feedback text.
const FEEDBACK_FALLBACK: &str = "The model did not return feedback. Please try again.";

/// Orchestrator state. Transitions are monotonic:
/// Setup -> Running -> Feedback, then back to Setup via [`Interview::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Setup,
    Running,
    Feedback,
}

/// The single interview session, owned exclusively by the orchestrator and
/// mutated only through its operations.
#[derive(Debug, Clone)]
pub struct Session {
    phase: Phase,
    role: String,
    level: Level,
    transcript: Vec<Exchange>,
    feedback: Option<String>,
}

impl Session {
    fn new() -> Self {
        Self {
            phase: Phase::Setup,
            role: String::new(),
            level: Level::Fresher,
            transcript: Vec::new(),
            feedback: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// The full exchange log, termination marker included.
    pub fn transcript(&self) -> &[Exchange] {
        &self.transcript
    }

    /// Transcript entries safe to render: the termination marker is filtered.
    pub fn visible_exchanges(&self) -> impl Iterator<Item = &Exchange> {
        self.transcript
            .iter()
            .filter(|exchange| !exchange.is_end_marker())
    }

    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }
}

/// Orchestrator-level failures. Generation failures pass through unchanged so
/// the caller sees the full taxonomy of [`GenerateError`].
#[derive(Debug, thiserror::Error)]
pub enum InterviewError {
    #[error("a job role is required to begin")]
    MissingRole,
    #[error("answer is empty; type a response before sending")]
    EmptyAnswer,
    #[error("operation not valid in the {0:?} phase")]
    InvalidPhase(Phase),
    #[error(transparent)]
    Generate(#[from] GenerateError),
}

/// Drives one mock-interview session against an injected generation client.
pub struct Interview {
    client: Arc<dyn GenerationClient>,
    session: Session,
}

impl Interview {
    pub fn new(client: Arc<dyn GenerationClient>) -> Self {
        Self {
            client,
            session: Session::new(),
        }
    }

    /// Read access for the presentation layer; re-read after every operation.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Starts a new interview: clears the transcript, enters Running, and
    /// appends the opening question as the first Interviewer exchange.
    ///
    /// Requires the Setup phase, a non-empty role, and a configured
    /// credential. On generation failure the session returns to Setup.
    pub async fn start(&mut self, role: &str, level: Level) -> Result<(), InterviewError> {
        if self.session.phase != Phase::Setup {
            return Err(InterviewError::InvalidPhase(self.session.phase));
        }
        let role = role.trim();
        if role.is_empty() {
            return Err(InterviewError::MissingRole);
        }
        if !self.client.is_configured() {
            return Err(GenerateError::MissingCredential.into());
        }

        self.session.role = role.to_string();
        self.session.level = level;
        self.session.transcript.clear();
        self.session.feedback = None;
        self.session.phase = Phase::Running;

        let turns = [Turn::user(prompts::OPENING_USER_TURN)];
        match self
            .client
            .generate(&prompts::opening_system(role, level), &turns)
            .await
        {
            Ok(question) => {
                info!(role, level = %level, "interview started");
                self.session.transcript.push(Exchange::interviewer(format!(
                    "Welcome to your mock interview for the **{role}** role.\n\n**Question 1:** {question}"
                )));
                Ok(())
            }
            Err(err) => {
                self.session.phase = Phase::Setup;
                Err(err.into())
            }
        }
    }

    /// Records a candidate answer and appends the generated follow-up
    /// question.
    ///
    /// Empty answers are rejected without side effects. An end-of-interview
    /// command delegates to [`Interview::end`]. On generation failure every
    /// exchange appended by this call is rolled back so the answer can be
    /// resubmitted.
    pub async fn submit_answer(&mut self, text: &str) -> Result<(), InterviewError> {
        if self.session.phase != Phase::Running {
            return Err(InterviewError::InvalidPhase(self.session.phase));
        }
        let answer = text.trim();
        if answer.is_empty() {
            return Err(InterviewError::EmptyAnswer);
        }

        let checkpoint = self.session.transcript.len();
        self.session.transcript.push(Exchange::candidate(answer));

        if transcript::is_end_command(answer) {
            let result = self.finish().await;
            if result.is_err() {
                self.session.transcript.truncate(checkpoint);
            }
            return result;
        }

        let window = transcript::conversation_turns(&self.session.transcript, Some(FOLLOW_UP_WINDOW));
        let system = prompts::follow_up_system(&self.session.role, self.session.level);
        match self.client.generate(&system, &window).await {
            Ok(question) => {
                self.session.transcript.push(Exchange::interviewer(question));
                Ok(())
            }
            Err(err) => {
                self.session.transcript.truncate(checkpoint);
                Err(err.into())
            }
        }
    }

    /// Ends the interview and stores the generated performance evaluation.
    ///
    /// Appends the termination marker as the final transcript entry, renders
    /// the full transcript, and requests feedback. On generation failure the
    /// marker is removed and the session returns to Running.
    pub async fn end(&mut self) -> Result<(), InterviewError> {
        if self.session.phase != Phase::Running {
            return Err(InterviewError::InvalidPhase(self.session.phase));
        }
        self.finish().await
    }

    /// Clears all session state and returns to Setup.
    pub fn reset(&mut self) {
        self.session = Session::new();
        info!("session reset");
    }

    async fn finish(&mut self) -> Result<(), InterviewError> {
        self.session.phase = Phase::Feedback;
        self.session.transcript.push(Exchange::candidate(END_MARKER));

        let rendered =
            transcript::readable_text(&self.session.transcript, FEEDBACK_TRANSCRIPT_CHARS);
        let request = prompts::feedback_request(&self.session.role, &rendered);
        let turns = [Turn::user(request)];

        match self.client.generate(prompts::FEEDBACK_SYSTEM, &turns).await {
            Ok(feedback) => {
                self.session.feedback = Some(if feedback.trim().is_empty() {
                    FEEDBACK_FALLBACK.to_string()
                } else {
                    feedback
                });
                info!("interview ended; feedback stored");
                Ok(())
            }
            Err(err) => {
                self.session.transcript.pop();
                self.session.phase = Phase::Running;
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockGenerationClient;

    /// Mock that answers by phase: feedback requests get `feedback`, anything
    /// else gets `question`.
    fn scripted_client(question: &str, feedback: &str) -> MockGenerationClient {
        let question = question.to_string();
        let feedback = feedback.to_string();
        let mut client = MockGenerationClient::new();
        client.expect_is_configured().return_const(true);
        client.expect_generate().returning(move |system, _| {
            if system.contains("interview coach") {
                Ok(feedback.clone())
            } else {
                Ok(question.clone())
            }
        });
        client
    }

    async fn started_interview(client: MockGenerationClient) -> Interview {
        let mut interview = Interview::new(Arc::new(client));
        interview
            .start("Backend Engineer", Level::Fresher)
            .await
            .unwrap();
        interview
    }

    #[tokio::test]
    async fn start_appends_the_first_question() {
        let interview = started_interview(scripted_client(
            "Tell me about yourself.",
            "Good interview.",
        ))
        .await;
        let session = interview.session();

        assert_eq!(session.phase(), Phase::Running);
        assert_eq!(session.role(), "Backend Engineer");
        assert_eq!(session.transcript().len(), 1);
        assert!(session.transcript()[0].text.contains("Question 1"));
        assert!(session.transcript()[0].text.contains("Tell me about yourself."));
    }

    #[tokio::test]
    async fn start_rejects_a_blank_role() {
        let mut client = MockGenerationClient::new();
        client.expect_generate().never();
        let mut interview = Interview::new(Arc::new(client));

        let err = interview.start("   ", Level::Fresher).await.unwrap_err();

        assert!(matches!(err, InterviewError::MissingRole));
        assert_eq!(interview.session().phase(), Phase::Setup);
    }

    #[tokio::test]
    async fn start_requires_a_credential() {
        let mut client = MockGenerationClient::new();
        client.expect_is_configured().return_const(false);
        client.expect_generate().never();
        let mut interview = Interview::new(Arc::new(client));

        let err = interview
            .start("Backend Engineer", Level::Fresher)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            InterviewError::Generate(GenerateError::MissingCredential)
        ));
        assert_eq!(interview.session().phase(), Phase::Setup);
    }

    #[tokio::test]
    async fn start_failure_returns_to_setup() {
        let mut client = MockGenerationClient::new();
        client.expect_is_configured().return_const(true);
        client.expect_generate().returning(|_, _| {
            Err(GenerateError::Protocol {
                status: Some(400),
                detail: "bad request".to_string(),
            })
        });
        let mut interview = Interview::new(Arc::new(client));

        let result = interview.start("Backend Engineer", Level::Fresher).await;

        assert!(result.is_err());
        assert_eq!(interview.session().phase(), Phase::Setup);
        assert!(interview.session().transcript().is_empty());
    }

    #[tokio::test]
    async fn empty_answers_are_rejected_without_a_call() {
        let mut client = MockGenerationClient::new();
        client.expect_is_configured().return_const(true);
        client
            .expect_generate()
            .times(1)
            .returning(|_, _| Ok("Opening question?".to_string()));
        let mut interview = started_interview(client).await;

        for answer in ["", "   ", "\n\t"] {
            let err = interview.submit_answer(answer).await.unwrap_err();
            assert!(matches!(err, InterviewError::EmptyAnswer));
        }
        assert_eq!(interview.session().transcript().len(), 1);
    }

    #[tokio::test]
    async fn submit_answer_grows_the_transcript_by_two() {
        let mut interview =
            started_interview(scripted_client("Which framework did you use?", "F")).await;

        interview.submit_answer("I built a REST API").await.unwrap();
        let transcript = interview.session().transcript();

        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[1].text, "I built a REST API");
        assert_eq!(transcript[2].text, "Which framework did you use?");
    }

    #[tokio::test]
    async fn follow_up_generation_sees_at_most_the_window() {
        let mut client = MockGenerationClient::new();
        client.expect_is_configured().return_const(true);
        client
            .expect_generate()
            .withf(|_, turns| turns.len() <= FOLLOW_UP_WINDOW)
            .returning(|_, _| Ok("Next question?".to_string()));
        let mut interview = started_interview(client).await;

        for i in 0..6 {
            interview.submit_answer(&format!("answer {i}")).await.unwrap();
        }

        assert_eq!(interview.session().transcript().len(), 13);
    }

    #[tokio::test]
    async fn end_command_variants_trigger_exactly_one_feedback_call() {
        for command in ["END INTERVIEW", "end interview", "End_Interview"] {
            let question = "Q?".to_string();
            let mut client = MockGenerationClient::new();
            client.expect_is_configured().return_const(true);
            client
                .expect_generate()
                .withf(|system, _| !system.contains("interview coach"))
                .returning(move |_, _| Ok(question.clone()));
            client
                .expect_generate()
                .withf(|system, _| system.contains("interview coach"))
                .times(1)
                .returning(|_, _| Ok("Solid performance.".to_string()));
            let mut interview = started_interview(client).await;

            interview.submit_answer(command).await.unwrap();

            assert_eq!(interview.session().phase(), Phase::Feedback);
            assert_eq!(interview.session().feedback(), Some("Solid performance."));
        }
    }

    #[tokio::test]
    async fn ending_appends_the_marker_but_hides_it() {
        let mut interview = started_interview(scripted_client("Q?", "Well done.")).await;
        interview.submit_answer("My answer").await.unwrap();

        interview.end().await.unwrap();
        let session = interview.session();

        assert_eq!(session.phase(), Phase::Feedback);
        assert_eq!(session.transcript().last().unwrap().text, END_MARKER);
        assert!(session.visible_exchanges().all(|e| !e.is_end_marker()));
        assert_eq!(
            session.visible_exchanges().count(),
            session.transcript().len() - 1
        );
    }

    #[tokio::test]
    async fn feedback_prompt_carries_the_transcript() {
        let mut client = MockGenerationClient::new();
        client.expect_is_configured().return_const(true);
        client
            .expect_generate()
            .withf(|system, _| !system.contains("interview coach"))
            .returning(|_, _| Ok("What did you build?".to_string()));
        client
            .expect_generate()
            .withf(|system, turns| {
                system.contains("interview coach")
                    && turns.len() == 1
                    && turns[0].text.contains("Candidate: I shipped a cache layer")
                    && !turns[0].text.contains(END_MARKER)
            })
            .times(1)
            .returning(|_, _| Ok("Good depth.".to_string()));
        let mut interview = started_interview(client).await;
        interview.submit_answer("I shipped a cache layer").await.unwrap();

        interview.end().await.unwrap();

        assert_eq!(interview.session().feedback(), Some("Good depth."));
    }

    #[tokio::test]
    async fn empty_feedback_falls_back_to_the_fixed_string() {
        let mut interview = started_interview(scripted_client("Q?", "   ")).await;

        interview.end().await.unwrap();

        assert_eq!(interview.session().feedback(), Some(FEEDBACK_FALLBACK));
    }

    #[tokio::test]
    async fn failed_follow_up_rolls_back_the_answer() {
        let mut client = MockGenerationClient::new();
        client.expect_is_configured().return_const(true);
        client
            .expect_generate()
            .times(1)
            .returning(|_, _| Ok("Opening question?".to_string()));
        client.expect_generate().returning(|_, _| {
            Err(GenerateError::Extraction {
                snippet: "{}".to_string(),
            })
        });
        let mut interview = started_interview(client).await;

        let err = interview.submit_answer("my answer").await.unwrap_err();

        assert!(matches!(
            err,
            InterviewError::Generate(GenerateError::Extraction { .. })
        ));
        assert_eq!(interview.session().transcript().len(), 1);
        assert_eq!(interview.session().phase(), Phase::Running);
    }

    #[tokio::test]
    async fn failed_feedback_restores_running() {
        let mut client = MockGenerationClient::new();
        client.expect_is_configured().return_const(true);
        client
            .expect_generate()
            .withf(|system, _| !system.contains("interview coach"))
            .returning(|_, _| Ok("Q?".to_string()));
        client
            .expect_generate()
            .withf(|system, _| system.contains("interview coach"))
            .returning(|_, _| {
                Err(GenerateError::Protocol {
                    status: None,
                    detail: "non-JSON response: <html>".to_string(),
                })
            });
        let mut interview = started_interview(client).await;
        interview.submit_answer("my answer").await.unwrap();
        let len_before = interview.session().transcript().len();

        assert!(interview.end().await.is_err());

        assert_eq!(interview.session().phase(), Phase::Running);
        assert_eq!(interview.session().transcript().len(), len_before);
        assert_eq!(interview.session().feedback(), None);
    }

    #[tokio::test]
    async fn operations_are_phase_guarded() {
        let mut interview = Interview::new(Arc::new(MockGenerationClient::new()));

        assert!(matches!(
            interview.submit_answer("hi").await.unwrap_err(),
            InterviewError::InvalidPhase(Phase::Setup)
        ));
        assert!(matches!(
            interview.end().await.unwrap_err(),
            InterviewError::InvalidPhase(Phase::Setup)
        ));
    }

    #[tokio::test]
    async fn reset_returns_to_a_pristine_setup() {
        let mut interview = started_interview(scripted_client("Q?", "Feedback.")).await;
        interview.submit_answer("answer").await.unwrap();
        interview.end().await.unwrap();

        interview.reset();
        let session = interview.session();

        assert_eq!(session.phase(), Phase::Setup);
        assert!(session.transcript().is_empty());
        assert_eq!(session.feedback(), None);
        assert_eq!(session.role(), "");
    }
}
