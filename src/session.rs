// src/session.rs
//
// The quiz session engine: a pure state machine with no I/O. One session
// exists per authenticated user; the HTTP handlers in `handlers::quiz` are
// thin adapters over the operations here.

use std::fmt;

use serde::Serialize;

use crate::catalog::{Catalog, Difficulty, Question, Subject};
use crate::config::OPTIONS_PER_QUESTION;

/// Lifecycle of one quiz session.
///
/// `SelectingSubject -> SelectingDifficulty -> Active -> Completed`, with
/// `reset()` returning to the start (or to `SelectingDifficulty` when the
/// session was created with a pinned subject).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    SelectingSubject,
    SelectingDifficulty,
    Active,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// The current phase does not allow choosing a subject.
    SubjectNotSelectable,
    /// The current phase does not allow choosing a difficulty.
    DifficultyNotSelectable,
    /// `start` was called before both subject and difficulty were chosen.
    SelectionMissing,
    /// The chosen subject/difficulty pair has no questions in the catalog.
    NoQuestions,
    /// `start` requires a resolved user identity; the caller must run
    /// identity resolution and retry.
    IdentityRequired,
    /// The operation only applies to an active attempt.
    NotActive,
    /// The submitted option index is outside the valid range.
    InvalidOption(usize),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::SubjectNotSelectable => write!(f, "Subject cannot be selected right now"),
            SessionError::DifficultyNotSelectable => {
                write!(f, "Difficulty cannot be selected right now")
            }
            SessionError::SelectionMissing => {
                write!(f, "Select a subject and difficulty before starting")
            }
            SessionError::NoQuestions => {
                write!(f, "No questions are available for this selection")
            }
            SessionError::IdentityRequired => write!(f, "Log in before starting a quiz"),
            SessionError::NotActive => write!(f, "No quiz is in progress"),
            SessionError::InvalidOption(i) => write!(
                f,
                "Option index {} is out of range (0..{})",
                i, OPTIONS_PER_QUESTION
            ),
        }
    }
}

impl std::error::Error for SessionError {}

/// The transient, in-memory record of one pass through a question list.
/// Discarded once finalized into a `FinishedAttempt`; never persisted itself.
#[derive(Debug, Clone)]
pub struct QuizAttempt {
    subject: Subject,
    difficulty: Difficulty,
    user_id: i64,
    questions: Vec<Question>,
    answers: Vec<Option<usize>>,
    current_index: usize,
}

impl QuizAttempt {
    pub fn subject(&self) -> Subject {
        self.subject
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn answers(&self) -> &[Option<usize>] {
        &self.answers
    }

    /// Index of the question awaiting an answer. Equals `total_questions`
    /// exactly when the attempt is complete.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn is_complete(&self) -> bool {
        self.current_index == self.questions.len()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    fn score(&self) -> i32 {
        self.questions
            .iter()
            .zip(&self.answers)
            .filter(|(q, a)| **a == Some(q.correct_option))
            .count() as i32
    }
}

/// The completed-attempt record handed off to the results store exactly once
/// per attempt, when the last answer is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinishedAttempt {
    pub user_id: i64,
    pub subject: Subject,
    pub difficulty: Difficulty,
    pub score: i32,
    pub total_questions: i32,
    pub percentage: i32,
}

/// Feedback returned for every submitted answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerFeedback {
    pub question_index: usize,
    pub selected_option: usize,
    pub correct: bool,
    pub correct_option: usize,
    pub explanation: String,
    /// Present exactly once: on the submission that completes the attempt.
    pub finished: Option<FinishedAttempt>,
}

/// Integer percentage, rounded half away from zero. `7/10 -> 70`, `1/3 -> 33`.
pub fn percentage(score: i32, total: i32) -> i32 {
    if total == 0 {
        return 0;
    }
    (score as f64 / total as f64 * 100.0).round() as i32
}

#[derive(Debug, Clone)]
pub struct QuizSession {
    phase: Phase,
    /// Set when the session was entered via a subject-specific shortcut;
    /// survives `reset()`.
    pinned: Option<Subject>,
    subject: Option<Subject>,
    difficulty: Option<Difficulty>,
    attempt: Option<QuizAttempt>,
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizSession {
    pub fn new() -> Self {
        QuizSession {
            phase: Phase::SelectingSubject,
            pinned: None,
            subject: None,
            difficulty: None,
            attempt: None,
        }
    }

    /// A session entered through a subject shortcut: the subject is fixed for
    /// the session's lifetime and resets return to difficulty selection.
    pub fn pinned(subject: Subject) -> Self {
        QuizSession {
            phase: Phase::SelectingDifficulty,
            pinned: Some(subject),
            subject: Some(subject),
            difficulty: None,
            attempt: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn subject(&self) -> Option<Subject> {
        self.subject
    }

    pub fn difficulty(&self) -> Option<Difficulty> {
        self.difficulty
    }

    pub fn attempt(&self) -> Option<&QuizAttempt> {
        self.attempt.as_ref()
    }

    pub fn select_subject(&mut self, subject: Subject) -> Result<(), SessionError> {
        if self.phase != Phase::SelectingSubject {
            return Err(SessionError::SubjectNotSelectable);
        }
        self.subject = Some(subject);
        self.difficulty = None;
        self.phase = Phase::SelectingDifficulty;
        Ok(())
    }

    /// Records the difficulty choice. The quiz does not start yet; `start`
    /// performs the identity-gated transition into `Active`.
    pub fn select_difficulty(
        &mut self,
        catalog: &Catalog,
        difficulty: Difficulty,
    ) -> Result<(), SessionError> {
        if self.phase != Phase::SelectingDifficulty {
            return Err(SessionError::DifficultyNotSelectable);
        }
        let subject = self.subject.ok_or(SessionError::SelectionMissing)?;
        if !catalog.has_questions(subject, difficulty) {
            return Err(SessionError::NoQuestions);
        }
        self.difficulty = Some(difficulty);
        Ok(())
    }

    /// Begins the attempt. Without a resolved identity this fails with
    /// `IdentityRequired` and leaves the selection intact, so the caller can
    /// resolve identity and call `start` again to proceed.
    pub fn start(&mut self, catalog: &Catalog, user_id: Option<i64>) -> Result<(), SessionError> {
        if self.phase != Phase::SelectingDifficulty {
            return Err(SessionError::DifficultyNotSelectable);
        }
        let (subject, difficulty) = match (self.subject, self.difficulty) {
            (Some(s), Some(d)) => (s, d),
            _ => return Err(SessionError::SelectionMissing),
        };
        let user_id = user_id.ok_or(SessionError::IdentityRequired)?;

        let questions = catalog.questions(subject, difficulty).to_vec();
        if questions.is_empty() {
            return Err(SessionError::NoQuestions);
        }

        let total = questions.len();
        self.attempt = Some(QuizAttempt {
            subject,
            difficulty,
            user_id,
            questions,
            answers: vec![None; total],
            current_index: 0,
        });
        self.phase = Phase::Active;
        Ok(())
    }

    /// Records the answer for the current question and advances. On the last
    /// question the attempt finalizes: the feedback carries the
    /// `FinishedAttempt` handoff record and the session moves to `Completed`.
    pub fn submit_answer(&mut self, option_index: usize) -> Result<AnswerFeedback, SessionError> {
        if self.phase != Phase::Active {
            return Err(SessionError::NotActive);
        }
        if option_index >= OPTIONS_PER_QUESTION {
            return Err(SessionError::InvalidOption(option_index));
        }
        let attempt = self.attempt.as_mut().ok_or(SessionError::NotActive)?;

        let index = attempt.current_index;
        attempt.answers[index] = Some(option_index);

        let question = &attempt.questions[index];
        let correct = option_index == question.correct_option;
        let correct_option = question.correct_option;
        let explanation = question.explanation.clone();

        let last = index + 1 == attempt.questions.len();
        let finished = if last {
            attempt.current_index = attempt.questions.len();
            self.phase = Phase::Completed;
            let score = attempt.score();
            let total = attempt.questions.len() as i32;
            Some(FinishedAttempt {
                user_id: attempt.user_id,
                subject: attempt.subject,
                difficulty: attempt.difficulty,
                score,
                total_questions: total,
                percentage: percentage(score, total),
            })
        } else {
            attempt.current_index = index + 1;
            None
        };

        Ok(AnswerFeedback {
            question_index: index,
            selected_option: option_index,
            correct,
            correct_option,
            explanation,
            finished,
        })
    }

    /// Discards any in-progress attempt and returns to the initial state.
    /// A pinned session keeps its subject and lands on difficulty selection.
    pub fn reset(&mut self) {
        self.difficulty = None;
        self.attempt = None;
        match self.pinned {
            Some(subject) => {
                self.subject = Some(subject);
                self.phase = Phase::SelectingDifficulty;
            }
            None => {
                self.subject = None;
                self.phase = Phase::SelectingSubject;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a catalog with `n` easy questions for VU23213 where question
    /// `i`'s correct option is `i % 4`.
    fn catalog_with(n: usize) -> Catalog {
        let questions: Vec<serde_json::Value> = (0..n)
            .map(|i| {
                serde_json::json!({
                    "text": format!("Question {}", i + 1),
                    "options": ["a", "b", "c", "d"],
                    "correct_option": i % 4,
                    "explanation": "see the study guide"
                })
            })
            .collect();
        let raw = serde_json::json!({ "VU23213": { "easy": questions } });
        Catalog::from_json(&raw.to_string()).unwrap()
    }

    fn started_session(catalog: &Catalog) -> QuizSession {
        let mut session = QuizSession::new();
        session.select_subject(Subject::Vu23213).unwrap();
        session
            .select_difficulty(catalog, Difficulty::Easy)
            .unwrap();
        session.start(catalog, Some(1)).unwrap();
        session
    }

    #[test]
    fn all_correct_answers_score_full_marks() {
        let catalog = catalog_with(4);
        let mut session = started_session(&catalog);

        let mut finished = None;
        for i in 0..4 {
            let feedback = session.submit_answer(i % 4).unwrap();
            assert!(feedback.correct);
            if let Some(f) = feedback.finished {
                finished = Some(f);
            }
        }

        let finished = finished.expect("last answer must finalize the attempt");
        assert_eq!(finished.score, 4);
        assert_eq!(finished.total_questions, 4);
        assert_eq!(finished.percentage, 100);
        assert_eq!(session.phase(), Phase::Completed);
    }

    #[test]
    fn alternating_answers_score_half() {
        // Ten questions; questions 1,3,5,7,9 answered correctly, the rest
        // deliberately wrong.
        let catalog = catalog_with(10);
        let mut session = started_session(&catalog);

        let mut handoffs = Vec::new();
        for i in 0..10 {
            let correct = i % 4;
            let selected = if i % 2 == 0 { correct } else { (correct + 1) % 4 };
            let feedback = session.submit_answer(selected).unwrap();
            assert_eq!(feedback.correct, i % 2 == 0);
            if let Some(f) = feedback.finished {
                handoffs.push(f);
            }
        }

        // Exactly one handoff record per attempt.
        assert_eq!(handoffs.len(), 1);
        assert_eq!(handoffs[0].score, 5);
        assert_eq!(handoffs[0].total_questions, 10);
        assert_eq!(handoffs[0].percentage, 50);
        assert_eq!(handoffs[0].user_id, 1);
        assert_eq!(handoffs[0].subject, Subject::Vu23213);
    }

    #[test]
    fn percentage_rounds_to_nearest_integer() {
        assert_eq!(percentage(7, 10), 70);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(0, 5), 0);
        assert_eq!(percentage(5, 5), 100);
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn start_without_identity_is_suspended_then_resumable() {
        let catalog = catalog_with(3);
        let mut session = QuizSession::new();
        session.select_subject(Subject::Vu23213).unwrap();
        session
            .select_difficulty(&catalog, Difficulty::Easy)
            .unwrap();

        assert_eq!(
            session.start(&catalog, None),
            Err(SessionError::IdentityRequired)
        );
        // Selection survives the suspension; a retry with identity proceeds.
        assert_eq!(session.phase(), Phase::SelectingDifficulty);
        assert_eq!(session.difficulty(), Some(Difficulty::Easy));
        session.start(&catalog, Some(42)).unwrap();
        assert_eq!(session.phase(), Phase::Active);
    }

    #[test]
    fn current_index_is_monotonic_and_bounded() {
        let catalog = catalog_with(5);
        let mut session = started_session(&catalog);

        let mut previous = 0;
        for _ in 0..5 {
            session.submit_answer(0).unwrap();
            let index = session.attempt().unwrap().current_index();
            assert!(index >= previous);
            assert!(index <= 5);
            previous = index;
        }
        assert!(session.attempt().unwrap().is_complete());
    }

    #[test]
    fn recorded_answer_matches_submission() {
        let catalog = catalog_with(3);
        let mut session = started_session(&catalog);

        let feedback = session.submit_answer(2).unwrap();
        assert_eq!(feedback.selected_option, 2);
        assert_eq!(session.attempt().unwrap().answers()[0], Some(2));
    }

    #[test]
    fn submit_after_completion_is_rejected() {
        let catalog = catalog_with(2);
        let mut session = started_session(&catalog);
        session.submit_answer(0).unwrap();
        session.submit_answer(0).unwrap();

        assert_eq!(session.submit_answer(0), Err(SessionError::NotActive));
        assert_eq!(session.phase(), Phase::Completed);
    }

    #[test]
    fn out_of_range_option_leaves_state_untouched() {
        let catalog = catalog_with(3);
        let mut session = started_session(&catalog);

        assert_eq!(session.submit_answer(4), Err(SessionError::InvalidOption(4)));
        let attempt = session.attempt().unwrap();
        assert_eq!(attempt.current_index(), 0);
        assert_eq!(attempt.answers()[0], None);
    }

    #[test]
    fn empty_pair_blocks_difficulty_selection() {
        let catalog = catalog_with(3);
        let mut session = QuizSession::new();
        session.select_subject(Subject::Vu23213).unwrap();

        assert_eq!(
            session.select_difficulty(&catalog, Difficulty::Hard),
            Err(SessionError::NoQuestions)
        );
        assert_eq!(session.difficulty(), None);
    }

    #[test]
    fn reset_returns_to_subject_selection() {
        let catalog = catalog_with(3);
        let mut session = started_session(&catalog);
        session.submit_answer(0).unwrap();

        session.reset();
        assert_eq!(session.phase(), Phase::SelectingSubject);
        assert_eq!(session.subject(), None);
        assert_eq!(session.difficulty(), None);
        assert!(session.attempt().is_none());
    }

    #[test]
    fn pinned_session_keeps_subject_across_resets() {
        let catalog = catalog_with(3);
        let mut session = QuizSession::pinned(Subject::Vu23213);
        assert_eq!(session.phase(), Phase::SelectingDifficulty);

        session
            .select_difficulty(&catalog, Difficulty::Easy)
            .unwrap();
        session.start(&catalog, Some(7)).unwrap();
        session.reset();

        assert_eq!(session.phase(), Phase::SelectingDifficulty);
        assert_eq!(session.subject(), Some(Subject::Vu23213));
        assert_eq!(session.difficulty(), None);
    }

    #[test]
    fn selecting_subject_mid_attempt_is_rejected() {
        let catalog = catalog_with(3);
        let mut session = started_session(&catalog);

        assert_eq!(
            session.select_subject(Subject::Vu23215),
            Err(SessionError::SubjectNotSelectable)
        );
    }

    #[test]
    fn abandoned_attempt_produces_no_handoff() {
        let catalog = catalog_with(3);
        let mut session = started_session(&catalog);
        session.submit_answer(0).unwrap();
        session.submit_answer(1).unwrap();

        // Reset before the last question: the attempt is discarded and no
        // FinishedAttempt was ever produced.
        session.reset();
        assert!(session.attempt().is_none());
    }
}
