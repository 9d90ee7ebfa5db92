//! The end-of-interval decision contract.
//!
//! How a host asks the user (dialog, terminal line, remote call) is its own
//! business. The controller only relies on getting exactly one choice back
//! per call, synchronously.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::timer::IntervalKind;

/// Answer to "a Work interval just finished".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkChoice {
    /// Log the interval and take a short rest.
    Rest,
    /// Log the interval and start another Work interval.
    NewWork,
    /// Discard the interval and start Work again. Also the answer when
    /// none was given, so nothing is logged without consent.
    #[default]
    RestartWork,
}

/// Answer to "a rest interval just finished".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestChoice {
    #[default]
    StartWork,
    /// Run the same rest kind again.
    RestartRest,
}

/// Whichever choice the completion protocol received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "after", content = "choice", rename_all = "snake_case")]
pub enum Decision {
    Work(WorkChoice),
    Rest(RestChoice),
}

/// Synchronous collaborator consulted when an interval completes.
pub trait CompletionPrompt {
    fn ask_work_completion(&mut self) -> WorkChoice;

    /// `finished` is the rest kind that just ran out.
    fn ask_rest_completion(&mut self, finished: IntervalKind) -> RestChoice;
}

impl<P: CompletionPrompt + ?Sized> CompletionPrompt for &mut P {
    fn ask_work_completion(&mut self) -> WorkChoice {
        (**self).ask_work_completion()
    }

    fn ask_rest_completion(&mut self, finished: IntervalKind) -> RestChoice {
        (**self).ask_rest_completion(finished)
    }
}

impl WorkChoice {
    pub const ALL: [WorkChoice; 3] = [Self::Rest, Self::NewWork, Self::RestartWork];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rest => "rest",
            Self::NewWork => "new-work",
            Self::RestartWork => "restart-work",
        }
    }

    /// Whether this choice logs the finished interval.
    pub fn records(self) -> bool {
        !matches!(self, Self::RestartWork)
    }
}

impl RestChoice {
    pub const ALL: [RestChoice; 2] = [Self::StartWork, Self::RestartRest];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::StartWork => "start-work",
            Self::RestartRest => "restart-rest",
        }
    }
}

impl fmt::Display for WorkChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for RestChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_ascii_lowercase().replace('_', "-")
}

impl FromStr for WorkChoice {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| CoreError::InvalidTransition(s.to_string()))
    }
}

impl FromStr for RestChoice {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| CoreError::InvalidTransition(s.to_string()))
    }
}

/// Answers prompts from a preset queue.
///
/// When the queue runs dry, or holds an answer of the wrong kind, the
/// default choice is returned and a warning is logged. Every call still gets
/// exactly one answer.
#[derive(Debug, Default, Clone)]
pub struct ScriptedPrompt {
    answers: VecDeque<Decision>,
    asked: Vec<Decision>,
}

impl ScriptedPrompt {
    pub fn new(answers: impl IntoIterator<Item = Decision>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    pub fn push(&mut self, answer: Decision) {
        self.answers.push_back(answer);
    }

    /// Answers handed out so far, in order.
    pub fn asked(&self) -> &[Decision] {
        &self.asked
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl CompletionPrompt for ScriptedPrompt {
    fn ask_work_completion(&mut self) -> WorkChoice {
        let choice = match self.answers.pop_front() {
            Some(Decision::Work(choice)) => choice,
            other => {
                tracing::warn!(?other, "scripted prompt has no work answer, using default");
                WorkChoice::default()
            }
        };
        self.asked.push(Decision::Work(choice));
        choice
    }

    fn ask_rest_completion(&mut self, finished: IntervalKind) -> RestChoice {
        let choice = match self.answers.pop_front() {
            Some(Decision::Rest(choice)) => choice,
            other => {
                tracing::warn!(?other, %finished, "scripted prompt has no rest answer, using default");
                RestChoice::default()
            }
        };
        self.asked.push(Decision::Rest(choice));
        choice
    }
}
