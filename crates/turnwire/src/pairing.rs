//! Call/result pairing.
//!
//! Function results carry no call id; a result answers a pending call by
//! function name, oldest first. Consecutive calls before any result therefore
//! pair in the order they were made.

use std::collections::VecDeque;

use log::debug;
use turnwire_common::{Message, MessageRole};

use crate::diagnostics::Warning;

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingCall {
    index: usize,
    name: String,
}

/// Tracks unanswered function calls across a sequence of messages.
#[derive(Debug, Default)]
pub struct PairingTracker {
    pending: VecDeque<PendingCall>,
    seen_turn: bool,
    warnings: Vec<Warning>,
}

impl PairingTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds the message at `index`.
    ///
    /// A result for a name with no pending call consumes the oldest pending
    /// call and is reported as mismatched. A result with nothing pending is
    /// kept unattributed and reported as unpaired.
    pub fn observe(&mut self, index: usize, message: &Message) {
        match message.role {
            MessageRole::System => {
                if self.seen_turn {
                    self.report(Warning::MisplacedSystemMessage { index });
                }
            }
            MessageRole::User => self.seen_turn = true,
            MessageRole::Assistant => {
                self.seen_turn = true;
                if let Some(call) = &message.function_call {
                    self.pending.push_back(PendingCall {
                        index,
                        name: call.name.clone(),
                    });
                }
            }
            MessageRole::Function => {
                self.seen_turn = true;
                let name = message.name.as_deref().unwrap_or_default();
                if let Some(pos) = self.pending.iter().position(|c| c.name == name) {
                    self.pending.remove(pos);
                } else if let Some(oldest) = self.pending.pop_front() {
                    self.report(Warning::MismatchedFunctionName {
                        index,
                        expected: oldest.name,
                        found: name.to_string(),
                    });
                } else {
                    self.report(Warning::UnpairedFunctionResult {
                        index,
                        name: name.to_string(),
                    });
                }
            }
        }
    }

    /// Names of the calls still waiting for a result, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &str> {
        self.pending.iter().map(|c| c.name.as_str())
    }

    /// Warnings gathered so far.
    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Consumes the tracker, returning its warnings.
    ///
    /// Pending calls are not reported: a transcript still being generated
    /// legitimately ends with an open call.
    #[must_use]
    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }

    /// Consumes the tracker for a finished conversation, reporting every
    /// call that never received a result.
    #[must_use]
    pub fn finish(mut self) -> Vec<Warning> {
        let unanswered: Vec<PendingCall> = self.pending.drain(..).collect();
        for call in unanswered {
            self.report(Warning::UnansweredFunctionCall {
                index: call.index,
                name: call.name,
            });
        }
        self.warnings
    }

    fn report(&mut self, warning: Warning) {
        debug!("Pairing: {warning}");
        self.warnings.push(warning);
    }
}

/// Checks the structure of a finished conversation.
///
/// Reports misplaced system messages, mismatched or unpaired function
/// results, and unanswered calls. Findings are only logged at debug level;
/// presenting them is up to the caller.
#[must_use]
pub fn validate(messages: &[Message]) -> Vec<Warning> {
    let mut tracker = PairingTracker::new();
    for (index, message) in messages.iter().enumerate() {
        tracker.observe(index, message);
    }
    tracker.finish()
}
