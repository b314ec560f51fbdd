// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported while building a statechart.
//!
//! Only generation-time problems are recoverable. Runtime misuse (posting an unknown kind,
//! overflowing the queue, asking for the parent of an undeclared state) panics instead.

use alloc::string::String;

/// Problems found while parsing a trigger field list such as `count: u32, name: String`.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    /// A character outside identifiers, whitespace and type punctuation.
    #[error("char {index}: invalid char {ch:?}")]
    InvalidChar {
        /// Byte offset of the character in the declaration.
        index: usize,
        /// The offending character.
        ch: char,
    },
    /// A closing bracket without a matching opener.
    #[error("char {index}: closing unopened bracket {ch:?}")]
    UnopenedBracket {
        /// Byte offset of the bracket in the declaration.
        index: usize,
        /// The offending bracket.
        ch: char,
    },
    /// The declaration ended inside `<..>`, `(..)` or `[..]`.
    #[error("unterminated bracket")]
    Unterminated,
    /// A field lacks the `name: Type` shape (including empty entries from stray commas).
    #[error("field {field:?}: expected `<name>: <type>`")]
    Malformed {
        /// The offending field text, whitespace-normalized.
        field: String,
    },
    /// A field name that is not an identifier.
    #[error("field {field:?}: unexpected character {ch:?} in name")]
    InvalidName {
        /// The field name.
        field: String,
        /// The first offending character.
        ch: char,
    },
    /// The same field name appears twice.
    #[error("field {field:?} is defined twice")]
    Duplicate {
        /// The repeated name.
        field: String,
    },
}

/// Problems found while turning a statechart description into runtime tables.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// Two triggers share a name.
    #[error("trigger {0:?} defined twice")]
    DuplicateTrigger(String),
    /// A trigger's field list did not parse.
    #[error("parsing fields for trigger {trigger:?}: {source}")]
    Fields {
        /// Trigger whose declaration failed.
        trigger: String,
        /// Underlying parse error.
        #[source]
        source: FieldError,
    },
    /// Two states share a name.
    #[error("state {0:?} already exists")]
    DuplicateState(String),
    /// A state names a parent that was never declared.
    #[error("state {state:?} has nonexistent parent state {parent:?}")]
    UnknownParent {
        /// The child state.
        state: String,
        /// The missing parent.
        parent: String,
    },
    /// Following parents from this state never reaches a root.
    #[error("state {0:?} is part of a parent cycle")]
    ParentCycle(String),
    /// A declaration references a state that does not exist.
    #[error("cannot find state {0:?}")]
    UnknownState(String),
    /// A declaration references a trigger that does not exist.
    #[error("cannot find trigger {0:?}")]
    UnknownTrigger(String),
    /// A state declares two reactions for the same trigger.
    #[error("state {state:?} already reacts to trigger {trigger:?}")]
    DuplicateReaction {
        /// The state.
        state: String,
        /// The trigger.
        trigger: String,
    },
    /// A state declares two entry or two exit actions.
    #[error("state {0:?} already has an action for this phase")]
    DuplicateAction(String),
    /// No initial state was declared.
    #[error("no initial state declared")]
    MissingInitial,
    /// The chart has no states at all.
    #[error("statechart declares no states")]
    NoStates,
    /// The queue needs at least two backing slots to hold one element.
    #[error("queue capacity must be at least 2, got {0}")]
    QueueCapacity(usize),
    /// More states or trigger kinds than 32-bit ids can address.
    #[error("too many {0} for 32-bit identifiers")]
    TooLarge(&'static str),
}
