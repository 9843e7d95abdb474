//! Composable validation
//!
//! A validator is a pure function from a context to a [`ValidationResult`].
//! Results are immutable values combined with [`ValidationResult::merge`];
//! nothing is threaded through by mutable reference.
//!
//! [`ValidationChain`] makes the evaluation discipline explicit per rule:
//!
//! - [`Discipline::Accumulate`]: always evaluate, keep every error
//! - [`Discipline::FailFast`]: if this rule reports errors, later rules are
//!   not evaluated

use serde::Serialize;
use std::fmt;

/// Outcome of one or more validation rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult<E> {
    errors: Vec<E>,
}

impl<E> ValidationResult<E> {
    /// No errors
    pub fn valid() -> Self {
        Self { errors: Vec::new() }
    }

    /// Exactly one error
    pub fn single(error: E) -> Self {
        Self {
            errors: vec![error],
        }
    }

    /// Errors in evaluation order
    pub fn from_errors(errors: Vec<E>) -> Self {
        Self { errors }
    }

    /// One error if `failed`, otherwise valid
    pub fn check(failed: bool, error: impl FnOnce() -> E) -> Self {
        if failed {
            Self::single(error())
        } else {
            Self::valid()
        }
    }

    /// True when no rule reported an error
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors in evaluation order
    pub fn errors(&self) -> &[E] {
        &self.errors
    }

    /// Take the errors
    pub fn into_errors(self) -> Vec<E> {
        self.errors
    }

    /// Concatenate `other`'s errors after this result's errors
    pub fn merge(mut self, other: Self) -> Self {
        self.errors.extend(other.errors);
        self
    }

    /// `Ok(())` when valid, otherwise every error
    pub fn into_result(self) -> Result<(), Vec<E>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

impl<E> Default for ValidationResult<E> {
    fn default() -> Self {
        Self::valid()
    }
}

impl<E> Extend<ValidationResult<E>> for ValidationResult<E> {
    fn extend<I: IntoIterator<Item = ValidationResult<E>>>(&mut self, iter: I) {
        for result in iter {
            self.errors.extend(result.errors);
        }
    }
}

impl<E> FromIterator<ValidationResult<E>> for ValidationResult<E> {
    fn from_iter<I: IntoIterator<Item = ValidationResult<E>>>(iter: I) -> Self {
        let mut merged = Self::valid();
        merged.extend(iter);
        merged
    }
}

/// A validation rule over context `C`
pub trait Validator<C: ?Sized, E> {
    /// Evaluate against `context`
    fn validate(&self, context: &C) -> ValidationResult<E>;
}

impl<C: ?Sized, E, F> Validator<C, E> for F
where
    F: Fn(&C) -> ValidationResult<E>,
{
    fn validate(&self, context: &C) -> ValidationResult<E> {
        self(context)
    }
}

/// How a rule's failure affects the rules after it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discipline {
    /// Keep evaluating
    Accumulate,
    /// Stop if this rule reported errors
    FailFast,
}

struct Rule<'a, C: ?Sized, E> {
    name: &'static str,
    discipline: Discipline,
    validator: Box<dyn Validator<C, E> + Send + Sync + 'a>,
}

/// Ordered rules, each with its own [`Discipline`]
pub struct ValidationChain<'a, C: ?Sized, E> {
    rules: Vec<Rule<'a, C, E>>,
}

impl<'a, C: ?Sized, E> ValidationChain<'a, C, E> {
    /// Empty chain (always valid)
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule whose errors never stop the chain
    pub fn accumulate<V>(self, name: &'static str, validator: V) -> Self
    where
        V: Validator<C, E> + Send + Sync + 'a,
    {
        self.rule(name, Discipline::Accumulate, validator)
    }

    /// Append a rule whose errors end the chain
    pub fn fail_fast<V>(self, name: &'static str, validator: V) -> Self
    where
        V: Validator<C, E> + Send + Sync + 'a,
    {
        self.rule(name, Discipline::FailFast, validator)
    }

    /// Append a rule with an explicit discipline
    pub fn rule<V>(mut self, name: &'static str, discipline: Discipline, validator: V) -> Self
    where
        V: Validator<C, E> + Send + Sync + 'a,
    {
        self.rules.push(Rule {
            name,
            discipline,
            validator: Box::new(validator),
        });
        self
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// No rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<'a, C: ?Sized, E> Default for ValidationChain<'a, C, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, C: ?Sized, E> Validator<C, E> for ValidationChain<'a, C, E> {
    fn validate(&self, context: &C) -> ValidationResult<E> {
        let mut result = ValidationResult::valid();

        for rule in &self.rules {
            let outcome = rule.validator.validate(context);
            let stop = rule.discipline == Discipline::FailFast && !outcome.is_valid();
            result = result.merge(outcome);

            if stop {
                tracing::debug!(rule = rule.name, "Fail-fast rule failed, skipping remaining rules");
                break;
            }
        }

        result
    }
}

impl<'a, C: ?Sized, E> fmt::Debug for ValidationChain<'a, C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|r| (r.name, r.discipline)))
            .finish()
    }
}
