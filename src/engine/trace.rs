//! Query traces.
//!
//! Verbose queries ([`MessageMap::message_verbose`](crate::MessageMap::message_verbose))
//! record every dispatch decision taken on the way down the tree. The same
//! steps are emitted as `tracing` events at `TRACE` level whenever a
//! subscriber listens, so plain queries can be observed without the overhead
//! of collecting a [`Resolution`].
//!
//! The `Display` impl of [`Resolution`] renders an indented report:
//!
//! ```text
//! message: "a dog" (12µs)
//!   type store: Puppy -> Dog (InheritChain)
//!     rendered catalog:DOG with 0 arg(s)
//! ```

use super::store::LookupStrategy;
use crate::value::{ScalarKey, TypeName};
use std::fmt;
use std::time::Duration;

// --- Steps ---------------------------------------------------------------------

/// One dispatch decision. `depth` is the nesting level of the node that took it.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub depth: usize,
    pub kind: StepKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepKind {
    /// A type store found `matched` for `queried` (equal unless inherited).
    TypeHit { strategy: LookupStrategy, queried: TypeName, matched: TypeName },
    TypeMiss { strategy: LookupStrategy, queried: TypeName },
    ValueHit { key: ScalarKey },
    ValueMiss { key: ScalarKey },
    /// Guard `index` of a conditional was evaluated.
    Guard { index: usize, matched: bool },
    /// A composite fell back to its default child.
    Default { node: &'static str },
    /// An indirection extracted a sub-value of type `ty`.
    Extracted { ty: TypeName },
    /// A composite answered a type-only query with its own display.
    OwnType { ty: TypeName },
    Rendered { source: TemplateSource, args: usize },
    /// Nothing matched and no default was configured.
    Empty,
}

/// Where a message leaf took its base template from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    Catalog(String),
    Accessor,
}

impl fmt::Display for TemplateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateSource::Catalog(key) => write!(f, "catalog:{}", key),
            TemplateSource::Accessor => f.write_str("accessor"),
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepKind::TypeHit { strategy, queried, matched } if queried == matched => {
                write!(f, "type store: {} ({:?})", queried, strategy)
            }
            StepKind::TypeHit { strategy, queried, matched } => {
                write!(f, "type store: {} -> {} ({:?})", queried, matched, strategy)
            }
            StepKind::TypeMiss { strategy, queried } => write!(f, "type store: no entry for {} ({:?})", queried, strategy),
            StepKind::ValueHit { key } => write!(f, "value store: {}", key),
            StepKind::ValueMiss { key } => write!(f, "value store: no entry for {}", key),
            StepKind::Guard { index, matched } => {
                write!(f, "guard #{}: {}", index, if *matched { "matched" } else { "skipped" })
            }
            StepKind::Default { node } => write!(f, "default -> {}", node),
            StepKind::Extracted { ty } => write!(f, "extracted {}", ty),
            StepKind::OwnType { ty } => write!(f, "own display for {}", ty),
            StepKind::Rendered { source, args } => write!(f, "rendered {} with {} arg(s)", source, args),
            StepKind::Empty => f.write_str("no match"),
        }
    }
}

// --- Resolution ----------------------------------------------------------------

/// A message bundled with the path that produced it.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub message: String,
    /// Wall time of the query, lock acquisition excluded.
    pub elapsed: Duration,
    pub steps: Vec<Step>,
}

impl Resolution {
    /// The trace entries in visiting order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// True when the query fell through everywhere and produced `""`.
    pub fn is_empty(&self) -> bool {
        self.message.is_empty()
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "message: {:?} ({:?})", self.message, self.elapsed)?;
        for step in &self.steps {
            write!(f, "\n{:indent$}{}", "", step.kind, indent = step.depth * 2)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn steps_render_indented() {
        let resolution = Resolution {
            message: "a dog".to_string(),
            elapsed: Duration::from_micros(12),
            steps: vec![
                Step {
                    depth: 1,
                    kind: StepKind::TypeHit {
                        strategy: LookupStrategy::InheritChain,
                        queried: TypeName::from("Puppy"),
                        matched: TypeName::from("Dog"),
                    },
                },
                Step { depth: 2, kind: StepKind::Rendered { source: TemplateSource::Catalog("DOG".into()), args: 0 } },
            ],
        };

        assert_eq!(
            resolution.to_string(),
            "message: \"a dog\" (12µs)\n  type store: Puppy -> Dog (InheritChain)\n    rendered catalog:DOG with 0 arg(s)"
        );
    }

    #[test]
    fn guard_and_value_steps() {
        assert_eq!(StepKind::Guard { index: 1, matched: false }.to_string(), "guard #1: skipped");
        assert_eq!(StepKind::ValueMiss { key: ScalarKey::Int(3) }.to_string(), "value store: no entry for 3");
        assert_eq!(StepKind::Default { node: "message" }.to_string(), "default -> message");
    }
}
