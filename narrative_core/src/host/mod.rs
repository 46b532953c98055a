//! Host collaborators - the rendering system and the argument evaluator.
//!
//! The engine only knows these through the traits below. A host embeds its own
//! output system and expression language by implementing them.

use narrative_state::{Delta, DeltaValue};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

use crate::error::ProviderResult;

/// The host's output system.
pub trait Renderer {
    /// Show revealed text to the user.
    fn render(&mut self, text: &str) -> ProviderResult;

    /// Show a diagnostic for a failed visitation. Renders it as text by default.
    fn report(&mut self, diagnostic: &str) -> ProviderResult {
        self.render(diagnostic)
    }
}

/// The host's expression evaluator for per-leaf argument literals.
pub trait ArgumentEvaluator {
    /// Turn a raw argument expression into a delta, or explain why it cannot be.
    fn evaluate(&self, raw: &str) -> Result<Delta, String>;
}

/// Evaluates leaf arguments as JSON objects.
///
/// Each member becomes a delta entry keyed by provider id. A `null` member is
/// read as a clear for that provider. Blank input is an empty delta.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonArgumentEvaluator;

impl ArgumentEvaluator for JsonArgumentEvaluator {
    fn evaluate(&self, raw: &str) -> Result<Delta, String> {
        if raw.trim().is_empty() {
            return Ok(Delta::new());
        }

        let parsed: Value = serde_json::from_str(raw).map_err(|e| e.to_string())?;
        let members = match parsed {
            Value::Object(members) => members,
            other => return Err(format!("expected an object, found {}", json_kind(&other))),
        };

        Ok(members
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::Null => DeltaValue::Clear,
                    other => DeltaValue::Update(other),
                };
                (key, value)
            })
            .collect())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A renderer that records everything it is asked to show.
///
/// Clones share the same record, so a host can hand one clone to the engine and
/// read the output through another.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    rendered: Rc<RefCell<Vec<String>>>,
    reports: Rc<RefCell<Vec<String>>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything rendered so far, oldest first.
    pub fn rendered(&self) -> Vec<String> {
        self.rendered.borrow().clone()
    }

    /// The most recent render.
    pub fn last(&self) -> Option<String> {
        self.rendered.borrow().last().cloned()
    }

    /// Diagnostics reported so far.
    pub fn reports(&self) -> Vec<String> {
        self.reports.borrow().clone()
    }

    pub fn render_count(&self) -> usize {
        self.rendered.borrow().len()
    }
}

impl Renderer for Transcript {
    fn render(&mut self, text: &str) -> ProviderResult {
        self.rendered.borrow_mut().push(text.to_string());
        Ok(())
    }

    fn report(&mut self, diagnostic: &str) -> ProviderResult {
        self.reports.borrow_mut().push(diagnostic.to_string());
        Ok(())
    }
}

/// A renderer that discards output. Useful when only side channels matter.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _text: &str) -> ProviderResult {
        Ok(())
    }
}
