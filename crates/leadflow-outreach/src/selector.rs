//! Message template selection.

use std::sync::atomic::{AtomicUsize, Ordering};

use leadflow_config::SelectionPolicy;
use rand::Rng;

use crate::target::InteractionTarget;

/// Sent when no templates are configured.
pub const DEFAULT_MESSAGE: &str =
    "Hi {first_name}, I came across your profile and would love to connect!";

/// Holds the active templates and picks one per interaction.
#[derive(Debug, Default)]
pub struct MessageSelector {
    templates: Vec<String>,
    policy: SelectionPolicy,
    cursor: AtomicUsize,
}

impl MessageSelector {
    pub fn new(templates: Vec<String>, policy: SelectionPolicy) -> Self {
        let mut selector = Self {
            templates: Vec::new(),
            policy,
            cursor: AtomicUsize::new(0),
        };
        selector.configure(templates);
        selector
    }

    /// Replace the template set. Blank entries are dropped.
    pub fn configure<I, S>(&mut self, templates: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.templates = templates
            .into_iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        self.cursor.store(0, Ordering::Relaxed);
    }

    pub fn set_policy(&mut self, policy: SelectionPolicy) {
        self.policy = policy;
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    pub fn templates(&self) -> &[String] {
        &self.templates
    }

    /// One of the configured templates, or [`DEFAULT_MESSAGE`].
    pub fn pick(&self) -> String {
        if self.templates.is_empty() {
            return DEFAULT_MESSAGE.to_string();
        }

        let index = match self.policy {
            SelectionPolicy::Random => rand::thread_rng().gen_range(0..self.templates.len()),
            SelectionPolicy::Sequential => {
                self.cursor.fetch_add(1, Ordering::Relaxed) % self.templates.len()
            }
        };
        self.templates[index].clone()
    }

    /// Substitute `{name}` and `{first_name}` placeholders.
    pub fn render(template: &str, target: &InteractionTarget) -> String {
        template
            .replace("{first_name}", target.first_name())
            .replace("{name}", &target.display_name)
    }

    /// Pick a template and render it for `target`.
    pub fn compose(&self, target: &InteractionTarget) -> String {
        Self::render(&self.pick(), target)
    }
}

#[cfg(test)]
#[path = "selector_tests.rs"]
mod tests;
