//! Context injection
//!
//! Builds the `<intent_context>` block handed to the agent on the first
//! mutating action under a newly selected intent.
//!
//! # Overview
//!
//! The block has mandatory sections taken from the intent record itself and
//! optional sections pulled from external sources:
//!
//! - Mandatory: id, name, status, scope patterns, constraints, acceptance
//!   criteria
//! - Optional: recently touched files (`SpatialIndex`) and the tail of the
//!   shared knowledge log (`KnowledgeSource`)
//!
//! A source that fails is logged and its section omitted. The finished block
//! is cut to the session's `TokenBudget` before it is emitted.

use std::fmt::Write as _;
use std::sync::Arc;

use super::budget::TokenBudget;
use super::sources::{KnowledgeSource, SpatialIndex};
use crate::intents::Intent;

/// Default number of recent files listed
pub const DEFAULT_RECENT_FILES_LIMIT: usize = 10;

/// Default number of knowledge log lines included
pub const DEFAULT_KNOWLEDGE_TAIL_LINES: usize = 40;

/// Shared spatial index
pub type SharedSpatialIndex = Arc<dyn SpatialIndex>;

/// Shared knowledge source
pub type SharedKnowledgeSource = Arc<dyn KnowledgeSource>;

/// Assembles intent context blocks
#[derive(Clone)]
pub struct ContextInjector {
    spatial: Option<SharedSpatialIndex>,
    knowledge: Option<SharedKnowledgeSource>,
    recent_files_limit: usize,
    knowledge_tail_lines: usize,
}

impl ContextInjector {
    /// Create an injector with no optional sources
    pub fn new() -> Self {
        Self {
            spatial: None,
            knowledge: None,
            recent_files_limit: DEFAULT_RECENT_FILES_LIMIT,
            knowledge_tail_lines: DEFAULT_KNOWLEDGE_TAIL_LINES,
        }
    }

    /// Add a spatial index for the recent files section
    pub fn with_spatial_index(mut self, index: SharedSpatialIndex) -> Self {
        self.spatial = Some(index);
        self
    }

    /// Add a knowledge source for the shared knowledge section
    pub fn with_knowledge_source(mut self, source: SharedKnowledgeSource) -> Self {
        self.knowledge = Some(source);
        self
    }

    pub fn with_recent_files_limit(mut self, limit: usize) -> Self {
        self.recent_files_limit = limit;
        self
    }

    pub fn with_knowledge_tail_lines(mut self, lines: usize) -> Self {
        self.knowledge_tail_lines = lines;
        self
    }

    /// Assemble the full, unbudgeted context block for an intent
    pub fn build_context(&self, intent: &Intent) -> String {
        let mut block = String::new();
        let _ = writeln!(block, "<intent_context id=\"{}\">", intent.id);
        let _ = writeln!(block, "name: {}", intent.name);
        let _ = writeln!(block, "status: {}", intent.status);

        block.push_str("scope:\n");
        push_list(&mut block, "include", &intent.owned_scope.include);
        push_list(&mut block, "exclude", &intent.owned_scope.exclude);

        block.push_str("constraints:\n");
        push_items(&mut block, &intent.constraints);
        block.push_str("acceptance_criteria:\n");
        push_items(&mut block, &intent.acceptance_criteria);

        if let Some(files) = self.recent_files(intent) {
            block.push_str("recent_files:\n");
            push_items(&mut block, &files);
        }

        if let Some(lines) = self.knowledge_tail() {
            block.push_str("shared_knowledge:\n");
            for line in lines {
                let _ = writeln!(block, "  {}", line);
            }
        }

        block.push_str("</intent_context>");
        block
    }

    /// Build the block, cut it to the budget and charge what was emitted
    pub fn inject(&self, intent: &Intent, budget: &mut TokenBudget) -> String {
        let full = self.build_context(intent);
        let emitted = budget.truncate_to_fit(&full);
        let units = budget.charge(&emitted);

        if emitted.len() < full.len() {
            tracing::info!(
                "Context for intent {} truncated to {} units ({} requested)",
                intent.id,
                units,
                budget.estimate(&full)
            );
        } else {
            tracing::info!("Injected context for intent {} ({} units)", intent.id, units);
        }
        emitted
    }

    fn recent_files(&self, intent: &Intent) -> Option<Vec<String>> {
        let index = self.spatial.as_ref()?;
        match index.recent_files(&intent.id, self.recent_files_limit) {
            Ok(files) if files.is_empty() => None,
            Ok(files) => Some(files),
            Err(e) => {
                tracing::warn!(
                    "Omitting recent files for {}: {} failed: {}",
                    intent.id,
                    index.name(),
                    e
                );
                None
            }
        }
    }

    fn knowledge_tail(&self) -> Option<Vec<String>> {
        let source = self.knowledge.as_ref()?;
        match source.tail(self.knowledge_tail_lines) {
            Ok(lines) if lines.iter().all(|l| l.trim().is_empty()) => None,
            Ok(lines) => Some(lines),
            Err(e) => {
                tracing::warn!("Omitting shared knowledge: {} failed: {}", source.name(), e);
                None
            }
        }
    }
}

impl Default for ContextInjector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ContextInjector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextInjector")
            .field("spatial", &self.spatial.as_ref().map(|s| s.name().to_string()))
            .field("knowledge", &self.knowledge.as_ref().map(|k| k.name().to_string()))
            .field("recent_files_limit", &self.recent_files_limit)
            .field("knowledge_tail_lines", &self.knowledge_tail_lines)
            .finish()
    }
}

fn push_list(block: &mut String, label: &str, patterns: &[String]) {
    if patterns.is_empty() {
        let _ = writeln!(block, "  {}: (none)", label);
    } else {
        let _ = writeln!(block, "  {}: {}", label, patterns.join(", "));
    }
}

fn push_items(block: &mut String, items: &[String]) {
    if items.is_empty() {
        block.push_str("  (none)\n");
    }
    for item in items {
        let _ = writeln!(block, "  - {}", item);
    }
}
