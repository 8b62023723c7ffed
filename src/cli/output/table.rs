//! Table output formatting for CLI commands
//!
//! Renders suggestions and knowledge hits with comfy-table. Colors are
//! dropped when `NO_COLOR` is set or the terminal is dumb.

use crate::domain::models::{ExpectedImpact, KnowledgeHit, Suggestion};
use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::env;

use super::truncate;

/// Table formatter for CLI output
pub struct TableFormatter {
    use_colors: bool,
    max_width: Option<usize>,
}

impl TableFormatter {
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    pub fn with_config(use_colors: bool, max_width: Option<usize>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    /// Format persisted suggestions, in the order given.
    pub fn format_suggestions(&self, suggestions: &[Suggestion]) -> String {
        let mut table = self.create_base_table();

        table.set_header(vec![
            Cell::new("#").add_attribute(Attribute::Bold),
            Cell::new("Title").add_attribute(Attribute::Bold),
            Cell::new("Category").add_attribute(Attribute::Bold),
            Cell::new("Impact").add_attribute(Attribute::Bold),
            Cell::new("Action").add_attribute(Attribute::Bold),
        ]);

        for suggestion in suggestions {
            let impact = suggestion.expected_impact.as_str();
            let impact_cell = if self.use_colors {
                Cell::new(impact).fg(impact_color(suggestion.expected_impact))
            } else {
                Cell::new(impact)
            };

            table.add_row(vec![
                Cell::new(suggestion.priority),
                Cell::new(truncate(&suggestion.title, 50)),
                Cell::new(suggestion.category.as_str()),
                impact_cell,
                Cell::new(truncate(&suggestion.recommended_action, 60)),
            ]);
        }

        table.to_string()
    }

    /// Format knowledge retrieval results.
    pub fn format_knowledge_hits(&self, hits: &[KnowledgeHit]) -> String {
        let mut table = self.create_base_table();

        table.set_header(vec![
            Cell::new("Title").add_attribute(Attribute::Bold),
            Cell::new("Category").add_attribute(Attribute::Bold),
            Cell::new("Niche").add_attribute(Attribute::Bold),
            Cell::new("Relevance").add_attribute(Attribute::Bold),
        ]);

        for hit in hits {
            let niche = match &hit.subcategory {
                Some(sub) => format!("{}/{}", hit.niche, sub),
                None => hit.niche.clone(),
            };
            let relevance = format!("{:.2}", hit.relevance);
            let relevance_cell = if self.use_colors && hit.relevance >= 0.8 {
                Cell::new(relevance).fg(Color::Green)
            } else {
                Cell::new(relevance)
            };

            table.add_row(vec![
                Cell::new(truncate(&hit.title, 50)),
                Cell::new(hit.category.as_str()),
                Cell::new(niche),
                relevance_cell,
            ]);
        }

        table.to_string()
    }

    fn create_base_table(&self) -> Table {
        let mut table = Table::new();

        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        if let Some(width) = self.max_width {
            table.set_width(width as u16);
        }

        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn supports_color() -> bool {
    if env::var("NO_COLOR").is_ok() {
        return false;
    }

    if let Ok(term) = env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    true
}

fn impact_color(impact: ExpectedImpact) -> Color {
    match impact {
        ExpectedImpact::High => Color::Red,
        ExpectedImpact::Medium => Color::Yellow,
        ExpectedImpact::Low => Color::Grey,
    }
}
