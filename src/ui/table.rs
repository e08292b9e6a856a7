use crate::binding::ChainStep;
use crate::graph::GraphStats;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Tabled)]
pub struct SegmentRow {
    #[tabled(rename = "#")]
    pub index: usize,
    #[tabled(rename = "Segment")]
    pub name: String,
    #[tabled(rename = "Classification")]
    pub classification: String,
    #[tabled(rename = "Step")]
    pub step: String,
    #[tabled(rename = "Declaration")]
    pub declaration: String,
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }
        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

/// Declaration counts per kind, then the relation totals
pub fn graph_stats_table(stats: &GraphStats) -> String {
    let mut builder = TableBuilder::new();
    for (kind, count) in &stats.by_kind {
        builder.add_row(kind.as_str(), &count.to_string());
    }
    builder.add_row("total", &stats.total_declarations.to_string());
    builder.add_row("project references", &stats.project_references.to_string());
    builder.add_row("supertype edges", &stats.supertype_edges.to_string());
    builder.build()
}

/// Bound segments of a chain; `describe` renders the declaration column
pub fn chain_table(steps: &[ChainStep], describe: impl Fn(&ChainStep) -> String) -> String {
    if steps.is_empty() {
        return String::new();
    }
    let rows: Vec<SegmentRow> = steps
        .iter()
        .enumerate()
        .map(|(index, step)| SegmentRow {
            index: index + 1,
            name: step.name.clone(),
            classification: step.classification.to_string(),
            step: step.step.to_string(),
            declaration: describe(step),
        })
        .collect();
    Table::new(&rows).with(Style::rounded()).to_string()
}
