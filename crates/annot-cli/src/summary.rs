use std::fmt::Write as _;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use annot_core::ImportPlan;
use annot_map::MappingOrigin;
use annot_model::{ImportOutcome, ImportStatus};
use annot_schemas::SchemaRegistry;

pub fn print_outcome(outcome: &ImportOutcome, limit: usize) {
    println!("Container: {}", outcome.container_id);
    println!("{}", outcome_table(outcome));
    let errors = issue_lines("Errors", &outcome.errors, outcome.error_count, limit);
    if !errors.is_empty() {
        eprint!("{errors}");
    }
    let warnings = issue_lines("Warnings", &outcome.warnings, outcome.warning_count, limit);
    if !warnings.is_empty() {
        eprint!("{warnings}");
    }
}

pub fn outcome_table(outcome: &ImportOutcome) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Status"),
        header_cell("Total rows"),
        header_cell("Processed"),
        header_cell("Errors"),
        header_cell("Warnings"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 1..5 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    table.add_row(vec![
        status_cell(outcome.status),
        Cell::new(outcome.total_rows),
        Cell::new(outcome.processed_rows),
        count_cell(outcome.error_count, Color::Red),
        count_cell(outcome.warning_count, Color::Yellow),
    ]);
    table
}

/// Issue list capped at `limit` entries, with a tail line for the rest.
///
/// Empty when there are no issues.
pub fn issue_lines(title: &str, issues: &[String], total: usize, limit: usize) -> String {
    let mut out = String::new();
    if total == 0 {
        return out;
    }
    let _ = writeln!(out, "{title} ({total}):");
    for issue in issues.iter().take(limit) {
        let _ = writeln!(out, "- {issue}");
    }
    let shown = issues.len().min(limit);
    if total > shown {
        let _ = writeln!(out, "... and {} more", total - shown);
    }
    out
}

pub fn print_plan(plan: &ImportPlan) {
    println!(
        "Columns: {} | Rows: {} | Malformed rows: {}",
        plan.columns.len(),
        plan.total_rows,
        plan.malformed_rows
    );
    if let Some(column) = &plan.thread_column {
        println!("Thread annotations from column '{column}'");
    }
    println!("{}", plan_table(plan));
    if !plan.mapping.unmapped_columns.is_empty() {
        println!("Unmapped columns: {}", plan.mapping.unmapped_columns.join(", "));
    }
    for warning in &plan.warnings {
        eprintln!("warning: {warning}");
    }
}

pub fn plan_table(plan: &ImportPlan) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Target"),
        header_cell("Source"),
        header_cell("Origin"),
        header_cell("Default"),
        header_cell("Transform"),
    ]);
    apply_table_style(&mut table);
    for mapping in plan.mapping.iter() {
        let origin = plan
            .mapping
            .origin(&mapping.target_field)
            .map_or("declared", MappingOrigin::as_str);
        table.add_row(vec![
            Cell::new(&mapping.target_field).add_attribute(Attribute::Bold),
            Cell::new(&mapping.source_field),
            Cell::new(origin),
            optional_cell(mapping.default_value.as_ref().map(ToString::to_string)),
            optional_cell(mapping.transform.clone()),
        ]);
    }
    table
}

pub fn schemas_table(registry: &SchemaRegistry) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Item type"),
        header_cell("Field"),
        header_cell("Type"),
        header_cell("Required"),
        header_cell("Strict"),
    ]);
    apply_table_style(&mut table);
    for schema in registry.item_types() {
        if schema.fields.is_empty() {
            table.add_row(vec![
                Cell::new(&schema.name).fg(Color::Blue),
                dim_cell("-"),
                dim_cell("-"),
                dim_cell("-"),
                dim_cell("-"),
            ]);
            continue;
        }
        for field in &schema.fields {
            table.add_row(vec![
                Cell::new(&schema.name).fg(Color::Blue),
                Cell::new(&field.name),
                Cell::new(field.field_type),
                flag_cell(field.required),
                flag_cell(field.strict),
            ]);
        }
    }
    table
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(100);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn status_cell(status: ImportStatus) -> Cell {
    let color = match status {
        ImportStatus::Completed => Color::Green,
        ImportStatus::CompletedWithErrors => Color::Yellow,
        ImportStatus::Failed => Color::Red,
        ImportStatus::Created | ImportStatus::Processing => Color::DarkGrey,
    };
    Cell::new(status).fg(color).add_attribute(Attribute::Bold)
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn flag_cell(flag: bool) -> Cell {
    if flag {
        Cell::new("yes").fg(Color::Green)
    } else {
        dim_cell("no")
    }
}

fn optional_cell(value: Option<String>) -> Cell {
    match value {
        Some(value) => Cell::new(value),
        None => dim_cell("-"),
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_lines_empty() {
        assert_eq!(issue_lines("Errors", &[], 0, 20), "");
    }

    #[test]
    fn test_issue_lines_truncate() {
        let issues: Vec<String> = (0..4).map(|i| format!("Row {i}: Empty content value")).collect();
        insta::assert_snapshot!(issue_lines("Warnings", &issues, 9, 2), @r"
        Warnings (9):
        - Row 0: Empty content value
        - Row 1: Empty content value
        ... and 7 more
        ");
    }
}
