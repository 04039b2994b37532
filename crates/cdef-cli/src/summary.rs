use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};
use serde::Serialize;

use cdef_model::{ClassificationOrigin, ClassificationTop, UndefinedHandlingType};
use cdef_resolve::ResolvedClassifications;

/// Outcome of `cdef lookup`.
#[derive(Debug, Serialize)]
pub struct LookupResult<'r> {
    pub table: String,
    pub column: String,
    pub classification_name: Option<&'r str>,
    /// Absent when the deployed name is not in the model.
    pub classification: Option<&'r ClassificationTop>,
}

pub fn print_classifications(resolved: &ResolvedClassifications) {
    println!("{}", classification_table(resolved));
    let model = resolved.model();
    if !model.document_only_names.is_empty() {
        let names: Vec<&str> = model.document_only_names.iter().map(String::as_str).collect();
        println!("Documentation only (removed): {}", names.join(", "));
    }
}

pub fn classification_table(resolved: &ResolvedClassifications) -> Table {
    let model = resolved.model();
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Classification"),
        header_cell("Origin"),
        header_cell("Handling"),
        header_cell("Check"),
        header_cell("Codes"),
        header_cell("Comment"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Center);
    align_column(&mut table, 4, CellAlignment::Right);
    let mut total_codes = 0usize;
    for top in model.iter() {
        total_codes += top.elements.len();
        table.add_row(vec![
            name_cell(top),
            origin_cell(top.origin),
            handling_cell(top.undefined_handling_type),
            check_cell(top.check_classification_code),
            Cell::new(top.elements.len()),
            top.top_comment
                .as_deref()
                .map_or_else(|| dim_cell("-"), Cell::new),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(format!("{} classifications", model.len()))
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
        Cell::new(total_codes).add_attribute(Attribute::Bold),
        dim_cell("-"),
    ]);
    table
}

pub fn print_deployment(resolved: &ResolvedClassifications) {
    println!("{}", deployment_table(resolved));
}

pub fn deployment_table(resolved: &ResolvedClassifications) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Table"),
        header_cell("Column"),
        header_cell("Classification"),
    ]);
    apply_table_style(&mut table);
    for (table_name, assignments) in resolved.deployment().iter() {
        for (column, classification) in assignments.iter() {
            let classification_cell = if resolved.get(classification).is_some() {
                Cell::new(classification)
            } else {
                // Deployed by name only, e.g. a classification defined elsewhere.
                Cell::new(classification).fg(Color::Yellow)
            };
            table.add_row(vec![
                Cell::new(table_name),
                Cell::new(column),
                classification_cell,
            ]);
        }
    }
    table
}

pub fn print_lookup(result: &LookupResult<'_>) {
    let Some(name) = result.classification_name else {
        println!(
            "No classification is deployed on {}.{}",
            result.table, result.column
        );
        return;
    };
    println!("{}.{}: {name}", result.table, result.column);
    if let Some(top) = result.classification {
        println!("{}", element_table(top));
    }
}

pub fn element_table(top: &ClassificationTop) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Code"),
        header_cell("Name"),
        header_cell("Alias"),
        header_cell("Comment"),
    ]);
    apply_table_style(&mut table);
    for element in &top.elements {
        table.add_row(vec![
            Cell::new(&element.code).add_attribute(Attribute::Bold),
            Cell::new(&element.name),
            element
                .alias
                .as_deref()
                .map_or_else(|| dim_cell("-"), Cell::new),
            element
                .comment
                .as_deref()
                .map_or_else(|| dim_cell("-"), Cell::new),
        ]);
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
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
    if table.column_count() >= 6 {
        table.set_constraints(vec![
            ColumnConstraint::UpperBoundary(Width::Percentage(30)),
            ColumnConstraint::LowerBoundary(Width::Fixed(8)),
            ColumnConstraint::LowerBoundary(Width::Fixed(11)),
            ColumnConstraint::LowerBoundary(Width::Fixed(7)),
            ColumnConstraint::LowerBoundary(Width::Fixed(7)),
            ColumnConstraint::UpperBoundary(Width::Percentage(40)),
        ]);
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn name_cell(top: &ClassificationTop) -> Cell {
    let cell = Cell::new(&top.name);
    if top.deprecated {
        cell.fg(Color::DarkGrey).add_attribute(Attribute::CrossedOut)
    } else {
        cell.add_attribute(Attribute::Bold)
    }
}

fn origin_cell(origin: ClassificationOrigin) -> Cell {
    let color = match origin {
        ClassificationOrigin::Literal => Color::White,
        ClassificationOrigin::Table => Color::Blue,
        ClassificationOrigin::AllInOne => Color::Magenta,
        ClassificationOrigin::Resource => Color::Green,
    };
    Cell::new(origin).fg(color)
}

fn handling_cell(handling: UndefinedHandlingType) -> Cell {
    let color = match handling {
        UndefinedHandlingType::Exception => Color::Red,
        UndefinedHandlingType::Logging => Color::Yellow,
        UndefinedHandlingType::Allowed => Color::Green,
    };
    Cell::new(handling).fg(color)
}

fn check_cell(checked: bool) -> Cell {
    if checked {
        Cell::new("✓").fg(Color::Green)
    } else {
        dim_cell("-")
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
