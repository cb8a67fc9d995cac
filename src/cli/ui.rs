use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::{Decimal, RoundingStrategy};

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    TotalLabel,
    TotalValue,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::TotalLabel => style(text).bold(),
        StyleType::TotalValue => style(text).green().bold(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Truncates (never rounds) to 2 decimal places for display.
pub fn format_money(value: Decimal) -> String {
    value
        .round_dp_with_strategy(2, RoundingStrategy::ToZero)
        .normalize()
        .to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Right aligned, truncated decimal cell.
pub fn money_cell(value: Decimal) -> Cell {
    Cell::new(format_money(value)).set_alignment(CellAlignment::Right)
}

/// Formats a cell with bold and green text
pub fn format_percentage_cell(value: Decimal) -> Cell {
    Cell::new(format!("{}%", format_money(value)))
        .add_attribute(Attribute::Bold)
        .fg(Color::Green)
        .set_alignment(CellAlignment::Right)
}

/// Red "N/A" cell for values that couldn't be computed.
pub fn na_cell() -> Cell {
    Cell::new("N/A")
        .fg(Color::Red)
        .set_alignment(CellAlignment::Right)
}

const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} {msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})";

/// Creates a new `indicatif::ProgressBar` with standard styling and a message slot.
pub fn new_progress_bar(len: u64) -> ProgressBar {
    let style = ProgressStyle::default_bar()
        .template(PROGRESS_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    let pb = ProgressBar::new(len);
    pb.set_style(style);
    pb
}

/// Prints a separator line matching the terminal width.
pub fn print_separator() {
    let term_width = console::Term::stdout()
        .size_checked()
        .map(|(_, w)| w as usize)
        .unwrap_or(80);
    println!("\n{}", "─".repeat(term_width));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_money_truncates() {
        assert_eq!(format_money(dec!(10.999)), "10.99");
        assert_eq!(format_money(dec!(333.3333333)), "333.33");
        assert_eq!(format_money(dec!(600.0)), "600");
        assert_eq!(format_money(dec!(0.125)), "0.12");
        assert_eq!(format_money(dec!(0.3)), "0.3");
        assert_eq!(format_money(Decimal::ZERO), "0");
    }

    #[test]
    fn test_na_cell_and_progress_bar() {
        assert_eq!(na_cell().content(), "N/A");

        let pb = new_progress_bar(3);
        assert_eq!(pb.length(), Some(3));
        pb.inc(2);
        assert_eq!(pb.position(), 2);
    }
}
