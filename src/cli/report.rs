//! CSV and terminal rendering of account plans. Values are truncated for
//! display only; nothing here feeds back into the allocation.

use super::ui;
use crate::core::allocation::{AccountPlan, Allocation, AllocationStatus};
use anyhow::{Context, Result};
use comfy_table::Cell;
use rust_decimal::Decimal;
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub const CSV_HEADERS: [&str; 11] = [
    "Name",
    "Symbol",
    "Type",
    "Shares",
    "Share Price",
    "Purchase Price",
    "Allocated",
    "Remainder",
    "Symbol Allocation %",
    "Group Allocation %",
    "From Balance",
];

fn as_fraction(percentage: Decimal) -> String {
    ui::format_money(percentage / Decimal::ONE_HUNDRED)
}

fn shares_text(alloc: &Allocation) -> String {
    match alloc.status {
        AllocationStatus::Priced => alloc.shares.to_string(),
        AllocationStatus::Unpriced | AllocationStatus::InvalidPrice => "N/A".to_string(),
    }
}

fn share_price_text(alloc: &Allocation) -> String {
    match alloc.status {
        AllocationStatus::Unpriced => "N/A".to_string(),
        AllocationStatus::Priced | AllocationStatus::InvalidPrice => {
            ui::format_money(alloc.share_price)
        }
    }
}

/// One CSV row, in [`CSV_HEADERS`] order.
pub fn csv_record(
    plan: &AccountPlan,
    group: &str,
    symbol: &str,
    alloc: &Allocation,
) -> [String; 11] {
    [
        plan.account.clone(),
        symbol.to_string(),
        group.to_string(),
        shares_text(alloc),
        share_price_text(alloc),
        ui::format_money(alloc.total_allocated),
        ui::format_money(alloc.ideal_allocation),
        ui::format_money(alloc.remainder),
        as_fraction(alloc.symbol_percentage),
        as_fraction(alloc.group_percentage),
        ui::format_money(plan.balance),
    ]
}

pub fn write_csv<W: Write>(writer: W, plans: &[AccountPlan]) -> Result<()> {
    let mut w = csv::Writer::from_writer(writer);
    w.write_record(CSV_HEADERS).context("Failed to write CSV headers")?;

    for plan in plans {
        for (group, symbol, alloc) in plan.allocations() {
            w.write_record(csv_record(plan, group, symbol, alloc))
                .with_context(|| {
                    format!("Failed to write CSV row for {} / {}", plan.account, symbol)
                })?;
        }
    }

    w.flush().context("Failed to flush CSV output")?;
    Ok(())
}

pub fn write_csv_file(path: &Path, plans: &[AccountPlan]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to open {} for writing", path.display()))?;
    write_csv(file, plans).with_context(|| format!("Failed to write {}", path.display()))
}

impl AccountPlan {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();

        table.set_header(vec![
            ui::header_cell("Type"),
            ui::header_cell("Symbol"),
            ui::header_cell("Shares"),
            ui::header_cell("Share Price"),
            ui::header_cell("Purchase Price"),
            ui::header_cell("Allocated"),
            ui::header_cell("Remainder"),
            ui::header_cell("Weight (%)"),
        ]);

        for (group, symbol, alloc) in self.allocations() {
            let (shares, share_price) = match alloc.status {
                AllocationStatus::Priced => {
                    (Cell::new(alloc.shares), ui::money_cell(alloc.share_price))
                }
                AllocationStatus::Unpriced => (ui::na_cell(), ui::na_cell()),
                AllocationStatus::InvalidPrice => (
                    ui::na_cell(),
                    Cell::new(ui::style_text(
                        &ui::format_money(alloc.share_price),
                        ui::StyleType::Error,
                    )),
                ),
            };

            table.add_row(vec![
                Cell::new(ui::style_text(group, ui::StyleType::Subtle)),
                Cell::new(symbol),
                shares,
                share_price,
                ui::money_cell(alloc.total_allocated),
                ui::money_cell(alloc.ideal_allocation),
                ui::money_cell(alloc.remainder),
                ui::format_percentage_cell(alloc.symbol_percentage),
            ]);
        }

        // Account name at top
        let mut output = format!(
            "Account: {}\n\n",
            ui::style_text(&self.account, ui::StyleType::Title)
        );

        output.push_str(&table.to_string());

        output.push_str(&format!(
            "\n\n{} {}\n{} {}\n{} {}",
            ui::style_text("Balance:", ui::StyleType::TotalLabel),
            ui::format_money(self.balance),
            ui::style_text("Purchases:", ui::StyleType::TotalLabel),
            ui::style_text(
                &ui::format_money(self.total_allocated()),
                ui::StyleType::TotalValue
            ),
            ui::style_text("Remainder:", ui::StyleType::TotalLabel),
            ui::format_money(self.total_remainder()),
        ));

        let unpriced = self.unpriced_symbols();
        if !unpriced.is_empty() {
            output.push_str(&format!(
                "\n{}",
                ui::style_text(
                    &format!("No usable price for: {}", unpriced.join(", ")),
                    ui::StyleType::Error
                )
            ));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::allocation::allocate;
    use crate::core::config::{Strategy, Symbol};
    use crate::core::price::Quote;
    use rust_decimal_macros::dec;

    fn plan(quotes: &[Quote]) -> AccountPlan {
        let strategy = Strategy {
            name: "Balanced".to_string(),
            symbols: [("AAA", "Equities"), ("BBB", "Equities"), ("CCC", "Bonds")]
                .iter()
                .map(|(symbol, kind)| Symbol {
                    symbol: symbol.to_string(),
                    kind: kind.to_string(),
                })
                .collect(),
            allocations: [
                ("Equities".to_string(), dec!(60)),
                ("Bonds".to_string(), dec!(40)),
            ]
            .into_iter()
            .collect(),
        };
        AccountPlan {
            account: "IRA".to_string(),
            balance: dec!(1000),
            groups: allocate(&strategy, dec!(1000), quotes).unwrap(),
        }
    }

    fn write_to_string(plans: &[AccountPlan]) -> String {
        let mut buf = Vec::new();
        write_csv(&mut buf, plans).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_csv_output() {
        let quotes = vec![
            Quote::new("AAA", dec!(50)),
            Quote::new("BBB", dec!(33)),
            Quote::new("CCC", dec!(20)),
        ];
        let output = write_to_string(&[plan(&quotes)]);

        let expected = "\
Name,Symbol,Type,Shares,Share Price,Purchase Price,Allocated,Remainder,Symbol Allocation %,Group Allocation %,From Balance
IRA,CCC,Bonds,20,20,400,400,0,0.4,0.4,1000
IRA,AAA,Equities,6,50,300,300,0,0.3,0.6,1000
IRA,BBB,Equities,9,33,297,300,3,0.3,0.6,1000
";
        assert_eq!(output, expected);
    }

    #[test]
    fn test_csv_truncates_instead_of_rounding() {
        let strategy = Strategy {
            name: "Thirds".to_string(),
            symbols: ["A", "B", "C"]
                .iter()
                .map(|s| Symbol {
                    symbol: s.to_string(),
                    kind: "eq".to_string(),
                })
                .collect(),
            allocations: [("eq".to_string(), dec!(100))].into_iter().collect(),
        };
        let quotes = vec![
            Quote::new("A", dec!(7.777)),
            Quote::new("B", dec!(1)),
            Quote::new("C", dec!(1)),
        ];
        let plan = AccountPlan {
            account: "Odd".to_string(),
            balance: dec!(1000.999),
            groups: allocate(&strategy, dec!(1000.999), &quotes).unwrap(),
        };

        let (group, symbol, alloc) = plan.allocations().next().unwrap();
        let record = csv_record(&plan, group, symbol, alloc);
        // 1000.999 / 3 = 333.666333...
        assert_eq!(record[6], "333.66");
        assert_eq!(record[3], "42");
        assert_eq!(record[4], "7.77");
        assert_eq!(record[8], "0.33");
        assert_eq!(record[10], "1000.99");
        // The underlying value is untouched
        assert!(alloc.ideal_allocation > dec!(333.666));
    }

    #[test]
    fn test_csv_marks_unpriced_symbols() {
        let quotes = vec![Quote::new("AAA", dec!(50)), Quote::new("CCC", dec!(0))];
        let output = write_to_string(&[plan(&quotes)]);

        assert!(output.contains("IRA,CCC,Bonds,N/A,0,0,400,0,0.4,0.4,1000"), "{output}");
        assert!(output.contains("IRA,BBB,Equities,N/A,N/A,0,300,0,0.3,0.6,1000"), "{output}");
    }

    #[test]
    fn test_write_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.csv");
        write_csv_file(&path, &[plan(&[])]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 4);
        assert!(content.starts_with("Name,Symbol,Type"));
    }

    #[test]
    fn test_table_lists_every_symbol_and_totals() {
        let quotes = vec![Quote::new("AAA", dec!(50)), Quote::new("BBB", dec!(33))];
        let table = plan(&quotes).display_as_table();

        for symbol in ["AAA", "BBB", "CCC"] {
            assert!(table.contains(symbol));
        }
        assert!(table.contains("597"));
        assert!(table.contains("No usable price for: CCC"));
    }
}
