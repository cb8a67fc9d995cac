use super::ui;
use crate::core::config::AppConfig;
use crate::core::strategy;
use anyhow::Result;

/// Prints strategies whose allocations don't add up. Fails if there are any.
pub fn run(config: &AppConfig) -> Result<()> {
    let warnings = strategy::allocation_warnings(&config.strategies);
    if warnings.is_empty() {
        println!(
            "{}",
            ui::style_text(
                &format!("All {} strategies allocate 100%", config.strategies.len()),
                ui::StyleType::TotalValue
            )
        );
        return Ok(());
    }

    for warning in &warnings {
        println!("{}", ui::style_text(warning, ui::StyleType::Error));
    }
    anyhow::bail!("{} allocation issue(s) found", warnings.len())
}
