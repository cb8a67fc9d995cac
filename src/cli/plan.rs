use super::{report, ui};
use crate::core::allocation::{AccountPlan, balance_account};
use crate::core::config::AppConfig;
use crate::core::price::PriceProvider;
use crate::core::{quotes, strategy};
use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

/// Prices every configured symbol, allocates every account and writes the
/// buy-list to CSV before printing it.
///
/// An account whose strategy can't be resolved is skipped; the command still
/// fails afterwards, naming it.
pub async fn run(
    config: &AppConfig,
    provider: &(dyn PriceProvider + Send + Sync),
    output: Option<&str>,
    strict: bool,
) -> Result<()> {
    let warnings = strategy::allocation_warnings(&config.strategies);
    for warning in &warnings {
        warn!("{}", warning);
    }
    if strict && !warnings.is_empty() {
        anyhow::bail!(
            "Refusing to plan with {} allocation issue(s), run `check` for details",
            warnings.len()
        );
    }

    config.validate()?;
    info!("Config is valid");

    let cache_path = config.cache_path()?;
    let mut cache = quotes::load_cache(&cache_path)?;
    let symbols = config.all_symbols();

    let pb = ui::new_progress_bar(symbols.len() as u64);
    pb.set_message("Fetching prices...");
    let prices = quotes::fetch_quotes(
        &symbols,
        provider,
        &mut cache,
        &cache_path,
        Duration::from_millis(config.request_delay_ms),
        &|| pb.inc(1),
    )
    .await;
    pb.finish_and_clear();
    let prices = prices?;

    let mut plans: Vec<AccountPlan> = Vec::with_capacity(config.accounts.len());
    let mut failed = Vec::new();
    for account in &config.accounts {
        match balance_account(&config.strategies, account, &prices) {
            Ok(plan) => plans.push(plan),
            Err(e) => {
                error!(account = %account.name, error = %e, "Failed to balance");
                failed.push(account.name.as_str());
            }
        }
    }

    let output_path = PathBuf::from(output.unwrap_or(config.output_filename.as_str()));
    report::write_csv_file(&output_path, &plans)?;
    info!("Finished writing to {}", output_path.display());

    for plan in &plans {
        println!("\n{}", plan.display_as_table());
        ui::print_separator();
    }

    if !failed.is_empty() {
        anyhow::bail!("Failed to balance account(s): {}", failed.join(", "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    struct MockPriceProvider;

    #[async_trait]
    impl PriceProvider for MockPriceProvider {
        async fn fetch_price(&self, symbol: &str) -> Result<Decimal> {
            match symbol {
                "AAA" => Ok(dec!(50)),
                "BBB" => Ok(dec!(30)),
                "CCC" => Ok(dec!(20)),
                _ => Err(anyhow!("Unknown symbol")),
            }
        }
    }

    fn config(dir: &TempDir, accounts: &str) -> AppConfig {
        let yaml = format!(
            r#"
strategies:
  - name: "Balanced"
    symbols:
      - symbol: "AAA"
        type: "Equities"
      - symbol: "BBB"
        type: "Equities"
      - symbol: "CCC"
        type: "Bonds"
    allocations:
      Equities: 60
      Bonds: 40
accounts:
{accounts}
alpha_vantage_api_key: "test-key"
request_delay_ms: 0
output_filename: "{}"
data_path: "{}"
"#,
            dir.path().join("out.csv").display(),
            dir.path().display()
        );
        serde_yaml::from_str(&yaml).unwrap()
    }

    #[tokio::test]
    async fn test_plan_writes_csv() {
        let dir = TempDir::new().unwrap();
        let config = config(
            &dir,
            r#"  - name: "IRA"
    balance: 1000
    strategy: "Balanced""#,
        );

        run(&config, &MockPriceProvider, None, false).await.unwrap();

        let csv = std::fs::read_to_string(dir.path().join("out.csv")).unwrap();
        assert!(csv.contains("IRA,AAA,Equities,6,50,300,300,0,0.3,0.6,1000"), "{csv}");
        assert!(csv.contains("IRA,BBB,Equities,10,30,300,300,0,0.3,0.6,1000"), "{csv}");
        assert!(csv.contains("IRA,CCC,Bonds,20,20,400,400,0,0.4,0.4,1000"), "{csv}");
        assert!(config.cache_path().unwrap().exists());
    }

    #[tokio::test]
    async fn test_unknown_strategy_only_skips_that_account() {
        let dir = TempDir::new().unwrap();
        let config = config(
            &dir,
            r#"  - name: "IRA"
    balance: 1000
    strategy: "Balanced"
  - name: "Lost"
    balance: 500
    strategy: "Missing""#,
        );
        let output = dir.path().join("override.csv");

        let err = run(
            &config,
            &MockPriceProvider,
            Some(output.to_str().unwrap()),
            false,
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Failed to balance account(s): Lost");

        let csv = std::fs::read_to_string(&output).unwrap();
        assert_eq!(csv.lines().count(), 4);
        assert!(!csv.contains("Lost"));
    }

    #[tokio::test]
    async fn test_strict_rejects_bad_allocations() {
        let dir = TempDir::new().unwrap();
        let mut config = config(&dir, "  []");
        config.strategies[0]
            .allocations
            .insert("Bonds".to_string(), dec!(50));

        let err = run(&config, &MockPriceProvider, None, true).await.unwrap_err();
        assert!(err.to_string().contains("1 allocation issue(s)"), "{err}");
        assert!(!dir.path().join("out.csv").exists());

        // Without --strict the same config still plans
        assert!(run(&config, &MockPriceProvider, None, false).await.is_ok());
    }
}
