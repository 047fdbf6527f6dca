use anyhow::{Context, Result};
use clap::Parser;
use rust_decimal::Decimal;
use signal_extraction::{
    load_config, save_extracted_predictions, ExtractionConfig, JsonFilePredictionStore, SaveContext, Signal,
    SignalExtractor,
};
use std::str::FromStr;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "signal-extraction",
    about = "Extract trading signals from model text and calculation-engine output"
)]
struct Options {
    /// Current market price of the asset; must be positive.
    #[arg(value_parser = parse_reference)]
    reference_price: Decimal,

    /// File holding the model's free-form analysis text.
    #[arg(long = "text")]
    text_path: Option<String>,

    /// File holding the calculation engine's JSON output.
    #[arg(long = "calc")]
    calc_path: Option<String>,

    /// Asset whose trading plan is selected from the engine output.
    #[arg(long, default_value = "BTC", value_parser = parse_asset)]
    asset: String,

    /// JSON file the extracted predictions are appended to.
    #[arg(long = "store")]
    store_path: Option<String>,

    /// TOML extraction config. Defaults are used when absent.
    #[arg(long = "config", env = "SIGNAL_EXTRACTION_CONFIG")]
    config_path: Option<String>,

    /// Tag stored predictions as test records.
    #[arg(long = "test", default_value_t = false)]
    test_mode: bool,
}

fn parse_reference(value: &str) -> Result<Decimal, String> {
    let price = Decimal::from_str(value).map_err(|e| format!("invalid reference price {}: {}", value, e))?;
    if price <= Decimal::ZERO {
        return Err(format!("reference price must be positive, got {}", price));
    }
    Ok(price)
}

fn parse_asset(value: &str) -> Result<String, String> {
    Ok(value.to_uppercase())
}

fn print_signal(label: &str, signal: &Signal) -> Result<()> {
    println!("{}: {}", label, serde_json::to_string_pretty(signal)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .compact()
        .init();

    let options = Options::parse();

    let config = match &options.config_path {
        Some(path) => load_config(path).with_context(|| format!("loading config {}", path))?,
        None => ExtractionConfig::default(),
    };
    let extractor = SignalExtractor::new(config);

    info!("Extracting {} signals against reference {}", options.asset, options.reference_price);

    let text = match &options.text_path {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path))?,
        None => String::new(),
    };
    let text_signal = extractor.extract_from_text(&text, options.reference_price);
    print_signal("ai", &text_signal)?;

    let calc_value = match &options.calc_path {
        Some(path) => {
            let content = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading {}", path))?;
            serde_json::from_str(&content).with_context(|| format!("parsing {}", path))?
        }
        None => serde_json::Value::Null,
    };
    let calc_signal = extractor.extract_from_calculation_json(&calc_value, &options.asset, options.reference_price);
    print_signal("calculation", &calc_signal)?;

    if let Some(path) = &options.store_path {
        let store = JsonFilePredictionStore::new(path);
        let context = SaveContext::new(options.asset.clone(), options.reference_price).test_mode(options.test_mode);
        if save_extracted_predictions(&store, &text_signal, &calc_signal, &context).await {
            info!("Predictions stored in {}", path);
        } else {
            warn!("Predictions were not fully stored in {}", path);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_options() {
        let options = Options::try_parse_from([
            "signal-extraction",
            "50000",
            "--text",
            "ai.txt",
            "--calc",
            "calc.json",
            "--asset",
            "eth",
            "--store",
            "out.json",
            "--config",
            "extraction.toml",
            "--test",
        ])
        .unwrap();

        assert_eq!(options.reference_price, dec!(50000));
        assert_eq!(options.text_path.as_deref(), Some("ai.txt"));
        assert_eq!(options.calc_path.as_deref(), Some("calc.json"));
        assert_eq!(options.asset, "ETH");
        assert_eq!(options.store_path.as_deref(), Some("out.json"));
        assert_eq!(options.config_path.as_deref(), Some("extraction.toml"));
        assert!(options.test_mode);
    }

    #[test]
    fn test_parse_defaults() {
        let options = Options::try_parse_from(["signal-extraction", "0.35"]).unwrap();

        assert_eq!(options.reference_price, dec!(0.35));
        assert_eq!(options.asset, "BTC");
        assert!(options.text_path.is_none());
        assert!(!options.test_mode);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        let parse = |args: &[&str]| {
            Options::try_parse_from(std::iter::once("signal-extraction").chain(args.iter().copied()))
        };
        assert!(parse(&[]).is_err());
        assert!(parse(&["-5"]).is_err());
        assert!(parse(&["0"]).is_err());
        assert!(parse(&["abc"]).is_err());
        assert!(parse(&["100", "--text"]).is_err());
        assert!(parse(&["100", "--verbose"]).is_err());
        assert!(parse(&["100", "200"]).is_err());
    }

    #[test]
    fn test_reference_parser() {
        assert_eq!(parse_reference("68123.45"), Ok(dec!(68123.45)));
        assert!(parse_reference("-0.01").is_err());
        assert!(parse_reference("1e5x").is_err());
    }

    #[test]
    fn test_command_is_well_formed() {
        use clap::CommandFactory;
        Options::command().debug_assert();
    }
}
