use boost_pricing::{BoostRequest, Estimator, OptionFlag, PriceEstimator, PricingConfig};
use clap::Parser;
use eyre::WrapErr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "boost-quote")]
#[command(about = "Price a rating boost from the command line", long_about = None)]
struct Args {
    /// Current rating
    #[arg(long, allow_negative_numbers = true)]
    from: i64,

    /// Desired rating
    #[arg(long, allow_negative_numbers = true)]
    to: i64,

    /// Add-on to enable, repeatable (lobbyDuo, soloOnly, steamOfflineMode,
    /// premiumQueue, priority, superExpress, liveStream)
    #[arg(short, long = "option")]
    options: Vec<OptionFlag>,

    /// Pricing config JSON; the built-in tier table is used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the quote as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> eyre::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "boost_quote=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            tracing::info!("Loading pricing config from {}", path.display());
            PricingConfig::from_path(path)?
        }
        None => PricingConfig::default(),
    };
    let estimator = PriceEstimator::new(config).wrap_err("invalid pricing config")?;

    let request = BoostRequest::new(args.from, args.to, args.options.into_iter().collect());
    let quote = estimator.quote(&request).wrap_err("failed to price boost")?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&quote).wrap_err("serialize quote")?
        );
        return Ok(());
    }

    println!(
        "{} -> {} (level {} -> {})",
        quote.start_rating, quote.target_rating, quote.start_level, quote.target_level
    );
    println!("  base price:      {}", quote.base_price);
    println!(
        "  with add-ons:    {:.2} (+{}%)",
        quote.total_with_fees, quote.surcharge_percent
    );
    println!(
        "  final price:     {} (was {})",
        quote.final_price, quote.original_price
    );
    println!("  cashback:        {}", quote.cashback);
    println!("  secondary price: {}", quote.secondary_currency_price);
    println!("  estimated time:  {}", quote.estimated_duration.label);

    Ok(())
}
