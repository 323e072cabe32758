use cryptomarket_data::{
    MarketData,
    frequency::Frequency,
    rest::{latest::LatestCandles, retry::{RetryPolicy, retry_data_request}},
};
use cryptomarket_instrument::exchange::ExchangeId;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise INFO Tracing log subscriber
    init_logging();

    let market_data = MarketData::new();
    let policy = RetryPolicy::default();

    // Latest day of complete 30 minute candles for two Poloniex markets, outer joined
    let latest = retry_data_request(&policy, || {
        market_data.latest_candles(
            ExchangeId::Poloniex,
            &["BTC_ETH", "BTC_LTC"],
            Frequency::M30,
            48,
            None,
            None,
        )
    })
    .await?;

    match latest {
        LatestCandles::Single(series) => {
            for candle in series.iter() {
                info!(start = %candle.start_time, close = candle.close, "candle");
            }
        }
        LatestCandles::Joined(joined) => {
            for (row, (start_time, _)) in joined.index.iter().enumerate() {
                let closes = joined
                    .columns
                    .iter()
                    .map(|(market, column)| (market.as_str(), column[row].as_ref().map(|candle| candle.close)))
                    .collect::<Vec<_>>();
                info!(start = %start_time, ?closes, "row");
            }
        }
    }

    // Order book top of the GDAX BTC-USD market
    let book = market_data
        .order_book(ExchangeId::Gdax, "BTC-USD", Some(10))
        .await?;
    info!(bid = ?book.best_bid(), ask = ?book.best_ask(), spread = ?book.spread(), "order book");

    Ok(())
}

// Initialise an INFO `Subscriber` for `Tracing` Json logs and install it as the global default.
fn init_logging() {
    tracing_subscriber::fmt()
        // Filter messages based on the INFO
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        // Disable colours on release builds
        .with_ansi(cfg!(debug_assertions))
        // Enable Json formatting
        .json()
        // Install this Tracing subscriber as global default
        .init()
}
