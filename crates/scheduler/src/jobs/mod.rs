pub mod expire_pending;
pub mod fetch_cli_reports;
pub mod fetch_forecasts;
pub mod generate_predictions;
pub mod settle_trades;
pub mod trading_cycle;
pub mod train_models;
