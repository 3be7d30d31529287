//! Thin CLI-facing wrapper over `common::config::load_config`: loads
//! `.env`, resolves an optional `--config` path, and surfaces failures the
//! way the rest of the binary expects (fatal, logged, non-zero exit).

use common::config::AppConfig;
use common::Error;

pub fn load_config(config_path: Option<&str>) -> Result<AppConfig, Error> {
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("no .env file loaded: {e}");
    }

    common::config::load_config(config_path)
}
