//! `fetch_forecasts`: every 30 minutes, pull NWS period/gridpoint and
//! Open-Meteo multi-model forecasts for every active city, continuing past
//! any single source's failure.

use crate::context::JobContext;
use common::Error;
use tracing::{info, warn};
use weather::station::station_for;
use weather::{nws, open_meteo};

pub async fn run_once(ctx: &JobContext) -> Result<(), Error> {
    for city in ctx.cities() {
        let station = station_for(city);
        let gp = match ctx
            .grid_cache
            .get_or_fetch(city, station.lat, station.lon, &ctx.config.nws_user_agent, &ctx.rate_limiters.nws)
            .await
        {
            Ok(gp) => gp,
            Err(e) => {
                warn!(city = city.code(), error = %e, "grid lookup failed, skipping NWS sources this cycle");
                fetch_open_meteo(ctx, city, &station).await;
                continue;
            }
        };

        match nws::fetch_period_forecast(city, gp, &ctx.config.nws_user_agent, &ctx.rate_limiters.nws).await {
            Ok(forecast) => store(ctx, forecast).await,
            Err(e) => warn!(city = city.code(), error = %e, "NWS period forecast fetch failed"),
        }

        match nws::fetch_gridpoint_raw(city, gp, &ctx.config.nws_user_agent, &ctx.rate_limiters.nws).await {
            Ok(forecast) => store(ctx, forecast).await,
            Err(e) => warn!(city = city.code(), error = %e, "NWS gridpoint fetch failed"),
        }

        fetch_open_meteo(ctx, city, &station).await;
    }
    Ok(())
}

async fn fetch_open_meteo(ctx: &JobContext, city: common::City, station: &weather::station::StationInfo) {
    match open_meteo::fetch_multi_model(city, station.lat, station.lon, &ctx.rate_limiters.open_meteo).await {
        Ok(forecasts) => {
            let n = forecasts.len();
            for forecast in forecasts {
                store(ctx, forecast).await;
            }
            info!(city = city.code(), models = n, "stored Open-Meteo forecasts");
        }
        Err(e) => warn!(city = city.code(), error = %e, "Open-Meteo fetch failed"),
    }
}

async fn store(ctx: &JobContext, forecast: common::WeatherForecast) {
    let city = forecast.city;
    let source = forecast.source;
    if let Err(e) = storage::with_db(&ctx.db, move |db| db.insert_weather_forecast(&forecast).map(|_| ())).await {
        warn!(city = city.code(), source = ?source, error = %e, "failed to persist weather forecast");
    }
}
