//! `fetch_cli_reports`: once daily at 08:00 local, pull each city's NWS
//! Daily Climate Report and persist the settlement temperature it carries.
//! A parse failure only drops that city for this cycle — the others still
//! proceed and get their settlements recorded.

use crate::context::JobContext;
use chrono::Utc;
use common::{Error, Settlement};
use tracing::{info, warn};
use weather::cli_parser::parse_cli_text;
use weather::nws::fetch_cli_text;
use weather::station::station_for;

pub async fn run_once(ctx: &JobContext) -> Result<(), Error> {
    for city in ctx.cities() {
        let station = station_for(city);
        let raw = match fetch_cli_text(station.cli_site, station.cli_station, &ctx.config.nws_user_agent, &ctx.rate_limiters.nws).await {
            Ok(text) => text,
            Err(e) => {
                warn!(city = city.code(), error = %e, "CLI report fetch failed, skipping this city");
                continue;
            }
        };

        let report = match parse_cli_text(&raw) {
            Ok(r) => r,
            Err(e) => {
                warn!(city = city.code(), error = %e, "CLI report parse failed, skipping this city");
                continue;
            }
        };

        let settlement = Settlement {
            id: 0,
            city,
            settlement_date: report.report_date,
            observed_high_f: report.high_f,
            observed_low_f: report.low_f,
            source: "NWS CLI".into(),
            raw_report: report.raw_text,
            created_at: Utc::now(),
        };

        match storage::with_db(&ctx.db, move |db| db.upsert_settlement(&settlement)).await {
            Ok(()) => info!(city = city.code(), high_f = report.high_f, "settlement recorded"),
            Err(e) => warn!(city = city.code(), error = %e, "failed to persist settlement"),
        }
    }
    Ok(())
}
