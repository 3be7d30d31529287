//! `expire_pending`: every 5 minutes, sweep pending trades left unreviewed
//! past their expiry. Idempotent, so no retries on failure.

use crate::context::JobContext;
use chrono::Utc;
use common::{Error, PendingStatus};
use tracing::info;

pub async fn run_once(ctx: &JobContext) -> Result<(), Error> {
    let now = Utc::now();
    let pending = storage::with_db(&ctx.db, |db| db.get_pending_trades_by_status(PendingStatus::Pending)).await?;

    for trade in pending {
        if trade.expires_at > now {
            continue;
        }
        let id = trade.id;
        let city = trade.city;
        storage::with_db(&ctx.db, move |db| db.update_pending_trade_status(id, PendingStatus::Expired, now)).await?;

        events::publish(&ctx.events, events::DomainEvent::TradeExpired { pending_trade_id: id, city });
        info!(city = city.code(), pending_trade_id = id, "pending trade expired");
    }

    Ok(())
}
