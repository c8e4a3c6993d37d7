//! Item filter construction.

use chrono::{DateTime, Duration, Utc};

use crate::store::ItemQuery;

/// Build the query selecting items tagged `tag`, optionally restricted to
/// items received at least `max_age_days` days ago.
///
/// `max_age_days <= 0` adds no age restriction.
pub fn build(tag: &str, max_age_days: i64) -> ItemQuery {
    build_at(tag, max_age_days, Utc::now())
}

/// [`build`] with an explicit notion of "now".
pub fn build_at(tag: &str, max_age_days: i64, now: DateTime<Utc>) -> ItemQuery {
    let received_on_or_before = (max_age_days > 0).then(|| {
        Duration::try_days(max_age_days)
            .and_then(|age| now.checked_sub_signed(age))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    });

    ItemQuery {
        categories_contain: tag.trim().to_string(),
        received_on_or_before,
    }
}
