use rusqlite::Connection;
use serde::Serialize;
use time::Duration;

use crate::app::AppError;
use crate::clock::{date_key, to_rfc3339, Clock};
use crate::db::{self, PopularArticleRow, ViewLogRecord};

const POPULAR_LIMIT: i64 = 5;
const POPULAR_WINDOW_DAYS: i64 = 7;
const TREND_DAYS: i64 = 30;

pub struct ViewService<'a> {
    conn: &'a Connection,
    clock: &'a dyn Clock,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ViewStats {
    pub today_views: i64,
    pub total_views: i64,
    pub popular_articles: Vec<PopularArticleRow>,
    pub daily_views: Vec<DailyViews>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DailyViews {
    pub date: String,
    pub count: i64,
}

impl<'a> ViewService<'a> {
    pub fn new(conn: &'a Connection, clock: &'a dyn Clock) -> Self {
        Self { conn, clock }
    }

    /// Appends one view event. No deduplication by address or time window.
    pub fn record(
        &self,
        article_id: &str,
        ip_address: &str,
        user_agent: Option<&str>,
    ) -> Result<(), AppError> {
        if !db::article_exists(self.conn, article_id)? {
            return Err(AppError::NotFound(format!("article '{article_id}'")));
        }
        db::append_view(
            self.conn,
            article_id,
            ip_address,
            user_agent,
            &to_rfc3339(self.clock.now()),
        )?;
        Ok(())
    }

    /// Aggregates the event log into counters, a 7-day ranking, and a 30-day
    /// trend. The trend uses calendar days, not rolling hours, so events near
    /// midnight land on exactly one entry.
    pub fn stats(&self) -> Result<ViewStats, AppError> {
        let now = self.clock.now();
        let today = now.date();
        let today_key = date_key(today);

        let today_views = db::count_views_on(self.conn, &today_key)?;
        let total_views = db::count_views(self.conn)?;

        let cutoff = to_rfc3339(now - Duration::days(POPULAR_WINDOW_DAYS));
        let popular_articles = db::popular_since(self.conn, &cutoff, POPULAR_LIMIT)?;

        let oldest = today - Duration::days(TREND_DAYS - 1);
        let raw = db::daily_counts_between(self.conn, &date_key(oldest), &today_key)?;
        let mut daily_views = Vec::with_capacity(TREND_DAYS as usize);
        for offset in (0..TREND_DAYS).rev() {
            let key = date_key(today - Duration::days(offset));
            let count = raw.get(&key).copied().unwrap_or(0);
            daily_views.push(DailyViews { date: key, count });
        }

        Ok(ViewStats {
            today_views,
            total_views,
            popular_articles,
            daily_views,
        })
    }

    pub fn logs(
        &self,
        article_id: Option<&str>,
        limit: i64,
    ) -> Result<Vec<ViewLogRecord>, AppError> {
        Ok(db::list_view_logs(self.conn, article_id, limit)?)
    }
}
