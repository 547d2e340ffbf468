//! Session cookie and store.
//!
//! Sessions live in `PostgreSQL` (`tower_sessions.session`, created by the
//! migrations) and expire after `session_ttl` without activity.

use sqlx::PgPool;
use tower_sessions::cookie::{SameSite, time};
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::{ApiConfig, CookieSameSite};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "bazaar_session";

/// Create the session layer with `PostgreSQL` store.
#[must_use]
pub fn create_session_layer(pool: &PgPool, config: &ApiConfig) -> SessionManagerLayer<PostgresStore> {
    let store = PostgresStore::new(pool.clone());

    let idle = i64::try_from(config.session_ttl.as_secs()).unwrap_or(i64::MAX);

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(time::Duration::seconds(idle)))
        .with_secure(config.is_secure())
        .with_same_site(same_site(config.cookie_same_site))
        .with_http_only(true)
        .with_path("/")
}

const fn same_site(value: CookieSameSite) -> SameSite {
    match value {
        CookieSameSite::Lax => SameSite::Lax,
        CookieSameSite::Strict => SameSite::Strict,
        CookieSameSite::None => SameSite::None,
    }
}
