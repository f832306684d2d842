//! Database helpers shared by the services

/// Transient storage faults that the service layer retries once at the
/// transaction boundary: serialization failures, deadlocks and dropped
/// connections. Business-rule violations never come through here.
pub fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Database(db_err) => {
            matches!(db_err.code().as_deref(), Some("40001") | Some("40P01"))
        }
        _ => false,
    }
}

/// A create race on the stock lot unique index: two transactions both saw
/// no lot for a new key and both tried to insert it. `FOR UPDATE` cannot
/// lock a row that does not exist yet, so the loser aborts here; the retry
/// sees the winner's row and merges into it.
pub fn is_lot_create_race(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.constraint() == Some("uq_stock_lot"),
        _ => false,
    }
}
