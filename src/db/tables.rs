use redb::TableDefinition;

/// Users table: username -> UserRecord (serialized)
pub const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Stats table: single `STATS_KEY` row -> AggregateStats (serialized)
pub const STATS: TableDefinition<&str, &[u8]> = TableDefinition::new("stats");

/// Key of the one row in `STATS`
pub const STATS_KEY: &str = "aggregate";

/// History table: insertion sequence number -> HistoryEntry (serialized)
/// Keys increase monotonically, so iteration order is insertion order
pub const HISTORY: TableDefinition<u64, &[u8]> = TableDefinition::new("history");

/// Login attempts table: username -> LoginThrottle (serialized)
pub const LOGIN_ATTEMPTS: TableDefinition<&str, &[u8]> = TableDefinition::new("login_attempts");
