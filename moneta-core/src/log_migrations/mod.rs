//! Log database migrations - embedded SQL files
//!
//! Each migration is a (name, sql) pair compiled in with include_str!,
//! applied in order.

/// All log migrations, in application order
pub const LOG_MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    (
        "001_initial_schema.sql",
        include_str!("001_initial_schema.sql"),
    ),
];
