use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id                    TEXT PRIMARY KEY,
            username              TEXT NOT NULL UNIQUE,
            password              TEXT NOT NULL,
            first_name            TEXT NOT NULL DEFAULT '',
            last_name             TEXT NOT NULL DEFAULT '',
            email                 TEXT NOT NULL DEFAULT '',
            phone_no              TEXT NOT NULL DEFAULT '',
            address               TEXT NOT NULL DEFAULT '',
            pincode               TEXT NOT NULL DEFAULT '',
            organization_name     TEXT NOT NULL DEFAULT '',
            organization_address  TEXT NOT NULL DEFAULT '',
            profession            TEXT NOT NULL DEFAULT '',
            location              TEXT NOT NULL DEFAULT '',
            latitude              REAL,
            longitude             REAL,
            org_pincode           TEXT NOT NULL DEFAULT '',
            thumbnail             TEXT,
            created_at            TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_users_profession
            ON users(profession);

        CREATE TABLE IF NOT EXISTS connections (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            sender_id    TEXT NOT NULL REFERENCES users(id),
            receiver_id  TEXT NOT NULL REFERENCES users(id),
            accepted     INTEGER NOT NULL DEFAULT 0,
            created_at   TEXT NOT NULL,
            updated_at   TEXT NOT NULL
        );

        -- At most one edge per unordered pair of users
        CREATE UNIQUE INDEX IF NOT EXISTS idx_connections_pair
            ON connections(min(sender_id, receiver_id), max(sender_id, receiver_id));

        CREATE INDEX IF NOT EXISTS idx_connections_receiver
            ON connections(receiver_id, accepted);

        CREATE TABLE IF NOT EXISTS messages (
            id             TEXT PRIMARY KEY,
            connection_id  INTEGER NOT NULL REFERENCES connections(id),
            author_id      TEXT NOT NULL REFERENCES users(id),
            text           TEXT NOT NULL,
            created_at     TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_connection
            ON messages(connection_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
