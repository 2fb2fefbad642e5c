use crate::models::{
    ConnectionRow, EdgeRow, FriendRow, MessageRow, NewUser, ProfileChanges, SearchHit, UserRow,
};
use crate::{Database, now_timestamp};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use std::collections::HashMap;
use uuid::Uuid;

const USER_COLUMNS: [&str; 18] = [
    "id",
    "username",
    "password",
    "first_name",
    "last_name",
    "email",
    "phone_no",
    "address",
    "pincode",
    "organization_name",
    "organization_address",
    "profession",
    "location",
    "latitude",
    "longitude",
    "org_pincode",
    "thumbnail",
    "created_at",
];

impl Database {
    // -- Users --

    pub fn create_user(&self, user: &NewUser) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password, first_name, last_name, email, phone_no,
                    address, pincode, organization_name, organization_address, profession,
                    location, latitude, longitude, org_pincode, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
                params![
                    user.id,
                    user.username,
                    user.password_hash,
                    user.first_name,
                    user.last_name,
                    user.email,
                    user.phone_no,
                    user.address,
                    user.pincode,
                    user.organization_name,
                    user.organization_address,
                    user.profession,
                    user.location,
                    user.latitude,
                    user.longitude,
                    user.org_pincode,
                    now_timestamp(),
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    pub fn set_thumbnail(&self, user_id: &str, thumbnail: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE users SET thumbnail = ?1 WHERE id = ?2",
                params![thumbnail, user_id],
            )?;
            Ok(n == 1)
        })
    }

    /// Apply the given profile changes to `user_id`. Fields left as `None`
    /// keep their stored value; the username is never touched. Returns false
    /// when no such user exists.
    pub fn update_profile(&self, user_id: &str, changes: &ProfileChanges) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE users SET
                    first_name = COALESCE(?2, first_name),
                    last_name = COALESCE(?3, last_name),
                    email = COALESCE(?4, email),
                    phone_no = COALESCE(?5, phone_no),
                    address = COALESCE(?6, address),
                    pincode = COALESCE(?7, pincode),
                    organization_name = COALESCE(?8, organization_name),
                    organization_address = COALESCE(?9, organization_address),
                    profession = COALESCE(?10, profession),
                    location = COALESCE(?11, location),
                    latitude = COALESCE(?12, latitude),
                    longitude = COALESCE(?13, longitude),
                    org_pincode = COALESCE(?14, org_pincode)
                 WHERE id = ?1",
                params![
                    user_id,
                    changes.first_name,
                    changes.last_name,
                    changes.email,
                    changes.phone_no,
                    changes.address,
                    changes.pincode,
                    changes.organization_name,
                    changes.organization_address,
                    changes.profession,
                    changes.location,
                    changes.latitude,
                    changes.longitude,
                    changes.org_pincode,
                ],
            )?;
            Ok(n == 1)
        })
    }

    /// Users whose handle, first/last name, location or profession starts
    /// with `query` (Unicode case-insensitive), excluding the caller. Each
    /// hit carries the caller's edge to that user, fetched in one batch.
    pub fn search_users(&self, caller_id: &str, query: &str) -> Result<Vec<SearchHit>> {
        self.with_conn(|conn| {
            let pattern = format!("{}%", escape_like(&query.to_lowercase()));
            let sql = format!(
                "SELECT {} FROM users u
                 WHERE u.id != ?1
                   AND (fold(u.username) LIKE ?2 ESCAPE '\\'
                     OR fold(u.first_name) LIKE ?2 ESCAPE '\\'
                     OR fold(u.last_name) LIKE ?2 ESCAPE '\\'
                     OR fold(u.location) LIKE ?2 ESCAPE '\\'
                     OR fold(u.profession) LIKE ?2 ESCAPE '\\')
                 ORDER BY u.username",
                user_cols("u")
            );
            let mut stmt = conn.prepare(&sql)?;
            let users = stmt
                .query_map(params![caller_id, pattern], |row| user_from_row(row, 0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let ids: Vec<&str> = users.iter().map(|u| u.id.as_str()).collect();
            let mut edges = query_edges(conn, caller_id, &ids)?;

            Ok(users
                .into_iter()
                .map(|user| {
                    let edge = edges.remove(&user.id);
                    SearchHit { user, edge }
                })
                .collect())
        })
    }

    /// Users of the given professions in registration order.
    pub fn team_candidates(&self, professions: &[&str]) -> Result<Vec<UserRow>> {
        if professions.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM users u WHERE u.profession IN ({}) ORDER BY u.rowid",
                user_cols("u"),
                placeholders(1, professions.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(professions.iter()), |row| {
                    user_from_row(row, 0)
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Connections --

    /// Returns the edge between the two users, creating a pending one with
    /// `sender_id` as sender if neither direction exists yet. The flag is
    /// true when a row was inserted.
    pub fn get_or_create_connection(
        &self,
        sender_id: &str,
        receiver_id: &str,
    ) -> Result<(ConnectionRow, bool)> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let existing: Option<i64> = tx
                .query_row(
                    "SELECT id FROM connections
                     WHERE (sender_id = ?1 AND receiver_id = ?2)
                        OR (sender_id = ?2 AND receiver_id = ?1)",
                    params![sender_id, receiver_id],
                    |row| row.get(0),
                )
                .optional()?;

            let (id, created) = match existing {
                Some(id) => (id, false),
                None => {
                    let now = now_timestamp();
                    tx.execute(
                        "INSERT INTO connections (sender_id, receiver_id, accepted, created_at, updated_at)
                         VALUES (?1, ?2, 0, ?3, ?3)",
                        params![sender_id, receiver_id, now],
                    )?;
                    (tx.last_insert_rowid(), true)
                }
            };

            let row = query_connection(&tx, id)?
                .ok_or_else(|| anyhow::anyhow!("Connection {} vanished", id))?;
            tx.commit()?;
            Ok((row, created))
        })
    }

    pub fn get_connection(&self, id: i64) -> Result<Option<ConnectionRow>> {
        self.with_conn(|conn| query_connection(conn, id))
    }

    /// Flip the pending edge sent by `sender_username` to `receiver_id` to
    /// accepted. Returns `None` when no such pending edge exists, which
    /// covers calls from the sender or from a third party.
    pub fn accept_pending(
        &self,
        sender_username: &str,
        receiver_id: &str,
    ) -> Result<Option<ConnectionRow>> {
        self.with_conn(|conn| {
            let id: Option<i64> = conn
                .query_row(
                    "UPDATE connections SET accepted = 1, updated_at = ?3
                     WHERE accepted = 0
                       AND receiver_id = ?2
                       AND sender_id = (SELECT id FROM users WHERE username = ?1)
                     RETURNING id",
                    params![sender_username, receiver_id, now_timestamp()],
                    |row| row.get(0),
                )
                .optional()?;

            match id {
                Some(id) => query_connection(conn, id),
                None => Ok(None),
            }
        })
    }

    /// Pending requests addressed to `receiver_id`, newest first.
    pub fn list_pending_for(&self, receiver_id: &str) -> Result<Vec<ConnectionRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} WHERE c.receiver_id = ?1 AND c.accepted = 0 ORDER BY c.created_at DESC, c.id DESC",
                connection_select()
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([receiver_id], connection_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Accepted connections of `user_id`, each with its latest message,
    /// ordered by most recent activity first.
    pub fn list_friends(&self, user_id: &str) -> Result<Vec<FriendRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} WHERE (c.sender_id = ?1 OR c.receiver_id = ?1) AND c.accepted = 1",
                connection_select()
            );
            let mut stmt = conn.prepare(&sql)?;
            let connections = stmt
                .query_map([user_id], connection_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let ids: Vec<i64> = connections.iter().map(|c| c.id).collect();
            let mut latest = query_latest_messages(conn, &ids)?;

            let mut friends: Vec<FriendRow> = connections
                .into_iter()
                .map(|connection| {
                    let (latest_text, latest_created) = match latest.remove(&connection.id) {
                        Some((text, created)) => (Some(text), Some(created)),
                        None => (None, None),
                    };
                    FriendRow {
                        connection,
                        latest_text,
                        latest_created,
                    }
                })
                .collect();

            friends.sort_by(|a, b| b.activity().cmp(a.activity()));
            Ok(friends)
        })
    }

    // -- Messages --

    pub fn insert_message(
        &self,
        connection_id: i64,
        author_id: &str,
        text: &str,
    ) -> Result<MessageRow> {
        let row = MessageRow {
            id: Uuid::new_v4().to_string(),
            connection_id,
            author_id: author_id.to_string(),
            text: text.to_string(),
            created_at: now_timestamp(),
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, connection_id, author_id, text, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![row.id, row.connection_id, row.author_id, row.text, row.created_at],
            )?;
            Ok(())
        })?;

        Ok(row)
    }

    /// Messages of one connection, newest first, starting at `offset`.
    pub fn page_messages(
        &self,
        connection_id: i64,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, connection_id, author_id, text, created_at
                 FROM messages
                 WHERE connection_id = ?1
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?2 OFFSET ?3",
            )?;

            let rows = stmt
                .query_map(params![connection_id, limit, offset as i64], |row| {
                    Ok(MessageRow {
                        id: row.get(0)?,
                        connection_id: row.get(1)?,
                        author_id: row.get(2)?,
                        text: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn count_messages(&self, connection_id: i64) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE connection_id = ?1",
                [connection_id],
                |row| row.get(0),
            )?;
            Ok(n as u64)
        })
    }
}

fn user_cols(alias: &str) -> String {
    USER_COLUMNS
        .iter()
        .map(|c| format!("{}.{}", alias, c))
        .collect::<Vec<_>>()
        .join(", ")
}

fn placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Escape LIKE wildcards so user input only ever matches literally.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn user_from_row(row: &Row<'_>, base: usize) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(base)?,
        username: row.get(base + 1)?,
        password: row.get(base + 2)?,
        first_name: row.get(base + 3)?,
        last_name: row.get(base + 4)?,
        email: row.get(base + 5)?,
        phone_no: row.get(base + 6)?,
        address: row.get(base + 7)?,
        pincode: row.get(base + 8)?,
        organization_name: row.get(base + 9)?,
        organization_address: row.get(base + 10)?,
        profession: row.get(base + 11)?,
        location: row.get(base + 12)?,
        latitude: row.get(base + 13)?,
        longitude: row.get(base + 14)?,
        org_pincode: row.get(base + 15)?,
        thumbnail: row.get(base + 16)?,
        created_at: row.get(base + 17)?,
    })
}

fn connection_select() -> String {
    format!(
        "SELECT c.id, c.accepted, c.created_at, c.updated_at, {}, {}
         FROM connections c
         JOIN users s ON s.id = c.sender_id
         JOIN users r ON r.id = c.receiver_id",
        user_cols("s"),
        user_cols("r")
    )
}

fn connection_from_row(row: &Row<'_>) -> rusqlite::Result<ConnectionRow> {
    Ok(ConnectionRow {
        id: row.get(0)?,
        accepted: row.get(1)?,
        created_at: row.get(2)?,
        updated_at: row.get(3)?,
        sender: user_from_row(row, 4)?,
        receiver: user_from_row(row, 4 + USER_COLUMNS.len())?,
    })
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {} FROM users u WHERE u.{} = ?1", user_cols("u"), column);
    let row = conn
        .query_row(&sql, [value], |row| user_from_row(row, 0))
        .optional()?;
    Ok(row)
}

fn query_connection(conn: &Connection, id: i64) -> Result<Option<ConnectionRow>> {
    let sql = format!("{} WHERE c.id = ?1", connection_select());
    let row = conn.query_row(&sql, [id], connection_from_row).optional()?;
    Ok(row)
}

/// The caller's edges to each of `user_ids`, keyed by the other user's id.
fn query_edges(
    conn: &Connection,
    caller_id: &str,
    user_ids: &[&str],
) -> Result<HashMap<String, EdgeRow>> {
    if user_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let list = placeholders(2, user_ids.len());
    let sql = format!(
        "SELECT sender_id, receiver_id, accepted FROM connections
         WHERE (sender_id = ?1 AND receiver_id IN ({list}))
            OR (receiver_id = ?1 AND sender_id IN ({list}))"
    );

    let mut params: Vec<&str> = Vec::with_capacity(user_ids.len() + 1);
    params.push(caller_id);
    params.extend_from_slice(user_ids);

    let mut stmt = conn.prepare(&sql)?;
    let edges = stmt
        .query_map(params_from_iter(params.iter()), |row| {
            Ok(EdgeRow {
                sender_id: row.get(0)?,
                receiver_id: row.get(1)?,
                accepted: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(edges
        .into_iter()
        .map(|edge| {
            let other = if edge.sender_id == caller_id {
                edge.receiver_id.clone()
            } else {
                edge.sender_id.clone()
            };
            (other, edge)
        })
        .collect())
}

/// Latest (text, created_at) per connection in one windowed query.
fn query_latest_messages(
    conn: &Connection,
    connection_ids: &[i64],
) -> Result<HashMap<i64, (String, String)>> {
    if connection_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let sql = format!(
        "SELECT connection_id, text, created_at FROM (
             SELECT connection_id, text, created_at,
                    ROW_NUMBER() OVER (
                        PARTITION BY connection_id ORDER BY created_at DESC, rowid DESC
                    ) AS rn
             FROM messages
             WHERE connection_id IN ({})
         ) WHERE rn = 1",
        placeholders(1, connection_ids.len())
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(connection_ids.iter()), |row| {
            Ok((row.get::<_, i64>(0)?, (row.get(1)?, row.get(2)?)))
        })?
        .collect::<std::result::Result<HashMap<_, _>, _>>()?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_user(db: &Database, username: &str, profession: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_user(&NewUser {
            id: id.clone(),
            username: username.to_string(),
            password_hash: "x".into(),
            first_name: username.to_string(),
            last_name: "tester".into(),
            profession: profession.to_string(),
            location: "pune".into(),
            ..Default::default()
        })
        .unwrap();
        id
    }

    #[test]
    fn test_get_or_create_is_idempotent_across_directions() {
        let db = Database::open_in_memory().unwrap();
        let a = add_user(&db, "alice", "doctor");
        let b = add_user(&db, "bob", "nurse");

        let (first, created) = db.get_or_create_connection(&a, &b).unwrap();
        assert!(created);
        let (again, created) = db.get_or_create_connection(&a, &b).unwrap();
        assert!(!created);
        let (reverse, created) = db.get_or_create_connection(&b, &a).unwrap();
        assert!(!created);

        assert_eq!(first.id, again.id);
        assert_eq!(first.id, reverse.id);
        assert_eq!(reverse.sender.username, "alice");
    }

    #[test]
    fn test_pair_index_rejects_reverse_duplicate() {
        let db = Database::open_in_memory().unwrap();
        let a = add_user(&db, "alice", "");
        let b = add_user(&db, "bob", "");
        db.get_or_create_connection(&a, &b).unwrap();

        let dup = db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO connections (sender_id, receiver_id, created_at, updated_at)
                 VALUES (?1, ?2, 'x', 'x')",
                params![b, a],
            )?;
            Ok(())
        });
        assert!(dup.is_err());
    }

    #[test]
    fn test_accept_only_by_receiver() {
        let db = Database::open_in_memory().unwrap();
        let a = add_user(&db, "alice", "");
        let b = add_user(&db, "bob", "");
        let c = add_user(&db, "carol", "");
        db.get_or_create_connection(&a, &b).unwrap();

        // sender cannot accept its own request
        assert!(db.accept_pending("bob", &a).unwrap().is_none());
        // third party cannot accept
        assert!(db.accept_pending("alice", &c).unwrap().is_none());

        let accepted = db.accept_pending("alice", &b).unwrap().unwrap();
        assert!(accepted.accepted);
        // second accept is a no-op
        assert!(db.accept_pending("alice", &b).unwrap().is_none());
        assert!(db.list_pending_for(&b).unwrap().is_empty());
    }

    #[test]
    fn test_paging_and_count() {
        let db = Database::open_in_memory().unwrap();
        let a = add_user(&db, "alice", "");
        let b = add_user(&db, "bob", "");
        let (conn, _) = db.get_or_create_connection(&a, &b).unwrap();

        for i in 0..20 {
            db.insert_message(conn.id, &a, &format!("m{}", i)).unwrap();
        }
        assert_eq!(db.count_messages(conn.id).unwrap(), 20);

        let first = db.page_messages(conn.id, 0, 15).unwrap();
        let second = db.page_messages(conn.id, 15, 15).unwrap();
        assert_eq!(first.len(), 15);
        assert_eq!(second.len(), 5);
        assert_eq!(first[0].text, "m19");
        assert_eq!(first[14].text, "m5");
        assert_eq!(second[0].text, "m4");
        assert_eq!(second[4].text, "m0");
    }

    #[test]
    fn test_friend_list_orders_by_activity() {
        let db = Database::open_in_memory().unwrap();
        let a = add_user(&db, "alice", "");
        let b = add_user(&db, "bob", "");
        let c = add_user(&db, "carol", "");

        let (ab, _) = db.get_or_create_connection(&a, &b).unwrap();
        db.get_or_create_connection(&c, &a).unwrap();
        db.accept_pending("alice", &b).unwrap().unwrap();
        db.accept_pending("carol", &a).unwrap().unwrap();

        // carol's edge was accepted last, so it leads until bob talks
        let friends = db.list_friends(&a).unwrap();
        assert_eq!(friends.len(), 2);
        assert_eq!(friends[0].connection.sender.username, "carol");
        assert!(friends[0].latest_text.is_none());

        db.insert_message(ab.id, &b, "hello").unwrap();
        let friends = db.list_friends(&a).unwrap();
        assert_eq!(friends[0].connection.id, ab.id);
        assert_eq!(friends[0].latest_text.as_deref(), Some("hello"));
    }

    #[test]
    fn test_search_prefix_and_edges() {
        let db = Database::open_in_memory().unwrap();
        let a = add_user(&db, "alice", "doctor");
        let b = add_user(&db, "bob", "doctor");
        add_user(&db, "dora", "nurse");
        db.get_or_create_connection(&a, &b).unwrap();

        let hits = db.search_users(&a, "DO").unwrap();
        let names: Vec<&str> = hits.iter().map(|h| h.user.username.as_str()).collect();
        // bob matches on profession, dora on username; alice is the caller
        assert_eq!(names, vec!["bob", "dora"]);
        assert_eq!(
            hits[0].edge,
            Some(EdgeRow {
                sender_id: a.clone(),
                receiver_id: b.clone(),
                accepted: false
            })
        );
        assert!(hits[1].edge.is_none());

        assert!(db.search_users(&a, "%").unwrap().is_empty());
    }

    #[test]
    fn test_search_folds_non_ascii_case() {
        let db = Database::open_in_memory().unwrap();
        let caller = add_user(&db, "caller", "");
        db.create_user(&NewUser {
            id: Uuid::new_v4().to_string(),
            username: "emile".into(),
            password_hash: "x".into(),
            first_name: "émile".into(),
            location: "Örebro".into(),
            ..Default::default()
        })
        .unwrap();

        for query in ["É", "é", "ÉMI", "ö", "Ö", "öRE"] {
            let hits = db.search_users(&caller, query).unwrap();
            assert_eq!(hits.len(), 1, "query {:?}", query);
            assert_eq!(hits[0].user.username, "emile");
        }
        assert!(db.search_users(&caller, "émx").unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_username_is_unique_violation() {
        let db = Database::open_in_memory().unwrap();
        add_user(&db, "alice", "");
        let err = db
            .create_user(&NewUser {
                id: Uuid::new_v4().to_string(),
                username: "alice".into(),
                password_hash: "x".into(),
                ..Default::default()
            })
            .unwrap_err();
        assert!(crate::is_unique_violation(&err));

        let other = anyhow::anyhow!("something else");
        assert!(!crate::is_unique_violation(&other));
    }

    #[test]
    fn test_update_profile_keeps_username() {
        let db = Database::open_in_memory().unwrap();
        let a = add_user(&db, "alice", "doctor");

        let changed = db
            .update_profile(
                &a,
                &ProfileChanges {
                    location: Some("mumbai".into()),
                    latitude: Some(19.07),
                    longitude: Some(72.87),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(changed);

        let row = db.get_user_by_id(&a).unwrap().unwrap();
        assert_eq!(row.username, "alice");
        assert_eq!(row.location, "mumbai");
        assert_eq!(row.latitude, Some(19.07));
        // untouched fields keep their values
        assert_eq!(row.profession, "doctor");
        assert_eq!(row.first_name, "alice");

        assert!(!db.update_profile("missing", &ProfileChanges::default()).unwrap());
    }

    #[test]
    fn test_team_candidates_in_registration_order() {
        let db = Database::open_in_memory().unwrap();
        add_user(&db, "zed", "doctor");
        add_user(&db, "amy", "nurse");
        add_user(&db, "bea", "doctor");
        add_user(&db, "cal", "chef");

        let rows = db.team_candidates(&["doctor", "nurse"]).unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r.username.as_str()).collect();
        assert_eq!(names, vec!["zed", "amy", "bea"]);
    }
}
