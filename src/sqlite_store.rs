use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use uuid::Uuid;

use crate::error::{StatError, StatResult};
use crate::record::{MatchId, PlayerId, SetId, StatCounters, StatRecord};
use crate::store::{
    MatchInfo, MatchStore, RosterSlot, SetInfo, StatStore, first_repeated_player,
};

const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

const RECORD_COLUMNS: &str = r#"
    r.record_id, r.set_id, r.player_id, r.is_starter,
    r.attack_attempts, r.kills, r.kill_errors,
    r.three_pass, r.two_pass, r.one_pass, r.zero_pass,
    r.service_attempt, r.service_error, r.service_ace,
    r.digs, r.dig_error, r.blocks, r.block_error,
    r.set_attempts, r.set_error, r.assists,
    r.updated_at
"#;

/// Durable store on a single sqlite connection.
///
/// Record and score updates take the connection lock and run inside an IMMEDIATE
/// transaction, so two increments never interleave, even across handles sharing the file.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> StatResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| {
                StatError::Storage(format!("create {}: {err}", parent.display()))
            })?;
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> StatResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StatResult<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StatResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StatError::Storage("sqlite connection lock poisoned".to_string()))
    }
}

pub fn init_schema(conn: &Connection) -> StatResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS matches (
            match_id INTEGER PRIMARY KEY AUTOINCREMENT,
            opponent TEXT NOT NULL,
            played_on TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sets (
            set_id INTEGER PRIMARY KEY AUTOINCREMENT,
            match_id INTEGER NOT NULL REFERENCES matches(match_id) ON DELETE CASCADE,
            set_number INTEGER NOT NULL,
            home_score INTEGER NOT NULL DEFAULT 0,
            opponent_score INTEGER NOT NULL DEFAULT 0,
            UNIQUE (match_id, set_number)
        );
        CREATE INDEX IF NOT EXISTS idx_sets_match ON sets(match_id);

        CREATE TABLE IF NOT EXISTS stat_lines (
            record_id TEXT PRIMARY KEY,
            set_id INTEGER NOT NULL REFERENCES sets(set_id) ON DELETE CASCADE,
            player_id INTEGER NOT NULL,
            is_starter INTEGER NOT NULL,
            attack_attempts INTEGER NOT NULL DEFAULT 0,
            kills INTEGER NOT NULL DEFAULT 0,
            kill_errors INTEGER NOT NULL DEFAULT 0,
            three_pass INTEGER NOT NULL DEFAULT 0,
            two_pass INTEGER NOT NULL DEFAULT 0,
            one_pass INTEGER NOT NULL DEFAULT 0,
            zero_pass INTEGER NOT NULL DEFAULT 0,
            service_attempt INTEGER NOT NULL DEFAULT 0,
            service_error INTEGER NOT NULL DEFAULT 0,
            service_ace INTEGER NOT NULL DEFAULT 0,
            digs INTEGER NOT NULL DEFAULT 0,
            dig_error INTEGER NOT NULL DEFAULT 0,
            blocks INTEGER NOT NULL DEFAULT 0,
            block_error INTEGER NOT NULL DEFAULT 0,
            set_attempts INTEGER NOT NULL DEFAULT 0,
            set_error INTEGER NOT NULL DEFAULT 0,
            assists INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL,
            UNIQUE (set_id, player_id)
        );
        CREATE INDEX IF NOT EXISTS idx_stat_lines_player ON stat_lines(player_id);
        "#,
    )?;
    Ok(())
}

impl StatStore for SqliteStore {
    fn insert_record(&self, record: &StatRecord) -> StatResult<()> {
        let conn = self.lock()?;
        if select_record(&conn, record.set_id(), record.player_id())?.is_some() {
            return Err(StatError::Duplicate {
                set_id: record.set_id(),
                player_id: record.player_id(),
            });
        }
        insert_record_row(&conn, record)
    }

    fn find_record(&self, set_id: SetId, player_id: PlayerId) -> StatResult<Option<StatRecord>> {
        let conn = self.lock()?;
        select_record(&conn, set_id, player_id)
    }

    fn records_for_player_in_match(
        &self,
        match_id: MatchId,
        player_id: PlayerId,
    ) -> StatResult<Vec<StatRecord>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {RECORD_COLUMNS}
             FROM stat_lines r JOIN sets s ON s.set_id = r.set_id
             WHERE s.match_id = ?1 AND r.player_id = ?2
             ORDER BY s.set_number ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![match_id as i64, player_id], record_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn records_for_match(&self, match_id: MatchId) -> StatResult<Vec<StatRecord>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {RECORD_COLUMNS}
             FROM stat_lines r JOIN sets s ON s.set_id = r.set_id
             WHERE s.match_id = ?1
             ORDER BY s.set_number ASC, r.player_id ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![match_id as i64], record_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn save_record(&self, record: &StatRecord) -> StatResult<()> {
        let conn = self.lock()?;
        update_record_row(&conn, record)
    }

    fn update_record(
        &self,
        set_id: SetId,
        player_id: PlayerId,
        apply: &mut dyn FnMut(&mut StatRecord) -> StatResult<()>,
    ) -> StatResult<StatRecord> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut record =
            select_record(&tx, set_id, player_id)?.ok_or(StatError::NotFound { set_id, player_id })?;
        // Dropping the transaction on error rolls it back.
        apply(&mut record)?;
        update_record_row(&tx, &record)?;
        tx.commit()?;
        Ok(record)
    }
}

impl MatchStore for SqliteStore {
    fn insert_match(&self, opponent: &str, played_on: NaiveDate) -> StatResult<MatchInfo> {
        let conn = self.lock()?;
        let created_at = Utc::now();
        conn.execute(
            "INSERT INTO matches(opponent, played_on, created_at) VALUES (?1, ?2, ?3)",
            params![opponent, played_on.to_string(), created_at.to_rfc3339()],
        )?;
        Ok(MatchInfo {
            id: conn.last_insert_rowid() as MatchId,
            opponent: opponent.to_string(),
            played_on,
            created_at,
        })
    }

    fn find_match(&self, match_id: MatchId) -> StatResult<Option<MatchInfo>> {
        let conn = self.lock()?;
        let info = conn
            .query_row(
                "SELECT match_id, opponent, played_on, created_at FROM matches WHERE match_id = ?1",
                params![match_id as i64],
                |row| {
                    Ok(MatchInfo {
                        id: row.get::<_, i64>(0)? as MatchId,
                        opponent: row.get(1)?,
                        played_on: parse_date(row, 2)?,
                        created_at: parse_timestamp(row, 3)?,
                    })
                },
            )
            .optional()?;
        Ok(info)
    }

    fn create_set(&self, match_id: MatchId, roster: &[RosterSlot]) -> StatResult<SetInfo> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let exists = tx
            .query_row(
                "SELECT 1 FROM matches WHERE match_id = ?1",
                params![match_id as i64],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !exists {
            return Err(StatError::MatchNotFound(match_id));
        }

        let existing: i64 = tx.query_row(
            "SELECT COUNT(*) FROM sets WHERE match_id = ?1",
            params![match_id as i64],
            |row| row.get(0),
        )?;
        let set_number = existing as u32 + 1;
        tx.execute(
            "INSERT INTO sets(match_id, set_number, home_score, opponent_score) VALUES (?1, ?2, 0, 0)",
            params![match_id as i64, set_number],
        )?;
        let set_id = tx.last_insert_rowid() as SetId;
        if let Some(player_id) = first_repeated_player(roster) {
            // Dropping the transaction discards the set row.
            return Err(StatError::Duplicate { set_id, player_id });
        }

        for slot in roster {
            let record = StatRecord::new(set_id, slot.player_id, slot.is_starter);
            insert_record_row(&tx, &record)?;
        }
        tx.commit()?;

        Ok(SetInfo {
            id: set_id,
            match_id,
            set_number,
            home_score: 0,
            opponent_score: 0,
        })
    }

    fn find_set(&self, set_id: SetId) -> StatResult<Option<SetInfo>> {
        let conn = self.lock()?;
        let set = conn
            .query_row(
                "SELECT set_id, match_id, set_number, home_score, opponent_score
                 FROM sets WHERE set_id = ?1",
                params![set_id as i64],
                set_from_row,
            )
            .optional()?;
        Ok(set)
    }

    fn sets_for_match(&self, match_id: MatchId) -> StatResult<Vec<SetInfo>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT set_id, match_id, set_number, home_score, opponent_score
             FROM sets WHERE match_id = ?1
             ORDER BY set_number ASC",
        )?;
        let rows = stmt.query_map(params![match_id as i64], set_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn save_set(&self, set: &SetInfo) -> StatResult<()> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE sets SET home_score = ?1, opponent_score = ?2 WHERE set_id = ?3",
            params![set.home_score, set.opponent_score, set.id as i64],
        )?;
        if changed == 0 {
            return Err(StatError::SetNotFound(set.id));
        }
        Ok(())
    }

    fn update_set(
        &self,
        set_id: SetId,
        apply: &mut dyn FnMut(&mut SetInfo) -> StatResult<()>,
    ) -> StatResult<SetInfo> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut set = tx
            .query_row(
                "SELECT set_id, match_id, set_number, home_score, opponent_score
                 FROM sets WHERE set_id = ?1",
                params![set_id as i64],
                set_from_row,
            )
            .optional()?
            .ok_or(StatError::SetNotFound(set_id))?;
        apply(&mut set)?;
        tx.execute(
            "UPDATE sets SET home_score = ?1, opponent_score = ?2 WHERE set_id = ?3",
            params![set.home_score, set.opponent_score, set_id as i64],
        )?;
        tx.commit()?;
        Ok(set)
    }

    fn delete_match(&self, match_id: MatchId) -> StatResult<bool> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "DELETE FROM matches WHERE match_id = ?1",
            params![match_id as i64],
        )?;
        Ok(changed > 0)
    }
}

fn select_record(
    conn: &Connection,
    set_id: SetId,
    player_id: PlayerId,
) -> StatResult<Option<StatRecord>> {
    let sql = format!(
        "SELECT {RECORD_COLUMNS} FROM stat_lines r WHERE r.set_id = ?1 AND r.player_id = ?2"
    );
    let record = conn
        .query_row(&sql, params![set_id as i64, player_id], record_from_row)
        .optional()?;
    Ok(record)
}

fn insert_record_row(conn: &Connection, record: &StatRecord) -> StatResult<()> {
    let c = &record.counters;
    conn.execute(
        r#"
        INSERT INTO stat_lines (
            record_id, set_id, player_id, is_starter,
            attack_attempts, kills, kill_errors,
            three_pass, two_pass, one_pass, zero_pass,
            service_attempt, service_error, service_ace,
            digs, dig_error, blocks, block_error,
            set_attempts, set_error, assists,
            updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4,
            ?5, ?6, ?7,
            ?8, ?9, ?10, ?11,
            ?12, ?13, ?14,
            ?15, ?16, ?17, ?18,
            ?19, ?20, ?21,
            ?22
        )
        "#,
        params![
            record.id().to_string(),
            record.set_id() as i64,
            record.player_id(),
            record.is_starter,
            c.attack_attempts,
            c.kills,
            c.kill_errors,
            c.three_pass,
            c.two_pass,
            c.one_pass,
            c.zero_pass,
            c.service_attempt,
            c.service_error,
            c.service_ace,
            c.digs,
            c.dig_error,
            c.blocks,
            c.block_error,
            c.set_attempts,
            c.set_error,
            c.assists,
            record.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn update_record_row(conn: &Connection, record: &StatRecord) -> StatResult<()> {
    let c = &record.counters;
    let changed = conn.execute(
        r#"
        UPDATE stat_lines SET
            attack_attempts = ?3, kills = ?4, kill_errors = ?5,
            three_pass = ?6, two_pass = ?7, one_pass = ?8, zero_pass = ?9,
            service_attempt = ?10, service_error = ?11, service_ace = ?12,
            digs = ?13, dig_error = ?14, blocks = ?15, block_error = ?16,
            set_attempts = ?17, set_error = ?18, assists = ?19,
            updated_at = ?20
        WHERE set_id = ?1 AND player_id = ?2
        "#,
        params![
            record.set_id() as i64,
            record.player_id(),
            c.attack_attempts,
            c.kills,
            c.kill_errors,
            c.three_pass,
            c.two_pass,
            c.one_pass,
            c.zero_pass,
            c.service_attempt,
            c.service_error,
            c.service_ace,
            c.digs,
            c.dig_error,
            c.blocks,
            c.block_error,
            c.set_attempts,
            c.set_error,
            c.assists,
            record.updated_at.to_rfc3339(),
        ],
    )?;
    if changed == 0 {
        return Err(StatError::NotFound {
            set_id: record.set_id(),
            player_id: record.player_id(),
        });
    }
    Ok(())
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<StatRecord> {
    let raw_id: String = row.get(0)?;
    let id = Uuid::parse_str(&raw_id)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(err)))?;
    let counters = StatCounters {
        attack_attempts: row.get(4)?,
        kills: row.get(5)?,
        kill_errors: row.get(6)?,
        three_pass: row.get(7)?,
        two_pass: row.get(8)?,
        one_pass: row.get(9)?,
        zero_pass: row.get(10)?,
        service_attempt: row.get(11)?,
        service_error: row.get(12)?,
        service_ace: row.get(13)?,
        digs: row.get(14)?,
        dig_error: row.get(15)?,
        blocks: row.get(16)?,
        block_error: row.get(17)?,
        set_attempts: row.get(18)?,
        set_error: row.get(19)?,
        assists: row.get(20)?,
    };
    Ok(StatRecord::from_parts(
        id,
        row.get::<_, i64>(1)? as SetId,
        row.get(2)?,
        row.get::<_, i64>(3)? != 0,
        counters,
        parse_timestamp(row, 21)?,
    ))
}

fn set_from_row(row: &Row<'_>) -> rusqlite::Result<SetInfo> {
    Ok(SetInfo {
        id: row.get::<_, i64>(0)? as SetId,
        match_id: row.get::<_, i64>(1)? as MatchId,
        set_number: row.get(2)?,
        home_score: row.get(3)?,
        opponent_score: row.get(4)?,
    })
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

fn parse_date(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    raw.parse::<NaiveDate>()
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}
