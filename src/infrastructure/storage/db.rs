use crate::domain::error::DishqError;
use crate::domain::model::{CacheEntry, Dish};
use std::path::Path;
use tokio_rusqlite::Connection;

pub async fn init_database(db_path: &Path) -> Result<Connection, DishqError> {
    let db = Connection::open(db_path.to_path_buf()).await?;
    init_schema(&db).await?;
    Ok(db)
}

/// In-memory database, used by tests.
pub async fn init_database_in_memory() -> Result<Connection, DishqError> {
    let db = Connection::open_in_memory().await?;
    init_schema(&db).await?;
    Ok(db)
}

async fn init_schema(db: &Connection) -> Result<(), DishqError> {
    db.call(|conn| {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS menu_cache (
                restaurant_key TEXT PRIMARY KEY,
                dishes BLOB NOT NULL,
                compressed_size INTEGER NOT NULL,
                original_size INTEGER NOT NULL,
                source_url TEXT,
                created_at INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_menu_cache_created ON menu_cache(created_at)",
            [],
        )?;

        Ok(())
    })
    .await?;

    Ok(())
}

/// Look up the cached menu for a restaurant key.
///
/// Returns `None` when no row exists or the row has outlived the TTL; an
/// expired row is deleted on the way out, so storage stays bounded without a
/// background sweeper. A row aged exactly `ttl_days` is still valid.
pub async fn get_cached(
    db: &Connection,
    key: &str,
    ttl_days: u32,
) -> Result<Option<CacheEntry>, DishqError> {
    get_cached_at(db, key, ttl_days, chrono::Utc::now().timestamp()).await
}

/// TTL check against an explicit clock, for tests.
pub async fn get_cached_at(
    db: &Connection,
    key: &str,
    ttl_days: u32,
    now: i64,
) -> Result<Option<CacheEntry>, DishqError> {
    use rusqlite::OptionalExtension;
    use tokio_rusqlite::params;

    let key_string = key.to_string();
    let row: Option<(Vec<u8>, Option<String>, i64)> = db
        .call(move |conn| {
            conn.query_row(
                "SELECT dishes, source_url, created_at FROM menu_cache WHERE restaurant_key = ?",
                params![key_string],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
        })
        .await?;

    let Some((blob, source_url, created_at)) = row else {
        return Ok(None);
    };

    let ttl_secs = i64::from(ttl_days) * 86_400;
    if now - created_at > ttl_secs {
        tracing::debug!(key, age_secs = now - created_at, "cache entry expired");
        delete_entry(db, key).await?;
        return Ok(None);
    }

    // A blob that no longer decodes is treated like an expired row: drop it
    // and report a miss rather than poisoning the key.
    let dishes = match decode_dishes(&blob) {
        Ok(dishes) => dishes,
        Err(e) => {
            tracing::warn!(key, error = %e, "discarding unreadable cache entry");
            delete_entry(db, key).await?;
            return Ok(None);
        }
    };

    Ok(Some(CacheEntry {
        key: key.to_string(),
        dishes,
        source_url,
        created_at,
    }))
}

/// Unconditional upsert: any prior entry for the key is replaced, never
/// merged.
pub async fn set_cached(
    db: &Connection,
    key: &str,
    dishes: &[Dish],
    source_url: Option<&str>,
) -> Result<(), DishqError> {
    use std::io::Cursor;
    use tokio_rusqlite::params;
    use zstd::stream::encode_all;

    let serialized = serde_json::to_vec(dishes)?;
    let compressed = encode_all(Cursor::new(&serialized), 0)?;
    let now = chrono::Utc::now().timestamp();

    let key_string = key.to_string();
    let source_url = source_url.map(str::to_string);
    let compressed_len = compressed.len();
    let original_len = serialized.len();

    db.call(move |conn| {
        conn.execute(
            "INSERT OR REPLACE INTO menu_cache
             (restaurant_key, dishes, compressed_size, original_size, source_url, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                key_string,
                compressed,
                compressed_len,
                original_len,
                source_url,
                now
            ],
        )
    })
    .await?;

    Ok(())
}

pub async fn entry_count(db: &Connection) -> Result<usize, DishqError> {
    let count: i64 = db
        .call(|conn| conn.query_row("SELECT COUNT(*) FROM menu_cache", [], |row| row.get(0)))
        .await?;
    Ok(count as usize)
}

async fn delete_entry(db: &Connection, key: &str) -> Result<(), DishqError> {
    use tokio_rusqlite::params;

    let key_string = key.to_string();
    db.call(move |conn| {
        conn.execute(
            "DELETE FROM menu_cache WHERE restaurant_key = ?",
            params![key_string],
        )
    })
    .await?;
    Ok(())
}

fn decode_dishes(blob: &[u8]) -> Result<Vec<Dish>, DishqError> {
    use std::io::Cursor;
    use zstd::stream::decode_all;

    let decompressed = decode_all(Cursor::new(blob))?;
    Ok(serde_json::from_slice(&decompressed)?)
}

/// Overwrite a row's timestamp, for TTL tests.
#[doc(hidden)]
pub async fn set_created_at(db: &Connection, key: &str, created_at: i64) -> Result<(), DishqError> {
    use tokio_rusqlite::params;

    let key_string = key.to_string();
    db.call(move |conn| {
        conn.execute(
            "UPDATE menu_cache SET created_at = ? WHERE restaurant_key = ?",
            params![created_at, key_string],
        )
    })
    .await?;
    Ok(())
}

/// Corrupt a row's blob, for cache-corruption tests.
#[doc(hidden)]
pub async fn poison_entry(db: &Connection, key: &str) -> Result<(), DishqError> {
    use tokio_rusqlite::params;

    let key_string = key.to_string();
    db.call(move |conn| {
        conn.execute(
            "UPDATE menu_cache SET dishes = X'DEADBEEF' WHERE restaurant_key = ?",
            params![key_string],
        )
    })
    .await?;
    Ok(())
}
