//! PostgreSQL store
//!
//! Uses the relational EAV layout: one `config_value` row per attribute per
//! config row, with one nullable column per data type.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use rankwise_core::{
    AttrId, Attribute, AttributeCatalog, ConfigRow, ConfigVersionId, DataType, MatchType,
    PrecedenceRule, Role, ValueColumns, VersionKey, VersionMeta,
};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use std::collections::BTreeMap;

use crate::{ConfigStore, RepositoryError, RepositoryResult, StoredVersion};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS attribute (
    attr_id    BIGINT PRIMARY KEY,
    attr_name  TEXT NOT NULL UNIQUE,
    role       TEXT NOT NULL CHECK (role IN ('match', 'param')),
    data_type  TEXT NOT NULL CHECK (data_type IN ('int', 'dec', 'str', 'bool', 'dt'))
);

CREATE TABLE IF NOT EXISTS config (
    config_id    SERIAL PRIMARY KEY,
    config_name  TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS config_version (
    config_version_id  SERIAL PRIMARY KEY,
    config_id          INTEGER NOT NULL REFERENCES config (config_id),
    version_num        BIGINT NOT NULL,
    bundle_id          BIGINT NOT NULL,
    bundle_name        TEXT NOT NULL,
    updated_by         TEXT,
    update_date        TEXT,
    UNIQUE (config_id, version_num)
);

CREATE TABLE IF NOT EXISTS config_row (
    row_id             SERIAL PRIMARY KEY,
    config_version_id  INTEGER NOT NULL REFERENCES config_version (config_version_id),
    row_index          INTEGER NOT NULL,
    UNIQUE (config_version_id, row_index)
);

CREATE TABLE IF NOT EXISTS config_value (
    row_id      INTEGER NOT NULL REFERENCES config_row (row_id),
    attr_id     BIGINT NOT NULL REFERENCES attribute (attr_id),
    is_all      BOOLEAN NOT NULL DEFAULT FALSE,
    int_value   BIGINT,
    dec_value   NUMERIC,
    str_value   TEXT,
    bool_value  BOOLEAN,
    dt_value    TIMESTAMPTZ,
    PRIMARY KEY (row_id, attr_id)
);

CREATE TABLE IF NOT EXISTS precedence_rule (
    config_version_id  INTEGER NOT NULL REFERENCES config_version (config_version_id),
    rank               BIGINT NOT NULL CHECK (rank >= 1),
    attr_id            BIGINT NOT NULL REFERENCES attribute (attr_id),
    match_type         SMALLINT NOT NULL CHECK (match_type IN (0, 1)),
    PRIMARY KEY (config_version_id, rank, attr_id)
);
"#;

/// PostgreSQL-backed store
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect to `database_url`
    ///
    /// # Example
    /// ```no_run
    /// use rankwise_repository::PostgresStore;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let store = PostgresStore::connect("postgresql://localhost/rankwise", 5).await?;
    ///     store.migrate().await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn connect(database_url: &str, max_connections: u32) -> RepositoryResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Create a store with an existing pool
    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the tables if they do not exist
    pub async fn migrate(&self) -> RepositoryResult<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        tracing::info!("PostgreSQL schema is up to date");
        Ok(())
    }

    async fn load_rows(
        &self,
        catalog: &AttributeCatalog,
        config_version_id: i32,
    ) -> RepositoryResult<Vec<ConfigRow>> {
        let records = sqlx::query(
            r#"
            SELECT r.row_index, v.attr_id, v.is_all, v.int_value, v.dec_value,
                   v.str_value, v.bool_value, v.dt_value
            FROM config_row r
            JOIN config_value v ON v.row_id = r.row_id
            WHERE r.config_version_id = $1
            ORDER BY r.row_index, v.attr_id
            "#,
        )
        .bind(config_version_id)
        .fetch_all(&self.pool)
        .await?;

        let mut rows: BTreeMap<i32, ConfigRow> = BTreeMap::new();
        for record in records {
            let row_index: i32 = record.try_get("row_index")?;
            let attr = attribute(catalog, record.try_get("attr_id")?)?;
            let columns = ValueColumns {
                is_all: record.try_get("is_all")?,
                int_value: record.try_get::<Option<i64>, _>("int_value")?,
                dec_value: record.try_get::<Option<BigDecimal>, _>("dec_value")?,
                str_value: record.try_get::<Option<String>, _>("str_value")?,
                bool_value: record.try_get::<Option<bool>, _>("bool_value")?,
                dt_value: record.try_get::<Option<DateTime<Utc>>, _>("dt_value")?,
            };

            let row = rows.entry(row_index).or_default();
            match attr.role {
                Role::Match => {
                    row.matches.insert(attr.id, columns.into_match(attr)?);
                }
                Role::Param => {
                    row.params.insert(attr.id, columns.into_typed(attr)?);
                }
            }
        }
        Ok(rows.into_values().collect())
    }

    async fn load_rules(&self, config_version_id: i32) -> RepositoryResult<Vec<PrecedenceRule>> {
        let records = sqlx::query(
            r#"
            SELECT rank, attr_id, match_type
            FROM precedence_rule
            WHERE config_version_id = $1
            ORDER BY rank, attr_id
            "#,
        )
        .bind(config_version_id)
        .fetch_all(&self.pool)
        .await?;

        records
            .into_iter()
            .map(|record| -> RepositoryResult<PrecedenceRule> {
                let rank = to_u32(record.try_get("rank")?, "rank")?;
                let attr_id = AttrId(to_u32(record.try_get("attr_id")?, "attr_id")?);
                let raw: i16 = record.try_get("match_type")?;
                let match_type = u8::try_from(raw)
                    .map_err(|_| RepositoryError::Other(format!("match_type {} out of range", raw)))
                    .and_then(|v| MatchType::try_from(v).map_err(RepositoryError::from))?;
                Ok(PrecedenceRule {
                    config_version_id: ConfigVersionId(to_u32(i64::from(config_version_id), "config_version_id")?),
                    rank,
                    attr_id,
                    match_type,
                })
            })
            .collect()
    }
}

fn to_u32(value: i64, column: &str) -> RepositoryResult<u32> {
    u32::try_from(value).map_err(|_| RepositoryError::Other(format!("{} {} out of range", column, value)))
}

fn attribute(catalog: &AttributeCatalog, raw_id: i64) -> RepositoryResult<&Attribute> {
    let id = AttrId(to_u32(raw_id, "attr_id")?);
    catalog.get(id).ok_or_else(|| RepositoryError::NotFound {
        what: format!("attribute {}", id),
    })
}

#[async_trait]
impl ConfigStore for PostgresStore {
    async fn load_catalog(&self) -> RepositoryResult<AttributeCatalog> {
        let records = sqlx::query("SELECT attr_id, attr_name, role, data_type FROM attribute ORDER BY attr_id")
            .fetch_all(&self.pool)
            .await?;

        let attributes = records
            .into_iter()
            .map(|record| -> RepositoryResult<Attribute> {
                let role: String = record.try_get("role")?;
                let data_type: String = record.try_get("data_type")?;
                Ok(Attribute {
                    id: AttrId(to_u32(record.try_get("attr_id")?, "attr_id")?),
                    name: record.try_get("attr_name")?,
                    role: role.parse::<Role>()?,
                    data_type: data_type.parse::<DataType>()?,
                })
            })
            .collect::<RepositoryResult<Vec<_>>>()?;
        Ok(AttributeCatalog::from_attributes(attributes)?)
    }

    async fn save_catalog(&self, catalog: &AttributeCatalog) -> RepositoryResult<()> {
        let mut tx = self.pool.begin().await?;
        for attr in catalog.iter() {
            let existing = sqlx::query("SELECT attr_name, role, data_type FROM attribute WHERE attr_id = $1")
                .bind(i64::from(attr.id.0))
                .fetch_optional(&mut *tx)
                .await?;

            match existing {
                Some(record) => {
                    let name: String = record.try_get("attr_name")?;
                    let role: String = record.try_get("role")?;
                    let data_type: String = record.try_get("data_type")?;
                    if name != attr.name || role != attr.role.as_str() || data_type != attr.data_type.as_str() {
                        return Err(RepositoryError::AlreadyExists {
                            what: format!("attribute {} as '{}'", attr.id, name),
                        });
                    }
                }
                None => {
                    sqlx::query("INSERT INTO attribute (attr_id, attr_name, role, data_type) VALUES ($1, $2, $3, $4)")
                        .bind(i64::from(attr.id.0))
                        .bind(&attr.name)
                        .bind(attr.role.as_str())
                        .bind(attr.data_type.as_str())
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }
        tx.commit().await?;
        Ok(())
    }

    async fn load_version(&self, key: &VersionKey) -> RepositoryResult<StoredVersion> {
        let record = sqlx::query(
            r#"
            SELECT cv.config_version_id, cv.bundle_id, cv.bundle_name, cv.updated_by, cv.update_date
            FROM config_version cv
            JOIN config c ON c.config_id = cv.config_id
            WHERE c.config_name = $1 AND cv.version_num = $2
            "#,
        )
        .bind(key.config_id.as_str())
        .bind(i64::from(key.version_num))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound {
            what: format!("version {}", key),
        })?;

        let config_version_id: i32 = record.try_get("config_version_id")?;
        let meta = VersionMeta {
            bundle_id: record.try_get("bundle_id")?,
            bundle_name: record.try_get("bundle_name")?,
            updated_by: record.try_get("updated_by")?,
            update_date: record.try_get("update_date")?,
        };

        let catalog = self.load_catalog().await?;
        let rows = self.load_rows(&catalog, config_version_id).await?;
        let rules = self.load_rules(config_version_id).await?;
        Ok(StoredVersion::new(key.clone(), meta, rows, rules))
    }

    async fn save_version(&self, version: &StoredVersion) -> RepositoryResult<()> {
        let mut tx = self.pool.begin().await?;

        let config_id: i32 = sqlx::query(
            r#"
            INSERT INTO config (config_name) VALUES ($1)
            ON CONFLICT (config_name) DO UPDATE SET config_name = EXCLUDED.config_name
            RETURNING config_id
            "#,
        )
        .bind(version.key.config_id.as_str())
        .fetch_one(&mut *tx)
        .await?
        .try_get("config_id")?;

        let config_version_id: Option<i32> = sqlx::query(
            r#"
            INSERT INTO config_version
                (config_id, version_num, bundle_id, bundle_name, updated_by, update_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (config_id, version_num) DO NOTHING
            RETURNING config_version_id
            "#,
        )
        .bind(config_id)
        .bind(i64::from(version.key.version_num))
        .bind(version.meta.bundle_id)
        .bind(&version.meta.bundle_name)
        .bind(&version.meta.updated_by)
        .bind(&version.meta.update_date)
        .fetch_optional(&mut *tx)
        .await?
        .map(|record| record.try_get("config_version_id"))
        .transpose()?;
        let Some(config_version_id) = config_version_id else {
            return Err(RepositoryError::AlreadyExists {
                what: format!("version {}", version.key),
            });
        };

        for (index, row) in version.rows.iter().enumerate() {
            let row_index = i32::try_from(index)
                .map_err(|_| RepositoryError::Other(format!("row index {} out of range", index)))?;
            let row_id: i32 = sqlx::query(
                "INSERT INTO config_row (config_version_id, row_index) VALUES ($1, $2) RETURNING row_id",
            )
            .bind(config_version_id)
            .bind(row_index)
            .fetch_one(&mut *tx)
            .await?
            .try_get("row_id")?;

            let values = row
                .matches
                .iter()
                .map(|(attr, value)| (*attr, ValueColumns::from_match(value)))
                .chain(
                    row.params
                        .iter()
                        .map(|(attr, value)| (*attr, ValueColumns::from_typed(value))),
                );
            for (attr, columns) in values {
                sqlx::query(
                    r#"
                    INSERT INTO config_value
                        (row_id, attr_id, is_all, int_value, dec_value, str_value, bool_value, dt_value)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    "#,
                )
                .bind(row_id)
                .bind(i64::from(attr.0))
                .bind(columns.is_all)
                .bind(columns.int_value)
                .bind(columns.dec_value)
                .bind(columns.str_value)
                .bind(columns.bool_value)
                .bind(columns.dt_value)
                .execute(&mut *tx)
                .await?;
            }
        }

        for rule in &version.rules {
            sqlx::query(
                "INSERT INTO precedence_rule (config_version_id, rank, attr_id, match_type) VALUES ($1, $2, $3, $4)",
            )
            .bind(config_version_id)
            .bind(i64::from(rule.rank))
            .bind(i64::from(rule.attr_id.0))
            .bind(i16::from(rule.match_type.as_u8()))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::info!(
            "Saved version {} ({} rows, {} rules) to PostgreSQL",
            version.key,
            version.rows.len(),
            version.rules.len()
        );
        Ok(())
    }

    async fn list_versions(&self) -> RepositoryResult<Vec<VersionKey>> {
        let records = sqlx::query(
            r#"
            SELECT c.config_name, cv.version_num
            FROM config_version cv
            JOIN config c ON c.config_id = cv.config_id
            ORDER BY c.config_name, cv.version_num
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        records
            .into_iter()
            .map(|record| -> RepositoryResult<VersionKey> {
                let name: String = record.try_get("config_name")?;
                let num = to_u32(record.try_get("version_num")?, "version_num")?;
                Ok(VersionKey::new(name, num))
            })
            .collect()
    }
}
