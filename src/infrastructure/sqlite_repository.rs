//! SQLite-backed hot-deal sink
//!
//! Uses sqlx with a small pool. The `(source, source_post_id)` unique index
//! backs up the find-before-write done by the crawler: a racing insert is
//! declined (`Ok(None)`) instead of duplicated.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::Path;
use tracing::info;

use crate::domain::deal::{DealPatch, DealStatus, HotDeal, HotDealSource, PriceValue};
use crate::domain::repositories::HotDealRepository;

const CREATE_HOT_DEALS: &str = r#"
    CREATE TABLE IF NOT EXISTS hot_deals (
        id TEXT PRIMARY KEY,
        source TEXT NOT NULL,
        source_post_id TEXT NOT NULL,
        title TEXT NOT NULL,
        category TEXT NOT NULL,
        original_price INTEGER NOT NULL DEFAULT 0,
        sale_price INTEGER NOT NULL DEFAULT 0,
        discount_rate INTEGER NOT NULL DEFAULT 0,
        seller TEXT NOT NULL,
        original_url TEXT NOT NULL,
        image_url TEXT,
        thumbnail_url TEXT,
        is_free_shipping BOOLEAN NOT NULL DEFAULT 0,
        status TEXT NOT NULL DEFAULT 'active',
        views INTEGER NOT NULL DEFAULT 0,
        like_count INTEGER NOT NULL DEFAULT 0,
        comment_count INTEGER NOT NULL DEFAULT 0,
        author_name TEXT NOT NULL,
        description TEXT,
        crawled_at TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        deleted_at TEXT
    )
"#;

const CREATE_INDEXES: &[&str] = &[
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_hot_deals_natural_key ON hot_deals (source, source_post_id)",
    "CREATE INDEX IF NOT EXISTS idx_hot_deals_created_at ON hot_deals (created_at)",
];

/// 핫딜 SQLite 저장소
pub struct SqliteHotDealRepository {
    pool: SqlitePool,
}

impl SqliteHotDealRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating the file and its directory if needed) and migrate
    pub async fn connect(database_url: &str) -> Result<Self> {
        let db_path = database_url
            .strip_prefix("sqlite://")
            .or_else(|| database_url.strip_prefix("sqlite:"))
            .unwrap_or(database_url);

        if db_path != ":memory:" {
            let path = Path::new(db_path);
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create database directory {:?}", parent))?;
            }
            if !path.exists() {
                tokio::fs::File::create(path)
                    .await
                    .with_context(|| format!("Failed to create database file {:?}", path))?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .with_context(|| format!("Failed to connect to {}", database_url))?;

        let repository = Self::new(pool);
        repository.migrate().await?;
        info!("🗄️ Hot-deal store ready: {}", database_url);
        Ok(repository)
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(CREATE_HOT_DEALS).execute(&self.pool).await?;
        for statement in CREATE_INDEXES {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub async fn count(&self) -> Result<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM hot_deals")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<HotDeal>> {
        let row = sqlx::query("SELECT * FROM hot_deals WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_deal).transpose()
    }

    fn timestamp(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>> {
        let raw: String = row.try_get(column)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| anyhow!("Failed to parse {}: {}", column, e))
    }

    fn count_column(row: &SqliteRow, column: &str) -> Result<u64> {
        let value: i64 = row.try_get(column)?;
        Ok(value.max(0) as u64)
    }

    fn row_to_deal(row: &SqliteRow) -> Result<HotDeal> {
        let source: String = row.try_get("source")?;
        let status: String = row.try_get("status")?;
        let deleted_at: Option<String> = row.try_get("deleted_at")?;
        let discount_rate: i64 = row.try_get("discount_rate")?;

        Ok(HotDeal {
            id: row.try_get("id")?,
            source: source.parse::<HotDealSource>()?,
            source_post_id: row.try_get("source_post_id")?,
            title: row.try_get("title")?,
            category: row.try_get("category")?,
            original_price: PriceValue::from(row.try_get::<i64, _>("original_price")?),
            sale_price: PriceValue::from(row.try_get::<i64, _>("sale_price")?),
            discount_rate: discount_rate.clamp(0, 100) as u8,
            seller: row.try_get("seller")?,
            original_url: row.try_get("original_url")?,
            image_url: row.try_get("image_url")?,
            thumbnail_url: row.try_get("thumbnail_url")?,
            is_free_shipping: row.try_get("is_free_shipping")?,
            status: if status == "expired" {
                DealStatus::Expired
            } else {
                DealStatus::Active
            },
            views: Self::count_column(row, "views")?,
            like_count: Self::count_column(row, "like_count")?,
            comment_count: Self::count_column(row, "comment_count")?,
            author_name: row.try_get("author_name")?,
            description: row.try_get("description")?,
            crawled_at: Self::timestamp(row, "crawled_at")?,
            created_at: Self::timestamp(row, "created_at")?,
            updated_at: Self::timestamp(row, "updated_at")?,
            deleted_at: deleted_at
                .map(|raw| DateTime::parse_from_rfc3339(&raw).map(|dt| dt.with_timezone(&Utc)))
                .transpose()
                .map_err(|e| anyhow!("Failed to parse deleted_at: {}", e))?,
        })
    }

    const fn status_str(status: DealStatus) -> &'static str {
        match status {
            DealStatus::Active => "active",
            DealStatus::Expired => "expired",
        }
    }
}

#[async_trait]
impl HotDealRepository for SqliteHotDealRepository {
    async fn find_by_source_and_post_id(
        &self,
        source: HotDealSource,
        post_id: &str,
    ) -> Result<Option<HotDeal>> {
        let row = sqlx::query("SELECT * FROM hot_deals WHERE source = $1 AND source_post_id = $2")
            .bind(source.as_str())
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_deal).transpose()
    }

    async fn create(&self, deal: &HotDeal) -> Result<Option<HotDeal>> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO hot_deals (
                id, source, source_post_id, title, category, original_price, sale_price,
                discount_rate, seller, original_url, image_url, thumbnail_url, is_free_shipping,
                status, views, like_count, comment_count, author_name, description,
                crawled_at, created_at, updated_at, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                    $18, $19, $20, $21, $22, $23)
            ON CONFLICT (source, source_post_id) DO NOTHING
            "#,
        )
        .bind(&deal.id)
        .bind(deal.source.as_str())
        .bind(&deal.source_post_id)
        .bind(&deal.title)
        .bind(&deal.category)
        .bind(i64::from(deal.original_price))
        .bind(i64::from(deal.sale_price))
        .bind(i64::from(deal.discount_rate))
        .bind(&deal.seller)
        .bind(&deal.original_url)
        .bind(&deal.image_url)
        .bind(&deal.thumbnail_url)
        .bind(deal.is_free_shipping)
        .bind(Self::status_str(deal.status))
        .bind(deal.views as i64)
        .bind(deal.like_count as i64)
        .bind(deal.comment_count as i64)
        .bind(&deal.author_name)
        .bind(&deal.description)
        .bind(deal.crawled_at.to_rfc3339())
        .bind(deal.created_at.to_rfc3339())
        .bind(deal.updated_at.to_rfc3339())
        .bind(deal.deleted_at.map(|dt| dt.to_rfc3339()))
        .execute(&self.pool)
        .await?;

        if inserted.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(deal.clone()))
    }

    async fn update(&self, id: &str, patch: &DealPatch) -> Result<Option<HotDeal>> {
        let Some(mut deal) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        patch.apply_to(&mut deal);

        sqlx::query(
            r#"
            UPDATE hot_deals
            SET views = $2, like_count = $3, comment_count = $4, status = $5,
                sale_price = $6, image_url = $7, description = $8, updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(&deal.id)
        .bind(deal.views as i64)
        .bind(deal.like_count as i64)
        .bind(deal.comment_count as i64)
        .bind(Self::status_str(deal.status))
        .bind(i64::from(deal.sale_price))
        .bind(&deal.image_url)
        .bind(&deal.description)
        .bind(deal.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(Some(deal))
    }
}
