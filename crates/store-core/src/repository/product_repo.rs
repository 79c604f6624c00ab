//! 商品仓储
//!
//! 商品与阶梯价格的数据访问

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use super::traits::ProductRepositoryTrait;
use crate::error::Result;
use crate::models::{NewProduct, PriceTier, Product, TierInput};

const PRODUCT_COLUMNS: &str = r#"
    id, name, description, price, promotion_price, promotion_start, promotion_end,
    image_url, active, category, created_at, updated_at
"#;

/// 商品仓储
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 列出商品，`active_only` 为 true 时只返回上架商品
    pub async fn list(&self, active_only: bool) -> Result<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products WHERE ($1 = FALSE OR active = TRUE) ORDER BY created_at DESC, id DESC",
            PRODUCT_COLUMNS
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(active_only)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    pub async fn get(&self, id: i64) -> Result<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS);
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// 在事务中获取商品
    pub async fn get_in_tx(tx: &mut PgConnection, id: i64) -> Result<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS);
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(tx)
            .await?;

        Ok(product)
    }

    /// 创建商品及其阶梯价格（单事务）
    pub async fn create(&self, product: &NewProduct) -> Result<Product> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            INSERT INTO products (name, description, price, promotion_price, promotion_start,
                                  promotion_end, image_url, active, category)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        );
        let created = sqlx::query_as::<_, Product>(&sql)
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price)
            .bind(product.promotion_price)
            .bind(product.promotion_start)
            .bind(product.promotion_end)
            .bind(&product.image_url)
            .bind(product.active)
            .bind(&product.category)
            .fetch_one(&mut *tx)
            .await?;

        Self::insert_tiers_in_tx(&mut tx, created.id, &product.tiers).await?;

        tx.commit().await?;
        Ok(created)
    }

    /// 按完整实体覆盖更新
    pub async fn update(&self, product: &Product) -> Result<Product> {
        let sql = format!(
            r#"
            UPDATE products
            SET name = $2, description = $3, price = $4, promotion_price = $5,
                promotion_start = $6, promotion_end = $7, image_url = $8, category = $9,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        );
        let updated = sqlx::query_as::<_, Product>(&sql)
            .bind(product.id)
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price)
            .bind(product.promotion_price)
            .bind(product.promotion_start)
            .bind(product.promotion_end)
            .bind(&product.image_url)
            .bind(&product.category)
            .fetch_one(&self.pool)
            .await?;

        Ok(updated)
    }

    pub async fn set_active(&self, id: i64, active: bool) -> Result<Option<Product>> {
        let sql = format!(
            "UPDATE products SET active = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            PRODUCT_COLUMNS
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(active)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    pub async fn list_tiers(&self, product_id: i64) -> Result<Vec<PriceTier>> {
        let tiers = sqlx::query_as::<_, PriceTier>(
            r#"
            SELECT id, product_id, min_quantity, max_quantity, price
            FROM product_price_tiers
            WHERE product_id = $1
            ORDER BY min_quantity
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tiers)
    }

    /// 在事务中获取商品的阶梯价格
    pub async fn list_tiers_in_tx(tx: &mut PgConnection, product_id: i64) -> Result<Vec<PriceTier>> {
        let tiers = sqlx::query_as::<_, PriceTier>(
            r#"
            SELECT id, product_id, min_quantity, max_quantity, price
            FROM product_price_tiers
            WHERE product_id = $1
            ORDER BY min_quantity
            "#,
        )
        .bind(product_id)
        .fetch_all(tx)
        .await?;

        Ok(tiers)
    }

    /// 批量获取多个商品的阶梯价格
    pub async fn list_tiers_for(&self, product_ids: &[i64]) -> Result<Vec<PriceTier>> {
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }

        let tiers = sqlx::query_as::<_, PriceTier>(
            r#"
            SELECT id, product_id, min_quantity, max_quantity, price
            FROM product_price_tiers
            WHERE product_id = ANY($1)
            ORDER BY product_id, min_quantity
            "#,
        )
        .bind(product_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(tiers)
    }

    /// 整体替换商品的阶梯价格（单事务）
    pub async fn replace_tiers(
        &self,
        product_id: i64,
        tiers: &[TierInput],
    ) -> Result<Vec<PriceTier>> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM product_price_tiers WHERE product_id = $1")
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        Self::insert_tiers_in_tx(&mut tx, product_id, tiers).await?;
        let saved = Self::list_tiers_in_tx(&mut tx, product_id).await?;

        tx.commit().await?;
        Ok(saved)
    }

    async fn insert_tiers_in_tx(
        tx: &mut PgConnection,
        product_id: i64,
        tiers: &[TierInput],
    ) -> Result<()> {
        for tier in tiers {
            sqlx::query(
                r#"
                INSERT INTO product_price_tiers (product_id, min_quantity, max_quantity, price)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(product_id)
            .bind(tier.min_quantity)
            .bind(tier.max_quantity)
            .bind(tier.price)
            .execute(&mut *tx)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ProductRepositoryTrait for ProductRepository {
    async fn list(&self, active_only: bool) -> Result<Vec<Product>> {
        self.list(active_only).await
    }

    async fn get(&self, id: i64) -> Result<Option<Product>> {
        self.get(id).await
    }

    async fn create(&self, product: &NewProduct) -> Result<Product> {
        self.create(product).await
    }

    async fn update(&self, product: &Product) -> Result<Product> {
        self.update(product).await
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<Option<Product>> {
        self.set_active(id, active).await
    }

    async fn list_tiers(&self, product_id: i64) -> Result<Vec<PriceTier>> {
        self.list_tiers(product_id).await
    }

    async fn list_tiers_for(&self, product_ids: &[i64]) -> Result<Vec<PriceTier>> {
        self.list_tiers_for(product_ids).await
    }

    async fn replace_tiers(&self, product_id: i64, tiers: &[TierInput]) -> Result<Vec<PriceTier>> {
        self.replace_tiers(product_id, tiers).await
    }
}
