//! 仓储 Trait 定义
//!
//! 定义仓储接口，便于服务层依赖抽象而非具体实现，支持 mock 测试

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{NewProduct, PriceTier, Product, TierInput};

/// 商品仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepositoryTrait: Send + Sync {
    async fn list(&self, active_only: bool) -> Result<Vec<Product>>;
    async fn get(&self, id: i64) -> Result<Option<Product>>;
    async fn create(&self, product: &NewProduct) -> Result<Product>;
    async fn update(&self, product: &Product) -> Result<Product>;
    async fn set_active(&self, id: i64, active: bool) -> Result<Option<Product>>;

    // 阶梯价格
    async fn list_tiers(&self, product_id: i64) -> Result<Vec<PriceTier>>;
    async fn list_tiers_for(&self, product_ids: &[i64]) -> Result<Vec<PriceTier>>;
    async fn replace_tiers(&self, product_id: i64, tiers: &[TierInput]) -> Result<Vec<PriceTier>>;
}
