//! 商品与阶梯价格实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 商品
///
/// 价格单位为积分。促销价仅在 `promotion_start..=promotion_end` 内生效。
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    #[sqlx(default)]
    pub description: Option<String>,
    pub price: i64,
    #[sqlx(default)]
    pub promotion_price: Option<i64>,
    #[sqlx(default)]
    pub promotion_start: Option<DateTime<Utc>>,
    #[sqlx(default)]
    pub promotion_end: Option<DateTime<Utc>>,
    #[sqlx(default)]
    pub image_url: Option<String>,
    pub active: bool,
    #[sqlx(default)]
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 阶梯价格
///
/// `max_quantity` 为空表示不设上限
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PriceTier {
    pub id: i64,
    pub product_id: i64,
    pub min_quantity: i32,
    #[sqlx(default)]
    pub max_quantity: Option<i32>,
    pub price: i64,
}

/// 阶梯价格写入参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierInput {
    pub min_quantity: i32,
    pub max_quantity: Option<i32>,
    pub price: i64,
}

/// 新建商品参数
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub promotion_price: Option<i64>,
    pub promotion_start: Option<DateTime<Utc>>,
    pub promotion_end: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub active: bool,
    #[serde(default)]
    pub tiers: Vec<TierInput>,
}

/// 商品部分更新参数，None 表示不修改
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub promotion_price: Option<i64>,
    pub promotion_start: Option<DateTime<Utc>>,
    pub promotion_end: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    /// 为 true 时清空促销配置（优先于上面的促销字段）
    #[serde(default)]
    pub clear_promotion: bool,
}

impl ProductPatch {
    /// 将更新应用到已有商品上，返回合并后的结果
    pub fn apply(&self, mut product: Product) -> Product {
        if let Some(name) = &self.name {
            product.name = name.clone();
        }
        if let Some(description) = &self.description {
            product.description = Some(description.clone());
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if self.clear_promotion {
            product.promotion_price = None;
            product.promotion_start = None;
            product.promotion_end = None;
        } else {
            if self.promotion_price.is_some() {
                product.promotion_price = self.promotion_price;
            }
            if self.promotion_start.is_some() {
                product.promotion_start = self.promotion_start;
            }
            if self.promotion_end.is_some() {
                product.promotion_end = self.promotion_end;
            }
        }
        if let Some(image_url) = &self.image_url {
            product.image_url = Some(image_url.clone());
        }
        if let Some(category) = &self.category {
            product.category = Some(category.clone());
        }
        product
    }
}
