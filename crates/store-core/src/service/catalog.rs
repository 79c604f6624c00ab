//! 商品目录服务
//!
//! 商品与阶梯价格的维护、列表展示和下单前报价

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use crate::error::{Result, StoreError};
use crate::models::{NewProduct, PriceTier, Product, ProductPatch, TierInput};
use crate::pricing::{self, Quote};
use crate::repository::{ProductRepository, ProductRepositoryTrait};
use crate::service::dto::ProductListing;

/// 商品目录服务
pub struct CatalogService<R: ProductRepositoryTrait = ProductRepository> {
    product_repo: Arc<R>,
}

impl<R: ProductRepositoryTrait> CatalogService<R> {
    pub fn new(product_repo: Arc<R>) -> Self {
        Self { product_repo }
    }

    /// 列出商品及其当前生效价格
    ///
    /// 商城只展示上架商品，管理后台传 `active_only = false` 查看全部
    #[instrument(skip(self))]
    pub async fn list_products(&self, active_only: bool) -> Result<Vec<ProductListing>> {
        let products = self.product_repo.list(active_only).await?;
        let ids: Vec<i64> = products.iter().map(|p| p.id).collect();
        let mut tiers_by_product: HashMap<i64, Vec<PriceTier>> = HashMap::new();
        for tier in self.product_repo.list_tiers_for(&ids).await? {
            tiers_by_product.entry(tier.product_id).or_default().push(tier);
        }

        let now = Utc::now();
        let listings = products
            .into_iter()
            .map(|product| {
                let tiers = tiers_by_product.remove(&product.id).unwrap_or_default();
                build_listing(product, tiers, now)
            })
            .collect();

        Ok(listings)
    }

    /// 获取商品详情；`active_only` 为 true 时下架商品返回 `ProductUnavailable`
    pub async fn get_product(&self, id: i64, active_only: bool) -> Result<ProductListing> {
        let product = self.load(id).await?;
        if active_only && !product.active {
            return Err(StoreError::ProductUnavailable(id));
        }
        let tiers = self.product_repo.list_tiers(id).await?;
        Ok(build_listing(product, tiers, Utc::now()))
    }

    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create_product(&self, product: NewProduct) -> Result<ProductListing> {
        validate_product_fields(
            &product.name,
            product.price,
            product.promotion_price,
            product.promotion_start,
            product.promotion_end,
        )?;
        pricing::validate_tiers(&product.tiers)?;

        let created = self.product_repo.create(&product).await?;
        info!(product_id = created.id, name = %created.name, "Product created");
        self.get_product(created.id, false).await
    }

    /// 部分更新商品
    #[instrument(skip(self, patch))]
    pub async fn update_product(&self, id: i64, patch: ProductPatch) -> Result<ProductListing> {
        let merged = patch.apply(self.load(id).await?);
        validate_product_fields(
            &merged.name,
            merged.price,
            merged.promotion_price,
            merged.promotion_start,
            merged.promotion_end,
        )?;

        self.product_repo.update(&merged).await?;
        info!(product_id = id, "Product updated");
        self.get_product(id, false).await
    }

    /// 上架或下架商品
    #[instrument(skip(self))]
    pub async fn set_active(&self, id: i64, active: bool) -> Result<ProductListing> {
        self.product_repo
            .set_active(id, active)
            .await?
            .ok_or(StoreError::ProductNotFound(id))?;
        info!(product_id = id, active, "Product availability changed");
        self.get_product(id, false).await
    }

    /// 整体替换阶梯价格
    #[instrument(skip(self, tiers), fields(tier_count = tiers.len()))]
    pub async fn replace_tiers(&self, product_id: i64, tiers: Vec<TierInput>) -> Result<Vec<PriceTier>> {
        pricing::validate_tiers(&tiers)?;
        self.load(product_id).await?;

        let saved = self.product_repo.replace_tiers(product_id, &tiers).await?;
        info!(product_id, tier_count = saved.len(), "Price tiers replaced");
        Ok(saved)
    }

    /// 按数量报价
    pub async fn quote(&self, product_id: i64, quantity: i32) -> Result<Quote> {
        let product = self.load(product_id).await?;
        if !product.active {
            return Err(StoreError::ProductUnavailable(product_id));
        }
        let tiers = self.product_repo.list_tiers(product_id).await?;
        pricing::quote(&product, quantity, &tiers, Utc::now())
    }

    async fn load(&self, id: i64) -> Result<Product> {
        self.product_repo
            .get(id)
            .await?
            .ok_or(StoreError::ProductNotFound(id))
    }
}

fn build_listing(product: Product, tiers: Vec<PriceTier>, now: DateTime<Utc>) -> ProductListing {
    let (effective_price, price_source) = pricing::effective_price(&product, 1, &tiers, now);
    let promotion_active = pricing::promotion_active(&product, now);
    ProductListing {
        product,
        effective_price,
        price_source,
        promotion_active,
        tiers,
    }
}

fn validate_product_fields(
    name: &str,
    price: i64,
    promotion_price: Option<i64>,
    promotion_start: Option<DateTime<Utc>>,
    promotion_end: Option<DateTime<Utc>>,
) -> Result<()> {
    if name.trim().is_empty() {
        return Err(StoreError::Validation("商品名称不能为空".to_string()));
    }
    if price <= 0 {
        return Err(StoreError::Validation("商品价格必须大于 0".to_string()));
    }
    match (promotion_price, promotion_start, promotion_end) {
        (None, None, None) => Ok(()),
        (Some(promo), Some(start), Some(end)) => {
            if promo <= 0 {
                return Err(StoreError::Validation("促销价必须大于 0".to_string()));
            }
            if start > end {
                return Err(StoreError::Validation(
                    "促销开始时间不能晚于结束时间".to_string(),
                ));
            }
            Ok(())
        }
        _ => Err(StoreError::Validation(
            "促销价、开始时间、结束时间必须同时设置".to_string(),
        )),
    }
}
