//! 价格计算
//!
//! 单价优先级：进行中的促销价 > 命中的数量阶梯价 > 商品基础价。
//! 所有函数均为纯计算，`now` 由调用方传入以便测试。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::models::{PriceTier, Product, TierInput};

/// 单价来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    Promotion,
    Tier,
    Base,
}

/// 报价结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub unit_price: i64,
    pub quantity: i32,
    pub total: i64,
    pub source: PriceSource,
}

/// 促销是否在 `now` 时刻生效（闭区间）
pub fn promotion_active(product: &Product, now: DateTime<Utc>) -> bool {
    matches!(
        (
            product.promotion_price,
            product.promotion_start,
            product.promotion_end
        ),
        (Some(_), Some(start), Some(end)) if start <= now && now <= end
    )
}

/// 计算单价及其来源
///
/// 阶梯按 `min_quantity` 升序匹配，取第一个命中的阶梯。
pub fn effective_price(
    product: &Product,
    quantity: i32,
    tiers: &[PriceTier],
    now: DateTime<Utc>,
) -> (i64, PriceSource) {
    if promotion_active(product, now) {
        if let Some(price) = product.promotion_price {
            return (price, PriceSource::Promotion);
        }
    }

    let mut sorted: Vec<&PriceTier> = tiers.iter().collect();
    sorted.sort_by_key(|t| t.min_quantity);

    sorted
        .into_iter()
        .find(|t| quantity >= t.min_quantity && t.max_quantity.is_none_or(|max| quantity <= max))
        .map(|t| (t.price, PriceSource::Tier))
        .unwrap_or((product.price, PriceSource::Base))
}

/// 计算报价
///
/// 数量必须 >= 1；总价溢出视为参数错误。
pub fn quote(
    product: &Product,
    quantity: i32,
    tiers: &[PriceTier],
    now: DateTime<Utc>,
) -> Result<Quote> {
    if quantity < 1 {
        return Err(StoreError::Validation("购买数量必须大于 0".to_string()));
    }

    let (unit_price, source) = effective_price(product, quantity, tiers, now);
    let total = unit_price
        .checked_mul(i64::from(quantity))
        .ok_or_else(|| StoreError::Validation("订单金额超出上限".to_string()))?;

    Ok(Quote {
        unit_price,
        quantity,
        total,
        source,
    })
}

/// 校验阶梯价格配置
///
/// 要求 min >= 1、max >= min、价格为正，且各区间互不重叠。
pub fn validate_tiers(tiers: &[TierInput]) -> Result<()> {
    for tier in tiers {
        if tier.min_quantity < 1 {
            return Err(StoreError::Validation(
                "阶梯最小数量必须大于等于 1".to_string(),
            ));
        }
        if tier.max_quantity.is_some_and(|max| max < tier.min_quantity) {
            return Err(StoreError::Validation(format!(
                "阶梯最大数量不能小于最小数量: min={}",
                tier.min_quantity
            )));
        }
        if tier.price <= 0 {
            return Err(StoreError::Validation("阶梯价格必须大于 0".to_string()));
        }
    }

    let mut sorted: Vec<&TierInput> = tiers.iter().collect();
    sorted.sort_by_key(|t| t.min_quantity);

    for pair in sorted.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        // 无上限的阶梯后面不能再有阶梯
        let overlaps = prev
            .max_quantity
            .is_none_or(|max| max >= next.min_quantity);
        if overlaps {
            return Err(StoreError::Validation(format!(
                "阶梯数量区间重叠: min={} 与 min={}",
                prev.min_quantity, next.min_quantity
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn product(price: i64) -> Product {
        let now = Utc::now();
        Product {
            id: 1,
            name: "Kingdom Tycoon Boost".to_string(),
            description: None,
            price,
            promotion_price: None,
            promotion_start: None,
            promotion_end: None,
            image_url: None,
            active: true,
            category: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn tier(min: i32, max: Option<i32>, price: i64) -> PriceTier {
        PriceTier {
            id: i64::from(min),
            product_id: 1,
            min_quantity: min,
            max_quantity: max,
            price,
        }
    }

    fn input(min: i32, max: Option<i32>, price: i64) -> TierInput {
        TierInput {
            min_quantity: min,
            max_quantity: max,
            price,
        }
    }

    #[test]
    fn test_active_promotion_wins() {
        let now = Utc::now();
        let mut p = product(100);
        p.promotion_price = Some(60);
        p.promotion_start = Some(now - Duration::hours(1));
        p.promotion_end = Some(now + Duration::hours(1));
        let tiers = vec![tier(1, None, 80)];

        assert_eq!(
            effective_price(&p, 5, &tiers, now),
            (60, PriceSource::Promotion)
        );
    }

    #[test]
    fn test_promotion_bounds_are_inclusive() {
        let now = Utc::now();
        let mut p = product(100);
        p.promotion_price = Some(60);
        p.promotion_start = Some(now);
        p.promotion_end = Some(now);
        assert!(promotion_active(&p, now));
        assert!(!promotion_active(&p, now + Duration::seconds(1)));
    }

    #[test]
    fn test_expired_or_partial_promotion_ignored() {
        let now = Utc::now();
        let mut p = product(100);
        p.promotion_price = Some(60);
        p.promotion_start = Some(now - Duration::days(2));
        p.promotion_end = Some(now - Duration::days(1));
        assert_eq!(effective_price(&p, 1, &[], now), (100, PriceSource::Base));

        p.promotion_end = None;
        assert_eq!(effective_price(&p, 1, &[], now), (100, PriceSource::Base));
    }

    #[test]
    fn test_tier_matching_uses_min_quantity_order() {
        let now = Utc::now();
        let p = product(100);
        // 故意乱序
        let tiers = vec![tier(10, None, 70), tier(1, Some(4), 95), tier(5, Some(9), 85)];

        assert_eq!(effective_price(&p, 1, &tiers, now), (95, PriceSource::Tier));
        assert_eq!(effective_price(&p, 5, &tiers, now), (85, PriceSource::Tier));
        assert_eq!(effective_price(&p, 9, &tiers, now), (85, PriceSource::Tier));
        assert_eq!(effective_price(&p, 250, &tiers, now), (70, PriceSource::Tier));
    }

    #[test]
    fn test_falls_back_to_base_price() {
        let now = Utc::now();
        let p = product(100);
        let tiers = vec![tier(5, Some(9), 85)];
        assert_eq!(effective_price(&p, 2, &tiers, now), (100, PriceSource::Base));
    }

    #[test]
    fn test_quote_totals() {
        let now = Utc::now();
        let p = product(100);
        let q = quote(&p, 3, &[], now).unwrap();
        assert_eq!(q.unit_price, 100);
        assert_eq!(q.total, 300);
        assert_eq!(q.source, PriceSource::Base);
    }

    #[test]
    fn test_quote_rejects_bad_quantity_and_overflow() {
        let now = Utc::now();
        assert!(matches!(
            quote(&product(100), 0, &[], now),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            quote(&product(i64::MAX / 2), 3, &[], now),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_tiers_accepts_disjoint_ranges() {
        let tiers = vec![input(1, Some(4), 95), input(5, Some(9), 85), input(10, None, 70)];
        assert!(validate_tiers(&tiers).is_ok());
        assert!(validate_tiers(&[]).is_ok());
    }

    #[test]
    fn test_validate_tiers_rejects_invalid_ranges() {
        assert!(validate_tiers(&[input(0, None, 10)]).is_err());
        assert!(validate_tiers(&[input(5, Some(4), 10)]).is_err());
        assert!(validate_tiers(&[input(1, Some(4), 0)]).is_err());
        assert!(validate_tiers(&[input(1, Some(5), 90), input(5, None, 80)]).is_err());
        assert!(validate_tiers(&[input(10, None, 70), input(20, Some(30), 60)]).is_err());
    }
}
