//! 积分余额值类型
//!
//! 纯计算，不涉及数据库。仓储层在锁定用户行后用它校验每一次变动，
//! 与表上的 CHECK 约束一起保证余额永不为负。

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// 用户积分余额
///
/// `points` 为总积分，`reserved_points` 为已被进行中订单或提现申请占用的部分。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub points: i64,
    pub reserved_points: i64,
}

impl Balance {
    pub fn new(points: i64, reserved_points: i64) -> Self {
        Self {
            points,
            reserved_points,
        }
    }

    /// 可用积分
    pub fn available(&self) -> i64 {
        self.points - self.reserved_points
    }

    /// 预留积分：可用积分必须足够
    pub fn reserve(self, amount: i64) -> Result<Self> {
        ensure_positive(amount)?;
        if self.available() < amount {
            return Err(self.insufficient(amount));
        }
        Ok(Self {
            reserved_points: self.reserved_points + amount,
            ..self
        })
    }

    /// 释放预留
    pub fn release(self, amount: i64) -> Result<Self> {
        ensure_positive(amount)?;
        if self.reserved_points < amount {
            return Err(StoreError::Internal(format!(
                "release {} exceeds reserved {}",
                amount, self.reserved_points
            )));
        }
        Ok(Self {
            reserved_points: self.reserved_points - amount,
            ..self
        })
    }

    /// 扣除已预留的积分（预留转为实际支出）
    pub fn capture(self, amount: i64) -> Result<Self> {
        ensure_positive(amount)?;
        if self.reserved_points < amount {
            return Err(StoreError::Internal(format!(
                "capture {} exceeds reserved {}",
                amount, self.reserved_points
            )));
        }
        Ok(Self {
            points: self.points - amount,
            reserved_points: self.reserved_points - amount,
        })
    }

    /// 入账
    pub fn credit(self, amount: i64) -> Result<Self> {
        ensure_positive(amount)?;
        let points = self
            .points
            .checked_add(amount)
            .ok_or_else(|| StoreError::Validation("积分数值溢出".to_string()))?;
        Ok(Self { points, ..self })
    }

    /// 直接扣除可用积分
    pub fn debit(self, amount: i64) -> Result<Self> {
        ensure_positive(amount)?;
        if self.available() < amount {
            return Err(self.insufficient(amount));
        }
        Ok(Self {
            points: self.points - amount,
            ..self
        })
    }

    fn insufficient(&self, required: i64) -> StoreError {
        StoreError::InsufficientPoints {
            required,
            available: self.available(),
        }
    }
}

fn ensure_positive(amount: i64) -> Result<()> {
    if amount <= 0 {
        return Err(StoreError::Validation(format!(
            "积分变动数量必须为正数: {}",
            amount
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserve_within_available() {
        let balance = Balance::new(1000, 200).reserve(800).unwrap();
        assert_eq!(balance, Balance::new(1000, 1000));
        assert_eq!(balance.available(), 0);
    }

    #[test]
    fn test_reserve_beyond_available_fails() {
        let err = Balance::new(1000, 300).reserve(800).unwrap_err();
        match err {
            StoreError::InsufficientPoints {
                required,
                available,
            } => {
                assert_eq!(required, 800);
                assert_eq!(available, 700);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_release_and_capture() {
        let balance = Balance::new(1000, 500);
        assert_eq!(balance.release(200).unwrap(), Balance::new(1000, 300));
        assert_eq!(balance.capture(500).unwrap(), Balance::new(500, 0));
        assert!(balance.release(600).is_err());
        assert!(balance.capture(501).is_err());
    }

    #[test]
    fn test_debit_respects_reservation() {
        let balance = Balance::new(1000, 900);
        assert!(matches!(
            balance.debit(200),
            Err(StoreError::InsufficientPoints { .. })
        ));
        assert_eq!(balance.debit(100).unwrap(), Balance::new(900, 900));
    }

    #[test]
    fn test_credit_overflow() {
        assert!(matches!(
            Balance::new(i64::MAX, 0).credit(1),
            Err(StoreError::Validation(_))
        ));
        assert_eq!(Balance::new(0, 0).credit(50).unwrap().points, 50);
    }

    #[test]
    fn test_non_positive_amounts_rejected() {
        let balance = Balance::new(100, 0);
        assert!(balance.reserve(0).is_err());
        assert!(balance.credit(-5).is_err());
        assert!(balance.debit(0).is_err());
    }

    #[test]
    fn test_never_negative_after_any_operation() {
        let start = Balance::new(300, 100);
        let ops: [fn(Balance, i64) -> Result<Balance>; 5] = [
            Balance::reserve,
            Balance::release,
            Balance::capture,
            Balance::credit,
            Balance::debit,
        ];
        for op in ops {
            for amount in [1, 50, 100, 200, 250, 400] {
                if let Ok(next) = op(start, amount) {
                    assert!(next.points >= 0);
                    assert!(next.reserved_points >= 0);
                    assert!(next.reserved_points <= next.points);
                }
            }
        }
    }
}
