use alloy_primitives::U256;
use rust_decimal::prelude::*;

use crate::error::{Result, SomniaError};

/// Decimals of the native token.
pub const NATIVE_DECIMALS: u8 = 18;

/// 将人类可读的金额字符串转换为最小单位的原始金额
///
/// 金额必须大于 0，且小数位数不能超过 `decimals`。
///
/// # 示例
/// ```ignore
/// let raw = parse_amount("1.5", 18)?; // 1_500_000_000_000_000_000
/// ```
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256> {
    let decimal = parse_positive_decimal(amount)?;
    from_decimal(decimal, decimals)
}

/// Parses `amount` and rejects anything that is not strictly positive.
pub fn parse_positive_decimal(amount: &str) -> Result<Decimal> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(SomniaError::InvalidAmount(
            "Amount must be greater than 0".to_string(),
        ));
    }

    let decimal = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| SomniaError::InvalidAmount(format!("Unparseable amount: {}", amount)))?;

    if decimal <= Decimal::ZERO {
        return Err(SomniaError::InvalidAmount(
            "Amount must be greater than 0".to_string(),
        ));
    }

    Ok(decimal)
}

/// 将十进制金额转换为原始代币金额（最小单位）
///
/// 使用尾数和小数位直接在 `U256` 中计算，避免 `Decimal` 乘法溢出。
pub fn from_decimal(decimal_amount: Decimal, decimals: u8) -> Result<U256> {
    if decimal_amount.is_sign_negative() {
        return Err(SomniaError::PrecisionError(
            "Negative amounts have no base-unit representation".to_string(),
        ));
    }

    let normalized = decimal_amount.normalize();
    let scale = normalized.scale();
    if scale > u32::from(decimals) {
        return Err(SomniaError::PrecisionError(format!(
            "Too many decimal places: {} (token supports {})",
            scale, decimals
        )));
    }

    let mantissa = u128::try_from(normalized.mantissa())
        .map_err(|_| SomniaError::PrecisionError("Amount out of range".to_string()))?;

    let multiplier = U256::from(10u64).pow(U256::from(u32::from(decimals) - scale));

    U256::from(mantissa)
        .checked_mul(multiplier)
        .ok_or_else(|| SomniaError::PrecisionError("Multiplication overflow".to_string()))
}

/// 将原始代币金额格式化为人类可读的字符串（去除末尾的 0）
pub fn format_amount(raw_amount: U256, decimals: u8) -> String {
    if decimals == 0 {
        return raw_amount.to_string();
    }

    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = raw_amount / divisor;
    let fraction = raw_amount % divisor;

    if fraction.is_zero() {
        return whole.to_string();
    }

    let fraction = format!("{:0>width$}", fraction.to_string(), width = decimals as usize);
    format!("{}.{}", whole, fraction.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_whole_ether() {
        let raw = parse_amount("1", 18).unwrap();
        assert_eq!(raw, U256::from(1_000_000_000_000_000_000u64));
    }

    #[test]
    fn test_parse_fractional_usdc() {
        let raw = parse_amount("2.5", 6).unwrap();
        assert_eq!(raw, U256::from(2_500_000u64));
    }

    #[test]
    fn test_parse_large_amount_does_not_overflow() {
        // 10^12 tokens at 18 decimals exceeds what Decimal can multiply.
        let raw = parse_amount("1000000000000", 18).unwrap();
        assert_eq!(raw, U256::from(10u64).pow(U256::from(30u64)));
    }

    #[test]
    fn test_parse_rejects_zero_and_negative() {
        assert!(matches!(
            parse_amount("0", 18),
            Err(SomniaError::InvalidAmount(_))
        ));
        assert!(matches!(
            parse_amount("-1", 18),
            Err(SomniaError::InvalidAmount(_))
        ));
        assert!(matches!(
            parse_amount("0.000", 18),
            Err(SomniaError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_amount("abc", 18),
            Err(SomniaError::InvalidAmount(_))
        ));
        assert!(matches!(
            parse_amount("   ", 18),
            Err(SomniaError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_parse_rejects_too_many_decimals() {
        assert!(matches!(
            parse_amount("0.0000001", 6),
            Err(SomniaError::PrecisionError(_))
        ));
    }

    #[test]
    fn test_trailing_zeros_do_not_count_as_precision() {
        let raw = parse_amount("1.500000000", 6).unwrap();
        assert_eq!(raw, U256::from(1_500_000u64));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(U256::from(1_000_000_000_000_000_000u64), 18), "1");
        assert_eq!(format_amount(U256::from(1_500_000u64), 6), "1.5");
        assert_eq!(format_amount(U256::from(21_000_000_000_000u64), 18), "0.000021");
        assert_eq!(format_amount(U256::ZERO, 18), "0");
        assert_eq!(format_amount(U256::from(42u64), 0), "42");
    }
}
