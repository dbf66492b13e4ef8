//! 金额与币种校验。金额全程使用 `Decimal`，不经过浮点数。

use rust_decimal::Decimal;

/// 金额的最大小数位数
pub const MAX_SCALE: u32 = 2;

/// 金额必须为正且最多两位小数
pub fn check_amount(amount: &Decimal) -> Result<(), String> {
    if amount.is_sign_negative() || amount.is_zero() {
        return Err(format!("金额必须大于零: {amount}"));
    }
    if amount.normalize().scale() > MAX_SCALE {
        return Err(format!("金额最多 {MAX_SCALE} 位小数: {amount}"));
    }
    Ok(())
}

/// 币种为三位大写字母代码
pub fn check_currency(currency: &str) -> Result<(), String> {
    if currency.len() == 3 && currency.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(format!("无效的币种代码: {currency}"))
    }
}

/// 银行接口使用的金额文本，固定两位小数
#[must_use]
pub fn format_amount(amount: &Decimal) -> String {
    format!("{amount:.2}")
}
