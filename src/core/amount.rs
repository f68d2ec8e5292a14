use crate::utils::error::Result;
use crate::utils::validation::validate_non_negative;
use rust_decimal::{Decimal, RoundingStrategy};

/// 以 half-away-from-zero 捨入到小數兩位，固定輸出兩位小數與 `.` 分隔符
pub fn format_amount(total: Decimal) -> Result<String> {
    validate_non_negative("total", total)?;

    let mut rounded = total.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    // -0.00 would otherwise keep its sign
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    Ok(rounded.to_string())
}
