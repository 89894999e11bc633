use super::unit::round_places;

pub const VOLUME_DISCOUNT_MIN_QUANTITY: u32 = 10;
pub const VOLUME_DISCOUNT_STEP: f64 = 0.02;
pub const VOLUME_DISCOUNT_MAX: f64 = 0.20;

pub fn round_currency(amount: f64) -> f64 {
    round_places(amount, 2)
}

/// 2% per full block of ten pieces once the order exceeds ten, capped at 20%.
pub fn volume_discount_rate(quantity: u32) -> f64 {
    if quantity <= VOLUME_DISCOUNT_MIN_QUANTITY {
        return 0.0;
    }
    let blocks = (quantity / 10) as f64;
    (blocks * VOLUME_DISCOUNT_STEP).min(VOLUME_DISCOUNT_MAX)
}

pub fn apply_volume_discount(total: f64, quantity: u32) -> f64 {
    total * (1.0 - volume_discount_rate(quantity))
}

pub fn calculate_line_total(unit_price: f64, quantity: u32) -> f64 {
    unit_price * quantity as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discount_starts_above_ten_pieces() {
        assert_eq!(volume_discount_rate(1), 0.0);
        assert_eq!(volume_discount_rate(10), 0.0);
        assert_eq!(volume_discount_rate(11), 0.02);
        assert_eq!(volume_discount_rate(25), 0.04);
    }

    #[test]
    fn discount_is_capped() {
        assert_eq!(volume_discount_rate(100), 0.20);
        assert_eq!(volume_discount_rate(400), 0.20);
        assert_eq!(volume_discount_rate(u32::MAX), 0.20);
    }

    #[test]
    fn discount_is_applied_before_rounding() {
        let pre = 123.456 * 25.0;
        let expected = round_currency(pre * 0.96);
        assert_eq!(round_currency(apply_volume_discount(pre, 25)), expected);
    }
}
