use rust_decimal::{Decimal, RoundingStrategy};

/// Round to cents, half away from zero. Only ever applied for display.
pub fn round_cents(val: Decimal) -> Decimal {
    val.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Format a decimal as a BRL amount with thousands separators: R$ 1.234,56
pub fn money(val: Decimal) -> String {
    let rounded = round_cents(val);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let cents = format!("{:.2}", rounded.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut with_dots = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_dots.push('.');
        }
        with_dots.push(c);
    }
    let with_dots: String = with_dots.chars().rev().collect();

    if negative {
        format!("-R$ {with_dots},{dec_part}")
    } else {
        format!("R$ {with_dots},{dec_part}")
    }
}

/// Plain two-place amount for machine-readable output: 1234.56
pub fn plain(val: Decimal) -> String {
    format!("{:.2}", round_cents(val))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(dec!(1234.56)), "R$ 1.234,56");
        assert_eq!(money(dec!(-500.00)), "-R$ 500,00");
        assert_eq!(money(dec!(0)), "R$ 0,00");
        assert_eq!(money(dec!(1000000.99)), "R$ 1.000.000,99");
        assert_eq!(money(dec!(42.1)), "R$ 42,10");
    }

    #[test]
    fn test_round_cents_half_up() {
        assert_eq!(round_cents(dec!(2.345)), dec!(2.35));
        assert_eq!(round_cents(dec!(2.344)), dec!(2.34));
        assert_eq!(round_cents(dec!(0.005)), dec!(0.01));
        assert_eq!(round_cents(dec!(-2.345)), dec!(-2.35));
    }

    #[test]
    fn test_money_rounds_full_precision_amounts() {
        // 100 / 31 * 7
        let amount = dec!(100) * dec!(7) / dec!(31);
        assert_eq!(money(amount), "R$ 22,58");
        assert_eq!(plain(amount), "22.58");
    }

    #[test]
    fn test_tiny_negative_is_not_signed() {
        assert_eq!(money(dec!(-0.001)), "R$ 0,00");
    }
}
