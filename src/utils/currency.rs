use super::price::round_currency;

pub const EURO_SIGN: &str = "€";

/// Formats an amount the way quotes show it: `€`, a non-breaking space, then
/// German grouping (`.` thousands, `,` decimals) with two fraction digits.
pub fn format_eur(amount: f64) -> String {
    let amount = if amount.is_finite() { round_currency(amount) } else { 0.0 };
    let negative = amount < 0.0;
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if negative && fixed != "0.00" { "-" } else { "" };
    format!("{EURO_SIGN}\u{a0}{sign}{grouped},{frac_part}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_german_grouping() {
        assert_eq!(format_eur(0.0), "€\u{a0}0,00");
        assert_eq!(format_eur(2.83), "€\u{a0}2,83");
        assert_eq!(format_eur(1132.0), "€\u{a0}1.132,00");
        assert_eq!(format_eur(10643.0), "€\u{a0}10.643,00");
        assert_eq!(format_eur(1234567.891), "€\u{a0}1.234.567,89");
    }

    #[test]
    fn formats_negative_and_invalid_amounts() {
        assert_eq!(format_eur(-12.5), "€\u{a0}-12,50");
        assert_eq!(format_eur(-0.001), "€\u{a0}0,00");
        assert_eq!(format_eur(f64::NAN), "€\u{a0}0,00");
    }
}
