/// Errors raised when a user-supplied decimal amount cannot be converted to base units.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,

    #[error("invalid amount '{0}'")]
    Invalid(String),

    #[error("amount '{0}' has more than {1} decimal places")]
    TooPrecise(String, u32),

    #[error("amount '{0}' is too large")]
    Overflow(String),
}

/// Format an amount in base units as a decimal string, keeping at least one fractional digit.
pub fn format_token_amount(amount: u128, decimals: u32) -> String {
    let unit = 10u128.pow(decimals);
    let whole = amount / unit;
    let frac = amount % unit;

    if decimals == 0 {
        return whole.to_string();
    }

    let frac = format!("{:0width$}", frac, width = decimals as usize);
    let trimmed = frac.trim_end_matches('0');
    if trimmed.is_empty() {
        format!("{}.0", whole)
    } else {
        format!("{}.{}", whole, trimmed)
    }
}

/// Parse a decimal string such as `"1.05"` into base units.
pub fn parse_token_amount(input: &str, decimals: u32) -> Result<u128, AmountError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AmountError::Empty);
    }

    let (whole, frac) = match input.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (input, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err(AmountError::Invalid(input.to_string()));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(AmountError::Invalid(input.to_string()));
    }
    if frac.len() > decimals as usize {
        return Err(AmountError::TooPrecise(input.to_string(), decimals));
    }

    let overflow = || AmountError::Overflow(input.to_string());
    let unit = 10u128.pow(decimals);

    let whole_units = if whole.is_empty() {
        0
    } else {
        whole.parse::<u128>().map_err(|_| overflow())?
    };
    let frac_units = if frac.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", frac, width = decimals as usize);
        padded.parse::<u128>().map_err(|_| overflow())?
    };

    whole_units
        .checked_mul(unit)
        .and_then(|v| v.checked_add(frac_units))
        .ok_or_else(overflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_whole_and_fractional_amounts() {
        assert_eq!(format_token_amount(1_000_000_000_000_000_000, 18), "1.0");
        assert_eq!(format_token_amount(1_500_000_000_000_000_000, 18), "1.5");
        assert_eq!(format_token_amount(10_000_000_000_000, 18), "0.00001");
        assert_eq!(format_token_amount(0, 18), "0.0");
        assert_eq!(format_token_amount(42, 0), "42");
    }

    #[test]
    fn parses_decimal_strings() {
        assert_eq!(parse_token_amount("1.00", 18), Ok(1_000_000_000_000_000_000));
        assert_eq!(parse_token_amount("0.01", 18), Ok(10_000_000_000_000_000));
        assert_eq!(parse_token_amount(".5", 18), Ok(500_000_000_000_000_000));
        assert_eq!(parse_token_amount("3", 6), Ok(3_000_000));
    }

    #[test]
    fn rejects_malformed_amounts() {
        assert_eq!(parse_token_amount("", 18), Err(AmountError::Empty));
        assert!(matches!(parse_token_amount("-1", 18), Err(AmountError::Invalid(_))));
        assert!(matches!(parse_token_amount("1.2.3", 18), Err(AmountError::Invalid(_))));
        assert!(matches!(parse_token_amount(".", 18), Err(AmountError::Invalid(_))));
        assert!(matches!(
            parse_token_amount("0.1234567", 6),
            Err(AmountError::TooPrecise(_, 6))
        ));
        assert!(matches!(
            parse_token_amount("999999999999999999999999999", 18),
            Err(AmountError::Overflow(_))
        ));
    }
}
