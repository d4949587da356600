use crate::error::{Result, WorkflowError};
use alloy_primitives::U256;
use std::fmt;

/// Parse a human-readable decimal amount into base units.
///
/// The conversion is exact: an amount with more fractional digits than
/// `decimals` is rejected rather than rounded.
pub fn normalize_amount(input: &str, decimals: u8) -> Result<U256> {
    let value = parse_decimal(input, decimals)?;
    if value.is_zero() {
        return Err(WorkflowError::ZeroAmount);
    }
    Ok(value)
}

/// Check syntax and non-zero before the currency's decimals are known.
pub fn check_amount(input: &str) -> Result<()> {
    let fraction_digits = input
        .trim()
        .split_once('.')
        .map_or(0, |(_, fraction)| fraction.len());
    let decimals = u8::try_from(fraction_digits)
        .map_err(|_| WorkflowError::invalid_amount(input, "too many decimal places"))?;
    normalize_amount(input, decimals).map(|_| ())
}

/// Same as [`normalize_amount`] but zero is a valid result.
pub(crate) fn parse_decimal(input: &str, decimals: u8) -> Result<U256> {
    let trimmed = input.trim();
    let (whole_part, fraction_part) = match trimmed.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (trimmed, ""),
    };

    if whole_part.is_empty() && fraction_part.is_empty() {
        return Err(WorkflowError::invalid_amount(input, "expected a decimal number"));
    }
    if !is_digits(whole_part) || !is_digits(fraction_part) {
        return Err(WorkflowError::invalid_amount(input, "expected a decimal number"));
    }
    if fraction_part.len() > decimals as usize {
        return Err(WorkflowError::invalid_amount(
            input,
            format!("too many decimal places (max {decimals})"),
        ));
    }

    let overflow = || WorkflowError::invalid_amount(input, "amount overflow");
    let whole = parse_digits(whole_part).ok_or_else(overflow)?;
    let mut value = whole
        .checked_mul(pow10(decimals as u32).ok_or_else(overflow)?)
        .ok_or_else(overflow)?;

    if !fraction_part.is_empty() {
        let fraction = parse_digits(fraction_part).ok_or_else(overflow)?;
        let scale = pow10(decimals as u32 - fraction_part.len() as u32).ok_or_else(overflow)?;
        value = fraction
            .checked_mul(scale)
            .and_then(|scaled| value.checked_add(scaled))
            .ok_or_else(overflow)?;
    }

    Ok(value)
}

fn is_digits(value: &str) -> bool {
    value.bytes().all(|b| b.is_ascii_digit())
}

fn parse_digits(value: &str) -> Option<U256> {
    if value.is_empty() {
        return Some(U256::ZERO);
    }
    U256::from_str_radix(value, 10).ok()
}

/// Compute 10^exp, `None` on overflow.
fn pow10(exp: u32) -> Option<U256> {
    U256::from(10u64).checked_pow(U256::from(exp))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeKind {
    Blocks,
    Accruals,
}

/// An inclusive range of block numbers or accrual indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub kind: RangeKind,
    pub first: u64,
    pub last: u64,
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            RangeKind::Blocks => "blocks",
            RangeKind::Accruals => "accruals",
        };
        write!(f, "{kind} {}-{}", self.first, self.last)
    }
}

/// Parse `N` or `FIRST-LAST` into a validated range.
pub fn parse_range(kind: RangeKind, input: &str) -> Result<Range> {
    let invalid = || WorkflowError::InvalidRange {
        input: input.to_string(),
    };
    let trimmed = input.trim();
    let (first, last) = match trimmed.split_once('-') {
        Some((first, last)) => (parse_bound(first), parse_bound(last)),
        None => {
            let single = parse_bound(trimmed);
            (single, single)
        }
    };
    let (first, last) = (first.ok_or_else(invalid)?, last.ok_or_else(invalid)?);
    if last < first {
        return Err(invalid());
    }
    Ok(Range { kind, first, last })
}

fn parse_bound(value: &str) -> Option<u64> {
    let value = value.trim();
    if value.is_empty() || !is_digits(value) {
        return None;
    }
    value.parse().ok()
}

/// Pick the single range supplied for this invocation.
pub fn select_range(blocks: Option<&str>, accruals: Option<&str>) -> Result<Range> {
    match (blocks, accruals) {
        (Some(_), Some(_)) => Err(WorkflowError::ConflictingRanges),
        (Some(blocks), None) => parse_range(RangeKind::Blocks, blocks),
        (None, Some(accruals)) => parse_range(RangeKind::Accruals, accruals),
        (None, None) => Err(WorkflowError::MissingRange),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_exactly_at_token_precision() {
        assert_eq!(
            normalize_amount("1.1", 18).unwrap().to_string(),
            "1100000000000000000"
        );
        assert_eq!(
            normalize_amount("0.000000000000000001", 18).unwrap(),
            U256::from(1u64)
        );
        assert_eq!(normalize_amount("0.07", 6).unwrap(), U256::from(70_000u64));
        assert_eq!(normalize_amount("42", 0).unwrap(), U256::from(42u64));
        assert_eq!(normalize_amount(".5", 1).unwrap(), U256::from(5u64));
        assert_eq!(normalize_amount("3.", 2).unwrap(), U256::from(300u64));
    }

    #[test]
    fn large_amounts_do_not_lose_precision() {
        let amount = normalize_amount("123456789012345678901234567890.123456789012345678", 18)
            .unwrap();
        assert_eq!(
            amount.to_string(),
            "123456789012345678901234567890123456789012345678"
        );
    }

    #[test]
    fn zero_is_rejected() {
        for input in ["0", "0.0", "000", ".000"] {
            assert!(matches!(
                normalize_amount(input, 18),
                Err(WorkflowError::ZeroAmount)
            ));
        }
    }

    #[test]
    fn malformed_amounts_are_rejected() {
        for input in ["foo", "", ".", "-1", "1e18", "1.2.3", "+1", "1,5", "0x10"] {
            assert!(
                matches!(
                    normalize_amount(input, 18),
                    Err(WorkflowError::InvalidAmount { .. })
                ),
                "{input} should be invalid"
            );
        }
    }

    #[test]
    fn amount_is_checked_without_decimals() {
        for input in ["1", "0.07", "1.123456789012345678901", " 2.5 "] {
            assert!(check_amount(input).is_ok(), "{input} should pass");
        }
        for input in ["0", "0.000", "."] {
            assert!(check_amount(input).is_err(), "{input} should fail");
        }
        assert!(matches!(check_amount("0.0"), Err(WorkflowError::ZeroAmount)));
        assert!(matches!(
            check_amount("foo"),
            Err(WorkflowError::InvalidAmount { .. })
        ));
        assert!(matches!(
            check_amount(&format!("1.{}", "1".repeat(300))),
            Err(WorkflowError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn excess_fraction_digits_are_rejected() {
        assert!(matches!(
            normalize_amount("1.1234567", 6),
            Err(WorkflowError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn overflow_is_invalid() {
        let huge = "9".repeat(80);
        assert!(matches!(
            normalize_amount(&huge, 18),
            Err(WorkflowError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn parses_ranges() {
        assert_eq!(
            parse_range(RangeKind::Accruals, "0-2").unwrap(),
            Range {
                kind: RangeKind::Accruals,
                first: 0,
                last: 2
            }
        );
        assert_eq!(
            parse_range(RangeKind::Blocks, "3").unwrap(),
            Range {
                kind: RangeKind::Blocks,
                first: 3,
                last: 3
            }
        );
    }

    #[test]
    fn rejects_bad_ranges() {
        for input in ["", "a", "1-", "-1", "2-1", "1-2-3", "1--2", "x-3"] {
            assert!(
                matches!(
                    parse_range(RangeKind::Blocks, input),
                    Err(WorkflowError::InvalidRange { .. })
                ),
                "{input} should be invalid"
            );
        }
    }

    #[test]
    fn exactly_one_range_kind() {
        assert!(matches!(
            select_range(Some("1"), Some("2")),
            Err(WorkflowError::ConflictingRanges)
        ));
        assert!(matches!(
            select_range(None, None),
            Err(WorkflowError::MissingRange)
        ));
        assert_eq!(
            select_range(None, Some("4-9")).unwrap().kind,
            RangeKind::Accruals
        );
    }
}
