use winnow::ascii::{digit0, digit1};
use winnow::combinator::{alt, opt};
use winnow::token::{literal, one_of};
use winnow::{Parser, Result};

/// Parses a signed decimal value as an `f64`.
///
/// This permits only decimal notation, NOT scientific notation, and never
/// `inf` or `nan`. Either the integer or the fractional part may be omitted,
/// but not both. A digit run too long to fit an `f64` is rejected rather
/// than rounded to infinity.
///
/// Examples of valid input:
///
/// - `"150"`
/// - `"+0.5"`
/// - `"-12.75"`
/// - `".25"`
pub fn parse_decimal<'s>(input: &mut &'s str) -> Result<f64> {
    (opt(parse_sign), parse_magnitude)
        .take()
        .try_map(str::parse::<f64>)
        .verify(|value: &f64| value.is_finite())
        .parse_next(input)
}

/// Parses digits (0-9) as a `u16`, as used for command numbers.
pub fn parse_digits_u16<'s>(input: &mut &'s str) -> Result<u16> {
    digit1.try_map(str::parse).parse_next(input)
}

/// Parse a sign indicator ("+" or "-").
fn parse_sign<'s>(input: &mut &'s str) -> Result<char> {
    one_of(['+', '-']).parse_next(input)
}

/// Parse the unsigned part of a decimal: `123`, `123.`, `123.45` or `.45`.
fn parse_magnitude<'s>(input: &mut &'s str) -> Result<()> {
    alt((
        (digit1, opt((parse_period, digit0))).void(),
        (parse_period, digit1).void(),
    ))
    .parse_next(input)
}

/// Parse and discard a period (`.`)
fn parse_period<'s>(input: &mut &'s str) -> Result<()> {
    literal(".").void().parse_next(input)
}
