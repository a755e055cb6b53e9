use core::fmt::{self, Display, Formatter};

use thiserror::Error;
use winnow::token::{one_of, take_while};
use winnow::{Parser, Result};

use super::parse_numbers::{parse_decimal, parse_digits_u16};

/// Maximum number of argument words held for a single line.
pub const MAX_ARGS: usize = 16;

/// Command code, like `G1` or `M280`.
///
/// Codes compare by value: `G01` and `G1` are the same code.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Code {
    letter: char,
    number: u16,
}
impl Code {
    /// Creates a new `Code`.
    pub const fn new(letter: char, number: u16) -> Self {
        Self { letter, number }
    }

    /// Creates a `Gxxx` code.
    pub const fn g(number: u16) -> Self {
        Self::new('G', number)
    }

    /// Creates an `Mxxx` code.
    pub const fn m(number: u16) -> Self {
        Self::new('M', number)
    }

    /// The (upper case) letter of the code.
    pub fn letter(&self) -> char {
        self.letter
    }

    /// The numeric part of the code.
    pub fn number(&self) -> u16 {
        self.number
    }
}

impl Display for Code {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.letter, self.number)
    }
}

/// Argument word, like `X150` or `F3000`.
#[derive(Debug, PartialEq, Copy, Clone)]
pub struct Word {
    pub letter: char,
    pub value: f64,
}

/// One parsed line: a code followed by its arguments, in input order.
#[derive(Debug, PartialEq, Clone)]
pub struct Line {
    pub code: Code,
    pub args: heapless::Vec<Word, MAX_ARGS>,
}
impl Line {
    /// Parses a single line of G-code.
    ///
    /// Anything after a `;` is a comment and is dropped.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(line))` if the line held a command.
    /// - `Ok(None)` if the line was blank (or only a comment).
    /// - `Err(_)` if the line could not be parsed.
    pub fn parse(input: &str) -> core::result::Result<Option<Line>, ParseError> {
        let mut input_ref = strip_comment(input).trim();
        if input_ref.is_empty() {
            return Ok(None);
        }

        let code = parse_trim_code
            .parse_next(&mut input_ref)
            .map_err(|_| ParseError::Syntax)?;
        let mut args = heapless::Vec::new();
        match parse_words(&mut input_ref, &mut args) {
            Err(_) => Err(ParseError::Syntax),
            Ok(false) => Err(ParseError::TooManyArguments),
            Ok(true) => Ok(Some(Line { code, args })),
        }
    }

    /// Returns the value of the argument with the given letter.
    ///
    /// When a letter is repeated, the last occurrence wins. An argument
    /// whose value is `0` is still present.
    pub fn arg(&self, letter: char) -> Option<f64> {
        self.args
            .iter()
            .rev()
            .find(|word| word.letter == letter)
            .map(|word| word.value)
    }
}

/// Errors that can occur while parsing a line.
#[derive(Error, Debug, PartialEq, Eq, Copy, Clone)]
pub enum ParseError {
    /// A word lacked a letter prefix or a valid number.
    #[error("malformed word")]
    Syntax,
    /// The line held more arguments than can be buffered.
    #[error("too many arguments")]
    TooManyArguments,
}

/// Parse argument words, storing them in a buffer.
///
/// Parsing stops when the input is empty or the buffer is full. If the buffer
/// fills up first, the input is left at the word that did not fit.
///
/// # Returns
///
/// - `Ok(completed)` if parsing was successful. `completed` indicates whether
///   the whole input was consumed.
/// - `Err(_)` if a word could not be parsed.
fn parse_words<'s, const N: usize>(
    input: &mut &'s str,
    buffer: &mut heapless::Vec<Word, N>,
) -> Result<bool> {
    while !input.is_empty() {
        let prev_input = *input;
        let word = parse_trim_word.parse_next(input)?;
        if buffer.push(word).is_err() {
            *input = prev_input;
            break;
        }
    }
    Ok(input.is_empty())
}

/// Drop a trailing `;` comment.
fn strip_comment(input: &str) -> &str {
    match input.find(';') {
        Some(index) => &input[..index],
        None => input,
    }
}

/// Parse a Code, trimming whitespace on either side.
fn parse_trim_code<'s>(input: &mut &'s str) -> Result<Code> {
    skip_ws.parse_next(input)?;
    let result = parse_code.parse_next(input)?;
    skip_ws.parse_next(input)?;
    Ok(result)
}

/// Parse a Word, trimming whitespace on either side.
fn parse_trim_word<'s>(input: &mut &'s str) -> Result<Word> {
    skip_ws.parse_next(input)?;
    let result = parse_word.parse_next(input)?;
    skip_ws.parse_next(input)?;
    Ok(result)
}

/// Parse a command code, like `G1`.
fn parse_code<'s>(input: &mut &'s str) -> Result<Code> {
    let letter = parse_letter.parse_next(input)?;
    let number = parse_digits_u16.parse_next(input)?;
    Ok(Code::new(letter, number))
}

/// Parse an argument word, like `X-12.5`.
fn parse_word<'s>(input: &mut &'s str) -> Result<Word> {
    let letter = parse_letter.parse_next(input)?;
    let value = parse_decimal.parse_next(input)?;
    Ok(Word { letter, value })
}

/// Parse an ASCII letter, normalized to upper case.
fn parse_letter<'s>(input: &mut &'s str) -> Result<char> {
    one_of(|c: char| c.is_ascii_alphabetic())
        .map(|c: char| c.to_ascii_uppercase())
        .parse_next(input)
}

/// Skip whitespace when parsing.
fn skip_ws<'s>(input: &mut &'s str) -> Result<()> {
    take_while(0.., char::is_whitespace)
        .parse_next(input)
        .map(|_| ())
}
