//! Grammars for chemical offsets (`-H2O+H`, `NH3+p`, `C2H3O2+e`) and chain shorthand (`16:0`, `18:1;O2`)

// Standard Library Imports
use std::iter;

// External Crate Imports
use nom::{
    Finish, IResult, Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1, one_of, satisfy},
    combinator::{all_consuming, cut, map, not, opt, recognize},
    error::{ErrorKind, ParseError as NomParseError},
    multi::{many0, many1},
    sequence::{pair, preceded, separated_pair},
};

// Local Crate Imports
use crate::{
    Atom, ChainSpec, Count, Element, OffsetGroup, OffsetKind, Particle,
    errors::{ParseError, ParseErrorKind},
};

// Public API ==========================================================================================================

pub(crate) fn parse_offset(input: &str) -> Result<Vec<OffsetGroup>, ParseError> {
    final_parser(chemical_offset, input, "chemical offset")
}

pub(crate) fn parse_chain(input: &str) -> Result<ChainSpec, ParseError> {
    final_parser(chain_spec, input, "chain")
}

// Error Plumbing ======================================================================================================

type ParseResult<'a, O> = IResult<&'a str, O, SpannedError<'a>>;

#[derive(Clone, Eq, PartialEq, Debug)]
struct SpannedError<'a> {
    input: &'a str,
    kind: ParseErrorKind,
}

impl<'a> NomParseError<&'a str> for SpannedError<'a> {
    fn from_error_kind(input: &'a str, kind: ErrorKind) -> Self {
        Self {
            input,
            kind: kind.into(),
        }
    }

    fn append(_input: &'a str, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

/// Replaces the kind of any recoverable error from `parser`, leaving fatal errors untouched
fn expect<'a, O>(
    mut parser: impl Parser<&'a str, O, SpannedError<'a>>,
    kind: ParseErrorKind,
) -> impl FnMut(&'a str) -> ParseResult<'a, O> {
    move |i| match parser.parse(i) {
        Err(nom::Err::Error(e)) => Err(nom::Err::Error(SpannedError {
            kind: kind.clone(),
            ..e
        })),
        result => result,
    }
}

fn fatal<O>(input: &str, kind: ParseErrorKind) -> ParseResult<'_, O> {
    Err(nom::Err::Failure(SpannedError { input, kind }))
}

fn final_parser<'a, O>(
    parser: impl Parser<&'a str, O, SpannedError<'a>>,
    input: &'a str,
    target: &'static str,
) -> Result<O, ParseError> {
    all_consuming(parser)(input)
        .finish()
        .map(|(_, output)| output)
        .map_err(|SpannedError { input: rest, kind }| {
            let start = input.len() - rest.len();
            let width = kind.width().min(rest.len());
            // NOTE: The additional space is added so that Diagnostic labels can point to the end of an input
            ParseError::new(format!("{input} "), target, (start, width).into(), kind)
        })
}

// Chemical Offsets ====================================================================================================

/// Chemical Offset = [ Offset Kind ] , Group , { Offset Kind , Group } ;
fn chemical_offset(i: &str) -> ParseResult<'_, Vec<OffsetGroup>> {
    let first = pair(map(opt(offset_kind), |k| k.unwrap_or(OffsetKind::Add)), group);
    let rest = many0(pair(offset_kind, cut(group)));
    map(pair(first, rest), |(first, rest)| {
        iter::once(first)
            .chain(rest)
            .map(|(kind, atoms)| OffsetGroup { kind, atoms })
            .collect()
    })(i)
}

/// Group = { Element , [ Count ] }- | [ Count ] , Particle ;
fn group(i: &str) -> ParseResult<'_, Vec<(Atom, Count)>> {
    let atom = pair(map(element, Atom::Element), map(opt(count), |c| c.unwrap_or(1)));
    let formula = many1(atom);
    let particles = map(pair(opt(count), particle), |(c, p)| {
        vec![(Atom::Particle(p), c.unwrap_or(1))]
    });
    expect(alt((formula, particles)), ParseErrorKind::ExpectedGroup)(i)
}

/// Element = uppercase , [ lowercase ] ;
fn element(i: &str) -> ParseResult<'_, Element> {
    let (rest, symbol) = element_symbol(i)?;
    match symbol.parse() {
        Ok(element) => Ok((rest, element)),
        Err(kind) => fatal(i, kind),
    }
}

/// Particle = lowercase ;
fn particle(i: &str) -> ParseResult<'_, Particle> {
    let (rest, symbol) = lowercase(i)?;
    match Particle::from_symbol(symbol) {
        Ok(particle) => Ok((rest, particle)),
        Err(kind) => fatal(i, kind),
    }
}

fn element_symbol(i: &str) -> ParseResult<'_, &str> {
    recognize(pair(uppercase, opt(lowercase)))(i)
}

fn uppercase(i: &str) -> ParseResult<'_, char> {
    satisfy(|c| c.is_ascii_uppercase())(i)
}

fn lowercase(i: &str) -> ParseResult<'_, char> {
    satisfy(|c| c.is_ascii_lowercase())(i)
}

/// Offset Kind = "+" | "-" ;
fn offset_kind(i: &str) -> ParseResult<'_, OffsetKind> {
    map(one_of("+-"), |c| {
        if c == '+' {
            OffsetKind::Add
        } else {
            OffsetKind::Remove
        }
    })(i)
}

/// Count = digit - "0" , { digit } ;
fn count(i: &str) -> ParseResult<'_, Count> {
    let not_zero = cut(expect(not(char('0')), ParseErrorKind::ExpectedNoLeadingZero));
    preceded(not_zero, unsigned)(i)
}

// Chains ==============================================================================================================

/// Chain = Number , ":" , Number , [ ";O" , [ Count ] ] ;
fn chain_spec(i: &str) -> ParseResult<'_, ChainSpec> {
    let carbon_and_double_bonds = separated_pair(
        number,
        cut(expect(char(':'), ParseErrorKind::ExpectedColon)),
        cut(number),
    );
    let oxidation = map(opt(preceded(tag(";O"), map(opt(count), |c| c.unwrap_or(1)))), |o| {
        o.unwrap_or(0)
    });
    map(
        pair(carbon_and_double_bonds, oxidation),
        |((carbon, double_bond), oxidation)| ChainSpec::new(carbon, double_bond, oxidation),
    )(i)
}

/// Number = digit , { digit } ;
fn number(i: &str) -> ParseResult<'_, u32> {
    expect(unsigned, ParseErrorKind::ExpectedNumber)(i)
}

fn unsigned(i: &str) -> ParseResult<'_, u32> {
    let (rest, digits) = digit1(i)?;
    match digits.parse() {
        Ok(n) => Ok((rest, n)),
        Err(_) => fatal(i, ParseErrorKind::NumberTooLarge(digits.to_owned())),
    }
}

// Module Tests ========================================================================================================
