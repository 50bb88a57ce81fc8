//! Formula parsing and term rewriting.

use std::fmt;

use logos::Logos;

use super::Die;
use crate::error::{FormulaError, FormulaResult};

/// One term of a formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// `NdM`, optionally rerolling once any die below `reroll_below`.
    Dice {
        /// Number of dice.
        count: u32,
        /// Die type.
        die: Die,
        /// Reroll once when a die shows less than this (`r<N`).
        reroll_below: Option<u32>,
    },
    /// An integer constant.
    Number(i64),
    /// An `@variable` looked up at evaluation time.
    Var(String),
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Dice {
                count,
                die,
                reroll_below,
            } => {
                write!(f, "{count}{die}")?;
                if let Some(n) = reroll_below {
                    write!(f, "r<{n}")?;
                }
                Ok(())
            }
            Term::Number(n) => write!(f, "{n}"),
            Term::Var(name) => write!(f, "@{name}"),
        }
    }
}

/// A term with its sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTerm {
    /// True if the term is subtracted.
    pub negative: bool,
    /// The term.
    pub term: Term,
}

/// A parsed dice formula: a signed sum of terms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Formula {
    /// Terms in source order.
    pub terms: Vec<SignedTerm>,
}

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
enum RawToken {
    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[regex(r"[0-9]*[dD][0-9]+(r<[0-9]+)?")]
    Dice,

    #[regex(r"[0-9]+")]
    Number,

    #[regex(r"@[a-zA-Z_][a-zA-Z0-9_.]*")]
    Var,
}

impl Formula {
    /// Parse a formula such as `1d20r<2 + @abl - 1`.
    ///
    /// Repeated signs fold (`+ -2` subtracts two).
    pub fn parse(source: &str) -> FormulaResult<Self> {
        let mut terms = Vec::new();
        let mut lexer = RawToken::lexer(source);
        let mut negative = false;
        let mut expect_term = true;

        while let Some(result) = lexer.next() {
            let span = lexer.span();
            let raw = result.map_err(|()| FormulaError::UnexpectedCharacter {
                formula: source.to_string(),
                offset: span.start,
                text: source[span.clone()].to_string(),
            })?;
            match raw {
                RawToken::Plus => expect_term = true,
                RawToken::Minus => {
                    negative = !negative;
                    expect_term = true;
                }
                RawToken::Dice | RawToken::Number | RawToken::Var => {
                    if !expect_term {
                        return Err(FormulaError::Malformed(source.to_string()));
                    }
                    let term = parse_term(raw, lexer.slice())?;
                    terms.push(SignedTerm { negative, term });
                    negative = false;
                    expect_term = false;
                }
            }
        }

        if terms.is_empty() {
            return Err(FormulaError::Empty);
        }
        if expect_term {
            return Err(FormulaError::Malformed(source.to_string()));
        }
        Ok(Self { terms })
    }

    /// Append a term.
    pub fn push(&mut self, negative: bool, term: Term) {
        self.terms.push(SignedTerm { negative, term });
    }

    /// Append every term of `other`.
    pub fn extend(&mut self, other: Formula) {
        self.terms.extend(other.terms);
    }

    /// Returns true if the formula rolls at least one die.
    pub fn has_dice(&self) -> bool {
        self.terms
            .iter()
            .any(|t| matches!(t.term, Term::Dice { count, .. } if count > 0))
    }

    /// The formula with every constant and variable removed.
    pub fn dice_only(&self) -> Formula {
        Formula {
            terms: self
                .terms
                .iter()
                .filter(|t| matches!(t.term, Term::Dice { .. }))
                .cloned()
                .collect(),
        }
    }

    /// Rescale every dice term to `count * multiply + add` dice.
    pub fn alter(&self, multiply: u32, add: u32) -> Formula {
        let mut altered = self.clone();
        for t in &mut altered.terms {
            if let Term::Dice { count, .. } = &mut t.term {
                *count = count.saturating_mul(multiply).saturating_add(add);
            }
        }
        altered
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, t) in self.terms.iter().enumerate() {
            match (i, t.negative) {
                (0, true) => write!(f, "-")?,
                (0, false) => {}
                (_, true) => write!(f, " - ")?,
                (_, false) => write!(f, " + ")?,
            }
            write!(f, "{}", t.term)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Formula {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_term(raw: RawToken, slice: &str) -> FormulaResult<Term> {
    match raw {
        RawToken::Number => slice
            .parse::<i64>()
            .map(Term::Number)
            .map_err(|_| FormulaError::NumberOutOfRange(slice.to_string())),
        RawToken::Var => Ok(Term::Var(slice[1..].to_string())),
        RawToken::Dice => parse_dice(slice),
        RawToken::Plus | RawToken::Minus => Err(FormulaError::Malformed(slice.to_string())),
    }
}

fn parse_dice(slice: &str) -> FormulaResult<Term> {
    let out_of_range = || FormulaError::NumberOutOfRange(slice.to_string());
    let lower = slice.to_ascii_lowercase();
    let (count, rest) = lower
        .split_once('d')
        .ok_or_else(|| FormulaError::Malformed(slice.to_string()))?;
    let (sides, reroll) = match rest.split_once("r<") {
        Some((sides, reroll)) => (sides, Some(reroll)),
        None => (rest, None),
    };

    let count = if count.is_empty() {
        1
    } else {
        count.parse::<u32>().map_err(|_| out_of_range())?
    };
    let sides = sides.parse::<u32>().map_err(|_| out_of_range())?;
    if sides == 0 {
        return Err(FormulaError::InvalidDie(slice.to_string()));
    }
    let reroll_below = reroll
        .map(|r| r.parse::<u32>().map_err(|_| out_of_range()))
        .transpose()?;

    Ok(Term::Dice {
        count,
        die: Die::from_sides(sides),
        reroll_below,
    })
}
