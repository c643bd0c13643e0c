//! Token parsers for the text encoding

// nom parser combinators
use nom::character::complete::{self, multispace0};
use nom::number::complete::double;
use nom::sequence::preceded;
use nom::IResult;

/// A whitespace-separated floating point token
///
/// Accepts both the plain and fortran scientific forms, e.g. `1.0` and
/// `0.10000E+01`.
pub(crate) fn token_f64(i: &str) -> IResult<&str, f64> {
    preceded(multispace0, double)(i)
}

/// A whitespace-separated signed integer token
pub(crate) fn token_i64(i: &str) -> IResult<&str, i64> {
    preceded(multispace0, complete::i64)(i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_tokens() {
        assert_eq!(token_f64("  1.23 rest"), Ok((" rest", 1.23)));
        assert_eq!(token_f64("0.45700E-01"), Ok(("", 0.0457)));
        assert_eq!(token_f64("  -2.0000E+00  "), Ok(("  ", -2.0)));
        // integers are valid floats
        assert_eq!(token_f64("9000"), Ok(("", 9000.0)));
        assert!(token_f64("  banana").is_err());
    }

    #[test]
    fn integer_tokens() {
        assert_eq!(token_i64("   -1"), Ok(("", -1)));
        assert_eq!(token_i64("1000 2000"), Ok((" 2000", 1000)));
        assert!(token_i64(" x12").is_err());
    }
}
