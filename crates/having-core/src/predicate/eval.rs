use crate::{
    error::EvalError,
    predicate::{
        model::{ComparePredicate, Predicate},
        row::{FieldPresence, Row},
    },
};

///
/// Evaluate a predicate against a single aggregated row.
///
/// Combinators visit children in declaration order and stop as soon as the
/// outcome is decided, so the set of children evaluated (and the metric reads
/// they perform) is part of the contract:
/// - `And` stops at the first `false`; an empty `And` is `true`
/// - `Or` stops at the first `true`; an empty `Or` is `false`
///
/// A comparison against a metric the row does not carry fails with
/// [`EvalError::MissingField`] and aborts the whole evaluation.
///
pub fn eval<R: Row + ?Sized>(row: &R, predicate: &Predicate) -> Result<bool, EvalError> {
    match predicate {
        Predicate::Always => Ok(true),
        Predicate::Never => Ok(false),
        Predicate::Not(inner) => eval(row, inner).map(|matched| !matched),

        Predicate::And(children) => {
            for child in children {
                if !eval(row, child)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }

        Predicate::Or(children) => {
            for child in children {
                if eval(row, child)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }

        Predicate::Compare(cmp) => eval_compare(row, cmp),
    }
}

// Widen the row's metric to f64 and apply the comparison operator.
fn eval_compare<R: Row + ?Sized>(row: &R, cmp: &ComparePredicate) -> Result<bool, EvalError> {
    let FieldPresence::Present(actual) = row.metric(cmp.field()) else {
        return Err(EvalError::MissingField {
            field: cmp.field().to_string(),
        });
    };

    Ok(cmp.op().apply(actual.to_f64(), cmp.threshold()))
}

///
/// TESTS
///
