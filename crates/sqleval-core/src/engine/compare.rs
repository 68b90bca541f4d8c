//! Result-set comparison.
//!
//! Rows are matched by index: row `i` of one result is compared with row `i`
//! of the other as a multiset of values. Column order inside a row does not
//! matter, row order does. Values compare exactly, type included.

use crate::model::{TabularResult, Value};
use std::cmp::Ordering;
use std::fmt;

/// First row at which two results disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct RowDiff {
    pub index: usize,
    /// Values present in the left row but not (or fewer times) in the right one.
    /// `None` when the left result has no row at `index`.
    pub only_left: Option<Vec<Value>>,
    pub only_right: Option<Vec<Value>>,
}

impl fmt::Display for RowDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}: ", self.index)?;
        match (&self.only_left, &self.only_right) {
            (None, _) => write!(f, "missing on the left"),
            (_, None) => write!(f, "missing on the right"),
            (Some(l), Some(r)) => write!(f, "left has [{}], right has [{}]", join(l), join(r)),
        }
    }
}

fn join(values: &[Value]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// True when both results hold the same row multisets at every index.
pub fn results_match(left: &TabularResult, right: &TabularResult) -> bool {
    first_difference(left, right).is_none()
}

/// Diagnostic variant of [`results_match`]; stops at the first mismatching row.
pub fn first_difference(left: &TabularResult, right: &TabularResult) -> Option<RowDiff> {
    let n = left.len().max(right.len());
    for index in 0..n {
        match (left.rows().get(index), right.rows().get(index)) {
            (Some(l), Some(r)) => {
                let (only_left, only_right) = multiset_difference(l, r);
                if !only_left.is_empty() || !only_right.is_empty() {
                    return Some(RowDiff {
                        index,
                        only_left: Some(only_left),
                        only_right: Some(only_right),
                    });
                }
            }
            (l, r) => {
                return Some(RowDiff {
                    index,
                    only_left: l.cloned(),
                    only_right: r.cloned(),
                });
            }
        }
    }
    None
}

fn sorted(row: &[Value]) -> Vec<&Value> {
    let mut v: Vec<&Value> = row.iter().collect();
    v.sort_by(|a, b| a.total_cmp(b));
    v
}

fn multiset_difference(left: &[Value], right: &[Value]) -> (Vec<Value>, Vec<Value>) {
    let l = sorted(left);
    let r = sorted(right);
    let (mut i, mut j) = (0, 0);
    let mut only_left = Vec::new();
    let mut only_right = Vec::new();

    while i < l.len() && j < r.len() {
        match l[i].total_cmp(r[j]) {
            Ordering::Equal => {
                i += 1;
                j += 1;
            }
            Ordering::Less => {
                only_left.push(l[i].clone());
                i += 1;
            }
            Ordering::Greater => {
                only_right.push(r[j].clone());
                j += 1;
            }
        }
    }
    only_left.extend(l[i..].iter().map(|v| (*v).clone()));
    only_right.extend(r[j..].iter().map(|v| (*v).clone()));
    (only_left, only_right)
}
