use crate::command::Value;

/// Whether the produced output is exactly the expected output.
///
/// Same length, same order, exact values.
pub fn validate(output: &[Value], expected: &[Value]) -> bool {
    output == expected
}

/// Progress of a run's output towards the expected output.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Verdict {
    /// Everything so far is correct, but more is expected.
    Pending,
    Matched,
    /// Some value is wrong, or there are too many values. No later output can fix this.
    Mismatched,
}

impl Verdict {
    pub fn of(output: &[Value], expected: &[Value]) -> Self {
        if validate(output, expected) {
            Verdict::Matched
        } else if expected.starts_with(output) {
            Verdict::Pending
        } else {
            Verdict::Mismatched
        }
    }
}
