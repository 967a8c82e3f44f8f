/// Ground-truth collaborator for compile-and-test runs.
///
/// Implementations compute the expected result for an input independently of
/// the submission. Any `Fn(&[i32]) -> Vec<i32>` closure qualifies.
pub trait ReferenceSort {
    fn sort(&self, input: &[i32]) -> Vec<i32>;
}

impl<F> ReferenceSort for F
where
    F: Fn(&[i32]) -> Vec<i32>,
{
    fn sort(&self, input: &[i32]) -> Vec<i32> {
        self(input)
    }
}

/// Standard library ascending sort.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdSort;

impl ReferenceSort for StdSort {
    fn sort(&self, input: &[i32]) -> Vec<i32> {
        let mut expected = input.to_vec();
        expected.sort_unstable();
        expected
    }
}
