//! # Selectors
//!
//! Derived values are computed from state snapshots by plain functions.
//! [`Memo`] adds the caching layer: the projection function only reruns
//! when its input actually changed by value, so an expensive derivation
//! sitting behind a frequently-polled view costs one comparison per poll.

/// Input-keyed cache for a single derived value.
///
/// ```
/// use scene_store::Memo;
///
/// let mut runs = 0;
/// let mut memo: Memo<Vec<i64>, i64> = Memo::new();
/// let mut total = |xs: &Vec<i64>| {
///     runs += 1;
///     xs.iter().sum()
/// };
///
/// assert_eq!(memo.project(vec![1, 2], &mut total), 3);
/// assert_eq!(memo.project(vec![1, 2], &mut total), 3);
/// assert_eq!(memo.project(vec![1, 2, 3], &mut total), 6);
/// assert_eq!(runs, 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Memo<I, O> {
    cached: Option<(I, O)>,
}

impl<I: PartialEq, O: Clone> Memo<I, O> {
    pub fn new() -> Self {
        Self { cached: None }
    }

    /// Returns the derived value for `input`, recomputing only when
    /// `input` differs from the previously seen one.
    pub fn project<F>(&mut self, input: I, mut derive: F) -> O
    where
        F: FnMut(&I) -> O,
    {
        if let Some((cached_in, cached_out)) = &self.cached {
            if *cached_in == input {
                return cached_out.clone();
            }
        }
        let output = derive(&input);
        self.cached = Some((input, output.clone()));
        output
    }

    /// Drops the cached pair so the next [`project`](Self::project) call
    /// recomputes unconditionally.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recomputes_only_on_changed_input() {
        let mut memo = Memo::new();
        let mut runs = 0;
        for input in [1, 1, 1, 2, 2, 1] {
            memo.project(input, |n| {
                runs += 1;
                n * 10
            });
        }
        // 1, then 2, then back to 1: equality is against the last input
        // only, not a history.
        assert_eq!(runs, 3);
    }

    #[test]
    fn invalidate_forces_a_recompute() {
        let mut memo = Memo::new();
        let mut runs = 0;
        let mut derive = |n: &i32| {
            runs += 1;
            *n
        };
        memo.project(5, &mut derive);
        memo.project(5, &mut derive);
        memo.invalidate();
        memo.project(5, &mut derive);
        assert_eq!(runs, 2);
    }
}
