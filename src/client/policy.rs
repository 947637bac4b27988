//! Acceptable-status sets for one dispatched operation.

/// Immutable, non-empty set of response status codes treated as success.
/// Membership is exact; 201 is not "in" {200, 202}.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuccessPolicy {
    codes: Vec<u16>,
}

impl SuccessPolicy {
    /// Policy accepting exactly the given codes. Falls back to plain OK
    /// when given nothing, keeping the non-empty invariant.
    pub fn new(codes: impl IntoIterator<Item = u16>) -> Self {
        let mut codes: Vec<u16> = codes.into_iter().collect();
        if codes.is_empty() {
            codes.push(200);
        }
        codes.sort_unstable();
        codes.dedup();
        Self { codes }
    }

    /// Plain 200-only policy.
    pub fn ok() -> Self {
        Self::new([200])
    }

    /// 200-or-202 policy used by asynchronous status-check operations.
    pub fn ok_or_accepted() -> Self {
        Self::new([200, 202])
    }

    pub fn accepts(&self, status: u16) -> bool {
        self.codes.binary_search(&status).is_ok()
    }

    pub fn codes(&self) -> &[u16] {
        &self.codes
    }
}

impl Default for SuccessPolicy {
    fn default() -> Self {
        Self::ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_accepts_only_ok() {
        let policy = SuccessPolicy::default();
        assert!(policy.accepts(200));
        assert!(!policy.accepts(202));
        assert!(!policy.accepts(404));
    }

    #[test]
    fn membership_is_exact_not_a_range() {
        let policy = SuccessPolicy::ok_or_accepted();
        assert!(policy.accepts(200));
        assert!(policy.accepts(202));
        assert!(!policy.accepts(201));
        assert!(!policy.accepts(204));
    }

    #[test]
    fn empty_input_falls_back_to_ok() {
        let policy = SuccessPolicy::new([]);
        assert_eq!(policy.codes(), &[200]);
    }

    #[test]
    fn duplicates_collapse() {
        let policy = SuccessPolicy::new([202, 200, 202]);
        assert_eq!(policy.codes(), &[200, 202]);
    }
}
