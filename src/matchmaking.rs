use crate::classad::ClassAd;
use crate::value::Value;

/// Two records paired for matchmaking.
///
/// While both sides are present, each one's `TARGET` is the other. Neither
/// side is owned exclusively: callers keep their own handles and may keep
/// mutating the records.
#[derive(Debug, Default)]
pub struct MatchClassAd {
    left: Option<ClassAd>,
    right: Option<ClassAd>,
}

impl MatchClassAd {
    pub fn new(left: Option<ClassAd>, right: Option<ClassAd>) -> Self {
        let pair = MatchClassAd { left, right };
        pair.wire();
        pair
    }

    /// Pair two present records.
    pub fn pair(left: &ClassAd, right: &ClassAd) -> Self {
        MatchClassAd::new(Some(left.clone()), Some(right.clone()))
    }

    pub fn left(&self) -> Option<&ClassAd> {
        self.left.as_ref()
    }

    pub fn right(&self) -> Option<&ClassAd> {
        self.right.as_ref()
    }

    /// Swap in a new left side, returning the old one with its target
    /// cleared.
    pub fn replace_left(&mut self, ad: Option<ClassAd>) -> Option<ClassAd> {
        let old = std::mem::replace(&mut self.left, ad);
        unwire(old.as_ref());
        self.wire();
        old
    }

    /// Swap in a new right side, returning the old one with its target
    /// cleared.
    pub fn replace_right(&mut self, ad: Option<ClassAd>) -> Option<ClassAd> {
        let old = std::mem::replace(&mut self.right, ad);
        unwire(old.as_ref());
        self.wire();
        old
    }

    fn wire(&self) {
        match (&self.left, &self.right) {
            (Some(left), Some(right)) => {
                left.set_target(Some(right));
                right.set_target(Some(left));
            }
            (Some(alone), None) | (None, Some(alone)) => alone.set_target(None),
            (None, None) => {}
        }
    }

    // ── Evaluation ──────────────────────────────────────────────────

    /// Evaluate `name` in the left record (where `TARGET` is the right one).
    pub fn evaluate_left(&self, name: &str) -> Value {
        self.left
            .as_ref()
            .map_or(Value::Undefined, |ad| ad.evaluate_attr(name))
    }

    /// Evaluate `name` in the right record (where `TARGET` is the left one).
    pub fn evaluate_right(&self, name: &str) -> Value {
        self.right
            .as_ref()
            .map_or(Value::Undefined, |ad| ad.evaluate_attr(name))
    }

    /// True only when `left_attr` is `true` in the left record and
    /// `right_attr` is `true` in the right record. Any other outcome,
    /// including a missing side, is a failed match.
    pub fn symmetry(&self, left_attr: &str, right_attr: &str) -> bool {
        let left = self.evaluate_left(left_attr);
        let right = self.evaluate_right(right_attr);
        let matched = left == Value::Boolean(true) && right == Value::Boolean(true);
        tracing::debug!(
            %left_attr,
            %right_attr,
            left = %left,
            right = %right,
            matched,
            "symmetric match"
        );
        matched
    }

    /// Both sides' `Requirements` hold.
    pub fn matches(&self) -> bool {
        self.symmetry("Requirements", "Requirements")
    }

    /// The left record's `Rank` as a real, or `None` when it is not numeric.
    pub fn evaluate_rank_left(&self) -> Option<f64> {
        self.evaluate_left("Rank").as_f64()
    }

    /// The right record's `Rank` as a real, or `None` when it is not numeric.
    pub fn evaluate_rank_right(&self) -> Option<f64> {
        self.evaluate_right("Rank").as_f64()
    }
}

fn unwire(ad: Option<&ClassAd>) {
    if let Some(ad) = ad {
        ad.set_target(None);
    }
}
