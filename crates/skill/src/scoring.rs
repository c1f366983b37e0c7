//! Binary classification scores of probabilities against 0/1 outcomes.

/// Confusion counts with `probability > threshold` as the positive
/// prediction and `outcome == 1` as the positive class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Confusion {
    pub tp: usize,
    pub fp: usize,
    pub tn: usize,
    pub fn_: usize,
}

impl Confusion {
    pub fn at(scores: &[f64], outcomes: &[bool], threshold: f64) -> Self {
        let mut c = Confusion::default();
        for (&s, &o) in scores.iter().zip(outcomes) {
            match (s > threshold, o) {
                (true, true) => c.tp += 1,
                (true, false) => c.fp += 1,
                (false, false) => c.tn += 1,
                (false, true) => c.fn_ += 1,
            }
        }
        c
    }

    fn total(&self) -> usize {
        self.tp + self.fp + self.tn + self.fn_
    }

    /// Share of correct predictions; 0 for no samples.
    pub fn accuracy(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            n => (self.tp + self.tn) as f64 / n as f64,
        }
    }

    /// Harmonic mean of precision and recall; 0 when undefined.
    pub fn f1(&self) -> f64 {
        let denom = 2 * self.tp + self.fp + self.fn_;
        if denom == 0 {
            0.0
        } else {
            (2 * self.tp) as f64 / denom as f64
        }
    }
}

/// Receiver operating characteristic points, from the strictest threshold
/// (`+inf`, nothing predicted positive) down to the smallest score.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Roc {
    pub thresholds: Vec<f64>,
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
}

/// ROC curve with `score >= threshold` as the positive prediction, one
/// point per distinct score. `None` unless both classes are present.
pub(crate) fn roc_curve(scores: &[f64], outcomes: &[bool]) -> Option<Roc> {
    let positives = outcomes.iter().filter(|&&o| o).count();
    let negatives = outcomes.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut pairs: Vec<(f64, bool)> =
        scores.iter().copied().zip(outcomes.iter().copied()).collect();
    pairs.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut roc = Roc {
        thresholds: vec![f64::INFINITY],
        fpr: vec![0.0],
        tpr: vec![0.0],
    };
    let (mut tp, mut fp) = (0usize, 0usize);
    let mut i = 0;
    while i < pairs.len() {
        let score = pairs[i].0;
        while i < pairs.len() && pairs[i].0 == score {
            if pairs[i].1 {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
        }
        roc.thresholds.push(score);
        roc.fpr.push(fp as f64 / negatives as f64);
        roc.tpr.push(tp as f64 / positives as f64);
    }
    Some(roc)
}

/// Trapezoidal area under an ROC curve.
pub(crate) fn auc(roc: &Roc) -> f64 {
    hindcast_stats::trapezoid(&roc.fpr, &roc.tpr)
}
