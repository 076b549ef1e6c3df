//! Binary classification metrics over 0/1 label vectors.

/// Fraction of matching predictions.
pub fn accuracy(y_true: &[u8], y_pred: &[u8]) -> f64 {
    assert_eq!(y_true.len(), y_pred.len());
    if y_true.is_empty() {
        return 0.0;
    }
    let hits = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    hits as f64 / y_true.len() as f64
}

/// F1 of the positive class (label 1). Zero when precision or recall is
/// undefined, matching the usual zero-division convention.
pub fn f1_score(y_true: &[u8], y_pred: &[u8]) -> f64 {
    assert_eq!(y_true.len(), y_pred.len());

    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut fn_ = 0usize;
    for (&t, &p) in y_true.iter().zip(y_pred) {
        match (t, p) {
            (1, 1) => tp += 1,
            (0, 1) => fp += 1,
            (1, 0) => fn_ += 1,
            _ => {}
        }
    }

    if tp == 0 {
        return 0.0;
    }
    let precision = tp as f64 / (tp + fp) as f64;
    let recall = tp as f64 / (tp + fn_) as f64;
    2.0 * precision * recall / (precision + recall)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_predictions() {
        let y = [1, 0, 1, 0];
        assert_eq!(accuracy(&y, &y), 1.0);
        assert_eq!(f1_score(&y, &y), 1.0);
    }

    #[test]
    fn all_wrong() {
        assert_eq!(f1_score(&[1, 1], &[0, 0]), 0.0);
        assert_eq!(accuracy(&[1, 1], &[0, 0]), 0.0);
    }

    #[test]
    fn known_mixed_case() {
        // tp=1, fp=1, fn=1 -> precision=0.5, recall=0.5, f1=0.5
        let f1 = f1_score(&[1, 1, 0, 0], &[1, 0, 1, 0]);
        assert!((f1 - 0.5).abs() < 1e-9);
    }

    #[test]
    fn empty_inputs_are_zero() {
        assert_eq!(accuracy(&[], &[]), 0.0);
        assert_eq!(f1_score(&[], &[]), 0.0);
    }
}
