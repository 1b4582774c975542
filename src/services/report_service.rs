use crate::models::grading::{GradingResult, TestResult};

pub struct ReportService;

impl ReportService {
    /// Folds per-question results into totals. Percentage keeps one decimal
    /// place and is zero when nothing was gradable.
    pub fn summarize(results: Vec<GradingResult>) -> TestResult {
        let total_score: f64 = results.iter().map(|r| r.score).sum();
        let max_possible_score: f64 = results.iter().map(|r| r.max_score).sum();

        TestResult {
            percentage: percentage(total_score, max_possible_score),
            results,
            total_score,
            max_possible_score,
        }
    }
}

pub fn percentage(total: f64, max: f64) -> f64 {
    if max > 0.0 {
        (1000.0 * total / max).round() / 10.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(score: f64, max_score: f64) -> GradingResult {
        GradingResult {
            question_id: "q".into(),
            score,
            max_score,
            is_correct: score == max_score,
            feedback: String::new(),
        }
    }

    #[test]
    fn empty_input_is_all_zero() {
        let summary = ReportService::summarize(vec![]);
        assert_eq!(summary.total_score, 0.0);
        assert_eq!(summary.max_possible_score, 0.0);
        assert_eq!(summary.percentage, 0.0);
        assert!(summary.results.is_empty());
    }

    #[test]
    fn sums_and_rounds_to_one_decimal() {
        let summary = ReportService::summarize(vec![result(1.0, 3.0), result(0.0, 3.0), result(1.0, 1.0)]);
        assert_eq!(summary.total_score, 2.0);
        assert_eq!(summary.max_possible_score, 7.0);
        // 2/7 = 28.571...
        assert_eq!(summary.percentage, 28.6);
    }

    #[test]
    fn percentage_stays_within_bounds() {
        let cases = [
            vec![result(0.0, 5.0)],
            vec![result(5.0, 5.0), result(10.0, 10.0)],
            vec![result(0.33, 1.0), result(6.0, 9.0), result(2.5, 4.0)],
        ];
        for results in cases {
            let total: f64 = results.iter().map(|r| r.score).sum();
            let max: f64 = results.iter().map(|r| r.max_score).sum();
            let summary = ReportService::summarize(results);
            assert_eq!(summary.percentage, (1000.0 * total / max).round() / 10.0);
            assert!((0.0..=100.0).contains(&summary.percentage));
        }
    }

    #[test]
    fn zero_max_gives_zero_percentage() {
        assert_eq!(percentage(3.0, 0.0), 0.0);
    }
}
