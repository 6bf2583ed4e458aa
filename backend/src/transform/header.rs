//! Grade column header parsing.
//!
//! Gradebook exports label question responses as `Q. <n> /<max>`, e.g.
//! `Q. 12 /25.00`. Ungraded (open-ended) questions carry no `/<max>` suffix.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::QuestionColumn;

/// Prefix marking a question response column.
pub const QUESTION_PREFIX: &str = "Q.";

static QUESTION_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+").expect("valid question number pattern"));

static MAX_SCORE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/\s*(\d*\.\d+|\d+(?:\.\d*)?)\s*$").expect("valid max score pattern")
});

/// Parse a grade column label into a [`QuestionColumn`].
///
/// Returns `None` for labels that are not question columns or carry no
/// usable question number. A `/` suffix that is not a positive number also
/// excludes the column; the max defaults to 1 only when there is no suffix.
pub fn parse_question_header(label: &str) -> Option<QuestionColumn> {
    let trimmed = label.trim();
    if !trimmed.starts_with(QUESTION_PREFIX) {
        return None;
    }

    let number = QUESTION_NUMBER.find(trimmed)?;
    let question_number = number.as_str().parse::<u32>().ok()?;

    let max_score = match MAX_SCORE.captures(trimmed) {
        Some(caps) => caps[1].parse::<f64>().ok().filter(|max| *max > 0.0)?,
        None if trimmed[number.end()..].contains('/') => return None,
        None => 1.0,
    };

    Some(QuestionColumn {
        question_number,
        max_score,
        raw_label: label.to_string(),
    })
}

/// Parse every header, keeping only question columns, in header order.
pub fn parse_question_columns<'a, I>(labels: I) -> Vec<QuestionColumn>
where
    I: IntoIterator<Item = &'a String>,
{
    labels
        .into_iter()
        .filter_map(|label| parse_question_header(label))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_and_max() {
        let col = parse_question_header("Q. 12 /25").unwrap();
        assert_eq!(col.question_number, 12);
        assert_eq!(col.max_score, 25.0);
        assert_eq!(col.raw_label, "Q. 12 /25");
    }

    #[test]
    fn test_decimal_max() {
        let col = parse_question_header("Q. 3 /2.50").unwrap();
        assert_eq!(col.question_number, 3);
        assert_eq!(col.max_score, 2.5);
    }

    #[test]
    fn test_no_max_defaults_to_one() {
        let col = parse_question_header("Q. 7").unwrap();
        assert_eq!(col.question_number, 7);
        assert_eq!(col.max_score, 1.0);
    }

    #[test]
    fn test_not_a_question_column() {
        assert!(parse_question_header("Email address").is_none());
        assert!(parse_question_header("Grade/10.00").is_none());
        assert!(parse_question_header("State").is_none());
    }

    #[test]
    fn test_question_without_number() {
        assert!(parse_question_header("Q. essay").is_none());
    }

    #[test]
    fn test_zero_max_rejected() {
        assert!(parse_question_header("Q. 4 /0.00").is_none());
    }

    #[test]
    fn test_leading_dot_max() {
        let col = parse_question_header("Q. 1 /.5").unwrap();
        assert_eq!(col.max_score, 0.5);
    }

    #[test]
    fn test_unreadable_max_rejected() {
        assert!(parse_question_header("Q. 1 /1,000.00").is_none());
        assert!(parse_question_header("Q. 3 /-").is_none());
        assert!(parse_question_header("Q. 3 /").is_none());
    }

    #[test]
    fn test_filters_columns_in_order() {
        let labels: Vec<String> = vec![
            "Last name".into(),
            "Q. 2 /20".into(),
            "Started on".into(),
            "Q. 1 /10".into(),
        ];
        let cols = parse_question_columns(&labels);
        let numbers: Vec<u32> = cols.iter().map(|c| c.question_number).collect();
        assert_eq!(numbers, vec![2, 1]);
    }
}
