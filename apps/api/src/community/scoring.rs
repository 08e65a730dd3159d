//! Rules for posts and votes that do not need the database.

use crate::errors::AppError;

pub const MIN_TITLE_LEN: usize = 10;
pub const MIN_QUESTION_LEN: usize = 20;
pub const MIN_ANSWER_LEN: usize = 10;
pub const TOP_CONTRIBUTORS: i64 = 5;
pub const POPULAR_TAGS: i64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    /// Each vote moves the counter by exactly one; there is no floor.
    pub fn delta(&self) -> i64 {
        match self {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
        }
    }

    pub fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        match raw {
            Some("up") => Ok(VoteDirection::Up),
            Some("down") => Ok(VoteDirection::Down),
            _ => Err(AppError::Validation(
                "Vote type must be \"up\" or \"down\"".to_string(),
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VoteDirection::Up => "up",
            VoteDirection::Down => "down",
        }
    }
}

/// Listing order. Unknown values fall back to `Recent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuestionSort {
    #[default]
    Recent,
    Popular,
    /// Recent first, restricted to questions without a best answer.
    Unanswered,
}

impl QuestionSort {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("popular") => QuestionSort::Popular,
            Some("unanswered") => QuestionSort::Unanswered,
            _ => QuestionSort::Recent,
        }
    }

    pub fn order_by(&self) -> &'static str {
        match self {
            QuestionSort::Popular => "q.votes DESC, q.created_at DESC, q.id DESC",
            QuestionSort::Recent | QuestionSort::Unanswered => "q.created_at DESC, q.id DESC",
        }
    }

    pub fn unanswered_only(&self) -> bool {
        matches!(self, QuestionSort::Unanswered)
    }
}

/// A question ready to insert: trimmed, with empty tags dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct NewQuestion {
    pub title: String,
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
}

pub fn validate_question(
    title: &str,
    content: &str,
    category: &str,
    tags: &[String],
) -> Result<NewQuestion, AppError> {
    let (title, content, category) = (title.trim(), content.trim(), category.trim());
    if title.chars().count() < MIN_TITLE_LEN {
        return Err(AppError::Validation(format!(
            "Title must be at least {MIN_TITLE_LEN} characters long"
        )));
    }
    if content.chars().count() < MIN_QUESTION_LEN {
        return Err(AppError::Validation(format!(
            "Question content must be at least {MIN_QUESTION_LEN} characters long"
        )));
    }
    if category.is_empty() {
        return Err(AppError::Validation("Category is required".to_string()));
    }

    let mut cleaned: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if !cleaned.iter().any(|seen| seen == tag) {
            cleaned.push(tag.to_string());
        }
    }

    Ok(NewQuestion {
        title: title.to_string(),
        content: content.to_string(),
        category: category.to_string(),
        tags: cleaned,
    })
}

pub fn validate_answer(content: &str) -> Result<&str, AppError> {
    let content = content.trim();
    if content.chars().count() < MIN_ANSWER_LEN {
        return Err(AppError::Validation(format!(
            "Answer must be at least {MIN_ANSWER_LEN} characters long"
        )));
    }
    Ok(content)
}

/// Only the question's author may pick its best answer, and the answer has
/// to belong to that question.
pub fn check_best_answer(
    question_id: i64,
    question_author: Option<i64>,
    caller: i64,
    answer_question: Option<i64>,
) -> Result<(), AppError> {
    if question_author != Some(caller) {
        return Err(AppError::Forbidden(
            "Only question author can mark best answer".to_string(),
        ));
    }
    if answer_question != Some(question_id) {
        return Err(AppError::NotFound("Answer not found".to_string()));
    }
    Ok(())
}

/// Percentage of answered questions, one decimal place.
pub fn answer_rate(answered: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let rate = answered as f64 / total as f64 * 100.0;
    (rate * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_down_votes_from_fifteen() {
        let votes = (0..3).fold(15, |votes, _| votes + VoteDirection::Down.delta());
        assert_eq!(votes, 12);
        // no floor
        assert_eq!((0..2).fold(0, |votes, _| votes + VoteDirection::Down.delta()), -2);
    }

    #[test]
    fn test_vote_direction_parse() {
        assert_eq!(VoteDirection::parse(Some("up")).unwrap(), VoteDirection::Up);
        assert!(matches!(
            VoteDirection::parse(Some("sideways")),
            Err(AppError::Validation(_))
        ));
        assert!(VoteDirection::parse(None).is_err());
    }

    #[test]
    fn test_question_length_rules() {
        let ok = validate_question(
            "  How to plan JEE revision?  ",
            "I have three months left, what should I focus on?",
            "JEE Main",
            &[
                "jee-main".to_string(),
                " ".to_string(),
                "jee-main".to_string(),
                "revision".to_string(),
            ],
        )
        .unwrap();
        assert_eq!(ok.title, "How to plan JEE revision?");
        assert_eq!(ok.tags, ["jee-main", "revision"]);

        let short_title = validate_question("Too short", "x".repeat(20).as_str(), "NEET", &[]);
        assert!(matches!(short_title, Err(AppError::Validation(msg)) if msg.starts_with("Title")));

        let short_body = validate_question("A long enough title", "too brief", "NEET", &[]);
        assert!(matches!(short_body, Err(AppError::Validation(msg)) if msg.starts_with("Question content")));

        let no_category =
            validate_question("A long enough title", &"y".repeat(25), "   ", &[]);
        assert!(matches!(no_category, Err(AppError::Validation(msg)) if msg == "Category is required"));
    }

    #[test]
    fn test_answer_length_is_measured_after_trim() {
        assert!(validate_answer("     short     ").is_err());
        assert_eq!(validate_answer(" Revise NCERT first ").unwrap(), "Revise NCERT first");
    }

    #[test]
    fn test_best_answer_rules() {
        assert!(check_best_answer(1, Some(7), 7, Some(1)).is_ok());
        assert!(matches!(
            check_best_answer(1, Some(7), 8, Some(1)),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            check_best_answer(1, None, 7, Some(1)),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            check_best_answer(1, Some(7), 7, Some(2)),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            check_best_answer(1, Some(7), 7, None),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_answer_rate_rounding() {
        assert_eq!(answer_rate(0, 0), 0.0);
        assert_eq!(answer_rate(2, 3), 66.7);
        assert_eq!(answer_rate(3, 3), 100.0);
    }

    #[test]
    fn test_sort_fallback() {
        assert_eq!(QuestionSort::parse(Some("popular")), QuestionSort::Popular);
        assert_eq!(QuestionSort::parse(Some("oldest")), QuestionSort::Recent);
        assert!(QuestionSort::parse(Some("unanswered")).unanswered_only());
        assert!(!QuestionSort::parse(None).unanswered_only());
    }
}
