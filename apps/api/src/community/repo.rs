//! Questions and answers as rows. Counters move through single UPDATE
//! statements so concurrent votes never overwrite each other.

use sqlx::PgPool;
use tracing::info;

use crate::community::scoring::{check_best_answer, NewQuestion, QuestionSort, VoteDirection};
use crate::errors::AppError;
use crate::models::community::{
    AnswerRow, AuthoredAnswerRow, CommunityTotals, ContributorRow, QuestionRow,
};
use crate::query::{PageInfo, PageRequest};

/// Listing filters; `None` disables a filter.
#[derive(Debug, Default, Clone)]
pub struct QuestionQuery<'a> {
    pub category: Option<&'a str>,
    pub tag: Option<&'a str>,
    pub search: Option<&'a str>,
    pub sort: QuestionSort,
}

const QUESTION_COLUMNS: &str =
    "q.*, u.username AS author_name FROM questions q LEFT JOIN users u ON u.id = q.author_id";

const QUESTION_FILTER: &str = r#"
    WHERE ($1::TEXT IS NULL OR LOWER(q.category) = LOWER($1))
      AND ($2::TEXT IS NULL OR EXISTS (
            SELECT 1 FROM UNNEST(q.tags) AS t(tag) WHERE LOWER(t.tag) = LOWER($2)))
      AND ($3::TEXT IS NULL
            OR POSITION(LOWER($3) IN LOWER(q.title)) > 0
            OR POSITION(LOWER($3) IN LOWER(q.content)) > 0)
      AND (NOT $4 OR NOT q.is_answered)
"#;

/// Which counter a vote lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteTarget {
    Question,
    Answer,
}

impl VoteTarget {
    fn table(&self) -> &'static str {
        match self {
            VoteTarget::Question => "questions",
            VoteTarget::Answer => "answers",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            VoteTarget::Question => "Question",
            VoteTarget::Answer => "Answer",
        }
    }
}

fn question_not_found() -> AppError {
    AppError::NotFound("Question not found".to_string())
}

pub async fn list_questions(
    pool: &PgPool,
    query: &QuestionQuery<'_>,
    page: PageRequest,
) -> Result<(Vec<QuestionRow>, PageInfo), AppError> {
    let unanswered = query.sort.unanswered_only();

    let count_sql = format!("SELECT COUNT(*) FROM questions q {QUESTION_FILTER}");
    let total: i64 = sqlx::query_scalar(&count_sql)
        .bind(query.category)
        .bind(query.tag)
        .bind(query.search)
        .bind(unanswered)
        .fetch_one(pool)
        .await?;

    let list_sql = format!(
        "SELECT {QUESTION_COLUMNS} {QUESTION_FILTER} ORDER BY {} LIMIT $5 OFFSET $6",
        query.sort.order_by()
    );
    let questions = sqlx::query_as(&list_sql)
        .bind(query.category)
        .bind(query.tag)
        .bind(query.search)
        .bind(unanswered)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(pool)
        .await?;

    Ok((questions, PageInfo::new(page, total)))
}

async fn find_question(pool: &PgPool, id: i64) -> Result<QuestionRow, AppError> {
    let sql = format!("SELECT {QUESTION_COLUMNS} WHERE q.id = $1");
    sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(question_not_found)
}

/// Counts a view, then returns the question with its answers, the best
/// answer first and the rest by votes.
pub async fn view_question(
    pool: &PgPool,
    id: i64,
) -> Result<(QuestionRow, Vec<AnswerRow>), AppError> {
    let bumped = sqlx::query("UPDATE questions SET views = views + 1 WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if bumped.rows_affected() == 0 {
        return Err(question_not_found());
    }

    let question = find_question(pool, id).await?;
    let answers = sqlx::query_as(
        r#"
        SELECT a.*, u.username AS author_name
        FROM answers a LEFT JOIN users u ON u.id = a.author_id
        WHERE a.question_id = $1
        ORDER BY a.is_best_answer DESC, a.votes DESC, a.created_at ASC
        "#,
    )
    .bind(id)
    .fetch_all(pool)
    .await?;
    Ok((question, answers))
}

pub async fn create_question(
    pool: &PgPool,
    author_id: i64,
    question: &NewQuestion,
) -> Result<QuestionRow, AppError> {
    let created: QuestionRow = sqlx::query_as(
        r#"
        WITH q AS (
            INSERT INTO questions (author_id, title, content, category, tags)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
        )
        SELECT q.*, u.username AS author_name FROM q LEFT JOIN users u ON u.id = q.author_id
        "#,
    )
    .bind(author_id)
    .bind(&question.title)
    .bind(&question.content)
    .bind(&question.category)
    .bind(&question.tags)
    .fetch_one(pool)
    .await?;

    info!("User {author_id} asked question {}", created.id);
    Ok(created)
}

/// Inserts the answer and bumps the question's `answers_count` together.
pub async fn create_answer(
    pool: &PgPool,
    question_id: i64,
    author_id: i64,
    content: &str,
) -> Result<AnswerRow, AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query_scalar::<_, i64>("SELECT id FROM questions WHERE id = $1 FOR UPDATE")
        .bind(question_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(question_not_found)?;

    let answer: AnswerRow = sqlx::query_as(
        r#"
        WITH a AS (
            INSERT INTO answers (question_id, author_id, content)
            VALUES ($1, $2, $3)
            RETURNING *
        )
        SELECT a.*, u.username AS author_name FROM a LEFT JOIN users u ON u.id = a.author_id
        "#,
    )
    .bind(question_id)
    .bind(author_id)
    .bind(content)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE questions SET answers_count = answers_count + 1, updated_at = NOW() WHERE id = $1",
    )
    .bind(question_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    info!("User {author_id} answered question {question_id}");
    Ok(answer)
}

/// Applies one vote and returns the new counter value.
pub async fn vote(
    pool: &PgPool,
    target: VoteTarget,
    id: i64,
    direction: VoteDirection,
) -> Result<i64, AppError> {
    // Table names come from a closed enum.
    let sql = format!(
        "UPDATE {} SET votes = votes + $1 WHERE id = $2 RETURNING votes",
        target.table()
    );
    sqlx::query_scalar(&sql)
        .bind(direction.delta())
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} not found", target.label())))
}

/// Marks `answer_id` as the best answer of `question_id`, clearing the flag
/// on any answer previously marked.
pub async fn mark_best_answer(
    pool: &PgPool,
    caller: i64,
    question_id: i64,
    answer_id: i64,
) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let author: Option<i64> =
        sqlx::query_scalar("SELECT author_id FROM questions WHERE id = $1 FOR UPDATE")
            .bind(question_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(question_not_found)?;
    let answer_question: Option<i64> =
        sqlx::query_scalar("SELECT question_id FROM answers WHERE id = $1")
            .bind(answer_id)
            .fetch_optional(&mut *tx)
            .await?;
    check_best_answer(question_id, author, caller, answer_question)?;

    sqlx::query(
        r#"
        UPDATE answers
        SET is_best_answer = (id = $2), updated_at = NOW()
        WHERE question_id = $1 AND (is_best_answer OR id = $2)
        "#,
    )
    .bind(question_id)
    .bind(answer_id)
    .execute(&mut *tx)
    .await?;
    sqlx::query(
        r#"
        UPDATE questions
        SET best_answer_id = $2, is_answered = TRUE, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(question_id)
    .bind(answer_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    info!("Question {question_id}: best answer is now {answer_id}");
    Ok(())
}

/// Category names with their question counts, sorted by name.
pub async fn category_counts(pool: &PgPool) -> Result<Vec<(String, i64)>, AppError> {
    let rows = sqlx::query_as(
        "SELECT category, COUNT(*) FROM questions GROUP BY category ORDER BY category",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Most used tags, most frequent first.
pub async fn popular_tags(pool: &PgPool, limit: i64) -> Result<Vec<(String, i64)>, AppError> {
    let rows = sqlx::query_as(
        r#"
        SELECT t.tag, COUNT(*) AS uses
        FROM questions q, UNNEST(q.tags) AS t(tag)
        GROUP BY t.tag
        ORDER BY uses DESC, t.tag ASC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn questions_by(pool: &PgPool, author_id: i64) -> Result<Vec<QuestionRow>, AppError> {
    let sql = format!(
        "SELECT {QUESTION_COLUMNS} WHERE q.author_id = $1 ORDER BY q.created_at DESC, q.id DESC"
    );
    let rows = sqlx::query_as(&sql).bind(author_id).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn answers_by(pool: &PgPool, author_id: i64) -> Result<Vec<AuthoredAnswerRow>, AppError> {
    let rows = sqlx::query_as(
        r#"
        SELECT a.*, u.username AS author_name, q.title AS question_title
        FROM answers a
        JOIN questions q ON q.id = a.question_id
        LEFT JOIN users u ON u.id = a.author_id
        WHERE a.author_id = $1
        ORDER BY a.created_at DESC, a.id DESC
        "#,
    )
    .bind(author_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn totals(pool: &PgPool) -> Result<CommunityTotals, AppError> {
    let totals = sqlx::query_as(
        r#"
        SELECT
            (SELECT COUNT(*) FROM questions) AS total_questions,
            (SELECT COUNT(*) FROM answers) AS total_answers,
            (SELECT COUNT(*) FROM questions WHERE is_answered) AS answered_questions
        "#,
    )
    .fetch_one(pool)
    .await?;
    Ok(totals)
}

/// Authors ranked by questions plus answers posted.
pub async fn top_contributors(pool: &PgPool, limit: i64) -> Result<Vec<ContributorRow>, AppError> {
    let rows = sqlx::query_as(
        r#"
        SELECT c.author_id AS user_id, u.username, COUNT(*) AS contributions
        FROM (
            SELECT author_id FROM questions
            UNION ALL
            SELECT author_id FROM answers
        ) c
        JOIN users u ON u.id = c.author_id
        GROUP BY c.author_id, u.username
        ORDER BY contributions DESC, c.author_id ASC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
