use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

const RESPONSE_COLUMNS: &str =
    "id, user_uuid, answers, location, risk_score, result, uv_index, weekly_plan, created_at";

/// One questionnaire submission with the weekly plan snapshot taken at the time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuestionnaireResponse {
    pub id: Uuid,
    pub user_uuid: Option<Uuid>,
    pub answers: Value,
    pub location: String,
    pub risk_score: i32,
    pub result: String,
    pub uv_index: f64,
    pub weekly_plan: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewResponse {
    pub user_uuid: Option<Uuid>,
    pub answers: Value,
    pub location: String,
    pub risk_score: i32,
    pub result: String,
    pub uv_index: f64,
    pub weekly_plan: Value,
}

fn insert_sql() -> String {
    format!(
        r#"
        INSERT INTO questionnaire_responses
            (id, user_uuid, answers, location, risk_score, result, uv_index, weekly_plan)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {RESPONSE_COLUMNS}
        "#
    )
}

fn get_sql() -> String {
    format!("SELECT {RESPONSE_COLUMNS} FROM questionnaire_responses WHERE id = $1")
}

fn list_for_user_sql() -> String {
    format!(
        r#"
        SELECT {RESPONSE_COLUMNS}
        FROM questionnaire_responses
        WHERE user_uuid = $1
        ORDER BY created_at DESC
        LIMIT $2
        "#
    )
}

pub async fn insert_response(pool: &PgPool, new: &NewResponse) -> sqlx::Result<QuestionnaireResponse> {
    let sql = insert_sql();
    sqlx::query_as::<_, QuestionnaireResponse>(&sql)
        .bind(Uuid::new_v4())
        .bind(new.user_uuid)
        .bind(&new.answers)
        .bind(&new.location)
        .bind(new.risk_score)
        .bind(&new.result)
        .bind(new.uv_index)
        .bind(&new.weekly_plan)
        .fetch_one(pool)
        .await
}

pub async fn get_response(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<QuestionnaireResponse>> {
    let sql = get_sql();
    sqlx::query_as::<_, QuestionnaireResponse>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Newest first.
pub async fn list_responses_for_user(
    pool: &PgPool,
    user_uuid: Uuid,
    limit: i64,
) -> sqlx::Result<Vec<QuestionnaireResponse>> {
    let sql = list_for_user_sql();
    sqlx::query_as::<_, QuestionnaireResponse>(&sql)
        .bind(user_uuid)
        .bind(limit)
        .fetch_all(pool)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compact(sql: &str) -> String {
        sql.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_list_is_newest_first_and_limited() {
        let sql = compact(&list_for_user_sql());
        assert!(sql.contains("WHERE user_uuid = $1 ORDER BY created_at DESC LIMIT $2"));
    }

    #[test]
    fn test_statements_return_full_rows() {
        for sql in [insert_sql(), get_sql(), list_for_user_sql()] {
            assert!(compact(&sql).contains(RESPONSE_COLUMNS));
        }
        assert!(compact(&insert_sql()).contains("VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"));
    }

    #[test]
    fn test_row_serializes_snapshot_fields() {
        let row = QuestionnaireResponse {
            id: Uuid::nil(),
            user_uuid: None,
            answers: serde_json::json!([0, null, null, null, null, null, 1]),
            location: "Melbourne".into(),
            risk_score: 0,
            result: "Adequate".into(),
            uv_index: 5.0,
            weekly_plan: serde_json::json!([]),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["result"], "Adequate");
        assert!(json["user_uuid"].is_null());
        assert_eq!(json["answers"][6], 1);
    }
}
