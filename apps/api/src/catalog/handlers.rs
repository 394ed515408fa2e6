use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::{fk_violation, unique_violation, AppError};
use crate::models::stage::{InterviewerCapability, StageDefinitionRow};
use crate::state::AppState;

/// GET /api/stages
pub async fn handle_list_stages(
    State(state): State<AppState>,
) -> Result<Json<Vec<StageDefinitionRow>>, AppError> {
    let stages: Vec<StageDefinitionRow> =
        sqlx::query_as("SELECT * FROM stage_definitions ORDER BY stage_order ASC")
            .fetch_all(&state.db)
            .await?;
    Ok(Json(stages))
}

/// GET /api/stages/:id
pub async fn handle_get_stage(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StageDefinitionRow>, AppError> {
    let stage: Option<StageDefinitionRow> =
        sqlx::query_as("SELECT * FROM stage_definitions WHERE id = $1")
            .bind(id)
            .fetch_optional(&state.db)
            .await?;
    let stage = stage.ok_or_else(|| AppError::NotFound(format!("Stage {id} not found")))?;
    Ok(Json(stage))
}

#[derive(Debug, Deserialize)]
pub struct CreateStageRequest {
    pub name: String,
    pub stage_order: i32,
    pub required_capability: InterviewerCapability,
    pub description: Option<String>,
}

/// POST /api/stages
pub async fn handle_create_stage(
    State(state): State<AppState>,
    Json(req): Json<CreateStageRequest>,
) -> Result<(StatusCode, Json<StageDefinitionRow>), AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("Stage name must not be empty".to_string()));
    }

    let order_taken: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM stage_definitions WHERE stage_order = $1)")
            .bind(req.stage_order)
            .fetch_one(&state.db)
            .await?;
    if order_taken {
        return Err(AppError::Validation(
            "A stage with this order already exists".to_string(),
        ));
    }

    let name_taken: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM stage_definitions WHERE name = $1)")
            .bind(&req.name)
            .fetch_one(&state.db)
            .await?;
    if name_taken {
        return Err(AppError::Validation(
            "A stage with this name already exists".to_string(),
        ));
    }

    let stage: StageDefinitionRow = sqlx::query_as(
        r#"
        INSERT INTO stage_definitions (name, stage_order, required_capability, description)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(req.name.trim())
    .bind(req.stage_order)
    .bind(req.required_capability)
    .bind(&req.description)
    .fetch_one(&state.db)
    .await
    .map_err(|e| unique_violation(e, "A stage with this name or order already exists"))?;

    Ok((StatusCode::CREATED, Json(stage)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStageRequest {
    pub name: Option<String>,
    pub stage_order: Option<i32>,
    pub required_capability: Option<InterviewerCapability>,
    pub description: Option<String>,
}

/// PATCH /api/stages/:id
pub async fn handle_update_stage(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStageRequest>,
) -> Result<Json<StageDefinitionRow>, AppError> {
    let existing: Option<StageDefinitionRow> =
        sqlx::query_as("SELECT * FROM stage_definitions WHERE id = $1")
            .bind(id)
            .fetch_optional(&state.db)
            .await?;
    let existing = existing.ok_or_else(|| AppError::NotFound(format!("Stage {id} not found")))?;

    if let Some(order) = req.stage_order {
        if order != existing.stage_order {
            let taken: bool = sqlx::query_scalar(
                "SELECT EXISTS (SELECT 1 FROM stage_definitions WHERE stage_order = $1 AND id <> $2)",
            )
            .bind(order)
            .bind(id)
            .fetch_one(&state.db)
            .await?;
            if taken {
                return Err(AppError::Validation(
                    "A stage with this order already exists".to_string(),
                ));
            }
        }
    }

    if let Some(name) = &req.name {
        if name != &existing.name {
            let taken: bool = sqlx::query_scalar(
                "SELECT EXISTS (SELECT 1 FROM stage_definitions WHERE name = $1 AND id <> $2)",
            )
            .bind(name)
            .bind(id)
            .fetch_one(&state.db)
            .await?;
            if taken {
                return Err(AppError::Validation(
                    "A stage with this name already exists".to_string(),
                ));
            }
        }
    }

    let updated: StageDefinitionRow = sqlx::query_as(
        r#"
        UPDATE stage_definitions SET
            name = COALESCE($2, name),
            stage_order = COALESCE($3, stage_order),
            required_capability = COALESCE($4, required_capability),
            description = COALESCE($5, description)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&req.name)
    .bind(req.stage_order)
    .bind(req.required_capability)
    .bind(&req.description)
    .fetch_one(&state.db)
    .await
    .map_err(|e| unique_violation(e, "A stage with this name or order already exists"))?;

    Ok(Json(updated))
}

/// DELETE /api/stages/:id
pub async fn handle_delete_stage(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = sqlx::query("DELETE FROM stage_definitions WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await
        .map_err(|e| fk_violation(e, "Stage is referenced by recorded interviews"))?;

    if deleted.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Stage {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize, FromRow)]
pub struct StageStats {
    pub stage_id: Uuid,
    pub name: String,
    pub total: i64,
    pub passed: i64,
    pub failed: i64,
    pub pending: i64,
}

/// GET /api/stages/stats
pub async fn handle_stage_stats(
    State(state): State<AppState>,
) -> Result<Json<Vec<StageStats>>, AppError> {
    let stats: Vec<StageStats> = sqlx::query_as(
        r#"
        SELECT s.id AS stage_id, s.name,
               COUNT(o.id) AS total,
               COUNT(o.id) FILTER (WHERE o.result = 'pass') AS passed,
               COUNT(o.id) FILTER (WHERE o.result = 'fail') AS failed,
               COUNT(o.id) FILTER (WHERE o.result = 'pending') AS pending
        FROM stage_definitions s
        LEFT JOIN stage_outcomes o ON o.stage_id = s.id
        GROUP BY s.id
        ORDER BY s.stage_order ASC
        "#,
    )
    .fetch_all(&state.db)
    .await?;
    Ok(Json(stats))
}
