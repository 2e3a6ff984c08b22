use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, ExprTrait, Func, LikeExpr, Order};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

pub use crate::types::TaskStatus;
use crate::{entities::task, models::ids};

pub const DEFAULT_PAGE_LIMIT: u64 = 10;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Task not found")]
    TaskNotFound,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    #[ts(type = "Date")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "Date")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateTask {
    pub title: String,
    pub description: String,
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: Option<TaskStatus>,
}

#[derive(Debug, Default, Deserialize, TS)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: Option<TaskStatus>,
}

/// Accepts `"pending"`/`"done"` and quietly drops anything else, so an
/// unknown status in a payload falls back to the default instead of
/// rejecting the whole request.
fn lenient_status<'de, D>(deserializer: D) -> Result<Option<TaskStatus>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSortField {
    Title,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSort {
    pub field: TaskSortField,
    pub direction: SortDirection,
}

impl Default for TaskSort {
    fn default() -> Self {
        Self {
            field: TaskSortField::CreatedAt,
            direction: SortDirection::Desc,
        }
    }
}

impl TaskSort {
    /// Parses a `<field>_<direction>` parameter such as `createdAt_desc`.
    /// Anything unrecognized falls back to the default sort, matching how
    /// the listing endpoint tolerates missing parameters.
    pub fn from_param(raw: Option<&str>) -> Self {
        raw.and_then(Self::parse).unwrap_or_default()
    }

    fn parse(raw: &str) -> Option<Self> {
        let (field, direction) = raw.trim().rsplit_once('_')?;
        let field = match field {
            "title" => TaskSortField::Title,
            "createdAt" => TaskSortField::CreatedAt,
            _ => return None,
        };
        let direction = match direction {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            _ => return None,
        };
        Some(Self { field, direction })
    }
}

#[derive(Debug, Clone)]
pub struct TaskListFilter {
    pub search: Option<String>,
    pub status: Option<TaskStatus>,
    pub sort: TaskSort,
    pub page: u64,
    pub limit: u64,
}

impl Default for TaskListFilter {
    fn default() -> Self {
        Self {
            search: None,
            status: None,
            sort: TaskSort::default(),
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct TaskListPage {
    pub tasks: Vec<Task>,
    pub current_page: u64,
    pub total_pages: u64,
    pub total_count: u64,
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

impl Task {
    fn from_model_with_owner(model: task::Model, owner: Uuid) -> Self {
        Self {
            id: model.uuid,
            user_id: owner,
            title: model.title,
            description: model.description,
            status: model.status,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    async fn from_model<C: ConnectionTrait>(db: &C, model: task::Model) -> Result<Self, DbErr> {
        let owner = ids::user_uuid_by_id(db, model.user_id)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;
        Ok(Self::from_model_with_owner(model, owner))
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
            .one(db)
            .await?;

        match record {
            Some(model) => Ok(Some(Self::from_model(db, model).await?)),
            None => Ok(None),
        }
    }

    /// Filtered, sorted, paginated listing scoped to `owner`.
    ///
    /// The search term matches title OR description, case-insensitively,
    /// with LIKE wildcards escaped. Ties in the requested sort order break
    /// on the row id (insertion order) so pages are deterministic.
    pub async fn list<C: ConnectionTrait>(
        db: &C,
        owner: Uuid,
        filter: &TaskListFilter,
    ) -> Result<TaskListPage, TaskError> {
        let owner_row_id = ids::user_id_by_uuid(db, owner)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;

        // `Ord::max` spelled out: `ExprTrait` also provides a blanket `max`
        // on anything `Into<Expr>`, which makes plain `.max(1)` ambiguous.
        let page = Ord::max(filter.page, 1);
        let limit = Ord::max(filter.limit, 1);

        let mut query = task::Entity::find().filter(task::Column::UserId.eq(owner_row_id));

        if let Some(term) = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
        {
            let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
            query = query.filter(
                Condition::any()
                    .add(
                        Func::lower(Expr::col((task::Entity, task::Column::Title)))
                            .like(LikeExpr::new(pattern.clone()).escape('\\')),
                    )
                    .add(
                        Func::lower(Expr::col((task::Entity, task::Column::Description)))
                            .like(LikeExpr::new(pattern).escape('\\')),
                    ),
            );
        }

        if let Some(status) = filter.status {
            query = query.filter(task::Column::Status.eq(status));
        }

        let total_count = query.clone().count(db).await?;
        let total_pages = total_count.div_ceil(limit);

        let sort_column = match filter.sort.field {
            TaskSortField::Title => task::Column::Title,
            TaskSortField::CreatedAt => task::Column::CreatedAt,
        };
        let sort_order = match filter.sort.direction {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        };

        let models = query
            .order_by(sort_column, sort_order)
            .order_by(task::Column::Id, Order::Asc)
            .offset(page.saturating_sub(1).saturating_mul(limit))
            .limit(limit)
            .all(db)
            .await?;

        let tasks = models
            .into_iter()
            .map(|model| Self::from_model_with_owner(model, owner))
            .collect();

        Ok(TaskListPage {
            tasks,
            current_page: page,
            total_pages,
            total_count,
        })
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateTask,
        owner: Uuid,
        task_id: Uuid,
    ) -> Result<Self, TaskError> {
        let owner_row_id = ids::user_id_by_uuid(db, owner)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;

        let now = Utc::now();
        let active = task::ActiveModel {
            uuid: Set(task_id),
            user_id: Set(owner_row_id),
            title: Set(data.title.clone()),
            description: Set(data.description.clone()),
            status: Set(data.status.unwrap_or_default()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active.insert(db).await?;
        Ok(Self::from_model_with_owner(model, owner))
    }

    /// Overwrites title/description/status in place. The caller decides
    /// which incoming fields apply; this always writes all three.
    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        title: String,
        description: String,
        status: TaskStatus,
    ) -> Result<Self, TaskError> {
        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(TaskError::TaskNotFound)?;

        let mut active: task::ActiveModel = record.into();
        active.title = Set(title);
        active.description = Set(description);
        active.status = Set(status);
        active.updated_at = Set(Utc::now());

        let updated = active.update(db).await?;
        Ok(Self::from_model(db, updated).await?)
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let result = task::Entity::delete_many()
            .filter(task::Column::Uuid.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}
