//! SurrealDB implementation of [`StudentRepository`].
//!
//! The `(institute_id, student_code)` unique index declared in the
//! schema is what makes allocation safe: `create` surfaces the index
//! rejection as `ConstraintViolation` and the allocator retries on it.

use chrono::{DateTime, Utc};
use classtrack_core::error::ClasstrackResult;
use classtrack_core::models::student::{
    Board, CreateStudent, Student, StudentFilter, StudentStatus, UpdateStudent,
};
use classtrack_core::repository::{PaginatedResult, Pagination, StudentRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct StudentRow {
    institute_id: String,
    student_code: String,
    name: String,
    class_name: String,
    board: String,
    admission_date: DateTime<Utc>,
    parent_name: String,
    contact_number: String,
    email: Option<String>,
    monthly_fee: i64,
    status: String,
    created_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct StudentRowWithId {
    record_id: String,
    institute_id: String,
    student_code: String,
    name: String,
    class_name: String,
    board: String,
    admission_date: DateTime<Utc>,
    parent_name: String,
    contact_number: String,
    email: Option<String>,
    monthly_fee: i64,
    status: String,
    created_at: DateTime<Utc>,
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn parse_board(s: &str) -> Result<Board, DbError> {
    match s {
        "Cbse" => Ok(Board::Cbse),
        "Icse" => Ok(Board::Icse),
        "StateBoard" => Ok(Board::StateBoard),
        other => Err(DbError::Decode(format!("unknown board: {other}"))),
    }
}

fn board_to_string(b: Board) -> &'static str {
    match b {
        Board::Cbse => "Cbse",
        Board::Icse => "Icse",
        Board::StateBoard => "StateBoard",
    }
}

fn parse_status(s: &str) -> Result<StudentStatus, DbError> {
    match s {
        "Active" => Ok(StudentStatus::Active),
        "Inactive" => Ok(StudentStatus::Inactive),
        other => Err(DbError::Decode(format!(
            "unknown student status: {other}"
        ))),
    }
}

fn status_to_string(s: StudentStatus) -> &'static str {
    match s {
        StudentStatus::Active => "Active",
        StudentStatus::Inactive => "Inactive",
    }
}

impl StudentRow {
    fn into_student(self, id: Uuid) -> Result<Student, DbError> {
        let institute_id = Uuid::parse_str(&self.institute_id)
            .map_err(|e| DbError::Decode(format!("invalid institute UUID: {e}")))?;
        Ok(Student {
            id,
            institute_id,
            student_code: self.student_code,
            name: self.name,
            class_name: self.class_name,
            board: parse_board(&self.board)?,
            admission_date: self.admission_date,
            parent_name: self.parent_name,
            contact_number: self.contact_number,
            email: self.email,
            monthly_fee: self.monthly_fee,
            status: parse_status(&self.status)?,
            created_at: self.created_at,
        })
    }
}

impl StudentRowWithId {
    fn try_into_student(self) -> Result<Student, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        let institute_id = Uuid::parse_str(&self.institute_id)
            .map_err(|e| DbError::Decode(format!("invalid institute UUID: {e}")))?;
        Ok(Student {
            id,
            institute_id,
            student_code: self.student_code,
            name: self.name,
            class_name: self.class_name,
            board: parse_board(&self.board)?,
            admission_date: self.admission_date,
            parent_name: self.parent_name,
            contact_number: self.contact_number,
            email: self.email,
            monthly_fee: self.monthly_fee,
            status: parse_status(&self.status)?,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the Student repository.
#[derive(Clone)]
pub struct SurrealStudentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealStudentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> StudentRepository for SurrealStudentRepository<C> {
    async fn create(&self, input: CreateStudent) -> ClasstrackResult<Student> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('student', $id) SET \
                 institute_id = $institute_id, \
                 student_code = $student_code, \
                 name = $name, class_name = $class_name, \
                 board = $board, admission_date = time::now(), \
                 parent_name = $parent_name, \
                 contact_number = $contact_number, \
                 email = $email, monthly_fee = $monthly_fee, \
                 status = 'Active'",
            )
            .bind(("id", id_str.clone()))
            .bind(("institute_id", input.institute_id.to_string()))
            .bind(("student_code", input.student_code))
            .bind(("name", input.name))
            .bind(("class_name", input.class_name))
            .bind(("board", board_to_string(input.board).to_string()))
            .bind(("parent_name", input.parent_name))
            .bind(("contact_number", input.contact_number))
            .bind(("email", input.email))
            .bind(("monthly_fee", input.monthly_fee))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<StudentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "student".into(),
            id: id_str,
        })?;

        Ok(row.into_student(id)?)
    }

    async fn get(&self, institute_id: Uuid, id: Uuid) -> ClasstrackResult<Student> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('student', $id) \
                 WHERE institute_id = $institute_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("institute_id", institute_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StudentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "student".into(),
            id: id_str,
        })?;

        Ok(row.into_student(id)?)
    }

    async fn update(
        &self,
        institute_id: Uuid,
        id: Uuid,
        input: UpdateStudent,
    ) -> ClasstrackResult<Student> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.class_name.is_some() {
            sets.push("class_name = $class_name");
        }
        if input.board.is_some() {
            sets.push("board = $board");
        }
        if input.parent_name.is_some() {
            sets.push("parent_name = $parent_name");
        }
        if input.contact_number.is_some() {
            sets.push("contact_number = $contact_number");
        }
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.monthly_fee.is_some() {
            sets.push("monthly_fee = $monthly_fee");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }

        if sets.is_empty() {
            return self.get(institute_id, id).await;
        }

        let query = format!(
            "UPDATE type::record('student', $id) SET {} \
             WHERE institute_id = $institute_id",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("institute_id", institute_id.to_string()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(class_name) = input.class_name {
            builder = builder.bind(("class_name", class_name));
        }
        if let Some(board) = input.board {
            builder = builder.bind(("board", board_to_string(board).to_string()));
        }
        if let Some(parent_name) = input.parent_name {
            builder = builder.bind(("parent_name", parent_name));
        }
        if let Some(contact_number) = input.contact_number {
            builder = builder.bind(("contact_number", contact_number));
        }
        if let Some(email) = input.email {
            builder = builder.bind(("email", email));
        }
        if let Some(monthly_fee) = input.monthly_fee {
            builder = builder.bind(("monthly_fee", monthly_fee));
        }
        if let Some(status) = input.status {
            builder = builder.bind(("status", status_to_string(status).to_string()));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<StudentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "student".into(),
            id: id_str,
        })?;

        Ok(row.into_student(id)?)
    }

    async fn list(
        &self,
        institute_id: Uuid,
        filter: StudentFilter,
        pagination: Pagination,
    ) -> ClasstrackResult<PaginatedResult<Student>> {
        let mut conditions = vec!["institute_id = $institute_id"];
        if filter.class_name.is_some() {
            conditions.push("class_name = $class_name");
        }
        if filter.board.is_some() {
            conditions.push("board = $board");
        }
        if filter.status.is_some() {
            conditions.push("status = $status");
        }
        if filter.search.is_some() {
            conditions.push(
                "(string::lowercase(name) CONTAINS $search \
                 OR string::lowercase(student_code) CONTAINS $search \
                 OR string::lowercase(parent_name) CONTAINS $search)",
            );
        }
        let where_clause = conditions.join(" AND ");

        let count_query = format!(
            "SELECT count() AS total FROM student WHERE {where_clause} GROUP ALL"
        );
        let list_query = format!(
            "SELECT meta::id(id) AS record_id, * FROM student \
             WHERE {where_clause} \
             ORDER BY created_at DESC \
             LIMIT $limit START $offset"
        );

        let mut count_builder = self
            .db
            .query(&count_query)
            .bind(("institute_id", institute_id.to_string()));
        if let Some(class_name) = filter.class_name.clone() {
            count_builder = count_builder.bind(("class_name", class_name));
        }
        if let Some(board) = filter.board {
            count_builder = count_builder.bind(("board", board_to_string(board).to_string()));
        }
        if let Some(status) = filter.status {
            count_builder = count_builder.bind(("status", status_to_string(status).to_string()));
        }
        if let Some(search) = filter.search.clone() {
            count_builder = count_builder.bind(("search", search.to_lowercase()));
        }

        let mut count_result = count_builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut builder = self
            .db
            .query(&list_query)
            .bind(("institute_id", institute_id.to_string()))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));
        if let Some(class_name) = filter.class_name {
            builder = builder.bind(("class_name", class_name));
        }
        if let Some(board) = filter.board {
            builder = builder.bind(("board", board_to_string(board).to_string()));
        }
        if let Some(status) = filter.status {
            builder = builder.bind(("status", status_to_string(status).to_string()));
        }
        if let Some(search) = filter.search {
            builder = builder.bind(("search", search.to_lowercase()));
        }

        let mut result = builder.await.map_err(DbError::from)?;

        let rows: Vec<StudentRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_student())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn student_codes(&self, institute_id: Uuid) -> ClasstrackResult<Vec<String>> {
        let mut result = self
            .db
            .query(
                "SELECT VALUE student_code FROM student \
                 WHERE institute_id = $institute_id",
            )
            .bind(("institute_id", institute_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let codes: Vec<String> = result.take(0).map_err(DbError::from)?;
        Ok(codes)
    }

    async fn count_active(&self, institute_id: Uuid) -> ClasstrackResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM student \
                 WHERE institute_id = $institute_id AND status = 'Active' \
                 GROUP ALL",
            )
            .bind(("institute_id", institute_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn count_active_by_board(
        &self,
        institute_id: Uuid,
        board: Board,
    ) -> ClasstrackResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM student \
                 WHERE institute_id = $institute_id \
                 AND status = 'Active' AND board = $board \
                 GROUP ALL",
            )
            .bind(("institute_id", institute_id.to_string()))
            .bind(("board", board_to_string(board).to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn list_active(&self, institute_id: Uuid) -> ClasstrackResult<Vec<Student>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM student \
                 WHERE institute_id = $institute_id AND status = 'Active' \
                 ORDER BY student_code ASC",
            )
            .bind(("institute_id", institute_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StudentRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_student())
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(items)
    }
}
