//! SurrealDB implementation of [`InstituteRepository`].

use chrono::{DateTime, Utc};
use classtrack_core::error::ClasstrackResult;
use classtrack_core::models::institute::{
    CreateInstitute, Institute, SubscriptionStatus, UpdateInstitute,
};
use classtrack_core::repository::InstituteRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct InstituteRow {
    name: String,
    code: String,
    address: String,
    contact_number: String,
    email: String,
    owner_name: String,
    subscription_status: String,
    subscription_expiry: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct InstituteRowWithId {
    record_id: String,
    name: String,
    code: String,
    address: String,
    contact_number: String,
    email: String,
    owner_name: String,
    subscription_status: String,
    subscription_expiry: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> Result<SubscriptionStatus, DbError> {
    match s {
        "Trial" => Ok(SubscriptionStatus::Trial),
        "Active" => Ok(SubscriptionStatus::Active),
        "Inactive" => Ok(SubscriptionStatus::Inactive),
        other => Err(DbError::Decode(format!(
            "unknown subscription status: {other}"
        ))),
    }
}

fn status_to_string(s: SubscriptionStatus) -> &'static str {
    match s {
        SubscriptionStatus::Trial => "Trial",
        SubscriptionStatus::Active => "Active",
        SubscriptionStatus::Inactive => "Inactive",
    }
}

impl InstituteRow {
    fn into_institute(self, id: Uuid) -> Result<Institute, DbError> {
        Ok(Institute {
            id,
            name: self.name,
            code: self.code,
            address: self.address,
            contact_number: self.contact_number,
            email: self.email,
            owner_name: self.owner_name,
            subscription_status: parse_status(&self.subscription_status)?,
            subscription_expiry: self.subscription_expiry,
            created_at: self.created_at,
        })
    }
}

impl InstituteRowWithId {
    fn try_into_institute(self) -> Result<Institute, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        Ok(Institute {
            id,
            name: self.name,
            code: self.code,
            address: self.address,
            contact_number: self.contact_number,
            email: self.email,
            owner_name: self.owner_name,
            subscription_status: parse_status(&self.subscription_status)?,
            subscription_expiry: self.subscription_expiry,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the Institute repository.
#[derive(Clone)]
pub struct SurrealInstituteRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealInstituteRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> InstituteRepository for SurrealInstituteRepository<C> {
    async fn create(&self, input: CreateInstitute) -> ClasstrackResult<Institute> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('institute', $id) SET \
                 name = $name, code = $code, address = $address, \
                 contact_number = $contact_number, email = $email, \
                 owner_name = $owner_name, \
                 subscription_status = $subscription_status, \
                 subscription_expiry = $subscription_expiry",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("code", input.code))
            .bind(("address", input.address))
            .bind(("contact_number", input.contact_number))
            .bind(("email", input.email))
            .bind(("owner_name", input.owner_name))
            .bind((
                "subscription_status",
                status_to_string(input.subscription_status).to_string(),
            ))
            .bind(("subscription_expiry", input.subscription_expiry))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<InstituteRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "institute".into(),
            id: id_str,
        })?;

        Ok(row.into_institute(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> ClasstrackResult<Institute> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('institute', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<InstituteRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "institute".into(),
            id: id_str,
        })?;

        Ok(row.into_institute(id)?)
    }

    async fn get_by_code(&self, code: &str) -> ClasstrackResult<Institute> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM institute WHERE code = $code",
            )
            .bind(("code", code.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<InstituteRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "institute".into(),
            id: format!("code={code}"),
        })?;

        Ok(row.try_into_institute()?)
    }

    async fn update(&self, id: Uuid, input: UpdateInstitute) -> ClasstrackResult<Institute> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.address.is_some() {
            sets.push("address = $address");
        }
        if input.contact_number.is_some() {
            sets.push("contact_number = $contact_number");
        }
        if input.subscription_status.is_some() {
            sets.push("subscription_status = $subscription_status");
        }
        if input.subscription_expiry.is_some() {
            sets.push("subscription_expiry = $subscription_expiry");
        }

        if sets.is_empty() {
            return self.get_by_id(id).await;
        }

        let query = format!(
            "UPDATE type::record('institute', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(address) = input.address {
            builder = builder.bind(("address", address));
        }
        if let Some(contact_number) = input.contact_number {
            builder = builder.bind(("contact_number", contact_number));
        }
        if let Some(status) = input.subscription_status {
            builder = builder.bind(("subscription_status", status_to_string(status).to_string()));
        }
        if let Some(expiry) = input.subscription_expiry {
            builder = builder.bind(("subscription_expiry", expiry));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<InstituteRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "institute".into(),
            id: id_str,
        })?;

        Ok(row.into_institute(id)?)
    }
}
