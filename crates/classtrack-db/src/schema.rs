//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation. Every uniqueness guarantee the
//! registrar relies on is a `DEFINE INDEX ... UNIQUE` here — the
//! indexes, not the application checks, are the serialization points.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Institutes (global scope — the tenant table)
-- =======================================================================
DEFINE TABLE institute SCHEMAFULL;
DEFINE FIELD name ON TABLE institute TYPE string;
DEFINE FIELD code ON TABLE institute TYPE string;
DEFINE FIELD address ON TABLE institute TYPE string DEFAULT '';
DEFINE FIELD contact_number ON TABLE institute TYPE string;
DEFINE FIELD email ON TABLE institute TYPE string;
DEFINE FIELD owner_name ON TABLE institute TYPE string;
DEFINE FIELD subscription_status ON TABLE institute TYPE string \
    ASSERT $value IN ['Trial', 'Active', 'Inactive'];
DEFINE FIELD subscription_expiry ON TABLE institute TYPE datetime;
DEFINE FIELD created_at ON TABLE institute TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_institute_code ON TABLE institute \
    COLUMNS code UNIQUE;

-- =======================================================================
-- Users (global scope — one email across all institutes)
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD institute_id ON TABLE user TYPE string;
DEFINE FIELD username ON TABLE user TYPE string;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD password_hash ON TABLE user TYPE string;
DEFINE FIELD full_name ON TABLE user TYPE string;
DEFINE FIELD role ON TABLE user TYPE string \
    ASSERT $value IN ['Owner', 'PlatformAdmin'];
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;

-- =======================================================================
-- Students (tenant scope)
-- =======================================================================
DEFINE TABLE student SCHEMAFULL;
DEFINE FIELD institute_id ON TABLE student TYPE string;
DEFINE FIELD student_code ON TABLE student TYPE string;
DEFINE FIELD name ON TABLE student TYPE string;
DEFINE FIELD class_name ON TABLE student TYPE string;
DEFINE FIELD board ON TABLE student TYPE string \
    ASSERT $value IN ['Cbse', 'Icse', 'StateBoard'];
DEFINE FIELD admission_date ON TABLE student TYPE datetime;
DEFINE FIELD parent_name ON TABLE student TYPE string;
DEFINE FIELD contact_number ON TABLE student TYPE string;
DEFINE FIELD email ON TABLE student TYPE option<string>;
DEFINE FIELD monthly_fee ON TABLE student TYPE int DEFAULT 0;
DEFINE FIELD status ON TABLE student TYPE string \
    ASSERT $value IN ['Active', 'Inactive'];
DEFINE FIELD created_at ON TABLE student TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_student_institute_code ON TABLE student \
    COLUMNS institute_id, student_code UNIQUE;

-- =======================================================================
-- Fee payments (tenant scope)
--
-- paid_key realizes the partial-unique contract: Paid rows store
-- '{student_id}/{month_year}', all other rows store their own record
-- id. The unique index therefore constrains exactly the Paid rows.
-- =======================================================================
DEFINE TABLE fee_payment SCHEMAFULL;
DEFINE FIELD institute_id ON TABLE fee_payment TYPE string;
DEFINE FIELD student_id ON TABLE fee_payment TYPE string;
DEFINE FIELD month_year ON TABLE fee_payment TYPE string;
DEFINE FIELD amount ON TABLE fee_payment TYPE int;
DEFINE FIELD payment_date ON TABLE fee_payment TYPE option<datetime>;
DEFINE FIELD mode ON TABLE fee_payment TYPE string \
    ASSERT $value IN ['Cash', 'Online', 'Cheque', 'Upi'];
DEFINE FIELD status ON TABLE fee_payment TYPE string \
    ASSERT $value IN ['Paid', 'Pending', 'Overdue'];
DEFINE FIELD receipt_number ON TABLE fee_payment TYPE option<string>;
DEFINE FIELD paid_key ON TABLE fee_payment TYPE string;
DEFINE FIELD created_at ON TABLE fee_payment TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_fee_paid_key ON TABLE fee_payment \
    COLUMNS institute_id, paid_key UNIQUE;

-- =======================================================================
-- Receipt counters (tenant scope, one record per institute)
-- =======================================================================
DEFINE TABLE receipt_counter SCHEMAFULL;
DEFINE FIELD value ON TABLE receipt_counter TYPE int DEFAULT 0;

-- =======================================================================
-- Attendance (tenant scope, one row per student per day)
-- =======================================================================
DEFINE TABLE attendance SCHEMAFULL;
DEFINE FIELD institute_id ON TABLE attendance TYPE string;
DEFINE FIELD student_id ON TABLE attendance TYPE string;
DEFINE FIELD date ON TABLE attendance TYPE string;
DEFINE FIELD status ON TABLE attendance TYPE string \
    ASSERT $value IN ['Present', 'Absent'];
DEFINE FIELD marked_by ON TABLE attendance TYPE option<string>;
DEFINE FIELD sms_status ON TABLE attendance TYPE string \
    ASSERT $value IN ['Sent', 'Failed', 'NotSent'];
DEFINE FIELD created_at ON TABLE attendance TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_attendance_student_date ON TABLE attendance \
    COLUMNS institute_id, student_id, date UNIQUE;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
