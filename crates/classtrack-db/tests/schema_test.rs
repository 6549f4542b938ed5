//! Integration tests for schema initialization using in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

#[tokio::test]
async fn schema_migration_applies_successfully() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    classtrack_db::run_migrations(&db).await.unwrap();

    // Verify that all tables exist by querying INFO FOR DB.
    let mut result = db.query("INFO FOR DB").await.unwrap();
    let info: Option<surrealdb_types::Value> = result.take(0).unwrap();
    let info = info.expect("INFO FOR DB should return a value");
    let info_str = format!("{:?}", info);

    assert!(info_str.contains("institute"), "missing institute table");
    assert!(info_str.contains("user"), "missing user table");
    assert!(info_str.contains("student"), "missing student table");
    assert!(
        info_str.contains("fee_payment"),
        "missing fee_payment table"
    );
    assert!(
        info_str.contains("receipt_counter"),
        "missing receipt_counter table"
    );
    assert!(info_str.contains("attendance"), "missing attendance table");

    // Verify migration was recorded.
    assert!(info_str.contains("_migration"), "missing _migration table");
}

#[tokio::test]
async fn migration_is_idempotent() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    // Run twice — should not fail.
    classtrack_db::run_migrations(&db).await.unwrap();
    classtrack_db::run_migrations(&db).await.unwrap();

    // Verify only one migration record exists.
    let mut result = db.query("SELECT * FROM _migration").await.unwrap();
    let records: Vec<surrealdb_types::Value> = result.take(0).unwrap();
    assert_eq!(records.len(), 1, "expected exactly one migration record");
}

#[tokio::test]
async fn can_create_record_after_migration() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    classtrack_db::run_migrations(&db).await.unwrap();

    db.query(
        "CREATE institute SET \
         name = 'ABC Tutorials', \
         code = 'ABC1', \
         contact_number = '9876543210', \
         email = 'owner@abc.example', \
         owner_name = 'Owner', \
         subscription_status = 'Trial', \
         subscription_expiry = time::now()",
    )
    .await
    .unwrap()
    .check()
    .unwrap();

    let mut result = db
        .query("SELECT * FROM institute WHERE code = 'ABC1'")
        .await
        .unwrap();
    let records: Vec<surrealdb_types::Value> = result.take(0).unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn schema_rejects_invalid_enum_values() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    classtrack_db::run_migrations(&db).await.unwrap();

    let result = db
        .query(
            "CREATE institute SET \
             name = 'ABC Tutorials', \
             code = 'ABC1', \
             contact_number = '9876543210', \
             email = 'owner@abc.example', \
             owner_name = 'Owner', \
             subscription_status = 'Cancelled', \
             subscription_expiry = time::now()",
        )
        .await
        .unwrap()
        .check();
    assert!(result.is_err(), "invalid subscription_status accepted");
}

#[tokio::test]
async fn unique_index_prevents_duplicate_institute_codes() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    classtrack_db::run_migrations(&db).await.unwrap();

    let create = "CREATE institute SET \
                  name = $name, \
                  code = 'ABC1', \
                  contact_number = '9876543210', \
                  email = 'owner@abc.example', \
                  owner_name = 'Owner', \
                  subscription_status = 'Trial', \
                  subscription_expiry = time::now()";

    db.query(create)
        .bind(("name", "First"))
        .await
        .unwrap()
        .check()
        .unwrap();

    let duplicate = db
        .query(create)
        .bind(("name", "Second"))
        .await
        .unwrap()
        .check();
    assert!(duplicate.is_err(), "duplicate institute code accepted");
}
