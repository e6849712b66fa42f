// Copyright (C) 2024-2025 Fred Clausen and the ratatui project contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! # xtask - Project Automation
//!
//! Runs the lint, build and test steps CI expects, plus a schema check for
//! the `SQLite` migrations.
//!
//! ### Schema Verification
//!
//! - `cargo test` — Runs all tests against in-memory `SQLite`
//! - `cargo xtask verify-migrations` — Applies the embedded migrations to a
//!   fresh database, checks the resulting schema against the tables and
//!   constraints the persistence layer relies on, then reverts every
//!   migration and checks that nothing is left behind

#![deny(
    clippy::pedantic,
    //clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

use std::{fmt::Debug, io, process::Output, vec};

use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use color_eyre::{Result, eyre::Context, eyre::eyre};
use diesel::sql_types::{Integer, Text};
use diesel::{Connection, QueryableByName, RunQueryDsl, SqliteConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use duct::cmd;
use std::collections::{BTreeMap, BTreeSet};
use tracing::level_filters::LevelFilter;
use tracing_log::AsTrace;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("../crates/persistence/migrations");

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .without_time()
        .init();

    match args.run() {
        Ok(()) => (),
        Err(err) => {
            tracing::error!("{err}");
            std::process::exit(1);
        }
    }
    Ok(())
}

#[derive(Debug, Parser)]
#[command(bin_name = "cargo xtask", styles = clap_cargo::style::CLAP_STYLING)]
struct Args {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,
}

impl Args {
    fn run(self) -> Result<()> {
        self.command.run()
    }

    fn log_level(&self) -> LevelFilter {
        self.verbosity.log_level_filter().as_trace()
    }
}

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// Run CI checks (lint, build, test, verify-migrations)
    CI,

    /// Build the project
    #[command(visible_alias = "b")]
    Build,

    /// Run cargo check
    #[command(visible_alias = "c")]
    Check,

    /// Lint formatting and clippy
    #[command(visible_alias = "l")]
    Lint,

    /// Run clippy on the project
    #[command(visible_alias = "cl")]
    LintClippy,

    /// Check for formatting issues in the project
    #[command(visible_alias = "lf")]
    LintFormatting,

    /// Fix formatting issues in the project
    #[command(visible_alias = "fmt")]
    FixFormatting,

    /// Run tests
    #[command(visible_alias = "t")]
    Test,

    /// Apply and revert the migrations against an in-memory database
    VerifyMigrations,
}

impl Command {
    fn run(self) -> Result<()> {
        match self {
            Self::CI => ci(),
            Self::Build => build(),
            Self::Check => check(),
            Self::Lint => lint(),
            Self::LintClippy => lint_clippy(),
            Self::LintFormatting => lint_format(),
            Self::FixFormatting => fix_format(),
            Self::Test => test(),
            Self::VerifyMigrations => verify_migrations(),
        }
    }
}

/// Run CI checks (lint, build, test, verify-migrations)
fn ci() -> Result<()> {
    lint()?;
    build()?;
    test()?;
    verify_migrations()?;
    Ok(())
}

/// Build the project
fn build() -> Result<()> {
    run_cargo(vec!["build", "--all-targets", "--all-features"])
}

/// Run cargo check
fn check() -> Result<()> {
    run_cargo(vec!["check", "--all-targets", "--all-features"])
}

/// Lint formatting and clippy
fn lint() -> Result<()> {
    lint_clippy()?;
    lint_format()?;
    Ok(())
}

/// Run clippy on the project
fn lint_clippy() -> Result<()> {
    run_cargo(vec![
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ])
}

/// Lint formatting issues in the project
fn lint_format() -> Result<()> {
    run_cargo_nightly(vec!["fmt", "--all", "--check"])
}

/// Fix formatting issues in the project
fn fix_format() -> Result<()> {
    run_cargo_nightly(vec!["fmt", "--all"])
}

/// Run every workspace test, including the migration-backed persistence suites
fn test() -> Result<()> {
    run_cargo(vec!["test", "--all-targets", "--all-features"])
}

/// Run a cargo subcommand with the default toolchain
fn run_cargo(args: Vec<&str>) -> Result<()> {
    cmd("cargo", args).run_with_trace()?;
    Ok(())
}

/// Run a cargo subcommand with the nightly toolchain
fn run_cargo_nightly(args: Vec<&str>) -> Result<()> {
    cmd("cargo", args)
        // CARGO env var is set because we're running in a cargo subcommand
        .env_remove("CARGO")
        .env("RUSTUP_TOOLCHAIN", "nightly")
        .run_with_trace()?;
    Ok(())
}

/// Verify the embedded migrations produce the schema the persistence layer expects
///
/// ## What This Command Does
///
/// 1. Opens an in-memory `SQLite` database with foreign keys enabled
/// 2. Applies every embedded migration
/// 3. Introspects the resulting schema (tables, columns, types, constraints)
/// 4. Checks it against [`expected_schema`]
/// 5. Reverts every migration and checks that no application table remains
///
/// ## Usage
///
/// ```bash
/// cargo xtask verify-migrations
/// ```
///
/// ## Failures
///
/// The command fails if:
/// - A migration fails to apply or revert
/// - A required table, column, foreign key or index is missing or differs
/// - A table survives the down migrations
fn verify_migrations() -> Result<()> {
    tracing::info!("Starting migration verification");

    let mut conn = SqliteConnection::establish(":memory:")
        .wrap_err("Failed to create SQLite in-memory database")?;

    diesel::sql_query("PRAGMA foreign_keys = ON")
        .execute(&mut conn)
        .wrap_err("Failed to enable foreign keys on SQLite")?;

    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| eyre!("Failed to apply migrations: {e}"))?;
    tracing::info!("Migrations applied successfully");

    tracing::info!("Introspecting schema");
    let actual: Schema = introspect_sqlite_schema(&mut conn)?;

    tracing::info!("Comparing schema");
    compare_schema(&expected_schema(), &actual)?;

    tracing::info!("Reverting migrations");
    conn.revert_all_migrations(MIGRATIONS)
        .map_err(|e| eyre!("Failed to revert migrations: {e}"))?;

    let leftover: Schema = introspect_sqlite_schema(&mut conn)?;
    if !leftover.tables.is_empty() {
        let names: Vec<&str> = leftover.tables.keys().map(String::as_str).collect();
        return Err(eyre!(
            "Tables left behind after reverting migrations: {}",
            names.join(", ")
        ));
    }

    tracing::info!("✓ Migration verification passed");
    Ok(())
}

/// Normalized schema representation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Schema {
    tables: BTreeMap<String, Table>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Table {
    columns: BTreeMap<String, Column>,
    primary_keys: BTreeSet<String>,
    foreign_keys: BTreeSet<ForeignKey>,
    indexes: BTreeSet<Index>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Column {
    normalized_type: &'static str,
    nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ForeignKey {
    from_column: String,
    to_table: String,
    to_column: String,
}

/// An index over one or more columns. Inline `UNIQUE` column constraints
/// show up here too, as unique indexes. `partial` marks a `WHERE` clause.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Index {
    columns: Vec<String>,
    unique: bool,
    partial: bool,
}

impl Table {
    fn column(mut self, name: &str, normalized_type: &'static str, nullable: bool) -> Self {
        self.columns.insert(
            name.to_string(),
            Column {
                normalized_type,
                nullable,
            },
        );
        self
    }

    fn primary_key(mut self, name: &str) -> Self {
        self.primary_keys.insert(name.to_string());
        self
    }

    fn references(mut self, from_column: &str, to_table: &str, to_column: &str) -> Self {
        self.foreign_keys.insert(ForeignKey {
            from_column: from_column.to_string(),
            to_table: to_table.to_string(),
            to_column: to_column.to_string(),
        });
        self
    }

    fn index(mut self, columns: &[&str], unique: bool) -> Self {
        self.indexes.insert(Index {
            columns: columns.iter().map(ToString::to_string).collect(),
            unique,
            partial: false,
        });
        self
    }

    fn partial_index(mut self, columns: &[&str], unique: bool) -> Self {
        self.indexes.insert(Index {
            columns: columns.iter().map(ToString::to_string).collect(),
            unique,
            partial: true,
        });
        self
    }
}

/// The schema the persistence layer's queries and constraint mapping rely on.
fn expected_schema() -> Schema {
    let guides: Table = Table::default()
        .column("guide_id", "integer", false)
        .column("name", "text", false)
        .column("phone", "text", true)
        .column("is_active", "integer", false)
        .column("created_at", "text", false)
        .primary_key("guide_id");

    let bookings: Table = Table::default()
        .column("booking_id", "integer", false)
        .column("booking_reference", "text", false)
        .column("visitor_name", "text", false)
        .column("visitor_email", "text", false)
        .column("visitor_phone", "text", true)
        .column("visitor_nationality", "text", true)
        .column("visit_date", "text", false)
        .column("visit_time", "text", true)
        .column("tour_type", "text", false)
        .column("group_size", "text", false)
        .column("number_of_people", "integer", false)
        .column("status", "text", false)
        .column("payment_status", "text", false)
        .column("payment_method", "text", true)
        .column("total_amount", "integer", false)
        .column("assigned_guide_id", "integer", true)
        .column("check_in_time", "text", true)
        .column("check_out_time", "text", true)
        .column("admin_notes", "text", true)
        .column("created_at", "text", false)
        .column("updated_at", "text", false)
        .column("version", "integer", false)
        .primary_key("booking_id")
        .references("assigned_guide_id", "guides", "guide_id")
        .index(&["booking_reference"], true)
        .index(&["assigned_guide_id"], false)
        .index(&["visit_date"], false)
        .index(&["status"], false);

    let activity_records: Table = Table::default()
        .column("activity_id", "integer", false)
        .column("booking_id", "integer", false)
        .column("action", "text", false)
        .column("old_status", "text", false)
        .column("new_status", "text", true)
        .column("description", "text", false)
        .column("actor_json", "text", false)
        .column("created_at", "text", false)
        .primary_key("activity_id")
        .references("booking_id", "bookings", "booking_id")
        .index(&["booking_id", "created_at"], false);

    let payout_records: Table = Table::default()
        .column("payout_id", "integer", false)
        .column("guide_id", "integer", false)
        .column("amount", "integer", false)
        .column("tours_count", "integer", false)
        .column("period_start", "text", true)
        .column("period_end", "text", true)
        .column("status", "text", false)
        .column("payment_method", "text", true)
        .column("payment_reference", "text", true)
        .column("paid_at", "text", true)
        .column("notes", "text", true)
        .column("created_at", "text", false)
        .primary_key("payout_id")
        .references("guide_id", "guides", "guide_id")
        .index(&["guide_id"], false)
        .index(&["guide_id", "period_start", "period_end"], true)
        .partial_index(&["guide_id"], true);

    Schema {
        tables: BTreeMap::from([
            (String::from("guides"), guides),
            (String::from("bookings"), bookings),
            (String::from("activity_records"), activity_records),
            (String::from("payout_records"), payout_records),
        ]),
    }
}

/// Introspect `SQLite` schema
fn introspect_sqlite_schema(conn: &mut SqliteConnection) -> Result<Schema> {
    #[derive(QueryableByName)]
    struct TableName {
        #[diesel(sql_type = Text)]
        name: String,
    }

    #[derive(QueryableByName)]
    struct ColumnInfo {
        #[diesel(sql_type = Text)]
        name: String,
        #[diesel(sql_type = Text)]
        r#type: String,
        #[diesel(sql_type = Integer)]
        notnull: i32,
        #[diesel(sql_type = Integer)]
        pk: i32,
    }

    #[derive(QueryableByName)]
    struct ForeignKeyInfo {
        #[diesel(sql_type = Text)]
        table: String,
        #[diesel(sql_type = Text)]
        from: String,
        #[diesel(sql_type = Text)]
        to: String,
    }

    #[derive(QueryableByName)]
    struct IndexInfo {
        #[diesel(sql_type = Text)]
        name: String,
        #[diesel(sql_type = Integer)]
        unique: i32,
        #[diesel(sql_type = Text)]
        origin: String,
        #[diesel(sql_type = Integer)]
        partial: i32,
    }

    #[derive(QueryableByName)]
    struct IndexColumnInfo {
        #[diesel(sql_type = Text)]
        name: String,
    }

    let mut schema = Schema::default();

    let tables: Vec<TableName> = diesel::sql_query(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '__diesel_schema_migrations' ORDER BY name"
    )
    .load(conn)
    .wrap_err("Failed to query SQLite tables")?;

    for table in tables {
        let mut table_info = Table::default();

        let columns: Vec<ColumnInfo> =
            diesel::sql_query(format!("PRAGMA table_info({})", table.name))
                .load(conn)
                .wrap_err(format!("Failed to get columns for table {}", table.name))?;

        for col in columns {
            // INTEGER PRIMARY KEY is implicitly NOT NULL
            let nullable: bool = col.notnull == 0 && col.pk == 0;
            table_info.columns.insert(
                col.name.clone(),
                Column {
                    normalized_type: normalize_sqlite_type(&col.r#type),
                    nullable,
                },
            );

            if col.pk > 0 {
                table_info.primary_keys.insert(col.name);
            }
        }

        let fks: Vec<ForeignKeyInfo> =
            diesel::sql_query(format!("PRAGMA foreign_key_list({})", table.name))
                .load(conn)
                .wrap_err(format!(
                    "Failed to get foreign keys for table {}",
                    table.name
                ))?;

        for fk in fks {
            table_info.foreign_keys.insert(ForeignKey {
                from_column: fk.from,
                to_table: fk.table,
                to_column: fk.to,
            });
        }

        let indexes: Vec<IndexInfo> =
            diesel::sql_query(format!("PRAGMA index_list({})", table.name))
                .load(conn)
                .wrap_err(format!("Failed to get indexes for table {}", table.name))?;

        for idx in indexes {
            // Primary key indexes are covered by `primary_keys`
            if idx.origin == "pk" {
                continue;
            }

            let index_columns: Vec<IndexColumnInfo> =
                diesel::sql_query(format!("PRAGMA index_info({})", idx.name))
                    .load(conn)
                    .wrap_err(format!("Failed to get index columns for {}", idx.name))?;

            table_info.indexes.insert(Index {
                columns: index_columns.into_iter().map(|c| c.name).collect(),
                unique: idx.unique != 0,
                partial: idx.partial != 0,
            });
        }

        schema.tables.insert(table.name, table_info);
    }

    Ok(schema)
}

/// Normalize `SQLite` type to common representation
fn normalize_sqlite_type(sqlite_type: &str) -> &'static str {
    let normalized = sqlite_type.to_uppercase();
    if normalized.contains("INT") {
        "integer"
    } else if normalized.contains("REAL")
        || normalized.contains("FLOA")
        || normalized.contains("DOUB")
    {
        "real"
    } else if normalized.contains("BLOB") {
        "blob"
    } else {
        "text"
    }
}

/// Compare the expected schema against the migrated one
///
/// Every difference is logged before failing, so one run reports them all.
fn compare_schema(expected: &Schema, actual: &Schema) -> Result<()> {
    let mut problems: Vec<String> = Vec::new();

    for name in actual.tables.keys() {
        if !expected.tables.contains_key(name) {
            problems.push(format!("Unexpected table '{name}'"));
        }
    }

    for (name, want) in &expected.tables {
        let Some(got) = actual.tables.get(name) else {
            problems.push(format!("Missing table '{name}'"));
            continue;
        };

        for (column, want_col) in &want.columns {
            match got.columns.get(column) {
                None => problems.push(format!("Table '{name}': missing column '{column}'")),
                Some(got_col) if got_col != want_col => problems.push(format!(
                    "Table '{name}', column '{column}': expected {want_col:?}, found {got_col:?}"
                )),
                Some(_) => {}
            }
        }
        for column in got.columns.keys() {
            if !want.columns.contains_key(column) {
                problems.push(format!("Table '{name}': unexpected column '{column}'"));
            }
        }

        if got.primary_keys != want.primary_keys {
            problems.push(format!(
                "Table '{name}': primary key {:?}, expected {:?}",
                got.primary_keys, want.primary_keys
            ));
        }
        for fk in want.foreign_keys.difference(&got.foreign_keys) {
            problems.push(format!("Table '{name}': missing foreign key {fk:?}"));
        }
        for fk in got.foreign_keys.difference(&want.foreign_keys) {
            problems.push(format!("Table '{name}': unexpected foreign key {fk:?}"));
        }
        for idx in want.indexes.difference(&got.indexes) {
            problems.push(format!("Table '{name}': missing index {idx:?}"));
        }
        for idx in got.indexes.difference(&want.indexes) {
            problems.push(format!("Table '{name}': unexpected index {idx:?}"));
        }
    }

    if problems.is_empty() {
        return Ok(());
    }

    for problem in &problems {
        tracing::error!("{problem}");
    }
    Err(eyre!("Schema verification failed with {} problem(s)", problems.len()))
}

/// An extension trait for `duct::Expression` that logs the command being run
/// before running it.
trait ExpressionExt {
    /// Run the command and log the command being run
    fn run_with_trace(&self) -> io::Result<Output>;
}

impl ExpressionExt for duct::Expression {
    fn run_with_trace(&self) -> io::Result<Output> {
        tracing::info!("running command: {:?}", self);
        self.run().inspect_err(|_| {
            // The command that was run may have scrolled off the screen, so repeat it here
            tracing::error!("failed to run command: {:?}", self);
        })
    }
}
