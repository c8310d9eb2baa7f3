use sea_query::{
    Alias, ColumnDef, Expr, MysqlQueryBuilder, PostgresQueryBuilder, Query, QueryStatementWriter,
    SchemaStatementBuilder, SqliteQueryBuilder, Table,
};

/// Column holding the applied version.
pub const VERSION_COLUMN: &str = "version";

/// Database backend for SQL generation.
///
/// Only SQLite has a bundled store; the Postgres and MySQL dialects are for
/// callers implementing [`stepwise_core::VersionStore`] over their own
/// connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackend {
    Postgres,
    MySql,
    Sqlite,
}

/// Statements for the single-row version table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionTable {
    name: String,
}

impl VersionTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn create(&self, backend: DatabaseBackend) -> String {
        let stmt = Table::create()
            .table(Alias::new(&self.name))
            .if_not_exists()
            .col(ColumnDef::new(Alias::new(VERSION_COLUMN)).integer().not_null())
            .to_owned();
        match backend {
            DatabaseBackend::Postgres => stmt.to_string(PostgresQueryBuilder),
            DatabaseBackend::MySql => stmt.to_string(MysqlQueryBuilder),
            DatabaseBackend::Sqlite => stmt.to_string(SqliteQueryBuilder),
        }
    }

    pub fn select(&self, backend: DatabaseBackend) -> String {
        let stmt = Query::select()
            .column(Alias::new(VERSION_COLUMN))
            .from(Alias::new(&self.name))
            .limit(1)
            .to_owned();
        build_query(&stmt, backend)
    }

    pub fn insert(&self, version: u32, backend: DatabaseBackend) -> String {
        let stmt = Query::insert()
            .into_table(Alias::new(&self.name))
            .columns([Alias::new(VERSION_COLUMN)])
            .values_panic([Expr::val(version).into()])
            .to_owned();
        build_query(&stmt, backend)
    }

    pub fn update(&self, version: u32, backend: DatabaseBackend) -> String {
        let stmt = Query::update()
            .table(Alias::new(&self.name))
            .value(Alias::new(VERSION_COLUMN), Expr::val(version))
            .to_owned();
        build_query(&stmt, backend)
    }
}

fn build_query<T: QueryStatementWriter>(stmt: &T, backend: DatabaseBackend) -> String {
    match backend {
        DatabaseBackend::Postgres => stmt.to_string(PostgresQueryBuilder),
        DatabaseBackend::MySql => stmt.to_string(MysqlQueryBuilder),
        DatabaseBackend::Sqlite => stmt.to_string(SqliteQueryBuilder),
    }
}
