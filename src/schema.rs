/// Table definitions recovered from CREATE TABLE statements
/// A live oracle wraps SHOW CREATE TABLE output; tests build these from fixture SQL
use sqlparser::ast::{ColumnOption, DataType, Statement, TableConstraint};
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;

use crate::error::{AdvisorError, AdvisorResult};

/// Parsed table definition: columns, primary key and secondary indexes
#[derive(Clone, Debug)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    /// Primary key columns in key order, empty when the table has none
    pub primary_key: Vec<String>,
    pub indexes: Vec<IndexDef>,
}

/// Column definition from CREATE TABLE
#[derive(Clone, Debug)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: DataType,
}

/// Secondary index definition
#[derive(Clone, Debug)]
pub struct IndexDef {
    pub name: Option<String>,
    /// Key columns in index order
    pub columns: Vec<String>,
    pub unique: bool,
}

impl TableDef {
    /// Parse a CREATE TABLE statement into a table definition
    pub fn from_sql(sql: &str) -> AdvisorResult<Self> {
        let statements = Parser::parse_sql(&MySqlDialect {}, sql)
            .map_err(|e| AdvisorError::parse_with_input(e.to_string(), sql))?;
        let statement = statements
            .first()
            .ok_or_else(|| AdvisorError::parse_with_input("empty statement", sql))?;
        Self::from_statement(statement)
    }

    /// Extract a table definition from a parsed CREATE TABLE AST
    pub fn from_statement(statement: &Statement) -> AdvisorResult<Self> {
        let Statement::CreateTable {
            name,
            columns,
            constraints,
            ..
        } = statement
        else {
            return Err(AdvisorError::unsupported("not a CREATE TABLE statement"));
        };

        let table_name = name
            .0
            .iter()
            .map(|ident| ident.value.to_lowercase())
            .collect::<Vec<_>>()
            .join(".");

        let mut primary_key = vec![];
        let mut indexes = vec![];
        let mut column_infos = vec![];

        for col in columns {
            // Inline PRIMARY KEY / UNIQUE column options
            for opt in &col.options {
                match &opt.option {
                    ColumnOption::Unique { is_primary: true } => {
                        primary_key.push(col.name.value.clone());
                    }
                    ColumnOption::Unique { is_primary: false } => {
                        indexes.push(IndexDef {
                            name: None,
                            columns: vec![col.name.value.clone()],
                            unique: true,
                        });
                    }
                    _ => {}
                }
            }
            column_infos.push(ColumnInfo {
                name: col.name.value.clone(),
                data_type: col.data_type.clone(),
            });
        }

        for constraint in constraints {
            match constraint {
                TableConstraint::Unique {
                    name,
                    columns,
                    is_primary,
                } => {
                    let cols: Vec<String> = columns.iter().map(|c| c.value.clone()).collect();
                    if *is_primary {
                        primary_key = cols;
                    } else {
                        indexes.push(IndexDef {
                            name: name.as_ref().map(|n| n.value.clone()),
                            columns: cols,
                            unique: true,
                        });
                    }
                }
                TableConstraint::Index { name, columns, .. } => {
                    indexes.push(IndexDef {
                        name: name.as_ref().map(|n| n.value.clone()),
                        columns: columns.iter().map(|c| c.value.clone()).collect(),
                        unique: false,
                    });
                }
                _ => {}
            }
        }

        Ok(Self {
            name: table_name,
            columns: column_infos,
            primary_key,
            indexes,
        })
    }

    /// Find a column by name, case-insensitively
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// BLOB/TEXT columns are unsuitable as index keys
    pub fn is_blob_column(&self, name: &str) -> bool {
        let Some(col) = self.column(name) else {
            return false;
        };
        match &col.data_type {
            DataType::Blob(_) | DataType::Text | DataType::Bytea => true,
            DataType::Custom(obj, _) => {
                // TINYTEXT/MEDIUMBLOB and friends come through as custom types
                let type_name = obj
                    .0
                    .iter()
                    .map(|ident| ident.value.to_lowercase())
                    .collect::<Vec<_>>()
                    .join(".");
                type_name.contains("text") || type_name.contains("blob")
            }
            _ => false,
        }
    }

    /// The primary key column when the key has exactly one member
    pub fn single_column_primary_key(&self) -> Option<&str> {
        match self.primary_key.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }

    /// All key column lists that can satisfy a query: the primary key plus secondary indexes
    fn key_column_lists(&self) -> impl Iterator<Item = &[String]> {
        let pk = if self.primary_key.is_empty() {
            None
        } else {
            Some(self.primary_key.as_slice())
        };
        pk.into_iter()
            .chain(self.indexes.iter().map(|i| i.columns.as_slice()))
    }

    /// Whether an existing index already satisfies `columns` as an exact or
    /// covering-prefix match, in order
    pub fn index_covers(&self, columns: &[String]) -> bool {
        if columns.is_empty() {
            return false;
        }
        self.key_column_lists().any(|key| {
            key.len() >= columns.len()
                && key
                    .iter()
                    .zip(columns)
                    .all(|(a, b)| a.eq_ignore_ascii_case(b))
        })
    }

    /// Whether the leading columns of an existing index cover `columns` as a
    /// set, in any order (for join keys, where key order is immaterial)
    pub fn index_covers_set(&self, columns: &[String]) -> bool {
        if columns.is_empty() {
            return false;
        }
        self.key_column_lists().any(|key| {
            key.len() >= columns.len()
                && columns.iter().all(|c| {
                    key[..columns.len()]
                        .iter()
                        .any(|k| k.eq_ignore_ascii_case(c))
                })
        })
    }

    /// Whether `column` is the sole or leading key of any existing index
    pub fn has_leading_index_on(&self, column: &str) -> bool {
        self.key_column_lists()
            .any(|key| key.first().is_some_and(|k| k.eq_ignore_ascii_case(column)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = "CREATE TABLE exist_tb_1 (
        id BIGINT PRIMARY KEY,
        v1 VARCHAR(255),
        v2 VARCHAR(255),
        v3 TEXT,
        KEY idx_v1 (v1),
        KEY idx_v1_v2 (v1, v2)
    )";

    #[test]
    fn test_parse_create_table() {
        let def = TableDef::from_sql(FIXTURE).unwrap();
        assert_eq!(def.name, "exist_tb_1");
        assert_eq!(def.columns.len(), 4);
        assert_eq!(def.primary_key, vec!["id".to_string()]);
        assert_eq!(def.indexes.len(), 2);
        assert_eq!(def.indexes[1].columns, vec!["v1", "v2"]);
    }

    #[test]
    fn test_blob_detection() {
        let def = TableDef::from_sql(FIXTURE).unwrap();
        assert!(def.is_blob_column("v3"));
        assert!(!def.is_blob_column("v1"));
        assert!(!def.is_blob_column("missing"));
    }

    #[test]
    fn test_single_column_primary_key() {
        let def = TableDef::from_sql(FIXTURE).unwrap();
        assert_eq!(def.single_column_primary_key(), Some("id"));

        let composite =
            TableDef::from_sql("CREATE TABLE t (a INT, b INT, PRIMARY KEY (a, b))").unwrap();
        assert_eq!(composite.single_column_primary_key(), None);
    }

    #[test]
    fn test_index_covers_prefix() {
        let def = TableDef::from_sql(FIXTURE).unwrap();
        assert!(def.index_covers(&["v1".to_string()]));
        assert!(def.index_covers(&["V1".to_string(), "v2".to_string()]));
        assert!(def.index_covers(&["id".to_string()]));
        assert!(!def.index_covers(&["v2".to_string()]));
        assert!(!def.index_covers(&[]));
    }

    #[test]
    fn test_index_covers_set_ignores_order() {
        let def = TableDef::from_sql(FIXTURE).unwrap();
        assert!(def.index_covers_set(&["v2".to_string(), "v1".to_string()]));
        assert!(!def.index_covers_set(&["v2".to_string()]));
    }

    #[test]
    fn test_leading_key() {
        let def = TableDef::from_sql(FIXTURE).unwrap();
        assert!(def.has_leading_index_on("v1"));
        assert!(def.has_leading_index_on("id"));
        assert!(!def.has_leading_index_on("v2"));
    }
}
