//! Static index advisor for SQL statements.
//!
//! Parses a statement with sqlparser, consults a [`oracle::SchemaOracle`]
//! for schema and execution-plan facts, and emits [`Recommendation`]s:
//! composite indexes assembled by the three-star rule, join-key indexes for
//! driven tables, functional or virtual-column indexes for function-call
//! predicates, reversed-string indexes for end-anchored LIKE patterns, and
//! single-column indexes serving MIN/MAX aggregates.
//!
//! ```
//! use sql_index_advisor::advisor::Optimizer;
//! use sql_index_advisor::oracle::mock::MockOracle;
//! use sqlparser::dialect::GenericDialect;
//! use sqlparser::parser::Parser;
//!
//! let oracle = MockOracle::default()
//!     .with_table("CREATE TABLE orders (id INT PRIMARY KEY, customer VARCHAR(64), total INT)")
//!     .with_plan(&[("orders", "ALL")])
//!     .with_selectivity("orders", "customer", 0.9);
//!
//! let sql = "SELECT customer FROM orders WHERE customer = 'acme'";
//! let statement = Parser::parse_sql(&GenericDialect {}, sql).unwrap().remove(0);
//!
//! let recommendations = Optimizer::new(&oracle).optimize(&statement);
//! assert_eq!(recommendations.len(), 1);
//! assert_eq!(recommendations[0].table, "orders");
//! assert_eq!(recommendations[0].columns, vec!["customer"]);
//! ```

pub mod advisor;
pub mod config;
pub mod error;
pub mod oracle;
pub mod schema;

pub use advisor::{Optimizer, Recommendation};
pub use config::OptimizerConfig;
pub use error::{AdvisorError, AdvisorResult};
