//! SQL quoting utilities
//!
//! Ledger statements and the `CREATE DATABASE` script are built as plain SQL
//! text, so every dynamic value goes through one of these helpers.

/// Quote a MySQL identifier with backticks.
///
/// Embedded backticks are escaped by doubling them.
///
/// # Examples
/// ```
/// use dbup_core::sql_utils::quote_mysql_ident;
/// assert_eq!(quote_mysql_ident("auth"), "`auth`");
/// assert_eq!(quote_mysql_ident("we`ird"), "`we``ird`");
/// ```
pub fn quote_mysql_ident(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

/// Escape a SQL string literal value by doubling single quotes.
///
/// This is for use inside single-quoted SQL string literals, not identifiers.
pub fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}

/// Render `value` as a complete single-quoted SQL string literal.
///
/// # Examples
/// ```
/// use dbup_core::sql_utils::string_literal;
/// assert_eq!(string_literal("it's"), "'it''s'");
/// ```
pub fn string_literal(value: &str) -> String {
    format!("'{}'", escape_sql_string(value))
}
