use crate::error::DbError;
use core_types::{Row, SqlValue};

/// What `run_query` hands back after a successful statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fetch {
    /// Every row of the result set.
    All,
    /// At most the first row of the result set.
    One,
    /// Only the row count.
    RowCount,
}

/// A statement plus everything `run_query` needs to know about running it.
///
/// Defaults: rows are returned and the transaction is committed.
///
/// ```
/// use database::QueryRequest;
///
/// let request = QueryRequest::new("SELECT * FROM t WHERE id = %s").bind(5);
/// assert_eq!(request.parameters().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    sql: String,
    params: Vec<SqlValue>,
    fetch: Fetch,
    commit: bool,
}

impl QueryRequest {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
            fetch: Fetch::All,
            commit: true,
        }
    }

    /// Appends one positional parameter.
    pub fn bind(mut self, value: impl Into<SqlValue>) -> Self {
        self.params.push(value.into());
        self
    }

    /// Appends positional parameters in order.
    pub fn params<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        self.params.extend(values.into_iter().map(Into::into));
        self
    }

    /// `true` fetches every row, `false` returns the affected-row count.
    pub fn return_results(mut self, return_results: bool) -> Self {
        self.fetch = if return_results { Fetch::All } else { Fetch::RowCount };
        self
    }

    pub fn fetch(mut self, fetch: Fetch) -> Self {
        self.fetch = fetch;
        self
    }

    /// Commit explicitly after the statement. When the service opens its own
    /// connection, this flag is also that connection's autocommit mode.
    pub fn commit(mut self, commit: bool) -> Self {
        self.commit = commit;
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn parameters(&self) -> &[SqlValue] {
        &self.params
    }

    pub fn fetch_mode(&self) -> Fetch {
        self.fetch
    }

    pub fn commits(&self) -> bool {
        self.commit
    }
}

/// The successful outcome of `run_query`.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Rows(Vec<Row>),
    Affected(u64),
}

impl QueryResult {
    pub fn rows(&self) -> Option<&[Row]> {
        match self {
            QueryResult::Rows(rows) => Some(rows),
            QueryResult::Affected(_) => None,
        }
    }

    pub fn into_rows(self) -> Option<Vec<Row>> {
        match self {
            QueryResult::Rows(rows) => Some(rows),
            QueryResult::Affected(_) => None,
        }
    }

    pub fn affected(&self) -> Option<u64> {
        match self {
            QueryResult::Affected(count) => Some(*count),
            QueryResult::Rows(_) => None,
        }
    }
}

/// SQL text rewritten for the backend, with its placeholder count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedSql {
    pub text: String,
    pub placeholders: usize,
}

/// Rewrites DB-API `%s` placeholders to `?` and `%%` to `%`, and counts the
/// placeholders. Quoted literals, identifiers and comments are copied untouched.
pub fn prepare_sql(sql: &str) -> PreparedSql {
    let mut text = String::with_capacity(sql.len());
    let mut placeholders = 0;
    let mut quote: Option<char> = None;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            text.push(c);
            if c == '\\' && q != '`' {
                if let Some(escaped) = chars.next() {
                    text.push(escaped);
                }
            } else if c == q {
                // A doubled quote is an escaped quote, not the end of the literal.
                if chars.peek() == Some(&q) {
                    text.push(q);
                    chars.next();
                } else {
                    quote = None;
                }
            }
            continue;
        }

        match c {
            '\'' | '"' | '`' => {
                quote = Some(c);
                text.push(c);
            }
            // MySQL only treats `--` as a comment when whitespace follows it.
            '-' if chars.peek() == Some(&'-') && {
                let mut ahead = chars.clone();
                ahead.next();
                ahead.peek().is_none_or(|next| next.is_whitespace() || next.is_control())
            } =>
            {
                text.push(c);
                copy_line_comment(&mut chars, &mut text);
            }
            '#' => {
                text.push(c);
                copy_line_comment(&mut chars, &mut text);
            }
            '/' if chars.peek() == Some(&'*') => {
                text.push(c);
                text.push('*');
                chars.next();
                let mut previous = None;
                for inner in chars.by_ref() {
                    text.push(inner);
                    if previous == Some('*') && inner == '/' {
                        break;
                    }
                    previous = Some(inner);
                }
            }
            '?' => {
                placeholders += 1;
                text.push('?');
            }
            '%' => match chars.peek() {
                Some('s') => {
                    chars.next();
                    placeholders += 1;
                    text.push('?');
                }
                Some('%') => {
                    chars.next();
                    text.push('%');
                }
                _ => text.push('%'),
            },
            _ => text.push(c),
        }
    }

    PreparedSql { text, placeholders }
}

fn copy_line_comment(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, text: &mut String) {
    for c in chars.by_ref() {
        text.push(c);
        if c == '\n' {
            break;
        }
    }
}

// MySQL's limit for database, table and column names.
const MAX_IDENTIFIER_LEN: usize = 64;

/// Quotes a database, table or column name with backticks.
pub fn quote_identifier(name: &str) -> Result<String, DbError> {
    if name.is_empty()
        || name.chars().count() > MAX_IDENTIFIER_LEN
        || name.contains('`')
        || name.contains('\0')
    {
        return Err(DbError::InvalidIdentifier(name.to_string()));
    }
    Ok(format!("`{}`", name))
}

/// Builds the single-record lookup statement used by `get_data_object`.
pub fn select_by_key(
    database_name: &str,
    collection_name: &str,
    key_field: &str,
) -> Result<String, DbError> {
    Ok(format!(
        "SELECT * FROM {}.{} WHERE {} = ?",
        quote_identifier(database_name)?,
        quote_identifier(collection_name)?,
        quote_identifier(key_field)?
    ))
}
