pub const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

/// Splits a script on `;`, ignoring semicolons inside quoted identifiers or
/// literals and dropping `--` comment lines.
pub fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_single_quote = false;
    let mut in_double_quote = false;

    for line in sql.lines() {
        if !in_single_quote && !in_double_quote && line.trim_start().starts_with("--") {
            continue;
        }

        for ch in line.chars() {
            match ch {
                '\'' if !in_double_quote => in_single_quote = !in_single_quote,
                '"' if !in_single_quote => in_double_quote = !in_double_quote,
                ';' if !in_single_quote && !in_double_quote => {
                    push_statement(&mut statements, &current);
                    current.clear();
                    continue;
                }
                _ => {}
            }
            current.push(ch);
        }
        current.push('\n');
    }

    push_statement(&mut statements, &current);
    statements
}

fn push_statement(statements: &mut Vec<String>, raw: &str) {
    let stmt = raw.trim();
    if !stmt.is_empty() {
        statements.push(stmt.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_unquoted_semicolons() {
        let sql = "-- header\nCREATE TABLE \"a;b\" (x TEXT DEFAULT ';');\n\nCREATE INDEX i ON t (x);";
        let statements = split_sql_statements(sql);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE TABLE \"a;b\""));
        assert!(statements[0].ends_with("DEFAULT ';')"));
        assert_eq!(statements[1], "CREATE INDEX i ON t (x)");
    }

    #[test]
    fn bundled_schema_has_three_tables() {
        let tables = split_sql_statements(SCHEMA_SQL)
            .into_iter()
            .filter(|stmt| stmt.starts_with("CREATE TABLE"))
            .count();
        assert_eq!(tables, 3);
    }
}
