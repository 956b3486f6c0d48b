//! Recursive-descent parser over the token stream from [`super::lexer`].
//!
//! Grammar (SPEC_FULL.md §4.5):
//! ```text
//! stmt        := create_db | use_db | add_table | insert | remove | update
//! create_db   := "CREATE DATABASE " IDENT
//! use_db      := "USE " IDENT
//! add_table   := "ADD TABLE " IDENT " (" col_def ("," col_def)* ")"
//! col_def     := IDENT TYPE attr*
//! insert      := "INSERT INTO " IDENT " (" idlist ")" " VALUES (" vallist ")"
//! remove      := "REMOVE FROM " IDENT " WHERE " IDENT " = " VALUE
//! update      := "UPDATE " IDENT " SET " assign ("," assign)* " WHERE " IDENT " = " VALUE
//! ```

use super::lexer::{Token, tokenize};
use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub type_name: String,
    pub is_primary_key: bool,
    pub foreign_key: Option<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    CreateDatabase(String),
    Use(String),
    AddTable {
        name: String,
        columns: Vec<ColumnDef>,
    },
    Insert {
        table: String,
        columns: Vec<String>,
        values: Vec<String>,
    },
    Remove {
        table: String,
        where_col: String,
        where_val: String,
    },
    Update {
        table: String,
        assignments: Vec<(String, String)>,
        where_col: String,
        where_val: String,
    },
}

struct Cursor {
    tokens: Vec<Token>,
    pos: usize,
}

impl Cursor {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn expect_word(&mut self, expected: &str) -> EngineResult<()> {
        match self.next() {
            Some(Token::Word(w)) if w == expected => Ok(()),
            Some(other) => Err(EngineError::Parse(format!(
                "expected '{expected}', found '{other}'"
            ))),
            None => Err(EngineError::Parse(format!(
                "expected '{expected}', found end of statement"
            ))),
        }
    }

    fn expect_punct(&mut self, expected: Token) -> EngineResult<()> {
        match self.next() {
            Some(ref t) if *t == expected => Ok(()),
            Some(other) => Err(EngineError::Parse(format!(
                "expected '{expected}', found '{other}'"
            ))),
            None => Err(EngineError::Parse(format!(
                "expected '{expected}', found end of statement"
            ))),
        }
    }

    fn ident(&mut self) -> EngineResult<String> {
        match self.next() {
            Some(Token::Word(w)) => Ok(w),
            Some(other) => Err(EngineError::Parse(format!("expected identifier, found '{other}'"))),
            None => Err(EngineError::Parse("expected identifier, found end of statement".into())),
        }
    }
}

pub fn parse(statement: &str) -> EngineResult<Statement> {
    let tokens = tokenize(statement);
    if tokens.is_empty() {
        return Err(EngineError::Parse("empty statement".to_string()));
    }
    let mut cursor = Cursor { tokens, pos: 0 };
    let leading = match cursor.peek() {
        Some(Token::Word(w)) => w.clone(),
        _ => return Err(EngineError::Parse("statement must start with a keyword".to_string())),
    };
    match leading.as_str() {
        "CREATE" => parse_create_database(&mut cursor),
        "USE" => parse_use(&mut cursor),
        "ADD" => parse_add_table(&mut cursor),
        "INSERT" => parse_insert(&mut cursor),
        "REMOVE" => parse_remove(&mut cursor),
        "UPDATE" => parse_update(&mut cursor),
        other => Err(EngineError::Parse(format!("unknown statement keyword '{other}'"))),
    }
}

fn parse_create_database(c: &mut Cursor) -> EngineResult<Statement> {
    c.expect_word("CREATE")?;
    c.expect_word("DATABASE")?;
    Ok(Statement::CreateDatabase(c.ident()?))
}

fn parse_use(c: &mut Cursor) -> EngineResult<Statement> {
    c.expect_word("USE")?;
    Ok(Statement::Use(c.ident()?))
}

fn parse_add_table(c: &mut Cursor) -> EngineResult<Statement> {
    c.expect_word("ADD")?;
    c.expect_word("TABLE")?;
    let name = c.ident()?;
    c.expect_punct(Token::LParen)?;
    let mut columns = Vec::new();
    loop {
        columns.push(parse_col_def(c)?);
        match c.peek() {
            Some(Token::Comma) => {
                c.next();
            }
            Some(Token::RParen) => {
                c.next();
                break;
            }
            Some(other) => {
                return Err(EngineError::Parse(format!(
                    "expected ',' or ')' in column list, found '{other}'"
                )));
            }
            None => return Err(EngineError::Parse("unterminated column list".to_string())),
        }
    }
    Ok(Statement::AddTable { name, columns })
}

fn parse_col_def(c: &mut Cursor) -> EngineResult<ColumnDef> {
    let name = c.ident()?;
    let type_name = c.ident()?;
    let mut is_primary_key = false;
    let mut foreign_key = None;

    // Legacy shortcut (SPEC_FULL.md §4.5): a bare `PRIMARY_KEY` in the type
    // position means "INT, and mark this column primary key".
    let type_name = if type_name == "PRIMARY_KEY" {
        is_primary_key = true;
        "INT".to_string()
    } else {
        type_name
    };

    loop {
        match c.peek() {
            Some(Token::Word(w)) if w == "PRIMARY_KEY" => {
                c.next();
                is_primary_key = true;
            }
            Some(Token::Word(w)) if w == "REFERENCES" => {
                c.next();
                let ref_table = c.ident()?;
                c.expect_punct(Token::LParen)?;
                let ref_column = c.ident()?;
                c.expect_punct(Token::RParen)?;
                foreign_key = Some((ref_table, ref_column));
            }
            _ => break,
        }
    }

    Ok(ColumnDef {
        name,
        type_name,
        is_primary_key,
        foreign_key,
    })
}

fn parse_ident_list(c: &mut Cursor) -> EngineResult<Vec<String>> {
    c.expect_punct(Token::LParen)?;
    let mut items = Vec::new();
    loop {
        items.push(c.ident()?);
        match c.next() {
            Some(Token::Comma) => continue,
            Some(Token::RParen) => break,
            Some(other) => return Err(EngineError::Parse(format!("expected ',' or ')', found '{other}'"))),
            None => return Err(EngineError::Parse("unterminated list".to_string())),
        }
    }
    Ok(items)
}

fn parse_insert(c: &mut Cursor) -> EngineResult<Statement> {
    c.expect_word("INSERT")?;
    c.expect_word("INTO")?;
    let table = c.ident()?;
    let columns = parse_ident_list(c)?;
    c.expect_word("VALUES")?;
    let values = parse_ident_list(c)?;
    Ok(Statement::Insert {
        table,
        columns,
        values,
    })
}

fn parse_remove(c: &mut Cursor) -> EngineResult<Statement> {
    c.expect_word("REMOVE")?;
    c.expect_word("FROM")?;
    let table = c.ident()?;
    c.expect_word("WHERE")?;
    let where_col = c.ident()?;
    c.expect_punct(Token::Eq)?;
    let where_val = c.ident()?;
    Ok(Statement::Remove {
        table,
        where_col,
        where_val,
    })
}

fn parse_update(c: &mut Cursor) -> EngineResult<Statement> {
    c.expect_word("UPDATE")?;
    let table = c.ident()?;
    c.expect_word("SET")?;
    let mut assignments = Vec::new();
    loop {
        let col = c.ident()?;
        c.expect_punct(Token::Eq)?;
        let val = c.ident()?;
        assignments.push((col, val));
        match c.peek() {
            Some(Token::Comma) => {
                c.next();
            }
            Some(Token::Word(w)) if w == "WHERE" => break,
            Some(other) => {
                return Err(EngineError::Parse(format!(
                    "expected ',' or WHERE in SET clause, found '{other}'"
                )));
            }
            None => return Err(EngineError::Parse("unterminated SET clause".to_string())),
        }
    }
    c.expect_word("WHERE")?;
    let where_col = c.ident()?;
    c.expect_punct(Token::Eq)?;
    let where_val = c.ident()?;
    Ok(Statement::Update {
        table,
        assignments,
        where_col,
        where_val,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_create_database() {
        assert_eq!(
            parse("CREATE DATABASE D").unwrap(),
            Statement::CreateDatabase("D".to_string())
        );
    }

    #[test]
    fn parses_use() {
        assert_eq!(parse("USE D").unwrap(), Statement::Use("D".to_string()));
    }

    #[test]
    fn parses_add_table_with_pk_and_fk() {
        let stmt = parse("ADD TABLE emp (eid INT PRIMARY_KEY, dref INT REFERENCES dept(did))").unwrap();
        match stmt {
            Statement::AddTable { name, columns } => {
                assert_eq!(name, "emp");
                assert_eq!(columns.len(), 2);
                assert!(columns[0].is_primary_key);
                assert_eq!(
                    columns[1].foreign_key,
                    Some(("dept".to_string(), "did".to_string()))
                );
            }
            other => panic!("wrong statement kind: {other:?}"),
        }
    }

    #[test]
    fn parses_legacy_primary_key_type_shortcut() {
        let stmt = parse("ADD TABLE t (id PRIMARY_KEY)").unwrap();
        match stmt {
            Statement::AddTable { columns, .. } => {
                assert_eq!(columns[0].type_name, "INT");
                assert!(columns[0].is_primary_key);
            }
            other => panic!("wrong statement kind: {other:?}"),
        }
    }

    #[test]
    fn parses_insert() {
        let stmt = parse("INSERT INTO t (id, name) VALUES (1, alice)").unwrap();
        assert_eq!(
            stmt,
            Statement::Insert {
                table: "t".to_string(),
                columns: vec!["id".to_string(), "name".to_string()],
                values: vec!["1".to_string(), "alice".to_string()],
            }
        );
    }

    #[test]
    fn parses_remove() {
        assert_eq!(
            parse("REMOVE FROM t WHERE id = 1").unwrap(),
            Statement::Remove {
                table: "t".to_string(),
                where_col: "id".to_string(),
                where_val: "1".to_string(),
            }
        );
    }

    #[test]
    fn parses_update_multi_assignment() {
        let stmt = parse("UPDATE t SET id = 3, name = alice2 WHERE id = 1").unwrap();
        assert_eq!(
            stmt,
            Statement::Update {
                table: "t".to_string(),
                assignments: vec![
                    ("id".to_string(), "3".to_string()),
                    ("name".to_string(), "alice2".to_string())
                ],
                where_col: "id".to_string(),
                where_val: "1".to_string(),
            }
        );
    }

    #[test]
    fn unknown_keyword_is_parse_error() {
        let err = parse("DROP TABLE t").unwrap_err();
        assert!(matches!(err, EngineError::Parse(_)));
    }

    #[test]
    fn malformed_insert_names_offending_token() {
        let err = parse("INSERT INTO t id, name) VALUES (1, alice)").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("("), "error should mention the missing paren: {msg}");
    }
}
