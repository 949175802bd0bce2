// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Reader for the first game of a PGN document.
//!
//! Only the mainline is kept: comments, NAGs, move numbers and nested
//! variations are skipped. SAN tokens are returned as text; resolving them
//! against a position is up to the caller (see [`crate::chess::san`]).

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PgnError {
    #[error("no game found in PGN input")]
    Empty,

    #[error("unterminated tag pair starting at line {0}")]
    UnterminatedTag(usize),

    #[error("malformed tag pair at line {0}")]
    MalformedTag(usize),

    #[error("unterminated comment starting at line {0}")]
    UnterminatedComment(usize),

    #[error("unbalanced variation parentheses at line {0}")]
    UnbalancedVariation(usize),
}

/// The parts of a PGN game the analyzer cares about.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PgnGame {
    pub headers: Vec<(String, String)>,
    pub moves: Vec<String>,
    pub result: Option<String>,
}

impl PgnGame {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// The starting FEN declared by the game's tags, if any.
    pub fn starting_fen(&self) -> Option<&str> {
        self.header("FEN")
    }
}

const RESULT_TOKENS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

struct Cursor<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    at_line_start: bool,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
            line: 1,
            at_line_start: true,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.at_line_start = true;
        } else {
            self.at_line_start = false;
        }
        Some(c)
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.bump() {
            if c == '\n' {
                break;
            }
        }
    }
}

/// Read the first game from `text`.
pub fn read_game(text: &str) -> Result<PgnGame, PgnError> {
    let mut cursor = Cursor::new(text);
    let mut game = PgnGame::default();
    let mut in_movetext = false;

    loop {
        let starts_line = cursor.at_line_start;
        let c = match cursor.peek() {
            Some(c) => c,
            None => break,
        };

        match c {
            _ if c.is_whitespace() => {
                cursor.bump();
            }
            '%' if starts_line => cursor.skip_line(),
            '[' if !in_movetext => {
                let (name, value) = read_tag(&mut cursor)?;
                game.headers.push((name, value));
            }
            '[' => {
                // A tag section after movetext belongs to the next game.
                break;
            }
            '{' => skip_comment(&mut cursor)?,
            ';' => cursor.skip_line(),
            '(' => {
                in_movetext = true;
                skip_variation(&mut cursor)?;
            }
            ')' => return Err(PgnError::UnbalancedVariation(cursor.line)),
            '$' => {
                cursor.bump();
                while cursor.peek().is_some_and(|d| d.is_ascii_digit()) {
                    cursor.bump();
                }
            }
            _ => {
                in_movetext = true;
                let token = read_symbol(&mut cursor);
                if token.is_empty() {
                    // Stray punctuation: skip it so the reader always makes progress.
                    cursor.bump();
                    continue;
                }
                if RESULT_TOKENS.contains(&token.as_str()) {
                    game.result = Some(token);
                    break;
                }
                if let Some(san) = strip_move_number(&token) {
                    game.moves.push(san.to_string());
                }
            }
        }
    }

    if game.headers.is_empty() && game.moves.is_empty() && game.result.is_none() {
        return Err(PgnError::Empty);
    }
    Ok(game)
}

fn read_tag(cursor: &mut Cursor<'_>) -> Result<(String, String), PgnError> {
    let start_line = cursor.line;
    cursor.bump(); // '['

    while cursor.peek().is_some_and(|c| c == ' ' || c == '\t') {
        cursor.bump();
    }
    let mut name = String::new();
    while let Some(c) = cursor.peek() {
        if c.is_ascii_alphanumeric() || c == '_' {
            name.push(c);
            cursor.bump();
        } else {
            break;
        }
    }
    if name.is_empty() {
        return Err(PgnError::MalformedTag(start_line));
    }

    while cursor.peek().is_some_and(|c| c == ' ' || c == '\t') {
        cursor.bump();
    }
    if cursor.bump() != Some('"') {
        return Err(PgnError::MalformedTag(start_line));
    }

    let mut value = String::new();
    loop {
        match cursor.bump() {
            Some('\\') => match cursor.bump() {
                Some(escaped) => value.push(escaped),
                None => return Err(PgnError::UnterminatedTag(start_line)),
            },
            Some('"') => break,
            Some('\n') | None => return Err(PgnError::UnterminatedTag(start_line)),
            Some(c) => value.push(c),
        }
    }

    loop {
        match cursor.bump() {
            Some(']') => return Ok((name, value)),
            Some(c) if c == ' ' || c == '\t' => continue,
            Some(_) => return Err(PgnError::MalformedTag(start_line)),
            None => return Err(PgnError::UnterminatedTag(start_line)),
        }
    }
}

fn skip_comment(cursor: &mut Cursor<'_>) -> Result<(), PgnError> {
    let start_line = cursor.line;
    cursor.bump(); // '{'
    loop {
        match cursor.bump() {
            Some('}') => return Ok(()),
            Some(_) => continue,
            None => return Err(PgnError::UnterminatedComment(start_line)),
        }
    }
}

fn skip_variation(cursor: &mut Cursor<'_>) -> Result<(), PgnError> {
    let start_line = cursor.line;
    let mut depth = 0usize;
    loop {
        match cursor.peek() {
            Some('(') => {
                depth += 1;
                cursor.bump();
            }
            Some(')') => {
                depth -= 1;
                cursor.bump();
                if depth == 0 {
                    return Ok(());
                }
            }
            Some('{') => skip_comment(cursor)?,
            Some(';') => cursor.skip_line(),
            Some(_) => {
                cursor.bump();
            }
            None => return Err(PgnError::UnbalancedVariation(start_line)),
        }
    }
}

fn read_symbol(cursor: &mut Cursor<'_>) -> String {
    let mut token = String::new();
    while let Some(c) = cursor.peek() {
        if c.is_whitespace() || matches!(c, '{' | '}' | '(' | ')' | '[' | ']' | ';' | '$') {
            break;
        }
        token.push(c);
        cursor.bump();
    }
    token
}

/// Strip a leading move number (`12.`, `12...`) from a token. Returns `None`
/// when nothing but the number is left.
fn strip_move_number(token: &str) -> Option<&str> {
    let digits = token.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return if token.chars().all(|c| c == '.') {
            None
        } else {
            Some(token)
        };
    }
    let rest = &token[digits..];
    if !rest.starts_with('.') {
        // Castling written with zeros, e.g. `0-0`, is a move, not a number.
        return Some(token);
    }
    let rest = rest.trim_start_matches('.');
    if rest.is_empty() {
        None
    } else {
        Some(rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_headers_and_mainline() {
        let pgn = r#"[Event "Casual \"blitz\""]
[White "Alice"]
[Black "Bob"]

1. e4 e5 2. Nf3 Nc6 3. Bb5 a6 1-0
"#;
        let game = read_game(pgn).unwrap();
        assert_eq!(game.header("Event"), Some("Casual \"blitz\""));
        assert_eq!(game.header("White"), Some("Alice"));
        assert_eq!(game.moves, vec!["e4", "e5", "Nf3", "Nc6", "Bb5", "a6"]);
        assert_eq!(game.result.as_deref(), Some("1-0"));
    }

    #[test]
    fn skips_comments_variations_and_nags() {
        let pgn = "1. e4 {best by test} e5 $1 (1... c5 2. Nf3 (2. c3) d6) 2. Nf3 ; rest of line\n Nc6?! 3...a6 *";
        let game = read_game(pgn).unwrap();
        assert_eq!(game.moves, vec!["e4", "e5", "Nf3", "Nc6?!", "a6"]);
        assert_eq!(game.result.as_deref(), Some("*"));
    }

    #[test]
    fn movetext_without_headers_or_result() {
        let game = read_game("1.d4 d5 2.c4").unwrap();
        assert!(game.headers.is_empty());
        assert_eq!(game.moves, vec!["d4", "d5", "c4"]);
        assert_eq!(game.result, None);
    }

    #[test]
    fn castling_with_zeros_is_not_a_move_number() {
        let game = read_game("1. e4 e5 2. Nf3 Nf6 3. Bc4 Bc5 4. 0-0 0-0").unwrap();
        assert_eq!(&game.moves[6..], &["0-0", "0-0"]);
    }

    #[test]
    fn only_the_first_game_is_read() {
        let pgn = "[Event \"one\"]\n\n1. e4 1-0\n\n[Event \"two\"]\n\n1. d4 0-1\n";
        let game = read_game(pgn).unwrap();
        assert_eq!(game.moves, vec!["e4"]);
    }

    #[test]
    fn fen_header_is_exposed() {
        let pgn = "[SetUp \"1\"]\n[FEN \"8/8/8/8/8/8/8/K6k w - - 0 1\"]\n\n1. Kb2 *";
        let game = read_game(pgn).unwrap();
        assert_eq!(game.starting_fen(), Some("8/8/8/8/8/8/8/K6k w - - 0 1"));
    }

    #[test]
    fn escape_lines_are_ignored() {
        let game = read_game("% exported by some tool\n1. e4 *").unwrap();
        assert_eq!(game.moves, vec!["e4"]);
    }

    #[test]
    fn structural_errors() {
        assert_eq!(read_game(""), Err(PgnError::Empty));
        assert_eq!(read_game("   \n "), Err(PgnError::Empty));
        assert!(matches!(
            read_game("[Event \"open"),
            Err(PgnError::UnterminatedTag(1))
        ));
        assert!(matches!(read_game("[ \"x\"]"), Err(PgnError::MalformedTag(1))));
        assert!(matches!(
            read_game("1. e4 {never closed"),
            Err(PgnError::UnterminatedComment(1))
        ));
        assert!(matches!(
            read_game("1. e4 (1. d4"),
            Err(PgnError::UnbalancedVariation(1))
        ));
        assert!(matches!(
            read_game("1. e4 e5)"),
            Err(PgnError::UnbalancedVariation(1))
        ));
    }
}
