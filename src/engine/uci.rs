// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! UCI wire format: commands sent to the engine and the lines it answers with.
//!
//! Only the subset needed for analysis is modelled. Lines the adapter has no
//! use for (`info string`, `copyprotection`, unknown keywords) parse to
//! [`EngineMessage::Other`] instead of failing, since engines are chatty.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use crate::chess::Move;
use crate::config::consts::MATE_SCORE_CP;
use crate::errors::{EngineError, EngineResult};

/// Engine evaluation from the point of view of the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    /// Centipawns.
    Cp(i32),
    /// Moves to mate; negative when the side to move is getting mated.
    Mate(i32),
}

impl Score {
    /// Collapse to centipawns, mapping any forced mate to ±[`MATE_SCORE_CP`].
    /// `mate 0` means the side to move is already mated.
    pub fn to_centipawns(self) -> i32 {
        match self {
            Score::Cp(cp) => cp,
            Score::Mate(n) if n > 0 => MATE_SCORE_CP,
            Score::Mate(_) => -MATE_SCORE_CP,
        }
    }
}

/// Whether a reported score is exact or only a search bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Lower,
    Upper,
}

/// One `info` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoLine {
    pub depth: Option<u32>,
    pub seldepth: Option<u32>,
    /// 1-based rank of the line; engines omit it when MultiPV is 1.
    pub multipv: u32,
    pub score: Option<Score>,
    pub bound: Option<Bound>,
    pub nodes: Option<u64>,
    pub nps: Option<u64>,
    pub time_ms: Option<u64>,
    pub pv: Vec<String>,
}

impl Default for InfoLine {
    fn default() -> Self {
        Self {
            depth: None,
            seldepth: None,
            multipv: 1,
            score: None,
            bound: None,
            nodes: None,
            nps: None,
            time_ms: None,
            pv: Vec::new(),
        }
    }
}

/// The `bestmove` terminator of a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestMove {
    /// `None` when the engine answered `bestmove (none)` (no legal moves).
    pub best: Option<String>,
    pub ponder: Option<String>,
}

/// A parsed line of engine output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineMessage {
    IdName(String),
    IdAuthor(String),
    /// An advertised option; only the name is kept.
    Option(String),
    UciOk,
    ReadyOk,
    Info(InfoLine),
    BestMove(BestMove),
    Other(String),
}

/// Limits for a single `go` command. Whichever is reached first stops the search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchLimit {
    pub depth: Option<u32>,
    pub movetime: Option<Duration>,
    pub nodes: Option<u64>,
}

/// One position to analyse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub fen: String,
    pub limit: SearchLimit,
    pub multipv: u32,
}

/// What a finished search produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOutcome {
    /// Last scored line with a principal variation for each rank, sorted by rank.
    pub lines: Vec<InfoLine>,
    pub best_move: Option<String>,
}

/// Commands the adapter sends.
#[derive(Debug, Clone, PartialEq)]
pub enum UciCommand<'a> {
    Uci,
    IsReady,
    UciNewGame,
    SetOption { name: &'a str, value: &'a str },
    Position { fen: &'a str },
    Go(&'a SearchLimit),
    Stop,
    Quit,
}

impl UciCommand<'_> {
    /// The leading keyword, for logs.
    pub fn keyword(&self) -> &'static str {
        match self {
            UciCommand::Uci => "uci",
            UciCommand::IsReady => "isready",
            UciCommand::UciNewGame => "ucinewgame",
            UciCommand::SetOption { .. } => "setoption",
            UciCommand::Position { .. } => "position",
            UciCommand::Go(_) => "go",
            UciCommand::Stop => "stop",
            UciCommand::Quit => "quit",
        }
    }
}

impl Display for UciCommand<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            UciCommand::SetOption { name, value } => {
                write!(f, "setoption name {} value {}", name, value)
            }
            UciCommand::Position { fen } => write!(f, "position fen {}", fen),
            UciCommand::Go(limit) => {
                f.write_str("go")?;
                if let Some(depth) = limit.depth {
                    write!(f, " depth {}", depth)?;
                }
                if let Some(movetime) = limit.movetime {
                    // Engines take whole milliseconds; never send 0, which some read as "no limit".
                    write!(f, " movetime {}", movetime.as_millis().max(1))?;
                }
                if let Some(nodes) = limit.nodes {
                    write!(f, " nodes {}", nodes)?;
                }
                if limit.depth.is_none() && limit.movetime.is_none() && limit.nodes.is_none() {
                    f.write_str(" infinite")?;
                }
                Ok(())
            }
            other => f.write_str(other.keyword()),
        }
    }
}

/// Parse one line of engine output.
pub fn parse_line(line: &str) -> EngineResult<EngineMessage> {
    let line = line.trim();
    let mut tokens = line.split_whitespace();
    let message = match tokens.next() {
        Some("uciok") => EngineMessage::UciOk,
        Some("readyok") => EngineMessage::ReadyOk,
        Some("id") => match tokens.next() {
            Some("name") => EngineMessage::IdName(rest_of(tokens)),
            Some("author") => EngineMessage::IdAuthor(rest_of(tokens)),
            _ => EngineMessage::Other(line.to_string()),
        },
        Some("option") => parse_option(tokens)
            .map(EngineMessage::Option)
            .unwrap_or_else(|| EngineMessage::Other(line.to_string())),
        Some("info") => match parse_info(tokens)? {
            Some(info) => EngineMessage::Info(info),
            None => EngineMessage::Other(line.to_string()),
        },
        Some("bestmove") => EngineMessage::BestMove(parse_bestmove(tokens, line)?),
        _ => EngineMessage::Other(line.to_string()),
    };
    Ok(message)
}

fn rest_of<'a>(tokens: impl Iterator<Item = &'a str>) -> String {
    tokens.collect::<Vec<_>>().join(" ")
}

/// `option name <words...> type ...` → the option name.
fn parse_option<'a>(mut tokens: impl Iterator<Item = &'a str>) -> Option<String> {
    if tokens.next() != Some("name") {
        return None;
    }
    let name: Vec<&str> = tokens.take_while(|t| *t != "type").collect();
    if name.is_empty() {
        None
    } else {
        Some(name.join(" "))
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: Option<&str>) -> EngineResult<T> {
    value
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| EngineError::Protocol(format!("bad value for info {key}: {value:?}")))
}

/// Parse the fields of an `info` line. `info string` lines return `None`.
fn parse_info<'a>(tokens: impl Iterator<Item = &'a str>) -> EngineResult<Option<InfoLine>> {
    let mut info = InfoLine::default();
    let mut tokens = tokens.peekable();

    while let Some(key) = tokens.next() {
        match key {
            "string" => return Ok(None),
            "depth" => info.depth = Some(parse_number(key, tokens.next())?),
            "seldepth" => info.seldepth = Some(parse_number(key, tokens.next())?),
            "multipv" => info.multipv = parse_number(key, tokens.next())?,
            "nodes" => info.nodes = Some(parse_number(key, tokens.next())?),
            "nps" => info.nps = Some(parse_number(key, tokens.next())?),
            "time" => info.time_ms = Some(parse_number(key, tokens.next())?),
            "score" => {
                let kind = tokens.next();
                let value: i32 = parse_number("score", tokens.next())?;
                info.score = Some(match kind {
                    Some("cp") if value.checked_abs().map_or(true, |v| v >= MATE_SCORE_CP) => {
                        return Err(EngineError::Protocol(format!(
                            "centipawn score {value} out of range"
                        )))
                    }
                    Some("cp") => Score::Cp(value),
                    Some("mate") => Score::Mate(value),
                    other => {
                        return Err(EngineError::Protocol(format!(
                            "unknown score kind {other:?}"
                        )))
                    }
                });
                match tokens.peek() {
                    Some(&"lowerbound") => {
                        info.bound = Some(Bound::Lower);
                        tokens.next();
                    }
                    Some(&"upperbound") => {
                        info.bound = Some(Bound::Upper);
                        tokens.next();
                    }
                    _ => {}
                }
            }
            "wdl" => {
                for _ in 0..3 {
                    tokens.next();
                }
            }
            "pv" => {
                info.pv = tokens.by_ref().map(str::to_string).collect();
            }
            "refutation" | "currline" => {
                // Trailing move lists we do not use.
                tokens.by_ref().for_each(drop);
            }
            // Single-valued fields we do not use: currmove, currmovenumber, hashfull, tbhits, sbhits, cpuload.
            _ => {
                tokens.next();
            }
        }
    }

    if info.multipv == 0 {
        return Err(EngineError::Protocol("info multipv must be at least 1".to_string()));
    }
    Ok(Some(info))
}

fn parse_bestmove<'a>(
    mut tokens: impl Iterator<Item = &'a str>,
    line: &str,
) -> EngineResult<BestMove> {
    let best = match tokens.next() {
        Some("(none)") | Some("0000") => None,
        Some(mv) => Some(checked_move(mv, line)?),
        None => return Err(EngineError::Protocol(format!("empty bestmove: '{line}'"))),
    };
    let ponder = match (tokens.next(), tokens.next()) {
        (Some("ponder"), Some(mv)) => Some(checked_move(mv, line)?),
        _ => None,
    };
    Ok(BestMove { best, ponder })
}

fn checked_move(mv: &str, line: &str) -> EngineResult<String> {
    Move::from_uci(mv)
        .map(|m| m.to_uci())
        .map_err(|_| EngineError::Protocol(format!("unparseable move '{mv}' in '{line}'")))
}

/// Accumulates `info` lines during one search.
#[derive(Debug, Default)]
pub struct SearchCollector {
    by_rank: BTreeMap<u32, InfoLine>,
}

impl SearchCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the most recent scored line with a principal variation per rank.
    pub fn observe(&mut self, info: InfoLine) {
        if info.score.is_some() && !info.pv.is_empty() {
            self.by_rank.insert(info.multipv, info);
        }
    }

    /// Finish the search, keeping at most `multipv` ranks.
    pub fn finish(self, best: BestMove, multipv: u32) -> SearchOutcome {
        SearchOutcome {
            lines: self
                .by_rank
                .into_values()
                .filter(|line| line.multipv <= multipv.max(1))
                .collect(),
            best_move: best.best,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_handshake_lines() {
        assert_eq!(
            parse_line("id name Stockfish 16").unwrap(),
            EngineMessage::IdName("Stockfish 16".to_string())
        );
        assert_eq!(
            parse_line("option name Skill Level type spin default 20 min 0 max 20").unwrap(),
            EngineMessage::Option("Skill Level".to_string())
        );
        assert_eq!(parse_line("uciok").unwrap(), EngineMessage::UciOk);
        assert_eq!(parse_line("readyok\r").unwrap(), EngineMessage::ReadyOk);
    }

    #[test]
    fn parses_full_info_line() {
        let line = "info depth 12 seldepth 17 multipv 2 score cp -31 upperbound nodes 84210 nps 1203000 hashfull 12 tbhits 0 time 70 pv e7e5 g1f3 b8c6";
        match parse_line(line).unwrap() {
            EngineMessage::Info(info) => {
                assert_eq!(info.depth, Some(12));
                assert_eq!(info.seldepth, Some(17));
                assert_eq!(info.multipv, 2);
                assert_eq!(info.score, Some(Score::Cp(-31)));
                assert_eq!(info.bound, Some(Bound::Upper));
                assert_eq!(info.nodes, Some(84_210));
                assert_eq!(info.time_ms, Some(70));
                assert_eq!(info.pv, vec!["e7e5", "g1f3", "b8c6"]);
            }
            other => panic!("expected info, got {:?}", other),
        }
    }

    #[test]
    fn info_string_and_currmove_lines_are_harmless() {
        assert!(matches!(
            parse_line("info string NNUE evaluation using nn-5af11540bbfe.nnue enabled").unwrap(),
            EngineMessage::Other(_)
        ));
        match parse_line("info depth 5 currmove e2e4 currmovenumber 1").unwrap() {
            EngineMessage::Info(info) => {
                assert_eq!(info.depth, Some(5));
                assert!(info.pv.is_empty());
            }
            other => panic!("expected info, got {:?}", other),
        }
    }

    #[test]
    fn malformed_info_is_a_protocol_error() {
        assert!(matches!(
            parse_line("info depth twelve"),
            Err(EngineError::Protocol(_))
        ));
        assert!(matches!(
            parse_line("info score centipawns 10"),
            Err(EngineError::Protocol(_))
        ));
    }

    #[test]
    fn out_of_range_centipawns_are_a_protocol_error() {
        for line in [
            "info depth 3 score cp -2147483648 pv e2e4",
            "info depth 3 score cp 100000 pv e2e4",
        ] {
            assert!(
                matches!(parse_line(line), Err(EngineError::Protocol(_))),
                "{line}"
            );
        }
        assert!(parse_line("info depth 3 score cp -99999 pv e2e4").is_ok());
    }

    #[test]
    fn parses_bestmove_variants() {
        assert_eq!(
            parse_line("bestmove e2e4 ponder e7e5").unwrap(),
            EngineMessage::BestMove(BestMove {
                best: Some("e2e4".to_string()),
                ponder: Some("e7e5".to_string()),
            })
        );
        assert_eq!(
            parse_line("bestmove (none)").unwrap(),
            EngineMessage::BestMove(BestMove {
                best: None,
                ponder: None
            })
        );
        assert!(matches!(parse_line("bestmove zz99"), Err(EngineError::Protocol(_))));
        assert!(matches!(parse_line("bestmove"), Err(EngineError::Protocol(_))));
    }

    #[test]
    fn renders_commands() {
        let limit = SearchLimit {
            depth: Some(12),
            movetime: Some(Duration::from_millis(50)),
            nodes: None,
        };
        assert_eq!(UciCommand::Go(&limit).to_string(), "go depth 12 movetime 50");
        assert_eq!(
            UciCommand::Go(&SearchLimit::default()).to_string(),
            "go infinite"
        );
        assert_eq!(
            UciCommand::SetOption {
                name: "MultiPV",
                value: "3"
            }
            .to_string(),
            "setoption name MultiPV value 3"
        );
        assert_eq!(UciCommand::IsReady.to_string(), "isready");
    }

    #[test]
    fn mate_scores_collapse_to_large_centipawns() {
        assert_eq!(Score::Cp(35).to_centipawns(), 35);
        assert_eq!(Score::Mate(3).to_centipawns(), MATE_SCORE_CP);
        assert_eq!(Score::Mate(-2).to_centipawns(), -MATE_SCORE_CP);
        assert_eq!(Score::Mate(0).to_centipawns(), -MATE_SCORE_CP);
    }

    #[test]
    fn collector_keeps_latest_line_per_rank() {
        let mut collector = SearchCollector::new();
        let line = |depth: u32, rank: u32, cp: i32, pv: &str| InfoLine {
            depth: Some(depth),
            multipv: rank,
            score: Some(Score::Cp(cp)),
            pv: pv.split_whitespace().map(str::to_string).collect(),
            ..InfoLine::default()
        };
        collector.observe(line(1, 1, 10, "e2e4"));
        collector.observe(line(1, 2, 5, "d2d4"));
        collector.observe(line(2, 1, 20, "g1f3 d7d5"));
        // Without a pv the line is ignored.
        collector.observe(line(3, 1, 99, ""));

        let outcome = collector.finish(
            BestMove {
                best: Some("g1f3".to_string()),
                ponder: None,
            },
            2,
        );
        assert_eq!(outcome.lines.len(), 2);
        assert_eq!(outcome.lines[0].score, Some(Score::Cp(20)));
        assert_eq!(outcome.lines[1].multipv, 2);
        assert_eq!(outcome.best_move.as_deref(), Some("g1f3"));
    }
}
