//! Remote leaderboards
//!
//! Two boards, guests and wallet players, each top 10 by score. Records come
//! from the backend as JSON; this module ranks them and formats display rows.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Maximum number of records shown per board
pub const MAX_ENTRIES: usize = 10;

const EXPLORER_TX_URL: &str = "https://testnet.monadexplorer.com/tx/";

/// Which board a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Board {
    Guest,
    Authenticated,
}

impl Board {
    /// Wallet players see their own board first
    pub fn default_for(authenticated: bool) -> Self {
        if authenticated {
            Board::Authenticated
        } else {
            Board::Guest
        }
    }
}

/// A single leaderboard entry as sent by the backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardRecord {
    /// Guest player id
    #[serde(default)]
    pub id: Option<String>,
    /// Wallet address
    #[serde(default)]
    pub address: Option<String>,
    pub score: u64,
    /// All-time score (wallet board only)
    #[serde(default)]
    pub total_score: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub hash_tx: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl LeaderboardRecord {
    /// Player identity on the given board
    pub fn player_id(&self, board: Board) -> Option<&str> {
        match board {
            Board::Guest => self.id.as_deref(),
            Board::Authenticated => self.address.as_deref(),
        }
    }

    /// Transaction link, if the score was processed
    pub fn tx_link(&self, board: Board) -> Option<String> {
        match board {
            Board::Guest => self.url.clone().filter(|u| !u.is_empty()),
            Board::Authenticated => self
                .hash_tx
                .as_deref()
                .filter(|h| !h.is_empty())
                .map(|h| format!("{EXPLORER_TX_URL}{h}")),
        }
    }
}

/// Shorten a wallet address to `0x1234...cdef`
pub fn shorten_address(address: &str) -> String {
    if address.len() <= 10 || !address.is_ascii() {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}

/// Parse a board payload, ranked by score and capped at `MAX_ENTRIES`
pub fn parse_records(json: &str) -> Result<Vec<LeaderboardRecord>, Error> {
    let mut records: Vec<LeaderboardRecord> = serde_json::from_str(json)?;
    // Stable sort keeps backend order for ties
    records.sort_by(|a, b| b.score.cmp(&a.score));
    records.truncate(MAX_ENTRIES);
    Ok(records)
}

/// A formatted table row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// 1-indexed
    pub place: usize,
    pub player: String,
    pub score: u64,
    pub total_score: Option<u64>,
    /// Link or "Not processed"
    pub transaction: String,
}

/// Records plus fetch status for one board
#[derive(Debug, Clone, Default)]
pub struct BoardState {
    pub records: Vec<LeaderboardRecord>,
    pub error: Option<String>,
    pub loading: bool,
}

impl BoardState {
    /// Message shown instead of rows, if any
    pub fn status_text(&self) -> Option<String> {
        if self.loading {
            return Some("Loading new transactions...".to_string());
        }
        if self.records.is_empty() {
            return Some(
                self.error
                    .clone()
                    .unwrap_or_else(|| "No transactions to display".to_string()),
            );
        }
        None
    }
}

/// Both boards and the selected tab
#[derive(Debug, Clone)]
pub struct Leaderboard {
    pub active: Board,
    guest: BoardState,
    authenticated: BoardState,
}

impl Default for Leaderboard {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Leaderboard {
    pub fn new(authenticated: bool) -> Self {
        Self {
            active: Board::default_for(authenticated),
            guest: BoardState::default(),
            authenticated: BoardState::default(),
        }
    }

    pub fn board(&self, board: Board) -> &BoardState {
        match board {
            Board::Guest => &self.guest,
            Board::Authenticated => &self.authenticated,
        }
    }

    fn board_mut(&mut self, board: Board) -> &mut BoardState {
        match board {
            Board::Guest => &mut self.guest,
            Board::Authenticated => &mut self.authenticated,
        }
    }

    /// Mark a board as fetching; clears its previous error
    pub fn begin_fetch(&mut self, board: Board) {
        let state = self.board_mut(board);
        state.loading = true;
        state.error = None;
    }

    /// Store a fetch result. Failures keep the previous records.
    pub fn finish_fetch(&mut self, board: Board, result: Result<Vec<LeaderboardRecord>, Error>) {
        let state = self.board_mut(board);
        state.loading = false;
        match result {
            Ok(mut records) => {
                records.sort_by(|a, b| b.score.cmp(&a.score));
                records.truncate(MAX_ENTRIES);
                log::info!("Loaded {} {:?} leaderboard records", records.len(), board);
                state.records = records;
            }
            Err(e) => {
                log::warn!("Leaderboard fetch failed: {e}");
                state.error = Some(e.to_string());
            }
        }
    }

    /// 1-indexed place of `player` on a board
    pub fn rank_of(&self, board: Board, player: &str) -> Option<usize> {
        self.board(board)
            .records
            .iter()
            .position(|r| r.player_id(board) == Some(player))
            .map(|i| i + 1)
    }

    /// Display rows for a board. `me` lists ids that belong to the viewer.
    pub fn rows(&self, board: Board, me: &[&str]) -> Vec<Row> {
        self.board(board)
            .records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let player = match board {
                    Board::Authenticated => record
                        .username
                        .clone()
                        .filter(|u| !u.is_empty())
                        .unwrap_or_else(|| "Unknown".to_string()),
                    Board::Guest => match record.player_id(board) {
                        Some(id) if me.contains(&id) => "You!".to_string(),
                        Some(id) => shorten_address(id),
                        None => "Unknown".to_string(),
                    },
                };
                Row {
                    place: i + 1,
                    player,
                    score: record.score,
                    total_score: match board {
                        Board::Authenticated => record.total_score,
                        Board::Guest => None,
                    },
                    transaction: record
                        .tx_link(board)
                        .unwrap_or_else(|| "Not processed".to_string()),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUEST_JSON: &str = r#"[
        { "id": "p-1", "score": 5, "url": "https://explorer/tx/a" },
        { "id": "p-2", "score": 12, "url": "" },
        { "id": "p-3", "score": 8 }
    ]"#;

    #[test]
    fn test_parse_ranks_by_score() {
        let records = parse_records(GUEST_JSON).unwrap();
        let scores: Vec<u64> = records.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![12, 8, 5]);
    }

    #[test]
    fn test_parse_caps_entries() {
        let many: Vec<String> = (0..15).map(|i| format!(r#"{{ "id": "p{i}", "score": {i} }}"#)).collect();
        let json = format!("[{}]", many.join(","));
        let records = parse_records(&json).unwrap();
        assert_eq!(records.len(), MAX_ENTRIES);
        assert_eq!(records[0].score, 14);
    }

    #[test]
    fn test_bad_payload_is_parse_error() {
        assert!(matches!(parse_records("{}"), Err(Error::Parse(_))));
    }

    #[test]
    fn test_shorten_address() {
        assert_eq!(
            shorten_address("0x1234567890abcdef1234567890abcdef1234cdef"),
            "0x1234...cdef"
        );
        assert_eq!(shorten_address("p-1"), "p-1");
    }

    #[test]
    fn test_guest_rows_mark_viewer_and_unprocessed() {
        let mut board = Leaderboard::new(false);
        board.finish_fetch(Board::Guest, parse_records(GUEST_JSON));
        let rows = board.rows(Board::Guest, &["p-3"]);

        assert_eq!(rows[0].place, 1);
        assert_eq!(rows[0].transaction, "Not processed");
        assert_eq!(rows[1].player, "You!");
        assert_eq!(rows[2].transaction, "https://explorer/tx/a");
        assert_eq!(board.rank_of(Board::Guest, "p-1"), Some(3));
    }

    #[test]
    fn test_auth_rows_use_username_and_explorer() {
        let json = r#"[{ "address": "0xabc", "score": 3, "total_score": 40, "hash_tx": "0xfeed", "username": "@tank" },
                       { "address": "0xdef", "score": 1 }]"#;
        let mut board = Leaderboard::new(true);
        assert_eq!(board.active, Board::Authenticated);
        board.finish_fetch(Board::Authenticated, parse_records(json));
        let rows = board.rows(Board::Authenticated, &[]);

        assert_eq!(rows[0].player, "@tank");
        assert_eq!(rows[0].total_score, Some(40));
        assert_eq!(rows[0].transaction, format!("{EXPLORER_TX_URL}0xfeed"));
        assert_eq!(rows[1].player, "Unknown");
    }

    #[test]
    fn test_failed_fetch_shows_error_text() {
        let mut board = Leaderboard::new(false);
        board.begin_fetch(Board::Guest);
        assert_eq!(
            board.board(Board::Guest).status_text().as_deref(),
            Some("Loading new transactions...")
        );
        board.finish_fetch(Board::Guest, Err(Error::Service("Server error".into())));
        assert_eq!(
            board.board(Board::Guest).status_text().as_deref(),
            Some("service error: Server error")
        );
        assert_eq!(
            board.board(Board::Authenticated).status_text().as_deref(),
            Some("No transactions to display")
        );
    }
}
