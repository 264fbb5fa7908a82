use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One roster row as served by the game list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub id: i64,
    #[serde(default)]
    pub white_player: Option<String>,
    #[serde(default)]
    pub white_elo: Option<i32>,
    #[serde(default)]
    pub black_player: Option<String>,
    #[serde(default)]
    pub black_elo: Option<i32>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub date: Option<String>, // "2024.01.15" or "2024-01-15"
    #[serde(default)]
    pub site: Option<String>,
}

impl GameSummary {
    /// Table cells in display order: white, white elo, black, black elo,
    /// result, date, site. Empty names show `Unknown`, everything else `N/A`.
    pub fn cells(&self) -> [String; 7] {
        [
            player_cell(self.white_player.as_deref()),
            elo_cell(self.white_elo),
            player_cell(self.black_player.as_deref()),
            elo_cell(self.black_elo),
            text_cell(self.result.as_deref()),
            self.date_display(),
            text_cell(self.site.as_deref()),
        ]
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        self.date.as_deref().and_then(parse_date)
    }

    fn date_display(&self) -> String {
        match self.parsed_date() {
            Some(d) => d.format("%Y-%m-%d").to_string(),
            None => text_cell(self.date.as_deref()),
        }
    }
}

/// Parse a PGN (`2024.01.15`) or ISO (`2024-01-15`) date. `?` placeholders yield `None`.
pub fn parse_date(date: &str) -> Option<NaiveDate> {
    let date = date.trim();
    if date.is_empty() || date.contains('?') {
        return None;
    }
    NaiveDate::parse_from_str(date, "%Y.%m.%d")
        .or_else(|_| NaiveDate::parse_from_str(date, "%Y-%m-%d"))
        .ok()
}

fn player_cell(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => "Unknown".to_string(),
    }
}

fn elo_cell(value: Option<i32>) -> String {
    match value {
        Some(v) if v > 0 => v.to_string(),
        _ => "N/A".to_string(),
    }
}

fn text_cell(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => "N/A".to_string(),
    }
}
