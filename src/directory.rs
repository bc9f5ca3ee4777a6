use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PositionBucket {
    Centers,
    Forwards,
    Guards,
    Unknown,
}

impl PositionBucket {
    pub const FILTERABLE: [PositionBucket; 3] = [
        PositionBucket::Centers,
        PositionBucket::Forwards,
        PositionBucket::Guards,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PositionBucket::Centers => "Centers",
            PositionBucket::Forwards => "Forwards",
            PositionBucket::Guards => "Guards",
            PositionBucket::Unknown => "Unknown",
        }
    }

    fn bit(self) -> u8 {
        match self {
            PositionBucket::Centers => 0b001,
            PositionBucket::Forwards => 0b010,
            PositionBucket::Guards => 0b100,
            PositionBucket::Unknown => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PositionBuckets(u8);

impl PositionBuckets {
    pub fn from_code(code: &str) -> Self {
        let code = code.trim().to_ascii_uppercase();
        let mut bits = 0u8;
        if matches!(code.as_str(), "C" | "C-F" | "F-C") {
            bits |= PositionBucket::Centers.bit();
        }
        if matches!(code.as_str(), "F" | "C-F" | "F-C" | "F-G" | "G-F") {
            bits |= PositionBucket::Forwards.bit();
        }
        if matches!(code.as_str(), "G" | "F-G" | "G-F") {
            bits |= PositionBucket::Guards.bit();
        }
        Self(bits)
    }

    pub fn contains(self, bucket: PositionBucket) -> bool {
        match bucket {
            PositionBucket::Unknown => self.0 == 0,
            other => self.0 & other.bit() != 0,
        }
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = PositionBucket> {
        PositionBucket::FILTERABLE
            .into_iter()
            .filter(move |b| self.contains(*b))
    }
}

pub fn primary_bucket(code: &str) -> PositionBucket {
    let lead = code.trim().split('-').next().unwrap_or_default();
    let buckets = PositionBuckets::from_code(lead);
    buckets.iter().next().unwrap_or(PositionBucket::Unknown)
}

/// URL-safe key for a display name: lowercase, NFKD, keep `[a-z0-9\s-]`,
/// trim, and fold whitespace/hyphen runs into one hyphen.
pub fn slug_for(name: &str) -> String {
    // Combining marks split off by NFKD fall outside the kept set.
    let kept: String = name
        .to_lowercase()
        .nfkd()
        .filter(|ch| {
            ch.is_ascii_lowercase() || ch.is_ascii_digit() || *ch == '-' || ch.is_whitespace()
        })
        .collect();

    let mut out = String::with_capacity(kept.len());
    for ch in kept.trim().chars() {
        if ch == '-' || ch.is_whitespace() {
            if !out.ends_with('-') {
                out.push('-');
            }
        } else {
            out.push(ch);
        }
    }
    out
}

pub fn compact_slug(name: &str) -> String {
    slug_for(name).replace('-', "")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub player_id: String,
    pub name: String,
    pub slug: String,
    pub position: Option<String>,
    pub team: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterRow {
    pub name: String,
    pub position: String,
    pub team: String,
}

/// Resolves opaque player ids to display data. Lookups never fail: unknown
/// ids fall back to the id, `Unknown`, or an empty team.
#[derive(Debug, Clone, Default)]
pub struct PlayerDirectory {
    by_id: HashMap<String, DirectoryEntry>,
    by_slug: HashMap<String, String>,
    by_compact: HashMap<String, String>,
    unmatched_roster: Vec<String>,
}

impl PlayerDirectory {
    /// `names` is (display name, player id). Roster rows join by exact name.
    /// The first id listed for a display name takes that name's roster row;
    /// names shared by several ids are also reported as unmatched.
    pub fn build(names: Vec<(String, String)>, roster: Vec<RosterRow>) -> Self {
        let mut dir = Self::default();
        let mut name_to_id: HashMap<String, String> = HashMap::new();
        let mut shared_names: BTreeSet<String> = BTreeSet::new();
        for (name, player_id) in names {
            let name = name.trim().to_string();
            let player_id = player_id.trim().to_string();
            if name.is_empty() || player_id.is_empty() {
                continue;
            }
            let slug = slug_for(&name);
            let compact = slug.replace('-', "");
            if let Some(existing) = dir.by_slug.get(&slug) {
                warn!("slug {slug:?} already maps to {existing}, ignoring {player_id}");
            } else {
                dir.by_slug.insert(slug.clone(), player_id.clone());
            }
            dir.by_compact.entry(compact).or_insert_with(|| player_id.clone());
            match name_to_id.get(&name) {
                Some(first) if *first != player_id => {
                    warn!("name {name:?} is shared by {first} and {player_id}");
                    shared_names.insert(name.clone());
                }
                Some(_) => {}
                None => {
                    name_to_id.insert(name.clone(), player_id.clone());
                }
            }
            dir.by_id.insert(
                player_id.clone(),
                DirectoryEntry {
                    player_id,
                    name,
                    slug,
                    position: None,
                    team: None,
                },
            );
        }

        for row in roster {
            let name = row.name.trim();
            let Some(player_id) = name_to_id.get(name) else {
                dir.unmatched_roster.push(name.to_string());
                continue;
            };
            if shared_names.contains(name) {
                dir.unmatched_roster.push(name.to_string());
            }
            if let Some(entry) = dir.by_id.get_mut(player_id) {
                let pos = row.position.trim().to_ascii_uppercase();
                let team = row.team.trim().to_ascii_uppercase();
                entry.position = (!pos.is_empty()).then_some(pos);
                entry.team = (!team.is_empty()).then_some(team);
            }
        }
        dir.unmatched_roster.sort();
        dir.unmatched_roster.dedup();
        dir
    }

    /// Loads the name map and, if present, the roster table. Missing or
    /// unreadable files degrade to an emptier directory instead of failing.
    pub fn load(name_map: &Path, roster: Option<&Path>) -> Self {
        let names = match load_name_map(name_map) {
            Ok(names) => names,
            Err(err) => {
                warn!("failed to load player id map: {err:#}");
                Vec::new()
            }
        };
        let roster_rows = match roster {
            Some(path) => load_roster(path).unwrap_or_else(|err| {
                warn!("failed to load roster table: {err:#}");
                Vec::new()
            }),
            None => Vec::new(),
        };
        let dir = Self::build(names, roster_rows);
        info!(
            players = dir.len(),
            unmatched_roster = dir.unmatched_roster.len(),
            "player directory loaded"
        );
        if !dir.unmatched_roster.is_empty() {
            warn!(
                "roster names without a player id: {}",
                dir.unmatched_roster.join(", ")
            );
        }
        dir
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn entry(&self, player_id: &str) -> Option<&DirectoryEntry> {
        self.by_id.get(player_id)
    }

    pub fn name_for(&self, player_id: &str) -> String {
        self.entry(player_id)
            .map(|e| e.name.clone())
            .unwrap_or_else(|| player_id.to_string())
    }

    pub fn position_code_for(&self, player_id: &str) -> Option<&str> {
        self.entry(player_id)?.position.as_deref()
    }

    pub fn position_buckets_for(&self, player_id: &str) -> PositionBuckets {
        self.position_code_for(player_id)
            .map(PositionBuckets::from_code)
            .unwrap_or_default()
    }

    pub fn position_bucket_for(&self, player_id: &str) -> PositionBucket {
        self.position_code_for(player_id)
            .map(primary_bucket)
            .unwrap_or(PositionBucket::Unknown)
    }

    pub fn team_for(&self, player_id: &str) -> String {
        self.entry(player_id)
            .and_then(|e| e.team.clone())
            .unwrap_or_default()
    }

    /// Player page lookup: exact id, then hyphen slug, then compact slug.
    pub fn resolve(&self, param: &str) -> Option<&DirectoryEntry> {
        let raw = param.trim();
        if raw.is_empty() {
            return None;
        }
        if let Some(entry) = self.by_id.get(raw) {
            return Some(entry);
        }
        if let Some(id) = self.by_slug.get(&slug_for(raw)) {
            return self.by_id.get(id);
        }
        let compact = compact_slug(raw);
        self.by_compact.get(&compact).and_then(|id| self.by_id.get(id))
    }

    /// Roster names that matched no id, or more than one.
    pub fn unmatched_roster_names(&self) -> &[String] {
        &self.unmatched_roster
    }

    pub fn ids_without_roster(&self) -> Vec<String> {
        let out: BTreeSet<String> = self
            .by_id
            .values()
            .filter(|e| e.position.is_none() && e.team.is_none())
            .map(|e| e.player_id.clone())
            .collect();
        out.into_iter().collect()
    }
}

pub fn load_name_map(path: &Path) -> Result<Vec<(String, String)>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("open name map {}", path.display()))?;
    let mut out = Vec::new();
    for record in reader.records() {
        let record = record.context("read name map row")?;
        let (Some(name), Some(id)) = (record.get(0), record.get(1)) else {
            continue;
        };
        if !name.is_empty() && !id.is_empty() {
            out.push((name.to_string(), id.to_string()));
        }
    }
    Ok(out)
}

/// Per-game roster table; needs `Player`, `Pos` and `Team` (or `Tm`) columns.
pub fn load_roster(path: &Path) -> Result<Vec<RosterRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("open roster {}", path.display()))?;
    let headers = reader.headers().context("read roster header")?.clone();
    let column = |names: &[&str]| {
        headers
            .iter()
            .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
    };
    let name_col = column(&["player", "player name", "name"])
        .context("roster has no player column")?;
    let pos_col = column(&["pos", "position"]).context("roster has no position column")?;
    let team_col = column(&["team", "tm"]).context("roster has no team column")?;

    let mut out = Vec::new();
    for record in reader.records() {
        let record = record.context("read roster row")?;
        let name = record.get(name_col).unwrap_or_default();
        if name.is_empty() {
            continue;
        }
        out.push(RosterRow {
            name: name.to_string(),
            position: record.get(pos_col).unwrap_or_default().to_string(),
            team: record.get(team_col).unwrap_or_default().to_string(),
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_strips_diacritics_and_folds_separators() {
        assert_eq!(slug_for("Aʼja Wilson"), "aja-wilson");
        assert_eq!(slug_for("  Jéssica  Shepard "), "jessica-shepard");
        assert_eq!(slug_for("Ty  --  Harris"), "ty-harris");
        assert_eq!(slug_for("D'Arcy O'Neil"), "darcy-oneil");
    }

    #[test]
    fn hybrid_codes_land_in_two_buckets() {
        let fg = PositionBuckets::from_code("f-g");
        assert!(fg.contains(PositionBucket::Forwards));
        assert!(fg.contains(PositionBucket::Guards));
        assert!(!fg.contains(PositionBucket::Centers));
        assert_eq!(primary_bucket("G-F"), PositionBucket::Guards);
        assert!(PositionBuckets::from_code("").contains(PositionBucket::Unknown));
    }
}
