//! `(CompetitionID, TeamID)` extraction from a team data URL.

use crate::error::IdentifierError;
use std::fmt;
use url::Url;

pub const COMPETITION_PARAM: &str = "CompetitionID";
pub const TEAM_PARAM: &str = "TeamID";

/// Base for hrefs given without scheme/host (e.g. `/TeamData.aspx?...`).
const RELATIVE_BASE: &str = "http://relative.invalid/";

/// Identifies a team's data within the backend API. Both fields are opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TeamIdentifier {
    pub competition_id: String,
    pub team_id: String,
}

impl TeamIdentifier {
    pub fn new(competition_id: impl Into<String>, team_id: impl Into<String>) -> Self {
        Self {
            competition_id: competition_id.into(),
            team_id: team_id.into(),
        }
    }

    /// Parses `CompetitionID` and `TeamID` from the query string of `url`.
    ///
    /// Accepts absolute and relative URLs. Names match exactly; the first
    /// occurrence wins. An empty value counts as missing.
    pub fn from_team_data_url(url: &str) -> Result<Self, IdentifierError> {
        let parsed = parse_lenient(url)?;
        let first = |name: &'static str| -> Result<String, IdentifierError> {
            parsed
                .query_pairs()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.into_owned())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| IdentifierError::MissingParam {
                    url: url.to_string(),
                    param: name,
                })
        };
        Ok(Self {
            competition_id: first(COMPETITION_PARAM)?,
            team_id: first(TEAM_PARAM)?,
        })
    }
}

impl fmt::Display for TeamIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.competition_id, self.team_id)
    }
}

fn parse_lenient(url: &str) -> Result<Url, IdentifierError> {
    let invalid = |e: url::ParseError| IdentifierError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    };
    match Url::parse(url) {
        Ok(u) => Ok(u),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = Url::parse(RELATIVE_BASE).map_err(invalid)?;
            base.join(url).map_err(invalid)
        }
        Err(e) => Err(invalid(e)),
    }
}
