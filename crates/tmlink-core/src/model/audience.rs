// ── Audience display domain type ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// What the public audience screen of a field set is showing.
///
/// `Display`/`FromStr` use the stable snake_case id (`in_match`,
/// `sc_rankings`, ...); [`label`](Self::label) is the human text.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AudienceDisplay {
    #[default]
    Blank,
    Logo,
    Intro,
    InMatch,
    Results,
    Schedule,
    Rankings,
    ScRankings,
    AllianceSelection,
    Bracket,
    Award,
    Inspection,
}

impl AudienceDisplay {
    pub fn id(self) -> &'static str {
        self.into()
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Blank => "None",
            Self::Logo => "Logo",
            Self::Intro => "Up Next",
            Self::InMatch => "In-Match",
            Self::Results => "Saved Match Results",
            Self::Schedule => "Schedule",
            Self::Rankings => "Rankings",
            Self::ScRankings => "Skills Rankings",
            Self::AllianceSelection => "Alliance Selection",
            Self::Bracket => "Elim Bracket",
            Self::Award => "Award Slides",
            Self::Inspection => "Inspection",
        }
    }
}
