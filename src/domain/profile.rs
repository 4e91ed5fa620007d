//! Portfolio profile document: the static half of the site.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use time::Month;

#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub personal: PersonalInfo,
    #[serde(default)]
    pub navigation: Vec<NavigationItem>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub projects: Vec<Project>,
    pub experience: ExperienceHistory,
    #[serde(default)]
    pub courses: Vec<Course>,
    pub social: Social,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersonalInfo {
    pub name: String,
    pub title: String,
    pub location: String,
    pub tagline: String,
    pub description: String,
    pub email: String,
    pub github: String,
    pub linkedin: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NavigationItem {
    pub label: String,
    pub href: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl SkillLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            SkillLevel::Beginner => "Beginner",
            SkillLevel::Intermediate => "Intermediate",
            SkillLevel::Advanced => "Advanced",
            SkillLevel::Expert => "Expert",
        }
    }

    /// Fill percentage used by the skill meter.
    pub fn percent(self) -> u8 {
        match self {
            SkillLevel::Beginner => 25,
            SkillLevel::Intermediate => 50,
            SkillLevel::Advanced => 75,
            SkillLevel::Expert => 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Skill {
    pub id: u32,
    pub name: String,
    pub category: String,
    pub level: SkillLevel,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ProjectStatus {
    Planned,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl ProjectStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::Planned => "Planned",
            ProjectStatus::InProgress => "In Progress",
            ProjectStatus::Completed => "Completed",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    pub id: u32,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    pub category: String,
    pub status: ProjectStatus,
    #[serde(default)]
    pub featured: bool,
    pub github_url: String,
    pub live_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExperienceHistory {
    pub current: Experience,
    #[serde(default)]
    pub previous: Vec<Experience>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Experience {
    pub position: String,
    pub company: String,
    pub location: String,
    pub start_date: YearMonth,
    pub end_date: Option<YearMonth>,
    pub description: String,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Course {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub category: String,
    pub provider: String,
    pub institution: Option<String>,
    pub instructor: Option<String>,
    pub duration: String,
    pub completed_date: Option<YearMonth>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Social {
    pub github: SocialAccount,
    pub linkedin: SocialAccount,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SocialAccount {
    pub url: String,
    pub username: String,
}

/// Calendar month precision date, written as `YYYY-MM` or `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct YearMonth {
    pub year: i32,
    pub month: Month,
}

impl YearMonth {
    pub fn new(year: i32, month: Month) -> Self {
        Self { year, month }
    }

    /// Months elapsed from `self` to `later`; negative when `later` is earlier.
    pub fn months_until(self, later: YearMonth) -> i32 {
        (later.year - self.year) * 12 + (later.month as i32 - self.month as i32)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.month, self.year)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid month date `{0}`, expected YYYY-MM or YYYY-MM-DD")]
pub struct YearMonthParseError(String);

impl FromStr for YearMonth {
    type Err = YearMonthParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || YearMonthParseError(value.to_string());
        let mut parts = value.trim().split('-');
        let year = parts
            .next()
            .and_then(|part| part.parse::<i32>().ok())
            .ok_or_else(invalid)?;
        let month = parts
            .next()
            .and_then(|part| part.parse::<u8>().ok())
            .and_then(|number| Month::try_from(number).ok())
            .ok_or_else(invalid)?;
        if let Some(day) = parts.next() {
            if day.len() != 2 || !day.chars().all(|ch| ch.is_ascii_digit()) {
                return Err(invalid());
            }
        }
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Self { year, month })
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_month_accepts_month_and_day_precision() {
        let month: YearMonth = "2023-04".parse().expect("month precision");
        let day: YearMonth = "2023-04-17".parse().expect("day precision");
        assert_eq!(month, day);
        assert_eq!(month, YearMonth::new(2023, Month::April));
    }

    #[test]
    fn year_month_rejects_garbage() {
        assert!("2023".parse::<YearMonth>().is_err());
        assert!("2023-13".parse::<YearMonth>().is_err());
        assert!("2023-01-1x".parse::<YearMonth>().is_err());
    }

    #[test]
    fn months_until_spans_years() {
        let start = YearMonth::new(2021, Month::November);
        let end = YearMonth::new(2023, Month::February);
        assert_eq!(start.months_until(end), 15);
    }

    #[test]
    fn display_is_month_name_and_year() {
        assert_eq!(
            YearMonth::new(2024, Month::January).to_string(),
            "January 2024"
        );
    }
}
