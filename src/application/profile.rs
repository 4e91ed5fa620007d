//! Static portfolio profile: loading, derived durations and home page views.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;

use crate::domain::profile::{Course, Experience, Profile, Project, Skill, YearMonth};
use crate::presentation::views::{
    BrandView, ContactView, CourseView, ExperienceView, FooterView, HeroView, HomeContext,
    LayoutChrome, NavigationLinkView, NavigationView, PageMetaView, PostCard, ProjectView,
    SkillGroupView, SkillView,
};

const EMBEDDED_PROFILE: &str = include_str!("../../config/profile.toml");

/// Posts shown in the "latest writing" strip on the home page.
pub const RECENT_POSTS_ON_HOME: u32 = 3;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to read profile `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse profile `{origin}`")]
    Parse {
        origin: String,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Clone)]
pub struct ProfileService {
    profile: Arc<Profile>,
}

impl ProfileService {
    pub fn new(profile: Profile) -> Self {
        Self {
            profile: Arc::new(profile),
        }
    }

    /// Load from `path` when given, otherwise from the profile compiled into the binary.
    pub async fn load(path: Option<&Path>) -> Result<Self, ProfileError> {
        let profile = match path {
            Some(path) => {
                let raw = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| ProfileError::Io {
                        path: path.to_path_buf(),
                        source,
                    })?;
                let profile = parse_profile(&raw, &path.display().to_string())?;
                info!(
                    target = "folio::profile",
                    path = %path.display(),
                    "Loaded profile from disk"
                );
                profile
            }
            None => Self::embedded_profile()?,
        };
        Ok(Self::new(profile))
    }

    pub fn embedded() -> Result<Self, ProfileError> {
        Self::embedded_profile().map(Self::new)
    }

    fn embedded_profile() -> Result<Profile, ProfileError> {
        parse_profile(EMBEDDED_PROFILE, "embedded")
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Header and footer around every page.
    pub fn chrome(&self, meta: PageMetaView) -> LayoutChrome {
        let profile = &self.profile;
        let entries = if profile.navigation.is_empty() {
            vec![link("Home", "/"), link("Blog", "/blog")]
        } else {
            profile
                .navigation
                .iter()
                .map(|item| link(&item.label, &item.href))
                .collect()
        };

        LayoutChrome {
            brand: BrandView {
                title: profile.personal.name.clone(),
                href: "/".to_string(),
            },
            navigation: NavigationView { entries },
            footer: FooterView {
                copy: format!(
                    "\u{a9} {} {}",
                    OffsetDateTime::now_utc().year(),
                    profile.personal.name
                ),
                links: vec![
                    link("GitHub", &profile.social.github.url),
                    link("LinkedIn", &profile.social.linkedin.url),
                    link("RSS", "/rss.xml"),
                ],
            },
            meta,
        }
    }

    pub fn featured_projects(&self) -> Vec<&Project> {
        self.profile
            .projects
            .iter()
            .filter(|project| project.featured)
            .collect()
    }

    /// Skills grouped by category, categories in first-seen order.
    pub fn skills_by_category(&self) -> Vec<(&str, Vec<&Skill>)> {
        let mut groups: Vec<(&str, Vec<&Skill>)> = Vec::new();
        for skill in &self.profile.skills {
            match groups
                .iter_mut()
                .find(|(category, _)| *category == skill.category)
            {
                Some((_, skills)) => skills.push(skill),
                None => groups.push((skill.category.as_str(), vec![skill])),
            }
        }
        groups
    }

    pub fn home_context(&self, recent_posts: Vec<PostCard>, today: YearMonth) -> HomeContext {
        let profile = &self.profile;
        let personal = &profile.personal;

        let hero = HeroView {
            name: personal.name.clone(),
            first_name: personal
                .name
                .split_whitespace()
                .next()
                .unwrap_or(&personal.name)
                .to_string(),
            title: personal.title.clone(),
            tagline: personal.tagline.clone(),
            description: personal.description.clone(),
            location: personal.location.clone(),
        };

        let skill_groups = self
            .skills_by_category()
            .into_iter()
            .map(|(category, skills)| SkillGroupView {
                category: category.to_string(),
                skills: skills
                    .into_iter()
                    .map(|skill| SkillView {
                        name: skill.name.clone(),
                        level: skill.level.as_str(),
                        percent: skill.level.percent(),
                        icon: skill.icon.clone(),
                    })
                    .collect(),
            })
            .collect();

        let projects = self
            .featured_projects()
            .into_iter()
            .map(project_view)
            .collect();

        let contact = ContactView {
            email: profile.social.email.clone(),
            github_url: profile.social.github.url.clone(),
            github_username: profile.social.github.username.clone(),
            linkedin_url: profile.social.linkedin.url.clone(),
            linkedin_username: profile.social.linkedin.username.clone(),
            location: personal.location.clone(),
        };

        HomeContext {
            hero,
            skill_groups,
            projects,
            current_role: experience_view(&profile.experience.current, today),
            previous_roles: profile
                .experience
                .previous
                .iter()
                .map(|role| experience_view(role, today))
                .collect(),
            courses: profile.courses.iter().map(course_view).collect(),
            contact,
            recent_posts,
        }
    }
}

fn link(label: &str, href: &str) -> NavigationLinkView {
    NavigationLinkView {
        label: label.to_string(),
        href: href.to_string(),
    }
}

fn parse_profile(raw: &str, origin: &str) -> Result<Profile, ProfileError> {
    toml::from_str(raw).map_err(|source| ProfileError::Parse {
        origin: origin.to_string(),
        source,
    })
}

pub fn current_month() -> YearMonth {
    let now = OffsetDateTime::now_utc();
    YearMonth::new(now.year(), now.month())
}

/// Human readable span such as `2 years 3 months`. Open ended roles run to `today`.
pub fn calculate_duration(start: YearMonth, end: Option<YearMonth>, today: YearMonth) -> String {
    let total = start.months_until(end.unwrap_or(today)).max(0);
    let years = total / 12;
    let months = total % 12;

    let plural = |count: i32, unit: &str| {
        if count == 1 {
            format!("1 {unit}")
        } else {
            format!("{count} {unit}s")
        }
    };

    match (years, months) {
        (0, months) => plural(months, "month"),
        (years, 0) => plural(years, "year"),
        (years, months) => format!("{} {}", plural(years, "year"), plural(months, "month")),
    }
}

/// `January 2024`, or `Present` for an open end date.
pub fn format_month_year(value: Option<YearMonth>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "Present".to_string(),
    }
}

fn experience_view(role: &Experience, today: YearMonth) -> ExperienceView {
    ExperienceView {
        position: role.position.clone(),
        company: role.company.clone(),
        location: role.location.clone(),
        period: format!(
            "{} - {}",
            format_month_year(Some(role.start_date)),
            format_month_year(role.end_date)
        ),
        duration: calculate_duration(role.start_date, role.end_date, today),
        description: role.description.clone(),
        responsibilities: role.responsibilities.clone(),
        technologies: role.technologies.clone(),
    }
}

fn project_view(project: &Project) -> ProjectView {
    ProjectView {
        title: project.title.clone(),
        description: project.description.clone(),
        category: project.category.clone(),
        status: project.status.as_str(),
        technologies: project.technologies.clone(),
        github_url: project.github_url.clone(),
        live_url: project.live_url.clone(),
    }
}

fn course_view(course: &Course) -> CourseView {
    CourseView {
        title: course.title.clone(),
        description: course.description.clone(),
        category: course.category.clone(),
        provider: course.provider.clone(),
        institution: course.institution.clone(),
        instructor: course.instructor.clone(),
        duration: course.duration.clone(),
        completed: course.completed_date.map(|date| date.to_string()),
    }
}
