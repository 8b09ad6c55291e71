//! Read-side views: athlete history, leaderboards, listings and role dashboards.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use talentscope_common::entities::{Assessment, TestType, User, UserRole, VerificationStatus};
use talentscope_db::{AssessmentQuery, SortOrder};
use uuid::Uuid;

use crate::error::Result;
use crate::service::AssessmentService;

const RECENT_WINDOW: usize = 5;
pub const MAX_PAGE_SIZE: usize = 100;
pub const DEFAULT_POINTS_BOARD: usize = 50;

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub limit: usize,
    pub total: u64,
    pub pages: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub athlete_id: Uuid,
    pub athlete_name: String,
    pub location: String,
    pub score: f64,
    pub percentile: Option<u8>,
    pub test_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestScore {
    pub test_type: TestType,
    pub best_score: Option<f64>,
    pub best_percentile: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeSummary {
    pub test_type: TestType,
    pub count: u64,
    pub average_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum DashboardStats {
    Athlete {
        total_assessments: u64,
        verified_assessments: u64,
        pending_assessments: u64,
        best_scores: Vec<BestScore>,
        /// Mean of the most recent verified scores, newest first.
        recent_average: Option<f64>,
    },
    Coach {
        total_athletes: u64,
        total_assessments: u64,
        pending_verifications: u64,
        by_test_type: Vec<TypeSummary>,
    },
    Official {
        total_athletes: u64,
        total_coaches: u64,
        total_assessments: u64,
        pending_verifications: u64,
        verified_today: u64,
        by_test_type: Vec<TypeSummary>,
    },
}

/// Contact details shown next to a record awaiting review.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AthleteSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub city: String,
    pub state: String,
    pub specialization: Option<String>,
}

impl From<&User> for AthleteSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            city: user.city.clone(),
            state: user.state.clone(),
            specialization: user.specialization.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PendingAssessment {
    pub assessment: Assessment,
    /// `None` when the athlete record is gone.
    pub athlete: Option<AthleteSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentStats {
    pub total: u64,
    pub verified: u64,
    /// Mean normalized score over every scored record, rounded.
    pub average_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AthleteListing {
    pub athlete: User,
    pub assessment_stats: AssessmentStats,
}

/// Filters shared by the athlete listing and user search.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    /// Case-insensitive match on name or email.
    pub search: Option<String>,
    pub role: Option<UserRole>,
    /// Exact state name.
    pub state: Option<String>,
    /// Case-insensitive match on specialization.
    pub sport: Option<String>,
}

impl UserFilter {
    fn matches(&self, user: &User) -> bool {
        let contains = |haystack: &str, needle: &str| haystack.to_lowercase().contains(&needle.to_lowercase());
        self.role.is_none_or(|r| user.role == r)
            && self.state.as_deref().is_none_or(|s| user.state == s)
            && self
                .sport
                .as_deref()
                .is_none_or(|s| user.specialization.as_deref().is_some_and(|spec| contains(spec, s)))
            && self
                .search
                .as_deref()
                .is_none_or(|q| contains(&user.name, q) || contains(&user.email, q))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointsEntry {
    pub rank: usize,
    pub user_id: Uuid,
    pub name: String,
    pub location: String,
    pub specialization: Option<String>,
    pub points: u32,
}

/// Slice one page out of an already ordered list. `page` is 1-based.
fn paginate<T>(items: Vec<T>, page: usize, limit: usize) -> Page<T> {
    let page = page.max(1);
    let limit = limit.clamp(1, MAX_PAGE_SIZE);
    let total = items.len() as u64;
    let items = items.into_iter().skip((page - 1) * limit).take(limit).collect();
    Page { items, page, limit, total, pages: total.div_ceil(limit as u64) }
}

fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.into_iter().fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

impl AssessmentService {
    /// An athlete's assessments, newest first. `page` is 1-based.
    pub async fn athlete_assessments(&self, athlete_id: Uuid, page: usize, limit: usize) -> Result<Page<Assessment>> {
        self.user(athlete_id).await?;

        let page = page.max(1);
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let query = AssessmentQuery::for_athlete(athlete_id)
            .order(SortOrder::NewestFirst)
            .page((page - 1) * limit, limit);

        let items = self.store.query_assessments(&query).await?;
        let total = self.store.count_assessments(&query).await?;
        Ok(Page { items, page, limit, total, pages: total.div_ceil(limit as u64) })
    }

    /// Top verified scores for a test type.
    pub async fn leaderboard(&self, test_type: TestType, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        let query = AssessmentQuery::all()
            .test_type(test_type)
            .status(VerificationStatus::Verified)
            .scored_only()
            .order(SortOrder::ScoreDesc)
            .page(0, limit.clamp(1, MAX_PAGE_SIZE));

        let mut entries = Vec::new();
        for a in self.store.query_assessments(&query).await? {
            let (Some(score), Some(athlete)) = (a.normalized_score, self.store.get_user(a.athlete_id).await?) else {
                continue;
            };
            entries.push(LeaderboardEntry {
                rank: entries.len() + 1,
                athlete_id: athlete.id,
                athlete_name: athlete.name.clone(),
                location: athlete.location(),
                score,
                percentile: a.percentile,
                test_date: a.test_date,
            });
        }
        Ok(entries)
    }

    /// Records awaiting review, newest first, with the athlete's contact
    /// details. Officials only.
    pub async fn pending_assessments(
        &self,
        official_id: Uuid,
        test_type: Option<TestType>,
        page: usize,
        limit: usize,
    ) -> Result<Page<PendingAssessment>> {
        self.user_with_role(official_id, &[UserRole::Official], "review pending assessments")
            .await?;

        let page = page.max(1);
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let mut query = AssessmentQuery::all().status(VerificationStatus::Pending);
        if let Some(t) = test_type {
            query = query.test_type(t);
        }
        let query = query.order(SortOrder::NewestFirst).page((page - 1) * limit, limit);

        let mut items = Vec::new();
        for assessment in self.store.query_assessments(&query).await? {
            let athlete = self.store.get_user(assessment.athlete_id).await?;
            items.push(PendingAssessment { athlete: athlete.as_ref().map(AthleteSummary::from), assessment });
        }
        let total = self.store.count_assessments(&query).await?;
        Ok(Page { items, page, limit, total, pages: total.div_ceil(limit as u64) })
    }

    /// Athletes by points, then newest first, each with a summary of their
    /// assessments. Coaches and officials only.
    pub async fn athletes(&self, viewer_id: Uuid, filter: &UserFilter, page: usize, limit: usize) -> Result<Page<AthleteListing>> {
        self.user_with_role(viewer_id, &[UserRole::Coach, UserRole::Official], "list athletes")
            .await?;

        let filter = UserFilter { role: None, ..filter.clone() };
        let mut athletes: Vec<User> = self
            .store
            .list_users(Some(UserRole::Athlete))
            .await?
            .into_iter()
            .filter(|u| filter.matches(u))
            .collect();
        athletes.sort_by_key(|u| (Reverse(u.points), Reverse(u.created_at)));

        let page = paginate(athletes, page, limit);
        let mut items = Vec::with_capacity(page.items.len());
        for athlete in page.items {
            let records = self.store.query_assessments(&AssessmentQuery::for_athlete(athlete.id)).await?;
            let assessment_stats = AssessmentStats {
                total: records.len() as u64,
                verified: records.iter().filter(|a| a.is_verified()).count() as u64,
                average_score: mean(records.iter().filter_map(|a| a.normalized_score)).map(f64::round),
            };
            items.push(AthleteListing { athlete, assessment_stats });
        }
        Ok(Page { items, page: page.page, limit: page.limit, total: page.total, pages: page.pages })
    }

    /// Users matching `filter` by points, then name. Only athlete and coach
    /// role filters apply. Coaches and officials only.
    pub async fn search_users(&self, viewer_id: Uuid, filter: &UserFilter, page: usize, limit: usize) -> Result<Page<User>> {
        self.user_with_role(viewer_id, &[UserRole::Coach, UserRole::Official], "search users")
            .await?;

        let filter = UserFilter {
            role: filter.role.filter(|r| matches!(r, UserRole::Athlete | UserRole::Coach)),
            ..filter.clone()
        };
        let mut users: Vec<User> = self
            .store
            .list_users(filter.role)
            .await?
            .into_iter()
            .filter(|u| filter.matches(u))
            .collect();
        users.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| a.name.cmp(&b.name)));
        Ok(paginate(users, page, limit))
    }

    /// Users of one role ranked by points.
    pub async fn points_leaderboard(&self, role: UserRole, state: Option<&str>, limit: usize) -> Result<Vec<PointsEntry>> {
        let mut users: Vec<User> = self
            .store
            .list_users(Some(role))
            .await?
            .into_iter()
            .filter(|u| state.is_none_or(|s| u.state == s))
            .collect();
        users.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| a.name.cmp(&b.name)));

        Ok(users
            .into_iter()
            .take(limit.clamp(1, MAX_PAGE_SIZE))
            .enumerate()
            .map(|(i, u)| PointsEntry {
                rank: i + 1,
                user_id: u.id,
                location: u.location(),
                name: u.name,
                specialization: u.specialization,
                points: u.points,
            })
            .collect())
    }

    pub async fn dashboard(&self, user_id: Uuid) -> Result<DashboardStats> {
        let user = self.user(user_id).await?;
        match user.role {
            UserRole::Athlete => self.athlete_dashboard(&user).await,
            UserRole::Coach | UserRole::Official => self.staff_dashboard(&user).await,
        }
    }

    async fn athlete_dashboard(&self, athlete: &User) -> Result<DashboardStats> {
        let mine = AssessmentQuery::for_athlete(athlete.id);
        let total_assessments = self.store.count_assessments(&mine).await?;
        let pending_assessments = self
            .store
            .count_assessments(&mine.clone().status(VerificationStatus::Pending))
            .await?;

        let verified = self
            .store
            .query_assessments(&mine.status(VerificationStatus::Verified).order(SortOrder::NewestFirst))
            .await?;

        let mut best: BTreeMap<&'static str, BestScore> = BTreeMap::new();
        for a in &verified {
            let entry = best.entry(a.test_type.as_str()).or_insert(BestScore {
                test_type: a.test_type,
                best_score: None,
                best_percentile: None,
            });
            entry.best_score = max_opt(entry.best_score, a.normalized_score);
            entry.best_percentile = entry.best_percentile.max(a.percentile);
        }

        Ok(DashboardStats::Athlete {
            total_assessments,
            verified_assessments: verified.len() as u64,
            pending_assessments,
            best_scores: best.into_values().collect(),
            recent_average: mean(verified.iter().take(RECENT_WINDOW).filter_map(|a| a.normalized_score)),
        })
    }

    async fn staff_dashboard(&self, user: &User) -> Result<DashboardStats> {
        let total_athletes = self.store.list_users(Some(UserRole::Athlete)).await?.len() as u64;
        let all = self.store.query_assessments(&AssessmentQuery::all()).await?;
        let total_assessments = all.len() as u64;
        let pending_verifications = all
            .iter()
            .filter(|a| a.verification_status == VerificationStatus::Pending)
            .count() as u64;

        let by_test_type = TestType::ALL
            .into_iter()
            .filter_map(|t| {
                let of_type: Vec<&Assessment> = all.iter().filter(|a| a.test_type == t).collect();
                (!of_type.is_empty()).then(|| TypeSummary {
                    test_type: t,
                    count: of_type.len() as u64,
                    average_score: mean(of_type.iter().filter_map(|a| a.normalized_score)),
                })
            })
            .collect();

        if user.role == UserRole::Coach {
            return Ok(DashboardStats::Coach { total_athletes, total_assessments, pending_verifications, by_test_type });
        }

        let total_coaches = self.store.list_users(Some(UserRole::Coach)).await?.len() as u64;
        let midnight = Utc::now().date_naive().and_hms_opt(0, 0, 0).map(|t| t.and_utc());
        let verified_today = all
            .iter()
            .filter(|a| a.is_verified() && a.verification_date.is_some_and(|d| Some(d) >= midnight))
            .count() as u64;

        Ok(DashboardStats::Official {
            total_athletes,
            total_coaches,
            total_assessments,
            pending_verifications,
            verified_today,
            by_test_type,
        })
    }
}

fn max_opt(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, None) => x,
        (None, y) => y,
    }
}
