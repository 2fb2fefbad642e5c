//! Emergency team assembly.
//!
//! Severity picks a quota table and a base distance. For each profession,
//! in table order, the first `quota` registered users of that profession
//! are drawn from the whole pool and kept only if they lie within the
//! current distance of the target. When a profession comes up short, the
//! distance for every later profession is multiplied by
//! [`ESCALATION_FACTOR`]. A short roster is returned as is; a missing
//! profession is the only shortfall signal.

use tracing::debug;

use lifeline_db::models::UserRow;
use lifeline_types::events::source;
use lifeline_types::models::{TeamMember, TeamRoster};

use crate::GatewayState;
use crate::commands::{CommandError, CommandResult, SessionContext, blocking, push};

/// Mean Earth radius (IUGG), km.
const EARTH_RADIUS_KM: f64 = 6371.0088;

pub const ESCALATION_FACTOR: f64 = 10.0;

const LOW_EARTHQUAKE: &[(&str, usize)] = &[
    ("doctor", 2),
    ("nurse", 5),
    ("police", 5),
    ("ambulance", 3),
    ("rescue_worker", 2),
    ("engineer", 2),
    ("geologist", 2),
];

const MEDIUM: &[(&str, usize)] = &[
    ("doctor", 4),
    ("nurse", 10),
    ("police", 8),
    ("ambulance", 5),
    ("rescue_worker", 7),
];

const HIGH: &[(&str, usize)] = &[
    ("doctor", 6),
    ("nurse", 15),
    ("police", 12),
    ("ambulance", 8),
    ("rescue_worker", 9),
];

const GENERIC: &[(&str, usize)] = &[
    ("doctor", 3),
    ("nurse", 8),
    ("police", 6),
    ("ambulance", 4),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Low,
    Medium,
    High,
    Unspecified,
}

impl Severity {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Self::Low,
            "medium" => Self::Medium,
            "high" => Self::High,
            _ => Self::Unspecified,
        }
    }
}

/// Quota table and starting distance for one request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plan {
    pub quotas: &'static [(&'static str, usize)],
    pub base_threshold_km: f64,
}

impl Plan {
    pub fn for_request(severity: Severity, disaster_type: &str) -> Self {
        let (quotas, base_threshold_km) = match severity {
            Severity::Low if disaster_type.eq_ignore_ascii_case("earthquake") => {
                (LOW_EARTHQUAKE, 10.0)
            }
            Severity::Medium => (MEDIUM, 20.0),
            Severity::High => (HIGH, 30.0),
            // low severity outside earthquakes shares the generic table
            Severity::Low | Severity::Unspecified => (GENERIC, 10.0),
        };
        Self {
            quotas,
            base_threshold_km,
        }
    }

    pub fn professions(&self) -> Vec<&'static str> {
        self.quotas.iter().map(|(p, _)| *p).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Great-circle distance by the haversine formula.
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat1, lat2) = (a.latitude.to_radians(), b.latitude.to_radians());
    let dlat = lat2 - lat1;
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// A registered user eligible for drafting. Users without coordinates can
/// be drawn but never pass the distance check.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub member: TeamMember,
    pub position: Option<GeoPoint>,
}

impl From<&UserRow> for Candidate {
    fn from(user: &UserRow) -> Self {
        let position = match (user.latitude, user.longitude) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
            _ => None,
        };
        Self {
            member: TeamMember {
                name: user.username.clone(),
                location: user.location.clone(),
                profession: user.profession.clone(),
                phone_no: user.phone_no.clone(),
            },
            position,
        }
    }
}

/// Build the roster. `pool` must be in registration order.
pub fn assemble(target: GeoPoint, plan: &Plan, pool: &[Candidate]) -> Vec<TeamMember> {
    let mut threshold = plan.base_threshold_km;
    let mut team = Vec::new();

    for &(profession, quota) in plan.quotas {
        let mut filled = 0;
        let drawn = pool
            .iter()
            .filter(|c| c.member.profession == profession)
            .take(quota);

        for candidate in drawn {
            let within = candidate
                .position
                .is_some_and(|p| distance_km(target, p) <= threshold);
            if within {
                team.push(candidate.member.clone());
                filled += 1;
            }
        }

        if filled < quota {
            debug!(
                "{}: {}/{} within {} km, widening search",
                profession, filled, quota, threshold
            );
            threshold *= ESCALATION_FACTOR;
        }
    }

    team
}

pub async fn team_request(
    state: &GatewayState,
    session: &SessionContext,
    target: GeoPoint,
    disaster_type: &str,
    severity: &str,
) -> CommandResult {
    if !target.is_valid() {
        return Err(CommandError::Invalid(format!(
            "target ({}, {}) out of range",
            target.latitude, target.longitude
        )));
    }

    let plan = Plan::for_request(Severity::parse(severity), disaster_type);
    let professions = plan.professions();
    let rows = blocking(&state.db, move |db| db.team_candidates(&professions)).await?;
    let pool: Vec<Candidate> = rows.iter().map(Candidate::from).collect();

    let team_members = assemble(target, &plan, &pool);
    debug!(
        "{} drafted {} members for {} severity",
        session.username,
        team_members.len(),
        severity
    );

    push(
        &state.router,
        &session.username,
        source::TEAM_REQUEST,
        &TeamRoster { team_members },
    )
    .await
}
