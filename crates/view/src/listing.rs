use crate::engine::{SortKey, Viewable};
use crate::query::ParseSortError;
use pocket_model::{RouteRecord, SolicitationRecord, SolicitationStatus};
use std::str::FromStr;

fn filter_matches(filter: Option<&str>, value: &str) -> bool {
    match filter.map(str::trim) {
        None | Some("") => true,
        Some(expected) => expected == value,
    }
}

/// Normalizes a field name for lookup: lowercase without `_`/`-`/spaces.
fn field_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteFilters {
    pub state: Option<String>,
    pub route_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteSortField {
    Id,
    Location,
    State,
    Zip,
    Type,
    Length,
    PayRate,
}

impl FromStr for RouteSortField {
    type Err = ParseSortError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match field_key(raw).as_str() {
            "id" => Ok(Self::Id),
            "location" => Ok(Self::Location),
            "state" => Ok(Self::State),
            "zip" => Ok(Self::Zip),
            "type" | "routetype" => Ok(Self::Type),
            "length" | "miles" => Ok(Self::Length),
            "payrate" => Ok(Self::PayRate),
            _ => Err(ParseSortError(raw.to_string())),
        }
    }
}

impl Viewable for RouteRecord {
    type Filters = RouteFilters;
    type SortField = RouteSortField;

    fn search_fields(&self) -> Vec<&str> {
        vec![self.id.as_str(), self.location.as_str(), self.zip.as_str()]
    }

    fn matches_filters(&self, filters: &RouteFilters) -> bool {
        filter_matches(filters.state.as_deref(), &self.state)
            && filter_matches(filters.route_type.as_deref(), &self.route_type)
    }

    fn sort_key(&self, field: RouteSortField) -> SortKey<'_> {
        match field {
            RouteSortField::Id => SortKey::Text(&self.id),
            RouteSortField::Location => SortKey::Text(&self.location),
            RouteSortField::State => SortKey::Text(&self.state),
            RouteSortField::Zip => SortKey::Text(&self.zip),
            RouteSortField::Type => SortKey::Text(&self.route_type),
            RouteSortField::Length => SortKey::Number(self.length),
            RouteSortField::PayRate => SortKey::Text(&self.pay_rate),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolicitationFilters {
    pub status: Option<SolicitationStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolicitationSortField {
    Id,
    Title,
    Status,
    Description,
    PostedDate,
    ClosingDate,
    Experience,
    Duration,
    Budget,
}

impl FromStr for SolicitationSortField {
    type Err = ParseSortError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match field_key(raw).as_str() {
            "id" => Ok(Self::Id),
            "title" => Ok(Self::Title),
            "status" => Ok(Self::Status),
            "description" => Ok(Self::Description),
            "posteddate" | "posted" => Ok(Self::PostedDate),
            "closingdate" | "closing" => Ok(Self::ClosingDate),
            "experience" | "minexperience" => Ok(Self::Experience),
            "duration" => Ok(Self::Duration),
            "budget" => Ok(Self::Budget),
            _ => Err(ParseSortError(raw.to_string())),
        }
    }
}

impl Viewable for SolicitationRecord {
    type Filters = SolicitationFilters;
    type SortField = SolicitationSortField;

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.id.as_str(),
            self.title.as_str(),
            self.description.as_str(),
        ]
    }

    fn matches_filters(&self, filters: &SolicitationFilters) -> bool {
        filters
            .status
            .map_or(true, |status| status == self.status)
    }

    fn sort_key(&self, field: SolicitationSortField) -> SortKey<'_> {
        match field {
            SolicitationSortField::Id => SortKey::Text(&self.id),
            SolicitationSortField::Title => SortKey::Text(&self.title),
            SolicitationSortField::Status => SortKey::Text(self.status.as_str()),
            SolicitationSortField::Description => SortKey::Text(&self.description),
            SolicitationSortField::PostedDate => SortKey::Text(&self.posted_date),
            SolicitationSortField::ClosingDate => SortKey::Text(&self.closing_date),
            SolicitationSortField::Experience => SortKey::Number(f64::from(self.experience)),
            SolicitationSortField::Duration => SortKey::Number(f64::from(self.duration)),
            SolicitationSortField::Budget => SortKey::Text(&self.budget),
        }
    }
}
