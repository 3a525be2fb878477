use std::str::FromStr;

use jiff::civil::Date;
use sea_orm::{ActiveValue::NotSet, Order, Set};
use serde::{Deserialize, Serialize};

use crate::entities::movie;

/// A parsed CSV row that has not been stored yet.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewMovie {
    pub title: String,
    pub original_title: Option<String>,
    pub overview: Option<String>,
    pub release_date: Option<Date>,
    pub budget: Option<i64>,
    pub revenue: Option<i64>,
    pub runtime: Option<i32>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i32>,
    pub status: Option<String>,
    pub homepage: Option<String>,
    pub original_language: Option<String>,
    pub production_company_id: Option<i32>,
    pub genre_id: Option<i32>,
    pub languages: Option<Vec<String>>,
}

impl From<NewMovie> for movie::ActiveModel {
    fn from(m: NewMovie) -> Self {
        movie::ActiveModel {
            id: NotSet,
            title: Set(m.title),
            original_title: Set(m.original_title),
            overview: Set(m.overview),
            // Date's Display is ISO 8601, `YYYY-MM-DD`.
            release_date: Set(m.release_date.map(|d| d.to_string())),
            budget: Set(m.budget),
            revenue: Set(m.revenue),
            runtime: Set(m.runtime),
            vote_average: Set(m.vote_average),
            vote_count: Set(m.vote_count),
            status: Set(m.status),
            homepage: Set(m.homepage),
            original_language: Set(m.original_language),
            production_company_id: Set(m.production_company_id),
            genre_id: Set(m.genre_id),
            languages: Set(m.languages.filter(|l| !l.is_empty()).map(|l| l.join(","))),
        }
    }
}

/// Columns a listing may be ordered by.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SortField {
    Id,
    #[default]
    Title,
    OriginalTitle,
    Overview,
    ReleaseDate,
    Budget,
    Revenue,
    Runtime,
    VoteAverage,
    VoteCount,
    Status,
    Homepage,
    OriginalLanguage,
    ProductionCompanyId,
    GenreId,
    Languages,
}

impl SortField {
    pub fn column(self) -> movie::Column {
        match self {
            SortField::Id => movie::Column::Id,
            SortField::Title => movie::Column::Title,
            SortField::OriginalTitle => movie::Column::OriginalTitle,
            SortField::Overview => movie::Column::Overview,
            SortField::ReleaseDate => movie::Column::ReleaseDate,
            SortField::Budget => movie::Column::Budget,
            SortField::Revenue => movie::Column::Revenue,
            SortField::Runtime => movie::Column::Runtime,
            SortField::VoteAverage => movie::Column::VoteAverage,
            SortField::VoteCount => movie::Column::VoteCount,
            SortField::Status => movie::Column::Status,
            SortField::Homepage => movie::Column::Homepage,
            SortField::OriginalLanguage => movie::Column::OriginalLanguage,
            SortField::ProductionCompanyId => movie::Column::ProductionCompanyId,
            SortField::GenreId => movie::Column::GenreId,
            SortField::Languages => movie::Column::Languages,
        }
    }
}

impl FromStr for SortField {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "id" => SortField::Id,
            "title" => SortField::Title,
            "original_title" => SortField::OriginalTitle,
            "overview" => SortField::Overview,
            "release_date" => SortField::ReleaseDate,
            "budget" => SortField::Budget,
            "revenue" => SortField::Revenue,
            "runtime" => SortField::Runtime,
            "vote_average" => SortField::VoteAverage,
            "vote_count" => SortField::VoteCount,
            "status" => SortField::Status,
            "homepage" => SortField::Homepage,
            "original_language" => SortField::OriginalLanguage,
            "production_company_id" => SortField::ProductionCompanyId,
            "genre_id" => SortField::GenreId,
            "languages" => SortField::Languages,
            _ => return Err(()),
        })
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_order(self) -> Order {
        match self {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        }
    }
}

impl FromStr for SortOrder {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(()),
        }
    }
}

/// Optional filters for a listing. Each field narrows by exact match.
#[derive(Clone, Debug, Default)]
pub struct MovieFilter {
    pub original_language: Option<String>,
}

#[derive(Clone, Debug)]
pub struct MovieQuery {
    pub filter: MovieFilter,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
    /// 1-based.
    pub page: u64,
    pub per_page: u64,
}

/// Raw query string of `GET /api/movies`. Values are validated in the handler
/// so that bad input maps to our own JSON errors.
#[derive(Debug, Default, Deserialize)]
pub struct ListMoviesParams {
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub language: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MovieView {
    pub id: i32,
    pub title: String,
    pub original_title: Option<String>,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    pub budget: Option<i64>,
    pub revenue: Option<i64>,
    pub runtime: Option<i32>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i32>,
    pub status: Option<String>,
    pub homepage: Option<String>,
    pub original_language: Option<String>,
    pub production_company_id: Option<i32>,
    pub genre_id: Option<i32>,
    pub languages: Option<String>,
}

impl From<movie::Model> for MovieView {
    fn from(m: movie::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            original_title: m.original_title,
            overview: m.overview,
            release_date: m.release_date,
            budget: m.budget,
            revenue: m.revenue,
            runtime: m.runtime,
            vote_average: m.vote_average,
            vote_count: m.vote_count,
            status: m.status,
            homepage: m.homepage,
            original_language: m.original_language,
            production_company_id: m.production_company_id,
            genre_id: m.genre_id,
            languages: m.languages,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct MoviePage {
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub movies: Vec<MovieView>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_field_accepts_every_column_name() {
        for name in [
            "id",
            "title",
            "original_title",
            "overview",
            "release_date",
            "budget",
            "revenue",
            "runtime",
            "vote_average",
            "vote_count",
            "status",
            "homepage",
            "original_language",
            "production_company_id",
            "genre_id",
            "languages",
        ] {
            assert!(name.parse::<SortField>().is_ok(), "{name} should be sortable");
        }
    }

    #[test]
    fn sort_field_rejects_unknown_and_sql_fragments() {
        assert!("title; DROP TABLE movie".parse::<SortField>().is_err());
        assert!("Title".parse::<SortField>().is_err());
        assert!("".parse::<SortField>().is_err());
    }

    #[test]
    fn sort_order_is_case_sensitive() {
        assert_eq!("asc".parse::<SortOrder>(), Ok(SortOrder::Asc));
        assert_eq!("desc".parse::<SortOrder>(), Ok(SortOrder::Desc));
        assert!("DESC".parse::<SortOrder>().is_err());
        assert!("invalid".parse::<SortOrder>().is_err());
    }
}
