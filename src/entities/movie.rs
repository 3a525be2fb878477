use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "movie")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub original_title: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub overview: Option<String>,
    /// ISO `YYYY-MM-DD`, validated on import.
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
    /// Comma-joined language codes.
    pub languages: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
