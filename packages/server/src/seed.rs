use common::EducationLevel;
use sea_orm::*;
use serde_json::json;
use tracing::info;

use crate::entity::grading_scale;

/// Built-in grading scales: (name, level, threshold to label mapping).
fn default_scales() -> Vec<(&'static str, EducationLevel, serde_json::Value)> {
    vec![
        (
            "BECE",
            EducationLevel::Jhs,
            json!({
                "1": "Excellent", "2": "Very Good", "3": "Good",
                "4": "Credit", "5": "Credit", "6": "Credit",
                "7": "Pass", "8": "Pass", "9": "Fail"
            }),
        ),
        (
            "WASSCE",
            EducationLevel::Shs,
            json!({
                "A1": "Excellent", "B2": "Very Good", "B3": "Good",
                "C4": "Credit", "C5": "Credit", "C6": "Credit",
                "D7": "Pass", "E8": "Pass", "F9": "Fail"
            }),
        ),
        (
            "University of Ghana - 4.0 Scale",
            EducationLevel::University,
            json!({
                "4.0": "A", "3.7": "A-", "3.3": "B+", "3.0": "B", "2.7": "B-",
                "2.3": "C+", "2.0": "C", "1.7": "C-", "1.3": "D+", "1.0": "D",
                "0.0": "F"
            }),
        ),
        (
            "University of Cape Coast - 4.0 Scale",
            EducationLevel::University,
            json!({
                "4.0": "A", "3.5": "B+", "3.0": "B", "2.5": "C+",
                "2.0": "C", "1.5": "D+", "1.0": "D", "0.0": "F"
            }),
        ),
        (
            "KNUST - CWA System",
            EducationLevel::University,
            json!({
                "70-100": "A", "60-69": "B", "50-59": "C", "40-49": "D", "0-39": "F"
            }),
        ),
        (
            "Primary School Grading",
            EducationLevel::Primary,
            json!({
                "A": "Excellent (80-100)", "B": "Very Good (70-79)", "C": "Good (60-69)",
                "D": "Pass (50-59)", "E": "Fair (40-49)", "F": "Fail (Below 40)"
            }),
        ),
    ]
}

/// Insert the built-in grading scales, skipping names that already exist.
pub async fn seed_grading_scales<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let mut inserted = 0u32;
    for (name, level, grades) in default_scales() {
        let model = grading_scale::ActiveModel {
            name: Set(name.to_string()),
            level: Set(level),
            grades: Set(grades),
            is_active: Set(true),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        };

        let result = grading_scale::Entity::insert(model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(grading_scale::Column::Name)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(n) if n > 0 => inserted += 1,
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if inserted > 0 {
        info!("Seeded {} grading scales", inserted);
    }
    Ok(())
}
