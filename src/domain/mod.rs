pub mod meal_plan;
pub mod questionnaire;
pub mod risk;
pub mod sun;
pub mod weekly_plan;
