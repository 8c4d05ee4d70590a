pub mod anomalies;
pub mod budgets;
pub mod forecast;

pub use anomalies::generate_anomalies;
pub use budgets::{
    check_budget_exceed, forecast_budget, forecast_budgets, generate_budgets, in_budget_scope,
    BudgetExceedance, BudgetOutlook,
};
pub use forecast::project_forecast;
